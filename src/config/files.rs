//! File parsing internals
// (c) 2024 Ross Younger

use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::{Path, PathBuf},
};

use tracing::{debug, trace};

use super::{
    document::{BlockKind, Document, HostBlock, Include, KeyValue, Node},
    errors::{Error, Result},
    find_include_files,
    lines::{split_line, Line},
    matching::Pattern,
};
use crate::os::{AbstractPlatform as _, Platform};

/// The business end of reading a config file.
///
/// # Note
/// You can only use this struct once. If for some reason you want to re-parse a file,
/// you must create a fresh `Parser` to do so.
#[derive(Debug)]
pub struct Parser<R>
where
    R: Read,
{
    line_number: usize,
    reader: BufReader<R>,
    source: String,
    is_user: bool,
    include_dir: Option<PathBuf>,
}

impl Parser<File> {
    /// Opens a file for parsing.
    ///
    /// `is_user` selects where relative `Include` paths are looked for:
    /// `~/.ssh` for user files, `/etc/ssh` for system files.
    pub fn for_path<P>(path: P, is_user: bool) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let source = path.to_string_lossy().to_string();
        let file = File::open(path).map_err(|e| Error::io(source.clone(), e))?;
        let reader = BufReader::new(file);
        Ok(Self::for_reader(reader, source, is_user))
    }
}

impl<R: Read> Parser<R> {
    /// Parses from an arbitrary reader. `source` names it in error messages and settings.
    pub fn for_reader(reader: BufReader<R>, source: String, is_user: bool) -> Self {
        Self {
            line_number: 0,
            reader,
            source,
            is_user,
            include_dir: None,
        }
    }

    /// Overrides the directory relative `Include` paths are resolved against
    #[must_use]
    pub fn include_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.include_dir = Some(dir.into());
        self
    }
}

impl<'a> Parser<&'a [u8]> {
    /// Parses from a string
    #[must_use]
    pub fn for_str(s: &'a str, is_user: bool) -> Self {
        Self::for_reader(BufReader::new(s.as_bytes()), "<string>".into(), is_user)
    }
}

impl<R: Read> Parser<R> {
    /// Maximum nesting of `Include` directives
    pub const INCLUDE_DEPTH_LIMIT: u8 = 5;

    fn resolved_include_dir(&self) -> PathBuf {
        if let Some(dir) = &self.include_dir {
            return dir.clone();
        }
        if self.is_user {
            Platform::user_ssh_dir().unwrap_or_default()
        } else {
            PathBuf::from(Platform::system_ssh_dir())
        }
    }

    /// Reads every file named by an `Include` directive.
    ///
    /// Targets which cannot be read are skipped; the nesting limit applies only to files actually opened.
    fn expand_include(&self, directive: KeyValue, depth: u8) -> Result<Include> {
        let include_dir = self.resolved_include_dir();
        let mut documents = Vec::new();
        for arg in directive.args() {
            for f in find_include_files(arg, &include_dir) {
                let subparser = match Parser::for_path(&f, self.is_user) {
                    Ok(p) => p.include_dir(&include_dir),
                    Err(e) => {
                        debug!(
                            "skipping include of {f:?} from {} line {}: {e}",
                            self.source, directive.line_number
                        );
                        continue;
                    }
                };
                if depth >= Self::INCLUDE_DEPTH_LIMIT {
                    return Err(Error::DepthExceeded);
                }
                match subparser.parse_document(depth + 1) {
                    Ok(doc) => documents.push(doc),
                    Err(e @ Error::Io { .. }) => debug!(
                        "skipping include of {f:?} from {} line {}: {e}",
                        self.source, directive.line_number
                    ),
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(Include {
            directive,
            documents,
        })
    }

    fn open_block(&self, directive: KeyValue) -> Result<HostBlock> {
        let kind = if directive.is("match") {
            BlockKind::Match
        } else {
            BlockKind::Host
        };
        if kind == BlockKind::Host && directive.args().is_empty() {
            return Err(Error::syntax(directive.line_number, "missing host pattern"));
        }
        let patterns = match kind {
            BlockKind::Match => Vec::new(),
            BlockKind::Host => directive
                .args()
                .iter()
                .map(|a| Pattern::new(a))
                .collect::<Result<_>>()
                .map_err(|e| Error::syntax(directive.line_number, e.to_string()))?,
        };
        trace!(
            "{} line {}: opening {kind:?} block {}",
            self.source,
            directive.line_number,
            directive.raw_value()
        );
        Ok(HostBlock {
            kind,
            header: directive,
            patterns,
            nodes: Vec::new(),
        })
    }

    fn parse_document(mut self, depth: u8) -> Result<Document> {
        let mut nodes = Vec::new();
        let mut current: Option<HostBlock> = None;
        let mut line = String::new();

        loop {
            line.clear();
            self.line_number += 1;
            if 0 == self
                .reader
                .read_line(&mut line)
                .map_err(|e| Error::io(self.source.clone(), e))?
            {
                break; // EOF
            }
            let node = match split_line(&line, self.line_number)? {
                Line::Empty(b) => Node::Empty(b),
                Line::Comment(c) => Node::Comment(c),
                Line::Directive(kv) if kv.is("host") || kv.is("match") => {
                    let block = self.open_block(kv)?;
                    if let Some(finished) = current.replace(block) {
                        nodes.push(Node::Host(finished));
                    }
                    continue;
                }
                Line::Directive(kv) if kv.is("include") => {
                    Node::Include(self.expand_include(kv, depth)?)
                }
                Line::Directive(kv) => Node::KeyValue(kv),
            };
            match current.as_mut() {
                Some(block) => block.nodes.push(node),
                None => nodes.push(node),
            }
        }
        if let Some(finished) = current {
            nodes.push(Node::Host(finished));
        }
        Ok(Document {
            source: self.source,
            nodes,
        })
    }

    /// Parses the whole source.
    /// This consumes the `Parser`.
    pub fn parse(self) -> Result<Document> {
        self.parse_document(0)
    }
}

///////////////////////////////////////////////////////////////////////////////////////
