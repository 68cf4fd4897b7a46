//! The parsed document model
// (c) 2024 Ross Younger

use std::fmt::{self, Display, Formatter};

use super::matching::Pattern;

/// How a physical line was terminated in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// Unterminated (final line of a file with no trailing newline)
    #[default]
    None,
    /// Unix style, `\n`
    Lf,
    /// DOS style, `\r\n`
    CrLf,
    /// A bare `\r` at the end of the final line
    Cr,
}

impl LineEnding {
    /// Splits a line into its body and terminator
    pub(super) fn split(line: &str) -> (&str, Self) {
        if let Some(body) = line.strip_suffix("\r\n") {
            (body, Self::CrLf)
        } else if let Some(body) = line.strip_suffix('\n') {
            (body, Self::Lf)
        } else if let Some(body) = line.strip_suffix('\r') {
            (body, Self::Cr)
        } else {
            (line, Self::None)
        }
    }

    /// The terminator as it appeared in the source
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }
}

/// A line containing nothing but whitespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blank {
    pub(super) whitespace: String,
    pub(super) ending: LineEnding,
}

/// A line containing only a comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub(super) indent: String,
    /// includes the leading `#`
    pub(super) text: String,
    pub(super) ending: LineEnding,
}

impl Comment {
    /// The comment text, including its leading `#`
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A single `Keyword value...` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub(super) line_number: usize,
    pub(super) indent: String,
    /// as typed; compare case-insensitively
    pub(super) keyword: String,
    /// whitespace and/or `=` between keyword and value
    pub(super) separator: String,
    /// the argument region exactly as written, quotes and all
    pub(super) value: String,
    /// the argument region after tokenization
    pub(super) args: Vec<String>,
    /// trailing whitespace and comment, if any
    pub(super) trailer: String,
    pub(super) ending: LineEnding,
}

impl KeyValue {
    /// The keyword as written in the source
    #[must_use]
    pub fn key(&self) -> &str {
        &self.keyword
    }

    /// Case-insensitive keyword comparison
    #[must_use]
    pub fn is(&self, keyword: &str) -> bool {
        self.keyword.eq_ignore_ascii_case(keyword)
    }

    /// The value of this directive.
    ///
    /// A value consisting of a single argument is returned without its quoting;
    /// anything longer is returned exactly as written.
    #[must_use]
    pub fn value(&self) -> &str {
        match self.args.as_slice() {
            [only] => only,
            _ => &self.value,
        }
    }

    /// The argument region exactly as written
    #[must_use]
    pub fn raw_value(&self) -> &str {
        &self.value
    }

    /// The individual arguments, with quoting removed
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Line number within the source this directive was read from
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Was this directive written behind a `#!!` marker?
    #[must_use]
    pub fn is_extended(&self) -> bool {
        self.indent.trim_start().starts_with("#!!")
    }

    /// The trailing comment, if there was one
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        let c = self.trailer.trim_start();
        (!c.is_empty()).then_some(c)
    }
}

/// An `Include` directive together with the documents it pulled in
#[derive(Debug, Clone, PartialEq)]
pub struct Include {
    pub(super) directive: KeyValue,
    /// In order of expansion. These are never rendered.
    pub(super) documents: Vec<Document>,
}

impl Include {
    /// The directive line itself
    #[must_use]
    pub fn directive(&self) -> &KeyValue {
        &self.directive
    }

    /// The documents read in by this directive
    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }
}

/// What opened a [`HostBlock`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// `Host pattern...`
    Host,
    /// `Match criteria...`; carried through but never selected by lookups
    Match,
}

/// A `Host` (or `Match`) stanza and everything up to the next one
#[derive(Debug, Clone, PartialEq)]
pub struct HostBlock {
    pub(super) kind: BlockKind,
    pub(super) header: KeyValue,
    pub(super) patterns: Vec<Pattern>,
    pub(super) nodes: Vec<Node>,
}

impl HostBlock {
    /// Host or Match?
    #[must_use]
    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    /// The `Host` line
    #[must_use]
    pub fn header(&self) -> &KeyValue {
        &self.header
    }

    /// The patterns from the `Host` line. Empty for `Match` blocks.
    #[must_use]
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// The contents of the block
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

/// One element of a [`Document`]
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A whitespace-only line
    Empty(Blank),
    /// A comment line
    Comment(Comment),
    /// A directive
    KeyValue(KeyValue),
    /// An `Include` directive and the documents it read
    Include(Include),
    /// A `Host` or `Match` block. Never appears within another block.
    Host(HostBlock),
}

/// A parsed configuration source.
///
/// Rendering a `Document` (via [`Display`]) reproduces the source text exactly.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub(super) source: String,
    pub(super) nodes: Vec<Node>,
}

impl Document {
    /// Where this document was read from
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The top-level nodes, in source order
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The `Host` and `Match` blocks, in source order
    pub fn blocks(&self) -> impl Iterator<Item = &HostBlock> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Host(h) => Some(h),
            _ => None,
        })
    }
}

///////////////////////////////////////////////////////////////////////////////////////
// Rendering

impl Display for Blank {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.whitespace, self.ending.as_str())
    }
}

impl Display for Comment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.indent, self.text, self.ending.as_str())
    }
}

impl Display for KeyValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}{}",
            self.indent,
            self.keyword,
            self.separator,
            self.value,
            self.trailer,
            self.ending.as_str()
        )
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Node::Empty(b) => Display::fmt(b, f),
            Node::Comment(c) => Display::fmt(c, f),
            Node::KeyValue(kv) => Display::fmt(kv, f),
            // the included documents are not part of this source
            Node::Include(inc) => Display::fmt(&inc.directive, f),
            Node::Host(block) => {
                Display::fmt(&block.header, f)?;
                block.nodes.iter().try_for_each(|n| Display::fmt(n, f))
            }
        }
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.nodes.iter().try_for_each(|n| Display::fmt(n, f))
    }
}
