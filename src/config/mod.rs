// (c) 2024 Ross Younger
//! # OpenSSH-style configuration files
//!
//! This module reads the textual `Key Value` format used by `ssh_config(5)`
//! into a [`Document`] which serves two purposes at once:
//! 1. It renders back to _exactly_ the text it was read from (via [`Display`](std::fmt::Display)),
//!    comments, indentation, quoting, `=` signs and line endings included.
//! 2. It answers "what is the value of _key_ for host _alias_?" with the same precedence
//!    rules as the ssh client.
//!
//! ## File format
//!
//! ```text
//! # Global settings apply to every host
//! User fred
//!
//! Host old-faithful
//!   Port 2222                  # trailing comments are fine
//!   IdentityFile ~/.ssh/old
//!
//! Host *.internal.corp !gateway.internal.corp
//!   ProxyJump gateway.internal.corp
//!   SetEnv LANG=C "MESSAGE=hello world"
//!
//! Include ~/.ssh/config.d/*
//!
//! Host *
//!   IdentityFile ~/.ssh/id_ed25519
//! ```
//!
//! * Keys are case-insensitive. A key and its value may be separated by whitespace or by `=`.
//! * Values may be quoted with single or double quotes. `#` starts a comment only at the start of a word.
//! * `Host` starts a block which runs until the next `Host` or `Match` line.
//!   Its patterns may use `*` and `?`; a pattern prefixed with `!` vetoes the block for matching hosts.
//! * `Match` blocks are carried through faithfully but never selected.
//! * `#!! Keyword value` is read as a directive, for tools that extend the format;
//!   ssh itself sees a comment.
//! * `Include` reads further files in place. Relative paths are looked for in `~/.ssh`
//!   (user files) or `/etc/ssh` (system files). Files which don't exist are skipped.
//!
//! ### Traps and tips
//! 1. Like OpenSSH, for each setting we use the value from the _first_ place we find that matches the host.
//! 1. A few settings (see [`supports_multiple`]) accumulate instead: every matching line counts, in file order.
//! 1. Settings at the top of the file, before any `Host` line, apply to every host.
//!
//! ## Lookups
//!
//! [`UserSettings`] looks in the user's configuration file, then the system configuration file,
//! then falls back to built-in [defaults](default).

mod document;
pub use document::{
    Blank, BlockKind, Comment, Document, HostBlock, Include, KeyValue, LineEnding, Node,
};

mod errors;
pub use errors::{Error, ExtractError, Result};

mod defaults;
pub use defaults::{default, set_default, DefaultTable};

mod files;
pub use files::Parser;

mod includes;
use includes::find_include_files;

mod lines;
pub use lines::split_args;

mod matching;
pub use matching::Pattern;

mod resolve;
pub use resolve::supports_multiple;

mod settings;
pub use settings::{ConfigFinder, UserSettings};

mod values;
pub use values::{HostConfiguration, Setting};

use std::{io::Read, str::FromStr};

/// Parses a configuration from a reader.
///
/// The source is treated as a user configuration file.
pub fn decode<R: Read>(reader: R) -> Result<Document> {
    Parser::for_reader(std::io::BufReader::new(reader), "<reader>".into(), true).parse()
}

/// Parses a configuration held in memory.
pub fn decode_bytes(data: &[u8]) -> Result<Document> {
    decode(data)
}

impl FromStr for Document {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Parser::for_str(s, true).parse()
    }
}
