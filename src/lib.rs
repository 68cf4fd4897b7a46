// (c) 2024 Ross Younger
//! # sshconf
//!
//! Reads, queries and faithfully re-renders OpenSSH client configuration files
//! (`~/.ssh/config`, `/etc/ssh/ssh_config`).
//!
//! ```
//! let text = "Host example.com\n  Port 2222 # non-standard\n\nHost *\n  User fred\n";
//! let doc: sshconf::Document = text.parse().unwrap();
//! assert_eq!(doc.get("example.com", "Port"), "2222");
//! assert_eq!(doc.get("example.com", "user"), "fred");
//! assert_eq!(doc.get("elsewhere", "Port"), "");
//! // Unchanged documents render back to the same bytes
//! assert_eq!(doc.to_string(), text);
//! ```
//!
//! For lookups that behave like the ssh client (user file, then system file, then
//! built-in defaults) use a [`UserSettings`], or the convenience functions in this module
//! which share a process-wide one.
//!
//! See the [`config`] module for details of the file format.

pub mod config;
pub use config::{
    decode, decode_bytes, default, set_default, supports_multiple, DefaultTable, Document, Error,
    HostConfiguration, Result, UserSettings,
};

mod cli;
pub use cli::cli;

/// OS abstraction layer
pub mod os;

/// Utilities
pub mod util;

use lazy_static::lazy_static;

lazy_static! {
    static ref SETTINGS: UserSettings = UserSettings::new();
}

/// Looks up `key` for `alias` in the user's and system configuration files,
/// falling back to the default value.
///
/// Errors are logged and result in an empty string; see [`get_strict`].
#[must_use]
pub fn get(alias: &str, key: &str) -> String {
    SETTINGS.get(alias, key)
}

/// As [`get`], but reports errors reading the configuration and malformed values.
pub fn get_strict(alias: &str, key: &str) -> Result<String> {
    SETTINGS.get_strict(alias, key)
}

/// Returns every value of `key` for `alias`; for most keys this is at most one value,
/// but see [`supports_multiple`].
#[must_use]
pub fn get_all(alias: &str, key: &str) -> Vec<String> {
    SETTINGS.get_all(alias, key)
}

/// As [`get_all`], but reports errors.
pub fn get_all_strict(alias: &str, key: &str) -> Result<Vec<String>> {
    SETTINGS.get_all_strict(alias, key)
}

/// As [`get`], split into arguments following the quoting rules
#[must_use]
pub fn get_splits(alias: &str, key: &str) -> Vec<String> {
    SETTINGS.get_splits(alias, key)
}

/// As [`get_all`], with every value split into arguments
#[must_use]
pub fn get_all_splits(alias: &str, key: &str) -> Vec<String> {
    SETTINGS.get_all_splits(alias, key)
}
