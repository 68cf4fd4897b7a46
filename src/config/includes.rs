//! Include directive logic
// (c) 2024 Ross Younger

use glob::{glob_with, MatchOptions};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Wildcard matching and ~ expansion for Include directives.
///
/// Relative paths are taken relative to `include_dir`. Only regular files are returned.
/// Expressions which cannot be expanded contribute nothing (with a warning).
pub(super) fn find_include_files(arg: &str, include_dir: &Path) -> Vec<PathBuf> {
    let mut path = if arg.starts_with('~') {
        match expanduser::expanduser(arg) {
            Ok(p) => p,
            Err(e) => {
                warn!("could not expand include expression {arg}: {e}");
                return Vec::new();
            }
        }
    } else {
        PathBuf::from(arg)
    };
    if !path.is_absolute() {
        path = include_dir.join(path);
    }

    let options = MatchOptions {
        case_sensitive: true,
        require_literal_leading_dot: true,
        require_literal_separator: true,
    };
    match glob_with(path.to_string_lossy().as_ref(), options) {
        Ok(paths) => paths.flatten().filter(|p| p.is_file()).collect(),
        Err(e) => {
            warn!("bad include expression {arg}: {e}");
            Vec::new()
        }
    }
}
