//! Host matching
// (c) 2024 Ross Younger

use std::fmt::{self, Display, Formatter};

use wildmatch::WildMatch;

use super::errors::{Error, Result};

/// A compiled host pattern, as found on a `Host` line.
///
/// `*` matches any run of characters (including none), `?` matches exactly one character.
/// Everything else matches literally and case-sensitively.
/// A leading `!` negates the pattern.
pub struct Pattern {
    text: String,
    negated: bool,
    matcher: WildMatch,
}

impl Pattern {
    /// Compiles a pattern
    pub fn new(text: &str) -> Result<Self> {
        let (negated, glob) = match text.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        if glob.is_empty() {
            return Err(Error::Pattern(text.to_string()));
        }
        Ok(Self {
            text: text.to_string(),
            negated,
            matcher: WildMatch::new(glob),
        })
    }

    /// Is this a `!pattern`?
    #[must_use]
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// The pattern as written
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Does the glob part of the pattern match? (Negation is _not_ applied here.)
    #[must_use]
    pub fn glob_matches(&self, alias: &str) -> bool {
        self.matcher.matches(alias)
    }
}

impl Clone for Pattern {
    fn clone(&self) -> Self {
        let glob = if self.negated {
            &self.text[1..]
        } else {
            &self.text
        };
        Self {
            text: self.text.clone(),
            negated: self.negated,
            matcher: WildMatch::new(glob),
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.text).finish()
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Evaluates a `Host` pattern list against an alias.
///
/// Any matching negated pattern vetoes the whole list, wherever it appears.
/// Otherwise at least one positive pattern must match.
pub(super) fn evaluate_host_match(alias: &str, patterns: &[Pattern]) -> bool {
    let mut found = false;
    for p in patterns {
        if p.glob_matches(alias) {
            if p.negated {
                return false;
            }
            found = true;
        }
    }
    found
}

///////////////////////////////////////////////////////////////////////////////////////
