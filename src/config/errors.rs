//! Error types
// (c) 2024 Ross Younger

use std::sync::Arc;

use figment::error::{Kind, OneOf};

/// Errors arising from reading or querying an ssh-style configuration
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The source text could not be tokenized
    #[error("line {line}: {message}")]
    Syntax {
        /// 1-based line number within the source that failed
        line: usize,
        /// What went wrong
        message: String,
    },
    /// Include directives nested too deeply (most likely a loop)
    #[error("max include depth exceeded")]
    DepthExceeded,
    /// A resolved value could not be converted to the type its directive requires
    #[error("invalid value for {key}: parsing {value:?}: {reason}")]
    ValueConversion {
        /// The directive being looked up
        key: String,
        /// The offending value, as resolved
        value: String,
        /// The underlying conversion failure
        reason: String,
    },
    /// The source could not be read
    #[error("reading {source_name}: {source}")]
    Io {
        /// Where we were reading from
        source_name: String,
        /// The underlying failure
        #[source]
        source: Arc<std::io::Error>,
    },
    /// A host pattern was not usable
    #[error("invalid host pattern {0:?}")]
    Pattern(String),
}

impl Error {
    pub(crate) fn syntax<S: Into<String>>(line: usize, message: S) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn io<S: Into<String>>(source_name: S, source: std::io::Error) -> Self {
        Self::Io {
            source_name: source_name.into(),
            source: Arc::new(source),
        }
    }

    /// Is this the not-found flavour of I/O error?
    pub(crate) fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Result type alias for this crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

///////////////////////////////////////////////////////////////////////////////////////

/// A newtype wrapper implementing `Display` for errors from [`HostConfiguration::extract`](super::HostConfiguration::extract)
#[derive(Debug)]
pub struct ExtractError(figment::Error);
impl From<figment::Error> for ExtractError {
    fn from(value: figment::Error) -> Self {
        Self(value)
    }
}

impl std::error::Error for ExtractError {}

impl ExtractError {
    fn rewrite_expected_type(s: &str) -> String {
        match s {
            "a boolean" => format!(
                "a boolean ({})",
                OneOf(&["yes", "no", "true", "false", "1", "0"])
            ),
            _ => s.to_owned(),
        }
    }

    fn fmt_kind(kind: &Kind, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match kind {
            Kind::InvalidType(v, exp) => write!(
                f,
                "invalid type: found {v}, expected {exp}",
                exp = Self::rewrite_expected_type(exp)
            ),
            Kind::UnknownVariant(v, exp) => {
                write!(f, "unknown variant: found {v}, expected {}", OneOf(exp))
            }
            _ => std::fmt::Display::fmt(&kind, f),
        }
    }
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let e = &self.0;
        Self::fmt_kind(&e.kind, f)?;

        if let (Some(profile), Some(md)) = (&e.profile, &e.metadata) {
            if !e.path.is_empty() {
                let key = md.interpolate(profile, &e.path);
                write!(f, " for {key}")?;
            }
        }

        if let Some(md) = &e.metadata {
            if let Some(source) = &md.source {
                write!(f, " at {source}")?;
            } else {
                write!(f, " in {}", md.name)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::Error;
    use assertables::assert_contains;

    #[test]
    fn messages() {
        let e = Error::syntax(7, "unterminated quote");
        assert_eq!(e.to_string(), "line 7: unterminated quote");

        let e = Error::ValueConversion {
            key: "Port".into(),
            value: "notanumber".into(),
            reason: "invalid digit found in string".into(),
        };
        assert_contains!(e.to_string(), "\"notanumber\"");
        assert_contains!(e.to_string(), "invalid digit");
    }

    #[test]
    fn not_found_detection() {
        let e = Error::io(
            "nowhere",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(e.is_not_found());
        let e = Error::io(
            "somewhere",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope"),
        );
        assert!(!e.is_not_found());
        assert!(!Error::DepthExceeded.is_not_found());
    }
}
