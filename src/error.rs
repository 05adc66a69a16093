use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FindError {
    // Usage
    #[error("{0}")]
    Usage(String),

    // Parse
    #[error("parse error on end of expression: no expression given")]
    EmptyExpression,

    #[error("parse error on {}: expected {expected}", describe(.token))]
    UnexpectedToken { token: String, expected: &'static str },

    #[error("parse error on {}: unbalanced parentheses, expected ')'", describe(.token))]
    UnbalancedParens { token: String },

    #[error("parse error on {}: unexpected trailing tokens", describe(.token))]
    TrailingTokens { token: String },

    #[error("parse error on -{0}: unknown predicate")]
    UnknownPredicate(String),

    #[error("parse error on -{predicate}: {message}")]
    InvalidArguments { predicate: String, message: String },

    // Config
    #[error("predicate -{0} is already registered")]
    DuplicatePredicate(String),

    #[error("command {0} is already registered")]
    DuplicateCommand(String),

    // Output
    #[error("write error")]
    Output(#[source] std::io::Error),

    // Traversal
    #[error("permission denied")]
    PermissionDenied(PathBuf),

    #[error("path not found")]
    NotFound(PathBuf),

    #[error("symlink loop")]
    SymlinkLoop(PathBuf),

    #[error("IO error")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn describe(token: &str) -> &str {
    if token.is_empty() {
        "end of expression"
    } else {
        token
    }
}

impl FindError {
    /// Map an I/O failure on `path` to the matching traversal variant.
    pub(crate) fn from_io(path: PathBuf, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io { path, source: err },
        }
    }

    /// The path this error occurred at, if applicable.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::PermissionDenied(p)
            | Self::NotFound(p)
            | Self::SymlinkLoop(p)
            | Self::Io { path: p, .. } => Some(p),
            _ => None,
        }
    }

    /// Whether the traversal can continue after this error.
    ///
    /// Only per-entry filesystem errors are recoverable; everything else
    /// aborts the invocation before any entry is visited.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied(_) | Self::NotFound(_) | Self::SymlinkLoop(_) | Self::Io { .. }
        )
    }

    /// Whether this error came from reading the expression.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyExpression
                | Self::UnexpectedToken { .. }
                | Self::UnbalancedParens { .. }
                | Self::TrailingTokens { .. }
                | Self::UnknownPredicate(_)
                | Self::InvalidArguments { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_input_is_described() {
        let err = FindError::UnbalancedParens { token: String::new() };
        assert_eq!(
            err.to_string(),
            "parse error on end of expression: unbalanced parentheses, expected ')'"
        );
    }

    #[test]
    fn only_traversal_errors_are_recoverable() {
        assert!(FindError::NotFound(PathBuf::from("x")).is_recoverable());
        assert!(!FindError::UnknownPredicate("bogus".into()).is_recoverable());
        assert!(FindError::UnknownPredicate("bogus".into()).is_parse_error());
        assert!(!FindError::Usage("no root".into()).is_parse_error());
    }

    #[test]
    fn io_errors_are_classified() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert!(matches!(
            FindError::from_io(PathBuf::from("a"), denied),
            FindError::PermissionDenied(_)
        ));
        let other = std::io::Error::from(std::io::ErrorKind::Other);
        let err = FindError::from_io(PathBuf::from("b"), other);
        assert_eq!(err.path(), Some(&PathBuf::from("b")));
    }
}
