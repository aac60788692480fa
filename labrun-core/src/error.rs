//! Error types for labrun.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ActionKind;

/// Every condition the board and action registries diagnose.
///
/// Some kinds reject the operation outright (nothing is stored); others are
/// tolerated and come back as warnings next to a successful result. See
/// [`RegistryError::is_tolerated`].
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("action \"{name}\" is already defined")]
    DuplicateName { name: String },

    #[error("board \"{name}\" is already defined")]
    DuplicateBoard { name: String },

    /// `parameters` or `variables` was given but is not a mapping.
    #[error("wrong {field} definition for action \"{action}\" (must be a mapping or absent)")]
    InvalidParameterShape { action: String, field: &'static str },

    #[error(
        "trying to define action \"{action}\" with an unrecognized action type \"{type_name}\" \
         (must be an action, a ramp or a program)"
    )]
    UnrecognizedCapability { action: String, type_name: String },

    #[error("program handler for action \"{action}\" must be specified")]
    MissingHandler { action: String },

    #[error("handler given for \"{action}\" does not fit a {kind} entry")]
    HandlerMismatch { action: String, kind: ActionKind },

    #[error("board \"{name}\" not found")]
    BoardNotFound { name: String },

    #[error("board \"{board}\" added with type \"{type_name}\" which is not a board")]
    WrongBoardType { board: String, type_name: String },

    #[error("action \"{name}\" not found")]
    ActionNotFound { name: String },

    #[error(
        "wrong arguments call to action \"{action}\" (arguments to be given are {expected:?}, \
         got {positional} positional and {keyword} keyword)"
    )]
    ArgumentCountMismatch {
        action: String,
        expected: Vec<String>,
        positional: usize,
        keyword: usize,
    },

    /// The registry was built without an owning system, or the system was dropped.
    #[error("no owning system attached to the action registry")]
    SystemUnavailable,

    #[error("unknown value format \"{format}\"")]
    UnknownFormat { format: String },

    #[error("variable \"{variable}\" of action \"{action}\" has a format but no value")]
    UnboundVariable { action: String, variable: String },

    #[error("cannot apply format \"{format}\" to variable \"{variable}\": {source}")]
    Coercion {
        variable: String,
        format: String,
        #[source]
        source: CoerceError,
    },

    #[error("failed to instantiate \"{type_name}\": {reason}")]
    Instantiation { type_name: String, reason: String },

    /// A setup file named a type the catalog does not know.
    #[error("unknown type \"{type_name}\"")]
    UnknownType { type_name: String },
}

impl RegistryError {
    /// True for conditions the registries report but work around.
    pub fn is_tolerated(&self) -> bool {
        matches!(
            self,
            RegistryError::InvalidParameterShape { .. }
                | RegistryError::WrongBoardType { .. }
                | RegistryError::BoardNotFound { .. }
                | RegistryError::ArgumentCountMismatch { .. }
        )
    }
}

/// A single value could not be converted by a coercion function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert {value} to {target}")]
pub struct CoerceError {
    pub value: String,
    pub target: &'static str,
}

/// Errors raised while locating or reading the setup file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error on an in-memory document.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the file path.
    #[error("failed to parse setup file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    #[error("setup file not found at {path}")]
    NotFound { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_message_lists_expected_variables() {
        let err = RegistryError::ArgumentCountMismatch {
            action: "heat".into(),
            expected: vec!["temp".into(), "duration".into()],
            positional: 1,
            keyword: 0,
        };
        let msg = err.to_string();
        assert!(msg.contains("\"heat\""));
        assert!(msg.contains("[\"temp\", \"duration\"]"));
        assert!(err.is_tolerated());
    }

    #[test]
    fn blocking_errors_are_not_tolerated() {
        assert!(!RegistryError::DuplicateName { name: "x".into() }.is_tolerated());
        assert!(!RegistryError::MissingHandler { action: "x".into() }.is_tolerated());
        assert!(!RegistryError::SystemUnavailable.is_tolerated());
    }

    #[test]
    fn home_not_found_error_message() {
        assert!(ConfigError::HomeNotFound.to_string().contains("home directory"));
    }
}
