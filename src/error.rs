//! Error taxonomy for loading, dispatching and running script commands
//!
//! Expression and transport failures have their own enums next to the code
//! that raises them (`interpreter::expressions::EvalError`,
//! `api::TransportError`, `toolkit::ToolkitError`).

use std::path::PathBuf;

use thiserror::Error;

use crate::toolkit::ToolkitError;

/// Fatal for the loader: there is nothing to execute.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("script not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read script {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-line failure; the line is skipped and loading continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: not valid UTF-8")]
    InvalidEncoding { line: usize },

    #[error("line {line}: empty command verb")]
    EmptyVerb { line: usize },
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("command not found: {verb}")]
    NotFound { verb: String },

    #[error("command '{verb}' failed: {source}")]
    Handler {
        verb: String,
        #[source]
        source: CommandError,
    },
}

/// Raised inside a handler body and caught at the dispatch boundary.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{verb}: expected at least {expected} arguments, got {got}")]
    MissingArguments {
        verb: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{0}: missing '-> target'")]
    MissingTarget(&'static str),

    #[error("invalid value for {name}: '{value}'")]
    InvalidArgument { name: String, value: String },

    #[error("control '{0}' not found")]
    UnknownControl(String),

    #[error("display area '{0}' not found")]
    UnknownDisplayArea(String),

    #[error("popup window '{0}' not found")]
    UnknownPopup(String),

    #[error(transparent)]
    Toolkit(#[from] ToolkitError),

    #[error("{0}")]
    Failed(String),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl CommandError {
    pub fn invalid(name: impl Into<String>, value: impl Into<String>) -> Self {
        CommandError::InvalidArgument {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl From<DispatchError> for CommandError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Handler { source, .. } => source,
            not_found => CommandError::Failed(not_found.to_string()),
        }
    }
}
