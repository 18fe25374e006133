//! Shell Errors
//!
//! Error types used by the evaluator. Besides real failures, `ShellError`
//! carries shell control flow:
//! - break: Exit loops
//! - continue: Skip to next iteration
//! - return: Exit functions
//! - exit: Leave the shell (or the forked child running a subshell)
//!
//! These unwind the execution stack with `?` until the construct that
//! handles them (loop, function call, top level) is reached.

use std::io;

use thiserror::Error;

use crate::parser::ParseError;

/// Failures of the variable table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    #[error("{0}: readonly variable")]
    Readonly(String),
    #[error("`{0}': not a valid identifier")]
    InvalidName(String),
}

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// `${X:?}`, bad substitution, unset variable under `set -u`
    #[error("{0}")]
    Expansion(String),

    #[error(transparent)]
    Env(#[from] EnvError),

    #[error("{context}: {}", io_message(.source))]
    Io { context: String, source: io::Error },

    /// Refused redirection target (noclobber, directory)
    #[error("{0}")]
    Redirect(String),

    /// fork/pipe failure
    #[error("{operation}: {}", io_message(.source))]
    Resource {
        operation: &'static str,
        source: io::Error,
    },

    #[error("break")]
    Break(u32),

    #[error("continue")]
    Continue(u32),

    #[error("return")]
    Return(i32),

    #[error("exit")]
    Exit(i32),
}

impl ShellError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn resource(operation: &'static str, source: io::Error) -> Self {
        Self::Resource { operation, source }
    }

    pub fn expansion(message: impl Into<String>) -> Self {
        Self::Expansion(message.into())
    }

    /// Exit status this error stands for
    pub fn status(&self) -> i32 {
        match self {
            Self::Parse(_) => 2,
            Self::Expansion(_)
            | Self::Env(_)
            | Self::Io { .. }
            | Self::Redirect(_)
            | Self::Resource { .. } => 1,
            Self::Break(_) | Self::Continue(_) => 0,
            Self::Return(code) | Self::Exit(code) => *code,
        }
    }

    /// break/continue/return/exit: not a failure, never reported
    pub fn is_control_flow(&self) -> bool {
        matches!(
            self,
            Self::Break(_) | Self::Continue(_) | Self::Return(_) | Self::Exit(_)
        )
    }

    /// Errors that abort only the simple command that raised them
    pub fn is_command_local(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::Redirect(_) | Self::Resource { .. } | Self::Env(_)
        )
    }
}

/// `io::Error` text without the "(os error N)" suffix
pub fn io_message(err: &io::Error) -> String {
    let text = err.to_string();
    match text.find(" (os error") {
        Some(idx) => text[..idx].to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::errno::Errno;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ShellError::Exit(3).status(), 3);
        assert_eq!(ShellError::Return(4).status(), 4);
        assert_eq!(ShellError::expansion("x: parameter not set").status(), 1);
        assert_eq!(ShellError::from(ParseError::new("bad", 1)).status(), 2);
        assert_eq!(ShellError::Break(1).status(), 0);
    }

    #[test]
    fn test_io_message_is_single_line() {
        let err = ShellError::io("missing.txt", io::Error::from(Errno::ENOENT));
        assert_eq!(err.to_string(), "missing.txt: No such file or directory");
    }

    #[test]
    fn test_control_flow_classification() {
        assert!(ShellError::Break(1).is_control_flow());
        assert!(!ShellError::expansion("x").is_control_flow());
        assert!(ShellError::from(EnvError::Readonly("X".into())).is_command_local());
    }
}
