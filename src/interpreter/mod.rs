//! Interpreter module
//!
//! This module contains the evaluator: the environment model, word
//! expansion, process creation and the builtin commands.

pub mod builtins;
pub mod environment;
pub mod errors;
pub mod expansion;
pub mod helpers;
pub mod interpreter;
pub mod jobs;
pub mod pipeline_execution;
pub mod process;
pub mod redirections;
pub mod signals;
pub mod simple_command;
pub mod types;

pub use environment::{Env, FdSlot, FdTable};
pub use errors::{EnvError, ShellError};
pub use interpreter::Interpreter;
pub use types::{ShellOptions, Variable};
