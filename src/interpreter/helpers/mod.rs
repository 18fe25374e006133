//! Interpreter helpers
//!
//! Small pure functions shared by the expander and the builtins.

pub mod ifs;
pub mod loop_helpers;
pub mod quoting;
pub mod xtrace;

pub use loop_helpers::{handle_loop_error, LoopAction};
pub use ifs::{get_ifs, get_ifs_separator, split_for_read, DEFAULT_IFS};
pub use quoting::quote_value;
