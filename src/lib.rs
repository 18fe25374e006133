//! zero-shell - A small POSIX-style command-language shell
//!
//! Input is tokenized and parsed one top-level command at a time into an
//! AST, which the interpreter walks: words are expanded, builtins run in
//! the shell process and everything else is forked and executed with the
//! environment's file descriptor table installed.

pub mod ast;
pub mod interpreter;
pub mod parser;
pub mod shell;

pub use ast::types::*;
pub use interpreter::{Env, Interpreter, ShellError};
pub use parser::{parse_all, ParseError, Parser};
pub use shell::{Input, Shell};
