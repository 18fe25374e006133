//! Parser module for shell input
//!
//! Line sources feed the lexer, the lexer classifies words as it goes, and
//! the parser builds one AST unit per call.

pub mod types;
pub mod source;
pub mod classify;
pub mod lexer;
pub mod parser;

// Re-exports
pub use parser::{parse_all, Parser, Unit};
pub use source::{FdSource, LineSource, StrSource};
pub use types::{ParseError, ParserState, Token, TokenKind};
