//! Abstract Syntax Tree (AST) Types for the shell
//!
//! Architecture:
//!   Input → Lexer → Classifier → Parser → AST → Expander → Interpreter → exit status

pub mod types;
