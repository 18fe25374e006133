//! Parser Types and Constants
//!
//! Shared types used across the lexer, the word classifier and the parser.

use thiserror::Error;

/// Max recursion depth for nested constructs
pub const MAX_PARSER_DEPTH: usize = 200;

/// Lexical/grammar error for one input unit
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }

    pub fn unexpected(token: &Token) -> Self {
        let shown = match token.kind {
            TokenKind::Newline => "newline",
            TokenKind::Eof => {
                return Self::new("syntax error: unexpected end of file", token.line);
            }
            _ => token.text.as_str(),
        };
        Self::new(format!("syntax error near unexpected token `{}'", shown), token.line)
    }
}

/// Token classes produced by the lexer + word classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Operator,
    ReservedWord,
    Name,
    AssignmentWord,
    IoNumber,
    Word,
    Newline,
    Eof,
}

/// Body captured for a `<<` / `<<-` delimiter word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HereDoc {
    pub body: String,
    pub quoted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
    /// Set only on the delimiter word following `<<` / `<<-`
    pub heredoc: Option<HereDoc>,
    /// Span in the lexer's buffer for the current unit
    pub start: usize,
    pub end: usize,
    pub line: usize,
}

impl Token {
    pub fn is_op(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == op
    }

    pub fn is_reserved(&self, word: &str) -> bool {
        self.kind == TokenKind::ReservedWord && self.text == word
    }

    /// Any word-like token (not an operator, newline or end of input)
    pub fn is_word(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Word | TokenKind::Name | TokenKind::AssignmentWord
        )
    }
}

/// What an `in` keyword would introduce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InContext {
    For,
    Case,
}

/// Nesting counters and context flags threaded through lexing and parsing.
///
/// Reset at the start of every independent top-level unit; a nested parse
/// (command substitution) builds its own.
#[derive(Debug, Clone, Default)]
pub struct ParserState {
    pub if_depth: usize,
    pub loop_depth: usize,
    pub case_depth: usize,
    pub brace_depth: usize,
    pub paren_depth: usize,
    pub function_depth: usize,
    /// Last token was `|`, `&&` or `||`
    pub continuation: bool,
    /// The next word may be a command word (or reserved word)
    pub command_position: bool,
    /// Next word is a `for` loop variable
    pub after_for: bool,
    /// Next word is a `case` subject
    pub after_case: bool,
    pub expect_in: Option<InContext>,
    /// Inside a case item's pattern list
    pub case_pattern: bool,
    /// Next word is a redirection target
    pub after_redirect: bool,
    /// Next word is a here-document delimiter; `true` for `<<-`
    pub pending_heredoc: Option<bool>,
}

impl ParserState {
    pub fn new() -> Self {
        Self {
            command_position: true,
            ..Default::default()
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// What an unfinished construct is still waiting for, innermost kind
    /// first; `None` once the unit is complete.
    pub fn open_construct(&self) -> Option<&'static str> {
        if self.continuation || self.after_for || self.after_case {
            Some("a word")
        } else if let Some(context) = self.expect_in {
            Some(match context {
                InContext::For => "`in' or `do'",
                InContext::Case => "`in'",
            })
        } else if self.case_depth > 0 {
            Some("`esac'")
        } else if self.if_depth > 0 {
            Some("`fi'")
        } else if self.loop_depth > 0 {
            Some("`done'")
        } else if self.brace_depth > 0 {
            Some("`}'")
        } else if self.paren_depth > 0 {
            Some("`)'")
        } else {
            None
        }
    }

    /// An open construct needs more input before the unit is complete
    pub fn needs_more(&self) -> bool {
        self.open_construct().is_some()
    }
}
