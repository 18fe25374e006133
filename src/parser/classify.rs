//! Word Classifier
//!
//! Decides, from the token text, what follows it and the parser state,
//! whether a word is a reserved word, a NAME, an ASSIGNMENT_WORD, an
//! IO_NUMBER or a plain WORD. Recognizing keywords and operators updates the
//! nesting counters in [`ParserState`].

use std::collections::HashSet;

use crate::parser::types::{InContext, ParserState, TokenKind};

lazy_static::lazy_static! {
    /// Reserved words; only recognized where a command word may start
    static ref RESERVED_WORDS: HashSet<&'static str> = [
        "if", "then", "else", "elif", "fi", "do", "done", "case", "esac",
        "while", "until", "for", "in", "{", "}", "!",
    ]
    .into_iter()
    .collect();
}

/// Characters following a word in the input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lookahead {
    /// Character immediately after the word
    pub adjacent: Option<char>,
    /// First non-blank character after the word on the same line
    pub next_nonblank: Option<char>,
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_name(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `NAME=anything`
pub fn is_assignment(text: &str) -> bool {
    match text.find('=') {
        Some(eq) if eq > 0 => is_name(&text[..eq]),
        _ => false,
    }
}

pub fn is_reserved_word(text: &str) -> bool {
    RESERVED_WORDS.contains(text)
}

/// Classify a word token and update the parser state.
pub fn classify(text: &str, ahead: Lookahead, state: &mut ParserState) -> TokenKind {
    // Redirection targets and here-doc delimiters are always plain words.
    if state.after_redirect {
        state.after_redirect = false;
        return TokenKind::Word;
    }

    if state.after_for {
        state.after_for = false;
        state.expect_in = Some(InContext::For);
        state.command_position = false;
        return if is_name(text) {
            TokenKind::Name
        } else {
            TokenKind::Word
        };
    }

    if state.after_case {
        state.after_case = false;
        state.expect_in = Some(InContext::Case);
        state.command_position = false;
        return TokenKind::Word;
    }

    if let Some(context) = state.expect_in {
        match (text, context) {
            ("in", InContext::For) => {
                state.expect_in = None;
                state.command_position = false;
                return TokenKind::ReservedWord;
            }
            ("in", InContext::Case) => {
                state.expect_in = None;
                state.case_pattern = true;
                state.command_position = false;
                return TokenKind::ReservedWord;
            }
            ("do", InContext::For) => {
                state.expect_in = None;
                state.command_position = true;
                return TokenKind::ReservedWord;
            }
            _ => {}
        }
    }

    if state.case_pattern {
        if text == "esac" {
            state.case_pattern = false;
            state.case_depth = state.case_depth.saturating_sub(1);
            state.command_position = false;
            return TokenKind::ReservedWord;
        }
        return TokenKind::Word;
    }

    state.continuation = false;

    if state.command_position && is_reserved_word(text) {
        apply_reserved(text, state);
        return TokenKind::ReservedWord;
    }

    if state.command_position && is_assignment(text) {
        return TokenKind::AssignmentWord;
    }

    if !text.is_empty()
        && text.chars().all(|c| c.is_ascii_digit())
        && matches!(ahead.adjacent, Some('<') | Some('>'))
    {
        return TokenKind::IoNumber;
    }

    if state.command_position && is_name(text) && ahead.next_nonblank == Some('(') {
        state.command_position = false;
        return TokenKind::Name;
    }

    state.command_position = false;
    TokenKind::Word
}

fn apply_reserved(text: &str, state: &mut ParserState) {
    match text {
        "if" => state.if_depth += 1,
        "fi" => state.if_depth = state.if_depth.saturating_sub(1),
        "while" | "until" => state.loop_depth += 1,
        "for" => {
            state.loop_depth += 1;
            state.after_for = true;
        }
        "done" => state.loop_depth = state.loop_depth.saturating_sub(1),
        "case" => {
            state.case_depth += 1;
            state.after_case = true;
        }
        "esac" => state.case_depth = state.case_depth.saturating_sub(1),
        "{" => state.brace_depth += 1,
        "}" => state.brace_depth = state.brace_depth.saturating_sub(1),
        _ => {}
    }
    // Closing keywords may be followed by redirections or operators only.
    state.command_position = !matches!(text, "fi" | "done" | "esac" | "}" | "for" | "case");
}

/// Update the state for an operator token.
pub fn classify_operator(op: &str, state: &mut ParserState) {
    match op {
        "|" if state.case_pattern => {}
        "(" if state.case_pattern => {}
        ")" if state.case_pattern => {
            state.case_pattern = false;
            state.command_position = true;
        }
        "|" | "&&" | "||" => {
            state.continuation = true;
            state.command_position = true;
        }
        ";" | "&" => {
            state.continuation = false;
            state.command_position = true;
        }
        ";;" => {
            state.case_pattern = true;
            state.command_position = false;
        }
        "(" => {
            state.paren_depth += 1;
            state.command_position = true;
        }
        ")" => {
            state.paren_depth = state.paren_depth.saturating_sub(1);
            state.command_position = true;
        }
        "<<" | "<<-" => {
            state.continuation = false;
            state.after_redirect = true;
            state.pending_heredoc = Some(op == "<<-");
        }
        _ => {
            // A redirection can start the command after `&&`
            state.continuation = false;
            state.after_redirect = true;
        }
    }
}

/// Update the state for a newline token.
pub fn classify_newline(state: &mut ParserState) {
    if !state.case_pattern {
        state.command_position = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, state: &mut ParserState) -> TokenKind {
        classify(text, Lookahead::default(), state)
    }

    #[test]
    fn test_reserved_only_in_command_position() {
        let mut state = ParserState::new();
        assert_eq!(word("if", &mut state), TokenKind::ReservedWord);
        assert_eq!(state.if_depth, 1);
        assert_eq!(word("echo", &mut state), TokenKind::Word);
        assert_eq!(word("fi", &mut state), TokenKind::Word);
        assert_eq!(state.if_depth, 1);
    }

    #[test]
    fn test_assignment_words() {
        let mut state = ParserState::new();
        assert_eq!(word("FOO=bar", &mut state), TokenKind::AssignmentWord);
        assert_eq!(word("B=1", &mut state), TokenKind::AssignmentWord);
        assert_eq!(word("env", &mut state), TokenKind::Word);
        assert_eq!(word("X=1", &mut state), TokenKind::Word);
        assert!(!is_assignment("=x"));
        assert!(!is_assignment("1a=x"));
    }

    #[test]
    fn test_io_number() {
        let mut state = ParserState::new();
        let ahead = Lookahead {
            adjacent: Some('>'),
            next_nonblank: Some('>'),
        };
        assert_eq!(classify("2", ahead, &mut state), TokenKind::IoNumber);
        let spaced = Lookahead {
            adjacent: Some(' '),
            next_nonblank: Some('>'),
        };
        assert_eq!(classify("2", spaced, &mut state), TokenKind::Word);
    }

    #[test]
    fn test_function_name() {
        let mut state = ParserState::new();
        let ahead = Lookahead {
            adjacent: Some('('),
            next_nonblank: Some('('),
        };
        assert_eq!(classify("greet", ahead, &mut state), TokenKind::Name);
    }

    #[test]
    fn test_for_variable_and_in() {
        let mut state = ParserState::new();
        assert_eq!(word("for", &mut state), TokenKind::ReservedWord);
        assert_eq!(word("i", &mut state), TokenKind::Name);
        assert_eq!(word("in", &mut state), TokenKind::ReservedWord);
        assert_eq!(word("a=b", &mut state), TokenKind::Word);
        assert_eq!(word("do", &mut state), TokenKind::Word);
        classify_operator(";", &mut state);
        assert_eq!(word("do", &mut state), TokenKind::ReservedWord);
        assert_eq!(state.loop_depth, 1);
    }

    #[test]
    fn test_case_patterns_are_words() {
        let mut state = ParserState::new();
        assert_eq!(word("case", &mut state), TokenKind::ReservedWord);
        assert_eq!(word("X=1", &mut state), TokenKind::Word);
        assert_eq!(word("in", &mut state), TokenKind::ReservedWord);
        assert!(state.case_pattern);
        assert_eq!(word("if", &mut state), TokenKind::Word);
        classify_operator(")", &mut state);
        assert!(state.command_position);
        assert_eq!(word("A=1", &mut state), TokenKind::AssignmentWord);
        classify_operator(";;", &mut state);
        assert_eq!(word("esac", &mut state), TokenKind::ReservedWord);
        assert_eq!(state.case_depth, 0);
    }

    #[test]
    fn test_redirect_target_is_word() {
        let mut state = ParserState::new();
        classify_operator(">", &mut state);
        assert_eq!(word("if", &mut state), TokenKind::Word);
        assert!(state.command_position);
    }

    #[test]
    fn test_braces() {
        let mut state = ParserState::new();
        assert_eq!(word("{", &mut state), TokenKind::ReservedWord);
        assert!(state.needs_more());
        assert_eq!(word("}", &mut state), TokenKind::ReservedWord);
        assert!(!state.needs_more());
    }
}
