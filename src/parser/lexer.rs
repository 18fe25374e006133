//! Lexer for shell input
//!
//! The lexer pulls lines from a [`LineSource`] only when the parser asks for
//! another token, so an unfinished construct naturally reads (and prompts
//! for) its continuation lines. It handles:
//! - Operators (longest match)
//! - Words, kept as raw text with their quotes
//! - Comments and backslash-newline continuations
//! - Here-documents, captured out of line as soon as the delimiter is seen

use crate::parser::classify::{classify, classify_newline, classify_operator, Lookahead};
use crate::parser::source::LineSource;
use crate::parser::types::{HereDoc, ParseError, ParserState, Token, TokenKind};

/// Operators, longest first
const OPERATORS: &[&str] = &[
    "<<-", "&&", "||", ";;", "<<", ">>", "<&", ">&", "<>", ">|", "<", ">", "&", "(", ")", ";",
    "|",
];

fn is_blank(c: char) -> bool {
    c != '\n' && (c == ' ' || c == '\t' || c.is_control())
}

/// Check if a character ends a plain word
fn is_word_boundary(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | ';' | '&' | '|' | '(' | ')' | '<' | '>')
}

/// Indexed character access that may need to read more input.
///
/// Used by the quote/substitution scanners so the same balancing rules serve
/// the lexer (which pulls continuation lines) and the expander (complete text).
pub trait CharFeed {
    fn at(&mut self, i: usize) -> Result<Option<char>, ParseError>;
    fn line(&self) -> usize;
}

/// A complete slice of characters
pub struct SliceFeed<'a>(pub &'a [char]);

impl CharFeed for SliceFeed<'_> {
    fn at(&mut self, i: usize) -> Result<Option<char>, ParseError> {
        Ok(self.0.get(i).copied())
    }

    fn line(&self) -> usize {
        0
    }
}

fn expect_char<F: CharFeed + ?Sized>(feed: &mut F, i: usize, what: &str) -> Result<char, ParseError> {
    match feed.at(i)? {
        Some(c) => Ok(c),
        None => Err(ParseError::new(format!("unterminated {}", what), feed.line())),
    }
}

/// `i` is at an opening `'`; returns the index just past the closing one.
pub fn skip_single<F: CharFeed + ?Sized>(feed: &mut F, mut i: usize) -> Result<usize, ParseError> {
    i += 1;
    while expect_char(feed, i, "quote")? != '\'' {
        i += 1;
    }
    Ok(i + 1)
}

/// `i` is at an opening `"`; returns the index just past the closing one.
pub fn skip_double<F: CharFeed + ?Sized>(feed: &mut F, mut i: usize) -> Result<usize, ParseError> {
    i += 1;
    loop {
        match expect_char(feed, i, "quote")? {
            '\\' => {
                expect_char(feed, i + 1, "quote")?;
                i += 2;
            }
            '"' => return Ok(i + 1),
            '$' => i = skip_dollar(feed, i)?,
            '`' => i = skip_backtick(feed, i)?,
            _ => i += 1,
        }
    }
}

/// `i` is at an opening backquote.
pub fn skip_backtick<F: CharFeed + ?Sized>(feed: &mut F, mut i: usize) -> Result<usize, ParseError> {
    i += 1;
    loop {
        match expect_char(feed, i, "command substitution")? {
            '\\' => {
                expect_char(feed, i + 1, "command substitution")?;
                i += 2;
            }
            '`' => return Ok(i + 1),
            _ => i += 1,
        }
    }
}

/// `i` is at a `$`; skips `$( )` and `${ }` bodies, otherwise just the `$`.
pub fn skip_dollar<F: CharFeed + ?Sized>(feed: &mut F, i: usize) -> Result<usize, ParseError> {
    match feed.at(i + 1)? {
        Some('(') => skip_command_substitution(feed, i + 2),
        Some('{') => skip_group(feed, i + 2, '{', '}', "parameter expansion"),
        _ => Ok(i + 1),
    }
}

fn skip_group<F: CharFeed + ?Sized>(
    feed: &mut F,
    mut i: usize,
    open: char,
    close: char,
    what: &str,
) -> Result<usize, ParseError> {
    let mut depth = 1;
    loop {
        match expect_char(feed, i, what)? {
            '\\' => {
                expect_char(feed, i + 1, what)?;
                i += 2;
            }
            '\'' => i = skip_single(feed, i)?,
            '"' => i = skip_double(feed, i)?,
            '`' => i = skip_backtick(feed, i)?,
            '$' => i = skip_dollar(feed, i)?,
            c if c == open => {
                depth += 1;
                i += 1;
            }
            c if c == close => {
                depth -= 1;
                i += 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => i += 1,
        }
    }
}

/// Where a `case` met inside `$( )` stands
#[derive(Clone, Copy, PartialEq, Eq)]
enum CaseWord {
    None,
    Subject,
    In,
}

/// Tracks just enough of the command language inside `$( )` to tell a
/// case pattern's `)` from the one closing the substitution.
struct SubstitutionScan {
    depth: usize,
    word: String,
    /// The word being read began where a command may start
    word_at_start: bool,
    /// The word contains quoting and cannot be a reserved word
    word_quoted: bool,
    at_start: bool,
    pending: CaseWord,
    open_cases: usize,
    in_pattern: bool,
}

impl SubstitutionScan {
    fn new() -> Self {
        Self {
            depth: 1,
            word: String::new(),
            word_at_start: true,
            word_quoted: false,
            at_start: true,
            pending: CaseWord::None,
            open_cases: 0,
            in_pattern: false,
        }
    }

    fn begin_word(&mut self) {
        if self.word.is_empty() && !self.word_quoted {
            self.word_at_start = self.at_start;
        }
    }

    fn push(&mut self, c: char) {
        self.begin_word();
        self.word.push(c);
    }

    fn quoted_part(&mut self) {
        self.begin_word();
        self.word_quoted = true;
    }

    fn finish_word(&mut self) {
        if self.word.is_empty() && !self.word_quoted {
            return;
        }
        let word = std::mem::take(&mut self.word);
        let reserved = !std::mem::take(&mut self.word_quoted);
        match self.pending {
            CaseWord::Subject => self.pending = CaseWord::In,
            CaseWord::In => {
                self.pending = CaseWord::None;
                if reserved && word == "in" {
                    self.open_cases += 1;
                    self.in_pattern = true;
                }
            }
            CaseWord::None if self.in_pattern => {
                if reserved && word == "esac" {
                    self.open_cases = self.open_cases.saturating_sub(1);
                    self.in_pattern = false;
                }
            }
            CaseWord::None if reserved && self.word_at_start => match word.as_str() {
                "case" => self.pending = CaseWord::Subject,
                "esac" if self.open_cases > 0 => self.open_cases -= 1,
                "if" | "then" | "else" | "elif" | "while" | "until" | "do" | "{" | "!" => return,
                _ => {}
            },
            CaseWord::None => {}
        }
        self.at_start = false;
    }
}

/// `i` is just past `$(`; returns the index just past the matching `)`.
fn skip_command_substitution<F: CharFeed + ?Sized>(feed: &mut F, mut i: usize) -> Result<usize, ParseError> {
    let what = "command substitution";
    let mut scan = SubstitutionScan::new();
    loop {
        match expect_char(feed, i, what)? {
            '\\' => {
                if expect_char(feed, i + 1, what)? != '\n' {
                    scan.quoted_part();
                }
                i += 2;
            }
            '\'' => {
                scan.quoted_part();
                i = skip_single(feed, i)?;
            }
            '"' => {
                scan.quoted_part();
                i = skip_double(feed, i)?;
            }
            '`' => {
                scan.quoted_part();
                i = skip_backtick(feed, i)?;
            }
            '$' => {
                scan.quoted_part();
                i = skip_dollar(feed, i)?;
            }
            '#' if scan.word.is_empty() && !scan.word_quoted => {
                while !matches!(feed.at(i)?, Some('\n') | None) {
                    i += 1;
                }
            }
            ' ' | '\t' => {
                scan.finish_word();
                i += 1;
            }
            '\n' => {
                scan.finish_word();
                if scan.pending == CaseWord::None {
                    scan.at_start = true;
                }
                i += 1;
            }
            ';' => {
                scan.finish_word();
                if feed.at(i + 1)? == Some(';') && scan.open_cases > 0 {
                    scan.in_pattern = true;
                    i += 2;
                } else {
                    scan.at_start = true;
                    i += 1;
                }
            }
            '&' | '|' => {
                scan.finish_word();
                scan.at_start = true;
                i += 1;
            }
            '<' | '>' => {
                scan.finish_word();
                scan.at_start = false;
                i += 1;
            }
            '(' => {
                scan.finish_word();
                if !scan.in_pattern {
                    scan.depth += 1;
                    scan.at_start = true;
                }
                i += 1;
            }
            ')' => {
                scan.finish_word();
                i += 1;
                if scan.in_pattern {
                    scan.in_pattern = false;
                    scan.at_start = true;
                    continue;
                }
                scan.depth -= 1;
                if scan.depth == 0 {
                    return Ok(i);
                }
                scan.at_start = false;
            }
            c => {
                scan.push(c);
                i += 1;
            }
        }
    }
}

/// Remove quotes and backslashes from a here-document delimiter word.
pub fn unquote_delimiter(raw: &str) -> String {
    let mut out = String::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {}
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

pub struct Lexer {
    source: Box<dyn LineSource>,
    /// Text of the current unit (and possibly the rest of its last line)
    buf: Vec<char>,
    pos: usize,
    line: usize,
    eof: bool,
    /// A line has been read since the unit started: further reads are continuations
    pulled_in_unit: bool,
    /// Echo input lines to stderr as they are read (set -v)
    verbose: bool,
}

impl CharFeed for Lexer {
    fn at(&mut self, i: usize) -> Result<Option<char>, ParseError> {
        while i >= self.buf.len() {
            if !self.pull()? {
                return Ok(None);
            }
        }
        Ok(Some(self.buf[i]))
    }

    fn line(&self) -> usize {
        self.line
    }
}

impl Lexer {
    pub fn new(source: Box<dyn LineSource>) -> Self {
        Self {
            source,
            buf: Vec::new(),
            pos: 0,
            line: 0,
            eof: false,
            pulled_in_unit: false,
            verbose: false,
        }
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Drop consumed text; the next read (if any) gets the primary prompt.
    pub fn begin_unit(&mut self) {
        self.buf.drain(..self.pos);
        self.pos = 0;
        self.pulled_in_unit = false;
    }

    /// Discard the rest of the buffered input after an error.
    pub fn recover(&mut self) {
        self.buf.clear();
        self.pos = 0;
    }

    /// Source text between two token offsets of the current unit
    pub fn text(&self, start: usize, end: usize) -> String {
        let end = end.min(self.buf.len());
        if start >= end {
            return String::new();
        }
        self.buf[start..end].iter().collect::<String>().trim().to_string()
    }

    fn pull(&mut self) -> Result<bool, ParseError> {
        if self.eof {
            return Ok(false);
        }
        match self.source.read_line(self.pulled_in_unit) {
            Ok(Some(line)) => {
                self.pulled_in_unit = true;
                self.line += 1;
                if self.verbose {
                    eprint!("{}", line);
                }
                self.buf.extend(line.chars());
                Ok(true)
            }
            Ok(None) => {
                self.eof = true;
                Ok(false)
            }
            Err(e) => {
                self.eof = true;
                Err(ParseError::new(format!("read error: {}", e), self.line))
            }
        }
    }

    fn token(&self, text: String, kind: TokenKind, start: usize) -> Token {
        Token {
            text,
            kind,
            heredoc: None,
            start,
            end: self.pos,
            line: self.line,
        }
    }

    /// Produce the next classified token.
    pub fn next_token(&mut self, state: &mut ParserState) -> Result<Token, ParseError> {
        self.skip_blanks()?;
        let start = self.pos;
        let c = match self.at(start)? {
            Some(c) => c,
            None => {
                if let Some(expecting) = state.open_construct() {
                    return Err(ParseError::new(
                        format!("syntax error: unexpected end of file (expecting {})", expecting),
                        self.line,
                    ));
                }
                return Ok(self.token(String::new(), TokenKind::Eof, start));
            }
        };

        if c == '\n' {
            self.pos += 1;
            classify_newline(state);
            return Ok(self.token("\n".to_string(), TokenKind::Newline, start));
        }

        if let Some(op) = self.match_operator(start) {
            self.pos += op.len();
            classify_operator(op, state);
            return Ok(self.token(op.to_string(), TokenKind::Operator, start));
        }

        let end = self.scan_word(start)?;
        let text: String = self.buf[start..end].iter().collect();
        self.pos = end;
        let ahead = Lookahead {
            adjacent: self.buf.get(end).copied(),
            next_nonblank: self.buf[end..].iter().copied().find(|c| !is_blank(*c)),
        };
        let heredoc = state.pending_heredoc.take();
        let kind = classify(&text, ahead, state);
        let mut token = self.token(text, kind, start);
        if let Some(strip_tabs) = heredoc {
            token.heredoc = Some(self.read_heredoc(&token.text, strip_tabs)?);
        }
        Ok(token)
    }

    fn skip_blanks(&mut self) -> Result<(), ParseError> {
        loop {
            match self.at(self.pos)? {
                Some(c) if is_blank(c) => self.pos += 1,
                Some('\\') if self.at(self.pos + 1)? == Some('\n') => {
                    self.buf.drain(self.pos..self.pos + 2);
                }
                Some('#') => {
                    while let Some(c) = self.buf.get(self.pos) {
                        if *c == '\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn match_operator(&self, start: usize) -> Option<&'static str> {
        OPERATORS.iter().copied().find(|op| {
            op.chars()
                .enumerate()
                .all(|(k, expected)| self.buf.get(start + k) == Some(&expected))
        })
    }

    fn scan_word(&mut self, start: usize) -> Result<usize, ParseError> {
        let mut i = start;
        loop {
            let c = match self.at(i)? {
                Some(c) => c,
                None => break,
            };
            match c {
                '\\' => match self.at(i + 1)? {
                    Some('\n') => {
                        self.buf.drain(i..i + 2);
                    }
                    Some(_) => i += 2,
                    None => i += 1,
                },
                '\'' => i = skip_single(self, i)?,
                '"' => i = skip_double(self, i)?,
                '`' => i = skip_backtick(self, i)?,
                '$' => i = skip_dollar(self, i)?,
                c if is_word_boundary(c) || is_blank(c) => break,
                _ => i += 1,
            }
        }
        Ok(i)
    }

    /// Capture the lines following the current line up to `delimiter_raw`,
    /// and splice them out of the buffer so scanning resumes after the
    /// delimiter word as if the body were not there.
    fn read_heredoc(&mut self, delimiter_raw: &str, strip_tabs: bool) -> Result<HereDoc, ParseError> {
        let delimiter = unquote_delimiter(delimiter_raw);
        let quoted = delimiter_raw.contains(['\'', '"', '\\']);
        let unterminated = |line| {
            ParseError::new(
                format!("unterminated here-document (wanted `{}')", delimiter),
                line,
            )
        };

        let mut nl = self.pos;
        loop {
            match self.buf.get(nl) {
                Some('\n') => break,
                Some(_) => nl += 1,
                None => return Err(unterminated(self.line)),
            }
        }

        let body_start = nl + 1;
        let mut j = body_start;
        let mut body = String::new();
        loop {
            let mut k = j;
            let line_end = loop {
                match self.at(k)? {
                    Some('\n') => break Some(k),
                    Some(_) => k += 1,
                    None => break None,
                }
            };
            if line_end.is_none() && k == j {
                return Err(unterminated(self.line));
            }
            let text_end = line_end.unwrap_or(k);
            let mut text: String = self.buf[j..text_end].iter().collect();
            if strip_tabs {
                text = text.trim_start_matches('\t').to_string();
            }
            let next = line_end.map(|e| e + 1).unwrap_or(k);
            if text == delimiter {
                self.buf.drain(body_start..next);
                return Ok(HereDoc { body, quoted });
            }
            if line_end.is_none() {
                return Err(unterminated(self.line));
            }
            body.push_str(&text);
            body.push('\n');
            j = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::source::StrSource;

    fn lex(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(Box::new(StrSource::new(input)));
        let mut state = ParserState::new();
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token(&mut state).unwrap();
            let done = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        tokens
    }

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_simple_words() {
        let tokens = lex("echo hello world\n");
        assert_eq!(texts(&tokens), vec!["echo", "hello", "world", "\n", ""]);
        assert_eq!(tokens[3].kind, TokenKind::Newline);
    }

    #[test]
    fn test_longest_match_operators() {
        let tokens = lex("a&&b||c;;d>>e<<-f\nf\n");
        assert_eq!(texts(&tokens)[..10], ["a", "&&", "b", "||", "c", ";;", "d", ">>", "e", "<<-"]);
    }

    #[test]
    fn test_quotes_stay_in_word() {
        let tokens = lex("echo 'a b' \"c $(echo d) e\" f\\ g\n");
        assert_eq!(texts(&tokens)[..4], ["echo", "'a b'", "\"c $(echo d) e\"", "f\\ g"]);
    }

    #[test]
    fn test_operator_inside_quotes() {
        let tokens = lex("echo 'a;b' \"x|y\"\n");
        assert_eq!(texts(&tokens)[..3], ["echo", "'a;b'", "\"x|y\""]);
    }

    #[test]
    fn test_multiline_quote() {
        let tokens = lex("echo 'a\nb'\n");
        assert_eq!(tokens[1].text, "'a\nb'");
    }

    #[test]
    fn test_unterminated_quote() {
        let mut lexer = Lexer::new(Box::new(StrSource::new("echo 'abc\n")));
        let mut state = ParserState::new();
        lexer.next_token(&mut state).unwrap();
        let err = lexer.next_token(&mut state).unwrap_err();
        assert!(err.message.contains("unterminated quote"));
    }

    fn lex_error(input: &str) -> String {
        let mut lexer = Lexer::new(Box::new(StrSource::new(input)));
        let mut state = ParserState::new();
        loop {
            match lexer.next_token(&mut state) {
                Ok(tok) if tok.kind == TokenKind::Eof => panic!("no error for {:?}", input),
                Ok(_) => {}
                Err(e) => return e.message,
            }
        }
    }

    #[test]
    fn test_end_of_input_inside_construct() {
        assert!(lex_error("if true; then echo a
").ends_with("(expecting `fi')"));
        assert!(lex_error("while true; do { echo a; }
").ends_with("(expecting `done')"));
        assert!(lex_error("case x in
").ends_with("(expecting `esac')"));
        assert!(lex_error("echo a |
").ends_with("(expecting a word)"));
        assert!(lex_error("for i
").ends_with("(expecting `in' or `do')"));
    }

    #[test]
    fn test_closed_constructs_reach_eof() {
        let tokens = lex("if a; then { b; }; fi
f() ( c )
true && >out
for i in x; do :; done
");
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn test_comments() {
        let tokens = lex("echo a # comment\necho b#c\n");
        assert_eq!(texts(&tokens), vec!["echo", "a", "\n", "echo", "b#c", "\n", ""]);
    }

    #[test]
    fn test_line_continuation() {
        let tokens = lex("echo ab\\\ncd\n");
        assert_eq!(texts(&tokens)[..2], ["echo", "abcd"]);
    }

    #[test]
    fn test_nested_substitution() {
        let tokens = lex("echo $(echo $(echo ok))\n");
        assert_eq!(tokens[1].text, "$(echo $(echo ok))");
    }

    #[test]
    fn test_case_pattern_inside_substitution() {
        let tokens = lex("echo $(case x in x) echo inner;; esac) after\n");
        assert_eq!(tokens[1].text, "$(case x in x) echo inner;; esac)");
        assert_eq!(tokens[2].text, "after");

        let tokens = lex("v=$(case $1 in (a|b) echo ab ;; *) echo other\nesac)\n");
        assert_eq!(tokens[0].text, "v=$(case $1 in (a|b) echo ab ;; *) echo other\nesac)");

        let tokens = lex("echo $(echo case; echo x) y\n");
        assert_eq!(tokens[1].text, "$(echo case; echo x)");
        assert_eq!(tokens[2].text, "y");
    }

    #[test]
    fn test_heredoc_captured_out_of_line() {
        let tokens = lex("cat <<END; echo after\nline one\n  line two\nEND\necho next\n");
        assert_eq!(tokens[2].text, "END");
        let doc = tokens[2].heredoc.as_ref().unwrap();
        assert_eq!(doc.body, "line one\n  line two\n");
        assert!(!doc.quoted);
        assert_eq!(texts(&tokens)[3..], [";", "echo", "after", "\n", "echo", "next", "\n", ""]);
    }

    #[test]
    fn test_heredoc_strip_tabs() {
        let tokens = lex("cat <<-'EOF'\n\tindented\n\t\tmore\n\tEOF\n");
        let doc = tokens[2].heredoc.as_ref().unwrap();
        assert_eq!(doc.body, "indented\nmore\n");
        assert!(doc.quoted);
    }

    #[test]
    fn test_unterminated_heredoc() {
        let mut lexer = Lexer::new(Box::new(StrSource::new("cat <<EOF\nbody\n")));
        let mut state = ParserState::new();
        lexer.next_token(&mut state).unwrap();
        lexer.next_token(&mut state).unwrap();
        let err = lexer.next_token(&mut state).unwrap_err();
        assert!(err.message.contains("unterminated here-document"));
    }

    #[test]
    fn test_io_number_classification() {
        let tokens = lex("echo 2>err 2 >out\n");
        assert_eq!(tokens[1].kind, TokenKind::IoNumber);
        assert_eq!(tokens[4].kind, TokenKind::Word);
    }

    #[test]
    fn test_unquote_delimiter() {
        assert_eq!(unquote_delimiter("'EOF'"), "EOF");
        assert_eq!(unquote_delimiter("E\\OF"), "EOF");
        assert_eq!(unquote_delimiter("\"E\"OF"), "EOF");
    }
}
