//! Word Expansion
//!
//! Handles shell word expansion including:
//! - Tilde expansion (`~`, `~/dir`)
//! - Parameter expansion (`$VAR`, `${VAR:-default}`, `${#VAR}`, ...)
//! - Command substitution (`$(cmd)`, `` `cmd` ``)
//! - Quote removal
//! - Field splitting on IFS
//!
//! Words are scanned left to right straight from their raw source text; the
//! quote state found while scanning decides what is expanded and what is
//! split. Pathname expansion is not performed.

pub mod command_substitution;
pub mod parameter;
pub mod pattern;
pub mod word_split;

use crate::ast::types::WordNode;
use crate::interpreter::environment::Env;
use crate::interpreter::errors::ShellError;
use crate::interpreter::helpers::ifs::get_ifs;
use crate::interpreter::interpreter::Interpreter;
use crate::parser::lexer::{skip_backtick, skip_double, skip_single, SliceFeed};

pub use pattern::{glob_matches, remove_pattern, PatternRemovalSide};
pub use word_split::{join_segments, pattern_text, split_fields, Segment};

/// Append literal text, merging with a preceding literal segment
fn push_literal(out: &mut Vec<Segment>, text: &str) {
    if let Some(Segment::Text {
        value,
        splittable: false,
        quoted: false,
    }) = out.last_mut()
    {
        value.push_str(text);
        return;
    }
    out.push(Segment::literal(text));
}

fn collect(chars: &[char]) -> String {
    chars.iter().collect()
}

/// Body of a backquoted substitution with its escapes removed
fn unescape_backtick(body: &[char]) -> String {
    let mut out = String::new();
    let mut i = 0;
    while i < body.len() {
        if body[i] == '\\' && matches!(body.get(i + 1), Some('$' | '`' | '\\')) {
            out.push(body[i + 1]);
            i += 2;
        } else {
            out.push(body[i]);
            i += 1;
        }
    }
    out
}

impl Interpreter {
    /// Expand a word into fields: command arguments and `for` lists.
    pub fn expand_fields(&mut self, env: &mut Env, word: &WordNode) -> Result<Vec<String>, ShellError> {
        let segments = self.expand_segments(env, &word.raw)?;
        Ok(split_fields(&segments, get_ifs(env)))
    }

    /// Expand a word to a single string without field splitting:
    /// assignments, redirection targets and `case` subjects.
    pub fn expand_word(&mut self, env: &mut Env, word: &WordNode) -> Result<String, ShellError> {
        let segments = self.expand_segments(env, &word.raw)?;
        Ok(join_segments(&segments))
    }

    /// Expand a `case` pattern; quoted parts lose their pattern meaning.
    pub fn expand_pattern(&mut self, env: &mut Env, raw: &str) -> Result<String, ShellError> {
        let segments = self.expand_segments(env, raw)?;
        Ok(pattern_text(&segments))
    }

    /// Expand an unquoted here-document body: parameters, substitutions and
    /// backslash before `$`, `` ` ``, `\` or newline. Quotes are ordinary.
    pub fn expand_heredoc(&mut self, env: &mut Env, body: &str) -> Result<String, ShellError> {
        let chars: Vec<char> = body.chars().collect();
        let mut out = Vec::new();
        self.expand_double_body(env, &chars, true, &mut out)?;
        Ok(join_segments(&out))
    }

    pub(crate) fn expand_segments(&mut self, env: &mut Env, raw: &str) -> Result<Vec<Segment>, ShellError> {
        let chars: Vec<char> = raw.chars().collect();
        let mut out = Vec::new();
        let mut i = 0;

        if chars.first() == Some(&'~') && (chars.len() == 1 || chars[1] == '/') {
            if let Some(home) = env.value("HOME") {
                out.push(Segment::quoted(home));
                i = 1;
            }
        }

        while i < chars.len() {
            match chars[i] {
                '\'' => {
                    let end = skip_single(&mut SliceFeed(&chars), i)?;
                    out.push(Segment::quoted(collect(&chars[i + 1..end - 1])));
                    i = end;
                }
                '"' => {
                    let end = skip_double(&mut SliceFeed(&chars), i)?;
                    let body = &chars[i + 1..end - 1];
                    let start = out.len();
                    let saw_at = self.expand_double_body(env, body, false, &mut out)?;
                    if out.len() == start && !saw_at {
                        out.push(Segment::quoted(""));
                    }
                    i = end;
                }
                '\\' => {
                    match chars.get(i + 1) {
                        Some(&next) => out.push(Segment::quoted(next.to_string())),
                        None => push_literal(&mut out, "\\"),
                    }
                    i += 2;
                }
                '$' => i = self.expand_dollar(env, &chars, i, false, &mut out)?,
                '`' => {
                    let end = skip_backtick(&mut SliceFeed(&chars), i)?;
                    let body = unescape_backtick(&chars[i + 1..end - 1]);
                    let value = self.command_substitution(env, &body)?;
                    out.push(Segment::expanded(value, false));
                    i = end;
                }
                c => {
                    let mut buf = [0u8; 4];
                    push_literal(&mut out, c.encode_utf8(&mut buf));
                    i += 1;
                }
            }
        }
        Ok(out)
    }

    /// Inside double quotes (or a here-document): only `$`, backquotes and
    /// some backslashes are special, and every result is quoted.
    ///
    /// Returns whether `$@` was expanded, since `"$@"` with no positional
    /// parameters yields no field at all.
    pub(crate) fn expand_double_body(
        &mut self,
        env: &mut Env,
        chars: &[char],
        heredoc: bool,
        out: &mut Vec<Segment>,
    ) -> Result<bool, ShellError> {
        let mut buf = String::new();
        let mut saw_at = false;
        let mut i = 0;
        while i < chars.len() {
            match chars[i] {
                '\\' => match chars.get(i + 1) {
                    Some('\n') => i += 2,
                    Some(&next @ ('$' | '`' | '\\')) => {
                        buf.push(next);
                        i += 2;
                    }
                    Some('"') if !heredoc => {
                        buf.push('"');
                        i += 2;
                    }
                    _ => {
                        buf.push('\\');
                        i += 1;
                    }
                },
                '$' => {
                    if !buf.is_empty() {
                        out.push(Segment::quoted(std::mem::take(&mut buf)));
                    }
                    saw_at |= names_all_positionals(&chars[i + 1..]);
                    i = self.expand_dollar(env, chars, i, true, out)?;
                }
                '`' => {
                    if !buf.is_empty() {
                        out.push(Segment::quoted(std::mem::take(&mut buf)));
                    }
                    let end = skip_backtick(&mut SliceFeed(chars), i)?;
                    let body = unescape_backtick(&chars[i + 1..end - 1]);
                    let value = self.command_substitution(env, &body)?;
                    out.push(Segment::expanded(value, true));
                    i = end;
                }
                c => {
                    buf.push(c);
                    i += 1;
                }
            }
        }
        if !buf.is_empty() {
            out.push(Segment::quoted(buf));
        }
        Ok(saw_at)
    }
}

/// `@` or `{@}` right after a `$`
fn names_all_positionals(rest: &[char]) -> bool {
    rest.first() == Some(&'@') || rest.starts_with(&['{', '@', '}'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(raw: &str) -> WordNode {
        WordNode { raw: raw.to_string() }
    }

    fn setup() -> (Interpreter, Env) {
        let mut env = Env::new("test", "sh");
        env.set("X", "hello").unwrap();
        env.set("SPACED", "a  b c").unwrap();
        env.set("EMPTY", "").unwrap();
        env.set("HOME", "/home/me").unwrap();
        env.set_positional(vec!["one".into(), "two words".into()]);
        (Interpreter::new(), env)
    }

    #[test]
    fn test_single_quotes_verbatim() {
        let (mut interp, mut env) = setup();
        for s in ["plain", "$X `cmd` \\n \"q\"", "", "${X:-y} $(echo)"] {
            let raw = format!("'{}'", s);
            assert_eq!(interp.expand_word(&mut env, &word(&raw)).unwrap(), s);
        }
    }

    #[test]
    fn test_variables_and_splitting() {
        let (mut interp, mut env) = setup();
        assert_eq!(interp.expand_fields(&mut env, &word("$X")).unwrap(), vec!["hello"]);
        assert_eq!(interp.expand_fields(&mut env, &word("$SPACED")).unwrap(), vec!["a", "b", "c"]);
        assert_eq!(interp.expand_fields(&mut env, &word("\"$SPACED\"")).unwrap(), vec!["a  b c"]);
        assert_eq!(interp.expand_fields(&mut env, &word("${X}x")).unwrap(), vec!["hellox"]);
        assert!(interp.expand_fields(&mut env, &word("$EMPTY")).unwrap().is_empty());
        assert!(interp.expand_fields(&mut env, &word("$UNSET")).unwrap().is_empty());
        assert_eq!(interp.expand_fields(&mut env, &word("\"\"")).unwrap(), vec![""]);
        assert_eq!(interp.expand_fields(&mut env, &word("\"$EMPTY\"")).unwrap(), vec![""]);
    }

    #[test]
    fn test_backslashes() {
        let (mut interp, mut env) = setup();
        assert_eq!(interp.expand_word(&mut env, &word("\\$X")).unwrap(), "$X");
        assert_eq!(interp.expand_word(&mut env, &word("\"\\$X \\a\"")).unwrap(), "$X \\a");
        assert_eq!(interp.expand_word(&mut env, &word("a\\ b")).unwrap(), "a b");
    }

    #[test]
    fn test_positional_at() {
        let (mut interp, mut env) = setup();
        assert_eq!(
            interp.expand_fields(&mut env, &word("\"$@\"")).unwrap(),
            vec!["one", "two words"]
        );
        assert_eq!(
            interp.expand_fields(&mut env, &word("$@")).unwrap(),
            vec!["one", "two", "words"]
        );
        assert_eq!(
            interp.expand_fields(&mut env, &word("\"$*\"")).unwrap(),
            vec!["one two words"]
        );
        env.set_positional(vec![]);
        assert!(interp.expand_fields(&mut env, &word("\"$@\"")).unwrap().is_empty());
        assert!(interp.expand_fields(&mut env, &word("\"${@}\"")).unwrap().is_empty());
        assert_eq!(interp.expand_fields(&mut env, &word("\"\"")).unwrap(), vec![""]);
        assert_eq!(interp.expand_fields(&mut env, &word("\"\\$@\"")).unwrap(), vec!["$@"]);
    }

    #[test]
    fn test_tilde() {
        let (mut interp, mut env) = setup();
        assert_eq!(interp.expand_word(&mut env, &word("~")).unwrap(), "/home/me");
        assert_eq!(interp.expand_word(&mut env, &word("~/src")).unwrap(), "/home/me/src");
        assert_eq!(interp.expand_word(&mut env, &word("a~")).unwrap(), "a~");
        assert_eq!(interp.expand_word(&mut env, &word("'~'")).unwrap(), "~");
    }

    #[test]
    fn test_pattern_quoting() {
        let (mut interp, mut env) = setup();
        assert_eq!(interp.expand_pattern(&mut env, "*.txt").unwrap(), "*.txt");
        assert_eq!(interp.expand_pattern(&mut env, "'*'.txt").unwrap(), "\\*.txt");
        assert_eq!(interp.expand_pattern(&mut env, "\\?").unwrap(), "\\?");
    }

    #[test]
    fn test_heredoc_body() {
        let (mut interp, mut env) = setup();
        assert_eq!(
            interp.expand_heredoc(&mut env, "say \"$X\" '$X' \\$X\n").unwrap(),
            "say \"hello\" 'hello' $X\n"
        );
    }

    #[test]
    fn test_unterminated() {
        let (mut interp, mut env) = setup();
        assert!(matches!(
            interp.expand_word(&mut env, &word("${X")),
            Err(ShellError::Parse(_))
        ));
        assert!(matches!(
            interp.expand_word(&mut env, &word("'abc")),
            Err(ShellError::Parse(_))
        ));
    }
}
