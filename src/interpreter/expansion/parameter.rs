//! Parameter Expansion
//!
//! `$NAME`, the special parameters and the braced `${...}` forms:
//! - `${NAME:-word}` / `${NAME-word}`: default value
//! - `${NAME:=word}` / `${NAME=word}`: assign default
//! - `${NAME:?word}` / `${NAME?word}`: error if unset (or null)
//! - `${NAME:+word}` / `${NAME+word}`: alternate value
//! - `${#NAME}`: length
//! - `${NAME%pat}`, `${NAME%%pat}`, `${NAME#pat}`, `${NAME##pat}`: pattern removal

use crate::interpreter::environment::Env;
use crate::interpreter::errors::ShellError;
use crate::interpreter::expansion::pattern::{remove_pattern, PatternRemovalSide};
use crate::interpreter::expansion::word_split::{join_segments, pattern_text, Segment};
use crate::interpreter::helpers::ifs::get_ifs_separator;
use crate::interpreter::interpreter::Interpreter;
use crate::parser::classify::is_name;
use crate::parser::lexer::{skip_dollar, SliceFeed};

/// Current value of a parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Unset,
    Value(String),
    /// `$@` and `$*`
    Fields(Vec<String>),
}

impl ParamValue {
    fn is_set(&self) -> bool {
        match self {
            Self::Unset => false,
            Self::Value(_) => true,
            Self::Fields(fields) => !fields.is_empty(),
        }
    }

    fn is_null(&self) -> bool {
        match self {
            Self::Unset => true,
            Self::Value(v) => v.is_empty(),
            Self::Fields(fields) => fields.iter().all(|f| f.is_empty()),
        }
    }

    fn joined(&self, separator: &str) -> String {
        match self {
            Self::Unset => String::new(),
            Self::Value(v) => v.clone(),
            Self::Fields(fields) => fields.join(separator),
        }
    }
}

/// Single-character special parameters
fn is_special(c: char) -> bool {
    matches!(c, '?' | '$' | '!' | '#' | '-' | '*' | '@') || c.is_ascii_digit()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Default,
    Assign,
    Error,
    Alternate,
    Remove(PatternRemovalSide, bool),
}

/// Operator at the start of `rest`: (op, checks null as well as unset, length)
fn parse_op(rest: &[char]) -> Option<(Op, bool, usize)> {
    let colon = rest.first() == Some(&':');
    let at = if colon { 1 } else { 0 };
    let op = match rest.get(at)? {
        '-' => Op::Default,
        '=' => Op::Assign,
        '?' => Op::Error,
        '+' => Op::Alternate,
        '%' if !colon => {
            let longest = rest.get(1) == Some(&'%');
            return Some((Op::Remove(PatternRemovalSide::Suffix, longest), false, if longest { 2 } else { 1 }));
        }
        '#' if !colon => {
            let longest = rest.get(1) == Some(&'#');
            return Some((Op::Remove(PatternRemovalSide::Prefix, longest), false, if longest { 2 } else { 1 }));
        }
        _ => return None,
    };
    Some((op, colon, at + 1))
}

impl Interpreter {
    /// Value of a named or special parameter
    pub fn param_value(&self, env: &Env, name: &str) -> ParamValue {
        match name {
            "?" => ParamValue::Value(self.last_status.to_string()),
            "$" => ParamValue::Value(self.shell_pid.to_string()),
            "!" => match self.last_bg_pid {
                Some(pid) => ParamValue::Value(pid.to_string()),
                None => ParamValue::Unset,
            },
            "#" => ParamValue::Value(env.positional().len().to_string()),
            "-" => ParamValue::Value(env.options.letters()),
            "@" | "*" => ParamValue::Fields(env.positional().to_vec()),
            _ if name.chars().all(|c| c.is_ascii_digit()) => {
                match name.parse::<usize>().ok().and_then(|n| env.argv.get(n)) {
                    Some(value) => ParamValue::Value(value.clone()),
                    None => ParamValue::Unset,
                }
            }
            _ => match env.value(name) {
                Some(value) => ParamValue::Value(value.to_string()),
                None => ParamValue::Unset,
            },
        }
    }

    /// Push the segments for a plain parameter reference.
    fn push_param(
        &self,
        env: &Env,
        name: &str,
        value: ParamValue,
        quoted: bool,
        out: &mut Vec<Segment>,
    ) -> Result<(), ShellError> {
        match value {
            ParamValue::Unset if env.options.nounset => {
                Err(ShellError::expansion(format!("{}: parameter not set", name)))
            }
            ParamValue::Unset => {
                out.push(Segment::expanded("", quoted));
                Ok(())
            }
            ParamValue::Value(v) => {
                out.push(Segment::expanded(v, quoted));
                Ok(())
            }
            ParamValue::Fields(fields) if quoted && name == "*" => {
                out.push(Segment::expanded(fields.join(&get_ifs_separator(env)), true));
                Ok(())
            }
            ParamValue::Fields(fields) => {
                for (idx, field) in fields.into_iter().enumerate() {
                    if idx > 0 {
                        out.push(Segment::FieldBreak);
                    }
                    out.push(Segment::expanded(field, quoted));
                }
                Ok(())
            }
        }
    }

    /// `chars[i]` is `$`; expands what follows and returns the index after it.
    pub(crate) fn expand_dollar(
        &mut self,
        env: &mut Env,
        chars: &[char],
        i: usize,
        quoted: bool,
        out: &mut Vec<Segment>,
    ) -> Result<usize, ShellError> {
        match chars.get(i + 1) {
            Some('(') => {
                if chars.get(i + 2) == Some(&'(') {
                    return Err(ShellError::expansion("arithmetic expansion is not supported"));
                }
                let end = skip_dollar(&mut SliceFeed(chars), i)?;
                let body: String = chars[i + 2..end - 1].iter().collect();
                let value = self.command_substitution(env, &body)?;
                out.push(Segment::expanded(value, quoted));
                Ok(end)
            }
            Some('{') => {
                let end = skip_dollar(&mut SliceFeed(chars), i)?;
                self.expand_braced(env, &chars[i + 2..end - 1], quoted, out)?;
                Ok(end)
            }
            Some(&c) if is_special(c) => {
                let name = c.to_string();
                let value = self.param_value(env, &name);
                self.push_param(env, &name, value, quoted, out)?;
                Ok(i + 2)
            }
            Some(&c) if c == '_' || c.is_ascii_alphabetic() => {
                let mut end = i + 1;
                while end < chars.len() && (chars[end] == '_' || chars[end].is_ascii_alphanumeric()) {
                    end += 1;
                }
                let name: String = chars[i + 1..end].iter().collect();
                let value = self.param_value(env, &name);
                self.push_param(env, &name, value, quoted, out)?;
                Ok(end)
            }
            _ => {
                out.push(if quoted { Segment::quoted("$") } else { Segment::literal("$") });
                Ok(i + 1)
            }
        }
    }

    /// The inside of `${...}`
    fn expand_braced(
        &mut self,
        env: &mut Env,
        inner: &[char],
        quoted: bool,
        out: &mut Vec<Segment>,
    ) -> Result<(), ShellError> {
        let text: String = inner.iter().collect();
        let bad = || ShellError::expansion(format!("${{{}}}: bad substitution", text));

        // ${#NAME}: length
        if inner.len() > 1 && inner[0] == '#' {
            let name: String = inner[1..].iter().collect();
            if !(is_name(&name) || (name.len() == 1 && name.chars().all(is_special))
                || name.chars().all(|c| c.is_ascii_digit()))
            {
                return Err(bad());
            }
            let length = match self.param_value(env, &name) {
                ParamValue::Unset if env.options.nounset => {
                    return Err(ShellError::expansion(format!("{}: parameter not set", name)));
                }
                ParamValue::Fields(fields) => fields.len(),
                value => value.joined("").chars().count(),
            };
            out.push(Segment::expanded(length.to_string(), quoted));
            return Ok(());
        }

        let name_end = match inner.first() {
            Some(c) if c.is_ascii_digit() => inner.iter().take_while(|c| c.is_ascii_digit()).count(),
            Some(&c) if is_special(c) => 1,
            Some(&c) if c == '_' || c.is_ascii_alphabetic() => inner
                .iter()
                .take_while(|c| **c == '_' || c.is_ascii_alphanumeric())
                .count(),
            _ => return Err(bad()),
        };
        let name: String = inner[..name_end].iter().collect();
        let rest = &inner[name_end..];
        let value = self.param_value(env, &name);

        if rest.is_empty() {
            return self.push_param(env, &name, value, quoted, out);
        }
        let (op, check_null, op_len) = parse_op(rest).ok_or_else(bad)?;
        let word = &rest[op_len..];
        let missing = !value.is_set() || (check_null && value.is_null());

        match op {
            Op::Default => {
                if missing {
                    self.expand_operand(env, word, quoted, out)?;
                } else {
                    self.push_param(env, &name, value, quoted, out)?;
                }
            }
            Op::Alternate => {
                if !missing {
                    self.expand_operand(env, word, quoted, out)?;
                }
            }
            Op::Assign => {
                if missing {
                    if !is_name(&name) {
                        return Err(ShellError::expansion(format!("${}: cannot assign in this way", name)));
                    }
                    let mut segments = Vec::new();
                    self.expand_operand(env, word, quoted, &mut segments)?;
                    let assigned = join_segments(&segments);
                    env.set(&name, assigned.clone())?;
                    out.push(Segment::expanded(assigned, quoted));
                } else {
                    self.push_param(env, &name, value, quoted, out)?;
                }
            }
            Op::Error => {
                if missing {
                    let mut segments = Vec::new();
                    self.expand_operand(env, word, quoted, &mut segments)?;
                    let message = join_segments(&segments);
                    let message = if message.is_empty() {
                        "parameter null or not set".to_string()
                    } else {
                        message
                    };
                    return Err(ShellError::expansion(format!("{}: {}", name, message)));
                }
                self.push_param(env, &name, value, quoted, out)?;
            }
            Op::Remove(side, longest) => {
                if !value.is_set() && env.options.nounset {
                    return Err(ShellError::expansion(format!("{}: parameter not set", name)));
                }
                let mut segments = Vec::new();
                self.expand_operand(env, word, false, &mut segments)?;
                let pattern = pattern_text(&segments);
                let separator = get_ifs_separator(env);
                let result = remove_pattern(&value.joined(&separator), &pattern, side, longest);
                out.push(Segment::expanded(result, quoted));
            }
        }
        Ok(())
    }

    /// The word after an operator; inside double quotes it is expanded as if
    /// it were double-quoted itself.
    fn expand_operand(
        &mut self,
        env: &mut Env,
        word: &[char],
        quoted: bool,
        out: &mut Vec<Segment>,
    ) -> Result<(), ShellError> {
        if quoted {
            return self.expand_double_body(env, word, false, out).map(|_| ());
        }
        let raw: String = word.iter().collect();
        let segments = self.expand_segments(env, &raw)?;
        out.extend(segments);
        Ok(())
    }
}
