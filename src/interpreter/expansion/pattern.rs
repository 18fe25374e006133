//! Pattern Matching
//!
//! Converts shell glob patterns to regex equivalents for `case` items and
//! the `${var%pattern}` family of removals.
//!
//! Invalid patterns follow the usual shell leniency:
//! - Unclosed character classes (`[abc`) are treated as a literal `[`
//! - Unknown POSIX classes (`[:foo:]`) match nothing
//! - A pattern whose regex fails to compile matches only itself literally

use std::collections::HashMap;

use regex_lite::Regex;

lazy_static::lazy_static! {
    /// Valid POSIX character class names
    static ref POSIX_CLASSES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("alnum", "a-zA-Z0-9");
        m.insert("alpha", "a-zA-Z");
        m.insert("blank", " \\t");
        m.insert("cntrl", "\\x00-\\x1F\\x7F");
        m.insert("digit", "0-9");
        m.insert("graph", "!-~");
        m.insert("lower", "a-z");
        m.insert("print", " -~");
        m.insert("punct", "!-/:-@\\[-`{-~");
        m.insert("space", " \\t\\n\\r\\f\\v");
        m.insert("upper", "A-Z");
        m.insert("xdigit", "0-9A-Fa-f");
        m
    };
}

/// Convert a shell glob pattern (`*`, `?`, `[...]`, `\x`) to a regex body.
pub fn pattern_to_regex(pattern: &str) -> String {
    let mut regex = String::new();
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                // \X means literal X
                match chars.get(i + 1) {
                    Some(&next) => push_literal(&mut regex, next),
                    None => regex.push_str("\\\\"),
                }
                i += 2;
            }
            '*' => {
                regex.push_str(".*");
                i += 1;
            }
            '?' => {
                regex.push('.');
                i += 1;
            }
            '[' => match find_char_class_end(&chars, i) {
                Some(end) => {
                    let content: String = chars[i + 1..end].iter().collect();
                    regex.push_str(&convert_char_class(&content));
                    i = end + 1;
                }
                None => {
                    regex.push_str("\\[");
                    i += 1;
                }
            },
            _ => {
                push_literal(&mut regex, c);
                i += 1;
            }
        }
    }
    regex
}

fn push_literal(regex: &mut String, c: char) {
    if "\\^$.|+*?(){}[]".contains(c) {
        regex.push('\\');
    }
    regex.push(c);
}

/// Find the `]` closing the class opened at `start`
fn find_char_class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;

    if i < chars.len() && (chars[i] == '!' || chars[i] == '^') {
        i += 1;
    }
    // A ] right after [ or [! is literal
    if i < chars.len() && chars[i] == ']' {
        i += 1;
    }

    while i < chars.len() {
        if chars[i] == '\\' && i + 1 < chars.len() {
            i += 2;
            continue;
        }
        if chars[i] == ']' {
            return Some(i);
        }
        if chars[i] == '[' && chars.get(i + 1) == Some(&':') {
            let rest: String = chars[i + 2..].iter().collect();
            if let Some(close) = rest.find(":]") {
                i += 2 + rest[..close].chars().count() + 2;
                continue;
            }
        }
        i += 1;
    }
    None
}

/// Convert the content of a `[...]` class
fn convert_char_class(content: &str) -> String {
    let mut result = String::from("[");
    let chars: Vec<char> = content.chars().collect();
    let mut i = 0;

    if !chars.is_empty() && (chars[0] == '!' || chars[0] == '^') {
        result.push('^');
        i += 1;
    }
    let first = i;

    while i < chars.len() {
        let c = chars[i];
        if c == '[' && chars.get(i + 1) == Some(&':') {
            let rest: String = chars[i + 2..].iter().collect();
            if let Some(close) = rest.find(":]") {
                let name = &rest[..close];
                result.push_str(POSIX_CLASSES.get(name).copied().unwrap_or(""));
                i += 2 + name.chars().count() + 2;
                continue;
            }
        }
        match c {
            '\\' => {
                match chars.get(i + 1) {
                    Some(&next) => {
                        result.push('\\');
                        result.push(next);
                    }
                    None => result.push_str("\\\\"),
                }
                i += 2;
            }
            '-' if i > first && i + 1 < chars.len() => {
                result.push('-');
                i += 1;
            }
            '[' | ']' | '^' | '-' | '&' | '~' => {
                result.push('\\');
                result.push(c);
                i += 1;
            }
            _ => {
                result.push(c);
                i += 1;
            }
        }
    }

    result.push(']');
    // Only an unknown POSIX class leaves the class empty
    match result.as_str() {
        "[]" => "[^\\s\\S]".to_string(),
        "[^]" => "[\\s\\S]".to_string(),
        _ => result,
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(&format!("(?s)^{}$", pattern_to_regex(pattern))).ok()
}

/// Whole-string glob match, as used by `case`.
pub fn glob_matches(pattern: &str, text: &str) -> bool {
    match compile(pattern) {
        Some(re) => re.is_match(text),
        None => pattern == text,
    }
}

/// Side for pattern removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternRemovalSide {
    /// `#` and `##`
    Prefix,
    /// `%` and `%%`
    Suffix,
}

/// Remove the shortest (or `longest`) prefix or suffix of `value` matching
/// `pattern`; `value` unchanged when nothing matches.
pub fn remove_pattern(value: &str, pattern: &str, side: PatternRemovalSide, longest: bool) -> String {
    let Some(re) = compile(pattern) else {
        return value.to_string();
    };
    let mut cuts: Vec<usize> = value.char_indices().map(|(idx, _)| idx).collect();
    cuts.push(value.len());

    match side {
        PatternRemovalSide::Prefix => {
            // Candidate prefix lengths, shortest first
            if longest {
                cuts.reverse();
            }
            for cut in cuts {
                if re.is_match(&value[..cut]) {
                    return value[cut..].to_string();
                }
            }
        }
        PatternRemovalSide::Suffix => {
            // Candidate suffix starts, longest suffix first
            if !longest {
                cuts.reverse();
            }
            for cut in cuts {
                if re.is_match(&value[cut..]) {
                    return value[..cut].to_string();
                }
            }
        }
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_patterns() {
        assert_eq!(pattern_to_regex("*"), ".*");
        assert_eq!(pattern_to_regex("?"), ".");
        assert_eq!(pattern_to_regex("abc"), "abc");
        assert_eq!(pattern_to_regex("a.b"), "a\\.b");
    }

    #[test]
    fn test_escaped_chars() {
        assert_eq!(pattern_to_regex("\\*"), "\\*");
        assert_eq!(pattern_to_regex("\\?"), "\\?");
        assert_eq!(pattern_to_regex("\\["), "\\[");
    }

    #[test]
    fn test_character_class() {
        assert_eq!(pattern_to_regex("[abc]"), "[abc]");
        assert_eq!(pattern_to_regex("[a-z]"), "[a-z]");
        assert_eq!(pattern_to_regex("[!abc]"), "[^abc]");
        assert_eq!(pattern_to_regex("[[:digit:]]"), "[0-9]");
        assert_eq!(pattern_to_regex("[abc"), "\\[abc");
    }

    #[test]
    fn test_glob_matches() {
        assert!(glob_matches("*.rs", "main.rs"));
        assert!(!glob_matches("*.rs", "main.rs.bak"));
        assert!(glob_matches("a?c", "abc"));
        assert!(glob_matches("[0-9]*", "42x"));
        assert!(glob_matches("\\*", "*"));
        assert!(!glob_matches("\\*", "x"));
        assert!(glob_matches("*", "multi\nline"));
        assert!(glob_matches("", ""));
    }

    #[test]
    fn test_remove_pattern() {
        let path = "dir/sub/file.tar.gz";
        assert_eq!(remove_pattern(path, "*/", PatternRemovalSide::Prefix, false), "sub/file.tar.gz");
        assert_eq!(remove_pattern(path, "*/", PatternRemovalSide::Prefix, true), "file.tar.gz");
        assert_eq!(remove_pattern(path, ".*", PatternRemovalSide::Suffix, false), "dir/sub/file.tar");
        assert_eq!(remove_pattern(path, ".*", PatternRemovalSide::Suffix, true), "dir/sub/file");
        assert_eq!(remove_pattern(path, "x*", PatternRemovalSide::Prefix, true), path);
    }
}
