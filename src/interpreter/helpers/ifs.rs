//! IFS (Internal Field Separator) Handling
//!
//! Shared by field splitting of unquoted expansions and the `read` builtin.

use std::collections::HashSet;

use crate::interpreter::environment::Env;

/// Default IFS value: space, tab, newline
pub const DEFAULT_IFS: &str = " \t\n";

/// The effective IFS: the default when unset, otherwise the value (possibly empty).
pub fn get_ifs(env: &Env) -> &str {
    match env.get("IFS") {
        Some(var) => var.value.as_deref().unwrap_or(DEFAULT_IFS),
        None => DEFAULT_IFS,
    }
}

/// Separator used to join `$*`: the first IFS character, a space when unset.
pub fn get_ifs_separator(env: &Env) -> String {
    get_ifs(env).chars().next().map(String::from).unwrap_or_default()
}

pub fn is_ifs_whitespace(ch: char) -> bool {
    ch == ' ' || ch == '\t' || ch == '\n'
}

/// Split IFS characters into whitespace and non-whitespace sets.
pub fn categorize_ifs(ifs: &str) -> (HashSet<char>, HashSet<char>) {
    let mut whitespace = HashSet::new();
    let mut non_whitespace = HashSet::new();
    for ch in ifs.chars() {
        if is_ifs_whitespace(ch) {
            whitespace.insert(ch);
        } else {
            non_whitespace.insert(ch);
        }
    }
    (whitespace, non_whitespace)
}

/// Split an input line for `read` into at most `max_fields` fields.
///
/// Leading and trailing IFS whitespace is dropped; the last field receives
/// the unsplit rest of the line. Unless `raw`, a backslash makes the next
/// character literal.
pub fn split_for_read(value: &str, ifs: &str, max_fields: usize, raw: bool) -> Vec<String> {
    let max_fields = max_fields.max(1);
    let (whitespace, non_whitespace) = categorize_ifs(ifs);
    let is_ifs = |c: char| whitespace.contains(&c) || non_whitespace.contains(&c);
    let chars: Vec<char> = value.chars().collect();
    let mut fields = Vec::new();
    let mut pos = 0;

    while pos < chars.len() && whitespace.contains(&chars[pos]) {
        pos += 1;
    }

    while pos < chars.len() && fields.len() + 1 < max_fields {
        let mut word = String::new();
        while pos < chars.len() {
            let ch = chars[pos];
            if !raw && ch == '\\' {
                if let Some(&next) = chars.get(pos + 1) {
                    word.push(next);
                }
                pos += 2;
                continue;
            }
            if is_ifs(ch) {
                break;
            }
            word.push(ch);
            pos += 1;
        }
        fields.push(word);

        // One delimiter: IFS whitespace around at most one non-whitespace char
        while pos < chars.len() && whitespace.contains(&chars[pos]) {
            pos += 1;
        }
        if pos < chars.len() && non_whitespace.contains(&chars[pos]) {
            pos += 1;
            while pos < chars.len() && whitespace.contains(&chars[pos]) {
                pos += 1;
            }
        }
    }

    if pos < chars.len() {
        // The rest, with unescaped trailing IFS whitespace removed
        let mut rest = String::new();
        let mut keep = 0;
        while pos < chars.len() {
            let ch = chars[pos];
            if !raw && ch == '\\' {
                if let Some(&next) = chars.get(pos + 1) {
                    rest.push(next);
                    keep = rest.len();
                }
                pos += 2;
                continue;
            }
            rest.push(ch);
            if !whitespace.contains(&ch) {
                keep = rest.len();
            }
            pos += 1;
        }
        rest.truncate(keep);
        fields.push(rest);
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_ifs() {
        let mut env = Env::new("test", "sh");
        assert_eq!(get_ifs(&env), DEFAULT_IFS);
        assert_eq!(get_ifs_separator(&env), " ");
        env.set("IFS", ":,").unwrap();
        assert_eq!(get_ifs(&env), ":,");
        assert_eq!(get_ifs_separator(&env), ":");
        env.set("IFS", "").unwrap();
        assert_eq!(get_ifs(&env), "");
        assert_eq!(get_ifs_separator(&env), "");
    }

    #[test]
    fn test_split_for_read_simple() {
        assert_eq!(split_for_read("a b c", DEFAULT_IFS, 3, false), vec!["a", "b", "c"]);
        assert_eq!(split_for_read("  a   b  ", DEFAULT_IFS, 3, false), vec!["a", "b"]);
    }

    #[test]
    fn test_split_for_read_last_gets_rest() {
        assert_eq!(split_for_read("a b c d  ", DEFAULT_IFS, 2, false), vec!["a", "b c d"]);
        assert_eq!(split_for_read("  whole line ", DEFAULT_IFS, 1, false), vec!["whole line"]);
    }

    #[test]
    fn test_split_for_read_non_whitespace() {
        assert_eq!(split_for_read("a::b", ":", 3, false), vec!["a", "", "b"]);
        assert_eq!(split_for_read("a : b", " :", 2, false), vec!["a", "b"]);
    }

    #[test]
    fn test_split_for_read_backslashes() {
        assert_eq!(split_for_read("a\\ b c", DEFAULT_IFS, 2, false), vec!["a b", "c"]);
        assert_eq!(split_for_read("a\\ b c", DEFAULT_IFS, 2, true), vec!["a\\", "b c"]);
    }
}
