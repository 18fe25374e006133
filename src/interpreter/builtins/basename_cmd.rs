//! basename - Strip directory and suffix from a file name
//!
//! basename string [suffix]
//!
//! Runs in a forked helper.

use super::{print, report};
use crate::interpreter::environment::Env;
use crate::interpreter::errors::ShellError;
use crate::interpreter::interpreter::Interpreter;

/// Last component of `string`, with `suffix` removed unless it is the whole
/// component. Trailing slashes are ignored; a name made only of slashes is `/`.
pub fn basename(string: &str, suffix: Option<&str>) -> String {
    if string.is_empty() {
        return String::new();
    }
    let trimmed = string.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    let base = match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    };
    match suffix {
        Some(suffix) if !suffix.is_empty() && base != suffix => {
            base.strip_suffix(suffix).unwrap_or(base).to_string()
        }
        _ => base.to_string(),
    }
}

pub fn handle_basename(_interp: &mut Interpreter, env: &mut Env, args: &[String]) -> Result<i32, ShellError> {
    let args = match args.first().map(String::as_str) {
        Some("--") => &args[1..],
        _ => args,
    };
    let name = match args {
        [string] => basename(string, None),
        [string, suffix] => basename(string, Some(suffix)),
        _ => {
            report(env, "basename", "usage: basename string [suffix]");
            return Ok(1);
        }
    };
    print(env, "basename", &format!("{}\n", name))?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basename() {
        assert_eq!(basename("/usr/lib/libc.so", None), "libc.so");
        assert_eq!(basename("/usr/lib/", None), "lib");
        assert_eq!(basename("file", None), "file");
        assert_eq!(basename("///", None), "/");
        assert_eq!(basename("", None), "");
    }

    #[test]
    fn test_basename_suffix() {
        assert_eq!(basename("src/main.rs", Some(".rs")), "main");
        assert_eq!(basename(".rs", Some(".rs")), ".rs");
        assert_eq!(basename("main.c", Some(".rs")), "main.c");
        assert_eq!(basename("dir/a.tar.gz/", Some(".gz")), "a.tar");
    }
}
