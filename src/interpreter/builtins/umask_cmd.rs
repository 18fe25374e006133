//! umask - Get or set the file mode creation mask
//!
//! umask [-S] [mask]
//!
//! Masks are octal. `-S` prints the permissions the mask leaves, e.g.
//! `u=rwx,g=rx,o=rx` for 022.

use super::{print, report};
use crate::interpreter::environment::Env;
use crate::interpreter::errors::ShellError;
use crate::interpreter::interpreter::Interpreter;
use crate::interpreter::process;

/// Symbolic form of the permissions allowed by `mask`
pub fn symbolic_mask(mask: u32) -> String {
    let allowed = !mask & 0o777;
    let class = |shift: u32| {
        let bits = (allowed >> shift) & 0o7;
        let mut perms = String::new();
        if bits & 0o4 != 0 {
            perms.push('r');
        }
        if bits & 0o2 != 0 {
            perms.push('w');
        }
        if bits & 0o1 != 0 {
            perms.push('x');
        }
        perms
    };
    format!("u={},g={},o={}", class(6), class(3), class(0))
}

pub fn parse_mask(text: &str) -> Option<u32> {
    if text.is_empty() || !text.chars().all(|c| ('0'..='7').contains(&c)) {
        return None;
    }
    u32::from_str_radix(text, 8).ok().filter(|mask| *mask <= 0o777)
}

pub fn handle_umask(_interp: &mut Interpreter, env: &mut Env, args: &[String]) -> Result<i32, ShellError> {
    let mut symbolic = false;
    let mut operands = args;
    while let Some(first) = operands.first() {
        match first.as_str() {
            "-S" => symbolic = true,
            "--" => {
                operands = &operands[1..];
                break;
            }
            arg if arg.starts_with('-') && arg.len() > 1 => {
                report(env, "umask", &format!("{}: invalid option", arg));
                return Ok(2);
            }
            _ => break,
        }
        operands = &operands[1..];
    }

    match operands.first() {
        None => {
            let text = if symbolic {
                symbolic_mask(env.umask)
            } else {
                format!("{:04o}", env.umask)
            };
            print(env, "umask", &format!("{}\n", text))?;
            Ok(0)
        }
        Some(value) => match parse_mask(value) {
            Some(mask) => {
                process::set_umask(mask);
                env.umask = mask;
                Ok(0)
            }
            None => {
                report(env, "umask", &format!("{}: invalid mask", value));
                Ok(1)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbolic_mask() {
        assert_eq!(symbolic_mask(0o022), "u=rwx,g=rx,o=rx");
        assert_eq!(symbolic_mask(0o077), "u=rwx,g=,o=");
        assert_eq!(symbolic_mask(0o000), "u=rwx,g=rwx,o=rwx");
        assert_eq!(symbolic_mask(0o777), "u=,g=,o=");
    }

    #[test]
    fn test_parse_mask() {
        assert_eq!(parse_mask("022"), Some(0o022));
        assert_eq!(parse_mask("0777"), Some(0o777));
        assert_eq!(parse_mask("8"), None);
        assert_eq!(parse_mask("1777"), None);
        assert_eq!(parse_mask("u=rwx"), None);
        assert_eq!(parse_mask(""), None);
    }
}
