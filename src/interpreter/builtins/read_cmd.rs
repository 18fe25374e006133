//! read - Read a line of input builtin
//!
//! Supports:
//! - read VAR... - split the line on IFS into the variables
//! - read -r VAR - raw mode (no backslash escaping, no line continuation)
//! - read - without names the line goes to REPLY
//!
//! Input is taken one byte at a time from slot 0 so nothing past the line
//! is consumed. At end of input the variables are set to what was read and
//! the status is 1.

use std::io;
use std::os::fd::RawFd;

use nix::errno::Errno;

use super::report;
use crate::interpreter::environment::Env;
use crate::interpreter::errors::ShellError;
use crate::interpreter::helpers::{get_ifs, split_for_read};
use crate::interpreter::interpreter::Interpreter;
use crate::parser::classify::is_name;
use crate::parser::source::read_fd_line;

/// One logical line; the flag is false when input ended before a newline.
fn read_logical_line(fd: RawFd, raw: bool) -> io::Result<Option<(String, bool)>> {
    let mut line = String::new();
    let mut got_input = false;
    while let Some(chunk) = read_fd_line(fd)? {
        got_input = true;
        let (body, newline) = match chunk.strip_suffix('\n') {
            Some(body) => (body, true),
            None => (chunk.as_str(), false),
        };
        let trailing = body.chars().rev().take_while(|&c| c == '\\').count();
        if !raw && newline && trailing % 2 == 1 {
            // Backslash-newline joins the next line
            line.push_str(&body[..body.len() - 1]);
            continue;
        }
        line.push_str(body);
        return Ok(Some((line, newline)));
    }
    Ok(if got_input { Some((line, false)) } else { None })
}

pub fn handle_read(_interp: &mut Interpreter, env: &mut Env, args: &[String]) -> Result<i32, ShellError> {
    let mut raw = false;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-r" => raw = true,
            "--" => {
                i += 1;
                break;
            }
            arg if arg.starts_with('-') && arg.len() > 1 => {
                report(env, "read", &format!("{}: invalid option", arg));
                return Ok(2);
            }
            _ => break,
        }
        i += 1;
    }

    let names: Vec<&str> = if i < args.len() {
        args[i..].iter().map(String::as_str).collect()
    } else {
        vec!["REPLY"]
    };
    if let Some(bad) = names.iter().find(|name| !is_name(name)) {
        report(env, "read", &format!("`{}': not a valid identifier", bad));
        return Ok(2);
    }

    let fd = env
        .fds
        .raw(0)
        .ok_or_else(|| ShellError::io("read", io::Error::from(Errno::EBADF)))?;
    let (line, complete) = read_logical_line(fd, raw)
        .map_err(|e| ShellError::io("read", e))?
        .unwrap_or_default();

    let fields = split_for_read(&line, get_ifs(env), names.len(), raw);
    for (idx, name) in names.iter().enumerate() {
        env.set(name, fields.get(idx).cloned().unwrap_or_default())?;
    }
    Ok(if complete { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::environment::FdSlot;
    use crate::interpreter::process;
    use std::os::fd::AsRawFd;

    /// An environment whose standard input is a pipe holding `input`
    fn env_with_input(input: &str) -> Env {
        let (read_end, write_end) = process::pipe().unwrap();
        process::write_all(write_end.as_raw_fd(), input.as_bytes()).unwrap();
        drop(write_end);
        let mut env = Env::new("test", "sh");
        env.fds.set(0, FdSlot::owned(read_end));
        env.fds.set(2, FdSlot::Closed);
        env
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_read_splits_fields() {
        let mut interp = Interpreter::new();
        let mut env = env_with_input("  one two  three four \nnext\n");
        assert_eq!(handle_read(&mut interp, &mut env, &args(&["a", "b"])).unwrap(), 0);
        assert_eq!(env.value("a"), Some("one"));
        assert_eq!(env.value("b"), Some("two  three four"));
        // Only the first line was consumed
        assert_eq!(handle_read(&mut interp, &mut env, &args(&["c"])).unwrap(), 0);
        assert_eq!(env.value("c"), Some("next"));
    }

    #[test]
    fn test_read_reply_and_eof() {
        let mut interp = Interpreter::new();
        let mut env = env_with_input("partial");
        assert_eq!(handle_read(&mut interp, &mut env, &[]).unwrap(), 1);
        assert_eq!(env.value("REPLY"), Some("partial"));
        assert_eq!(handle_read(&mut interp, &mut env, &[]).unwrap(), 1);
        assert_eq!(env.value("REPLY"), Some(""));
    }

    #[test]
    fn test_read_backslashes() {
        let mut interp = Interpreter::new();
        let mut env = env_with_input("a\\\nb c\\ d\n");
        handle_read(&mut interp, &mut env, &args(&["x", "y"])).unwrap();
        assert_eq!(env.value("x"), Some("ab"));
        assert_eq!(env.value("y"), Some("c d"));

        let mut env = env_with_input("a\\b c\n");
        handle_read(&mut interp, &mut env, &args(&["-r", "x"])).unwrap();
        assert_eq!(env.value("x"), Some("a\\b c"));
    }

    #[test]
    fn test_read_custom_ifs() {
        let mut interp = Interpreter::new();
        let mut env = env_with_input("root:x:0\n");
        env.set("IFS", ":").unwrap();
        handle_read(&mut interp, &mut env, &args(&["user", "pw", "uid"])).unwrap();
        assert_eq!(env.value("user"), Some("root"));
        assert_eq!(env.value("pw"), Some("x"));
        assert_eq!(env.value("uid"), Some("0"));
    }

    #[test]
    fn test_read_invalid_name() {
        let mut interp = Interpreter::new();
        let mut env = env_with_input("x\n");
        assert_eq!(handle_read(&mut interp, &mut env, &args(&["1bad"])).unwrap(), 2);
    }
}
