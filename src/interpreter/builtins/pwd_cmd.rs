//! pwd - Print working directory
//!
//! pwd [-L|-P]
//!
//! Runs in a forked helper. `-L` (default) prints `PWD` when it still names
//! the current directory, `-P` the physical path.

use std::os::unix::fs::MetadataExt;

use super::{print, report};
use crate::interpreter::environment::Env;
use crate::interpreter::errors::ShellError;
use crate::interpreter::interpreter::Interpreter;

fn same_file(a: &str, b: &str) -> bool {
    match (std::fs::metadata(a), std::fs::metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

/// `PWD` if it is an absolute name of the current directory
fn logical_pwd(env: &Env) -> Option<String> {
    env.value("PWD")
        .filter(|pwd| pwd.starts_with('/') && same_file(pwd, "."))
        .map(str::to_string)
}

pub fn handle_pwd(_interp: &mut Interpreter, env: &mut Env, args: &[String]) -> Result<i32, ShellError> {
    let mut physical = false;
    for arg in args {
        match arg.as_str() {
            "-L" => physical = false,
            "-P" => physical = true,
            other => {
                report(env, "pwd", &format!("{}: invalid option", other));
                return Ok(2);
            }
        }
    }

    let dir = match logical_pwd(env).filter(|_| !physical) {
        Some(dir) => dir,
        None => std::env::current_dir()
            .map_err(|e| ShellError::io("pwd", e))?
            .to_string_lossy()
            .into_owned(),
    };
    print(env, "pwd", &format!("{}\n", dir))?;
    Ok(0)
}
