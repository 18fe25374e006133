//! cd - Change directory builtin
//!
//! Supports:
//! - cd [dir] - change to directory (HOME without an operand)
//! - cd - - change to previous directory (OLDPWD) and print it
//! - cd -L - use logical path (default)
//! - cd -P - use physical path (resolve symlinks)

use std::path::Path;

use super::{print, report};
use crate::interpreter::environment::Env;
use crate::interpreter::errors::{io_message, ShellError};
use crate::interpreter::interpreter::Interpreter;

/// Handle the cd builtin command
pub fn handle_cd(_interp: &mut Interpreter, env: &mut Env, args: &[String]) -> Result<i32, ShellError> {
    let mut physical = false;

    // Parse options
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--" => {
                i += 1;
                break;
            }
            "-L" => physical = false,
            "-P" => physical = true,
            arg if arg.starts_with('-') && arg != "-" => {
                report(env, "cd", &format!("{}: invalid option", arg));
                return Ok(2);
            }
            _ => break,
        }
        i += 1;
    }

    let operands = &args[i..];
    if operands.len() > 1 {
        report(env, "cd", "too many arguments");
        return Ok(1);
    }

    let mut print_path = false;
    let target = match operands.first().map(String::as_str) {
        None => match env.value("HOME") {
            Some(home) if !home.is_empty() => home.to_string(),
            _ => {
                report(env, "cd", "HOME not set");
                return Ok(1);
            }
        },
        Some("-") => match env.value("OLDPWD") {
            Some(old) => {
                print_path = true;
                old.to_string()
            }
            None => {
                report(env, "cd", "OLDPWD not set");
                return Ok(1);
            }
        },
        Some(dir) => dir.to_string(),
    };

    let previous = env
        .value("PWD")
        .map(str::to_string)
        .or_else(|| std::env::current_dir().ok().map(|p| p.to_string_lossy().into_owned()));

    let logical = if target.starts_with('/') {
        normalize_path(&target)
    } else {
        match &previous {
            Some(cwd) => normalize_path(&format!("{}/{}", cwd, target)),
            None => target.clone(),
        }
    };

    let destination = if physical { target.as_str() } else { logical.as_str() };
    if let Err(e) = std::env::set_current_dir(Path::new(destination)) {
        report(env, "cd", &format!("{}: {}", target, io_message(&e)));
        return Ok(1);
    }

    let new_dir = if physical {
        std::env::current_dir()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or(logical)
    } else {
        logical
    };

    if let Some(old) = previous {
        env.set("OLDPWD", old)?;
        env.export("OLDPWD")?;
    }
    env.set("PWD", new_dir.clone())?;
    env.export("PWD")?;

    if print_path {
        print(env, "cd", &format!("{}\n", new_dir))?;
    }
    Ok(0)
}

/// Normalize a path by resolving . and .. components
pub fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/').filter(|p| !p.is_empty() && *p != ".") {
        if part == ".." {
            parts.pop();
        } else {
            parts.push(part);
        }
    }
    format!("/{}", parts.join("/"))
}
