//! break, continue, return - Control flow builtins
//!
//! Each unwinds with the matching `ShellError` variant; the enclosing loop
//! or function call catches it. `break` and `continue` outside any loop do
//! nothing.

use super::report;
use crate::interpreter::environment::Env;
use crate::interpreter::errors::ShellError;
use crate::interpreter::interpreter::Interpreter;

/// Loop count operand; `None` after reporting a bad one
fn parse_levels(env: &Env, command: &str, args: &[String]) -> Option<u32> {
    if args.len() > 1 {
        report(env, command, "too many arguments");
        return None;
    }
    match args.first() {
        None => Some(1),
        Some(arg) => match arg.parse::<u32>() {
            Ok(n) if n >= 1 => Some(n),
            _ => {
                report(env, command, &format!("{}: loop count out of range", arg));
                None
            }
        },
    }
}

pub fn handle_break(interp: &mut Interpreter, env: &mut Env, args: &[String]) -> Result<i32, ShellError> {
    if interp.loop_depth == 0 {
        return Ok(0);
    }
    match parse_levels(env, "break", args) {
        Some(levels) => Err(ShellError::Break(levels)),
        None => Ok(1),
    }
}

pub fn handle_continue(interp: &mut Interpreter, env: &mut Env, args: &[String]) -> Result<i32, ShellError> {
    if interp.loop_depth == 0 {
        return Ok(0);
    }
    match parse_levels(env, "continue", args) {
        Some(levels) => Err(ShellError::Continue(levels)),
        None => Ok(1),
    }
}

pub fn handle_return(interp: &mut Interpreter, env: &mut Env, args: &[String]) -> Result<i32, ShellError> {
    if interp.call_depth == 0 {
        report(env, "return", "can only `return' from a function");
        return Ok(1);
    }
    let code = match args.first() {
        None => interp.last_status,
        Some(arg) => match arg.parse::<i64>() {
            Ok(n) => n.rem_euclid(256) as i32,
            Err(_) => {
                report(env, "return", &format!("{}: numeric argument required", arg));
                2
            }
        },
    };
    Err(ShellError::Return(code))
}
