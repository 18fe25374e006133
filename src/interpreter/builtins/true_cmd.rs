//! :, true, false

use crate::interpreter::environment::Env;
use crate::interpreter::errors::ShellError;
use crate::interpreter::interpreter::Interpreter;

pub fn handle_colon(_interp: &mut Interpreter, _env: &mut Env, _args: &[String]) -> Result<i32, ShellError> {
    Ok(0)
}

pub fn handle_true(_interp: &mut Interpreter, _env: &mut Env, _args: &[String]) -> Result<i32, ShellError> {
    Ok(0)
}

pub fn handle_false(_interp: &mut Interpreter, _env: &mut Env, _args: &[String]) -> Result<i32, ShellError> {
    Ok(1)
}
