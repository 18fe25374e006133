//! exec - Replace the shell or make redirections permanent
//!
//! exec                 - redirections on the command stay in effect
//! exec cmd [args...]   - run cmd in place of the shell

use crate::interpreter::environment::Env;
use crate::interpreter::errors::ShellError;
use crate::interpreter::interpreter::Interpreter;

pub fn handle_exec(interp: &mut Interpreter, env: &mut Env, args: &[String]) -> Result<i32, ShellError> {
    let args = match args.first().map(String::as_str) {
        Some("--") => &args[1..],
        _ => args,
    };
    if args.is_empty() {
        return Ok(0);
    }
    let status = interp.exec_command(env, args)?;
    // Only reached when the program could not be started
    if interp.interactive {
        Ok(status)
    } else {
        Err(ShellError::Exit(status))
    }
}
