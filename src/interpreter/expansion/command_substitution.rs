//! Command Substitution
//!
//! `$(cmd)` and `` `cmd` ``: the body is parsed with its own parser state,
//! then run in a forked child whose standard output is a pipe. The parent
//! reads everything, waits, and strips trailing newlines.

use std::os::fd::AsRawFd;

use log::debug;

use crate::interpreter::environment::{Env, FdSlot};
use crate::interpreter::errors::ShellError;
use crate::interpreter::interpreter::Interpreter;
use crate::interpreter::process::{self, ForkResult};
use crate::interpreter::signals::SigintGuard;
use crate::parser::parse_all;

/// Remove all trailing newlines
pub fn strip_trailing_newlines(mut output: String) -> String {
    while output.ends_with('\n') {
        output.pop();
    }
    output
}

impl Interpreter {
    pub(crate) fn command_substitution(&mut self, env: &mut Env, body: &str) -> Result<String, ShellError> {
        let list = parse_all(body)?;
        if list.is_empty() {
            return Ok(String::new());
        }
        debug!("command substitution: {}", body.trim());

        let (read_end, write_end) = process::pipe().map_err(|e| ShellError::resource("pipe", e))?;
        match process::fork().map_err(|e| ShellError::resource("fork", e))? {
            ForkResult::Child => {
                drop(read_end);
                let mut child_env = env.clone_child("command substitution");
                child_env.fds.set(1, FdSlot::owned(write_end));
                self.run_in_child(&mut child_env, false, |interp, env| interp.execute_list(env, &list))
            }
            ForkResult::Parent(pid) => {
                drop(write_end);
                let _guard = SigintGuard::new();
                let output = process::read_to_end(read_end.as_raw_fd())
                    .map_err(|e| ShellError::io("command substitution", e))?;
                let raw = process::wait_pid(pid).map_err(|e| ShellError::resource("wait", e))?;
                let status = process::exit_status(raw);
                self.last_status = status;
                self.subst_status = Some(status);
                Ok(strip_trailing_newlines(String::from_utf8_lossy(&output).into_owned()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_trailing_newlines() {
        assert_eq!(strip_trailing_newlines("ok\n\n".to_string()), "ok");
        assert_eq!(strip_trailing_newlines("a\nb\n".to_string()), "a\nb");
        assert_eq!(strip_trailing_newlines(String::new()), "");
    }
}
