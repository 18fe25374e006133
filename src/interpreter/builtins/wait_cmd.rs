//! wait - Wait for background jobs
//!
//! wait            - wait for every job, status 0
//! wait pid...     - wait for each, status of the last; 127 for a pid that
//!                   is not a job of this shell
//! wait %n         - job number n

use super::report;
use crate::interpreter::environment::Env;
use crate::interpreter::errors::ShellError;
use crate::interpreter::interpreter::Interpreter;
use crate::interpreter::process::{Pid, STATUS_NOT_FOUND};

/// Resolve a `pid` or `%job` operand.
fn resolve(interp: &Interpreter, operand: &str) -> Option<Pid> {
    match operand.strip_prefix('%') {
        Some(id) => {
            let id: u32 = id.parse().ok()?;
            interp.jobs.jobs().iter().find(|j| j.id == id).map(|j| j.pid)
        }
        None => operand.parse().ok().map(Pid::from_raw),
    }
}

pub fn handle_wait(interp: &mut Interpreter, env: &mut Env, args: &[String]) -> Result<i32, ShellError> {
    if args.is_empty() {
        interp.jobs.wait_all().map_err(|e| ShellError::resource("wait", e))?;
        return Ok(0);
    }

    let mut status = 0;
    for arg in args {
        let Some(pid) = resolve(interp, arg) else {
            report(env, "wait", &format!("{}: no such job", arg));
            status = STATUS_NOT_FOUND;
            continue;
        };
        status = interp
            .jobs
            .wait_for(pid)
            .map_err(|e| ShellError::resource("wait", e))?
            .unwrap_or(STATUS_NOT_FOUND);
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::environment::FdSlot;

    #[test]
    fn test_resolve_operands() {
        let mut interp = Interpreter::new();
        interp.jobs.add(Pid::from_raw(4242), "sleep 1");
        assert_eq!(resolve(&interp, "%1"), Some(Pid::from_raw(4242)));
        assert_eq!(resolve(&interp, "%2"), None);
        assert_eq!(resolve(&interp, "77"), Some(Pid::from_raw(77)));
        assert_eq!(resolve(&interp, "x"), None);
    }

    #[test]
    fn test_wait_unknown_pid() {
        let mut interp = Interpreter::new();
        let mut env = Env::new("test", "sh");
        env.fds.set(2, FdSlot::Closed);
        assert_eq!(handle_wait(&mut interp, &mut env, &["99999999".to_string()]).unwrap(), 127);
        assert_eq!(handle_wait(&mut interp, &mut env, &["%3".to_string()]).unwrap(), 127);
        assert_eq!(handle_wait(&mut interp, &mut env, &[]).unwrap(), 0);
    }
}
