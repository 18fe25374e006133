//! Builtin Commands
//!
//! This module contains implementations of shell builtin commands and the
//! registry the evaluator looks them up in.
//!
//! A special builtin runs in the shell process and may change its state;
//! assignments written before it persist. Builtins marked `forks` run in a
//! forked helper so they can never disturb the shell itself.

pub mod basename_cmd;
pub mod cd_cmd;
pub mod exec_cmd;
pub mod exit_cmd;
pub mod export_cmd;
pub mod flow_cmd;
pub mod jobs_cmd;
pub mod pwd_cmd;
pub mod read_cmd;
pub mod set_cmd;
pub mod shift_cmd;
pub mod true_cmd;
pub mod umask_cmd;
pub mod unset_cmd;
pub mod wait_cmd;

pub use basename_cmd::handle_basename;
pub use cd_cmd::handle_cd;
pub use exec_cmd::handle_exec;
pub use exit_cmd::handle_exit;
pub use export_cmd::{handle_export, handle_readonly};
pub use flow_cmd::{handle_break, handle_continue, handle_return};
pub use jobs_cmd::handle_jobs;
pub use pwd_cmd::handle_pwd;
pub use read_cmd::handle_read;
pub use set_cmd::handle_set;
pub use shift_cmd::handle_shift;
pub use true_cmd::{handle_colon, handle_false, handle_true};
pub use umask_cmd::handle_umask;
pub use unset_cmd::handle_unset;
pub use wait_cmd::handle_wait;

use crate::interpreter::environment::Env;
use crate::interpreter::errors::ShellError;
use crate::interpreter::interpreter::Interpreter;

/// Signature shared by all builtins; `args` excludes the command name.
pub type BuiltinHandler = fn(&mut Interpreter, &mut Env, &[String]) -> Result<i32, ShellError>;

#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub handler: BuiltinHandler,
    /// Runs in the shell process and may mutate its state
    pub special: bool,
    /// Runs in a forked helper process
    pub forks: bool,
}

impl Builtin {
    const fn special(name: &'static str, handler: BuiltinHandler) -> Self {
        Self { name, handler, special: true, forks: false }
    }

    const fn regular(name: &'static str, handler: BuiltinHandler) -> Self {
        Self { name, handler, special: false, forks: false }
    }

    const fn forked(name: &'static str, handler: BuiltinHandler) -> Self {
        Self { name, handler, special: false, forks: true }
    }
}

pub static BUILTINS: &[Builtin] = &[
    Builtin::special(":", handle_colon),
    Builtin::special("break", handle_break),
    Builtin::special("cd", handle_cd),
    Builtin::special("continue", handle_continue),
    Builtin::special("exec", handle_exec),
    Builtin::special("exit", handle_exit),
    Builtin::special("export", handle_export),
    Builtin::special("jobs", handle_jobs),
    Builtin::special("read", handle_read),
    Builtin::special("readonly", handle_readonly),
    Builtin::special("return", handle_return),
    Builtin::special("set", handle_set),
    Builtin::special("shift", handle_shift),
    Builtin::special("umask", handle_umask),
    Builtin::special("unset", handle_unset),
    Builtin::special("wait", handle_wait),
    Builtin::regular("true", handle_true),
    Builtin::regular("false", handle_false),
    Builtin::forked("pwd", handle_pwd),
    Builtin::forked("basename", handle_basename),
];

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

/// `sh: name: message` on the command's standard error
pub(crate) fn report(env: &Env, builtin: &str, message: &str) {
    env.diag(&format!("{}: {}", builtin, message));
}

/// Write builtin output to slot 1.
pub(crate) fn print(env: &Env, builtin: &str, text: &str) -> Result<(), ShellError> {
    env.write(1, text).map_err(|e| ShellError::io(builtin, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert!(lookup("cd").unwrap().special);
        assert!(lookup("pwd").unwrap().forks);
        assert!(!lookup("basename").unwrap().special);
        assert!(!lookup("true").unwrap().forks);
        assert!(lookup("ls").is_none());
    }

    #[test]
    fn test_names_unique() {
        for (i, a) in BUILTINS.iter().enumerate() {
            assert!(BUILTINS[i + 1..].iter().all(|b| b.name != a.name), "duplicate {}", a.name);
        }
    }
}
