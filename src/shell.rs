//! Shell driver
//!
//! Reads one top-level unit at a time from a line source and runs it.
//! Before each unit finished background jobs are collected and, in an
//! interactive shell, reported.
//!
//! Failure handling per unit:
//! - syntax error: diagnostic, status 2, the rest of the buffered input is
//!   dropped; a non-interactive shell exits
//! - expansion error or other unwinding failure: diagnostic; a
//!   non-interactive shell exits with its status
//! - `exit`: the shell ends with the given status

use std::os::fd::{AsRawFd, OwnedFd};

use log::{debug, trace};
use nix::fcntl::OFlag;
use nix::sys::stat::Mode;

use crate::interpreter::environment::Env;
use crate::interpreter::errors::ShellError;
use crate::interpreter::interpreter::Interpreter;
use crate::interpreter::process;
use crate::parser::{FdSource, LineSource, Parser, StrSource, Unit};

/// Where commands come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// `-c string`
    Command(String),
    /// A script file named on the command line
    Script(String),
    /// Standard input (`-s` or no operand)
    Stdin,
}

pub struct Shell {
    pub interp: Interpreter,
    pub env: Env,
    parser: Parser,
    /// Keeps a script file open while it is read
    _script: Option<OwnedFd>,
}

impl Shell {
    pub fn new(env: Env, input: Input, interactive: bool) -> Result<Self, ShellError> {
        let mut interp = Interpreter::new();
        interp.interactive = interactive;

        let (source, script): (Box<dyn LineSource>, Option<OwnedFd>) = match input {
            Input::Command(text) => (Box::new(StrSource::new(text)), None),
            Input::Script(path) => {
                let fd = process::open(&path, OFlag::O_RDONLY, Mode::empty()).map_err(|e| ShellError::io(path.clone(), e))?;
                (Box::new(FdSource::new(fd.as_raw_fd(), false)), Some(fd))
            }
            Input::Stdin => (Box::new(FdSource::new(0, interactive)), None),
        };

        Ok(Self {
            interp,
            env,
            parser: Parser::new(source),
            _script: script,
        })
    }

    /// Print `[n] Done` lines for jobs that finished since the last prompt.
    fn notify_jobs(&mut self) {
        self.interp.jobs.poll();
        if !self.interp.interactive {
            // Nobody to tell; keep the table from growing
            self.interp.jobs.take_finished();
            return;
        }
        for job in self.interp.jobs.take_finished() {
            let _ = self.env.write(2, &format!("{}\n", job.describe()));
        }
    }

    /// Run until end of input or `exit`; returns the shell's exit status.
    pub fn run(&mut self) -> i32 {
        let interactive = self.interp.interactive;
        loop {
            self.notify_jobs();
            self.parser.set_verbose(self.env.options.verbose);

            let item = match self.parser.parse_command() {
                Ok(Unit::Command(item)) => item,
                Ok(Unit::Blank) => continue,
                Ok(Unit::EndOfInput) => {
                    debug!("end of input, status {}", self.interp.last_status);
                    return self.interp.last_status;
                }
                Err(e) => {
                    self.env.diag(&e.to_string());
                    self.parser.recover();
                    self.interp.last_status = 2;
                    if !interactive {
                        return 2;
                    }
                    continue;
                }
            };

            if self.env.options.noexec && !interactive {
                continue;
            }
            trace!("unit: {}", item.text);

            match self.interp.execute_item(&mut self.env, &item) {
                Ok(_) => {}
                Err(ShellError::Exit(code)) => return code,
                Err(e) => {
                    let fatal = !e.is_control_flow();
                    let status = self.interp.report_error(&self.env, e);
                    if fatal && !interactive {
                        return status;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::environment::FdSlot;

    fn shell(script: &str) -> Shell {
        let mut env = Env::new("test", "sh");
        env.fds.set(2, FdSlot::Closed);
        Shell::new(env, Input::Command(script.to_string()), false).unwrap()
    }

    #[test]
    fn test_runs_to_end_of_input() {
        let mut sh = shell("A=1\nB=$A$A\nfalse");
        assert_eq!(sh.run(), 1);
        assert_eq!(sh.env.value("B"), Some("11"));
    }

    #[test]
    fn test_exit_stops_the_shell() {
        let mut sh = shell("A=1; exit 4; A=2");
        assert_eq!(sh.run(), 4);
        assert_eq!(sh.env.value("A"), Some("1"));
    }

    #[test]
    fn test_syntax_error_is_status_2() {
        let mut sh = shell("A=1\nif then\nA=2");
        assert_eq!(sh.run(), 2);
        assert_eq!(sh.env.value("A"), Some("1"));
    }

    #[test]
    fn test_expansion_error_ends_non_interactive_shell() {
        let mut sh = shell("echo=${X:?unset}\nA=after");
        assert_eq!(sh.run(), 1);
        assert!(sh.env.get("A").is_none());
    }

    #[test]
    fn test_noexec() {
        let mut sh = shell("set -n\nA=1\nexit 3");
        assert_eq!(sh.run(), 0);
        assert!(sh.env.get("A").is_none());
    }

    #[test]
    fn test_missing_script() {
        let env = Env::new("test", "sh");
        let err = Shell::new(env, Input::Script("/nonexistent/script.sh".into()), false).err().unwrap();
        assert_eq!(err.to_string(), "/nonexistent/script.sh: No such file or directory");
    }
}
