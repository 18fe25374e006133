//! Pipeline Execution
//!
//! Handles execution of command pipelines (cmd1 | cmd2 | cmd3).
//!
//! Every stage is a forked child running on a clone of the environment with
//! slot 0 and/or slot 1 pointing at the pipes to its neighbours. The shell
//! drops its copy of each pipe end as soon as the stage that needs it has
//! been started, so readers see end-of-file when their writer exits. The
//! pipeline's status is the status of the last stage.

use std::os::fd::OwnedFd;

use log::debug;

use crate::ast::types::Node;
use crate::interpreter::environment::{Env, FdSlot};
use crate::interpreter::errors::ShellError;
use crate::interpreter::interpreter::Interpreter;
use crate::interpreter::process::{self, ForkResult, Pid};
use crate::interpreter::signals::SigintGuard;

impl Interpreter {
    pub(crate) fn execute_pipeline(&mut self, env: &mut Env, commands: &[Node]) -> Result<i32, ShellError> {
        if let [single] = commands {
            return self.execute(env, single);
        }

        let mut pids = Vec::with_capacity(commands.len());
        let started = self.start_stages(env, commands, &mut pids);
        // Stages that did start are collected even if a later one failed
        let status = self.wait_stages(&pids);
        started?;
        status
    }

    fn start_stages(&mut self, env: &Env, commands: &[Node], pids: &mut Vec<Pid>) -> Result<(), ShellError> {
        let mut input: Option<OwnedFd> = None;
        for (idx, command) in commands.iter().enumerate() {
            let (next_input, output) = if idx + 1 < commands.len() {
                let (read_end, write_end) = process::pipe().map_err(|e| ShellError::resource("pipe", e))?;
                (Some(read_end), Some(write_end))
            } else {
                (None, None)
            };

            match process::fork().map_err(|e| ShellError::resource("fork", e))? {
                ForkResult::Child => {
                    drop(next_input);
                    let mut stage_env = env.clone_child("pipeline stage");
                    if let Some(fd) = input.take() {
                        stage_env.fds.set(0, FdSlot::owned(fd));
                    }
                    if let Some(fd) = output {
                        stage_env.fds.set(1, FdSlot::owned(fd));
                    }
                    if matches!(command, Node::SimpleCommand(_)) {
                        self.tail_exec = true;
                    }
                    self.run_in_child(&mut stage_env, false, |interp, env| interp.execute(env, command))
                }
                ForkResult::Parent(pid) => {
                    debug!("pipeline stage {} started as pid {}", idx, pid);
                    pids.push(pid);
                    input = next_input;
                }
            }
        }
        Ok(())
    }

    fn wait_stages(&mut self, pids: &[Pid]) -> Result<i32, ShellError> {
        let _guard = SigintGuard::new();
        let mut status = 0;
        for &pid in pids {
            let raw = process::wait_pid(pid).map_err(|e| ShellError::resource("wait", e))?;
            status = process::exit_status(raw);
        }
        Ok(status)
    }
}
