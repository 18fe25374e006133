//! Simple Command Execution
//!
//! Expansion order: command words, then assignment values, then
//! redirections. Lookup order for the command word:
//! 1. special builtins, run in the shell itself
//! 2. shell functions
//! 3. other builtins, in the shell or in a forked helper
//! 4. external programs found on `PATH`
//!
//! Prefix assignments without a command word change the current
//! environment; with one they only apply to that command.

use std::path::Path;

use log::debug;
use nix::errno::Errno;

use crate::ast::types::{RedirectNode, SimpleCommandNode};
use crate::interpreter::builtins::{self, Builtin};
use crate::interpreter::environment::Env;
use crate::interpreter::errors::{io_message, ShellError};
use crate::interpreter::helpers::xtrace::trace_simple_command;
use crate::interpreter::interpreter::Interpreter;
use crate::interpreter::process::{self, ForkResult, LookupError, STATUS_NOT_EXECUTABLE, STATUS_NOT_FOUND};
use crate::interpreter::signals;
use crate::interpreter::types::Variable;

fn lookup_message(name: &str, error: &LookupError) -> String {
    match error {
        LookupError::NotFound => format!("{}: not found", name),
        LookupError::NotExecutable(_) => format!("{}: Permission denied", name),
    }
}

/// Apply `NAME=value` pairs to an environment as exported variables.
fn export_assignments(env: &mut Env, assignments: &[(String, String)]) -> Result<(), ShellError> {
    for (name, value) in assignments {
        env.set(name, value.clone())?;
        env.export(name)?;
    }
    Ok(())
}

impl Interpreter {
    pub(crate) fn execute_simple_command(
        &mut self,
        env: &mut Env,
        cmd: &SimpleCommandNode,
    ) -> Result<i32, ShellError> {
        let tail_exec = std::mem::take(&mut self.tail_exec);
        self.subst_status = None;

        let mut words = Vec::new();
        for word in cmd.name.iter().chain(cmd.args.iter()) {
            words.extend(self.expand_fields(env, word)?);
        }
        let mut assignments = Vec::with_capacity(cmd.assignments.len());
        for assignment in &cmd.assignments {
            let value = self.expand_word(env, &assignment.value)?;
            assignments.push((assignment.name.clone(), value));
        }

        if env.options.xtrace {
            let _ = env.write(2, &trace_simple_command(env, &assignments, &words));
        }

        let Some(name) = words.first().cloned() else {
            return self.assign_only(env, assignments, &cmd.redirects);
        };
        let args = words[1..].to_vec();

        if let Some(builtin) = builtins::lookup(&name).filter(|b| b.special) {
            // Assignments before a special builtin persist
            for (var, value) in &assignments {
                env.set(var, value.clone())?;
            }
            return self.run_builtin(env, builtin, &args, &cmd.redirects);
        }

        if let Some(body) = self.functions.get(&name).cloned() {
            debug!("calling function {}", name);
            return self.with_temporary_assignments(env, &assignments, |interp, env| {
                let saved = env.fds.clone();
                let result = match interp.apply_redirects(env, &cmd.redirects) {
                    Ok(()) => interp.call_function(env, body, args),
                    Err(e) => Err(e),
                };
                env.fds = saved;
                result
            });
        }

        if let Some(builtin) = builtins::lookup(&name) {
            if builtin.forks {
                return self.run_forked_builtin(env, builtin, &args, &assignments, &cmd.redirects);
            }
            return self.with_temporary_assignments(env, &assignments, |interp, env| {
                interp.run_builtin(env, builtin, &args, &cmd.redirects)
            });
        }

        self.run_external(env, &words, &assignments, &cmd.redirects, tail_exec)
    }

    /// `NAME=value...` with no command word
    fn assign_only(
        &mut self,
        env: &mut Env,
        assignments: Vec<(String, String)>,
        redirects: &[RedirectNode],
    ) -> Result<i32, ShellError> {
        if !redirects.is_empty() {
            // Files are still opened (and created); nothing is redirected
            let saved = env.fds.clone();
            let result = self.apply_redirects(env, redirects);
            env.fds = saved;
            result?;
        }
        for (name, value) in assignments {
            env.set(&name, value)?;
        }
        Ok(self.subst_status.unwrap_or(0))
    }

    /// Run `body` with `assignments` exported, then put the old values back.
    fn with_temporary_assignments<F>(
        &mut self,
        env: &mut Env,
        assignments: &[(String, String)],
        body: F,
    ) -> Result<i32, ShellError>
    where
        F: FnOnce(&mut Self, &mut Env) -> Result<i32, ShellError>,
    {
        if assignments.is_empty() {
            return body(self, env);
        }
        let saved: Vec<(String, Option<Variable>)> = assignments
            .iter()
            .map(|(name, _)| (name.clone(), env.get(name).cloned()))
            .collect();
        let result = match export_assignments(env, assignments) {
            Ok(()) => body(self, env),
            Err(e) => Err(e),
        };
        for (name, var) in saved.into_iter().rev() {
            env.restore(&name, var);
        }
        result
    }

    /// Run a builtin in the shell process with its redirections in effect.
    fn run_builtin(
        &mut self,
        env: &mut Env,
        builtin: &'static Builtin,
        args: &[String],
        redirects: &[RedirectNode],
    ) -> Result<i32, ShellError> {
        let saved = env.fds.clone();
        if let Err(e) = self.apply_redirects(env, redirects) {
            env.fds = saved;
            return Err(e);
        }
        let result = (builtin.handler)(self, env, args);
        // `exec` without a command makes its redirections permanent
        if !(builtin.name == "exec" && args.is_empty()) {
            env.fds = saved;
        }
        result
    }

    /// Run a builtin in a forked helper process.
    fn run_forked_builtin(
        &mut self,
        env: &mut Env,
        builtin: &'static Builtin,
        args: &[String],
        assignments: &[(String, String)],
        redirects: &[RedirectNode],
    ) -> Result<i32, ShellError> {
        match process::fork().map_err(|e| ShellError::resource("fork", e))? {
            ForkResult::Child => {
                let mut scratch = env.clone_scratch(builtin.name);
                self.run_in_child(&mut scratch, false, |interp, env| {
                    export_assignments(env, assignments)?;
                    interp.apply_redirects(env, redirects)?;
                    (builtin.handler)(interp, env, args)
                })
            }
            ForkResult::Parent(pid) => self.wait_foreground(pid),
        }
    }

    fn run_external(
        &mut self,
        env: &mut Env,
        words: &[String],
        assignments: &[(String, String)],
        redirects: &[RedirectNode],
        tail_exec: bool,
    ) -> Result<i32, ShellError> {
        let name = &words[0];
        let mut scratch = env.clone_scratch(name);
        export_assignments(&mut scratch, assignments)?;
        self.apply_redirects(&mut scratch, redirects)?;

        let path = match process::search_path(name, scratch.value("PATH")) {
            Ok(path) => path,
            Err(e) => {
                scratch.diag(&lookup_message(name, &e));
                return Ok(e.status());
            }
        };

        if tail_exec {
            debug!("exec in place: {}", path.display());
            let status = self.exec_program(&scratch, &path, words);
            process::exit_child(status);
        }

        match process::fork().map_err(|e| ShellError::resource("fork", e))? {
            ForkResult::Child => {
                signals::reset_for_child(false);
                let status = self.exec_program(&scratch, &path, words);
                process::exit_child(status)
            }
            ForkResult::Parent(pid) => {
                debug!("started {} as pid {}", path.display(), pid);
                drop(scratch);
                self.wait_foreground(pid)
            }
        }
    }

    /// Replace the current process with `path`, using `env`'s fd table and
    /// exported variables. Returns the status to report if that fails.
    pub(crate) fn exec_program(&self, env: &Env, path: &Path, argv: &[String]) -> i32 {
        let name = argv.first().map(String::as_str).unwrap_or_default();
        if let Err(e) = env.fds.install() {
            env.diag(&format!("{}: {}", name, io_message(&e)));
            return STATUS_NOT_EXECUTABLE;
        }
        let error = process::exec(path, argv, &env.exported_environ(), self.shell_path.as_deref());
        env.diag(&format!("{}: {}", name, io_message(&error)));
        if error.raw_os_error() == Some(Errno::ENOENT as i32) {
            STATUS_NOT_FOUND
        } else {
            STATUS_NOT_EXECUTABLE
        }
    }

    /// `exec cmd args...` in the shell process
    pub(crate) fn exec_command(&mut self, env: &mut Env, argv: &[String]) -> Result<i32, ShellError> {
        let name = &argv[0];
        let path = match process::search_path(name, env.value("PATH")) {
            Ok(path) => path,
            Err(e) => {
                env.diag(&lookup_message(name, &e));
                return Ok(e.status());
            }
        };
        signals::reset_for_child(false);
        let status = self.exec_program(env, &path, argv);
        signals::install_shell_handlers(self.interactive);
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_all;

    fn run(script: &str, env: &mut Env) -> Result<i32, ShellError> {
        let mut interp = Interpreter::new();
        let list = parse_all(script).unwrap();
        interp.execute_list(env, &list)
    }

    #[test]
    fn test_lookup_messages() {
        assert_eq!(lookup_message("nope", &LookupError::NotFound), "nope: not found");
        assert_eq!(
            lookup_message("x", &LookupError::NotExecutable("/x".into())),
            "x: Permission denied"
        );
    }

    #[test]
    fn test_assignment_only_persists() {
        let mut env = Env::new("test", "sh");
        assert_eq!(run("FOO=bar", &mut env).unwrap(), 0);
        assert_eq!(env.value("FOO"), Some("bar"));
    }

    #[test]
    fn test_prefix_assignment_is_temporary_for_builtins() {
        let mut env = Env::new("test", "sh");
        run("FOO=bar true", &mut env).unwrap();
        assert!(env.get("FOO").is_none());
        env.set("KEEP", "old").unwrap();
        run("KEEP=new false", &mut env).unwrap();
        assert_eq!(env.value("KEEP"), Some("old"));
    }

    #[test]
    fn test_prefix_assignment_persists_for_special_builtins() {
        let mut env = Env::new("test", "sh");
        run("FOO=bar shift 0", &mut env).unwrap();
        assert_eq!(env.value("FOO"), Some("bar"));
    }

    #[test]
    fn test_readonly_assignment_is_command_local() {
        let mut env = Env::new("test", "sh");
        env.set("R", "1").unwrap();
        env.set_readonly("R").unwrap();
        env.fds.set(2, crate::interpreter::environment::FdSlot::Closed);
        assert_eq!(run("R=2; OK=yes", &mut env).unwrap(), 0);
        assert_eq!(env.value("R"), Some("1"));
        assert_eq!(env.value("OK"), Some("yes"));
    }
}
