//! Interpreter - AST Execution Engine
//!
//! Walks the AST produced by the parser. One `Interpreter` serves the whole
//! shell process; the variable state it works on is the [`Env`] passed to
//! each call, so subshells and pipeline stages simply run the same walker
//! on a cloned environment inside a forked child.
//!
//! Delegates to specialized modules for:
//! - Simple commands and command lookup (simple_command.rs)
//! - Pipelines (pipeline_execution.rs)
//! - Redirections (redirections.rs)
//! - Word expansion (expansion/)
//! - Built-in commands (builtins/)

use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use log::{debug, trace};
use nix::fcntl::OFlag;
use nix::sys::stat::Mode;

use crate::ast::types::{
    CaseNode, CommandList, ElseBranch, ForNode, IfNode, ListItem, LogicalOp, LoopNode, Node, OpNode,
};
use crate::interpreter::environment::{Env, FdSlot};
use crate::interpreter::errors::ShellError;
use crate::interpreter::expansion::glob_matches;
use crate::interpreter::helpers::loop_helpers::{handle_loop_error, LoopAction};
use crate::interpreter::jobs::JobTable;
use crate::interpreter::process::{self, ForkResult, Pid};
use crate::interpreter::signals::{self, SigintGuard};

/// Maximum nesting of function calls
pub const MAX_CALL_DEPTH: usize = 1000;

#[derive(Debug)]
pub struct Interpreter {
    /// Function table, keyed by name
    pub functions: HashMap<String, Rc<Node>>,
    pub jobs: JobTable,
    /// `$?`
    pub last_status: i32,
    /// `$!`
    pub last_bg_pid: Option<Pid>,
    /// `$$`; stays the top-level shell's pid inside subshells
    pub shell_pid: Pid,
    /// Executable used to run scripts the kernel refuses to exec
    pub shell_path: Option<PathBuf>,
    pub interactive: bool,
    /// Inside an `if`/`while`/`until` condition, left of `&&`/`||`, or under `!`
    pub(crate) condition_depth: usize,
    pub(crate) call_depth: usize,
    pub(crate) loop_depth: u32,
    /// Running in a forked child
    pub(crate) in_child: bool,
    /// The next simple command is the last thing this child runs; an
    /// external program may replace the process instead of forking again
    pub(crate) tail_exec: bool,
    /// Status of the last command substitution of the current command
    pub(crate) subst_status: Option<i32>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
            jobs: JobTable::new(),
            last_status: 0,
            last_bg_pid: None,
            shell_pid: process::getpid(),
            shell_path: std::env::current_exe().ok(),
            interactive: false,
            condition_depth: 0,
            call_depth: 0,
            loop_depth: 0,
            in_child: false,
            tail_exec: false,
            subst_status: None,
        }
    }

    /// Execute a list, returning the status of the last item.
    pub fn execute_list(&mut self, env: &mut Env, list: &CommandList) -> Result<i32, ShellError> {
        let mut status = 0;
        for item in list {
            status = self.execute_item(env, item)?;
        }
        Ok(status)
    }

    /// Execute one list item: in the foreground, or as a background job.
    pub fn execute_item(&mut self, env: &mut Env, item: &ListItem) -> Result<i32, ShellError> {
        if !item.background {
            return self.execute(env, &item.command);
        }

        match process::fork().map_err(|e| ShellError::resource("fork", e))? {
            ForkResult::Child => {
                let mut child_env = env.clone_child("background");
                if !self.interactive {
                    let null = process::open("/dev/null", OFlag::O_RDONLY, Mode::empty())
                        .map_err(|e| ShellError::io("/dev/null", e));
                    if let Ok(fd) = null {
                        child_env.fds.set(0, FdSlot::owned(fd));
                    }
                }
                if matches!(item.command, Node::SimpleCommand(_)) {
                    self.tail_exec = true;
                }
                self.run_in_child(&mut child_env, true, |interp, env| interp.execute(env, &item.command))
            }
            ForkResult::Parent(pid) => {
                let id = self.jobs.add(pid, &item.text);
                if self.interactive {
                    let _ = env.write(2, &format!("[{}] {}\n", id, pid));
                }
                self.last_bg_pid = Some(pid);
                self.last_status = 0;
                Ok(0)
            }
        }
    }

    /// Execute a node and record its status in `$?`.
    pub fn execute(&mut self, env: &mut Env, node: &Node) -> Result<i32, ShellError> {
        let status = match node {
            Node::SimpleCommand(cmd) => {
                let status = match self.execute_simple_command(env, cmd) {
                    Err(e) if e.is_command_local() => {
                        env.diag(&e.to_string());
                        e.status()
                    }
                    other => other?,
                };
                self.check_errexit(env, status)?
            }
            Node::Pipeline(pipeline) => {
                if pipeline.negated {
                    self.condition_depth += 1;
                    let result = self.execute_pipeline(env, &pipeline.commands);
                    self.condition_depth -= 1;
                    if result? == 0 {
                        1
                    } else {
                        0
                    }
                } else {
                    let status = self.execute_pipeline(env, &pipeline.commands)?;
                    self.check_errexit(env, status)?
                }
            }
            Node::Op(op) => self.execute_op(env, op)?,
            Node::If(node) => self.execute_if(env, node)?,
            Node::For(node) => self.execute_for(env, node)?,
            Node::While(node) => self.execute_loop(env, node, false)?,
            Node::Until(node) => self.execute_loop(env, node, true)?,
            Node::Case(node) => self.execute_case(env, node)?,
            Node::Group(list) => self.execute_list(env, list)?,
            Node::Subshell(list) => {
                let status = self.execute_subshell(env, list)?;
                self.check_errexit(env, status)?
            }
            Node::Compound(compound) => {
                let saved = env.fds.clone();
                let result = match self.apply_redirects(env, &compound.redirects) {
                    Ok(()) => self.execute(env, &compound.command),
                    Err(e) if e.is_command_local() => {
                        env.fds = saved.clone();
                        env.diag(&e.to_string());
                        Ok(e.status())
                    }
                    Err(e) => Err(e),
                };
                env.fds = saved;
                result?
            }
            Node::Func(func) => {
                debug!("defining function {}", func.name);
                self.functions.insert(func.name.clone(), Rc::new((*func.body).clone()));
                0
            }
        };
        self.last_status = status;
        Ok(status)
    }

    /// `set -e`: a failure outside any condition ends the shell.
    fn check_errexit(&self, env: &Env, status: i32) -> Result<i32, ShellError> {
        if status != 0 && env.options.errexit && self.condition_depth == 0 {
            trace!("errexit on status {}", status);
            return Err(ShellError::Exit(status));
        }
        Ok(status)
    }

    fn execute_condition(&mut self, env: &mut Env, list: &CommandList) -> Result<i32, ShellError> {
        self.condition_depth += 1;
        let result = self.execute_list(env, list);
        self.condition_depth -= 1;
        result
    }

    fn execute_op(&mut self, env: &mut Env, op: &OpNode) -> Result<i32, ShellError> {
        self.condition_depth += 1;
        let left = self.execute(env, &op.left);
        self.condition_depth -= 1;
        let left = left?;
        let run_right = match op.op {
            LogicalOp::And => left == 0,
            LogicalOp::Or => left != 0,
        };
        if run_right {
            self.execute(env, &op.right)
        } else {
            Ok(left)
        }
    }

    fn execute_if(&mut self, env: &mut Env, node: &IfNode) -> Result<i32, ShellError> {
        if self.execute_condition(env, &node.condition)? == 0 {
            return self.execute_list(env, &node.then_branch);
        }
        match &node.else_branch {
            Some(ElseBranch::Elif(elif)) => self.execute_if(env, elif),
            Some(ElseBranch::Else(list)) => self.execute_list(env, list),
            None => Ok(0),
        }
    }

    /// Run a loop body once; `Ok(false)` once a `break` ends the loop.
    fn run_body(&mut self, env: &mut Env, body: &CommandList, status: &mut i32) -> Result<bool, ShellError> {
        self.loop_depth += 1;
        let result = self.execute_list(env, body);
        self.loop_depth -= 1;
        match result {
            Ok(s) => {
                *status = s;
                Ok(true)
            }
            Err(e) => match handle_loop_error(e, self.loop_depth + 1) {
                LoopAction::Break => {
                    *status = 0;
                    Ok(false)
                }
                LoopAction::Continue => {
                    *status = 0;
                    Ok(true)
                }
                LoopAction::Rethrow(e) => Err(e),
            },
        }
    }

    fn execute_for(&mut self, env: &mut Env, node: &ForNode) -> Result<i32, ShellError> {
        let values = match &node.words {
            Some(words) => {
                let mut values = Vec::new();
                for word in words {
                    values.extend(self.expand_fields(env, word)?);
                }
                values
            }
            None => env.positional().to_vec(),
        };

        let mut status = 0;
        for value in values {
            env.set(&node.variable, value)?;
            if !self.run_body(env, &node.body, &mut status)? {
                break;
            }
        }
        Ok(status)
    }

    fn execute_loop(&mut self, env: &mut Env, node: &LoopNode, until: bool) -> Result<i32, ShellError> {
        let mut status = 0;
        loop {
            let condition = self.execute_condition(env, &node.condition)?;
            if (condition == 0) == until {
                break;
            }
            if !self.run_body(env, &node.body, &mut status)? {
                break;
            }
        }
        Ok(status)
    }

    fn execute_case(&mut self, env: &mut Env, node: &CaseNode) -> Result<i32, ShellError> {
        let subject = self.expand_word(env, &node.subject)?;
        for item in &node.items {
            for pattern in &item.patterns {
                let pattern = self.expand_pattern(env, &pattern.raw)?;
                if glob_matches(&pattern, &subject) {
                    return self.execute_list(env, &item.body);
                }
            }
        }
        Ok(0)
    }

    fn execute_subshell(&mut self, env: &mut Env, list: &CommandList) -> Result<i32, ShellError> {
        match process::fork().map_err(|e| ShellError::resource("fork", e))? {
            ForkResult::Child => {
                let mut child_env = env.clone_child("subshell");
                if let [item] = list.as_slice() {
                    if !item.background && matches!(item.command, Node::SimpleCommand(_)) {
                        self.tail_exec = true;
                    }
                }
                self.run_in_child(&mut child_env, false, |interp, env| interp.execute_list(env, list))
            }
            ForkResult::Parent(pid) => self.wait_foreground(pid),
        }
    }

    /// Call a shell function with `args` as its positional parameters.
    pub(crate) fn call_function(
        &mut self,
        env: &mut Env,
        body: Rc<Node>,
        args: Vec<String>,
    ) -> Result<i32, ShellError> {
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(ShellError::expansion("maximum function nesting level exceeded"));
        }
        let saved_argv = env.argv.clone();
        env.set_positional(args);
        let saved_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        self.call_depth += 1;

        let result = self.execute(env, &body);

        self.call_depth -= 1;
        self.loop_depth = saved_loop_depth;
        env.argv = saved_argv;
        match result {
            Err(ShellError::Return(code)) => Ok(code),
            other => other,
        }
    }

    /// Wait for a foreground child with interrupts left to the child.
    pub(crate) fn wait_foreground(&mut self, pid: Pid) -> Result<i32, ShellError> {
        let _guard = SigintGuard::new();
        let raw = process::wait_pid(pid).map_err(|e| ShellError::resource("wait", e))?;
        Ok(process::exit_status(raw))
    }

    /// Finish a freshly forked child: run `body`, then leave the process
    /// with its status. Never returns.
    pub(crate) fn run_in_child<F>(&mut self, env: &mut Env, background: bool, body: F) -> !
    where
        F: FnOnce(&mut Self, &mut Env) -> Result<i32, ShellError>,
    {
        signals::reset_for_child(background);
        self.in_child = true;
        self.interactive = false;
        self.jobs = JobTable::new();
        let status = match body(self, env) {
            Ok(status) => status,
            Err(e) => self.report_error(env, e),
        };
        process::exit_child(status)
    }

    /// Print the diagnostic for an error that reached a top level and return
    /// the status it stands for.
    pub fn report_error(&mut self, env: &Env, error: ShellError) -> i32 {
        let status = error.status();
        match error {
            ShellError::Break(_) | ShellError::Continue(_) => {}
            ShellError::Return(_) | ShellError::Exit(_) => {}
            other => env.diag(&other.to_string()),
        }
        self.last_status = status;
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_all;

    /// Runs scripts made only of builtins and control flow; nothing forks.
    fn run(script: &str, env: &mut Env) -> Result<i32, ShellError> {
        let mut interp = Interpreter::new();
        let list = parse_all(script).unwrap();
        interp.execute_list(env, &list)
    }

    #[test]
    fn test_assignment_and_short_circuit() {
        let mut env = Env::new("test", "sh");
        assert_eq!(run("A=1; false && A=2; true || A=3", &mut env).unwrap(), 0);
        assert_eq!(env.value("A"), Some("1"));
        assert_eq!(run("false && A=2", &mut env).unwrap(), 1);
    }

    #[test]
    fn test_for_loop_binds_variable() {
        let mut env = Env::new("test", "sh");
        run("L=; for i in a b c; do L=$L$i; done", &mut env).unwrap();
        assert_eq!(env.value("L"), Some("abc"));
        assert_eq!(env.value("i"), Some("c"));
    }

    #[test]
    fn test_for_without_words_uses_positionals() {
        let mut env = Env::new("test", "sh");
        env.set_positional(vec!["x".into(), "y".into()]);
        run("L=; for p; do L=$L$p; done", &mut env).unwrap();
        assert_eq!(env.value("L"), Some("xy"));
    }

    #[test]
    fn test_break_and_continue() {
        let mut env = Env::new("test", "sh");
        run(
            "L=; for i in 1 2 3 4; do case $i in 2) continue;; 4) break;; esac; L=$L$i; done",
            &mut env,
        )
        .unwrap();
        assert_eq!(env.value("L"), Some("13"));

        run(
            "L=; for i in a b; do for j in 1 2; do L=$L$i$j; break 2; done; done",
            &mut env,
        )
        .unwrap();
        assert_eq!(env.value("L"), Some("a1"));
    }

    #[test]
    fn test_while_and_until() {
        let mut env = Env::new("test", "sh");
        run("N=x; while case $N in xxx) false;; *) true;; esac; do N=${N}x; done", &mut env).unwrap();
        assert_eq!(env.value("N"), Some("xxx"));
        run("M=; until case $M in yy) true;; *) false;; esac; do M=${M}y; done", &mut env).unwrap();
        assert_eq!(env.value("M"), Some("yy"));
    }

    #[test]
    fn test_if_elif_else() {
        let mut env = Env::new("test", "sh");
        run("if false; then R=1; elif true; then R=2; else R=3; fi", &mut env).unwrap();
        assert_eq!(env.value("R"), Some("2"));
        run("if false; then R=1; else R=3; fi", &mut env).unwrap();
        assert_eq!(env.value("R"), Some("3"));
    }

    #[test]
    fn test_case_patterns() {
        let mut env = Env::new("test", "sh");
        env.set("F", "main.rs").unwrap();
        run("case $F in *.c|*.h) K=c;; *.rs) K=rust;; *) K=other;; esac", &mut env).unwrap();
        assert_eq!(env.value("K"), Some("rust"));
        run("case '*' in \\*) K=star;; esac", &mut env).unwrap();
        assert_eq!(env.value("K"), Some("star"));
        run("case x in '*') K=quoted;; *) K=glob;; esac", &mut env).unwrap();
        assert_eq!(env.value("K"), Some("glob"));
    }

    #[test]
    fn test_functions_share_state() {
        let mut env = Env::new("test", "sh");
        env.set_positional(vec!["outer".into()]);
        run("f() { G=$1; return 3; G=unreached; }; f inner; S=$?", &mut env).unwrap();
        assert_eq!(env.value("G"), Some("inner"));
        assert_eq!(env.value("S"), Some("3"));
        assert_eq!(env.positional(), &["outer".to_string()]);
    }

    #[test]
    fn test_negation() {
        let mut env = Env::new("test", "sh");
        assert_eq!(run("! false", &mut env).unwrap(), 0);
        assert_eq!(run("! true", &mut env).unwrap(), 1);
    }

    #[test]
    fn test_errexit() {
        let mut env = Env::new("test", "sh");
        env.options.errexit = true;
        assert!(matches!(run("if false; then :; fi; false || true", &mut env), Ok(0)));
        assert!(matches!(run("false; A=after", &mut env), Err(ShellError::Exit(1))));
        assert!(env.get("A").is_none());
    }

    #[test]
    fn test_expansion_error_unwinds() {
        let mut env = Env::new("test", "sh");
        let result = run("A=${MISSING:?gone}; B=2", &mut env);
        assert!(matches!(result, Err(ShellError::Expansion(_))));
        assert!(env.get("B").is_none());
    }
}
