//! Execution Environment
//!
//! An [`Env`] holds everything a command sees: shell variables, positional
//! parameters, options, the umask and a table of file-descriptor slots 0-9.
//!
//! Subshells and pipeline stages run in clones. A clone deep-copies the
//! variables and argv and copies the fd table by value (slots share the
//! underlying descriptors through `Rc`), so redirections in a clone never
//! touch the parent's table. Instead of an owning back-pointer, a clone
//! records its parent's label and its nesting depth.
//!
//! Exported variables of a mirroring environment are also written to the
//! OS process environment. Scratch clones used for a single external
//! command do not mirror; their exported set is passed to `execve` directly.

use std::io;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::rc::Rc;

use indexmap::IndexMap;
use log::trace;
use nix::errno::Errno;

use crate::interpreter::errors::EnvError;
use crate::interpreter::process;
use crate::interpreter::types::{ShellOptions, Variable};
use crate::parser::classify::is_name;

pub const FD_SLOTS: usize = 10;

/// What a shell-level file descriptor refers to
#[derive(Debug, Clone)]
pub enum FdSlot {
    /// A descriptor the shell process had when it started
    Inherited(RawFd),
    /// A descriptor opened for a redirection or pipe; closed with its last user
    Owned(Rc<OwnedFd>),
    Closed,
}

impl FdSlot {
    pub fn owned(fd: OwnedFd) -> Self {
        Self::Owned(Rc::new(fd))
    }

    pub fn raw(&self) -> Option<RawFd> {
        match self {
            Self::Inherited(fd) => Some(*fd),
            Self::Owned(fd) => Some(fd.as_raw_fd()),
            Self::Closed => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FdTable {
    slots: [FdSlot; FD_SLOTS],
}

impl FdTable {
    /// Slots 0-2 bound to the standard streams, the rest closed
    pub fn standard() -> Self {
        Self {
            slots: std::array::from_fn(|n| {
                if n <= 2 {
                    FdSlot::Inherited(n as RawFd)
                } else {
                    FdSlot::Closed
                }
            }),
        }
    }

    /// Slots bound to whatever the process has open at 0-9
    pub fn from_process() -> Self {
        Self {
            slots: std::array::from_fn(|n| {
                let fd = n as RawFd;
                if n <= 2 || process::fd_is_open(fd) {
                    FdSlot::Inherited(fd)
                } else {
                    FdSlot::Closed
                }
            }),
        }
    }

    pub fn get(&self, fd: i32) -> Option<&FdSlot> {
        usize::try_from(fd).ok().and_then(|n| self.slots.get(n))
    }

    /// False if `fd` is outside the table
    pub fn set(&mut self, fd: i32, slot: FdSlot) -> bool {
        match usize::try_from(fd).ok().and_then(|n| self.slots.get_mut(n)) {
            Some(existing) => {
                *existing = slot;
                true
            }
            None => false,
        }
    }

    pub fn raw(&self, fd: i32) -> Option<RawFd> {
        self.get(fd).and_then(FdSlot::raw)
    }

    /// Make the process descriptors 0-9 match the table. Only called in a
    /// forked child just before `execve`.
    pub fn install(&self) -> io::Result<()> {
        // Move every source out of the 0-9 range first so no dup2 below can
        // clobber a descriptor another slot still needs.
        let mut temps: [Option<RawFd>; FD_SLOTS] = [None; FD_SLOTS];
        for (n, slot) in self.slots.iter().enumerate() {
            if let Some(raw) = slot.raw() {
                temps[n] = Some(process::dup_above(raw, FD_SLOTS as RawFd)?);
            }
        }
        for (n, temp) in temps.iter().enumerate() {
            let target = n as RawFd;
            match temp {
                Some(temp) => process::dup_onto(*temp, target)?,
                None => process::close_fd(target),
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Env {
    pub name: String,
    pub parent: Option<String>,
    pub depth: usize,
    pub fds: FdTable,
    vars: IndexMap<String, Variable>,
    pub umask: u32,
    pub options: ShellOptions,
    /// `$0` followed by the positional parameters
    pub argv: Vec<String>,
    mirror: bool,
}

impl Env {
    /// An empty environment on the standard streams; nothing is mirrored
    pub fn new(name: impl Into<String>, argv0: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            depth: 0,
            fds: FdTable::standard(),
            vars: IndexMap::new(),
            umask: process::current_umask(),
            options: ShellOptions::default(),
            argv: vec![argv0.into()],
            mirror: false,
        }
    }

    /// The root environment: imports the process environment as exported
    /// variables, bumps `SHLVL` and records `PWD`.
    pub fn from_process(argv: Vec<String>, options: ShellOptions) -> Self {
        let mut env = Self {
            name: "root".to_string(),
            parent: None,
            depth: 0,
            fds: FdTable::from_process(),
            vars: IndexMap::new(),
            umask: process::current_umask(),
            options,
            argv: if argv.is_empty() { vec!["sh".to_string()] } else { argv },
            mirror: true,
        };

        for (key, value) in std::env::vars_os() {
            let key = key.to_string_lossy().into_owned();
            if !is_name(&key) {
                continue;
            }
            let mut var = Variable::new(key.clone(), Some(value.to_string_lossy().into_owned()));
            var.exported = true;
            env.vars.insert(key, var);
        }

        let level = env
            .value("SHLVL")
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(0);
        env.set_exported("SHLVL", (level + 1).to_string());
        if let Ok(cwd) = std::env::current_dir() {
            env.set_exported("PWD", cwd.to_string_lossy().into_owned());
        }
        env
    }

    fn set_exported(&mut self, name: &str, value: String) {
        let var = self
            .vars
            .entry(name.to_string())
            .or_insert_with(|| Variable::new(name, None));
        var.value = Some(value);
        var.exported = true;
        let var = var.clone();
        self.mirror_var(&var);
    }

    fn labelled_clone(&self, label: &str) -> Env {
        let mut child = self.clone();
        child.parent = Some(self.name.clone());
        child.name = label.to_string();
        child.depth = self.depth + 1;
        trace!("env {} cloned as {} (depth {})", self.name, label, child.depth);
        child
    }

    /// Clone for a subshell or pipeline stage
    pub fn clone_child(&self, label: &str) -> Env {
        self.labelled_clone(label)
    }

    /// Disposable clone for one command; never writes the OS environment
    pub fn clone_scratch(&self, label: &str) -> Env {
        let mut child = self.labelled_clone(label);
        child.mirror = false;
        child
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }

    /// Value of a set variable
    pub fn value(&self, name: &str) -> Option<&str> {
        self.vars.get(name).and_then(|v| v.value.as_deref())
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), EnvError> {
        self.set_value(name, Some(value.into()))
    }

    /// Create or update at this level; refused for readonly variables.
    pub fn set_value(&mut self, name: &str, value: Option<String>) -> Result<(), EnvError> {
        let allexport = self.options.allexport;
        let var = self
            .vars
            .entry(name.to_string())
            .or_insert_with(|| Variable::new(name, None));
        if var.readonly {
            return Err(EnvError::Readonly(name.to_string()));
        }
        var.value = value;
        if allexport {
            var.exported = true;
        }
        let var = var.clone();
        self.mirror_var(&var);
        Ok(())
    }

    pub fn export(&mut self, name: &str) -> Result<(), EnvError> {
        if !is_name(name) {
            return Err(EnvError::InvalidName(name.to_string()));
        }
        let var = self
            .vars
            .entry(name.to_string())
            .or_insert_with(|| Variable::new(name, None));
        var.exported = true;
        let var = var.clone();
        self.mirror_var(&var);
        Ok(())
    }

    pub fn set_readonly(&mut self, name: &str) -> Result<(), EnvError> {
        if !is_name(name) {
            return Err(EnvError::InvalidName(name.to_string()));
        }
        self.vars
            .entry(name.to_string())
            .or_insert_with(|| Variable::new(name, None))
            .readonly = true;
        Ok(())
    }

    pub fn unset(&mut self, name: &str) -> Result<(), EnvError> {
        match self.vars.get(name) {
            Some(var) if var.readonly => Err(EnvError::Readonly(name.to_string())),
            Some(_) => {
                if let Some(var) = self.vars.shift_remove(name) {
                    if var.exported && self.mirror {
                        std::env::remove_var(name);
                    }
                }
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Put back a variable saved before a temporary assignment
    pub fn restore(&mut self, name: &str, saved: Option<Variable>) {
        match saved {
            Some(var) => {
                self.mirror_var(&var);
                self.vars.insert(name.to_string(), var);
            }
            None => {
                if let Some(var) = self.vars.shift_remove(name) {
                    if var.exported && self.mirror {
                        std::env::remove_var(name);
                    }
                }
            }
        }
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.vars.values()
    }

    /// `NAME=value` strings for `execve`
    pub fn exported_environ(&self) -> Vec<String> {
        self.vars
            .values()
            .filter(|v| v.exported)
            .filter_map(|v| v.value.as_ref().map(|value| format!("{}={}", v.name, value)))
            .collect()
    }

    fn mirror_var(&self, var: &Variable) {
        if !self.mirror || !var.exported {
            return;
        }
        match &var.value {
            Some(value) if !value.contains('\0') => std::env::set_var(&var.name, value),
            Some(_) => {}
            None => std::env::remove_var(&var.name),
        }
    }

    pub fn positional(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }

    pub fn set_positional(&mut self, args: Vec<String>) {
        self.argv.truncate(1);
        self.argv.extend(args);
    }

    /// Write to one of this environment's descriptor slots.
    pub fn write(&self, fd: i32, text: &str) -> io::Result<()> {
        match self.fds.raw(fd) {
            Some(raw) => process::write_all(raw, text.as_bytes()),
            None => Err(io::Error::from(Errno::EBADF)),
        }
    }

    /// One-line diagnostic on this environment's standard error
    pub fn diag(&self, message: &str) {
        let _ = self.write(2, &format!("sh: {}\n", message));
    }
}
