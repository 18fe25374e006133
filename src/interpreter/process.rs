//! Process Primitives
//!
//! Thin wrappers over the `nix` calls the evaluator needs: fork, execve,
//! pipes, descriptor juggling and waiting. Every descriptor the shell opens
//! for itself is close-on-exec; children receive only what their fd table
//! installs.

use std::convert::Infallible;
use std::ffi::CString;
use std::io;
use std::os::fd::{BorrowedFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use log::debug;
use nix::errno::Errno;
use nix::fcntl::{self, FcntlArg, FdFlag, OFlag};
use nix::sys::stat::{self, Mode};
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::{self, Whence};

pub use nix::unistd::Pid;

/// Exit status for a command that was found but could not be run
pub const STATUS_NOT_EXECUTABLE: i32 = 126;
/// Exit status for a command that was not found
pub const STATUS_NOT_FOUND: i32 = 127;

pub enum ForkResult {
    Child,
    Parent(Pid),
}

pub fn fork() -> io::Result<ForkResult> {
    // SAFETY: the shell is single-threaded; the child only runs shell code
    // and then execs or calls `_exit`.
    match unsafe { unistd::fork() }? {
        unistd::ForkResult::Child => Ok(ForkResult::Child),
        unistd::ForkResult::Parent { child } => Ok(ForkResult::Parent(child)),
    }
}

/// Leave a forked child without running the parent's exit handlers.
pub fn exit_child(status: i32) -> ! {
    // SAFETY: `_exit` is async-signal-safe and never returns.
    unsafe { libc::_exit(status & 0xff) }
}

pub fn getpid() -> Pid {
    unistd::getpid()
}

/// A close-on-exec pipe: (read end, write end)
pub fn pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    Ok(unistd::pipe2(OFlag::O_CLOEXEC)?)
}

/// Open a file close-on-exec.
pub fn open(path: &str, flags: OFlag, mode: Mode) -> io::Result<OwnedFd> {
    loop {
        match fcntl::open(path, flags | OFlag::O_CLOEXEC, mode) {
            // SAFETY: `fd` was just opened and is owned by us.
            Ok(fd) => return Ok(unsafe { OwnedFd::from_raw_fd(fd) }),
            Err(Errno::EINTR) => continue,
            Err(errno) => return Err(errno.into()),
        }
    }
}

pub fn fd_is_open(fd: RawFd) -> bool {
    fcntl::fcntl(fd, FcntlArg::F_GETFD).is_ok()
}

/// Duplicate `fd` to the lowest free descriptor >= `min`, close-on-exec.
pub fn dup_above(fd: RawFd, min: RawFd) -> io::Result<RawFd> {
    Ok(fcntl::fcntl(fd, FcntlArg::F_DUPFD_CLOEXEC(min))?)
}

pub fn dup_onto(fd: RawFd, target: RawFd) -> io::Result<()> {
    unistd::dup2(fd, target)?;
    Ok(())
}

/// Close a descriptor number that no `OwnedFd` stands for.
pub fn close_fd(fd: RawFd) {
    let _ = unistd::close(fd);
}

pub fn write_all(fd: RawFd, mut bytes: &[u8]) -> io::Result<()> {
    // SAFETY: callers pass descriptors that stay open for the whole call.
    let fd = unsafe { BorrowedFd::borrow_raw(fd) };
    while !bytes.is_empty() {
        match unistd::write(fd, bytes) {
            Ok(n) => bytes = &bytes[n..],
            Err(Errno::EINTR) => continue,
            Err(errno) => return Err(errno.into()),
        }
    }
    Ok(())
}

/// Read into `buf`, retrying on interrupts. 0 means end of file.
pub fn read_some(fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match unistd::read(fd, buf) {
            Err(Errno::EINTR) => continue,
            other => return Ok(other?),
        }
    }
}

/// Read everything until end of file.
pub fn read_to_end(fd: RawFd) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = read_some(fd, &mut buf)?;
        if n == 0 {
            return Ok(out);
        }
        out.extend_from_slice(&buf[..n]);
    }
}

/// Block until `pid` terminates.
pub fn wait_pid(pid: Pid) -> io::Result<WaitStatus> {
    loop {
        match wait::waitpid(pid, None) {
            Err(Errno::EINTR) => continue,
            other => return Ok(other?),
        }
    }
}

/// Non-blocking check; `Some(status)` once `pid` has terminated.
pub fn try_wait_pid(pid: Pid) -> io::Result<Option<WaitStatus>> {
    match wait::waitpid(pid, Some(WaitPidFlag::WNOHANG))? {
        WaitStatus::StillAlive => Ok(None),
        status => Ok(Some(status)),
    }
}

/// Translate a wait status into the shell's exit-status convention.
pub fn exit_status(status: WaitStatus) -> i32 {
    match status {
        WaitStatus::Exited(_, code) => code,
        WaitStatus::Signaled(_, signal, _) | WaitStatus::Stopped(_, signal) => 128 + signal as i32,
        _ => 0,
    }
}

pub fn current_umask() -> u32 {
    let mask = stat::umask(Mode::empty());
    stat::umask(mask);
    mask.bits() as u32
}

pub fn set_umask(mask: u32) {
    stat::umask(Mode::from_bits_truncate(mask as libc::mode_t));
}

/// Why a command word could not be resolved to a program
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    NotFound,
    NotExecutable(PathBuf),
}

impl LookupError {
    pub fn status(&self) -> i32 {
        match self {
            Self::NotFound => STATUS_NOT_FOUND,
            Self::NotExecutable(_) => STATUS_NOT_EXECUTABLE,
        }
    }
}

fn is_executable_file(path: &Path) -> Option<bool> {
    let meta = std::fs::metadata(path).ok()?;
    if meta.is_dir() {
        return Some(false);
    }
    Some(meta.permissions().mode() & 0o111 != 0)
}

/// Resolve a command word against `PATH`. Words containing `/` are used as is.
pub fn search_path(name: &str, path_var: Option<&str>) -> Result<PathBuf, LookupError> {
    if name.is_empty() {
        return Err(LookupError::NotFound);
    }
    if name.contains('/') {
        let path = PathBuf::from(name);
        return match is_executable_file(&path) {
            Some(true) => Ok(path),
            Some(false) => Err(LookupError::NotExecutable(path)),
            None => Err(LookupError::NotFound),
        };
    }

    let mut denied = None;
    let search = path_var.unwrap_or("/usr/local/bin:/usr/bin:/bin");
    for dir in search.split(':') {
        let dir = if dir.is_empty() { "." } else { dir };
        let candidate = Path::new(dir).join(name);
        match is_executable_file(&candidate) {
            Some(true) => return Ok(candidate),
            Some(false) if denied.is_none() => denied = Some(candidate),
            _ => {}
        }
    }
    Err(match denied {
        Some(path) => LookupError::NotExecutable(path),
        None => LookupError::NotFound,
    })
}

fn to_cstring(text: &str) -> Result<CString, Errno> {
    CString::new(text).map_err(|_| Errno::EINVAL)
}

fn to_cstrings(items: &[String]) -> Result<Vec<CString>, Errno> {
    items.iter().map(|s| to_cstring(s)).collect()
}

/// Replace the process image. Returns only on failure.
///
/// A file the kernel refuses with ENOEXEC is treated as a shell script and
/// run by re-executing `shell` on it.
pub fn exec(path: &Path, argv: &[String], envp: &[String], shell: Option<&Path>) -> io::Error {
    let errno = execve(&path.to_string_lossy(), argv, envp);
    let Some(shell) = shell.filter(|_| errno == Errno::ENOEXEC) else {
        return errno.into();
    };
    debug!("{}: not a binary, running as a script", path.display());
    let mut script_argv = vec![argv.first().cloned().unwrap_or_else(|| "sh".to_string())];
    script_argv.push(path.to_string_lossy().into_owned());
    script_argv.extend(argv.iter().skip(1).cloned());
    execve(&shell.to_string_lossy(), &script_argv, envp).into()
}

fn try_execve(path: &str, argv: &[String], envp: &[String]) -> Result<Infallible, Errno> {
    let c_path = to_cstring(path)?;
    let c_argv = to_cstrings(argv)?;
    let c_envp = to_cstrings(envp)?;
    unistd::execve(&c_path, &c_argv, &c_envp)
}

fn execve(path: &str, argv: &[String], envp: &[String]) -> Errno {
    match try_execve(path, argv, envp) {
        Ok(never) => match never {},
        Err(errno) => errno,
    }
}

/// An unlinked temporary file holding `contents`, positioned at its start.
pub fn anonymous_file(contents: &str) -> io::Result<OwnedFd> {
    let dir = std::env::var("TMPDIR").unwrap_or_else(|_| "/tmp".to_string());
    let template = format!("{}/sh-heredoc-XXXXXX", dir.trim_end_matches('/'));
    let (fd, path) = unistd::mkstemp(template.as_str())?;
    // SAFETY: `fd` was just created by mkstemp and is owned by us.
    let owned = unsafe { OwnedFd::from_raw_fd(fd) };
    unistd::unlink(path.as_path())?;
    fcntl::fcntl(fd, FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))?;
    write_all(fd, contents.as_bytes())?;
    unistd::lseek(fd, 0, Whence::SeekSet)?;
    Ok(owned)
}
