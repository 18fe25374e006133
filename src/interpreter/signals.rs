//! Signal dispositions
//!
//! The shell itself only ever installs one real handler: `SIGCHLD` raises a
//! flag that the job table checks before reaping. Interrupts are ignored
//! while a foreground child runs so the signal reaches the child only.
//!
//! The Rust runtime starts the shell with `SIGPIPE` ignored. Children get it
//! back at its default so a writer into a closed pipe dies with 128+13.

use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

static CHILD_EXITED: AtomicBool = AtomicBool::new(false);

extern "C" fn sigchld_handler(_sig: libc::c_int) {
    CHILD_EXITED.store(true, Ordering::SeqCst);
}

fn set_disposition(signal: Signal, handler: SigHandler) -> SigHandler {
    let action = SigAction::new(handler, SaFlags::SA_RESTART, SigSet::empty());
    // SAFETY: the handler is SIG_IGN, SIG_DFL or `sigchld_handler`, which
    // only touches an atomic.
    match unsafe { sigaction(signal, &action) } {
        Ok(old) => old.handler(),
        Err(errno) => {
            debug!("sigaction({}): {}", signal, errno);
            SigHandler::SigDfl
        }
    }
}

/// Dispositions for the shell process at start-up.
pub fn install_shell_handlers(interactive: bool) {
    set_disposition(Signal::SIGCHLD, SigHandler::Handler(sigchld_handler));
    set_disposition(Signal::SIGPIPE, SigHandler::SigIgn);
    if interactive {
        set_disposition(Signal::SIGINT, SigHandler::SigIgn);
        set_disposition(Signal::SIGQUIT, SigHandler::SigIgn);
    }
}

/// Dispositions for a freshly forked child or a program about to replace
/// the shell. Background children keep ignoring keyboard interrupts.
pub fn reset_for_child(background: bool) {
    set_disposition(Signal::SIGCHLD, SigHandler::SigDfl);
    set_disposition(Signal::SIGPIPE, SigHandler::SigDfl);
    let keyboard = if background { SigHandler::SigIgn } else { SigHandler::SigDfl };
    set_disposition(Signal::SIGINT, keyboard);
    set_disposition(Signal::SIGQUIT, keyboard);
}

/// True once since the last call if any child changed state.
pub fn take_child_exited() -> bool {
    CHILD_EXITED.swap(false, Ordering::SeqCst)
}

/// Ignores `SIGINT` in the shell until dropped.
pub struct SigintGuard {
    previous: SigHandler,
}

impl SigintGuard {
    pub fn new() -> Self {
        Self {
            previous: set_disposition(Signal::SIGINT, SigHandler::SigIgn),
        }
    }
}

impl Default for SigintGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SigintGuard {
    fn drop(&mut self) {
        set_disposition(Signal::SIGINT, self.previous);
    }
}
