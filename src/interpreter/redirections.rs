//! Redirection Handling
//!
//! Redirections rewrite slots of an environment's fd table; the process
//! descriptors themselves only change when a forked child installs the
//! table. Callers apply them to a clone, or save and restore the table.
//!
//! - `<`   : open for reading
//! - `>`   : create/truncate (refused under noclobber for an existing regular file)
//! - `>|`  : create/truncate regardless of noclobber
//! - `>>`  : append
//! - `<>`  : open for reading and writing
//! - `<&n`, `>&n` : copy slot n; `<&-`, `>&-` close
//! - `<<`, `<<-` : here-document

use std::os::fd::OwnedFd;

use log::trace;
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::stat::Mode;

use crate::ast::types::{RedirectNode, RedirectOp, RedirectTarget};
use crate::interpreter::environment::{Env, FdSlot, FD_SLOTS};
use crate::interpreter::errors::ShellError;
use crate::interpreter::interpreter::Interpreter;
use crate::interpreter::process;

/// Mode for files created by redirections (before the umask)
const CREATE_MODE: libc::mode_t = 0o666;

/// Error message for noclobber violations, or None if the target may be written.
pub fn check_output_redirect_target(path: &str, noclobber: bool) -> Option<String> {
    let meta = std::fs::metadata(path).ok()?;
    if meta.is_dir() {
        return Some(format!("{}: Is a directory", path));
    }
    if noclobber && meta.is_file() {
        return Some(format!("{}: cannot overwrite existing file", path));
    }
    None
}

fn bad_fd(what: &str) -> ShellError {
    ShellError::io(what, std::io::Error::from(Errno::EBADF))
}

fn open_target(path: &str, op: RedirectOp, noclobber: bool) -> Result<OwnedFd, ShellError> {
    let flags = match op {
        RedirectOp::Less => OFlag::O_RDONLY,
        RedirectOp::Great | RedirectOp::Clobber => {
            if op == RedirectOp::Great {
                if let Some(message) = check_output_redirect_target(path, noclobber) {
                    return Err(ShellError::Redirect(message));
                }
            }
            OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC
        }
        RedirectOp::DGreat => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND,
        RedirectOp::LessGreat => OFlag::O_RDWR | OFlag::O_CREAT,
        _ => OFlag::O_RDONLY,
    };
    process::open(path, flags, Mode::from_bits_truncate(CREATE_MODE)).map_err(|e| ShellError::io(path, e))
}

impl Interpreter {
    /// Apply redirections, left to right, to `env`'s fd table.
    pub fn apply_redirects(&mut self, env: &mut Env, redirects: &[RedirectNode]) -> Result<(), ShellError> {
        for redirect in redirects {
            let fd = redirect.target_fd();
            if fd < 0 || fd as usize >= FD_SLOTS {
                return Err(bad_fd(&fd.to_string()));
            }
            let slot = match &redirect.target {
                RedirectTarget::HereDoc(doc) => {
                    let body = if doc.quoted {
                        doc.body.clone()
                    } else {
                        self.expand_heredoc(env, &doc.body)?
                    };
                    let file = process::anonymous_file(&body).map_err(|e| ShellError::io("here-document", e))?;
                    FdSlot::owned(file)
                }
                RedirectTarget::Word(word) => {
                    let target = self.expand_word(env, word)?;
                    match redirect.op {
                        RedirectOp::LessAnd | RedirectOp::GreatAnd => {
                            if target == "-" {
                                FdSlot::Closed
                            } else {
                                let source: i32 = target.parse().map_err(|_| bad_fd(&target))?;
                                match env.fds.get(source) {
                                    Some(slot) if slot.raw().is_some() => slot.clone(),
                                    _ => return Err(bad_fd(&target)),
                                }
                            }
                        }
                        op => FdSlot::owned(open_target(&target, op, env.options.noclobber)?),
                    }
                }
            };
            trace!("redirect {}{} -> {:?}", fd, redirect.op.as_str(), slot);
            env.fds.set(fd, slot);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::{HereDocNode, WordNode};

    fn redirect(fd: Option<i32>, op: RedirectOp, target: &str) -> RedirectNode {
        RedirectNode {
            fd,
            op,
            target: RedirectTarget::Word(WordNode { raw: target.to_string() }),
        }
    }

    #[test]
    fn test_dup_and_close() {
        let mut interp = Interpreter::new();
        let mut env = Env::new("test", "sh");
        interp
            .apply_redirects(
                &mut env,
                &[
                    redirect(Some(2), RedirectOp::GreatAnd, "1"),
                    redirect(None, RedirectOp::LessAnd, "-"),
                ],
            )
            .unwrap();
        assert_eq!(env.fds.raw(2), Some(1));
        assert_eq!(env.fds.raw(0), None);
    }

    #[test]
    fn test_bad_descriptors() {
        let mut interp = Interpreter::new();
        let mut env = Env::new("test", "sh");
        let err = interp
            .apply_redirects(&mut env, &[redirect(Some(1), RedirectOp::GreatAnd, "7")])
            .unwrap_err();
        assert_eq!(err.to_string(), "7: Bad file descriptor");
        assert!(interp
            .apply_redirects(&mut env, &[redirect(Some(12), RedirectOp::Great, "/dev/null")])
            .is_err());
    }

    #[test]
    fn test_missing_input_file() {
        let mut interp = Interpreter::new();
        let mut env = Env::new("test", "sh");
        let err = interp
            .apply_redirects(&mut env, &[redirect(None, RedirectOp::Less, "/nonexistent/file")])
            .unwrap_err();
        assert_eq!(err.to_string(), "/nonexistent/file: No such file or directory");
        assert!(err.is_command_local());
    }

    #[test]
    fn test_heredoc_slot() {
        let mut interp = Interpreter::new();
        let mut env = Env::new("test", "sh");
        env.set("W", "world").unwrap();
        let doc = RedirectNode {
            fd: None,
            op: RedirectOp::DLess,
            target: RedirectTarget::HereDoc(HereDocNode {
                delimiter: "EOF".to_string(),
                body: "hello $W\n".to_string(),
                quoted: false,
            }),
        };
        interp.apply_redirects(&mut env, &[doc]).unwrap();
        let fd = env.fds.raw(0).unwrap();
        assert_eq!(process::read_to_end(fd).unwrap(), b"hello world\n");
    }

    #[test]
    fn test_noclobber() {
        let dir = std::env::temp_dir().join(format!("zero-sh-noclobber-{}", std::process::id()));
        std::fs::write(&dir, "keep").unwrap();
        let path = dir.to_string_lossy().into_owned();
        assert!(check_output_redirect_target(&path, true).is_some());
        assert!(check_output_redirect_target(&path, false).is_none());
        assert!(check_output_redirect_target("/dev/null", true).is_none());
        std::fs::remove_file(&dir).unwrap();
    }
}
