//! Line Sources
//!
//! The lexer pulls input one line at a time so that multi-line constructs and
//! here-document bodies can be read on demand, with a prompt when the shell
//! is interactive.

use std::io;
use std::os::fd::RawFd;

use crate::interpreter::process;

pub const PRIMARY_PROMPT: &str = "# ";
pub const CONTINUATION_PROMPT: &str = "> ";

pub trait LineSource {
    /// Next line including its trailing newline (if any), `None` at end of input.
    /// `continuation` is set when the line continues an unfinished unit.
    fn read_line(&mut self, continuation: bool) -> io::Result<Option<String>>;
}

/// In-memory text: `-c` strings, script files, command substitutions
pub struct StrSource {
    text: String,
    pos: usize,
}

impl StrSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pos: 0,
        }
    }
}

impl LineSource for StrSource {
    fn read_line(&mut self, _continuation: bool) -> io::Result<Option<String>> {
        if self.pos >= self.text.len() {
            return Ok(None);
        }
        let rest = &self.text[self.pos..];
        let len = rest.find('\n').map(|i| i + 1).unwrap_or(rest.len());
        let line = rest[..len].to_string();
        self.pos += len;
        Ok(Some(line))
    }
}

/// A raw file descriptor read one byte at a time.
///
/// Reading byte-wise leaves the descriptor's offset right after the line
/// just consumed, so `read` and child processes see the rest of the input.
pub struct FdSource {
    fd: RawFd,
    interactive: bool,
}

impl FdSource {
    pub fn new(fd: RawFd, interactive: bool) -> Self {
        Self { fd, interactive }
    }

    fn prompt(&self, continuation: bool) {
        let text = if continuation {
            CONTINUATION_PROMPT
        } else {
            PRIMARY_PROMPT
        };
        let _ = process::write_all(2, text.as_bytes());
    }
}

impl LineSource for FdSource {
    fn read_line(&mut self, continuation: bool) -> io::Result<Option<String>> {
        if self.interactive {
            self.prompt(continuation);
        }
        read_fd_line(self.fd)
    }
}

/// Read up to and including the next newline from `fd`.
pub fn read_fd_line(fd: RawFd) -> io::Result<Option<String>> {
    let mut bytes = Vec::new();
    loop {
        let mut byte = [0u8; 1];
        if process::read_some(fd, &mut byte)? == 0 {
            break;
        }
        bytes.push(byte[0]);
        if byte[0] == b'\n' {
            break;
        }
    }
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_str_source_lines() {
        let mut src = StrSource::new("echo a\necho b");
        assert_eq!(src.read_line(false).unwrap(), Some("echo a\n".to_string()));
        assert_eq!(src.read_line(false).unwrap(), Some("echo b".to_string()));
        assert_eq!(src.read_line(false).unwrap(), None);
    }

    #[test]
    fn test_read_fd_line_stops_at_newline() {
        use std::os::fd::AsRawFd;
        let (read_end, write_end) = process::pipe().unwrap();
        process::write_all(write_end.as_raw_fd(), b"one\ntwo").unwrap();
        drop(write_end);
        let fd = read_end.as_raw_fd();
        assert_eq!(read_fd_line(fd).unwrap(), Some("one\n".to_string()));
        assert_eq!(read_fd_line(fd).unwrap(), Some("two".to_string()));
        assert_eq!(read_fd_line(fd).unwrap(), None);
    }

    #[test]
    fn test_str_source_empty() {
        let mut src = StrSource::new("");
        assert_eq!(src.read_line(false).unwrap(), None);
    }
}
