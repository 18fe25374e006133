//! Loop Error Handling Helpers
//!
//! The error handling shared by for, while and until loops.

use crate::interpreter::errors::ShellError;

/// Action to take after a loop body raised an error.
#[derive(Debug)]
pub enum LoopAction {
    /// Leave the current loop
    Break,
    /// Go on with the next iteration
    Continue,
    /// Propagate to the enclosing construct
    Rethrow(ShellError),
}

/// Decide what a loop does with an error from its body.
///
/// `break n` and `continue n` with `n > 1` are passed outwards with the
/// count reduced, unless this is the outermost loop: a count larger than the
/// number of enclosing loops acts on the outermost one.
pub fn handle_loop_error(error: ShellError, loop_depth: u32) -> LoopAction {
    match error {
        ShellError::Break(levels) if levels > 1 && loop_depth > 1 => {
            LoopAction::Rethrow(ShellError::Break(levels - 1))
        }
        ShellError::Break(_) => LoopAction::Break,
        ShellError::Continue(levels) if levels > 1 && loop_depth > 1 => {
            LoopAction::Rethrow(ShellError::Continue(levels - 1))
        }
        ShellError::Continue(_) => LoopAction::Continue,
        other => LoopAction::Rethrow(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_break_single_level() {
        assert!(matches!(handle_loop_error(ShellError::Break(1), 1), LoopAction::Break));
    }

    #[test]
    fn test_handle_break_multi_level() {
        assert!(matches!(
            handle_loop_error(ShellError::Break(2), 2),
            LoopAction::Rethrow(ShellError::Break(1))
        ));
        // More levels than loops: break the outermost
        assert!(matches!(handle_loop_error(ShellError::Break(5), 1), LoopAction::Break));
    }

    #[test]
    fn test_handle_continue() {
        assert!(matches!(handle_loop_error(ShellError::Continue(1), 3), LoopAction::Continue));
        assert!(matches!(
            handle_loop_error(ShellError::Continue(3), 3),
            LoopAction::Rethrow(ShellError::Continue(2))
        ));
    }

    #[test]
    fn test_handle_return_and_exit() {
        assert!(matches!(
            handle_loop_error(ShellError::Return(4), 1),
            LoopAction::Rethrow(ShellError::Return(4))
        ));
        assert!(matches!(
            handle_loop_error(ShellError::Exit(0), 1),
            LoopAction::Rethrow(ShellError::Exit(0))
        ));
    }
}
