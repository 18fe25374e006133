//! exit - Exit shell builtin

use super::report;
use crate::interpreter::environment::Env;
use crate::interpreter::errors::ShellError;
use crate::interpreter::interpreter::Interpreter;

/// Handle the exit builtin command.
///
/// Always unwinds with `ShellError::Exit` except for `too many arguments`.
/// Without an operand the status of the last command is used; a
/// non-numeric operand exits with 2.
pub fn handle_exit(interp: &mut Interpreter, env: &mut Env, args: &[String]) -> Result<i32, ShellError> {
    if args.len() > 1 {
        report(env, "exit", "too many arguments");
        return Ok(1);
    }
    let code = match args.first() {
        None => interp.last_status,
        Some(arg) => match arg.parse::<i64>() {
            // Exit codes are modulo 256
            Ok(parsed) => parsed.rem_euclid(256) as i32,
            Err(_) => {
                report(env, "exit", &format!("{}: numeric argument required", arg));
                2
            }
        },
    };
    Err(ShellError::Exit(code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::environment::FdSlot;

    fn exit_code(interp: &mut Interpreter, args: &[&str]) -> Result<i32, ShellError> {
        let mut env = Env::new("test", "sh");
        env.fds.set(2, FdSlot::Closed);
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        handle_exit(interp, &mut env, &args)
    }

    #[test]
    fn test_exit_no_args() {
        let mut interp = Interpreter::new();
        interp.last_status = 42;
        assert!(matches!(exit_code(&mut interp, &[]), Err(ShellError::Exit(42))));
    }

    #[test]
    fn test_exit_with_code() {
        let mut interp = Interpreter::new();
        assert!(matches!(exit_code(&mut interp, &["5"]), Err(ShellError::Exit(5))));
        assert!(matches!(exit_code(&mut interp, &["300"]), Err(ShellError::Exit(44))));
        assert!(matches!(exit_code(&mut interp, &["-1"]), Err(ShellError::Exit(255))));
    }

    #[test]
    fn test_exit_invalid_arg() {
        let mut interp = Interpreter::new();
        assert!(matches!(exit_code(&mut interp, &["abc"]), Err(ShellError::Exit(2))));
        assert!(matches!(exit_code(&mut interp, &["1", "2"]), Ok(1)));
    }
}
