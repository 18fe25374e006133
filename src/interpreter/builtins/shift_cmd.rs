//! shift - Shift positional parameters
//!
//! shift [n]
//!
//! Shifts positional parameters to the left by n (default 1).
//! $n+1 becomes $1, $n+2 becomes $2, etc.
//! $# is decremented by n.

use super::report;
use crate::interpreter::environment::Env;
use crate::interpreter::errors::ShellError;
use crate::interpreter::interpreter::Interpreter;

pub fn handle_shift(_interp: &mut Interpreter, env: &mut Env, args: &[String]) -> Result<i32, ShellError> {
    if args.len() > 1 {
        report(env, "shift", "too many arguments");
        return Ok(1);
    }
    let count = match args.first() {
        None => 1,
        Some(arg) => match arg.parse::<usize>() {
            Ok(n) => n,
            Err(_) => {
                report(env, "shift", &format!("{}: numeric argument required", arg));
                return Ok(1);
            }
        },
    };

    let positional = env.positional();
    if count > positional.len() {
        report(env, "shift", &format!("{}: shift count out of range", count));
        return Ok(1);
    }
    let rest = positional[count..].to_vec();
    env.set_positional(rest);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::environment::FdSlot;

    fn env_with(params: &[&str]) -> Env {
        let mut env = Env::new("test", "sh");
        env.fds.set(2, FdSlot::Closed);
        env.set_positional(params.iter().map(|s| s.to_string()).collect());
        env
    }

    #[test]
    fn test_shift_default() {
        let mut interp = Interpreter::new();
        let mut env = env_with(&["a", "b", "c"]);
        assert_eq!(handle_shift(&mut interp, &mut env, &[]).unwrap(), 0);
        assert_eq!(env.positional(), &["b".to_string(), "c".to_string()]);
        assert_eq!(env.argv[0], "sh");
    }

    #[test]
    fn test_shift_count() {
        let mut interp = Interpreter::new();
        let mut env = env_with(&["a", "b", "c"]);
        handle_shift(&mut interp, &mut env, &["3".to_string()]).unwrap();
        assert!(env.positional().is_empty());
    }

    #[test]
    fn test_shift_out_of_range() {
        let mut interp = Interpreter::new();
        let mut env = env_with(&["a"]);
        assert_eq!(handle_shift(&mut interp, &mut env, &["2".to_string()]).unwrap(), 1);
        assert_eq!(handle_shift(&mut interp, &mut env, &["x".to_string()]).unwrap(), 1);
        assert_eq!(env.positional(), &["a".to_string()]);
    }
}
