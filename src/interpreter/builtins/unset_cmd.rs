//! unset - Remove variables or functions
//!
//! Usage:
//!   unset VAR...      - Unset variables (a function if no such variable exists)
//!   unset -v VAR...   - Unset variables only
//!   unset -f FUNC...  - Unset functions only

use super::report;
use crate::interpreter::environment::Env;
use crate::interpreter::errors::ShellError;
use crate::interpreter::interpreter::Interpreter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Any,
    Variables,
    Functions,
}

pub fn handle_unset(interp: &mut Interpreter, env: &mut Env, args: &[String]) -> Result<i32, ShellError> {
    let mut mode = Mode::Any;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-v" => mode = Mode::Variables,
            "-f" => mode = Mode::Functions,
            "--" => {
                i += 1;
                break;
            }
            arg if arg.starts_with('-') && arg.len() > 1 => {
                report(env, "unset", &format!("{}: invalid option", arg));
                return Ok(2);
            }
            _ => break,
        }
        i += 1;
    }

    let mut status = 0;
    for name in &args[i..] {
        if mode == Mode::Functions {
            interp.functions.remove(name);
            continue;
        }
        if mode == Mode::Any && env.get(name).is_none() {
            interp.functions.remove(name);
            continue;
        }
        if let Err(e) = env.unset(name) {
            report(env, "unset", &e.to_string());
            status = 1;
        }
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::Node;
    use crate::interpreter::environment::FdSlot;
    use std::rc::Rc;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn define(interp: &mut Interpreter, name: &str) {
        let body = Node::Group(Vec::new());
        interp.functions.insert(name.to_string(), Rc::new(body));
    }

    #[test]
    fn test_unset_variable() {
        let mut interp = Interpreter::new();
        let mut env = Env::new("test", "sh");
        env.set("X", "1").unwrap();
        assert_eq!(handle_unset(&mut interp, &mut env, &args(&["X", "NEVER"])).unwrap(), 0);
        assert!(env.get("X").is_none());
    }

    #[test]
    fn test_unset_readonly_fails() {
        let mut interp = Interpreter::new();
        let mut env = Env::new("test", "sh");
        env.fds.set(2, FdSlot::Closed);
        env.set("R", "1").unwrap();
        env.set_readonly("R").unwrap();
        assert_eq!(handle_unset(&mut interp, &mut env, &args(&["R"])).unwrap(), 1);
        assert_eq!(env.value("R"), Some("1"));
    }

    #[test]
    fn test_unset_functions() {
        let mut interp = Interpreter::new();
        let mut env = Env::new("test", "sh");
        define(&mut interp, "f");
        define(&mut interp, "g");
        env.set("g", "shadow").unwrap();

        handle_unset(&mut interp, &mut env, &args(&["-v", "f"])).unwrap();
        assert!(interp.functions.contains_key("f"));
        handle_unset(&mut interp, &mut env, &args(&["f", "g"])).unwrap();
        assert!(!interp.functions.contains_key("f"));
        // The variable goes first
        assert!(interp.functions.contains_key("g"));
        assert!(env.get("g").is_none());
        handle_unset(&mut interp, &mut env, &args(&["-f", "g"])).unwrap();
        assert!(interp.functions.is_empty());
    }
}
