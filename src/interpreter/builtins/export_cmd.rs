//! export / readonly - Mark variables
//!
//! Usage:
//!   export NAME=value   - Set and export variable
//!   export NAME         - Export existing variable (or declare it)
//!   export -p           - List all exported variables
//!   readonly NAME=value - Set and freeze variable
//!   readonly -p         - List all readonly variables

use super::{print, report};
use crate::interpreter::environment::Env;
use crate::interpreter::errors::{EnvError, ShellError};
use crate::interpreter::helpers::quote_value;
use crate::interpreter::interpreter::Interpreter;
use crate::interpreter::types::Variable;
use crate::parser::classify::is_name;

/// How one of the two builtins marks and lists variables
struct Marker {
    command: &'static str,
    mark: fn(&mut Env, &str) -> Result<(), EnvError>,
    marked: fn(&Variable) -> bool,
}

fn is_exported(var: &Variable) -> bool {
    var.exported
}

fn is_readonly(var: &Variable) -> bool {
    var.readonly
}

const EXPORT: Marker = Marker {
    command: "export",
    mark: Env::export,
    marked: is_exported,
};

const READONLY: Marker = Marker {
    command: "readonly",
    mark: Env::set_readonly,
    marked: is_readonly,
};

/// `export NAME='value'` lines for the marked variables
fn list_marked(env: &Env, marker: &Marker) -> String {
    env.variables()
        .filter(|v| (marker.marked)(v))
        .map(|v| match &v.value {
            Some(value) => format!("{} {}={}\n", marker.command, v.name, quote_value(value)),
            None => format!("{} {}\n", marker.command, v.name),
        })
        .collect()
}

fn mark_variables(env: &mut Env, args: &[String], marker: &Marker) -> Result<i32, ShellError> {
    let operands = match args.first().map(String::as_str) {
        Some("-p") | Some("--") => &args[1..],
        _ => args,
    };
    if operands.is_empty() {
        print(env, marker.command, &list_marked(env, marker))?;
        return Ok(0);
    }

    let mut status = 0;
    for arg in operands {
        let (name, value) = match arg.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (arg.as_str(), None),
        };
        if !is_name(name) {
            report(env, marker.command, &format!("`{}': not a valid identifier", arg));
            status = 1;
            continue;
        }
        if let Some(value) = value {
            env.set(name, value)?;
        }
        (marker.mark)(env, name)?;
    }
    Ok(status)
}

pub fn handle_export(_interp: &mut Interpreter, env: &mut Env, args: &[String]) -> Result<i32, ShellError> {
    mark_variables(env, args, &EXPORT)
}

pub fn handle_readonly(_interp: &mut Interpreter, env: &mut Env, args: &[String]) -> Result<i32, ShellError> {
    mark_variables(env, args, &READONLY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::environment::FdSlot;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_export_sets_and_marks() {
        let mut interp = Interpreter::new();
        let mut env = Env::new("test", "sh");
        env.set("OLD", "x").unwrap();
        handle_export(&mut interp, &mut env, &args(&["NEW=1", "OLD", "DECLARED"])).unwrap();
        assert_eq!(env.exported_environ(), vec!["OLD=x".to_string(), "NEW=1".to_string()]);
        assert!(env.get("DECLARED").unwrap().exported);
        assert!(env.get("DECLARED").unwrap().value.is_none());
    }

    #[test]
    fn test_export_invalid_name() {
        let mut interp = Interpreter::new();
        let mut env = Env::new("test", "sh");
        env.fds.set(2, FdSlot::Closed);
        assert_eq!(handle_export(&mut interp, &mut env, &args(&["1X=2", "OK=3"])).unwrap(), 1);
        assert_eq!(env.value("OK"), Some("3"));
    }

    #[test]
    fn test_readonly() {
        let mut interp = Interpreter::new();
        let mut env = Env::new("test", "sh");
        handle_readonly(&mut interp, &mut env, &args(&["R=1"])).unwrap();
        assert!(env.set("R", "2").is_err());
        let err = handle_readonly(&mut interp, &mut env, &args(&["R=3"])).unwrap_err();
        assert_eq!(err.to_string(), "R: readonly variable");
    }

    #[test]
    fn test_listing() {
        let mut env = Env::new("test", "sh");
        env.set("A", "it's").unwrap();
        env.export("A").unwrap();
        env.export("B").unwrap();
        env.set("C", "c").unwrap();
        assert_eq!(list_marked(&env, &EXPORT), "export A='it'\\''s'\nexport B\n");
        assert_eq!(list_marked(&env, &READONLY), "");
    }
}
