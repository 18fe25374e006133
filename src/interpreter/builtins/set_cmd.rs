//! set - Set/unset shell options and positional parameters
//!
//! Usage:
//!   set                 - List all variables
//!   set -o              - List all options with their status
//!   set +o              - Output commands to recreate current options
//!   set -e / set +e     - Enable/disable errexit
//!   set -o errexit      - Enable errexit by name
//!   set -- arg1 arg2    - Set positional parameters
//!   set - arg1          - Turn off -x and -v, then set positional parameters

use super::{print, report};
use crate::interpreter::environment::Env;
use crate::interpreter::errors::ShellError;
use crate::interpreter::helpers::quote_value;
use crate::interpreter::interpreter::Interpreter;
use crate::interpreter::types::{ShellOptions, OPTION_NAMES};

/// `set` with no arguments: every variable with a value, re-readable
fn list_variables(env: &Env) -> String {
    let mut vars: Vec<_> = env
        .variables()
        .filter_map(|v| v.value.as_ref().map(|value| (v.name.as_str(), value)))
        .collect();
    vars.sort_by(|a, b| a.0.cmp(b.0));
    vars.iter()
        .map(|(name, value)| format!("{}={}\n", name, quote_value(value)))
        .collect()
}

/// `set -o` (human readable) or `set +o` (re-readable)
fn list_options(options: &ShellOptions, reusable: bool) -> String {
    OPTION_NAMES
        .iter()
        .map(|(letter, name)| {
            let on = options.get(*letter).unwrap_or(false);
            if reusable {
                format!("set {}o {}\n", if on { '-' } else { '+' }, name)
            } else {
                format!("{:<15} {}\n", name, if on { "on" } else { "off" })
            }
        })
        .collect()
}

pub fn handle_set(_interp: &mut Interpreter, env: &mut Env, args: &[String]) -> Result<i32, ShellError> {
    if args.is_empty() {
        print(env, "set", &list_variables(env))?;
        return Ok(0);
    }

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        if arg == "--" {
            env.set_positional(args[i + 1..].to_vec());
            return Ok(0);
        }
        if arg == "-" {
            env.options.xtrace = false;
            env.options.verbose = false;
            i += 1;
            break;
        }
        let on = match arg.chars().next() {
            Some('-') => true,
            Some('+') => false,
            _ => break,
        };
        let flags = &arg[1..];

        if flags == "o" {
            match args.get(i + 1) {
                Some(name) => {
                    if !env.options.set_named(name, on) {
                        report(env, "set", &format!("{}: invalid option name", name));
                        return Ok(2);
                    }
                    i += 2;
                }
                None => {
                    let listing = list_options(&env.options, !on);
                    print(env, "set", &listing)?;
                    i += 1;
                }
            }
            continue;
        }

        for letter in flags.chars() {
            if !env.options.set_letter(letter, on) {
                report(
                    env,
                    "set",
                    &format!("{}{}: invalid option", if on { '-' } else { '+' }, letter),
                );
                return Ok(2);
            }
        }
        i += 1;
    }

    if i < args.len() {
        env.set_positional(args[i..].to_vec());
    }
    Ok(0)
}
