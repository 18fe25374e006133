//! xtrace (set -x) helper functions
//!
//! PS4 controls the prefix (default "+ "). It is used literally.

use crate::interpreter::environment::Env;
use crate::interpreter::helpers::quoting::quote_value;

/// Default PS4 value when not set
pub const DEFAULT_PS4: &str = "+ ";

pub fn get_xtrace_prefix(env: &Env) -> String {
    match env.get("PS4") {
        Some(var) => var.value.clone().unwrap_or_default(),
        None => DEFAULT_PS4.to_string(),
    }
}

/// Trace line for a simple command: assignments then words, each quoted
/// when needed.
pub fn trace_simple_command(env: &Env, assignments: &[(String, String)], words: &[String]) -> String {
    let mut parts: Vec<String> = assignments
        .iter()
        .map(|(name, value)| format!("{}={}", name, quote_value(value)))
        .collect();
    parts.extend(words.iter().map(|w| quote_value(w)));
    format!("{}{}\n", get_xtrace_prefix(env), parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_simple_command() {
        let mut env = Env::new("test", "sh");
        let words = vec!["echo".to_string(), "a b".to_string()];
        assert_eq!(trace_simple_command(&env, &[], &words), "+ echo 'a b'\n");

        env.set("PS4", "> ").unwrap();
        let assignments = vec![("X".to_string(), "1".to_string())];
        assert_eq!(trace_simple_command(&env, &assignments, &[]), "> X=1\n");
    }
}
