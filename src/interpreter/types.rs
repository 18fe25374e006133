//! Interpreter Types
//!
//! Shell options and variables, shared by the environment, the evaluator
//! and the `set`/`export`/`readonly` builtins.

/// Shell options (set -e, etc.)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellOptions {
    /// set -a: Export all variables
    pub allexport: bool,
    /// set -C: Prevent overwriting files with redirection
    pub noclobber: bool,
    /// set -e: Exit immediately if a command exits with non-zero status
    pub errexit: bool,
    /// set -f: Disable filename expansion (accepted; no globbing is done)
    pub noglob: bool,
    /// -i: Interactive shell
    pub interactive: bool,
    /// set -m: Job control (accepted; no process groups are managed)
    pub monitor: bool,
    /// set -n: Read commands but do not execute them (syntax check mode)
    pub noexec: bool,
    /// set -u: Treat unset variables as an error when substituting
    pub nounset: bool,
    /// set -v: Print shell input lines as they are read (verbose)
    pub verbose: bool,
    /// set -x: Print commands and their arguments as they are executed
    pub xtrace: bool,
}

/// Option letter, `-o` name
pub const OPTION_NAMES: &[(char, &str)] = &[
    ('a', "allexport"),
    ('C', "noclobber"),
    ('e', "errexit"),
    ('f', "noglob"),
    ('i', "interactive"),
    ('m', "monitor"),
    ('n', "noexec"),
    ('u', "nounset"),
    ('v', "verbose"),
    ('x', "xtrace"),
];

impl ShellOptions {
    fn flag_mut(&mut self, letter: char) -> Option<&mut bool> {
        Some(match letter {
            'a' => &mut self.allexport,
            'C' => &mut self.noclobber,
            'e' => &mut self.errexit,
            'f' => &mut self.noglob,
            'i' => &mut self.interactive,
            'm' => &mut self.monitor,
            'n' => &mut self.noexec,
            'u' => &mut self.nounset,
            'v' => &mut self.verbose,
            'x' => &mut self.xtrace,
            _ => return None,
        })
    }

    pub fn get(&self, letter: char) -> Option<bool> {
        Some(match letter {
            'a' => self.allexport,
            'C' => self.noclobber,
            'e' => self.errexit,
            'f' => self.noglob,
            'i' => self.interactive,
            'm' => self.monitor,
            'n' => self.noexec,
            'u' => self.nounset,
            'v' => self.verbose,
            'x' => self.xtrace,
            _ => return None,
        })
    }

    /// Set by option letter; false for an unknown letter
    pub fn set_letter(&mut self, letter: char, on: bool) -> bool {
        match self.flag_mut(letter) {
            Some(flag) => {
                *flag = on;
                true
            }
            None => false,
        }
    }

    /// Set by `-o` name; false for an unknown name
    pub fn set_named(&mut self, name: &str, on: bool) -> bool {
        match OPTION_NAMES.iter().find(|(_, n)| *n == name) {
            Some((letter, _)) => self.set_letter(*letter, on),
            None => false,
        }
    }

    /// Current option letters, the value of `$-`
    pub fn letters(&self) -> String {
        OPTION_NAMES
            .iter()
            .filter(|(letter, _)| self.get(*letter) == Some(true))
            .map(|(letter, _)| *letter)
            .collect()
    }
}

/// One shell variable; `value: None` is declared-but-unset (e.g. `export X`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub value: Option<String>,
    pub exported: bool,
    pub readonly: bool,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
            exported: false,
            readonly: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_and_names() {
        let mut opts = ShellOptions::default();
        assert_eq!(opts.letters(), "");
        assert!(opts.set_letter('e', true));
        assert!(opts.set_named("xtrace", true));
        assert_eq!(opts.letters(), "ex");
        assert!(opts.errexit && opts.xtrace);
    }

    #[test]
    fn test_unknown_options() {
        let mut opts = ShellOptions::default();
        assert!(!opts.set_letter('z', true));
        assert!(!opts.set_named("pipefail", true));
        assert_eq!(opts.get('z'), None);
    }
}
