use std::io::IsTerminal;

use clap::Parser;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use zero_shell::interpreter::environment::Env;
use zero_shell::interpreter::signals;
use zero_shell::interpreter::types::ShellOptions;
use zero_shell::shell::{Input, Shell};

#[derive(Parser, Debug)]
#[command(name = "zero-sh")]
#[command(about = "A small POSIX-style command-language shell")]
#[command(version)]
struct Cli {
    /// Export all variables assigned to
    #[arg(short = 'a')]
    allexport: bool,

    /// Do not let `>` overwrite existing files
    #[arg(short = 'C')]
    noclobber: bool,

    /// Exit immediately if a command exits with non-zero status
    #[arg(short = 'e')]
    errexit: bool,

    /// Disable pathname expansion
    #[arg(short = 'f')]
    noglob: bool,

    /// Force an interactive shell
    #[arg(short = 'i')]
    interactive: bool,

    /// Job control
    #[arg(short = 'm')]
    monitor: bool,

    /// Read commands without executing them
    #[arg(short = 'n')]
    noexec: bool,

    /// Treat expanding an unset parameter as an error
    #[arg(short = 'u')]
    nounset: bool,

    /// Print input lines as they are read
    #[arg(short = 'v')]
    verbose: bool,

    /// Print commands before executing them
    #[arg(short = 'x')]
    xtrace: bool,

    /// Enable an option by name
    #[arg(short = 'o', value_name = "OPTION")]
    options: Vec<String>,

    /// Execute the command string instead of reading input
    #[arg(short = 'c', value_name = "COMMAND_STRING")]
    command: Option<String>,

    /// Read commands from standard input
    #[arg(short = 's')]
    stdin: bool,

    /// Script file (unless -c or -s) followed by its arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl Cli {
    fn shell_options(&self) -> Result<ShellOptions, String> {
        let mut options = ShellOptions {
            allexport: self.allexport,
            noclobber: self.noclobber,
            errexit: self.errexit,
            noglob: self.noglob,
            interactive: self.interactive,
            monitor: self.monitor,
            noexec: self.noexec,
            nounset: self.nounset,
            verbose: self.verbose,
            xtrace: self.xtrace,
        };
        for name in &self.options {
            if !options.set_named(name, true) {
                return Err(format!("{}: invalid option name", name));
            }
        }
        Ok(options)
    }
}

/// Logging level from ZERO_SH_LOG; off unless asked for
fn init_logging() {
    let level = std::env::var("ZERO_SH_LOG")
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Off);
    if level != LevelFilter::Off {
        let _ = TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto);
    }
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let mut options = match cli.shell_options() {
        Ok(options) => options,
        Err(message) => {
            eprintln!("sh: {}", message);
            std::process::exit(2);
        }
    };

    let program = std::env::args().next().unwrap_or_else(|| "sh".to_string());
    let mut args = cli.args.clone();
    let (input, argv) = if let Some(command) = cli.command.clone() {
        // -c string [name [args...]]
        if args.is_empty() {
            args.push(program);
        }
        (Input::Command(command), args)
    } else if !cli.stdin && !args.is_empty() {
        (Input::Script(args[0].clone()), args)
    } else {
        args.insert(0, program);
        (Input::Stdin, args)
    };

    let interactive = options.interactive
        || (input == Input::Stdin && std::io::stdin().is_terminal() && std::io::stderr().is_terminal());
    options.interactive = interactive;

    signals::install_shell_handlers(interactive);
    let env = Env::from_process(argv, options);
    let mut shell = match Shell::new(env, input, interactive) {
        Ok(shell) => shell,
        Err(e) => {
            eprintln!("sh: {}", e);
            std::process::exit(127);
        }
    };
    std::process::exit(shell.run());
}
