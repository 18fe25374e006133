//! jobs - List background jobs
//!
//! Prints `[n] Running\tcmd` for live jobs and `[n] Done\tcmd` /
//! `[n] Exit N\tcmd` for finished ones, which are then forgotten.

use super::print;
use crate::interpreter::environment::Env;
use crate::interpreter::errors::ShellError;
use crate::interpreter::interpreter::Interpreter;

pub fn handle_jobs(interp: &mut Interpreter, env: &mut Env, _args: &[String]) -> Result<i32, ShellError> {
    interp.jobs.reap();
    let listing: String = interp
        .jobs
        .jobs()
        .iter()
        .map(|job| format!("{}\n", job.describe()))
        .collect();
    interp.jobs.take_finished();
    print(env, "jobs", &listing)?;
    Ok(0)
}
