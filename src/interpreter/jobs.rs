//! Background job table
//!
//! Every `&` command is one forked child and one job. Finished jobs are
//! reaped without blocking whenever the `SIGCHLD` flag is up and reported
//! once, before the next prompt.

use std::io;

use log::debug;

use crate::interpreter::process::{self, Pid};
use crate::interpreter::signals;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    /// Finished with this exit status
    Done(i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: u32,
    pub pid: Pid,
    pub command: String,
    pub state: JobState,
}

impl Job {
    /// `[n] Done\tcmd`, `[n] Exit N\tcmd` or `[n] Running\tcmd`
    pub fn describe(&self) -> String {
        let state = match self.state {
            JobState::Running => "Running".to_string(),
            JobState::Done(0) => "Done".to_string(),
            JobState::Done(code) => format!("Exit {}", code),
        };
        format!("[{}] {}\t{}", self.id, state, self.command)
    }
}

#[derive(Debug, Default)]
pub struct JobTable {
    jobs: Vec<Job>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a started background child; returns its job number.
    pub fn add(&mut self, pid: Pid, command: &str) -> u32 {
        let id = self.jobs.iter().map(|j| j.id).max().unwrap_or(0) + 1;
        debug!("job [{}] started: pid {} ({})", id, pid, command);
        self.jobs.push(Job {
            id,
            pid,
            command: command.to_string(),
            state: JobState::Running,
        });
        id
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    fn update(&mut self, pid: Pid, status: i32) {
        if let Some(job) = self.jobs.iter_mut().find(|j| j.pid == pid) {
            debug!("job [{}] finished with status {}", job.id, status);
            job.state = JobState::Done(status);
        }
    }

    /// Reap if a child has exited since the last check.
    pub fn poll(&mut self) {
        if signals::take_child_exited() {
            self.reap();
        }
    }

    /// Collect every running job that has terminated, without blocking.
    pub fn reap(&mut self) {
        let running: Vec<Pid> = self
            .jobs
            .iter()
            .filter(|j| j.state == JobState::Running)
            .map(|j| j.pid)
            .collect();
        for pid in running {
            match process::try_wait_pid(pid) {
                Ok(Some(raw)) => self.update(pid, process::exit_status(raw)),
                Ok(None) => {}
                // Already collected elsewhere
                Err(_) => self.update(pid, 0),
            }
        }
    }

    /// Remove and return the jobs that have finished.
    pub fn take_finished(&mut self) -> Vec<Job> {
        let (done, running): (Vec<Job>, Vec<Job>) = self
            .jobs
            .drain(..)
            .partition(|j| matches!(j.state, JobState::Done(_)));
        self.jobs = running;
        done
    }

    /// Block until the job with this pid ends. `None` if it is not a job of
    /// this shell.
    pub fn wait_for(&mut self, pid: Pid) -> io::Result<Option<i32>> {
        let Some(idx) = self.jobs.iter().position(|j| j.pid == pid) else {
            return Ok(None);
        };
        let status = match self.jobs[idx].state {
            JobState::Done(status) => status,
            JobState::Running => process::exit_status(process::wait_pid(pid)?),
        };
        self.jobs.remove(idx);
        Ok(Some(status))
    }

    /// Block until every job has ended and forget them all.
    pub fn wait_all(&mut self) -> io::Result<()> {
        for job in self.jobs.drain(..) {
            if job.state == JobState::Running {
                process::wait_pid(job.pid)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_numbers() {
        let mut table = JobTable::new();
        assert_eq!(table.add(Pid::from_raw(100), "sleep 1"), 1);
        assert_eq!(table.add(Pid::from_raw(101), "sleep 2"), 2);
        assert_eq!(table.jobs().len(), 2);
    }

    #[test]
    fn test_describe() {
        let mut job = Job {
            id: 2,
            pid: Pid::from_raw(1),
            command: "false".to_string(),
            state: JobState::Running,
        };
        assert_eq!(job.describe(), "[2] Running\tfalse");
        job.state = JobState::Done(0);
        assert_eq!(job.describe(), "[2] Done\tfalse");
        job.state = JobState::Done(1);
        assert_eq!(job.describe(), "[2] Exit 1\tfalse");
    }

    #[test]
    fn test_take_finished() {
        let mut table = JobTable::new();
        table.add(Pid::from_raw(100), "a");
        table.add(Pid::from_raw(101), "b");
        table.update(Pid::from_raw(101), 3);
        let done = table.take_finished();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].state, JobState::Done(3));
        assert_eq!(table.jobs().len(), 1);
        assert_eq!(table.jobs()[0].command, "a");
    }

    #[test]
    fn test_wait_for_unknown_pid() {
        let mut table = JobTable::new();
        assert_eq!(table.wait_for(Pid::from_raw(4242)).unwrap(), None);
    }
}
