// This file is part of sedge, a POSIX-compatible shell.
// Copyright (C) 2024 the sedge authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Type definitions for job management
//!
//! A [`Job`] is a group of [`Process`]es the shell supervises as one unit:
//! the processes of a pipeline, or a single asynchronous command. Jobs
//! live in the [`JobSet`], an arena keyed by stable job ids, so references
//! to a job stay valid while other jobs are added and reaped.

use crate::semantics::ExitStatus;
use nix::sys::signal::Signal;
use nix::sys::wait::WaitStatus;
use slab::Slab;

#[doc(no_inline)]
pub use nix::unistd::Pid;

/// State of a single child process
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProcessState {
    /// The process is running.
    Running,
    /// The process was stopped by a signal.
    Stopped(Signal),
    /// The process exited with the given status.
    Exited(ExitStatus),
    /// The process was killed by a signal.
    Signaled(Signal),
}

impl ProcessState {
    /// Returns true unless the process has exited or been killed.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        matches!(self, ProcessState::Running | ProcessState::Stopped(_))
    }

    /// Returns the exit status of a finished process.
    ///
    /// A process killed by signal N has status 128+N.
    #[must_use]
    pub fn exit_status(&self) -> Option<ExitStatus> {
        match self {
            ProcessState::Exited(status) => Some(*status),
            ProcessState::Signaled(signal) => Some(ExitStatus::from_signal(*signal)),
            ProcessState::Running | ProcessState::Stopped(_) => None,
        }
    }

    /// Converts a `waitpid` status report to a process id and state.
    ///
    /// Returns `None` for reports that do not concern a process state
    /// change.
    #[must_use]
    pub fn from_wait_status(status: WaitStatus) -> Option<(Pid, ProcessState)> {
        match status {
            WaitStatus::Exited(pid, code) => Some((pid, ProcessState::Exited(ExitStatus(code)))),
            WaitStatus::Signaled(pid, signal, _core_dump) => {
                Some((pid, ProcessState::Signaled(signal)))
            }
            WaitStatus::Stopped(pid, signal) => Some((pid, ProcessState::Stopped(signal))),
            WaitStatus::Continued(pid) => Some((pid, ProcessState::Running)),
            _ => None,
        }
    }
}

/// Child process the shell knows about
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Process {
    /// Process ID
    pub pid: Pid,
    /// Last observed state
    pub state: ProcessState,
}

/// Aggregate state of a job, derived from its member processes
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JobState {
    /// At least one member is running and none is stopped.
    Running,
    /// At least one member is stopped.
    Stopped,
    /// All members have finished.
    Done,
}

/// Group of processes executing a pipeline or asynchronous command
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Job {
    /// Process group the members belong to
    ///
    /// When job control is off, the members stay in the shell's process
    /// group and this is the first member's pid.
    pub pgid: Pid,
    /// Whether the members run in their own process group
    pub job_controlled: bool,
    /// Member processes, in pipeline order
    pub processes: Vec<Process>,
    /// String representation of the job, for reports
    pub name: String,
}

impl Job {
    /// Creates a job with no members yet.
    #[must_use]
    pub fn new(pgid: Pid) -> Self {
        Job {
            pgid,
            job_controlled: false,
            processes: Vec::new(),
            name: String::new(),
        }
    }

    /// Adds a member process in the running state.
    pub fn add_process(&mut self, pid: Pid) {
        self.processes.push(Process {
            pid,
            state: ProcessState::Running,
        });
    }

    /// Computes the aggregate state from the member states.
    #[must_use]
    pub fn state(&self) -> JobState {
        if self.processes.iter().any(|p| matches!(p.state, ProcessState::Stopped(_))) {
            JobState::Stopped
        } else if self.processes.iter().any(|p| p.state.is_alive()) {
            JobState::Running
        } else {
            JobState::Done
        }
    }

    /// Returns the exit status of a finished job: the maximum of the
    /// members' statuses.
    ///
    /// Returns `None` while any member is alive. Note that the status of a
    /// *pipeline* is its last member's status, which the executor takes
    /// from the last process directly.
    #[must_use]
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.processes
            .iter()
            .map(|p| p.state.exit_status())
            .try_fold(ExitStatus::SUCCESS, |max, status| Some(max.max(status?)))
    }

    /// Returns the state of the last member process.
    #[must_use]
    pub fn last_process_state(&self) -> Option<ProcessState> {
        self.processes.last().map(|p| p.state)
    }
}

/// Collection of jobs, an arena with stable ids
#[derive(Clone, Debug, Default)]
pub struct JobSet {
    jobs: Slab<Job>,
    /// Process ID of the most recently started asynchronous command
    last_async_pid: Option<Pid>,
}

impl JobSet {
    /// Creates an empty job set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a job, returning its id.
    ///
    /// The id stays valid until the job is [removed](Self::remove), no
    /// matter how many other jobs come and go.
    pub fn add(&mut self, job: Job) -> usize {
        self.jobs.insert(job)
    }

    /// Returns the job with the given id.
    #[must_use]
    pub fn get(&self, id: usize) -> Option<&Job> {
        self.jobs.get(id)
    }

    /// Returns the job with the given id, mutably.
    #[must_use]
    pub fn get_mut(&mut self, id: usize) -> Option<&mut Job> {
        self.jobs.get_mut(id)
    }

    /// Removes a job, returning it.
    pub fn remove(&mut self, id: usize) -> Option<Job> {
        self.jobs.try_remove(id)
    }

    /// Iterates over all jobs with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Job)> {
        self.jobs.iter()
    }

    /// Returns the number of jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns true if there are no jobs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Records a state change of a child process.
    ///
    /// Finds the job containing the process and updates the member state.
    /// Returns the job's id if the process was found.
    pub fn update_status(&mut self, pid: Pid, state: ProcessState) -> Option<usize> {
        for (id, job) in self.jobs.iter_mut() {
            if let Some(process) = job.processes.iter_mut().find(|p| p.pid == pid) {
                process.state = state;
                return Some(id);
            }
        }
        None
    }

    /// Removes and returns all jobs whose members have all finished.
    ///
    /// Reaping between commands keeps the job list bounded.
    pub fn reap_finished(&mut self) -> Vec<Job> {
        let finished: Vec<usize> = self
            .jobs
            .iter()
            .filter(|(_, job)| job.state() == JobState::Done)
            .map(|(id, _)| id)
            .collect();
        finished
            .into_iter()
            .map(|id| self.jobs.remove(id))
            .collect()
    }

    /// Returns the process ID of the most recently started asynchronous
    /// command, for the special parameter `$!`.
    #[must_use]
    pub fn last_async_pid(&self) -> Option<Pid> {
        self.last_async_pid
    }

    /// Records the process ID of an asynchronous command.
    pub fn set_last_async_pid(&mut self, pid: Pid) {
        self.last_async_pid = Some(pid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(n: i32) -> Pid {
        Pid::from_raw(n)
    }

    #[test]
    fn job_state_aggregation() {
        let mut job = Job::new(pid(10));
        job.add_process(pid(10));
        job.add_process(pid(11));
        assert_eq!(job.state(), JobState::Running);

        job.processes[0].state = ProcessState::Exited(ExitStatus(0));
        assert_eq!(job.state(), JobState::Running);

        job.processes[1].state = ProcessState::Stopped(Signal::SIGTSTP);
        assert_eq!(job.state(), JobState::Stopped);

        job.processes[1].state = ProcessState::Exited(ExitStatus(1));
        assert_eq!(job.state(), JobState::Done);
    }

    #[test]
    fn job_exit_status_is_member_maximum() {
        let mut job = Job::new(pid(10));
        job.add_process(pid(10));
        job.add_process(pid(11));
        assert_eq!(job.exit_status(), None);

        job.processes[0].state = ProcessState::Exited(ExitStatus(3));
        job.processes[1].state = ProcessState::Exited(ExitStatus(1));
        assert_eq!(job.exit_status(), Some(ExitStatus(3)));
    }

    #[test]
    fn signaled_process_status() {
        let state = ProcessState::Signaled(Signal::SIGTERM);
        assert_eq!(state.exit_status(), Some(ExitStatus(128 + 15)));
    }

    #[test]
    fn job_ids_are_stable_across_removal() {
        let mut set = JobSet::new();
        let mut job_a = Job::new(pid(1));
        job_a.add_process(pid(1));
        let a = set.add(job_a);
        let mut job_b = Job::new(pid(2));
        job_b.add_process(pid(2));
        let b = set.add(job_b);

        set.remove(a);
        assert_eq!(set.get(b).unwrap().pgid, pid(2));

        let c = set.add(Job::new(pid(3)));
        assert_ne!(b, c);
        assert_eq!(set.get(b).unwrap().pgid, pid(2));
    }

    #[test]
    fn update_status_finds_the_member() {
        let mut set = JobSet::new();
        let mut job = Job::new(pid(5));
        job.add_process(pid(5));
        job.add_process(pid(6));
        let id = set.add(job);

        let updated = set.update_status(pid(6), ProcessState::Exited(ExitStatus(0)));
        assert_eq!(updated, Some(id));
        assert_eq!(
            set.get(id).unwrap().processes[1].state,
            ProcessState::Exited(ExitStatus(0))
        );

        assert_eq!(set.update_status(pid(99), ProcessState::Running), None);
    }

    #[test]
    fn reap_finished_removes_done_jobs_only() {
        let mut set = JobSet::new();
        let mut done = Job::new(pid(1));
        done.add_process(pid(1));
        done.processes[0].state = ProcessState::Exited(ExitStatus(0));
        let done_id = set.add(done);

        let mut running = Job::new(pid(2));
        running.add_process(pid(2));
        let running_id = set.add(running);

        let reaped = set.reap_finished();
        assert_eq!(reaped.len(), 1);
        assert_eq!(reaped[0].pgid, pid(1));
        assert_eq!(set.get(done_id), None);
        assert!(set.get(running_id).is_some());
    }
}
