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

//! Forking children and waiting for them
//!
//! All blocking happens here: the wait functions loop on `waitpid(-1)`,
//! recording every reported state change in the [job set](sedge_env::job)
//! until the awaited process or job resolves. `EINTR` is retried. When job
//! control is on, the terminal foreground is handed to the job around the
//! wait and taken back afterwards.

use nix::errno::Errno;
use nix::unistd::{ForkResult, Pid};
use sedge_env::job::{JobSet, JobState, ProcessState};
use sedge_env::option::Option::Monitor;
use sedge_env::semantics::ExitStatus;
use sedge_env::Env;

/// Runs the function in a forked child process.
///
/// The child gets a fresh, empty job set; the parent's jobs are not the
/// child's to wait for. The child terminates with the returned exit
/// status. In the parent, returns the child's process ID.
pub(crate) fn fork_and_run<F>(env: &mut Env, run: F) -> nix::Result<Pid>
where
    F: FnOnce(&mut Env) -> ExitStatus,
{
    match env.system.fork()? {
        ForkResult::Child => {
            env.is_subshell = true;
            env.jobs = JobSet::new();
            let exit_status = run(env);
            env.system.exit_process(exit_status)
        }
        ForkResult::Parent { child } => Ok(child),
    }
}

/// Looks up the recorded state of a process in the job set.
fn recorded_state(env: &Env, pid: Pid) -> Option<ProcessState> {
    env.jobs
        .iter()
        .flat_map(|(_, job)| &job.processes)
        .find(|process| process.pid == pid)
        .map(|process| process.state)
}

/// Waits until the given child process is no longer running.
///
/// Status reports for other children are recorded in the job set on the
/// way.
pub(crate) fn wait_for_pid(env: &mut Env, pid: Pid) -> nix::Result<ProcessState> {
    loop {
        if let Some(state) = recorded_state(env, pid) {
            if !matches!(state, ProcessState::Running) {
                return Ok(state);
            }
        }
        match env.system.wait_any() {
            Ok(status) => {
                if let Some((reported_pid, state)) = ProcessState::from_wait_status(status) {
                    env.jobs.update_status(reported_pid, state);
                    if reported_pid == pid && !matches!(state, ProcessState::Running) {
                        return Ok(state);
                    }
                }
            }
            Err(Errno::EINTR) => {}
            Err(errno) => return Err(errno),
        }
    }
}

/// Waits for a foreground job until it is done or stopped.
///
/// Returns the state of the job's last process, whose exit status is the
/// status of the pipeline the job was created for. With the `Monitor`
/// option on, the terminal foreground is transferred to the job's process
/// group for the duration of the wait.
pub(crate) fn wait_for_job_foreground(
    env: &mut Env,
    job_id: usize,
) -> nix::Result<ProcessState> {
    let monitor = env.options.is_on(Monitor);
    if monitor {
        if let Some(job) = env.jobs.get(job_id) {
            let _ = env.system.tcsetpgrp(0, job.pgid);
        }
    }

    let result = loop {
        let Some(job) = env.jobs.get(job_id) else {
            break Ok(ProcessState::Exited(ExitStatus::SUCCESS));
        };
        if job.state() != JobState::Running {
            break Ok(job
                .last_process_state()
                .unwrap_or(ProcessState::Exited(ExitStatus::SUCCESS)));
        }
        match env.system.wait_any() {
            Ok(status) => {
                if let Some((pid, state)) = ProcessState::from_wait_status(status) {
                    env.jobs.update_status(pid, state);
                }
            }
            Err(Errno::EINTR) => {}
            Err(errno) => break Err(errno),
        }
    };

    if monitor {
        let shell_pgid = env.system.getpgrp();
        let _ = env.system.tcsetpgrp(0, shell_pgid);
    }
    result
}

/// Removes a foreground job once it has finished, keeping stopped jobs
/// for later reporting.
pub(crate) fn finish_foreground_job(env: &mut Env, job_id: usize) {
    if let Some(job) = env.jobs.get(job_id) {
        if job.state() == JobState::Done {
            env.jobs.remove(job_id);
        }
    }
}

/// Reaps finished background jobs, reporting them when `Notify` is on.
pub(crate) fn reap_finished_jobs(env: &mut Env) {
    let finished = env.jobs.reap_finished();
    if env.options.is_on(sedge_env::option::Option::Notify) {
        for job in finished {
            let status = job.exit_status().unwrap_or(ExitStatus::SUCCESS);
            let message = if status.is_successful() {
                format!("sedge: job done: {}\n", job.name)
            } else {
                format!("sedge: job done ({}): {}\n", status, job.name)
            };
            let _ = env.system.write_all(2, message.as_bytes());
        }
    }
}
