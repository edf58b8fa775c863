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

//! Pipeline semantics
//!
//! A one-command pipeline runs in the current shell environment. A longer
//! pipeline forks one child per command, wired left to right with pipes
//! installed before the command runs; the pipeline's exit status is the
//! last command's status. With the `Monitor` option on, the children
//! share a new process group, which becomes the foreground job for the
//! duration of the pipeline.

use super::{resolve_status, Execute};
use itertools::Itertools;
use nix::sys::signal::Signal;
use nix::unistd::{ForkResult, Pid};
use sedge_env::job::{Job, JobSet, ProcessState};
use sedge_env::option::Option::{ErrExit, Monitor};
use sedge_env::semantics::{Divert, ExitStatus, Result};
use sedge_env::stack::Frame;
use sedge_env::Env;
use sedge_syntax::syntax::{Command, Pipeline};
use std::ops::ControlFlow::{Break, Continue};
use std::os::unix::io::RawFd;

impl Execute for Pipeline {
    fn execute(&self, env: &mut Env) -> Result {
        if self.commands.is_empty() {
            return Continue(());
        }

        if self.bang {
            // A negated pipeline is a condition; its failure does not
            // trigger ErrExit, and the final status is inverted.
            {
                let mut guard = env.push_frame(Frame::Condition);
                run_pipeline(&mut guard, &self.commands)?;
            }
            env.exit_status = if env.exit_status.is_successful() {
                ExitStatus::FAILURE
            } else {
                ExitStatus::SUCCESS
            };
            return Continue(());
        }

        run_pipeline(env, &self.commands)?;

        if !env.exit_status.is_successful()
            && env.options.is_on(ErrExit)
            && !env.stack.is_in_condition()
        {
            let exit_status = env.exit_status;
            env.pending_exit = Some(exit_status);
            return Break(Divert::Exit(Some(exit_status)));
        }
        Continue(())
    }
}

fn run_pipeline(env: &mut Env, commands: &[Command]) -> Result {
    if let [command] = commands {
        return command.execute(env);
    }

    let monitor = env.options.is_on(Monitor);
    let mut job = Job::new(Pid::from_raw(0));
    job.job_controlled = monitor;
    job.name = commands.iter().format(" | ").to_string();

    let mut pgid: Option<Pid> = None;
    let mut prev_read: Option<RawFd> = None;

    for (i, command) in commands.iter().enumerate() {
        let is_last = i + 1 == commands.len();
        let (next_read, write_end) = if is_last {
            (None, None)
        } else {
            match env.system.pipe() {
                Ok((read, write)) => (Some(read), Some(write)),
                Err(errno) => {
                    crate::print_error(env, format_args!("cannot open pipe: {errno}"));
                    if let Some(fd) = prev_read {
                        let _ = env.system.close(fd);
                    }
                    env.exit_status = ExitStatus::FAILURE;
                    return Continue(());
                }
            }
        };

        match env.system.fork() {
            Err(errno) => {
                crate::print_error(env, format_args!("cannot fork: {errno}"));
                for fd in [prev_read, next_read, write_end].into_iter().flatten() {
                    let _ = env.system.close(fd);
                }
                env.exit_status = ExitStatus::FAILURE;
                return Continue(());
            }
            Ok(ForkResult::Child) => {
                env.is_subshell = true;
                env.jobs = JobSet::new();
                if monitor {
                    let pg = pgid.unwrap_or(Pid::from_raw(0));
                    let _ = env.system.setpgid(Pid::from_raw(0), pg);
                    for signal in [Signal::SIGTSTP, Signal::SIGTTIN, Signal::SIGTTOU] {
                        let _ = env.system.default_signal(signal);
                    }
                }
                if let Some(fd) = prev_read {
                    let _ = env.system.dup2(fd, 0);
                    let _ = env.system.close(fd);
                }
                if let Some(fd) = write_end {
                    let _ = env.system.dup2(fd, 1);
                    let _ = env.system.close(fd);
                }
                if let Some(fd) = next_read {
                    let _ = env.system.close(fd);
                }
                let result = command.execute(env);
                let exit_status = resolve_status(env, result);
                env.system.exit_process(exit_status)
            }
            Ok(ForkResult::Parent { child }) => {
                if monitor {
                    // Setting the process group in the parent as well
                    // avoids racing the child to its first command.
                    let pg = pgid.unwrap_or(child);
                    let _ = env.system.setpgid(child, pg);
                }
                pgid.get_or_insert(child);
                job.add_process(child);
                if let Some(fd) = prev_read {
                    let _ = env.system.close(fd);
                }
                if let Some(fd) = write_end {
                    let _ = env.system.close(fd);
                }
                prev_read = next_read;
            }
        }
    }

    job.pgid = pgid.unwrap_or(Pid::from_raw(0));
    let job_id = env.jobs.add(job);
    let exit_status = match crate::job::wait_for_job_foreground(env, job_id) {
        Ok(state) => match state {
            ProcessState::Exited(exit_status) => exit_status,
            ProcessState::Signaled(signal) | ProcessState::Stopped(signal) => {
                ExitStatus::from_signal(signal)
            }
            ProcessState::Running => ExitStatus::SUCCESS,
        },
        Err(errno) => {
            crate::print_error(env, format_args!("cannot await pipeline: {errno}"));
            ExitStatus::FAILURE
        }
    };
    crate::job::finish_foreground_job(env, job_id);
    env.exit_status = exit_status;
    Continue(())
}
