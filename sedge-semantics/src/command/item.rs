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

//! Command list semantics: sequential and asynchronous execution

use super::{resolve_status, Execute};
use nix::sys::signal::Signal;
use nix::unistd::{ForkResult, Pid};
use sedge_env::job::{Job, JobSet};
use sedge_env::option::Option::Monitor;
use sedge_env::semantics::{ExitStatus, Result};
use sedge_env::Env;
use sedge_syntax::syntax::CommandList;
use std::ops::ControlFlow::Continue;

impl Execute for CommandList {
    /// Executes the and-or list, asynchronously if it ends with `&`.
    ///
    /// An asynchronous list runs in a forked child the shell does not
    /// wait for; the parent's status is 0 and `$!` becomes the child's
    /// process ID. Without job control, the child ignores `SIGINT` and
    /// `SIGQUIT` and reads from `/dev/null`.
    fn execute(&self, env: &mut Env) -> Result {
        if !self.ampersand {
            return self.and_or.execute(env);
        }

        let monitor = env.options.is_on(Monitor);
        match env.system.fork() {
            Err(errno) => {
                crate::print_error(env, format_args!("cannot fork: {errno}"));
                env.exit_status = ExitStatus::FAILURE;
                Continue(())
            }
            Ok(ForkResult::Child) => {
                env.is_subshell = true;
                env.jobs = JobSet::new();
                if monitor {
                    let _ = env.system.setpgid(Pid::from_raw(0), Pid::from_raw(0));
                } else {
                    let _ = env.system.ignore_signal(Signal::SIGINT);
                    let _ = env.system.ignore_signal(Signal::SIGQUIT);
                    redirect_stdin_to_dev_null(env);
                }
                let result = self.and_or.execute(env);
                let exit_status = resolve_status(env, result);
                env.system.exit_process(exit_status)
            }
            Ok(ForkResult::Parent { child }) => {
                if monitor {
                    let _ = env.system.setpgid(child, child);
                }
                let mut job = Job::new(child);
                job.job_controlled = monitor;
                job.name = self.and_or.to_string();
                job.add_process(child);
                env.jobs.add(job);
                env.jobs.set_last_async_pid(child);
                env.exit_status = ExitStatus::SUCCESS;
                Continue(())
            }
        }
    }
}

/// Redirects the standard input of a non-job-controlled asynchronous
/// command to `/dev/null`.
fn redirect_stdin_to_dev_null(env: &mut Env) {
    use nix::fcntl::OFlag;
    use nix::sys::stat::Mode;
    let Ok(path) = std::ffi::CString::new("/dev/null") else {
        return;
    };
    if let Ok(fd) = env.system.open(&path, OFlag::O_RDONLY, Mode::empty()) {
        let _ = env.system.dup2(fd, 0);
        let _ = env.system.close(fd);
    }
}
