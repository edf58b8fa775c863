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

//! Simple command semantics
//!
//! A simple command first expands its words to fields and performs its
//! assignments. If a command name remains, command search decides what
//! runs: a function (in a new call frame, in this shell), a built-in (in
//! this shell), or an external utility (forked and exec'ed, with
//! redirections applied in the child). Redirections for commands running
//! in this shell are applied around the execution and undone afterwards.

use super::Execute;
use crate::command_search::{self, Target};
use crate::expansion;
use crate::redir::RedirGuard;
use crate::xtrace;
use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::unistd::{ForkResult, Pid};
use sedge_env::job::{Job, JobSet, ProcessState};
use sedge_env::option::Option::{AllExport, Monitor};
use sedge_env::semantics::{Divert, ExitStatus, Field, Result};
use sedge_env::variable::Attrs;
use sedge_env::Env;
use sedge_syntax::syntax::SimpleCommand;
use std::ffi::CString;
use std::ops::ControlFlow::{Break, Continue};

impl Execute for SimpleCommand {
    fn execute(&self, env: &mut Env) -> Result {
        let status_before = env.exit_status;

        // Expand the command name and arguments to fields.
        let words: Vec<_> = self.name.iter().chain(&self.arguments).cloned().collect();
        let fields = match expansion::expand_words(env, &words) {
            Ok(fields) => fields,
            Err(error) => return handle_expansion_error(env, error),
        };

        // Perform the assignments. Variables assigned on a command with a
        // name are exported so the command sees them.
        let export_to_command = !fields.is_empty();
        for assignment in &self.assignments {
            let value = match expansion::expand_assignment_value(env, &assignment.value) {
                Ok(field) => field,
                Err(error) => return handle_expansion_error(env, error),
            };
            let mut attrs = Attrs::empty();
            if export_to_command || env.options.is_on(AllExport) {
                attrs |= Attrs::EXPORT;
            }
            xtrace::trace_assignment(env, &assignment.name, &value.value);
            if let Err(error) = env
                .variables
                .assign(assignment.name.clone(), value.value, attrs)
            {
                crate::print_error(env, format_args!("{error}"));
                env.exit_status = ExitStatus::FAILURE;
                return Continue(());
            }
        }

        if fields.is_empty() {
            // Assignments and redirections only. The redirections are
            // still performed (and undone), so their errors surface.
            if !self.io_redirects.is_empty() {
                let mut guard = RedirGuard::new(env, true);
                if let Err(error) = guard.perform_redirs(&self.io_redirects) {
                    drop(guard);
                    return handle_redir_error(env, error);
                }
            }
            // A command substitution in the assignments determines the
            // status; otherwise the command succeeds.
            if env.exit_status == status_before {
                env.exit_status = ExitStatus::SUCCESS;
            }
            return Continue(());
        }

        xtrace::trace_fields(env, &fields);

        match command_search::search(env, &fields[0].value) {
            Some(Target::Builtin(builtin)) => {
                let mut guard = RedirGuard::new(env, true);
                if let Err(error) = guard.perform_redirs(&self.io_redirects) {
                    drop(guard);
                    return handle_redir_error(env, error);
                }
                let args = fields[1..].to_vec();
                let result = (builtin.execute)(&mut guard, args);
                drop(guard);
                env.exit_status = result.exit_status;
                result.divert?;
                Continue(())
            }

            Some(Target::Function(function)) => {
                let mut guard = RedirGuard::new(env, true);
                if let Err(error) = guard.perform_redirs(&self.io_redirects) {
                    drop(guard);
                    return handle_redir_error(env, error);
                }
                let params = fields[1..].iter().map(|f| f.value.clone()).collect();
                let result = {
                    let mut frame = guard.push_args(params);
                    function.body.execute(&mut frame)
                };
                drop(guard);
                match result {
                    Break(Divert::Return(exit_status)) => {
                        if let Some(exit_status) = exit_status {
                            env.exit_status = exit_status;
                        }
                        Continue(())
                    }
                    other => other,
                }
            }

            Some(Target::External { path }) => self.execute_external(env, path, fields),

            None => {
                crate::print_error(
                    env,
                    format_args!("{}: command not found", fields[0].value),
                );
                env.exit_status = ExitStatus::NOT_FOUND;
                Continue(())
            }
        }
    }
}

trait ExecuteExternal {
    fn execute_external(&self, env: &mut Env, path: CString, fields: Vec<Field>) -> Result;
}

impl ExecuteExternal for SimpleCommand {
    /// Runs an external utility in a forked child.
    fn execute_external(&self, env: &mut Env, path: CString, fields: Vec<Field>) -> Result {
        let name = fields[0].value.clone();
        let monitor = env.options.is_on(Monitor);

        let mut args = Vec::with_capacity(fields.len());
        for field in &fields {
            match CString::new(field.value.as_str()) {
                Ok(arg) => args.push(arg),
                Err(_) => {
                    crate::print_error(
                        env,
                        format_args!("{name}: argument contains a nul byte"),
                    );
                    env.exit_status = ExitStatus::FAILURE;
                    return Continue(());
                }
            }
        }
        let environ = env.variables.environ();

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
                    for signal in [Signal::SIGTSTP, Signal::SIGTTIN, Signal::SIGTTOU] {
                        let _ = env.system.default_signal(signal);
                    }
                }
                // In the child, redirections are permanent; there is
                // nothing to restore once exec replaces the process.
                let mut guard = RedirGuard::new(env, false);
                if let Err(error) = guard.perform_redirs(&self.io_redirects) {
                    crate::print_error(&guard, format_args!("{error}"));
                    drop(guard);
                    env.system.exit_process(ExitStatus::FAILURE);
                }
                drop(guard);

                let errno = env
                    .system
                    .execve(&path, &args, &environ)
                    .unwrap_err();
                crate::print_error(
                    env,
                    format_args!("{}: {}", path.to_string_lossy(), errno),
                );
                let exit_status = if errno == Errno::ENOENT {
                    ExitStatus::NOT_FOUND
                } else {
                    ExitStatus::NOEXEC
                };
                env.system.exit_process(exit_status)
            }
            Ok(ForkResult::Parent { child }) => {
                if monitor {
                    let _ = env.system.setpgid(child, child);
                }
                let mut job = Job::new(child);
                job.job_controlled = monitor;
                job.name = fields
                    .iter()
                    .map(|f| f.value.clone())
                    .collect::<Vec<_>>()
                    .join(" ");
                job.add_process(child);
                let job_id = env.jobs.add(job);

                let exit_status = match crate::job::wait_for_job_foreground(env, job_id) {
                    Ok(ProcessState::Exited(exit_status)) => exit_status,
                    Ok(ProcessState::Signaled(signal) | ProcessState::Stopped(signal)) => {
                        ExitStatus::from_signal(signal)
                    }
                    Ok(ProcessState::Running) => ExitStatus::SUCCESS,
                    Err(errno) => {
                        crate::print_error(env, format_args!("cannot await {name}: {errno}"));
                        ExitStatus::FAILURE
                    }
                };
                crate::job::finish_foreground_job(env, job_id);
                env.exit_status = exit_status;
                Continue(())
            }
        }
    }
}

/// Reports an expansion error and fails the current command.
pub(crate) fn handle_expansion_error(env: &mut Env, error: expansion::Error) -> Result {
    crate::print_error(env, format_args!("{}: {}", error.location, error));
    env.exit_status = ExitStatus::FAILURE;
    Continue(())
}

/// Reports a redirection error and fails the current command.
fn handle_redir_error(env: &mut Env, error: crate::redir::Error) -> Result {
    crate::print_error(env, format_args!("{}: {}", error.location, error));
    env.exit_status = ExitStatus::FAILURE;
    Continue(())
}
