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

//! Compound command semantics
//!
//! Control-flow constructs run in the current shell environment, except
//! the subshell, which forks. Loops consume the `break` and `continue`
//! branch-control signals addressed to them and re-raise signals
//! addressed to an outer loop with the count decremented.

use super::{execute_list, resolve_status, Execute};
use crate::expansion;
use sedge_env::function::Function;
use sedge_env::job::{Job, ProcessState};
use sedge_env::semantics::{Divert, ExitStatus, Field, Result};
use sedge_env::stack::Frame;
use sedge_env::Env;
use sedge_syntax::syntax::{
    CaseClause, Command, CommandList, ForClause, IfClause, LoopClause, LoopKind,
};
use std::ops::ControlFlow::{Break, Continue};

impl Execute for Command {
    fn execute(&self, env: &mut Env) -> Result {
        match self {
            Command::Simple(simple) => simple.execute(env),
            Command::BraceGroup(body) => execute_list(env, body),
            Command::Subshell(body) => execute_subshell(env, body),
            Command::If(clause) => execute_if(env, clause),
            Command::Loop(clause) => execute_loop(env, clause),
            Command::For(clause) => execute_for(env, clause),
            Command::Case(clause) => execute_case(env, clause),
            Command::FunctionDefinition(definition) => {
                env.functions.define(Function {
                    name: definition.name.clone(),
                    body: definition.body.clone(),
                });
                env.exit_status = ExitStatus::SUCCESS;
                Continue(())
            }
        }
    }
}

/// Runs the body in a forked child and waits for it.
fn execute_subshell(env: &mut Env, body: &[CommandList]) -> Result {
    let child = crate::job::fork_and_run(env, |env| {
        let mut guard = env.push_frame(Frame::Subshell);
        let result = execute_list(&mut guard, body);
        drop(guard);
        resolve_status(env, result)
    });
    match child {
        Err(errno) => {
            crate::print_error(env, format_args!("cannot fork: {errno}"));
            env.exit_status = ExitStatus::FAILURE;
            Continue(())
        }
        Ok(child) => {
            let mut job = Job::new(child);
            job.name = format!(
                "({})",
                body.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
            );
            job.add_process(child);
            let job_id = env.jobs.add(job);
            let exit_status = match crate::job::wait_for_job_foreground(env, job_id) {
                Ok(ProcessState::Exited(exit_status)) => exit_status,
                Ok(ProcessState::Signaled(signal) | ProcessState::Stopped(signal)) => {
                    ExitStatus::from_signal(signal)
                }
                Ok(ProcessState::Running) => ExitStatus::SUCCESS,
                Err(errno) => {
                    crate::print_error(env, format_args!("cannot await subshell: {errno}"));
                    ExitStatus::FAILURE
                }
            };
            crate::job::finish_foreground_job(env, job_id);
            env.exit_status = exit_status;
            Continue(())
        }
    }
}

fn execute_if(env: &mut Env, clause: &IfClause) -> Result {
    {
        let mut guard = env.push_frame(Frame::Condition);
        execute_list(&mut guard, &clause.condition)?;
    }
    if env.exit_status.is_successful() {
        execute_list(env, &clause.body)
    } else if let Some(else_part) = &clause.else_part {
        else_part.execute(env)
    } else {
        env.exit_status = ExitStatus::SUCCESS;
        Continue(())
    }
}

fn execute_loop(env: &mut Env, clause: &LoopClause) -> Result {
    let mut guard = env.push_frame(Frame::Loop);
    // The loop's status is the last body status; 0 if the body never ran.
    let mut result_status = ExitStatus::SUCCESS;
    loop {
        {
            let mut condition_guard = guard.push_frame(Frame::Condition);
            execute_list(&mut condition_guard, &clause.condition)?;
        }
        let enter = match clause.kind {
            LoopKind::While => guard.exit_status.is_successful(),
            LoopKind::Until => !guard.exit_status.is_successful(),
        };
        if !enter {
            break;
        }
        match execute_list(&mut guard, &clause.body) {
            Continue(()) => result_status = guard.exit_status,
            Break(divert) => match consume_loop_divert(divert) {
                LoopControl::Break => {
                    result_status = guard.exit_status;
                    break;
                }
                LoopControl::Continue => result_status = guard.exit_status,
                LoopControl::Propagate(divert) => return Break(divert),
            },
        }
    }
    drop(guard);
    env.exit_status = result_status;
    Continue(())
}

fn execute_for(env: &mut Env, clause: &ForClause) -> Result {
    let values: Vec<Field> = match &clause.word_list {
        Some(words) => match expansion::expand_words(env, words) {
            Ok(fields) => fields,
            Err(error) => return super::simple_command::handle_expansion_error(env, error),
        },
        None => Field::dummies(env.positional_params().to_vec()),
    };

    let mut guard = env.push_frame(Frame::Loop);
    let mut result_status = ExitStatus::SUCCESS;
    for value in values {
        let attrs = if guard.options.is_on(sedge_env::option::Option::AllExport) {
            sedge_env::variable::Attrs::EXPORT
        } else {
            sedge_env::variable::Attrs::empty()
        };
        if let Err(error) = guard.variables.assign(clause.name.clone(), value.value, attrs) {
            crate::print_error(&guard, format_args!("{error}"));
            drop(guard);
            env.exit_status = ExitStatus::FAILURE;
            return Continue(());
        }
        match execute_list(&mut guard, &clause.body) {
            Continue(()) => result_status = guard.exit_status,
            Break(divert) => match consume_loop_divert(divert) {
                LoopControl::Break => {
                    result_status = guard.exit_status;
                    break;
                }
                LoopControl::Continue => result_status = guard.exit_status,
                LoopControl::Propagate(divert) => return Break(divert),
            },
        }
    }
    drop(guard);
    env.exit_status = result_status;
    Continue(())
}

/// What a loop should do with a branch-control signal raised in its body
enum LoopControl {
    /// Leave the loop.
    Break,
    /// Start the next iteration.
    Continue,
    /// The signal is for an outer construct; re-raise it.
    Propagate(Divert),
}

fn consume_loop_divert(divert: Divert) -> LoopControl {
    match divert {
        Divert::Break { count: 0 } => LoopControl::Break,
        Divert::Break { count } => LoopControl::Propagate(Divert::Break { count: count - 1 }),
        Divert::Continue { count: 0 } => LoopControl::Continue,
        Divert::Continue { count } => {
            LoopControl::Propagate(Divert::Continue { count: count - 1 })
        }
        other => LoopControl::Propagate(other),
    }
}

fn execute_case(env: &mut Env, clause: &CaseClause) -> Result {
    let subject = match expansion::expand_word(env, &clause.subject) {
        Ok(field) => field,
        Err(error) => return super::simple_command::handle_expansion_error(env, error),
    };

    for item in &clause.items {
        for pattern in &item.patterns {
            let chars = match expansion::expand_pattern(env, pattern) {
                Ok(chars) => chars,
                Err(error) => return super::simple_command::handle_expansion_error(env, error),
            };
            let matched = sedge_fnmatch::Pattern::parse(chars)
                .is_ok_and(|pattern| pattern.is_match(&subject.value));
            if matched {
                if item.body.is_empty() {
                    env.exit_status = ExitStatus::SUCCESS;
                    return Continue(());
                }
                return execute_list(env, &item.body);
            }
        }
    }

    env.exit_status = ExitStatus::SUCCESS;
    Continue(())
}
