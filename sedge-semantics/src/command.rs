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

//! Command execution
//!
//! Execution recurses directly over the syntax tree: every syntax type
//! implements [`Execute`]. The return value is
//! [`sedge_env::semantics::Result`], whose `Break` case carries the
//! branch-control signal (`break`, `continue`, `return`, `exit`) to the
//! construct that consumes it. Exit statuses travel in
//! [`Env::exit_status`](sedge_env::Env), like `$?` suggests.

use sedge_env::semantics::{Divert, ExitStatus, Result};
use sedge_env::Env;
use sedge_syntax::syntax::{CommandList, Program};
use std::ops::ControlFlow::{Break, Continue};

mod and_or;
mod compound;
mod item;
mod pipeline;
mod simple_command;

/// Syntax node that can be executed
pub trait Execute {
    /// Executes this node.
    ///
    /// The exit status of the node lands in `env.exit_status`. A `Break`
    /// result carries a branch-control signal to the enclosing construct.
    fn execute(&self, env: &mut Env) -> Result;
}

impl Execute for Program {
    /// Executes the command lists of the program in order.
    ///
    /// Between lists, finished background jobs are reaped and a pending
    /// shell exit (from the `ErrExit` option) takes effect.
    fn execute(&self, env: &mut Env) -> Result {
        for list in &self.body {
            crate::job::reap_finished_jobs(env);
            list.execute(env)?;
            if let Some(exit_status) = env.pending_exit.take() {
                env.exit_status = exit_status;
                return Break(Divert::Exit(Some(exit_status)));
            }
        }
        Continue(())
    }
}

/// Executes a sequence of command lists, the body of a compound command.
pub(crate) fn execute_list(env: &mut Env, body: &[CommandList]) -> Result {
    for list in body {
        list.execute(env)?;
    }
    Continue(())
}

/// Resolves an execution result to the exit status a forked child should
/// terminate with.
pub(crate) fn resolve_status(env: &Env, result: Result) -> ExitStatus {
    match result {
        Continue(()) => env.exit_status,
        Break(divert) => sedge_env::semantics::apply_divert_status(divert, env.exit_status),
    }
}
