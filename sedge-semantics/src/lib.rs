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

//! This crate defines the semantics of the shell command language: how
//! [syntax](sedge_syntax::syntax) is [expanded](expansion) and
//! [executed](command) against an [environment](sedge_env::Env).
//!
//! The executor recurses directly over the syntax tree. Parallelism
//! exists only through `fork`: pipelines, subshells, command
//! substitutions, and asynchronous commands each run in child processes
//! that the [job](sedge_env::job) machinery supervises through blocking
//! `waitpid` calls.

pub mod command;
pub mod command_search;
pub mod expansion;
mod job;
pub mod redir;
pub mod runner;
pub mod xtrace;

pub use command::Execute;
pub use runner::{run_program, run_source};

use sedge_env::Env;

/// Writes an error message to the standard error, prefixed with the shell
/// name.
pub(crate) fn print_error(env: &Env, message: std::fmt::Arguments<'_>) {
    let line = format!("sedge: {message}\n");
    let _ = env.system.write_all(2, line.as_bytes());
}
