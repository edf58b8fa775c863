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

//! Type definitions for built-in utilities
//!
//! This module defines the record the executor consults when a command
//! name resolves to a built-in. Concrete built-in implementations are not
//! part of this crate; the embedding shell registers them in
//! [`Env::builtins`](crate::Env::builtins).

use crate::semantics::{Divert, ExitStatus};
use crate::Env;
use std::ops::ControlFlow::{self, Continue};

/// Types of built-in utilities
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
    /// Special built-in
    ///
    /// Special built-ins are found before functions in command search and
    /// their assignments persist in the shell environment.
    Special,
    /// Built-in found before the `$PATH` search
    ///
    /// Mandatory built-ins can be overridden by functions but are always
    /// found regardless of `$PATH`.
    Mandatory,
}

/// Result of built-in utility execution
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[must_use]
pub struct Result {
    /// Exit status of the built-in
    pub exit_status: ExitStatus,
    /// Branch-control signal the built-in raises, if any
    ///
    /// The `break`, `continue`, `return`, and `exit` built-ins interrupt
    /// execution by returning `Break(divert)` here.
    pub divert: ControlFlow<Divert>,
}

impl Result {
    /// Creates a result with the given exit status and no divert.
    pub const fn new(exit_status: ExitStatus) -> Self {
        Result {
            exit_status,
            divert: Continue(()),
        }
    }
}

impl From<ExitStatus> for Result {
    fn from(exit_status: ExitStatus) -> Self {
        Self::new(exit_status)
    }
}

/// Type of functions that implement built-ins
///
/// The arguments do not include the command name.
pub type Main = fn(&mut Env, Vec<crate::semantics::Field>) -> Result;

/// Built-in utility definition
#[derive(Clone, Copy, Debug)]
pub struct Builtin {
    /// How the built-in is found in command search
    pub kind: Kind,
    /// Function that implements the built-in
    pub execute: Main,
}
