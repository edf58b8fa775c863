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

//! Type definitions for command execution

use sedge_syntax::source::Location;
use std::ffi::c_int;
use std::ops::ControlFlow;

/// Resultant string of word expansion
///
/// A field is a string accompanied with the location of the word it
/// resulted from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Field {
    /// String value of the field
    pub value: String,
    /// Location of the word this field resulted from
    pub origin: Location,
}

impl Field {
    /// Creates a field with a dummy origin location.
    #[inline]
    pub fn dummy<S: Into<String>>(value: S) -> Field {
        Field {
            value: value.into(),
            origin: Location::dummy(),
        }
    }

    /// Creates an array of fields with dummy origin locations.
    pub fn dummies<I, S>(values: I) -> Vec<Field>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        values.into_iter().map(Self::dummy).collect()
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value.fmt(f)
    }
}

/// Number that summarizes the result of command execution
///
/// An exit status is an integer returned from a utility when executed. The
/// special parameter `$?` expands to the exit status of the last executed
/// command, and exit statuses decide the behavior of conditional
/// constructs.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ExitStatus(pub c_int);

impl ExitStatus {
    /// Exit status of 0: success
    pub const SUCCESS: ExitStatus = ExitStatus(0);
    /// Exit status of 1: failure
    pub const FAILURE: ExitStatus = ExitStatus(1);
    /// Exit status of 2: error severer than failure, e.g. a syntax error
    pub const ERROR: ExitStatus = ExitStatus(2);
    /// Exit status of 126: command found but not executable
    pub const NOEXEC: ExitStatus = ExitStatus(126);
    /// Exit status of 127: command not found
    pub const NOT_FOUND: ExitStatus = ExitStatus(127);

    /// Returns true if and only if `self` is zero.
    #[must_use]
    pub const fn is_successful(&self) -> bool {
        self.0 == 0
    }

    /// Returns the exit status of a process killed by the given signal:
    /// 128 plus the signal number.
    #[must_use]
    pub fn from_signal(signal: nix::sys::signal::Signal) -> ExitStatus {
        ExitStatus(0x80 + signal as c_int)
    }
}

impl std::fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<c_int> for ExitStatus {
    fn from(value: c_int) -> ExitStatus {
        ExitStatus(value)
    }
}

impl From<ExitStatus> for c_int {
    fn from(exit_status: ExitStatus) -> c_int {
        exit_status.0
    }
}

/// Result of interrupted command execution
///
/// A divert is the branch-control signal that non-local control flow
/// constructs propagate: `break` and `continue` unwind to an enclosing
/// loop, `return` to the enclosing function, and `exit` through all frames
/// to the driver.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Divert {
    /// Continue the current loop.
    Continue {
        /// Number of loops to break out of before continuing: 0 continues
        /// the innermost loop.
        count: usize,
    },
    /// Break the current loop.
    Break {
        /// Number of loops to break: 0 breaks the innermost loop.
        count: usize,
    },
    /// Return from the current function.
    ///
    /// The optional exit status overrides the current one.
    Return(Option<ExitStatus>),
    /// Exit the current shell execution environment.
    Exit(Option<ExitStatus>),
}

/// Result of command execution
///
/// `Continue(T)` is the normal case. `Break(divert)` means execution was
/// interrupted by the branch-control signal, which the enclosing loop,
/// function, or driver consumes.
pub type Result<T = ()> = ControlFlow<Divert, T>;

/// Helper for extracting an overriding exit status from a divert.
pub fn apply_divert_status(divert: Divert, current: ExitStatus) -> ExitStatus {
    match divert {
        Divert::Return(Some(status)) | Divert::Exit(Some(status)) => status,
        _ => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_status_constants() {
        assert!(ExitStatus::SUCCESS.is_successful());
        assert!(!ExitStatus::FAILURE.is_successful());
        assert_eq!(ExitStatus::ERROR.0, 2);
        assert_eq!(ExitStatus::NOEXEC.0, 126);
        assert_eq!(ExitStatus::NOT_FOUND.0, 127);
    }

    #[test]
    fn signal_exit_status() {
        use nix::sys::signal::Signal;
        assert_eq!(ExitStatus::from_signal(Signal::SIGINT).0, 130);
        assert_eq!(ExitStatus::from_signal(Signal::SIGKILL).0, 137);
    }

    #[test]
    fn divert_status_application() {
        let status = ExitStatus(5);
        assert_eq!(
            apply_divert_status(Divert::Break { count: 0 }, status),
            status
        );
        assert_eq!(
            apply_divert_status(Divert::Exit(Some(ExitStatus(7))), status),
            ExitStatus(7)
        );
        assert_eq!(apply_divert_status(Divert::Exit(None), status), status);
    }
}
