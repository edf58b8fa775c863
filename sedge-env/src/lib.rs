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

//! This crate defines the shell execution environment: the state every
//! part of the shell reads and updates while commands run.
//!
//! The whole state lives in one explicit [`Env`] value that is threaded
//! through all APIs; there are no ambient singletons. An `Env` holds the
//! [variables](variable), [functions](function), [aliases](alias),
//! [options](option), [jobs](job), the runtime [stack](stack), and the
//! [system interface](system) used to reach the operating system.

use std::collections::HashMap;
use std::ops::Deref;
use std::ops::DerefMut;

pub mod builtin;
pub mod function;
pub mod job;
pub mod option;
pub mod semantics;
pub mod stack;
pub mod system;
pub mod variable;

#[doc(no_inline)]
pub use sedge_syntax::alias;

use self::builtin::Builtin;
use self::function::FunctionSet;
use self::job::JobSet;
use self::option::OptionSet;
use self::semantics::ExitStatus;
use self::stack::{Frame, Stack};
use self::system::RealSystem;
use self::variable::VariableSet;
use sedge_syntax::alias::AliasSet;

/// Whole shell execution environment
#[derive(Debug)]
pub struct Env {
    /// Alias definitions
    pub aliases: AliasSet,

    /// Positional parameters of the shell itself
    ///
    /// These are the parameters outside any function call. Inside a
    /// function, the parameters of the innermost [`Frame::Function`]
    /// apply; see [`positional_params`](Self::positional_params).
    pub arguments: Vec<String>,

    /// Name of the shell or script, the special parameter `$0`
    pub arg0: String,

    /// Built-in utilities, indexed by name
    pub builtins: HashMap<&'static str, Builtin>,

    /// Exit status of the last executed command, the special parameter
    /// `$?`
    pub exit_status: ExitStatus,

    /// Function definitions
    pub functions: FunctionSet,

    /// Whether this environment is a forked child of the main shell
    ///
    /// Set after a fork for a subshell, pipeline member, asynchronous
    /// command, or command substitution. A child must exit instead of
    /// returning control to the enclosing interpreter loop.
    pub is_subshell: bool,

    /// Jobs and their processes
    pub jobs: JobSet,

    /// Shell option states
    pub options: OptionSet,

    /// Exit requested for the whole shell, if any
    ///
    /// The driver checks this between command lists. It is set when a
    /// command fails under the `ErrExit` option.
    pub pending_exit: Option<ExitStatus>,

    /// Process ID of the main shell process
    ///
    /// The special parameter `$$` keeps this value even in subshells, so
    /// it is recorded once at startup instead of queried from the system.
    pub shell_pid: job::Pid,

    /// Runtime execution context stack
    pub stack: Stack,

    /// Interface to the operating system
    pub system: RealSystem,

    /// Shell variables
    pub variables: VariableSet,
}

impl Env {
    /// Creates an environment with no variables defined.
    #[must_use]
    pub fn new() -> Env {
        Env {
            aliases: AliasSet::new(),
            arguments: Vec::new(),
            arg0: String::new(),
            builtins: HashMap::new(),
            exit_status: ExitStatus::SUCCESS,
            functions: FunctionSet::new(),
            is_subshell: false,
            jobs: JobSet::new(),
            options: OptionSet::default(),
            pending_exit: None,
            shell_pid: RealSystem::new().getpid(),
            stack: Stack::default(),
            system: RealSystem::new(),
            variables: VariableSet::new(),
        }
    }

    /// Creates an environment with variables inherited from the process
    /// environment.
    #[must_use]
    pub fn with_environ() -> Env {
        let mut env = Env::new();
        env.variables = VariableSet::from_environ();
        env
    }

    /// Returns the positional parameters in effect.
    ///
    /// Inside a function call these are the call's arguments; otherwise
    /// the shell's own [`arguments`](Self::arguments).
    #[must_use]
    pub fn positional_params(&self) -> &[String] {
        self.stack.function_params().unwrap_or(&self.arguments)
    }

    /// Pushes a frame on the execution stack.
    ///
    /// The returned guard gives access to the environment and pops the
    /// frame when dropped.
    pub fn push_frame(&mut self, frame: Frame) -> EnvFrameGuard<'_> {
        self.stack.push_without_guard(frame);
        EnvFrameGuard { env: self }
    }

    /// Pushes a function call frame with the given positional parameters.
    pub fn push_args(&mut self, params: Vec<String>) -> EnvFrameGuard<'_> {
        self.push_frame(Frame::Function { params })
    }

    /// Applies the option defaults of an interactive shell.
    ///
    /// An interactive session enables job control by default.
    pub fn set_interactive(&mut self) {
        self.options.set(option::Interactive, option::On);
        self.options.set(option::Monitor, option::On);
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII-style guard that pops an execution stack frame when dropped
///
/// Created by [`Env::push_frame`]. Dereferences to the environment so
/// execution continues on the guard.
#[derive(Debug)]
#[must_use = "the frame is popped when the guard is dropped"]
pub struct EnvFrameGuard<'a> {
    env: &'a mut Env,
}

impl Deref for EnvFrameGuard<'_> {
    type Target = Env;
    fn deref(&self) -> &Env {
        self.env
    }
}

impl DerefMut for EnvFrameGuard<'_> {
    fn deref_mut(&mut self) -> &mut Env {
        self.env
    }
}

impl Drop for EnvFrameGuard<'_> {
    fn drop(&mut self) {
        self.env.stack.pop_without_guard();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_params_follow_function_frames() {
        let mut env = Env::new();
        env.arguments = vec!["outer".to_string()];
        assert_eq!(env.positional_params(), ["outer".to_string()]);

        {
            let mut guard = env.push_args(vec!["inner".to_string()]);
            assert_eq!(guard.positional_params(), ["inner".to_string()]);

            let guard2 = guard.push_frame(Frame::Loop);
            assert_eq!(guard2.positional_params(), ["inner".to_string()]);
        }
        assert_eq!(env.positional_params(), ["outer".to_string()]);
    }
}
