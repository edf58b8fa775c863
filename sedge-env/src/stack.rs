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

//! Runtime execution context stack
//!
//! The [`Stack`] traces the execution context at runtime: entering a loop
//! pushes [`Frame::Loop`], calling a function pushes [`Frame::Function`]
//! with the function's positional parameters, and so on. Commands examine
//! the stack to count enclosing loops for `break`/`continue` and to find
//! the active positional parameters.
//!
//! Frames are pushed through guards that pop the frame when dropped, so a
//! frame cannot leak across an early return.

use std::ops::Deref;
use std::ops::DerefMut;

/// Element of the runtime execution context stack
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Frame {
    /// `for`, `while`, or `until` loop
    Loop,
    /// Context where the `ErrExit` option is ignored
    ///
    /// Pushed when executing negated pipelines and the condition parts of
    /// `if`, `while`, `until`, and and-or lists.
    Condition,
    /// Subshell
    Subshell,
    /// Function invocation
    Function {
        /// Positional parameters of the call
        params: Vec<String>,
    },
}

/// Runtime execution context stack
///
/// The inner vector is accessible through `Deref`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Stack {
    inner: Vec<Frame>,
}

impl Deref for Stack {
    type Target = Vec<Frame>;
    fn deref(&self) -> &Vec<Frame> {
        &self.inner
    }
}

/// RAII-style guard that makes sure a stack frame is popped properly
///
/// The guard is created by [`Stack::push`].
#[derive(Debug)]
#[must_use = "the frame is popped when the guard is dropped"]
pub struct StackFrameGuard<'a> {
    stack: &'a mut Stack,
}

impl Stack {
    /// Pushes a frame, returning a guard that pops it when dropped.
    #[inline]
    pub fn push(&mut self, frame: Frame) -> StackFrameGuard<'_> {
        self.inner.push(frame);
        StackFrameGuard { stack: self }
    }

    /// Returns the number of enclosing loops.
    ///
    /// Counts `Loop` frames pushed since the last function or subshell
    /// frame, which is how many levels `break N` and `continue N` may
    /// reach. The `break` and `continue` utilities clamp their operand
    /// against this count before raising the branch-control signal, so a
    /// count beyond the nesting depth leaves all enclosing loops instead
    /// of unwinding past them.
    #[must_use]
    pub fn loop_count(&self) -> usize {
        self.inner
            .iter()
            .rev()
            .take_while(|frame| !matches!(frame, Frame::Function { .. } | Frame::Subshell))
            .filter(|frame| matches!(frame, Frame::Loop))
            .count()
    }

    /// Returns the positional parameters of the innermost function call,
    /// if any function is being executed.
    #[must_use]
    pub fn function_params(&self) -> Option<&[String]> {
        self.inner.iter().rev().find_map(|frame| match frame {
            Frame::Function { params } => Some(params.as_slice()),
            _ => None,
        })
    }

    /// Returns true if the current context ignores the `ErrExit` option.
    #[must_use]
    pub fn is_in_condition(&self) -> bool {
        self.inner
            .iter()
            .any(|frame| matches!(frame, Frame::Condition))
    }

    /// Pushes a frame without a guard, for [`Env::push_frame`](crate::Env::push_frame).
    pub(crate) fn push_without_guard(&mut self, frame: Frame) {
        self.inner.push(frame);
    }

    /// Pops a frame pushed by [`push_without_guard`](Self::push_without_guard).
    pub(crate) fn pop_without_guard(&mut self) {
        self.inner.pop();
    }
}

impl Deref for StackFrameGuard<'_> {
    type Target = Stack;
    fn deref(&self) -> &Stack {
        self.stack
    }
}

impl DerefMut for StackFrameGuard<'_> {
    fn deref_mut(&mut self) -> &mut Stack {
        self.stack
    }
}

impl Drop for StackFrameGuard<'_> {
    fn drop(&mut self) {
        self.stack.inner.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_pops_the_frame() {
        let mut stack = Stack::default();
        {
            let mut guard = stack.push(Frame::Loop);
            assert_eq!(guard.len(), 1);
            let guard2 = guard.push(Frame::Condition);
            assert_eq!(guard2.len(), 2);
        }
        assert_eq!(stack.len(), 0);
    }

    #[test]
    fn loop_count_stops_at_function_and_subshell_frames() {
        let mut stack = Stack::default();
        let mut guard = stack.push(Frame::Loop);
        assert_eq!(guard.loop_count(), 1);

        let mut guard = guard.push(Frame::Loop);
        assert_eq!(guard.loop_count(), 2);

        let mut guard = guard.push(Frame::Function { params: vec![] });
        assert_eq!(guard.loop_count(), 0);

        let guard = guard.push(Frame::Loop);
        assert_eq!(guard.loop_count(), 1);
    }

    #[test]
    fn function_params_finds_the_innermost_call() {
        let mut stack = Stack::default();
        assert_eq!(stack.function_params(), None);

        let mut guard = stack.push(Frame::Function {
            params: vec!["a".to_string()],
        });
        let guard = guard.push(Frame::Function {
            params: vec!["b".to_string()],
        });
        assert_eq!(guard.function_params().unwrap(), ["b".to_string()]);
    }
}
