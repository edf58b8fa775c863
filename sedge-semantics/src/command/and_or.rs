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

//! And-or list semantics

use super::Execute;
use sedge_env::semantics::Result;
use sedge_env::stack::Frame;
use sedge_env::Env;
use sedge_syntax::syntax::{AndOr, AndOrList};
use std::ops::ControlFlow::Continue;

impl Execute for AndOrList {
    /// Executes the list with short-circuit evaluation.
    ///
    /// The left side runs in a condition context, which keeps its failure
    /// from triggering the `ErrExit` option. The right side runs only if
    /// the left side's exit status satisfies the operator; otherwise the
    /// left side's status is the list's status.
    fn execute(&self, env: &mut Env) -> Result {
        match self {
            AndOrList::Pipeline(pipeline) => pipeline.execute(env),
            AndOrList::Binop(binop) => {
                {
                    let mut guard = env.push_frame(Frame::Condition);
                    binop.left.execute(&mut guard)?;
                }
                let run_right = match binop.op {
                    AndOr::AndThen => env.exit_status.is_successful(),
                    AndOr::OrElse => !env.exit_status.is_successful(),
                };
                if run_right {
                    binop.right.execute(env)?;
                }
                Continue(())
            }
        }
    }
}
