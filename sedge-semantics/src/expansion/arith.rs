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

//! Arithmetic expansion semantics
//!
//! The expression captured by the parser is evaluated with the
//! `sedge-arith` crate against the shell's variables. Reading an unset
//! variable is an error under `nounset`; assignments write back through
//! the variable set, respecting the readonly attribute.

use super::initial::all_export_attrs;
use super::{Error, ErrorCause, Result};
use sedge_env::option::Option::Unset;
use sedge_env::variable::AssignError;
use sedge_env::Env;
use sedge_syntax::source::Location;
use thiserror::Error as ThisError;

/// Error accessing a variable during arithmetic evaluation
#[derive(Clone, Debug, Eq, Hash, PartialEq, ThisError)]
pub enum ArithVarError {
    /// An unset variable was read under `nounset`.
    #[error("unset variable `{0}`")]
    Unset(String),
    /// A readonly variable was assigned.
    #[error(transparent)]
    ReadOnly(#[from] AssignError),
}

/// Adapter exposing shell variables to the arithmetic evaluator
struct ArithEnv<'a> {
    env: &'a mut Env,
}

impl sedge_arith::Env for ArithEnv<'_> {
    type Error = ArithVarError;

    fn get_variable(&self, name: &str) -> std::result::Result<Option<&str>, ArithVarError> {
        match self.env.variables.value(name) {
            Some(value) => Ok(Some(value)),
            None => {
                if self.env.options.is_on(Unset) {
                    Ok(None)
                } else {
                    Err(ArithVarError::Unset(name.to_string()))
                }
            }
        }
    }

    fn assign_variable(&mut self, name: &str, value: String) -> std::result::Result<(), ArithVarError> {
        let attrs = all_export_attrs(self.env);
        self.env.variables.assign(name, value, attrs)?;
        Ok(())
    }
}

/// Evaluates an arithmetic expansion to its decimal result.
pub(super) fn expand(env: &mut Env, expression: &str, location: Location) -> Result<String> {
    match sedge_arith::eval(expression, &mut ArithEnv { env }) {
        Ok(value) => Ok(value.to_string()),
        Err(error) => Err(Error {
            cause: ErrorCause::Arith(error.cause),
            location,
        }),
    }
}
