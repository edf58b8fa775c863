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

//! Type definitions for shell functions

use sedge_syntax::syntax::Command;
use std::collections::HashMap;
use std::rc::Rc;

/// Definition of a shell function
#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    /// Name the function is invoked by
    pub name: String,
    /// Command executed when the function is invoked
    ///
    /// The body is shared with the syntax tree the function was defined
    /// in, so defining a function does not clone its commands.
    pub body: Rc<Command>,
}

/// Collection of function definitions, indexed by name
#[derive(Clone, Debug, Default)]
pub struct FunctionSet {
    functions: HashMap<String, Rc<Function>>,
}

impl FunctionSet {
    /// Creates an empty function set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the function with the given name, if defined.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rc<Function>> {
        self.functions.get(name)
    }

    /// Defines a function, replacing any existing definition of the same
    /// name.
    pub fn define(&mut self, function: Function) {
        self.functions
            .insert(function.name.clone(), Rc::new(function));
    }

    /// Removes a function definition. Returns true if it existed.
    pub fn undefine(&mut self, name: &str) -> bool {
        self.functions.remove(name).is_some()
    }
}
