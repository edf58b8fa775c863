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

//! Variable environment
//!
//! This crate does not store variables itself. The caller of
//! [`eval`](crate::eval()) provides an implementation of the [`Env`] trait
//! through which variables appearing in the expression are resolved and
//! assigned.

use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;

/// Interface for accessing variables during evaluation
pub trait Env {
    /// Object returned when a variable cannot be read or assigned
    ///
    /// A shell typically makes an unset variable an error here when its
    /// `nounset` option is on, and a readonly variable an error on
    /// assignment.
    type Error;

    /// Returns the value of the variable, or `None` if it is unset.
    fn get_variable(&self, name: &str) -> Result<Option<&str>, Self::Error>;

    /// Assigns a new value to the variable.
    fn assign_variable(&mut self, name: &str, value: String) -> Result<(), Self::Error>;
}

impl Env for HashMap<String, String> {
    type Error = Infallible;

    fn get_variable(&self, name: &str) -> Result<Option<&str>, Infallible> {
        Ok(self.get(name).map(String::as_str))
    }

    fn assign_variable(&mut self, name: &str, value: String) -> Result<(), Infallible> {
        self.insert(name.to_owned(), value);
        Ok(())
    }
}

impl Env for BTreeMap<String, String> {
    type Error = Infallible;

    fn get_variable(&self, name: &str) -> Result<Option<&str>, Infallible> {
        Ok(self.get(name).map(String::as_str))
    }

    fn assign_variable(&mut self, name: &str, value: String) -> Result<(), Infallible> {
        self.insert(name.to_owned(), value);
        Ok(())
    }
}
