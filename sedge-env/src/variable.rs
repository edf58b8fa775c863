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

//! Items for shell variables
//!
//! A [`Variable`] is a value with [attribute](Attrs) flags. The
//! [`VariableSet`] maps names to variables; positional parameters are not
//! variables and live in the execution [stack](crate::stack) instead.

use bitflags::bitflags;
use std::collections::HashMap;
use std::ffi::CString;
use thiserror::Error;

/// Name of the variable that holds the home directory
pub const HOME: &str = "HOME";
/// Name of the variable that controls field splitting
pub const IFS: &str = "IFS";
/// Name of the variable that lists command search directories
pub const PATH: &str = "PATH";

bitflags! {
    /// Attribute flags of a variable
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct Attrs: u8 {
        /// The variable is passed to the environment of executed programs.
        const EXPORT = 1 << 0;
        /// The variable cannot be assigned or unset.
        const READONLY = 1 << 1;
    }
}

/// Value and attributes of a shell variable
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Variable {
    /// Value of the variable
    pub value: String,
    /// Attribute flags
    pub attrs: Attrs,
}

impl Variable {
    /// Returns true if the variable is exported.
    #[must_use]
    pub fn is_exported(&self) -> bool {
        self.attrs.contains(Attrs::EXPORT)
    }

    /// Returns true if the variable is read-only.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.attrs.contains(Attrs::READONLY)
    }
}

/// Error assigning to a read-only variable
#[derive(Clone, Debug, Eq, Error, Hash, PartialEq)]
#[error("read-only variable `{name}` cannot be assigned")]
pub struct AssignError {
    /// Name of the read-only variable
    pub name: String,
}

/// Collection of shell variables
#[derive(Clone, Debug, Default)]
pub struct VariableSet {
    variables: HashMap<String, Variable>,
}

impl VariableSet {
    /// Creates an empty variable set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a variable set initialized from the process environment.
    ///
    /// Every inherited variable is exported.
    #[must_use]
    pub fn from_environ() -> Self {
        let variables = std::env::vars()
            .map(|(name, value)| {
                (
                    name,
                    Variable {
                        value,
                        attrs: Attrs::EXPORT,
                    },
                )
            })
            .collect();
        VariableSet { variables }
    }

    /// Returns the variable with the given name, if defined.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Returns the value of the variable, if defined.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(|v| v.value.as_str())
    }

    /// Assigns a value to a variable, creating it if necessary.
    ///
    /// Existing attributes are kept, and `attrs` is added on top. Fails if
    /// the variable is read-only.
    pub fn assign<N, V>(&mut self, name: N, value: V, attrs: Attrs) -> Result<(), AssignError>
    where
        N: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        if let Some(existing) = self.variables.get_mut(&name) {
            if existing.is_read_only() {
                return Err(AssignError { name });
            }
            existing.value = value.into();
            existing.attrs |= attrs;
        } else {
            self.variables.insert(
                name,
                Variable {
                    value: value.into(),
                    attrs,
                },
            );
        }
        Ok(())
    }

    /// Adds attribute flags to a variable, creating it empty if undefined.
    pub fn set_attrs(&mut self, name: &str, attrs: Attrs) {
        self.variables.entry(name.to_string()).or_default().attrs |= attrs;
    }

    /// Removes a variable. Fails if it is read-only.
    pub fn unset(&mut self, name: &str) -> Result<(), AssignError> {
        if let Some(variable) = self.variables.get(name) {
            if variable.is_read_only() {
                return Err(AssignError {
                    name: name.to_string(),
                });
            }
            self.variables.remove(name);
        }
        Ok(())
    }

    /// Iterates over all name-variable pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.variables.iter().map(|(name, v)| (name.as_str(), v))
    }

    /// Returns the exported variables as `name=value` strings for
    /// `execve`.
    ///
    /// A name or value containing a nul byte is silently omitted.
    #[must_use]
    pub fn environ(&self) -> Vec<CString> {
        self.variables
            .iter()
            .filter(|(_, variable)| variable.is_exported())
            .filter_map(|(name, variable)| {
                CString::new(format!("{}={}", name, variable.value)).ok()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_and_get() {
        let mut set = VariableSet::new();
        assert_eq!(set.value("foo"), None);

        set.assign("foo", "bar", Attrs::empty()).unwrap();
        assert_eq!(set.value("foo"), Some("bar"));

        set.assign("foo", "baz", Attrs::empty()).unwrap();
        assert_eq!(set.value("foo"), Some("baz"));
    }

    #[test]
    fn attributes_accumulate() {
        let mut set = VariableSet::new();
        set.assign("foo", "1", Attrs::EXPORT).unwrap();
        set.assign("foo", "2", Attrs::empty()).unwrap();
        assert!(set.get("foo").unwrap().is_exported());
    }

    #[test]
    fn read_only_rejects_assignment_and_unset() {
        let mut set = VariableSet::new();
        set.assign("foo", "1", Attrs::READONLY).unwrap();

        let error = set.assign("foo", "2", Attrs::empty()).unwrap_err();
        assert_eq!(error.name, "foo");
        assert_eq!(set.value("foo"), Some("1"));

        set.unset("foo").unwrap_err();
        assert_eq!(set.value("foo"), Some("1"));
    }

    #[test]
    fn unset_removes_the_variable() {
        let mut set = VariableSet::new();
        set.assign("foo", "1", Attrs::empty()).unwrap();
        set.unset("foo").unwrap();
        assert_eq!(set.value("foo"), None);
        // Unsetting an undefined variable is not an error.
        set.unset("foo").unwrap();
    }

    #[test]
    fn environ_contains_exported_variables_only() {
        let mut set = VariableSet::new();
        set.assign("A", "1", Attrs::EXPORT).unwrap();
        set.assign("B", "2", Attrs::empty()).unwrap();

        let environ = set.environ();
        assert_eq!(environ.len(), 1);
        assert_eq!(environ[0].to_str().unwrap(), "A=1");
    }
}
