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

//! Defining and substituting aliases
//!
//! An [`Alias`] maps a command word to a replacement string. The parser
//! substitutes aliases while reading command names; the shell stores its
//! alias definitions in an [`AliasSet`]. The two sides are decoupled by the
//! [`Glossary`] trait so the parser does not depend on where definitions
//! live.

use std::collections::HashMap;
use std::rc::Rc;

/// Alias definition
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Alias {
    /// Name of the alias, i.e., the word that triggers substitution
    pub name: String,
    /// String the alias name is replaced with
    pub replacement: String,
}

/// Interface used by the parser to look up aliases
pub trait Glossary {
    /// Looks up an alias definition by name.
    fn look_up(&self, name: &str) -> Option<Rc<Alias>>;

    /// Returns true if the glossary contains no definitions.
    ///
    /// The parser skips alias processing altogether when this returns true.
    fn is_empty(&self) -> bool;
}

/// Glossary that contains no aliases
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EmptyGlossary;

impl Glossary for EmptyGlossary {
    fn look_up(&self, _name: &str) -> Option<Rc<Alias>> {
        None
    }
    fn is_empty(&self) -> bool {
        true
    }
}

/// Collection of alias definitions, indexed by name
#[derive(Clone, Debug, Default)]
pub struct AliasSet {
    entries: HashMap<String, Rc<Alias>>,
}

impl AliasSet {
    /// Creates an empty alias set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines an alias, replacing any existing definition of the same name.
    pub fn define<N, R>(&mut self, name: N, replacement: R)
    where
        N: Into<String>,
        R: Into<String>,
    {
        let name = name.into();
        let alias = Rc::new(Alias {
            name: name.clone(),
            replacement: replacement.into(),
        });
        self.entries.insert(name, alias);
    }

    /// Removes an alias definition. Returns true if it existed.
    pub fn undefine(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    /// Iterates over all definitions in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<Alias>> {
        self.entries.values()
    }
}

impl Glossary for AliasSet {
    fn look_up(&self, name: &str) -> Option<Rc<Alias>> {
        self.entries.get(name).cloned()
    }
    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_look_up_undefine() {
        let mut set = AliasSet::new();
        assert!(set.is_empty());

        set.define("ll", "ls -l");
        let alias = set.look_up("ll").unwrap();
        assert_eq!(alias.replacement, "ls -l");
        assert!(!set.is_empty());

        set.define("ll", "ls -la");
        assert_eq!(set.look_up("ll").unwrap().replacement, "ls -la");

        assert!(set.undefine("ll"));
        assert!(!set.undefine("ll"));
        assert_eq!(set.look_up("ll"), None);
    }
}
