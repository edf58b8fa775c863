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

//! Command search
//!
//! Deciding how a command name is executed: special built-ins are found
//! first, then functions, then other built-ins, and finally external
//! utilities through a `$PATH` walk. A name containing a slash bypasses
//! the search and names an external utility directly.

use sedge_env::builtin::{Builtin, Kind};
use sedge_env::function::Function;
use sedge_env::variable::PATH;
use sedge_env::Env;
use std::ffi::CString;
use std::rc::Rc;

/// Default search path used when `PATH` is unset
const DEFAULT_PATH: &str = "/usr/bin:/bin";

/// How a command name resolves
#[derive(Clone, Debug)]
pub enum Target {
    /// Built-in utility
    Builtin(Builtin),
    /// Shell function
    Function(Rc<Function>),
    /// External utility
    External {
        /// Path to the executable
        path: CString,
    },
}

/// Resolves a command name.
///
/// Returns `None` if the name cannot be resolved, in which case the
/// command fails with exit status 127.
#[must_use]
pub fn search(env: &Env, name: &str) -> Option<Target> {
    if name.contains('/') {
        return CString::new(name).ok().map(|path| Target::External { path });
    }

    if let Some(&builtin) = env.builtins.get(name) {
        if builtin.kind == Kind::Special {
            return Some(Target::Builtin(builtin));
        }
    }
    if let Some(function) = env.functions.get(name) {
        return Some(Target::Function(Rc::clone(function)));
    }
    if let Some(&builtin) = env.builtins.get(name) {
        return Some(Target::Builtin(builtin));
    }

    search_path(env, name).map(|path| Target::External { path })
}

/// Walks `$PATH` for an executable file with the given name.
#[must_use]
pub fn search_path(env: &Env, name: &str) -> Option<CString> {
    let path = env.variables.value(PATH).unwrap_or(DEFAULT_PATH);
    for dir in path.split(':') {
        // An empty prefix names the current directory.
        let dir = if dir.is_empty() { "." } else { dir };
        if let Ok(candidate) = CString::new(format!("{dir}/{name}")) {
            if env.system.is_executable_file(&candidate) {
                return Some(candidate);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use sedge_env::builtin;
    use sedge_env::semantics::{ExitStatus, Field};
    use sedge_env::variable::Attrs;
    use sedge_syntax::syntax::{Command, SimpleCommand};

    fn null_builtin(_env: &mut Env, _args: Vec<Field>) -> builtin::Result {
        builtin::Result::new(ExitStatus::SUCCESS)
    }

    #[test]
    fn slash_bypasses_search() {
        let env = Env::new();
        let target = search(&env, "/bin/sh").unwrap();
        assert_matches::assert_matches!(target, Target::External { path } => {
            assert_eq!(path.to_str().unwrap(), "/bin/sh");
        });
    }

    #[test]
    fn function_overrides_mandatory_builtin_but_not_special() {
        let mut env = Env::new();
        env.functions.define(Function {
            name: "f".to_string(),
            body: Rc::new(Command::Simple(SimpleCommand::default())),
        });
        env.builtins.insert(
            "f",
            builtin::Builtin {
                kind: Kind::Mandatory,
                execute: null_builtin,
            },
        );
        assert_matches::assert_matches!(search(&env, "f"), Some(Target::Function(_)));

        env.builtins.insert(
            "f",
            builtin::Builtin {
                kind: Kind::Special,
                execute: null_builtin,
            },
        );
        assert_matches::assert_matches!(search(&env, "f"), Some(Target::Builtin(_)));
    }

    #[test]
    fn path_walk_finds_executables() {
        let mut env = Env::new();
        env.variables
            .assign(PATH, "/nonexistent:/bin:/usr/bin", Attrs::empty())
            .unwrap();
        let path = search_path(&env, "sh").unwrap();
        let path = path.to_str().unwrap();
        assert!(path == "/bin/sh" || path == "/usr/bin/sh", "{path}");

        assert_eq!(search_path(&env, "no-such-utility-xyzzy"), None);
    }
}
