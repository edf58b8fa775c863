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

//! Execution tracing
//!
//! With the `XTrace` option on, each simple command is written to the
//! standard error after expansion and before execution, prefixed with
//! `+ `.

use itertools::Itertools;
use sedge_env::option::Option::XTrace;
use sedge_env::semantics::Field;
use sedge_env::Env;

/// Prints an expanded command if tracing is enabled.
pub fn trace_fields(env: &Env, fields: &[Field]) {
    if !env.options.is_on(XTrace) || fields.is_empty() {
        return;
    }
    let line = format!("+ {}\n", fields.iter().map(|f| &f.value).format(" "));
    let _ = env.system.write_all(2, line.as_bytes());
}

/// Prints an expanded assignment if tracing is enabled.
pub fn trace_assignment(env: &Env, name: &str, value: &str) {
    if !env.options.is_on(XTrace) {
        return;
    }
    let line = format!("+ {name}={value}\n");
    let _ = env.system.write_all(2, line.as_bytes());
}
