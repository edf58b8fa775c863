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

//! Driving parsed programs to completion
//!
//! [`run_source`] is the whole pipeline: parse the source with the
//! environment's aliases, then execute it. A parse error is reported and
//! yields exit status 2. A branch-control signal reaching the top level
//! is resolved into a final exit status here; `exit` lands here by
//! design, and a stray `break` or `return` simply ends execution.

use crate::command::Execute;
use sedge_env::option::Option::{Exec, Verbose};
use sedge_env::semantics::{apply_divert_status, ExitStatus};
use sedge_env::Env;
use sedge_syntax::input::Memory;
use sedge_syntax::parser::Parser;
use sedge_syntax::syntax::Program;
use std::ops::ControlFlow::{Break, Continue};

/// Executes a parsed program, returning the final exit status.
pub fn run_program(env: &mut Env, program: &Program) -> ExitStatus {
    let result = program.execute(env);
    // A pending exit has served its purpose once the program is over; it
    // must not leak into the next program run on this environment.
    env.pending_exit = None;
    match result {
        Continue(()) => env.exit_status,
        Break(divert) => {
            let exit_status = apply_divert_status(divert, env.exit_status);
            env.exit_status = exit_status;
            exit_status
        }
    }
}

/// Parses and executes shell source code.
pub fn run_source(env: &mut Env, code: &str) -> ExitStatus {
    if env.options.is_on(Verbose) {
        let _ = env.system.write_all(2, code.as_bytes());
        if !code.ends_with('\n') {
            let _ = env.system.write_all(2, b"\n");
        }
    }

    let parse_result = {
        let mut parser = Parser::with_aliases(Box::new(Memory::new(code)), &env.aliases);
        parser.program()
    };
    let program = match parse_result {
        Ok(program) => program,
        Err(error) => {
            crate::print_error(env, format_args!("{}: {}", error.location, error));
            env.exit_status = ExitStatus::ERROR;
            return ExitStatus::ERROR;
        }
    };

    if !env.options.is_on(Exec) {
        // noexec: syntax was checked, nothing runs.
        return env.exit_status;
    }

    run_program(env, &program)
}
