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

//! Command substitution semantics
//!
//! The captured program runs in a forked subshell with its standard
//! output connected to a pipe. The parent reads the whole output before
//! waiting for the child, so a substitution larger than the pipe capacity
//! cannot deadlock. Trailing newlines are removed from the result.

use super::{Error, ErrorCause, Result};
use nix::unistd::ForkResult;
use sedge_env::Env;
use sedge_syntax::source::Location;

pub(super) fn expand(env: &mut Env, program: &str, location: Location) -> Result<String> {
    let error = |errno| Error {
        cause: ErrorCause::CommandSubst(errno),
        location,
    };

    let (reader, writer) = env.system.pipe().map_err(error)?;
    match env.system.fork().map_err(error)? {
        ForkResult::Child => {
            env.is_subshell = true;
            env.jobs = sedge_env::job::JobSet::new();
            let _ = env.system.close(reader);
            let _ = env.system.dup2(writer, 1);
            let _ = env.system.close(writer);
            let exit_status = crate::runner::run_source(env, program);
            env.system.exit_process(exit_status)
        }
        ForkResult::Parent { child } => {
            let _ = env.system.close(writer);
            let mut output = Vec::new();
            let mut buffer = [0; 4096];
            loop {
                match env.system.read(reader, &mut buffer) {
                    Ok(0) => break,
                    Ok(count) => output.extend_from_slice(&buffer[..count]),
                    Err(nix::errno::Errno::EINTR) => {}
                    Err(errno) => {
                        let _ = env.system.close(reader);
                        return Err(error(errno));
                    }
                }
            }
            let _ = env.system.close(reader);

            let state = crate::job::wait_for_pid(env, child).map_err(error)?;
            if let Some(exit_status) = state.exit_status() {
                env.exit_status = exit_status;
            }

            let mut result = String::from_utf8_lossy(&output).into_owned();
            while result.ends_with('\n') {
                result.pop();
            }
            Ok(result)
        }
    }
}
