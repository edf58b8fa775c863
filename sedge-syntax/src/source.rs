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

//! Source code positions
//!
//! A [`Location`] names a position in the source code being parsed. Locations
//! are attached to AST nodes when they are constructed and to errors when
//! parsing or expansion fails, so diagnostics can point back at the offending
//! input.

use std::fmt;
use std::num::NonZeroU64;

/// Position in the source code, counted in lines and columns
///
/// Both fields are 1-based. A newline moves the position to the first column
/// of the next line; `\r\n`, `\n`, and a lone `\r` all count as a single
/// newline.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Location {
    /// Line number, starting from 1
    pub line: NonZeroU64,
    /// Column number, starting from 1
    ///
    /// Columns count characters, not bytes, so a multi-byte character
    /// advances the column by one.
    pub column: NonZeroU64,
}

impl Location {
    /// Creates a location for the first character of the source.
    #[must_use]
    pub fn start() -> Self {
        Location {
            line: NonZeroU64::new(1).unwrap(),
            column: NonZeroU64::new(1).unwrap(),
        }
    }

    /// Creates a location for use in tests and synthesized nodes.
    #[must_use]
    pub fn dummy() -> Self {
        Self::start()
    }

    /// Returns the location of the next column on the same line.
    #[must_use]
    pub fn next_column(&self) -> Self {
        Location {
            line: self.line,
            column: self.column.checked_add(1).unwrap(),
        }
    }

    /// Returns the location of the first column of the next line.
    #[must_use]
    pub fn next_line(&self) -> Self {
        Location {
            line: self.line.checked_add(1).unwrap(),
            column: NonZeroU64::new(1).unwrap(),
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_advancement() {
        let start = Location::start();
        assert_eq!(start.to_string(), "1:1");
        assert_eq!(start.next_column().to_string(), "1:2");
        assert_eq!(start.next_column().next_line().to_string(), "2:1");
    }
}
