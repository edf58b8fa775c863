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

//! Methods about passing [source](crate::source) code to the [parser](crate::parser)
//!
//! The parser reads source code lazily, one line at a time, through the
//! [`Input`] trait. This allows the same parser to work on an in-memory
//! string, a script file, or a terminal without buffering the whole input
//! up front.

use std::io::BufRead;

/// Line-oriented source code reader
pub trait Input {
    /// Reads the next line of the source code.
    ///
    /// The result should contain the trailing newline character, if any. An
    /// empty string signals the end of input. A line may actually contain
    /// more than one physical line; the parser does not care how input is
    /// chunked as long as the concatenation of all results reproduces the
    /// source.
    fn next_line(&mut self) -> std::io::Result<String>;
}

/// Input function that reads from a string in memory
pub struct Memory<'a> {
    code: &'a str,
}

impl<'a> Memory<'a> {
    /// Creates a new `Memory` that reads the argument string.
    #[must_use]
    pub fn new(code: &'a str) -> Memory<'a> {
        Memory { code }
    }
}

impl Input for Memory<'_> {
    fn next_line(&mut self) -> std::io::Result<String> {
        let line_len = match self.code.find('\n') {
            Some(index) => index + 1,
            None => self.code.len(),
        };
        let (line, rest) = self.code.split_at(line_len);
        self.code = rest;
        Ok(line.to_string())
    }
}

/// Input function that reads lines from a [`BufRead`] implementor
pub struct Reader<R: BufRead> {
    inner: R,
}

impl<R: BufRead> Reader<R> {
    /// Creates a new `Reader` that reads from the argument.
    pub fn new(inner: R) -> Self {
        Reader { inner }
    }
}

impl<R: BufRead> Input for Reader<R> {
    fn next_line(&mut self) -> std::io::Result<String> {
        let mut line = String::new();
        self.inner.read_line(&mut line)?;
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_yields_lines_then_empty() {
        let mut input = Memory::new("one\ntwo");
        assert_eq!(input.next_line().unwrap(), "one\n");
        assert_eq!(input.next_line().unwrap(), "two");
        assert_eq!(input.next_line().unwrap(), "");
        assert_eq!(input.next_line().unwrap(), "");
    }

    #[test]
    fn reader_yields_lines_then_empty() {
        let mut input = Reader::new(&b"a\nb\n"[..]);
        assert_eq!(input.next_line().unwrap(), "a\n");
        assert_eq!(input.next_line().unwrap(), "b\n");
        assert_eq!(input.next_line().unwrap(), "");
    }
}
