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

//! Syntax parser for the shell command language
//!
//! This module implements a streaming, single-pass recursive-descent parser.
//! There is no separate tokenizer: lookahead works by peeking into a
//! character buffer that is lazily refilled from the [`Input`], and each
//! grammar production inspects and consumes characters directly. See
//! [`Parser`] for the parsing primitives and the submodules for the grammar
//! productions.
//!
//! The simplest way to parse a complete script is the [`FromStr`]
//! implementation on [`Program`]:
//!
//! ```
//! # use sedge_syntax::syntax::Program;
//! let program: Program = "echo hello | tr a-z A-Z".parse().unwrap();
//! assert_eq!(program.body.len(), 1);
//! ```
//!
//! To parse with alias substitution or from incremental input, build a
//! [`Parser`] explicitly:
//!
//! ```
//! # use sedge_syntax::alias::AliasSet;
//! # use sedge_syntax::input::Memory;
//! # use sedge_syntax::parser::Parser;
//! let mut aliases = AliasSet::new();
//! aliases.define("ll", "ls -l");
//! let mut parser = Parser::with_aliases(Box::new(Memory::new("ll")), &aliases);
//! let program = parser.program().unwrap();
//! assert_eq!(program.to_string(), "ls -l");
//! ```
//!
//! [`Input`]: crate::input::Input

mod command;
mod core;
mod error;
mod program;
mod word;

pub use self::core::{is_blank, Parser, Rec};
pub use self::error::{Error, ErrorCause, Result, SyntaxError};
pub use self::word::is_name;

use crate::syntax::{Program, Word};
use std::str::FromStr;

impl FromStr for Program {
    type Err = Error;

    /// Parses a whole program from a string.
    fn from_str(s: &str) -> Result<Program> {
        let mut parser = Parser::with_code(s);
        parser.program()
    }
}

impl FromStr for Word {
    type Err = Error;

    /// Parses a single word from a string.
    ///
    /// The whole string must be one word; trailing characters are an error.
    /// An empty string parses as an empty unquoted word.
    fn from_str(s: &str) -> Result<Word> {
        let mut parser = Parser::with_code(s);
        let location = parser.location();
        let word = parser
            .word()?
            .unwrap_or_else(|| Word::from_plain("", location));
        if parser.peek_char()?.is_some() {
            let location = parser.location();
            return parser.raise(SyntaxError::RedundantToken, location);
        }
        Ok(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_from_str() {
        let program: Program = "a; b & c".parse().unwrap();
        assert_eq!(program.body.len(), 3);
    }

    #[test]
    fn word_from_str() {
        let word: Word = "${x:-y}".parse().unwrap();
        assert_eq!(word.to_string(), "${x:-y}");

        let error = "a b".parse::<Word>().unwrap_err();
        assert_eq!(error.location.column.get(), 2);
    }
}
