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

//! This crate performs pattern matching with shell globbing patterns.
//!
//! A [`Pattern`] is compiled from a sequence of [`PatternChar`]s and
//! matches a whole string, `fnmatch`-style. The supported syntax is:
//!
//! - `?` matches any single character
//! - `*` matches any (possibly empty) character sequence
//! - `[...]` matches a bracket expression, with ranges (`a-z`), complement
//!   (`[!...]`), and character classes (`[:alpha:]`)
//!
//! Matching works by compiling the pattern to a regular expression, so the
//! heavy lifting is done by the [`regex`] crate. Characters that entered
//! the pattern through quoting are represented as
//! [`Literal`](PatternChar::Literal) and never act as pattern syntax:
//!
//! ```
//! # use sedge_fnmatch::{Pattern, with_escape, without_escape};
//! let pattern = Pattern::parse(without_escape("*.rs")).unwrap();
//! assert!(pattern.is_match("lib.rs"));
//! assert!(!pattern.is_match("lib.rc"));
//!
//! // With an escape, the asterisk is literal.
//! let pattern = Pattern::parse(with_escape(r"\*.rs")).unwrap();
//! assert!(!pattern.is_match("lib.rs"));
//! assert!(pattern.is_match("*.rs"));
//! ```
//!
//! The current implementation has no locale support. Character classes
//! match ASCII characters only, and collating symbols (`[.x.]`) and
//! equivalence classes (`[=x=]`) match their character sequence literally.

use regex::Regex;
use thiserror::Error;

/// Character in a pattern
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PatternChar {
    /// Character that may have a special meaning in the pattern
    Normal(char),
    /// Character that always stands for itself
    ///
    /// Quoted characters in a shell word become literals, so a quoted `*`
    /// does not act as a wildcard.
    Literal(char),
}

impl PatternChar {
    /// Returns the character value, disregarding its class.
    #[must_use]
    pub fn char_value(self) -> char {
        match self {
            PatternChar::Normal(c) | PatternChar::Literal(c) => c,
        }
    }
}

/// Converts a string to pattern characters, treating every character as
/// possibly special.
pub fn without_escape(pattern: &str) -> impl Iterator<Item = PatternChar> + Clone + '_ {
    pattern.chars().map(PatternChar::Normal)
}

/// Converts a string to pattern characters, resolving backslash escapes.
///
/// A backslash makes the next character [`Literal`](PatternChar::Literal).
/// A trailing backslash is a literal backslash.
pub fn with_escape(pattern: &str) -> impl Iterator<Item = PatternChar> + Clone + '_ {
    let mut chars = pattern.chars();
    std::iter::from_fn(move || match chars.next()? {
        '\\' => match chars.next() {
            Some(c) => Some(PatternChar::Literal(c)),
            None => Some(PatternChar::Literal('\\')),
        },
        c => Some(PatternChar::Normal(c)),
    })
}

/// Error in compiling a pattern
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The underlying regular expression failed to build.
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

/// Compiled globbing pattern
///
/// A pattern matches a whole string, not a substring. Use
/// [`is_match`](Self::is_match) to test a candidate.
#[derive(Clone, Debug)]
pub struct Pattern {
    body: Body,
}

#[derive(Clone, Debug)]
enum Body {
    /// Pattern with no special characters, compared by string equality
    Literal(String),
    /// Pattern compiled to a regular expression
    Regex(Regex),
}

impl Pattern {
    /// Compiles a pattern.
    pub fn parse<I>(chars: I) -> Result<Pattern, Error>
    where
        I: IntoIterator<Item = PatternChar>,
    {
        let chars: Vec<PatternChar> = chars.into_iter().collect();

        if let Some(literal) = as_literal(&chars) {
            return Ok(Pattern {
                body: Body::Literal(literal),
            });
        }

        let mut regex = String::from(r"\A(?s:");
        let mut i = 0;
        while i < chars.len() {
            match chars[i] {
                PatternChar::Normal('?') => regex.push('.'),
                PatternChar::Normal('*') => regex.push_str(".*"),
                PatternChar::Normal('[') => {
                    match parse_bracket(&chars[i..], &mut regex) {
                        Some(consumed) => {
                            i += consumed;
                            continue;
                        }
                        // No closing bracket; the [ is an ordinary
                        // character.
                        None => push_literal(&mut regex, '['),
                    }
                }
                PatternChar::Normal(c) | PatternChar::Literal(c) => push_literal(&mut regex, c),
            }
            i += 1;
        }
        regex.push_str(r")\z");

        Ok(Pattern {
            body: Body::Regex(Regex::new(&regex)?),
        })
    }

    /// Tests whether the pattern matches the whole given string.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        match &self.body {
            Body::Literal(literal) => literal == text,
            Body::Regex(regex) => regex.is_match(text),
        }
    }

    /// Returns the pattern as a plain string if it contains no special
    /// characters.
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        match &self.body {
            Body::Literal(literal) => Some(literal),
            Body::Regex(_) => None,
        }
    }
}

/// Returns the literal string form of a pattern that contains no special
/// characters.
fn as_literal(chars: &[PatternChar]) -> Option<String> {
    if chars
        .iter()
        .any(|c| matches!(c, PatternChar::Normal('?' | '*' | '[')))
    {
        None
    } else {
        Some(chars.iter().map(|c| c.char_value()).collect())
    }
}

/// Appends a literal character to the regular expression, escaping it if
/// it would otherwise be a metacharacter.
fn push_literal(regex: &mut String, c: char) {
    if regex_syntax::is_meta_character(c) {
        regex.push('\\');
    }
    regex.push(c);
}

/// Translates a bracket expression to a regular expression class.
///
/// `chars` starts at the opening `[`. On success, appends the class to
/// `regex` and returns the number of pattern characters consumed. Returns
/// `None` if the expression has no closing `]`.
fn parse_bracket(chars: &[PatternChar], regex: &mut String) -> Option<usize> {
    let mut class = String::from("[");
    let mut i = 1;

    if let Some(PatternChar::Normal('!' | '^')) = chars.get(i) {
        class.push('^');
        i += 1;
    }

    let mut first_item = true;
    loop {
        match chars.get(i)? {
            PatternChar::Normal(']') if !first_item => {
                class.push(']');
                regex.push_str(&class);
                return Some(i + 1);
            }
            &PatternChar::Normal('[') => {
                // [:class:], [.symbol.] and [=equivalence=]
                match chars.get(i + 1).map(|c| c.char_value()) {
                    Some(':') => {
                        let (name, end) = scan_until(chars, i + 2, ':')?;
                        class.push_str("[:");
                        class.push_str(&name);
                        class.push_str(":]");
                        i = end;
                    }
                    Some(kind @ ('.' | '=')) => {
                        // Not locale-aware; the symbol matches itself.
                        let (name, end) = scan_until(chars, i + 2, kind)?;
                        for c in name.chars() {
                            push_class_char(&mut class, c);
                        }
                        i = end;
                    }
                    _ => {
                        push_class_char(&mut class, '[');
                        i += 1;
                    }
                }
            }
            &PatternChar::Normal('-')
                if !first_item && !matches!(chars.get(i + 1), Some(PatternChar::Normal(']'))) =>
            {
                class.push('-');
                i += 1;
            }
            &(PatternChar::Normal(c) | PatternChar::Literal(c)) => {
                push_class_char(&mut class, c);
                i += 1;
            }
        }
        first_item = false;
    }
}

/// Scans a `[:...:]`-style item, returning its name and the index just
/// past the closing `]`.
fn scan_until(chars: &[PatternChar], start: usize, delimiter: char) -> Option<(String, usize)> {
    let mut name = String::new();
    let mut i = start;
    loop {
        let c = chars.get(i)?.char_value();
        if c == delimiter && chars.get(i + 1).map(|c| c.char_value()) == Some(']') {
            return Some((name, i + 2));
        }
        name.push(c);
        i += 1;
    }
}

/// Appends a character to a class, escaping class metacharacters.
fn push_class_char(class: &mut String, c: char) {
    if matches!(c, '[' | ']' | '\\' | '^' | '-' | '&' | '~') {
        class.push('\\');
    }
    class.push(c);
}
