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

//! Field splitting
//!
//! After the initial expansion, the unquoted portions of a word are split
//! into fields on the separators named by `$IFS`. Separator characters
//! divide into whitespace (space, tab, newline) and non-whitespace. A run
//! of whitespace separators is one delimiter; every non-whitespace
//! separator delimits a field of its own, so `a::b` has an empty middle
//! field. Leading and trailing whitespace separators are ignored.

use super::attr::{AttrChar, Origin};
use std::borrow::Cow;

/// Type of characters with respect to field splitting
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum Class {
    /// Character that is not a separator
    NonIfs,
    /// Whitespace separator
    IfsWhitespace,
    /// Separator that is not whitespace
    IfsNonWhitespace,
}

/// Collection of input field separator characters
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ifs<'a> {
    chars: &'a str,
    non_whitespaces: Cow<'a, str>,
}

impl<'a> Ifs<'a> {
    /// String containing the default separators: space, tab, and newline.
    pub const DEFAULT: &'static str = " \t\n";

    /// Creates an `Ifs` from a separator string.
    #[must_use]
    pub fn new(chars: &'a str) -> Self {
        let non_whitespaces = if chars.contains(|c: char| !c.is_whitespace()) {
            Cow::Owned(chars.chars().filter(|c| !c.is_whitespace()).collect())
        } else {
            Cow::Borrowed("")
        };
        Ifs {
            chars,
            non_whitespaces,
        }
    }

    /// Creates an `Ifs` that never splits.
    #[must_use]
    pub fn empty() -> Self {
        Self::new("")
    }

    fn classify(&self, c: char) -> Class {
        if !self.chars.contains(c) {
            Class::NonIfs
        } else if self.non_whitespaces.contains(c) {
            Class::IfsNonWhitespace
        } else {
            Class::IfsWhitespace
        }
    }
}

impl Default for Ifs<'_> {
    /// The default IFS contains a space, tab, and newline.
    fn default() -> Self {
        Self::new(Ifs::DEFAULT)
    }
}

/// Classifies an attributed character.
///
/// Quoted characters and tilde expansion results never split.
fn classify(ifs: &Ifs, c: &AttrChar) -> Class {
    if c.is_quoted || c.is_quoting || c.origin == Origin::HardExpansion {
        Class::NonIfs
    } else {
        ifs.classify(c.value)
    }
}

/// Splits an expanded word into fields.
pub fn split(chars: Vec<AttrChar>, ifs: &Ifs) -> Vec<Vec<AttrChar>> {
    let mut fields = Vec::new();
    let n = chars.len();
    let mut i = 0;

    // Leading whitespace separators are ignored.
    while i < n && classify(ifs, &chars[i]) == Class::IfsWhitespace {
        i += 1;
    }

    while i < n {
        let mut field = Vec::new();
        while i < n && classify(ifs, &chars[i]) == Class::NonIfs {
            field.push(chars[i]);
            i += 1;
        }
        fields.push(field);
        if i >= n {
            break;
        }

        // Consume one delimiter: a whitespace run around at most one
        // non-whitespace separator.
        while i < n && classify(ifs, &chars[i]) == Class::IfsWhitespace {
            i += 1;
        }
        if i < n && classify(ifs, &chars[i]) == Class::IfsNonWhitespace {
            i += 1;
            while i < n && classify(ifs, &chars[i]) == Class::IfsWhitespace {
                i += 1;
            }
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::attr::extend_from_str;

    fn chars(s: &str) -> Vec<AttrChar> {
        let mut result = Vec::new();
        extend_from_str(&mut result, s, Origin::SoftExpansion, false);
        result
    }

    fn values(fields: &[Vec<AttrChar>]) -> Vec<String> {
        fields
            .iter()
            .map(|f| f.iter().map(|c| c.value).collect())
            .collect()
    }

    #[test]
    fn whitespace_separators_collapse() {
        let fields = split(chars("  a \t b  "), &Ifs::default());
        assert_eq!(values(&fields), ["a", "b"]);
    }

    #[test]
    fn empty_input_has_no_fields() {
        let fields = split(chars(""), &Ifs::default());
        assert_eq!(values(&fields), Vec::<String>::new());

        let fields = split(chars("   "), &Ifs::default());
        assert_eq!(values(&fields), Vec::<String>::new());
    }

    #[test]
    fn non_whitespace_separator_delimits_each_occurrence() {
        let ifs = Ifs::new(": ");
        assert_eq!(values(&split(chars("a:b"), &ifs)), ["a", "b"]);
        assert_eq!(values(&split(chars("a::b"), &ifs)), ["a", "", "b"]);
        assert_eq!(values(&split(chars(":a"), &ifs)), ["", "a"]);
        assert_eq!(values(&split(chars("a:"), &ifs)), ["a"]);
        assert_eq!(values(&split(chars("a : b"), &ifs)), ["a", "b"]);
    }

    #[test]
    fn empty_ifs_never_splits() {
        let fields = split(chars("a b c"), &Ifs::empty());
        assert_eq!(values(&fields), ["a b c"]);
    }

    #[test]
    fn quoted_characters_do_not_split() {
        let mut input = chars("a");
        input.push(AttrChar {
            value: ' ',
            origin: Origin::Literal,
            is_quoted: true,
            is_quoting: false,
        });
        input.extend(chars("b c"));
        let fields = split(input, &Ifs::default());
        assert_eq!(values(&fields), ["a b", "c"]);
    }

    #[test]
    fn quoting_mark_keeps_an_empty_field() {
        let input = vec![AttrChar::quoting_mark()];
        let fields = split(input, &Ifs::default());
        assert_eq!(fields.len(), 1);
    }
}
