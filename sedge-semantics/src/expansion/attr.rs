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

//! Characters with attributes
//!
//! The initial expansion produces [`AttrChar`]s rather than plain
//! characters. The attributes carry the quoting information that later
//! stages need: field splitting must not split quoted characters, pathname
//! expansion must treat quoted metacharacters literally, and quote removal
//! must know which characters were quotation marks. Quoting would
//! otherwise be lost the moment expansion flattens a word to text.

/// Origin of a character
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Origin {
    /// The character appeared in the original word.
    Literal,
    /// The character resulted from a parameter expansion, command
    /// substitution, or arithmetic expansion.
    SoftExpansion,
    /// The character resulted from a tilde expansion.
    ///
    /// Such characters are exempt from field splitting and pathname
    /// expansion.
    HardExpansion,
}

/// Character with attributes
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AttrChar {
    /// Character value
    pub value: char,
    /// Where the character came from
    pub origin: Origin,
    /// Whether the character is quoted by another character
    pub is_quoted: bool,
    /// Whether the character quotes other characters
    ///
    /// A quoting character carries no value of its own and is dropped by
    /// quote removal. An empty quoted string is represented by a single
    /// quoting character, which keeps the field from disappearing in
    /// field splitting.
    pub is_quoting: bool,
}

impl AttrChar {
    /// Creates an unquoted literal character.
    #[must_use]
    pub fn plain(value: char) -> Self {
        AttrChar {
            value,
            origin: Origin::Literal,
            is_quoted: false,
            is_quoting: false,
        }
    }

    /// Creates a zero-width quoting mark.
    ///
    /// The mark keeps an otherwise empty quoted field alive through field
    /// splitting and is removed by quote removal.
    #[must_use]
    pub fn quoting_mark() -> Self {
        AttrChar {
            value: '"',
            origin: Origin::Literal,
            is_quoted: false,
            is_quoting: true,
        }
    }
}

/// Extends a character sequence from a string, with uniform attributes.
pub fn extend_from_str(
    output: &mut Vec<AttrChar>,
    s: &str,
    origin: Origin,
    is_quoted: bool,
) {
    output.extend(s.chars().map(|value| AttrChar {
        value,
        origin,
        is_quoted,
        is_quoting: false,
    }));
}

/// Converts attributed characters back to a plain string, including
/// quoting characters.
#[must_use]
pub fn to_string(chars: &[AttrChar]) -> String {
    chars.iter().map(|c| c.value).collect()
}
