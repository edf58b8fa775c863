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

//! Quote removal, the final expansion step
//!
//! Quote removal drops the characters that quoted other characters. The
//! parser already removed the quotation marks themselves; what remains at
//! this stage are the zero-width quoting marks the expansion inserted to
//! keep empty quoted fields alive.

use super::attr::AttrChar;

/// Removes quoting characters, yielding the final field value.
#[must_use]
pub fn remove_quotes(chars: &[AttrChar]) -> String {
    chars
        .iter()
        .filter(|c| !c.is_quoting)
        .map(|c| c.value)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::attr::Origin;

    #[test]
    fn quoting_characters_are_dropped() {
        let chars = vec![
            AttrChar::quoting_mark(),
            AttrChar {
                value: 'a',
                origin: Origin::Literal,
                is_quoted: true,
                is_quoting: false,
            },
            AttrChar::plain('b'),
        ];
        assert_eq!(remove_quotes(&chars), "ab");
    }

    #[test]
    fn empty_quoted_field_becomes_empty_string() {
        let chars = vec![AttrChar::quoting_mark()];
        assert_eq!(remove_quotes(&chars), "");
    }
}
