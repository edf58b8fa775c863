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

//! Pathname expansion
//!
//! A field containing an unquoted `*`, `?`, or `[` is matched against
//! pathnames, component by component. Matches are produced in directory
//! order without sorting, and a field that matches nothing stays as it is
//! rather than disappearing. Names starting with a period are matched
//! only by patterns whose corresponding component starts with a literal
//! period.
//!
//! Directory contents are read through the environment's
//! [system interface](sedge_env::system::RealSystem), like every other
//! system access in the shell.

use super::attr::{AttrChar, Origin};
use super::quote_removal::remove_quotes;
use sedge_env::Env;
use sedge_fnmatch::{Pattern, PatternChar};

/// Tests whether the field contains an unquoted pattern character.
pub(super) fn has_pattern_chars(field: &[AttrChar]) -> bool {
    field.iter().any(|c| {
        !c.is_quoted
            && !c.is_quoting
            && c.origin != Origin::HardExpansion
            && matches!(c.value, '*' | '?' | '[')
    })
}

/// Performs pathname expansion on one field.
///
/// Returns the matched pathnames, or the field itself (with quotes
/// removed) if nothing matches or the field has no pattern characters.
pub(super) fn expand_field(env: &Env, field: &[AttrChar]) -> Vec<String> {
    if !has_pattern_chars(field) {
        return vec![remove_quotes(field)];
    }

    // Split into slash-separated components. Quoted slashes are path
    // separators too; quoting only affects pattern characters.
    let mut components: Vec<Vec<PatternChar>> = vec![Vec::new()];
    for c in field {
        if c.is_quoting {
            continue;
        }
        if c.value == '/' {
            components.push(Vec::new());
        } else if c.is_quoted || c.origin == Origin::HardExpansion {
            components.last_mut().unwrap().push(PatternChar::Literal(c.value));
        } else {
            components.last_mut().unwrap().push(PatternChar::Normal(c.value));
        }
    }

    let absolute = components.first().is_some_and(Vec::is_empty) && components.len() > 1;
    if absolute {
        components.remove(0);
    }

    // Candidate paths accumulate as each component is matched against
    // directory entries. The stored strings do not have a trailing slash.
    let mut candidates: Vec<String> = vec![if absolute {
        "/".to_string()
    } else {
        String::new()
    }];

    for component in &components {
        if component.is_empty() {
            // A trailing or doubled slash selects directories only.
            candidates.retain(|path| env.system.is_directory(&join(path, "")));
            continue;
        }

        let literal: Option<String> = to_literal(component);
        let mut next = Vec::new();
        match literal {
            // A component with no pattern characters does not need to be
            // matched against directory entries; it only has to exist.
            Some(name) => {
                for path in &candidates {
                    let full = join(path, &name);
                    if env.system.path_exists(&full) {
                        next.push(full);
                    }
                }
            }
            None => {
                let Ok(pattern) = Pattern::parse(component.iter().copied()) else {
                    return vec![remove_quotes(field)];
                };
                let match_hidden = component.first().is_some_and(|c| c.char_value() == '.');
                for path in &candidates {
                    let dir = if path.is_empty() { "." } else { path.as_str() };
                    let Ok(names) = env.system.read_dir(dir) else {
                        continue;
                    };
                    for name in names {
                        if name.starts_with('.') && !match_hidden {
                            continue;
                        }
                        if pattern.is_match(&name) {
                            next.push(join(path, &name));
                        }
                    }
                }
            }
        }
        candidates = next;
        if candidates.is_empty() {
            break;
        }
    }

    if candidates.is_empty() || (candidates.len() == 1 && candidates[0].is_empty()) {
        vec![remove_quotes(field)]
    } else {
        candidates
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else if path.ends_with('/') {
        format!("{path}{name}")
    } else {
        format!("{path}/{name}")
    }
}

/// Returns the component as a literal name if it has no pattern
/// characters.
fn to_literal(component: &[PatternChar]) -> Option<String> {
    if component
        .iter()
        .any(|c| matches!(c, PatternChar::Normal('*' | '?' | '[')))
    {
        None
    } else {
        Some(
            component
                .iter()
                .map(|c| match c {
                    PatternChar::Normal(c) | PatternChar::Literal(c) => c,
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expansion::attr::extend_from_str;
    use std::fs::File;

    fn field(s: &str) -> Vec<AttrChar> {
        let mut result = Vec::new();
        extend_from_str(&mut result, s, Origin::Literal, false);
        result
    }

    #[test]
    fn field_without_pattern_characters_is_untouched() {
        let env = Env::new();
        assert_eq!(expand_field(&env, &field("plain")), ["plain"]);
    }

    #[test]
    fn quoted_pattern_characters_do_not_glob() {
        let env = Env::new();
        let mut chars = field("x");
        chars.push(AttrChar {
            value: '*',
            origin: Origin::Literal,
            is_quoted: true,
            is_quoting: false,
        });
        assert!(!has_pattern_chars(&chars));
        assert_eq!(expand_field(&env, &chars), ["x*"]);
    }

    #[test]
    fn matching_files_in_a_directory() {
        let env = Env::new();
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("a.txt")).unwrap();
        File::create(dir.path().join("b.txt")).unwrap();
        File::create(dir.path().join("c.log")).unwrap();

        let pattern = format!("{}/*.txt", dir.path().display());
        let mut results = expand_field(&env, &field(&pattern));
        results.sort();
        assert_eq!(
            results,
            [
                format!("{}/a.txt", dir.path().display()),
                format!("{}/b.txt", dir.path().display()),
            ]
        );
    }

    #[test]
    fn unmatched_pattern_survives_literally() {
        let env = Env::new();
        let dir = tempfile::tempdir().unwrap();
        let pattern = format!("{}/*.nope", dir.path().display());
        assert_eq!(expand_field(&env, &field(&pattern)), [pattern]);
    }

    #[test]
    fn hidden_files_need_a_literal_period() {
        let env = Env::new();
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join(".hidden")).unwrap();
        File::create(dir.path().join("visible")).unwrap();

        let pattern = format!("{}/*", dir.path().display());
        let results = expand_field(&env, &field(&pattern));
        assert_eq!(results, [format!("{}/visible", dir.path().display())]);

        let pattern = format!("{}/.*", dir.path().display());
        let results = expand_field(&env, &field(&pattern));
        assert_eq!(results, [format!("{}/.hidden", dir.path().display())]);
    }

    #[test]
    fn intermediate_directory_pattern() {
        let env = Env::new();
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        File::create(dir.path().join("sub/file")).unwrap();

        let pattern = format!("{}/s*/file", dir.path().display());
        let results = expand_field(&env, &field(&pattern));
        assert_eq!(results, [format!("{}/sub/file", dir.path().display())]);
    }
}
