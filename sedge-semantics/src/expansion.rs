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

//! Word expansion
//!
//! Expansion turns [`Word`]s into [`Field`]s in the POSIX-prescribed
//! order: tilde expansion, then parameter expansion, command
//! substitution, and arithmetic expansion ([`initial`]), then field
//! splitting on `$IFS` ([`split`]), then pathname expansion ([`glob`]),
//! and finally quote removal.
//!
//! [`expand_words`] performs the whole pipeline for command words.
//! Contexts that expand to exactly one field (assignment values,
//! redirection operands, case subjects, here-document lines) use
//! [`expand_word`], which skips field splitting and pathname expansion.

mod arith;
pub mod attr;
mod command_subst;
mod glob;
mod initial;
mod quote_removal;
mod split;

pub use self::arith::ArithVarError;
pub use self::attr::{AttrChar, Origin};
pub use self::split::Ifs;

use nix::errno::Errno;
use sedge_env::semantics::Field;
use sedge_env::variable::{AssignError, IFS};
use sedge_env::Env;
use sedge_fnmatch::PatternChar;
use sedge_syntax::source::Location;
use sedge_syntax::syntax::Word;
use thiserror::Error as ThisError;

/// Types of errors that may occur in word expansion
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ErrorCause {
    /// An unset parameter was expanded under `nounset`.
    #[error("unset parameter `{name}`")]
    UnsetParameter {
        /// Name of the parameter
        name: String,
    },
    /// A `${name:?}` expansion found the parameter unset or empty.
    #[error("{}: {}", name, if message.is_empty() { "parameter unset or empty" } else { message.as_str() })]
    VacantParameter {
        /// Name of the parameter
        name: String,
        /// Custom message from the operator argument
        message: String,
    },
    /// A `${name=word}` expansion names a parameter that cannot be
    /// assigned.
    #[error("parameter `{name}` cannot be assigned")]
    NonassignableParameter {
        /// Name of the parameter
        name: String,
    },
    /// An assignment during expansion hit a readonly variable.
    #[error(transparent)]
    AssignReadOnly(#[from] AssignError),
    /// An arithmetic expansion failed.
    #[error("arithmetic error: {0}")]
    Arith(sedge_arith::ErrorCause<ArithVarError>),
    /// A command substitution could not be set up.
    #[error("cannot perform command substitution: {0}")]
    CommandSubst(Errno),
}

/// Explanation of an expansion failure
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{cause}")]
pub struct Error {
    /// Cause of the error
    pub cause: ErrorCause,
    /// Position of the word the error occurred in
    pub location: Location,
}

/// Result of expansion
pub type Result<T> = std::result::Result<T, Error>;

/// Expands command words to fields.
///
/// Every expansion stage applies: a word may expand to any number of
/// fields, including none.
pub fn expand_words(env: &mut Env, words: &[Word]) -> Result<Vec<Field>> {
    let mut fields = Vec::new();
    for word in words {
        let mut chars = Vec::new();
        initial::expand_word_attrs(env, word, false, &mut chars)?;

        // The IFS value is read after the initial expansion so an
        // assignment in a preceding command applies.
        let ifs_value = env.variables.value(IFS).map(str::to_string);
        let ifs = match &ifs_value {
            None => Ifs::default(),
            Some(value) => Ifs::new(value),
        };

        let origin = *word.location();
        for field_chars in split::split(chars, &ifs) {
            if env.options.is_on(sedge_env::option::Option::Glob) {
                for value in glob::expand_field(env, &field_chars) {
                    fields.push(Field { value, origin });
                }
            } else {
                fields.push(Field {
                    value: quote_removal::remove_quotes(&field_chars),
                    origin,
                });
            }
        }
    }
    Ok(fields)
}

/// Expands a word to exactly one field.
///
/// Field splitting and pathname expansion do not apply. This is the
/// expansion for assignment values, redirection operands, case subjects,
/// and here-document contents.
pub fn expand_word(env: &mut Env, word: &Word) -> Result<Field> {
    expand_single(env, word, false)
}

/// Expands an assignment value to one field, with tilde expansion also
/// after unquoted colons.
pub fn expand_assignment_value(env: &mut Env, word: &Word) -> Result<Field> {
    expand_single(env, word, true)
}

fn expand_single(env: &mut Env, word: &Word, assignment: bool) -> Result<Field> {
    let mut chars = Vec::new();
    initial::expand_word_attrs(env, word, assignment, &mut chars)?;
    Ok(Field {
        value: quote_removal::remove_quotes(&chars),
        origin: *word.location(),
    })
}

/// Expands a word to pattern characters, for `case` pattern matching.
///
/// Quoted characters become literal pattern characters, so a quoted `*`
/// matches an asterisk rather than anything.
pub fn expand_pattern(env: &mut Env, word: &Word) -> Result<Vec<PatternChar>> {
    let mut chars = Vec::new();
    initial::expand_word_attrs(env, word, false, &mut chars)?;
    Ok(chars
        .iter()
        .filter(|c| !c.is_quoting)
        .map(|c| {
            if c.is_quoted || c.origin == Origin::HardExpansion {
                PatternChar::Literal(c.value)
            } else {
                PatternChar::Normal(c.value)
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sedge_env::variable::Attrs;

    fn word(code: &str) -> Word {
        code.parse().unwrap()
    }

    fn env_with(vars: &[(&str, &str)]) -> Env {
        let mut env = Env::new();
        for (name, value) in vars {
            env.variables
                .assign(*name, *value, Attrs::empty())
                .unwrap();
        }
        env
    }

    fn expanded(env: &mut Env, code: &str) -> Vec<String> {
        expand_words(env, &[word(code)])
            .unwrap()
            .into_iter()
            .map(|field| field.value)
            .collect()
    }

    #[test]
    fn literal_word_is_one_field() {
        let mut env = Env::new();
        assert_eq!(expanded(&mut env, "hello"), ["hello"]);
    }

    #[test]
    fn parameter_expansion_splits_fields() {
        let mut env = env_with(&[("x", "a b  c")]);
        assert_eq!(expanded(&mut env, "$x"), ["a", "b", "c"]);
    }

    #[test]
    fn quoted_expansion_does_not_split() {
        let mut env = env_with(&[("x", "a b")]);
        assert_eq!(expanded(&mut env, "\"$x\""), ["a b"]);
    }

    #[test]
    fn single_quoted_word_is_never_expanded() {
        let mut env = env_with(&[("x", "value")]);
        assert_eq!(expanded(&mut env, "'$x'"), ["$x"]);
    }

    #[test]
    fn unset_parameter_expands_to_nothing() {
        let mut env = Env::new();
        assert_eq!(expanded(&mut env, "$nope"), Vec::<String>::new());
        assert_eq!(expanded(&mut env, "\"$nope\""), [""]);
    }

    #[test]
    fn nounset_makes_unset_parameter_an_error() {
        let mut env = Env::new();
        env.options
            .set(sedge_env::option::Option::Unset, sedge_env::option::State::Off);
        let error = expand_words(&mut env, &[word("$nope")]).unwrap_err();
        assert_eq!(
            error.cause,
            ErrorCause::UnsetParameter {
                name: "nope".to_string()
            }
        );
    }

    #[test]
    fn empty_ifs_yields_one_field() {
        let mut env = env_with(&[("IFS", ""), ("x", "a b c")]);
        assert_eq!(expanded(&mut env, "$x"), ["a b c"]);
    }

    #[test]
    fn non_whitespace_ifs_separators() {
        let mut env = env_with(&[("IFS", ":"), ("x", "a::b")]);
        assert_eq!(expanded(&mut env, "$x"), ["a", "", "b"]);
    }

    #[test]
    fn default_value_operator() {
        let mut env = env_with(&[("empty", "")]);
        assert_eq!(expanded(&mut env, "${unset_var-default}"), ["default"]);
        assert_eq!(expanded(&mut env, "${empty-default}"), Vec::<String>::new());
        assert_eq!(expanded(&mut env, "${empty:-default}"), ["default"]);
    }

    #[test]
    fn assign_default_operator() {
        let mut env = Env::new();
        assert_eq!(expanded(&mut env, "${x:=assigned}"), ["assigned"]);
        assert_eq!(env.variables.value("x"), Some("assigned"));
        // Already set now, so the operator does not reassign.
        assert_eq!(expanded(&mut env, "${x:=other}"), ["assigned"]);
    }

    #[test]
    fn error_operator() {
        let mut env = Env::new();
        let error = expand_words(&mut env, &[word("${x:?custom message}")]).unwrap_err();
        assert_eq!(
            error.cause,
            ErrorCause::VacantParameter {
                name: "x".to_string(),
                message: "custom message".to_string(),
            }
        );
    }

    #[test]
    fn alternative_operator() {
        let mut env = env_with(&[("set_var", "value")]);
        assert_eq!(expanded(&mut env, "${set_var:+alt}"), ["alt"]);
        assert_eq!(expanded(&mut env, "${unset_var:+alt}"), Vec::<String>::new());
    }

    #[test]
    fn length_operator() {
        let mut env = env_with(&[("x", "hello")]);
        assert_eq!(expanded(&mut env, "${#x}"), ["5"]);
    }

    #[test]
    fn trim_operators() {
        let mut env = env_with(&[("path", "/usr/local/bin")]);
        assert_eq!(expanded(&mut env, "${path%/*}"), ["/usr/local"]);
        assert_eq!(expanded(&mut env, "${path%%/*}"), Vec::<String>::new());
        assert_eq!(expanded(&mut env, "${path#*/}"), ["usr/local/bin"]);
        assert_eq!(expanded(&mut env, "${path##*/}"), ["bin"]);
    }

    #[test]
    fn trim_with_quoted_pattern_is_literal() {
        let mut env = env_with(&[("x", "a*b")]);
        assert_eq!(expanded(&mut env, "${x%'*b'}"), ["a"]);
    }

    #[test]
    fn arithmetic_expansion() {
        let mut env = env_with(&[("n", "6")]);
        assert_eq!(expanded(&mut env, "$((n * 7))"), ["42"]);
    }

    #[test]
    fn tilde_expansion_uses_home() {
        let mut env = env_with(&[("HOME", "/home/sedge")]);
        assert_eq!(expanded(&mut env, "~"), ["/home/sedge"]);
        assert_eq!(expanded(&mut env, "~/bin"), ["/home/sedge/bin"]);
        // Quoted tildes are literal.
        assert_eq!(expanded(&mut env, "'~'"), ["~"]);
    }

    #[test]
    fn tilde_expansion_in_assignment_value() {
        let mut env = env_with(&[("HOME", "/home/sedge")]);
        let value = expand_assignment_value(&mut env, &word("~/bin:~/sbin")).unwrap();
        assert_eq!(value.value, "/home/sedge/bin:/home/sedge/sbin");
    }

    #[test]
    fn special_parameter_question_mark() {
        let mut env = Env::new();
        env.exit_status = sedge_env::semantics::ExitStatus(42);
        assert_eq!(expanded(&mut env, "$?"), ["42"]);
    }

    #[test]
    fn positional_parameters() {
        let mut env = Env::new();
        env.arguments = vec!["one".to_string(), "two words".to_string()];
        assert_eq!(expanded(&mut env, "$#"), ["2"]);
        assert_eq!(expanded(&mut env, "$1"), ["one"]);
        assert_eq!(expanded(&mut env, "$2"), ["two", "words"]);
        assert_eq!(expanded(&mut env, "\"$2\""), ["two words"]);
        assert_eq!(expanded(&mut env, "$3"), Vec::<String>::new());
    }

    #[test]
    fn quoted_at_expands_to_one_field_per_parameter() {
        let mut env = Env::new();
        env.arguments = vec!["a b".to_string(), "c".to_string()];
        assert_eq!(expanded(&mut env, "\"$@\""), ["a b", "c"]);
    }

    #[test]
    fn quoted_at_with_no_parameters_expands_to_no_fields() {
        let mut env = Env::new();
        assert_eq!(expanded(&mut env, "\"$@\""), Vec::<String>::new());
    }

    #[test]
    fn quoted_star_joins_with_first_ifs_character() {
        let mut env = env_with(&[("IFS", ":")]);
        env.arguments = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(expanded(&mut env, "\"$*\""), ["a:b:c"]);
    }

    #[test]
    fn expand_word_does_not_split() {
        let mut env = env_with(&[("x", "a b")]);
        let field = expand_word(&mut env, &word("$x")).unwrap();
        assert_eq!(field.value, "a b");
    }

    #[test]
    fn pattern_expansion_marks_quoted_characters_literal() {
        let mut env = Env::new();
        let chars = expand_pattern(&mut env, &word("a'*'?")).unwrap();
        assert_eq!(
            chars,
            [
                PatternChar::Normal('a'),
                PatternChar::Literal('*'),
                PatternChar::Normal('?'),
            ]
        );
    }
}
