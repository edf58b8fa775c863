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

//! Initial expansion: tilde, parameter, command, and arithmetic expansion
//!
//! This stage turns a [`Word`] into a sequence of [`AttrChar`]s. Field
//! splitting, pathname expansion, and quote removal operate on that
//! sequence afterwards.

use super::arith;
use super::attr::{extend_from_str, AttrChar, Origin};
use super::command_subst;
use super::{Error, ErrorCause, Result};
use sedge_env::option::Option::Unset;
use sedge_env::variable::{Attrs, IFS};
use sedge_env::Env;
use sedge_fnmatch::{Pattern, PatternChar};
use sedge_syntax::parser::is_name;
use sedge_syntax::syntax::{ParamOp, Word, WordParameter, WordString};

/// Expands a word to attributed characters.
///
/// `assignment` selects assignment-mode tilde expansion, which also
/// applies after unquoted colons in the value.
pub(super) fn expand_word_attrs(
    env: &mut Env,
    word: &Word,
    assignment: bool,
    output: &mut Vec<AttrChar>,
) -> Result<()> {
    match word {
        Word::String(s) if !s.quoted => {
            expand_tilde_string(env, s, assignment, output);
            Ok(())
        }
        Word::List(l) if !l.double_quoted => {
            for (i, child) in l.children.iter().enumerate() {
                match child {
                    // Tilde expansion applies only at the start of the
                    // word (or after a colon in an assignment).
                    Word::String(s) if !s.quoted && (i == 0 || assignment) => {
                        let start_of_word = i == 0;
                        expand_tilde_string_at(env, s, assignment, start_of_word, output);
                    }
                    _ => expand_unit(env, child, false, output)?,
                }
            }
            Ok(())
        }
        _ => expand_unit(env, word, false, output),
    }
}

/// Expands one word unit, without tilde expansion.
fn expand_unit(env: &mut Env, word: &Word, quoted: bool, output: &mut Vec<AttrChar>) -> Result<()> {
    match word {
        Word::String(s) => {
            extend_from_str(output, &s.value, Origin::Literal, quoted || s.quoted);
            Ok(())
        }
        Word::Parameter(param) => expand_param(env, param, quoted, output),
        Word::CommandSubst(subst) => {
            let value = command_subst::expand(env, &subst.program, subst.location)?;
            extend_from_str(output, &value, Origin::SoftExpansion, quoted);
            Ok(())
        }
        Word::Arith(arith) => {
            let value = arith::expand(env, &arith.expression, arith.location)?;
            extend_from_str(output, &value, Origin::SoftExpansion, quoted);
            Ok(())
        }
        Word::List(list) => {
            let quoted = quoted || list.double_quoted;
            if list.double_quoted && !contains_at_sign(list.children.as_slice()) {
                // Keep an empty double-quoted word from vanishing in
                // field splitting.
                output.push(AttrChar::quoting_mark());
            }
            for child in &list.children {
                expand_unit(env, child, quoted, output)?;
            }
            Ok(())
        }
    }
}

/// Tests whether any of the words is a `$@` expansion, which has its own
/// empty-field behavior inside double quotes.
fn contains_at_sign(words: &[Word]) -> bool {
    words.iter().any(|word| match word {
        Word::Parameter(p) => p.name == "@",
        Word::List(l) => contains_at_sign(&l.children),
        _ => false,
    })
}

/// Expands a possibly tilde-prefixed literal string at the start of a
/// word.
fn expand_tilde_string(
    env: &mut Env,
    s: &WordString,
    assignment: bool,
    output: &mut Vec<AttrChar>,
) {
    expand_tilde_string_at(env, s, assignment, true, output);
}

fn expand_tilde_string_at(
    env: &mut Env,
    s: &WordString,
    assignment: bool,
    start_of_word: bool,
    output: &mut Vec<AttrChar>,
) {
    let mut rest = s.value.as_str();
    let mut at_start = start_of_word;
    while !rest.is_empty() {
        if at_start && rest.starts_with('~') {
            let end = if assignment {
                rest.find(['/', ':']).unwrap_or(rest.len())
            } else {
                rest.find('/').unwrap_or(rest.len())
            };
            let name = &rest[1..end];
            match tilde_directory(env, name) {
                Some(dir) => extend_from_str(output, &dir, Origin::HardExpansion, false),
                // An unknown user leaves the tilde prefix as is.
                None => extend_from_str(output, &rest[..end], Origin::Literal, false),
            }
            rest = &rest[end..];
        }
        if assignment {
            // In an assignment value, a tilde is also expanded after
            // every unquoted colon.
            match rest.find(':') {
                Some(colon) => {
                    extend_from_str(output, &rest[..=colon], Origin::Literal, false);
                    rest = &rest[colon + 1..];
                    at_start = true;
                }
                None => {
                    extend_from_str(output, rest, Origin::Literal, false);
                    break;
                }
            }
        } else {
            extend_from_str(output, rest, Origin::Literal, false);
            break;
        }
    }
}

/// Resolves a tilde prefix to a directory.
fn tilde_directory(env: &Env, name: &str) -> std::option::Option<String> {
    if name.is_empty() {
        env.variables.value(sedge_env::variable::HOME).map(str::to_string)
    } else {
        env.system
            .getpwnam_dir(name)
            .and_then(|dir| dir.into_os_string().into_string().ok())
    }
}

/// Expands a parameter.
fn expand_param(
    env: &mut Env,
    param: &WordParameter,
    quoted: bool,
    output: &mut Vec<AttrChar>,
) -> Result<()> {
    if param.name == "@" || param.name == "*" {
        return expand_positional_params(env, param.name == "*", quoted, output);
    }

    let value = lookup(env, &param.name);

    if param.op == ParamOp::Length {
        let value = match value {
            Some(value) => value,
            None => check_unset(env, param)?,
        };
        extend_from_str(
            output,
            &value.chars().count().to_string(),
            Origin::SoftExpansion,
            quoted,
        );
        return Ok(());
    }

    // The colon modifier extends the substitution condition from "unset"
    // to "unset or empty".
    let vacant = match &value {
        None => true,
        Some(value) => param.colon && value.is_empty(),
    };

    let value = match param.op {
        ParamOp::None => match value {
            Some(value) => value,
            None => check_unset(env, param)?,
        },
        ParamOp::Default => {
            if vacant {
                return expand_arg(env, param, quoted, output);
            }
            value.unwrap_or_default()
        }
        ParamOp::Assign => {
            if vacant {
                if !is_name(&param.name) {
                    return Err(Error {
                        cause: ErrorCause::NonassignableParameter {
                            name: param.name.clone(),
                        },
                        location: param.location,
                    });
                }
                let new_value = expand_arg_to_string(env, param)?;
                let attrs = all_export_attrs(env);
                env.variables
                    .assign(param.name.clone(), new_value.clone(), attrs)
                    .map_err(|e| Error {
                        cause: ErrorCause::AssignReadOnly(e),
                        location: param.location,
                    })?;
                new_value
            } else {
                value.unwrap_or_default()
            }
        }
        ParamOp::Error => {
            if vacant {
                let message = match &param.arg {
                    Some(_) => expand_arg_to_string(env, param)?,
                    None => String::new(),
                };
                return Err(Error {
                    cause: ErrorCause::VacantParameter {
                        name: param.name.clone(),
                        message,
                    },
                    location: param.location,
                });
            }
            value.unwrap_or_default()
        }
        ParamOp::Alternative => {
            // The alternative substitutes when the parameter is *not*
            // vacant.
            if vacant {
                return Ok(());
            }
            return expand_arg(env, param, quoted, output);
        }
        ParamOp::RemoveSmallestSuffix
        | ParamOp::RemoveLargestSuffix
        | ParamOp::RemoveSmallestPrefix
        | ParamOp::RemoveLargestPrefix => {
            let value = match value {
                Some(value) => value,
                None => check_unset(env, param)?,
            };
            trim_value(env, param, value)?
        }
        ParamOp::Length => unreachable!("handled above"),
    };

    extend_from_str(output, &value, Origin::SoftExpansion, quoted);
    Ok(())
}

/// Handles expansion of an unset parameter without a substituting
/// operator: an error under `nounset`, an empty string otherwise.
fn check_unset(env: &Env, param: &WordParameter) -> Result<String> {
    if env.options.is_on(Unset) {
        Ok(String::new())
    } else {
        Err(Error {
            cause: ErrorCause::UnsetParameter {
                name: param.name.clone(),
            },
            location: param.location,
        })
    }
}

/// Expands the operator argument into the output.
fn expand_arg(
    env: &mut Env,
    param: &WordParameter,
    quoted: bool,
    output: &mut Vec<AttrChar>,
) -> Result<()> {
    match &param.arg {
        Some(arg) => expand_unit(env, arg, quoted, output),
        None => Ok(()),
    }
}

/// Expands the operator argument to a plain string, for assignment and
/// error messages.
fn expand_arg_to_string(env: &mut Env, param: &WordParameter) -> Result<String> {
    let mut chars = Vec::new();
    expand_arg(env, param, false, &mut chars)?;
    Ok(super::quote_removal::remove_quotes(&chars))
}

/// Applies a `%`, `%%`, `#`, or `##` operator to the value.
fn trim_value(env: &mut Env, param: &WordParameter, value: String) -> Result<String> {
    let mut arg_chars = Vec::new();
    expand_arg(env, param, false, &mut arg_chars)?;
    let pattern_chars: Vec<PatternChar> = arg_chars
        .iter()
        .filter(|c| !c.is_quoting)
        .map(|c| {
            if c.is_quoted {
                PatternChar::Literal(c.value)
            } else {
                PatternChar::Normal(c.value)
            }
        })
        .collect();
    let pattern = match Pattern::parse(pattern_chars) {
        Ok(pattern) => pattern,
        // A malformed pattern matches nothing.
        Err(_) => return Ok(value),
    };

    // Candidate boundaries, in ascending order of the removed length.
    let boundaries: Vec<usize> = value
        .char_indices()
        .map(|(i, _)| i)
        .chain([value.len()])
        .collect();

    match param.op {
        ParamOp::RemoveSmallestPrefix => {
            for &end in &boundaries {
                if pattern.is_match(&value[..end]) {
                    return Ok(value[end..].to_string());
                }
            }
        }
        ParamOp::RemoveLargestPrefix => {
            for &end in boundaries.iter().rev() {
                if pattern.is_match(&value[..end]) {
                    return Ok(value[end..].to_string());
                }
            }
        }
        ParamOp::RemoveSmallestSuffix => {
            for &start in boundaries.iter().rev() {
                if pattern.is_match(&value[start..]) {
                    return Ok(value[..start].to_string());
                }
            }
        }
        ParamOp::RemoveLargestSuffix => {
            for &start in &boundaries {
                if pattern.is_match(&value[start..]) {
                    return Ok(value[..start].to_string());
                }
            }
        }
        _ => unreachable!("not a trim operator"),
    }
    Ok(value)
}

/// Expands `$@` or `$*`.
///
/// The parameters are joined with the first `$IFS` character (a space if
/// `IFS` is unset, nothing if it is empty). For `"$*"` the separator is
/// quoted, producing a single field. For `"$@"` each parameter is quoted
/// on its own while the separators stay splittable, so field splitting
/// yields one field per parameter.
fn expand_positional_params(
    env: &mut Env,
    star: bool,
    quoted: bool,
    output: &mut Vec<AttrChar>,
) -> Result<()> {
    let params: Vec<String> = env.positional_params().to_vec();
    let separator = match env.variables.value(IFS) {
        None => Some(' '),
        Some(ifs) => ifs.chars().next(),
    };
    let quoted_separator = star && quoted;

    for (i, param) in params.iter().enumerate() {
        if i > 0 {
            if let Some(separator) = separator {
                output.push(AttrChar {
                    value: separator,
                    origin: Origin::SoftExpansion,
                    is_quoted: quoted_separator,
                    is_quoting: false,
                });
            }
        }
        if quoted && !star {
            output.push(AttrChar::quoting_mark());
        }
        extend_from_str(output, param, Origin::SoftExpansion, quoted);
    }
    Ok(())
}

/// Resolves a parameter name to its value.
fn lookup(env: &mut Env, name: &str) -> std::option::Option<String> {
    match name {
        "#" => Some(env.positional_params().len().to_string()),
        "?" => Some(env.exit_status.to_string()),
        "-" => Some(option_flags(env)),
        "$" => Some(env.shell_pid.to_string()),
        "!" => env.jobs.last_async_pid().map(|pid| pid.to_string()),
        "0" => Some(env.arg0.clone()),
        _ if name.chars().all(|c| c.is_ascii_digit()) => {
            let index: usize = name.parse().ok()?;
            // Positional parameters are numbered from 1.
            env.positional_params().get(index.checked_sub(1)?).cloned()
        }
        _ => env.variables.value(name).map(str::to_string),
    }
}

/// Builds the value of the special parameter `$-`.
fn option_flags(env: &Env) -> String {
    use sedge_env::option::Option::*;
    use sedge_env::option::State::{Off, On};
    let mut flags = String::new();
    for (letter, option, state) in [
        ('a', AllExport, On),
        ('b', Notify, On),
        ('C', Clobber, Off),
        ('e', ErrExit, On),
        ('f', Glob, Off),
        ('h', PreLookup, On),
        ('i', Interactive, On),
        ('m', Monitor, On),
        ('n', Exec, Off),
        ('u', Unset, Off),
        ('v', Verbose, On),
        ('x', XTrace, On),
    ] {
        if env.options.get(option) == state {
            flags.push(letter);
        }
    }
    flags
}

/// Returns the attributes for a variable assigned during expansion.
pub(crate) fn all_export_attrs(env: &Env) -> Attrs {
    if env.options.is_on(sedge_env::option::Option::AllExport) {
        Attrs::EXPORT
    } else {
        Attrs::empty()
    }
}
