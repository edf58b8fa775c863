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

//! Type definitions for shell options
//!
//! This module defines the [`OptionSet`] struct, a map from [`Option`] to
//! [`State`]. Options are named positively (`Clobber`, `Glob`, `Exec`), so
//! the traditional negative names parse as the `Off` state: `noclobber`
//! means `Clobber` off.
//!
//! `OptionSet` merely stores the states. Changing shell behavior according
//! to them is the executor's business.

use enumset::EnumSet;
use enumset::EnumSetType;
use std::borrow::Cow;
use std::fmt::Display;
use std::fmt::Formatter;
use std::ops::Not;
use std::str::FromStr;

/// State of an option: either enabled or disabled.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum State {
    /// Enabled
    On,
    /// Disabled
    Off,
}

pub use State::*;

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            On => "on",
            Off => "off",
        };
        s.fmt(f)
    }
}

impl Not for State {
    type Output = Self;
    #[must_use]
    fn not(self) -> Self {
        match self {
            On => Off,
            Off => On,
        }
    }
}

/// Shell option
#[derive(Clone, Copy, Debug, EnumSetType, Eq, Hash, PartialEq)]
#[enumset(no_super_impls)]
#[non_exhaustive]
pub enum Option {
    /// Exports all variables when they are assigned. (`-a`)
    AllExport,
    /// Allows overwriting an existing file with the `>` redirection.
    /// (off = `-C`, `noclobber`)
    Clobber,
    /// Makes the shell exit when a command returns a non-zero exit status.
    /// (`-e`)
    ErrExit,
    /// Makes the shell actually run commands. (off = `-n`, `noexec`)
    Exec,
    /// Enables pathname expansion. (off = `-f`, `noglob`)
    Glob,
    /// Prevents an interactive shell from exiting on end-of-file.
    IgnoreEof,
    /// Enables features for interactive use.
    Interactive,
    /// Allows function definitions to be recorded in the command history.
    /// (off = `nolog`)
    Log,
    /// Enables job control. (`-m`)
    Monitor,
    /// Reports the results of asynchronous jobs immediately. (`-b`)
    Notify,
    /// Locates utilities invoked from functions when the functions are
    /// defined. (`-h`)
    PreLookup,
    /// Expands unset variables to an empty string rather than erroring
    /// out. (off = `-u`, `nounset`)
    Unset,
    /// Echoes the input to the standard error as it is read. (`-v`)
    Verbose,
    /// Enables vi-like command line editing.
    Vi,
    /// Prints expanded commands to the standard error before executing
    /// them. (`-x`)
    XTrace,
}

pub use self::Option::*;

impl Option {
    /// Returns the option name, all in lower case without punctuation.
    #[must_use]
    pub fn long_name(self) -> &'static str {
        match self {
            AllExport => "allexport",
            Clobber => "clobber",
            ErrExit => "errexit",
            Exec => "exec",
            Glob => "glob",
            IgnoreEof => "ignoreeof",
            Interactive => "interactive",
            Log => "log",
            Monitor => "monitor",
            Notify => "notify",
            PreLookup => "prelookup",
            Unset => "unset",
            Verbose => "verbose",
            Vi => "vi",
            XTrace => "xtrace",
        }
    }
}

impl Display for Option {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.long_name().fmt(f)
    }
}

/// Error type indicating that a string does not name a valid option
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FromStrError {
    /// The string does not match any option name.
    NoSuchOption,
    /// The string is a prefix of more than one option name.
    Ambiguous,
}

pub use FromStrError::*;

/// Parses a canonical option name.
///
/// The name may be abbreviated to an unambiguous prefix. A full option
/// name is never ambiguous even if it is a prefix of another name.
impl FromStr for Option {
    type Err = FromStrError;
    fn from_str(name: &str) -> Result<Self, FromStrError> {
        const OPTIONS: &[(&str, Option)] = &[
            ("allexport", AllExport),
            ("clobber", Clobber),
            ("errexit", ErrExit),
            ("exec", Exec),
            ("glob", Glob),
            ("ignoreeof", IgnoreEof),
            ("interactive", Interactive),
            ("log", Log),
            ("monitor", Monitor),
            ("notify", Notify),
            ("prelookup", PreLookup),
            ("unset", Unset),
            ("verbose", Verbose),
            ("vi", Vi),
            ("xtrace", XTrace),
        ];

        match OPTIONS.binary_search_by_key(&name, |&(full_name, _option)| full_name) {
            Ok(index) => Ok(OPTIONS[index].1),
            Err(index) => {
                let mut options = OPTIONS[index..]
                    .iter()
                    .filter(|&(full_name, _option)| full_name.starts_with(name));
                match options.next() {
                    Some(first) => match options.next() {
                        Some(_second) => Err(Ambiguous),
                        None => Ok(first.1),
                    },
                    None => Err(NoSuchOption),
                }
            }
        }
    }
}

/// Parses a short option name.
///
/// ```
/// # use sedge_env::option::*;
/// assert_eq!(parse_short('a'), Some((AllExport, On)));
/// assert_eq!(parse_short('C'), Some((Clobber, Off)));
/// assert_eq!(parse_short('e'), Some((ErrExit, On)));
/// assert_eq!(parse_short('f'), Some((Glob, Off)));
/// assert_eq!(parse_short('n'), Some((Exec, Off)));
/// assert_eq!(parse_short('u'), Some((Unset, Off)));
/// ```
#[must_use]
pub fn parse_short(name: char) -> std::option::Option<(self::Option, State)> {
    match name {
        'a' => Some((AllExport, On)),
        'b' => Some((Notify, On)),
        'C' => Some((Clobber, Off)),
        'e' => Some((ErrExit, On)),
        'f' => Some((Glob, Off)),
        'h' => Some((PreLookup, On)),
        'i' => Some((Interactive, On)),
        'm' => Some((Monitor, On)),
        'n' => Some((Exec, Off)),
        'u' => Some((Unset, Off)),
        'v' => Some((Verbose, On)),
        'x' => Some((XTrace, On)),
        _ => None,
    }
}

/// Parses a long option name, allowing a `no` prefix to negate the state.
///
/// ```
/// # use sedge_env::option::{parse_long, FromStrError::NoSuchOption, Option::*, State::*};
/// assert_eq!(parse_long("notify"), Ok((Notify, On)));
/// assert_eq!(parse_long("nonotify"), Ok((Notify, Off)));
/// assert_eq!(parse_long("noclobber"), Ok((Clobber, Off)));
/// assert_eq!(parse_long("tify"), Err(NoSuchOption));
/// ```
pub fn parse_long(name: &str) -> Result<(Option, State), FromStrError> {
    if "no".starts_with(name) {
        return Err(Ambiguous);
    }

    let intact = Option::from_str(name);
    let without_no = name
        .strip_prefix("no")
        .ok_or(NoSuchOption)
        .and_then(Option::from_str);

    match (intact, without_no) {
        (Ok(option), Err(NoSuchOption)) => Ok((option, On)),
        (Err(NoSuchOption), Ok(option)) => Ok((option, Off)),
        (Err(Ambiguous), _) | (_, Err(Ambiguous)) => Err(Ambiguous),
        _ => Err(NoSuchOption),
    }
}

/// Canonicalizes an option name.
///
/// Converts to lower case and removes non-alphanumeric characters, so
/// `No-Clobber` parses like `noclobber`.
pub fn canonicalize(name: &str) -> Cow<'_, str> {
    if name
        .chars()
        .all(|c| c.is_alphanumeric() && !c.is_ascii_uppercase())
    {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(
            name.chars()
                .filter(|c| c.is_alphanumeric())
                .map(|c| c.to_ascii_lowercase())
                .collect(),
        )
    }
}

/// Set of the shell options and their states
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct OptionSet {
    enabled_options: EnumSet<Option>,
}

/// The default set enables `Clobber`, `Exec`, `Glob`, `Log`, and `Unset`.
impl Default for OptionSet {
    fn default() -> Self {
        let enabled_options = Clobber | Exec | Glob | Log | Unset;
        OptionSet { enabled_options }
    }
}

impl OptionSet {
    /// Creates an option set with all options disabled.
    #[must_use]
    pub fn empty() -> Self {
        OptionSet {
            enabled_options: EnumSet::empty(),
        }
    }

    /// Returns the current state of the option.
    #[must_use]
    pub fn get(&self, option: Option) -> State {
        if self.enabled_options.contains(option) {
            On
        } else {
            Off
        }
    }

    /// Returns true if the option is enabled.
    #[must_use]
    pub fn is_on(&self, option: Option) -> bool {
        self.enabled_options.contains(option)
    }

    /// Changes an option's state.
    pub fn set(&mut self, option: Option, state: State) {
        match state {
            On => self.enabled_options.insert(option),
            Off => self.enabled_options.remove(option),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_from_str_round_trip() {
        for option in EnumSet::<Option>::all() {
            let name = option.to_string();
            assert_eq!(Option::from_str(&name), Ok(option));
        }
    }

    #[test]
    fn from_str_unambiguous_abbreviation() {
        assert_eq!(Option::from_str("allexpor"), Ok(AllExport));
        assert_eq!(Option::from_str("a"), Ok(AllExport));
        assert_eq!(Option::from_str("m"), Ok(Monitor));
    }

    #[test]
    fn from_str_ambiguous_abbreviation() {
        assert_eq!(Option::from_str(""), Err(Ambiguous));
        assert_eq!(Option::from_str("e"), Err(Ambiguous));
        assert_eq!(Option::from_str("i"), Err(Ambiguous));
        assert_eq!(Option::from_str("v"), Err(Ambiguous));
    }

    #[test]
    fn from_str_no_match() {
        assert_eq!(Option::from_str("pipefail"), Err(NoSuchOption));
        assert_eq!(Option::from_str("GLOB"), Err(NoSuchOption));
    }

    #[test]
    fn parse_negated_round_trip() {
        for option in EnumSet::<Option>::all() {
            let name = format!("no{option}");
            assert_eq!(parse_long(&name), Ok((option, Off)));
        }
    }

    #[test]
    fn parse_ambiguous_abbreviation() {
        assert_eq!(parse_long(""), Err(Ambiguous));
        assert_eq!(parse_long("n"), Err(Ambiguous));
        assert_eq!(parse_long("no"), Err(Ambiguous));
    }

    #[test]
    fn test_canonicalize() {
        assert_eq!(canonicalize("noclobber"), "noclobber");
        assert_eq!(canonicalize("No-Clobber"), "noclobber");
        assert_eq!(canonicalize(" ig nore eof "), "ignoreeof");
    }

    #[test]
    fn default_set() {
        let set = OptionSet::default();
        assert_eq!(set.get(Clobber), On);
        assert_eq!(set.get(Exec), On);
        assert_eq!(set.get(Glob), On);
        assert_eq!(set.get(ErrExit), Off);
        assert_eq!(set.get(Monitor), Off);
    }

    #[test]
    fn set_and_get() {
        let mut set = OptionSet::default();
        set.set(ErrExit, On);
        assert!(set.is_on(ErrExit));
        set.set(Glob, Off);
        assert!(!set.is_on(Glob));
    }
}
