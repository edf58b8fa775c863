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

//! Parsing words, quotations, and expansions
//!
//! A word is parsed character by character. Quoting is tracked as the word
//! is read: single quotes make everything literal, double quotes leave `$`
//! and `` ` `` active, and a backslash escapes a single character. `$name`,
//! `${...}`, `$(...)`, `` `...` `` and `$((...))` produce the corresponding
//! expansion nodes. Command substitutions and arithmetic expansions are
//! captured as raw source text, to be parsed when they are expanded.

use super::core::Parser;
use super::error::Result;
use super::error::SyntaxError::*;
use crate::source::Location;
use crate::syntax::*;

/// Returns true if the string is a valid POSIX identifier.
pub fn is_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Context a word is parsed in, which determines what ends it
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum WordMode {
    /// Normal word: ends at a blank, operator, or newline
    Normal,
    /// Argument of a parameter expansion modifier: ends at `}`
    ParamArg,
    /// Here-document body line: ends at the end of input, quotes are
    /// literal, and a backslash escapes only `$`, `` ` `` and `\`
    HereDocLine,
}

impl<'a> Parser<'a> {
    /// Parses a word at the current position.
    ///
    /// Returns `Ok(None)` if the current character cannot start a word.
    /// Leading blanks are not skipped; that is the caller's business.
    pub fn word(&mut self) -> Result<Option<Word>> {
        self.word_in(WordMode::Normal)
    }

    /// Parses one line of an unquoted here-document body.
    ///
    /// The whole remaining input is the line. An empty line yields an empty
    /// string word.
    pub(super) fn here_doc_line_word(&mut self) -> Result<Word> {
        let location = self.location();
        Ok(self
            .word_in(WordMode::HereDocLine)?
            .unwrap_or_else(|| Word::from_plain("", location)))
    }

    pub(super) fn word_in(&mut self, mode: WordMode) -> Result<Option<Word>> {
        let start_location = self.location();
        let mut units: Vec<Word> = Vec::new();
        let mut run = String::new();
        let mut run_location = start_location;

        /// Moves the accumulated literal run into the unit list.
        fn flush(units: &mut Vec<Word>, run: &mut String, location: Location) {
            if !run.is_empty() {
                units.push(Word::String(WordString {
                    value: std::mem::take(run),
                    quoted: false,
                    location,
                }));
            }
        }

        loop {
            let Some(c) = self.peek_char()? else { break };
            match c {
                ' ' | '\t' | '\n' | '\r' | ';' | '&' | '|' | '<' | '>' | '(' | ')'
                    if mode == WordMode::Normal =>
                {
                    break;
                }
                '}' if mode == WordMode::ParamArg => break,
                '\\' => {
                    if mode == WordMode::HereDocLine {
                        self.next_char()?;
                        match self.peek_char()? {
                            Some(e @ ('$' | '`' | '\\')) => {
                                self.next_char()?;
                                flush(&mut units, &mut run, run_location);
                                units.push(Word::String(WordString {
                                    value: e.to_string(),
                                    quoted: true,
                                    location: self.location(),
                                }));
                            }
                            _ => run.push('\\'),
                        }
                    } else {
                        let escape_location = self.location();
                        self.next_char()?;
                        match self.peek_char()? {
                            None => return self.raise(IncompleteEscape, escape_location),
                            Some('\n') => {
                                self.next_char()?;
                            }
                            Some(e) => {
                                self.next_char()?;
                                flush(&mut units, &mut run, run_location);
                                units.push(Word::String(WordString {
                                    value: e.to_string(),
                                    quoted: true,
                                    location: escape_location,
                                }));
                            }
                        }
                    }
                }
                '\'' if mode != WordMode::HereDocLine => {
                    flush(&mut units, &mut run, run_location);
                    units.push(self.single_quoted()?);
                }
                '"' if mode != WordMode::HereDocLine => {
                    flush(&mut units, &mut run, run_location);
                    units.push(self.double_quoted()?);
                }
                '$' => {
                    flush(&mut units, &mut run, run_location);
                    units.push(self.dollar_unit()?);
                }
                '`' => {
                    flush(&mut units, &mut run, run_location);
                    units.push(self.backquote_unit()?);
                }
                _ => {
                    if run.is_empty() {
                        run_location = self.location();
                    }
                    run.push(c);
                    self.next_char()?;
                }
            }
        }
        flush(&mut units, &mut run, run_location);

        match units.len() {
            0 => Ok(None),
            1 => Ok(Some(units.pop().unwrap())),
            _ => Ok(Some(Word::List(WordList {
                children: units,
                double_quoted: false,
                location: start_location,
            }))),
        }
    }

    /// Parses a single-quoted string starting at the opening quote.
    fn single_quoted(&mut self) -> Result<Word> {
        let opening_location = self.location();
        self.next_char()?; // opening quote
        let mut value = String::new();
        loop {
            match self.peek_char()? {
                None => {
                    return self.raise(UnclosedSingleQuote { opening_location }, opening_location);
                }
                Some('\'') => {
                    self.next_char()?;
                    return Ok(Word::String(WordString {
                        value,
                        quoted: true,
                        location: opening_location,
                    }));
                }
                Some(c) => {
                    value.push(c);
                    self.next_char()?;
                }
            }
        }
    }

    /// Parses a double-quoted string starting at the opening quote.
    ///
    /// Inside double quotes, `$` and `` ` `` remain active and a backslash
    /// escapes only `$`, `` ` ``, `"`, `\`, and the newline. Any other
    /// backslash stays literal.
    fn double_quoted(&mut self) -> Result<Word> {
        let opening_location = self.location();
        self.next_char()?; // opening quote
        let mut children: Vec<Word> = Vec::new();
        let mut run = String::new();
        let mut run_location = self.location();

        fn flush(children: &mut Vec<Word>, run: &mut String, location: Location) {
            if !run.is_empty() {
                children.push(Word::String(WordString {
                    value: std::mem::take(run),
                    quoted: false,
                    location,
                }));
            }
        }

        loop {
            match self.peek_char()? {
                None => {
                    return self.raise(UnclosedDoubleQuote { opening_location }, opening_location);
                }
                Some('"') => {
                    self.next_char()?;
                    break;
                }
                Some('\\') => {
                    let escape_location = self.location();
                    self.next_char()?;
                    match self.peek_char()? {
                        Some(e @ ('$' | '`' | '"' | '\\')) => {
                            self.next_char()?;
                            flush(&mut children, &mut run, run_location);
                            children.push(Word::String(WordString {
                                value: e.to_string(),
                                quoted: true,
                                location: escape_location,
                            }));
                        }
                        Some('\n') => {
                            self.next_char()?;
                        }
                        _ => run.push('\\'),
                    }
                }
                Some('$') => {
                    flush(&mut children, &mut run, run_location);
                    children.push(self.dollar_unit()?);
                }
                Some('`') => {
                    flush(&mut children, &mut run, run_location);
                    children.push(self.backquote_unit()?);
                }
                Some(c) => {
                    if run.is_empty() {
                        run_location = self.location();
                    }
                    run.push(c);
                    self.next_char()?;
                }
            }
        }
        flush(&mut children, &mut run, run_location);

        Ok(Word::List(WordList {
            children,
            double_quoted: true,
            location: opening_location,
        }))
    }

    /// Parses an expansion starting at a `$`.
    ///
    /// A `$` that does not start any recognized expansion is returned as a
    /// literal string.
    fn dollar_unit(&mut self) -> Result<Word> {
        let location = self.location();
        self.next_char()?; // $
        match self.peek_char()? {
            Some('(') => {
                if self.starts_with("((")? {
                    self.arith_unit(location)
                } else {
                    self.command_subst(location)
                }
            }
            Some('{') => self.braced_param(location),
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(c) = self.peek_char()? {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        self.next_char()?;
                    } else {
                        break;
                    }
                }
                Ok(param(name, location))
            }
            Some(c) if c.is_ascii_digit() => {
                // Only a single digit names a positional parameter here;
                // $10 is $1 followed by a literal 0.
                self.next_char()?;
                Ok(param(c.to_string(), location))
            }
            Some(c @ ('@' | '*' | '#' | '?' | '-' | '$' | '!')) => {
                self.next_char()?;
                Ok(param(c.to_string(), location))
            }
            _ => Ok(Word::from_plain("$", location)),
        }
    }

    /// Parses a braced parameter expansion, after the `$` has been consumed.
    fn braced_param(&mut self, opening_location: Location) -> Result<Word> {
        self.next_char()?; // {

        // A leading # is the length operator unless it names the special
        // parameter # itself, as in ${#} or ${#:-x}.
        if self.peek_char()? == Some('#') {
            let saved = self.save();
            self.next_char()?;
            let is_length = match self.peek_char()? {
                Some(c) if c.is_ascii_alphanumeric() || c == '_' => true,
                Some('@' | '*' | '?' | '!' | '$') => true,
                Some('-') => {
                    // ${#-} is the length of $-, but ${#-word} defaults $#.
                    let mut chars = self.peek_rest(8)?.chars();
                    chars.next();
                    chars.next() == Some('}')
                }
                _ => false,
            };
            if is_length {
                let name = self.param_name()?;
                if !self.consume_str("}")? {
                    return self.raise(UnclosedParam { opening_location }, opening_location);
                }
                return Ok(Word::Parameter(WordParameter {
                    name,
                    op: ParamOp::Length,
                    colon: false,
                    arg: None,
                    location: opening_location,
                }));
            }
            self.rewind(saved);
        }

        let name = self.param_name()?;
        if name.is_empty() {
            return self.raise(EmptyParam, opening_location);
        }

        if self.consume_str("}")? {
            return Ok(param(name, opening_location));
        }

        let colon = self.consume_str(":")?;
        let op = match self.peek_char()? {
            Some('-') => ParamOp::Default,
            Some('=') => ParamOp::Assign,
            Some('?') => ParamOp::Error,
            Some('+') => ParamOp::Alternative,
            Some('%') if !colon => {
                self.next_char()?;
                if self.consume_str("%")? {
                    ParamOp::RemoveLargestSuffix
                } else {
                    ParamOp::RemoveSmallestSuffix
                }
            }
            Some('#') if !colon => {
                self.next_char()?;
                if self.consume_str("#")? {
                    ParamOp::RemoveLargestPrefix
                } else {
                    ParamOp::RemoveSmallestPrefix
                }
            }
            _ => {
                let location = self.location();
                return self.raise(InvalidModifier, location);
            }
        };
        if matches!(
            op,
            ParamOp::Default | ParamOp::Assign | ParamOp::Error | ParamOp::Alternative
        ) {
            self.next_char()?;
        }

        let arg = self.word_in(WordMode::ParamArg)?.map(Box::new);
        if !self.consume_str("}")? {
            return self.raise(UnclosedParam { opening_location }, opening_location);
        }
        Ok(Word::Parameter(WordParameter {
            name,
            op,
            colon,
            arg,
            location: opening_location,
        }))
    }

    /// Parses a parameter name inside braces: an identifier, a string of
    /// digits, or a single special parameter character.
    fn param_name(&mut self) -> Result<String> {
        let mut name = String::new();
        match self.peek_char()? {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                while let Some(c) = self.peek_char()? {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        name.push(c);
                        self.next_char()?;
                    } else {
                        break;
                    }
                }
            }
            Some(c) if c.is_ascii_digit() => {
                while let Some(c) = self.peek_char()? {
                    if c.is_ascii_digit() {
                        name.push(c);
                        self.next_char()?;
                    } else {
                        break;
                    }
                }
            }
            Some(c @ ('@' | '*' | '#' | '?' | '-' | '$' | '!')) => {
                name.push(c);
                self.next_char()?;
            }
            _ => {}
        }
        Ok(name)
    }

    /// Captures the source of a `$(...)` command substitution.
    ///
    /// The program is not parsed here; the raw text between the parentheses
    /// is captured, skipping over quoted regions so quoted parentheses do
    /// not confuse the nesting count. The content is parsed when the
    /// substitution is expanded.
    fn command_subst(&mut self, opening_location: Location) -> Result<Word> {
        self.next_char()?; // (
        let mut content = String::new();
        let mut depth = 1usize;
        loop {
            match self.peek_char()? {
                None => {
                    return self.raise(
                        UnclosedCommandSubstitution { opening_location },
                        opening_location,
                    );
                }
                Some('(') => {
                    depth += 1;
                    content.push('(');
                    self.next_char()?;
                }
                Some(')') => {
                    self.next_char()?;
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    content.push(')');
                }
                Some('\\') => {
                    content.push('\\');
                    self.next_char()?;
                    if let Some(c) = self.peek_char()? {
                        content.push(c);
                        self.next_char()?;
                    }
                }
                Some(quote @ ('\'' | '"' | '`')) => {
                    content.push(quote);
                    self.next_char()?;
                    loop {
                        match self.peek_char()? {
                            None => {
                                return self.raise(
                                    UnclosedCommandSubstitution { opening_location },
                                    opening_location,
                                );
                            }
                            Some('\\') if quote != '\'' => {
                                content.push('\\');
                                self.next_char()?;
                                if let Some(c) = self.peek_char()? {
                                    content.push(c);
                                    self.next_char()?;
                                }
                            }
                            Some(c) => {
                                content.push(c);
                                self.next_char()?;
                                if c == quote {
                                    break;
                                }
                            }
                        }
                    }
                }
                Some(c) => {
                    content.push(c);
                    self.next_char()?;
                }
            }
        }
        Ok(Word::CommandSubst(CommandSubst {
            program: content.into(),
            back_quoted: false,
            location: opening_location,
        }))
    }

    /// Captures the source of a `$((...))` arithmetic expansion.
    fn arith_unit(&mut self, opening_location: Location) -> Result<Word> {
        self.next_char()?; // (
        self.next_char()?; // (
        let mut expression = String::new();
        let mut depth = 0usize;
        loop {
            match self.peek_char()? {
                None => {
                    return self.raise(UnclosedArith { opening_location }, opening_location);
                }
                Some('(') => {
                    depth += 1;
                    expression.push('(');
                    self.next_char()?;
                }
                Some(')') if depth > 0 => {
                    depth -= 1;
                    expression.push(')');
                    self.next_char()?;
                }
                Some(')') => {
                    self.next_char()?;
                    if self.peek_char()? == Some(')') {
                        self.next_char()?;
                        break;
                    }
                    return self.raise(UnclosedArith { opening_location }, opening_location);
                }
                Some(c) => {
                    expression.push(c);
                    self.next_char()?;
                }
            }
        }
        Ok(Word::Arith(WordArith {
            expression,
            location: opening_location,
        }))
    }

    /// Parses a back-quoted command substitution.
    ///
    /// `\$`, `` \` `` and `\\` are unescaped while capturing; any other
    /// backslash is kept as is.
    fn backquote_unit(&mut self) -> Result<Word> {
        let opening_location = self.location();
        self.next_char()?; // `
        let mut content = String::new();
        loop {
            match self.peek_char()? {
                None => {
                    return self.raise(UnclosedBackquote { opening_location }, opening_location);
                }
                Some('`') => {
                    self.next_char()?;
                    break;
                }
                Some('\\') => {
                    self.next_char()?;
                    match self.peek_char()? {
                        Some(e @ ('$' | '`' | '\\')) => {
                            content.push(e);
                            self.next_char()?;
                        }
                        _ => content.push('\\'),
                    }
                }
                Some(c) => {
                    content.push(c);
                    self.next_char()?;
                }
            }
        }
        Ok(Word::CommandSubst(CommandSubst {
            program: content.into(),
            back_quoted: true,
            location: opening_location,
        }))
    }
}

/// Builds a plain parameter expansion node.
fn param(name: String, location: Location) -> Word {
    Word::Parameter(WordParameter {
        name,
        op: ParamOp::None,
        colon: false,
        arg: None,
        location,
    })
}

/// Computes a here-document delimiter from its word.
///
/// The delimiter is the concatenation of the word's parts with quoting
/// removed. The second result tells whether any part was quoted, which
/// suppresses expansion of the here-document body.
pub(super) fn here_doc_delimiter(word: &Word) -> (String, bool) {
    fn walk(word: &Word, out: &mut String, quoted: &mut bool) {
        match word {
            Word::String(s) => {
                out.push_str(&s.value);
                *quoted |= s.quoted;
            }
            Word::List(l) => {
                *quoted |= l.double_quoted;
                for child in &l.children {
                    walk(child, out, quoted);
                }
            }
            // Expansions are not performed in a delimiter; their source
            // form is the delimiter text.
            other => out.push_str(&other.to_string()),
        }
    }
    let mut out = String::new();
    let mut quoted = false;
    walk(word, &mut out, &mut quoted);
    (out, quoted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn parse_word(code: &str) -> Word {
        let mut parser = Parser::with_code(code);
        parser.word().unwrap().unwrap()
    }

    #[test]
    fn plain_word() {
        let word = parse_word("hello");
        assert_matches!(word, Word::String(s) => {
            assert_eq!(s.value, "hello");
            assert!(!s.quoted);
        });
    }

    #[test]
    fn word_stops_at_operator() {
        let mut parser = Parser::with_code("foo|bar");
        let word = parser.word().unwrap().unwrap();
        assert_eq!(word.to_string_if_literal().unwrap(), "foo");
        assert_eq!(parser.peek_char().unwrap(), Some('|'));
    }

    #[test]
    fn single_quoted_word() {
        let word = parse_word("'a b'");
        assert_matches!(word, Word::String(s) => {
            assert_eq!(s.value, "a b");
            assert!(s.quoted);
        });
    }

    #[test]
    fn unclosed_single_quote() {
        let mut parser = Parser::with_code("'abc");
        let error = parser.word().unwrap_err();
        assert_matches!(
            error.cause,
            super::super::error::ErrorCause::Syntax(UnclosedSingleQuote { .. })
        );
        assert_eq!(error.location.to_string(), "1:1");
    }

    #[test]
    fn backslash_escapes_next_character() {
        let word = parse_word(r"a\ b");
        assert_matches!(word, Word::List(l) => {
            assert!(!l.double_quoted);
            assert_eq!(l.children.len(), 3);
            assert_matches!(&l.children[1], Word::String(s) => {
                assert_eq!(s.value, " ");
                assert!(s.quoted);
            });
        });
    }

    #[test]
    fn double_quoted_word() {
        let word = parse_word(r#""a $x \$ b""#);
        assert_matches!(word, Word::List(l) => {
            assert!(l.double_quoted);
            assert_matches!(&l.children[0], Word::String(s) => {
                assert_eq!(s.value, "a ");
                assert!(!s.quoted);
            });
            assert_matches!(&l.children[1], Word::Parameter(p) => {
                assert_eq!(p.name, "x");
                assert_eq!(p.op, ParamOp::None);
            });
            assert_matches!(&l.children[3], Word::String(s) => {
                assert_eq!(s.value, "$");
                assert!(s.quoted);
            });
        });
    }

    #[test]
    fn backslash_in_double_quotes_is_literal_before_other_characters() {
        let word = parse_word(r#""a\nb""#);
        assert_matches!(word, Word::List(l) => {
            assert_eq!(l.children.len(), 1);
            assert_matches!(&l.children[0], Word::String(s) => {
                assert_eq!(s.value, "a\\nb");
            });
        });
    }

    #[test]
    fn raw_parameter() {
        let word = parse_word("$foo");
        assert_matches!(word, Word::Parameter(p) => {
            assert_eq!(p.name, "foo");
            assert_eq!(p.op, ParamOp::None);
            assert_eq!(p.arg, None);
        });
    }

    #[test]
    fn special_parameters() {
        for name in ["@", "*", "#", "?", "-", "$", "!", "0", "5"] {
            let word = parse_word(&format!("${name}"));
            assert_matches!(word, Word::Parameter(p) => assert_eq!(p.name, name));
        }
    }

    #[test]
    fn positional_parameter_is_single_digit() {
        let word = parse_word("$10");
        assert_matches!(word, Word::List(l) => {
            assert_matches!(&l.children[0], Word::Parameter(p) => assert_eq!(p.name, "1"));
            assert_matches!(&l.children[1], Word::String(s) => assert_eq!(s.value, "0"));
        });
    }

    #[test]
    fn lone_dollar_is_literal() {
        let word = parse_word("$");
        assert_matches!(word, Word::String(s) => {
            assert_eq!(s.value, "$");
            assert!(!s.quoted);
        });
    }

    #[test]
    fn braced_parameter_with_switch() {
        let word = parse_word("${foo:-bar baz}");
        assert_matches!(word, Word::Parameter(p) => {
            assert_eq!(p.name, "foo");
            assert_eq!(p.op, ParamOp::Default);
            assert!(p.colon);
            let arg = p.arg.unwrap();
            assert_eq!(arg.to_string_if_literal().unwrap(), "bar baz");
        });
    }

    #[test]
    fn braced_parameter_without_colon() {
        let word = parse_word("${foo=x}");
        assert_matches!(word, Word::Parameter(p) => {
            assert_eq!(p.op, ParamOp::Assign);
            assert!(!p.colon);
        });
    }

    #[test]
    fn braced_parameter_trims() {
        let word = parse_word("${path%%/*}");
        assert_matches!(word, Word::Parameter(p) => {
            assert_eq!(p.op, ParamOp::RemoveLargestSuffix);
            assert_eq!(p.arg.unwrap().to_string_if_literal().unwrap(), "/*");
        });

        let word = parse_word("${path#*/}");
        assert_matches!(word, Word::Parameter(p) => {
            assert_eq!(p.op, ParamOp::RemoveSmallestPrefix);
        });
    }

    #[test]
    fn braced_parameter_length() {
        let word = parse_word("${#foo}");
        assert_matches!(word, Word::Parameter(p) => {
            assert_eq!(p.name, "foo");
            assert_eq!(p.op, ParamOp::Length);
        });

        let word = parse_word("${#}");
        assert_matches!(word, Word::Parameter(p) => {
            assert_eq!(p.name, "#");
            assert_eq!(p.op, ParamOp::None);
        });

        let word = parse_word("${#?}");
        assert_matches!(word, Word::Parameter(p) => {
            assert_eq!(p.name, "?");
            assert_eq!(p.op, ParamOp::Length);
        });
    }

    #[test]
    fn nested_parameter_argument() {
        let word = parse_word("${a:-${b}}");
        assert_matches!(word, Word::Parameter(p) => {
            assert_matches!(*p.arg.unwrap(), Word::Parameter(inner) => {
                assert_eq!(inner.name, "b");
            });
        });
    }

    #[test]
    fn unclosed_parameter() {
        let mut parser = Parser::with_code("${foo");
        let error = parser.word().unwrap_err();
        assert_matches!(
            error.cause,
            super::super::error::ErrorCause::Syntax(UnclosedParam { .. })
        );
    }

    #[test]
    fn command_substitution() {
        let word = parse_word("$(echo hi)");
        assert_matches!(word, Word::CommandSubst(c) => {
            assert_eq!(&*c.program, "echo hi");
            assert!(!c.back_quoted);
        });
    }

    #[test]
    fn command_substitution_nested_parens_and_quotes() {
        let word = parse_word("$(echo '(' \"x)y\" $(inner))");
        assert_matches!(word, Word::CommandSubst(c) => {
            assert_eq!(&*c.program, "echo '(' \"x)y\" $(inner)");
        });
    }

    #[test]
    fn back_quoted_command_substitution() {
        let word = parse_word(r"`echo \$x \\ \a`");
        assert_matches!(word, Word::CommandSubst(c) => {
            assert_eq!(&*c.program, r"echo $x \ \a");
            assert!(c.back_quoted);
        });
    }

    #[test]
    fn arithmetic_expansion() {
        let word = parse_word("$((1 + (2 * 3)))");
        assert_matches!(word, Word::Arith(a) => {
            assert_eq!(a.expression, "1 + (2 * 3)");
        });
    }

    #[test]
    fn adjacent_units_form_a_list() {
        let word = parse_word("pre$x'post'");
        assert_matches!(word, Word::List(l) => {
            assert!(!l.double_quoted);
            assert_eq!(l.children.len(), 3);
        });
    }

    #[test]
    fn line_continuation_in_word() {
        let word = parse_word("fo\\\no");
        assert_eq!(word.to_string_if_literal().unwrap(), "foo");
    }

    #[test]
    fn here_doc_delimiter_quoting() {
        let (delimiter, quoted) = here_doc_delimiter(&parse_word("EOF"));
        assert_eq!(delimiter, "EOF");
        assert!(!quoted);

        let (delimiter, quoted) = here_doc_delimiter(&parse_word("'EOF'"));
        assert_eq!(delimiter, "EOF");
        assert!(quoted);

        let (delimiter, quoted) = here_doc_delimiter(&parse_word("E'O'F"));
        assert_eq!(delimiter, "EOF");
        assert!(quoted);
    }

    #[test]
    fn is_name_accepts_identifiers_only() {
        assert!(is_name("foo"));
        assert!(is_name("_bar2"));
        assert!(!is_name(""));
        assert!(!is_name("2x"));
        assert!(!is_name("a-b"));
    }
}
