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

//! Fundamentals for implementing the parser
//!
//! The parser does not use a separate tokenizer. Lookahead works directly on
//! a character buffer that is refilled lazily from the [`Input`]: peeking
//! guarantees that enough characters are buffered, and consuming advances a
//! position into the buffer while tracking the source [`Location`].
//!
//! Alias substitution also happens on the buffer: when a command word names
//! an alias, the replacement text is spliced into the buffer at the current
//! position and parsing resumes there. The parser remembers which aliases
//! produced which buffer region, so an alias is never substituted inside its
//! own replacement and expansion terminates.

use super::error::{Error, ErrorCause, Result, SyntaxError};
use crate::alias::{EmptyGlossary, Glossary};
use crate::input::{Input, Memory};
use crate::source::Location;
use crate::syntax::HereDocContent;

/// Returns true if the character is a blank that separates tokens.
pub fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Returns true if the character ends a literal token.
fn is_token_delimiter(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t'
            | '\n'
            | '\r'
            | ';'
            | '&'
            | '|'
            | '<'
            | '>'
            | '('
            | ')'
            | '\''
            | '"'
            | '\\'
            | '$'
            | '`'
    )
}

/// Modifier that makes a parse result optional in order to trigger the
/// parser to restart after alias substitution
///
/// `Rec` stands for "recursion". When a parsing function substitutes an
/// alias without producing a result, it returns `AliasSubstituted` and the
/// caller must restart parsing so the substituted text is recognized in the
/// caller's context. For example, with `alias untrue='! true'`, the command
/// parser must hand control back to the pipeline parser so the `!` coming
/// out of the alias is recognized as negation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Rec<T> {
    /// Result of alias substitution
    AliasSubstituted,
    /// Successful parse result
    Parsed(T),
}

/// Saved parser position, for backtracking over a bounded lookahead
///
/// Rewinding is sound because the buffer only ever grows; characters are
/// never removed from it.
#[derive(Clone, Copy, Debug)]
pub(super) struct SavedPosition {
    pos: usize,
    location: Location,
    prev_was_cr: bool,
}

/// Buffer region produced by an alias substitution
///
/// While the parsing position is inside the region, the named alias must not
/// be substituted again. This implements the one-expansion-per-occurrence
/// rule that keeps recursive aliases finite.
#[derive(Clone, Debug)]
struct ActiveAlias {
    /// Buffer position just past the replacement text
    end: usize,
    /// Name of the substituted alias
    name: String,
}

/// Here-document whose body has not been read yet
///
/// The operator and delimiter of a here-document are parsed with the rest of
/// the redirection, but the body only after the current line has been parsed
/// to its newline. Until then the redirection is remembered here.
#[derive(Debug)]
pub(super) struct PendingHereDoc {
    /// Cell in the redirection that receives the body lines
    pub content: HereDocContent,
    /// Delimiter that ends the body, with quoting removed
    pub delimiter: String,
    /// Whether leading tabs are stripped from body lines (`<<-`)
    pub remove_tabs: bool,
    /// Whether any part of the delimiter was quoted
    ///
    /// A quoted delimiter suppresses all expansion in the body.
    pub quoted: bool,
    /// Position of the redirection operator, for error reporting
    pub location: Location,
}

static NO_ALIASES: EmptyGlossary = EmptyGlossary;

/// The shell syntax parser
///
/// A parser owns the input reader, the character buffer the input is lazily
/// read into, and the current parsing position. Parsing functions consume
/// characters going strictly forward, except for small saved-position
/// rewinds used to disambiguate tokens.
///
/// Once a parsing function has failed, the first error is latched and every
/// later call to a public entry point returns it again without reading more
/// input.
#[must_use = "Parser must be used to parse syntax"]
pub struct Parser<'a> {
    input: Box<dyn Input + 'a>,
    aliases: &'a dyn Glossary,
    buffer: String,
    pos: usize,
    location: Location,
    prev_was_cr: bool,
    input_done: bool,
    error: Option<Error>,
    active_aliases: Vec<ActiveAlias>,
    pending_here_docs: Vec<PendingHereDoc>,
}

impl<'a> Parser<'a> {
    /// Creates a parser reading from the given input, with no aliases.
    pub fn new(input: Box<dyn Input + 'a>) -> Self {
        Self::with_aliases(input, &NO_ALIASES)
    }

    /// Creates a parser that substitutes aliases from the given glossary.
    pub fn with_aliases(input: Box<dyn Input + 'a>, aliases: &'a dyn Glossary) -> Self {
        Parser {
            input,
            aliases,
            buffer: String::new(),
            pos: 0,
            location: Location::start(),
            prev_was_cr: false,
            input_done: false,
            error: None,
            active_aliases: Vec::new(),
            pending_here_docs: Vec::new(),
        }
    }

    /// Creates a parser with a fixed source code string.
    pub fn with_code(code: &'a str) -> Self {
        Self::new(Box::new(Memory::new(code)))
    }

    /// Creates a parser with a fixed source code string starting at the
    /// given location.
    pub(super) fn with_code_at(code: &'a str, location: Location) -> Self {
        let mut parser = Self::with_code(code);
        parser.location = location;
        parser
    }

    /// Returns the location of the next character to be parsed.
    #[must_use]
    pub fn location(&self) -> Location {
        self.location
    }

    /// Reads input lines until at least `n` more bytes are buffered or the
    /// input is exhausted.
    fn fill(&mut self, n: usize) -> Result<()> {
        while self.buffer.len() - self.pos < n && !self.input_done {
            match self.input.next_line() {
                Ok(line) if line.is_empty() => self.input_done = true,
                Ok(line) => self.buffer.push_str(&line),
                Err(io_error) => {
                    let error = Error {
                        cause: io_error.into(),
                        location: self.location,
                    };
                    if self.error.is_none() {
                        self.error = Some(error.clone());
                    }
                    self.input_done = true;
                    return Err(error);
                }
            }
        }
        Ok(())
    }

    /// Returns the unconsumed part of the buffer after making sure at least
    /// `n` bytes are buffered (fewer near the end of input).
    pub(super) fn peek_rest(&mut self, n: usize) -> Result<&str> {
        self.fill(n)?;
        Ok(&self.buffer[self.pos..])
    }

    /// Peeks the next character without consuming it.
    pub(super) fn peek_char(&mut self) -> Result<Option<char>> {
        self.fill(4)?;
        Ok(self.buffer[self.pos..].chars().next())
    }

    /// Consumes the next character.
    ///
    /// The location advances by one column, or to the next line on a
    /// newline. `\r\n`, `\n`, and a lone `\r` each count as one newline.
    pub(super) fn next_char(&mut self) -> Result<Option<char>> {
        let Some(c) = self.peek_char()? else {
            return Ok(None);
        };
        self.pos += c.len_utf8();
        match c {
            '\n' => {
                if !self.prev_was_cr {
                    self.location = self.location.next_line();
                }
            }
            '\r' => self.location = self.location.next_line(),
            _ => self.location = self.location.next_column(),
        }
        self.prev_was_cr = c == '\r';
        Ok(Some(c))
    }

    /// Tests whether the remaining input starts with the given string.
    pub(super) fn starts_with(&mut self, s: &str) -> Result<bool> {
        Ok(self.peek_rest(s.len())?.starts_with(s))
    }

    /// Consumes the given string if the remaining input starts with it.
    pub(super) fn consume_str(&mut self, s: &str) -> Result<bool> {
        if self.starts_with(s)? {
            for _ in s.chars() {
                self.next_char()?;
            }
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Saves the current position for a later [`rewind`](Self::rewind).
    pub(super) fn save(&self) -> SavedPosition {
        SavedPosition {
            pos: self.pos,
            location: self.location,
            prev_was_cr: self.prev_was_cr,
        }
    }

    /// Moves the current position back to a saved position.
    pub(super) fn rewind(&mut self, saved: SavedPosition) {
        debug_assert!(saved.pos <= self.pos);
        self.pos = saved.pos;
        self.location = saved.location;
        self.prev_was_cr = saved.prev_was_cr;
    }

    /// Records and returns a syntax error.
    ///
    /// Only the first recorded error is kept; it is what public entry points
    /// keep returning once parsing has failed.
    pub(super) fn raise<T>(&mut self, cause: SyntaxError, location: Location) -> Result<T> {
        let error = Error {
            cause: ErrorCause::Syntax(cause),
            location,
        };
        if self.error.is_none() {
            self.error = Some(error.clone());
        }
        Err(error)
    }

    /// Returns the latched error, if parsing has failed before.
    pub(super) fn take_latched_error(&self) -> Option<Error> {
        self.error.clone()
    }

    /// Skips blanks and line continuations.
    pub(super) fn skip_blanks(&mut self) -> Result<()> {
        loop {
            match self.peek_char()? {
                Some(c) if is_blank(c) => {
                    self.next_char()?;
                }
                Some('\\') if self.starts_with("\\\n")? => {
                    self.next_char()?;
                    self.next_char()?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// Skips blanks, line continuations, and a comment.
    ///
    /// A comment runs to the end of the line; the newline itself is not
    /// consumed.
    pub(super) fn skip_blanks_and_comment(&mut self) -> Result<()> {
        self.skip_blanks()?;
        if self.peek_char()? == Some('#') {
            while !matches!(self.peek_char()?, None | Some('\n')) {
                self.next_char()?;
            }
        }
        Ok(())
    }

    /// Peeks the literal token starting at the current position.
    ///
    /// The token runs until a blank, operator character, quotation, or
    /// expansion. The result is empty if the next character is any of those.
    /// Nothing is consumed. This is how reserved words are recognized
    /// without committing to a full word parse.
    pub(super) fn peek_literal_token(&mut self) -> Result<String> {
        let mut token = String::new();
        let mut offset = 0;
        loop {
            self.fill(offset + 4)?;
            let Some(c) = self.buffer[self.pos + offset..].chars().next() else {
                break;
            };
            if is_token_delimiter(c) {
                break;
            }
            token.push(c);
            offset += c.len_utf8();
        }
        Ok(token)
    }

    /// Consumes a token previously returned by
    /// [`peek_literal_token`](Self::peek_literal_token).
    pub(super) fn consume_token(&mut self, token: &str) -> Result<()> {
        for _ in token.chars() {
            self.next_char()?;
        }
        Ok(())
    }

    /// Substitutes an alias for a word that has just been consumed.
    ///
    /// `word_start` is the buffer position where the word began. If the
    /// glossary defines `name` and the word is not inside the replacement
    /// text of an earlier substitution of the same alias, the replacement is
    /// spliced into the buffer at the current position and true is returned.
    /// The caller must then restart parsing at the current position.
    pub(super) fn substitute_alias(&mut self, word_start: usize, name: &str) -> bool {
        if self.aliases.is_empty() {
            return false;
        }

        self.active_aliases.retain(|a| a.end > word_start);
        if self.active_aliases.iter().any(|a| a.name == name) {
            return false;
        }
        let Some(alias) = self.aliases.look_up(name) else {
            return false;
        };

        let replacement = &alias.replacement;
        self.buffer.insert_str(self.pos, replacement);
        for active in &mut self.active_aliases {
            if active.end >= self.pos {
                active.end += replacement.len();
            }
        }
        self.active_aliases.push(ActiveAlias {
            end: self.pos + replacement.len(),
            name: name.to_string(),
        });
        true
    }

    /// Returns the current buffer position, used as the start of a word for
    /// [`substitute_alias`](Self::substitute_alias).
    pub(super) fn buffer_position(&self) -> usize {
        self.pos
    }

    /// Remembers a here-document whose body is to be read at the next
    /// newline.
    pub(super) fn push_pending_here_doc(&mut self, here_doc: PendingHereDoc) {
        self.pending_here_docs.push(here_doc);
    }

    /// Returns true if a here-document is waiting for its body.
    pub(super) fn has_pending_here_docs(&self) -> bool {
        !self.pending_here_docs.is_empty()
    }

    /// Location of the first here-document waiting for its body.
    pub(super) fn first_pending_here_doc_location(&self) -> Option<Location> {
        self.pending_here_docs.first().map(|doc| doc.location)
    }

    /// Reads the bodies of all pending here-documents.
    ///
    /// This must be called just after a newline has been consumed. Body
    /// lines are read until a line equals the delimiter (with leading tabs
    /// stripped for `<<-`). Each line is parsed as a word unless the
    /// delimiter was quoted, in which case it is kept literal.
    pub(super) fn here_doc_contents(&mut self) -> Result<()> {
        for doc in std::mem::take(&mut self.pending_here_docs) {
            let mut lines = Vec::new();
            loop {
                let line_location = self.location;
                let mut raw = String::new();
                let mut saw_eof = false;
                loop {
                    match self.peek_char()? {
                        None => {
                            saw_eof = true;
                            break;
                        }
                        Some('\n') => {
                            self.next_char()?;
                            break;
                        }
                        Some(c) => {
                            raw.push(c);
                            self.next_char()?;
                        }
                    }
                }

                let line = if doc.remove_tabs {
                    raw.trim_start_matches('\t')
                } else {
                    &raw[..]
                };
                if line == doc.delimiter {
                    break;
                }
                if saw_eof {
                    return self.raise(
                        SyntaxError::UnclosedHereDocContent {
                            redir_op_location: doc.location,
                        },
                        doc.location,
                    );
                }

                if doc.quoted {
                    lines.push(crate::syntax::Word::String(crate::syntax::WordString {
                        value: line.to_string(),
                        quoted: true,
                        location: line_location,
                    }));
                } else {
                    let mut sub = Parser::with_code_at(line, line_location);
                    let word = sub.here_doc_line_word()?;
                    lines.push(word);
                }
            }
            // The cell was freshly created with the redirection, so this
            // cannot fail.
            doc.content.set(lines).ok();
        }
        Ok(())
    }
}

impl std::fmt::Debug for Parser<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("pos", &self.pos)
            .field("location", &self.location)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasSet;

    #[test]
    fn peeking_does_not_consume() {
        let mut parser = Parser::with_code("abc");
        assert_eq!(parser.peek_char().unwrap(), Some('a'));
        assert_eq!(parser.peek_char().unwrap(), Some('a'));
        assert_eq!(parser.next_char().unwrap(), Some('a'));
        assert_eq!(parser.peek_char().unwrap(), Some('b'));
    }

    #[test]
    fn location_tracking_counts_crlf_as_one_newline() {
        let mut parser = Parser::with_code("a\r\nb\rc\nd");
        while parser.next_char().unwrap() != Some('b') {}
        assert_eq!(parser.location().to_string(), "2:2");
        while parser.next_char().unwrap() != Some('d') {}
        assert_eq!(parser.location().to_string(), "4:2");
    }

    #[test]
    fn save_and_rewind() {
        let mut parser = Parser::with_code("xy");
        let saved = parser.save();
        assert_eq!(parser.next_char().unwrap(), Some('x'));
        parser.rewind(saved);
        assert_eq!(parser.next_char().unwrap(), Some('x'));
        assert_eq!(parser.next_char().unwrap(), Some('y'));
        assert_eq!(parser.next_char().unwrap(), None);
    }

    #[test]
    fn literal_token_stops_at_delimiters() {
        let mut parser = Parser::with_code("done;x");
        assert_eq!(parser.peek_literal_token().unwrap(), "done");
        // Peeking does not consume.
        assert_eq!(parser.peek_literal_token().unwrap(), "done");

        let mut parser = Parser::with_code("a$b");
        assert_eq!(parser.peek_literal_token().unwrap(), "a");

        let mut parser = Parser::with_code("|x");
        assert_eq!(parser.peek_literal_token().unwrap(), "");
    }

    #[test]
    fn blank_skipping_handles_line_continuations() {
        let mut parser = Parser::with_code("  \\\n\t x");
        parser.skip_blanks().unwrap();
        assert_eq!(parser.next_char().unwrap(), Some('x'));
    }

    #[test]
    fn comment_runs_to_end_of_line() {
        let mut parser = Parser::with_code("# hello\nx");
        parser.skip_blanks_and_comment().unwrap();
        assert_eq!(parser.next_char().unwrap(), Some('\n'));
        assert_eq!(parser.next_char().unwrap(), Some('x'));
    }

    #[test]
    fn alias_substitution_splices_buffer() {
        let mut aliases = AliasSet::new();
        aliases.define("ll", "ls -l");
        let mut parser = Parser::with_aliases(Box::new(Memory::new("ll")), &aliases);

        let start = parser.buffer_position();
        let token = parser.peek_literal_token().unwrap();
        parser.consume_token(&token).unwrap();
        assert!(parser.substitute_alias(start, &token));

        let token = parser.peek_literal_token().unwrap();
        assert_eq!(token, "ls");
    }

    #[test]
    fn alias_substitution_does_not_recurse_into_itself() {
        let mut aliases = AliasSet::new();
        aliases.define("x", "x y");
        let mut parser = Parser::with_aliases(Box::new(Memory::new("x")), &aliases);

        let start = parser.buffer_position();
        parser.consume_token("x").unwrap();
        assert!(parser.substitute_alias(start, "x"));

        // The substituted text starts with the same alias name, which must
        // not be substituted again.
        let start = parser.buffer_position();
        parser.consume_token("x").unwrap();
        assert!(!parser.substitute_alias(start, "x"));
    }

    #[test]
    fn mutually_recursive_aliases_terminate() {
        let mut aliases = AliasSet::new();
        aliases.define("a", "b");
        aliases.define("b", "a c");
        let mut parser = Parser::with_aliases(Box::new(Memory::new("a")), &aliases);

        let start = parser.buffer_position();
        parser.consume_token("a").unwrap();
        assert!(parser.substitute_alias(start, "a"));

        let start = parser.buffer_position();
        parser.consume_token("b").unwrap();
        assert!(parser.substitute_alias(start, "b"));

        // "a" again, but inside its own replacement now.
        let start = parser.buffer_position();
        parser.consume_token("a").unwrap();
        assert!(!parser.substitute_alias(start, "a"));
    }
}
