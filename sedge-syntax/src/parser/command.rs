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

//! Parsing commands
//!
//! A command is either a simple command, a compound command, or a function
//! definition. Compound commands are recognized by a reserved word in
//! command-leading position; reserved words anywhere else are ordinary
//! words. The terminating words of compound commands (`}`, `fi`, `done`,
//! `esac`, `then`, `do`, `elif`, `else`, `in`) end the enclosing command
//! list and are consumed by the parser of the enclosing construct.

use super::core::{Parser, PendingHereDoc, Rec};
use super::error::Result;
use super::error::SyntaxError::*;
use super::word::{here_doc_delimiter, is_name};
use crate::syntax::*;

/// Reserved words that terminate an enclosing construct.
pub(super) const TERMINATOR_KEYWORDS: &[&str] = &[
    "}", "then", "else", "elif", "fi", "do", "done", "esac", "in",
];

impl<'a> Parser<'a> {
    /// Parses a command at the current position.
    ///
    /// Returns `Ok(Parsed(None))` if the current position does not start a
    /// command, which is the case at an operator, a separator, a
    /// terminating reserved word, or the end of input. Returns
    /// `Ok(AliasSubstituted)` if the command word named an alias; the
    /// caller must restart parsing so reserved words coming out of the
    /// substitution are recognized in the caller's context.
    pub fn command(&mut self) -> Result<Rec<Option<Command>>> {
        self.skip_blanks_and_comment()?;

        if self.peek_char()? == Some('(') {
            return self.subshell().map(Some).map(Rec::Parsed);
        }

        let token = self.peek_literal_token()?;
        match token.as_str() {
            "{" => return self.brace_group().map(Some).map(Rec::Parsed),
            "if" => return self.if_clause().map(Some).map(Rec::Parsed),
            "while" => return self.loop_clause(LoopKind::While).map(Some).map(Rec::Parsed),
            "until" => return self.loop_clause(LoopKind::Until).map(Some).map(Rec::Parsed),
            "for" => return self.for_clause().map(Some).map(Rec::Parsed),
            "case" => return self.case_clause().map(Some).map(Rec::Parsed),
            _ if TERMINATOR_KEYWORDS.contains(&token.as_str()) => return Ok(Rec::Parsed(None)),
            "" => match self.peek_char()? {
                None | Some('\n' | '\r' | ';' | '&' | '|' | ')') => return Ok(Rec::Parsed(None)),
                _ => return self.simple_command().map(Rec::Parsed),
            },
            _ => {}
        }

        // The token would be the command name; substitute an alias if one
        // applies.
        if self.literal_token_is_whole_word(&token)? {
            let start = self.buffer_position();
            let saved = self.save();
            self.consume_token(&token)?;
            if self.substitute_alias(start, &token) {
                return Ok(Rec::AliasSubstituted);
            }
            self.rewind(saved);
        }

        self.simple_command().map(Rec::Parsed)
    }

    /// Parses a command, transparently restarting over alias substitutions.
    ///
    /// This is for contexts where nothing between the caller and the
    /// command would change meaning under substitution. The pipeline parser
    /// cannot use it because a substitution may produce a leading `!`.
    pub(super) fn command_resolved(&mut self) -> Result<Option<Command>> {
        loop {
            match self.command()? {
                Rec::AliasSubstituted => {}
                Rec::Parsed(result) => return Ok(result),
            }
        }
    }

    /// Tests whether the literal token at the current position is a whole
    /// word, i.e., is followed by a blank, operator, newline, or the end of
    /// input rather than by a quotation or expansion.
    fn literal_token_is_whole_word(&mut self, token: &str) -> Result<bool> {
        let rest = self.peek_rest(token.len() + 4)?;
        Ok(match rest[token.len()..].chars().next() {
            None => true,
            Some(c) => matches!(
                c,
                ' ' | '\t' | '\n' | '\r' | ';' | '&' | '|' | '<' | '>' | '(' | ')'
            ),
        })
    }

    /// Parses a simple command: assignments, words, and redirections in any
    /// order, with the first non-assignment word being the command name.
    fn simple_command(&mut self) -> Result<Option<Command>> {
        let mut command = SimpleCommand::default();
        loop {
            self.skip_blanks_and_comment()?;

            if let Some(redirect) = self.io_redirect()? {
                command.io_redirects.push(redirect);
                continue;
            }

            match self.peek_char()? {
                None | Some('\n' | '\r' | ';' | '&' | '|' | ')') => break,
                Some('(') => break,
                _ => {}
            }

            if command.name.is_none() {
                if let Some(name) = self.assignment_prefix()? {
                    let location = self.location();
                    let value = self
                        .word()?
                        .unwrap_or_else(|| Word::from_plain("", location));
                    command.assignments.push(Assignment { name, value });
                    continue;
                }
            }

            let word_start = self.buffer_position();
            let Some(word) = self.word()? else { break };

            if command.name.is_some() {
                command.arguments.push(word);
                continue;
            }

            // Command-name position. The first word of the command was
            // already offered for alias substitution by `command`; a name
            // that only comes after assignments or redirections is offered
            // here.
            if !command.assignments.is_empty() || !command.io_redirects.is_empty() {
                if let Some(literal) = word.to_string_if_literal() {
                    if self.substitute_alias(word_start, &literal) {
                        continue;
                    }
                }
            }

            // A name followed by `()` is a function definition, but only if
            // nothing else has been parsed into the command yet.
            if command.is_empty() {
                let saved = self.save();
                self.skip_blanks()?;
                if self.peek_char()? == Some('(') && !self.starts_with("((")? {
                    self.next_char()?;
                    self.skip_blanks()?;
                    if self.peek_char()? == Some(')') {
                        self.next_char()?;
                        return self.function_definition(word).map(Some);
                    }
                }
                self.rewind(saved);
            }

            command.name = Some(word);
        }

        if command.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Command::Simple(command)))
        }
    }

    /// Parses the body of a function definition, after `name()` has been
    /// consumed.
    fn function_definition(&mut self, name_word: Word) -> Result<Command> {
        let name_location = *name_word.location();
        let name = match name_word.to_string_if_literal() {
            Some(name) if is_name(name.as_str()) => name,
            _ => return self.raise(InvalidFunctionName, name_location),
        };
        self.linebreak()?;
        let body_location = self.location();
        let Some(body) = self.command_resolved()? else {
            return self.raise(MissingFunctionBody, body_location);
        };
        Ok(Command::FunctionDefinition(FunctionDefinition {
            name,
            body: std::rc::Rc::new(body),
        }))
    }

    /// Parses an assignment prefix `name=` if the current position starts
    /// one. Returns the name with the `=` consumed.
    fn assignment_prefix(&mut self) -> Result<Option<String>> {
        let saved = self.save();
        let mut name = String::new();
        match self.peek_char()? {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                name.push(c);
                self.next_char()?;
            }
            _ => return Ok(None),
        }
        while let Some(c) = self.peek_char()? {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
                self.next_char()?;
            } else {
                break;
            }
        }
        if self.peek_char()? == Some('=') {
            self.next_char()?;
            Ok(Some(name))
        } else {
            self.rewind(saved);
            Ok(None)
        }
    }

    /// Parses a redirection if the current position starts one.
    ///
    /// Leading digits are only an `io_number` when directly followed by a
    /// redirection operator; otherwise they begin an ordinary word and the
    /// position is rewound.
    pub(super) fn io_redirect(&mut self) -> Result<Option<IoRedirect>> {
        let saved = self.save();
        let fd_location = self.location();
        let mut digits = String::new();
        while let Some(c) = self.peek_char()? {
            if c.is_ascii_digit() {
                digits.push(c);
                self.next_char()?;
            } else {
                break;
            }
        }
        if !matches!(self.peek_char()?, Some('<' | '>')) {
            self.rewind(saved);
            return Ok(None);
        }
        let fd = if digits.is_empty() {
            None
        } else {
            match digits.parse() {
                Ok(number) => Some(Fd(number)),
                Err(_) => return self.raise(FdOutOfRange, fd_location),
            }
        };

        let op_location = self.location();
        let op = if self.consume_str("<<-")? {
            RedirOp::HereDocRemoveTabs
        } else if self.consume_str("<<")? {
            RedirOp::HereDoc
        } else if self.consume_str("<&")? {
            RedirOp::FdIn
        } else if self.consume_str("<>")? {
            RedirOp::FileInOut
        } else if self.consume_str("<")? {
            RedirOp::FileIn
        } else if self.consume_str(">>")? {
            RedirOp::FileAppend
        } else if self.consume_str(">|")? {
            RedirOp::FileClobber
        } else if self.consume_str(">&")? {
            RedirOp::FdOut
        } else {
            self.consume_str(">")?;
            RedirOp::FileOut
        };

        self.skip_blanks()?;
        let operand_location = self.location();
        let Some(name) = self.word()? else {
            let cause = if op.is_here_doc() {
                MissingHereDocDelimiter
            } else {
                MissingRedirOperand
            };
            return self.raise(cause, operand_location);
        };

        let redirect = IoRedirect::new(fd, op, name);
        if op.is_here_doc() {
            let (delimiter, quoted) = here_doc_delimiter(&redirect.name);
            self.push_pending_here_doc(PendingHereDoc {
                content: redirect.here_document.clone(),
                delimiter,
                remove_tabs: op == RedirOp::HereDocRemoveTabs,
                quoted,
                location: op_location,
            });
        }
        Ok(Some(redirect))
    }

    /// Parses a subshell starting at `(`.
    fn subshell(&mut self) -> Result<Command> {
        let opening_location = self.location();
        self.next_char()?; // (
        let body = self.compound_list()?;
        if !self.consume_str(")")? {
            return self.raise(UnclosedSubshell { opening_location }, opening_location);
        }
        if body.is_empty() {
            return self.raise(EmptySubshell, opening_location);
        }
        Ok(Command::Subshell(body))
    }

    /// Parses a brace group starting at `{`.
    fn brace_group(&mut self) -> Result<Command> {
        let opening_location = self.location();
        self.consume_token("{")?;
        let body = self.compound_list()?;
        if !self.expect_keyword("}")? {
            return self.raise(UnclosedGrouping { opening_location }, opening_location);
        }
        if body.is_empty() {
            return self.raise(EmptyGrouping, opening_location);
        }
        Ok(Command::BraceGroup(body))
    }

    /// Parses an `if` command starting at the `if` reserved word.
    fn if_clause(&mut self) -> Result<Command> {
        let opening_location = self.location();
        self.consume_token("if")?;
        let condition = self.compound_list()?;
        if condition.is_empty() {
            return self.raise(EmptyIfCondition, opening_location);
        }
        if !self.expect_keyword("then")? {
            let location = self.location();
            return self.raise(
                IfMissingThen {
                    if_location: opening_location,
                },
                location,
            );
        }
        let body = self.compound_list()?;
        if body.is_empty() {
            return self.raise(EmptyIfBody, opening_location);
        }
        let else_part = self.if_tail()?;
        if !self.expect_keyword("fi")? {
            return self.raise(UnclosedIf { opening_location }, opening_location);
        }
        Ok(Command::If(IfClause {
            condition,
            body,
            else_part,
        }))
    }

    /// Parses the `elif`/`else` tail of an `if` command. An `elif` becomes a
    /// nested `if` command in the else position.
    fn if_tail(&mut self) -> Result<Option<Box<Command>>> {
        let token = self.peek_literal_token()?;
        match token.as_str() {
            "elif" => {
                let elif_location = self.location();
                self.consume_token("elif")?;
                let condition = self.compound_list()?;
                if condition.is_empty() {
                    return self.raise(EmptyIfCondition, elif_location);
                }
                if !self.expect_keyword("then")? {
                    let location = self.location();
                    return self.raise(
                        IfMissingThen {
                            if_location: elif_location,
                        },
                        location,
                    );
                }
                let body = self.compound_list()?;
                if body.is_empty() {
                    return self.raise(EmptyIfBody, elif_location);
                }
                let else_part = self.if_tail()?;
                Ok(Some(Box::new(Command::If(IfClause {
                    condition,
                    body,
                    else_part,
                }))))
            }
            "else" => {
                let else_location = self.location();
                self.consume_token("else")?;
                let body = self.compound_list()?;
                if body.is_empty() {
                    return self.raise(EmptyIfBody, else_location);
                }
                Ok(Some(Box::new(Command::BraceGroup(body))))
            }
            _ => Ok(None),
        }
    }

    /// Parses a `while` or `until` command.
    fn loop_clause(&mut self, kind: LoopKind) -> Result<Command> {
        let opening_location = self.location();
        self.consume_token(match kind {
            LoopKind::While => "while",
            LoopKind::Until => "until",
        })?;
        let condition = self.compound_list()?;
        if condition.is_empty() {
            let cause = match kind {
                LoopKind::While => EmptyWhileCondition,
                LoopKind::Until => EmptyUntilCondition,
            };
            return self.raise(cause, opening_location);
        }
        let body = self.do_group(kind_unclosed(kind, opening_location), opening_location)?;
        Ok(Command::Loop(LoopClause {
            kind,
            condition,
            body,
        }))
    }

    /// Parses a `for` command.
    fn for_clause(&mut self) -> Result<Command> {
        let opening_location = self.location();
        self.consume_token("for")?;
        self.skip_blanks()?;

        let name_location = self.location();
        let name = self.peek_literal_token()?;
        if name.is_empty() {
            return self.raise(MissingForName, name_location);
        }
        if !is_name(&name) {
            return self.raise(InvalidForName, name_location);
        }
        self.consume_token(&name)?;

        self.skip_blanks()?;
        if self.peek_char()? == Some(';') && !self.starts_with(";;")? {
            self.next_char()?;
        }
        self.linebreak()?;

        let word_list = if self.peek_literal_token()? == "in" {
            self.consume_token("in")?;
            let mut words = Vec::new();
            loop {
                self.skip_blanks_and_comment()?;
                match self.peek_char()? {
                    Some(';') => {
                        self.next_char()?;
                        break;
                    }
                    None | Some('\n' | '\r') => break,
                    _ => match self.word()? {
                        Some(word) => words.push(word),
                        None => break,
                    },
                }
            }
            self.linebreak()?;
            Some(words)
        } else {
            None
        };

        let body = self.do_group(
            MissingForBody { opening_location },
            opening_location,
        )?;
        Ok(Command::For(ForClause {
            name,
            word_list,
            body,
        }))
    }

    /// Parses `do ... done`.
    fn do_group(
        &mut self,
        missing_do: super::error::SyntaxError,
        opening_location: crate::source::Location,
    ) -> Result<Vec<CommandList>> {
        if !self.expect_keyword("do")? {
            let location = self.location();
            return self.raise(missing_do, location);
        }
        let body = self.compound_list()?;
        if !self.expect_keyword("done")? {
            return self.raise(UnclosedDoClause { opening_location }, opening_location);
        }
        if body.is_empty() {
            return self.raise(EmptyDoClause, opening_location);
        }
        Ok(body)
    }

    /// Parses a `case` command.
    fn case_clause(&mut self) -> Result<Command> {
        let opening_location = self.location();
        self.consume_token("case")?;
        self.skip_blanks()?;

        let subject_location = self.location();
        let Some(subject) = self.word()? else {
            return self.raise(MissingCaseSubject, subject_location);
        };

        self.linebreak()?;
        if !self.expect_keyword("in")? {
            return self.raise(MissingIn { opening_location }, opening_location);
        }
        self.linebreak()?;

        let mut items = Vec::new();
        loop {
            if self.peek_literal_token()? == "esac" {
                self.consume_token("esac")?;
                break;
            }
            if self.peek_char()?.is_none() {
                return self.raise(UnclosedCase { opening_location }, opening_location);
            }

            if self.peek_char()? == Some('(') {
                self.next_char()?;
            }

            let mut patterns = Vec::new();
            loop {
                self.skip_blanks()?;
                let pattern_location = self.location();
                let Some(pattern) = self.word()? else {
                    return self.raise(MissingPattern, pattern_location);
                };
                patterns.push(pattern);
                self.skip_blanks()?;
                if self.peek_char()? == Some('|') && !self.starts_with("||")? {
                    self.next_char()?;
                } else {
                    break;
                }
            }
            if !self.consume_str(")")? {
                let location = self.location();
                return self.raise(UnclosedPatternList, location);
            }

            let body = self.compound_list()?;
            items.push(CaseItem { patterns, body });

            if self.consume_str(";;")? {
                self.linebreak()?;
                continue;
            }
            if self.peek_literal_token()? == "esac" {
                self.consume_token("esac")?;
                break;
            }
            return self.raise(UnclosedCase { opening_location }, opening_location);
        }
        Ok(Command::Case(CaseClause { subject, items }))
    }

    /// Consumes the given reserved word if it is the next token.
    pub(super) fn expect_keyword(&mut self, keyword: &str) -> Result<bool> {
        if self.peek_literal_token()? == keyword {
            self.consume_token(keyword)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// Maps a loop kind to its missing-`do` error.
fn kind_unclosed(
    kind: LoopKind,
    opening_location: crate::source::Location,
) -> super::error::SyntaxError {
    match kind {
        LoopKind::While => UnclosedWhileClause { opening_location },
        LoopKind::Until => UnclosedUntilClause { opening_location },
    }
}
