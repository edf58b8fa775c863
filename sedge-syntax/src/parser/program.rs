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

//! Parsing pipelines, and-or lists, and whole programs

use super::command::TERMINATOR_KEYWORDS;
use super::error::Result;
use super::error::SyntaxError::*;
use crate::syntax::*;

impl<'a> super::Parser<'a> {
    /// Consumes newlines, blanks, and comments.
    ///
    /// Consuming a newline also reads the bodies of any here-documents
    /// whose operators appeared on the finished line.
    pub(super) fn linebreak(&mut self) -> Result<()> {
        loop {
            self.skip_blanks_and_comment()?;
            if matches!(self.peek_char()?, Some('\n' | '\r')) {
                self.next_char()?;
                self.here_doc_contents()?;
            } else {
                return Ok(());
            }
        }
    }

    /// Parses a sequence of command lists up to a closing token.
    ///
    /// The sequence ends at the end of input, at `)`, at `;;`, or at a
    /// terminating reserved word, none of which is consumed.
    pub(super) fn compound_list(&mut self) -> Result<Vec<CommandList>> {
        let mut items = Vec::new();
        loop {
            self.linebreak()?;
            match self.peek_char()? {
                None | Some(')') => break,
                _ => {}
            }
            if self.starts_with(";;")? {
                break;
            }
            let token = self.peek_literal_token()?;
            if TERMINATOR_KEYWORDS.contains(&token.as_str()) {
                break;
            }
            let Some(item) = self.command_list()? else { break };
            items.push(item);
        }
        Ok(items)
    }

    /// Parses an and-or list with its `;` or `&` separator, if any.
    fn command_list(&mut self) -> Result<Option<CommandList>> {
        let Some(and_or) = self.and_or()? else {
            return Ok(None);
        };
        self.skip_blanks_and_comment()?;
        let mut ampersand = false;
        match self.peek_char()? {
            Some('&') if !self.starts_with("&&")? => {
                self.next_char()?;
                ampersand = true;
            }
            Some(';') if !self.starts_with(";;")? => {
                self.next_char()?;
            }
            _ => {}
        }
        Ok(Some(CommandList { and_or, ampersand }))
    }

    /// Parses pipelines joined by `&&` and `||`.
    ///
    /// The operators have equal precedence and associate to the left, so
    /// the tree leans left and evaluation order is source order.
    fn and_or(&mut self) -> Result<Option<AndOrList>> {
        let Some(first) = self.pipeline()? else {
            return Ok(None);
        };
        let mut result = AndOrList::Pipeline(first);
        loop {
            self.skip_blanks()?;
            let op = if self.consume_str("&&")? {
                AndOr::AndThen
            } else if self.consume_str("||")? {
                AndOr::OrElse
            } else {
                return Ok(Some(result));
            };
            self.linebreak()?;
            let location = self.location();
            let Some(next) = self.pipeline()? else {
                return self.raise(MissingPipeline(op), location);
            };
            result = AndOrList::Binop(Binop {
                op,
                left: Box::new(result),
                right: Box::new(AndOrList::Pipeline(next)),
            });
        }
    }

    /// Parses a pipeline: an optional `!` followed by commands joined by
    /// `|`.
    ///
    /// The `!` check repeats after every alias substitution, so an alias
    /// expanding to `! command` negates the pipeline.
    fn pipeline(&mut self) -> Result<Option<Pipeline>> {
        let mut bang = false;
        let first = loop {
            self.skip_blanks_and_comment()?;
            if !bang && self.peek_literal_token()? == "!" {
                self.consume_token("!")?;
                bang = true;
                continue;
            }
            match self.command()? {
                super::core::Rec::AliasSubstituted => {}
                super::core::Rec::Parsed(Some(command)) => break command,
                super::core::Rec::Parsed(None) => {
                    if bang {
                        let location = self.location();
                        return self.raise(MissingCommandAfterBang, location);
                    }
                    return Ok(None);
                }
            }
        };

        let mut commands = vec![first];
        loop {
            self.skip_blanks_and_comment()?;
            if self.peek_char()? == Some('|') && !self.starts_with("||")? {
                self.next_char()?;
                self.linebreak()?;
                let location = self.location();
                let Some(next) = self.command_resolved()? else {
                    return self.raise(MissingCommandAfterBar, location);
                };
                commands.push(next);
            } else {
                return Ok(Some(Pipeline { commands, bang }));
            }
        }
    }

    /// Parses a whole program, to the end of input.
    ///
    /// Once this function has failed, calling it again returns the same
    /// error without reading further input.
    pub fn program(&mut self) -> Result<Program> {
        if let Some(error) = self.take_latched_error() {
            return Err(error);
        }

        let body = self.compound_list()?;

        if self.has_pending_here_docs() {
            // The input ended on the line of a here-document operator.
            let location = self.first_pending_here_doc_location().unwrap();
            return self.raise(
                UnclosedHereDocContent {
                    redir_op_location: location,
                },
                location,
            );
        }
        if self.peek_char()?.is_some() {
            let location = self.location();
            return self.raise(RedundantToken, location);
        }
        Ok(Program { body })
    }
}

#[cfg(test)]
mod tests {
    use super::super::Parser;
    use crate::alias::AliasSet;
    use crate::input::Memory;
    use crate::syntax::*;
    use assert_matches::assert_matches;

    fn parse(code: &str) -> Program {
        let mut parser = Parser::with_code(code);
        parser.program().unwrap()
    }

    fn parse_err(code: &str) -> super::super::Error {
        let mut parser = Parser::with_code(code);
        parser.program().unwrap_err()
    }

    fn only_simple(program: &Program) -> &SimpleCommand {
        assert_eq!(program.body.len(), 1);
        assert_matches!(&program.body[0].and_or, AndOrList::Pipeline(p) => {
            assert_eq!(p.commands.len(), 1);
            assert_matches!(&p.commands[0], Command::Simple(simple) => simple)
        })
    }

    #[test]
    fn simple_command_with_arguments() {
        let program = parse("echo hello world");
        let simple = only_simple(&program);
        assert_eq!(
            simple.name.as_ref().unwrap().to_string_if_literal().unwrap(),
            "echo"
        );
        assert_eq!(simple.arguments.len(), 2);
    }

    #[test]
    fn assignments_and_redirections() {
        let program = parse("A=1 B=$A cmd arg 2>err <in");
        let simple = only_simple(&program);
        assert_eq!(simple.assignments.len(), 2);
        assert_eq!(simple.assignments[0].name, "A");
        assert_eq!(simple.io_redirects.len(), 2);
        assert_eq!(simple.io_redirects[0].fd, Some(Fd(2)));
        assert_eq!(simple.io_redirects[0].op, RedirOp::FileOut);
        assert_eq!(simple.io_redirects[1].fd, None);
        assert_eq!(simple.io_redirects[1].op, RedirOp::FileIn);
    }

    #[test]
    fn assignment_only_command() {
        let program = parse("x=42");
        let simple = only_simple(&program);
        assert!(simple.name.is_none());
        assert_eq!(simple.assignments.len(), 1);
    }

    #[test]
    fn word_with_digits_is_not_io_number() {
        let program = parse("echo 2x >out");
        let simple = only_simple(&program);
        assert_eq!(simple.arguments.len(), 1);
        assert_eq!(simple.io_redirects.len(), 1);
        assert_eq!(simple.io_redirects[0].fd, None);
    }

    #[test]
    fn pipeline_and_negation() {
        let program = parse("! a | b | c");
        assert_matches!(&program.body[0].and_or, AndOrList::Pipeline(p) => {
            assert!(p.bang);
            assert_eq!(p.commands.len(), 3);
        });
    }

    #[test]
    fn and_or_list_is_left_associative() {
        let program = parse("a && b || c");
        assert_matches!(&program.body[0].and_or, AndOrList::Binop(outer) => {
            assert_eq!(outer.op, AndOr::OrElse);
            assert_matches!(&*outer.left, AndOrList::Binop(inner) => {
                assert_eq!(inner.op, AndOr::AndThen);
            });
            assert_matches!(&*outer.right, AndOrList::Pipeline(_));
        });
    }

    #[test]
    fn asynchronous_list() {
        let program = parse("a & b");
        assert_eq!(program.body.len(), 2);
        assert!(program.body[0].ampersand);
        assert!(!program.body[1].ampersand);
    }

    #[test]
    fn newlines_separate_lists() {
        let program = parse("a\nb\n\nc\n");
        assert_eq!(program.body.len(), 3);
    }

    #[test]
    fn comments_are_skipped() {
        let program = parse("a # comment\nb");
        assert_eq!(program.body.len(), 2);
    }

    #[test]
    fn brace_group_and_subshell() {
        let program = parse("{ a; b; }");
        assert_matches!(&program.body[0].and_or, AndOrList::Pipeline(p) => {
            assert_matches!(&p.commands[0], Command::BraceGroup(body) => {
                assert_eq!(body.len(), 2);
            });
        });

        let program = parse("(a; b)");
        assert_matches!(&program.body[0].and_or, AndOrList::Pipeline(p) => {
            assert_matches!(&p.commands[0], Command::Subshell(body) => {
                assert_eq!(body.len(), 2);
            });
        });
    }

    #[test]
    fn if_with_elif_and_else() {
        let program = parse("if a; then b; elif c; then d; else e; fi");
        assert_matches!(&program.body[0].and_or, AndOrList::Pipeline(p) => {
            assert_matches!(&p.commands[0], Command::If(clause) => {
                assert_eq!(clause.condition.len(), 1);
                assert_eq!(clause.body.len(), 1);
                assert_matches!(clause.else_part.as_deref(), Some(Command::If(elif)) => {
                    assert_matches!(
                        elif.else_part.as_deref(),
                        Some(Command::BraceGroup(body)) => assert_eq!(body.len(), 1)
                    );
                });
            });
        });
    }

    #[test]
    fn while_and_until_loops() {
        let program = parse("while a; do b; done");
        assert_matches!(&program.body[0].and_or, AndOrList::Pipeline(p) => {
            assert_matches!(&p.commands[0], Command::Loop(clause) => {
                assert_eq!(clause.kind, LoopKind::While);
            });
        });

        let program = parse("until a\ndo b\ndone");
        assert_matches!(&program.body[0].and_or, AndOrList::Pipeline(p) => {
            assert_matches!(&p.commands[0], Command::Loop(clause) => {
                assert_eq!(clause.kind, LoopKind::Until);
            });
        });
    }

    #[test]
    fn for_loop_with_word_list() {
        let program = parse("for x in a b c; do echo $x; done");
        assert_matches!(&program.body[0].and_or, AndOrList::Pipeline(p) => {
            assert_matches!(&p.commands[0], Command::For(clause) => {
                assert_eq!(clause.name, "x");
                assert_eq!(clause.word_list.as_ref().unwrap().len(), 3);
            });
        });
    }

    #[test]
    fn for_loop_over_positional_parameters() {
        let program = parse("for x; do echo $x; done");
        assert_matches!(&program.body[0].and_or, AndOrList::Pipeline(p) => {
            assert_matches!(&p.commands[0], Command::For(clause) => {
                assert_eq!(clause.word_list, None);
            });
        });

        let program = parse("for x do echo $x; done");
        assert_matches!(&program.body[0].and_or, AndOrList::Pipeline(p) => {
            assert_matches!(&p.commands[0], Command::For(clause) => {
                assert_eq!(clause.word_list, None);
            });
        });
    }

    #[test]
    fn case_command() {
        let program = parse("case $x in (a|b) echo ab;; c) echo c;; esac");
        assert_matches!(&program.body[0].and_or, AndOrList::Pipeline(p) => {
            assert_matches!(&p.commands[0], Command::Case(clause) => {
                assert_eq!(clause.items.len(), 2);
                assert_eq!(clause.items[0].patterns.len(), 2);
                assert_eq!(clause.items[1].patterns.len(), 1);
            });
        });
    }

    #[test]
    fn case_with_empty_item_body() {
        let program = parse("case x in a) ;; esac");
        assert_matches!(&program.body[0].and_or, AndOrList::Pipeline(p) => {
            assert_matches!(&p.commands[0], Command::Case(clause) => {
                assert!(clause.items[0].body.is_empty());
            });
        });
    }

    #[test]
    fn function_definition() {
        let program = parse("greet() { echo hi; }");
        assert_matches!(&program.body[0].and_or, AndOrList::Pipeline(p) => {
            assert_matches!(&p.commands[0], Command::FunctionDefinition(def) => {
                assert_eq!(def.name, "greet");
                assert_matches!(&*def.body, Command::BraceGroup(_));
            });
        });
    }

    #[test]
    fn keywords_are_only_reserved_in_command_position() {
        let program = parse("echo if then fi");
        let simple = only_simple(&program);
        assert_eq!(simple.arguments.len(), 3);
    }

    #[test]
    fn here_document() {
        let program = parse("cat <<EOF\nhello $x\nEOF\n");
        let simple = only_simple(&program);
        let redirect = &simple.io_redirects[0];
        assert_eq!(redirect.op, RedirOp::HereDoc);
        let lines = redirect.here_document_lines();
        assert_eq!(lines.len(), 1);
        assert_matches!(&lines[0], Word::List(l) => {
            assert_matches!(&l.children[1], Word::Parameter(param) => {
                assert_eq!(param.name, "x");
            });
        });
    }

    #[test]
    fn here_document_with_quoted_delimiter_is_literal() {
        let program = parse("cat <<'EOF'\nhello $x\nEOF\n");
        let simple = only_simple(&program);
        let lines = simple.io_redirects[0].here_document_lines();
        assert_matches!(&lines[0], Word::String(s) => {
            assert_eq!(s.value, "hello $x");
            assert!(s.quoted);
        });
    }

    #[test]
    fn here_document_remove_tabs() {
        let program = parse("cat <<-EOF\n\t\tindented\n\tEOF\n");
        let simple = only_simple(&program);
        let lines = simple.io_redirects[0].here_document_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].to_string_if_literal().unwrap(), "indented");
    }

    #[test]
    fn two_here_documents_on_one_line() {
        let program = parse("cat <<ONE; cat <<TWO\n1\nONE\n2\nTWO\n");
        assert_eq!(program.body.len(), 2);
    }

    #[test]
    fn unterminated_here_document() {
        let error = parse_err("cat <<EOF\nbody\n");
        assert_matches!(
            error.cause,
            super::super::ErrorCause::Syntax(
                super::super::SyntaxError::UnclosedHereDocContent { .. }
            )
        );
    }

    #[test]
    fn here_document_without_newline_is_an_error() {
        let error = parse_err("cat <<EOF");
        assert_matches!(
            error.cause,
            super::super::ErrorCause::Syntax(
                super::super::SyntaxError::UnclosedHereDocContent { .. }
            )
        );
    }

    #[test]
    fn error_is_latched() {
        let mut parser = Parser::with_code("if true; fi");
        let error = parser.program().unwrap_err();
        let again = parser.program().unwrap_err();
        assert_eq!(error, again);
    }

    #[test]
    fn error_location_points_at_line_and_column() {
        let error = parse_err("echo ok\necho 'unterminated");
        assert_eq!(error.location.line.get(), 2);
        assert_eq!(error.location.column.get(), 6);
    }

    #[test]
    fn redundant_token_error() {
        let error = parse_err("fi");
        assert_matches!(
            error.cause,
            super::super::ErrorCause::Syntax(super::super::SyntaxError::RedundantToken)
        );
    }

    #[test]
    fn alias_substitution_in_command_position() {
        let mut aliases = AliasSet::new();
        aliases.define("ll", "ls -l");
        let mut parser = Parser::with_aliases(Box::new(Memory::new("ll /tmp")), &aliases);
        let program = parser.program().unwrap();
        let simple = only_simple(&program);
        assert_eq!(
            simple.name.as_ref().unwrap().to_string_if_literal().unwrap(),
            "ls"
        );
        assert_eq!(simple.arguments.len(), 2);
    }

    #[test]
    fn alias_expanding_to_reserved_word() {
        let mut aliases = AliasSet::new();
        aliases.define("negate", "! true");
        let mut parser = Parser::with_aliases(Box::new(Memory::new("negate")), &aliases);
        let program = parser.program().unwrap();
        assert_matches!(&program.body[0].and_or, AndOrList::Pipeline(p) => {
            assert!(p.bang);
        });
    }

    #[test]
    fn alias_is_not_substituted_in_argument_position() {
        let mut aliases = AliasSet::new();
        aliases.define("ll", "ls -l");
        let mut parser = Parser::with_aliases(Box::new(Memory::new("echo ll")), &aliases);
        let program = parser.program().unwrap();
        let simple = only_simple(&program);
        assert_eq!(
            simple.arguments[0].to_string_if_literal().unwrap(),
            "ll"
        );
    }

    #[test]
    fn round_trip_through_display() {
        for code in [
            "echo hello world",
            "a && b || c",
            "! a | b",
            "x=1 cmd <in >out 2>&1",
            "if a; then b; elif c; then d; else e; fi",
            "while a; do b; done",
            "for x in a b; do echo $x; done",
            "case $x in (a | b) echo ab;; esac",
            "greet() { echo hi; }",
            "(a; b) & c",
            "echo \"quoted $x\" 'literal'",
            "echo ${foo:-bar} $(cmd arg) $((1 + 2))",
        ] {
            let first: Program = code.parse().unwrap();
            let printed = first.to_string();
            let second: Program = printed.parse().unwrap();
            assert_eq!(printed, second.to_string(), "source: {code:?}");
        }
    }
}
