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

//! Tree-drawing pretty-printer for the syntax tree
//!
//! The printer renders a [`Program`] as an indented tree with box-drawing
//! prefixes, one node per line. The output is purely informational; use the
//! [`Display`](std::fmt::Display) implementations on the syntax types to
//! render source code instead.
//!
//! ```
//! # use sedge_syntax::printer::format_tree;
//! # use sedge_syntax::syntax::Program;
//! let program: Program = "echo hi".parse().unwrap();
//! let tree = format_tree(&program);
//! assert!(tree.starts_with("program\n"));
//! ```

use crate::syntax::*;
use std::fmt::{self, Write};

/// Renders a program as a tree into a string.
///
/// This is a convenience wrapper around [`print_tree`].
#[must_use]
pub fn format_tree(program: &Program) -> String {
    let mut result = String::new();
    print_tree(program, &mut result).unwrap();
    result
}

/// Renders a program as a tree.
pub fn print_tree<W: Write>(program: &Program, out: &mut W) -> fmt::Result {
    writeln!(out, "program")?;
    let mut printer = TreePrinter {
        out,
        prefix: String::new(),
        last: true,
    };
    printer.children(&program.body, |printer, list| printer.command_list(list))
}

struct TreePrinter<'a, W: Write> {
    out: &'a mut W,
    prefix: String,
    /// Whether the node being printed is the last child of its parent
    last: bool,
}

impl<W: Write> TreePrinter<'_, W> {
    /// Prints the node labels of a child sequence, with `├─` for all but
    /// the last child and `└─` for the last.
    fn children<T, F>(&mut self, items: &[T], mut print: F) -> fmt::Result
    where
        F: FnMut(&mut Self, &T) -> fmt::Result,
    {
        for (i, item) in items.iter().enumerate() {
            let last = i + 1 == items.len();
            self.last = last;
            print(self, item)?;
        }
        Ok(())
    }

    fn node(&mut self, label: &str) -> fmt::Result {
        writeln!(
            self.out,
            "{}{}{}",
            self.prefix,
            if self.last { "└─" } else { "├─" },
            label
        )
    }

    /// Runs `body` with the prefix extended for the children of the node
    /// just printed.
    fn nested<F>(&mut self, body: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        let extension = if self.last { "  " } else { "│ " };
        let old_len = self.prefix.len();
        self.prefix.push_str(extension);
        let result = body(self);
        self.prefix.truncate(old_len);
        result
    }

    fn command_list(&mut self, list: &CommandList) -> fmt::Result {
        let label = if list.ampersand {
            "command_list &"
        } else {
            "command_list"
        };
        self.node(label)?;
        self.nested(|printer| {
            printer.last = true;
            printer.and_or(&list.and_or)
        })
    }

    fn and_or(&mut self, and_or: &AndOrList) -> fmt::Result {
        match and_or {
            AndOrList::Pipeline(pipeline) => self.pipeline(pipeline),
            AndOrList::Binop(binop) => {
                self.node(match binop.op {
                    AndOr::AndThen => "binop &&",
                    AndOr::OrElse => "binop ||",
                })?;
                self.nested(|printer| {
                    printer.last = false;
                    printer.and_or(&binop.left)?;
                    printer.last = true;
                    printer.and_or(&binop.right)
                })
            }
        }
    }

    fn pipeline(&mut self, pipeline: &Pipeline) -> fmt::Result {
        let label = if pipeline.bang { "pipeline !" } else { "pipeline" };
        self.node(label)?;
        self.nested(|printer| {
            printer.children(&pipeline.commands, |printer, command| {
                printer.command(command)
            })
        })
    }

    fn command(&mut self, command: &Command) -> fmt::Result {
        match command {
            Command::Simple(simple) => self.simple_command(simple),
            Command::BraceGroup(body) => {
                self.node("brace_group")?;
                self.nested(|printer| {
                    printer.children(body, |printer, list| printer.command_list(list))
                })
            }
            Command::Subshell(body) => {
                self.node("subshell")?;
                self.nested(|printer| {
                    printer.children(body, |printer, list| printer.command_list(list))
                })
            }
            Command::If(clause) => {
                self.node("if_clause")?;
                self.nested(|printer| {
                    printer.labeled_body("condition", &clause.condition, false)?;
                    let has_else = clause.else_part.is_some();
                    printer.labeled_body("body", &clause.body, !has_else)?;
                    if let Some(else_part) = &clause.else_part {
                        printer.last = true;
                        printer.node("else")?;
                        printer.nested(|printer| {
                            printer.last = true;
                            printer.command(else_part)
                        })?;
                    }
                    Ok(())
                })
            }
            Command::For(clause) => {
                self.node(&format!("for_clause {}", clause.name))?;
                self.nested(|printer| {
                    if let Some(words) = &clause.word_list {
                        printer.last = false;
                        printer.node("word_list")?;
                        printer.nested(|printer| {
                            printer.children(words, |printer, word| printer.word(word))
                        })?;
                    }
                    printer.labeled_body("body", &clause.body, true)
                })
            }
            Command::Loop(clause) => {
                self.node(match clause.kind {
                    LoopKind::While => "while_clause",
                    LoopKind::Until => "until_clause",
                })?;
                self.nested(|printer| {
                    printer.labeled_body("condition", &clause.condition, false)?;
                    printer.labeled_body("body", &clause.body, true)
                })
            }
            Command::Case(clause) => {
                self.node("case_clause")?;
                self.nested(|printer| {
                    printer.last = clause.items.is_empty();
                    printer.node("subject")?;
                    printer.nested(|printer| {
                        printer.last = true;
                        printer.word(&clause.subject)
                    })?;
                    printer.children(&clause.items, |printer, item| {
                        printer.node("case_item")?;
                        printer.nested(|printer| {
                            printer.last = false;
                            printer.node("patterns")?;
                            printer.nested(|printer| {
                                printer.children(&item.patterns, |printer, word| {
                                    printer.word(word)
                                })
                            })?;
                            printer.labeled_body("body", &item.body, true)
                        })
                    })
                })
            }
            Command::FunctionDefinition(def) => {
                self.node(&format!("function_definition {}", def.name))?;
                self.nested(|printer| {
                    printer.last = true;
                    printer.command(&def.body)
                })
            }
        }
    }

    /// Prints a labeled sequence of command lists as one node.
    fn labeled_body(&mut self, label: &str, body: &[CommandList], last: bool) -> fmt::Result {
        self.last = last;
        self.node(label)?;
        self.nested(|printer| printer.children(body, |printer, list| printer.command_list(list)))
    }

    fn simple_command(&mut self, simple: &SimpleCommand) -> fmt::Result {
        self.node("simple_command")?;
        self.nested(|printer| {
            let redirect_count = simple.io_redirects.len();
            let word_count = simple.name.iter().count() + simple.arguments.len();
            let mut remaining = simple.assignments.len() + word_count + redirect_count;
            for assignment in &simple.assignments {
                remaining -= 1;
                printer.last = remaining == 0;
                printer.node(&format!("assignment {}={}", assignment.name, assignment.value))?;
            }
            for word in simple.name.iter().chain(&simple.arguments) {
                remaining -= 1;
                printer.last = remaining == 0;
                printer.word(word)?;
            }
            for redirect in &simple.io_redirects {
                remaining -= 1;
                printer.last = remaining == 0;
                printer.node(&format!("io_redirect {redirect}"))?;
            }
            Ok(())
        })
    }

    fn word(&mut self, word: &Word) -> fmt::Result {
        match word {
            Word::String(s) => {
                let quoting = if s.quoted { " (quoted)" } else { "" };
                self.node(&format!("word {:?}{}", s.value, quoting))
            }
            Word::Parameter(_) | Word::CommandSubst(_) | Word::Arith(_) => {
                self.node(&format!("word {word}"))
            }
            Word::List(list) => {
                let label = if list.double_quoted {
                    "word_list (double-quoted)"
                } else {
                    "word_list"
                };
                self.node(label)?;
                self.nested(|printer| {
                    printer.children(&list.children, |printer, child| printer.word(child))
                })
            }
        }
    }
}
