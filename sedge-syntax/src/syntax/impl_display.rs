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

//! Implementations of [`Display`] for the shell language syntax types
//!
//! The rendering is always single-line source code. Here-document contents
//! are omitted; only the operator and delimiter are printed. Re-parsing the
//! rendered code of a program without here-documents yields a structurally
//! equivalent program.

use super::*;
use itertools::Itertools;
use std::fmt::{self, Display, Formatter, Write};

/// Writes a quoted string, escaping as required by the quoting context.
///
/// Outside double quotes, the value is rendered single-quoted, splitting
/// around embedded single quotes. Inside double quotes, single quotes would
/// be literal characters, so the value is rendered with backslash escapes
/// instead.
fn fmt_quoted(value: &str, double_quoted: bool, f: &mut Formatter<'_>) -> fmt::Result {
    if double_quoted {
        for c in value.chars() {
            if matches!(c, '$' | '`' | '"' | '\\') {
                f.write_char('\\')?;
            }
            f.write_char(c)?;
        }
        Ok(())
    } else if value.contains('\'') {
        for (i, part) in value.split('\'').enumerate() {
            if i > 0 {
                f.write_str("\\'")?;
            }
            if !part.is_empty() {
                write!(f, "'{part}'")?;
            }
        }
        Ok(())
    } else {
        write!(f, "'{value}'")
    }
}

fn fmt_word_in(word: &Word, double_quoted: bool, f: &mut Formatter<'_>) -> fmt::Result {
    match word {
        Word::String(s) => {
            if s.quoted {
                fmt_quoted(&s.value, double_quoted, f)
            } else {
                f.write_str(&s.value)
            }
        }
        Word::Parameter(p) => p.fmt(f),
        Word::CommandSubst(c) => c.fmt(f),
        Word::Arith(a) => a.fmt(f),
        Word::List(l) => {
            if l.double_quoted {
                f.write_char('"')?;
            }
            for child in &l.children {
                fmt_word_in(child, double_quoted || l.double_quoted, f)?;
            }
            if l.double_quoted {
                f.write_char('"')?;
            }
            Ok(())
        }
    }
}

impl Display for Word {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt_word_in(self, false, f)
    }
}

impl ParamOp {
    /// Returns the operator's source form, without the colon.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        use ParamOp::*;
        match self {
            None => "",
            Default => "-",
            Assign => "=",
            Error => "?",
            Alternative => "+",
            RemoveSmallestSuffix => "%",
            RemoveLargestSuffix => "%%",
            RemoveSmallestPrefix => "#",
            RemoveLargestPrefix => "##",
            Length => "#",
        }
    }
}

impl Display for WordParameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.op {
            ParamOp::None => {
                // Braces are required when a name character could follow,
                // but for a lone expansion the short form suffices.
                write!(f, "${{{}}}", self.name)
            }
            ParamOp::Length => write!(f, "${{#{}}}", self.name),
            op => {
                write!(f, "${{{}", self.name)?;
                if self.colon {
                    f.write_char(':')?;
                }
                f.write_str(op.as_str())?;
                if let Some(arg) = &self.arg {
                    arg.fmt(f)?;
                }
                f.write_char('}')
            }
        }
    }
}

impl Display for CommandSubst {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.back_quoted {
            f.write_char('`')?;
            for c in self.program.chars() {
                if matches!(c, '$' | '`' | '\\') {
                    f.write_char('\\')?;
                }
                f.write_char(c)?;
            }
            f.write_char('`')
        } else {
            write!(f, "$({})", self.program)
        }
    }
}

impl Display for WordArith {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "$(({}))", self.expression)
    }
}

impl Display for RedirOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use RedirOp::*;
        f.write_str(match self {
            FileIn => "<",
            FileInOut => "<>",
            FileOut => ">",
            FileClobber => ">|",
            FileAppend => ">>",
            FdIn => "<&",
            FdOut => ">&",
            HereDoc => "<<",
            HereDocRemoveTabs => "<<-",
        })
    }
}

impl Display for IoRedirect {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(fd) = self.fd {
            write!(f, "{fd}")?;
        }
        write!(f, "{}{}", self.op, self.name)
    }
}

impl Display for Assignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

impl Display for SimpleCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        for assignment in &self.assignments {
            parts.push(assignment.to_string());
        }
        if let Some(name) = &self.name {
            parts.push(name.to_string());
        }
        for argument in &self.arguments {
            parts.push(argument.to_string());
        }
        for redirect in &self.io_redirects {
            parts.push(redirect.to_string());
        }
        f.write_str(&parts.iter().format(" ").to_string())
    }
}

/// Writes a command list sequence the way it appears inside a compound
/// command: items separated and terminated as needed.
fn fmt_body(body: &[CommandList], f: &mut Formatter<'_>) -> fmt::Result {
    for (i, list) in body.iter().enumerate() {
        if i > 0 {
            f.write_char(' ')?;
        }
        list.fmt(f)?;
        if !list.ampersand {
            f.write_char(';')?;
        }
    }
    Ok(())
}

/// Writes a command list sequence without terminating the last item, for
/// contexts followed by `;;` or the end of the rendering.
fn fmt_body_bare(body: &[CommandList], f: &mut Formatter<'_>) -> fmt::Result {
    for (i, list) in body.iter().enumerate() {
        if i > 0 {
            f.write_char(' ')?;
        }
        list.fmt(f)?;
        if i + 1 < body.len() && !list.ampersand {
            f.write_char(';')?;
        }
    }
    Ok(())
}

impl Display for IfClause {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("if ")?;
        fmt_body(&self.condition, f)?;
        f.write_str(" then ")?;
        fmt_body(&self.body, f)?;
        let mut else_part = &self.else_part;
        while let Some(command) = else_part {
            match &**command {
                Command::If(elif) => {
                    f.write_str(" elif ")?;
                    fmt_body(&elif.condition, f)?;
                    f.write_str(" then ")?;
                    fmt_body(&elif.body, f)?;
                    else_part = &elif.else_part;
                }
                other => {
                    f.write_str(" else ")?;
                    match other {
                        Command::BraceGroup(body) => fmt_body(body, f)?,
                        other => write!(f, "{other};")?,
                    }
                    break;
                }
            }
        }
        f.write_str(" fi")
    }
}

impl Display for ForClause {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "for {}", self.name)?;
        if let Some(words) = &self.word_list {
            write!(f, " in {};", words.iter().format(" "))?;
        } else {
            f.write_char(';')?;
        }
        f.write_str(" do ")?;
        fmt_body(&self.body, f)?;
        f.write_str(" done")
    }
}

impl Display for LoopClause {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self.kind {
            LoopKind::While => "while ",
            LoopKind::Until => "until ",
        })?;
        fmt_body(&self.condition, f)?;
        f.write_str(" do ")?;
        fmt_body(&self.body, f)?;
        f.write_str(" done")
    }
}

impl Display for CaseClause {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "case {} in", self.subject)?;
        for item in &self.items {
            write!(f, " ({})", item.patterns.iter().format(" | "))?;
            if !item.body.is_empty() {
                f.write_char(' ')?;
                fmt_body_bare(&item.body, f)?;
            }
            f.write_str(";;")?;
        }
        f.write_str(" esac")
    }
}

impl Display for FunctionDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}() {}", self.name, self.body)
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Command::Simple(c) => c.fmt(f),
            Command::BraceGroup(body) => {
                f.write_str("{ ")?;
                fmt_body(body, f)?;
                f.write_str(" }")
            }
            Command::Subshell(body) => {
                f.write_char('(')?;
                fmt_body(body, f)?;
                f.write_char(')')
            }
            Command::If(c) => c.fmt(f),
            Command::For(c) => c.fmt(f),
            Command::Loop(c) => c.fmt(f),
            Command::Case(c) => c.fmt(f),
            Command::FunctionDefinition(c) => c.fmt(f),
        }
    }
}

impl Display for Pipeline {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.bang {
            f.write_str("! ")?;
        }
        write!(f, "{}", self.commands.iter().format(" | "))
    }
}

impl Display for AndOr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AndOr::AndThen => "&&",
            AndOr::OrElse => "||",
        })
    }
}

impl Display for AndOrList {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AndOrList::Pipeline(p) => p.fmt(f),
            AndOrList::Binop(b) => write!(f, "{} {} {}", b.left, b.op, b.right),
        }
    }
}

impl Display for CommandList {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.and_or.fmt(f)?;
        if self.ampersand {
            f.write_str(" &")?;
        }
        Ok(())
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt_body_bare(&self.body, f)
    }
}
