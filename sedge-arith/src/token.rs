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

//! Tokenization of arithmetic expressions

use std::ops::Range;
use thiserror::Error;

/// Operator token
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operator {
    /// `?`
    Question,
    /// `:`
    Colon,
    /// `|`
    Bar,
    /// `||`
    BarBar,
    /// `|=`
    BarEqual,
    /// `^`
    Caret,
    /// `^=`
    CaretEqual,
    /// `&`
    And,
    /// `&&`
    AndAnd,
    /// `&=`
    AndEqual,
    /// `=`
    Equal,
    /// `==`
    EqualEqual,
    /// `!`
    Bang,
    /// `!=`
    BangEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `<<`
    LessLess,
    /// `<<=`
    LessLessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `>>`
    GreaterGreater,
    /// `>>=`
    GreaterGreaterEqual,
    /// `+`
    Plus,
    /// `+=`
    PlusEqual,
    /// `-`
    Minus,
    /// `-=`
    MinusEqual,
    /// `*`
    Asterisk,
    /// `*=`
    AsteriskEqual,
    /// `/`
    Slash,
    /// `/=`
    SlashEqual,
    /// `%`
    Percent,
    /// `%=`
    PercentEqual,
    /// `~`
    Tilde,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
}

/// Value of a [`Token`]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TokenValue<'a> {
    /// Integer constant
    Number(i64),
    /// Variable name
    Name(&'a str),
    /// Operator
    Operator(Operator),
    /// Imaginary token value for the end of input
    EndOfInput,
}

/// Atomic lexical element of an expression
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Token<'a> {
    /// Token value
    pub value: TokenValue<'a>,
    /// Range of the substring where the token occurs in the parsed
    /// expression
    pub location: Range<usize>,
}

/// Cause of a tokenization error
#[derive(Clone, Copy, Debug, Eq, Error, Hash, PartialEq)]
pub enum TokenError {
    /// A numeric constant contains an invalid digit.
    #[error("invalid numeric constant")]
    InvalidNumericConstant,
    /// The expression contains a character that is not a whitespace,
    /// operator, number, or name.
    #[error("invalid character")]
    InvalidCharacter,
}

/// Tokenization error with its location
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Error {
    /// Cause of the error
    pub cause: TokenError,
    /// Range of the substring where the error occurred
    pub location: Range<usize>,
}

/// List of all the operators.
///
/// If a prefix of a valid operator is another operator, the longer operator
/// must appear before the shorter so a scan can stop at the first match.
const OPERATORS: &[(&str, Operator)] = &[
    ("?", Operator::Question),
    (":", Operator::Colon),
    ("|=", Operator::BarEqual),
    ("||", Operator::BarBar),
    ("|", Operator::Bar),
    ("^=", Operator::CaretEqual),
    ("^", Operator::Caret),
    ("&=", Operator::AndEqual),
    ("&&", Operator::AndAnd),
    ("&", Operator::And),
    ("==", Operator::EqualEqual),
    ("=", Operator::Equal),
    ("!=", Operator::BangEqual),
    ("!", Operator::Bang),
    ("<<=", Operator::LessLessEqual),
    ("<<", Operator::LessLess),
    ("<=", Operator::LessEqual),
    ("<", Operator::Less),
    (">>=", Operator::GreaterGreaterEqual),
    (">>", Operator::GreaterGreater),
    (">=", Operator::GreaterEqual),
    (">", Operator::Greater),
    ("+=", Operator::PlusEqual),
    ("+", Operator::Plus),
    ("-=", Operator::MinusEqual),
    ("-", Operator::Minus),
    ("*=", Operator::AsteriskEqual),
    ("*", Operator::Asterisk),
    ("/=", Operator::SlashEqual),
    ("/", Operator::Slash),
    ("%=", Operator::PercentEqual),
    ("%", Operator::Percent),
    ("~", Operator::Tilde),
    ("(", Operator::OpenParen),
    (")", Operator::CloseParen),
];

/// Iterator extracting tokens from a string
///
/// The iterator never runs out: once the input is exhausted it keeps
/// yielding tokens with [`TokenValue::EndOfInput`].
#[derive(Clone, Debug)]
pub struct Tokens<'a> {
    source: &'a str,
    index: usize,
}

impl<'a> Tokens<'a> {
    /// Creates a tokenizer for the given expression.
    pub fn new(source: &'a str) -> Self {
        Tokens { source, index: 0 }
    }

    /// Extracts the next token.
    pub fn next_token(&mut self) -> Result<Token<'a>, Error> {
        let rest = self.source[self.index..].trim_start();
        let start = self.source.len() - rest.len();
        let Some(first_char) = rest.chars().next() else {
            self.index = self.source.len();
            return Ok(Token {
                value: TokenValue::EndOfInput,
                location: start..start,
            });
        };

        if let Some(&(lexeme, operator)) = OPERATORS
            .iter()
            .find(|&&(lexeme, _)| rest.starts_with(lexeme))
        {
            let location = start..start + lexeme.len();
            self.index = location.end;
            return Ok(Token {
                value: TokenValue::Operator(operator),
                location,
            });
        }

        if first_char.is_ascii_digit() {
            // The whole alphanumeric run is the constant, so "08" and
            // "123x" are errors rather than two adjacent tokens.
            let len = rest
                .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
                .unwrap_or(rest.len());
            let (digits, radix) = if let Some(hex) = rest[..len].strip_prefix("0x") {
                (hex, 16)
            } else if let Some(hex) = rest[..len].strip_prefix("0X") {
                (hex, 16)
            } else if rest[..len].len() > 1 && rest.starts_with('0') {
                (&rest[1..len], 8)
            } else {
                (&rest[..len], 10)
            };
            let location = start..start + len;
            self.index = location.end;
            return match i64::from_str_radix(digits, radix) {
                Ok(number) => Ok(Token {
                    value: TokenValue::Number(number),
                    location,
                }),
                Err(_) => Err(Error {
                    cause: TokenError::InvalidNumericConstant,
                    location,
                }),
            };
        }

        if first_char.is_ascii_alphabetic() || first_char == '_' {
            let len = rest
                .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
                .unwrap_or(rest.len());
            let location = start..start + len;
            self.index = location.end;
            return Ok(Token {
                value: TokenValue::Name(&self.source[location.clone()]),
                location,
            });
        }

        Err(Error {
            cause: TokenError::InvalidCharacter,
            location: start..start + first_char.len_utf8(),
        })
    }
}
