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

//! This crate implements shell arithmetic expansion: the evaluation of
//! `$(( ... ))` expressions.
//!
//! An expression is [parsed](parse) into an [`Expr`] tree and then
//! [evaluated](eval_expr) against an [`Env`] that resolves and assigns
//! variables. The [`eval`] function combines the two steps:
//!
//! ```
//! # use std::collections::HashMap;
//! let env = &mut HashMap::new();
//! env.insert("x".to_string(), "6".to_string());
//! assert_eq!(sedge_arith::eval("x * 7", env), Ok(42));
//! assert_eq!(sedge_arith::eval("y = x + 1", env), Ok(7));
//! assert_eq!(env["y"], "7");
//! ```
//!
//! Arithmetic is signed 64-bit with checked overflow. The `&&`, `||` and
//! `? :` operators evaluate only the subexpressions they need to, so side
//! effects in skipped branches do not happen.

use std::fmt::Display;
use std::ops::Range;
use thiserror::Error as ThisError;

mod ast;
mod env;
mod eval;
mod token;

pub use ast::{parse, BinaryOp, Expr, UnaryOp};
pub use env::Env;
pub use eval::eval_expr;
pub use token::TokenError;

/// Syntax error in an arithmetic expression
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, ThisError)]
pub enum SyntaxError {
    /// Error in tokenization
    #[error(transparent)]
    Token(#[from] TokenError),
    /// An operator is missing its operand.
    #[error("operand missing")]
    MissingOperand,
    /// A `(` lacks a closing `)`.
    #[error("unmatched parenthesis")]
    UnclosedParenthesis,
    /// A `?` lacks the `:` of the conditional operator.
    #[error("`:` missing in conditional expression")]
    MissingColon,
    /// The left-hand side of an assignment is not a variable.
    #[error("assignment target is not a variable")]
    AssignmentToNonVariable,
    /// A token remains after the expression.
    #[error("unexpected token")]
    UnexpectedToken,
}

/// Syntax error with its location
#[derive(Clone, Debug, Eq, Hash, PartialEq, ThisError)]
#[error("{cause}")]
pub struct ParseError {
    /// Cause of the error
    pub cause: SyntaxError,
    /// Range of the substring where the error occurred
    pub location: Range<usize>,
}

impl From<token::Error> for ParseError {
    fn from(error: token::Error) -> Self {
        ParseError {
            cause: error.cause.into(),
            location: error.location,
        }
    }
}

/// Cause of an arithmetic expansion error
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ErrorCause<E> {
    /// Error in tokenization or parsing
    Syntax(SyntaxError),
    /// A variable value that is not a valid number
    InvalidVariableValue(String),
    /// Result out of bounds
    Overflow,
    /// Division by zero
    DivisionByZero,
    /// Error reading or assigning a variable
    Env(E),
}

impl<E: Display> Display for ErrorCause<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ErrorCause::*;
        match self {
            Syntax(e) => e.fmt(f),
            InvalidVariableValue(v) => {
                write!(f, "variable value {v:?} cannot be parsed as a number")
            }
            Overflow => "overflow".fmt(f),
            DivisionByZero => "division by zero".fmt(f),
            Env(e) => e.fmt(f),
        }
    }
}

/// Description of an error that occurred during expansion
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Error<E> {
    /// Cause of the error
    pub cause: ErrorCause<E>,
    /// Range of the substring in the evaluated expression string where the
    /// error occurred
    pub location: Range<usize>,
}

impl<E: Display> Display for Error<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.cause.fmt(f)
    }
}

impl<E: std::fmt::Debug + Display> std::error::Error for Error<E> {}

impl<E> From<ParseError> for Error<E> {
    fn from(error: ParseError) -> Self {
        Error {
            cause: ErrorCause::Syntax(error.cause),
            location: error.location,
        }
    }
}

/// Performs arithmetic expansion: parses and evaluates an expression.
pub fn eval<E: Env>(expression: &str, env: &mut E) -> Result<i64, Error<E::Error>> {
    let expr = parse(expression)?;
    eval_expr(&expr, env)
}
