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

//! Arithmetic expression trees and their parser
//!
//! [`parse`] turns an expression string into an [`Expr`] tree by recursive
//! descent with precedence climbing. Parsing does not touch variables;
//! evaluation is a separate walk over the tree so conditional operators can
//! skip subtrees entirely.

use crate::token::{Operator, Token, TokenValue, Tokens};
use crate::{ParseError, SyntaxError};
use std::ops::Range;

/// Unary operator
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UnaryOp {
    /// `+`
    Plus,
    /// `-`
    Negate,
    /// `~`
    BitwiseNot,
    /// `!`
    LogicalNot,
}

/// Binary operator
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BinaryOp {
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Remainder,
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `<<`
    ShiftLeft,
    /// `>>`
    ShiftRight,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `&`
    BitwiseAnd,
    /// `^`
    BitwiseXor,
    /// `|`
    BitwiseOr,
    /// `&&`
    LogicalAnd,
    /// `||`
    LogicalOr,
}

/// Node of an arithmetic expression tree
///
/// Every node carries the index range of the substring it was parsed from,
/// which evaluation errors point back at.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Expr {
    /// Integer constant
    Literal { value: i64, location: Range<usize> },
    /// Variable reference
    Variable { name: String, location: Range<usize> },
    /// Application of a unary operator
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        location: Range<usize>,
    },
    /// Application of a binary operator
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        location: Range<usize>,
    },
    /// Ternary conditional `condition ? then : otherwise`
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// Assignment, plain (`=`) or compound (e.g. `+=`)
    Assignment {
        /// Variable assigned to
        name: String,
        /// Operator applied between the old value and the operand for a
        /// compound assignment; `None` for plain `=`
        op: Option<BinaryOp>,
        value: Box<Expr>,
        location: Range<usize>,
    },
}

impl Expr {
    /// Returns the source range the node was parsed from.
    #[must_use]
    pub fn location(&self) -> Range<usize> {
        match self {
            Expr::Literal { location, .. }
            | Expr::Variable { location, .. }
            | Expr::Unary { location, .. }
            | Expr::Binary { location, .. }
            | Expr::Assignment { location, .. } => location.clone(),
            Expr::Conditional { condition, .. } => condition.location(),
        }
    }
}

/// Maps an operator token to a binary operator and its precedence.
///
/// Higher numbers bind tighter. Assignment and conditional operators are
/// not in this table; they are handled by dedicated productions.
fn binary_operator(operator: Operator) -> Option<(BinaryOp, u8)> {
    use Operator::*;
    Some(match operator {
        Asterisk => (BinaryOp::Multiply, 13),
        Slash => (BinaryOp::Divide, 13),
        Percent => (BinaryOp::Remainder, 13),
        Plus => (BinaryOp::Add, 12),
        Minus => (BinaryOp::Subtract, 12),
        LessLess => (BinaryOp::ShiftLeft, 11),
        GreaterGreater => (BinaryOp::ShiftRight, 11),
        Less => (BinaryOp::Less, 10),
        LessEqual => (BinaryOp::LessEqual, 10),
        Greater => (BinaryOp::Greater, 10),
        GreaterEqual => (BinaryOp::GreaterEqual, 10),
        EqualEqual => (BinaryOp::Equal, 9),
        BangEqual => (BinaryOp::NotEqual, 9),
        And => (BinaryOp::BitwiseAnd, 8),
        Caret => (BinaryOp::BitwiseXor, 7),
        Bar => (BinaryOp::BitwiseOr, 6),
        AndAnd => (BinaryOp::LogicalAnd, 5),
        BarBar => (BinaryOp::LogicalOr, 4),
        _ => return None,
    })
}

/// Maps an operator token to the binary operator of a compound assignment.
fn assignment_operator(operator: Operator) -> Option<Option<BinaryOp>> {
    use Operator::*;
    Some(match operator {
        Equal => None,
        AsteriskEqual => Some(BinaryOp::Multiply),
        SlashEqual => Some(BinaryOp::Divide),
        PercentEqual => Some(BinaryOp::Remainder),
        PlusEqual => Some(BinaryOp::Add),
        MinusEqual => Some(BinaryOp::Subtract),
        LessLessEqual => Some(BinaryOp::ShiftLeft),
        GreaterGreaterEqual => Some(BinaryOp::ShiftRight),
        AndEqual => Some(BinaryOp::BitwiseAnd),
        CaretEqual => Some(BinaryOp::BitwiseXor),
        BarEqual => Some(BinaryOp::BitwiseOr),
        _ => return None,
    })
}

struct ExprParser<'a> {
    tokens: Tokens<'a>,
    peeked: Option<Token<'a>>,
}

impl<'a> ExprParser<'a> {
    fn peek(&mut self) -> Result<&Token<'a>, ParseError> {
        if self.peeked.is_none() {
            self.peeked = Some(self.tokens.next_token()?);
        }
        Ok(self.peeked.as_ref().unwrap())
    }

    fn next(&mut self) -> Result<Token<'a>, ParseError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => Ok(self.tokens.next_token()?),
        }
    }

    /// `assignment := conditional | variable assign-op assignment`
    fn assignment(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.conditional()?;
        let op = match self.peek()?.value {
            TokenValue::Operator(operator) => match assignment_operator(operator) {
                Some(op) => op,
                None => return Ok(lhs),
            },
            _ => return Ok(lhs),
        };
        let token = self.next()?;
        match lhs {
            Expr::Variable { name, .. } => {
                let value = self.assignment()?;
                Ok(Expr::Assignment {
                    name,
                    op,
                    value: Box::new(value),
                    location: token.location,
                })
            }
            _ => Err(ParseError {
                cause: SyntaxError::AssignmentToNonVariable,
                location: token.location,
            }),
        }
    }

    /// `conditional := binary ('?' assignment ':' conditional)?`
    fn conditional(&mut self) -> Result<Expr, ParseError> {
        let condition = self.binary(1)?;
        if self.peek()?.value != TokenValue::Operator(Operator::Question) {
            return Ok(condition);
        }
        self.next()?;
        let then = self.assignment()?;
        let colon = self.next()?;
        if colon.value != TokenValue::Operator(Operator::Colon) {
            return Err(ParseError {
                cause: SyntaxError::MissingColon,
                location: colon.location,
            });
        }
        let otherwise = self.conditional()?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    /// Parses binary operators with precedence not below `min_precedence`.
    fn binary(&mut self, min_precedence: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.leaf()?;
        loop {
            let TokenValue::Operator(operator) = self.peek()?.value else {
                return Ok(lhs);
            };
            let Some((op, precedence)) = binary_operator(operator) else {
                return Ok(lhs);
            };
            if precedence < min_precedence {
                return Ok(lhs);
            }
            let token = self.next()?;
            let rhs = self.binary(precedence + 1)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                location: token.location,
            };
        }
    }

    /// Parses a constant, variable, parenthesized expression, or unary
    /// application.
    fn leaf(&mut self) -> Result<Expr, ParseError> {
        let token = self.next()?;
        match token.value {
            TokenValue::Number(value) => Ok(Expr::Literal {
                value,
                location: token.location,
            }),
            TokenValue::Name(name) => Ok(Expr::Variable {
                name: name.to_string(),
                location: token.location,
            }),
            TokenValue::Operator(Operator::OpenParen) => {
                let inner = self.assignment()?;
                let close = self.next()?;
                if close.value != TokenValue::Operator(Operator::CloseParen) {
                    return Err(ParseError {
                        cause: SyntaxError::UnclosedParenthesis,
                        location: token.location,
                    });
                }
                Ok(inner)
            }
            TokenValue::Operator(operator) => {
                let op = match operator {
                    Operator::Plus => UnaryOp::Plus,
                    Operator::Minus => UnaryOp::Negate,
                    Operator::Tilde => UnaryOp::BitwiseNot,
                    Operator::Bang => UnaryOp::LogicalNot,
                    _ => {
                        return Err(ParseError {
                            cause: SyntaxError::MissingOperand,
                            location: token.location,
                        });
                    }
                };
                let operand = self.leaf()?;
                Ok(Expr::Unary {
                    op,
                    operand: Box::new(operand),
                    location: token.location,
                })
            }
            TokenValue::EndOfInput => Err(ParseError {
                cause: SyntaxError::MissingOperand,
                location: token.location,
            }),
        }
    }
}

/// Parses an arithmetic expression into a tree.
pub fn parse(expression: &str) -> Result<Expr, ParseError> {
    let mut parser = ExprParser {
        tokens: Tokens::new(expression),
        peeked: None,
    };
    let expr = parser.assignment()?;
    let trailing = parser.next()?;
    if trailing.value != TokenValue::EndOfInput {
        return Err(ParseError {
            cause: SyntaxError::UnexpectedToken,
            location: trailing.location,
        });
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn precedence_shapes_the_tree() {
        let expr = parse("1+2*3").unwrap();
        assert_matches!(expr, Expr::Binary { op: BinaryOp::Add, rhs, .. } => {
            assert_matches!(*rhs, Expr::Binary { op: BinaryOp::Multiply, .. });
        });
    }

    #[test]
    fn same_precedence_associates_left() {
        let expr = parse("10-4-3").unwrap();
        assert_matches!(expr, Expr::Binary { op: BinaryOp::Subtract, lhs, .. } => {
            assert_matches!(*lhs, Expr::Binary { op: BinaryOp::Subtract, .. });
        });
    }

    #[test]
    fn unary_operators_nest() {
        let expr = parse("- ~ x").unwrap();
        assert_matches!(expr, Expr::Unary { op: UnaryOp::Negate, operand, .. } => {
            assert_matches!(*operand, Expr::Unary { op: UnaryOp::BitwiseNot, .. });
        });
    }

    #[test]
    fn conditional_is_right_associative() {
        let expr = parse("a ? 1 : b ? 2 : 3").unwrap();
        assert_matches!(expr, Expr::Conditional { otherwise, .. } => {
            assert_matches!(*otherwise, Expr::Conditional { .. });
        });
    }

    #[test]
    fn compound_assignment() {
        let expr = parse("x += 2").unwrap();
        assert_matches!(expr, Expr::Assignment { name, op, .. } => {
            assert_eq!(name, "x");
            assert_eq!(op, Some(BinaryOp::Add));
        });
    }

    #[test]
    fn chained_assignment_is_right_associative() {
        let expr = parse("x = y = 1").unwrap();
        assert_matches!(expr, Expr::Assignment { name, value, .. } => {
            assert_eq!(name, "x");
            assert_matches!(*value, Expr::Assignment { .. });
        });
    }

    #[test]
    fn assignment_to_non_variable_is_an_error() {
        let error = parse("1 = 2").unwrap_err();
        assert_eq!(error.cause, SyntaxError::AssignmentToNonVariable);
        assert_eq!(error.location, 2..3);
    }

    #[test]
    fn missing_colon() {
        let error = parse("1 ? 2").unwrap_err();
        assert_eq!(error.cause, SyntaxError::MissingColon);
    }

    #[test]
    fn trailing_token_is_an_error() {
        let error = parse("1 2").unwrap_err();
        assert_eq!(error.cause, SyntaxError::UnexpectedToken);
        assert_eq!(error.location, 2..3);
    }

    #[test]
    fn unclosed_parenthesis() {
        let error = parse("(1+2").unwrap_err();
        assert_eq!(error.cause, SyntaxError::UnclosedParenthesis);
        assert_eq!(error.location, 0..1);
    }
}
