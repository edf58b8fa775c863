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

//! Evaluation of arithmetic expression trees

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::env::Env;
use crate::{Error, ErrorCause};
use std::ops::Range;

fn overflow<T, E>(result: Option<T>, location: &Range<usize>) -> Result<T, Error<E>> {
    result.ok_or_else(|| Error {
        cause: ErrorCause::Overflow,
        location: location.clone(),
    })
}

/// Resolves a variable to a number.
///
/// An unset variable and a variable with an empty value evaluate to 0, as
/// if the variable had never been assigned.
fn resolve<E: Env>(
    name: &str,
    location: &Range<usize>,
    env: &E,
) -> Result<i64, Error<E::Error>> {
    let value = env.get_variable(name).map_err(|e| Error {
        cause: ErrorCause::Env(e),
        location: location.clone(),
    })?;
    match value.map(str::trim) {
        None | Some("") => Ok(0),
        Some(value) => value.parse().map_err(|_| Error {
            cause: ErrorCause::InvalidVariableValue(value.to_string()),
            location: location.clone(),
        }),
    }
}

fn apply_binary<E>(
    op: BinaryOp,
    lhs: i64,
    rhs: i64,
    location: &Range<usize>,
) -> Result<i64, Error<E>> {
    use BinaryOp::*;
    Ok(match op {
        Multiply => overflow(lhs.checked_mul(rhs), location)?,
        Divide => {
            if rhs == 0 {
                return Err(Error {
                    cause: ErrorCause::DivisionByZero,
                    location: location.clone(),
                });
            }
            overflow(lhs.checked_div(rhs), location)?
        }
        Remainder => {
            if rhs == 0 {
                return Err(Error {
                    cause: ErrorCause::DivisionByZero,
                    location: location.clone(),
                });
            }
            overflow(lhs.checked_rem(rhs), location)?
        }
        Add => overflow(lhs.checked_add(rhs), location)?,
        Subtract => overflow(lhs.checked_sub(rhs), location)?,
        ShiftLeft => {
            let amount = overflow(u32::try_from(rhs).ok(), location)?;
            let result = overflow(lhs.checked_shl(amount), location)?;
            if result >> amount != lhs {
                return Err(Error {
                    cause: ErrorCause::Overflow,
                    location: location.clone(),
                });
            }
            result
        }
        ShiftRight => {
            let amount = overflow(u32::try_from(rhs).ok(), location)?;
            overflow(lhs.checked_shr(amount), location)?
        }
        Less => (lhs < rhs) as i64,
        LessEqual => (lhs <= rhs) as i64,
        Greater => (lhs > rhs) as i64,
        GreaterEqual => (lhs >= rhs) as i64,
        Equal => (lhs == rhs) as i64,
        NotEqual => (lhs != rhs) as i64,
        BitwiseAnd => lhs & rhs,
        BitwiseXor => lhs ^ rhs,
        BitwiseOr => lhs | rhs,
        // The logical operators never reach this function; they are
        // evaluated with short-circuiting in `eval_expr`.
        LogicalAnd | LogicalOr => unreachable!("logical operator in apply_binary"),
    })
}

/// Evaluates an expression tree.
pub fn eval_expr<E: Env>(expr: &Expr, env: &mut E) -> Result<i64, Error<E::Error>> {
    match expr {
        Expr::Literal { value, .. } => Ok(*value),

        Expr::Variable { name, location } => resolve(name, location, env),

        Expr::Unary {
            op,
            operand,
            location,
        } => {
            let value = eval_expr(operand, env)?;
            Ok(match op {
                UnaryOp::Plus => value,
                UnaryOp::Negate => overflow(value.checked_neg(), location)?,
                UnaryOp::BitwiseNot => !value,
                UnaryOp::LogicalNot => (value == 0) as i64,
            })
        }

        Expr::Binary {
            op: BinaryOp::LogicalAnd,
            lhs,
            rhs,
            ..
        } => {
            if eval_expr(lhs, env)? == 0 {
                Ok(0)
            } else {
                Ok((eval_expr(rhs, env)? != 0) as i64)
            }
        }

        Expr::Binary {
            op: BinaryOp::LogicalOr,
            lhs,
            rhs,
            ..
        } => {
            if eval_expr(lhs, env)? != 0 {
                Ok(1)
            } else {
                Ok((eval_expr(rhs, env)? != 0) as i64)
            }
        }

        Expr::Binary {
            op,
            lhs,
            rhs,
            location,
        } => {
            let lhs = eval_expr(lhs, env)?;
            let rhs = eval_expr(rhs, env)?;
            apply_binary(*op, lhs, rhs, location)
        }

        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if eval_expr(condition, env)? != 0 {
                eval_expr(then, env)
            } else {
                eval_expr(otherwise, env)
            }
        }

        Expr::Assignment {
            name,
            op,
            value,
            location,
        } => {
            let value = match op {
                None => eval_expr(value, env)?,
                Some(op) => {
                    let old = resolve(name, location, env)?;
                    let operand = eval_expr(value, env)?;
                    apply_binary(*op, old, operand, location)?
                }
            };
            env.assign_variable(name, value.to_string())
                .map_err(|e| Error {
                    cause: ErrorCause::Env(e),
                    location: location.clone(),
                })?;
            Ok(value)
        }
    }
}
