use crate::ast::nodes::{BinaryOp, Expr, ExprKind, Literal, UnaryOp};

use super::builtins::ParamKind;
use super::types::TypeTag;

// Pure operator/type rules, independent of traversal. Callers attach spans.

/// Numeric widening: `Double` wins over `Int`.
pub fn widen_numeric(left: TypeTag, right: TypeTag) -> TypeTag {
    if left == TypeTag::Double || right == TypeTag::Double {
        TypeTag::Double
    } else {
        TypeTag::Int
    }
}

/// Result type of a binary operation over two inferred tags.
///
/// When either side is indefinite (`Unknown`/`Void`) the check is skipped:
/// relational, equality, and logical operators still produce `Bool`,
/// everything else produces `Unknown`.
pub fn binary_result(left: TypeTag, op: BinaryOp, right: TypeTag) -> Result<TypeTag, String> {
    if left.is_indefinite() || right.is_indefinite() {
        return Ok(match op {
            BinaryOp::Lt
            | BinaryOp::Lte
            | BinaryOp::Gt
            | BinaryOp::Gte
            | BinaryOp::Eq
            | BinaryOp::Neq
            | BinaryOp::And
            | BinaryOp::Or => TypeTag::Bool,
            _ => TypeTag::Unknown,
        });
    }

    match op {
        BinaryOp::Add => match (left, right) {
            (l, r) if l.is_numeric() && r.is_numeric() => Ok(widen_numeric(l, r)),
            (TypeTag::String, TypeTag::String) => Ok(TypeTag::String),
            _ => Err(mismatch(op, left, right)),
        },
        BinaryOp::Sub | BinaryOp::Div => {
            if left.is_numeric() && right.is_numeric() {
                Ok(widen_numeric(left, right))
            } else {
                Err(mismatch(op, left, right))
            }
        }
        // Repetition accepts (String, Int) in either order once types are
        // inferred; the literal-only rule below is stricter.
        BinaryOp::Mul => match (left, right) {
            (l, r) if l.is_numeric() && r.is_numeric() => Ok(widen_numeric(l, r)),
            (TypeTag::String, TypeTag::Int) | (TypeTag::Int, TypeTag::String) => {
                Ok(TypeTag::String)
            }
            _ => Err(mismatch(op, left, right)),
        },
        BinaryOp::Concat => match (left, right) {
            (TypeTag::String, TypeTag::String) => Ok(TypeTag::String),
            _ => Err(mismatch(op, left, right)),
        },
        BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
            if left.is_numeric() && right.is_numeric() {
                Ok(TypeTag::Bool)
            } else {
                Err(mismatch(op, left, right))
            }
        }
        // Equality is legal between any two known types.
        BinaryOp::Eq | BinaryOp::Neq => Ok(TypeTag::Bool),
        BinaryOp::And | BinaryOp::Or => match (left, right) {
            (TypeTag::Bool, TypeTag::Bool) => Ok(TypeTag::Bool),
            _ => Err(format!(
                "operator '{}' requires Bool operands, got {} and {}",
                op.symbol(),
                left.display_name(),
                right.display_name()
            )),
        },
    }
}

/// Result type of a unary operation.
pub fn unary_result(op: UnaryOp, operand: TypeTag) -> Result<TypeTag, String> {
    match op {
        UnaryOp::Not | UnaryOp::NotNull => Ok(TypeTag::Bool),
        UnaryOp::Neg => {
            if operand.is_indefinite() {
                Ok(TypeTag::Unknown)
            } else if operand.is_numeric() {
                Ok(operand)
            } else {
                Err(format!(
                    "operator '-' cannot be applied to {}",
                    operand.display_name()
                ))
            }
        }
    }
}

/// Update a symbol's tag from an assignment's right-hand side.
///
/// A concrete tag never jumps to an unrelated concrete tag directly: it
/// adopts when the current tag is vacant (`Unknown`/`Void`/`Null`), widens
/// within numerics, stays on agreement, and otherwise degrades to `Unknown`.
pub fn learn(current: TypeTag, incoming: TypeTag) -> TypeTag {
    if incoming.is_indefinite() {
        return current;
    }
    if matches!(current, TypeTag::Unknown | TypeTag::Void | TypeTag::Null) {
        return incoming;
    }
    if current.is_numeric() && incoming.is_numeric() {
        return widen_numeric(current, incoming);
    }
    if current == incoming {
        return current;
    }
    TypeTag::Unknown
}

fn mismatch(op: BinaryOp, left: TypeTag, right: TypeTag) -> String {
    format!(
        "operator '{}' cannot be applied to {} and {}",
        op.symbol(),
        left.display_name(),
        right.display_name()
    )
}

// ============================================================================
// Literal-only fast checks (declaration pass)
// ============================================================================

/// Coarse kind of a pure literal expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Double,
    Str,
    Bool,
    Null,
}

impl LitKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, LitKind::Int | LitKind::Double)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            LitKind::Int => "int",
            LitKind::Double => "double",
            LitKind::Str => "string",
            LitKind::Bool => "bool",
            LitKind::Null => "null",
        }
    }
}

/// Reduce an expression to a literal kind, or `None` if any part of it is
/// not a pure literal. Identifiers, calls, ternaries, and type tests all
/// defer to the resolution pass.
pub fn literal_kind(expr: &Expr) -> Option<LitKind> {
    match &expr.kind {
        ExprKind::Literal(lit) => Some(match lit {
            Literal::Null => LitKind::Null,
            Literal::Int(_) => LitKind::Int,
            Literal::Double(_) => LitKind::Double,
            Literal::String(_) => LitKind::Str,
            Literal::Bool(_) => LitKind::Bool,
        }),
        ExprKind::Grouping(inner) => literal_kind(inner),
        ExprKind::Unary { op, operand } => {
            let kind = literal_kind(operand)?;
            match op {
                UnaryOp::Neg if kind.is_numeric() => Some(kind),
                UnaryOp::Not if kind == LitKind::Bool => Some(LitKind::Bool),
                UnaryOp::NotNull => Some(LitKind::Bool),
                _ => None,
            }
        }
        ExprKind::Binary { left, op, right } => {
            let lk = literal_kind(left)?;
            let rk = literal_kind(right)?;
            match op {
                BinaryOp::Add => match (lk, rk) {
                    (l, r) if l.is_numeric() && r.is_numeric() => Some(widen_lit(l, r)),
                    (LitKind::Str, LitKind::Str) => Some(LitKind::Str),
                    _ => None,
                },
                BinaryOp::Sub | BinaryOp::Div => {
                    if lk.is_numeric() && rk.is_numeric() {
                        Some(widen_lit(lk, rk))
                    } else {
                        None
                    }
                }
                BinaryOp::Mul => match (lk, rk) {
                    (l, r) if l.is_numeric() && r.is_numeric() => Some(widen_lit(l, r)),
                    (LitKind::Str, LitKind::Int) => Some(LitKind::Str),
                    _ => None,
                },
                BinaryOp::Concat => match (lk, rk) {
                    (LitKind::Str, LitKind::Str) => Some(LitKind::Str),
                    _ => None,
                },
                BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
                    if lk.is_numeric() && rk.is_numeric() {
                        Some(LitKind::Bool)
                    } else {
                        None
                    }
                }
                BinaryOp::Eq | BinaryOp::Neq => Some(LitKind::Bool),
                BinaryOp::And | BinaryOp::Or => match (lk, rk) {
                    (LitKind::Bool, LitKind::Bool) => Some(LitKind::Bool),
                    _ => None,
                },
            }
        }
        _ => None,
    }
}

/// Legality of a binary operator over two literal kinds.
///
/// Applied only when both operands reduced to literal kinds; operators
/// outside the fast-checked set always pass here and are validated during
/// resolution instead. Repetition is strict in this pass: the string must be
/// the LEFT operand and the count an integer literal.
pub fn check_literal_binary(op: BinaryOp, left: LitKind, right: LitKind) -> Result<(), String> {
    let legal = match op {
        BinaryOp::Add => {
            (left.is_numeric() && right.is_numeric())
                || (left == LitKind::Str && right == LitKind::Str)
        }
        BinaryOp::Sub | BinaryOp::Div => left.is_numeric() && right.is_numeric(),
        BinaryOp::Mul => {
            (left.is_numeric() && right.is_numeric())
                || (left == LitKind::Str && right == LitKind::Int)
        }
        BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
            left.is_numeric() && right.is_numeric()
        }
        // Not part of the literal fast path.
        _ => true,
    };
    if legal {
        Ok(())
    } else {
        Err(format!(
            "operator '{}' cannot be applied to {} and {} literals",
            op.symbol(),
            left.display_name(),
            right.display_name()
        ))
    }
}

/// Tag of an AST literal.
pub fn literal_tag(lit: &Literal) -> TypeTag {
    match lit {
        Literal::Null => TypeTag::Null,
        Literal::Int(_) => TypeTag::Int,
        Literal::Double(_) => TypeTag::Double,
        Literal::String(_) => TypeTag::String,
        Literal::Bool(_) => TypeTag::Bool,
    }
}

/// Outcome of matching a literal argument against a builtin parameter kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamMatch {
    Ok,
    /// The literal does not fit; carries the expected kind's name.
    Mismatch(&'static str),
}

/// Match a literal argument's coarse kind against a builtin parameter.
pub fn match_param(kind: ParamKind, lit: LitKind) -> ParamMatch {
    match kind {
        ParamKind::Any => ParamMatch::Ok,
        ParamKind::Str => {
            if lit == LitKind::Str {
                ParamMatch::Ok
            } else {
                ParamMatch::Mismatch("string")
            }
        }
        ParamKind::Num => {
            if lit.is_numeric() {
                ParamMatch::Ok
            } else {
                ParamMatch::Mismatch("number")
            }
        }
    }
}

fn widen_lit(left: LitKind, right: LitKind) -> LitKind {
    if left == LitKind::Double || right == LitKind::Double {
        LitKind::Double
    } else {
        LitKind::Int
    }
}
