use std::fmt;
use std::rc::Rc;

use crate::expr::Expr;
use crate::instruction::CmpOp;

/// Boolean expression guarding a branch or loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// A boolean-typed value, possibly negated.
    Bool { value: Rc<Expr>, negated: bool },
    Compare {
        lhs: Rc<Expr>,
        op: CmpOp,
        rhs: Rc<Expr>,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Const(bool),
}

impl Condition {
    /// Logical negation pushed down to the leaves.
    pub fn inverse(&self) -> Condition {
        match self {
            Condition::Bool { value, negated } => Condition::Bool {
                value: value.clone(),
                negated: !negated,
            },
            Condition::Compare { lhs, op, rhs } => Condition::Compare {
                lhs: lhs.clone(),
                op: op.inverse(),
                rhs: rhs.clone(),
            },
            Condition::And(xs) => Condition::Or(xs.iter().map(Condition::inverse).collect()),
            Condition::Or(xs) => Condition::And(xs.iter().map(Condition::inverse).collect()),
            Condition::Const(v) => Condition::Const(!v),
        }
    }

    pub fn is_const(&self, value: bool) -> bool {
        matches!(self, Condition::Const(v) if *v == value)
    }

    /// Visits every value tested by the condition.
    pub fn any_operand(&self, f: &mut impl FnMut(&Expr) -> bool) -> bool {
        match self {
            Condition::Bool { value, .. } => f(value),
            Condition::Compare { lhs, rhs, .. } => f(lhs) || f(rhs),
            Condition::And(xs) | Condition::Or(xs) => xs.iter().any(|c| c.any_operand(f)),
            Condition::Const(_) => false,
        }
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    xs: &[Condition],
    sep: &str,
    wrap_or: bool,
) -> fmt::Result {
    for (i, c) in xs.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        if wrap_or && matches!(c, Condition::Or(_)) {
            write!(f, "({c})")?;
        } else {
            write!(f, "{c}")?;
        }
    }
    Ok(())
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Bool { value, negated } => {
                if *negated {
                    f.write_str("!")?;
                }
                write!(f, "{value}")
            }
            Condition::Compare { lhs, op, rhs } => write!(f, "{lhs} {op} {rhs}"),
            Condition::And(xs) => write_joined(f, xs, " && ", true),
            Condition::Or(xs) => write_joined(f, xs, " || ", false),
            Condition::Const(v) => write!(f, "{v}"),
        }
    }
}
