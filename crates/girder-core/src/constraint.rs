//! Constraints: relations between linear expressions.

use crate::expression::Expression;
use crate::strength::Strength;

/// The relation of a constraint (equality or inequality).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Relation {
    LessOrEqual,
    Equal,
    GreaterOrEqual,
}

/// A constraint over a linear expression.
///
/// The expression is compared against zero: `expression (op) 0`. The
/// constructors below take a left- and right-hand side and fold them into
/// this form, so `Constraint::eq(x, y + 5.0, REQUIRED)` represents
/// `x - (y + 5) = 0`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Constraint {
    pub expression: Expression,
    pub relation: Relation,
    pub strength: Strength,
    pub weight: f64,
}

impl Constraint {
    /// Create a constraint from an already-folded expression.
    pub fn new(expression: Expression, relation: Relation, strength: Strength) -> Self {
        Self {
            expression,
            relation,
            strength,
            weight: 1.0,
        }
    }

    /// `lhs = rhs` with the given strength.
    pub fn eq(lhs: impl Into<Expression>, rhs: impl Into<Expression>, strength: Strength) -> Self {
        Self::new(lhs.into() - rhs.into(), Relation::Equal, strength)
    }

    /// `lhs <= rhs` with the given strength.
    pub fn leq(lhs: impl Into<Expression>, rhs: impl Into<Expression>, strength: Strength) -> Self {
        Self::new(lhs.into() - rhs.into(), Relation::LessOrEqual, strength)
    }

    /// `lhs >= rhs` with the given strength.
    pub fn geq(lhs: impl Into<Expression>, rhs: impl Into<Expression>, strength: Strength) -> Self {
        Self::new(lhs.into() - rhs.into(), Relation::GreaterOrEqual, strength)
    }

    /// Set the weight used to break ties between constraints of equal
    /// strength. Weights must be non-negative; the default is 1.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight.max(0.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::Variable;

    #[test]
    fn constructors_fold_to_expression_op_zero() {
        let x = Variable::new();
        let y = Variable::new();

        let c = Constraint::eq(x, y + 3.0, Strength::REQUIRED);
        assert_eq!(c.relation, Relation::Equal);
        assert_eq!(c.expression.coefficient(x), 1.0);
        assert_eq!(c.expression.coefficient(y), -1.0);
        assert_eq!(c.expression.constant, -3.0);
    }

    #[test]
    fn weight_clamps_at_zero() {
        let x = Variable::new();
        let c = Constraint::eq(x, 0.0, Strength::WEAK).with_weight(-2.0);
        assert_eq!(c.weight, 0.0);
    }
}
