//! Linear expressions over variables.

use std::ops::{Add, Div, Mul, Neg, Sub};

use indexmap::IndexMap;

use crate::variable::Variable;

/// Tolerance below which a coefficient is treated as zero.
const EPSILON: f64 = 1e-8;

/// A linear expression: a constant plus a sum of coefficient * variable
/// terms.
///
/// Expressions are built with ordinary arithmetic operators:
///
/// ```
/// use girder_core::{Expression, Variable};
///
/// let x = Variable::new();
/// let width = Variable::new();
/// let right: Expression = x + width;
/// let centered = (right - 100.0) * 0.5;
/// assert_eq!(centered.coefficient(x), 0.5);
/// ```
///
/// Terms keep their insertion order, and terms whose coefficient cancels
/// below tolerance are removed.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Expression {
    pub constant: f64,
    terms: IndexMap<Variable, f64>,
}

impl Expression {
    /// Create a constant expression.
    pub fn from_constant(value: f64) -> Self {
        Self {
            constant: value,
            terms: IndexMap::new(),
        }
    }

    /// Create an expression from a single variable.
    pub fn from_variable(var: Variable) -> Self {
        let mut terms = IndexMap::new();
        terms.insert(var, 1.0);
        Self { constant: 0.0, terms }
    }

    /// Add a term to the expression, merging with an existing term for the
    /// same variable. Terms that cancel below tolerance are dropped.
    pub fn add_term(&mut self, var: Variable, coefficient: f64) {
        if coefficient.abs() < EPSILON {
            return;
        }
        let entry = self.terms.entry(var).or_insert(0.0);
        *entry += coefficient;
        if entry.abs() < EPSILON {
            self.terms.swap_remove(&var);
        }
    }

    /// Add another expression scaled by a multiplier.
    pub fn add_expression(&mut self, other: &Expression, multiplier: f64) {
        self.constant += other.constant * multiplier;
        for (&var, &coeff) in &other.terms {
            self.add_term(var, coeff * multiplier);
        }
    }

    /// Multiply the expression by a scalar.
    pub fn multiply(&mut self, scalar: f64) {
        self.constant *= scalar;
        for coeff in self.terms.values_mut() {
            *coeff *= scalar;
        }
    }

    /// Get the coefficient for a variable.
    pub fn coefficient(&self, var: Variable) -> f64 {
        self.terms.get(&var).copied().unwrap_or(0.0)
    }

    /// Check whether the expression has no variable terms.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterate over the (variable, coefficient) terms.
    pub fn terms(&self) -> impl Iterator<Item = (Variable, f64)> + '_ {
        self.terms.iter().map(|(&v, &c)| (v, c))
    }
}

impl From<Variable> for Expression {
    fn from(var: Variable) -> Self {
        Expression::from_variable(var)
    }
}

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Expression::from_constant(value)
    }
}

impl Neg for Expression {
    type Output = Expression;

    fn neg(mut self) -> Expression {
        self.multiply(-1.0);
        self
    }
}

impl Neg for Variable {
    type Output = Expression;

    fn neg(self) -> Expression {
        Expression::from_variable(self) * -1.0
    }
}

impl<R: Into<Expression>> Add<R> for Expression {
    type Output = Expression;

    fn add(mut self, rhs: R) -> Expression {
        self.add_expression(&rhs.into(), 1.0);
        self
    }
}

impl<R: Into<Expression>> Sub<R> for Expression {
    type Output = Expression;

    fn sub(mut self, rhs: R) -> Expression {
        self.add_expression(&rhs.into(), -1.0);
        self
    }
}

impl<R: Into<Expression>> Add<R> for Variable {
    type Output = Expression;

    fn add(self, rhs: R) -> Expression {
        Expression::from_variable(self) + rhs
    }
}

impl<R: Into<Expression>> Sub<R> for Variable {
    type Output = Expression;

    fn sub(self, rhs: R) -> Expression {
        Expression::from_variable(self) - rhs
    }
}

impl Add<Variable> for f64 {
    type Output = Expression;

    fn add(self, rhs: Variable) -> Expression {
        Expression::from_constant(self) + rhs
    }
}

impl Add<Expression> for f64 {
    type Output = Expression;

    fn add(self, rhs: Expression) -> Expression {
        Expression::from_constant(self) + rhs
    }
}

impl Sub<Variable> for f64 {
    type Output = Expression;

    fn sub(self, rhs: Variable) -> Expression {
        Expression::from_constant(self) - rhs
    }
}

impl Sub<Expression> for f64 {
    type Output = Expression;

    fn sub(self, rhs: Expression) -> Expression {
        Expression::from_constant(self) - rhs
    }
}

impl Mul<f64> for Expression {
    type Output = Expression;

    fn mul(mut self, rhs: f64) -> Expression {
        self.multiply(rhs);
        self
    }
}

impl Mul<f64> for Variable {
    type Output = Expression;

    fn mul(self, rhs: f64) -> Expression {
        Expression::from_variable(self) * rhs
    }
}

impl Mul<Variable> for f64 {
    type Output = Expression;

    fn mul(self, rhs: Variable) -> Expression {
        Expression::from_variable(rhs) * self
    }
}

impl Mul<Expression> for f64 {
    type Output = Expression;

    fn mul(self, rhs: Expression) -> Expression {
        rhs * self
    }
}

impl Div<f64> for Expression {
    type Output = Expression;

    fn div(mut self, rhs: f64) -> Expression {
        self.multiply(1.0 / rhs);
        self
    }
}

impl Div<f64> for Variable {
    type Output = Expression;

    fn div(self, rhs: f64) -> Expression {
        Expression::from_variable(self) / rhs
    }
}
