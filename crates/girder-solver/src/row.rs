//! Sparse row algebra for the simplex tableau.

use indexmap::IndexMap;

use crate::symbol::Symbol;

/// Tolerance for floating-point comparisons.
pub(crate) const EPSILON: f64 = 1e-8;

/// Near-zero check for floating point values.
pub(crate) fn near_zero(value: f64) -> bool {
    value.abs() < EPSILON
}

/// Symbols that appeared in or vanished from a row during a compound
/// mutation. The tableau uses this to keep its column index in step.
#[derive(Debug, Default)]
pub(crate) struct CellDelta {
    pub added: Vec<Symbol>,
    pub removed: Vec<Symbol>,
}

/// A row in the simplex tableau: `constant + Σ(coefficient * symbol)`.
///
/// When installed under a basic symbol `b`, the row states
/// `b = constant + Σ(coefficient * symbol)`. Coefficients below
/// tolerance are pruned on every mutation, so iteration never sees a
/// numerically-zero term.
#[derive(Debug, Clone)]
pub(crate) struct Row {
    constant: f64,
    cells: IndexMap<Symbol, f64>,
}

impl Row {
    pub fn new(constant: f64) -> Self {
        Self {
            constant,
            cells: IndexMap::new(),
        }
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn set_constant(&mut self, value: f64) {
        self.constant = value;
    }

    /// Shift the constant by `delta`, returning the new constant.
    pub fn add_constant(&mut self, delta: f64) -> f64 {
        self.constant += delta;
        self.constant
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> impl Iterator<Item = (Symbol, f64)> + '_ {
        self.cells.iter().map(|(&s, &c)| (s, c))
    }

    pub fn coefficient_for(&self, symbol: Symbol) -> f64 {
        self.cells.get(&symbol).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        self.cells.contains_key(&symbol)
    }

    /// Accumulate `coefficient` onto the symbol's term. Returns `true`
    /// when the term was erased (a previously present coefficient
    /// cancelled below tolerance), so callers can unindex the symbol.
    pub fn add(&mut self, symbol: Symbol, coefficient: f64) -> bool {
        let entry = self.cells.entry(symbol).or_insert(0.0);
        *entry += coefficient;
        if near_zero(*entry) {
            self.cells.swap_remove(&symbol);
            true
        } else {
            false
        }
    }

    /// Set the symbol's coefficient outright, dropping the term when the
    /// coefficient is below tolerance.
    pub fn insert(&mut self, symbol: Symbol, coefficient: f64) {
        if near_zero(coefficient) {
            self.cells.swap_remove(&symbol);
        } else {
            self.cells.insert(symbol, coefficient);
        }
    }

    pub fn remove(&mut self, symbol: Symbol) -> Option<f64> {
        self.cells.swap_remove(&symbol)
    }

    /// `self += other * multiplier`, constant included. The returned
    /// delta lists symbols that newly appeared in or were cancelled out
    /// of this row.
    pub fn add_row(&mut self, other: &Row, multiplier: f64) -> CellDelta {
        let mut delta = CellDelta::default();
        self.constant += other.constant * multiplier;
        for (&symbol, &coeff) in &other.cells {
            let was_present = self.cells.contains_key(&symbol);
            let erased = self.add(symbol, coeff * multiplier);
            if erased {
                delta.removed.push(symbol);
            } else if !was_present {
                delta.added.push(symbol);
            }
        }
        delta
    }

    /// Negate the constant and every coefficient.
    pub fn reverse_sign(&mut self) {
        self.constant = -self.constant;
        for coeff in self.cells.values_mut() {
            *coeff = -*coeff;
        }
    }

    /// Pivot `symbol` out of the row: given `0 = constant + ... + c*symbol`,
    /// rewrite the cells so the row reads `symbol = -constant/c - .../c`.
    ///
    /// `symbol` must occur in the row with a non-zero coefficient.
    pub fn solve_for(&mut self, symbol: Symbol) {
        let coeff = self.cells.swap_remove(&symbol).unwrap_or(1.0);
        let multiplier = -1.0 / coeff;
        self.constant *= multiplier;
        for c in self.cells.values_mut() {
            *c *= multiplier;
        }
    }

    /// Rewrite a row currently defining `lhs` so that it defines `rhs`
    /// instead: insert `lhs` with coefficient -1, then solve for `rhs`.
    pub fn solve_for_symbols(&mut self, lhs: Symbol, rhs: Symbol) {
        self.insert(lhs, -1.0);
        self.solve_for(rhs);
    }

    /// Replace `symbol` with the given row. No-op when the symbol does
    /// not occur. Returns the cell changes for column index upkeep.
    pub fn substitute(&mut self, symbol: Symbol, row: &Row) -> Option<CellDelta> {
        let coeff = self.cells.swap_remove(&symbol)?;
        let mut delta = self.add_row(row, coeff);
        delta.removed.push(symbol);
        Some(delta)
    }
}
