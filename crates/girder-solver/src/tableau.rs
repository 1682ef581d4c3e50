//! The sparse simplex tableau.

use indexmap::{IndexMap, IndexSet};

use girder_core::SolverError;

use crate::row::{CellDelta, Row};
use crate::symbol::Symbol;

/// The tableau: every basic symbol's defining row, the objective, and an
/// index from non-basic symbol to the rows that reference it.
///
/// The column index exists to make substitution and marker lookup
/// proportional to the symbol's column instead of the whole tableau.
/// Invariant: `basic ∈ columns[s]` exactly when `rows[basic]` has a term
/// for `s`. The objective and artificial rows are not indexed.
#[derive(Debug, Clone)]
pub(crate) struct Tableau {
    rows: IndexMap<Symbol, Row>,
    columns: IndexMap<Symbol, IndexSet<Symbol>>,
    pub objective: Row,
    pub artificial: Option<Row>,
    /// Basic symbols whose constant may have gone negative. Consumed by
    /// the dual optimiser; entries may be stale and are re-checked.
    infeasible_rows: Vec<Symbol>,
}

impl Tableau {
    pub fn new() -> Self {
        Self {
            rows: IndexMap::new(),
            columns: IndexMap::new(),
            objective: Row::new(0.0),
            artificial: None,
            infeasible_rows: Vec::new(),
        }
    }

    pub fn has_row(&self, symbol: Symbol) -> bool {
        self.rows.contains_key(&symbol)
    }

    pub fn row(&self, symbol: Symbol) -> Option<&Row> {
        self.rows.get(&symbol)
    }

    /// Mutable row access. Callers may only touch the constant through
    /// this; cell edits must go through the tableau so the column index
    /// stays consistent.
    pub fn row_mut(&mut self, symbol: Symbol) -> Option<&mut Row> {
        self.rows.get_mut(&symbol)
    }

    pub fn rows(&self) -> impl Iterator<Item = (Symbol, &Row)> {
        self.rows.iter().map(|(&s, r)| (s, r))
    }

    /// The basic symbols whose rows reference `symbol`.
    pub fn column(&self, symbol: Symbol) -> Option<&IndexSet<Symbol>> {
        self.columns.get(&symbol)
    }

    /// Install a row under its basic symbol, indexing every term.
    pub fn add_row(&mut self, basic: Symbol, row: Row) {
        for (symbol, _) in row.cells() {
            self.columns.entry(symbol).or_default().insert(basic);
        }
        self.rows.insert(basic, row);
    }

    /// Uninstall a basic symbol's row, unindexing every term.
    pub fn remove_row(&mut self, basic: Symbol) -> Option<Row> {
        let row = self.rows.swap_remove(&basic)?;
        for (symbol, _) in row.cells() {
            self.unindex(symbol, basic);
        }
        Some(row)
    }

    /// Replace every occurrence of `symbol` with `row`, in the rows that
    /// reference it (per the column index), the objective, and the
    /// artificial row if present. Rows whose constant goes negative are
    /// queued for the dual optimiser.
    pub fn substitute(&mut self, symbol: Symbol, row: &Row) {
        if let Some(bases) = self.columns.swap_remove(&symbol) {
            for basic in bases {
                let Some(target) = self.rows.get_mut(&basic) else {
                    continue;
                };
                let Some(delta) = target.substitute(symbol, row) else {
                    continue;
                };
                let infeasible = !basic.is_external() && target.constant() < 0.0;
                self.apply_delta(basic, symbol, delta);
                if infeasible {
                    self.infeasible_rows.push(basic);
                }
            }
        }
        self.objective.substitute(symbol, row);
        if let Some(artificial) = self.artificial.as_mut() {
            artificial.substitute(symbol, row);
        }
    }

    /// Pivot: `exit` leaves the basis and `entry` takes over its row.
    pub fn change_basis(&mut self, entry: Symbol, exit: Symbol) -> Result<(), SolverError> {
        let mut row = self
            .remove_row(exit)
            .ok_or(SolverError::Internal("Pivot exit symbol is not basic"))?;
        row.solve_for_symbols(exit, entry);
        self.substitute(entry, &row);
        self.add_row(entry, row);
        Ok(())
    }

    /// Erase a symbol from every row and the objective. Used to scrub an
    /// artificial variable once phase 1 is done with it.
    pub fn remove_symbol_from_rows(&mut self, symbol: Symbol) {
        if let Some(bases) = self.columns.swap_remove(&symbol) {
            for basic in bases {
                if let Some(row) = self.rows.get_mut(&basic) {
                    row.remove(symbol);
                }
            }
        }
        self.objective.remove(symbol);
    }

    /// Subtract a removed constraint's error contribution from the
    /// objective: through the error symbol's row when it is basic,
    /// directly off its coefficient otherwise.
    pub fn remove_marker_effects(&mut self, marker: Symbol, scalar: f64) {
        if let Some(row) = self.rows.get(&marker) {
            self.objective.add_row(row, -scalar);
        } else {
            self.objective.add(marker, -scalar);
        }
    }

    pub fn mark_infeasible(&mut self, basic: Symbol) {
        self.infeasible_rows.push(basic);
    }

    pub fn pop_infeasible(&mut self) -> Option<Symbol> {
        self.infeasible_rows.pop()
    }

    pub fn clear_infeasible(&mut self) {
        self.infeasible_rows.clear();
    }

    fn apply_delta(&mut self, basic: Symbol, substituted: Symbol, delta: CellDelta) {
        for symbol in delta.added {
            self.columns.entry(symbol).or_default().insert(basic);
        }
        for symbol in delta.removed {
            if symbol != substituted {
                self.unindex(symbol, basic);
            }
        }
    }

    fn unindex(&mut self, symbol: Symbol, basic: Symbol) {
        if let Some(set) = self.columns.get_mut(&symbol) {
            set.swap_remove(&basic);
            if set.is_empty() {
                self.columns.swap_remove(&symbol);
            }
        }
    }

    /// Check the row/column cross-index invariant. Test support.
    #[cfg(test)]
    pub fn assert_consistent(&self) {
        use crate::row::near_zero;

        for (&basic, row) in &self.rows {
            for (symbol, coeff) in row.cells() {
                assert!(!near_zero(coeff), "zero-magnitude term survived pruning");
                let set = self
                    .columns
                    .get(&symbol)
                    .unwrap_or_else(|| panic!("{symbol} missing from column index"));
                assert!(set.contains(&basic), "{basic} not indexed under {symbol}");
            }
        }
        for (&symbol, set) in &self.columns {
            assert!(!set.is_empty(), "empty column set for {symbol}");
            for &basic in set {
                let row = self
                    .rows
                    .get(&basic)
                    .unwrap_or_else(|| panic!("column entry for dead row {basic}"));
                assert!(row.contains(symbol), "{symbol} indexed but absent from {basic}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolKind;

    fn slack(id: u64) -> Symbol {
        Symbol::new(id, SymbolKind::Slack)
    }

    #[test]
    fn add_and_remove_maintain_column_index() {
        let mut tableau = Tableau::new();
        let (b, s1, s2) = (slack(0), slack(1), slack(2));

        let mut row = Row::new(4.0);
        row.insert(s1, 1.0);
        row.insert(s2, -2.0);
        tableau.add_row(b, row);
        tableau.assert_consistent();
        assert!(tableau.column(s1).unwrap().contains(&b));

        tableau.remove_row(b).unwrap();
        tableau.assert_consistent();
        assert!(tableau.column(s1).is_none());
    }

    #[test]
    fn substitute_rewrites_referencing_rows() {
        let mut tableau = Tableau::new();
        let (b1, b2, s1, s2) = (slack(0), slack(1), slack(2), slack(3));

        let mut row1 = Row::new(1.0);
        row1.insert(s1, 2.0);
        tableau.add_row(b1, row1);

        let mut row2 = Row::new(0.0);
        row2.insert(s2, 1.0);
        tableau.add_row(b2, row2);

        // s1 = 3 - s2
        let mut replacement = Row::new(3.0);
        replacement.insert(s2, -1.0);
        tableau.substitute(s1, &replacement);
        tableau.assert_consistent();

        let rewritten = tableau.row(b1).unwrap();
        assert!((rewritten.constant() - 7.0).abs() < 1e-12);
        assert!((rewritten.coefficient_for(s2) - -2.0).abs() < 1e-12);
        assert!(!rewritten.contains(s1));
    }

    #[test]
    fn substitute_queues_infeasible_rows() {
        let mut tableau = Tableau::new();
        let (b, s1) = (slack(0), slack(1));

        let mut row = Row::new(1.0);
        row.insert(s1, 1.0);
        tableau.add_row(b, row);

        // s1 = -5 drives b's constant negative
        let replacement = Row::new(-5.0);
        tableau.substitute(s1, &replacement);
        assert_eq!(tableau.pop_infeasible(), Some(b));
    }

    #[test]
    fn change_basis_swaps_the_defining_row() {
        let mut tableau = Tableau::new();
        let (exit, entry) = (slack(0), slack(1));

        // exit = 6 - 2*entry
        let mut row = Row::new(6.0);
        row.insert(entry, -2.0);
        tableau.add_row(exit, row);

        tableau.change_basis(entry, exit).unwrap();
        tableau.assert_consistent();
        assert!(!tableau.has_row(exit));

        // entry = 3 - 0.5*exit
        let row = tableau.row(entry).unwrap();
        assert!((row.constant() - 3.0).abs() < 1e-12);
        assert!((row.coefficient_for(exit) - -0.5).abs() < 1e-12);
    }

    #[test]
    fn change_basis_on_nonbasic_exit_is_an_error() {
        let mut tableau = Tableau::new();
        assert!(tableau.change_basis(slack(0), slack(1)).is_err());
    }
}
