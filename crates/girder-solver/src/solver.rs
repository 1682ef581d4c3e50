//! The incremental Cassowary solver.
//!
//! The solver keeps a sparse simplex tableau that is both feasible and
//! optimal between public calls. Adding a constraint compiles it into an
//! augmented row (slack/error/dummy symbols), installs it, and re-runs
//! the primal optimiser. Suggesting values for edit variables shifts row
//! constants and repairs feasibility with the dual optimiser on
//! `resolve`.

use indexmap::IndexMap;
use tracing::{debug, trace};

use girder_core::{Constraint, Relation, SolverError, Strength, Variable};

use crate::row::{near_zero, Row, EPSILON};
use crate::symbol::{Symbol, SymbolKind};
use crate::tableau::Tableau;

/// Handle for a constraint installed in a solver.
///
/// Handles are issued by [`Solver::add_constraint`] and are meaningful
/// only for the solver that issued them. Re-adding an equivalent
/// constraint yields a distinct handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId(u64);

/// Registry entry for a live constraint: its marker symbols and the
/// scalar it contributed to the objective, kept so removal can undo the
/// contribution exactly.
#[derive(Debug, Clone, Copy)]
struct ConstraintRecord {
    marker: Symbol,
    other: Option<Symbol>,
    scalar: f64,
}

/// Per-edit-variable state: the underlying constraint, its error pair,
/// the last suggested value, and the variable's position in the edit
/// ordering (used to unwind edit groups).
#[derive(Debug, Clone, Copy)]
struct EditInfo {
    constraint: ConstraintId,
    plus: Symbol,
    minus: Symbol,
    constant: f64,
    index: usize,
}

/// Which objective row a primal optimisation pass minimises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectiveKind {
    Standard,
    Artificial,
}

/// The incremental constraint solver.
#[derive(Debug)]
pub struct Solver {
    tableau: Tableau,
    /// Counter for generating unique symbol ids
    symbol_tick: u64,
    /// Counter for generating constraint handles
    constraint_tick: u64,
    /// Lazily-created external symbol for each referenced variable
    var_symbols: IndexMap<Variable, Symbol>,
    /// Solved values, written back after every successful mutation
    var_values: IndexMap<Variable, f64>,
    /// Live constraints by handle
    constraints: IndexMap<ConstraintId, ConstraintRecord>,
    /// Error pairs of live stay constraints, re-anchored on resolve
    stays: Vec<(Symbol, Symbol)>,
    /// Active edit variables
    edits: IndexMap<Variable, EditInfo>,
    /// Edit-group watermarks pushed by `begin_edit`
    edit_stack: Vec<usize>,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    /// Create a new, empty solver.
    pub fn new() -> Self {
        Self {
            tableau: Tableau::new(),
            symbol_tick: 0,
            constraint_tick: 0,
            var_symbols: IndexMap::new(),
            var_values: IndexMap::new(),
            constraints: IndexMap::new(),
            stays: Vec::new(),
            edits: IndexMap::new(),
            edit_stack: Vec::new(),
        }
    }

    /// The solved value of a variable: its basic row's constant, or 0
    /// for non-basic and never-referenced variables.
    pub fn value_of(&self, v: Variable) -> f64 {
        self.var_values.get(&v).copied().unwrap_or(0.0)
    }

    /// Check whether a constraint handle is currently installed.
    pub fn has_constraint(&self, id: ConstraintId) -> bool {
        self.constraints.contains_key(&id)
    }

    /// Check whether a variable is registered for editing.
    pub fn is_edit_variable(&self, v: Variable) -> bool {
        self.edits.contains_key(&v)
    }

    /// Add a constraint, re-optimise, and write back variable values.
    ///
    /// Returns `RequiredFailure` when a required constraint is
    /// inconsistent with the system; the solver is left as it was.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<ConstraintId, SolverError> {
        let scalar = constraint.strength.value() * constraint.weight;
        let (mut row, marker, other) = self.create_row(&constraint, scalar);
        let mut subject = choose_subject(&row, marker, other);

        // A row of dummies is either redundant (install it under its own
        // dummy marker so it can still be removed) or an inconsistent
        // required constraint.
        if subject.is_none() && row.cells().all(|(s, _)| s.is_dummy()) {
            if !near_zero(row.constant()) {
                return Err(SolverError::RequiredFailure);
            }
            subject = Some(marker);
        }

        match subject {
            Some(subject) => {
                row.solve_for(subject);
                self.tableau.substitute(subject, &row);
                self.tableau.add_row(subject, row);
            }
            None => {
                // Only required rows reach phase 1, so this constraint
                // has contributed nothing to the objective yet and the
                // snapshot covers all of its partial work. Phase-1
                // pivots rewrite rows, the column index, and the
                // objective; on failure, restore the snapshot so the
                // rejected constraint leaves no trace.
                let snapshot = self.tableau.clone();
                match self.add_with_artificial_variable(row) {
                    Ok(true) => {}
                    Ok(false) => {
                        self.tableau = snapshot;
                        self.update_variables();
                        return Err(SolverError::RequiredFailure);
                    }
                    Err(err) => {
                        self.tableau = snapshot;
                        self.update_variables();
                        return Err(err);
                    }
                }
            }
        }

        let id = ConstraintId(self.constraint_tick);
        self.constraint_tick += 1;
        self.constraints.insert(id, ConstraintRecord { marker, other, scalar });
        debug!(constraint = id.0, %marker, "added constraint");

        self.optimize(ObjectiveKind::Standard)?;
        self.dual_optimize()?;
        self.update_variables();
        Ok(id)
    }

    /// Remove a previously added constraint.
    pub fn remove_constraint(&mut self, id: ConstraintId) -> Result<(), SolverError> {
        let record = self
            .constraints
            .shift_remove(&id)
            .ok_or(SolverError::UnknownConstraint)?;

        self.remove_constraint_effects(&record);

        if self.tableau.remove_row(record.marker).is_none() {
            // The marker is non-basic: pivot it into the basis first,
            // then let its row die with it. A marker referenced by no
            // row at all has already been cancelled out of the tableau
            // and needs no pivot.
            if let Some(leaving) = self.marker_leaving_symbol(record.marker) {
                let mut row = self
                    .tableau
                    .remove_row(leaving)
                    .ok_or(SolverError::Internal("Marker leaving row is not basic"))?;
                row.solve_for_symbols(leaving, record.marker);
                self.tableau.substitute(record.marker, &row);
            }
        }

        self.stays.retain(|&(plus, _)| plus != record.marker);
        debug!(constraint = id.0, "removed constraint");

        self.optimize(ObjectiveKind::Standard)?;
        self.dual_optimize()?;
        self.update_variables();
        Ok(())
    }

    /// Add a stay: a non-required equality attracting `v` toward its
    /// current value whenever the system leaves it otherwise free.
    pub fn add_stay(
        &mut self,
        v: Variable,
        strength: Strength,
        weight: f64,
    ) -> Result<ConstraintId, SolverError> {
        let current = self.value_of(v);
        self.add_stay_at(v, current, strength, weight)
    }

    /// Add a stay anchored at an explicit value instead of the
    /// variable's current one.
    pub fn add_stay_at(
        &mut self,
        v: Variable,
        value: f64,
        strength: Strength,
        weight: f64,
    ) -> Result<ConstraintId, SolverError> {
        let constraint = Constraint::eq(v, value, strength).with_weight(weight);
        let id = self.add_constraint(constraint)?;
        if let Some(record) = self.constraints.get(&id) {
            if record.marker.is_error() {
                if let Some(other) = record.other {
                    self.stays.push((record.marker, other));
                }
            }
        }
        Ok(id)
    }

    /// Register `v` as an edit variable by installing a retractable
    /// equality `v = current value` of the given strength.
    ///
    /// Registering an already-active edit variable is a no-op.
    pub fn add_edit_var(
        &mut self,
        v: Variable,
        strength: Strength,
        weight: f64,
    ) -> Result<(), SolverError> {
        if strength.is_required() {
            return Err(SolverError::RequiredEditStrength);
        }
        if self.edits.contains_key(&v) {
            return Ok(());
        }
        let current = self.value_of(v);
        let constraint = Constraint::eq(v, current, strength).with_weight(weight);
        let id = self.add_constraint(constraint)?;
        let record = self
            .constraints
            .get(&id)
            .ok_or(SolverError::Internal("Edit constraint record missing"))?;
        let minus = record
            .other
            .ok_or(SolverError::Internal("Edit constraint has no error pair"))?;
        let info = EditInfo {
            constraint: id,
            plus: record.marker,
            minus,
            constant: current,
            index: self.edits.len(),
        };
        self.edits.insert(v, info);
        Ok(())
    }

    /// Unregister an edit variable and retract its constraint.
    pub fn remove_edit_var(&mut self, v: Variable) -> Result<(), SolverError> {
        let info = self
            .edits
            .shift_remove(&v)
            .ok_or(SolverError::UnknownEditVariable)?;
        self.remove_constraint(info.constraint)
    }

    /// Open an edit group covering every edit variable added so far.
    /// Groups nest: a later `begin_edit` opens an inner group that
    /// `end_edit` closes first.
    pub fn begin_edit(&mut self) -> Result<(), SolverError> {
        if self.edits.is_empty() {
            return Err(SolverError::NoEditVariables);
        }
        self.tableau.clear_infeasible();
        self.reset_stay_constants();
        self.edit_stack.push(self.edits.len());
        Ok(())
    }

    /// Resolve, then close the innermost edit group, retracting the edit
    /// variables it introduced.
    pub fn end_edit(&mut self) -> Result<(), SolverError> {
        if self.edit_stack.is_empty() {
            return Err(SolverError::NoEditSession);
        }
        self.resolve()?;
        self.edit_stack.pop();
        let watermark = self.edit_stack.last().copied().unwrap_or(0);
        let doomed: Vec<Variable> = self
            .edits
            .iter()
            .filter(|(_, info)| info.index >= watermark)
            .map(|(&v, _)| v)
            .collect();
        for v in doomed {
            self.remove_edit_var(v)?;
        }
        Ok(())
    }

    /// Suggest a new value for an edit variable.
    ///
    /// Shifts the constants of every row referencing the edit's error
    /// pair. Feasibility may be broken here; `resolve` (or `end_edit`)
    /// repairs it with the dual optimiser.
    pub fn suggest_value(&mut self, v: Variable, value: f64) -> Result<(), SolverError> {
        if self.edit_stack.is_empty() {
            return Err(SolverError::NoEditSession);
        }
        let info = self
            .edits
            .get_mut(&v)
            .ok_or(SolverError::UnknownEditVariable)?;
        let delta = value - info.constant;
        info.constant = value;
        let (plus, minus) = (info.plus, info.minus);
        trace!(variable = %v, value, delta, "suggest");

        // The positive error is basic: take the delta on its row alone.
        if let Some(row) = self.tableau.row_mut(plus) {
            if row.add_constant(-delta) < 0.0 {
                self.tableau.mark_infeasible(plus);
            }
            return Ok(());
        }
        // Likewise the negative error.
        if let Some(row) = self.tableau.row_mut(minus) {
            if row.add_constant(delta) < 0.0 {
                self.tableau.mark_infeasible(minus);
            }
            return Ok(());
        }
        // Both non-basic: push the delta through the marker's column.
        let bases: Vec<Symbol> = self
            .tableau
            .column(plus)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        for basic in bases {
            let Some(row) = self.tableau.row_mut(basic) else {
                continue;
            };
            let coeff = row.coefficient_for(plus);
            if row.add_constant(delta * coeff) < 0.0 && !basic.is_external() {
                self.tableau.mark_infeasible(basic);
            }
        }
        Ok(())
    }

    /// Restore feasibility after suggestions and write back variable
    /// values. Calling `resolve` twice in a row changes nothing.
    pub fn resolve(&mut self) -> Result<(), SolverError> {
        self.dual_optimize()?;
        self.update_variables();
        self.tableau.clear_infeasible();
        self.reset_stay_constants();
        Ok(())
    }

    // ---- constraint compilation -------------------------------------

    /// Compile a constraint into an augmented tableau row written over
    /// the current non-basic symbols, plus its marker symbols. Error
    /// symbols are weighted into the objective here.
    fn create_row(&mut self, constraint: &Constraint, scalar: f64) -> (Row, Symbol, Option<Symbol>) {
        let expression = &constraint.expression;
        let mut row = Row::new(expression.constant);

        // Substitute any basic external so the row only mentions
        // non-basic symbols of the current tableau.
        for (var, coeff) in expression.terms() {
            let symbol = self.symbol_for(var);
            if let Some(basic) = self.tableau.row(symbol) {
                row.add_row(basic, coeff);
            } else {
                row.add(symbol, coeff);
            }
        }

        let required = constraint.strength.is_required();
        let marker;
        let mut other = None;

        match constraint.relation {
            Relation::LessOrEqual | Relation::GreaterOrEqual => {
                let coeff = if constraint.relation == Relation::LessOrEqual {
                    1.0
                } else {
                    -1.0
                };
                let slack = self.new_symbol(SymbolKind::Slack);
                row.insert(slack, coeff);
                marker = slack;
                if !required {
                    let error = self.new_symbol(SymbolKind::Error);
                    row.insert(error, -coeff);
                    self.tableau.objective.add(error, scalar);
                    other = Some(error);
                }
            }
            Relation::Equal => {
                if required {
                    let dummy = self.new_symbol(SymbolKind::Dummy);
                    row.insert(dummy, 1.0);
                    marker = dummy;
                } else {
                    let errplus = self.new_symbol(SymbolKind::Error);
                    let errminus = self.new_symbol(SymbolKind::Error);
                    row.insert(errplus, -1.0);
                    row.insert(errminus, 1.0);
                    self.tableau.objective.add(errplus, scalar);
                    self.tableau.objective.add(errminus, scalar);
                    marker = errplus;
                    other = Some(errminus);
                }
            }
        }

        // Basic-feasible sign convention.
        if row.constant() < 0.0 {
            row.reverse_sign();
        }
        (row, marker, other)
    }

    /// Install a row that offers no direct subject by running phase 1
    /// against a fresh artificial variable. Returns whether the row was
    /// satisfiable; the artificial variable is scrubbed either way.
    fn add_with_artificial_variable(&mut self, row: Row) -> Result<bool, SolverError> {
        let art = self.new_symbol(SymbolKind::Slack);
        self.tableau.add_row(art, row.clone());
        self.tableau.artificial = Some(row);
        trace!(%art, "entering phase 1");

        self.optimize(ObjectiveKind::Artificial)?;
        let success = self
            .tableau
            .artificial
            .as_ref()
            .is_some_and(|artificial| near_zero(artificial.constant()));
        self.tableau.artificial = None;

        if let Some(art_row) = self.tableau.remove_row(art) {
            if art_row.is_empty() {
                return Ok(success);
            }
            let entering = art_row
                .cells()
                .filter(|&(s, _)| s.is_pivotable())
                .map(|(s, _)| s)
                .min();
            let Some(entering) = entering else {
                // Nothing pivotable left: the row is unsatisfiable.
                return Ok(false);
            };
            let mut art_row = art_row;
            art_row.solve_for_symbols(art, entering);
            self.tableau.substitute(entering, &art_row);
            self.tableau.add_row(entering, art_row);
        }

        self.tableau.remove_symbol_from_rows(art);
        Ok(success)
    }

    // ---- pivot engine -----------------------------------------------

    /// Primal optimisation: pivot while the chosen objective has a
    /// negative coefficient on a non-dummy symbol.
    fn optimize(&mut self, kind: ObjectiveKind) -> Result<(), SolverError> {
        loop {
            let entering = {
                let objective = match kind {
                    ObjectiveKind::Standard => &self.tableau.objective,
                    ObjectiveKind::Artificial => self
                        .tableau
                        .artificial
                        .as_ref()
                        .ok_or(SolverError::Internal("Artificial objective is missing"))?,
                };
                entering_symbol(objective)
            };
            let Some(entering) = entering else {
                return Ok(());
            };
            let leaving = self
                .leaving_symbol(entering)
                .ok_or(SolverError::Internal("The objective is unbounded"))?;
            trace!(%entering, %leaving, "primal pivot");
            self.tableau.change_basis(entering, leaving)?;
        }
    }

    /// Minimum-ratio leaving choice for a primal pivot. External rows
    /// never leave so user variables stay basic where possible; ratio
    /// ties break toward the smaller symbol id.
    fn leaving_symbol(&self, entering: Symbol) -> Option<Symbol> {
        let mut min_ratio = f64::INFINITY;
        let mut leaving: Option<Symbol> = None;
        for &basic in self.tableau.column(entering)? {
            if basic.is_external() {
                continue;
            }
            let Some(row) = self.tableau.row(basic) else {
                continue;
            };
            let coeff = row.coefficient_for(entering);
            if coeff < -EPSILON {
                let ratio = -row.constant() / coeff;
                let better = match leaving {
                    None => true,
                    Some(current) => ratio < min_ratio || (ratio == min_ratio && basic < current),
                };
                if better {
                    min_ratio = ratio;
                    leaving = Some(basic);
                }
            }
        }
        leaving
    }

    /// Dual optimisation: repair rows whose constants went negative
    /// while keeping the objective optimal.
    fn dual_optimize(&mut self) -> Result<(), SolverError> {
        while let Some(leaving) = self.tableau.pop_infeasible() {
            let entering = {
                let Some(row) = self.tableau.row(leaving) else {
                    continue;
                };
                if row.constant() >= 0.0 {
                    continue;
                }
                dual_entering_symbol(&self.tableau.objective, row)
            };
            let entering = entering
                .ok_or(SolverError::Internal("Dual optimise found no entering symbol"))?;
            trace!(%entering, %leaving, "dual pivot");
            self.tableau.change_basis(entering, leaving)?;
        }
        Ok(())
    }

    // ---- removal support --------------------------------------------

    /// Undo the objective contribution of a removed constraint's error
    /// symbols.
    fn remove_constraint_effects(&mut self, record: &ConstraintRecord) {
        if record.marker.is_error() {
            self.tableau.remove_marker_effects(record.marker, record.scalar);
        }
        if let Some(other) = record.other {
            if other.is_error() {
                self.tableau.remove_marker_effects(other, record.scalar);
            }
        }
    }

    /// Pick the row a non-basic marker should pivot into before being
    /// dropped: restricted rows first by smallest |ratio| (negative
    /// coefficients preferred), external rows as a last resort.
    fn marker_leaving_symbol(&self, marker: Symbol) -> Option<Symbol> {
        let mut r1 = f64::INFINITY;
        let mut r2 = f64::INFINITY;
        let mut first: Option<Symbol> = None;
        let mut second: Option<Symbol> = None;
        let mut third: Option<Symbol> = None;

        for &basic in self.tableau.column(marker)? {
            let Some(row) = self.tableau.row(basic) else {
                continue;
            };
            let coeff = row.coefficient_for(marker);
            if near_zero(coeff) {
                continue;
            }
            if basic.is_external() {
                let better = third.map_or(true, |t| basic < t);
                if better {
                    third = Some(basic);
                }
            } else if coeff < 0.0 {
                let ratio = -row.constant() / coeff;
                let better = match first {
                    None => true,
                    Some(current) => ratio < r1 || (ratio == r1 && basic < current),
                };
                if better {
                    r1 = ratio;
                    first = Some(basic);
                }
            } else {
                let ratio = row.constant() / coeff;
                let better = match second {
                    None => true,
                    Some(current) => ratio < r2 || (ratio == r2 && basic < current),
                };
                if better {
                    r2 = ratio;
                    second = Some(basic);
                }
            }
        }
        first.or(second).or(third)
    }

    // ---- bookkeeping ------------------------------------------------

    /// Re-anchor every live stay at the variable's current value by
    /// zeroing its basic error row's constant.
    fn reset_stay_constants(&mut self) {
        for &(plus, minus) in &self.stays {
            if let Some(row) = self.tableau.row_mut(plus) {
                row.set_constant(0.0);
            } else if let Some(row) = self.tableau.row_mut(minus) {
                row.set_constant(0.0);
            }
        }
    }

    /// Write solved values back for every bound variable.
    fn update_variables(&mut self) {
        for (&var, &symbol) in &self.var_symbols {
            let value = self.tableau.row(symbol).map_or(0.0, |row| row.constant());
            self.var_values.insert(var, value);
        }
    }

    /// The external symbol for a variable, binding it on first use.
    fn symbol_for(&mut self, var: Variable) -> Symbol {
        if let Some(&symbol) = self.var_symbols.get(&var) {
            return symbol;
        }
        let symbol = self.new_symbol(SymbolKind::External);
        self.var_symbols.insert(var, symbol);
        self.var_values.entry(var).or_insert(0.0);
        symbol
    }

    fn new_symbol(&mut self, kind: SymbolKind) -> Symbol {
        let id = self.symbol_tick;
        self.symbol_tick += 1;
        Symbol::new(id, kind)
    }
}

/// First external symbol in the row, else the first marker with a
/// negative coefficient. Fresh markers have empty columns, so entering
/// on them never disturbs other rows.
fn choose_subject(row: &Row, marker: Symbol, other: Option<Symbol>) -> Option<Symbol> {
    for (symbol, _) in row.cells() {
        if symbol.is_external() {
            return Some(symbol);
        }
    }
    if marker.is_pivotable() && row.coefficient_for(marker) < 0.0 {
        return Some(marker);
    }
    if let Some(other) = other {
        if other.is_pivotable() && row.coefficient_for(other) < 0.0 {
            return Some(other);
        }
    }
    None
}

/// Smallest-id non-dummy symbol with a negative objective coefficient.
fn entering_symbol(objective: &Row) -> Option<Symbol> {
    objective
        .cells()
        .filter(|&(symbol, coeff)| !symbol.is_dummy() && coeff < -EPSILON)
        .map(|(symbol, _)| symbol)
        .min()
}

/// Dual entering choice: minimise objective coefficient over row
/// coefficient among non-dummy terms with positive coefficients.
fn dual_entering_symbol(objective: &Row, row: &Row) -> Option<Symbol> {
    let mut min_ratio = f64::INFINITY;
    let mut entering: Option<Symbol> = None;
    for (symbol, coeff) in row.cells() {
        if coeff > EPSILON && !symbol.is_dummy() {
            let ratio = objective.coefficient_for(symbol) / coeff;
            let better = match entering {
                None => true,
                Some(current) => ratio < min_ratio || (ratio == min_ratio && symbol < current),
            };
            if better {
                min_ratio = ratio;
                entering = Some(symbol);
            }
        }
    }
    entering
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Check every between-calls invariant: the row/column cross-index,
    /// feasibility of restricted rows, optimality of the objective over
    /// non-dummy symbols, and value write-back correctness.
    fn assert_invariants(solver: &Solver) {
        solver.tableau.assert_consistent();
        for (basic, row) in solver.tableau.rows() {
            if !basic.is_external() {
                assert!(
                    row.constant() >= -EPSILON,
                    "restricted row {basic} has negative constant {}",
                    row.constant()
                );
            }
        }
        for (symbol, coeff) in solver.tableau.objective.cells() {
            if !symbol.is_dummy() {
                assert!(
                    coeff >= -EPSILON,
                    "objective not optimal: {symbol} has coefficient {coeff}"
                );
            }
        }
        for (&var, &symbol) in &solver.var_symbols {
            let expected = solver.tableau.row(symbol).map_or(0.0, |row| row.constant());
            assert!(
                (solver.value_of(var) - expected).abs() < EPSILON,
                "stale value for {var}"
            );
        }
    }

    #[test]
    fn simple_equality() {
        let mut solver = Solver::new();
        let x = Variable::new();

        solver
            .add_constraint(Constraint::eq(x, 100.0, Strength::REQUIRED))
            .unwrap();
        assert!((solver.value_of(x) - 100.0).abs() < 0.001);
        assert_invariants(&solver);
    }

    #[test]
    fn chained_equalities() {
        let mut solver = Solver::new();
        let x = Variable::new();
        let y = Variable::new();

        solver
            .add_constraint(Constraint::eq(x, 100.0, Strength::REQUIRED))
            .unwrap();
        solver
            .add_constraint(Constraint::eq(y, x + 50.0, Strength::REQUIRED))
            .unwrap();

        assert!((solver.value_of(x) - 100.0).abs() < 0.001);
        assert!((solver.value_of(y) - 150.0).abs() < 0.001);
        assert_invariants(&solver);
    }

    #[test]
    fn strength_ordering() {
        let mut solver = Solver::new();
        let x = Variable::new();

        solver
            .add_constraint(Constraint::eq(x, 100.0, Strength::WEAK))
            .unwrap();
        solver
            .add_constraint(Constraint::eq(x, 50.0, Strength::STRONG))
            .unwrap();

        assert!((solver.value_of(x) - 50.0).abs() < 0.001);
        assert_invariants(&solver);
    }

    #[test]
    fn inequality_floor_beats_weak_preference() {
        let mut solver = Solver::new();
        let x = Variable::new();

        solver
            .add_constraint(Constraint::geq(x, 50.0, Strength::REQUIRED))
            .unwrap();
        solver
            .add_constraint(Constraint::eq(x, 0.0, Strength::WEAK))
            .unwrap();

        assert!((solver.value_of(x) - 50.0).abs() < 0.001);
        assert_invariants(&solver);
    }

    #[test]
    fn weight_breaks_ties_between_equal_strengths() {
        let mut solver = Solver::new();
        let x = Variable::new();

        solver
            .add_constraint(Constraint::eq(x, 10.0, Strength::WEAK).with_weight(1.0))
            .unwrap();
        solver
            .add_constraint(Constraint::eq(x, 20.0, Strength::WEAK).with_weight(3.0))
            .unwrap();

        assert!((solver.value_of(x) - 20.0).abs() < 0.001);
        assert_invariants(&solver);
    }

    #[test]
    fn unknown_constraint_on_double_remove() {
        let mut solver = Solver::new();
        let x = Variable::new();
        let id = solver
            .add_constraint(Constraint::eq(x, 1.0, Strength::REQUIRED))
            .unwrap();
        assert!(solver.has_constraint(id));
        solver.remove_constraint(id).unwrap();
        assert!(!solver.has_constraint(id));
        assert_eq!(solver.remove_constraint(id), Err(SolverError::UnknownConstraint));
    }

    #[test]
    fn edit_protocol_misuse() {
        let mut solver = Solver::new();
        let x = Variable::new();
        solver.add_stay(x, Strength::WEAK, 1.0).unwrap();

        assert_eq!(solver.begin_edit(), Err(SolverError::NoEditVariables));
        assert_eq!(solver.end_edit(), Err(SolverError::NoEditSession));
        assert_eq!(
            solver.add_edit_var(x, Strength::REQUIRED, 1.0),
            Err(SolverError::RequiredEditStrength)
        );
        assert_eq!(
            solver.remove_edit_var(x),
            Err(SolverError::UnknownEditVariable)
        );

        solver.add_edit_var(x, Strength::STRONG, 1.0).unwrap();
        assert!(solver.is_edit_variable(x));
        // Suggesting outside an open session is rejected.
        assert_eq!(
            solver.suggest_value(x, 4.0),
            Err(SolverError::NoEditSession)
        );
        solver.begin_edit().unwrap();
        let y = Variable::new();
        assert_eq!(
            solver.suggest_value(y, 4.0),
            Err(SolverError::UnknownEditVariable)
        );
        solver.suggest_value(x, 4.0).unwrap();
        solver.end_edit().unwrap();
        assert!(!solver.is_edit_variable(x));
        assert!((solver.value_of(x) - 4.0).abs() < 0.001);
        assert_invariants(&solver);
    }

    #[test]
    fn required_failure_rolls_back() {
        let mut solver = Solver::new();
        let x = Variable::new();
        solver
            .add_constraint(Constraint::eq(x, 10.0, Strength::REQUIRED))
            .unwrap();
        let err = solver
            .add_constraint(Constraint::eq(x, 5.0, Strength::REQUIRED))
            .unwrap_err();
        assert_eq!(err, SolverError::RequiredFailure);
        assert!((solver.value_of(x) - 10.0).abs() < 0.001);
        assert_invariants(&solver);
    }

    #[test]
    fn required_inequality_conflict_rolls_back() {
        // Conflicting required inequalities fail through the phase-1
        // path, which pivots before detecting the conflict; the failed
        // add must leave the tableau feasible and the values untouched.
        let mut solver = Solver::new();
        let x = Variable::new();
        solver
            .add_constraint(Constraint::geq(x, 10.0, Strength::REQUIRED))
            .unwrap();
        let err = solver
            .add_constraint(Constraint::leq(x, 5.0, Strength::REQUIRED))
            .unwrap_err();
        assert_eq!(err, SolverError::RequiredFailure);
        assert!((solver.value_of(x) - 10.0).abs() < 0.001);
        assert_invariants(&solver);
    }

    #[test]
    fn resolve_is_idempotent() {
        let mut solver = Solver::new();
        let x = Variable::new();
        solver.add_stay(x, Strength::WEAK, 1.0).unwrap();
        solver.add_edit_var(x, Strength::STRONG, 1.0).unwrap();
        solver.begin_edit().unwrap();
        solver.suggest_value(x, 42.0).unwrap();
        solver.resolve().unwrap();
        let first = solver.value_of(x);
        solver.resolve().unwrap();
        assert!((solver.value_of(x) - first).abs() < EPSILON);
        assert_invariants(&solver);
    }

    fn strength_for(index: u8) -> Strength {
        match index % 4 {
            0 => Strength::WEAK,
            1 => Strength::MEDIUM,
            2 => Strength::STRONG,
            _ => Strength::REQUIRED,
        }
    }

    proptest! {
        /// Every public mutation leaves the tableau consistent, feasible,
        /// and optimal, even across required-constraint failures.
        #[test]
        fn invariants_hold_under_random_churn(
            ops in prop::collection::vec(
                (0usize..4, 0usize..4, -100.0f64..100.0, 0u8..3, 0u8..4),
                1..20,
            )
        ) {
            let mut solver = Solver::new();
            let vars: Vec<Variable> = (0..4).map(|_| Variable::new()).collect();
            let mut installed = Vec::new();

            for (a, b, constant, relation, strength) in ops {
                let lhs = vars[a];
                let rhs = vars[b] + constant;
                let strength = strength_for(strength);
                let constraint = match relation {
                    0 => Constraint::eq(lhs, rhs, strength),
                    1 => Constraint::leq(lhs, rhs, strength),
                    _ => Constraint::geq(lhs, rhs, strength),
                };
                if let Ok(id) = solver.add_constraint(constraint) {
                    installed.push(id);
                }
                assert_invariants(&solver);
            }

            for id in installed {
                solver.remove_constraint(id).unwrap();
                assert_invariants(&solver);
            }
        }

        /// Adding then removing a constraint returns every variable to
        /// its previous value when weak stays pin the optimum.
        #[test]
        fn add_remove_round_trip(
            base in prop::collection::vec((0usize..3, -50.0f64..50.0), 0..5),
            probe in (0usize..3, 0usize..3, -50.0f64..50.0, 0u8..3),
        ) {
            let mut solver = Solver::new();
            let vars: Vec<Variable> = (0..3).map(|_| Variable::new()).collect();
            for &v in &vars {
                solver.add_stay(v, Strength::WEAK, 1.0).unwrap();
            }
            for (idx, value) in base {
                let _ = solver.add_constraint(
                    Constraint::eq(vars[idx], value, Strength::MEDIUM),
                );
            }
            let before: Vec<f64> = vars.iter().map(|&v| solver.value_of(v)).collect();

            let (a, b, constant, relation) = probe;
            let constraint = match relation {
                0 => Constraint::eq(vars[a], vars[b] + constant, Strength::STRONG),
                1 => Constraint::leq(vars[a], vars[b] + constant, Strength::STRONG),
                _ => Constraint::geq(vars[a], vars[b] + constant, Strength::STRONG),
            };
            if let Ok(id) = solver.add_constraint(constraint) {
                solver.remove_constraint(id).unwrap();
            }

            for (&v, &expected) in vars.iter().zip(&before) {
                prop_assert!((solver.value_of(v) - expected).abs() < 1e-6);
            }
            assert_invariants(&solver);
        }
    }
}
