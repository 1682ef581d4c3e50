//! Incremental Cassowary constraint solving.
//!
//! This crate implements:
//! - A sparse simplex tableau with a column index for fast substitution
//! - Primal optimisation for adds/removes and dual optimisation for
//!   incremental value suggestions
//! - Strength-weighted soft constraints with exact required constraints
//! - The edit/suggest/resolve protocol with nested edit groups and stays
//!
//! ```
//! use girder_solver::{Constraint, Solver, Strength, Variable};
//!
//! let mut solver = Solver::new();
//! let left = Variable::new();
//! let width = Variable::new();
//!
//! solver.add_stay_at(width, 10.0, Strength::WEAK, 1.0).unwrap();
//! solver
//!     .add_constraint(Constraint::geq(left + width, 100.0, Strength::REQUIRED))
//!     .unwrap();
//!
//! assert!((solver.value_of(left) - 90.0).abs() < 1e-6);
//! assert!((solver.value_of(width) - 10.0).abs() < 1e-6);
//! ```

mod row;
mod solver;
mod symbol;
mod tableau;

pub use solver::{ConstraintId, Solver};

// Re-export the building blocks so most users depend on one crate.
pub use girder_core::{Constraint, Expression, Relation, SolverError, Strength, Variable};
