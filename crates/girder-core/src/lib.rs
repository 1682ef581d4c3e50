//! User-facing types for the Girder constraint solver.
//!
//! This crate provides the surface used to describe constraint systems:
//! - `Variable` handles for the unknowns being solved for
//! - `Expression`, a linear combination built with ordinary operators
//! - `Strength` preference levels and per-constraint weights
//! - `Constraint` and `Relation` for equalities and inequalities
//! - Error types
//!
//! The simplex engine itself lives in `girder-solver`.

pub mod constraint;
pub mod errors;
pub mod expression;
pub mod strength;
pub mod variable;

pub use constraint::{Constraint, Relation};
pub use errors::SolverError;
pub use expression::Expression;
pub use strength::Strength;
pub use variable::Variable;
