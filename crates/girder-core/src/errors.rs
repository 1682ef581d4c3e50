//! Error types for the Girder solver.

use thiserror::Error;

/// Errors surfaced by solver operations.
///
/// Every error leaves the solver in a consistent state: a failed
/// `add_constraint` rolls back any partial tableau changes before
/// returning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    /// A required constraint is inconsistent with the existing system.
    #[error("Required constraint cannot be satisfied")]
    RequiredFailure,

    /// The constraint handle is not currently installed in the solver.
    #[error("Constraint is not in the solver")]
    UnknownConstraint,

    /// The variable is not registered as an edit variable.
    #[error("Variable is not an edit variable")]
    UnknownEditVariable,

    /// Edit constraints must be retractable, so the required strength is
    /// rejected.
    #[error("Edit variables may not have the required strength")]
    RequiredEditStrength,

    /// `begin_edit` was called before any edit variable was added.
    #[error("No edit variables have been added")]
    NoEditVariables,

    /// `end_edit` was called with no open edit session.
    #[error("No edit session is open")]
    NoEditSession,

    /// An invariant violation inside the solver. These indicate solver
    /// bugs and are never produced by well-formed input.
    #[error("Internal solver error: {0}")]
    Internal(&'static str),
}
