//! Variable handles.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// A handle for an unknown in a constraint system.
///
/// A `Variable` is a cheap copyable identity. Its id is allocated from a
/// process-wide counter, so the same variable can participate in several
/// independent solvers. Solved values are read back from the solver that
/// owns the solution, not from the variable itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable(u64);

impl Variable {
    /// Create a fresh variable, distinct from all previously created ones.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Variable(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The unique id of this variable.
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}
