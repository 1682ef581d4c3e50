//! Internal tableau symbols.

use std::fmt;

/// The role a symbol plays in the tableau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum SymbolKind {
    /// An external variable (the actual unknowns we're solving for)
    External,
    /// A slack variable (for inequality constraints)
    Slack,
    /// An error variable (for non-required constraints)
    Error,
    /// A dummy variable (for required equality constraints)
    Dummy,
}

/// A solver-internal handle: a unique id plus a role.
///
/// Ids come from a single counter in the solver, so symbols order
/// globally by id regardless of kind. Tie-breaking in the pivot loops
/// always uses this ordering, never floating-point magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct Symbol {
    id: u64,
    kind: SymbolKind,
}

impl Symbol {
    pub fn new(id: u64, kind: SymbolKind) -> Self {
        Self { id, kind }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn is_external(&self) -> bool {
        self.kind == SymbolKind::External
    }

    pub fn is_error(&self) -> bool {
        self.kind == SymbolKind::Error
    }

    pub fn is_dummy(&self) -> bool {
        self.kind == SymbolKind::Dummy
    }

    /// Slack and error symbols are restricted to non-negative values and
    /// may enter or leave the basis freely.
    pub fn is_pivotable(&self) -> bool {
        matches!(self.kind, SymbolKind::Slack | SymbolKind::Error)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            SymbolKind::External => 'v',
            SymbolKind::Slack => 's',
            SymbolKind::Error => 'e',
            SymbolKind::Dummy => 'd',
        };
        write!(f, "{}{}", prefix, self.id)
    }
}
