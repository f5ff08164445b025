//! Queue target identification and ordered fallback sets.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;

// ============================================================================
// QueueTarget
// ============================================================================

/// One reachable queue, identified by its region and service endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueTarget {
    pub region: String,
    pub endpoint: String,
}

impl QueueTarget {
    /// Create a queue target
    pub fn new(region: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            endpoint: endpoint.into(),
        }
    }
}

impl std::fmt::Display for QueueTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.endpoint, self.region)
    }
}

// ============================================================================
// QueueTargetSet
// ============================================================================

/// Non-empty ordered set of queue targets.
///
/// The first entry is the primary; the rest are backups tried in the order
/// they were added. Construction goes through [`QueueTargetSet::new`], so a
/// set always holds at least one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueTargetSet {
    targets: Vec<QueueTarget>,
}

impl QueueTargetSet {
    /// Create a set containing only the primary target
    pub fn new(primary: QueueTarget) -> Self {
        Self {
            targets: vec![primary],
        }
    }

    /// Append a backup target, keeping priority order
    pub fn with_backup(mut self, backup: QueueTarget) -> Self {
        self.targets.push(backup);
        self
    }

    /// Get the primary target
    pub fn primary(&self) -> &QueueTarget {
        &self.targets[0]
    }

    /// Get the backup targets in priority order
    pub fn backups(&self) -> &[QueueTarget] {
        &self.targets[1..]
    }

    /// Get all targets in priority order, primary first
    pub fn targets(&self) -> &[QueueTarget] {
        &self.targets
    }
}
