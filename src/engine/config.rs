//! Engine configuration options.

use serde::{Deserialize, Serialize};

/// Budgets that bound one resolution call. Exceeding either aborts the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum derivative nesting below the root asset.
    pub max_depth: usize,
    /// Maximum number of assets visited in one call, across all legs.
    pub max_steps: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 16,
            max_steps: 4_096,
        }
    }
}
