#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Knobs for one simplifier run. Loaded from the `[simplify]` table of
/// `loom.toml` by the CLI; every field has a default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimplifyOptions {
    /// Drop `let` bindings whose body no longer references them.
    pub remove_dead_lets: bool,
    /// Rule applications allowed at a single node before giving up.
    pub max_rewrites: usize,
    /// Nesting limit for rewriting nodes freshly built by a rule.
    pub max_rewrite_depth: usize,
    /// Reject ill-scoped input (debug builds only).
    pub check_preconditions: bool,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        Self {
            remove_dead_lets: true,
            max_rewrites: 8,
            max_rewrite_depth: 16,
            check_preconditions: true,
        }
    }
}

impl SimplifyOptions {
    pub fn with_remove_dead_lets(mut self, remove: bool) -> Self {
        self.remove_dead_lets = remove;
        self
    }
}
