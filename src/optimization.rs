//! The two possible optimization objectives: minimize or maximize reinforcement.

use serde::{Deserialize, Serialize};

/// Whether the reinforcement signal should be minimized (a cost) or
/// maximized (a reward).
///
/// Every "best value" and "best action" search in the crate is ordered by
/// [`Optimization::first_is_better`]; there is no other comparison rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Optimization {
    /// Smaller reinforcement is preferable (costs).
    Minimize,
    /// Larger reinforcement is preferable (rewards).
    Maximize,
}

impl Optimization {
    /// Returns true if `first` is strictly preferable to `second` under this
    /// objective.
    ///
    /// Equal scores are never "better", so searches that keep the incumbent
    /// on ties resolve them in favor of the first candidate encountered.
    pub fn first_is_better(&self, first: f64, second: f64) -> bool {
        match self {
            Optimization::Minimize => first < second,
            Optimization::Maximize => first > second,
        }
    }
}
