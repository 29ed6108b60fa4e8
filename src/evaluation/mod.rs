//! Policy evaluation - computing the value function of a fixed policy
//!
//! Two interchangeable evaluators for stationary policies: the iterative
//! sweep-based form ([`IterativePolicyEvaluation`]) and the exact
//! linear-system form ([`ExactPolicyEvaluation`]), plus backward induction
//! for finite-horizon policies ([`FiniteHorizonPolicyEvaluation`]).

mod exact;
mod finite_horizon;
mod iterative;

pub use exact::ExactPolicyEvaluation;
pub use finite_horizon::FiniteHorizonPolicyEvaluation;
pub use iterative::IterativePolicyEvaluation;

use crate::error::Result;

/// Policy evaluation port: computes a value estimate `V` for a policy `P`.
pub trait PolicyEvaluation<P, V> {
    /// Evaluate `policy`, producing its value function.
    fn eval(&self, policy: &P) -> Result<V>;
}
