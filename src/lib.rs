//! Dynamic-programming solvers and model-based learning for discrete-time
//! (Semi-)Markov Decision Processes
//!
//! This crate provides:
//! - MDP/SMDP model abstractions with temporally-extended, variable-duration
//!   actions and a finite-state specialization
//! - Tabular policy, value-function and action-value representations
//! - The classical solution algorithms: iterative and exact policy
//!   evaluation, policy improvement, value iteration and a generic
//!   policy-iteration driver with lifecycle listeners
//! - A sample-based maximum-likelihood SMDP estimator with
//!   optimism-under-uncertainty knownness gating for model-based
//!   reinforcement learning
//!
//! States and actions are opaque caller-defined types; the library only
//! requires them to be cloneable, hashable and comparable. Everything is
//! synchronous and single-threaded.

pub mod actions;
pub mod discount;
pub mod error;
pub mod estimator;
pub mod evaluation;
pub mod improvement;
pub mod listeners;
pub mod model;
pub mod optimization;
pub mod policy;
pub mod policy_iteration;
pub mod tables;
pub mod value;
pub mod value_iteration;

pub use actions::{ActionSet, VecActionSet};
pub use discount::DiscountFactor;
pub use error::{Error, Result};
pub use estimator::{ActionOutcome, RewardBounds, SmdpEstimator};
pub use evaluation::{
    ExactPolicyEvaluation, FiniteHorizonPolicyEvaluation, IterativePolicyEvaluation,
    PolicyEvaluation,
};
pub use improvement::{PolicyImprovement, StationaryPolicyImprovement};
pub use listeners::{
    JsonLinesListener, MetricsListener, PolicyIterationSummary, ProgressListener, TraceEvent,
};
pub use model::{FiniteStateMdp, FiniteStateSmdp, Mdp, Smdp, avg_next_v, avg_next_v_at, avg_r};
pub use optimization::Optimization;
pub use policy::{
    DeterministicPolicy, DynStationaryPolicy, FiniteHorizonPolicy, FiniteHorizonTablePolicy,
    Policy, StationaryPolicy, TablePolicy,
};
pub use policy_iteration::{
    DiscountedPolicyIteration, DiscountedPolicyIterationListener, PolicyIteration,
    PolicyIterationListener,
};
pub use tables::{FiniteHorizonTableVFunction, TableQFunction, TableVFunction};
pub use value::{
    DiscountedQFunction, DiscountedVFunction, GreedyQ, QFunction, VFunction,
};
pub use value_iteration::ValueIteration;
