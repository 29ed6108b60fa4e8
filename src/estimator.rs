//! Sample-based maximum-likelihood SMDP model estimation
//!
//! [`SmdpEstimator`] turns a stream of observed transitions into a
//! finite-state SMDP usable directly by the dynamic-programming solvers.
//! State-action pairs seen fewer than `m` times are "unknown": they are
//! modeled as deterministically transitioning to a reserved absorbing dummy
//! state in one step, with a reward at the configured bound - optimistic
//! (objective-favorable) for R-MAX-style exploration or pessimistic
//! (objective-unfavorable) for conservative planning. Known pairs report
//! empirical transition frequencies and sample-mean rewards.
//!
//! The estimator is mutable shared state with no internal synchronization;
//! interleaving `update` with reads from another thread of control must be
//! serialized by the caller.

use std::collections::HashMap;
use std::hash::Hash;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::actions::ActionSet;
use crate::error::{Error, Result};
use crate::model::{FiniteStateSmdp, Smdp};
use crate::optimization::Optimization;

/// Closed interval [rmin, rmax] bounding immediate rewards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardBounds {
    rmin: f64,
    rmax: f64,
}

impl RewardBounds {
    /// Create reward bounds, validating `rmin <= rmax`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRewardBounds`] if the interval is inverted.
    pub fn new(rmin: f64, rmax: f64) -> Result<Self> {
        if rmin <= rmax {
            Ok(RewardBounds { rmin, rmax })
        } else {
            Err(Error::InvalidRewardBounds { rmin, rmax })
        }
    }

    /// The lower reward bound.
    pub fn rmin(&self) -> f64 {
        self.rmin
    }

    /// The upper reward bound.
    pub fn rmax(&self) -> f64 {
        self.rmax
    }
}

/// A single observed transition: executing `action` from `state` returned
/// control in `terminal_state` after `duration` timesteps, collecting
/// `reward`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome<S, A> {
    state: S,
    action: A,
    terminal_state: S,
    reward: f64,
    duration: u32,
}

impl<S, A> ActionOutcome<S, A> {
    /// Create an outcome, validating the duration is positive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDuration`] if `duration` is zero.
    pub fn new(state: S, action: A, terminal_state: S, reward: f64, duration: u32) -> Result<Self> {
        if duration < 1 {
            return Err(Error::InvalidDuration { duration });
        }
        Ok(ActionOutcome {
            state,
            action,
            terminal_state,
            reward,
            duration,
        })
    }

    /// The state the action was executed from.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// The executed action.
    pub fn action(&self) -> &A {
        &self.action
    }

    /// The state where control returned.
    pub fn terminal_state(&self) -> &S {
        &self.terminal_state
    }

    /// The collected reward.
    pub fn reward(&self) -> f64 {
        self.reward
    }

    /// The number of timesteps before control returned.
    pub fn duration(&self) -> u32 {
        self.duration
    }
}

/// Maximum-likelihood estimator of an SMDP from observed transitions.
///
/// All visited-state, successor and duration enumerations preserve insertion
/// order, so the model presented to the solvers is deterministic for a fixed
/// observation sequence.
pub struct SmdpEstimator<S, A, K> {
    dummy_state: S,
    action_set: K,
    num_samples_until_known: u64,
    optimistic: bool,
    reward_bounds: RewardBounds,
    op_type: Optimization,
    max_duration: u32,
    states: IndexSet<S>,
    successor_sets: HashMap<(S, A), IndexSet<S>>,
    duration_sets: HashMap<(S, A, S), IndexSet<u32>>,
    s_counts: HashMap<S, u64>,
    sa_counts: HashMap<(S, A), u64>,
    sas_counts: HashMap<(S, A, S), u64>,
    sasd_counts: HashMap<(S, A, S, u32), u64>,
    reward_sums: HashMap<(S, A, S, u32), f64>,
}

impl<S, A, K> SmdpEstimator<S, A, K>
where
    S: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
    K: ActionSet<S, A>,
{
    /// Create an estimator.
    ///
    /// `dummy_state` is the reserved absorbing state unknown pairs route to;
    /// it must not coincide with any real state (this is a caller obligation
    /// and is not checked). `num_samples_until_known` is the knownness
    /// threshold m. `optimistic` selects the objective-favorable reward
    /// bound for unknown pairs, pessimistic the unfavorable one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKnownnessThreshold`] if
    /// `num_samples_until_known` is zero.
    pub fn new(
        dummy_state: S,
        action_set: K,
        num_samples_until_known: u64,
        optimistic: bool,
        reward_bounds: RewardBounds,
        op_type: Optimization,
    ) -> Result<Self> {
        if num_samples_until_known < 1 {
            return Err(Error::InvalidKnownnessThreshold {
                value: num_samples_until_known,
            });
        }
        Ok(SmdpEstimator {
            dummy_state,
            action_set,
            num_samples_until_known,
            optimistic,
            reward_bounds,
            op_type,
            max_duration: 1,
            states: IndexSet::new(),
            successor_sets: HashMap::new(),
            duration_sets: HashMap::new(),
            s_counts: HashMap::new(),
            sa_counts: HashMap::new(),
            sas_counts: HashMap::new(),
            sasd_counts: HashMap::new(),
            reward_sums: HashMap::new(),
        })
    }

    /// Discard all accumulated evidence, reverting to the unknown-everywhere
    /// model with `max_action_duration` of 1.
    pub fn reset(&mut self) {
        self.max_duration = 1;
        self.states.clear();
        self.successor_sets.clear();
        self.duration_sets.clear();
        self.s_counts.clear();
        self.sa_counts.clear();
        self.sas_counts.clear();
        self.sasd_counts.clear();
        self.reward_sums.clear();
    }

    /// The knownness threshold m.
    pub fn num_samples_until_known(&self) -> u64 {
        self.num_samples_until_known
    }

    /// True if unknown pairs are rewarded at the objective-favorable bound.
    pub fn is_optimistic(&self) -> bool {
        self.optimistic
    }

    /// The configured reward interval.
    pub fn reward_bounds(&self) -> RewardBounds {
        self.reward_bounds
    }

    /// The reserved absorbing state unknown pairs transition to.
    pub fn dummy_state(&self) -> &S {
        &self.dummy_state
    }

    /// Record an observed transition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDuration`] if `duration` is zero; the
    /// estimator is left unchanged.
    pub fn update(
        &mut self,
        state: S,
        action: A,
        terminal_state: S,
        reward: f64,
        duration: u32,
    ) -> Result<()> {
        if duration < 1 {
            return Err(Error::InvalidDuration { duration });
        }
        self.apply(state, action, terminal_state, reward, duration);
        Ok(())
    }

    /// Record a pre-validated [`ActionOutcome`].
    pub fn record(&mut self, outcome: ActionOutcome<S, A>) {
        let ActionOutcome {
            state,
            action,
            terminal_state,
            reward,
            duration,
        } = outcome;
        self.apply(state, action, terminal_state, reward, duration);
    }

    fn apply(&mut self, state: S, action: A, terminal_state: S, reward: f64, duration: u32) {
        if duration > self.max_duration {
            self.max_duration = duration;
        }

        self.states.insert(state.clone());
        self.states.insert(terminal_state.clone());

        self.successor_sets
            .entry((state.clone(), action.clone()))
            .or_default()
            .insert(terminal_state.clone());
        self.duration_sets
            .entry((state.clone(), action.clone(), terminal_state.clone()))
            .or_default()
            .insert(duration);

        *self.s_counts.entry(state.clone()).or_insert(0) += 1;
        *self
            .sa_counts
            .entry((state.clone(), action.clone()))
            .or_insert(0) += 1;
        *self
            .sas_counts
            .entry((state.clone(), action.clone(), terminal_state.clone()))
            .or_insert(0) += 1;
        *self
            .sasd_counts
            .entry((
                state.clone(),
                action.clone(),
                terminal_state.clone(),
                duration,
            ))
            .or_insert(0) += 1;
        *self
            .reward_sums
            .entry((state, action, terminal_state, duration))
            .or_insert(0.0) += reward;
    }

    /// Visits of `state`.
    pub fn count(&self, state: &S) -> u64 {
        self.s_counts.get(state).copied().unwrap_or(0)
    }

    /// Visits of (`state`, `action`).
    pub fn count_sa(&self, state: &S, action: &A) -> u64 {
        self.sa_counts
            .get(&(state.clone(), action.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Visits of (`state`, `action`, `terminal_state`).
    pub fn count_sas(&self, state: &S, action: &A, terminal_state: &S) -> u64 {
        self.sas_counts
            .get(&(state.clone(), action.clone(), terminal_state.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Visits of (`state`, `action`, `terminal_state`, `duration`).
    pub fn count_sasd(&self, state: &S, action: &A, terminal_state: &S, duration: u32) -> u64 {
        self.sasd_counts
            .get(&(state.clone(), action.clone(), terminal_state.clone(), duration))
            .copied()
            .unwrap_or(0)
    }

    /// True once (`state`, `action`) has been visited at least m times.
    pub fn is_known(&self, state: &S, action: &A) -> bool {
        self.count_sa(state, action) >= self.num_samples_until_known
    }

    /// The reward reported for unknown pairs: the objective-favorable bound
    /// when optimistic, the unfavorable one when pessimistic.
    fn unknown_r(&self) -> f64 {
        let (favorable, unfavorable) = match self.op_type {
            Optimization::Maximize => (self.reward_bounds.rmax, self.reward_bounds.rmin),
            Optimization::Minimize => (self.reward_bounds.rmin, self.reward_bounds.rmax),
        };
        if self.optimistic { favorable } else { unfavorable }
    }
}

impl<S, A, K> Smdp for SmdpEstimator<S, A, K>
where
    S: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
    K: ActionSet<S, A>,
{
    type State = S;
    type Action = A;

    fn r(&self, state: &S, action: &A, terminal_state: &S, duration: u32) -> f64 {
        let n = self.count_sa(state, action);
        if n < self.num_samples_until_known {
            return self.unknown_r();
        }

        let count = self.count_sasd(state, action, terminal_state, duration);
        if count == 0 {
            // Known pair but unseen quadruple: fall back to rmin
            // unconditionally, ignoring the optimism flag and the objective.
            return self.reward_bounds.rmin;
        }
        let sum = self
            .reward_sums
            .get(&(state.clone(), action.clone(), terminal_state.clone(), duration))
            .copied()
            .unwrap_or(0.0);
        sum / count as f64
    }

    fn tprob(&self, state: &S, action: &A, terminal_state: &S, duration: u32) -> f64 {
        let n = self.count_sa(state, action);
        if n < self.num_samples_until_known {
            // Unknown pairs deterministically reach the dummy state in one
            // step.
            return if *terminal_state == self.dummy_state && duration == 1 {
                1.0
            } else {
                0.0
            };
        }
        self.count_sasd(state, action, terminal_state, duration) as f64 / n as f64
    }

    fn max_action_duration(&self) -> u32 {
        self.max_duration
    }

    fn durations(&self, state: &S, action: &A, terminal_state: &S) -> Vec<u32> {
        let mut durations = vec![1];
        if let Some(observed) = self.duration_sets.get(&(
            state.clone(),
            action.clone(),
            terminal_state.clone(),
        )) {
            durations.extend(observed.iter().copied().filter(|d| *d != 1));
        }
        durations
    }

    fn op_type(&self) -> Optimization {
        self.op_type
    }
}

impl<S, A, K> FiniteStateSmdp for SmdpEstimator<S, A, K>
where
    S: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
    K: ActionSet<S, A> + Clone,
{
    type Actions = K;

    fn states(&self) -> Vec<S> {
        self.states.iter().cloned().collect()
    }

    fn number_of_states(&self) -> usize {
        self.states.len()
    }

    fn successors(&self, state: &S, action: &A) -> Vec<S> {
        let mut successors = vec![self.dummy_state.clone()];
        if let Some(observed) = self.successor_sets.get(&(state.clone(), action.clone())) {
            successors.extend(
                observed
                    .iter()
                    .filter(|terminal| **terminal != self.dummy_state)
                    .cloned(),
            );
        }
        successors
    }

    fn action_set(&self) -> &K {
        &self.action_set
    }
}
