//! Model ports - the read-only environment contract
//!
//! [`Smdp`] is the full semi-Markov contract: expected rewards and transition
//! probabilities over (state, action, terminal state, duration) observations,
//! with discounted variants scaled by γ^duration. [`Mdp`] is the one-step
//! specialization; every `Mdp` satisfies `Smdp` through a blanket impl whose
//! durations degenerate to the single value 1. [`FiniteStateSmdp`] adds the
//! enumerations the dynamic-programming algorithms sweep over.
//!
//! No consistency checks are performed at this layer: transition
//! probabilities summing to 1 per admissible (state, action) pair is an
//! obligation of the concrete model.

use std::hash::Hash;

use crate::actions::ActionSet;
use crate::discount::DiscountFactor;
use crate::optimization::Optimization;
use crate::value::{DiscountedVFunction, VFunction};

/// A discrete-time semi-Markov decision process.
///
/// Actions are temporally extended: executing `action` from `state` returns
/// control in `terminal_state` after `duration` timesteps.
pub trait Smdp {
    /// The state type. Never inspected beyond equality and hashing.
    type State: Clone + Eq + Hash;
    /// The action type. Never inspected beyond equality and hashing.
    type Action: Clone + Eq + Hash;

    /// Expected undiscounted reinforcement for the observation
    /// (state, action, terminal state, duration).
    fn r(&self, state: &Self::State, action: &Self::Action, terminal_state: &Self::State, duration: u32) -> f64;

    /// Probability of the observation (state, action, terminal state,
    /// duration).
    fn tprob(&self, state: &Self::State, action: &Self::Action, terminal_state: &Self::State, duration: u32) -> f64;

    /// Expected discounted reinforcement: γ^duration times [`Smdp::r`].
    fn dr(
        &self,
        state: &Self::State,
        action: &Self::Action,
        terminal_state: &Self::State,
        duration: u32,
        gamma: DiscountFactor,
    ) -> f64 {
        gamma.pow(duration) * self.r(state, action, terminal_state, duration)
    }

    /// Discounted transition probability: γ^duration times [`Smdp::tprob`].
    fn dtprob(
        &self,
        state: &Self::State,
        action: &Self::Action,
        terminal_state: &Self::State,
        duration: u32,
        gamma: DiscountFactor,
    ) -> f64 {
        gamma.pow(duration) * self.tprob(state, action, terminal_state, duration)
    }

    /// An upper bound on the duration of any action in this process.
    fn max_action_duration(&self) -> u32;

    /// Durations with positive probability given that `action` executed from
    /// `state` terminates in `terminal_state`.
    ///
    /// When the support is unknown, returning every duration in
    /// `1..=max_action_duration()` is always legal; correctness requires only
    /// that the true support is covered.
    fn durations(&self, state: &Self::State, action: &Self::Action, terminal_state: &Self::State) -> Vec<u32>;

    /// Whether reinforcements are minimized or maximized.
    fn op_type(&self) -> Optimization;
}

/// A Markov decision process: every action has duration exactly 1.
///
/// Implementors define the one-step reward and transition probability and
/// receive the [`Smdp`] contract through a blanket impl: `r`/`tprob` are 0
/// for any duration other than 1, `durations` is the single-element sequence
/// `{1}` and `max_action_duration` is 1.
pub trait Mdp {
    /// The state type.
    type State: Clone + Eq + Hash;
    /// The action type.
    type Action: Clone + Eq + Hash;

    /// Expected one-step reinforcement for transitioning from `state` to
    /// `next_state` under `action`.
    fn reward(&self, state: &Self::State, action: &Self::Action, next_state: &Self::State) -> f64;

    /// One-step transition probability from `state` to `next_state` under
    /// `action`.
    fn transition_prob(&self, state: &Self::State, action: &Self::Action, next_state: &Self::State) -> f64;

    /// Whether reinforcements are minimized or maximized.
    fn objective(&self) -> Optimization;
}

impl<M: Mdp> Smdp for M {
    type State = M::State;
    type Action = M::Action;

    fn r(&self, state: &Self::State, action: &Self::Action, terminal_state: &Self::State, duration: u32) -> f64 {
        if duration == 1 {
            self.reward(state, action, terminal_state)
        } else {
            0.0
        }
    }

    fn tprob(&self, state: &Self::State, action: &Self::Action, terminal_state: &Self::State, duration: u32) -> f64 {
        if duration == 1 {
            self.transition_prob(state, action, terminal_state)
        } else {
            0.0
        }
    }

    fn max_action_duration(&self) -> u32 {
        1
    }

    fn durations(&self, _state: &Self::State, _action: &Self::Action, _terminal_state: &Self::State) -> Vec<u32> {
        vec![1]
    }

    fn op_type(&self) -> Optimization {
        self.objective()
    }
}

/// A finite-state, finite-action SMDP.
///
/// The order returned by [`FiniteStateSmdp::states`] is the sweep order of
/// the iterative algorithms. It must be stable and deterministic; changing it
/// changes (but does not invalidate) their convergence behavior.
pub trait FiniteStateSmdp: Smdp {
    /// The action-set collaborator describing admissible actions per state.
    type Actions: ActionSet<Self::State, Self::Action> + Clone;

    /// All states of this process, in a stable enumeration order.
    fn states(&self) -> Vec<Self::State>;

    /// The total number of states.
    fn number_of_states(&self) -> usize;

    /// Terminal states reachable with positive probability by executing
    /// `action` from `state`. A superset of the true support is always a
    /// legal implementation.
    fn successors(&self, state: &Self::State, action: &Self::Action) -> Vec<Self::State>;

    /// The action set of this process.
    fn action_set(&self) -> &Self::Actions;

    /// The actions admissible at `state`, in enumeration order.
    fn actions(&self, state: &Self::State) -> Vec<Self::Action> {
        self.action_set().actions(state)
    }

    /// The total number of action symbols. Fewer may be admissible at any
    /// given state.
    fn number_of_actions(&self) -> usize {
        self.action_set().number_of_actions()
    }
}

/// A finite-state, finite-action MDP.
pub trait FiniteStateMdp: FiniteStateSmdp + Mdp {}

impl<M: FiniteStateSmdp + Mdp> FiniteStateMdp for M {}

/// Expected reinforcement of executing `action` from `state`: the
/// probability-weighted sum of `r` over terminal states and durations.
pub fn avg_r<M>(model: &M, state: &M::State, action: &M::Action) -> f64
where
    M: FiniteStateSmdp + ?Sized,
{
    let mut ravg = 0.0;
    for terminal_state in model.successors(state, action) {
        for duration in model.durations(state, action, &terminal_state) {
            let tprob = model.tprob(state, action, &terminal_state, duration);
            let r = model.r(state, action, &terminal_state, duration);
            ravg += tprob * r;
        }
    }
    ravg
}

/// Expected duration-discounted value of the state where `action` returns
/// control: Σ over terminal states and durations of tprob · γ^d · V(s').
pub fn avg_next_v<M, V>(
    model: &M,
    state: &M::State,
    action: &M::Action,
    vfunc: &V,
    gamma: DiscountFactor,
) -> f64
where
    M: FiniteStateSmdp + ?Sized,
    V: DiscountedVFunction<M::State> + ?Sized,
{
    let mut avg = 0.0;
    for terminal_state in model.successors(state, action) {
        for duration in model.durations(state, action, &terminal_state) {
            let tprob = model.tprob(state, action, &terminal_state, duration);
            let v = vfunc.value(&terminal_state);
            avg += gamma.pow(duration) * tprob * v;
        }
    }
    avg
}

/// Timestep-indexed form of [`avg_next_v`]: the value of the terminal state
/// is read at `timestep + duration`.
///
/// With a timestep-bounded value function the caller must ensure
/// `timestep + duration` stays inside the valid range for every duration the
/// model reports.
pub fn avg_next_v_at<M, V>(
    model: &M,
    state: &M::State,
    action: &M::Action,
    timestep: usize,
    vfunc: &V,
    gamma: DiscountFactor,
) -> f64
where
    M: FiniteStateSmdp + ?Sized,
    V: VFunction<M::State> + ?Sized,
{
    let mut avg = 0.0;
    for terminal_state in model.successors(state, action) {
        for duration in model.durations(state, action, &terminal_state) {
            let tprob = model.tprob(state, action, &terminal_state, duration);
            let v = vfunc.value_at(&terminal_state, timestep + duration as usize);
            avg += gamma.pow(duration) * tprob * v;
        }
    }
    avg
}
