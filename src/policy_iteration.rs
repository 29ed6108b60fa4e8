//! Policy iteration - alternating evaluation and improvement
//!
//! [`PolicyIteration`] is the generic driver: it owns pluggable
//! [`PolicyEvaluation`] and [`PolicyImprovement`] collaborators, takes the
//! initial-policy strategy and the termination rule from the caller, and
//! reports lifecycle events to registered [`PolicyIterationListener`]s.
//! [`DiscountedPolicyIteration`] is the ready-made discounted variant.

use std::collections::HashMap;
use std::fmt::Debug;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::actions::ActionSet;
use crate::discount::DiscountFactor;
use crate::error::Result;
use crate::evaluation::{ExactPolicyEvaluation, PolicyEvaluation};
use crate::improvement::{PolicyImprovement, StationaryPolicyImprovement};
use crate::model::FiniteStateSmdp;
use crate::policy::{DynStationaryPolicy, StationaryPolicy, TablePolicy};
use crate::tables::TableVFunction;

/// Listener for policy-iteration lifecycle events.
///
/// Listeners are notified synchronously from within the driving loop, in
/// registration order. They must not block; an error returned from a
/// listener aborts the run.
///
/// # Event Sequence
///
/// 1. `on_initial_evaluation` - once, after the initial policy is generated
///    and evaluated
/// 2. `on_iteration` - after each improvement/re-evaluation round
/// 3. `on_finished` - once, when the termination rule fires
///
/// All methods default to doing nothing.
pub trait PolicyIterationListener<P, V> {
    /// Called after the initial policy has been generated and evaluated.
    fn on_initial_evaluation(
        &mut self,
        _policy: &P,
        _vfunc: &V,
        _generation_time: Duration,
        _evaluation_time: Duration,
    ) -> Result<()> {
        Ok(())
    }

    /// Called after each improvement round, with the policies and value
    /// functions on both sides of the improvement. `iteration` is 1-based.
    #[allow(clippy::too_many_arguments)]
    fn on_iteration(
        &mut self,
        _iteration: usize,
        _old_policy: &P,
        _old_vfunc: &V,
        _new_policy: &P,
        _new_vfunc: &V,
        _improvement_time: Duration,
        _evaluation_time: Duration,
    ) -> Result<()> {
        Ok(())
    }

    /// Called once with the final policy and value function.
    fn on_finished(&mut self, _policy: &P, _vfunc: &V) -> Result<()> {
        Ok(())
    }
}

/// Generic policy-iteration driver.
///
/// The policy type `P` and value type `V` are abstract; the concrete loop is
/// assembled from a [`PolicyEvaluation`] and a [`PolicyImprovement`] plus
/// the strategies supplied to [`PolicyIteration::run`].
pub struct PolicyIteration<P, V, E, I> {
    evaluation: E,
    improvement: I,
    listeners: Vec<Box<dyn PolicyIterationListener<P, V>>>,
}

impl<P, V, E, I> PolicyIteration<P, V, E, I>
where
    E: PolicyEvaluation<P, V>,
    I: PolicyImprovement<P, V>,
{
    /// Create a driver from its evaluation and improvement collaborators.
    pub fn new(evaluation: E, improvement: I) -> Self {
        PolicyIteration {
            evaluation,
            improvement,
            listeners: Vec::new(),
        }
    }

    /// The evaluation collaborator.
    pub fn evaluation(&self) -> &E {
        &self.evaluation
    }

    /// The improvement collaborator.
    pub fn improvement(&self) -> &I {
        &self.improvement
    }

    /// Register a listener. Listeners are notified in registration order.
    pub fn add_listener(&mut self, listener: Box<dyn PolicyIterationListener<P, V>>) {
        self.listeners.push(listener);
    }

    /// Builder-style form of [`PolicyIteration::add_listener`].
    pub fn with_listener(mut self, listener: Box<dyn PolicyIterationListener<P, V>>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Run policy iteration to termination and return the final policy.
    ///
    /// `initial_policy` generates the starting policy. `is_finished` is the
    /// termination rule; it receives the already-improved policy, its value
    /// function and the number of completed improvement rounds, and is first
    /// consulted with the initial policy and an iteration count of 0.
    pub fn run<G, F>(&mut self, initial_policy: G, mut is_finished: F) -> Result<P>
    where
        G: FnOnce() -> Result<P>,
        F: FnMut(&P, &V, usize) -> bool,
    {
        let generation_start = Instant::now();
        let mut policy = initial_policy()?;
        let generation_time = generation_start.elapsed();

        let evaluation_start = Instant::now();
        let mut vfunc = self.evaluation.eval(&policy)?;
        let evaluation_time = evaluation_start.elapsed();

        for listener in &mut self.listeners {
            listener.on_initial_evaluation(&policy, &vfunc, generation_time, evaluation_time)?;
        }

        let mut iteration = 0;
        while !is_finished(&policy, &vfunc, iteration) {
            iteration += 1;

            let improvement_start = Instant::now();
            let new_policy = self.improvement.improve(&policy, &vfunc)?;
            let improvement_time = improvement_start.elapsed();

            let evaluation_start = Instant::now();
            let new_vfunc = self.evaluation.eval(&new_policy)?;
            let evaluation_time = evaluation_start.elapsed();

            for listener in &mut self.listeners {
                listener.on_iteration(
                    iteration,
                    &policy,
                    &vfunc,
                    &new_policy,
                    &new_vfunc,
                    improvement_time,
                    evaluation_time,
                )?;
            }

            policy = new_policy;
            vfunc = new_vfunc;
        }

        for listener in &mut self.listeners {
            listener.on_finished(&policy, &vfunc)?;
        }

        Ok(policy)
    }
}

/// The boxed listener type used by [`DiscountedPolicyIteration`].
pub type DiscountedPolicyIterationListener<M> = Box<
    dyn PolicyIterationListener<
            DynStationaryPolicy<
                <M as crate::model::Smdp>::State,
                <M as crate::model::Smdp>::Action,
            >,
            TableVFunction<<M as crate::model::Smdp>::State>,
        >,
>;

/// Policy iteration for discounted stationary policies over a finite-state
/// model.
///
/// The initial policy selects a uniform-random admissible action per state;
/// evaluation is exact ([`ExactPolicyEvaluation`]); improvement is one-step
/// lookahead ([`StationaryPolicyImprovement`]). The loop terminates when the
/// iteration cap is reached (`None` means run until convergence only) or
/// when the improved policy selects the same action as its predecessor at
/// every state.
pub struct DiscountedPolicyIteration<'a, M: FiniteStateSmdp> {
    model: &'a M,
    max_iterations: Option<usize>,
    rng: StdRng,
    inner: PolicyIteration<
        DynStationaryPolicy<M::State, M::Action>,
        TableVFunction<M::State>,
        ExactPolicyEvaluation<'a, M>,
        StationaryPolicyImprovement<'a, M>,
    >,
}

impl<'a, M> DiscountedPolicyIteration<'a, M>
where
    M: FiniteStateSmdp,
    M::State: Debug + 'static,
    M::Action: 'static,
    M::Actions: 'static,
{
    /// Create a solver over `model` with discount factor `gamma`.
    ///
    /// `max_iterations` caps the number of improvement rounds; `None` runs
    /// until the policy stops changing.
    pub fn new(model: &'a M, gamma: DiscountFactor, max_iterations: Option<usize>) -> Self {
        DiscountedPolicyIteration {
            model,
            max_iterations,
            rng: StdRng::from_os_rng(),
            inner: PolicyIteration::new(
                ExactPolicyEvaluation::new(model, gamma),
                StationaryPolicyImprovement::new(model, gamma),
            ),
        }
    }

    /// Seed the generator used to draw the initial policy, for reproducible
    /// runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Register a listener. Listeners are notified in registration order.
    pub fn add_listener(&mut self, listener: DiscountedPolicyIterationListener<M>) {
        self.inner.add_listener(listener);
    }

    /// Builder-style form of [`DiscountedPolicyIteration::add_listener`].
    pub fn with_listener(mut self, listener: DiscountedPolicyIterationListener<M>) -> Self {
        self.inner.add_listener(listener);
        self
    }

    /// Run policy iteration to termination and return the final policy.
    pub fn run(&mut self) -> Result<DynStationaryPolicy<M::State, M::Action>> {
        let states = self.model.states();
        let action_set = self.model.action_set().clone();
        let max_iterations = self.max_iterations;

        let rng = &mut self.rng;
        let initial_states = states.clone();
        let initial_policy = move || -> Result<DynStationaryPolicy<M::State, M::Action>> {
            let mut map = HashMap::new();
            for state in initial_states {
                let action = action_set.uniform_random(&state, rng);
                map.insert(state, action);
            }
            Ok(Box::new(TablePolicy::new(map)))
        };

        let mut last_actions: Option<Vec<M::Action>> = None;
        let is_finished = |policy: &DynStationaryPolicy<M::State, M::Action>,
                           _vfunc: &TableVFunction<M::State>,
                           iteration: usize| {
            let current: Vec<M::Action> = states.iter().map(|state| policy.action(state)).collect();

            if max_iterations.is_some_and(|cap| iteration >= cap) {
                last_actions = Some(current);
                return true;
            }

            let unchanged = last_actions.as_ref().is_some_and(|previous| *previous == current);
            last_actions = Some(current);
            unchanged
        };

        self.inner.run(initial_policy, is_finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::VecActionSet;
    use crate::model::Mdp;
    use crate::optimization::Optimization;

    /// Two actions: action 0 stays put, action 1 moves to the other state.
    /// Entering state 1 pays 1.
    struct Hop {
        action_set: VecActionSet<usize>,
    }

    impl Hop {
        fn new() -> Self {
            Hop {
                action_set: VecActionSet::indexed(2),
            }
        }
    }

    impl Mdp for Hop {
        type State = u32;
        type Action = usize;

        fn reward(&self, _state: &u32, _action: &usize, next_state: &u32) -> f64 {
            if *next_state == 1 { 1.0 } else { 0.0 }
        }

        fn transition_prob(&self, state: &u32, action: &usize, next_state: &u32) -> f64 {
            let target = match action {
                0 => *state,
                _ => 1 - *state,
            };
            if *next_state == target { 1.0 } else { 0.0 }
        }

        fn objective(&self) -> Optimization {
            Optimization::Maximize
        }
    }

    impl FiniteStateSmdp for Hop {
        type Actions = VecActionSet<usize>;

        fn states(&self) -> Vec<u32> {
            vec![0, 1]
        }

        fn number_of_states(&self) -> usize {
            2
        }

        fn successors(&self, _state: &u32, _action: &usize) -> Vec<u32> {
            vec![0, 1]
        }

        fn action_set(&self) -> &VecActionSet<usize> {
            &self.action_set
        }
    }

    /// Records which events fired, in order.
    struct RecordingListener {
        events: std::rc::Rc<std::cell::RefCell<Vec<String>>>,
        tag: &'static str,
    }

    impl<P, V> PolicyIterationListener<P, V> for RecordingListener {
        fn on_initial_evaluation(
            &mut self,
            _policy: &P,
            _vfunc: &V,
            _generation_time: Duration,
            _evaluation_time: Duration,
        ) -> Result<()> {
            self.events.borrow_mut().push(format!("{}:initial", self.tag));
            Ok(())
        }

        fn on_iteration(
            &mut self,
            iteration: usize,
            _old_policy: &P,
            _old_vfunc: &V,
            _new_policy: &P,
            _new_vfunc: &V,
            _improvement_time: Duration,
            _evaluation_time: Duration,
        ) -> Result<()> {
            self.events
                .borrow_mut()
                .push(format!("{}:iteration {iteration}", self.tag));
            Ok(())
        }

        fn on_finished(&mut self, _policy: &P, _vfunc: &V) -> Result<()> {
            self.events.borrow_mut().push(format!("{}:finished", self.tag));
            Ok(())
        }
    }

    #[test]
    fn test_converges_to_optimal_policy() {
        let mdp = Hop::new();
        let gamma = DiscountFactor::new(0.9).unwrap();
        let mut pi = DiscountedPolicyIteration::new(&mdp, gamma, None).with_seed(13);
        let policy = pi.run().unwrap();

        assert_eq!(policy.action(&0), 1);
        assert_eq!(policy.action(&1), 0);
        assert!(policy.is_deterministic());
    }

    #[test]
    fn test_iteration_cap_zero_returns_initial_policy() {
        let mdp = Hop::new();
        let gamma = DiscountFactor::new(0.9).unwrap();
        let mut pi = DiscountedPolicyIteration::new(&mdp, gamma, Some(0)).with_seed(13);
        let policy = pi.run().unwrap();

        // With a cap of 0 the loop never improves; the initial policy still
        // maps every state.
        let _ = policy.action(&0);
        let _ = policy.action(&1);
    }

    #[test]
    fn test_listeners_fire_in_registration_order() {
        let events = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mdp = Hop::new();
        let gamma = DiscountFactor::new(0.9).unwrap();
        let mut pi = DiscountedPolicyIteration::new(&mdp, gamma, Some(1))
            .with_seed(13)
            .with_listener(Box::new(RecordingListener {
                events: events.clone(),
                tag: "a",
            }))
            .with_listener(Box::new(RecordingListener {
                events: events.clone(),
                tag: "b",
            }));
        pi.run().unwrap();

        let events = events.borrow();
        assert_eq!(
            *events,
            vec![
                "a:initial".to_string(),
                "b:initial".to_string(),
                "a:iteration 1".to_string(),
                "b:iteration 1".to_string(),
                "a:finished".to_string(),
                "b:finished".to_string(),
            ]
        );
    }
}
