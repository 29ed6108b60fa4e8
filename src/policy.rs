//! Policy ports and table-backed policies
//!
//! A [`Policy`] maps (state, timestep) to an action. [`StationaryPolicy`]
//! drops the timestep dependence and exposes action-selection probabilities;
//! every stationary policy is a [`Policy`] through a blanket impl.
//! [`FiniteHorizonPolicy`] is defined only over timesteps `[0, horizon)`.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::{Error, Result};

/// A rule for selecting an action from a state at a timestep.
pub trait Policy<S, A> {
    /// The action to execute from `state` at `timestep`.
    fn action_at(&self, state: &S, timestep: usize) -> A;
}

/// A timestep-independent policy.
pub trait StationaryPolicy<S, A> {
    /// The action to execute from `state`. For stochastic policies this is a
    /// sample from the policy's action distribution.
    fn action(&self, state: &S) -> A;

    /// The probability that this policy selects `action` at `state`.
    fn aprob(&self, state: &S, action: &A) -> f64;

    /// True if this policy always selects a single fixed action per state.
    fn is_deterministic(&self) -> bool;
}

impl<S, A, P> Policy<S, A> for P
where
    P: StationaryPolicy<S, A>,
{
    fn action_at(&self, state: &S, _timestep: usize) -> A {
        self.action(state)
    }
}

/// Marker for stationary policies whose `aprob` is 1 for the selected action
/// and 0 for every other action.
pub trait DeterministicPolicy<S, A>: StationaryPolicy<S, A> {}

/// A policy defined only over timesteps `[0, horizon)`.
pub trait FiniteHorizonPolicy<S, A>: Policy<S, A> {
    /// The number of timesteps this policy is defined for.
    fn horizon(&self) -> usize;
}

/// A boxed stationary policy, the currency of the policy-iteration driver.
pub type DynStationaryPolicy<S, A> = Box<dyn StationaryPolicy<S, A>>;

impl<S, A> StationaryPolicy<S, A> for Box<dyn StationaryPolicy<S, A>> {
    fn action(&self, state: &S) -> A {
        (**self).action(state)
    }

    fn aprob(&self, state: &S, action: &A) -> f64 {
        (**self).aprob(state, action)
    }

    fn is_deterministic(&self) -> bool {
        (**self).is_deterministic()
    }
}

/// Deterministic stationary policy backed by a state-to-action map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePolicy<S: Eq + Hash, A> {
    actions: HashMap<S, A>,
}

impl<S, A> TablePolicy<S, A>
where
    S: Eq + Hash,
{
    /// Create a policy from an explicit state-to-action map.
    pub fn new(actions: HashMap<S, A>) -> Self {
        TablePolicy { actions }
    }

    /// Create a policy with no mapped states.
    pub fn empty() -> Self {
        TablePolicy {
            actions: HashMap::new(),
        }
    }

    /// Map `state` to `action`, replacing any previous mapping.
    pub fn set(&mut self, state: S, action: A) {
        self.actions.insert(state, action);
    }

    /// The action mapped to `state`, if any.
    pub fn get(&self, state: &S) -> Option<&A> {
        self.actions.get(state)
    }

    /// The number of mapped states.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True if no state is mapped.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl<S, A> StationaryPolicy<S, A> for TablePolicy<S, A>
where
    S: Eq + Hash + Debug,
    A: Clone + PartialEq,
{
    /// # Panics
    ///
    /// Panics if `state` has no mapped action. The map is trusted to cover
    /// every state the caller queries.
    fn action(&self, state: &S) -> A {
        self.actions
            .get(state)
            .cloned()
            .unwrap_or_else(|| panic!("no action mapped for state {state:?}"))
    }

    fn aprob(&self, state: &S, action: &A) -> f64 {
        if self.action(state) == *action { 1.0 } else { 0.0 }
    }

    fn is_deterministic(&self) -> bool {
        true
    }
}

impl<S, A> DeterministicPolicy<S, A> for TablePolicy<S, A>
where
    S: Eq + Hash + Debug,
    A: Clone + PartialEq,
{
}

/// Deterministic finite-horizon policy backed by one state-to-action map per
/// timestep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiniteHorizonTablePolicy<S: Eq + Hash, A> {
    actions: Vec<HashMap<S, A>>,
}

impl<S, A> FiniteHorizonTablePolicy<S, A>
where
    S: Eq + Hash,
{
    /// Create a policy over timesteps `[0, horizon)` with no mapped states.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHorizon`] if `horizon` is zero.
    pub fn new(horizon: usize) -> Result<Self> {
        if horizon < 1 {
            return Err(Error::InvalidHorizon { horizon });
        }
        let mut actions = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            actions.push(HashMap::new());
        }
        Ok(FiniteHorizonTablePolicy { actions })
    }

    /// Map `state` at `timestep` to `action`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TimestepOutOfRange`] if `timestep >= horizon`.
    pub fn set(&mut self, state: S, timestep: usize, action: A) -> Result<()> {
        let horizon = self.actions.len();
        match self.actions.get_mut(timestep) {
            Some(map) => {
                map.insert(state, action);
                Ok(())
            }
            None => Err(Error::TimestepOutOfRange { timestep, horizon }),
        }
    }

    /// The action mapped to `state` at `timestep`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TimestepOutOfRange`] if `timestep >= horizon`.
    pub fn get(&self, state: &S, timestep: usize) -> Result<Option<&A>> {
        match self.actions.get(timestep) {
            Some(map) => Ok(map.get(state)),
            None => Err(Error::TimestepOutOfRange {
                timestep,
                horizon: self.actions.len(),
            }),
        }
    }
}

impl<S, A> Policy<S, A> for FiniteHorizonTablePolicy<S, A>
where
    S: Eq + Hash + Debug,
    A: Clone,
{
    /// # Panics
    ///
    /// Panics if `timestep` is outside `[0, horizon)` or `state` has no
    /// mapped action at `timestep`.
    fn action_at(&self, state: &S, timestep: usize) -> A {
        match self.get(state, timestep) {
            Ok(Some(action)) => action.clone(),
            Ok(None) => panic!("no action mapped for state {state:?} at timestep {timestep}"),
            Err(err) => panic!("{err}"),
        }
    }
}

impl<S, A> FiniteHorizonPolicy<S, A> for FiniteHorizonTablePolicy<S, A>
where
    S: Eq + Hash + Debug,
    A: Clone,
{
    fn horizon(&self) -> usize {
        self.actions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_policy_action_and_aprob() {
        let mut policy = TablePolicy::empty();
        policy.set(0u32, "left");
        policy.set(1u32, "right");

        assert_eq!(policy.action(&0), "left");
        assert_eq!(policy.aprob(&0, &"left"), 1.0);
        assert_eq!(policy.aprob(&0, &"right"), 0.0);
        assert!(policy.is_deterministic());
    }

    #[test]
    #[should_panic(expected = "no action mapped")]
    fn test_table_policy_panics_on_unmapped_state() {
        let policy: TablePolicy<u32, &str> = TablePolicy::empty();
        policy.action(&7);
    }

    #[test]
    fn test_stationary_policy_ignores_timestep() {
        let mut policy = TablePolicy::empty();
        policy.set(0u32, 3usize);
        assert_eq!(policy.action_at(&0, 0), 3);
        assert_eq!(policy.action_at(&0, 99), 3);
    }

    #[test]
    fn test_finite_horizon_policy_range() {
        let mut policy = FiniteHorizonTablePolicy::new(2).unwrap();
        policy.set(0u32, 0, "a").unwrap();
        policy.set(0u32, 1, "b").unwrap();

        assert_eq!(policy.horizon(), 2);
        assert_eq!(policy.action_at(&0, 0), "a");
        assert_eq!(policy.action_at(&0, 1), "b");
        assert!(matches!(
            policy.set(0u32, 2, "c"),
            Err(Error::TimestepOutOfRange {
                timestep: 2,
                horizon: 2
            })
        ));
        assert!(policy.get(&0, 5).is_err());
    }

    #[test]
    fn test_finite_horizon_policy_rejects_zero_horizon() {
        assert!(FiniteHorizonTablePolicy::<u32, usize>::new(0).is_err());
    }
}
