//! Tabular value and action-value functions
//!
//! Each table holds an explicit mapping to a scalar and a configured default
//! returned for any unseen key. Defaults are never written back: a lookup
//! miss leaves the table unchanged.

use std::collections::HashMap;
use std::hash::Hash;

use crate::actions::ActionSet;
use crate::error::{Error, Result};
use crate::optimization::Optimization;
use crate::policy::{DeterministicPolicy, StationaryPolicy};
use crate::value::{DiscountedQFunction, DiscountedVFunction, QFunction, VFunction};

/// Time-homogeneous tabular value function.
#[derive(Debug, Clone, PartialEq)]
pub struct TableVFunction<S: Eq + Hash> {
    values: HashMap<S, f64>,
    default_value: f64,
}

impl<S> TableVFunction<S>
where
    S: Clone + Eq + Hash,
{
    /// Create an empty table; every lookup returns `default_value`.
    pub fn new(default_value: f64) -> Self {
        TableVFunction {
            values: HashMap::new(),
            default_value,
        }
    }

    /// Create a table from an explicit map of values.
    pub fn from_map(values: HashMap<S, f64>, default_value: f64) -> Self {
        TableVFunction {
            values,
            default_value,
        }
    }

    /// Set the value of `state`.
    pub fn set(&mut self, state: S, value: f64) {
        self.values.insert(state, value);
    }

    /// The number of states with an explicit value.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if no state has an explicit value.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S> VFunction<S> for TableVFunction<S>
where
    S: Clone + Eq + Hash,
{
    fn value_at(&self, state: &S, _timestep: usize) -> f64 {
        self.value(state)
    }
}

impl<S> DiscountedVFunction<S> for TableVFunction<S>
where
    S: Clone + Eq + Hash,
{
    fn value(&self, state: &S) -> f64 {
        self.values.get(state).copied().unwrap_or(self.default_value)
    }
}

/// Time-homogeneous tabular action-value function.
///
/// Greedy selection scans the action set's enumeration for the state in
/// order, so ties deterministically resolve to the first optimal action.
/// The table is itself a deterministic [`StationaryPolicy`] through that
/// greedy selection.
#[derive(Debug, Clone)]
pub struct TableQFunction<S, A, K> {
    values: HashMap<(S, A), f64>,
    action_set: K,
    default_value: f64,
    op_type: Optimization,
}

impl<S, A, K> TableQFunction<S, A, K>
where
    S: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
    K: ActionSet<S, A>,
{
    /// Create an empty table over `action_set`; every lookup returns
    /// `default_value`.
    pub fn new(action_set: K, default_value: f64, op_type: Optimization) -> Self {
        TableQFunction {
            values: HashMap::new(),
            action_set,
            default_value,
            op_type,
        }
    }

    /// Set the value of (`state`, `action`).
    pub fn set(&mut self, state: S, action: A, value: f64) {
        self.values.insert((state, action), value);
    }

    /// The number of state-action pairs with an explicit value.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if no state-action pair has an explicit value.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn lookup(&self, state: &S, action: &A) -> f64 {
        self.values
            .get(&(state.clone(), action.clone()))
            .copied()
            .unwrap_or(self.default_value)
    }

    /// Linear scan over the action set's enumeration, keeping the first
    /// optimum under the objective.
    fn greedy_pair(&self, state: &S) -> Option<(A, f64)> {
        let mut best: Option<(A, f64)> = None;
        for action in self.action_set.actions(state) {
            let value = self.lookup(state, &action);
            let better = match &best {
                None => true,
                Some((_, best_value)) => self.op_type.first_is_better(value, *best_value),
            };
            if better {
                best = Some((action, value));
            }
        }
        best
    }
}

impl<S, A, K> QFunction<S, A> for TableQFunction<S, A, K>
where
    S: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
    K: ActionSet<S, A>,
{
    fn value_at(&self, state: &S, action: &A, _timestep: usize) -> f64 {
        self.value(state, action)
    }

    fn greedy_value_at(&self, state: &S, _timestep: usize) -> f64 {
        self.greedy_value(state)
    }

    fn greedy_action_at(&self, state: &S, _timestep: usize) -> A {
        self.greedy_action(state)
    }

    fn op_type(&self) -> Optimization {
        self.op_type
    }
}

impl<S, A, K> DiscountedQFunction<S, A> for TableQFunction<S, A, K>
where
    S: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
    K: ActionSet<S, A>,
{
    fn value(&self, state: &S, action: &A) -> f64 {
        self.lookup(state, action)
    }

    fn greedy_value(&self, state: &S) -> f64 {
        self.greedy_pair(state)
            .map(|(_, value)| value)
            .unwrap_or(self.default_value)
    }

    /// # Panics
    ///
    /// Panics if the action set enumerates no actions for `state`.
    fn greedy_action(&self, state: &S) -> A {
        self.greedy_pair(state)
            .map(|(action, _)| action)
            .unwrap_or_else(|| panic!("no admissible actions to select greedily from"))
    }
}

impl<S, A, K> StationaryPolicy<S, A> for TableQFunction<S, A, K>
where
    S: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
    K: ActionSet<S, A>,
{
    fn action(&self, state: &S) -> A {
        self.greedy_action(state)
    }

    fn aprob(&self, state: &S, action: &A) -> f64 {
        if self.greedy_action(state) == *action {
            1.0
        } else {
            0.0
        }
    }

    fn is_deterministic(&self) -> bool {
        true
    }
}

impl<S, A, K> DeterministicPolicy<S, A> for TableQFunction<S, A, K>
where
    S: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
    K: ActionSet<S, A>,
{
}

/// Tabular value function over timesteps `[0, horizon)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FiniteHorizonTableVFunction<S: Eq + Hash> {
    values: Vec<HashMap<S, f64>>,
    default_value: f64,
}

impl<S> FiniteHorizonTableVFunction<S>
where
    S: Clone + Eq + Hash,
{
    /// Create an empty table over timesteps `[0, horizon)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHorizon`] if `horizon` is zero.
    pub fn new(horizon: usize, default_value: f64) -> Result<Self> {
        if horizon < 1 {
            return Err(Error::InvalidHorizon { horizon });
        }
        let mut values = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            values.push(HashMap::new());
        }
        Ok(FiniteHorizonTableVFunction {
            values,
            default_value,
        })
    }

    /// The number of timesteps this table is defined for.
    pub fn horizon(&self) -> usize {
        self.values.len()
    }

    /// The value of `state` at `timestep`, or the default on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TimestepOutOfRange`] if `timestep >= horizon`.
    pub fn get(&self, state: &S, timestep: usize) -> Result<f64> {
        match self.values.get(timestep) {
            Some(map) => Ok(map.get(state).copied().unwrap_or(self.default_value)),
            None => Err(Error::TimestepOutOfRange {
                timestep,
                horizon: self.values.len(),
            }),
        }
    }

    /// Set the value of `state` at `timestep`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TimestepOutOfRange`] if `timestep >= horizon`.
    pub fn set(&mut self, state: S, timestep: usize, value: f64) -> Result<()> {
        let horizon = self.values.len();
        match self.values.get_mut(timestep) {
            Some(map) => {
                map.insert(state, value);
                Ok(())
            }
            None => Err(Error::TimestepOutOfRange { timestep, horizon }),
        }
    }
}

impl<S> VFunction<S> for FiniteHorizonTableVFunction<S>
where
    S: Clone + Eq + Hash,
{
    /// # Panics
    ///
    /// Panics if `timestep` is outside `[0, horizon)`; use
    /// [`FiniteHorizonTableVFunction::get`] to probe without panicking.
    fn value_at(&self, state: &S, timestep: usize) -> f64 {
        self.get(state, timestep).unwrap_or_else(|err| panic!("{err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::VecActionSet;

    #[test]
    fn test_vfunction_default_on_miss() {
        let mut vfunc = TableVFunction::new(-1.0);
        assert_eq!(vfunc.value(&0u32), -1.0);
        vfunc.set(0, 2.5);
        assert_eq!(vfunc.value(&0), 2.5);
        assert_eq!(vfunc.value(&1), -1.0);
        // Misses are not written back.
        assert_eq!(vfunc.len(), 1);
    }

    #[test]
    fn test_qfunction_set_get() {
        let mut qfunc = TableQFunction::new(VecActionSet::indexed(3), 0.0, Optimization::Maximize);
        qfunc.set(0u32, 1, 1.5);
        assert_eq!(qfunc.value(&0, &1), 1.5);
        assert_eq!(qfunc.value(&0, &2), 0.0);
    }

    #[test]
    fn test_greedy_selection() {
        let mut qfunc = TableQFunction::new(VecActionSet::indexed(3), 0.0, Optimization::Maximize);
        qfunc.set(0u32, 0, 0.5);
        qfunc.set(0u32, 1, 1.5);
        qfunc.set(0u32, 2, 0.8);

        assert_eq!(qfunc.greedy_action(&0), 1);
        assert_eq!(qfunc.greedy_value(&0), 1.5);
    }

    #[test]
    fn test_greedy_under_minimize() {
        let mut qfunc = TableQFunction::new(VecActionSet::indexed(3), 10.0, Optimization::Minimize);
        qfunc.set(0u32, 0, 4.0);
        qfunc.set(0u32, 1, 2.0);
        qfunc.set(0u32, 2, 3.0);

        assert_eq!(qfunc.greedy_action(&0), 1);
        assert_eq!(qfunc.greedy_value(&0), 2.0);
    }

    #[test]
    fn test_greedy_tie_break_is_first_in_enumeration_order() {
        let mut qfunc = TableQFunction::new(VecActionSet::indexed(4), 0.0, Optimization::Maximize);
        qfunc.set(0u32, 1, 1.0);
        qfunc.set(0u32, 2, 1.0);
        qfunc.set(0u32, 3, 0.5);

        for _ in 0..10 {
            assert_eq!(qfunc.greedy_action(&0), 1);
        }
    }

    #[test]
    fn test_greedy_on_unseen_state_uses_defaults() {
        let qfunc: TableQFunction<u32, usize, _> =
            TableQFunction::new(VecActionSet::indexed(2), 0.25, Optimization::Maximize);
        // All actions read the default, so the first action wins the tie.
        assert_eq!(qfunc.greedy_action(&9), 0);
        assert_eq!(qfunc.greedy_value(&9), 0.25);
    }

    #[test]
    fn test_qfunction_is_its_own_greedy_policy() {
        let mut qfunc = TableQFunction::new(VecActionSet::indexed(2), 0.0, Optimization::Maximize);
        qfunc.set(0u32, 1, 2.0);

        assert_eq!(StationaryPolicy::action(&qfunc, &0), 1);
        assert_eq!(qfunc.aprob(&0, &1), 1.0);
        assert_eq!(qfunc.aprob(&0, &0), 0.0);
        assert!(qfunc.is_deterministic());

        let vfunc = qfunc.greedy();
        assert_eq!(vfunc.value(&0), 2.0);
    }

    #[test]
    fn test_finite_horizon_table_range() {
        let mut vfunc = FiniteHorizonTableVFunction::new(3, 0.0).unwrap();
        vfunc.set(0u32, 2, 1.0).unwrap();
        assert_eq!(vfunc.get(&0, 2).unwrap(), 1.0);
        assert_eq!(vfunc.get(&0, 0).unwrap(), 0.0);
        assert!(matches!(
            vfunc.get(&0, 3),
            Err(Error::TimestepOutOfRange {
                timestep: 3,
                horizon: 3
            })
        ));
        assert!(vfunc.set(0u32, 3, 1.0).is_err());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_finite_horizon_value_at_panics_out_of_range() {
        let vfunc = FiniteHorizonTableVFunction::<u32>::new(2, 0.0).unwrap();
        vfunc.value_at(&0, 2);
    }

    #[test]
    fn test_finite_horizon_rejects_zero_horizon() {
        assert!(FiniteHorizonTableVFunction::<u32>::new(0, 0.0).is_err());
    }
}
