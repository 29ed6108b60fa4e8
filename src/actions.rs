//! Action set port - enumeration and validation of admissible actions
//!
//! An [`ActionSet`] describes which action symbols can be initiated from each
//! state and maps them to a dense integer index space. The solvers consume it
//! for greedy scans (whose tie-break order is the enumeration order returned
//! by [`ActionSet::actions`]) and for seeding arbitrary initial policies via
//! [`ActionSet::uniform_random`].

use rand::RngCore;
use rand::prelude::IndexedRandom;

/// A finite set of action symbols and their initiation constraints.
///
/// Implementations must keep the enumeration order of [`ActionSet::actions`]
/// stable: greedy searches resolve ties in favor of the first action
/// encountered, so a changing order changes which of several equally-good
/// actions is reported.
pub trait ActionSet<S, A> {
    /// Returns true if `action` can be initiated from `state`.
    fn is_valid(&self, state: &S, action: &A) -> bool;

    /// All actions that can be initiated from `state`, in enumeration order.
    fn actions(&self, state: &S) -> Vec<A>;

    /// Indices of all actions that can be initiated from `state`.
    fn indices(&self, state: &S) -> Vec<usize>;

    /// The action symbol mapped to by `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not in `[0, number_of_actions())`.
    fn action(&self, index: usize) -> A;

    /// The unique index of `action`, or `None` for an unknown symbol.
    fn index(&self, action: &A) -> Option<usize>;

    /// The total number of action symbols.
    fn number_of_actions(&self) -> usize;

    /// Sample uniformly among the actions admissible at `state`.
    ///
    /// # Panics
    ///
    /// Panics if no action is admissible at `state`.
    fn uniform_random(&self, state: &S, rng: &mut dyn RngCore) -> A;
}

/// Action set backed by a list of symbols, with every symbol admissible at
/// every state. The index of a symbol is its position in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VecActionSet<A> {
    actions: Vec<A>,
}

impl<A> VecActionSet<A> {
    /// Create an action set from a list of action symbols.
    pub fn new(actions: Vec<A>) -> Self {
        VecActionSet { actions }
    }
}

impl VecActionSet<usize> {
    /// Create an action set whose symbols are the integers `0..num_actions`.
    pub fn indexed(num_actions: usize) -> Self {
        VecActionSet {
            actions: (0..num_actions).collect(),
        }
    }
}

impl<S, A> ActionSet<S, A> for VecActionSet<A>
where
    A: Clone + PartialEq,
{
    fn is_valid(&self, _state: &S, action: &A) -> bool {
        self.actions.contains(action)
    }

    fn actions(&self, _state: &S) -> Vec<A> {
        self.actions.clone()
    }

    fn indices(&self, _state: &S) -> Vec<usize> {
        (0..self.actions.len()).collect()
    }

    fn action(&self, index: usize) -> A {
        self.actions[index].clone()
    }

    fn index(&self, action: &A) -> Option<usize> {
        self.actions.iter().position(|a| a == action)
    }

    fn number_of_actions(&self) -> usize {
        self.actions.len()
    }

    fn uniform_random(&self, _state: &S, rng: &mut dyn RngCore) -> A {
        self.actions
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| panic!("cannot sample from an empty action set"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_indexed_action_set() {
        let actions = VecActionSet::indexed(3);
        assert_eq!(ActionSet::<u32, usize>::number_of_actions(&actions), 3);
        assert_eq!(ActionSet::<u32, usize>::actions(&actions, &0), vec![0, 1, 2]);
        assert_eq!(ActionSet::<u32, usize>::indices(&actions, &0), vec![0, 1, 2]);
        assert_eq!(ActionSet::<u32, usize>::action(&actions, 2), 2);
        assert_eq!(ActionSet::<u32, usize>::index(&actions, &1), Some(1));
        assert_eq!(ActionSet::<u32, usize>::index(&actions, &9), None);
    }

    #[test]
    fn test_is_valid() {
        let actions = VecActionSet::new(vec!["left", "right"]);
        assert!(ActionSet::<u32, &str>::is_valid(&actions, &0, &"left"));
        assert!(!ActionSet::<u32, &str>::is_valid(&actions, &0, &"up"));
    }

    #[test]
    fn test_uniform_random_stays_in_set() {
        let actions = VecActionSet::indexed(4);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let a = ActionSet::<u32, usize>::uniform_random(&actions, &0, &mut rng);
            assert!(a < 4);
        }
    }
}
