//! Policy improvement - one-step lookahead over a value estimate.

use crate::discount::DiscountFactor;
use crate::error::Result;
use crate::model::{FiniteStateSmdp, avg_next_v, avg_r};
use crate::policy::DynStationaryPolicy;
use crate::tables::{TableQFunction, TableVFunction};
use crate::value::DiscountedVFunction;

/// Policy improvement port: derives a better policy `P` from a value
/// estimate `V`.
pub trait PolicyImprovement<P, V> {
    /// Improve on `old_policy` given its value estimate `vfunc`.
    fn improve(&self, old_policy: &P, vfunc: &V) -> Result<P>;
}

/// One-step lookahead improvement for stationary policies.
///
/// Builds the full tabular Q(s, a) = avg_r(s, a) + Σ tprob · γ^d · V(s') and
/// returns it; the Q-table's greedy projection is the improved deterministic
/// policy.
pub struct StationaryPolicyImprovement<'a, M> {
    model: &'a M,
    gamma: DiscountFactor,
}

impl<'a, M> StationaryPolicyImprovement<'a, M>
where
    M: FiniteStateSmdp,
{
    /// Create an improver over `model` with discount factor `gamma`.
    pub fn new(model: &'a M, gamma: DiscountFactor) -> Self {
        StationaryPolicyImprovement { model, gamma }
    }

    /// The model being improved against.
    pub fn model(&self) -> &M {
        self.model
    }

    /// The discount factor applied to successor values.
    pub fn discount_factor(&self) -> DiscountFactor {
        self.gamma
    }

    /// Build the one-step lookahead Q-function for `vfunc` over every state
    /// and admissible action.
    pub fn improve_to_q<V>(&self, vfunc: &V) -> TableQFunction<M::State, M::Action, M::Actions>
    where
        V: DiscountedVFunction<M::State>,
    {
        let mut qfunc =
            TableQFunction::new(self.model.action_set().clone(), 0.0, self.model.op_type());
        for state in self.model.states() {
            for action in self.model.actions(&state) {
                let q = avg_r(self.model, &state, &action)
                    + avg_next_v(self.model, &state, &action, vfunc, self.gamma);
                qfunc.set(state.clone(), action, q);
            }
        }
        qfunc
    }
}

impl<M> PolicyImprovement<DynStationaryPolicy<M::State, M::Action>, TableVFunction<M::State>>
    for StationaryPolicyImprovement<'_, M>
where
    M: FiniteStateSmdp,
    M::State: 'static,
    M::Action: 'static,
    M::Actions: 'static,
{
    fn improve(
        &self,
        _old_policy: &DynStationaryPolicy<M::State, M::Action>,
        vfunc: &TableVFunction<M::State>,
    ) -> Result<DynStationaryPolicy<M::State, M::Action>> {
        Ok(Box::new(self.improve_to_q(vfunc)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::VecActionSet;
    use crate::model::Mdp;
    use crate::optimization::Optimization;
    use crate::policy::StationaryPolicy;
    use crate::value::DiscountedQFunction;

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

    #[test]
    fn test_improvement_is_greedy_one_step_lookahead() {
        let mdp = Hop::new();
        let gamma = DiscountFactor::new(0.9).unwrap();
        let improver = StationaryPolicyImprovement::new(&mdp, gamma);

        // Against the all-zero value estimate, the lookahead reduces to the
        // expected immediate reward.
        let vfunc = TableVFunction::new(0.0);
        let qfunc = improver.improve_to_q(&vfunc);

        assert_eq!(qfunc.value(&0, &0), 0.0);
        assert_eq!(qfunc.value(&0, &1), 1.0);
        assert_eq!(qfunc.value(&1, &0), 1.0);
        assert_eq!(qfunc.value(&1, &1), 0.0);

        // The Q-table acts as the improved deterministic policy.
        assert_eq!(qfunc.action(&0), 1);
        assert_eq!(qfunc.action(&1), 0);
        assert!(qfunc.is_deterministic());
    }

    #[test]
    fn test_improvement_uses_successor_values() {
        let mdp = Hop::new();
        let gamma = DiscountFactor::new(0.5).unwrap();
        let improver = StationaryPolicyImprovement::new(&mdp, gamma);

        let mut vfunc = TableVFunction::new(0.0);
        vfunc.set(0u32, 10.0);
        let qfunc = improver.improve_to_q(&vfunc);

        // Staying in state 0: 0 + γ·10. Hopping to state 1: 1 + γ·0.
        assert!((qfunc.value(&0, &0) - 5.0).abs() < 1e-12);
        assert!((qfunc.value(&0, &1) - 1.0).abs() < 1e-12);
        assert_eq!(qfunc.action(&0), 0);
    }
}
