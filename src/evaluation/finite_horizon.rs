//! Finite-horizon policy evaluation by backward induction.

use crate::discount::DiscountFactor;
use crate::error::Result;
use crate::evaluation::PolicyEvaluation;
use crate::model::{FiniteStateMdp, Smdp, avg_next_v_at, avg_r};
use crate::policy::FiniteHorizonPolicy;
use crate::tables::FiniteHorizonTableVFunction;

/// Evaluates a finite-horizon policy with a single backward pass.
///
/// Values are computed for timesteps `horizon - 1` down to 0 with
/// V(·, horizon) implicitly 0. One pass is already exact for a finite
/// horizon, so there is no convergence test. A discount factor of 1
/// evaluates the undiscounted total-reward objective.
pub struct FiniteHorizonPolicyEvaluation<'a, M> {
    model: &'a M,
    gamma: DiscountFactor,
}

impl<'a, M> FiniteHorizonPolicyEvaluation<'a, M>
where
    M: FiniteStateMdp,
{
    /// Create an evaluator over `model` with discount factor `gamma`.
    pub fn new(model: &'a M, gamma: DiscountFactor) -> Self {
        FiniteHorizonPolicyEvaluation { model, gamma }
    }
}

impl<M, P> PolicyEvaluation<P, FiniteHorizonTableVFunction<<M as Smdp>::State>>
    for FiniteHorizonPolicyEvaluation<'_, M>
where
    M: FiniteStateMdp,
    P: FiniteHorizonPolicy<<M as Smdp>::State, <M as Smdp>::Action>,
{
    fn eval(&self, policy: &P) -> Result<FiniteHorizonTableVFunction<<M as Smdp>::State>> {
        let horizon = policy.horizon();
        let mut vfunc = FiniteHorizonTableVFunction::new(horizon, 0.0)?;

        for timestep in (0..horizon).rev() {
            for state in self.model.states() {
                let action = policy.action_at(&state, timestep);
                let mut value = avg_r(self.model, &state, &action);
                if timestep + 1 < horizon {
                    value +=
                        avg_next_v_at(self.model, &state, &action, timestep, &vfunc, self.gamma);
                }
                vfunc.set(state, timestep, value)?;
            }
        }

        Ok(vfunc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::VecActionSet;
    use crate::model::{FiniteStateSmdp, Mdp};
    use crate::optimization::Optimization;
    use crate::policy::FiniteHorizonTablePolicy;

    /// Deterministic two-state ring: the only action moves to the other
    /// state; entering state 1 pays 1.
    struct Ring {
        action_set: VecActionSet<usize>,
    }

    impl Ring {
        fn new() -> Self {
            Ring {
                action_set: VecActionSet::indexed(1),
            }
        }
    }

    impl Mdp for Ring {
        type State = u32;
        type Action = usize;

        fn reward(&self, _state: &u32, _action: &usize, next_state: &u32) -> f64 {
            if *next_state == 1 { 1.0 } else { 0.0 }
        }

        fn transition_prob(&self, state: &u32, _action: &usize, next_state: &u32) -> f64 {
            if *next_state == 1 - *state { 1.0 } else { 0.0 }
        }

        fn objective(&self) -> Optimization {
            Optimization::Maximize
        }
    }

    impl FiniteStateSmdp for Ring {
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

    fn ring_policy(horizon: usize) -> FiniteHorizonTablePolicy<u32, usize> {
        let mut policy = FiniteHorizonTablePolicy::new(horizon).unwrap();
        for timestep in 0..horizon {
            policy.set(0u32, timestep, 0usize).unwrap();
            policy.set(1u32, timestep, 0usize).unwrap();
        }
        policy
    }

    #[test]
    fn test_backward_induction_undiscounted() {
        // Horizon 3 from state 0: rewards 1, 0, 1 => V = 2. From state 1:
        // rewards 0, 1, 0 => V = 1.
        let mdp = Ring::new();
        let gamma = DiscountFactor::new(1.0).unwrap();
        let pe = FiniteHorizonPolicyEvaluation::new(&mdp, gamma);
        let vfunc = pe.eval(&ring_policy(3)).unwrap();

        assert_eq!(vfunc.horizon(), 3);
        assert!((vfunc.get(&0, 0).unwrap() - 2.0).abs() < 1e-12);
        assert!((vfunc.get(&1, 0).unwrap() - 1.0).abs() < 1e-12);
        // The last timestep only collects the immediate reward.
        assert!((vfunc.get(&0, 2).unwrap() - 1.0).abs() < 1e-12);
        assert!(vfunc.get(&1, 2).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_backward_induction_discounted() {
        // Horizon 2 from state 0: 1 + γ·0; from state 1: 0 + γ·1.
        let mdp = Ring::new();
        let gamma = DiscountFactor::new(0.5).unwrap();
        let pe = FiniteHorizonPolicyEvaluation::new(&mdp, gamma);
        let vfunc = pe.eval(&ring_policy(2)).unwrap();

        assert!((vfunc.get(&0, 0).unwrap() - 1.0).abs() < 1e-12);
        assert!((vfunc.get(&1, 0).unwrap() - 0.5).abs() < 1e-12);
    }
}
