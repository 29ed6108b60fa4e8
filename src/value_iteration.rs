//! Value iteration - repeated Bellman-optimality backups.

use crate::discount::DiscountFactor;
use crate::model::{FiniteStateSmdp, avg_next_v, avg_r};
use crate::tables::{TableQFunction, TableVFunction};
use crate::value::DiscountedVFunction;

/// Computes the optimal action-value function by sweeping
/// Bellman-optimality backups.
///
/// Each sweep rewrites V(s) to the best one-step lookahead value over the
/// admissible actions, in place and in the model's state enumeration order.
/// Sweeping stops after `max_iterations` sweeps or once the largest absolute
/// change in a sweep drops below the convergence threshold θ. The final V is
/// expanded into a Q-function so callers can extract both the optimal value
/// and the optimal (greedy) policy.
pub struct ValueIteration<'a, M> {
    model: &'a M,
    gamma: DiscountFactor,
    max_iterations: usize,
    theta: f64,
}

impl<'a, M> ValueIteration<'a, M>
where
    M: FiniteStateSmdp,
{
    /// Create a solver over `model` with discount factor `gamma`, a cap of
    /// `max_iterations` sweeps and convergence threshold
    /// `convergence_threshold`.
    pub fn new(
        model: &'a M,
        gamma: DiscountFactor,
        max_iterations: usize,
        convergence_threshold: f64,
    ) -> Self {
        ValueIteration {
            model,
            gamma,
            max_iterations,
            theta: convergence_threshold,
        }
    }

    /// Run value iteration to completion and return the resulting
    /// Q-function. Its greedy projection is the computed optimal policy.
    pub fn run(&self) -> TableQFunction<M::State, M::Action, M::Actions> {
        let mut vfunc = TableVFunction::new(0.0);
        let states = self.model.states();

        for _ in 0..self.max_iterations {
            let mut delta: f64 = 0.0;
            for state in &states {
                let old_v = vfunc.value(state);
                let new_v = self.backup(state, &vfunc);
                vfunc.set(state.clone(), new_v);
                delta = delta.max((old_v - new_v).abs());
            }

            if delta < self.theta {
                break;
            }
        }

        self.to_q(&vfunc)
    }

    /// The Bellman-optimality backup: the best one-step lookahead value at
    /// `state` under the model's objective.
    ///
    /// # Panics
    ///
    /// Panics if no action is admissible at `state`.
    pub fn backup<V>(&self, state: &M::State, vfunc: &V) -> f64
    where
        V: DiscountedVFunction<M::State>,
    {
        let mut best: Option<f64> = None;
        for action in self.model.actions(state) {
            let value = self.q_backup(state, &action, vfunc);
            let better = match best {
                None => true,
                Some(best_value) => self.model.op_type().first_is_better(value, best_value),
            };
            if better {
                best = Some(value);
            }
        }
        best.unwrap_or_else(|| panic!("no admissible actions to back up over"))
    }

    /// The one-step lookahead value of (`state`, `action`) against `vfunc`.
    pub fn q_backup<V>(&self, state: &M::State, action: &M::Action, vfunc: &V) -> f64
    where
        V: DiscountedVFunction<M::State>,
    {
        avg_r(self.model, state, action) + avg_next_v(self.model, state, action, vfunc, self.gamma)
    }

    /// Expand a value function into the Q-function of its one-step
    /// lookahead.
    pub fn to_q<V>(&self, vfunc: &V) -> TableQFunction<M::State, M::Action, M::Actions>
    where
        V: DiscountedVFunction<M::State>,
    {
        let mut qfunc =
            TableQFunction::new(self.model.action_set().clone(), 0.0, self.model.op_type());
        for state in self.model.states() {
            for action in self.model.actions(&state) {
                let qval = self.q_backup(&state, &action, vfunc);
                qfunc.set(state.clone(), action, qval);
            }
        }
        qfunc
    }
}
