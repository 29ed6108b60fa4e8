//! Iterative (sweep-based) policy evaluation.

use crate::discount::DiscountFactor;
use crate::error::Result;
use crate::evaluation::PolicyEvaluation;
use crate::model::{FiniteStateSmdp, avg_next_v, avg_r};
use crate::policy::StationaryPolicy;
use crate::tables::TableVFunction;
use crate::value::DiscountedVFunction;

/// Evaluates a stationary policy by repeated duration-discounted backups.
///
/// Each sweep visits the model's states in their enumeration order and
/// rewrites V(s) in place, so later states in the same sweep observe the
/// updated values of earlier ones (asynchronous Gauss-Seidel backups rather
/// than a synchronized Jacobi update). Sweeping stops after `max_iterations`
/// sweeps or as soon as the largest absolute change in a sweep drops below
/// the convergence threshold θ.
pub struct IterativePolicyEvaluation<'a, M> {
    model: &'a M,
    gamma: DiscountFactor,
    max_iterations: usize,
    theta: f64,
}

impl<'a, M> IterativePolicyEvaluation<'a, M>
where
    M: FiniteStateSmdp,
{
    /// Create an evaluator over `model` with discount factor `gamma`, a cap
    /// of `max_iterations` sweeps and convergence threshold
    /// `convergence_threshold`.
    pub fn new(
        model: &'a M,
        gamma: DiscountFactor,
        max_iterations: usize,
        convergence_threshold: f64,
    ) -> Self {
        IterativePolicyEvaluation {
            model,
            gamma,
            max_iterations,
            theta: convergence_threshold,
        }
    }

    fn backup<P>(&self, policy: &P, state: &M::State, vfunc: &TableVFunction<M::State>) -> f64
    where
        P: StationaryPolicy<M::State, M::Action>,
    {
        self.r_pi(policy, state) + self.avg_next_v_pi(policy, state, vfunc)
    }

    fn r_pi<P>(&self, policy: &P, state: &M::State) -> f64
    where
        P: StationaryPolicy<M::State, M::Action>,
    {
        if policy.is_deterministic() {
            let action = policy.action(state);
            avg_r(self.model, state, &action)
        } else {
            let mut ravg = 0.0;
            for action in self.model.actions(state) {
                ravg += policy.aprob(state, &action) * avg_r(self.model, state, &action);
            }
            ravg
        }
    }

    fn avg_next_v_pi<P>(
        &self,
        policy: &P,
        state: &M::State,
        vfunc: &TableVFunction<M::State>,
    ) -> f64
    where
        P: StationaryPolicy<M::State, M::Action>,
    {
        if policy.is_deterministic() {
            let action = policy.action(state);
            avg_next_v(self.model, state, &action, vfunc, self.gamma)
        } else {
            let mut avg = 0.0;
            for action in self.model.actions(state) {
                avg += policy.aprob(state, &action)
                    * avg_next_v(self.model, state, &action, vfunc, self.gamma);
            }
            avg
        }
    }
}

impl<M, P> PolicyEvaluation<P, TableVFunction<M::State>> for IterativePolicyEvaluation<'_, M>
where
    M: FiniteStateSmdp,
    P: StationaryPolicy<M::State, M::Action>,
{
    fn eval(&self, policy: &P) -> Result<TableVFunction<M::State>> {
        let mut vfunc = TableVFunction::new(0.0);
        let states = self.model.states();

        for _ in 0..self.max_iterations {
            let mut delta: f64 = 0.0;
            for state in &states {
                let old_v = vfunc.value(state);
                let new_v = self.backup(policy, state, &vfunc);
                vfunc.set(state.clone(), new_v);
                delta = delta.max((old_v - new_v).abs());
            }

            if delta < self.theta {
                break;
            }
        }

        Ok(vfunc)
    }
}
