//! Exact policy evaluation by solving the Bellman linear system.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};

use crate::discount::DiscountFactor;
use crate::error::{Error, Result};
use crate::evaluation::PolicyEvaluation;
use crate::model::{FiniteStateSmdp, avg_r};
use crate::policy::StationaryPolicy;
use crate::tables::TableVFunction;

/// Singular values below this threshold are treated as zero by the
/// least-squares solve.
const SVD_EPSILON: f64 = 1e-10;

/// Evaluates a stationary policy exactly by solving (I − Γ)·V = R, where
/// Γ[i][j] is the action-probability-weighted, duration-discounted transition
/// probability from the i-th to the j-th state and R[i] is the expected
/// immediate reinforcement at the i-th state.
///
/// The system is solved by singular value decomposition, so an
/// ill-conditioned or outright singular (I − Γ) (an absorbing chain with
/// γ = 1, for instance) yields the least-squares solution instead of
/// failing. Only applicable when the state count is small enough for dense
/// linear algebra.
pub struct ExactPolicyEvaluation<'a, M> {
    model: &'a M,
    gamma: DiscountFactor,
}

impl<'a, M> ExactPolicyEvaluation<'a, M>
where
    M: FiniteStateSmdp,
{
    /// Create an evaluator over `model` with discount factor `gamma`.
    pub fn new(model: &'a M, gamma: DiscountFactor) -> Self {
        ExactPolicyEvaluation { model, gamma }
    }

    fn gamma_p_pi<P>(&self, policy: &P, states: &[M::State], i: usize, j: usize) -> f64
    where
        P: StationaryPolicy<M::State, M::Action>,
    {
        let state = &states[i];
        let terminal_state = &states[j];

        if policy.is_deterministic() {
            let action = policy.action(state);
            self.gamma_p_sa(state, &action, terminal_state)
        } else {
            let mut pavg = 0.0;
            for action in self.model.actions(state) {
                pavg += policy.aprob(state, &action)
                    * self.gamma_p_sa(state, &action, terminal_state);
            }
            pavg
        }
    }

    fn gamma_p_sa(&self, state: &M::State, action: &M::Action, terminal_state: &M::State) -> f64 {
        let mut gprob = 0.0;
        for duration in self.model.durations(state, action, terminal_state) {
            gprob += self
                .model
                .dtprob(state, action, terminal_state, duration, self.gamma);
        }
        gprob
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
}

impl<M, P> PolicyEvaluation<P, TableVFunction<M::State>> for ExactPolicyEvaluation<'_, M>
where
    M: FiniteStateSmdp,
    P: StationaryPolicy<M::State, M::Action>,
{
    fn eval(&self, policy: &P) -> Result<TableVFunction<M::State>> {
        let states = self.model.states();
        let n = states.len();

        let gpp = DMatrix::from_fn(n, n, |i, j| self.gamma_p_pi(policy, &states, i, j));
        let a = DMatrix::<f64>::identity(n, n) - gpp;
        let b = DVector::from_fn(n, |i, _| self.r_pi(policy, &states[i]));

        let svd = a.svd(true, true);
        let solution = svd
            .solve(&b, SVD_EPSILON)
            .map_err(|message| Error::SingularSystem {
                message: message.to_string(),
            })?;

        let mut values = HashMap::with_capacity(n);
        for (i, state) in states.into_iter().enumerate() {
            values.insert(state, solution[i]);
        }

        Ok(TableVFunction::from_map(values, 0.0))
    }
}
