//! The estimator's output is itself a finite-state model: feeding its
//! estimates through value iteration and policy iteration recovers the
//! optimal policy of the sampled process, and optimistic gating steers the
//! greedy policy toward unexplored actions.

use smdp::{
    DiscountFactor, DiscountedPolicyIteration, DiscountedQFunction, Optimization, RewardBounds,
    SmdpEstimator, StationaryPolicy, ValueIteration, VecActionSet,
};

const DUMMY: u32 = u32::MAX;
const STAY: usize = 0;
const ADVANCE: usize = 1;

fn estimator(m: u64, optimistic: bool) -> SmdpEstimator<u32, usize, VecActionSet<usize>> {
    SmdpEstimator::new(
        DUMMY,
        VecActionSet::indexed(2),
        m,
        optimistic,
        RewardBounds::new(0.0, 1.0).unwrap(),
        Optimization::Maximize,
    )
    .unwrap()
}

/// Deterministic three-state line: `ADVANCE` moves right and pays 1 on
/// entering state 2, `STAY` loops in place for nothing. State 2 is
/// absorbing.
fn feed_line(est: &mut SmdpEstimator<u32, usize, VecActionSet<usize>>, samples: u64) {
    for state in 0u32..3 {
        for action in [STAY, ADVANCE] {
            let next = match (state, action) {
                (2, _) => 2,
                (s, STAY) => s,
                (s, _) => s + 1,
            };
            let reward = if next == 2 && state != 2 { 1.0 } else { 0.0 };
            for _ in 0..samples {
                est.update(state, action, next, reward, 1).unwrap();
            }
        }
    }
}

#[test]
fn test_value_iteration_on_learned_model() {
    let mut est = estimator(2, true);
    feed_line(&mut est, 2);

    let gamma = DiscountFactor::new(0.9).unwrap();
    let vi = ValueIteration::new(&est, gamma, 200, 1e-9);
    let qfunc = vi.run();

    assert_eq!(qfunc.greedy_action(&0), ADVANCE);
    assert_eq!(qfunc.greedy_action(&1), ADVANCE);

    // V*(1) = 1 in the true process; the learned model is exact here.
    assert!((qfunc.greedy_value(&1) - 1.0).abs() < 1e-6);
}

#[test]
fn test_policy_iteration_on_learned_model() {
    let mut est = estimator(2, true);
    feed_line(&mut est, 2);

    let gamma = DiscountFactor::new(0.9).unwrap();
    let mut pi = DiscountedPolicyIteration::new(&est, gamma, None).with_seed(5);
    let policy = pi.run().unwrap();

    assert_eq!(policy.action(&0), ADVANCE);
    assert_eq!(policy.action(&1), ADVANCE);
}

#[test]
fn test_optimism_steers_toward_unexplored_actions() {
    // Only STAY at state 0 is ever sampled; it pays nothing. The unknown
    // ADVANCE is modeled as a one-step hop to the dummy state at rmax, so
    // the greedy policy prefers exploring it.
    let mut est = estimator(2, true);
    for _ in 0..2 {
        est.update(0, STAY, 0, 0.0, 1).unwrap();
    }

    let gamma = DiscountFactor::new(0.9).unwrap();
    let vi = ValueIteration::new(&est, gamma, 100, 1e-9);
    let qfunc = vi.run();

    assert_eq!(qfunc.greedy_action(&0), ADVANCE);
    // Q(0, ADVANCE) = rmax + gamma * V(dummy) = 1: the dummy state is
    // absorbing with default value 0. STAY only collects the discounted
    // optimistic value, Q(0, STAY) = gamma * V(0) = 0.9.
    assert!((qfunc.value(&0, &ADVANCE) - 1.0).abs() < 1e-9);
    assert!((qfunc.value(&0, &STAY) - 0.9).abs() < 1e-6);
}

#[test]
fn test_pessimism_avoids_unexplored_actions() {
    // Same evidence, pessimistic gate: STAY pays 0.5 per step, the unknown
    // ADVANCE is worth rmin = 0, so the greedy policy keeps staying.
    let mut est = estimator(2, false);
    for _ in 0..2 {
        est.update(0, STAY, 0, 0.5, 1).unwrap();
    }

    let gamma = DiscountFactor::new(0.9).unwrap();
    let vi = ValueIteration::new(&est, gamma, 200, 1e-9);
    let qfunc = vi.run();

    assert_eq!(qfunc.greedy_action(&0), STAY);
}
