//! Whole-run tests for the simulation stepper.
//!
//! Tests for:
//! - Bit-identical replay from a fixed seed and action sequence
//! - Inspection calls that leave the run's random stream untouched
//! - Occupancy bounds after every step
//! - Input validation at the action boundary
//! - Episode lifecycle

use rsu_handover::config::{Config, ImpairmentConfig};
use rsu_handover::handover::AttemptOutcome;
use rsu_handover::prelude::*;
use rsu_handover::simulation::{evaluate_policy, StepOutcome};

fn config(max_steps: u64) -> Config {
    let mut config = Config::default();
    config.network.max_steps = max_steps;
    config
}

fn action_sequence(len: usize, space: usize) -> Vec<usize> {
    (0..len).map(|i| (i * 7 + 3) % space).collect()
}

fn run(seed: u64, actions: &[usize]) -> Vec<StepOutcome> {
    let mut config = config(actions.len() as u64);
    config.network.seed = seed;
    let mut stepper = SimulationStepper::new(config).unwrap();
    actions
        .iter()
        .map(|&a| stepper.step_index(a).unwrap())
        .collect()
}

fn bits(outcomes: &[StepOutcome]) -> Vec<(Vec<u64>, u64)> {
    outcomes
        .iter()
        .map(|o| {
            (
                o.observation.as_slice().iter().map(|v| v.to_bits()).collect(),
                o.reward.to_bits(),
            )
        })
        .collect()
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_same_seed_same_actions_is_bit_identical() {
    let actions = action_sequence(60, 10);
    let first = run(42, &actions);
    let second = run(42, &actions);

    assert_eq!(bits(&first), bits(&second), "Replays must be bit-identical");
    assert_eq!(first, second);
}

#[test]
fn test_different_seed_diverges() {
    let actions = action_sequence(10, 10);
    let first = run(1, &actions);
    let second = run(2, &actions);
    assert_ne!(bits(&first), bits(&second));
}

#[test]
fn test_reset_with_seed_replays_episode() {
    let actions = action_sequence(25, 10);
    let mut stepper = SimulationStepper::new(config(25)).unwrap();

    let initial_a = stepper.reset_with_seed(9);
    let a: Vec<_> = actions.iter().map(|&i| stepper.step_index(i).unwrap()).collect();

    let initial_b = stepper.reset_with_seed(9);
    let b: Vec<_> = actions.iter().map(|&i| stepper.step_index(i).unwrap()).collect();

    assert_eq!(initial_a, initial_b);
    assert_eq!(bits(&a), bits(&b));
}

#[test]
fn test_policy_evaluation_is_reproducible() {
    let config = config(30);
    let a = evaluate_policy(&config, &mut GreedySignalPolicy::default(), 3).unwrap();
    let b = evaluate_policy(&config, &mut GreedySignalPolicy::default(), 3).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_scoring_between_steps_does_not_change_the_run() {
    let actions = action_sequence(40, 10);
    let mut plain = SimulationStepper::new(config(40)).unwrap();
    let mut inspected = SimulationStepper::new(config(40)).unwrap();
    let mut scratch = SeededSource::new(1234);

    let mut a = Vec::new();
    let mut b = Vec::new();
    for &action in &actions {
        for ap in 0..inspected.access_points().len() {
            inspected
                .evaluate_pair(ClientId::AGENT, AccessPointId(ap), &mut scratch)
                .unwrap();
        }
        inspected
            .evaluate_pair(ClientId(3), AccessPointId(0), &mut scratch)
            .unwrap();

        a.push(plain.step_index(action).unwrap());
        b.push(inspected.step_index(action).unwrap());
    }

    assert_eq!(bits(&a), bits(&b), "Scoring a pair must not advance the run");
    assert_eq!(plain.metrics(), inspected.metrics());
}

#[test]
fn test_evaluate_pair_replays_from_caller_seed() {
    let mut stepper = SimulationStepper::new(config(10)).unwrap();
    stepper.step_index(0).unwrap();
    let before = stepper.observation().clone();

    let first = stepper
        .evaluate_pair(ClientId(2), AccessPointId(4), &mut SeededSource::new(7))
        .unwrap();
    let second = stepper
        .evaluate_pair(ClientId(2), AccessPointId(4), &mut SeededSource::new(7))
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(stepper.observation(), &before);
}

#[test]
fn test_placing_a_client_does_not_draw() {
    let actions = action_sequence(20, 10);
    let mut plain = SimulationStepper::new(config(20)).unwrap();
    let mut placed = SimulationStepper::new(config(20)).unwrap();

    // Same kinematics as before, so only the random stream could differ
    let agent = placed.client(ClientId::AGENT).unwrap().clone();
    placed
        .place_client(ClientId::AGENT, agent.position(), agent.velocity())
        .unwrap();
    assert_eq!(placed.observation(), plain.observation());

    let a: Vec<_> = actions.iter().map(|&i| plain.step_index(i).unwrap()).collect();
    let b: Vec<_> = actions.iter().map(|&i| placed.step_index(i).unwrap()).collect();
    assert_eq!(bits(&a), bits(&b));
}

// ============================================================================
// Occupancy invariant
// ============================================================================

#[test]
fn test_occupancy_within_capacity_every_step() {
    let mut config = config(150);
    config.network.num_clients = 40;
    config.network.access_point_capacity = 3;
    let mut stepper = SimulationStepper::new(config).unwrap();

    for action in action_sequence(150, stepper.action_space_size()) {
        let outcome = stepper.step_index(action).unwrap();
        for ap in stepper.access_points() {
            assert!(
                ap.occupancy() <= ap.capacity(),
                "{ap} exceeds capacity at step {}",
                outcome.info.step
            );
        }

        let attached: usize = stepper
            .access_points()
            .iter()
            .map(|ap| ap.occupancy() as usize)
            .sum();
        assert_eq!(attached, outcome.info.connected_clients);
    }
}

#[test]
fn test_rewards_follow_outcomes() {
    let mut stepper = SimulationStepper::new(config(200)).unwrap();
    for action in action_sequence(200, stepper.action_space_size()) {
        let outcome = stepper.step_index(action).unwrap();
        match outcome.info.attempt.map(|a| a.outcome) {
            None => assert_eq!(outcome.reward, 0.0),
            Some(AttemptOutcome::Accepted { .. }) => assert!(outcome.reward > 0.0),
            Some(AttemptOutcome::Rejected(_)) => assert_eq!(outcome.reward, -1.0),
            Some(AttemptOutcome::Failed) => assert_eq!(outcome.reward, -2.0),
        }
    }

    let metrics = stepper.metrics();
    assert_eq!(metrics.steps, 200);
    assert_eq!(
        metrics.attempts,
        metrics.successes + metrics.rejected + metrics.failures
    );
}

// ============================================================================
// Action validation and lifecycle
// ============================================================================

#[test]
fn test_out_of_range_action_is_an_error() {
    let mut stepper = SimulationStepper::new(config(10)).unwrap();
    let before = stepper.observation().clone();

    let err = stepper.step_index(10).expect_err("Index past the sentinel must fail");
    assert!(err.is_invalid_input());
    assert!(matches!(
        err,
        Error::InvalidAction {
            action: 10,
            num_access_points: 9
        }
    ));

    assert_eq!(stepper.observation(), &before, "Rejected input must not step");
    assert_eq!(stepper.step_count(), 0);
    assert!(stepper.step_index(9).is_ok(), "Index 9 is the no-op sentinel");
}

#[test]
fn test_stepping_after_termination_fails() {
    let mut stepper = SimulationStepper::new(config(3)).unwrap();
    for _ in 0..3 {
        stepper.step(Action::NoHandover).unwrap();
    }
    assert!(stepper.is_done());
    assert!(matches!(
        stepper.step(Action::NoHandover),
        Err(Error::EpisodeFinished { steps: 3 })
    ));

    stepper.reset();
    assert!(!stepper.is_done());
    assert!(stepper.step(Action::NoHandover).is_ok());
}

#[test]
fn test_no_impairment_agent_colocated_handover() {
    let mut config = config(5);
    config.impairment = ImpairmentConfig {
        failure_rate: 0.0,
        ..ImpairmentConfig::unimpaired()
    };
    let mut stepper = SimulationStepper::new(config).unwrap();
    let target = stepper.access_points()[4].position();
    stepper
        .place_client(ClientId::AGENT, target, Vec2::ZERO)
        .unwrap();

    let outcome = stepper.step(Action::Handover(AccessPointId(4))).unwrap();
    assert!(outcome.info.attempt.unwrap().is_accepted());

    // Signal 100 weighted 0.4 plus the load term on a near-empty access point
    let evaluation = stepper
        .evaluate_pair(ClientId::AGENT, AccessPointId(4), &mut SeededSource::new(0))
        .unwrap();
    assert_eq!(evaluation.signal.base, 100.0);
    assert_eq!(evaluation.breakdown.signal_term, 40.0);
    assert!(evaluation.penalty.connection > 0.0);
}
