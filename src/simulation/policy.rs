//! Fixed baseline policies and policy evaluation.
//!
//! A policy sees the same observation an external decision-maker would,
//! plus read-only client and access point state, and returns one action
//! per step.

use serde::{Deserialize, Serialize};

use super::observation::Observation;
use super::stepper::SimulationStepper;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::metrics::EpisodeMetrics;
use crate::radio::base_signal;
use crate::random::{RandomSource, SeededSource};
use crate::types::{AccessPoint, Action, Client, ClientId};

/// Read-only state a policy decides on.
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    pub observation: &'a Observation,
    pub clients: &'a [Client],
    pub access_points: &'a [AccessPoint],
}

impl PolicyContext<'_> {
    /// The agent-controlled client.
    pub fn agent(&self) -> Option<&Client> {
        self.clients.get(ClientId::AGENT.index())
    }
}

/// Trait for handover decision policies.
pub trait HandoverPolicy: Send {
    /// Policy identifier
    fn id(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> String;

    /// Choose the agent's action for the next step
    fn decide(&mut self, context: &PolicyContext<'_>) -> Action;

    /// Restore the policy's initial state
    fn reset(&mut self) {}
}

// ============================================================================
// Random
// ============================================================================

/// Uniform over every access point and the no-handover sentinel.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    rng: SeededSource,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SeededSource::new(seed),
        }
    }
}

impl HandoverPolicy for RandomPolicy {
    fn id(&self) -> &str {
        "random"
    }

    fn description(&self) -> String {
        format!("Uniform random action (seed {})", self.rng.seed())
    }

    fn decide(&mut self, context: &PolicyContext<'_>) -> Action {
        let n = context.access_points.len();
        let index = self.rng.index(Action::space_size(n));
        Action::from_index(index, n).unwrap_or(Action::NoHandover)
    }

    fn reset(&mut self) {
        let seed = self.rng.seed();
        self.rng.reseed(seed);
    }
}

// ============================================================================
// Greedy signal
// ============================================================================

/// Base signal the greedy policy requires before handing over.
pub const DEFAULT_GREEDY_THRESHOLD: f64 = 20.0;

/// Hands the agent over to the access point with the strongest base signal.
#[derive(Debug, Clone)]
pub struct GreedySignalPolicy {
    threshold: f64,
}

impl GreedySignalPolicy {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for GreedySignalPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_GREEDY_THRESHOLD)
    }
}

impl HandoverPolicy for GreedySignalPolicy {
    fn id(&self) -> &str {
        "greedy_signal"
    }

    fn description(&self) -> String {
        format!("Strongest base signal above {:.1}", self.threshold)
    }

    fn decide(&mut self, context: &PolicyContext<'_>) -> Action {
        let Some(agent) = context.agent() else {
            return Action::NoHandover;
        };

        let mut best: Option<(&AccessPoint, f64)> = None;
        for ap in context.access_points {
            let signal = base_signal(
                agent.position().distance(ap.position()),
                ap.coverage_radius(),
            );
            if best.map_or(true, |(_, s)| signal > s) {
                best = Some((ap, signal));
            }
        }

        match best {
            Some((ap, signal)) if signal > self.threshold => Action::Handover(ap.id()),
            _ => Action::NoHandover,
        }
    }
}

// ============================================================================
// No handover
// ============================================================================

/// Never attempts a handover.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHandoverPolicy;

impl HandoverPolicy for NoHandoverPolicy {
    fn id(&self) -> &str {
        "no_handover"
    }

    fn description(&self) -> String {
        "Always the no-handover sentinel".into()
    }

    fn decide(&mut self, _context: &PolicyContext<'_>) -> Action {
        Action::NoHandover
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Averages of a policy over several episodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyReport {
    pub policy: String,
    pub episodes: usize,
    /// Mean total reward per episode.
    pub mean_reward: f64,
    /// Standard deviation of total reward per episode.
    pub std_reward: f64,
    /// Mean successful handovers per episode.
    pub mean_handovers: f64,
    /// Mean attempts per episode.
    pub mean_attempts: f64,
    /// Successes / attempts over all episodes.
    pub success_rate: f64,
    /// Mean per-episode connectivity ratio.
    pub connectivity_ratio: f64,
    /// Stochastic failures over all episodes.
    pub failures: u64,
}

impl PolicyReport {
    /// Aggregate episode metrics. `episodes` must be non-empty.
    pub fn from_episodes(policy: &str, episodes: &[EpisodeMetrics]) -> Self {
        let n = episodes.len().max(1) as f64;
        let mean_reward = episodes.iter().map(|e| e.total_reward).sum::<f64>() / n;
        let variance = episodes
            .iter()
            .map(|e| (e.total_reward - mean_reward).powi(2))
            .sum::<f64>()
            / n;
        let successes: u64 = episodes.iter().map(|e| e.successes).sum();
        let attempts: u64 = episodes.iter().map(|e| e.attempts).sum();

        Self {
            policy: policy.to_string(),
            episodes: episodes.len(),
            mean_reward,
            std_reward: variance.sqrt(),
            mean_handovers: successes as f64 / n,
            mean_attempts: attempts as f64 / n,
            success_rate: if attempts == 0 {
                0.0
            } else {
                successes as f64 / attempts as f64
            },
            connectivity_ratio: episodes.iter().map(EpisodeMetrics::connectivity_ratio).sum::<f64>() / n,
            failures: episodes.iter().map(|e| e.failures).sum(),
        }
    }
}

/// Run one episode to termination and return its metrics.
pub fn run_episode<R: RandomSource>(
    stepper: &mut SimulationStepper<R>,
    policy: &mut dyn HandoverPolicy,
) -> Result<EpisodeMetrics> {
    while !stepper.is_done() {
        let action = policy.decide(&stepper.policy_context());
        stepper.step(action)?;
    }
    Ok(stepper.metrics().clone())
}

/// Evaluate a policy over `episodes` episodes.
///
/// Episode `k` is seeded with `network.seed + k`, so every policy evaluated
/// with the same configuration faces the same initial placements.
pub fn evaluate_policy(
    config: &Config,
    policy: &mut dyn HandoverPolicy,
    episodes: usize,
) -> Result<PolicyReport> {
    if episodes == 0 {
        return Err(Error::InvalidConfig("episodes must be at least 1".into()));
    }

    let mut stepper = SimulationStepper::new(config.clone())?;
    policy.reset();

    let mut results = Vec::with_capacity(episodes);
    for episode in 0..episodes {
        stepper.reset_with_seed(config.network.seed.wrapping_add(episode as u64));
        let metrics = run_episode(&mut stepper, policy)?;
        tracing::debug!(
            policy = policy.id(),
            episode,
            summary = %metrics,
            "Episode evaluated"
        );
        results.push(metrics);
    }

    let report = PolicyReport::from_episodes(policy.id(), &results);
    tracing::info!(
        policy = %report.policy,
        episodes,
        mean_reward = report.mean_reward,
        success_rate = report.success_rate,
        connectivity = report.connectivity_ratio,
        "Policy evaluated"
    );
    Ok(report)
}

/// Evaluate several policies on identical episodes; reports keep input order.
pub fn compare_policies(
    config: &Config,
    policies: &mut [Box<dyn HandoverPolicy>],
    episodes: usize,
) -> Result<Vec<PolicyReport>> {
    policies
        .iter_mut()
        .map(|policy| evaluate_policy(config, policy.as_mut(), episodes))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccessPointId, Vec2};

    fn config() -> Config {
        let mut config = Config::default();
        config.network.num_clients = 5;
        config.network.num_access_points = 4;
        config.network.max_steps = 20;
        config
    }

    #[test]
    fn test_no_handover_policy() {
        let report = evaluate_policy(&config(), &mut NoHandoverPolicy, 2).unwrap();
        assert_eq!(report.episodes, 2);
        assert_eq!(report.mean_attempts, 0.0);
        assert_eq!(report.mean_reward, 0.0);
        assert_eq!(report.success_rate, 0.0);
    }

    #[test]
    fn test_random_policy_is_reproducible() {
        let a = evaluate_policy(&config(), &mut RandomPolicy::new(3), 2).unwrap();
        let b = evaluate_policy(&config(), &mut RandomPolicy::new(3), 2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_policy_actions_in_range() {
        let stepper = SimulationStepper::new(config()).unwrap();
        let mut policy = RandomPolicy::new(9);
        for _ in 0..200 {
            match policy.decide(&stepper.policy_context()) {
                Action::Handover(id) => assert!(id.index() < 4),
                Action::NoHandover => {}
            }
        }
    }

    #[test]
    fn test_greedy_picks_nearest_access_point() {
        let mut stepper = SimulationStepper::new(config()).unwrap();
        let target = stepper.access_points()[2].position();
        stepper
            .place_client(ClientId::AGENT, target + Vec2::new(10.0, 0.0), Vec2::ZERO)
            .unwrap();

        let action = GreedySignalPolicy::default().decide(&stepper.policy_context());
        assert_eq!(action, Action::Handover(AccessPointId(2)));
    }

    #[test]
    fn test_greedy_below_threshold_is_no_op() {
        let mut config = config();
        config.network.access_points = Some(vec![crate::config::AccessPointSpec {
            x: 0.0,
            y: 0.0,
            capacity: None,
            coverage_radius: None,
        }]);
        let mut stepper = SimulationStepper::new(config).unwrap();
        // base signal 100 * (1 - 240/250) = 4
        stepper
            .place_client(ClientId::AGENT, Vec2::new(240.0, 0.0), Vec2::ZERO)
            .unwrap();

        let action = GreedySignalPolicy::default().decide(&stepper.policy_context());
        assert_eq!(action, Action::NoHandover);
    }

    #[test]
    fn test_compare_keeps_order() {
        let mut policies: Vec<Box<dyn HandoverPolicy>> = vec![
            Box::new(NoHandoverPolicy),
            Box::new(GreedySignalPolicy::default()),
            Box::new(RandomPolicy::new(1)),
        ];
        let reports = compare_policies(&config(), &mut policies, 1).unwrap();
        let ids: Vec<_> = reports.iter().map(|r| r.policy.as_str()).collect();
        assert_eq!(ids, ["no_handover", "greedy_signal", "random"]);
    }

    #[test]
    fn test_zero_episodes_rejected() {
        let err = evaluate_policy(&config(), &mut NoHandoverPolicy, 0).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_report_aggregation() {
        let episodes = vec![
            EpisodeMetrics {
                total_reward: 10.0,
                attempts: 4,
                successes: 2,
                ..EpisodeMetrics::default()
            },
            EpisodeMetrics {
                total_reward: 20.0,
                attempts: 6,
                successes: 3,
                ..EpisodeMetrics::default()
            },
        ];
        let report = PolicyReport::from_episodes("x", &episodes);
        assert_eq!(report.mean_reward, 15.0);
        assert_eq!(report.std_reward, 5.0);
        assert_eq!(report.mean_handovers, 2.5);
        assert_eq!(report.success_rate, 0.5);
    }
}
