//! Discrete-time simulation driver.
//!
//! One call to [`SimulationStepper::step`] runs a complete step:
//!
//! 1. advance every client by its velocity with boundary handling
//! 2. release every connection (cooldown timestamps persist)
//! 3. apply the agent's action to client 0 through the state machine
//! 4. auto-connect every other client to its best reachable access point
//! 5. recompute observable signal and dwell time
//! 6. flag termination once the step count reaches the configured maximum
//!
//! All randomness of a run comes from the single source owned by the
//! stepper. Inspection calls sample from a source supplied by the caller.

use serde::{Deserialize, Serialize};

use super::observation::{ClientReading, Observation, ObservationLayout};
use super::policy::PolicyContext;
use crate::config::{Config, ImpairmentConfig, NetworkConfig};
use crate::error::{Error, Result};
use crate::handover::{
    ConnectionStateMachine, HandoverAttempt, HandoverScorer, PenaltyAggregator, PenaltyBreakdown,
    PenaltyInputs, ScoreBreakdown, ScoreInputs, TransitionStats,
};
use crate::metrics::EpisodeMetrics;
use crate::mobility::{advance, grid_layout, spawn_clients, DwellPrediction, DwellTimePredictor};
use crate::radio::{LoadAssessment, LoadModel, SignalModel, SignalReport};
use crate::random::{RandomSource, SeededSource};
use crate::types::{AccessPoint, AccessPointId, Action, Client, ClientId, ConnectionState, Vec2};

/// Everything computed for one (client, access point) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairEvaluation {
    pub client: ClientId,
    pub access_point: AccessPointId,
    pub signal: SignalReport,
    pub load: LoadAssessment,
    pub dwell: DwellPrediction,
    pub penalty: PenaltyBreakdown,
    pub breakdown: ScoreBreakdown,
}

impl PairEvaluation {
    pub fn score(&self) -> f64 {
        self.breakdown.score
    }
}

/// Per-step counters returned alongside the reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    /// 1-based index of the step just completed.
    pub step: u64,
    /// Simulation time after the step (seconds).
    pub time: f64,
    /// The agent's attempt; `None` for a no-handover action.
    pub attempt: Option<HandoverAttempt>,
    /// Non-agent clients attached during auto-connection.
    pub auto_connections: u64,
    /// Clients connected at the end of the step.
    pub connected_clients: usize,
    pub total_clients: usize,
    /// Dwell predictions with a significant error during the step.
    pub significant_prediction_errors: u64,
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub observation: Observation,
    pub reward: f64,
    pub done: bool,
    pub info: StepInfo,
}

/// The read-only models, borrowed from one impairment configuration.
struct Models<'a> {
    signal: SignalModel<'a>,
    load: LoadModel<'a>,
    dwell: DwellTimePredictor<'a>,
    penalty: PenaltyAggregator<'a>,
    scorer: HandoverScorer,
}

impl<'a> Models<'a> {
    fn new(config: &'a ImpairmentConfig) -> Self {
        Self {
            signal: SignalModel::new(config),
            load: LoadModel::new(config),
            dwell: DwellTimePredictor::new(config),
            penalty: PenaltyAggregator::new(config),
            scorer: HandoverScorer::new(config.weights),
        }
    }

    /// Draw order: fading, shadowing, then the dwell error when one is drawn.
    fn evaluate<R: RandomSource + ?Sized>(
        &self,
        client: &Client,
        connected: bool,
        access_point: &AccessPoint,
        others: &[Vec2],
        now: f64,
        rng: &mut R,
    ) -> PairEvaluation {
        let signal = self.signal.measure(client.position(), access_point, others, rng);
        let load = self.load.assess_access_point(access_point);
        let dwell = self
            .dwell
            .predict(client.position(), client.velocity(), access_point, rng);
        let penalty = self.penalty.aggregate(&PenaltyInputs {
            connected,
            load,
            elapsed_since_handover: client.elapsed_since_handover(now),
        });
        let breakdown = self.scorer.breakdown(&ScoreInputs {
            signal: signal.signal,
            load_factor: load.load_factor,
            dwell_time: dwell.dwell_time,
            penalty: penalty.total(),
        });

        tracing::trace!(
            client = %client.id(),
            access_point = %access_point.id(),
            signal = signal.signal,
            load_factor = load.load_factor,
            dwell = dwell.dwell_time,
            penalty = penalty.total(),
            score = breakdown.score,
            "Scored pair"
        );

        PairEvaluation {
            client: client.id(),
            access_point: access_point.id(),
            signal,
            load,
            dwell,
            penalty,
            breakdown,
        }
    }
}

fn positions_except(positions: &[Vec2], index: usize) -> Vec<Vec2> {
    positions
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, p)| *p)
        .collect()
}

/// Explicit layout if configured, otherwise the default grid.
fn build_access_points(network: &NetworkConfig) -> Result<Vec<AccessPoint>> {
    match &network.access_points {
        Some(specs) => specs
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                AccessPoint::new(
                    AccessPointId(i),
                    spec.position(),
                    spec.capacity.unwrap_or(network.access_point_capacity),
                    spec.coverage_radius.unwrap_or(network.coverage_radius),
                )
            })
            .collect(),
        None => grid_layout(network.num_access_points, network.area_size)
            .into_iter()
            .enumerate()
            .map(|(i, position)| {
                AccessPoint::new(
                    AccessPointId(i),
                    position,
                    network.access_point_capacity,
                    network.coverage_radius,
                )
            })
            .collect(),
    }
}

/// Owns the client and access point state of one run.
#[derive(Debug)]
pub struct SimulationStepper<R: RandomSource = SeededSource> {
    config: Config,
    rng: R,
    clients: Vec<Client>,
    access_points: Vec<AccessPoint>,
    state_machine: ConnectionStateMachine,
    layout: ObservationLayout,
    readings: Vec<ClientReading>,
    agent_signals: Vec<f64>,
    observation: Observation,
    metrics: EpisodeMetrics,
    time: f64,
    step_count: u64,
    done: bool,
}

impl SimulationStepper<SeededSource> {
    /// Validate `config` and start an episode seeded with `network.seed`.
    pub fn new(config: Config) -> Result<Self> {
        let rng = SeededSource::new(config.network.seed);
        Self::with_source(config, rng)
    }

    /// Reseed the source, then reset.
    pub fn reset_with_seed(&mut self, seed: u64) -> Observation {
        self.rng.reseed(seed);
        self.reset()
    }
}

impl<R: RandomSource> SimulationStepper<R> {
    /// Validate `config` and start an episode drawing from `rng`.
    pub fn with_source(config: Config, rng: R) -> Result<Self> {
        config.validate()?;

        let access_points = build_access_points(&config.network)?;
        let layout = ObservationLayout::new(config.network.num_clients, access_points.len());
        let state_machine = ConnectionStateMachine::from_config(&config.impairment);

        let mut stepper = Self {
            observation: layout.build(&[], &[], &[], &[]),
            config,
            rng,
            clients: Vec::new(),
            access_points,
            state_machine,
            layout,
            readings: Vec::new(),
            agent_signals: Vec::new(),
            metrics: EpisodeMetrics::new(),
            time: 0.0,
            step_count: 0,
            done: false,
        };
        stepper.reset();
        Ok(stepper)
    }

    /// Start a new episode.
    ///
    /// Respawns clients from the random source (continuing its stream),
    /// empties every access point and clears the episode statistics.
    pub fn reset(&mut self) -> Observation {
        let network = &self.config.network;
        self.clients = spawn_clients(
            network.num_clients,
            network.area_size,
            network.max_speed,
            &mut self.rng,
        );
        for ap in &mut self.access_points {
            ap.clear();
        }
        self.state_machine.reset_stats();
        self.metrics = EpisodeMetrics::new();
        self.time = 0.0;
        self.step_count = 0;
        self.done = false;

        self.refresh_observation();

        tracing::info!(
            clients = self.clients.len(),
            access_points = self.access_points.len(),
            max_steps = self.config.network.max_steps,
            "Episode reset"
        );

        self.observation.clone()
    }

    /// Run one step with the action given as an index in `0..=num_access_points`.
    pub fn step_index(&mut self, index: usize) -> Result<StepOutcome> {
        let action = Action::from_index(index, self.access_points.len())?;
        self.step(action)
    }

    /// Run one complete step.
    ///
    /// Fails with [`Error::InvalidAction`] for a target outside the access
    /// point set and [`Error::EpisodeFinished`] after termination; neither
    /// changes any state.
    pub fn step(&mut self, action: Action) -> Result<StepOutcome> {
        if self.done {
            return Err(Error::EpisodeFinished {
                steps: self.step_count,
            });
        }
        if let Action::Handover(target) = action {
            if target.index() >= self.access_points.len() {
                return Err(Error::InvalidAction {
                    action: target.index(),
                    num_access_points: self.access_points.len(),
                });
            }
        }

        let network = &self.config.network;
        let models = Models::new(&self.config.impairment);

        // 1. Movement
        for client in &mut self.clients {
            let (position, velocity) = advance(
                client.position(),
                client.velocity(),
                network.step_seconds,
                network.area_size,
                network.boundary,
            );
            client.set_kinematics(position, velocity);
        }
        self.time += network.step_seconds;
        self.step_count += 1;
        let now = self.time;

        // 2. Full connection reset
        let mut previous = Vec::with_capacity(self.clients.len());
        for client in &mut self.clients {
            previous.push(self.state_machine.release(client, &mut self.access_points));
        }
        let was_connected = |i: usize| previous.get(i).is_some_and(|s: &ConnectionState| s.is_connected());

        let positions: Vec<Vec2> = self.clients.iter().map(Client::position).collect();
        let mut significant = 0u64;

        // 3. Agent action
        let mut attempt = None;
        let mut reward = 0.0;
        if let Action::Handover(target) = action {
            let others = positions_except(&positions, ClientId::AGENT.index());
            if let Some(agent) = self.clients.get_mut(ClientId::AGENT.index()) {
                let evaluation = models.evaluate(
                    agent,
                    was_connected(ClientId::AGENT.index()),
                    &self.access_points[target.index()],
                    &others,
                    now,
                    &mut self.rng,
                );
                significant += u64::from(evaluation.dwell.significant_error);

                let result = self.state_machine.attempt(
                    agent,
                    &mut self.access_points,
                    target,
                    evaluation.score(),
                    now,
                    &mut self.rng,
                )?;
                reward = result.reward();
                attempt = Some(result);
            }
        }

        // 4. Auto-connect the rest
        let mut auto_connections = 0u64;
        for i in 1..self.clients.len() {
            let others = positions_except(&positions, i);
            let client = &self.clients[i];
            let mut best: Option<(AccessPointId, f64)> = None;

            for ap in &self.access_points {
                let evaluation =
                    models.evaluate(client, was_connected(i), ap, &others, now, &mut self.rng);
                significant += u64::from(evaluation.dwell.significant_error);

                let reachable =
                    evaluation.signal.signal > network.min_connect_signal && ap.has_capacity();
                if reachable && best.map_or(true, |(_, score)| evaluation.score() > score) {
                    best = Some((ap.id(), evaluation.score()));
                }
            }

            if let Some((target, score)) = best {
                let result = self.state_machine.attempt(
                    &mut self.clients[i],
                    &mut self.access_points,
                    target,
                    score,
                    now,
                    &mut self.rng,
                )?;
                if result.is_accepted() {
                    auto_connections += 1;
                }
            }
        }

        // 5. Observables
        significant += self.refresh_observation();

        // 6. Termination
        self.done = self.step_count >= self.config.network.max_steps;

        let info = StepInfo {
            step: self.step_count,
            time: now,
            attempt,
            auto_connections,
            connected_clients: self.clients.iter().filter(|c| c.is_connected()).count(),
            total_clients: self.clients.len(),
            significant_prediction_errors: significant,
        };
        self.metrics.record_step(reward, &info);

        if self.done {
            tracing::info!(
                steps = self.step_count,
                total_reward = self.metrics.total_reward,
                successes = self.metrics.successes,
                failures = self.metrics.failures,
                "Episode finished"
            );
        }

        Ok(StepOutcome {
            observation: self.observation.clone(),
            reward,
            done: self.done,
            info,
        })
    }

    /// Score one pair against the current state.
    ///
    /// Uses the client's current attachment for the connection penalty.
    /// Samples come from `rng`, never from the run's own source, so an
    /// inspection between steps leaves the episode unchanged.
    pub fn evaluate_pair<S: RandomSource + ?Sized>(
        &self,
        client: ClientId,
        access_point: AccessPointId,
        rng: &mut S,
    ) -> Result<PairEvaluation> {
        let c = self
            .clients
            .get(client.index())
            .ok_or(Error::UnknownClient(client))?;
        let ap = self
            .access_points
            .get(access_point.index())
            .ok_or(Error::UnknownAccessPoint(access_point))?;

        let positions: Vec<Vec2> = self.clients.iter().map(Client::position).collect();
        let others = positions_except(&positions, client.index());

        Ok(Models::new(&self.config.impairment).evaluate(
            c,
            c.is_connected(),
            ap,
            &others,
            self.time,
            rng,
        ))
    }

    /// Override a client's position and velocity.
    ///
    /// The observation picks up the new kinematics immediately. Signal and
    /// dwell readings keep their last sampled values until the next step.
    pub fn place_client(&mut self, client: ClientId, position: Vec2, velocity: Vec2) -> Result<()> {
        if !position.is_finite() || !velocity.is_finite() {
            return Err(Error::InvalidInput(format!(
                "{client}: position {position} and velocity {velocity} must be finite"
            )));
        }
        self.clients
            .get_mut(client.index())
            .ok_or(Error::UnknownClient(client))?
            .set_kinematics(position, velocity);
        self.rebuild_observation();
        Ok(())
    }

    /// Recompute readings and agent signals, rebuild the observation.
    ///
    /// Returns the number of significant dwell prediction errors.
    fn refresh_observation(&mut self) -> u64 {
        let models = Models::new(&self.config.impairment);
        let positions: Vec<Vec2> = self.clients.iter().map(Client::position).collect();
        let mut significant = 0u64;

        self.readings.clear();
        for (i, client) in self.clients.iter().enumerate() {
            let attached = client
                .connection()
                .access_point()
                .and_then(|id| self.access_points.get(id.index()));

            let reading = match attached {
                Some(ap) => {
                    let others = positions_except(&positions, i);
                    let signal = models
                        .signal
                        .measure(client.position(), ap, &others, &mut self.rng);
                    let dwell = models
                        .dwell
                        .predict(client.position(), client.velocity(), ap, &mut self.rng);
                    significant += u64::from(dwell.significant_error);
                    ClientReading {
                        signal_to_attached: signal.signal,
                        dwell_to_attached: dwell.dwell_time,
                    }
                }
                None => ClientReading::default(),
            };
            self.readings.push(reading);
        }

        self.agent_signals.clear();
        if let Some(agent) = self.clients.get(ClientId::AGENT.index()) {
            let others = positions_except(&positions, ClientId::AGENT.index());
            for ap in &self.access_points {
                let report = models
                    .signal
                    .measure(agent.position(), ap, &others, &mut self.rng);
                self.agent_signals.push(report.signal);
            }
        }

        self.rebuild_observation();
        significant
    }

    fn rebuild_observation(&mut self) {
        self.observation = self.layout.build(
            &self.clients,
            &self.readings,
            &self.access_points,
            &self.agent_signals,
        );
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn client(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(id.index())
    }

    pub fn access_points(&self) -> &[AccessPoint] {
        &self.access_points
    }

    pub fn access_point(&self, id: AccessPointId) -> Option<&AccessPoint> {
        self.access_points.get(id.index())
    }

    /// Simulation time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn layout(&self) -> &ObservationLayout {
        &self.layout
    }

    /// Observation after the last reset or step.
    pub fn observation(&self) -> &Observation {
        &self.observation
    }

    pub fn metrics(&self) -> &EpisodeMetrics {
        &self.metrics
    }

    pub fn transition_stats(&self) -> &TransitionStats {
        self.state_machine.stats()
    }

    /// Number of valid action indices, including the no-handover sentinel.
    pub fn action_space_size(&self) -> usize {
        Action::space_size(self.access_points.len())
    }

    /// Read-only view for a decision-maker.
    pub fn policy_context(&self) -> PolicyContext<'_> {
        PolicyContext {
            observation: &self.observation,
            clients: &self.clients,
            access_points: &self.access_points,
        }
    }
}
