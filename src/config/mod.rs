//! Configuration management.
//!
//! All tunables are fixed before a run starts. [`Config::validate`] rejects
//! out-of-range values instead of clamping them, and the validated
//! [`ImpairmentConfig`] is then passed by reference into every model call.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Vec2;

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Client and access point population, geometry and episode length.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Scoring weights and radio/load/stability coefficients.
    #[serde(default)]
    pub impairment: ImpairmentConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;

        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path.as_ref(), content)?;

        Ok(())
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;
        self.impairment.validate()?;
        Ok(())
    }
}

/// Edge behaviour when a client reaches the border of the simulation area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMode {
    /// Mirror the position back inside and flip the velocity component.
    #[default]
    Reflect,
    /// Pin the position to the edge; velocity is left unchanged.
    Clamp,
}

/// Explicit access point placement, overriding the default grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccessPointSpec {
    pub x: f64,
    pub y: f64,
    /// Falls back to [`NetworkConfig::access_point_capacity`].
    #[serde(default)]
    pub capacity: Option<u32>,
    /// Falls back to [`NetworkConfig::coverage_radius`].
    #[serde(default)]
    pub coverage_radius: Option<f64>,
}

impl AccessPointSpec {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Network population and episode configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Number of mobile clients. Client 0 is the agent-controlled one.
    #[serde(default = "default_num_clients")]
    pub num_clients: usize,

    /// Number of access points (ignored when `access_points` is set).
    #[serde(default = "default_num_access_points")]
    pub num_access_points: usize,

    /// Side length of the square simulation area.
    #[serde(default = "default_area_size")]
    pub area_size: f64,

    /// Default coverage radius of each access point.
    #[serde(default = "default_coverage_radius")]
    pub coverage_radius: f64,

    /// Default client capacity of each access point.
    #[serde(default = "default_capacity")]
    pub access_point_capacity: u32,

    /// Maximum absolute velocity component at spawn (units per second).
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,

    /// Simulated seconds per step.
    #[serde(default = "default_step_seconds")]
    pub step_seconds: f64,

    /// Episode length in steps.
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,

    /// Seed of the simulation's random source.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Minimum signal for auto-connecting non-agent clients.
    #[serde(default = "default_min_connect_signal")]
    pub min_connect_signal: f64,

    /// Boundary handling.
    #[serde(default)]
    pub boundary: BoundaryMode,

    /// Explicit access point layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_points: Option<Vec<AccessPointSpec>>,
}

fn default_num_clients() -> usize {
    15
}
fn default_num_access_points() -> usize {
    9
}
fn default_area_size() -> f64 {
    1000.0
}
fn default_coverage_radius() -> f64 {
    crate::DEFAULT_COVERAGE_RADIUS
}
fn default_capacity() -> u32 {
    10
}
fn default_max_speed() -> f64 {
    15.0
}
fn default_step_seconds() -> f64 {
    1.0
}
fn default_max_steps() -> u64 {
    200
}
fn default_seed() -> u64 {
    42
}
fn default_min_connect_signal() -> f64 {
    20.0
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            num_clients: default_num_clients(),
            num_access_points: default_num_access_points(),
            area_size: default_area_size(),
            coverage_radius: default_coverage_radius(),
            access_point_capacity: default_capacity(),
            max_speed: default_max_speed(),
            step_seconds: default_step_seconds(),
            max_steps: default_max_steps(),
            seed: default_seed(),
            min_connect_signal: default_min_connect_signal(),
            boundary: BoundaryMode::default(),
            access_points: None,
        }
    }
}

impl NetworkConfig {
    /// Number of access points the run will actually create.
    pub fn access_point_count(&self) -> usize {
        self.access_points
            .as_ref()
            .map_or(self.num_access_points, Vec::len)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.num_clients == 0 {
            return Err(Error::InvalidConfig("num_clients must be at least 1".into()));
        }
        if self.access_point_count() == 0 {
            return Err(Error::InvalidConfig(
                "at least one access point is required".into(),
            ));
        }
        positive("network.area_size", self.area_size)?;
        positive("network.coverage_radius", self.coverage_radius)?;
        positive("network.step_seconds", self.step_seconds)?;
        non_negative("network.max_speed", self.max_speed)?;
        non_negative("network.min_connect_signal", self.min_connect_signal)?;
        if self.access_point_capacity == 0 {
            return Err(Error::InvalidConfig(
                "network.access_point_capacity must be positive".into(),
            ));
        }
        if self.max_steps == 0 {
            return Err(Error::InvalidConfig("network.max_steps must be at least 1".into()));
        }

        if let Some(specs) = &self.access_points {
            for (i, spec) in specs.iter().enumerate() {
                let inside = |v: f64| v.is_finite() && (0.0..=self.area_size).contains(&v);
                if !inside(spec.x) || !inside(spec.y) {
                    return Err(Error::InvalidConfig(format!(
                        "access point {i} at ({}, {}) lies outside the {} area",
                        spec.x, spec.y, self.area_size
                    )));
                }
                if spec.capacity == Some(0) {
                    return Err(Error::InvalidConfig(format!(
                        "access point {i}: capacity must be positive"
                    )));
                }
                if let Some(radius) = spec.coverage_radius {
                    positive(&format!("access point {i} coverage_radius"), radius)?;
                }
            }
        }

        Ok(())
    }
}

/// Weights of the linear handover score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// α1: 10 signal points contribute 4 score points at the default.
    #[serde(default = "default_signal_weight")]
    pub signal: f64,
    /// α2: applied to the load factor.
    #[serde(default = "default_load_weight")]
    pub load: f64,
    /// α3: applied to predicted dwell seconds.
    #[serde(default = "default_dwell_weight")]
    pub dwell: f64,
    /// α4: subtracted per unit of composite penalty.
    #[serde(default = "default_penalty_weight")]
    pub penalty: f64,
}

fn default_signal_weight() -> f64 {
    0.4
}
fn default_load_weight() -> f64 {
    0.3
}
fn default_dwell_weight() -> f64 {
    0.2
}
fn default_penalty_weight() -> f64 {
    0.1
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            signal: default_signal_weight(),
            load: default_load_weight(),
            dwell: default_dwell_weight(),
            penalty: default_penalty_weight(),
        }
    }
}

impl ScoringWeights {
    pub fn validate(&self) -> Result<()> {
        unit_interval("impairment.weights.signal", self.signal)?;
        unit_interval("impairment.weights.load", self.load)?;
        unit_interval("impairment.weights.dwell", self.dwell)?;
        unit_interval("impairment.weights.penalty", self.penalty)?;
        Ok(())
    }
}

/// Immutable coefficients for every model in the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpairmentConfig {
    /// Signal loss per interfering client near the access point.
    #[serde(default = "default_interference_factor")]
    pub interference_factor: f64,

    /// Cap on the number of interfering clients counted.
    #[serde(default = "default_max_interfering_neighbors")]
    pub max_interfering_neighbors: usize,

    /// Clients within this distance of an access point interfere.
    #[serde(default = "default_interference_radius")]
    pub interference_radius: f64,

    /// Scale of the normal fading perturbation.
    #[serde(default = "default_fading_std_dev", alias = "fading_variance")]
    pub fading_std_dev: f64,

    /// Upper bound of the uniform shadowing loss (0.0 - 1.0).
    #[serde(default = "default_shadowing_magnitude")]
    pub shadowing_magnitude: f64,

    /// Deterministic weather loss (0.0 - 0.3).
    #[serde(default)]
    pub weather_impact: f64,

    /// Deterministic channel quality multiplier (0.5 - 1.0).
    #[serde(default = "default_channel_quality")]
    pub channel_quality: f64,

    /// Penalty per unit of channel quality deficit.
    #[serde(default = "default_channel_degradation_multiplier")]
    pub channel_degradation_multiplier: f64,

    /// Load ratio above which congestion is penalised.
    #[serde(default = "default_congestion_threshold")]
    pub congestion_threshold: f64,

    #[serde(default = "default_congestion_multiplier")]
    pub congestion_multiplier: f64,

    /// Absolute occupancy above which overload is penalised.
    #[serde(default = "default_overload_threshold")]
    pub overload_threshold: u32,

    #[serde(default = "default_overload_multiplier")]
    pub overload_multiplier: f64,

    /// Handover processing delay; contributes a tenth of its value as penalty.
    #[serde(default = "default_processing_delay")]
    pub processing_delay_seconds: f64,

    /// Probability that an otherwise accepted handover fails.
    #[serde(default = "default_failure_rate")]
    pub failure_rate: f64,

    /// Seconds after a handover during which the cooldown penalty applies.
    #[serde(default = "default_cooldown")]
    pub cooldown_seconds: f64,

    /// Bound of the uniform relative dwell time prediction error.
    #[serde(default = "default_prediction_error_bound")]
    pub prediction_error_bound: f64,

    /// Relative prediction error above which an event is recorded.
    #[serde(default = "default_significant_error_threshold")]
    pub significant_error_threshold: f64,

    /// Penalty for moving a client that already holds a connection.
    #[serde(default = "default_connected_penalty")]
    pub connected_penalty: f64,

    /// Cooldown penalty immediately after a handover.
    #[serde(default = "default_cooldown_penalty_scale")]
    pub cooldown_penalty_scale: f64,

    /// Guard added to the load ratio before inversion.
    #[serde(default = "default_load_epsilon")]
    pub load_epsilon: f64,

    /// Score weights α1..α4.
    #[serde(default)]
    pub weights: ScoringWeights,
}

fn default_interference_factor() -> f64 {
    0.15
}
fn default_max_interfering_neighbors() -> usize {
    3
}
fn default_interference_radius() -> f64 {
    100.0
}
fn default_fading_std_dev() -> f64 {
    0.1
}
fn default_shadowing_magnitude() -> f64 {
    0.1
}
fn default_channel_quality() -> f64 {
    1.0
}
fn default_channel_degradation_multiplier() -> f64 {
    0.5
}
fn default_congestion_threshold() -> f64 {
    0.7
}
fn default_congestion_multiplier() -> f64 {
    0.3
}
fn default_overload_threshold() -> u32 {
    8
}
fn default_overload_multiplier() -> f64 {
    0.25
}
fn default_processing_delay() -> f64 {
    2.0
}
fn default_failure_rate() -> f64 {
    0.05
}
fn default_cooldown() -> f64 {
    5.0
}
fn default_prediction_error_bound() -> f64 {
    0.2
}
fn default_significant_error_threshold() -> f64 {
    0.1
}
fn default_connected_penalty() -> f64 {
    0.5
}
fn default_cooldown_penalty_scale() -> f64 {
    0.3
}
fn default_load_epsilon() -> f64 {
    1e-6
}

impl Default for ImpairmentConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            interference_factor: default_interference_factor(),
            max_interfering_neighbors: default_max_interfering_neighbors(),
            interference_radius: default_interference_radius(),
            fading_std_dev: default_fading_std_dev(),
            shadowing_magnitude: default_shadowing_magnitude(),
            weather_impact: 0.0,
            channel_quality: default_channel_quality(),
            channel_degradation_multiplier: default_channel_degradation_multiplier(),
            congestion_threshold: default_congestion_threshold(),
            congestion_multiplier: default_congestion_multiplier(),
            overload_threshold: default_overload_threshold(),
            overload_multiplier: default_overload_multiplier(),
            processing_delay_seconds: default_processing_delay(),
            failure_rate: default_failure_rate(),
            cooldown_seconds: default_cooldown(),
            prediction_error_bound: default_prediction_error_bound(),
            significant_error_threshold: default_significant_error_threshold(),
            connected_penalty: default_connected_penalty(),
            cooldown_penalty_scale: default_cooldown_penalty_scale(),
            load_epsilon: default_load_epsilon(),
        }
    }
}

impl ImpairmentConfig {
    /// Configuration with every stochastic and deterministic impairment off.
    ///
    /// Interference, fading, shadowing and weather contribute nothing and
    /// channel quality is perfect; scoring and load coefficients keep their
    /// defaults.
    pub fn unimpaired() -> Self {
        Self {
            interference_factor: 0.0,
            fading_std_dev: 0.0,
            shadowing_magnitude: 0.0,
            weather_impact: 0.0,
            channel_quality: 1.0,
            ..Self::default()
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;

        unit_interval("impairment.interference_factor", self.interference_factor)?;
        non_negative("impairment.interference_radius", self.interference_radius)?;
        non_negative("impairment.fading_std_dev", self.fading_std_dev)?;
        unit_interval("impairment.shadowing_magnitude", self.shadowing_magnitude)?;
        within("impairment.weather_impact", self.weather_impact, 0.0, 0.3)?;
        within("impairment.channel_quality", self.channel_quality, 0.5, 1.0)?;
        non_negative(
            "impairment.channel_degradation_multiplier",
            self.channel_degradation_multiplier,
        )?;
        unit_interval("impairment.congestion_threshold", self.congestion_threshold)?;
        non_negative("impairment.congestion_multiplier", self.congestion_multiplier)?;
        non_negative("impairment.overload_multiplier", self.overload_multiplier)?;
        non_negative("impairment.processing_delay_seconds", self.processing_delay_seconds)?;
        unit_interval("impairment.failure_rate", self.failure_rate)?;
        non_negative("impairment.cooldown_seconds", self.cooldown_seconds)?;
        non_negative("impairment.connected_penalty", self.connected_penalty)?;
        non_negative("impairment.cooldown_penalty_scale", self.cooldown_penalty_scale)?;
        unit_interval(
            "impairment.significant_error_threshold",
            self.significant_error_threshold,
        )?;

        if !(self.prediction_error_bound.is_finite()
            && (0.0..1.0).contains(&self.prediction_error_bound))
        {
            return Err(Error::InvalidConfig(format!(
                "impairment.prediction_error_bound must lie in [0, 1), got {}",
                self.prediction_error_bound
            )));
        }
        positive("impairment.load_epsilon", self.load_epsilon)?;

        Ok(())
    }
}

fn within(name: &str, value: f64, low: f64, high: f64) -> Result<()> {
    if value.is_finite() && (low..=high).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{name} must lie in [{low}, {high}], got {value}"
        )))
    }
}

fn unit_interval(name: &str, value: f64) -> Result<()> {
    within(name, value, 0.0, 1.0)
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{name} must be finite and non-negative, got {value}"
        )))
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{name} must be finite and positive, got {value}"
        )))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text or json).
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Enable colored output.
    #[serde(default = "default_color")]
    pub color: bool,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}
fn default_color() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            color: default_color(),
        }
    }
}

/// Initialize logging.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        subscriber
            .with(fmt::layer().json())
            .try_init()
            .map_err(|e| Error::Config(format!("Failed to init logging: {e}")))?;
    } else {
        subscriber
            .with(fmt::layer().with_ansi(config.color))
            .try_init()
            .map_err(|e| Error::Config(format!("Failed to init logging: {e}")))?;
    }

    Ok(())
}
