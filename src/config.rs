//! Configuration consumed by the simulation core.
//!
//! All duration-like values are plain seconds (`f64`), matching what external
//! callers (config files, dashboards) feed in. [`SimulationConfig::validate`]
//! checks every documented range before a run starts; the runner refuses to
//! build a world from an invalid configuration.

use serde::{Deserialize, Serialize};

use crate::error::{SimulationError, SimulationResult};

/// How interarrival gaps between requests are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrivalProcess {
    /// Constant gap equal to the configured mean.
    Fixed,
    /// Exponential gaps with the configured mean (a Poisson arrival process).
    Poisson,
}

/// Request generator tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Gap distribution between successive arrivals.
    pub arrival_process: ArrivalProcess,
    /// Mean gap between arrivals, in seconds. Must be > 0.
    pub mean_interarrival: f64,
    /// Probability that a generated request is a read, in `[0, 1]`.
    /// Writes are forced while nothing has been written yet.
    pub read_probability: f64,
    /// Total number of requests to generate. Must be ≥ 1.
    pub request_count: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            arrival_process: ArrivalProcess::Poisson,
            mean_interarrival: 0.2,
            read_probability: 0.5,
            request_count: 50,
        }
    }
}

/// Orchestrator tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Deadline applied independently to each fast/slow attempt, in seconds.
    /// Must be > 0.
    pub response_timeout: f64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            response_timeout: 1.0,
        }
    }
}

/// Fast store tunables.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FastStoreConfig {
    /// Probability that a read fails, in `[0, 1]`.
    pub read_failure_probability: f64,
    /// Probability that a write fails, in `[0, 1]`.
    pub write_failure_probability: f64,
}

/// Slow store tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlowStoreConfig {
    /// Probability that a read fails, in `[0, 1]`.
    pub read_failure_probability: f64,
    /// Probability that a write fails, in `[0, 1]`.
    pub write_failure_probability: f64,
    /// Upper bound of the uniform read service time, in seconds. Must be ≥ 0.
    pub max_read_time: f64,
    /// Upper bound of the uniform write service time, in seconds. Must be ≥ 0.
    pub max_write_time: f64,
    /// Maximum number of concurrent operations. Must be ≥ 1.
    pub concurrency_limit: usize,
}

impl Default for SlowStoreConfig {
    fn default() -> Self {
        Self {
            read_failure_probability: 0.0,
            write_failure_probability: 0.0,
            max_read_time: 0.1,
            max_write_time: 0.1,
            concurrency_limit: 2,
        }
    }
}

/// Complete configuration for one simulation run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Seed for the run's deterministic RNG stream.
    #[serde(default)]
    pub seed: u64,
    /// Request generator settings.
    #[serde(default)]
    pub generator: GeneratorConfig,
    /// Orchestrator settings.
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Fast store settings.
    #[serde(default)]
    pub fast_store: FastStoreConfig,
    /// Slow store settings.
    #[serde(default)]
    pub slow_store: SlowStoreConfig,
}

fn check_probability(name: &str, value: f64) -> SimulationResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(SimulationError::InvalidConfig(format!(
            "{name} must be within [0, 1], got {value}"
        )));
    }
    Ok(())
}

impl SimulationConfig {
    /// Validate every documented range.
    ///
    /// Duration-like values must also be finite; they are converted with
    /// `Duration::from_secs_f64` downstream.
    pub fn validate(&self) -> SimulationResult<()> {
        if !self.generator.mean_interarrival.is_finite()
            || self.generator.mean_interarrival <= 0.0
        {
            return Err(SimulationError::InvalidConfig(format!(
                "mean_interarrival must be a finite value > 0, got {}",
                self.generator.mean_interarrival
            )));
        }
        check_probability("read_probability", self.generator.read_probability)?;
        if self.generator.request_count < 1 {
            return Err(SimulationError::InvalidConfig(
                "request_count must be at least 1".to_string(),
            ));
        }

        if !self.orchestrator.response_timeout.is_finite()
            || self.orchestrator.response_timeout <= 0.0
        {
            return Err(SimulationError::InvalidConfig(format!(
                "response_timeout must be a finite value > 0, got {}",
                self.orchestrator.response_timeout
            )));
        }

        check_probability(
            "fast_store.read_failure_probability",
            self.fast_store.read_failure_probability,
        )?;
        check_probability(
            "fast_store.write_failure_probability",
            self.fast_store.write_failure_probability,
        )?;

        check_probability(
            "slow_store.read_failure_probability",
            self.slow_store.read_failure_probability,
        )?;
        check_probability(
            "slow_store.write_failure_probability",
            self.slow_store.write_failure_probability,
        )?;
        if !self.slow_store.max_read_time.is_finite() || self.slow_store.max_read_time < 0.0 {
            return Err(SimulationError::InvalidConfig(format!(
                "max_read_time must be a finite value >= 0, got {}",
                self.slow_store.max_read_time
            )));
        }
        if !self.slow_store.max_write_time.is_finite() || self.slow_store.max_write_time < 0.0 {
            return Err(SimulationError::InvalidConfig(format!(
                "max_write_time must be a finite value >= 0, got {}",
                self.slow_store.max_write_time
            )));
        }
        if self.slow_store.concurrency_limit < 1 {
            return Err(SimulationError::InvalidConfig(
                "concurrency_limit must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut config = SimulationConfig::default();
        config.generator.mean_interarrival = 0.0;
        assert!(matches!(
            config.validate(),
            Err(SimulationError::InvalidConfig(_))
        ));

        let mut config = SimulationConfig::default();
        config.generator.read_probability = 1.5;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.generator.request_count = 0;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.orchestrator.response_timeout = -1.0;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.slow_store.write_failure_probability = -0.1;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.slow_store.max_read_time = -0.5;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.slow_store.concurrency_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn nan_probability_is_rejected() {
        let mut config = SimulationConfig::default();
        config.fast_store.read_failure_probability = f64::NAN;
        assert!(config.validate().is_err());
    }
}
