//! Settings of a single HMC run.

use crate::error::{HmcError, Result};
use ndarray::Array1;
use std::time::Duration;

/// Run settings for [`crate::hmc::Hmc::sample`].
///
/// The defaults run 100 proposals of 10 jittered leapfrog steps of size 0.1,
/// keep every sample and buffer up to 1000 of them in RAM.
///
/// ```rust
/// use hmc_tomography::config::HmcConfig;
///
/// let config = HmcConfig::default()
///     .set_proposals(10_000)
///     .set_online_thinning(10)
///     .set_seed(42);
/// assert_eq!(config.total_samples(), 1_000);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HmcConfig {
    /// Number of proposals to make.
    pub proposals: usize,
    /// Keep one sample out of every `online_thinning` proposals.
    pub online_thinning: usize,
    /// Number of thinned samples staged in RAM between writes.
    pub ram_buffer_size: usize,
    pub nominal_step_size: f64,
    pub nominal_steps: usize,
    /// Jitter the step size uniformly in `[0.5, 1.5)` times the nominal value.
    pub randomize_step_size: bool,
    /// Jitter the number of steps the same way.
    pub randomize_steps: bool,
    /// Starting point; a vector of ones when absent.
    pub initial_coordinates: Option<Array1<f64>>,
    /// Seed for the random number generator; entropy when absent.
    pub seed: Option<u64>,
    /// Stop after this much wall-clock time, as if interrupted.
    pub max_time: Option<Duration>,
}

impl Default for HmcConfig {
    fn default() -> Self {
        Self {
            proposals: 100,
            online_thinning: 1,
            ram_buffer_size: 1000,
            nominal_step_size: 0.1,
            nominal_steps: 10,
            randomize_step_size: true,
            randomize_steps: true,
            initial_coordinates: None,
            seed: None,
            max_time: None,
        }
    }
}

impl HmcConfig {
    pub fn set_proposals(mut self, proposals: usize) -> Self {
        self.proposals = proposals;
        self
    }

    pub fn set_online_thinning(mut self, online_thinning: usize) -> Self {
        self.online_thinning = online_thinning;
        self
    }

    pub fn set_ram_buffer_size(mut self, ram_buffer_size: usize) -> Self {
        self.ram_buffer_size = ram_buffer_size;
        self
    }

    pub fn set_step_size(mut self, nominal_step_size: f64) -> Self {
        self.nominal_step_size = nominal_step_size;
        self
    }

    pub fn set_steps(mut self, nominal_steps: usize) -> Self {
        self.nominal_steps = nominal_steps;
        self
    }

    pub fn set_randomize_step_size(mut self, randomize: bool) -> Self {
        self.randomize_step_size = randomize;
        self
    }

    pub fn set_randomize_steps(mut self, randomize: bool) -> Self {
        self.randomize_steps = randomize;
        self
    }

    pub fn set_initial_coordinates(mut self, coordinates: Array1<f64>) -> Self {
        self.initial_coordinates = Some(coordinates);
        self
    }

    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn set_max_time(mut self, max_time: Duration) -> Self {
        self.max_time = Some(max_time);
        self
    }

    /// Number of columns a full run writes, `proposals / online_thinning`.
    pub fn total_samples(&self) -> usize {
        self.proposals / self.online_thinning.max(1)
    }

    /// Checks the settings against a problem of `dimensions` parameters.
    ///
    /// Whether the initial coordinates lie inside the support is checked by
    /// the engine, which owns the target and the prior.
    pub fn validate(&self, dimensions: usize) -> Result<()> {
        if self.proposals == 0 {
            return Err(config_error("proposals must be at least 1"));
        }
        if self.online_thinning == 0 || self.online_thinning > self.proposals {
            return Err(HmcError::Config(format!(
                "online_thinning must lie in 1..={}, got {}",
                self.proposals, self.online_thinning
            )));
        }
        if self.ram_buffer_size == 0 {
            return Err(config_error("ram_buffer_size must be at least 1"));
        }
        if self.nominal_steps == 0 {
            return Err(config_error("nominal_steps must be at least 1"));
        }
        if !(self.nominal_step_size.is_finite() && self.nominal_step_size > 0.0) {
            return Err(HmcError::Config(format!(
                "nominal_step_size must be finite and positive, got {}",
                self.nominal_step_size
            )));
        }
        if let Some(coordinates) = &self.initial_coordinates {
            if coordinates.len() != dimensions {
                return Err(HmcError::Config(format!(
                    "initial coordinates have {} entries, the problem has {dimensions} dimensions",
                    coordinates.len()
                )));
            }
        }
        Ok(())
    }
}

fn config_error(message: &str) -> HmcError {
    HmcError::Config(message.to_string())
}
