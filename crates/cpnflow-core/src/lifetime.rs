//! Product lifetime distributions
//!
//! The time a unit of material spends in use is modelled as log-normally
//! distributed. Callers describe the distribution by its arithmetic mean and
//! standard deviation (in grid time units), which are converted into the
//! log-space location and scale of the underlying normal distribution:
//!
//! $$\sigma_{log} = \sqrt{\ln\left(1 + (\sigma / \mu)^2\right)}$$
//! $$\mu_{log} = \ln(\mu) - \frac{1}{2}\sigma_{log}^2$$

use crate::errors::{FlowError, FlowResult};
use crate::grid::TimeGrid;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, LogNormal};

/// Log-normal lifetime distribution parameterised in log-space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LifetimeDistribution {
    /// Arithmetic mean lifetime
    pub mean: f64,
    /// Arithmetic standard deviation of the lifetime
    pub std_dev: f64,
    /// Location of the underlying normal distribution
    pub mu_log: f64,
    /// Scale of the underlying normal distribution
    pub sigma_log: f64,
}

impl LifetimeDistribution {
    /// Build the distribution from an arithmetic mean and standard deviation.
    pub fn from_mean_std(mean: f64, std_dev: f64) -> FlowResult<Self> {
        if !mean.is_finite() || mean <= 0.0 {
            return Err(FlowError::invalid_parameter(
                "mu",
                format!("mean lifetime must be finite and > 0, got {mean}"),
            ));
        }
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err(FlowError::invalid_parameter(
                "sigma",
                format!("lifetime dispersion must be finite and >= 0, got {std_dev}"),
            ));
        }

        let sigma_log = (1.0 + (std_dev / mean).powi(2)).ln().sqrt();
        let mu_log = mean.ln() - 0.5 * sigma_log.powi(2);

        Ok(Self {
            mean,
            std_dev,
            mu_log,
            sigma_log,
        })
    }

    /// A zero dispersion collapses the distribution onto its mean.
    pub fn is_degenerate(&self) -> bool {
        self.sigma_log == 0.0
    }

    /// Probability density at `t`.
    ///
    /// Zero for `t <= 0`. A degenerate distribution has no density and
    /// returns zero everywhere; use [`LifetimeDistribution::density_on`] to
    /// obtain its discretised form.
    pub fn pdf(&self, t: f64) -> f64 {
        match self.log_normal() {
            Some(dist) => dist.pdf(t),
            None => 0.0,
        }
    }

    /// Density evaluated at every grid point.
    ///
    /// When the distribution is degenerate all of its mass is placed on the
    /// grid point closest to the mean, scaled by `1 / dt` so that the
    /// discrete integral `sum(L) * dt` is still one.
    pub fn density_on(&self, grid: &TimeGrid) -> Array1<f64> {
        match self.log_normal() {
            Some(dist) => grid.map(|t| dist.pdf(t)),
            None => {
                let mut density = Array1::zeros(grid.len());
                density[grid.nearest_index(self.mean)] = 1.0 / grid.dt();
                density
            }
        }
    }

    fn log_normal(&self) -> Option<LogNormal> {
        if self.is_degenerate() {
            return None;
        }
        // Parameters were validated on construction
        LogNormal::new(self.mu_log, self.sigma_log).ok()
    }
}
