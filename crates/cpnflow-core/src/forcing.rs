//! Radiative forcing of delayed emissions
//!
//! Material leaving the system releases CO2 (e.g. when incinerated). The
//! radiative forcing caused by a time series of emissions is obtained by
//! convolving it with the atmospheric impulse response of CO2, as in dynamic
//! life cycle assessment.

use crate::errors::{FlowError, FlowResult};
use crate::grid::TimeGrid;
use crate::parameters::ForcingParameters;
use ndarray::{Array1, ArrayView1};

/// Atmospheric CO2 impulse-response function
///
/// $$IRF(t) = k \left(a_0 + \sum_i a_i e^{-t / \tau_i}\right)$$
#[derive(Debug, Clone)]
pub struct Co2ImpulseResponse {
    parameters: ForcingParameters,
}

impl Co2ImpulseResponse {
    pub fn new() -> Self {
        Self {
            parameters: ForcingParameters::default(),
        }
    }

    pub fn from_parameters(parameters: ForcingParameters) -> FlowResult<Self> {
        parameters.validate()?;
        Ok(Self { parameters })
    }

    pub fn parameters(&self) -> &ForcingParameters {
        &self.parameters
    }

    /// Response at time `t` after a unit pulse.
    pub fn response(&self, t: f64) -> f64 {
        let p = &self.parameters;
        let decaying: f64 = p
            .weights
            .iter()
            .zip(&p.time_constants)
            .map(|(weight, tau)| weight * (-t / tau).exp())
            .sum();
        p.scale * (p.constant + decaying)
    }

    /// Response sampled at the elapsed time of every grid point.
    pub fn response_on(&self, grid: &TimeGrid) -> Array1<f64> {
        let start = grid.first();
        grid.map(|t| self.response(t - start))
    }

    /// Forcing of `flows` on `grid`, multiplied by the reporting scale.
    pub fn forcing(&self, flows: ArrayView1<f64>, grid: &TimeGrid) -> FlowResult<Array1<f64>> {
        let irf = self.response_on(grid);
        Ok(radiative_forcing(flows, irf.view())? * self.parameters.report_scale)
    }
}

impl Default for Co2ImpulseResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Convolve emissions with an impulse response.
///
/// A quantity emitted at step `i` starts to act at step `i + 1`:
///
/// ```text
/// forcing[i + 1 + k] += irf[k] * flows[i]
/// ```
pub fn radiative_forcing(
    flows: ArrayView1<f64>,
    irf: ArrayView1<f64>,
) -> FlowResult<Array1<f64>> {
    let n = irf.len();
    if flows.len() != n {
        return Err(FlowError::LengthMismatch {
            expected: n,
            actual: flows.len(),
        });
    }

    let mut forcing = Array1::zeros(n);
    for (i, &quantity) in flows.iter().enumerate() {
        if quantity == 0.0 {
            continue;
        }
        for (k, &response) in irf.iter().take(n - 1 - i).enumerate() {
            forcing[i + 1 + k] += response * quantity;
        }
    }
    Ok(forcing)
}
