//! Material-flow analysis by fixed-point iteration
//!
//! The use-phase outflow `O_U` is the solution of a causal integral equation:
//! material leaves the use phase once its lifetime has elapsed, and part of
//! what leaves is returned to use, so the outflow feeds back into itself.
//!
//! $$O_U(t) = \int_0^t \left(O_P(\tau) + r \cdot O_U(\tau)\right) L(t - \tau) \, d\tau$$
//!
//! where $O_P$ is the primary inflow pulse, $L$ the lifetime density and $r$
//! the fraction of the outflow returned to use. The integral is discretised on
//! a uniform [`TimeGrid`] and solved by repeatedly applying [`iterate`] until
//! the largest change between two sweeps drops below the tolerance.

mod solution;

pub use solution::{cumulative_stock, ConvergenceStatus, MfaSolution};

use crate::errors::{FlowError, FlowResult};
use crate::grid::TimeGrid;
use crate::lifetime::LifetimeDistribution;
use crate::parameters::{FlowFractions, MfaParameters};
use ndarray::{Array1, ArrayView1};
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// One fixed-point sweep of the lifetime convolution.
///
/// Computes, for every index `t`,
///
/// ```text
/// O_U_next[t] = dt * sum_{tau < t} (O_P[tau] + r * O_U_prev[tau]) * L[t - tau]
/// ```
///
/// Each index only reads the previous iterate, so indices are evaluated in
/// parallel. The summation over `tau` runs in increasing order for every
/// index, so the result does not depend on the number of threads.
///
/// # Panics
/// Panics if the three series do not have the same length.
pub fn iterate(
    o_u_prev: ArrayView1<f64>,
    o_p: ArrayView1<f64>,
    lifetime: ArrayView1<f64>,
    dt: f64,
    fractions: &FlowFractions,
) -> Array1<f64> {
    let n = o_p.len();
    assert_eq!(o_u_prev.len(), n, "O_U must have same length as O_P");
    assert_eq!(lifetime.len(), n, "L must have same length as O_P");

    let inflow: Vec<f64> = o_p
        .iter()
        .zip(o_u_prev.iter())
        .map(|(primary, outflow)| primary + fractions.returned_to_use * outflow)
        .collect();
    let lifetime = lifetime.to_vec();

    let next: Vec<f64> = (0..n)
        .into_par_iter()
        .map(|t| {
            let total: f64 = (0..t).map(|tau| inflow[tau] * lifetime[t - tau]).sum();
            dt * total
        })
        .collect();

    Array1::from(next)
}

/// Largest absolute element-wise difference between two series.
fn max_abs_diff(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// Solves the use-phase outflow of a single injection pulse.
#[derive(Debug, Clone, Default)]
pub struct FlowConvergenceSolver {
    parameters: MfaParameters,
}

impl FlowConvergenceSolver {
    /// Create a new solver with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parameters(parameters: MfaParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &MfaParameters {
        &self.parameters
    }

    /// Lifetime density `L` sampled on `grid`.
    pub fn lifetime_density(&self, grid: &TimeGrid) -> FlowResult<Array1<f64>> {
        let distribution =
            LifetimeDistribution::from_mean_std(self.parameters.mu, self.parameters.sigma)?;
        Ok(distribution.density_on(grid))
    }

    /// Primary inflow `O_P`: `total_tons` spread evenly over the pulse window.
    ///
    /// Fails if no grid point lies inside the window, since the pulse would
    /// otherwise be silently dropped.
    pub fn primary_inflow(&self, grid: &TimeGrid) -> FlowResult<Array1<f64>> {
        let pulse_end = self.parameters.pulse_end;
        let window = grid.count_before(pulse_end);
        if window == 0 {
            return Err(FlowError::InvalidInput(format!(
                "no grid point lies before t={pulse_end}; the grid starts at {}",
                grid.first()
            )));
        }

        let per_step = self.parameters.total_tons / window as f64;
        Ok(grid.map(|t| if t < pulse_end { per_step } else { 0.0 }))
    }

    /// Run the fixed-point iteration and derive all flows and stocks.
    ///
    /// Running out of iterations is not an error: the last iterate is kept
    /// and [`MfaSolution::converged`] is `false`.
    pub fn solve(&self, grid: &TimeGrid) -> FlowResult<MfaSolution> {
        self.parameters.validate()?;
        let lifetime = self.lifetime_density(grid)?;
        let o_p = self.primary_inflow(grid)?;

        let fractions = &self.parameters.fractions;
        let tolerance = self.parameters.tolerance;
        let max_iterations = self.parameters.max_iterations;
        let dt = grid.dt();

        let mut o_u = Array1::zeros(grid.len());
        let mut residual_history = Vec::with_capacity(max_iterations);
        let mut converged = false;

        for iteration in 0..max_iterations {
            let next = iterate(o_u.view(), o_p.view(), lifetime.view(), dt, fractions);
            let residual = max_abs_diff(&next, &o_u);
            residual_history.push(residual);
            debug!(iteration, residual, "MFA sweep");

            o_u = next;
            if residual < tolerance {
                converged = true;
                break;
            }
        }

        let iterations = residual_history.len();
        let status = ConvergenceStatus {
            converged,
            iterations,
            residual: residual_history.last().copied().unwrap_or(f64::NAN),
            tolerance,
        };
        if converged {
            info!(iterations, residual = status.residual, "MFA converged");
        } else {
            warn!(
                iterations,
                residual = status.residual,
                tolerance,
                "MFA did not converge; keeping the last iterate"
            );
        }

        Ok(MfaSolution::from_outflow(
            o_p,
            o_u,
            fractions,
            status,
            residual_history,
        ))
    }
}

/// Recycling inflow `I_R` and use-phase stock `K_U` for a pulse on `grid`.
pub fn mfa(
    grid: &TimeGrid,
    parameters: &MfaParameters,
) -> FlowResult<(Array1<f64>, Array1<f64>)> {
    let solution = FlowConvergenceSolver::from_parameters(parameters.clone()).solve(grid)?;
    Ok((solution.i_r, solution.k_u))
}
