use crate::errors::{FlowError, FlowResult};
use crate::parameters::FlowFractions;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Outcome of the fixed-point iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceStatus {
    /// Whether the last sweep changed `O_U` by less than `tolerance`
    pub converged: bool,
    /// Number of sweeps performed
    pub iterations: usize,
    /// Maximum absolute change during the last sweep
    pub residual: f64,
    pub tolerance: f64,
}

/// Converged use-phase outflow and the flows and stocks derived from it.
///
/// All series share the length and indexing of the time grid they were
/// solved on. Flows are quantities per grid step.
#[derive(Debug, Clone)]
pub struct MfaSolution {
    pub status: ConvergenceStatus,
    /// Maximum absolute change of every sweep, in order
    pub residual_history: Vec<f64>,
    /// Primary inflow into use
    pub o_p: Array1<f64>,
    /// Outflow from use
    pub o_u: Array1<f64>,
    /// Inflow into recycling
    pub i_r: Array1<f64>,
    /// Outflow from recycling (recycled material is processed immediately)
    pub o_r: Array1<f64>,
    /// Inflow into incineration
    pub i_i: Array1<f64>,
    /// Inflow into landfill
    pub i_d: Array1<f64>,
    /// Total inflow into use
    pub i_u: Array1<f64>,
    /// Net change of the use stock
    pub dk: Array1<f64>,
    /// Use stock
    pub k_u: Array1<f64>,
}

impl MfaSolution {
    pub(crate) fn from_outflow(
        o_p: Array1<f64>,
        o_u: Array1<f64>,
        fractions: &FlowFractions,
        status: ConvergenceStatus,
        residual_history: Vec<f64>,
    ) -> Self {
        let i_r = &o_u * fractions.recycled;
        let o_r = i_r.clone();
        let i_i = &o_u * fractions.incinerated;
        let i_d = &o_u * fractions.landfilled;
        let i_u = &o_p + &(&o_u * fractions.returned_to_use);
        let dk = &i_u - &o_u;
        let k_u = cumulative_stock(dk.view());

        Self {
            status,
            residual_history,
            o_p,
            o_u,
            i_r,
            o_r,
            i_i,
            i_d,
            i_u,
            dk,
            k_u,
        }
    }

    pub fn len(&self) -> usize {
        self.o_u.len()
    }

    pub fn is_empty(&self) -> bool {
        self.o_u.is_empty()
    }

    /// Turn a non-converged solution into [`FlowError::NotConverged`].
    pub fn require_converged(self) -> FlowResult<Self> {
        if self.status.converged {
            Ok(self)
        } else {
            Err(FlowError::NotConverged {
                iterations: self.status.iterations,
                residual: self.status.residual,
                tolerance: self.status.tolerance,
            })
        }
    }

    /// Named series, in a stable order, for reporting.
    pub fn series(&self) -> [(&'static str, ArrayView1<'_, f64>); 9] {
        [
            ("O_P", self.o_p.view()),
            ("O_U", self.o_u.view()),
            ("I_R", self.i_r.view()),
            ("O_R", self.o_r.view()),
            ("I_I", self.i_i.view()),
            ("I_D", self.i_d.view()),
            ("I_U", self.i_u.view()),
            ("dK", self.dk.view()),
            ("K_U", self.k_u.view()),
        ]
    }
}

/// Stock level from its net changes.
///
/// `K[t]` is the sum of `dk` over all indices strictly before `t`, so
/// `K[0] == 0` and a change at `t` is first visible at `t + 1`.
pub fn cumulative_stock(dk: ArrayView1<f64>) -> Array1<f64> {
    let mut stock = Array1::zeros(dk.len());
    let mut running = 0.0;
    for (level, change) in stock.iter_mut().zip(dk.iter()) {
        *level = running;
        running += change;
    }
    stock
}
