//! Absorbing Markov chain view of the flow network
//!
//! Treating a unit of material as a random walker gives a closed-form check
//! of the steady-state behaviour of the flow fractions. Production, use and
//! recycling are transient states; incineration and landfill absorb the
//! walker. With `Q` the transient-to-transient and `R` the
//! transient-to-absorbing transition probabilities, the fundamental matrix
//! `N = (I - Q)^-1` gives the expected number of visits to each transient
//! state and `N R` the probability of ending in each absorbing state.

use crate::errors::{FlowError, FlowResult};
use crate::parameters::FlowFractions;
use nalgebra::{Matrix3, Matrix3x2};
use serde::Serialize;

pub const PRODUCTION: usize = 0;
pub const USE: usize = 1;
pub const RECYCLING: usize = 2;
pub const INCINERATION: usize = 0;
pub const LANDFILL: usize = 1;

pub const TRANSIENT_STATES: [&str; 3] = ["production", "use", "recycling"];
pub const ABSORBING_STATES: [&str; 2] = ["incineration", "landfill"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbsorbingChain {
    pub q: Matrix3<f64>,
    pub r: Matrix3x2<f64>,
}

impl AbsorbingChain {
    pub fn from_fractions(fractions: &FlowFractions) -> FlowResult<Self> {
        fractions.validate()?;

        #[rustfmt::skip]
        let q = Matrix3::new(
            0.0, 1.0, 0.0,
            0.0, fractions.direct_reuse(), fractions.recycled,
            0.0, 1.0, 0.0,
        );
        #[rustfmt::skip]
        let r = Matrix3x2::new(
            0.0, 0.0,
            fractions.incinerated, fractions.landfilled,
            0.0, 0.0,
        );
        Ok(Self { q, r })
    }

    /// `N = (I - Q)^-1`
    pub fn fundamental_matrix(&self) -> FlowResult<Matrix3<f64>> {
        (Matrix3::identity() - self.q)
            .try_inverse()
            .ok_or_else(|| {
                FlowError::SingularMatrix(
                    "I - Q is not invertible; material never leaves the system".to_string(),
                )
            })
    }

    /// Expected visits and absorbed quantities for `quantity` entering at
    /// each transient state.
    pub fn summarise(&self, quantity: f64, mean_lifetime: f64) -> FlowResult<ChainSummary> {
        let fundamental = self.fundamental_matrix()?;
        let absorption = fundamental * self.r;
        Ok(ChainSummary {
            expected_visits: fundamental * quantity,
            absorbed: absorption * quantity,
            absorption_probabilities: absorption,
            expected_time_in_use: fundamental[(PRODUCTION, USE)] * mean_lifetime,
            fundamental,
        })
    }
}

/// Closed-form results of the absorbing chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainSummary {
    /// `N = (I - Q)^-1`
    pub fundamental: Matrix3<f64>,
    /// `quantity * N`
    pub expected_visits: Matrix3<f64>,
    /// `N R`
    pub absorption_probabilities: Matrix3x2<f64>,
    /// `quantity * N R`
    pub absorbed: Matrix3x2<f64>,
    /// Expected total time a produced unit spends in use
    pub expected_time_in_use: f64,
}
