//! Model parameters
//!
//! Each parameter struct provides defaults matching the reference plastic
//! recycling scenario and can be deserialised from a partial TOML table:
//! missing fields fall back to their defaults.

use crate::errors::{FlowError, FlowResult};
use serde::{Deserialize, Serialize};

/// Fate of material leaving the use phase.
///
/// All values are fractions of the use-phase outflow `O_U` and are
/// dimensionless.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowFractions {
    /// Fraction of the outflow sent to recycling (`I_R = recycled * O_U`).
    ///
    /// Default: 0.07
    pub recycled: f64,

    /// Fraction of the outflow sent to incineration (`I_I`).
    ///
    /// Default: 0.55
    pub incinerated: f64,

    /// Fraction of the outflow sent to landfill (`I_D`).
    ///
    /// Default: 0.09
    pub landfilled: f64,

    /// Fraction of the outflow that re-enters the use phase, either directly
    /// or through recycling. Includes `recycled`.
    ///
    /// Default: 0.36
    pub returned_to_use: f64,
}

impl Default for FlowFractions {
    fn default() -> Self {
        Self {
            recycled: 0.07,
            incinerated: 0.55,
            landfilled: 0.09,
            returned_to_use: 0.36,
        }
    }
}

impl FlowFractions {
    /// Fraction of the outflow reused directly without going through recycling.
    pub fn direct_reuse(&self) -> f64 {
        self.returned_to_use - self.recycled
    }

    pub fn validate(&self) -> FlowResult<()> {
        let fields = [
            ("recycled", self.recycled),
            ("incinerated", self.incinerated),
            ("landfilled", self.landfilled),
            ("returned_to_use", self.returned_to_use),
        ];
        for (name, value) in fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(FlowError::invalid_parameter(
                    name,
                    format!("fraction must lie in [0, 1], got {value}"),
                ));
            }
        }
        if self.recycled > self.returned_to_use {
            return Err(FlowError::invalid_parameter(
                "recycled",
                "recycled material is part of the material returned to use",
            ));
        }
        Ok(())
    }
}

/// Parameters of the material-flow fixed-point solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MfaParameters {
    /// Mean product lifetime, in grid time units.
    ///
    /// Default: 8.0
    pub mu: f64,

    /// Standard deviation of the product lifetime, in grid time units.
    ///
    /// Default: 2.0
    pub sigma: f64,

    /// Total quantity injected during the initial pulse window (tons).
    ///
    /// Default: 1 798 940 t
    pub total_tons: f64,

    /// End of the pulse window: the injection is spread uniformly over all
    /// grid points with `t < pulse_end`.
    ///
    /// Default: 1.0
    pub pulse_end: f64,

    /// Maximum number of fixed-point sweeps.
    ///
    /// Default: 100
    pub max_iterations: usize,

    /// Convergence threshold on the maximum absolute change between sweeps.
    ///
    /// Default: 1e-6
    pub tolerance: f64,

    pub fractions: FlowFractions,
}

impl Default for MfaParameters {
    fn default() -> Self {
        Self {
            mu: 8.0,
            sigma: 2.0,
            total_tons: 1_798_940.0,
            pulse_end: 1.0,
            max_iterations: 100,
            tolerance: 1e-6,
            fractions: FlowFractions::default(),
        }
    }
}

impl MfaParameters {
    /// Check the parameters that are not validated elsewhere.
    ///
    /// `mu` and `sigma` are checked when the lifetime distribution is built.
    pub fn validate(&self) -> FlowResult<()> {
        if !self.total_tons.is_finite() || self.total_tons < 0.0 {
            return Err(FlowError::invalid_parameter(
                "total_tons",
                format!("must be finite and >= 0, got {}", self.total_tons),
            ));
        }
        if self.max_iterations == 0 {
            return Err(FlowError::invalid_parameter(
                "max_iterations",
                "at least one iteration is required",
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(FlowError::invalid_parameter(
                "tolerance",
                format!("must be finite and > 0, got {}", self.tolerance),
            ));
        }
        if !self.pulse_end.is_finite() {
            return Err(FlowError::invalid_parameter(
                "pulse_end",
                format!("must be finite, got {}", self.pulse_end),
            ));
        }
        self.fractions.validate()
    }
}

/// Impulse response of atmospheric CO2 to a unit emission pulse.
///
/// The response is a constant plus a sum of decaying exponentials:
///
/// $$IRF(t) = k \left(a_0 + \sum_i a_i e^{-t / \tau_i}\right)$$
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForcingParameters {
    /// Overall scale of the response.
    ///
    /// Default: 0.0198
    pub scale: f64,

    /// Fraction of the pulse that remains airborne indefinitely.
    ///
    /// Default: 0.1756
    pub constant: f64,

    /// Weights of the decaying modes.
    ///
    /// Default: [0.1375, 0.1858, 0.2423, 0.2589]
    pub weights: Vec<f64>,

    /// Time constants of the decaying modes, in years.
    ///
    /// Default: [421.093, 70.5965, 21.4216, 3.4154]
    pub time_constants: Vec<f64>,

    /// Factor applied to the forcing curve when reporting.
    ///
    /// Default: 1000.0
    pub report_scale: f64,
}

impl Default for ForcingParameters {
    fn default() -> Self {
        Self {
            scale: 0.0198,
            constant: 0.1756,
            weights: vec![0.1375, 0.1858, 0.2423, 0.2589],
            time_constants: vec![421.093, 70.5965, 21.4216, 3.4154],
            report_scale: 1000.0,
        }
    }
}

impl ForcingParameters {
    pub fn validate(&self) -> FlowResult<()> {
        if self.weights.len() != self.time_constants.len() {
            return Err(FlowError::invalid_parameter(
                "time_constants",
                format!(
                    "expected one time constant per weight ({}), got {}",
                    self.weights.len(),
                    self.time_constants.len()
                ),
            ));
        }
        if let Some(weight) = self.weights.iter().find(|w| !w.is_finite()) {
            return Err(FlowError::invalid_parameter(
                "weights",
                format!("weights must be finite, got {weight}"),
            ));
        }
        if let Some(tau) = self
            .time_constants
            .iter()
            .find(|tau| !(tau.is_finite() && **tau > 0.0))
        {
            return Err(FlowError::invalid_parameter(
                "time_constants",
                format!("time constants must be > 0, got {tau}"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fractions_close_the_balance() {
        let fractions = FlowFractions::default();
        let total = fractions.returned_to_use + fractions.incinerated + fractions.landfilled;
        assert!((total - 1.0).abs() < 1e-12);
        assert!((fractions.direct_reuse() - 0.29).abs() < 1e-12);
        fractions.validate().unwrap();
    }

    #[test]
    fn test_default_mfa_parameters() {
        let params = MfaParameters::default();
        assert_eq!(params.mu, 8.0);
        assert_eq!(params.sigma, 2.0);
        assert_eq!(params.total_tons, 1_798_940.0);
        assert_eq!(params.max_iterations, 100);
        assert_eq!(params.tolerance, 1e-6);
        params.validate().unwrap();
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let params: MfaParameters = toml::from_str(
            r#"
            total_tons = 1000.0
            max_iterations = 50

            [fractions]
            recycled = 0.1
            "#,
        )
        .unwrap();

        assert_eq!(params.total_tons, 1000.0);
        assert_eq!(params.max_iterations, 50);
        assert_eq!(params.mu, 8.0);
        assert_eq!(params.fractions.recycled, 0.1);
        assert_eq!(params.fractions.incinerated, 0.55);
    }

    #[test]
    fn test_validation_errors() {
        let params = MfaParameters {
            total_tons: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(FlowError::InvalidParameter {
                name: "total_tons",
                ..
            })
        ));

        let params = MfaParameters {
            max_iterations: 0,
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let params = MfaParameters {
            fractions: FlowFractions {
                recycled: 0.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_forcing_parameters_validation() {
        ForcingParameters::default().validate().unwrap();

        let params = ForcingParameters {
            time_constants: vec![1.0],
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_forcing_rejects_non_finite_values() {
        let nan_tau = ForcingParameters {
            time_constants: vec![421.093, f64::NAN, 21.4216, 3.4154],
            ..Default::default()
        };
        assert!(matches!(
            nan_tau.validate(),
            Err(FlowError::InvalidParameter {
                name: "time_constants",
                ..
            })
        ));

        let infinite_weight = ForcingParameters {
            weights: vec![0.1375, f64::INFINITY, 0.2423, 0.2589],
            ..Default::default()
        };
        assert!(matches!(
            infinite_weight.validate(),
            Err(FlowError::InvalidParameter { name: "weights", .. })
        ));
    }
}
