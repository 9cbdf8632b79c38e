//! Uniform time grids
//!
//! Every series in this crate is sampled on a [`TimeGrid`]: an ordered,
//! strictly increasing and uniformly spaced sequence of time points. The
//! grid spacing `dt` is taken from the first two points and is used to turn
//! the continuous convolution integrals into discrete sums.

use crate::errors::{FlowError, FlowResult};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Relative tolerance used when checking that grid spacing is uniform.
const SPACING_RTOL: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct TimeGrid {
    values: Array1<f64>,
}

impl TimeGrid {
    /// Create a grid from explicit time points.
    ///
    /// Fails with [`FlowError::InvalidInput`] if there are fewer than two
    /// points, any point is not finite, or the spacing is not strictly
    /// positive and uniform.
    pub fn new(values: Array1<f64>) -> FlowResult<Self> {
        if values.len() < 2 {
            return Err(FlowError::InvalidInput(format!(
                "time grid needs at least 2 points, got {}",
                values.len()
            )));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(FlowError::InvalidInput(format!(
                "time grid contains a non-finite value ({bad})"
            )));
        }

        let dt = values[1] - values[0];
        if dt <= 0.0 {
            return Err(FlowError::InvalidInput(format!(
                "time grid must be strictly increasing (first step is {dt})"
            )));
        }
        for (i, pair) in values.windows(2).into_iter().enumerate() {
            let step = pair[1] - pair[0];
            if (step - dt).abs() > SPACING_RTOL * dt {
                return Err(FlowError::InvalidInput(format!(
                    "time grid must be uniformly spaced: step {} is {step}, expected {dt}",
                    i
                )));
            }
        }

        Ok(Self { values })
    }

    /// `n` evenly spaced points from `start` to `stop`, both included.
    pub fn linspace(start: f64, stop: f64, n: usize) -> FlowResult<Self> {
        if n < 2 {
            return Err(FlowError::InvalidInput(format!(
                "time grid needs at least 2 points, got {n}"
            )));
        }
        Self::new(Array1::linspace(start, stop, n))
    }

    /// Grid covering `[0, t_max]` with `points_per_unit` samples per time unit.
    ///
    /// The number of points is `t_max * points_per_unit`, so the resulting
    /// spacing is slightly larger than `1 / points_per_unit`.
    pub fn from_horizon(t_max: usize, points_per_unit: usize) -> FlowResult<Self> {
        let n = t_max.checked_mul(points_per_unit).ok_or_else(|| {
            FlowError::InvalidInput(format!(
                "{t_max} units at {points_per_unit} points per unit overflows the grid size"
            ))
        })?;
        Self::linspace(0.0, t_max as f64, n)
    }

    /// Grid spacing
    pub fn dt(&self) -> f64 {
        self.values[1] - self.values[0]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> ArrayView1<'_, f64> {
        self.values.view()
    }

    pub fn first(&self) -> f64 {
        self.values[0]
    }

    pub fn last(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    /// Number of grid points strictly before `time`.
    pub fn count_before(&self, time: f64) -> usize {
        self.values.iter().filter(|&&t| t < time).count()
    }

    /// Index of the grid point closest to `time`.
    pub fn nearest_index(&self, time: f64) -> usize {
        let idx = ((time - self.first()) / self.dt()).round();
        idx.clamp(0.0, (self.len() - 1) as f64) as usize
    }

    /// Map a function over every grid point.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Array1<f64> {
        self.values.mapv(f)
    }
}

impl TryFrom<Vec<f64>> for TimeGrid {
    type Error = FlowError;

    fn try_from(values: Vec<f64>) -> FlowResult<Self> {
        Self::new(Array1::from(values))
    }
}

impl From<TimeGrid> for Vec<f64> {
    fn from(grid: TimeGrid) -> Self {
        grid.values.to_vec()
    }
}
