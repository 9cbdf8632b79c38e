//! Scenario configuration
//!
//! A scenario describes the analysed horizon, where the simulator logs live
//! and the parameters of the material-flow model. Scenarios are read from
//! TOML; every field is optional and defaults to the plastic recycling case
//! study.

use anyhow::{Context, Result};
use cpnflow_core::parameters::{ForcingParameters, MfaParameters};
use cpnflow_core::TimeGrid;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Observation horizon: `t_max * points_per_unit` points over `[0, t_max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub t_max: usize,
    pub points_per_unit: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            t_max: 110,
            points_per_unit: 10,
        }
    }
}

impl GridConfig {
    pub fn time_grid(&self) -> Result<TimeGrid> {
        TimeGrid::from_horizon(self.t_max, self.points_per_unit)
            .context("building the observation grid")
    }

    /// Number of grid points, `t_max * points_per_unit`.
    pub fn points(&self) -> Result<usize> {
        self.t_max
            .checked_mul(self.points_per_unit)
            .with_context(|| {
                format!(
                    "grid of {} units at {} points per unit is too large",
                    self.t_max, self.points_per_unit
                )
            })
    }
}

/// Reentrance and occupancy logs of one place of the Petri net.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceLogs {
    /// Label used in file names and legends
    pub name: String,
    pub reentrances: PathBuf,
    pub occupancy: PathBuf,
}

impl PlaceLogs {
    fn under(name: &str, root: &str, place: &str) -> Self {
        let dir = Path::new(root).join(place);
        Self {
            name: name.to_string(),
            reentrances: dir.join("reentrances.csv"),
            occupancy: dir.join("occupency.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub grid: GridConfig,
    /// Number of simulator tokens representing one unit of material
    pub tokens_per_unit: f64,
    pub time_unit: String,
    pub quantity_unit: String,
    pub output_dir: PathBuf,
    /// Places plotted by the `cfa` command
    pub places: Vec<PlaceLogs>,
    /// Simulation runs compared against the material-flow model
    pub runs: Vec<PlaceLogs>,
    /// Recycling reentrances used for the dynamic LCA
    pub lca_log: Option<PathBuf>,
    pub mfa: MfaParameters,
    pub forcing: ForcingParameters,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        let random = "logs/random";
        let constant = "logs/constant";
        Self {
            grid: GridConfig::default(),
            tokens_per_unit: 8.0,
            time_unit: "year".to_string(),
            quantity_unit: "ton".to_string(),
            output_dir: PathBuf::from("outputs"),
            places: vec![PlaceLogs::under("use", random, "use/plastic")],
            runs: vec![
                PlaceLogs {
                    name: "CPN (c)".to_string(),
                    reentrances: Path::new(constant).join("recycling/plastic/reentrances.csv"),
                    occupancy: Path::new(constant).join("use/plastic/occupency.csv"),
                },
                PlaceLogs {
                    name: "CPN (r)".to_string(),
                    reentrances: Path::new(random).join("recycling/plastic/reentrances.csv"),
                    occupancy: Path::new(random).join("use/plastic/occupency.csv"),
                },
            ],
            lca_log: Some(Path::new(random).join("recycling/plastic/reentrances.csv")),
            mfa: MfaParameters::default(),
            forcing: ForcingParameters::default(),
        }
    }
}

impl ScenarioConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("parsing scenario")?;
        config.validate()?;
        Ok(config)
    }

    /// Load a scenario file.
    ///
    /// Relative log paths and output directory are resolved against the
    /// directory containing the file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        let mut config = Self::from_toml_str(&text)
            .with_context(|| format!("loading scenario {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.tokens_per_unit.is_finite() && self.tokens_per_unit > 0.0,
            "tokens_per_unit must be > 0, got {}",
            self.tokens_per_unit
        );
        let points = self.grid.points()?;
        anyhow::ensure!(
            points >= 2,
            "the grid needs at least two points, got {points}"
        );
        self.mfa.validate()?;
        self.forcing.validate()?;
        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.output_dir);
        for logs in self.places.iter_mut().chain(self.runs.iter_mut()) {
            resolve(&mut logs.reentrances);
            resolve(&mut logs.occupancy);
        }
        if let Some(lca_log) = self.lca_log.as_mut() {
            resolve(lca_log);
        }
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    pub fn time_label(&self) -> String {
        format!("Time ({})", self.time_unit)
    }
}
