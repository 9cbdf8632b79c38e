//! Analyses exposed by the command line
//!
//! Each analysis reads its inputs as described by a [`ScenarioConfig`],
//! writes CSV and SVG files to the configured output directory and returns
//! the paths it wrote.

use crate::config::{PlaceLogs, ScenarioConfig};
use crate::plot::{self, Panel};
use crate::report::{write_json, write_series_csv};
use anyhow::{Context, Result};
use cpnflow_core::amc::{AbsorbingChain, ChainSummary};
use cpnflow_core::cfa::CountLog;
use cpnflow_core::forcing::Co2ImpulseResponse;
use cpnflow_core::mfa::FlowConvergenceSolver;
use cpnflow_core::{MfaSolution, TimeGrid};
use ndarray::{Array1, ArrayView1};
use std::path::{Path, PathBuf};
use tracing::info;

/// Material-flow solution together with the grid it was solved on.
pub struct MfaRun {
    pub grid: TimeGrid,
    pub solution: MfaSolution,
}

pub fn solve_mfa(config: &ScenarioConfig) -> Result<MfaRun> {
    let grid = config.grid.time_grid()?;
    info!(
        points = grid.len(),
        dt = grid.dt(),
        mu = config.mfa.mu,
        sigma = config.mfa.sigma,
        "Solving material-flow model"
    );
    let solution = FlowConvergenceSolver::from_parameters(config.mfa.clone())
        .solve(&grid)
        .context("solving the material-flow model")?;
    Ok(MfaRun { grid, solution })
}

/// Counting-based estimate of one log, in physical units, on the grid.
fn load_counts(path: &Path, config: &ScenarioConfig) -> Result<Array1<f64>> {
    let log = CountLog::read(path)?;
    let n = config.grid.points()?;
    if log.len() < n {
        info!(
            path = %path.display(),
            rows = log.len(),
            points = n,
            "Log is shorter than the grid; padding with zeros"
        );
    }
    Ok(log.scaled(n, config.tokens_per_unit)?)
}

struct PlaceSeries {
    reentrances: Array1<f64>,
    occupancy: Array1<f64>,
}

impl PlaceSeries {
    fn load(logs: &PlaceLogs, config: &ScenarioConfig) -> Result<Self> {
        Ok(Self {
            reentrances: load_counts(&logs.reentrances, config)
                .with_context(|| format!("loading reentrances of {}", logs.name))?,
            occupancy: load_counts(&logs.occupancy, config)
                .with_context(|| format!("loading occupancy of {}", logs.name))?,
        })
    }
}

/// File-name friendly version of a label.
fn slug(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    slug.trim_matches('_').to_string()
}

/// Solve the material-flow model and report every flow and stock.
pub fn run_mfa(config: &ScenarioConfig) -> Result<Vec<PathBuf>> {
    let MfaRun { grid, solution } = solve_mfa(config)?;
    let times = grid.values();

    let csv_path = config.output_path("mfa.csv");
    write_series_csv(&csv_path, times, &solution.series())?;

    let status_path = config.output_path("mfa_status.json");
    write_json(&status_path, &solution.status)?;

    let unit = &config.quantity_unit;
    let svg_path = config.output_path("mfa.svg");
    let panels = [
        Panel::new(config.time_label(), format!("Reentry ({unit})")).with_line(
            "MFA (I_R)",
            solution.i_r.view(),
            plot::MFA,
        ),
        Panel::new(config.time_label(), format!("Occupancy ({unit})")).with_line(
            "MFA (K_U)",
            solution.k_u.view(),
            plot::MFA,
        ),
    ];
    plot::render(&svg_path, times, &panels, (2, 1))?;

    Ok(vec![csv_path, status_path, svg_path])
}

/// Plot reentries and occupancy of every configured place.
pub fn run_cfa(config: &ScenarioConfig) -> Result<Vec<PathBuf>> {
    let grid = config.grid.time_grid()?;
    let times = grid.values();
    let unit = &config.quantity_unit;
    let mut written = Vec::new();

    for place in &config.places {
        let series = PlaceSeries::load(place, config)?;
        let name = slug(&place.name);
        let label = capitalise(&place.name);

        let csv_path = config.output_path(&format!("{name}_cfa.csv"));
        write_series_csv(
            &csv_path,
            times,
            &[
                ("reentrances", series.reentrances.view()),
                ("occupancy", series.occupancy.view()),
            ],
        )?;

        let svg_path = config.output_path(&format!("{name}_cfa.svg"));
        let panels = [
            Panel::new(config.time_label(), format!("{label} Reentries ({unit})")).with_line(
                "CPN (r)",
                series.reentrances.view(),
                plot::CPN_RANDOM,
            ),
            Panel::new(config.time_label(), format!("{label} Occupancy ({unit})")).with_line(
                "CPN (r)",
                series.occupancy.view(),
                plot::CPN_RANDOM,
            ),
        ];
        plot::render(&svg_path, times, &panels, (1, 2))?;

        info!(place = %place.name, "Wrote counting-based report");
        written.push(csv_path);
        written.push(svg_path);
    }
    Ok(written)
}

fn capitalise(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Compare counting-based runs against the material-flow model.
pub fn run_compare(config: &ScenarioConfig) -> Result<Vec<PathBuf>> {
    let MfaRun { grid, solution } = solve_mfa(config)?;
    let times = grid.values();
    let unit = &config.quantity_unit;

    let runs = config
        .runs
        .iter()
        .map(|run| PlaceSeries::load(run, config))
        .collect::<Result<Vec<_>>>()?;

    let mut reentry = Panel::new(config.time_label(), format!("Reentry ({unit})"));
    let mut occupancy = Panel::new(config.time_label(), format!("Occupancy ({unit})"));
    let reentry_labels: Vec<String> =
        config.runs.iter().map(|r| format!("I_R {}", r.name)).collect();
    let occupancy_labels: Vec<String> =
        config.runs.iter().map(|r| format!("K_U {}", r.name)).collect();
    let mut columns: Vec<(&str, ArrayView1<f64>)> = vec![
        ("I_R MFA", solution.i_r.view()),
        ("K_U MFA", solution.k_u.view()),
    ];

    for (i, (run, series)) in config.runs.iter().zip(&runs).enumerate() {
        let color = plot::RUN_PALETTE[i % plot::RUN_PALETTE.len()];
        reentry = reentry.with_line(run.name.as_str(), series.reentrances.view(), color);
        occupancy = occupancy.with_line(run.name.as_str(), series.occupancy.view(), color);
        columns.push((reentry_labels[i].as_str(), series.reentrances.view()));
        columns.push((occupancy_labels[i].as_str(), series.occupancy.view()));
    }
    reentry = reentry.with_dashed_line("MFA (I_R)", solution.i_r.view(), plot::MFA);
    occupancy = occupancy.with_dashed_line("MFA (K_U)", solution.k_u.view(), plot::MFA);

    let csv_path = config.output_path("cfa_mfa.csv");
    write_series_csv(&csv_path, times, &columns)?;

    let svg_path = config.output_path("cfa_mfa.svg");
    plot::render(&svg_path, times, &[reentry, occupancy], (2, 1))?;

    for (run, series) in config.runs.iter().zip(&runs) {
        info!(
            run = %run.name,
            reentrances = series.reentrances.sum(),
            mfa = solution.i_r.sum(),
            "Total recycling inflow"
        );
    }
    Ok(vec![csv_path, svg_path])
}

/// Recycling inflow and its radiative forcing for both estimates.
pub fn run_lca(config: &ScenarioConfig) -> Result<Vec<PathBuf>> {
    let log = config
        .lca_log
        .as_deref()
        .context("the scenario has no `lca_log` to analyse")?;
    let MfaRun { grid, solution } = solve_mfa(config)?;
    let times = grid.values();

    let i_r_cfa = load_counts(log, config)?;
    let irf = Co2ImpulseResponse::from_parameters(config.forcing.clone())?;
    let forcing_mfa = irf.forcing(solution.i_r.view(), &grid)?;
    let forcing_cfa = irf.forcing(i_r_cfa.view(), &grid)?;

    let csv_path = config.output_path("dynamic_lca.csv");
    write_series_csv(
        &csv_path,
        times,
        &[
            ("I_R CFA", i_r_cfa.view()),
            ("I_R MFA", solution.i_r.view()),
            ("RF CFA", forcing_cfa.view()),
            ("RF MFA", forcing_mfa.view()),
        ],
    )?;

    let svg_path = config.output_path("dynamic_lca.svg");
    let panels = [
        Panel::new(config.time_label(), "Reentry")
            .with_line("CFA", i_r_cfa.view(), plot::CPN_RANDOM)
            .with_dashed_line("MFA", solution.i_r.view(), plot::MFA),
        Panel::new(config.time_label(), "Radiative forcing")
            .with_line("CFA", forcing_cfa.view(), plot::CPN_RANDOM)
            .with_dashed_line("MFA", forcing_mfa.view(), plot::MFA),
    ];
    plot::render(&svg_path, times, &panels, (2, 1))?;

    Ok(vec![csv_path, svg_path])
}

/// Closed-form absorbing chain summary of the configured flow fractions.
pub fn run_amc(config: &ScenarioConfig) -> Result<(ChainSummary, PathBuf)> {
    let chain = AbsorbingChain::from_fractions(&config.mfa.fractions)?;
    let summary = chain.summarise(config.mfa.total_tons, config.mfa.mu)?;

    let path = config.output_path("amc.json");
    write_json(&path, &summary)?;
    Ok((summary, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug() {
        assert_eq!(slug("CPN (r)"), "cpn__r");
        assert_eq!(slug("use"), "use");
    }

    #[test]
    fn test_capitalise() {
        assert_eq!(capitalise("repair"), "Repair");
        assert_eq!(capitalise(""), "");
    }
}
