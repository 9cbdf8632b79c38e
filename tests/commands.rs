//! End-to-end runs of every analysis on a small synthetic scenario.

use approx::assert_relative_eq;
use cpnflow::commands::{run_amc, run_cfa, run_compare, run_lca, run_mfa, solve_mfa};
use cpnflow::config::{GridConfig, PlaceLogs, ScenarioConfig};
use cpnflow_core::cfa::CountLog;
use cpnflow_core::parameters::MfaParameters;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const POINTS: usize = 24;

fn write_log(path: &Path, counts: Vec<u64>) {
    CountLog::from_counts(counts).write(path).unwrap();
}

fn scenario(dir: &TempDir) -> ScenarioConfig {
    let logs = dir.path().join("logs");
    let ramp: Vec<u64> = (0..POINTS as u64).map(|t| 8 * t).collect();
    // Shorter than the grid on purpose
    let short: Vec<u64> = vec![80; POINTS / 2];

    let random = PlaceLogs {
        name: "CPN (r)".to_string(),
        reentrances: logs.join("random/recycling/plastic/reentrances.csv"),
        occupancy: logs.join("random/use/plastic/occupency.csv"),
    };
    let constant = PlaceLogs {
        name: "CPN (c)".to_string(),
        reentrances: logs.join("constant/recycling/plastic/reentrances.csv"),
        occupancy: logs.join("constant/use/plastic/occupency.csv"),
    };
    write_log(&random.reentrances, ramp.clone());
    write_log(&random.occupancy, ramp);
    write_log(&constant.reentrances, short.clone());
    write_log(&constant.occupancy, short);

    ScenarioConfig {
        grid: GridConfig {
            t_max: 12,
            points_per_unit: 2,
        },
        output_dir: dir.path().join("outputs"),
        places: vec![PlaceLogs {
            name: "use".to_string(),
            ..random.clone()
        }],
        lca_log: Some(random.reentrances.clone()),
        runs: vec![constant, random],
        mfa: MfaParameters {
            total_tons: 1000.0,
            max_iterations: 50,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn assert_written(paths: &[PathBuf]) {
    for path in paths {
        let meta = fs::metadata(path).unwrap_or_else(|_| panic!("{} missing", path.display()));
        assert!(meta.len() > 0, "{} is empty", path.display());
    }
}

#[test]
fn test_mfa_report() {
    let dir = TempDir::new().unwrap();
    let config = scenario(&dir);

    let written = run_mfa(&config).unwrap();
    assert_written(&written);

    let csv = fs::read_to_string(config.output_path("mfa.csv")).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "time,O_P,O_U,I_R,O_R,I_I,I_D,I_U,dK,K_U"
    );
    assert_eq!(lines.count(), POINTS);

    let status: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(config.output_path("mfa_status.json")).unwrap())
            .unwrap();
    assert_eq!(status["converged"], serde_json::Value::Bool(true));
}

#[test]
fn test_cfa_report() {
    let dir = TempDir::new().unwrap();
    let config = scenario(&dir);

    let written = run_cfa(&config).unwrap();
    assert_eq!(written.len(), 2);
    assert_written(&written);

    let csv = fs::read_to_string(config.output_path("use_cfa.csv")).unwrap();
    // 8 tokens per ton
    assert!(csv.lines().nth(2).unwrap().ends_with(",1,1"));
}

#[test]
fn test_compare_report() {
    let dir = TempDir::new().unwrap();
    let config = scenario(&dir);

    let written = run_compare(&config).unwrap();
    assert_written(&written);

    let csv = fs::read_to_string(config.output_path("cfa_mfa.csv")).unwrap();
    let header = csv.lines().next().unwrap();
    assert_eq!(
        header,
        "time,I_R MFA,K_U MFA,I_R CPN (c),K_U CPN (c),I_R CPN (r),K_U CPN (r)"
    );
    // The constant run is padded with zeros past the end of its log
    let last = csv.lines().last().unwrap();
    let fields: Vec<&str> = last.split(',').collect();
    assert_eq!(fields[3], "0");
}

#[test]
fn test_lca_report() {
    let dir = TempDir::new().unwrap();
    let config = scenario(&dir);

    let written = run_lca(&config).unwrap();
    assert_written(&written);

    let csv = fs::read_to_string(config.output_path("dynamic_lca.csv")).unwrap();
    let first_row: Vec<f64> = csv
        .lines()
        .nth(1)
        .unwrap()
        .split(',')
        .map(|v| v.parse().unwrap())
        .collect();
    // Nothing has been emitted before the first step
    assert_eq!(first_row[3], 0.0);
    assert_eq!(first_row[4], 0.0);
}

#[test]
fn test_lca_requires_log() {
    let dir = TempDir::new().unwrap();
    let config = ScenarioConfig {
        lca_log: None,
        ..scenario(&dir)
    };
    let err = run_lca(&config).unwrap_err();
    assert!(err.to_string().contains("lca_log"));
}

#[test]
fn test_missing_log_is_reported() {
    let dir = TempDir::new().unwrap();
    let mut config = scenario(&dir);
    config.runs[0].occupancy = dir.path().join("nope.csv");

    let err = run_compare(&config).unwrap_err();
    assert!(format!("{err:#}").contains("CPN (c)"));
}

#[test]
fn test_amc_summary() {
    let dir = TempDir::new().unwrap();
    let config = scenario(&dir);

    let (summary, path) = run_amc(&config).unwrap();
    assert!(path.exists());
    assert_relative_eq!(summary.expected_time_in_use, 12.5, epsilon = 1e-9);
}

#[test]
fn test_solve_uses_scenario_grid() {
    let dir = TempDir::new().unwrap();
    let config = scenario(&dir);
    let run = solve_mfa(&config).unwrap();
    assert_eq!(run.grid.len(), POINTS);
    assert_eq!(run.solution.len(), POINTS);
}
