//! Behavioural tests of the material-flow solver.
//!
//! These tests check properties that hold for any well-posed input:
//! - output shapes and determinism
//! - causality and sensitivity to time ordering
//! - linearity in the size of the injected pulse
//! - convergence behaviour of the fixed-point iteration

use approx::assert_relative_eq;
use cpnflow_core::mfa::{cumulative_stock, mfa, FlowConvergenceSolver};
use cpnflow_core::parameters::MfaParameters;
use cpnflow_core::{FlowError, TimeGrid};
use ndarray::Array1;

fn scenario_grid() -> TimeGrid {
    TimeGrid::linspace(0.0, 12.0, 20).unwrap()
}

fn scenario_parameters() -> MfaParameters {
    MfaParameters {
        mu: 8.0,
        sigma: 2.0,
        total_tons: 1000.0,
        max_iterations: 50,
        ..Default::default()
    }
}

mod shapes_and_determinism {
    use super::*;

    #[test]
    fn test_zero_pulse_converges_immediately() {
        let params = MfaParameters {
            total_tons: 0.0,
            ..scenario_parameters()
        };
        let solution = FlowConvergenceSolver::from_parameters(params)
            .solve(&scenario_grid())
            .unwrap();

        assert!(solution.status.converged);
        assert_eq!(solution.status.iterations, 1);
        assert_eq!(solution.status.residual, 0.0);
        assert!(solution.i_r.iter().all(|&v| v == 0.0));
        assert!(solution.k_u.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_outputs_match_grid_length() {
        for n in [2, 5, 20, 57] {
            let grid = TimeGrid::linspace(0.0, 15.0, n).unwrap();
            let (i_r, k_u) = mfa(&grid, &scenario_parameters()).unwrap();
            assert_eq!(i_r.len(), n);
            assert_eq!(k_u.len(), n);
        }
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let grid = scenario_grid();
        let first = mfa(&grid, &scenario_parameters()).unwrap();
        let second = mfa(&grid, &scenario_parameters()).unwrap();
        assert_eq!(first, second);
    }
}

mod ordering {
    use super::*;

    #[test]
    fn test_reversed_grid_is_rejected() {
        let reversed: Vec<f64> = scenario_grid().values().iter().rev().copied().collect();
        let err = TimeGrid::new(Array1::from(reversed)).unwrap_err();
        assert!(matches!(err, FlowError::InvalidInput(_)));
    }

    #[test]
    fn test_permuted_grid_is_rejected() {
        let mut values = scenario_grid().values().to_vec();
        values.swap(3, 7);
        assert!(TimeGrid::new(Array1::from(values)).is_err());
    }

    #[test]
    fn test_shifting_the_grid_changes_results() {
        let params = scenario_parameters();
        let (forward, _) = mfa(&scenario_grid(), &params).unwrap();
        let shifted = TimeGrid::linspace(-0.5, 11.5, 20).unwrap();
        let (later, _) = mfa(&shifted, &params).unwrap();
        assert_ne!(forward, later);
    }
}

mod scenario {
    use super::*;

    #[test]
    fn test_twenty_point_scenario() {
        let grid = scenario_grid();
        assert_relative_eq!(grid.dt(), 12.0 / 19.0, epsilon = 1e-12);

        let solution = FlowConvergenceSolver::from_parameters(scenario_parameters())
            .solve(&grid)
            .unwrap();
        assert!(solution.status.iterations <= 50);
        assert!(solution.status.converged);

        let recycled: f64 = solution.i_r.sum();
        assert!(recycled > 0.0);
        assert!(recycled < 0.07 * 1000.0);

        // The stock fills during the pulse before anything leaves
        let k_u = &solution.k_u;
        assert_eq!(k_u[0], 0.0);
        for t in 1..3 {
            assert!(k_u[t] >= k_u[t - 1], "K_U decreased at {t}: {k_u}");
        }
        assert_relative_eq!(k_u[2], 1000.0, epsilon = 1e-9);
        // Only the far left tail of the lifetime has been reached
        for t in 3..5 {
            assert_relative_eq!(k_u[t], 1000.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_outputs_scale_with_pulse() {
        let grid = scenario_grid();
        let base = scenario_parameters();
        let scaled = MfaParameters {
            total_tons: 3.0 * base.total_tons,
            ..base.clone()
        };

        let (i_r, k_u) = mfa(&grid, &base).unwrap();
        let (i_r_scaled, k_u_scaled) = mfa(&grid, &scaled).unwrap();

        for (a, b) in i_r.iter().zip(i_r_scaled.iter()) {
            assert_relative_eq!(3.0 * a, *b, max_relative = 1e-9, epsilon = 1e-12);
        }
        for (a, b) in k_u.iter().zip(k_u_scaled.iter()) {
            assert_relative_eq!(3.0 * a, *b, max_relative = 1e-9, epsilon = 1e-9);
        }
    }
}

mod convergence {
    use super::*;

    #[test]
    fn test_residuals_trend_downwards() {
        let params = MfaParameters {
            total_tons: 1_798_940.0,
            max_iterations: 100,
            ..scenario_parameters()
        };
        let grid = TimeGrid::from_horizon(40, 4).unwrap();
        let solution = FlowConvergenceSolver::from_parameters(params)
            .solve(&grid)
            .unwrap();
        let history = &solution.residual_history;

        assert!(solution.status.converged);
        assert!(history.len() >= 3);
        for window in history.windows(2) {
            assert!(
                window[1] <= window[0],
                "residual increased: {:?}",
                history
            );
        }
    }

    #[test]
    fn test_tight_iteration_cap_keeps_last_iterate() {
        let grid = scenario_grid();
        let capped = MfaParameters {
            max_iterations: 1,
            ..scenario_parameters()
        };
        let first_sweep = FlowConvergenceSolver::from_parameters(capped)
            .solve(&grid)
            .unwrap();

        assert!(!first_sweep.status.converged);
        assert_eq!(first_sweep.status.iterations, 1);
        assert!(first_sweep.o_u.iter().any(|&v| v > 0.0));
    }
}

mod stock {
    use super::*;

    fn quadratic_stock(dk: &Array1<f64>) -> Array1<f64> {
        (0..dk.len())
            .map(|t| dk.iter().take(t).sum::<f64>())
            .collect()
    }

    #[test]
    fn test_running_total_matches_prefix_sums() {
        let solution = FlowConvergenceSolver::from_parameters(scenario_parameters())
            .solve(&scenario_grid())
            .unwrap();

        let reference = quadratic_stock(&solution.dk);
        let fast = cumulative_stock(solution.dk.view());
        for (a, b) in fast.iter().zip(reference.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9, max_relative = 1e-12);
        }
        assert_eq!(fast, solution.k_u);
    }
}
