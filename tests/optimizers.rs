use std::cell::RefCell;

use argmin::core::{CostFunction, Error, Executor};
use argmin::solver::neldermead::NelderMead as ArgminNelderMead;
use eyre::Result;
use ndarray::{array, Array1};
use nmcore::prelude::*;

fn rosenbrock(x: &Array1<f64>) -> f64 {
    (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2)
}

fn rosenbrock_bounds() -> Bounds {
    Bounds::from_ranges(&[(-10.0, 10.0), (-10.0, 10.0)]).unwrap()
}

/// Rosenbrock from the classical starting point converges to (1, 1)
#[test]
fn test_rosenbrock_converges() -> Result<()> {
    let config = Config::new(2)
        .with_tolerance(1e-8)
        .with_max_evaluations(10_000);
    let outcome = NelderMead::new(config).minimize(&rosenbrock, &rosenbrock_bounds(), &array![-1.2, 1.0])?;

    assert!(outcome.converged());
    assert!(outcome.signed_nfev() > 0);
    assert!(outcome.value() < 1e-6, "value {}", outcome.value());
    assert!((outcome.point()[0] - 1.0).abs() < 1e-3);
    assert!((outcome.point()[1] - 1.0).abs() < 1e-3);
    assert!(outcome.nfev() <= 10_000);
    Ok(())
}

/// A tiny budget stops the run with a negative evaluation count
#[test]
fn test_budget_exceeded() -> Result<()> {
    let bounds = rosenbrock_bounds();
    let config = Config::new(2).with_max_evaluations(10);
    let outcome = NelderMead::new(config).minimize(&rosenbrock, &bounds, &array![-1.2, 1.0])?;

    assert_eq!(outcome.status(), Status::BudgetExceeded);
    assert_eq!(outcome.nfev(), 10);
    assert_eq!(outcome.signed_nfev(), -10);
    assert!(bounds.is_feasible(&outcome.point().view()));
    assert!(outcome.value() <= rosenbrock(&array![-1.2, 1.0]));
    Ok(())
}

/// The minimum of x^2 on [5, 10] sits on the lower bound
#[test]
fn test_minimum_on_the_boundary() -> Result<()> {
    let bounds = Bounds::from_ranges(&[(5.0, 10.0)])?;
    let outcome = NelderMead::new(Config::new(1)).minimize(
        &|x: &Array1<f64>| x[0] * x[0],
        &bounds,
        &array![5.0],
    )?;

    assert!(outcome.converged());
    assert_eq!(outcome.point()[0], 5.0);
    assert_eq!(outcome.value(), 25.0);
    assert!(outcome.collapsed());
    Ok(())
}

/// A start on a bound of a box narrower than the step still explores the box
#[test]
fn test_start_on_bound_of_narrow_box() -> Result<()> {
    let bounds = Bounds::from_ranges(&[(5.0, 6.0)])?;
    let outcome = NelderMead::new(Config::new(1)).minimize(
        &|x: &Array1<f64>| (x[0] - 5.5).powi(2),
        &bounds,
        &array![5.0],
    )?;
    assert!(outcome.converged());
    assert!((outcome.point()[0] - 5.5).abs() < 1e-4, "point {}", outcome.point());
    assert!(outcome.value() < 1e-8);
    assert!(!outcome.collapsed());

    let bounds = Bounds::from_ranges(&[(0.0, 1.0), (0.0, 1.0)])?;
    let outcome = NelderMead::new(Config::new(2)).minimize(
        &|x: &Array1<f64>| (x[0] - 0.5).powi(2) + (x[1] - 0.5).powi(2),
        &bounds,
        &array![0.0, 0.0],
    )?;
    assert!(outcome.converged());
    assert!((outcome.point()[0] - 0.5).abs() < 1e-4);
    assert!((outcome.point()[1] - 0.5).abs() < 1e-4);
    Ok(())
}

/// Adding a constant to the objective does not change where the run stops
#[test]
fn test_constant_offset_does_not_stop_early() -> Result<()> {
    let bowl = |x: &Array1<f64>| (x[0] - 3.0).powi(2) + (x[1] + 1.0).powi(2);
    let shifted = |x: &Array1<f64>| 1e9 + bowl(x);
    let bounds = Bounds::unbounded(2)?;
    let optimizer = NelderMead::new(Config::new(2).with_final_simplex(FinalSimplex::Loose));

    let plain = optimizer.minimize(&bowl, &bounds, &array![0.0, 0.0])?;
    let offset = optimizer.minimize(&shifted, &bounds, &array![0.0, 0.0])?;

    assert!(plain.converged() && offset.converged());
    assert!(offset.iterations() > 0);
    for outcome in [&plain, &offset] {
        assert!((outcome.point()[0] - 3.0).abs() < 1e-2, "point {}", outcome.point());
        assert!((outcome.point()[1] + 1.0).abs() < 1e-2, "point {}", outcome.point());
    }
    assert!((plain.point() - offset.point()).mapv(f64::abs).sum() < 2e-2);
    Ok(())
}

/// Every point handed to the objective is feasible, and every call is counted
#[test]
fn test_objective_only_sees_feasible_points() -> Result<()> {
    let bounds = Bounds::from_ranges(&[(0.5, 3.0), (-1.0, 0.5)])?;
    let seen = RefCell::new(Vec::new());
    let objective = |x: &Array1<f64>| {
        seen.borrow_mut().push(x.clone());
        rosenbrock(x)
    };

    // The starting point is outside the box on both axes
    let outcome = NelderMead::new(Config::new(2)).minimize(&objective, &bounds, &array![-4.0, 2.0])?;

    let seen = seen.into_inner();
    assert_eq!(seen.len(), outcome.nfev());
    assert!(seen.iter().all(|x| bounds.is_feasible(&x.view())));
    assert!(bounds.is_feasible(&outcome.point().view()));
    assert_eq!(seen[0], array![0.5, 0.5]);
    Ok(())
}

/// Two identical runs produce identical outcomes
#[test]
fn test_determinism() -> Result<()> {
    let config = Config::new(2)
        .with_init_simplex(InitSimplex::Regular)
        .with_final_simplex(FinalSimplex::Strict)
        .with_trace(true);
    let optimizer = NelderMead::new(config);
    let first = optimizer.minimize(&rosenbrock, &rosenbrock_bounds(), &array![-1.2, 1.0])?;
    let second = optimizer.minimize(&rosenbrock, &rosenbrock_bounds(), &array![-1.2, 1.0])?;
    assert_eq!(first, second);
    Ok(())
}

/// A stricter tier never stops earlier than a looser one
#[test]
fn test_stricter_tier_spends_more() -> Result<()> {
    let run = |tier: FinalSimplex| {
        let config = Config::new(2).with_final_simplex(tier);
        NelderMead::new(config).minimize(&rosenbrock, &rosenbrock_bounds(), &array![-1.2, 1.0])
    };
    let loose = run(FinalSimplex::Loose)?;
    let standard = run(FinalSimplex::Standard)?;
    let strict = run(FinalSimplex::Strict)?;

    assert!(loose.converged() && standard.converged() && strict.converged());
    assert!(standard.nfev() >= loose.nfev());
    assert!(strict.nfev() >= standard.nfev());
    Ok(())
}

/// A parameter with equal lower and upper bounds never moves
#[test]
fn test_fixed_parameter() -> Result<()> {
    let bounds = Bounds::from_ranges(&[(2.0, 2.0), (-5.0, 5.0)])?;
    let objective = |x: &Array1<f64>| (x[0] - 1.0).powi(2) + (x[1] - 3.0).powi(2);
    let outcome = NelderMead::new(Config::new(2)).minimize(&objective, &bounds, &array![2.0, 0.0])?;

    assert!(outcome.converged());
    assert_eq!(outcome.point()[0], 2.0);
    assert!((outcome.point()[1] - 3.0).abs() < 1e-3);
    Ok(())
}

/// NaN values are treated as +inf and steered away from
#[test]
fn test_nan_region_is_avoided() -> Result<()> {
    let objective = |x: &Array1<f64>| {
        if x[0] < 0.0 {
            f64::NAN
        } else {
            (x[0] - 1.0).powi(2)
        }
    };
    let bounds = Bounds::unbounded(1)?;
    let outcome = NelderMead::new(Config::new(1)).minimize(&objective, &bounds, &array![0.2])?;

    assert!(outcome.converged());
    assert!((outcome.point()[0] - 1.0).abs() < 1e-3);
    assert!(outcome.value().is_finite());
    assert!(outcome.nan_evaluations() > 0);
    assert!(outcome.nan_evaluations() < outcome.nfev());
    Ok(())
}

/// Parallel batch evaluation does not change the result
#[test]
fn test_parallel_matches_sequential() -> Result<()> {
    let config = Config::new(2).with_init_simplex(InitSimplex::Regular).with_trace(true);
    let optimizer = NelderMead::new(config);
    let sequential = optimizer.minimize(&rosenbrock, &rosenbrock_bounds(), &array![-1.2, 1.0])?;
    let parallel = optimizer.minimize_par(&rosenbrock, &rosenbrock_bounds(), &array![-1.2, 1.0])?;
    assert_eq!(sequential, parallel);
    Ok(())
}

/// Invalid input is rejected before the objective is called
#[test]
fn test_config_errors_do_not_evaluate() {
    let calls = RefCell::new(0);
    let objective = |x: &Array1<f64>| {
        *calls.borrow_mut() += 1;
        x.sum()
    };
    let bounds = rosenbrock_bounds();

    let err = NelderMead::new(Config::new(2))
        .minimize(&objective, &bounds, &array![1.0, 2.0, 3.0])
        .unwrap_err();
    assert!(err.is_dimension_error());

    let err = NelderMead::new(Config::new(2).with_max_evaluations(2))
        .minimize(&objective, &bounds, &array![1.0, 2.0])
        .unwrap_err();
    assert_eq!(err, ConfigError::InvalidBudget { budget: 2, required: 3 });

    let err = NelderMead::new(Config::new(2).with_step(vec![1.0]))
        .minimize(&objective, &bounds, &array![1.0, 2.0])
        .unwrap_err();
    assert!(err.is_dimension_error());

    assert_eq!(*calls.borrow(), 0);
}

/// The convenience entry point runs the same optimizer
#[test]
fn test_optimize_wrapper() -> Result<()> {
    let config = Config::new(2);
    let bounds = rosenbrock_bounds();
    let start = array![-1.2, 1.0];
    let wrapped = optimize(&rosenbrock, &bounds, &config, &start)?;
    let direct = NelderMead::new(config).minimize(&rosenbrock, &bounds, &start)?;
    assert_eq!(wrapped, direct);
    Ok(())
}

/// The iteration log can be written as CSV
#[test]
fn test_trace_to_csv() -> Result<()> {
    let config = Config::new(2).with_trace(true);
    let outcome = NelderMead::new(config).minimize(&rosenbrock, &rosenbrock_bounds(), &array![-1.2, 1.0])?;
    assert!(!outcome.log().is_empty());

    let mut buffer = Vec::new();
    outcome.log().write(&mut buffer)?;
    let text = String::from_utf8(buffer)?;
    assert_eq!(text.lines().count(), outcome.log().len() + 1);
    assert!(text.contains(",restart"));
    Ok(())
}

struct Quadratic;

impl CostFunction for Quadratic {
    type Param = Array1<f64>;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> Result<Self::Output, Error> {
        Ok(quadratic(x))
    }
}

fn quadratic(x: &Array1<f64>) -> f64 {
    (x[0] - 0.5).powi(2) + 2.0 * (x[1] + 1.5).powi(2) + 0.5 * x[0] * x[1]
}

/// Agrees with argmin's Nelder-Mead on an unconstrained quadratic
#[test]
fn test_agrees_with_argmin() -> Result<()> {
    let solver = ArgminNelderMead::new(vec![array![2.0, 2.0], array![3.2, 2.0], array![2.0, 3.2]])
        .with_sd_tolerance(1e-12)
        .map_err(|e| eyre::eyre!("{}", e))?;
    let res = Executor::new(Quadratic, solver)
        .configure(|state| state.max_iters(5_000))
        .run()
        .map_err(|e| eyre::eyre!("{}", e))?;
    let reference = res.state.best_param.clone().unwrap();

    let bounds = Bounds::unbounded(2)?;
    let config = Config::new(2).with_tolerance(1e-10);
    let outcome = NelderMead::new(config).minimize(&quadratic, &bounds, &array![2.0, 2.0])?;

    assert!(outcome.converged());
    assert!((outcome.point() - &reference).mapv(f64::abs).sum() < 1e-3);
    assert!((outcome.value() - res.state.best_cost).abs() < 1e-6);
    Ok(())
}
