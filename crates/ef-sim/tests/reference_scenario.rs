//! Integration test: the default outbreak scenario end to end.

use ef_results::fingerprint;
use ef_sim::{IntegratorType, ModelSpec, SimOptions, run, run_with_options};

#[test]
fn reference_outbreak_shape() {
    let spec = ModelSpec::default();
    let series = run(&spec).expect("reference run failed");
    let n = spec.total_population();

    assert_eq!(series.len(), 1001);
    let first = series.first();
    assert_eq!(
        (first.t, first.susceptible, first.infected, first.recovered),
        (0.0, 1_000_000.0, 100.0, 0.0)
    );
    assert_eq!(series.last().t, 100.0);

    // I rises to a single interior peak, then falls
    let infected = series.infected();
    let peak = series.peak_infected();
    assert!(peak.t > 0.0 && peak.t < 100.0, "peak at t={}", peak.t);
    assert!((peak.t - 12.9).abs() < 0.15, "peak at t={}", peak.t);
    assert!((peak.infected - 669_836.0).abs() < 10.0);
    let k = infected
        .iter()
        .position(|&i| i == peak.infected)
        .expect("peak sample present");
    assert!(infected[..=k].windows(2).all(|w| w[1] >= w[0]));
    assert!(infected[k..].windows(2).all(|w| w[1] <= w[0]));

    let last = series.last();
    assert!(last.infected < 1e-3 * n);
    assert!((last.recovered - (n - last.susceptible)).abs() < 1e-3 * n);
    assert!((last.susceptible - 45.43).abs() < 0.05);

    let d = series.diagnostics();
    assert!(d.conservation_ok);
    assert!(d.max_population_drift <= spec.rel_tol);
    assert!(d.min_component >= -spec.abs_tol);
    assert_eq!(d.steps, d.accepted_steps + d.rejected_steps);
    assert!(d.steps < 1000, "dopri54 took {} steps", d.steps);
}

#[test]
fn repeated_runs_are_bit_identical() {
    let spec = ModelSpec::default();
    let a = run(&spec).unwrap();
    let b = run(&spec).unwrap();
    assert_eq!(a.samples(), b.samples());
    assert_eq!(a.diagnostics(), b.diagnostics());
    assert_eq!(fingerprint(&a), fingerprint(&b));
}

#[test]
fn bogacki_shampine_agrees_with_dormand_prince() {
    let spec = ModelSpec::default();
    let dp = run(&spec).unwrap();
    let opts = SimOptions {
        integrator: IntegratorType::BogackiShampine32,
        ..SimOptions::default()
    };
    let bs = run_with_options(&spec, &opts).unwrap();

    assert_eq!(bs.len(), dp.len());
    assert!(bs.diagnostics().steps > dp.diagnostics().steps);
    assert!(bs.diagnostics().conservation_ok);
    let n = spec.total_population();
    for (a, b) in dp.iter().zip(bs.iter()) {
        assert_eq!(a.t, b.t);
        assert!((a.infected - b.infected).abs() < 1e-5 * n, "t={}", a.t);
        assert!((a.susceptible - b.susceptible).abs() < 1e-5 * n, "t={}", a.t);
    }
    assert_ne!(fingerprint(&dp), fingerprint(&bs));
}

#[test]
fn max_step_option_forces_more_steps() {
    let spec = ModelSpec::default();
    let free = run(&spec).unwrap();
    let opts = SimOptions {
        max_step: Some(0.05),
        ..SimOptions::default()
    };
    let capped = run_with_options(&spec, &opts).unwrap();
    assert!(capped.diagnostics().accepted_steps >= 2000);
    assert!(capped.diagnostics().accepted_steps > free.diagnostics().accepted_steps);
    assert!((capped.peak_infected().infected - free.peak_infected().infected).abs() < 1.0);
}
