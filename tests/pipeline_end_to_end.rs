use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use refwave::{
    blind_peak_search, time_axis, AnalysisConfig, FitConfig, RefWaveError, ReferenceAnalyzer,
    ReferenceFitter, ReferenceParameters, SolverConfig, Waveform,
};

fn params(frequency: f64, amplitude: f64, phase_offset: f64) -> ReferenceParameters {
    ReferenceParameters {
        frequency,
        amplitude,
        phase_offset,
    }
}

#[test]
fn fifty_kilohertz_reference_is_recovered() {
    let truth = params(50_000.0, 1.0, 0.3);
    let t = time_axis(0.0, 1e-6, 1000);
    let y = truth.sample(&t);
    let waveform = Waveform::new(&t, &y).unwrap();

    let initial = blind_peak_search(&waveform, 5).unwrap();
    assert!((49_990.0..=50_010.0).contains(&initial.frequency));
    assert!((0.99..=1.01).contains(&initial.amplitude));
    assert!((0.29..=0.31).contains(&initial.phase_offset));

    let analysis = ReferenceAnalyzer::new().analyze(&waveform).unwrap();
    let refined = analysis.refined();
    assert!((refined.frequency - 50_000.0).abs() < 1e-3);
    assert!((refined.amplitude - 1.0).abs() < 1e-6);
    assert!((refined.phase_offset - 0.3).abs() < 1e-6);
    assert!(analysis.dc_component < 1e-3);
}

#[test]
fn off_bin_tones_are_recovered_after_fit() {
    let cases = [
        (256, 1e-3, 37.3, 2.0, -0.7),
        (1024, 1e-4, 512.7, 0.3, 1.2),
        (4096, 1e-6, 12_345.6, 5.0, -2.0),
    ];
    let analyzer = ReferenceAnalyzer::new();
    for &(n, dt, f, a, phi) in &cases {
        let truth = params(f, a, phi);
        let t = time_axis(0.0, dt, n);
        let y = truth.sample(&t);
        let waveform = Waveform::new(&t, &y).unwrap();

        let analysis = analyzer.analyze(&waveform).unwrap();
        let r = analysis.refined();
        assert!((r.frequency - f).abs() <= 1e-3 * f, "case {f}: {r:?}");
        assert!((r.amplitude - a).abs() <= 1e-3 * a, "case {f}: {r:?}");
        assert!((r.phase_offset - phi).abs() <= 1e-3, "case {f}: {r:?}");
    }
}

#[test]
fn noisy_reference_stays_close() {
    let truth = params(1_234.5, 1.0, 0.5);
    let t = time_axis(0.0, 1e-5, 2000);
    let mut rng = StdRng::seed_from_u64(7);
    let y: Vec<f64> = t
        .iter()
        .map(|&t| truth.evaluate(t) + rng.random_range(-0.05..0.05))
        .collect();
    let waveform = Waveform::new(&t, &y).unwrap();

    let analysis = ReferenceAnalyzer::new().analyze(&waveform).unwrap();
    let r = analysis.refined();
    assert!((r.frequency - truth.frequency).abs() < 0.5);
    assert!((r.amplitude - truth.amplitude).abs() < 1e-2);
    assert!((r.phase_offset - truth.phase_offset).abs() < 2e-2);
}

#[test]
fn analysing_the_fitted_waveform_is_idempotent() {
    let truth = params(8_000.0, 0.6, -1.3);
    let t = time_axis(0.0, 2e-6, 1500);
    let y = truth.sample(&t);
    let analyzer = ReferenceAnalyzer::new();

    let first = *analyzer
        .analyze(&Waveform::new(&t, &y).unwrap())
        .unwrap()
        .refined();
    let resampled = first.sample(&t);
    let second = *analyzer
        .analyze(&Waveform::new(&t, &resampled).unwrap())
        .unwrap()
        .refined();

    assert!((second.frequency - first.frequency).abs() < 1e-3);
    assert!((second.amplitude - first.amplitude).abs() < 1e-6);
    assert!((second.phase_offset - first.phase_offset).abs() < 1e-6);
}

#[test]
fn refitting_from_the_optimum_keeps_parameters() {
    let truth = params(3_333.3, 0.9, 2.0);
    let t = time_axis(0.0, 1e-5, 1500);
    let mut rng = StdRng::seed_from_u64(11);
    let y: Vec<f64> = t
        .iter()
        .map(|&t| truth.evaluate(t) + rng.random_range(-0.02..0.02))
        .collect();
    let waveform = Waveform::new(&t, &y).unwrap();

    let fitter = ReferenceFitter::new();
    let first = fitter
        .fit(&waveform, &blind_peak_search(&waveform, 5).unwrap())
        .unwrap();
    let second = fitter.fit(&waveform, &first.reference).unwrap();

    assert!((second.reference.frequency - first.reference.frequency).abs() < 1e-4);
    assert!((second.reference.amplitude - first.reference.amplitude).abs() < 1e-6);
    assert!((second.reference.phase_offset - first.reference.phase_offset).abs() < 1e-6);
    assert!(second.frequency_shift.abs() < 1e-4);
}

#[test]
fn phase_is_referenced_to_time_zero() {
    let truth = params(2_000.0, 1.3, 0.9);
    let t = time_axis(3.7e-4, 1e-5, 1000);
    let y = truth.sample(&t);
    let waveform = Waveform::new(&t, &y).unwrap();

    let analysis = ReferenceAnalyzer::new().analyze(&waveform).unwrap();
    assert!((analysis.initial().phase_offset - 0.9).abs() < 0.05);
    let r = analysis.refined();
    assert!((r.frequency - 2_000.0).abs() < 1e-3);
    assert!((r.phase_offset - 0.9).abs() < 1e-6);
}

#[test]
fn iteration_limit_reports_non_convergence() {
    let truth = params(1_000.0, 1.0, 0.2);
    let t = time_axis(0.0, 1e-5, 2000);
    let y = truth.sample(&t);
    let waveform = Waveform::new(&t, &y).unwrap();

    let config = FitConfig {
        solver: SolverConfig {
            max_iterations: 1,
            ..SolverConfig::default()
        },
        ..FitConfig::default()
    };
    let err = ReferenceFitter::new()
        .with_config(config)
        .fit(&waveform, &params(1_003.0, 0.8, 0.4))
        .unwrap_err();
    assert!(matches!(
        err,
        RefWaveError::FitDidNotConverge { iterations: 1, .. }
    ));

    let analyzer = ReferenceAnalyzer::new().with_config(AnalysisConfig {
        fit: config,
        ..AnalysisConfig::default()
    });
    // off-bin tone, so the spectral guess is not already at the optimum
    let off_bin = params(1_013.7, 1.0, 0.2).sample(&t);
    let err = analyzer
        .analyze(&Waveform::new(&t, &off_bin).unwrap())
        .unwrap_err();
    assert!(matches!(err, RefWaveError::FitDidNotConverge { .. }));
}
