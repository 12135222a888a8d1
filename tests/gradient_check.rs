use rand::prelude::*;
use rand::rngs::StdRng;

use rotgauss::domain::{GridShape, ModelKind, RotatedGaussianParams};
use rotgauss::eval::{BatchInput, BatchOutput, GradientCheckConfig, check_gradients};
use rotgauss::models::{PointContext, evaluate_point};

fn random_spot(rng: &mut StdRng) -> [f32; 7] {
    RotatedGaussianParams {
        amplitude: rng.gen_range(5.0..10.0),
        center_x: rng.gen_range(2.0..4.0),
        center_y: rng.gen_range(2.0..4.0),
        width_x: rng.gen_range(1.0..2.5),
        width_y: rng.gen_range(1.0..2.5),
        offset: rng.gen_range(0.0..2.0),
        rotation: rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI),
    }
    .to_array()
}

#[test]
fn analytic_partials_match_finite_differences() {
    let mut rng = StdRng::seed_from_u64(20_240_611);
    let config = GradientCheckConfig::default();
    for _ in 0..25 {
        let params = random_spot(&mut rng);
        let report = check_gradients(ModelKind::Gauss2dRotated, &params, 49, &[], &config).unwrap();
        assert!(report.passed(), "params {params:?}: {report:#?}");
    }
}

#[test]
fn reference_spot_on_three_by_three_grid() {
    let params = [10.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0];
    let out = BatchOutput::evaluate(&BatchInput::new(ModelKind::Gauss2dRotated, 9, &params)).unwrap();

    assert!((out.values[4] - 10.0).abs() < 1e-6);
    assert!((out.values[0] - 3.678_794_4).abs() < 1e-5);

    let view = out.fit_derivatives(0).unwrap();
    let center = view.row(4);
    assert_eq!(center[RotatedGaussianParams::AMPLITUDE], 1.0);
    assert_eq!(center[RotatedGaussianParams::CENTER_X], 0.0);
    assert_eq!(center[RotatedGaussianParams::CENTER_Y], 0.0);
    assert_eq!(center[RotatedGaussianParams::ROTATION], 0.0);
    assert!(view.column(RotatedGaussianParams::OFFSET).iter().all(|&d| d == 1.0));
}

#[test]
fn half_turn_leaves_value_and_rotation_partial_unchanged() {
    let mut rng = StdRng::seed_from_u64(7);
    let grid = GridShape::implied(49);
    for _ in 0..10 {
        let params = random_spot(&mut rng);
        let mut turned = params;
        turned[RotatedGaussianParams::ROTATION] += std::f32::consts::PI;

        let a = BatchOutput::evaluate(&BatchInput::new(ModelKind::Gauss2dRotated, 49, &params)).unwrap();
        let b = BatchOutput::evaluate(&BatchInput::new(ModelKind::Gauss2dRotated, 49, &turned)).unwrap();
        let (da, db) = (a.fit_derivatives(0).unwrap(), b.fit_derivatives(0).unwrap());
        for i in 0..grid.n_points {
            assert!((a.values[i] - b.values[i]).abs() < 1e-4, "point {i}");
            let (ta, tb) = (
                da.get(RotatedGaussianParams::ROTATION, i),
                db.get(RotatedGaussianParams::ROTATION, i),
            );
            assert!((ta - tb).abs() < 1e-3 * ta.abs().max(1.0), "point {i}: {ta} vs {tb}");
        }
    }
}

#[test]
fn one_call_writes_one_value_and_seven_partials() {
    let params = [6.0, 2.3, 1.7, 1.4, 0.9, 0.5, 0.8];
    let sentinel = -12345.0_f32;
    let mut values = vec![sentinel; 16];
    let mut derivs = vec![sentinel; 7 * 16];

    evaluate_point(
        ModelKind::Gauss2dRotated,
        &params,
        &PointContext::single(16, 6),
        &mut values,
        &mut derivs,
    );

    for (i, &v) in values.iter().enumerate() {
        assert_eq!(v != sentinel, i == 6, "value slot {i}");
    }
    for (j, &d) in derivs.iter().enumerate() {
        assert_eq!(d != sentinel, j % 16 == 6, "derivative slot {j}");
    }
}
