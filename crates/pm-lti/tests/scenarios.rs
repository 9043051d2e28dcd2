//! Integration tests: end-to-end LTI scenarios.
//!
//! - Closed-loop speed model of the reference motor under state feedback
//! - Pole at the origin reported as a singular DC gain
//! - Transfer function round trip through state space
//! - Series associativity at coefficient level
//! - Classical PI loop with unity DC gain

use pm_lti::{
    CompensatorLoop, FeedbackSpec, LtiError, LtiModel, Polynomial, StateFeedback,
    StateSpaceModel, TransferFunctionModel, analysis, close_loop, reference_gain_for_unity,
};

fn motor_speed_plant() -> StateSpaceModel {
    StateSpaceModel::from_rows(
        &[
            vec![0.0, 1.0, 0.0],
            vec![0.0, -0.5, 250.0],
            vec![0.0, -8.33, -1066.7],
        ],
        &[vec![0.0], vec![0.0], vec![6666.7]],
        &[vec![0.0, 1.0, 0.0]],
        &[vec![0.0]],
    )
    .unwrap()
}

#[test]
fn state_feedback_closed_loop_has_finite_positive_dc_gain() {
    let plant = LtiModel::from(motor_speed_plant());
    let spec = FeedbackSpec::from(StateFeedback::new(vec![0.0, 0.001, 0.0]));
    let closed = close_loop(&plant, &spec).unwrap();

    let tf = closed.to_transfer_function().unwrap();
    let dc = analysis::dc_gain(&LtiModel::from(tf.clone())).unwrap();
    assert!(dc.is_finite() && dc > 0.0, "dc gain {dc}");

    // Speed sees two modes; the closed-loop denominator follows from A - B K.
    let den = s2(1067.2, 0.5 * 1066.7 + 250.0 * (8.33 + 6666.7 * 0.001));
    let r = tf.as_siso().unwrap();
    assert!(r.den().approx_eq(&den, 1e-9), "den {}", r.den());
    let expected = 250.0 * 6666.7 / den.constant_term();
    assert!((dc - expected).abs() < 1e-9 * expected);

    // The position integrator is still a pole of A - B K.
    let poles = closed.poles().unwrap();
    assert_eq!(poles.len(), 3);
    assert!(poles.iter().any(|p| p.norm() < 1e-9));
    assert!(matches!(
        closed.dc_gain(),
        Err(LtiError::SingularSystem { .. })
    ));
}

fn s2(b: f64, c: f64) -> Polynomial {
    Polynomial::new(vec![1.0, b, c]).unwrap()
}

#[test]
fn reference_gain_normalizes_speed_loop() {
    let plant = motor_speed_plant();
    let k = StateFeedback::new(vec![0.0, 0.001, 0.0]);
    let kr = reference_gain_for_unity(&plant, &k).unwrap();
    let closed = plant
        .apply_state_feedback(&k.with_reference_gain(kr))
        .unwrap();
    let dc = closed.to_transfer_function().unwrap().dc_gain().unwrap();
    assert!((dc - 1.0).abs() < 1e-9);
}

#[test]
fn denominator_root_at_origin_is_singular() {
    let tf = TransferFunctionModel::siso(&[1.0], &[1.0, 2.0, 0.0]).unwrap();
    let err = analysis::dc_gain(&LtiModel::from(tf)).unwrap_err();
    assert!(matches!(err, LtiError::SingularSystem { .. }));
}

#[test]
fn transfer_function_round_trip_preserves_coefficients() {
    // 2 (s + 3) / (2 (s + 1)(s + 4))
    let tf = TransferFunctionModel::siso(&[2.0, 6.0], &[2.0, 10.0, 8.0]).unwrap();
    let back = tf.to_state_space().unwrap().to_transfer_function().unwrap();
    let original = tf.as_siso().unwrap().normalized().unwrap();
    let recovered = back.as_siso().unwrap().normalized().unwrap();
    assert!(original.num().approx_eq(recovered.num(), 1e-12));
    assert!(original.den().approx_eq(recovered.den(), 1e-12));
}

#[test]
fn series_is_associative() {
    let g1 = TransferFunctionModel::siso(&[1.0, 2.0], &[1.0, 3.0, 5.0]).unwrap();
    let g2 = TransferFunctionModel::siso(&[4.0], &[1.0, 7.0]).unwrap();
    let g3 = TransferFunctionModel::siso(&[0.5, 0.0], &[2.0, 1.0]).unwrap();
    let left = g1.series(&g2).unwrap().series(&g3).unwrap();
    let right = g1.series(&g2.series(&g3).unwrap()).unwrap();
    let (l, r) = (left.as_siso().unwrap(), right.as_siso().unwrap());
    assert!(l.num().approx_eq(r.num(), 1e-12));
    assert!(l.den().approx_eq(r.den(), 1e-12));

    let s1 = g1.to_state_space().unwrap();
    let s2 = g2.to_state_space().unwrap();
    let s3 = g3.to_state_space().unwrap();
    let left = s1.series(&s2).unwrap().series(&s3).unwrap();
    let right = s1.series(&s2.series(&s3).unwrap()).unwrap();
    assert!(left.poles().unwrap().approx_eq(&right.poles().unwrap(), 1e-9));
    assert!((left.dc_gain().unwrap() - right.dc_gain().unwrap()).abs() < 1e-12);
}

#[test]
fn pi_loop_tracks_with_unity_dc_gain() {
    // Speed plant of the reference motor after K = [0, 0.001, 0].
    let plant = TransferFunctionModel::siso(&[5.0e6], &[1.0, 1067.17, 11783.0]).unwrap();
    let pi = TransferFunctionModel::siso(&[0.001, 0.01], &[1.0, 0.0]).unwrap();
    let closed = close_loop(
        &LtiModel::from(plant),
        &FeedbackSpec::from(CompensatorLoop::new(pi)),
    )
    .unwrap();
    assert!((closed.dc_gain().unwrap() - 1.0).abs() < 1e-12);
    let poles = closed.poles().unwrap();
    assert_eq!(poles.len(), 3);
    assert!(poles.is_stable());
}
