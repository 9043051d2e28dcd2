//! Integration test: motor analysis pipeline.
//!
//! - State feedback with the hand-tuned reference gain tracks a unit step
//! - Automatic reference gain reproduces that hand-tuned value
//! - PI speed loop reaches the target with zero steady-state error
//! - Gain sweep follows the serial closed-loop computation

use pm_motor::{
    AnalysisConfig, ControlConfig, MotorError, MotorOutput, MotorParams, StepConfig,
    run_analysis, state_space, sweep_gain, sweep_values,
};
use pm_lti::{LtiError, StateFeedback};
use pm_sim::StepMethod;

fn state_feedback(reference_gain: Option<f64>, unity_dc_gain: bool) -> AnalysisConfig {
    AnalysisConfig {
        name: "state feedback".to_string(),
        control: ControlConfig::StateFeedback {
            gain: vec![0.0, 0.001, 0.0],
            reference_gain,
            unity_dc_gain,
        },
        ..AnalysisConfig::default()
    }
}

#[test]
fn hand_tuned_reference_gain_gives_near_unity_tracking() {
    let report = run_analysis(&state_feedback(Some(424.0), false)).unwrap();
    assert!(!report.stable, "position integrator remains");
    let dc = report.dc_gain[0].unwrap();
    assert!((dc - 1.0).abs() < 1e-2, "dc {dc}");
    let y_end = report.step.final_value(0).unwrap();
    assert!((y_end - dc).abs() < 1e-3 * dc);
}

#[test]
fn automatic_reference_gain_matches_hand_tuned_value() {
    let report = run_analysis(&state_feedback(None, true)).unwrap();
    let kr = report.reference_gain.unwrap();
    assert!((kr - 424.0).abs() < 1.0, "kr {kr}");
    assert!((report.dc_gain[0].unwrap() - 1.0).abs() < 1e-9);
}

#[test]
fn pi_speed_loop_tracks_target_speed() {
    let config = AnalysisConfig {
        name: "pi".to_string(),
        control: ControlConfig::Pi { kp: 0.001, ki: 0.01 },
        step: StepConfig {
            amplitude: 6000.0,
            t_end: 5.0,
            samples: 5001,
            method: StepMethod::Exact,
        },
        ..AnalysisConfig::default()
    };
    let report = run_analysis(&config).unwrap();
    assert!(report.stable);
    assert_eq!(report.closed_loop_poles.len(), 3);
    assert!((report.dc_gain[0].unwrap() - 1.0).abs() < 1e-9);

    let effort = report.control_effort.as_ref().unwrap();
    assert_eq!(effort.len(), report.step.len());
    // steady-state voltage holds the speed against friction and back-EMF
    let plant_dc = 5.0e6 / 6783.333_333_333_333;
    let v_end = effort.final_value(0).unwrap();
    assert!((v_end - 6000.0 / plant_dc).abs() < 1e-2 * (6000.0 / plant_dc));
}

#[test]
fn pid_loop_is_stable() {
    let config = AnalysisConfig {
        name: "pid".to_string(),
        control: ControlConfig::Pid {
            kp: 0.001,
            ti: 0.1,
            td: 1e-5,
            td_filter: 1e-4,
        },
        step: StepConfig {
            amplitude: 1.0,
            t_end: 0.5,
            samples: 501,
            method: StepMethod::Exact,
        },
        ..AnalysisConfig::default()
    };
    let report = run_analysis(&config).unwrap();
    assert!(report.stable);
    assert_eq!(report.closed_loop_poles.len(), 4);
    assert!(report.step.outputs[0].iter().all(|v| v.is_finite()));
}

#[test]
fn all_outputs_report_each_state() {
    let config = AnalysisConfig {
        output: MotorOutput::All,
        ..state_feedback(Some(424.0), false)
    };
    let report = run_analysis(&config).unwrap();
    assert_eq!(report.outputs, vec!["position", "speed", "current"]);
    assert_eq!(report.step.outputs.len(), 3);
    assert_eq!(report.dc_gain[0], None);
    assert!(report.dc_gain[1].is_some());
}

#[test]
fn invalid_motor_constants_fail_before_modeling() {
    let params = MotorParams {
        inertia: 0.0,
        ..MotorParams::default()
    };
    assert!(matches!(
        state_space(&params, MotorOutput::Speed),
        Err(LtiError::InvalidParameter { .. })
    ));
    let config = AnalysisConfig {
        motor: params,
        ..AnalysisConfig::default()
    };
    assert!(matches!(
        run_analysis(&config),
        Err(MotorError::Lti(LtiError::InvalidParameter { .. }))
    ));
}

#[test]
fn sweep_matches_direct_closed_loop() {
    let config = state_feedback(None, false);
    let values = sweep_values(0.0, 0.002, 5);
    let sweep = sweep_gain(&config, 1, &values).unwrap();
    assert_eq!(sweep.len(), 5);

    let plant = state_space(&config.motor, config.output).unwrap();
    for record in &sweep {
        let direct = plant
            .apply_state_feedback(&StateFeedback::new(vec![0.0, record.gain, 0.0]))
            .unwrap()
            .poles()
            .unwrap();
        for (p, q) in record.poles.iter().zip(direct.iter()) {
            assert!((p.re - q.re).abs() < 1e-9 * q.norm().max(1.0));
            assert!((p.im - q.im).abs() < 1e-9 * q.norm().max(1.0));
        }
    }
}
