//! Integration test: compensators closing loops around a second-order plant.

use pm_controls::{Compensator, PIController, PIDController};
use pm_lti::{CompensatorLoop, TransferFunctionModel};

fn speed_plant() -> TransferFunctionModel {
    TransferFunctionModel::siso(&[5.0e6], &[1.0, 1067.17, 11783.0]).unwrap()
}

#[test]
fn pi_loop_removes_steady_state_error() {
    let pi = PIController::from_gains(0.001, 0.01).unwrap();
    let lp = CompensatorLoop::new(pi.to_transfer_function().unwrap());
    let closed = lp.close(&speed_plant()).unwrap();
    assert!((closed.dc_gain().unwrap() - 1.0).abs() < 1e-12);
    assert!(closed.poles().unwrap().is_stable());

    // Integral action: the controller output settles at plant-input level r / G(0).
    let effort = lp.control_effort(&speed_plant()).unwrap();
    let g0 = 5.0e6 / 11783.0;
    assert!((effort.dc_gain().unwrap() - 1.0 / g0).abs() < 1e-12);
}

#[test]
fn pid_loop_is_stable_and_tracks() {
    let pid = PIDController::new(0.001, 0.1, 1e-5, 1e-4).unwrap();
    let lp = CompensatorLoop::new(pid.to_transfer_function().unwrap());
    let closed = lp.close(&speed_plant()).unwrap();
    let poles = closed.poles().unwrap();
    assert_eq!(poles.len(), 4);
    assert!(poles.is_stable());
    assert!((closed.dc_gain().unwrap() - 1.0).abs() < 1e-12);
}
