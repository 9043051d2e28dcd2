//! Sample times for a step response.

use crate::error::{SimError, SimResult};

/// Finite, strictly increasing sample times starting at `t = 0`.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeGrid {
    points: Vec<f64>,
}

impl TimeGrid {
    /// `count` evenly spaced points from `start` to `stop` inclusive.
    ///
    /// Responses are computed from rest at the step instant, so `start` must be 0.
    pub fn linspace(start: f64, stop: f64, count: usize) -> SimResult<Self> {
        if start != 0.0 {
            return Err(SimError::InvalidArg {
                what: "time grid must start at t = 0",
            });
        }
        if count == 0 {
            return Err(SimError::InvalidArg {
                what: "time grid needs at least one sample",
            });
        }
        if !(stop.is_finite() && stop >= 0.0) {
            return Err(SimError::InvalidArg {
                what: "time grid end must be finite and non-negative",
            });
        }
        if count == 1 {
            return Self::from_points(vec![0.0]);
        }
        if stop == 0.0 {
            return Err(SimError::InvalidArg {
                what: "time grid with several samples needs a positive end time",
            });
        }
        let dt = stop / (count - 1) as f64;
        let mut points: Vec<f64> = (0..count).map(|k| k as f64 * dt).collect();
        points[count - 1] = stop;
        Self::from_points(points)
    }

    /// Caller-supplied sample times.
    pub fn from_points(points: Vec<f64>) -> SimResult<Self> {
        match points.first() {
            None => {
                return Err(SimError::InvalidArg {
                    what: "time grid needs at least one sample",
                });
            }
            Some(&t0) if t0 != 0.0 => {
                return Err(SimError::InvalidArg {
                    what: "time grid must start at t = 0",
                });
            }
            _ => {}
        }
        if points.iter().any(|t| !t.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "time grid contains non-finite samples",
            });
        }
        if points.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SimError::InvalidArg {
                what: "time grid must be strictly increasing",
            });
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
