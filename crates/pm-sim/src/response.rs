//! Step response samples and their transient metrics.

use serde::Serialize;
use std::io::{self, Write};

/// Output trajectories of a step response, `outputs[i][k]` at `time[k]`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StepResponse {
    pub time: Vec<f64>,
    pub outputs: Vec<Vec<f64>>,
}

impl StepResponse {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn output(&self, index: usize) -> Option<&[f64]> {
        self.outputs.get(index).map(Vec::as_slice)
    }

    /// Last sample of output `index`.
    pub fn final_value(&self, index: usize) -> Option<f64> {
        self.output(index).and_then(|y| y.last().copied())
    }

    /// Metrics for output `index` relative to its last sample.
    pub fn info(&self, index: usize) -> Option<StepInfo> {
        let y = self.output(index)?;
        let y_final = *y.last()?;
        Some(StepInfo::from_trace(&self.time, y, y_final))
    }

    /// Write `t,y0,y1,...` rows with the given column names.
    ///
    /// # Errors
    ///
    /// `InvalidData` when an output trace is shorter than `time`.
    pub fn write_csv<W: Write>(&self, mut w: W, names: &[&str]) -> io::Result<()> {
        write!(w, "t")?;
        for i in 0..self.outputs.len() {
            match names.get(i) {
                Some(name) => write!(w, ",{name}")?,
                None => write!(w, ",y{i}")?,
            }
        }
        writeln!(w)?;
        for (k, t) in self.time.iter().enumerate() {
            write!(w, "{t}")?;
            for (i, y) in self.outputs.iter().enumerate() {
                let v = y.get(k).ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("output {i} has {} samples for {} times", y.len(), self.len()),
                    )
                })?;
                write!(w, ",{v}")?;
            }
            writeln!(w)?;
        }
        Ok(())
    }
}

/// Transient characteristics of one step trace.
///
/// Times are interpolated linearly between samples. Rise and settling are
/// `None` when the trace never meets the threshold within the grid.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StepInfo {
    /// 10 % to 90 % of the final value.
    pub rise_time: Option<f64>,
    /// Time after which the trace stays within 2 % of the final value.
    pub settling_time: Option<f64>,
    /// Percentage above the final value, 0 if monotone.
    pub overshoot: f64,
    pub peak: f64,
    pub peak_time: f64,
    pub steady_state: f64,
}

pub const SETTLING_BAND: f64 = 0.02;

impl StepInfo {
    pub fn from_trace(time: &[f64], y: &[f64], y_final: f64) -> Self {
        let y0 = y.first().copied().unwrap_or(0.0);
        let span = y_final - y0;

        let (peak_index, peak) = y
            .iter()
            .copied()
            .enumerate()
            .max_by(|(_, a), (_, b)| (a - y0).abs().total_cmp(&(b - y0).abs()))
            .unwrap_or((0, y0));
        let peak_time = time.get(peak_index).copied().unwrap_or(0.0);

        if span == 0.0 {
            return Self {
                rise_time: None,
                settling_time: None,
                overshoot: 0.0,
                peak,
                peak_time,
                steady_state: y_final,
            };
        }

        // Progress toward the final value, 0 at rest and 1 at steady state.
        let progress: Vec<f64> = y.iter().map(|v| (v - y0) / span).collect();
        let rise_time = match (crossing(time, &progress, 0.1), crossing(time, &progress, 0.9)) {
            (Some(lo), Some(hi)) => Some(hi - lo),
            _ => None,
        };

        let outside = progress
            .iter()
            .rposition(|p| (p - 1.0).abs() > SETTLING_BAND);
        let settling_time = match outside {
            None => time.first().copied(),
            Some(k) if k + 1 < time.len() => Some(time[k + 1]),
            Some(_) => None,
        };

        let max_progress = progress.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let overshoot = ((max_progress - 1.0) * 100.0).max(0.0);

        Self {
            rise_time,
            settling_time,
            overshoot,
            peak,
            peak_time,
            steady_state: y_final,
        }
    }
}

/// First time `p` reaches `level`, interpolated between samples.
fn crossing(time: &[f64], p: &[f64], level: f64) -> Option<f64> {
    if p.first().is_some_and(|&v| v >= level) {
        return time.first().copied();
    }
    p.windows(2).enumerate().find_map(|(k, w)| {
        (w[0] < level && w[1] >= level).then(|| {
            let frac = (level - w[0]) / (w[1] - w[0]);
            time[k] + frac * (time[k + 1] - time[k])
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_order(n: usize, t_end: f64) -> (Vec<f64>, Vec<f64>) {
        let t: Vec<f64> = (0..n).map(|k| t_end * k as f64 / (n - 1) as f64).collect();
        let y = t.iter().map(|t| 1.0 - (-t).exp()).collect();
        (t, y)
    }

    #[test]
    fn first_order_metrics() {
        let (t, y) = first_order(20_001, 20.0);
        let info = StepInfo::from_trace(&t, &y, 1.0);
        // ln(9) for 10-90 %, ln(50) for the 2 % band
        assert!((info.rise_time.unwrap() - 9.0_f64.ln()).abs() < 1e-3);
        assert!((info.settling_time.unwrap() - 50.0_f64.ln()).abs() < 2e-3);
        assert_eq!(info.overshoot, 0.0);
        assert_eq!(info.steady_state, 1.0);
    }

    #[test]
    fn overshoot_of_underdamped_trace() {
        let t = vec![0.0, 1.0, 2.0, 3.0, 4.0];
        let y = vec![0.0, 0.8, 1.2, 0.99, 1.0];
        let info = StepInfo::from_trace(&t, &y, 1.0);
        assert!((info.overshoot - 20.0).abs() < 1e-9);
        assert_eq!(info.peak, 1.2);
        assert_eq!(info.peak_time, 2.0);
        assert_eq!(info.settling_time, Some(3.0));
    }

    #[test]
    fn flat_trace_has_no_rise() {
        let info = StepInfo::from_trace(&[0.0, 1.0], &[0.0, 0.0], 0.0);
        assert_eq!(info.rise_time, None);
        assert_eq!(info.overshoot, 0.0);
    }

    #[test]
    fn csv_layout() {
        let r = StepResponse {
            time: vec![0.0, 0.5],
            outputs: vec![vec![0.0, 1.0], vec![2.0, 3.0]],
        };
        let mut buf = Vec::new();
        r.write_csv(&mut buf, &["speed"]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "t,speed,y1\n0,0,2\n0.5,1,3\n");
    }

    #[test]
    fn csv_rejects_short_trace() {
        let r = StepResponse {
            time: vec![0.0, 0.5, 1.0],
            outputs: vec![vec![0.0, 1.0, 2.0], vec![2.0]],
        };
        let err = r.write_csv(Vec::new(), &["speed", "current"]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
