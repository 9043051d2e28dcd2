//! Poles, DC gain and root-locus style gain sweeps.

use crate::error::LtiResult;
use crate::feedback::StateFeedback;
use crate::linalg::cmp_complex;
use crate::model::LtiModel;
use crate::state_space::StateSpaceModel;
use nalgebra::Complex;
use rayon::prelude::*;

/// Default tolerance for treating two poles as the same, relative to their magnitude.
pub const POLE_MATCH_TOL: f64 = 1e-6;

fn same_pole(p: &Complex<f64>, q: &Complex<f64>, tol: f64) -> bool {
    (p - q).norm() <= tol * p.norm().max(q.norm()).max(1.0)
}

/// Poles of a model, sorted by real part then imaginary part.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoleSet {
    poles: Vec<Complex<f64>>,
}

impl PoleSet {
    pub fn new(mut poles: Vec<Complex<f64>>) -> Self {
        poles.sort_by(cmp_complex);
        Self { poles }
    }

    pub fn as_slice(&self) -> &[Complex<f64>] {
        &self.poles
    }

    pub fn iter(&self) -> impl Iterator<Item = &Complex<f64>> {
        self.poles.iter()
    }

    pub fn len(&self) -> usize {
        self.poles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poles.is_empty()
    }

    /// Every pole strictly in the left half-plane.
    pub fn is_stable(&self) -> bool {
        self.poles.iter().all(|p| p.re < 0.0)
    }

    /// Pole with the largest real part (the slowest mode of a stable system).
    pub fn dominant(&self) -> Option<Complex<f64>> {
        self.poles.last().copied()
    }

    /// Multiset equality within `tol`, each pole matched to its nearest
    /// unused counterpart.
    pub fn approx_eq(&self, other: &PoleSet, tol: f64) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mut used = vec![false; other.len()];
        for p in &self.poles {
            let nearest = other
                .poles
                .iter()
                .enumerate()
                .filter(|(j, _)| !used[*j])
                .min_by(|(_, a), (_, b)| (*a - p).norm().total_cmp(&(*b - p).norm()));
            match nearest {
                Some((j, q)) if same_pole(p, q, tol) => used[j] = true,
                _ => return false,
            }
        }
        true
    }

    /// Multiset union: a pole present in both sets is kept once per shared occurrence.
    pub fn union(&self, other: &PoleSet) -> PoleSet {
        let mut merged = self.poles.clone();
        let mut used = vec![false; self.poles.len()];
        for q in &other.poles {
            let hit = self
                .poles
                .iter()
                .enumerate()
                .position(|(j, p)| !used[j] && same_pole(p, q, POLE_MATCH_TOL));
            match hit {
                Some(j) => used[j] = true,
                None => merged.push(*q),
            }
        }
        PoleSet::new(merged)
    }
}

impl<'a> IntoIterator for &'a PoleSet {
    type Item = &'a Complex<f64>;
    type IntoIter = std::slice::Iter<'a, Complex<f64>>;

    fn into_iter(self) -> Self::IntoIter {
        self.poles.iter()
    }
}

/// Natural frequency and damping ratio of one pole.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoleDamping {
    pub pole: Complex<f64>,
    /// |p| in rad/s.
    pub natural_frequency: f64,
    /// −cos(arg p); −1 for a pole at the origin.
    pub damping_ratio: f64,
}

impl PoleDamping {
    pub fn of(pole: Complex<f64>) -> Self {
        let wn = pole.norm();
        let zeta = if wn > 0.0 { -pole.re / wn } else { -1.0 };
        Self {
            pole,
            natural_frequency: wn,
            damping_ratio: zeta,
        }
    }
}

pub fn damping(poles: &PoleSet) -> Vec<PoleDamping> {
    poles.iter().map(|&pole| PoleDamping::of(pole)).collect()
}

/// Eigenvalues of `A` for a state-space model, denominator roots for a
/// transfer function.
pub fn poles(model: &LtiModel) -> LtiResult<PoleSet> {
    model.poles()
}

/// Steady-state gain of a SISO model.
///
/// # Errors
///
/// `SingularSystem` when the model has a pole at the origin.
pub fn dc_gain(model: &LtiModel) -> LtiResult<f64> {
    model.dc_gain()
}

/// Closed-loop poles at one multiplier of a swept gain.
#[derive(Clone, Debug, PartialEq)]
pub struct SweepPoint {
    pub multiplier: f64,
    pub poles: PoleSet,
}

/// Closed-loop poles of `plant` under `K·m` for each multiplier `m`.
///
/// Points are computed in parallel and returned in input order; the first
/// failing point aborts the sweep.
pub fn gain_sweep(
    plant: &StateSpaceModel,
    base: &StateFeedback,
    multipliers: &[f64],
) -> LtiResult<Vec<SweepPoint>> {
    multipliers
        .par_iter()
        .map(|&m| {
            let closed = plant.apply_state_feedback(&base.scaled(m))?;
            Ok(SweepPoint {
                multiplier: m,
                poles: closed.poles()?,
            })
        })
        .collect()
}
