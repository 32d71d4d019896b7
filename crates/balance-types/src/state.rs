// ─────────────────────────────────────────────────────────────────────
// SCPN Balance Sim — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::constants::{INPUT_DIM, STATE_DIM};
use crate::error::{BalanceError, BalanceResult};
use ndarray::{Array2, ArrayView1};
use serde::Serialize;

pub const POSITION: usize = 0;
pub const VELOCITY: usize = 1;
pub const TILT: usize = 2;
pub const TILT_RATE: usize = 3;

/// Robot state `[x, ẋ, θ, θ̇]` in SI units (m, m/s, rad, rad/s).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct StateVector(pub [f64; STATE_DIM]);

impl StateVector {
    pub fn new(position: f64, velocity: f64, tilt: f64, tilt_rate: f64) -> Self {
        StateVector([position, velocity, tilt, tilt_rate])
    }

    pub fn zeros() -> Self {
        StateVector([0.0; STATE_DIM])
    }

    /// Rejects anything that is not exactly four components.
    pub fn from_slice(values: &[f64]) -> BalanceResult<Self> {
        let arr: [f64; STATE_DIM] = values.try_into().map_err(|_| {
            BalanceError::ConfigError(format!(
                "state vector needs {STATE_DIM} components, got {}",
                values.len()
            ))
        })?;
        Ok(StateVector(arr))
    }

    pub fn position(&self) -> f64 {
        self.0[POSITION]
    }

    pub fn velocity(&self) -> f64 {
        self.0[VELOCITY]
    }

    pub fn tilt(&self) -> f64 {
        self.0[TILT]
    }

    pub fn tilt_rate(&self) -> f64 {
        self.0[TILT_RATE]
    }

    /// Copy with the tilt component replaced.
    pub fn with_tilt(&self, tilt: f64) -> Self {
        let mut out = *self;
        out.0[TILT] = tilt;
        out
    }

    pub fn view(&self) -> ArrayView1<'_, f64> {
        ArrayView1::from(&self.0[..])
    }

    /// Explicit Euler update `x + ẋ·dt`.
    pub fn euler_step(&self, derivative: &StateVector, dt: f64) -> Self {
        let mut out = *self;
        for (x, dx) in out.0.iter_mut().zip(derivative.0.iter()) {
            *x += dx * dt;
        }
        out
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

/// Linearized dynamics `ẋ = A·x + B·u + E·d`.
///
/// Shapes are checked once at construction: A is 4×4, B and E are 4×1.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSpaceModel {
    a: Array2<f64>,
    b: Array2<f64>,
    e: Array2<f64>,
}

impl StateSpaceModel {
    pub fn new(a: Array2<f64>, b: Array2<f64>, e: Array2<f64>) -> BalanceResult<Self> {
        let expect = |name: &str, m: &Array2<f64>, shape: (usize, usize)| {
            if m.dim() != shape {
                return Err(BalanceError::ConfigError(format!(
                    "{name} must be {}x{}, got {:?}",
                    shape.0,
                    shape.1,
                    m.dim()
                )));
            }
            Ok(())
        };
        expect("A", &a, (STATE_DIM, STATE_DIM))?;
        expect("B", &b, (STATE_DIM, INPUT_DIM))?;
        expect("E", &e, (STATE_DIM, INPUT_DIM))?;
        Ok(StateSpaceModel { a, b, e })
    }

    pub fn a(&self) -> &Array2<f64> {
        &self.a
    }

    pub fn b(&self) -> &Array2<f64> {
        &self.b
    }

    pub fn e(&self) -> &Array2<f64> {
        &self.e
    }

    /// Right-hand side `A·x + B·u + E·d` for a scalar input and disturbance.
    pub fn derivative(&self, x: &StateVector, u: f64, d: f64) -> StateVector {
        let ax = self.a.dot(&x.view());
        let mut out = [0.0; STATE_DIM];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = ax[i] + self.b[[i, 0]] * u + self.e[[i, 0]] * d;
        }
        StateVector(out)
    }
}

/// State-feedback gain `K` (1×4), control law `u = −K·x`.
#[derive(Debug, Clone, PartialEq)]
pub struct GainMatrix {
    k: Array2<f64>,
}

impl GainMatrix {
    pub fn new(k: Array2<f64>) -> BalanceResult<Self> {
        if k.dim() != (INPUT_DIM, STATE_DIM) {
            return Err(BalanceError::ConfigError(format!(
                "gain must be {INPUT_DIM}x{STATE_DIM}, got {:?}",
                k.dim()
            )));
        }
        Ok(GainMatrix { k })
    }

    pub fn from_row(row: [f64; STATE_DIM]) -> Self {
        GainMatrix {
            k: Array2::from_shape_fn((INPUT_DIM, STATE_DIM), |(_, j)| row[j]),
        }
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.k
    }

    pub fn row(&self) -> ArrayView1<'_, f64> {
        self.k.row(0)
    }

    /// Unsaturated command `−K·x`.
    pub fn feedback(&self, x: &StateVector) -> f64 {
        -self.row().dot(&x.view())
    }
}

/// Time-ordered trajectory, one sample per integration step.
///
/// Stored column-wise so a plotter can take each series directly.
/// All five series always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationTrace {
    time: Vec<f64>,
    position: Vec<f64>,
    velocity: Vec<f64>,
    angle: Vec<f64>,
    angular_velocity: Vec<f64>,
}

impl SimulationTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        SimulationTrace {
            time: Vec::with_capacity(n),
            position: Vec::with_capacity(n),
            velocity: Vec::with_capacity(n),
            angle: Vec::with_capacity(n),
            angular_velocity: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, t: f64, x: &StateVector) {
        self.time.push(t);
        self.position.push(x.position());
        self.velocity.push(x.velocity());
        self.angle.push(x.tilt());
        self.angular_velocity.push(x.tilt_rate());
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn position(&self) -> &[f64] {
        &self.position
    }

    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }

    pub fn angle(&self) -> &[f64] {
        &self.angle
    }

    pub fn angular_velocity(&self) -> &[f64] {
        &self.angular_velocity
    }

    pub fn state_at(&self, i: usize) -> Option<StateVector> {
        if i >= self.len() {
            return None;
        }
        Some(StateVector::new(
            self.position[i],
            self.velocity[i],
            self.angle[i],
            self.angular_velocity[i],
        ))
    }

    /// Last recorded (pre-integration) state.
    pub fn final_state(&self) -> Option<StateVector> {
        self.len().checked_sub(1).and_then(|i| self.state_at(i))
    }

    /// `(t, x)` pairs in time order.
    pub fn samples(&self) -> impl Iterator<Item = (f64, StateVector)> + '_ {
        (0..self.len()).filter_map(move |i| self.state_at(i).map(|x| (self.time[i], x)))
    }

    /// Index of the first sample holding NaN/Inf, if any.
    ///
    /// The integrator never checks this itself; callers that need a
    /// guarantee run it after the fact.
    pub fn first_non_finite(&self) -> Option<usize> {
        (0..self.len()).find(|&i| {
            !(self.position[i].is_finite()
                && self.velocity[i].is_finite()
                && self.angle[i].is_finite()
                && self.angular_velocity[i].is_finite())
        })
    }

    pub fn is_finite(&self) -> bool {
        self.first_non_finite().is_none()
    }

    pub fn peak_abs_angle(&self) -> f64 {
        self.angle.iter().fold(0.0_f64, |acc, a| acc.max(a.abs()))
    }
}

/// A trace tagged for multi-run plots, e.g. `"+2.5kg"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledTrace {
    pub label: String,
    pub trace: SimulationTrace,
}

impl LabeledTrace {
    pub fn new(label: impl Into<String>, trace: SimulationTrace) -> Self {
        LabeledTrace {
            label: label.into(),
            trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_from_slice_rejects_wrong_length() {
        assert!(StateVector::from_slice(&[1.0, 2.0, 3.0]).is_err());
        assert!(StateVector::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0]).is_err());
        let x = StateVector::from_slice(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(x.tilt(), 3.0);
    }

    #[test]
    fn test_with_tilt_only_touches_tilt() {
        let x = StateVector::new(1.0, 2.0, 3.0, 4.0);
        let y = x.with_tilt(-0.5);
        assert_eq!(y, StateVector::new(1.0, 2.0, -0.5, 4.0));
        assert_eq!(x.tilt(), 3.0);
    }

    #[test]
    fn test_euler_step() {
        let x = StateVector::new(1.0, 0.0, 0.1, 0.0);
        let dx = StateVector::new(0.0, 2.0, 1.0, -4.0);
        let y = x.euler_step(&dx, 0.5);
        assert_eq!(y, StateVector::new(1.0, 1.0, 0.6, -2.0));
    }

    #[test]
    fn test_model_rejects_bad_shapes() {
        let a = Array2::zeros((4, 4));
        let b = Array2::zeros((4, 1));
        assert!(StateSpaceModel::new(a.clone(), b.clone(), b.clone()).is_ok());
        assert!(StateSpaceModel::new(Array2::zeros((3, 3)), b.clone(), b.clone()).is_err());
        assert!(StateSpaceModel::new(a.clone(), Array2::zeros((4, 2)), b.clone()).is_err());
        assert!(StateSpaceModel::new(a, b, Array2::zeros((1, 4))).is_err());
    }

    #[test]
    fn test_model_derivative() {
        let mut a = Array2::zeros((4, 4));
        a[[0, 1]] = 1.0;
        a[[2, 3]] = 1.0;
        a[[3, 2]] = 5.0;
        let b = Array2::from_shape_vec((4, 1), vec![0.0, 1.0, 0.0, -2.0]).unwrap();
        let e = Array2::from_shape_vec((4, 1), vec![0.0, 0.5, 0.0, 0.0]).unwrap();
        let model = StateSpaceModel::new(a, b, e).unwrap();
        let dx = model.derivative(&StateVector::new(0.0, 3.0, 0.2, 1.0), 2.0, 4.0);
        assert!((dx.position() - 3.0).abs() < 1e-12);
        assert!((dx.velocity() - (2.0 + 2.0)).abs() < 1e-12);
        assert!((dx.tilt() - 1.0).abs() < 1e-12);
        assert!((dx.tilt_rate() - (1.0 - 4.0)).abs() < 1e-12);
    }

    #[test]
    fn test_gain_feedback_sign() {
        let k = GainMatrix::from_row([1.0, 0.0, 2.0, 0.0]);
        let u = k.feedback(&StateVector::new(1.0, 5.0, 0.5, 5.0));
        assert!((u - (-2.0)).abs() < 1e-12);
        assert!(GainMatrix::new(Array2::zeros((4, 1))).is_err());
    }

    #[test]
    fn test_trace_series_stay_aligned() {
        let mut trace = SimulationTrace::with_capacity(3);
        for i in 0..3 {
            trace.push(i as f64 * 0.1, &StateVector::new(i as f64, 0.0, -(i as f64), 0.0));
        }
        assert_eq!(trace.len(), 3);
        assert_eq!(trace.position().len(), trace.time().len());
        assert_eq!(trace.angular_velocity().len(), trace.time().len());
        assert_eq!(trace.final_state().unwrap().tilt(), -2.0);
        assert!((trace.peak_abs_angle() - 2.0).abs() < 1e-12);
        assert_eq!(trace.samples().count(), 3);
        assert!(trace.is_finite());
    }

    #[test]
    fn test_trace_reports_first_non_finite() {
        let mut trace = SimulationTrace::new();
        trace.push(0.0, &StateVector::zeros());
        trace.push(0.1, &StateVector::new(0.0, f64::INFINITY, 0.0, 0.0));
        trace.push(0.2, &StateVector::new(f64::NAN, 0.0, 0.0, 0.0));
        assert_eq!(trace.first_non_finite(), Some(1));
        assert!(!trace.is_finite());
        assert!(SimulationTrace::new().final_state().is_none());
    }
}
