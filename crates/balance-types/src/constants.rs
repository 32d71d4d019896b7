// ─────────────────────────────────────────────────────────────────────
// SCPN Balance Sim — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Dimension of the robot state `[x, ẋ, θ, θ̇]`.
pub const STATE_DIM: usize = 4;

/// Number of control inputs (wheel torque).
pub const INPUT_DIM: usize = 1;

/// Standard gravity (m/s²)
pub const GRAVITY: f64 = 9.81;

/// Pendulum body mass (kg)
pub const BODY_MASS: f64 = 2.0;

/// Wheel mass (kg)
pub const WHEEL_MASS: f64 = 0.2;

/// Pivot-to-body length (m)
pub const PENDULUM_LENGTH: f64 = 0.3;

/// Wheel moment of inertia (kg·m²)
pub const WHEEL_INERTIA: f64 = 0.002;

/// Wheel radius (m)
pub const WHEEL_RADIUS: f64 = 0.05;

/// Rated motor torque (N·m). u_max = RATED_TORQUE / wheel radius.
pub const RATED_TORQUE: f64 = 1.765;

/// Motor time constant J/B (s)
pub const MOTOR_TAU: f64 = 0.02;

/// LQR state weights for [x, ẋ, θ, θ̇].
pub const Q_DIAG: [f64; STATE_DIM] = [10.0, 1.0, 100.0, 1.0];

/// LQR control-effort weight.
pub const R_WEIGHT: f64 = 0.01;

/// IMU tilt noise standard deviation (deg). MPU6050-class sensor.
pub const TILT_NOISE_STD_DEG: f64 = 0.1;

/// Low-pass smoothing factor applied to the noisy tilt reading.
pub const TILT_LPF_ALPHA: f64 = 0.1;

/// Initial tilt for the balancing scenarios (deg)
pub const INITIAL_TILT_DEG: f64 = 10.0;

/// Initial tilt rate for the balancing scenarios (rad/s)
pub const INITIAL_TILT_RATE: f64 = 0.2;
