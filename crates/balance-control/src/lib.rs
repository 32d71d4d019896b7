// ─────────────────────────────────────────────────────────────────────
// SCPN Balance Sim — Balance Control
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Closed-loop control of a two-wheeled inverted pendulum.
//!
//! Linearized model, structural checks, LQR synthesis, sensor and actuator
//! models, Euler simulation loop, and the three balancing scenarios.

pub mod actuator;
pub mod checker;
pub mod lqr;
pub mod model;
pub mod scenarios;
pub mod sensor;
pub mod simulation;
