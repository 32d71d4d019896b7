//! Mathematical primitives for the balance simulator.

pub mod linalg;
pub mod riccati;
pub mod spectrum;
