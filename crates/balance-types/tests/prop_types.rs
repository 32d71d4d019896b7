// ─────────────────────────────────────────────────────────────────────
// SCPN Balance Sim — Property-Based Tests (proptest) for balance-types
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for balance-types using proptest.
//!
//! Covers: derived body inertia, payload copies, trace alignment,
//! sweep grid coverage.

use balance_types::config::MassSweepConfig;
use balance_types::params::PhysicalParameters;
use balance_types::state::{SimulationTrace, StateVector};
use proptest::prelude::*;

// ── PhysicalParameters Invariants ────────────────────────────────────

proptest! {
    /// Inertia always tracks mass and length.
    #[test]
    fn inertia_follows_mass(mass in 0.1f64..50.0, length in 0.05f64..2.0) {
        let p = PhysicalParameters {
            body_mass: mass,
            pendulum_length: length,
            ..PhysicalParameters::default()
        };
        let expected = mass * length * length / 3.0;
        prop_assert!((p.body_inertia() - expected).abs() < 1e-12 * expected.max(1.0));
    }

    /// Payload copies never touch the base value.
    #[test]
    fn payload_copy_leaves_base(extra in 0.0f64..20.0) {
        let base = PhysicalParameters::default();
        let snapshot = base;
        let loaded = base.with_payload(extra);
        prop_assert_eq!(base, snapshot);
        prop_assert!((loaded.body_mass - (base.body_mass + extra)).abs() < 1e-12);
        prop_assert!(loaded.body_inertia() >= base.body_inertia());
    }
}

// ── SimulationTrace Invariants ───────────────────────────────────────

proptest! {
    /// All five series have the same length and preserve insertion order.
    #[test]
    fn trace_series_aligned(samples in prop::collection::vec(-10.0f64..10.0, 0..64)) {
        let mut trace = SimulationTrace::new();
        for (i, v) in samples.iter().enumerate() {
            trace.push(i as f64 * 0.01, &StateVector::new(*v, -v, 0.5 * v, 2.0 * v));
        }
        prop_assert_eq!(trace.len(), samples.len());
        prop_assert_eq!(trace.position().len(), samples.len());
        prop_assert_eq!(trace.velocity().len(), samples.len());
        prop_assert_eq!(trace.angle().len(), samples.len());
        prop_assert_eq!(trace.angular_velocity().len(), samples.len());
        for i in 1..trace.len() {
            prop_assert!(trace.time()[i] > trace.time()[i - 1]);
        }
        for (i, (_, x)) in trace.samples().enumerate() {
            prop_assert_eq!(x.position(), samples[i]);
        }
    }
}

// ── Mass Sweep Grid ──────────────────────────────────────────────────

proptest! {
    /// Sweep stays inside [low, high] and is evenly spaced.
    #[test]
    fn sweep_within_bounds(low in 0.0f64..5.0, span in 0.0f64..10.0, step in 0.25f64..2.0) {
        let sweep = MassSweepConfig { low, high: low + span, step, retune_per_payload: false };
        let masses = sweep.extra_masses().unwrap();
        prop_assert!(!masses.is_empty());
        prop_assert!((masses[0] - low).abs() < 1e-12);
        for m in &masses {
            prop_assert!(*m <= low + span + 1e-6);
        }
        for w in masses.windows(2) {
            prop_assert!((w[1] - w[0] - step).abs() < 1e-9);
        }
        prop_assert!(masses[masses.len() - 1] + step > low + span - 1e-6);
    }
}
