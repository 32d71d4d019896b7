// ─────────────────────────────────────────────────────────────────────
// SCPN Balance Sim — Model
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Linearized cart-pendulum model about the upright equilibrium.
//!
//! With `M_eff = m_b + m_w + I_w/r_w²` and `I_eff = m_b·l² + I_b` the mass
//! matrix is `[[M_eff, m_b·l], [m_b·l, I_eff]]`; its inverse gives `A`, `B`
//! and `E` (disturbance enters through the same channel as the wheel force).

use balance_types::constants::{INPUT_DIM, STATE_DIM};
use balance_types::error::{BalanceError, BalanceResult};
use balance_types::params::PhysicalParameters;
use balance_types::state::StateSpaceModel;
use ndarray::Array2;
use tracing::debug;

/// Determinants at or below this are treated as singular.
const MIN_MASS_DET: f64 = 1e-12;

/// Build `(A, B, E)` for the given parameters.
///
/// Pure function of `params`: identical inputs give identical matrices.
pub fn build_state_space(params: &PhysicalParameters) -> BalanceResult<StateSpaceModel> {
    params.validate()?;

    let mb = params.body_mass;
    let l = params.pendulum_length;
    let g = params.gravity;

    let m_eff = mb + params.wheel_mass + params.wheel_inertia / params.wheel_radius.powi(2);
    let i_eff = mb * l * l + params.body_inertia();
    let det_m = m_eff * i_eff - (mb * l).powi(2);

    if !det_m.is_finite() || det_m <= MIN_MASS_DET || m_eff <= 0.0 || i_eff <= 0.0 {
        return Err(BalanceError::SingularMassMatrix { det: det_m });
    }

    let mut a = Array2::<f64>::zeros((STATE_DIM, STATE_DIM));
    a[[0, 1]] = 1.0;
    a[[1, 2]] = -(mb * mb * g * l * l) / det_m;
    a[[2, 3]] = 1.0;
    a[[3, 2]] = (m_eff * mb * g * l) / det_m;

    let mut b = Array2::<f64>::zeros((STATE_DIM, INPUT_DIM));
    b[[1, 0]] = i_eff / det_m;
    b[[3, 0]] = -mb * l / det_m;
    let e = b.clone();

    debug!(
        m_eff,
        i_eff,
        det_m,
        a12 = a[[1, 2]],
        a32 = a[[3, 2]],
        "built balance model"
    );

    StateSpaceModel::new(a, b, e)
}
