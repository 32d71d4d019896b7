// ─────────────────────────────────────────────────────────────────────
// SCPN Balance Sim — Spectrum
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Eigenvalues and stability tests for small dense matrices.
//!
//! Characteristic polynomial by Faddeev–LeVerrier, Routh–Hurwitz for the
//! stability decision, Durand–Kerner for the actual pole locations.

use ndarray::Array2;
use num_complex::Complex64;

/// Durand–Kerner iteration limit.
const DK_MAX_ITER: usize = 500;

/// Durand–Kerner relative step tolerance.
const DK_TOL: f64 = 1e-14;

/// Monic characteristic polynomial of a square matrix, highest power first:
/// `det(λI − A) = λⁿ + c₁λⁿ⁻¹ + … + cₙ`.
pub fn characteristic_polynomial(a: &Array2<f64>) -> Vec<f64> {
    let n = a.nrows();
    let eye = Array2::<f64>::eye(n);
    let mut coeffs = Vec::with_capacity(n + 1);
    coeffs.push(1.0);

    let mut m = Array2::<f64>::zeros((n, n));
    let mut c_prev = 1.0;
    for k in 1..=n {
        m = a.dot(&m) + &(&eye * c_prev);
        let c = -a.dot(&m).diag().sum() / k as f64;
        coeffs.push(c);
        c_prev = c;
    }
    coeffs
}

/// Routh–Hurwitz criterion: all roots strictly in the open left half-plane.
///
/// `coeffs` is highest power first. Any zero or sign change in the first
/// column counts as unstable.
pub fn routh_hurwitz_stable(coeffs: &[f64]) -> bool {
    if coeffs.is_empty() || coeffs.iter().any(|c| !c.is_finite()) || coeffs[0] == 0.0 {
        return false;
    }
    let lead = coeffs[0];
    let norm: Vec<f64> = coeffs.iter().map(|c| c / lead).collect();
    let degree = norm.len() - 1;
    if degree == 0 {
        return true;
    }
    if norm.iter().any(|&c| c <= 0.0) {
        return false;
    }

    let width = degree / 2 + 1;
    let pick = |offset: usize| -> Vec<f64> {
        (0..width)
            .map(|j| norm.get(2 * j + offset).copied().unwrap_or(0.0))
            .collect()
    };
    let mut upper = pick(0);
    let mut lower = pick(1);

    for _ in 1..degree {
        let pivot = lower[0];
        if pivot <= 0.0 {
            return false;
        }
        let next: Vec<f64> = (0..width)
            .map(|j| {
                let a = upper.get(j + 1).copied().unwrap_or(0.0);
                let b = lower.get(j + 1).copied().unwrap_or(0.0);
                (pivot * a - upper[0] * b) / pivot
            })
            .collect();
        upper = lower;
        lower = next;
    }
    lower[0] > 0.0
}

/// Roots of a real polynomial (highest power first) by Durand–Kerner.
pub fn polynomial_roots(coeffs: &[f64]) -> Vec<Complex64> {
    let first = coeffs.iter().position(|c| *c != 0.0);
    let coeffs = match first {
        Some(i) => &coeffs[i..],
        None => return Vec::new(),
    };
    let degree = coeffs.len() - 1;
    if degree == 0 {
        return Vec::new();
    }
    let lead = coeffs[0];
    let monic: Vec<f64> = coeffs.iter().map(|c| c / lead).collect();

    // Start on a circle of the Fujiwara-style root radius.
    let radius = monic
        .iter()
        .enumerate()
        .skip(1)
        .map(|(k, c)| c.abs().powf(1.0 / k as f64))
        .fold(0.0_f64, f64::max)
        .max(1e-3)
        * 2.0;
    let seed = Complex64::new(0.4, 0.9);
    let mut roots: Vec<Complex64> = (0..degree)
        .map(|k| seed.powu(k as u32 + 1) / seed.norm().powi(k as i32 + 1) * radius)
        .collect();

    let eval = |z: Complex64| {
        monic
            .iter()
            .fold(Complex64::new(0.0, 0.0), |acc, c| acc * z + *c)
    };

    for _ in 0..DK_MAX_ITER {
        let mut max_step = 0.0_f64;
        for i in 0..degree {
            let zi = roots[i];
            let mut denom = Complex64::new(1.0, 0.0);
            for (j, zj) in roots.iter().enumerate() {
                if i != j {
                    denom *= zi - zj;
                }
            }
            if denom.norm() == 0.0 {
                denom = Complex64::new(f64::EPSILON, 0.0);
            }
            let step = eval(zi) / denom;
            roots[i] = zi - step;
            max_step = max_step.max(step.norm() / (1.0 + roots[i].norm()));
        }
        if max_step < DK_TOL {
            break;
        }
    }
    roots
}

/// Eigenvalues of a square matrix.
pub fn eigenvalues(a: &Array2<f64>) -> Vec<Complex64> {
    polynomial_roots(&characteristic_polynomial(a))
}

/// Largest real part over the spectrum (the spectral abscissa).
pub fn spectral_abscissa(a: &Array2<f64>) -> f64 {
    eigenvalues(a)
        .iter()
        .map(|z| z.re)
        .fold(f64::NEG_INFINITY, f64::max)
}

/// `true` when every eigenvalue has strictly negative real part.
pub fn is_hurwitz(a: &Array2<f64>) -> bool {
    routh_hurwitz_stable(&characteristic_polynomial(a))
}
