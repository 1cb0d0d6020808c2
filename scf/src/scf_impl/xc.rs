//! Local-density exchange-correlation: Slater exchange and VWN correlation.
//!
//! Both functionals are evaluated point by point on the real-space grid and are only
//! defined for strictly positive densities. A zero, negative or non-finite density is
//! reported as an error instead of propagating NaN into the energy.

use crate::error::{DftError, Result};
use nalgebra::DVector;
use rayon::prelude::*;
use std::f64::consts::PI;

/// Default Slater scaling; 2/3 reproduces Dirac exchange.
pub const SLATER_ALPHA: f64 = 2.0 / 3.0;

// VWN parametrization of the paramagnetic electron gas correlation energy
const VWN_A: f64 = 0.0310907;
const VWN_B: f64 = 3.72744;
const VWN_C: f64 = 12.9352;
const VWN_X0: f64 = -0.10498;

/// Exchange-correlation energy density per electron and potential on the grid.
#[derive(Clone, Debug)]
pub struct XcFields {
    pub exc: DVector<f64>,
    pub vxc: DVector<f64>,
}

/// Wigner-Seitz radius rs = (3 / (4 pi n))^(1/3).
#[inline]
pub fn wigner_seitz_radius(n: f64) -> f64 {
    (3.0 / (4.0 * PI * n)).cbrt()
}

/// Slater exchange for one density value, returns `(ex, vx)`.
///
/// ex = f * alpha / rs with f = -9/8 (3 / 2pi)^(2/3), and vx = 4/3 ex.
#[inline]
pub fn slater_exchange(n: f64, alpha: f64) -> (f64, f64) {
    let rs = wigner_seitz_radius(n);
    let f = -9.0 / 8.0 * (3.0 / (2.0 * PI)).powf(2.0 / 3.0);
    let ex = f * alpha / rs;
    (ex, 4.0 / 3.0 * ex)
}

/// VWN correlation for one density value, returns `(ec, vc)`.
///
/// With x = sqrt(rs), X(x) = x^2 + b x + c and Q = sqrt(4c - b^2):
///
/// ec = A [ ln(x^2/X) + 2b/Q atan(Q/(2x+b))
///        - b x0/X(x0) ( ln((x-x0)^2/X) + 2(b+2x0)/Q atan(Q/(2x+b)) ) ]
///
/// and vc = ec - (rs/3) d ec/d rs.
#[inline]
pub fn vwn_correlation(n: f64) -> (f64, f64) {
    let rs = wigner_seitz_radius(n);
    let q = (4.0 * VWN_C - VWN_B * VWN_B).sqrt();
    let f1 = 2.0 * VWN_B / q;
    let f2 = VWN_B * VWN_X0 / (VWN_X0 * VWN_X0 + VWN_B * VWN_X0 + VWN_C);
    let f3 = 2.0 * (2.0 * VWN_X0 + VWN_B) / q;

    let x = rs.sqrt();
    let fx = rs + VWN_B * x + VWN_C;
    let qx = (q / (2.0 * x + VWN_B)).atan();
    let ec = VWN_A
        * ((rs / fx).ln() + f1 * qx - f2 * (((x - VWN_X0).powi(2) / fx).ln() + f3 * qx));

    let tx = 2.0 * x + VWN_B;
    let tt = tx * tx + q * q;
    let vc = ec
        - x * VWN_A / 6.0
            * (2.0 / x
                - tx / fx
                - 4.0 * VWN_B / tt
                - f2 * (2.0 / (x - VWN_X0) - tx / fx - 4.0 * (2.0 * VWN_X0 + VWN_B) / tt));
    (ec, vc)
}

/// Slater exchange on a density array, returns `(ex, vx)`.
pub fn lda_slater_x(n: &[f64], alpha: f64) -> Result<(DVector<f64>, DVector<f64>)> {
    check_density(n)?;
    Ok(evaluate(n, |value| slater_exchange(value, alpha)))
}

/// VWN correlation on a density array, returns `(ec, vc)`.
pub fn lda_vwn_c(n: &[f64]) -> Result<(DVector<f64>, DVector<f64>)> {
    check_density(n)?;
    Ok(evaluate(n, vwn_correlation))
}

/// Combined LDA: exc = ex + ec, vxc = vx + vc.
pub fn lda_xc(n: &[f64], alpha: f64) -> Result<XcFields> {
    check_density(n)?;
    let (exc, vxc) = evaluate(n, |value| {
        let (ex, vx) = slater_exchange(value, alpha);
        let (ec, vc) = vwn_correlation(value);
        (ex + ec, vx + vc)
    });
    Ok(XcFields { exc, vxc })
}

fn evaluate<F>(n: &[f64], f: F) -> (DVector<f64>, DVector<f64>)
where
    F: Fn(f64) -> (f64, f64) + Sync,
{
    let (e, v): (Vec<f64>, Vec<f64>) = n.par_iter().map(|&value| f(value)).unzip();
    (DVector::from_vec(e), DVector::from_vec(v))
}

fn check_density(n: &[f64]) -> Result<()> {
    match n.par_iter().enumerate().find_first(|(_, &value)| !(value > 0.0) || !value.is_finite()) {
        None => Ok(()),
        Some((index, &value)) if !value.is_finite() => Err(DftError::NonFinite {
            field: "density",
            index,
        }),
        Some((index, &value)) => Err(DftError::NonPositiveDensity { index, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn density_for_rs(rs: f64) -> f64 {
        3.0 / (4.0 * PI * rs.powi(3))
    }

    #[test]
    fn test_slater_reference_values() {
        let n = vec![density_for_rs(1.0); 4];
        let (ex, vx) = lda_slater_x(&n, SLATER_ALPHA).unwrap();
        for i in 0..n.len() {
            assert!((ex[i] + 0.45816529328314287).abs() < 1e-6);
            assert!((vx[i] + 0.6108870577108572).abs() < 1e-6);
        }

        let (ex, _) = lda_slater_x(&[density_for_rs(2.0)], SLATER_ALPHA).unwrap();
        assert!((ex[0] + 0.22908264664157144).abs() < 1e-6);
    }

    #[test]
    fn test_vwn_reference_values() {
        let (ec, vc) = lda_vwn_c(&[density_for_rs(1.0), density_for_rs(2.0)]).unwrap();
        assert!((ec[0] + 0.060018686442541096).abs() < 1e-6, "ec(rs=1) = {}", ec[0]);
        assert!((vc[0] + 0.06781621037986249).abs() < 1e-6, "vc(rs=1) = {}", vc[0]);
        assert!((ec[1] + 0.04478278861462183).abs() < 1e-6, "ec(rs=2) = {}", ec[1]);
        assert!((vc[1] + 0.05160382394979037).abs() < 1e-6, "vc(rs=2) = {}", vc[1]);
    }

    #[test]
    fn test_vwn_potential_matches_derivative() {
        // vc = d(n ec)/dn, checked by central differences
        let n = 0.05;
        let h = 1e-6;
        let (ec_p, _) = vwn_correlation(n + h);
        let (ec_m, _) = vwn_correlation(n - h);
        let numeric = ((n + h) * ec_p - (n - h) * ec_m) / (2.0 * h);
        let (_, vc) = vwn_correlation(n);
        assert!((numeric - vc).abs() < 1e-7, "{} vs {}", numeric, vc);
    }

    #[test]
    fn test_combined_is_sum() {
        let n = [0.01, 0.2, 1.5];
        let fields = lda_xc(&n, SLATER_ALPHA).unwrap();
        let (ex, vx) = lda_slater_x(&n, SLATER_ALPHA).unwrap();
        let (ec, vc) = lda_vwn_c(&n).unwrap();
        assert!((&fields.exc - (ex + ec)).norm() < 1e-14);
        assert!((&fields.vxc - (vx + vc)).norm() < 1e-14);
    }

    #[test]
    fn test_non_positive_density_rejected() {
        match lda_xc(&[0.1, 0.0, 0.3], SLATER_ALPHA) {
            Err(DftError::NonPositiveDensity { index, value }) => {
                assert_eq!(index, 1);
                assert_eq!(value, 0.0);
            }
            other => panic!("expected NonPositiveDensity, got {:?}", other.map(|_| ())),
        }
        assert!(matches!(
            lda_vwn_c(&[0.1, -1e-3]),
            Err(DftError::NonPositiveDensity { index: 1, .. })
        ));
        assert!(matches!(
            lda_slater_x(&[f64::NAN], SLATER_ALPHA),
            Err(DftError::NonFinite { index: 0, .. })
        ));
    }
}
