// xtce-core
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Calibrators convert between a type's raw integer/float value and its calibrated engineering
//! value. Only the polynomial calibrator is implemented; other XTCE calibrator kinds
//! (`SplineCalibrator`, `MathOperationCalibrator`) are rejected at schema build time.

use num_complex::Complex64;

use crate::error::CalibrationError;

/// `y = sum(coefficient * x^exponent)`, XTCE's `PolynomialCalibrator`.
#[derive(Clone, Debug)]
pub struct PolynomialCalibrator {
    /// `(coefficient, exponent)` pairs, in the order declared. Exponents need not be contiguous
    /// or sorted; duplicates are summed.
    pub terms: Vec<(f64, u32)>,
}

impl PolynomialCalibrator {
    pub fn evaluate(&self, x: f64) -> f64 {
        self.terms.iter().map(|&(c, e)| c * x.powi(e as i32)).sum()
    }

    /// Finds `x` such that `evaluate(x) == y`, per the tie-break rule: among real roots within
    /// `valid_raw_range` (if declared), take the one closest to the range's midpoint; with no
    /// declared range, take whichever root minimizes `|evaluate(x) - y|`.
    pub fn invert(&self, y: f64, valid_raw_range: Option<(f64, f64)>) -> Result<f64, CalibrationError> {
        let degree = self.terms.iter().map(|&(_, e)| e).max().unwrap_or(0);

        // Coefficients of p(x) - y, highest degree first.
        let mut coeffs = vec![0.0f64; degree as usize + 1];
        for &(c, e) in &self.terms {
            coeffs[(degree - e) as usize] += c;
        }
        let last = coeffs.len() - 1;
        coeffs[last] -= y;

        if degree == 0 {
            return if coeffs[0].abs() < 1e-9 {
                Ok(0.0)
            }
            else {
                Err(CalibrationError {
                    engineering_value: y,
                    reason: "constant calibrator cannot produce the requested value",
                })
            };
        }

        let roots = find_roots(&coeffs);

        const REAL_EPSILON: f64 = 1e-6;
        let mut candidates: Vec<f64> = roots
            .iter()
            .filter(|r| r.im.abs() < REAL_EPSILON)
            .map(|r| r.re)
            .filter(|&x| valid_raw_range.map_or(true, |(lo, hi)| x >= lo && x <= hi))
            .collect();

        if candidates.is_empty() {
            return Err(CalibrationError {
                engineering_value: y,
                reason: "no real root of the calibration polynomial falls within the declared raw range",
            });
        }

        candidates.sort_by(|a, b| a.partial_cmp(b).expect("root candidates are never NaN"));
        candidates.dedup_by(|a, b| (*a - *b).abs() < 1e-9);

        let best = if let Some((lo, hi)) = valid_raw_range {
            let mid = (lo + hi) / 2.0;
            candidates
                .into_iter()
                .min_by(|a, b| (a - mid).abs().partial_cmp(&(b - mid).abs()).unwrap())
                .expect("candidates is non-empty")
        }
        else {
            candidates
                .into_iter()
                .min_by(|a, b| {
                    (self.evaluate(*a) - y).abs().partial_cmp(&(self.evaluate(*b) - y).abs()).unwrap()
                })
                .expect("candidates is non-empty")
        };

        Ok(best)
    }
}

/// Finds every complex root of a polynomial given by `coeffs` (highest degree first, monic
/// normalization applied internally) via the Durand-Kerner method.
fn find_roots(coeffs: &[f64]) -> Vec<Complex64> {
    let mut c: Vec<f64> = coeffs.to_vec();
    while c.len() > 1 && c[0].abs() < 1e-15 {
        c.remove(0);
    }
    let degree = c.len() - 1;
    if degree == 0 {
        return Vec::new();
    }

    let leading = c[0];
    let monic: Vec<f64> = c.iter().map(|v| v / leading).collect();

    let eval = |x: Complex64| -> Complex64 {
        monic.iter().fold(Complex64::new(0.0, 0.0), |acc, &coeff| acc * x + Complex64::new(coeff, 0.0))
    };

    // Deterministic seed points spread around a circle, offset from the real axis so that real
    // roots are not immediately degenerate starting guesses.
    let mut roots: Vec<Complex64> = (0..degree)
        .map(|k| {
            let angle = 2.0 * std::f64::consts::PI * (k as f64) / (degree as f64) + 0.5;
            Complex64::from_polar(1.3, angle)
        })
        .collect();

    for _ in 0..200 {
        let prev = roots.clone();
        let mut max_delta = 0.0f64;

        for i in 0..degree {
            let mut denom = Complex64::new(1.0, 0.0);
            for (j, &root_j) in prev.iter().enumerate() {
                if i != j {
                    denom *= prev[i] - root_j;
                }
            }
            if denom.norm() < 1e-300 {
                continue;
            }
            let delta = eval(prev[i]) / denom;
            roots[i] = prev[i] - delta;
            max_delta = max_delta.max(delta.norm());
        }

        if max_delta < 1e-12 {
            break;
        }
    }

    roots
}

/// Every XTCE calibrator kind this engine knows how to evaluate.
#[derive(Clone, Debug)]
pub enum Calibrator {
    Polynomial(PolynomialCalibrator),
}

impl Calibrator {
    pub fn evaluate(&self, x: f64) -> f64 {
        match self {
            Calibrator::Polynomial(p) => p.evaluate(x),
        }
    }

    pub fn invert(&self, y: f64, valid_raw_range: Option<(f64, f64)>) -> Result<f64, CalibrationError> {
        match self {
            Calibrator::Polynomial(p) => p.invert(y, valid_raw_range),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_calibration_round_trips() {
        // y = 2x + 1
        let cal = PolynomialCalibrator { terms: vec![(1.0, 0), (2.0, 1)] };
        assert_eq!(cal.evaluate(10.0), 21.0);
        let x = cal.invert(21.0, None).unwrap();
        assert!((x - 10.0).abs() < 1e-6);
    }

    #[test]
    fn quadratic_calibration_picks_root_in_range() {
        // y = x^2, raw range [0, 100]: only the positive root should be usable.
        let cal = PolynomialCalibrator { terms: vec![(1.0, 2)] };
        let x = cal.invert(25.0, Some((0.0, 100.0))).unwrap();
        assert!((x - 5.0).abs() < 1e-5, "got {x}");
    }

    #[test]
    fn quadratic_with_no_range_picks_best_fit_root() {
        let cal = PolynomialCalibrator { terms: vec![(1.0, 2)] };
        let x = cal.invert(25.0, None).unwrap();
        assert!((x.abs() - 5.0).abs() < 1e-5, "got {x}");
    }

    #[test]
    fn polynomial_round_trip_within_declared_range() {
        // y = 3 + 0.5x, raw in [0, 4095].
        let cal = PolynomialCalibrator { terms: vec![(3.0, 0), (0.5, 1)] };
        let eng = cal.evaluate(2000.0);
        let raw = cal.invert(eng, Some((0.0, 4095.0))).unwrap();
        assert!((raw - 2000.0).abs() < 1e-4, "got {raw}");
    }

    #[test]
    fn unsatisfiable_inverse_is_an_error() {
        let cal = PolynomialCalibrator { terms: vec![(1.0, 2)] };
        // y = -1 has no real root for x^2.
        assert!(cal.invert(-1.0, None).is_err());
    }
}
