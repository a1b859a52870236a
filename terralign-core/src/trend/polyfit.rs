//! Polynomial Least-Squares Fitting
//!
//! Fits a bounded-degree polynomial through the surviving ground-contact
//! points. Timestamps are microseconds, so raw powers up to x¹⁶ would
//! destroy the conditioning of the normal equations; the abscissa is
//! centered and scaled before fitting and the transform is baked into the
//! returned [`Polynomial`], so evaluation still takes raw timestamps.

use crate::{
    errors::{ProcessingError, ProcessingResult},
    stats,
};

/// Pivot magnitude below which the normal equations count as singular.
const SINGULAR_EPS: f64 = 1e-12;

/// A fitted polynomial over a centered/scaled abscissa
#[derive(Debug, Clone)]
pub struct Polynomial {
    /// Coefficients in ascending powers of the scaled abscissa
    coeffs: Vec<f64>,
    x_offset: f64,
    x_scale: f64,
}

impl Polynomial {
    /// Degree of the fitted polynomial
    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    /// Evaluate at a raw (unscaled) abscissa value
    pub fn eval(&self, x: f64) -> f64 {
        let xs = (x - self.x_offset) / self.x_scale;
        // Horner, highest power first
        self.coeffs.iter().rev().fold(0.0, |acc, &c| acc * xs + c)
    }
}

/// Least-squares fit of a polynomial of `degree` through `(xs, ys)`.
///
/// Requires strictly more points than the degree; fewer, or a singular
/// system (e.g. duplicated abscissae), is an
/// [`ProcessingError::InsufficientData`] error — the caller decides the
/// fallback, see [`crate::trend`].
pub fn polyfit(xs: &[f64], ys: &[f64], degree: usize) -> ProcessingResult<Polynomial> {
    debug_assert_eq!(xs.len(), ys.len());
    if xs.len() <= degree {
        return Err(ProcessingError::InsufficientData {
            required: degree + 1,
            available: xs.len(),
        });
    }

    let (x_offset, x_std) = stats::mean_std(xs);
    let x_scale = if x_std > 0.0 { x_std } else { 1.0 };
    let scaled: Vec<f64> = xs.iter().map(|&x| (x - x_offset) / x_scale).collect();

    let m = degree + 1;

    // Power sums S_p = sum(x^p) for p in 0..=2*degree
    let mut power_sums = vec![0.0f64; 2 * degree + 1];
    for &x in &scaled {
        let mut p = 1.0;
        for sum in power_sums.iter_mut() {
            *sum += p;
            p *= x;
        }
    }

    // Normal equations A a = b with A[j][k] = S_{j+k}
    let mut a = vec![vec![0.0f64; m]; m];
    for (j, row) in a.iter_mut().enumerate() {
        for (k, cell) in row.iter_mut().enumerate() {
            *cell = power_sums[j + k];
        }
    }
    let mut b = vec![0.0f64; m];
    for (&x, &y) in scaled.iter().zip(ys) {
        let mut p = 1.0;
        for cell in b.iter_mut() {
            *cell += y * p;
            p *= x;
        }
    }

    let coeffs = solve(&mut a, &mut b).ok_or_else(|| {
        log::warn!("normal equations singular for degree {degree} fit over {} points", xs.len());
        ProcessingError::InsufficientData { required: degree + 1, available: xs.len() }
    })?;

    Ok(Polynomial { coeffs, x_offset, x_scale })
}

/// Gaussian elimination with partial pivoting; None when singular.
fn solve(a: &mut [Vec<f64>], b: &mut [f64]) -> Option<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot_row][col].abs() < SINGULAR_EPS {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0f64; n];
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in row + 1..n {
            sum -= a[row][k] * x[k];
        }
        x[row] = sum / a[row][row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_quadratic() {
        let xs: Vec<f64> = (0..20).map(|i| i as f64 * 1000.0).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| 3.0 + 0.002 * x - 1e-7 * x * x).collect();

        let poly = polyfit(&xs, &ys, 2).unwrap();
        for (&x, &y) in xs.iter().zip(&ys) {
            assert!((poly.eval(x) - y).abs() < 1e-6, "mismatch at x={x}");
        }
    }

    #[test]
    fn interpolates_exactly_at_minimum_point_count() {
        // degree + 1 points: the fit must pass through all of them
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.0, -1.0, 4.0, 0.5];
        let poly = polyfit(&xs, &ys, 3).unwrap();
        for (&x, &y) in xs.iter().zip(&ys) {
            assert!((poly.eval(x) - y).abs() < 1e-8);
        }
    }

    #[test]
    fn microsecond_scale_abscissa_stays_conditioned() {
        // Raw flight timestamps: hundreds of seconds in microseconds
        let xs: Vec<f64> = (0..200).map(|i| 1.0e8 + i as f64 * 200_000.0).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| 50.0 + (x * 1e-8).sin() * 10.0).collect();

        let poly = polyfit(&xs, &ys, 8).unwrap();
        let rms: f64 = {
            let sq: f64 = xs.iter().zip(&ys).map(|(&x, &y)| (poly.eval(x) - y).powi(2)).sum();
            (sq / xs.len() as f64).sqrt()
        };
        assert!(rms < 1.0, "rms {rms} too large for a smooth signal");
    }

    #[test]
    fn too_few_points_is_an_error() {
        let err = polyfit(&[0.0, 1.0], &[1.0, 2.0], 8).unwrap_err();
        assert!(matches!(err, ProcessingError::InsufficientData { required: 9, available: 2 }));
    }

    #[test]
    fn duplicated_abscissae_are_singular() {
        let xs = [5.0, 5.0, 5.0, 5.0];
        let ys = [1.0, 2.0, 3.0, 4.0];
        assert!(polyfit(&xs, &ys, 2).is_err());
    }
}
