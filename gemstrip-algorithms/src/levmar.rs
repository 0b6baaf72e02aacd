//! Levenberg-Marquardt least squares for three-parameter peak shapes.
//!
//! Both peak models used by the engine (Gaussian strip profile, Landau-like
//! waveform pulse) have exactly three parameters: amplitude, location and
//! width. The solver works on fixed-size arrays and never allocates.

use gemstrip_core::FitConfig;

/// Parameter vector `[amplitude, location, width]`.
pub type Params = [f64; 3];

const LAMBDA_START: f64 = 1e-3;
const LAMBDA_MAX: f64 = 1e10;
const LAMBDA_MIN: f64 = 1e-12;

/// A peak shape with three parameters.
pub trait ShapeModel {
    /// Model value at `x`.
    fn value(&self, x: f64, params: &Params) -> f64;

    /// Partial derivatives of the model value with respect to each parameter.
    fn gradient(&self, x: f64, params: &Params) -> Params;

    /// True if `params` describe a usable shape.
    fn is_valid(&self, params: &Params) -> bool {
        params.iter().all(|p| p.is_finite())
    }
}

/// Result of a converged fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitResult {
    /// Fitted parameters.
    pub params: Params,
    /// Final sum of squared residuals.
    pub chi_square: f64,
    /// Iterations used.
    pub iterations: usize,
}

fn chi_square<M: ShapeModel>(model: &M, samples: &[(f64, f64)], params: &Params) -> f64 {
    samples
        .iter()
        .map(|&(x, y)| {
            let r = y - model.value(x, params);
            r * r
        })
        .sum()
}

/// Solves the 3x3 system `a * x = b` by Gaussian elimination with partial pivoting.
fn solve3(mut a: [[f64; 3]; 3], mut b: [f64; 3]) -> Option<[f64; 3]> {
    for col in 0..3 {
        let pivot = (col..3).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-300 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..3 {
            let factor = a[row][col] / a[col][col];
            for k in col..3 {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0; 3];
    for row in (0..3).rev() {
        let mut acc = b[row];
        for k in (row + 1)..3 {
            acc -= a[row][k] * x[k];
        }
        x[row] = acc / a[row][row];
    }

    x.iter().all(|v| v.is_finite()).then_some(x)
}

/// Fits `model` to `samples` starting from `initial`.
///
/// Returns `None` if the starting point is invalid, the normal equations
/// are singular for every damping value, or the iteration cap is reached
/// without meeting the tolerance. When no damped step can lower the chi
/// square any further the current point is returned as the minimum.
pub fn fit<M: ShapeModel>(
    model: &M,
    samples: &[(f64, f64)],
    initial: Params,
    config: &FitConfig,
) -> Option<FitResult> {
    if samples.len() < 3 || !model.is_valid(&initial) {
        return None;
    }

    let mut params = initial;
    let mut chi2 = chi_square(model, samples, &params);
    if !chi2.is_finite() {
        return None;
    }
    let scale: f64 = samples.iter().map(|&(_, y)| y * y).sum();
    let mut lambda = LAMBDA_START;

    for iteration in 1..=config.max_iterations {
        let mut jtj = [[0.0; 3]; 3];
        let mut jtr = [0.0; 3];
        for &(x, y) in samples {
            let residual = y - model.value(x, &params);
            let grad = model.gradient(x, &params);
            for i in 0..3 {
                jtr[i] += grad[i] * residual;
                for j in 0..3 {
                    jtj[i][j] += grad[i] * grad[j];
                }
            }
        }

        loop {
            let mut damped = jtj;
            for (i, row) in damped.iter_mut().enumerate() {
                row[i] += lambda * jtj[i][i].max(1e-12);
            }

            if let Some(step) = solve3(damped, jtr) {
                let candidate: Params = std::array::from_fn(|i| params[i] + step[i]);
                if model.is_valid(&candidate) {
                    let candidate_chi2 = chi_square(model, samples, &candidate);
                    if candidate_chi2.is_finite() && candidate_chi2 <= chi2 {
                        let improvement = chi2 - candidate_chi2;
                        params = candidate;
                        chi2 = candidate_chi2;
                        lambda = (lambda / 10.0).max(LAMBDA_MIN);

                        if improvement <= config.tolerance * chi2 || chi2 <= f64::EPSILON * scale {
                            return Some(FitResult {
                                params,
                                chi_square: chi2,
                                iterations: iteration,
                            });
                        }
                        break;
                    }
                }
            }

            lambda *= 10.0;
            if lambda > LAMBDA_MAX {
                return Some(FitResult {
                    params,
                    chi_square: chi2,
                    iterations: iteration,
                });
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    struct Parabola;

    impl ShapeModel for Parabola {
        fn value(&self, x: f64, p: &Params) -> f64 {
            p[0] + p[1] * x + p[2] * x * x
        }

        fn gradient(&self, x: f64, _p: &Params) -> Params {
            [1.0, x, x * x]
        }
    }

    #[test]
    fn test_solve3() {
        let a = [[2.0, 1.0, -1.0], [-3.0, -1.0, 2.0], [-2.0, 1.0, 2.0]];
        let x = solve3(a, [8.0, -11.0, -3.0]).unwrap();
        assert_abs_diff_eq!(x[0], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[1], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[2], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_solve3_singular() {
        let a = [[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 0.0, 0.0]];
        assert!(solve3(a, [1.0, 2.0, 0.0]).is_none());
    }

    #[test]
    fn test_fit_linear_model() {
        let samples: Vec<(f64, f64)> = (0..6)
            .map(|i| {
                let x = f64::from(i);
                (x, 1.0 - 2.0 * x + 0.5 * x * x)
            })
            .collect();
        let result = fit(&Parabola, &samples, [0.0, 0.0, 0.0], &FitConfig::default()).unwrap();
        assert_abs_diff_eq!(result.params[0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(result.params[1], -2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(result.params[2], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_too_few_samples() {
        let samples = [(0.0, 1.0), (1.0, 2.0)];
        let config = FitConfig::default();
        assert!(fit(&Parabola, &samples, [0.0; 3], &config).is_none());
    }
}
