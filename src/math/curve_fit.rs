//! Single-exponential decay fitting over track duration histograms.
//!
//! The fitter is a trait so the statistics engine never depends on a
//! particular numerical routine. [`MonoExpFitter`] is the default: a
//! Levenberg-Marquardt fit of `y = m·exp(-t·x) + b`, reporting
//! `tau = 1000 / t` (milliseconds when durations are in seconds).

use crate::math::stats::mean;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramPoint {
    pub duration: f64,
    pub frequency: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitResult {
    Converged { tau: f64, r_squared: f64 },
    Failed,
}

pub trait DecayFitter {
    fn fit(&self, histogram: &[HistogramPoint]) -> FitResult;
}

/// Number of tracks per distinct duration, ascending by duration.
pub fn compile_duration(durations: &[f64]) -> Vec<HistogramPoint> {
    let mut sorted: Vec<f64> = durations.iter().copied().filter(|d| d.is_finite()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mut out: Vec<HistogramPoint> = Vec::new();
    for d in sorted {
        match out.last_mut() {
            Some(last) if last.duration == d => last.frequency += 1.0,
            _ => out.push(HistogramPoint {
                duration: d,
                frequency: 1.0,
            }),
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct MonoExpFitter {
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for MonoExpFitter {
    fn default() -> Self {
        Self {
            max_iterations: 800,
            tolerance: 1e-10,
        }
    }
}

impl DecayFitter for MonoExpFitter {
    fn fit(&self, histogram: &[HistogramPoint]) -> FitResult {
        // Three parameters need at least three observations.
        if histogram.len() < 3 {
            return FitResult::Failed;
        }
        let xs: Vec<f64> = histogram.iter().map(|p| p.duration).collect();
        let ys: Vec<f64> = histogram.iter().map(|p| p.frequency).collect();

        let Some(params) = self.levenberg_marquardt(&xs, &ys, initial_guess(&xs, &ys)) else {
            return FitResult::Failed;
        };
        let [m, t, b] = params;
        if !(t.is_finite() && t > 0.0) {
            return FitResult::Failed;
        }
        let tau = 1000.0 / t;
        if !tau.is_finite() {
            return FitResult::Failed;
        }

        let y_mean = mean(&ys);
        let ss_res: f64 = xs
            .iter()
            .zip(&ys)
            .map(|(&x, &y)| (y - model(m, t, b, x)).powi(2))
            .sum();
        let ss_tot: f64 = ys.iter().map(|y| (y - y_mean).powi(2)).sum();
        let r_squared = if ss_tot > 0.0 {
            (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
        } else {
            0.0
        };
        FitResult::Converged { tau, r_squared }
    }
}

impl MonoExpFitter {
    fn levenberg_marquardt(&self, xs: &[f64], ys: &[f64], start: [f64; 3]) -> Option<[f64; 3]> {
        let mut p = start;
        let mut lambda = 1e-3;
        let mut sse = sum_squared_residuals(xs, ys, &p);
        if !sse.is_finite() {
            return None;
        }

        for _ in 0..self.max_iterations {
            let mut a = [[0.0f64; 3]; 3];
            let mut g = [0.0f64; 3];
            for (&x, &y) in xs.iter().zip(ys) {
                let e = (-p[1] * x).exp();
                let jac = [e, -p[0] * x * e, 1.0];
                let r = y - (p[0] * e + p[2]);
                for i in 0..3 {
                    g[i] += jac[i] * r;
                    for j in 0..3 {
                        a[i][j] += jac[i] * jac[j];
                    }
                }
            }

            let mut damped = a;
            for (i, row) in damped.iter_mut().enumerate() {
                row[i] += lambda * a[i][i].max(1e-12);
            }

            let step = match solve3(damped, g) {
                Some(step) => step,
                None => {
                    lambda *= 10.0;
                    if lambda > 1e16 {
                        return None;
                    }
                    continue;
                }
            };
            let candidate = [p[0] + step[0], p[1] + step[1], p[2] + step[2]];
            let candidate_sse = sum_squared_residuals(xs, ys, &candidate);

            if candidate_sse.is_finite() && candidate_sse <= sse {
                let improvement = sse - candidate_sse;
                p = candidate;
                let converged = improvement <= self.tolerance * sse.max(f64::MIN_POSITIVE);
                sse = candidate_sse;
                lambda = (lambda / 10.0).max(1e-12);
                if converged {
                    return Some(p);
                }
            } else {
                lambda *= 10.0;
                if lambda > 1e16 {
                    // No downhill step left: the current point is a minimum.
                    return Some(p);
                }
            }
        }
        None
    }
}

fn initial_guess(xs: &[f64], ys: &[f64]) -> [f64; 3] {
    let y_min = ys.iter().copied().fold(f64::INFINITY, f64::min);
    let y_first = ys[0];
    let weight: f64 = ys.iter().sum();
    let mean_x = if weight > 0.0 {
        xs.iter().zip(ys).map(|(x, y)| x * y).sum::<f64>() / weight
    } else {
        mean(xs)
    };
    let t = if mean_x > 0.0 { 1.0 / mean_x } else { 1.0 };
    let m = ((y_first - y_min) * (t * xs[0]).exp()).max(1.0);
    [m, t, y_min]
}

fn model(m: f64, t: f64, b: f64, x: f64) -> f64 {
    m * (-t * x).exp() + b
}

fn sum_squared_residuals(xs: &[f64], ys: &[f64], p: &[f64; 3]) -> f64 {
    xs.iter()
        .zip(ys)
        .map(|(&x, &y)| (y - model(p[0], p[1], p[2], x)).powi(2))
        .sum()
}

fn solve3(mut a: [[f64; 3]; 3], mut b: [f64; 3]) -> Option<[f64; 3]> {
    for col in 0..3 {
        let pivot = (col..3).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-300 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in (col + 1)..3 {
            let f = a[row][col] / a[col][col];
            for k in col..3 {
                a[row][k] -= f * a[col][k];
            }
            b[row] -= f * b[col];
        }
    }
    let mut x = [0.0f64; 3];
    for row in (0..3).rev() {
        let mut acc = b[row];
        for k in (row + 1)..3 {
            acc -= a[row][k] * x[k];
        }
        x[row] = acc / a[row][row];
    }
    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}
