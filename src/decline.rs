//! Arps hyperbolic decline and its bounded least-squares fit.
//!
//! `rate(t) = qi / (1 + b·Di·t)^(1/b)`, with the exponential limit
//! `qi·exp(-Di·t)` used once `b` falls below [`EXPONENTIAL_LIMIT_B`].
//!
//! The fit is a Levenberg-Marquardt iteration kept inside the box
//! `[0, qi_max] × [0, b_max] × [0, di_max]`: candidate steps are projected
//! onto the box and parameters pinned at a bound with the gradient pointing
//! outward are frozen for that iteration.

use std::time::{Duration, Instant};

use nalgebra::{Matrix3, Vector3};

use crate::config::{BoundsConfig, SolverConfig};
use crate::error::FitError;
use crate::models::{CleanedSeries, DeclineParams};

/// Below this exponent the hyperbolic form is replaced by its exponential limit.
pub const EXPONENTIAL_LIMIT_B: f64 = 1e-8;

const PARAM_COUNT: usize = 3;
const LAMBDA_START: f64 = 1e-3;
const LAMBDA_MIN: f64 = 1e-12;
const LAMBDA_MAX: f64 = 1e16;
const DIAG_FLOOR: f64 = 1e-12;
/// Fractions of `b_max` used as starting exponents.
const B_STARTS: [f64; 3] = [0.25, 0.5, 0.75];

impl DeclineParams {
    /// Producing rate at month `t`.
    pub fn rate(&self, t: f64) -> f64 {
        if self.b < EXPONENTIAL_LIMIT_B {
            self.qi * (-self.di * t).exp()
        } else {
            self.qi / (1.0 + self.b * self.di * t).powf(1.0 / self.b)
        }
    }

    /// Partial derivatives of `rate(t)` with respect to (qi, b, Di).
    fn gradient(&self, t: f64) -> Vector3<f64> {
        let DeclineParams { qi, b, di } = *self;
        if b < EXPONENTIAL_LIMIT_B {
            let decay = (-di * t).exp();
            let rate = qi * decay;
            return Vector3::new(decay, rate * (di * t).powi(2) / 2.0, -rate * t);
        }

        let growth = b * di * t;
        let u = 1.0 + growth;
        let base = u.powf(-1.0 / b);
        let rate = qi * base;
        let d_b = rate * (growth.ln_1p() / (b * b) - di * t / (b * u));
        Vector3::new(base, d_b, -rate * t / u)
    }

    fn from_vector(v: &Vector3<f64>) -> Self {
        DeclineParams {
            qi: v[0],
            b: v[1],
            di: v[2],
        }
    }
}

/// Outcome of a successful fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeclineFit {
    pub params: DeclineParams,
    pub sse: f64,
    pub iterations: usize,
}

#[derive(Debug, Clone)]
pub struct DeclineFitter {
    lower: Vector3<f64>,
    upper: Vector3<f64>,
    max_iterations: usize,
    tolerance: f64,
    timeout: Option<Duration>,
}

impl DeclineFitter {
    pub fn new(bounds: &BoundsConfig, solver: &SolverConfig) -> Self {
        Self {
            lower: Vector3::zeros(),
            upper: Vector3::new(bounds.qi_max, bounds.b_max, bounds.di_max),
            max_iterations: solver.max_iterations,
            tolerance: solver.tolerance,
            timeout: (solver.timeout_ms > 0).then(|| Duration::from_millis(solver.timeout_ms)),
        }
    }

    /// Fits the hyperbolic model to a cleaned series.
    ///
    /// Several starting exponents are tried and the lowest-residual converged
    /// fit is kept. Fails only when every start fails.
    pub fn fit(&self, series: &CleanedSeries) -> Result<DeclineFit, FitError> {
        if series.len() < PARAM_COUNT {
            return Err(FitError::TooFewPoints {
                points: series.len(),
                required: PARAM_COUNT,
            });
        }

        let months: Vec<f64> = series.months.iter().map(|month| *month as f64).collect();
        let started = Instant::now();
        let mut best: Option<DeclineFit> = None;
        let mut first_error = None;

        for start in self.starting_points(&months, &series.oil) {
            match self.solve(&months, &series.oil, start, started) {
                Ok(fit) => {
                    if best.map_or(true, |current| fit.sse < current.sse) {
                        best = Some(fit);
                    }
                }
                Err(FitError::Timeout(ms)) => return best.ok_or(FitError::Timeout(ms)),
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }

        best.ok_or_else(|| first_error.unwrap_or(FitError::NonFinite))
    }

    fn starting_points(&self, months: &[f64], oil: &[f64]) -> Vec<Vector3<f64>> {
        let first = oil[0];
        let last = oil[oil.len() - 1];
        let span = months[months.len() - 1] - months[0];

        let qi = first.clamp(self.lower[0], self.upper[0]);
        let di = if last > 0.0 && last < first && span > 0.0 {
            ((first / last).ln() / span).clamp(1e-4, self.upper[2])
        } else {
            0.05_f64.min(self.upper[2])
        };

        B_STARTS
            .iter()
            .map(|fraction| Vector3::new(qi, fraction * self.upper[1], di))
            .collect()
    }

    fn solve(
        &self,
        months: &[f64],
        oil: &[f64],
        start: Vector3<f64>,
        started: Instant,
    ) -> Result<DeclineFit, FitError> {
        let mut p = self.project(start);
        let mut cost = sum_squares(months, oil, &p).ok_or(FitError::NonFinite)?;
        let mut lambda = LAMBDA_START;

        for iteration in 1..=self.max_iterations {
            if let Some(limit) = self.timeout {
                if started.elapsed() > limit {
                    return Err(FitError::Timeout(limit.as_millis() as u64));
                }
            }

            let (jtj, gradient) = normal_equations(months, oil, &p);
            let free = self.free_parameters(&p, &gradient);

            let (candidate, candidate_cost, damping) = loop {
                if lambda > LAMBDA_MAX {
                    // no descent direction left inside the box
                    return Ok(self.finish(p, cost, iteration));
                }

                let mut system = jtj;
                let mut rhs = gradient;
                for i in 0..PARAM_COUNT {
                    if free[i] {
                        system[(i, i)] += lambda * jtj[(i, i)].max(DIAG_FLOOR);
                    } else {
                        for j in 0..PARAM_COUNT {
                            system[(i, j)] = 0.0;
                            system[(j, i)] = 0.0;
                        }
                        system[(i, i)] = 1.0;
                        rhs[i] = 0.0;
                    }
                }

                let Some(step) = system.cholesky().map(|factor| factor.solve(&rhs)) else {
                    lambda *= 10.0;
                    continue;
                };

                let candidate = self.project(p + step);
                match sum_squares(months, oil, &candidate) {
                    Some(candidate_cost) if candidate_cost < cost => {
                        let damping = lambda;
                        lambda = (lambda / 10.0).max(LAMBDA_MIN);
                        break (candidate, candidate_cost, damping);
                    }
                    _ => lambda *= 10.0,
                }
            };

            // heavily damped steps are short by construction, not converged
            let near_newton = damping < 1.0;
            let cost_small = near_newton && cost - candidate_cost <= self.tolerance * cost;
            let step_small = near_newton
                && (0..PARAM_COUNT).all(|i| {
                    (candidate[i] - p[i]).abs() <= self.tolerance * (p[i].abs() + self.tolerance)
                });

            p = candidate;
            cost = candidate_cost;

            if cost == 0.0 || step_small || cost_small {
                return Ok(self.finish(p, cost, iteration));
            }
        }

        Err(FitError::MaxIterations(self.max_iterations))
    }

    fn finish(&self, p: Vector3<f64>, sse: f64, iterations: usize) -> DeclineFit {
        DeclineFit {
            params: DeclineParams::from_vector(&p),
            sse,
            iterations,
        }
    }

    fn project(&self, p: Vector3<f64>) -> Vector3<f64> {
        Vector3::from_fn(|i, _| p[i].clamp(self.lower[i], self.upper[i]))
    }

    /// Parameters at a bound whose descent direction leaves the box are frozen.
    fn free_parameters(&self, p: &Vector3<f64>, gradient: &Vector3<f64>) -> [bool; PARAM_COUNT] {
        let mut free = [true; PARAM_COUNT];
        for (i, slot) in free.iter_mut().enumerate() {
            let at_lower = p[i] <= self.lower[i] && gradient[i] <= 0.0;
            let at_upper = p[i] >= self.upper[i] && gradient[i] >= 0.0;
            *slot = !(at_lower || at_upper);
        }
        free
    }
}

fn sum_squares(months: &[f64], oil: &[f64], p: &Vector3<f64>) -> Option<f64> {
    let params = DeclineParams::from_vector(p);
    let total: f64 = months
        .iter()
        .zip(oil)
        .map(|(t, observed)| (observed - params.rate(*t)).powi(2))
        .sum();
    total.is_finite().then_some(total)
}

/// `JᵀJ` and `Jᵀr` for residuals `r = observed - rate`.
fn normal_equations(months: &[f64], oil: &[f64], p: &Vector3<f64>) -> (Matrix3<f64>, Vector3<f64>) {
    let params = DeclineParams::from_vector(p);
    let mut jtj = Matrix3::zeros();
    let mut jtr = Vector3::zeros();
    for (t, observed) in months.iter().zip(oil) {
        let row = params.gradient(*t);
        let residual = observed - params.rate(*t);
        if !residual.is_finite() || row.iter().any(|value| !value.is_finite()) {
            continue;
        }
        jtj += row * row.transpose();
        jtr += row * residual;
    }
    (jtj, jtr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitter() -> DeclineFitter {
        DeclineFitter::new(&BoundsConfig::default(), &SolverConfig::default())
    }

    fn synthetic(params: DeclineParams, months: std::ops::RangeInclusive<i64>) -> CleanedSeries {
        let months: Vec<i64> = months.collect();
        let oil = months.iter().map(|t| params.rate(*t as f64)).collect();
        CleanedSeries {
            retained_points: months.len(),
            months,
            oil,
        }
    }

    fn assert_close(actual: f64, expected: f64, relative: f64) {
        assert!(
            ((actual - expected) / expected).abs() <= relative,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn rate_matches_closed_forms() {
        let harmonic = DeclineParams {
            qi: 1000.0,
            b: 1.0,
            di: 0.1,
        };
        assert_close(harmonic.rate(10.0), 500.0, 1e-12);

        let exponential = DeclineParams {
            qi: 1000.0,
            b: 0.0,
            di: 0.1,
        };
        assert_close(exponential.rate(10.0), 1000.0 * (-1.0f64).exp(), 1e-12);

        let flat = DeclineParams {
            qi: 750.0,
            b: 0.8,
            di: 0.0,
        };
        assert_eq!(flat.rate(50.0), 750.0);
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let params = DeclineParams {
            qi: 1000.0,
            b: 0.8,
            di: 0.05,
        };
        let t = 12.0;
        let analytic = params.gradient(t);
        let h = [1e-3, 1e-5, 1e-7];
        for i in 0..3 {
            let mut up = Vector3::new(params.qi, params.b, params.di);
            let mut down = up;
            up[i] += h[i];
            down[i] -= h[i];
            let numeric = (DeclineParams::from_vector(&up).rate(t)
                - DeclineParams::from_vector(&down).rate(t))
                / (2.0 * h[i]);
            assert_close(analytic[i], numeric, 1e-5);
        }
    }

    #[test]
    fn recovers_noise_free_hyperbolic_parameters() {
        let truth = DeclineParams {
            qi: 1000.0,
            b: 0.8,
            di: 0.05,
        };
        let fit = fitter().fit(&synthetic(truth, 1..=60)).unwrap();
        assert_close(fit.params.qi, truth.qi, 0.01);
        assert_close(fit.params.b, truth.b, 0.01);
        assert_close(fit.params.di, truth.di, 0.01);
    }

    #[test]
    fn fit_respects_bounds() {
        // rising production pulls Di toward its lower bound
        let series = CleanedSeries {
            months: (1..=8).collect(),
            oil: vec![100.0, 110.0, 120.0, 130.0, 140.0, 150.0, 160.0, 170.0],
            retained_points: 8,
        };
        let bounds = BoundsConfig::default();
        let p = fitter().fit(&series).unwrap().params;
        assert!((0.0..=bounds.qi_max).contains(&p.qi));
        assert!((0.0..=bounds.b_max).contains(&p.b));
        assert!((0.0..=bounds.di_max).contains(&p.di));
    }

    #[test]
    fn peak_above_qi_bound_is_clamped() {
        let truth = DeclineParams {
            qi: 80_000.0,
            b: 0.5,
            di: 0.1,
        };
        let fit = fitter().fit(&synthetic(truth, 1..=24)).unwrap();
        assert!(fit.params.qi <= 50_000.0);
    }

    #[test]
    fn too_few_points_is_an_error() {
        let series = CleanedSeries {
            months: vec![1, 2],
            oil: vec![500.0, 400.0],
            retained_points: 6,
        };
        assert_eq!(
            fitter().fit(&series),
            Err(FitError::TooFewPoints {
                points: 2,
                required: 3
            })
        );
    }

    #[test]
    fn iteration_limit_surfaces_as_error() {
        let solver = SolverConfig {
            max_iterations: 1,
            tolerance: 1e-300,
            timeout_ms: 0,
        };
        let noisy = CleanedSeries {
            months: (1..=12).collect(),
            oil: vec![
                900.0, 400.0, 700.0, 350.0, 500.0, 200.0, 450.0, 150.0, 300.0, 120.0, 260.0, 90.0,
            ],
            retained_points: 12,
        };
        let fitter = DeclineFitter::new(&BoundsConfig::default(), &solver);
        assert_eq!(fitter.fit(&noisy), Err(FitError::MaxIterations(1)));
    }

    #[test]
    fn exhausted_time_budget_stops_the_solver() {
        let solver = SolverConfig {
            timeout_ms: 1,
            ..SolverConfig::default()
        };
        let fitter = DeclineFitter::new(&BoundsConfig::default(), &solver);
        let months: Vec<f64> = (1..=12).map(f64::from).collect();
        let oil: Vec<f64> = months.iter().map(|t| 1000.0 / t).collect();
        let start = Vector3::new(1000.0, 1.0, 0.1);
        let started = Instant::now()
            .checked_sub(Duration::from_millis(50))
            .unwrap();

        assert_eq!(
            fitter.solve(&months, &oil, start, started),
            Err(FitError::Timeout(1))
        );
    }
}
