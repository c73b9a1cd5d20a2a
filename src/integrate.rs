use crate::config::QuadratureConfig;
use crate::decline::EXPONENTIAL_LIMIT_B;
use crate::error::FitError;
use crate::models::DeclineParams;

/// Adaptive Simpson quadrature of `f` over `[a, b]`.
///
/// `tolerance` is relative to the magnitude of the coarse whole-interval estimate.
pub fn adaptive_simpson<F>(f: F, a: f64, b: f64, quadrature: &QuadratureConfig) -> f64
where
    F: Fn(f64) -> f64,
{
    let fa = f(a);
    let fb = f(b);
    let m = 0.5 * (a + b);
    let fm = f(m);
    let whole = simpson(a, b, fa, fm, fb);
    let epsilon = quadrature.tolerance * whole.abs().max(1.0);
    refine(&f, a, b, fa, fm, fb, whole, epsilon, quadrature.max_depth)
}

fn simpson(a: f64, b: f64, fa: f64, fm: f64, fb: f64) -> f64 {
    (b - a) / 6.0 * (fa + 4.0 * fm + fb)
}

#[allow(clippy::too_many_arguments)]
fn refine<F>(
    f: &F,
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
    epsilon: f64,
    depth: u32,
) -> f64
where
    F: Fn(f64) -> f64,
{
    let m = 0.5 * (a + b);
    let lm = 0.5 * (a + m);
    let rm = 0.5 * (m + b);
    let flm = f(lm);
    let frm = f(rm);
    let left = simpson(a, m, fa, flm, fm);
    let right = simpson(m, b, fm, frm, fb);
    let delta = left + right - whole;

    if depth == 0 || delta.abs() <= 15.0 * epsilon || !delta.is_finite() {
        return left + right + delta / 15.0;
    }

    refine(f, a, m, fa, flm, fm, left, epsilon / 2.0, depth - 1)
        + refine(f, m, b, fm, frm, fb, right, epsilon / 2.0, depth - 1)
}

/// Cumulative production from month 0 to `horizon_months`, truncated to whole barrels.
pub fn estimate_eur(
    params: &DeclineParams,
    horizon_months: f64,
    quadrature: &QuadratureConfig,
) -> Result<u64, FitError> {
    let volume = adaptive_simpson(|t| params.rate(t), 0.0, horizon_months, quadrature);
    if !volume.is_finite() {
        return Err(FitError::NonFiniteIntegral);
    }
    Ok(volume.max(0.0).trunc() as u64)
}

/// Analytic integral of the decline curve over `[0, horizon_months]`.
pub fn closed_form_eur(params: &DeclineParams, horizon_months: f64) -> f64 {
    let DeclineParams { qi, b, di } = *params;
    let t = horizon_months;

    if di == 0.0 {
        qi * t
    } else if b < EXPONENTIAL_LIMIT_B {
        qi / di * (1.0 - (-di * t).exp())
    } else if (b - 1.0).abs() < 1e-12 {
        qi / di * (di * t).ln_1p()
    } else {
        qi / (di * (b - 1.0)) * ((1.0 + b * di * t).powf((b - 1.0) / b) - 1.0)
    }
}
