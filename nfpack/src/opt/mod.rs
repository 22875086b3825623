use anyhow::{Result, ensure};

/// Stop criteria for [`optimize_min`].
#[derive(Clone, Copy, Debug)]
pub struct StopCriteria {
    /// Maximum number of descent iterations
    pub max_iterations: usize,
    /// Stop when the relative score difference across the working interval drops below this
    pub relative_score_difference: f64,
}

/// Outcome of a bounded 1-D minimization.
#[derive(Clone, Copy, Debug)]
pub struct OptResult {
    /// Argument at which the lowest score was observed
    pub optimum: f64,
    /// The lowest observed score
    pub score: f64,
}

/// Minimizes a black-box objective `f` over `[lo, hi]`, starting from `init`.
///
/// Deterministic local descent with a two-point working interval: reflect away from the worse
/// end, expand while improving, contract towards the better end otherwise. Stops on the
/// iteration cap or when the interval's relative score difference falls below the tolerance.
///
/// Returns an error if the objective produces a non-finite score; callers treat such seeds
/// as +∞ and move on.
pub fn optimize_min(
    mut f: impl FnMut(f64) -> f64,
    init: f64,
    (lo, hi): (f64, f64),
    stop: &StopCriteria,
) -> Result<OptResult> {
    debug_assert!(lo <= hi);

    let mut eval = |x: f64| -> Result<f64> {
        let score = f(x);
        ensure!(score.is_finite(), "objective returned {score} at {x}");
        Ok(score)
    };

    let mut x0 = init.clamp(lo, hi);
    let mut f0 = eval(x0)?;

    let step = (hi - lo) * 0.05;
    if step == 0.0 || stop.max_iterations == 0 {
        return Ok(OptResult {
            optimum: x0,
            score: f0,
        });
    }

    //second endpoint of the working interval
    let mut x1 = if x0 + step <= hi { x0 + step } else { x0 - step };
    let mut f1 = eval(x1)?;

    for _ in 0..stop.max_iterations {
        //keep x0 the better end
        if f1 < f0 {
            (x0, x1) = (x1, x0);
            (f0, f1) = (f1, f0);
        }

        let rel_diff = (f1 - f0).abs() / f64::max(f0.abs().max(f1.abs()), f64::MIN_POSITIVE);
        if rel_diff <= stop.relative_score_difference || x0 == x1 {
            break;
        }

        //reflect the worse end through the better one
        let xr = (x0 + (x0 - x1)).clamp(lo, hi);
        let fr = eval(xr)?;

        if fr < f0 {
            //keep descending in this direction
            let xe = (x0 + 2.0 * (x0 - x1)).clamp(lo, hi);
            let fe = eval(xe)?;
            if fe < fr {
                (x1, f1) = (xe, fe);
            } else {
                (x1, f1) = (xr, fr);
            }
        } else {
            //contract the worse end towards the better one
            let xc = x0 + 0.5 * (x1 - x0);
            let fc = eval(xc)?;
            (x1, f1) = (xc, fc);
        }
    }

    match f0 <= f1 {
        true => Ok(OptResult {
            optimum: x0,
            score: f0,
        }),
        false => Ok(OptResult {
            optimum: x1,
            score: f1,
        }),
    }
}
