//! Safeguarded step computation and interval-of-uncertainty update.

use crate::types::Scalar;
use num_traits::Float;

/// A step along the search direction with its function value and
/// directional derivative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Endpoint<T> {
    /// Step length
    pub step: T,
    /// Function value at the step
    pub value: T,
    /// Directional derivative at the step
    pub derivative: T,
}

impl<T: Scalar> Endpoint<T> {
    /// Creates an endpoint.
    pub fn new(step: T, value: T, derivative: T) -> Self {
        Self {
            step,
            value,
            derivative,
        }
    }

    /// The same point seen through ψ(α) = φ(α) − slope · α.
    pub fn shifted(self, slope: T) -> Self {
        Self {
            step: self.step,
            value: self.value - self.step * slope,
            derivative: self.derivative - slope,
        }
    }

    /// Inverse of [`Endpoint::shifted`].
    pub fn unshifted(self, slope: T) -> Self {
        Self {
            step: self.step,
            value: self.value + self.step * slope,
            derivative: self.derivative + slope,
        }
    }
}

/// Which interpolation case produced the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepCase {
    /// Trial value is higher than the best value; minimizer bracketed
    HigherValue,
    /// Lower value and derivatives of opposite sign; minimizer bracketed
    OppositeSlope,
    /// Lower value, same-sign derivative of decreasing magnitude
    DecreasingSlope,
    /// Lower value, same-sign derivative of non-decreasing magnitude
    SteepSlope,
}

/// Result of [`safeguarded_step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepUpdate<T> {
    /// Endpoint with the least function value
    pub best: Endpoint<T>,
    /// Other endpoint of the interval of uncertainty
    pub other: Endpoint<T>,
    /// Next trial step, within the bounds
    pub step: T,
    /// Whether a minimizer is bracketed by `best` and `other`
    pub bracketed: bool,
    /// Interpolation case that was applied
    pub case: StepCase,
}

/// Computes a safeguarded step and updates the interval of uncertainty.
///
/// `best` holds the step with the least function value so far and `other`
/// the opposite end of the interval. The derivative at `best` must point
/// downhill toward `trial`. The returned step lies in `[lower, upper]`.
///
/// Returns `None`, leaving the caller's state alone, when the input is
/// inconsistent: the interval is bracketed but `trial` lies outside it,
/// `best.derivative · (trial.step − best.step) ≥ 0`, or `upper < lower`.
pub fn safeguarded_step<T: Scalar>(
    best: Endpoint<T>,
    other: Endpoint<T>,
    trial: Endpoint<T>,
    bracketed: bool,
    lower: T,
    upper: T,
) -> Option<StepUpdate<T>> {
    let zero = T::zero();
    let two = <T as Scalar>::from_f64(2.0);
    let three = <T as Scalar>::from_f64(3.0);

    let (stx, fx, dx) = (best.step, best.value, best.derivative);
    let (sty, fy, dy) = (other.step, other.value, other.derivative);
    let (stp, fp, dp) = (trial.step, trial.value, trial.derivative);

    if (bracketed && (stp <= <T as Float>::min(stx, sty) || stp >= <T as Float>::max(stx, sty)))
        || dx * (stp - stx) >= zero
        || upper < lower
    {
        return None;
    }

    let sgnd = dp * (dx / <T as Float>::abs(dx));
    let mut now_bracketed = bracketed;

    let (case, stpf, bound) = if fp > fx {
        let theta = three * (fx - fp) / (stp - stx) + dx + dp;
        let mut gamma = cubic_root(theta, dx, dp, false);
        if stp < stx {
            gamma = -gamma;
        }
        let p = (gamma - dx) + theta;
        let q = ((gamma - dx) + gamma) + dp;
        let stpc = stx + (p / q) * (stp - stx);
        let stpq = stx + ((dx / ((fx - fp) / (stp - stx) + dx)) / two) * (stp - stx);
        let stpf = if <T as Float>::abs(stpc - stx) < <T as Float>::abs(stpq - stx) {
            stpc
        } else {
            stpc + (stpq - stpc) / two
        };
        now_bracketed = true;
        (StepCase::HigherValue, stpf, true)
    } else if sgnd < zero {
        let theta = three * (fx - fp) / (stp - stx) + dx + dp;
        let mut gamma = cubic_root(theta, dx, dp, false);
        if stp > stx {
            gamma = -gamma;
        }
        let p = (gamma - dp) + theta;
        let q = ((gamma - dp) + gamma) + dx;
        let stpc = stp + (p / q) * (stx - stp);
        let stpq = stp + (dp / (dp - dx)) * (stx - stp);
        let stpf = if <T as Float>::abs(stpc - stp) > <T as Float>::abs(stpq - stp) {
            stpc
        } else {
            stpq
        };
        now_bracketed = true;
        (StepCase::OppositeSlope, stpf, false)
    } else if <T as Float>::abs(dp) < <T as Float>::abs(dx) {
        // The cubic is only trusted if it tends to infinity in the direction
        // of the step or its minimum lies beyond stp.
        let theta = three * (fx - fp) / (stp - stx) + dx + dp;
        let mut gamma = cubic_root(theta, dx, dp, true);
        if stp > stx {
            gamma = -gamma;
        }
        let p = (gamma - dp) + theta;
        let q = (gamma + (dx - dp)) + gamma;
        let r = p / q;
        let stpc = if r < zero && gamma != zero {
            stp + r * (stx - stp)
        } else if stp > stx {
            upper
        } else {
            lower
        };
        let stpq = stp + (dp / (dp - dx)) * (stx - stp);
        let cubic_is_closer = <T as Float>::abs(stp - stpc) < <T as Float>::abs(stp - stpq);
        let cubic_is_farther = <T as Float>::abs(stp - stpc) > <T as Float>::abs(stp - stpq);
        let stpf = if (bracketed && cubic_is_closer) || (!bracketed && cubic_is_farther) {
            stpc
        } else {
            stpq
        };
        (StepCase::DecreasingSlope, stpf, true)
    } else {
        let stpf = if bracketed {
            let theta = three * (fp - fy) / (sty - stp) + dy + dp;
            let mut gamma = cubic_root(theta, dy, dp, false);
            if stp > sty {
                gamma = -gamma;
            }
            let p = (gamma - dp) + theta;
            let q = ((gamma - dp) + gamma) + dy;
            stp + (p / q) * (sty - stp)
        } else if stp > stx {
            upper
        } else {
            lower
        };
        (StepCase::SteepSlope, stpf, false)
    };

    // The interval update does not depend on the new step.
    let (new_best, new_other) = if fp > fx {
        (best, trial)
    } else if sgnd < zero {
        (trial, best)
    } else {
        (trial, other)
    };

    let mut step = <T as Float>::max(lower, <T as Float>::min(upper, stpf));
    if now_bracketed && bound {
        let limit = new_best.step
            + <T as Scalar>::from_f64(0.66) * (new_other.step - new_best.step);
        step = if new_other.step > new_best.step {
            <T as Float>::min(limit, step)
        } else {
            <T as Float>::max(limit, step)
        };
    }

    Some(StepUpdate {
        best: new_best,
        other: new_other,
        step,
        bracketed: now_bracketed,
        case,
    })
}

/// Scaled square root `s · sqrt((θ/s)² − (a/s)(b/s))` with `s = max(|θ|, |a|, |b|)`.
fn cubic_root<T: Scalar>(theta: T, a: T, b: T, clamp: bool) -> T {
    let s = <T as Float>::max(
        <T as Float>::abs(theta),
        <T as Float>::max(<T as Float>::abs(a), <T as Float>::abs(b)),
    );
    let mut radicand = (theta / s) * (theta / s) - (a / s) * (b / s);
    if clamp {
        radicand = <T as Float>::max(T::zero(), radicand);
    }
    s * <T as Float>::sqrt(radicand)
}
