//! Shrinking slice step over a positive scalar, in log space.
//!
//! The slice level is the log-target at the starting point, so any value
//! returned scores at least as well as the value it replaces.

use rand::Rng;

/// Settings for one slice step.
#[derive(Clone, Debug)]
pub struct SliceConfig {
    /// Initial bracket width in log space.
    pub width: f64,
    /// Maximum number of stepping-out expansions per side.
    pub max_step_out: usize,
    /// Maximum number of shrink proposals before giving up.
    pub max_shrink: usize,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            width: 1.0,
            max_step_out: 10,
            max_shrink: 50,
        }
    }
}

/// Outcome of a slice step.
#[derive(Clone, Debug, PartialEq)]
pub struct SliceResult {
    pub value: f64,
    pub log_target: f64,
    pub accepted: bool,
}

/// Slice-sample `value > 0` under `log_target`.
///
/// `current` is `log_target(value)`, passed in so callers that already
/// hold it do not pay for a second evaluation.
pub fn slice_step<R, F>(
    value: f64,
    current: f64,
    mut log_target: F,
    config: &SliceConfig,
    rng: &mut R,
) -> SliceResult
where
    R: Rng + ?Sized,
    F: FnMut(f64) -> f64,
{
    let unchanged = SliceResult {
        value,
        log_target: current,
        accepted: false,
    };
    if !(value > 0.0) || !current.is_finite() {
        return unchanged;
    }

    let level = current;
    let x0 = value.ln();
    let mut f = |x: f64| log_target(x.exp());

    let mut left = x0 - config.width * rng.gen::<f64>();
    let mut right = left + config.width;
    for _ in 0..config.max_step_out {
        if f(left) < level {
            break;
        }
        left -= config.width;
    }
    for _ in 0..config.max_step_out {
        if f(right) < level {
            break;
        }
        right += config.width;
    }

    for _ in 0..config.max_shrink {
        let x1 = left + rng.gen::<f64>() * (right - left);
        let f1 = f(x1);
        if f1 >= level && f1.is_finite() {
            return SliceResult {
                value: x1.exp(),
                log_target: f1,
                accepted: true,
            };
        }
        if x1 < x0 {
            left = x1;
        } else {
            right = x1;
        }
    }
    unchanged
}
