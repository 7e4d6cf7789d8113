//! Accuracy Degradation
//!
//! Deliberately lowers classifier accuracy to an operator-chosen target.
//!
//! Per call:
//! - `jitter` uniform in [-noise_factor, +noise_factor]
//! - constant `bias_factor` subtracted (always toward allow)
//! - with probability `target_accuracy` the result is held on the same side of
//!   the threshold as the undegraded score, otherwise it is pushed across
//!
//! The side-holding step is what makes agreement with the undegraded verdict
//! converge to `target_accuracy` for any noise/bias combination; noise and bias
//! only shape where within its side the reported score lands.
//!
//! Accuracy here is measured against the undegraded classifier, which is
//! treated as the ceiling. Against ground-truth labels the expected accuracy is
//! `p*A + (1-p)*(1-A)` for target `p` and base accuracy `A`, so it equals the
//! target only when the base classifier is itself correct.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::AccuracySettings;

/// Smallest step below the threshold that still counts as allow
const BELOW_THRESHOLD_STEP: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DegradedScore {
    pub score: f64,
    pub jitter: f64,
    /// False when this draw was selected to disagree with the undegraded verdict
    pub held_side: bool,
}

pub fn degrade<R: Rng>(
    raw: f64,
    threshold: f64,
    settings: &AccuracySettings,
    rng: &mut R,
) -> DegradedScore {
    let unit: f64 = rng.gen_range(-1.0..=1.0);
    let jitter = unit * settings.noise_factor;
    let shifted = (raw + jitter - settings.bias_factor).clamp(0.0, 1.0);

    let held_side = rng.gen::<f64>() < settings.target_accuracy;
    let undegraded_block = raw >= threshold;
    let want_block = if held_side { undegraded_block } else { !undegraded_block };

    DegradedScore {
        score: settle(shifted, threshold, want_block),
        jitter,
        held_side,
    }
}

/// Move `score` onto the wanted side of `threshold` by mirroring across it.
fn settle(score: f64, threshold: f64, want_block: bool) -> f64 {
    if (score >= threshold) == want_block {
        return score;
    }

    let mirrored = (2.0 * threshold - score).clamp(0.0, 1.0);
    if want_block {
        mirrored.max(threshold)
    } else {
        mirrored.min(threshold - BELOW_THRESHOLD_STEP).max(0.0)
    }
}
