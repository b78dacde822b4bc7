//! Receive delay search for the delay-and-correlate discriminator
//!
//! The discriminator multiplies the input with a copy of itself delayed by τ.
//! For a pure tone at f the product averages to cos(2πfτ), so the best τ is the
//! one where the two tones land as far apart as possible:
//!
//! ```text
//! score(τ) = |cos(2π f1 τ) − cos(2π f2 τ)|,   0 ≤ τ < 1 / baud
//! ```
//!
//! The upper bound keeps the delay shorter than one bit so that the correlator
//! never compares samples from two different symbols for long.

use std::f64::consts::TAU;

/// Grid points for the first pass over one bit period
const COARSE_STEPS: usize = 200_000;

/// Grid points for each refinement pass around the best coarse point
const REFINE_STEPS: usize = 1_000;

const REFINE_PASSES: usize = 3;

/// Result of [`optimal_rx_delay`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayEstimate {
    /// Delay in seconds
    pub delay: f64,
    /// Tone separation at that delay, in [0, 2]
    pub score: f64,
}

pub(crate) fn separation(f1: f64, f2: f64, delay: f64) -> f64 {
    ((TAU * f1 * delay).cos() - (TAU * f2 * delay).cos()).abs()
}

/// Find the correlation delay that best separates tones `f1` and `f2` at the
/// given baud rate.
///
/// Scans one bit period on a coarse grid, then narrows in on the best point.
/// Returns a zero estimate when `baud` is not positive.
pub fn optimal_rx_delay(baud: f64, f1: f64, f2: f64) -> DelayEstimate {
    let mut best = DelayEstimate {
        delay: 0.0,
        score: 0.0,
    };

    if !(baud.is_finite() && baud > 0.0) {
        return best;
    }

    let period = 1.0 / baud;
    let consider = |delay: f64, best: &mut DelayEstimate| {
        let score = separation(f1, f2, delay);
        if score > best.score {
            *best = DelayEstimate { delay, score };
        }
    };

    for i in 0..COARSE_STEPS {
        let delay = period * i as f64 / COARSE_STEPS as f64;
        consider(delay, &mut best);
    }

    let mut step = period / COARSE_STEPS as f64;
    for _ in 0..REFINE_PASSES {
        let low = (best.delay - step).max(0.0);
        let high = (best.delay + step).min(period);
        let fine = (high - low) / REFINE_STEPS as f64;
        for i in 0..=REFINE_STEPS {
            consider(low + fine * i as f64, &mut best);
        }
        step = fine;
    }

    log::debug!(
        "optimal receive delay for {} baud, {}/{} Hz: {:.12} s (score {:.12})",
        baud,
        f1,
        f2,
        best.delay,
        best.score
    );

    best
}
