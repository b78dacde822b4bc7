use std::f64::consts::TAU;

/// Phase increment per sample (radians) for a tone at `frequency` Hz
pub fn phase_increment(frequency: f64, sample_rate: f64) -> f64 {
    TAU * frequency / sample_rate
}

/// Continuous-phase sine source.
///
/// The caller picks the phase increment for every sample, so switching tones
/// never produces a phase jump. The phase stays in [0, 2π] to bound the
/// floating point error of long transmissions.
#[derive(Debug, Clone, Default)]
pub struct Oscillator {
    phase: f64,
}

impl Oscillator {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Emit `sin(phase)` and advance by `increment`.
    ///
    /// A single subtraction is enough to wrap since the increment is always far
    /// below 2π for audio tones.
    #[inline]
    pub fn next_sample(&mut self, increment: f64) -> f32 {
        let sample = self.phase.sin() as f32;
        self.phase += increment;
        if self.phase > TAU {
            self.phase -= TAU;
        }
        sample
    }
}
