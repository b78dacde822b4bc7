use crate::params::FskParameters;

/// What timing recovery made of one raw discriminator decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingDecision {
    /// Still inside the current bit period
    Pending,
    /// A full bit period elapsed; this is a clean bit
    Bit(bool),
    /// The tone changed less than one bit period after the previous change
    Failure,
}

/// Edge-triggered bit clock recovery.
///
/// Every tone transition re-centers the bit clock half a bit in, so bits are
/// sampled near the middle of their period. Between transitions the clock free
/// runs at `baud / sample_rate` bits per sample.
#[derive(Debug, Clone)]
pub struct BitTimingRecovery {
    bits_per_sample: f64,
    previous_bit: Option<bool>,
    emitted_bits: f64,
}

impl BitTimingRecovery {
    pub fn new(bits_per_sample: f64) -> Self {
        Self {
            bits_per_sample,
            previous_bit: None,
            emitted_bits: 0.0,
        }
    }

    pub fn from_params(params: &FskParameters) -> Self {
        Self::new(params.bits_per_sample())
    }

    pub fn previous_bit(&self) -> Option<bool> {
        self.previous_bit
    }

    pub fn emitted_bits(&self) -> f64 {
        self.emitted_bits
    }

    #[inline]
    pub fn push(&mut self, raw_bit: bool) -> TimingDecision {
        if self.previous_bit == Some(raw_bit) {
            let before = self.emitted_bits.floor();
            self.emitted_bits += self.bits_per_sample;
            if self.emitted_bits.floor() != before {
                TimingDecision::Bit(raw_bit)
            } else {
                TimingDecision::Pending
            }
        } else {
            let too_fast = self.emitted_bits < 1.0;
            self.previous_bit = Some(raw_bit);
            self.emitted_bits = 0.5;
            if too_fast {
                TimingDecision::Failure
            } else {
                TimingDecision::Pending
            }
        }
    }
}
