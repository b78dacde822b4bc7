use crate::error::{AudioModemError, Result};
use crate::params::FskParameters;

/// Delay-and-correlate FM discriminator working on hard-limited samples.
///
/// Every input sample is reduced to its polarity and multiplied with the
/// polarity seen `delay_len` samples earlier. A running sum over the last
/// `correlator_len` products leans positive for one tone and negative for the
/// other, so no local oscillator or carrier reference is needed.
///
/// Both buffers are allocated once; [`push`](Self::push) does not allocate.
#[derive(Debug, Clone)]
pub struct Discriminator {
    delay: Box<[i8]>,
    delay_pos: usize,
    correlator: Box<[i8]>,
    corr_pos: usize,
    corr_sum: i32,
    /// Set when space sits above mark, which flips the sign convention
    invert: bool,
}

impl Discriminator {
    pub fn new(delay_len: usize, correlator_len: usize, invert: bool) -> Result<Self> {
        if delay_len == 0 || correlator_len == 0 {
            return Err(AudioModemError::InvalidConfig(format!(
                "discriminator buffers must not be empty (delay {}, correlator {})",
                delay_len, correlator_len
            )));
        }

        Ok(Self {
            delay: vec![0; delay_len].into_boxed_slice(),
            delay_pos: 0,
            correlator: vec![0; correlator_len].into_boxed_slice(),
            corr_pos: 0,
            corr_sum: 0,
            invert,
        })
    }

    pub fn from_params(params: &FskParameters) -> Result<Self> {
        let (delay_len, correlator_len) = params.receive_buffer_sizes()?;
        Self::new(delay_len, correlator_len, params.inverted())
    }

    pub fn delay_len(&self) -> usize {
        self.delay.len()
    }

    pub fn correlator_len(&self) -> usize {
        self.correlator.len()
    }

    /// Current correlator sum, in [-correlator_len, correlator_len]
    pub fn correlation(&self) -> i32 {
        self.corr_sum
    }

    /// Classify one sample: `true` for mark, `false` for space
    #[inline]
    pub fn push(&mut self, sample: f32) -> bool {
        let polarity: i8 = if sample >= 0.0 { 1 } else { -1 };

        // Both buffers start zeroed, so warm-up contributes nothing
        let product = self.delay[self.delay_pos] * polarity;

        self.corr_sum += i32::from(product) - i32::from(self.correlator[self.corr_pos]);
        self.correlator[self.corr_pos] = product;
        self.corr_pos = (self.corr_pos + 1) % self.correlator.len();

        self.delay[self.delay_pos] = polarity;
        self.delay_pos = (self.delay_pos + 1) % self.delay.len();

        (self.corr_sum >= 0) ^ self.invert
    }

    pub fn reset(&mut self) {
        self.delay.fill(0);
        self.correlator.fill(0);
        self.delay_pos = 0;
        self.corr_pos = 0;
        self.corr_sum = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Mode;
    use std::f64::consts::TAU;

    fn tone(freq: f64, rate: f64, len: usize) -> Vec<f32> {
        (0..len)
            .map(|n| (TAU * freq * n as f64 / rate).sin() as f32)
            .collect()
    }

    fn settled_decision(disc: &mut Discriminator, samples: &[f32]) -> bool {
        let mut last = false;
        for &s in samples {
            last = disc.push(s);
        }
        last
    }

    #[test]
    fn test_rejects_empty_buffers() {
        assert!(Discriminator::new(0, 10, false).is_err());
        assert!(Discriminator::new(10, 0, false).is_err());
    }

    #[test]
    fn test_sizes_from_params() {
        let params = FskParameters::from_mode(Mode::Bell103, 48000.0, 1.0, 0.5);
        let disc = Discriminator::from_params(&params).unwrap();
        assert_eq!(disc.delay_len(), 112);
        assert_eq!(disc.correlator_len(), 120);
    }

    #[test]
    fn test_classifies_bell103_tones() {
        let params = FskParameters::from_mode(Mode::Bell103, 48000.0, 1.0, 0.5);

        let mut disc = Discriminator::from_params(&params).unwrap();
        assert!(settled_decision(&mut disc, &tone(1270.0, 48000.0, 2000)));

        let mut disc = Discriminator::from_params(&params).unwrap();
        assert!(!settled_decision(&mut disc, &tone(1070.0, 48000.0, 2000)));
    }

    #[test]
    fn test_classifies_bell202_tones_with_inversion() {
        for rate in [22050.0, 44100.0, 48000.0] {
            let params = FskParameters::from_mode(Mode::Bell202, rate, 1.0, 0.5);

            let mut disc = Discriminator::from_params(&params).unwrap();
            assert!(
                settled_decision(&mut disc, &tone(1200.0, rate, 2000)),
                "mark at {} Hz",
                rate
            );

            let mut disc = Discriminator::from_params(&params).unwrap();
            assert!(
                !settled_decision(&mut disc, &tone(2200.0, rate, 2000)),
                "space at {} Hz",
                rate
            );
        }
    }

    #[test]
    fn test_correlation_is_bounded() {
        let mut disc = Discriminator::new(5, 16, false).unwrap();
        let mut state = 0x1234_5678u32;
        for _ in 0..10_000 {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            disc.push(if state & 0x8000_0000 != 0 { 0.3 } else { -0.3 });
            assert!(disc.correlation().abs() <= 16);
        }
    }

    #[test]
    fn test_constant_input_correlates_positive() {
        // Silence reads as polarity +1 everywhere
        let mut disc = Discriminator::new(3, 8, false).unwrap();
        for _ in 0..20 {
            disc.push(0.0);
        }
        assert_eq!(disc.correlation(), 8);

        let mut inverted = Discriminator::new(3, 8, true).unwrap();
        let mut last = true;
        for _ in 0..20 {
            last = inverted.push(0.0);
        }
        assert!(!last);
    }

    #[test]
    fn test_reset() {
        let mut disc = Discriminator::new(4, 8, false).unwrap();
        for _ in 0..20 {
            disc.push(1.0);
        }
        assert_ne!(disc.correlation(), 0);
        disc.reset();
        assert_eq!(disc.correlation(), 0);
    }
}
