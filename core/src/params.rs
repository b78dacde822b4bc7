use crate::delay::{optimal_rx_delay, separation};
use crate::error::{AudioModemError, Result};
use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

/// Length of the correlator window relative to one bit period.
///
/// Experimentally gives the best results in noisy rooms; shorter windows react
/// faster to tone changes but let more noise through.
pub const CORRELATOR_RATIO: f64 = 6.0 / 8.0;

/// Share of the ideal tone separation the discriminator must keep once its
/// delay is rounded to whole samples. Below it even a clean signal decodes
/// with errors (bell103 at 8 kHz, bell202 at 16 kHz). Such configurations are
/// accepted but logged.
pub const MIN_DELAY_SEPARATION: f64 = 0.8;

/// Frequency plan of a named modem standard
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeParams {
    /// Symbol rate in bits per second
    pub baud: f64,
    /// Tone for binary 1 (Hz)
    pub mark: f64,
    /// Tone for binary 0 (Hz)
    pub space: f64,
    /// Receive correlation delay (seconds), precomputed with
    /// [`optimal_rx_delay`](crate::delay::optimal_rx_delay)
    pub rx_delay: f64,
}

/// Named parameter presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Bell 103, originate side: 300 baud, 1070/1270 Hz
    Bell103,
    /// Bell 202: 1200 baud, 2200/1200 Hz
    Bell202,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Bell103, Mode::Bell202];

    pub fn name(self) -> &'static str {
        match self {
            Mode::Bell103 => "bell103",
            Mode::Bell202 => "bell202",
        }
    }

    pub fn params(self) -> ModeParams {
        match self {
            // score: 1.991238538645
            Mode::Bell103 => ModeParams {
                baud: 300.0,
                mark: 1270.0,
                space: 1070.0,
                rx_delay: 0.002_351_515_183,
            },
            // score: 1.968674618863
            Mode::Bell202 => ModeParams {
                baud: 1200.0,
                mark: 1200.0,
                space: 2200.0,
                rx_delay: 0.000_445_898_150,
            },
        }
    }
}

impl FromStr for Mode {
    type Err = AudioModemError;

    fn from_str(name: &str) -> Result<Self> {
        Mode::ALL
            .iter()
            .copied()
            .find(|mode| mode.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| AudioModemError::UnknownMode(name.to_string()))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Look up a preset by protocol name (`"bell103"`, `"bell202"`)
pub fn mode_params(name: &str) -> Result<ModeParams> {
    name.parse::<Mode>().map(Mode::params)
}

/// Everything a modulator or demodulator needs to know about the link.
///
/// The sample rate belongs to the audio environment and is passed in
/// explicitly; nothing in the engine reads it from global state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FskParameters {
    pub baud: f64,
    pub mark: f64,
    pub space: f64,
    pub sample_rate: f64,
    /// Receive correlation delay in seconds. Derived from the tone plan when unset.
    pub rx_delay: Option<f64>,
    /// Mark tone held before each message (seconds)
    pub preamble: f64,
    /// Mark tone held after each message (seconds)
    pub tail: f64,
}

impl FskParameters {
    pub fn new(
        baud: f64,
        mark: f64,
        space: f64,
        sample_rate: f64,
        preamble: f64,
        tail: f64,
    ) -> Self {
        Self {
            baud,
            mark,
            space,
            sample_rate,
            rx_delay: None,
            preamble,
            tail,
        }
    }

    pub fn from_mode(mode: Mode, sample_rate: f64, preamble: f64, tail: f64) -> Self {
        let plan = mode.params();
        Self::new(plan.baud, plan.mark, plan.space, sample_rate, preamble, tail)
            .with_rx_delay(plan.rx_delay)
    }

    /// Same as [`from_mode`](Self::from_mode) but resolves the mode by name
    pub fn from_mode_name(name: &str, sample_rate: f64, preamble: f64, tail: f64) -> Result<Self> {
        let mode = name.parse::<Mode>()?;
        Ok(Self::from_mode(mode, sample_rate, preamble, tail))
    }

    pub fn with_rx_delay(mut self, rx_delay: f64) -> Self {
        self.rx_delay = Some(rx_delay);
        self
    }

    /// Check the invariants shared by both directions
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("baud", self.baud),
            ("mark frequency", self.mark),
            ("space frequency", self.space),
            ("sample rate", self.sample_rate),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(AudioModemError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        if self.mark == self.space {
            return Err(AudioModemError::InvalidConfig(format!(
                "mark and space frequencies must differ, both are {} Hz",
                self.mark
            )));
        }

        for (name, value) in [("preamble", self.preamble), ("tail", self.tail)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(AudioModemError::InvalidConfig(format!(
                    "{} duration must be non-negative, got {}",
                    name, value
                )));
            }
        }

        if let Some(delay) = self.rx_delay {
            if !(delay.is_finite() && delay > 0.0) {
                return Err(AudioModemError::InvalidConfig(format!(
                    "receive delay must be positive, got {}",
                    delay
                )));
            }
        }

        Ok(())
    }

    pub fn samples_per_bit(&self) -> f64 {
        self.sample_rate / self.baud
    }

    pub fn bits_per_sample(&self) -> f64 {
        self.baud / self.sample_rate
    }

    /// Phase advance per sample for the mark tone (radians)
    pub fn mark_increment(&self) -> f64 {
        TAU * self.mark / self.sample_rate
    }

    /// Phase advance per sample for the space tone (radians)
    pub fn space_increment(&self) -> f64 {
        TAU * self.space / self.sample_rate
    }

    pub fn preamble_samples(&self) -> f64 {
        self.preamble * self.sample_rate
    }

    pub fn tail_samples(&self) -> f64 {
        self.tail * self.sample_rate
    }

    /// Whether the space tone sits above the mark tone, which flips the
    /// sign convention of the correlator output
    pub fn inverted(&self) -> bool {
        self.space > self.mark
    }

    /// Receive delay in seconds, running the optimizer when none was supplied
    pub fn effective_rx_delay(&self) -> f64 {
        match self.rx_delay {
            Some(delay) => delay,
            None => optimal_rx_delay(self.baud, self.mark, self.space).delay,
        }
    }

    /// Delay line and correlator lengths for the receive path.
    ///
    /// Fails when either would be empty, which only happens for sample rates far
    /// too low for the chosen tones.
    pub fn receive_buffer_sizes(&self) -> Result<(usize, usize)> {
        self.buffer_sizes_for(self.effective_rx_delay())
    }

    /// Tone separation at the delay the discriminator actually runs with (a
    /// whole number of samples), relative to the separation at the exact delay.
    ///
    /// 1.0 means rounding cost nothing; compare against [`MIN_DELAY_SEPARATION`].
    pub fn delay_separation(&self) -> Result<f64> {
        let delay = self.effective_rx_delay();
        let (delay_len, _) = self.buffer_sizes_for(delay)?;

        let ideal = separation(self.mark, self.space, delay);
        if ideal <= 0.0 {
            return Ok(0.0);
        }
        let rounded = separation(self.mark, self.space, delay_len as f64 / self.sample_rate);
        Ok(rounded / ideal)
    }

    fn buffer_sizes_for(&self, delay: f64) -> Result<(usize, usize)> {
        let delay_len = (delay * self.sample_rate).round() - 1.0;
        let correlator_len = (CORRELATOR_RATIO * self.samples_per_bit()).round();

        if !(delay_len >= 1.0) {
            return Err(AudioModemError::InvalidConfig(format!(
                "receive delay of {:.9} s is shorter than two samples at {} Hz",
                delay, self.sample_rate
            )));
        }
        if !(correlator_len >= 1.0) {
            return Err(AudioModemError::InvalidConfig(format!(
                "correlator window is empty at {} baud / {} Hz",
                self.baud, self.sample_rate
            )));
        }

        Ok((delay_len as usize, correlator_len as usize))
    }
}
