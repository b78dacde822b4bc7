use crate::deframer::{ReceivedMessage, UartDeframer};
use crate::discriminator::Discriminator;
use crate::error::{AudioModemError, Result};
use crate::params::{FskParameters, MIN_DELAY_SEPARATION};
use crate::processor::{Event, Processor};
use crate::timing::{BitTimingRecovery, TimingDecision};
use std::time::Duration;

#[derive(Debug, Clone)]
struct RxChain {
    sample_rate: f64,
    discriminator: Discriminator,
    timing: BitTimingRecovery,
    deframer: UartDeframer,
}

/// Block-based FSK receiver.
///
/// Samples run through the discriminator, bit timing recovery and the UART
/// deframer. Every non-empty run of bytes is reported as an
/// [`Event::Received`] once the deframer flushes it. Timestamps count samples
/// since configuration, so they follow the stream rather than the wall clock.
#[derive(Debug, Default)]
pub struct Demodulator {
    state: Option<RxChain>,
    sample_count: u64,
}

impl Demodulator {
    /// Create an unconfigured demodulator
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: FskParameters) -> Result<Self> {
        let mut demodulator = Self::new();
        demodulator.configure(params)?;
        Ok(demodulator)
    }

    /// Stream time of the next sample
    pub fn elapsed(&self) -> Duration {
        match &self.state {
            Some(chain) => Duration::from_secs_f64(self.sample_count as f64 / chain.sample_rate),
            None => Duration::ZERO,
        }
    }

    /// Bytes decoded so far that have not been flushed yet
    pub fn pending_bytes(&self) -> &[u8] {
        self.state
            .as_ref()
            .map(|chain| chain.deframer.pending_bytes())
            .unwrap_or(&[])
    }

    /// End of stream: flush whatever is still being assembled
    pub fn finish(&mut self) -> Option<ReceivedMessage> {
        let now = self.elapsed();
        self.state.as_mut()?.deframer.flush(now)
    }

    /// Convenience wrapper for offline decoding: processes the whole signal in
    /// `block_size` chunks, then flushes.
    pub fn decode_all(&mut self, samples: &[f32], block_size: usize) -> Vec<ReceivedMessage> {
        let mut events = Vec::new();
        let mut block = vec![0.0f32; block_size.max(1)];
        for chunk in samples.chunks(block.len()) {
            let block = &mut block[..chunk.len()];
            block.copy_from_slice(chunk);
            self.process(block, &mut events);
        }

        let mut messages: Vec<ReceivedMessage> = events
            .into_iter()
            .filter_map(|event| match event {
                Event::Received(message) => Some(message),
                Event::Completed { .. } => None,
            })
            .collect();
        messages.extend(self.finish());
        messages
    }
}

impl Processor for Demodulator {
    fn configure(&mut self, params: FskParameters) -> Result<()> {
        if self.state.is_some() {
            return Err(AudioModemError::Unsupported("demodulator is already configured"));
        }
        params.validate()?;
        let params = params.with_rx_delay(params.effective_rx_delay());

        let discriminator = Discriminator::from_params(&params)?;
        let kept = params.delay_separation()?;
        if kept < MIN_DELAY_SEPARATION {
            log::warn!(
                "receive delay rounds to {} samples at {} Hz and keeps only {:.0}% of the tone separation, decoding will be unreliable",
                discriminator.delay_len(),
                params.sample_rate,
                kept * 100.0
            );
        }
        log::debug!(
            "demodulator configured: {} baud at {} Hz, delay {} samples, correlator {} samples{}",
            params.baud,
            params.sample_rate,
            discriminator.delay_len(),
            discriminator.correlator_len(),
            if params.inverted() { ", inverted" } else { "" }
        );

        self.state = Some(RxChain {
            sample_rate: params.sample_rate,
            discriminator,
            timing: BitTimingRecovery::from_params(&params),
            deframer: UartDeframer::new(),
        });
        self.sample_count = 0;
        Ok(())
    }

    fn is_configured(&self) -> bool {
        self.state.is_some()
    }

    fn process(&mut self, block: &mut [f32], events: &mut Vec<Event>) -> usize {
        let Some(chain) = self.state.as_mut() else {
            return block.len();
        };

        for &sample in block.iter() {
            let raw_bit = chain.discriminator.push(sample);
            let decision = chain.timing.push(raw_bit);
            self.sample_count += 1;

            let flushed = match decision {
                TimingDecision::Pending => None,
                TimingDecision::Bit(bit) => {
                    let now = stream_time(self.sample_count, chain.sample_rate);
                    chain.deframer.push_bit(bit, now)
                }
                TimingDecision::Failure => {
                    let now = stream_time(self.sample_count, chain.sample_rate);
                    chain.deframer.fail(now)
                }
            };

            if let Some(message) = flushed {
                log::trace!(
                    "received {} bytes between {:?} and {:?}",
                    message.bytes.len(),
                    message.start,
                    message.end
                );
                events.push(Event::Received(message));
            }
        }

        block.len()
    }
}

fn stream_time(samples: u64, sample_rate: f64) -> Duration {
    Duration::from_secs_f64(samples as f64 / sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modulator::Modulator;
    use crate::params::Mode;

    fn modulate(params: &FskParameters, payloads: &[&[u8]]) -> Vec<f32> {
        let mut modulator = Modulator::with_params(*params).unwrap();
        for (id, payload) in payloads.iter().enumerate() {
            modulator.schedule(id as u64, payload.to_vec());
        }

        let mut out = Vec::new();
        let mut events = Vec::new();
        let mut block = [0.0f32; 256];
        loop {
            let written = modulator.process(&mut block, &mut events);
            out.extend_from_slice(&block[..written]);
            if written < block.len() {
                return out;
            }
        }
    }

    #[test]
    fn test_unconfigured_is_noop() {
        let mut demodulator = Demodulator::new();
        let mut block = [0.5f32; 64];
        let mut events = Vec::new();
        assert_eq!(demodulator.process(&mut block, &mut events), 64);
        assert!(events.is_empty());
        assert_eq!(demodulator.elapsed(), Duration::ZERO);
        assert_eq!(demodulator.finish(), None);
    }

    #[test]
    fn test_configure_twice_rejected() {
        let params = FskParameters::from_mode(Mode::Bell103, 48000.0, 1.0, 0.5);
        let mut demodulator = Demodulator::with_params(params).unwrap();
        assert!(matches!(
            demodulator.configure(params),
            Err(AudioModemError::Unsupported(_))
        ));
    }

    #[test]
    fn test_rejects_too_low_sample_rate() {
        let params = FskParameters::from_mode(Mode::Bell202, 2000.0, 1.0, 0.5);
        assert!(Demodulator::with_params(params).is_err());
    }

    #[test]
    fn test_decodes_single_byte() {
        let params = FskParameters::from_mode(Mode::Bell103, 48000.0, 0.5, 0.2);
        let signal = modulate(&params, &[&[0x41]]);

        let mut demodulator = Demodulator::with_params(params).unwrap();
        let messages = demodulator.decode_all(&signal, 128);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].bytes, vec![0x41]);
    }

    #[test]
    fn test_timestamps_follow_stream() {
        let params = FskParameters::from_mode(Mode::Bell103, 48000.0, 0.5, 0.2);
        let signal = modulate(&params, &[b"timing"]);

        let mut demodulator = Demodulator::with_params(params).unwrap();
        let messages = demodulator.decode_all(&signal, 128);
        assert_eq!(messages.len(), 1);

        let message = &messages[0];
        // First stop bit ends 0.5 s + 10 bits in
        let first_byte = 0.5 + 10.0 / 300.0;
        assert!((message.start.as_secs_f64() - first_byte).abs() < 1.0 / 300.0);
        // Flushed by the first mark-only window in the tail
        let last_byte = 0.5 + 60.0 / 300.0;
        assert!(message.end > message.start);
        assert!(message.end.as_secs_f64() >= last_byte);
        assert!(message.end.as_secs_f64() <= last_byte + 0.2);
        assert_eq!(
            demodulator.elapsed(),
            Duration::from_secs_f64(signal.len() as f64 / 48000.0)
        );
    }

    #[test]
    fn test_finish_flushes_partial_message() {
        let params = FskParameters::from_mode(Mode::Bell103, 48000.0, 0.5, 0.02);
        let mut signal = modulate(&params, &[b"cut"]);

        // The tail is too short for the deframer to see an idle window
        let mut demodulator = Demodulator::with_params(params).unwrap();
        let mut events = Vec::new();
        demodulator.process(&mut signal, &mut events);
        assert!(events.is_empty());
        assert_eq!(demodulator.pending_bytes(), b"cut");

        let message = demodulator.finish().unwrap();
        assert_eq!(message.bytes, b"cut".to_vec());
        assert_eq!(demodulator.finish(), None);
    }

    #[test]
    fn test_silence_yields_nothing() {
        let params = FskParameters::from_mode(Mode::Bell103, 44100.0, 1.0, 0.5);
        let mut demodulator = Demodulator::with_params(params).unwrap();
        let messages = demodulator.decode_all(&vec![0.0; 44100], 512);
        assert!(messages.is_empty());
    }
}
