use crate::error::{AudioModemError, Result};
use crate::framer::{Symbol, SymbolTiming, Tone};
use crate::oscillator::Oscillator;
use crate::params::FskParameters;
use crate::processor::{Event, Processor};
use crate::scheduler::{MessageId, Step, TransmitScheduler};

#[derive(Debug, Clone)]
struct TxConfig {
    timing: SymbolTiming,
    mark_increment: f64,
    space_increment: f64,
}

impl TxConfig {
    fn increment(&self, tone: Tone) -> f64 {
        match tone {
            Tone::Mark => self.mark_increment,
            Tone::Space => self.space_increment,
        }
    }
}

/// Block-based FSK transmitter.
///
/// Messages are serialized back to back in the order they were scheduled with
/// continuous phase. Once the queue runs dry the phase returns to 0 and
/// [`process`](Processor::process) stops writing samples until another message
/// arrives.
#[derive(Debug, Default)]
pub struct Modulator {
    config: Option<TxConfig>,
    scheduler: TransmitScheduler,
    oscillator: Oscillator,
    increment: f64,
    /// Samples emitted since the current burst started
    sample_count: u64,
    /// Sample position where the current symbol ends
    symbol_end: f64,
}

impl Modulator {
    /// Create an unconfigured modulator
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: FskParameters) -> Result<Self> {
        let mut modulator = Self::new();
        modulator.configure(params)?;
        Ok(modulator)
    }

    /// Queue `payload` for transmission; never blocks
    pub fn schedule(&mut self, id: MessageId, payload: Vec<u8>) {
        self.scheduler.schedule(id, payload);
    }

    /// No message active or queued
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    pub fn active_id(&self) -> Option<MessageId> {
        self.scheduler.active_id()
    }

    pub fn phase(&self) -> f64 {
        self.oscillator.phase()
    }

    fn go_idle(&mut self) {
        self.oscillator.reset();
        self.sample_count = 0;
        self.symbol_end = 0.0;
    }

    fn render(&mut self, block: &mut [f32], events: &mut Vec<Event>) -> usize {
        let Some(config) = self.config.as_ref() else {
            return 0;
        };

        let mut written = 0;
        while written < block.len() {
            if self.sample_count as f64 >= self.symbol_end {
                match self.scheduler.advance() {
                    Step::Symbol(symbol) => {
                        self.increment = config.increment(symbol.tone());
                        self.symbol_end += config.timing.duration(symbol);
                        if symbol == Symbol::Preamble {
                            log::trace!("preamble for message {:?}", self.scheduler.active_id());
                        }
                    }
                    Step::Completed(id) => events.push(Event::Completed { id }),
                    Step::Idle => {
                        self.go_idle();
                        break;
                    }
                }
                continue;
            }

            block[written] = self.oscillator.next_sample(self.increment);
            written += 1;
            self.sample_count += 1;
        }

        written
    }
}

impl Processor for Modulator {
    fn configure(&mut self, params: FskParameters) -> Result<()> {
        if self.config.is_some() {
            return Err(AudioModemError::Unsupported("modulator is already configured"));
        }
        params.validate()?;

        log::debug!(
            "modulator configured: {} baud, mark {} Hz, space {} Hz, {} Hz, {:.2} samples/bit",
            params.baud,
            params.mark,
            params.space,
            params.sample_rate,
            params.samples_per_bit()
        );

        self.config = Some(TxConfig {
            timing: SymbolTiming::from_params(&params),
            mark_increment: params.mark_increment(),
            space_increment: params.space_increment(),
        });
        Ok(())
    }

    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    fn transmit(&mut self, id: MessageId, bytes: Vec<u8>) -> Result<()> {
        self.schedule(id, bytes);
        Ok(())
    }

    fn process(&mut self, block: &mut [f32], events: &mut Vec<Event>) -> usize {
        self.render(block, events)
    }
}
