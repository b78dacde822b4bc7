//! Software FSK modem for the audio band
//!
//! Implements the Bell 103 (300 baud) and Bell 202 (1200 baud) tone plans with
//! asynchronous UART framing. Both directions are block-driven processors that
//! do no I/O of their own: the caller hands them sample buffers from an audio
//! callback, a WAV file or a test harness.

pub mod delay;
pub mod demodulator;
pub mod deframer;
pub mod discriminator;
pub mod error;
pub mod framer;
pub mod host;
pub mod mixdown;
pub mod modulator;
pub mod oscillator;
pub mod params;
pub mod processor;
pub mod scheduler;
pub mod timing;

pub use deframer::ReceivedMessage;
pub use delay::{optimal_rx_delay, DelayEstimate};
pub use demodulator::Demodulator;
pub use error::{AudioModemError, Result};
pub use host::{host_channel, Controller, ProcessorHost};
pub use mixdown::interleaved_to_mono;
pub use modulator::Modulator;
pub use params::{mode_params, FskParameters, Mode, ModeParams};
pub use processor::{Command, Event, Processor};
pub use scheduler::MessageId;

/// Block size used by browser audio worklets
pub const DEFAULT_BLOCK_SIZE: usize = 128;

/// Default mark hold before each message (seconds)
pub const DEFAULT_PREAMBLE: f64 = 1.0;

/// Default mark hold after each message (seconds)
pub const DEFAULT_TAIL: f64 = 0.5;
