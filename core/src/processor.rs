use crate::deframer::ReceivedMessage;
use crate::error::{AudioModemError, Result};
use crate::params::FskParameters;
use crate::scheduler::MessageId;

/// Control messages delivered to a processor from the control context
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Configure(FskParameters),
    Transmit { id: MessageId, bytes: Vec<u8> },
}

/// Notifications produced while processing blocks
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A scheduled message finished transmitting its tail
    Completed { id: MessageId },
    /// The receiver flushed a non-empty message
    Received(ReceivedMessage),
}

/// A block-driven audio processor.
///
/// Implementations do all their work synchronously inside [`process`](Self::process)
/// and never block. Until [`configure`](Self::configure) succeeds, processing is a
/// no-op.
pub trait Processor {
    /// Apply the session parameters. Can only be done once.
    fn configure(&mut self, params: FskParameters) -> Result<()>;

    fn is_configured(&self) -> bool;

    /// Queue a message for transmission
    fn transmit(&mut self, id: MessageId, bytes: Vec<u8>) -> Result<()> {
        let _ = (id, bytes);
        Err(AudioModemError::Unsupported("this processor cannot transmit"))
    }

    /// Process one block of samples.
    ///
    /// Producers write into `block` and return how many samples they wrote; the
    /// rest is left for the caller to fill with silence. Consumers read the
    /// whole block and return its length. Events raised during the block are
    /// appended to `events`.
    fn process(&mut self, block: &mut [f32], events: &mut Vec<Event>) -> usize;

    /// Dispatch a control message
    fn handle(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Configure(params) => self.configure(params),
            Command::Transmit { id, bytes } => self.transmit(id, bytes),
        }
    }
}
