//! Runs a [`Processor`] on the audio side of a pair of channels.
//!
//! The control side holds a [`Controller`] and the event [`Receiver`]; the
//! audio callback owns the [`ProcessorHost`] and calls
//! [`render`](ProcessorHost::render) once per block. The host never blocks:
//! commands are picked up with `try_recv` at the start of each block, and
//! events go out through an unbounded channel.

use crate::error::{AudioModemError, Result};
use crate::params::FskParameters;
use crate::processor::{Command, Event, Processor};
use crate::scheduler::MessageId;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// Control side handle for a hosted processor
#[derive(Debug, Clone)]
pub struct Controller {
    commands: Sender<Command>,
}

impl Controller {
    /// Validate and send the session parameters.
    ///
    /// Invalid parameters are rejected here, before the audio side sees them.
    /// Receive-only constraints are left to the demodulator's own `configure`.
    pub fn configure(&self, params: FskParameters) -> Result<()> {
        params.validate()?;
        self.send(Command::Configure(params))
    }

    pub fn transmit(&self, id: MessageId, bytes: impl Into<Vec<u8>>) -> Result<()> {
        self.send(Command::Transmit {
            id,
            bytes: bytes.into(),
        })
    }

    pub fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| AudioModemError::Disconnected)
    }
}

/// Audio side owner of a processor and its channel ends
#[derive(Debug)]
pub struct ProcessorHost<P> {
    processor: P,
    commands: Receiver<Command>,
    events: Sender<Event>,
    pending_events: Vec<Event>,
    disconnected: bool,
}

impl<P: Processor> ProcessorHost<P> {
    pub fn processor(&self) -> &P {
        &self.processor
    }

    pub fn processor_mut(&mut self) -> &mut P {
        &mut self.processor
    }

    pub fn into_inner(self) -> P {
        self.processor
    }

    /// Apply every command that arrived since the last block
    fn drain_commands(&mut self) {
        loop {
            match self.commands.try_recv() {
                Ok(command) => {
                    if let Err(e) = self.processor.handle(command) {
                        log::warn!("command rejected: {}", e);
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        log::debug!("controller dropped, no further commands");
                        self.disconnected = true;
                    }
                    break;
                }
            }
        }
    }

    /// Fill or consume one block.
    ///
    /// Returns how many samples the processor produced. Anything past that is
    /// overwritten with silence, so the whole block is always valid output.
    pub fn render(&mut self, block: &mut [f32]) -> usize {
        self.drain_commands();

        let written = self.processor.process(block, &mut self.pending_events);
        if written < block.len() {
            block[written..].fill(0.0);
        }

        for event in self.pending_events.drain(..) {
            if self.events.send(event).is_err() {
                log::warn!("event receiver dropped, discarding events");
                break;
            }
        }
        self.pending_events.clear();

        written
    }
}

/// Wire `processor` up to a fresh pair of channels
pub fn host_channel<P: Processor>(processor: P) -> (Controller, ProcessorHost<P>, Receiver<Event>) {
    let (command_tx, command_rx) = mpsc::channel();
    let (event_tx, event_rx) = mpsc::channel();

    let host = ProcessorHost {
        processor,
        commands: command_rx,
        events: event_tx,
        pending_events: Vec::new(),
        disconnected: false,
    };

    (Controller { commands: command_tx }, host, event_rx)
}
