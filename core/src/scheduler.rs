use crate::framer::{Symbol, SymbolFramer};
use std::collections::VecDeque;

/// Opaque identifier the caller attaches to a transmit request
pub type MessageId = u64;

#[derive(Debug)]
struct PendingMessage {
    id: MessageId,
    payload: Vec<u8>,
}

#[derive(Debug)]
struct ActiveMessage {
    id: MessageId,
    framer: SymbolFramer,
}

/// Outcome of [`TransmitScheduler::advance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Next symbol of the active message
    Symbol(Symbol),
    /// The active message finished its tail. Reported exactly once per message.
    Completed(MessageId),
    /// Nothing queued
    Idle,
}

/// FIFO of outgoing messages, serialized one at a time.
///
/// The queue is unbounded; `schedule` never blocks.
#[derive(Debug, Default)]
pub struct TransmitScheduler {
    pending: VecDeque<PendingMessage>,
    active: Option<ActiveMessage>,
}

impl TransmitScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, id: MessageId, payload: Vec<u8>) {
        log::trace!("queued message {} ({} bytes)", id, payload.len());
        self.pending.push_back(PendingMessage { id, payload });
    }

    /// Move to the next symbol, starting the next queued message if none is active
    pub fn advance(&mut self) -> Step {
        if self.active.is_none() {
            let Some(next) = self.pending.pop_front() else {
                return Step::Idle;
            };
            log::trace!("starting message {}", next.id);
            self.active = Some(ActiveMessage {
                id: next.id,
                framer: SymbolFramer::new(next.payload),
            });
        }

        let Some(active) = self.active.as_mut() else {
            return Step::Idle;
        };

        match active.framer.next() {
            Some(symbol) => Step::Symbol(symbol),
            None => {
                let id = active.id;
                self.active = None;
                log::trace!("message {} complete", id);
                Step::Completed(id)
            }
        }
    }

    /// Id of the message currently being serialized
    pub fn active_id(&self) -> Option<MessageId> {
        self.active.as_ref().map(|active| active.id)
    }

    /// Messages waiting behind the active one
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.pending.is_empty()
    }
}
