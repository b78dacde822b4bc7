use std::time::Duration;

/// Start bit clear, stop bit set, within a 10-bit window
const FRAME_MASK: u16 = 0x201;
const FRAME_VALID: u16 = 0x200;

/// A run of back-to-back bytes recovered by the receiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub bytes: Vec<u8>,
    /// Stream time of the first decoded byte
    pub start: Duration,
    /// Stream time of the flush that ended the message
    pub end: Duration,
}

impl ReceivedMessage {
    /// Payload as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// UART style deframer: reassembles `{start, d0..d7, stop}` frames from
/// clean bits and groups consecutive bytes into messages.
///
/// A window that fails the start/stop check ends the current message without
/// resetting the bit count, so the deframer slides bit by bit until a frame
/// lines up again. A timing failure also resets the count.
#[derive(Debug, Clone, Default)]
pub struct UartDeframer {
    symbol_buffer: u16,
    symbol_count: u32,
    bytes: Vec<u8>,
    started_at: Option<Duration>,
}

impl UartDeframer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bits shifted in since the last accepted frame or timing failure
    pub fn symbol_count(&self) -> u32 {
        self.symbol_count
    }

    /// Bytes of the message currently being assembled
    pub fn pending_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Feed one clean bit observed at stream time `now`
    pub fn push_bit(&mut self, bit: bool, now: Duration) -> Option<ReceivedMessage> {
        self.symbol_buffer = (u16::from(bit) << 9) | (self.symbol_buffer >> 1);
        self.symbol_count = self.symbol_count.saturating_add(1);

        if self.symbol_count < 10 {
            return None;
        }

        if self.symbol_buffer & FRAME_MASK == FRAME_VALID {
            let byte = ((self.symbol_buffer >> 1) & 0xFF) as u8;
            if self.bytes.is_empty() {
                self.started_at = Some(now);
            }
            self.bytes.push(byte);
            self.symbol_count = 0;
            None
        } else {
            self.flush(now)
        }
    }

    /// Timing recovery lost sync: end the message and realign from scratch
    pub fn fail(&mut self, now: Duration) -> Option<ReceivedMessage> {
        self.symbol_count = 0;
        self.flush(now)
    }

    /// Emit the bytes assembled so far, if any
    pub fn flush(&mut self, now: Duration) -> Option<ReceivedMessage> {
        if self.bytes.is_empty() {
            return None;
        }

        let bytes = std::mem::take(&mut self.bytes);
        let start = self.started_at.take().unwrap_or(now);
        log::trace!("flushing {} byte message", bytes.len());
        Some(ReceivedMessage {
            bytes,
            start,
            end: now,
        })
    }
}
