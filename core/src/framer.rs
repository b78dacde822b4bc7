use crate::params::FskParameters;
use std::iter::FusedIterator;

/// Bits per asynchronous frame: start + 8 data + stop
pub const FRAME_BITS: usize = 10;

/// One of the two FSK tones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Binary 1, also the idle/hold tone
    Mark,
    /// Binary 0
    Space,
}

impl Tone {
    pub fn from_bit(bit: bool) -> Self {
        if bit {
            Tone::Mark
        } else {
            Tone::Space
        }
    }

    pub fn bit(self) -> bool {
        self == Tone::Mark
    }
}

/// A single transmit symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// Mark hold before the first byte
    Preamble,
    StartBit,
    /// Data bit `index` (0 = least significant) of the current byte
    DataBit { index: u8, value: bool },
    StopBit,
    /// Mark hold after the last byte
    Tail,
}

impl Symbol {
    pub fn tone(self) -> Tone {
        match self {
            Symbol::Preamble | Symbol::StopBit | Symbol::Tail => Tone::Mark,
            Symbol::StartBit => Tone::Space,
            Symbol::DataBit { value, .. } => Tone::from_bit(value),
        }
    }

    pub fn is_bit(self) -> bool {
        !matches!(self, Symbol::Preamble | Symbol::Tail)
    }
}

/// How long each kind of symbol lasts, in (fractional) samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolTiming {
    pub samples_per_bit: f64,
    pub preamble_samples: f64,
    pub tail_samples: f64,
}

impl SymbolTiming {
    pub fn from_params(params: &FskParameters) -> Self {
        Self {
            samples_per_bit: params.samples_per_bit(),
            preamble_samples: params.preamble_samples(),
            tail_samples: params.tail_samples(),
        }
    }

    pub fn duration(&self, symbol: Symbol) -> f64 {
        match symbol {
            Symbol::Preamble => self.preamble_samples,
            Symbol::Tail => self.tail_samples,
            _ => self.samples_per_bit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FramerState {
    Preamble,
    /// `position` -1 is the start bit, 0..=7 data bits, 8 the stop bit
    Bit { byte: usize, position: i8 },
    Tail,
    Done,
}

/// Serializes one message into its symbol stream:
/// preamble, `{start, d0..d7, stop}` per byte, tail.
///
/// An empty payload goes straight from preamble to tail.
#[derive(Debug, Clone)]
pub struct SymbolFramer {
    payload: Vec<u8>,
    state: FramerState,
}

impl SymbolFramer {
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            payload,
            state: FramerState::Preamble,
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn is_done(&self) -> bool {
        self.state == FramerState::Done
    }

    fn first_byte_or_tail(&self, byte: usize) -> FramerState {
        if byte < self.payload.len() {
            FramerState::Bit { byte, position: -1 }
        } else {
            FramerState::Tail
        }
    }

    fn remaining(&self) -> usize {
        let bits_from = |byte: usize, position: i8| {
            (self.payload.len() - byte) * FRAME_BITS - (position + 1) as usize
        };
        match self.state {
            FramerState::Preamble => 2 + self.payload.len() * FRAME_BITS,
            FramerState::Bit { byte, position } => bits_from(byte, position) + 1,
            FramerState::Tail => 1,
            FramerState::Done => 0,
        }
    }
}

impl Iterator for SymbolFramer {
    type Item = Symbol;

    fn next(&mut self) -> Option<Symbol> {
        let (symbol, next) = match self.state {
            FramerState::Preamble => (Symbol::Preamble, self.first_byte_or_tail(0)),
            FramerState::Bit { byte, position } => {
                let symbol = match position {
                    -1 => Symbol::StartBit,
                    8 => Symbol::StopBit,
                    index => Symbol::DataBit {
                        index: index as u8,
                        value: (self.payload[byte] >> index) & 1 == 1,
                    },
                };
                let next = if position < 8 {
                    FramerState::Bit {
                        byte,
                        position: position + 1,
                    }
                } else {
                    self.first_byte_or_tail(byte + 1)
                };
                (symbol, next)
            }
            FramerState::Tail => (Symbol::Tail, FramerState::Done),
            FramerState::Done => return None,
        };

        self.state = next;
        Some(symbol)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SymbolFramer {}

impl FusedIterator for SymbolFramer {}
