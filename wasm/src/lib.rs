use fskmodem_core::{Demodulator, Event, FskParameters, Modulator, Processor, ReceivedMessage};
use wasm_bindgen::prelude::*;

fn to_js(e: fskmodem_core::AudioModemError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn params(mode: &str, sample_rate: f64, preamble: f64, tail: f64) -> Result<FskParameters, JsValue> {
    FskParameters::from_mode_name(mode, sample_rate, preamble, tail).map_err(to_js)
}

/// Transmit side of an AudioWorklet: call `process` from the worklet's
/// `process()` with each output block.
#[wasm_bindgen]
pub struct WasmModulator {
    inner: Modulator,
    events: Vec<Event>,
    completed: Vec<u32>,
}

#[wasm_bindgen]
impl WasmModulator {
    #[wasm_bindgen(constructor)]
    pub fn new(
        mode: &str,
        sample_rate: f64,
        preamble: f64,
        tail: f64,
    ) -> Result<WasmModulator, JsValue> {
        Modulator::with_params(params(mode, sample_rate, preamble, tail)?)
            .map(|inner| WasmModulator {
                inner,
                events: Vec::new(),
                completed: Vec::new(),
            })
            .map_err(to_js)
    }

    /// Queue a Uint8Array for transmission
    pub fn transmit(&mut self, id: u32, data: &[u8]) {
        self.inner.schedule(u64::from(id), data.to_vec());
    }

    /// Fill an output block. Returns the number of samples written; the rest
    /// of the block is zeroed.
    pub fn process(&mut self, block: &mut [f32]) -> usize {
        let written = self.inner.process(block, &mut self.events);
        block[written..].fill(0.0);
        for event in self.events.drain(..) {
            if let Event::Completed { id } = event {
                // Ids come in as u32
                self.completed.push(id as u32);
            }
        }
        written
    }

    #[wasm_bindgen(js_name = isIdle)]
    pub fn is_idle(&self) -> bool {
        self.inner.is_idle()
    }

    /// Ids of messages that finished since the last call
    #[wasm_bindgen(js_name = takeCompleted)]
    pub fn take_completed(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.completed)
    }
}

/// Receive side of an AudioWorklet
#[wasm_bindgen]
pub struct WasmDemodulator {
    inner: Demodulator,
    events: Vec<Event>,
    received: Vec<ReceivedMessage>,
}

#[wasm_bindgen]
impl WasmDemodulator {
    #[wasm_bindgen(constructor)]
    pub fn new(mode: &str, sample_rate: f64) -> Result<WasmDemodulator, JsValue> {
        // Preamble and tail only matter when transmitting
        Demodulator::with_params(params(mode, sample_rate, 0.0, 0.0)?)
            .map(|inner| WasmDemodulator {
                inner,
                events: Vec::new(),
                received: Vec::new(),
            })
            .map_err(to_js)
    }

    /// Consume an input block
    pub fn process(&mut self, block: &mut [f32]) {
        self.inner.process(block, &mut self.events);
        for event in self.events.drain(..) {
            if let Event::Received(message) = event {
                self.received.push(message);
            }
        }
    }

    /// Flush a message still being assembled, e.g. when the input stops
    pub fn finish(&mut self) {
        if let Some(message) = self.inner.finish() {
            self.received.push(message);
        }
    }

    #[wasm_bindgen(js_name = receivedCount)]
    pub fn received_count(&self) -> usize {
        self.received.len()
    }

    /// Messages received since the last call, as
    /// `{ bytes: Uint8Array, start: number, end: number }` with times in seconds
    #[wasm_bindgen(js_name = takeReceived)]
    pub fn take_received(&mut self) -> Result<js_sys::Array, JsValue> {
        let out = js_sys::Array::new();
        for message in self.received.drain(..) {
            let entry = js_sys::Object::new();
            js_sys::Reflect::set(
                &entry,
                &"bytes".into(),
                &js_sys::Uint8Array::from(message.bytes.as_slice()),
            )?;
            js_sys::Reflect::set(
                &entry,
                &"start".into(),
                &message.start.as_secs_f64().into(),
            )?;
            js_sys::Reflect::set(&entry, &"end".into(), &message.end.as_secs_f64().into())?;
            out.push(&entry);
        }
        Ok(out)
    }
}

/// Names of the built-in modes
#[wasm_bindgen(js_name = modeNames)]
pub fn mode_names() -> Vec<String> {
    fskmodem_core::Mode::ALL
        .iter()
        .map(|mode| mode.name().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worklet_loopback() {
        let mut tx = WasmModulator::new("bell103", 48000.0, 0.2, 0.1).unwrap();
        let mut rx = WasmDemodulator::new("bell103", 48000.0).unwrap();
        tx.transmit(5, b"worklet");

        let mut block = [0.0f32; 128];
        loop {
            let written = tx.process(&mut block);
            rx.process(&mut block);
            if written < block.len() {
                break;
            }
        }
        rx.finish();

        assert!(tx.is_idle());
        assert_eq!(tx.take_completed(), vec![5]);
        assert!(tx.take_completed().is_empty());
        assert_eq!(rx.received_count(), 1);
        assert_eq!(rx.received[0].bytes, b"worklet".to_vec());
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(mode_names(), vec!["bell103", "bell202"]);
    }
}
