use crate::audio::Recording;
use crate::chat::parse_line;
use crate::error::{CliError, Result};
use base64::Engine;
use fskmodem_core::{
    host_channel, Demodulator, Event, FskParameters, Mode, Modulator, ReceivedMessage,
    DEFAULT_BLOCK_SIZE, DEFAULT_PREAMBLE, DEFAULT_TAIL,
};
use serde::Serialize;

/// Everything needed to set up either direction of the modem
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModemSettings {
    pub mode: Mode,
    pub sample_rate: u32,
    pub preamble: f64,
    pub tail: f64,
    pub block_size: usize,
}

impl Default for ModemSettings {
    fn default() -> Self {
        Self {
            mode: Mode::Bell103,
            sample_rate: 48000,
            preamble: DEFAULT_PREAMBLE,
            tail: DEFAULT_TAIL,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl ModemSettings {
    pub fn params(&self) -> FskParameters {
        FskParameters::from_mode(
            self.mode,
            f64::from(self.sample_rate),
            self.preamble,
            self.tail,
        )
    }

    fn check_block_size(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(CliError::InvalidInput(
                "block size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Modulate `messages` back to back, the way an audio callback would drive
/// the modulator, until every message has reported completion.
pub fn encode(settings: &ModemSettings, messages: &[Vec<u8>]) -> Result<Vec<f32>> {
    settings.check_block_size()?;

    let (controller, mut host, events) = host_channel(Modulator::new());
    controller.configure(settings.params())?;
    for (id, message) in messages.iter().enumerate() {
        controller.transmit(id as u64, message.clone())?;
    }

    let mut samples = Vec::new();
    let mut completed = 0;
    let mut block = vec![0.0f32; settings.block_size];
    loop {
        let written = host.render(&mut block);
        samples.extend_from_slice(&block[..written]);
        completed += events
            .try_iter()
            .filter(|event| matches!(event, Event::Completed { .. }))
            .count();

        if written < block.len() {
            break;
        }
    }

    if completed != messages.len() {
        return Err(CliError::InvalidInput(format!(
            "modulator went idle after {} of {} messages",
            completed,
            messages.len()
        )));
    }

    tracing::debug!(
        "encoded {} messages into {} samples",
        messages.len(),
        samples.len()
    );
    Ok(samples)
}

/// Feed a recording through the demodulator block by block and collect
/// everything it reports, including a message cut off by the end of the audio.
pub fn decode(mode: Mode, block_size: usize, recording: &Recording) -> Result<Vec<ReceivedMessage>> {
    let settings = ModemSettings {
        mode,
        sample_rate: recording.sample_rate,
        block_size,
        ..ModemSettings::default()
    };
    settings.check_block_size()?;
    let block_size = block_size.min(recording.samples.len().max(1));

    // Configured up front so receive-side errors surface here
    let demodulator = Demodulator::with_params(settings.params())?;
    let (_controller, mut host, events) = host_channel(demodulator);

    let mut block = vec![0.0f32; block_size];
    for chunk in recording.samples.chunks(block_size) {
        let block = &mut block[..chunk.len()];
        block.copy_from_slice(chunk);
        host.render(block);
    }

    let mut messages: Vec<ReceivedMessage> = events
        .try_iter()
        .filter_map(|event| match event {
            Event::Received(message) => Some(message),
            Event::Completed { .. } => None,
        })
        .collect();
    messages.extend(host.processor_mut().finish());

    tracing::debug!(
        "decoded {} messages from {} samples",
        messages.len(),
        recording.samples.len()
    );
    Ok(messages)
}

/// Serializable view of a received message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageReport {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub text: String,
    pub data_base64: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
}

impl From<&ReceivedMessage> for MessageReport {
    fn from(message: &ReceivedMessage) -> Self {
        let text = message.text();
        let sender = parse_line(&text).map(|line| line.sender.to_string());
        Self {
            start_seconds: message.start.as_secs_f64(),
            end_seconds: message.end.as_secs_f64(),
            data_base64: base64::engine::general_purpose::STANDARD.encode(&message.bytes),
            sender,
            text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ModemSettings {
        ModemSettings {
            preamble: 0.3,
            tail: 0.2,
            ..ModemSettings::default()
        }
    }

    #[test]
    fn test_encode_decode() {
        let settings = settings();
        let messages = vec![b"Test: hello".to_vec(), vec![0x00, 0x7F, 0xFF]];
        let samples = encode(&settings, &messages).unwrap();

        let recording = Recording {
            samples,
            sample_rate: settings.sample_rate,
        };
        let decoded = decode(settings.mode, 256, &recording).unwrap();
        let bytes: Vec<Vec<u8>> = decoded.iter().map(|m| m.bytes.clone()).collect();
        assert_eq!(bytes, messages);
    }

    #[test]
    fn test_encode_nothing() {
        assert!(encode(&settings(), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_zero_block_size() {
        let settings = ModemSettings {
            block_size: 0,
            ..settings()
        };
        assert!(matches!(
            encode(&settings, &[b"x".to_vec()]),
            Err(CliError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_decode_block_larger_than_recording() {
        let recording = Recording {
            samples: vec![0.0; 16],
            sample_rate: 48000,
        };
        let decoded = decode(Mode::Bell103, usize::MAX, &recording).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_decode_rejects_unusable_sample_rate() {
        let recording = Recording {
            samples: vec![0.0; 16],
            sample_rate: 2000,
        };
        assert!(matches!(
            decode(Mode::Bell202, 128, &recording),
            Err(CliError::Modem(_))
        ));
    }

    #[test]
    fn test_report() {
        let message = ReceivedMessage {
            bytes: b"Test: hi".to_vec(),
            start: std::time::Duration::from_millis(500),
            end: std::time::Duration::from_millis(1250),
        };
        let report = MessageReport::from(&message);
        assert_eq!(report.text, "Test: hi");
        assert_eq!(report.sender.as_deref(), Some("Test"));
        assert_eq!(report.data_base64, "VGVzdDogaGk=");
        assert_eq!(report.start_seconds, 0.5);
        assert_eq!(report.end_seconds, 1.25);
    }
}
