use crate::error::{CliError, Result};
use fskmodem_core::interleaved_to_mono;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::{Read, Seek, Write};

/// Mono samples plus the rate they were recorded at
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Write mono samples as 16-bit PCM
pub fn write_wav<W: Write + Seek>(writer: W, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::new(writer, spec)?;
    for &sample in samples {
        // Clamp to [-1.0, 1.0] range to avoid overflow, then scale to i16
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * 32767.0) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Read a WAV stream, mixing any extra channels down to mono
pub fn read_wav<R: Read>(reader: R) -> Result<Recording> {
    let mut reader = WavReader::new(reader)?;
    let spec = reader.spec();
    tracing::debug!(
        "WAV input: {} Hz, {} channels, {} bits {:?}",
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format
    );

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|s| s as f32 / 32768.0))
            .collect::<std::result::Result<_, _>>()?,
        (SampleFormat::Int, bits @ (8 | 24 | 32)) => {
            let scale = (1u64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        (format, bits) => {
            return Err(CliError::UnsupportedFormat(format!(
                "{} bit {:?}",
                bits, format
            )));
        }
    };

    let samples = interleaved_to_mono(&interleaved, usize::from(spec.channels))?;
    Ok(Recording {
        samples,
        sample_rate: spec.sample_rate,
    })
}
