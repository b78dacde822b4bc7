use crate::error::{AudioModemError, Result};

/// Average interleaved multi-channel audio down to a single channel.
///
/// A trailing partial frame is dropped.
pub fn interleaved_to_mono(samples: &[f32], channels: usize) -> Result<Vec<f32>> {
    match channels {
        0 => Err(AudioModemError::InvalidConfig(
            "channel count must be at least 1".to_string(),
        )),
        1 => Ok(samples.to_vec()),
        n => Ok(samples
            .chunks_exact(n)
            .map(|frame| frame.iter().sum::<f32>() / n as f32)
            .collect()),
    }
}
