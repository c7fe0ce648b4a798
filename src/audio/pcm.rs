use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::DecodeError;
use crate::models::PlayableBuffer;

/// Bytes per sample for 16-bit PCM
const BYTES_PER_SAMPLE: usize = 2;

/// Decode a base64 payload into raw PCM bytes
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, DecodeError> {
    STANDARD
        .decode(payload)
        .map_err(|e| DecodeError::InvalidBase64(e.to_string()))
}

/// Build a playable buffer from interleaved 16-bit little-endian PCM bytes.
///
/// Samples are normalized to `[-1.0, 1.0)` by dividing by 32768.0 and
/// de-interleaved into one sequence per channel. A trailing partial sample is
/// dropped by the truncating frame count.
pub fn build_playable_buffer(
    bytes: &[u8],
    sample_rate: u32,
    channels: u16,
) -> Result<PlayableBuffer, DecodeError> {
    if channels == 0 {
        return Err(DecodeError::DecodeFailed(
            "channel count must be at least 1".to_string(),
        ));
    }
    if sample_rate == 0 {
        return Err(DecodeError::DecodeFailed(
            "sample rate must be positive".to_string(),
        ));
    }

    let channels = channels as usize;
    let samples: Vec<f32> = bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|c| i16::from_le_bytes([c[0], c[1]]) as f32 / 32768.0)
        .collect();

    let frames = samples.len() / channels;
    let mut channel_data = vec![Vec::with_capacity(frames); channels];
    for (i, ch) in channel_data.iter_mut().enumerate() {
        for frame in 0..frames {
            ch.push(samples[frame * channels + i]);
        }
    }

    Ok(PlayableBuffer::new(channel_data, sample_rate))
}
