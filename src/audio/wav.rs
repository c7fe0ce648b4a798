use std::path::Path;

use log::debug;

/// Fixed WAV header size for a single PCM data chunk
pub const WAV_HEADER_LEN: usize = 44;

/// Sample rate of speech returned by the generation service
pub const OUTPUT_SAMPLE_RATE: u32 = 24000;

/// Generated speech is mono
pub const OUTPUT_CHANNELS: u16 = 1;

/// Generated speech is 16-bit PCM
pub const OUTPUT_BITS_PER_SAMPLE: u16 = 16;

/// MIME type of the downloadable blob
pub const WAV_MIME_TYPE: &str = "audio/wav";

/// Suggested filename for saved audio
pub const SUGGESTED_FILENAME: &str = "tvoice-audio.wav";

/// A complete WAV file held in memory, ready to be saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavBlob {
    bytes: Vec<u8>,
}

impl WavBlob {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn mime_type(&self) -> &'static str {
        WAV_MIME_TYPE
    }

    pub fn suggested_filename(&self) -> &'static str {
        SUGGESTED_FILENAME
    }

    /// Write the blob to disk
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, &self.bytes)
    }
}

/// Wrap raw PCM bytes in a RIFF/WAVE container without re-encoding them.
///
/// The header layout is the standard 44-byte PCM header; the payload is the
/// input verbatim, so stripping the header recovers the original bytes
/// exactly. Works directly from raw bytes and is independent of the playback
/// decode path.
pub fn build_wav_blob(pcm: &[u8]) -> WavBlob {
    build_wav_blob_with_format(pcm, OUTPUT_SAMPLE_RATE, OUTPUT_CHANNELS, OUTPUT_BITS_PER_SAMPLE)
}

fn build_wav_blob_with_format(
    pcm: &[u8],
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
) -> WavBlob {
    let data_size = pcm.len() as u32;
    let block_align = channels * bits_per_sample / 8;
    let byte_rate = sample_rate * block_align as u32;

    let mut bytes = Vec::with_capacity(WAV_HEADER_LEN + pcm.len());

    // RIFF chunk
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_size).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    // fmt subchunk: 16 bytes, PCM format code 1
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&byte_rate.to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data subchunk
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_size.to_le_bytes());
    bytes.extend_from_slice(pcm);

    WavBlob { bytes }
}

/// Slot holding at most one live downloadable blob.
///
/// Mirrors a revocable object reference: the previous blob is always revoked
/// before a replacement is installed, so two live references never coexist.
#[derive(Debug, Default)]
pub struct DownloadSlot {
    current: Option<WavBlob>,
}

impl DownloadSlot {
    pub fn new() -> Self {
        Self { current: None }
    }

    /// Install a new blob, revoking any previous one first
    pub fn install(&mut self, blob: WavBlob) {
        self.revoke();
        self.current = Some(blob);
    }

    /// Release the held blob, if any
    pub fn revoke(&mut self) {
        if let Some(old) = self.current.take() {
            debug!("Revoking download blob ({} bytes)", old.len());
        }
    }

    pub fn current(&self) -> Option<&WavBlob> {
        self.current.as_ref()
    }

    pub fn is_installed(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_length() {
        for n in [0usize, 1, 2, 1000, 48000] {
            let pcm = vec![0x5au8; n];
            let blob = build_wav_blob(&pcm);
            assert_eq!(blob.len(), WAV_HEADER_LEN + n);
        }
    }

    #[test]
    fn test_header_layout() {
        let pcm: Vec<u8> = (0..=255u8).collect();
        let blob = build_wav_blob(&pcm);
        let bytes = blob.as_bytes();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(
            u32::from_le_bytes(bytes[4..8].try_into().unwrap()),
            36 + pcm.len() as u32
        );
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32::from_le_bytes(bytes[16..20].try_into().unwrap()), 16);
        assert_eq!(u16::from_le_bytes(bytes[20..22].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(bytes[22..24].try_into().unwrap()), 1);
        assert_eq!(u32::from_le_bytes(bytes[24..28].try_into().unwrap()), 24000);
        assert_eq!(u32::from_le_bytes(bytes[28..32].try_into().unwrap()), 48000);
        assert_eq!(u16::from_le_bytes(bytes[32..34].try_into().unwrap()), 2);
        assert_eq!(u16::from_le_bytes(bytes[34..36].try_into().unwrap()), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(
            u32::from_le_bytes(bytes[40..44].try_into().unwrap()),
            pcm.len() as u32
        );
    }

    #[test]
    fn test_payload_round_trip() {
        let pcm: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        let blob = build_wav_blob(&pcm);
        assert_eq!(&blob.as_bytes()[WAV_HEADER_LEN..], pcm.as_slice());
    }

    #[test]
    fn test_blob_metadata() {
        let blob = build_wav_blob(&[0, 0]);
        assert_eq!(blob.mime_type(), "audio/wav");
        assert_eq!(blob.suggested_filename(), "tvoice-audio.wav");
    }

    #[test]
    fn test_write_to_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.wav");
        let pcm = vec![1u8, 2, 3, 4];
        let blob = build_wav_blob(&pcm);
        blob.write_to(&path).unwrap();

        let read_back = std::fs::read(&path).unwrap();
        assert_eq!(read_back, blob.as_bytes());
    }

    #[test]
    fn test_download_slot_replaces_old_blob() {
        let mut slot = DownloadSlot::new();
        assert!(!slot.is_installed());

        slot.install(build_wav_blob(&[1, 1]));
        let first_len = slot.current().unwrap().len();

        slot.install(build_wav_blob(&[2, 2, 2, 2]));
        assert_eq!(slot.current().unwrap().len(), first_len + 2);

        slot.revoke();
        assert!(slot.current().is_none());
        // Revoking an empty slot is a no-op
        slot.revoke();
        assert!(!slot.is_installed());
    }
}
