pub mod output;
pub mod pcm;
pub mod playback;
pub mod wav;

// Re-export the decode pipeline
pub use pcm::{build_playable_buffer, decode_base64};

// Re-export the WAV container and download slot
pub use wav::{
    build_wav_blob, DownloadSlot, WavBlob, OUTPUT_BITS_PER_SAMPLE, OUTPUT_CHANNELS,
    OUTPUT_SAMPLE_RATE, WAV_HEADER_LEN,
};

// Re-export the output seam and controller
pub use output::{AudioOutput, CpalOutput, SourceHandle};
pub use playback::PlaybackController;
