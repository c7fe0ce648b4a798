pub mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;

use crate::error::ServiceError;

/// Seam over the speech generation backend, mockable in tests
#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Generate speech for a prompt with the given prebuilt voice, returning
    /// base64-encoded raw PCM (24 kHz, mono, 16-bit little-endian)
    async fn generate_speech(&self, prompt: &str, voice_id: &str) -> Result<String, ServiceError>;

    /// Rewrite text per an instruction, returning the rewritten text only
    async fn rewrite_text(&self, text: &str, instruction: &str) -> Result<String, ServiceError>;
}

/// Build the full TTS prompt by applying a style prefix to the text
pub fn build_speech_prompt(prefix: &str, text: &str) -> String {
    format!("{}{}", prefix, text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_speech_prompt() {
        assert_eq!(build_speech_prompt("Say: ", "hello"), "Say: hello");
        assert_eq!(build_speech_prompt("", "hello"), "hello");
    }
}
