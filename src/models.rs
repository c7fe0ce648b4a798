use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A prebuilt voice offered by the generation service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voice {
    pub id: &'static str,
    pub name: &'static str,
}

/// A speaking style, applied as a prompt prefix before generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceStyle {
    pub id: &'static str,
    pub name: &'static str,
    pub prompt_prefix: &'static str,
}

/// Voices exposed by the TTS model
pub const AVAILABLE_VOICES: &[Voice] = &[
    Voice { id: "Kore", name: "Female (Calm)" },
    Voice { id: "Fenrir", name: "Female (Authoritative)" },
    Voice { id: "Zephyr", name: "Female (Friendly)" },
    Voice { id: "Puck", name: "Male (Energetic)" },
    Voice { id: "Charon", name: "Male (Deep)" },
];

/// Speaking styles and their generation prompt prefixes
pub const VOICE_STYLES: &[VoiceStyle] = &[
    VoiceStyle {
        id: "default",
        name: "Default",
        prompt_prefix: "Say: ",
    },
    VoiceStyle {
        id: "tv_host",
        name: "TV Host",
        prompt_prefix: "Speak with the confident, clear voice of a television host: ",
    },
    VoiceStyle {
        id: "sports_commentator",
        name: "Sports Commentator",
        prompt_prefix: "Speak with the excited, fast-paced voice of a sports commentator: ",
    },
    VoiceStyle {
        id: "consultant",
        name: "Consultant",
        prompt_prefix: "Speak with the calm, authoritative voice of a professional consultant: ",
    },
    VoiceStyle {
        id: "storyteller",
        name: "Storyteller",
        prompt_prefix: "Speak with a dramatic, engaging voice, as if telling a story: ",
    },
    VoiceStyle {
        id: "horror",
        name: "Horror Narrator",
        prompt_prefix: "Speak with an eerie, suspenseful voice, as if telling a ghost story: ",
    },
    VoiceStyle {
        id: "children",
        name: "Children's Narrator",
        prompt_prefix: "Speak with a gentle, friendly voice, as if reading to children: ",
    },
    VoiceStyle {
        id: "vlogger",
        name: "Vlogger",
        prompt_prefix: "Speak with a warm, upbeat, conversational voice like a vlogger sharing daily life: ",
    },
    VoiceStyle {
        id: "tutorial",
        name: "Tutorial",
        prompt_prefix: "Speak clearly at a measured pace, as if explaining or teaching a topic: ",
    },
    VoiceStyle {
        id: "reviewer",
        name: "Reviewer",
        prompt_prefix: "Speak with a compelling, persuasive voice, as if reviewing a product or presenting a top-10 list: ",
    },
    VoiceStyle {
        id: "news_anchor",
        name: "News Anchor",
        prompt_prefix: "Speak with a formal, trustworthy voice like a news anchor reading a bulletin: ",
    },
    VoiceStyle {
        id: "asmr",
        name: "ASMR Whisper",
        prompt_prefix: "Speak in an extremely soft, whispering, relaxing voice for an ASMR effect: ",
    },
];

/// Look up a voice by id
pub fn find_voice(id: &str) -> Option<&'static Voice> {
    AVAILABLE_VOICES.iter().find(|v| v.id == id)
}

/// Look up a style by id
pub fn find_style(id: &str) -> Option<&'static VoiceStyle> {
    VOICE_STYLES.iter().find(|s| s.id == id)
}

/// Rewrite instruction mode
#[derive(Debug, Clone, PartialEq)]
pub enum RewriteMode {
    /// Rewrite to a target length in characters, keeping the meaning
    Length(u32),
    /// Free-form rewrite instruction
    Custom(String),
}

impl RewriteMode {
    /// Build the instruction sent to the rewrite model
    pub fn instruction(&self) -> String {
        match self {
            RewriteMode::Length(chars) => format!(
                "Rewrite the following text to approximately {} characters while keeping its meaning.",
                chars
            ),
            RewriteMode::Custom(prompt) => prompt.clone(),
        }
    }
}

/// Decoded audio ready for playback: one normalized f32 sequence per channel
#[derive(Debug, Clone)]
pub struct PlayableBuffer {
    pub channel_data: Vec<Vec<f32>>,
    pub sample_rate: u32,
    pub frames: usize,
}

impl PlayableBuffer {
    pub fn new(channel_data: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        let frames = channel_data.first().map(|c| c.len()).unwrap_or(0);
        Self {
            channel_data,
            sample_rate,
            frames,
        }
    }

    /// Create an empty buffer
    pub fn empty() -> Self {
        Self {
            channel_data: Vec::new(),
            sample_rate: 0,
            frames: 0,
        }
    }

    pub fn channels(&self) -> u16 {
        self.channel_data.len() as u16
    }

    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    /// Get duration of this buffer
    pub fn duration(&self) -> Duration {
        if self.sample_rate > 0 {
            Duration::from_secs_f64(self.frames as f64 / self.sample_rate as f64)
        } else {
            Duration::from_secs(0)
        }
    }

    /// Duration in whole and fractional seconds
    pub fn duration_secs(&self) -> f64 {
        self.duration().as_secs_f64()
    }
}

/// Playback state enumeration - stop discards position, so there is no Paused
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "Idle",
            PlaybackState::Playing => "Playing",
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of the playback controller for display
#[derive(Debug, Clone)]
pub struct PlayerStatus {
    pub state: PlaybackState,
    pub elapsed: Duration,
    pub duration: Duration,
}

impl PlayerStatus {
    pub fn idle() -> Self {
        Self {
            state: PlaybackState::Idle,
            elapsed: Duration::from_secs(0),
            duration: Duration::from_secs(0),
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing)
    }

    /// Format the elapsed position as M:SS, clamped to the duration
    pub fn elapsed_formatted(&self) -> String {
        format_time(self.elapsed.as_secs_f64(), self.duration.as_secs_f64())
    }

    /// Format the total duration as M:SS
    pub fn duration_formatted(&self) -> String {
        format_time(self.duration.as_secs_f64(), 0.0)
    }
}

/// Format a position in seconds as M:SS with floor truncation.
///
/// When `total_duration` is positive the position is clamped to it; a zero
/// duration only clamps to non-negative.
pub fn format_time(seconds: f64, total_duration: f64) -> String {
    let clamped = if total_duration > 0.0 {
        seconds.min(total_duration)
    } else {
        seconds
    }
    .max(0.0);
    let minutes = (clamped / 60.0).floor() as u64;
    let remaining = (clamped % 60.0).floor() as u64;
    format!("{}:{:02}", minutes, remaining)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time_basic() {
        assert_eq!(format_time(0.0, 125.0), "0:00");
        assert_eq!(format_time(65.0, 125.0), "1:05");
        assert_eq!(format_time(125.0, 125.0), "2:05");
    }

    #[test]
    fn test_format_time_clamps_to_duration() {
        // 130s into a 125s clip clamps to 125 before flooring
        assert_eq!(format_time(130.0, 125.0), "2:05");
        assert_eq!(format_time(1000.0, 59.9), "0:59");
    }

    #[test]
    fn test_format_time_zero_duration_is_unclamped() {
        // Zero duration disables the upper clamp, only non-negative applies
        assert_eq!(format_time(130.0, 0.0), "2:10");
        assert_eq!(format_time(-5.0, 0.0), "0:00");
        assert_eq!(format_time(-5.0, 125.0), "0:00");
    }

    #[test]
    fn test_format_time_unbounded_minutes() {
        assert_eq!(format_time(3600.0, 0.0), "60:00");
        assert_eq!(format_time(3725.4, 0.0), "62:05");
    }

    #[test]
    fn test_playable_buffer_duration() {
        let buffer = PlayableBuffer::new(vec![vec![0.0; 24000]], 24000);
        assert_eq!(buffer.frames, 24000);
        assert_eq!(buffer.channels(), 1);
        assert!((buffer.duration_secs() - 1.0).abs() < 1e-9);

        let empty = PlayableBuffer::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.duration(), Duration::from_secs(0));
    }

    #[test]
    fn test_voice_catalog() {
        assert_eq!(AVAILABLE_VOICES.len(), 5);
        assert!(find_voice("Kore").is_some());
        assert!(find_voice("kore").is_none()); // ids are case-sensitive
        assert!(find_voice("Nonexistent").is_none());
    }

    #[test]
    fn test_style_catalog() {
        let default = find_style("default").expect("default style present");
        assert_eq!(default.prompt_prefix, "Say: ");
        assert!(find_style("asmr").is_some());
        for style in VOICE_STYLES {
            assert!(!style.prompt_prefix.is_empty());
        }
    }

    #[test]
    fn test_rewrite_mode_instruction() {
        let mode = RewriteMode::Length(150);
        assert!(mode.instruction().contains("150 characters"));

        let mode = RewriteMode::Custom("Make it more formal".to_string());
        assert_eq!(mode.instruction(), "Make it more formal");
    }

    #[test]
    fn test_playback_state_display() {
        assert_eq!(PlaybackState::Idle.as_str(), "Idle");
        assert_eq!(format!("{}", PlaybackState::Playing), "Playing");
    }

    #[test]
    fn test_player_status_formatting() {
        let status = PlayerStatus {
            state: PlaybackState::Playing,
            elapsed: Duration::from_secs_f64(65.7),
            duration: Duration::from_secs_f64(125.2),
        };
        assert_eq!(status.elapsed_formatted(), "1:05");
        assert_eq!(status.duration_formatted(), "2:05");

        let idle = PlayerStatus::idle();
        assert!(!idle.is_playing());
        assert_eq!(idle.elapsed_formatted(), "0:00");
    }
}
