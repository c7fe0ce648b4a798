use crate::config::AppConfig;
use crate::models::{PlayerStatus, AVAILABLE_VOICES, VOICE_STYLES};

/// Console output formatter for the CLI
pub struct StatusDisplay;

impl StatusDisplay {
    /// One-line playback status: state, position and duration in M:SS
    pub fn display_status(status: &PlayerStatus) {
        if status.duration.as_secs_f64() > 0.0 {
            println!(
                "{} | {} / {}",
                status.state.as_str(),
                status.elapsed_formatted(),
                status.duration_formatted()
            );
        } else {
            println!("{} | no audio loaded", status.state.as_str());
        }
    }

    /// Progress line rendered in place while playing
    pub fn display_progress(status: &PlayerStatus) {
        print!(
            "\r  {} / {}  ",
            status.elapsed_formatted(),
            status.duration_formatted()
        );
        use std::io::Write;
        let _ = std::io::stdout().flush();
    }

    pub fn display_voices(active: &str) {
        println!("Available voices:");
        for voice in AVAILABLE_VOICES {
            let marker = if voice.id == active { "*" } else { " " };
            println!("  {} {:<10} {}", marker, voice.id, voice.name);
        }
    }

    pub fn display_styles(active: &str) {
        println!("Available styles:");
        for style in VOICE_STYLES {
            let marker = if style.id == active { "*" } else { " " };
            println!("  {} {:<20} {}", marker, style.id, style.name);
        }
    }

    pub fn display_config(config: &AppConfig) {
        println!("Configuration:");
        println!(
            "  api_key:       {}",
            match &config.api_key {
                Some(key) => Self::mask_key(key),
                None => "(not set)".to_string(),
            }
        );
        println!("  default_voice: {}", config.default_voice);
        println!("  default_style: {}", config.default_style);
    }

    pub fn display_help() {
        println!("Commands:");
        println!("  speak <text>   Generate and play speech");
        println!("  play           Replay the last generated audio");
        println!("  stop           Stop playback");
        println!("  status         Show playback state and position");
        println!("  save <path>    Save the last audio as a WAV file");
        println!("  voice <id>     Switch the active voice");
        println!("  style <id>     Switch the active style");
        println!("  voices         List available voices");
        println!("  styles         List available styles");
        println!("  help           Show this help");
        println!("  quit           Exit");
    }

    /// Keep the first and last few characters of a key visible
    fn mask_key(key: &str) -> String {
        if key.len() <= 8 {
            "****".to_string()
        } else {
            format!("{}...{}", &key[..4], &key[key.len() - 4..])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_key() {
        assert_eq!(StatusDisplay::mask_key("short"), "****");
        assert_eq!(StatusDisplay::mask_key("AIzaSyABCDEF123456"), "AIza...3456");
    }
}
