use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};

/// A recorded application event for debugging
#[derive(Debug, Clone)]
pub struct AppEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: AppEventType,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEventType {
    GenerationStarted,
    GenerationCompleted,
    RewriteCompleted,
    PlaybackStarted,
    PlaybackStopped,
    AudioSaved,
    DecodeError,
    ServiceError,
}

impl AppEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppEventType::GenerationStarted => "GENERATION_STARTED",
            AppEventType::GenerationCompleted => "GENERATION_COMPLETED",
            AppEventType::RewriteCompleted => "REWRITE_COMPLETED",
            AppEventType::PlaybackStarted => "PLAYBACK_STARTED",
            AppEventType::PlaybackStopped => "PLAYBACK_STOPPED",
            AppEventType::AudioSaved => "AUDIO_SAVED",
            AppEventType::DecodeError => "DECODE_ERROR",
            AppEventType::ServiceError => "SERVICE_ERROR",
        }
    }
}

/// Event recorder with a bounded history, shared across the application
#[derive(Clone)]
pub struct EventLog {
    events: Arc<Mutex<VecDeque<AppEvent>>>,
    max_events: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::new())),
            max_events: 1000, // Keep last 1000 events
        }
    }

    /// Initialize logging with a level taken from the environment
    pub fn init() -> Result<(), Box<dyn std::error::Error>> {
        let log_level = std::env::var("TVOICE_LOG_LEVEL")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "warn".to_string());

        let mut builder = env_logger::Builder::new();

        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] [{}:{}] {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        });

        match log_level.to_lowercase().as_str() {
            "trace" => builder.filter_level(log::LevelFilter::Trace),
            "debug" => builder.filter_level(log::LevelFilter::Debug),
            "info" => builder.filter_level(log::LevelFilter::Info),
            "warn" => builder.filter_level(log::LevelFilter::Warn),
            "error" => builder.filter_level(log::LevelFilter::Error),
            _ => builder.filter_level(log::LevelFilter::Warn),
        };

        builder.try_init()?;

        debug!("Logging initialized with level: {}", log_level);
        Ok(())
    }

    /// Record an event and forward it to the standard logger
    pub fn log_event(&self, event_type: AppEventType, details: String) {
        let event = AppEvent {
            timestamp: Utc::now(),
            event_type,
            details: details.clone(),
        };

        {
            let mut events = self.events.lock().unwrap();
            events.push_back(event);
            while events.len() > self.max_events {
                events.pop_front();
            }
        }

        match event_type {
            AppEventType::DecodeError | AppEventType::ServiceError => {
                error!("[{}] {}", event_type.as_str(), details);
            }
            _ => {
                info!("[{}] {}", event_type.as_str(), details);
            }
        }
    }

    pub fn log_generation_started(&self, voice_id: &str, style_id: &str, text_len: usize) {
        self.log_event(
            AppEventType::GenerationStarted,
            format!(
                "Generating speech: voice={}, style={}, {} chars",
                voice_id, style_id, text_len
            ),
        );
    }

    pub fn log_generation_completed(&self, duration: Duration) {
        self.log_event(
            AppEventType::GenerationCompleted,
            format!("Received {:.2}s of audio", duration.as_secs_f64()),
        );
    }

    pub fn log_rewrite_completed(&self, from_len: usize, to_len: usize) {
        self.log_event(
            AppEventType::RewriteCompleted,
            format!("Rewrote text: {} chars -> {} chars", from_len, to_len),
        );
    }

    pub fn log_playback_started(&self, duration: Duration) {
        self.log_event(
            AppEventType::PlaybackStarted,
            format!("Playing {:.2}s of audio", duration.as_secs_f64()),
        );
    }

    pub fn log_playback_stopped(&self, reason: &str) {
        self.log_event(
            AppEventType::PlaybackStopped,
            format!("Playback stopped: {}", reason),
        );
    }

    pub fn log_audio_saved(&self, path: &str, bytes: usize) {
        self.log_event(
            AppEventType::AudioSaved,
            format!("Saved {} bytes to {}", bytes, path),
        );
    }

    pub fn log_decode_error(&self, error: &str) {
        self.log_event(AppEventType::DecodeError, format!("Decode error: {}", error));
    }

    pub fn log_service_error(&self, error: &str) {
        self.log_event(
            AppEventType::ServiceError,
            format!("Service error: {}", error),
        );
    }

    /// Most recent events, oldest first
    pub fn recent_events(&self, count: usize) -> Vec<AppEvent> {
        let events = self.events.lock().unwrap();
        events
            .iter()
            .rev()
            .take(count)
            .cloned()
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect()
    }

    pub fn clear_events(&self) {
        self.events.lock().unwrap().clear();
    }
}

/// Log an error at the level its severity maps to, with recovery suggestions
pub fn report_error(err: &crate::error::TvoiceError) {
    let level = err.severity().log_level();
    log::log!(level, "{}", err.user_message());
    for suggestion in err.recovery_suggestions() {
        if level >= log::Level::Warn {
            warn!("  Suggestion: {}", suggestion);
        } else {
            debug!("  Suggestion: {}", suggestion);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_records() {
        let log = EventLog::new();
        assert!(log.recent_events(10).is_empty());

        log.log_generation_started("Kore", "default", 42);
        let events = log.recent_events(10);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, AppEventType::GenerationStarted);
        assert!(events[0].details.contains("voice=Kore"));
    }

    #[test]
    fn test_event_history_limit() {
        let mut log = EventLog::new();
        log.max_events = 3;

        for i in 0..5 {
            log.log_event(AppEventType::PlaybackStarted, format!("Event {}", i));
        }

        let events = log.recent_events(10);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].details, "Event 2");
        assert_eq!(events[2].details, "Event 4");
    }

    #[test]
    fn test_domain_event_helpers() {
        let log = EventLog::new();

        log.log_generation_completed(Duration::from_secs_f64(1.5));
        log.log_rewrite_completed(200, 120);
        log.log_playback_started(Duration::from_secs(2));
        log.log_playback_stopped("finished");
        log.log_audio_saved("out.wav", 48044);
        log.log_decode_error("bad padding");
        log.log_service_error("HTTP 429");

        let events = log.recent_events(10);
        assert_eq!(events.len(), 7);
        let types: Vec<_> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert!(types.contains(&"GENERATION_COMPLETED"));
        assert!(types.contains(&"REWRITE_COMPLETED"));
        assert!(types.contains(&"AUDIO_SAVED"));
        assert!(types.contains(&"SERVICE_ERROR"));
    }

    #[test]
    fn test_clear_events() {
        let log = EventLog::new();
        log.log_playback_stopped("test");
        assert_eq!(log.recent_events(10).len(), 1);

        log.clear_events();
        assert!(log.recent_events(10).is_empty());
    }

    #[test]
    fn test_event_type_as_str() {
        assert_eq!(AppEventType::GenerationStarted.as_str(), "GENERATION_STARTED");
        assert_eq!(AppEventType::DecodeError.as_str(), "DECODE_ERROR");
    }
}
