mod audio;
mod cli;
mod config;
mod error;
mod logging;
mod models;
mod service;


use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use audio::{CpalOutput, PlaybackController};
use cli::{CliApp, Commands, InteractiveCommand, ParseError, StatusDisplay};
use config::ConfigManager;
use error::{ServiceError, TvoiceError};
use logging::EventLog;
use models::{find_style, find_voice, RewriteMode};
use service::{build_speech_prompt, GeminiClient, SpeechService};

/// Main application controller that coordinates all components
pub struct AppController {
    playback: PlaybackController,
    config_manager: ConfigManager,
    event_log: EventLog,
    shutdown: Arc<AtomicBool>,
}

impl AppController {
    pub fn new(shutdown: Arc<AtomicBool>) -> Result<Self, TvoiceError> {
        // Initialize logging first (default to 'warn' if unspecified)
        if std::env::var("TVOICE_LOG_LEVEL").is_err() {
            std::env::set_var("TVOICE_LOG_LEVEL", "warn");
        }
        if let Err(e) = EventLog::init() {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        let output = match CpalOutput::new() {
            Ok(output) => output,
            Err(e) => {
                // Generation and WAV export still work without a device
                warn!("{}", e.user_message());
                CpalOutput::default()
            }
        };

        let playback = PlaybackController::new(Arc::new(output));
        let config_manager = ConfigManager::new()?;
        let event_log = EventLog::new();

        info!("Application controller initialized");

        Ok(Self {
            playback,
            config_manager,
            event_log,
            shutdown,
        })
    }

    /// Build a speech service from the configured API key
    fn speech_service(&self) -> Result<GeminiClient, ServiceError> {
        let key = self
            .config_manager
            .api_key()
            .ok_or(ServiceError::MissingApiKey)?;
        GeminiClient::new(key)
    }

    /// Execute a single command
    pub async fn execute_command(&mut self, command: Commands) -> Result<(), TvoiceError> {
        match command {
            Commands::Speak {
                text,
                voice,
                style,
                rewrite,
                length,
                output,
                no_play,
            } => {
                let voice_id = self.resolve_voice(voice.as_deref())?;
                let style_id = self.resolve_style(style.as_deref())?;

                let text = match rewrite_mode(rewrite, length) {
                    Some(mode) => self.rewrite(&text, &mode).await?,
                    None => text,
                };

                self.generate(&text, &voice_id, &style_id).await?;

                if let Some(path) = &output {
                    self.save(path)?;
                }
                if !no_play {
                    self.play_and_wait().await;
                }
                Ok(())
            }
            Commands::Rewrite {
                text,
                prompt,
                length,
            } => {
                let mode = rewrite_mode(prompt, length).unwrap_or(RewriteMode::Length(150));
                let rewritten = self.rewrite(&text, &mode).await?;
                println!("{}", rewritten);
                Ok(())
            }
            Commands::Voices => {
                StatusDisplay::display_voices(&self.config_manager.get_config().default_voice);
                Ok(())
            }
            Commands::Styles => {
                StatusDisplay::display_styles(&self.config_manager.get_config().default_style);
                Ok(())
            }
            Commands::SetKey { key } => {
                self.config_manager.set_api_key(key)?;
                println!("API key saved.");
                Ok(())
            }
            Commands::Config => {
                StatusDisplay::display_config(self.config_manager.get_config());
                Ok(())
            }
        }
    }

    /// Resolve a voice id, falling back to the configured default
    fn resolve_voice(&self, requested: Option<&str>) -> Result<String, TvoiceError> {
        let id = requested.unwrap_or(&self.config_manager.get_config().default_voice);
        match find_voice(id) {
            Some(voice) => Ok(voice.id.to_string()),
            None => Err(ServiceError::RequestFailed(format!(
                "Unknown voice '{}' - see 'tvoice voices' for the list",
                id
            ))
            .into()),
        }
    }

    /// Resolve a style id, falling back to the configured default
    fn resolve_style(&self, requested: Option<&str>) -> Result<String, TvoiceError> {
        let id = requested.unwrap_or(&self.config_manager.get_config().default_style);
        match find_style(id) {
            Some(style) => Ok(style.id.to_string()),
            None => Err(ServiceError::RequestFailed(format!(
                "Unknown style '{}' - see 'tvoice styles' for the list",
                id
            ))
            .into()),
        }
    }

    /// Generate speech and load it into the playback controller
    async fn generate(
        &mut self,
        text: &str,
        voice_id: &str,
        style_id: &str,
    ) -> Result<(), TvoiceError> {
        let service = self.speech_service()?;
        let prefix = find_style(style_id).map(|s| s.prompt_prefix).unwrap_or("");
        let prompt = build_speech_prompt(prefix, text);

        self.event_log
            .log_generation_started(voice_id, style_id, text.len());
        println!("Generating speech...");

        let payload = match service.generate_speech(&prompt, voice_id).await {
            Ok(payload) => payload,
            Err(e) => {
                self.event_log.log_service_error(&e.to_string());
                return Err(e.into());
            }
        };

        if let Err(e) = self.playback.load_audio(Some(payload)).await {
            self.event_log.log_decode_error(&e.to_string());
            return Err(e.into());
        }

        self.event_log
            .log_generation_completed(self.playback.duration());
        Ok(())
    }

    /// Rewrite text via the language model
    async fn rewrite(&mut self, text: &str, mode: &RewriteMode) -> Result<String, TvoiceError> {
        let service = self.speech_service()?;
        let rewritten = match service.rewrite_text(text, &mode.instruction()).await {
            Ok(rewritten) => rewritten,
            Err(e) => {
                self.event_log.log_service_error(&e.to_string());
                return Err(e.into());
            }
        };
        self.event_log
            .log_rewrite_completed(text.len(), rewritten.len());
        Ok(rewritten)
    }

    /// Save the loaded audio as a WAV file
    fn save(&self, path: &Path) -> Result<(), TvoiceError> {
        let blob = self.playback.download_blob().ok_or_else(|| {
            TvoiceError::Service(ServiceError::MissingAudioData)
        })?;
        blob.write_to(path)?;
        self.event_log
            .log_audio_saved(&path.display().to_string(), blob.len());
        println!("Saved {} bytes to {}", blob.len(), path.display());
        Ok(())
    }

    /// Start playback and block until it ends or an interrupt arrives
    async fn play_and_wait(&self) {
        self.playback.play();
        if !self.playback.is_playing() {
            return;
        }
        self.event_log.log_playback_started(self.playback.duration());

        let mut interval = tokio::time::interval(Duration::from_millis(100));
        loop {
            interval.tick().await;
            if self.shutdown.load(Ordering::Relaxed) {
                self.playback.stop();
                self.event_log.log_playback_stopped("interrupted");
                break;
            }
            if !self.playback.is_playing() {
                self.event_log.log_playback_stopped("finished");
                break;
            }
            StatusDisplay::display_progress(&self.playback.status());
        }
        println!();
    }

    /// Run interactive mode
    pub async fn run_interactive_mode(&mut self) -> Result<(), TvoiceError> {
        println!("tvoice v0.1.0");
        println!("Type 'help' for available commands, 'quit' to exit.");
        println!();

        // Non-blocking input via a dedicated stdin thread
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                match stdin.read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        if tx.send(line.trim().to_string()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        let mut interval = tokio::time::interval(Duration::from_millis(100));
        let mut awaiting_input = false;
        let mut was_playing = false;

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                self.playback.stop();
                break;
            }

            if !awaiting_input {
                print!("> ");
                let _ = std::io::Write::flush(&mut std::io::stdout());
                awaiting_input = true;
            }

            tokio::select! {
                biased;

                line = rx.recv() => {
                    awaiting_input = false;
                    match line {
                        Some(line) if line.is_empty() => continue,
                        Some(line) => {
                            if self.handle_interactive_line(&line).await {
                                break;
                            }
                        }
                        None => {
                            // EOF
                            println!();
                            break;
                        }
                    }
                }

                _ = interval.tick() => {
                    let playing = self.playback.is_playing();
                    if playing {
                        StatusDisplay::display_progress(&self.playback.status());
                    } else if was_playing {
                        println!();
                        self.event_log.log_playback_stopped("finished");
                    }
                    was_playing = playing;
                }
            }
        }

        Ok(())
    }

    /// Handle one interactive command line; returns true on quit
    async fn handle_interactive_line(&mut self, line: &str) -> bool {
        let command = match CliApp::parse_command(line) {
            Ok(command) => command,
            Err(ParseError::EmptyCommand) => return false,
            Err(e) => {
                eprintln!("Error: {}", e);
                println!("Type 'help' for available commands.");
                return false;
            }
        };

        match command {
            InteractiveCommand::Speak { text } => {
                let result = async {
                    let voice_id = self.resolve_voice(None)?;
                    let style_id = self.resolve_style(None)?;
                    self.generate(&text, &voice_id, &style_id).await
                }
                .await;

                match result {
                    Ok(()) => {
                        self.playback.play();
                        if self.playback.is_playing() {
                            self.event_log
                                .log_playback_started(self.playback.duration());
                        }
                    }
                    Err(e) => self.report_error(&e),
                }
            }
            InteractiveCommand::Play => {
                if !self.playback.has_audio() {
                    println!("No audio loaded - use 'speak <text>' first.");
                } else {
                    self.playback.play();
                }
            }
            InteractiveCommand::Stop => {
                self.playback.stop();
                self.event_log.log_playback_stopped("user requested");
            }
            InteractiveCommand::Status => {
                StatusDisplay::display_status(&self.playback.status());
            }
            InteractiveCommand::Save { path } => {
                if let Err(e) = self.save(&path) {
                    self.report_error(&e);
                }
            }
            InteractiveCommand::Voice { id } => match find_voice(&id) {
                Some(voice) => {
                    if let Err(e) = self.config_manager.set_default_voice(voice.id.to_string()) {
                        self.report_error(&e.into());
                    } else {
                        println!("Voice set to {} ({})", voice.id, voice.name);
                    }
                }
                None => println!("Unknown voice '{}' - see 'voices' for the list.", id),
            },
            InteractiveCommand::Style { id } => match find_style(&id) {
                Some(style) => {
                    if let Err(e) = self.config_manager.set_default_style(style.id.to_string()) {
                        self.report_error(&e.into());
                    } else {
                        println!("Style set to {} ({})", style.id, style.name);
                    }
                }
                None => println!("Unknown style '{}' - see 'styles' for the list.", id),
            },
            InteractiveCommand::Voices => {
                StatusDisplay::display_voices(&self.config_manager.get_config().default_voice);
            }
            InteractiveCommand::Styles => {
                StatusDisplay::display_styles(&self.config_manager.get_config().default_style);
            }
            InteractiveCommand::Help => StatusDisplay::display_help(),
            InteractiveCommand::Quit => {
                self.playback.stop();
                println!("Goodbye!");
                return true;
            }
        }
        false
    }

    fn report_error(&self, err: &TvoiceError) {
        eprintln!("Error: {}", err.user_message());
        for suggestion in err.recovery_suggestions() {
            eprintln!("  - {}", suggestion);
        }
        logging::report_error(err);
    }
}

/// Combine the two rewrite flags into a mode, prompt taking precedence
fn rewrite_mode(prompt: Option<String>, length: Option<u32>) -> Option<RewriteMode> {
    match (prompt, length) {
        (Some(prompt), _) => Some(RewriteMode::Custom(prompt)),
        (None, Some(length)) => Some(RewriteMode::Length(length)),
        (None, None) => None,
    }
}

#[tokio::main]
async fn main() {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        shutdown_flag.store(true, Ordering::Relaxed);
    }) {
        eprintln!("Warning: Failed to set interrupt handler: {}", e);
    }

    let mut app = match AppController::new(shutdown) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Failed to initialize application: {}", e.user_message());
            std::process::exit(1);
        }
    };

    let cli = CliApp::parse_args();

    let result = match cli.command {
        Some(command) => app.execute_command(command).await,
        None => app.run_interactive_mode().await,
    };

    if let Err(e) = result {
        app.report_error(&e);
        std::process::exit(1);
    }

    info!("Shutdown complete");
}
