use thiserror::Error;

/// Main application error type
#[derive(Debug, Error)]
pub enum TvoiceError {
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("CLI parse error: {0}")]
    Parse(#[from] crate::cli::ParseError),
}

impl TvoiceError {
    /// Get user-friendly error message with suggested solutions
    pub fn user_message(&self) -> String {
        match self {
            TvoiceError::Audio(err) => err.user_message(),
            TvoiceError::Decode(err) => err.user_message(),
            TvoiceError::Service(err) => err.user_message(),
            TvoiceError::Config(err) => err.user_message(),
            TvoiceError::File(err) => format!("File system error: {}", err),
            TvoiceError::Parse(err) => format!("Command error: {}", err),
        }
    }

    /// Get suggested recovery actions for the error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            TvoiceError::Audio(err) => err.recovery_suggestions(),
            TvoiceError::Decode(err) => err.recovery_suggestions(),
            TvoiceError::Service(err) => err.recovery_suggestions(),
            TvoiceError::Config(err) => err.recovery_suggestions(),
            TvoiceError::File(_) => vec![
                "Check that the output path exists and is writable".to_string(),
            ],
            TvoiceError::Parse(_) => vec!["Type 'help' to see available commands".to_string()],
        }
    }

    /// Check if this error allows for automatic recovery
    pub fn is_recoverable(&self) -> bool {
        match self {
            TvoiceError::Audio(err) => err.is_recoverable(),
            TvoiceError::Decode(_) => false, // Requires a fresh generation result
            TvoiceError::Service(err) => err.is_recoverable(),
            TvoiceError::Config(_) => true, // Defaults apply
            TvoiceError::File(_) => false,
            TvoiceError::Parse(_) => false, // Parse errors require correct input
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TvoiceError::Audio(_) => ErrorSeverity::Critical,
            TvoiceError::Decode(_) => ErrorSeverity::Error,
            TvoiceError::Service(ServiceError::MissingApiKey) => ErrorSeverity::Warning,
            TvoiceError::Service(ServiceError::EmptyInput { .. }) => ErrorSeverity::Info,
            TvoiceError::Service(_) => ErrorSeverity::Error,
            TvoiceError::Config(_) => ErrorSeverity::Warning,
            TvoiceError::File(_) => ErrorSeverity::Error,
            TvoiceError::Parse(_) => ErrorSeverity::Info,
        }
    }
}

/// Error severity levels for logging and user feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "INFO",
            ErrorSeverity::Warning => "WARNING",
            ErrorSeverity::Error => "ERROR",
            ErrorSeverity::Critical => "CRITICAL",
        }
    }

    pub fn log_level(&self) -> log::Level {
        match self {
            ErrorSeverity::Info => log::Level::Info,
            ErrorSeverity::Warning => log::Level::Warn,
            ErrorSeverity::Error => log::Level::Error,
            ErrorSeverity::Critical => log::Level::Error,
        }
    }
}

/// Audio output errors
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("No audio output device available")]
    NoOutputDevice,

    #[error("Unsupported sample rate: {rate}")]
    UnsupportedSampleRate { rate: u32 },

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Audio initialization failed: {0}")]
    InitializationFailed(String),
}

impl AudioError {
    pub fn user_message(&self) -> String {
        match self {
            AudioError::NoOutputDevice => {
                "No audio output device is available on this system".to_string()
            }
            AudioError::UnsupportedSampleRate { rate } => {
                format!("Sample rate {} Hz is not supported by the current audio device", rate)
            }
            AudioError::StreamError(msg) => {
                format!("Audio playback interrupted: {}", msg)
            }
            AudioError::InitializationFailed(msg) => {
                format!("Failed to initialize audio output: {}", msg)
            }
        }
    }

    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            AudioError::NoOutputDevice => vec![
                "Check that an audio device is connected and powered on".to_string(),
                "Use --output to save the audio as a WAV file instead of playing it".to_string(),
            ],
            AudioError::UnsupportedSampleRate { .. } => vec![
                "Generated speech uses 24000 Hz - check your device supports it".to_string(),
                "Use --output to save the audio as a WAV file instead of playing it".to_string(),
            ],
            AudioError::StreamError(_) => vec![
                "Try generating the speech again".to_string(),
                "Check audio device connections".to_string(),
            ],
            AudioError::InitializationFailed(_) => vec![
                "Check that no other application holds exclusive audio access".to_string(),
                "Verify audio drivers are properly installed".to_string(),
            ],
        }
    }

    pub fn is_recoverable(&self) -> bool {
        match self {
            AudioError::NoOutputDevice => false, // Requires hardware
            AudioError::UnsupportedSampleRate { .. } => false,
            AudioError::StreamError(_) => true, // Can restart playback
            AudioError::InitializationFailed(_) => true, // Can retry initialization
        }
    }
}

/// Audio decoding errors
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(String),

    #[error("Decode failed: {0}")]
    DecodeFailed(String),
}

impl DecodeError {
    pub fn user_message(&self) -> String {
        match self {
            DecodeError::InvalidBase64(msg) => {
                format!("The audio payload returned by the service is not valid base64: {}", msg)
            }
            DecodeError::DecodeFailed(msg) => {
                format!("Failed to decode audio data: {}", msg)
            }
        }
    }

    pub fn recovery_suggestions(&self) -> Vec<String> {
        vec![
            "Try generating the speech again".to_string(),
            "Check your API key and network connection".to_string(),
        ]
    }
}

/// Remote generation service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("No API key configured")]
    MissingApiKey,

    #[error("{field} must not be empty")]
    EmptyInput { field: String },

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Service returned status {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("No audio data in service response")]
    MissingAudioData,

    #[error("No text in service response")]
    MissingText,
}

impl ServiceError {
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::MissingApiKey => {
                "A Gemini API key is required - set one with 'tvoice set-key <key>'".to_string()
            }
            ServiceError::EmptyInput { field } => {
                format!("{} must not be empty", field)
            }
            ServiceError::RequestFailed(msg) => {
                format!("Could not reach the generation service: {}", msg)
            }
            ServiceError::BadStatus { status, .. } => {
                format!("The generation service rejected the request (HTTP {})", status)
            }
            ServiceError::MissingAudioData => {
                "No audio data was returned by the API - check your API key and try again".to_string()
            }
            ServiceError::MissingText => {
                "The text could not be rewritten - check your API key and try again".to_string()
            }
        }
    }

    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ServiceError::MissingApiKey => vec![
                "Run 'tvoice set-key <key>' to store your API key".to_string(),
                "Or export GEMINI_API_KEY in your environment".to_string(),
            ],
            ServiceError::EmptyInput { .. } => vec![
                "Provide some text to work with".to_string(),
            ],
            ServiceError::RequestFailed(_) => vec![
                "Check your network connection".to_string(),
                "Try again in a few seconds".to_string(),
            ],
            ServiceError::BadStatus { .. } => vec![
                "Verify the API key is valid and has quota remaining".to_string(),
                "Try again in a few seconds".to_string(),
            ],
            ServiceError::MissingAudioData | ServiceError::MissingText => vec![
                "Verify the API key is valid".to_string(),
                "Try again with shorter text".to_string(),
            ],
        }
    }

    pub fn is_recoverable(&self) -> bool {
        match self {
            ServiceError::MissingApiKey => true, // User can provide a key
            ServiceError::EmptyInput { .. } => true,
            ServiceError::RequestFailed(_) => true, // Transient network failure
            ServiceError::BadStatus { .. } => false,
            ServiceError::MissingAudioData | ServiceError::MissingText => true, // Retry may help
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found")]
    ConfigDirNotFound,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] toml::ser::Error),

    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] toml::de::Error),
}

impl ConfigError {
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::ConfigDirNotFound => {
                "Cannot find or create configuration directory".to_string()
            }
            ConfigError::IoError(err) => {
                format!("Cannot access configuration file: {}", err)
            }
            ConfigError::SerializationError(_) => {
                "Failed to save configuration settings".to_string()
            }
            ConfigError::DeserializationError(_) => {
                "Configuration file is corrupted or has invalid format".to_string()
            }
        }
    }

    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ConfigError::ConfigDirNotFound => vec![
                "Check that you have write permissions to your home directory".to_string(),
                "Try creating the directory manually: ~/.config/tvoice/".to_string(),
            ],
            ConfigError::IoError(_) => vec![
                "Check file permissions for the configuration directory".to_string(),
                "Ensure the disk is not full".to_string(),
            ],
            ConfigError::SerializationError(_) => vec![
                "Configuration will use default values".to_string(),
            ],
            ConfigError::DeserializationError(_) => vec![
                "Delete ~/.config/tvoice/config.toml to reset to defaults".to_string(),
            ],
        }
    }
}
