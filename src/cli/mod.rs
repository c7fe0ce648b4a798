use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod display;
pub use display::StatusDisplay;

/// Text-to-speech CLI backed by the Gemini speech API
#[derive(Parser)]
#[command(name = "tvoice")]
#[command(about = "Generate speech from text, play it back, and save it as WAV")]
#[command(version = "0.1.0")]
pub struct CliApp {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate speech from text and play it
    Speak {
        /// The text to speak
        text: String,
        /// Voice id (see 'voices' for the list)
        #[arg(long)]
        voice: Option<String>,
        /// Speaking style id (see 'styles' for the list)
        #[arg(long)]
        style: Option<String>,
        /// Rewrite the text with this instruction before speaking
        #[arg(long, conflicts_with = "length")]
        rewrite: Option<String>,
        /// Rewrite the text to roughly this many characters before speaking
        #[arg(long)]
        length: Option<u32>,
        /// Save the generated audio as a WAV file at this path
        #[arg(long)]
        output: Option<PathBuf>,
        /// Skip playback (useful together with --output)
        #[arg(long)]
        no_play: bool,
    },
    /// Rewrite text with the language model and print the result
    Rewrite {
        /// The text to rewrite
        text: String,
        /// Free-form rewrite instruction
        #[arg(long, conflicts_with = "length")]
        prompt: Option<String>,
        /// Target length in characters
        #[arg(long)]
        length: Option<u32>,
    },
    /// List available voices
    Voices,
    /// List available speaking styles
    Styles,
    /// Store the Gemini API key in the configuration file
    SetKey {
        /// The API key
        key: String,
    },
    /// Show the current configuration
    Config,
}

/// Commands accepted by the interactive shell
#[derive(Debug, Clone, PartialEq)]
pub enum InteractiveCommand {
    /// Generate and play speech for the given text
    Speak { text: String },
    /// Replay the last generated audio
    Play,
    /// Stop playback
    Stop,
    /// Show playback state and position
    Status,
    /// Save the last generated audio to a WAV file
    Save { path: PathBuf },
    /// Switch the active voice
    Voice { id: String },
    /// Switch the active style
    Style { id: String },
    /// List available voices
    Voices,
    /// List available styles
    Styles,
    Help,
    Quit,
}

impl CliApp {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }

    /// Expand tilde (~) in path to home directory
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home_dir) = dirs::home_dir() {
                home_dir.join(rest)
            } else {
                PathBuf::from(path)
            }
        } else if path == "~" {
            dirs::home_dir().unwrap_or_else(|| PathBuf::from(path))
        } else {
            PathBuf::from(path)
        }
    }

    /// Parse a command line typed into the interactive shell
    pub fn parse_command(input: &str) -> Result<InteractiveCommand, ParseError> {
        let args: Vec<&str> = input.trim().split_whitespace().collect();
        if args.is_empty() {
            return Err(ParseError::EmptyCommand);
        }

        match args[0] {
            "speak" | "say" => {
                if args.len() > 1 {
                    Ok(InteractiveCommand::Speak {
                        text: args[1..].join(" "),
                    })
                } else {
                    Err(ParseError::MissingArgument {
                        command: "speak".to_string(),
                        argument: "text".to_string(),
                    })
                }
            }
            "play" => Ok(InteractiveCommand::Play),
            "stop" => Ok(InteractiveCommand::Stop),
            "status" => Ok(InteractiveCommand::Status),
            "save" => {
                if args.len() > 1 {
                    let path = Self::expand_path(&args[1..].join(" "));
                    Ok(InteractiveCommand::Save { path })
                } else {
                    Err(ParseError::MissingArgument {
                        command: "save".to_string(),
                        argument: "path".to_string(),
                    })
                }
            }
            "voice" => {
                if args.len() > 1 {
                    Ok(InteractiveCommand::Voice {
                        id: args[1].to_string(),
                    })
                } else {
                    Err(ParseError::MissingArgument {
                        command: "voice".to_string(),
                        argument: "id".to_string(),
                    })
                }
            }
            "style" => {
                if args.len() > 1 {
                    Ok(InteractiveCommand::Style {
                        id: args[1].to_string(),
                    })
                } else {
                    Err(ParseError::MissingArgument {
                        command: "style".to_string(),
                        argument: "id".to_string(),
                    })
                }
            }
            "voices" => Ok(InteractiveCommand::Voices),
            "styles" => Ok(InteractiveCommand::Styles),
            "help" => Ok(InteractiveCommand::Help),
            "quit" | "exit" | "q" => Ok(InteractiveCommand::Quit),
            _ => Err(ParseError::UnknownCommand {
                command: args[0].to_string(),
            }),
        }
    }
}

/// Command parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Empty command")]
    EmptyCommand,

    #[error("Unknown command: {command}")]
    UnknownCommand { command: String },

    #[error("Missing argument for {command}: {argument}")]
    MissingArgument { command: String, argument: String },
}
