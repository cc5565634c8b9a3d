//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// VoiceNote - record, upload and follow voice notes
#[derive(Parser, Debug)]
#[command(name = "voicenote")]
#[command(version)]
#[command(about = "Record voice notes, upload them, and follow transcription live")]
#[command(long_about = None)]
pub struct Cli {
    /// Note service address (overrides config and VOICENOTE_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Print diagnostic logs to stderr
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record from the microphone, then upload and watch processing
    Record {
        #[command(flatten)]
        target: UploadTarget,
    },
    /// Upload an audio file and watch processing
    Upload {
        /// Audio file (wav, mp3, m4a, flac, ogg, webm)
        file: PathBuf,
        #[command(flatten)]
        target: UploadTarget,
    },
    /// Follow the processing status of a note
    Watch {
        note_id: String,
    },
    /// Play a note with its transcript highlighted in sync
    Play {
        note_id: String,
        /// Audio URL or file to play instead of the note's stored audio
        #[arg(long, value_name = "SOURCE")]
        audio: Option<String>,
    },
    /// Print a note's transcript and analysis
    Show {
        note_id: String,
    },
    /// Ask questions about a processed note
    Chat {
        note_id: String,
    },
    /// List upload destinations
    Projects,
    /// Sign in and store the access token
    Login {
        #[arg(short = 'e', long)]
        email: String,
        /// Password; prompted for when absent
        #[arg(long, env = "VOICENOTE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored access token
    Logout,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Where an upload goes
#[derive(Args, Debug, Clone, Default)]
pub struct UploadTarget {
    /// Destination project id (defaults to config, then the first project)
    #[arg(short = 'p', long, value_name = "ID")]
    pub project: Option<String>,

    /// Note title (defaults to the file name or recording time)
    #[arg(short = 't', long)]
    pub title: Option<String>,

    /// Show a desktop notification when processing ends
    #[arg(short = 'n', long)]
    pub notify: bool,
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "api_url",
    "ws_url",
    "token",
    "default_project",
    "notify",
    "watch_timeout",
    "skip_seconds",
];
