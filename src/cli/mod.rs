//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, signal handling,
//! keyboard input and the command runners.

pub mod app;
pub mod args;
pub mod auth_cmd;
pub mod chat_cmd;
pub mod config_cmd;
pub mod input;
pub mod navigator;
pub mod note_cmd;
pub mod play_cmd;
pub mod presenter;
pub mod record_cmd;
pub mod signals;
pub mod upload_cmd;

// Re-export commonly used types
pub use app::{AppContext, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction, UploadTarget};
pub use presenter::Presenter;
