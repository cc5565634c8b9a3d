//! VoiceNote sync - client-side voice-note capture, playback and live status
//!
//! This crate records voice notes from the microphone, uploads them to a
//! note service, follows server-side processing over a live status socket,
//! and plays notes back with the transcript highlighted in sync.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: State machines, value objects and wire records
//! - **Application**: Controllers and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal, rodio, reqwest, WebSocket, etc.)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
