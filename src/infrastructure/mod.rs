//! Infrastructure layer - Adapter implementations
//!
//! Concrete implementations of the port interfaces, backed by the audio
//! devices, the note service and the desktop.

pub mod api;
pub mod capture;
pub mod config;
pub mod notification;
pub mod object_url;
pub mod playback;
pub mod status;

pub use api::HttpNotesApi;
pub use capture::CpalCaptureHost;
pub use config::XdgConfigStore;
pub use notification::NotifyRustNotifier;
pub use object_url::TempFileUrlStore;
pub use playback::RodioEngineFactory;
pub use status::WsStatusTransport;
