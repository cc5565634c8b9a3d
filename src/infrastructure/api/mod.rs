//! Note service REST adapter

mod http_notes_api;

pub use http_notes_api::HttpNotesApi;
