//! Object URL adapter

mod temp_file;

pub use temp_file::{path_from_url, TempFileUrlStore};
