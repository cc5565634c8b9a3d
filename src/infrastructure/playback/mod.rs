//! Playback engine adapter

mod rodio_engine;

pub use rodio_engine::RodioEngineFactory;
