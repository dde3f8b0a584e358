//! Configuration descriptors for the engine and for individual sounds.

mod engine_desc;
mod sound_config;

pub use engine_desc::{AudioEngineDesc, EchoDesc};
pub use sound_config::SoundConfig;
