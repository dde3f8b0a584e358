//! Error types for potato-audio

use crate::engine::SoundId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PotatoAudioError {
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio format error: {0}")]
    AudioFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audio loading error: {0}")]
    AudioLoading(String),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Sound {0} is not registered with the engine")]
    SoundNotFound(SoundId),

    #[error("Engine already holds the maximum of {0} sounds")]
    CapacityExceeded(usize),
}

pub type Result<T> = std::result::Result<T, PotatoAudioError>;
