//! Event types emitted by the engine and its sounds

use crate::engine::SoundId;

/// Notifications drained with [`AudioEngine::poll_events`](crate::AudioEngine::poll_events).
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    SoundStarted { sound_id: SoundId },
    SoundPaused { sound_id: SoundId },
    /// A non-looping sound played to its end
    SoundCompleted { sound_id: SoundId },
    /// A looping sound wrapped around to its beginning
    SoundLooped { sound_id: SoundId },
    MovementStarted { sound_id: SoundId },
    MovementStopped { sound_id: SoundId },
    SoundReleased { sound_id: SoundId },
    EngineStarted,
    EngineStopped,
    EngineError { error: String },
}

impl AudioEvent {
    pub fn sound_id(&self) -> Option<SoundId> {
        match self {
            Self::SoundStarted { sound_id }
            | Self::SoundPaused { sound_id }
            | Self::SoundCompleted { sound_id }
            | Self::SoundLooped { sound_id }
            | Self::MovementStarted { sound_id }
            | Self::MovementStopped { sound_id }
            | Self::SoundReleased { sound_id } => Some(*sound_id),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::EngineError { .. })
    }
}
