use crate::math::Vec3;

/// Initial state of a sound when it is registered with the engine.
#[derive(Debug, Clone)]
pub struct SoundConfig {
    /// Whether the sound is positioned in 3D or sent straight to every channel
    pub spatial: bool,
    /// Initial 3D position (ignored by non-spatial sounds)
    pub position: Vec3,
    /// Volume multiplier (0.0 = silent, 1.0 = full volume)
    pub volume: f32,
    /// Playback rate multiplier (1.0 = original pitch)
    pub pitch: f32,
    /// Restart from the beginning when the end is reached
    pub looping: bool,
    /// Start the 3D movement update loop right after construction
    pub movement_enabled: bool,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            spatial: true,
            position: Vec3::ZERO,
            volume: 1.0,
            pitch: 1.0,
            looping: false,
            movement_enabled: false,
        }
    }
}

impl SoundConfig {
    /// Create a spatial sound configuration at the given position
    pub fn spatial(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a non-spatial sound configuration
    pub fn non_spatial() -> Self {
        Self {
            spatial: false,
            ..Default::default()
        }
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn movement_enabled(mut self, enabled: bool) -> Self {
        self.movement_enabled = enabled;
        self
    }
}
