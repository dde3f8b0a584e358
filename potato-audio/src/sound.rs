use crate::audio_data::{AudioData, AudioDataLoader, DefaultAudioLoader, LoadOptions};
use crate::config::SoundConfig;
use crate::engine::{AudioEngine, SoundId};
use crate::error::Result;
use crate::events::AudioEvent;
use crate::math::Vec3;
use crate::movement::{MovementController, MovementState};
use crate::playback::{PlayState, PlaybackInfo};
use std::path::{Path, PathBuf};

/// One playable asset bound to an [`AudioEngine`].
///
/// A `Sound` exclusively owns its playback handle in the engine. Dropping it
/// stops and joins the 3D movement worker first, then releases the handle, so
/// the worker can never touch a released handle.
///
/// # Example
///
/// ```no_run
/// use potato_audio::{AudioEngine, AudioEngineDesc, Sound};
///
/// let engine = AudioEngine::new(AudioEngineDesc::default())?;
/// let mut sound = Sound::new(&engine, "assets/engine_hum.wav")?;
/// sound.set_looping(true)?;
/// sound.play()?;
///
/// sound.enable_3d_movement(true)?;
/// sound.set_position(4.0, 0.0, -2.0)?;
/// # Ok::<(), potato_audio::PotatoAudioError>(())
/// ```
pub struct Sound {
    engine: AudioEngine,
    id: SoundId,
    path: Option<PathBuf>,
    movement: MovementController,
}

impl Sound {
    /// Loads `path` and registers it with the engine using default settings.
    pub fn new(engine: &AudioEngine, path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(engine, path, SoundConfig::default())
    }

    /// Loads `path` and registers it with the engine.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or decoded, or if the engine is full.
    /// No handle is registered in that case.
    pub fn with_config(
        engine: &AudioEngine,
        path: impl AsRef<Path>,
        config: SoundConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        let options = LoadOptions::new().target_sample_rate(engine.sample_rate());
        let data = DefaultAudioLoader.load(path, &options).inspect_err(|e| {
            log::error!("Failed to load sound {}: {}", path.display(), e);
        })?;

        let mut sound = Self::from_data(engine, data, config)?;
        sound.path = Some(path.to_path_buf());
        Ok(sound)
    }

    /// Registers already-decoded audio with the engine.
    pub fn from_data(engine: &AudioEngine, data: AudioData, config: SoundConfig) -> Result<Self> {
        let id = engine.register_sound(data, &config)?;

        let apply_engine = engine.clone();
        let movement = MovementController::new(
            id.raw().to_string(),
            config.position,
            engine.desc().movement_interval,
            engine.movement_worker_counter(),
            move |position| {
                if let Err(e) = apply_engine.set_sound_position(id, position) {
                    log::warn!("Movement update for sound {} dropped: {}", id, e);
                }
            },
        );

        let mut sound = Self {
            engine: engine.clone(),
            id,
            path: None,
            movement,
        };

        if config.movement_enabled {
            sound.enable_3d_movement(true)?;
        }

        Ok(sound)
    }

    pub fn id(&self) -> SoundId {
        self.id
    }

    /// File the sound was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn engine(&self) -> &AudioEngine {
        &self.engine
    }

    /// Starts playback; a finished sound starts over.
    pub fn play(&self) -> Result<()> {
        self.engine.play_sound(self.id)
    }

    pub fn pause(&self) -> Result<()> {
        self.engine.pause_sound(self.id)
    }

    /// Continues after [`pause`](Self::pause). Does nothing otherwise.
    pub fn resume(&self) -> Result<()> {
        self.engine.resume_sound(self.id)
    }

    /// Rewinds to the beginning and plays.
    pub fn restart(&self) -> Result<()> {
        self.engine.restart_sound(self.id)
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.engine.sound_state(self.id), Ok(PlayState::Playing))
    }

    pub fn playback_info(&self) -> Result<PlaybackInfo> {
        self.engine.playback_info(self.id)
    }

    pub fn set_volume(&self, volume: f32) -> Result<()> {
        self.engine.set_sound_volume(self.id, volume)
    }

    pub fn set_looping(&self, looping: bool) -> Result<()> {
        self.engine.set_sound_looping(self.id, looping)
    }

    pub fn set_pitch(&self, pitch: f32) -> Result<()> {
        self.engine.set_sound_pitch(self.id, pitch)
    }

    /// Sets the sound's position in 3D.
    ///
    /// With movement enabled the position is handed to the update loop and
    /// reaches the engine within one update interval. With movement disabled it
    /// is applied to the engine once, right away.
    pub fn set_position(&self, x: f32, y: f32, z: f32) -> Result<()> {
        let position = Vec3::new(x, y, z);
        self.movement.set_position(position);
        if !self.movement.is_enabled() {
            self.engine.set_sound_position(self.id, position)?;
        }
        Ok(())
    }

    /// Target position of the sound (the last one set).
    pub fn position(&self) -> Vec3 {
        self.movement.position()
    }

    /// Turns the 3D movement update loop on or off.
    ///
    /// Turning it off does not wait for the worker; use
    /// [`stop_movement`](Self::stop_movement) for that.
    pub fn enable_3d_movement(&mut self, enable: bool) -> Result<()> {
        let before = self.movement.state();
        self.movement.enable(enable)?;
        let after = self.movement.state();

        match (before, after) {
            (MovementState::Running, MovementState::Running) => {}
            (_, MovementState::Running) => {
                log::debug!("Sound {} movement enabled", self.id);
                self.engine
                    .emit(AudioEvent::MovementStarted { sound_id: self.id });
            }
            (MovementState::Running, _) => {
                log::debug!("Sound {} movement disabled", self.id);
                self.engine
                    .emit(AudioEvent::MovementStopped { sound_id: self.id });
            }
            _ => {}
        }
        Ok(())
    }

    /// Stops the movement update loop and waits for its worker to exit.
    pub fn stop_movement(&mut self) {
        let was_running = self.movement.state() == MovementState::Running;
        self.movement.stop();
        if was_running {
            self.engine
                .emit(AudioEvent::MovementStopped { sound_id: self.id });
        }
    }

    pub fn movement_state(&self) -> MovementState {
        self.movement.state()
    }

    pub fn is_movement_enabled(&self) -> bool {
        self.movement.is_enabled()
    }

    pub fn is_movement_running(&self) -> bool {
        self.movement.is_running()
    }
}

impl Drop for Sound {
    fn drop(&mut self) {
        // Join before release: the worker must be gone before the handle is.
        self.stop_movement();
        self.engine.release_sound(self.id);
    }
}

impl std::fmt::Debug for Sound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sound")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("movement", &self.movement.state())
            .finish()
    }
}
