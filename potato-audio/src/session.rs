use crate::audio_data::AudioData;
use crate::config::{AudioEngineDesc, SoundConfig};
use crate::engine::{AudioEngine, SoundId};
use crate::error::Result;
use crate::events::AudioEvent;
use crate::math::{Pose, Vec3};
use crate::output::OutputStream;
use crate::sound::Sound;
use std::collections::BTreeMap;
use std::path::Path;

/// Owns the engine, the device output and every active sound.
///
/// `AudioSession` is an explicitly constructed context: create one, pass it
/// (or its [`engine`](Self::engine)) to whatever needs audio, and drop it to
/// tear everything down in order.
///
/// # Architecture
///
/// - **Caller thread**: owns the session, loads audio, controls sounds
/// - **Device thread**: `cpal` callback rendering through [`AudioEngine::render`]
/// - **Movement workers**: one per sound with 3D movement enabled
pub struct AudioSession {
    engine: AudioEngine,
    output: OutputStream,
    sounds: BTreeMap<SoundId, Sound>,
}

impl AudioSession {
    /// Builds the engine. No device is opened until [`start`](Self::start).
    pub fn new(desc: AudioEngineDesc) -> Result<Self> {
        let engine = AudioEngine::new(desc)?;
        Ok(Self {
            output: OutputStream::new(engine.clone()),
            engine,
            sounds: BTreeMap::new(),
        })
    }

    pub fn engine(&self) -> &AudioEngine {
        &self.engine
    }

    /// Opens the default output device.
    pub fn start(&mut self) -> Result<()> {
        self.output.start()
    }

    /// Closes the output device; sounds stay registered.
    pub fn stop(&mut self) -> Result<()> {
        self.output.stop()
    }

    pub fn is_running(&self) -> bool {
        self.output.is_running()
    }

    pub fn frames_processed(&self) -> usize {
        self.output.frames_processed()
    }

    /// Loads `path`, starts playing it and keeps it in the session.
    ///
    /// A sound that fails to load is logged and reported; the engine and the
    /// other sounds are unaffected.
    pub fn play_sound(&mut self, path: impl AsRef<Path>) -> Result<SoundId> {
        let id = self.add_sound(path, SoundConfig::default())?;
        if let Some(sound) = self.sounds.get(&id) {
            sound.play()?;
        }
        Ok(id)
    }

    /// Loads `path` and keeps it in the session without playing it.
    pub fn add_sound(&mut self, path: impl AsRef<Path>, config: SoundConfig) -> Result<SoundId> {
        let path = path.as_ref();
        let sound = Sound::with_config(&self.engine, path, config).inspect_err(|e| {
            log::warn!("Sound {} unavailable: {}", path.display(), e);
        })?;
        Ok(self.insert(sound))
    }

    /// Registers decoded audio and keeps it in the session.
    pub fn add_sound_data(&mut self, data: AudioData, config: SoundConfig) -> Result<SoundId> {
        let sound = Sound::from_data(&self.engine, data, config)?;
        Ok(self.insert(sound))
    }

    fn insert(&mut self, sound: Sound) -> SoundId {
        let id = sound.id();
        log::info!(
            "Session added sound {} ({})",
            id,
            sound
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "in-memory".to_string())
        );
        self.sounds.insert(id, sound);
        id
    }

    pub fn sound(&self, id: SoundId) -> Option<&Sound> {
        self.sounds.get(&id)
    }

    pub fn sound_mut(&mut self, id: SoundId) -> Option<&mut Sound> {
        self.sounds.get_mut(&id)
    }

    /// Drops a sound: its movement worker is joined, then its handle released.
    pub fn remove_sound(&mut self, id: SoundId) -> bool {
        self.sounds.remove(&id).is_some()
    }

    pub fn sound_ids(&self) -> Vec<SoundId> {
        self.sounds.keys().copied().collect()
    }

    pub fn set_listener_position(&self, x: f32, y: f32, z: f32) {
        self.engine.set_listener_position(Vec3::new(x, y, z));
    }

    pub fn set_listener_pose(&self, pose: Pose) {
        self.engine.set_listener_pose(pose);
    }

    pub fn enable_echo(&self) {
        self.engine.enable_echo();
    }

    pub fn disable_echo(&self) {
        self.engine.disable_echo();
    }

    pub fn poll_events(&self) -> Vec<AudioEvent> {
        self.engine.poll_events()
    }

    /// Drops every sound, then closes the device.
    pub fn shutdown(&mut self) {
        let count = self.sounds.len();
        self.sounds.clear();
        if let Err(e) = self.output.stop() {
            log::error!("Failed to stop output stream: {}", e);
        }
        log::info!("Audio session shut down ({} sound(s) released)", count);
    }
}

impl Drop for AudioSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
