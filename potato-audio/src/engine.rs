use crate::audio_data::AudioData;
use crate::config::{AudioEngineDesc, SoundConfig};
use crate::echo::Echo;
use crate::error::{PotatoAudioError, Result};
use crate::events::AudioEvent;
use crate::math::{Pose, Vec3};
use crate::mixer::mix_sounds;
use crate::playback::{PlayState, PlaybackInfo, PlaybackInstance};
use crate::spatial::SpatialParams;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

/// Lightweight, type-safe handle for a sound registered with an engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundId(u64);

impl SoundId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SoundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SoundId({})", self.0)
    }
}

/// Shared audio engine binding.
///
/// Cloning is cheap and every clone refers to the same mixer. Sounds keep a
/// clone, so the engine always outlives the sounds registered with it.
///
/// The engine owns one [`PlaybackInstance`] per registered sound, the listener
/// pose, the echo effect and the event queue. [`render`](Self::render) mixes
/// everything into an interleaved buffer; it is driven by an
/// [`OutputStream`](crate::OutputStream) or called directly.
#[derive(Clone)]
pub struct AudioEngine {
    inner: Arc<EngineShared>,
}

struct EngineShared {
    desc: AudioEngineDesc,
    spatial: SpatialParams,
    mix: Mutex<MixState>,
    next_sound_id: AtomicU64,
    movement_workers: Arc<AtomicUsize>,
    position_updates: AtomicUsize,
    event_sender: Sender<AudioEvent>,
    event_receiver: Receiver<AudioEvent>,
    /// Set once the queue overflowed; cleared by `poll_events`
    events_overflowed: AtomicBool,
}

struct MixState {
    sounds: HashMap<SoundId, PlaybackInstance>,
    listener: Pose,
    echo: Echo,
}

impl AudioEngine {
    pub fn new(desc: AudioEngineDesc) -> Result<Self> {
        desc.validate()?;

        let (event_sender, event_receiver) = bounded(desc.event_capacity);
        let echo = Echo::new(&desc.echo, desc.sample_rate, desc.channels);

        log::info!(
            "Audio engine created: {} Hz, {} channel(s), movement interval {:?}",
            desc.sample_rate,
            desc.channels,
            desc.movement_interval
        );

        Ok(Self {
            inner: Arc::new(EngineShared {
                spatial: SpatialParams::from(&desc),
                desc,
                mix: Mutex::new(MixState {
                    sounds: HashMap::new(),
                    listener: Pose::identity(),
                    echo,
                }),
                next_sound_id: AtomicU64::new(0),
                movement_workers: Arc::new(AtomicUsize::new(0)),
                position_updates: AtomicUsize::new(0),
                event_sender,
                event_receiver,
                events_overflowed: AtomicBool::new(false),
            }),
        })
    }

    pub fn desc(&self) -> &AudioEngineDesc {
        &self.inner.desc
    }

    pub fn sample_rate(&self) -> u32 {
        self.inner.desc.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.inner.desc.channels
    }

    fn mix_state(&self) -> MutexGuard<'_, MixState> {
        // A panic while holding the lock cannot leave the mix state torn in a
        // way that matters for playback, so keep going with it.
        self.inner.mix.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_sound<R>(
        &self,
        id: SoundId,
        f: impl FnOnce(&mut PlaybackInstance) -> R,
    ) -> Result<R> {
        let mut state = self.mix_state();
        let instance = state
            .sounds
            .get_mut(&id)
            .ok_or(PotatoAudioError::SoundNotFound(id))?;
        Ok(f(instance))
    }

    /// Queues an event without blocking. Events are dropped while the queue
    /// is full, so an engine nobody polls stays bounded.
    pub(crate) fn emit(&self, event: AudioEvent) {
        match self.inner.event_sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                if !self.inner.events_overflowed.swap(true, Ordering::Relaxed) {
                    log::warn!(
                        "Event queue full ({} events), dropping {:?} and later events until polled",
                        self.inner.desc.event_capacity,
                        event
                    );
                }
            }
            // The engine holds the receiver.
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Registers decoded audio and returns its playback handle.
    ///
    /// Audio is resampled to the engine's sample rate if needed. The sound
    /// starts stopped.
    pub fn register_sound(&self, audio_data: AudioData, config: &SoundConfig) -> Result<SoundId> {
        if self.sound_count() >= self.inner.desc.max_sounds {
            return Err(PotatoAudioError::CapacityExceeded(self.inner.desc.max_sounds));
        }

        // Resampling is slow; keep it outside the mix lock.
        let audio_data = if audio_data.sample_rate() != self.inner.desc.sample_rate {
            audio_data.resample(self.inner.desc.sample_rate)?
        } else {
            audio_data
        };

        let id = SoundId::from_raw(self.inner.next_sound_id.fetch_add(1, Ordering::Relaxed));
        let instance = PlaybackInstance::new(id, audio_data, config);

        let mut state = self.mix_state();
        if state.sounds.len() >= self.inner.desc.max_sounds {
            return Err(PotatoAudioError::CapacityExceeded(self.inner.desc.max_sounds));
        }
        state.sounds.insert(id, instance);
        drop(state);

        log::debug!("Registered sound {} (spatial: {})", id, config.spatial);
        Ok(id)
    }

    /// Releases a playback handle. Returns false if it was not registered.
    pub fn release_sound(&self, id: SoundId) -> bool {
        let removed = self.mix_state().sounds.remove(&id).is_some();
        if removed {
            log::debug!("Released sound {}", id);
            self.emit(AudioEvent::SoundReleased { sound_id: id });
        }
        removed
    }

    pub fn contains_sound(&self, id: SoundId) -> bool {
        self.mix_state().sounds.contains_key(&id)
    }

    pub fn sound_count(&self) -> usize {
        self.mix_state().sounds.len()
    }

    /// Positional-audio primitive: moves a sound in 3D.
    pub fn set_sound_position(&self, id: SoundId, position: Vec3) -> Result<()> {
        self.with_sound(id, |instance| instance.position = position)?;
        self.inner.position_updates.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn sound_position(&self, id: SoundId) -> Result<Vec3> {
        self.with_sound(id, |instance| instance.position)
    }

    /// Sets the playback rate; values below [`MIN_PITCH`](crate::playback::MIN_PITCH) are clamped.
    pub fn set_sound_pitch(&self, id: SoundId, pitch: f32) -> Result<()> {
        self.with_sound(id, |instance| instance.set_pitch(pitch))
    }

    pub fn set_sound_volume(&self, id: SoundId, volume: f32) -> Result<()> {
        self.with_sound(id, |instance| instance.volume = volume.max(0.0))
    }

    pub fn set_sound_looping(&self, id: SoundId, looping: bool) -> Result<()> {
        self.with_sound(id, |instance| instance.looping = looping)
    }

    pub fn play_sound(&self, id: SoundId) -> Result<()> {
        self.with_sound(id, |instance| instance.play())?;
        self.emit(AudioEvent::SoundStarted { sound_id: id });
        Ok(())
    }

    pub fn pause_sound(&self, id: SoundId) -> Result<()> {
        let paused = self.with_sound(id, |instance| {
            instance.pause();
            instance.state() == PlayState::Paused
        })?;
        if paused {
            self.emit(AudioEvent::SoundPaused { sound_id: id });
        }
        Ok(())
    }

    pub fn resume_sound(&self, id: SoundId) -> Result<()> {
        if self.with_sound(id, |instance| instance.resume())? {
            self.emit(AudioEvent::SoundStarted { sound_id: id });
        }
        Ok(())
    }

    pub fn restart_sound(&self, id: SoundId) -> Result<()> {
        self.with_sound(id, |instance| instance.restart())?;
        self.emit(AudioEvent::SoundStarted { sound_id: id });
        Ok(())
    }

    pub fn sound_state(&self, id: SoundId) -> Result<PlayState> {
        self.with_sound(id, |instance| instance.state())
    }

    pub fn playback_info(&self, id: SoundId) -> Result<PlaybackInfo> {
        self.with_sound(id, |instance| instance.info())
    }

    /// Moves the listener without changing its orientation.
    pub fn set_listener_position(&self, position: Vec3) {
        self.mix_state().listener.position = position;
    }

    pub fn set_listener_pose(&self, pose: Pose) {
        self.mix_state().listener = pose;
    }

    pub fn listener(&self) -> Pose {
        self.mix_state().listener
    }

    pub fn enable_echo(&self) {
        self.mix_state().echo.set_enabled(true);
        log::info!("Echo enabled");
    }

    pub fn disable_echo(&self) {
        self.mix_state().echo.set_enabled(false);
        log::info!("Echo disabled");
    }

    pub fn is_echo_enabled(&self) -> bool {
        self.mix_state().echo.is_enabled()
    }

    /// Mixes every playing sound into `output` (interleaved, engine channel
    /// count) and returns the number of frames any sound contributed.
    ///
    /// Safe to call from a real-time callback: if another thread holds the
    /// mix state, the block is rendered as silence instead of waiting.
    pub fn render(&self, output: &mut [f32]) -> usize {
        let mut state = match self.inner.mix.try_lock() {
            Ok(state) => state,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                log::trace!("Mix state busy, rendering silence");
                output.fill(0.0);
                return 0;
            }
        };

        let MixState {
            sounds,
            listener,
            echo,
        } = &mut *state;

        let result = mix_sounds(
            output,
            self.inner.desc.channels,
            sounds,
            listener,
            &self.inner.spatial,
        );
        echo.process(output);
        drop(state);

        for sound_id in result.completed_sounds {
            self.emit(AudioEvent::SoundCompleted { sound_id });
        }
        for sound_id in result.looped_sounds {
            self.emit(AudioEvent::SoundLooped { sound_id });
        }

        result.frames_filled
    }

    /// Drains pending events.
    pub fn poll_events(&self) -> Vec<AudioEvent> {
        let events = self.inner.event_receiver.try_iter().collect();
        self.inner.events_overflowed.store(false, Ordering::Relaxed);
        events
    }

    /// Number of 3D movement workers currently alive across all sounds.
    pub fn active_movement_workers(&self) -> usize {
        self.inner.movement_workers.load(Ordering::SeqCst)
    }

    /// Total number of positional updates applied since the engine was created.
    pub fn position_updates(&self) -> usize {
        self.inner.position_updates.load(Ordering::Relaxed)
    }

    pub(crate) fn movement_worker_counter(&self) -> Arc<AtomicUsize> {
        self.inner.movement_workers.clone()
    }
}
