//! # potato-audio
//!
//! Audio layer of the Potato engine: a shared mixer, sound instances with
//! 3D positioning, and a per-sound movement update loop.
//!
//! ## Quick Start
//!
//! ```no_run
//! use potato_audio::*;
//!
//! let mut session = AudioSession::new(AudioEngineDesc::default())?;
//! session.start()?;
//!
//! let id = session.add_sound("assets/footsteps.wav", SoundConfig::spatial(Vec3::ZERO))?;
//! let sound = session.sound_mut(id).expect("just added");
//! sound.set_looping(true)?;
//! sound.play()?;
//!
//! // Let the movement worker keep the engine in sync while we move the sound.
//! sound.enable_3d_movement(true)?;
//! sound.set_position(3.0, 0.0, -1.0)?;
//!
//! session.set_listener_position(0.0, 0.0, 0.0);
//!
//! for event in session.poll_events() {
//!     if let AudioEvent::SoundCompleted { sound_id } = event {
//!         println!("{} finished", sound_id);
//!     }
//! }
//! # Ok::<(), PotatoAudioError>(())
//! ```
//!
//! ## Key Components
//!
//! - **[`AudioSession`]**: owns the engine, the device output and the sounds
//! - **[`AudioEngine`]**: shared mixer binding that sounds register with
//! - **[`Sound`]**: one playable asset with its own playback handle
//! - **[`MovementController`]**: background loop applying a sound's position
//! - **[`OutputStream`]**: `cpal` device stream rendering from the engine
//! - **[`AudioEvent`]**: notifications drained with `poll_events`
//!
//! ## Threading
//!
//! 1. **Caller thread**: owns the session and sounds, issues commands
//! 2. **Device callback**: renders through [`AudioEngine::render`], never waits on a lock
//! 3. **Movement workers**: one per sound with movement enabled, stopped and
//!    joined before the sound's handle is released

pub mod audio_data;
pub mod config;
pub mod echo;
pub mod engine;
pub mod error;
pub mod events;
pub mod math;
pub mod mixer;
pub mod movement;
pub mod output;
pub mod playback;
pub mod session;
pub mod sound;
pub mod spatial;

pub use audio_data::AudioData;
pub use config::{AudioEngineDesc, EchoDesc, SoundConfig};
pub use engine::{AudioEngine, SoundId};
pub use error::PotatoAudioError;
pub use events::AudioEvent;
pub use math::{Pose, Quat, Vec3};
pub use movement::{MovementController, MovementState};
pub use output::OutputStream;
pub use playback::{PlayState, PlaybackInfo};
pub use session::AudioSession;
pub use sound::Sound;
