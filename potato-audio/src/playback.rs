//! Playback control and state management.
//!
//! - [`PlayState`]: current playback state (playing, paused, stopped)
//! - [`PlaybackInfo`]: snapshot of a handle's cursor and parameters
//! - [`PlaybackInstance`]: the engine-side state behind one sound handle
//!
//! Most users drive playback through [`Sound`](crate::Sound) rather than these
//! types directly.

use crate::audio_data::AudioData;
use crate::config::SoundConfig;
use crate::engine::SoundId;
use crate::math::Vec3;
use crate::spatial::Panning;

/// Lowest playback rate accepted; smaller values are clamped.
pub const MIN_PITCH: f32 = 0.01;

/// Represents the current playback state of a sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    /// Audio is currently playing
    Playing,
    /// Audio is paused (retains playback position)
    Paused,
    /// Audio never started or reached its end
    Stopped,
}

/// Snapshot of a sound handle, returned by
/// [`AudioEngine::playback_info`](crate::AudioEngine::playback_info).
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackInfo {
    /// Current playback position in frames
    pub current_frame: usize,
    /// Total number of frames in the audio
    pub total_frames: usize,
    /// Current playback time in seconds
    pub current_time: f64,
    /// Total duration in seconds
    pub total_time: f64,
    pub play_state: PlayState,
    pub position: Vec3,
    pub volume: f32,
    pub pitch: f32,
    pub looping: bool,
    pub spatial: bool,
}

/// What happened at the end of the audio during one mix call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EndOfData {
    Completed,
    Looped,
}

/// Engine-side state of one sound handle.
#[derive(Debug)]
pub struct PlaybackInstance {
    pub(crate) id: SoundId,
    data: AudioData,
    /// Fractional frame cursor; advances by `pitch` per output frame
    cursor: f64,
    state: PlayState,
    pub(crate) position: Vec3,
    pub(crate) volume: f32,
    pitch: f32,
    pub(crate) looping: bool,
    pub(crate) spatial: bool,
    end_of_data: Option<EndOfData>,
}

impl PlaybackInstance {
    pub(crate) fn new(id: SoundId, data: AudioData, config: &SoundConfig) -> Self {
        Self {
            id,
            data,
            cursor: 0.0,
            state: PlayState::Stopped,
            position: config.position,
            volume: config.volume,
            pitch: config.pitch.max(MIN_PITCH),
            looping: config.looping,
            spatial: config.spatial,
            end_of_data: None,
        }
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub(crate) fn set_pitch(&mut self, pitch: f32) {
        // NaN fails the comparison and is clamped too.
        self.pitch = if pitch >= MIN_PITCH {
            pitch
        } else {
            log::warn!("Sound {} pitch {} clamped to {}", self.id, pitch, MIN_PITCH);
            MIN_PITCH
        };
    }

    fn is_at_end(&self) -> bool {
        self.cursor >= self.data.total_frames() as f64
    }

    /// Starts playback; a sound that reached its end starts over.
    pub(crate) fn play(&mut self) {
        if self.is_at_end() {
            self.cursor = 0.0;
        }
        log::debug!("Sound {} playing from frame {}", self.id, self.cursor as usize);
        self.state = PlayState::Playing;
    }

    pub(crate) fn pause(&mut self) {
        if self.state == PlayState::Playing {
            log::debug!("Sound {} paused at frame {}", self.id, self.cursor as usize);
            self.state = PlayState::Paused;
        }
    }

    /// Continues a paused sound. Returns false if it was not paused.
    pub(crate) fn resume(&mut self) -> bool {
        if self.state != PlayState::Paused {
            return false;
        }
        log::debug!("Sound {} resuming from frame {}", self.id, self.cursor as usize);
        self.state = PlayState::Playing;
        true
    }

    /// Rewinds to the beginning and plays.
    pub(crate) fn restart(&mut self) {
        log::debug!("Sound {} restarting", self.id);
        self.cursor = 0.0;
        self.end_of_data = None;
        self.state = PlayState::Playing;
    }

    pub fn info(&self) -> PlaybackInfo {
        let sample_rate = self.data.sample_rate() as f64;
        let total_frames = self.data.total_frames();
        let current_frame = (self.cursor as usize).min(total_frames);
        PlaybackInfo {
            current_frame,
            total_frames,
            current_time: current_frame as f64 / sample_rate,
            total_time: total_frames as f64 / sample_rate,
            play_state: self.state,
            position: self.position,
            volume: self.volume,
            pitch: self.pitch,
            looping: self.looping,
            spatial: self.spatial,
        }
    }

    /// Linear interpolation between neighbouring frames, wrapping for loops.
    ///
    /// `read` picks the value of one frame: the mono downmix or one channel.
    fn sample_at(&self, cursor: f64, read: impl Fn(&AudioData, usize) -> f32) -> f32 {
        let total = self.data.total_frames();
        let index = cursor as usize;
        let frac = (cursor - index as f64) as f32;
        let next = if index + 1 >= total && self.looping {
            0
        } else {
            index + 1
        };
        let a = read(&self.data, index);
        let b = read(&self.data, next);
        a + (b - a) * frac
    }

    /// Mixes this sound into `output` (interleaved, `channels` wide).
    ///
    /// Uniform panning of a multichannel source into a multichannel output
    /// keeps the source channels: source channel `c` feeds output channel `c`.
    /// Every other case mixes the mono downmix through the panning gains.
    ///
    /// Returns the number of frames written. Reaching the end either wraps the
    /// cursor (looping) or stops playback; the outcome is reported once through
    /// [`take_end_of_data`](Self::take_end_of_data).
    pub(crate) fn mix_into(&mut self, output: &mut [f32], channels: usize, panning: Panning) -> usize {
        if self.state != PlayState::Playing {
            return 0;
        }

        let total = self.data.total_frames() as f64;
        if total == 0.0 {
            self.state = PlayState::Stopped;
            self.end_of_data = Some(EndOfData::Completed);
            return 0;
        }

        let source_channels = self.data.channels() as usize;
        let per_channel =
            matches!(panning, Panning::Uniform(_)) && source_channels > 1 && channels > 1;

        let mut frames_filled = 0;
        for frame in output.chunks_exact_mut(channels) {
            if per_channel {
                for (channel, out) in frame.iter_mut().enumerate().take(source_channels) {
                    let sample =
                        self.sample_at(self.cursor, |data, f| data.frame_sample(f, channel));
                    *out += sample * self.volume * panning.gain(channel, channels);
                }
            } else {
                let sample = self.sample_at(self.cursor, AudioData::mono_frame) * self.volume;
                for (channel, out) in frame.iter_mut().enumerate() {
                    *out += sample * panning.gain(channel, channels);
                }
            }
            frames_filled += 1;

            self.cursor += self.pitch as f64;
            if self.cursor >= total {
                if self.looping {
                    self.cursor %= total;
                    self.end_of_data = Some(EndOfData::Looped);
                } else {
                    self.cursor = total;
                    self.state = PlayState::Stopped;
                    self.end_of_data = Some(EndOfData::Completed);
                    break;
                }
            }
        }

        frames_filled
    }

    pub(crate) fn take_end_of_data(&mut self) -> Option<EndOfData> {
        self.end_of_data.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(samples: Vec<f32>, config: SoundConfig) -> PlaybackInstance {
        let data = AudioData::from_samples(samples, 1000, 1).unwrap();
        PlaybackInstance::new(SoundId::from_raw(0), data, &config)
    }

    #[test]
    fn stopped_instance_writes_nothing() {
        let mut inst = instance(vec![1.0; 8], SoundConfig::non_spatial());
        let mut out = [0.0f32; 8];
        assert_eq!(inst.mix_into(&mut out, 2, Panning::Uniform(1.0)), 0);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn plays_to_end_and_completes() {
        let mut inst = instance(vec![0.5; 3], SoundConfig::non_spatial());
        inst.play();
        let mut out = [0.0f32; 10];
        assert_eq!(inst.mix_into(&mut out, 2, Panning::Uniform(1.0)), 3);
        assert_eq!(&out[..6], &[0.5; 6]);
        assert_eq!(&out[6..], &[0.0; 4]);
        assert_eq!(inst.state(), PlayState::Stopped);
        assert_eq!(inst.take_end_of_data(), Some(EndOfData::Completed));
        assert_eq!(inst.take_end_of_data(), None);
    }

    #[test]
    fn looping_wraps_around() {
        let mut inst = instance(vec![0.0, 1.0], SoundConfig::non_spatial().looping(true));
        inst.play();
        let mut out = [0.0f32; 5];
        assert_eq!(inst.mix_into(&mut out, 1, Panning::Uniform(1.0)), 5);
        assert_eq!(out, [0.0, 1.0, 0.0, 1.0, 0.0]);
        assert_eq!(inst.state(), PlayState::Playing);
        assert_eq!(inst.take_end_of_data(), Some(EndOfData::Looped));
    }

    #[test]
    fn pitch_two_skips_every_other_frame() {
        let mut inst = instance(vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5], SoundConfig::non_spatial());
        inst.set_pitch(2.0);
        inst.play();
        let mut out = [0.0f32; 4];
        assert_eq!(inst.mix_into(&mut out, 1, Panning::Uniform(1.0)), 3);
        assert_eq!(out, [0.0, 0.2, 0.4, 0.0]);
    }

    #[test]
    fn pause_resume_and_restart() {
        let mut inst = instance(vec![0.25; 4], SoundConfig::non_spatial().volume(2.0));
        inst.play();
        let mut out = [0.0f32; 2];
        inst.mix_into(&mut out, 1, Panning::Uniform(1.0));
        assert_eq!(out, [0.5, 0.5]);

        inst.pause();
        assert_eq!(inst.state(), PlayState::Paused);
        assert_eq!(inst.info().current_frame, 2);
        assert!(inst.resume());
        assert!(!inst.resume());

        inst.restart();
        assert_eq!(inst.info().current_frame, 0);
        assert_eq!(inst.state(), PlayState::Playing);
    }

    fn stereo(frames: &[[f32; 2]], config: SoundConfig) -> PlaybackInstance {
        let samples = frames.iter().flatten().copied().collect();
        let data = AudioData::from_samples(samples, 1000, 2).unwrap();
        PlaybackInstance::new(SoundId::from_raw(0), data, &config)
    }

    #[test]
    fn uniform_stereo_keeps_its_channels() {
        let mut inst = stereo(&[[1.0, 0.0]; 4], SoundConfig::non_spatial());
        inst.play();
        let mut out = [0.0f32; 8];
        assert_eq!(inst.mix_into(&mut out, 2, Panning::Uniform(1.0)), 4);
        for frame in out.chunks(2) {
            assert_eq!(frame, [1.0, 0.0]);
        }
    }

    #[test]
    fn uniform_stereo_fills_only_matching_channels() {
        let mut inst = stereo(&[[0.5, 0.25]; 2], SoundConfig::non_spatial());
        inst.play();
        let mut out = [0.0f32; 8];
        inst.mix_into(&mut out, 4, Panning::Uniform(1.0));
        assert_eq!(out, [0.5, 0.25, 0.0, 0.0, 0.5, 0.25, 0.0, 0.0]);
    }

    #[test]
    fn stereo_into_mono_output_is_downmixed() {
        let mut inst = stereo(&[[1.0, 0.0]; 2], SoundConfig::non_spatial());
        inst.play();
        let mut out = [0.0f32; 2];
        inst.mix_into(&mut out, 1, Panning::Uniform(1.0));
        assert_eq!(out, [0.5, 0.5]);
    }

    #[test]
    fn spatial_stereo_uses_the_downmix() {
        let mut inst = stereo(&[[1.0, 0.0]; 2], SoundConfig::default());
        inst.play();
        let mut out = [0.0f32; 4];
        let panning = Panning::Spatial {
            left: 1.0,
            right: 1.0,
            attenuation: 1.0,
        };
        inst.mix_into(&mut out, 2, panning);
        assert_eq!(out, [0.5; 4]);
    }

    #[test]
    fn invalid_pitch_is_clamped() {
        let mut inst = instance(vec![0.0; 4], SoundConfig::non_spatial());
        inst.set_pitch(-3.0);
        assert_eq!(inst.pitch(), MIN_PITCH);
        inst.set_pitch(f32::NAN);
        assert_eq!(inst.pitch(), MIN_PITCH);
    }
}
