//! Decoded audio assets.

mod default_loader;
mod load_options;
mod loader;
mod resampler;

use crate::error::{PotatoAudioError, Result};
pub use default_loader::DefaultAudioLoader;
pub use load_options::{ConvertToMono, LoadOptions};
pub use loader::AudioDataLoader;
pub use resampler::BatchResampler;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Decoded audio, cheap to clone.
///
/// Samples are stored **interleaved**: stereo is `[L0, R0, L1, R1, ...]`, so a
/// frame is `channels` consecutive samples.
#[derive(Debug, Clone)]
pub struct AudioData {
    inner: Arc<AudioDataInner>,
}

#[derive(Debug)]
struct AudioDataInner {
    samples: Vec<f32>,
    sample_rate: u32,
    channels: u16,
    duration: Duration,
    total_frames: usize,
}

impl AudioData {
    /// Wraps interleaved samples.
    ///
    /// # Errors
    ///
    /// Returns `AudioFormat` if the sample rate or channel count is zero, or if
    /// the sample count is not a whole number of frames.
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Result<Self> {
        if sample_rate == 0 {
            return Err(PotatoAudioError::AudioFormat(
                "Sample rate must be greater than 0".to_string(),
            ));
        }
        if channels == 0 {
            return Err(PotatoAudioError::AudioFormat(
                "Channel count must be greater than 0".to_string(),
            ));
        }
        if samples.len() % channels as usize != 0 {
            return Err(PotatoAudioError::AudioFormat(format!(
                "{} samples do not form whole {}-channel frames",
                samples.len(),
                channels
            )));
        }

        let total_frames = samples.len() / channels as usize;
        let duration = Duration::from_secs_f64(total_frames as f64 / sample_rate as f64);
        Ok(Self {
            inner: Arc::new(AudioDataInner {
                samples,
                sample_rate,
                channels,
                duration,
                total_frames,
            }),
        })
    }

    /// Load audio data from a file path using the default loader.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        DefaultAudioLoader.load(path.as_ref(), &LoadOptions::default())
    }

    /// Load audio data from a file path with custom loading options.
    pub fn from_path_with_options(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self> {
        DefaultAudioLoader.load(path.as_ref(), options)
    }

    /// Load audio data from a file path using a custom loader.
    pub fn from_path_with_loader<L: AudioDataLoader>(
        path: impl AsRef<Path>,
        loader: &L,
        options: &LoadOptions,
    ) -> Result<Self> {
        loader.load(path.as_ref(), options)
    }

    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.inner.channels
    }

    pub fn duration(&self) -> Duration {
        self.inner.duration
    }

    pub fn samples(&self) -> &[f32] {
        &self.inner.samples
    }

    pub fn total_frames(&self) -> usize {
        self.inner.total_frames
    }

    pub fn is_empty(&self) -> bool {
        self.inner.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.samples.len()
    }

    /// Returns one frame averaged down to a single sample.
    ///
    /// Out-of-range frames read as silence.
    pub fn mono_frame(&self, frame: usize) -> f32 {
        if frame >= self.inner.total_frames {
            return 0.0;
        }
        let channels = self.inner.channels as usize;
        let start = frame * channels;
        let sum: f32 = self.inner.samples[start..start + channels].iter().sum();
        sum / channels as f32
    }

    /// Returns one channel of one frame; out-of-range reads are silence.
    pub fn frame_sample(&self, frame: usize, channel: usize) -> f32 {
        let channels = self.inner.channels as usize;
        if frame >= self.inner.total_frames || channel >= channels {
            return 0.0;
        }
        self.inner.samples[frame * channels + channel]
    }

    /// Get samples for a specific channel (0-indexed)
    pub fn channel_samples(&self, channel: usize) -> Result<Vec<f32>> {
        if channel >= self.inner.channels as usize {
            return Err(PotatoAudioError::AudioFormat(format!(
                "Channel {} out of range (max: {})",
                channel,
                self.inner.channels - 1
            )));
        }

        Ok(self
            .inner
            .samples
            .chunks(self.inner.channels as usize)
            .map(|frame| frame[channel])
            .collect())
    }

    /// Convert to mono by downmixing all channels
    pub fn to_mono(&self) -> Result<Self> {
        if self.inner.channels == 1 {
            return Ok(self.clone());
        }

        let mono_samples: Vec<f32> = (0..self.inner.total_frames)
            .map(|frame| self.mono_frame(frame))
            .collect();

        Self::from_samples(mono_samples, self.inner.sample_rate, 1)
    }

    /// Resample to a different sample rate using rubato
    pub fn resample(&self, target_sample_rate: u32) -> Result<Self> {
        if target_sample_rate == self.inner.sample_rate {
            return Ok(self.clone());
        }

        let resampler = BatchResampler::new(
            self.inner.sample_rate,
            target_sample_rate,
            self.inner.channels,
            Some(1024),
        )?;

        let resampled_samples = resampler.resample_interleaved(&self.inner.samples)?;

        log::debug!(
            "Resampled {} frames from {} Hz to {} Hz",
            self.inner.total_frames,
            self.inner.sample_rate,
            target_sample_rate
        );

        Self::from_samples(resampled_samples, target_sample_rate, self.inner.channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_samples_computes_frames_and_duration() {
        let data = AudioData::from_samples(vec![0.0; 96000], 48000, 2).unwrap();
        assert_eq!(data.total_frames(), 48000);
        assert_eq!(data.duration(), Duration::from_secs(1));
    }

    #[test]
    fn from_samples_rejects_partial_frames() {
        assert!(AudioData::from_samples(vec![0.0; 3], 48000, 2).is_err());
        assert!(AudioData::from_samples(vec![0.0; 4], 0, 2).is_err());
        assert!(AudioData::from_samples(vec![0.0; 4], 48000, 0).is_err());
    }

    #[test]
    fn to_mono_averages_channels() {
        let data = AudioData::from_samples(vec![1.0, 0.0, 0.5, 0.5], 44100, 2).unwrap();
        let mono = data.to_mono().unwrap();
        assert_eq!(mono.channels(), 1);
        assert_eq!(mono.samples(), &[0.5, 0.5]);
    }

    #[test]
    fn frame_sample_reads_one_channel() {
        let data = AudioData::from_samples(vec![1.0, 0.25, 0.5, 0.75], 44100, 2).unwrap();
        assert_eq!(data.frame_sample(1, 0), 0.5);
        assert_eq!(data.frame_sample(0, 1), 0.25);
        assert_eq!(data.frame_sample(2, 0), 0.0);
        assert_eq!(data.frame_sample(0, 2), 0.0);
    }

    #[test]
    fn channel_samples_out_of_range() {
        let data = AudioData::from_samples(vec![0.1, 0.2], 44100, 1).unwrap();
        assert_eq!(data.channel_samples(0).unwrap(), vec![0.1, 0.2]);
        assert!(data.channel_samples(1).is_err());
    }

    #[test]
    fn resample_changes_rate() {
        let samples: Vec<f32> = (0..4410).map(|i| (i as f32 * 0.01).sin()).collect();
        let data = AudioData::from_samples(samples, 44100, 1).unwrap();
        let resampled = data.resample(48000).unwrap();
        assert_eq!(resampled.sample_rate(), 48000);
        assert_eq!(resampled.channels(), 1);
        assert!(!resampled.is_empty());
    }
}
