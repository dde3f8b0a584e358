use crate::error::{PotatoAudioError, Result};
use std::time::Duration;

/// Configuration descriptor for an [`AudioEngine`](crate::AudioEngine).
#[derive(Debug, Clone)]
pub struct AudioEngineDesc {
    /// Sample rate of the mix; sounds are resampled to it on registration
    pub sample_rate: u32,
    /// Frames requested from the device per callback
    pub block_size: usize,
    /// Number of output channels (typically 2 for stereo)
    pub channels: u16,
    /// Maximum number of sounds registered at once
    pub max_sounds: usize,
    /// Cadence of the per-sound 3D movement update loop
    pub movement_interval: Duration,
    /// Distance under which spatial sounds are not attenuated
    pub min_distance: f32,
    /// Distance past which attenuation stops growing
    pub max_distance: f32,
    /// Rolloff factor of the inverse-distance attenuation
    pub rolloff: f32,
    /// Echo effect applied to the master mix when enabled
    pub echo: EchoDesc,
    /// Events kept until `poll_events`; newer events are dropped when full
    pub event_capacity: usize,
}

impl Default for AudioEngineDesc {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            block_size: 512,
            channels: 2,
            max_sounds: 64,
            movement_interval: Duration::from_millis(16),
            min_distance: 1.0,
            max_distance: 100.0,
            rolloff: 1.0,
            echo: EchoDesc::default(),
            event_capacity: 1024,
        }
    }
}

impl AudioEngineDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    pub fn channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    pub fn max_sounds(mut self, max: usize) -> Self {
        self.max_sounds = max;
        self
    }

    pub fn movement_interval(mut self, interval: Duration) -> Self {
        self.movement_interval = interval;
        self
    }

    pub fn attenuation(mut self, min_distance: f32, max_distance: f32, rolloff: f32) -> Self {
        self.min_distance = min_distance;
        self.max_distance = max_distance;
        self.rolloff = rolloff;
        self
    }

    pub fn echo(mut self, echo: EchoDesc) -> Self {
        self.echo = echo;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Checks the descriptor before an engine is built from it.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(PotatoAudioError::Configuration(
                "Sample rate must be greater than 0".into(),
            ));
        }
        if self.channels == 0 {
            return Err(PotatoAudioError::Configuration(
                "Channel count must be greater than 0".into(),
            ));
        }
        if self.block_size == 0 {
            return Err(PotatoAudioError::Configuration(
                "Block size must be greater than 0".into(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(PotatoAudioError::Configuration(
                "Event capacity must be greater than 0".into(),
            ));
        }
        if self.movement_interval.is_zero() {
            return Err(PotatoAudioError::Configuration(
                "Movement update interval must be greater than 0".into(),
            ));
        }
        if self.min_distance <= 0.0 || self.max_distance < self.min_distance {
            return Err(PotatoAudioError::Configuration(format!(
                "Invalid attenuation range {}..{}",
                self.min_distance, self.max_distance
            )));
        }
        self.echo.validate()
    }
}

/// Feedback delay applied to the master mix.
#[derive(Debug, Clone)]
pub struct EchoDesc {
    /// Delay between the dry signal and its first repeat
    pub delay: Duration,
    /// Gain applied to each repeat (0.0..1.0)
    pub decay: f32,
    /// Level of the delayed signal added to the dry signal
    pub wet: f32,
}

impl Default for EchoDesc {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(250),
            decay: 0.5,
            wet: 1.0,
        }
    }
}

impl EchoDesc {
    pub fn new(delay: Duration, decay: f32) -> Self {
        Self {
            delay,
            decay,
            ..Default::default()
        }
    }

    pub fn wet(mut self, wet: f32) -> Self {
        self.wet = wet;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.delay.is_zero() {
            return Err(PotatoAudioError::Configuration(
                "Echo delay must be greater than 0".into(),
            ));
        }
        // A decay of 1.0 or more never dies out.
        if !(0.0..1.0).contains(&self.decay) {
            return Err(PotatoAudioError::Configuration(format!(
                "Echo decay must be in [0, 1), got {}",
                self.decay
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_desc_is_valid() {
        assert!(AudioEngineDesc::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_interval() {
        let desc = AudioEngineDesc::new().movement_interval(Duration::ZERO);
        assert!(matches!(
            desc.validate(),
            Err(PotatoAudioError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_zero_event_capacity() {
        assert!(AudioEngineDesc::new().event_capacity(0).validate().is_err());
    }

    #[test]
    fn rejects_unstable_echo() {
        let desc = AudioEngineDesc::new().echo(EchoDesc::new(Duration::from_millis(100), 1.0));
        assert!(desc.validate().is_err());
    }
}
