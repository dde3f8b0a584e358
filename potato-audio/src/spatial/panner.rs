use crate::config::AudioEngineDesc;
use crate::math::{Pose, Vec3};
use std::f32::consts::FRAC_PI_4;

/// Distance model shared by every spatial sound of an engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialParams {
    pub min_distance: f32,
    pub max_distance: f32,
    pub rolloff: f32,
}

impl SpatialParams {
    /// Inverse-distance gain, clamped to `[min_distance, max_distance]`.
    ///
    /// Returns 1.0 inside `min_distance`.
    pub fn attenuation(&self, distance: f32) -> f32 {
        let distance = distance.clamp(self.min_distance, self.max_distance);
        self.min_distance / (self.min_distance + self.rolloff * (distance - self.min_distance))
    }
}

impl From<&AudioEngineDesc> for SpatialParams {
    fn from(desc: &AudioEngineDesc) -> Self {
        Self {
            min_distance: desc.min_distance,
            max_distance: desc.max_distance,
            rolloff: desc.rolloff,
        }
    }
}

/// Per-channel gains applied to a sound's mono signal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Panning {
    /// Same gain on every output channel
    Uniform(f32),
    /// Stereo pair on channels 0/1; `attenuation` alone is used for mono output
    Spatial {
        left: f32,
        right: f32,
        attenuation: f32,
    },
}

impl Panning {
    pub fn gain(&self, channel: usize, channels: usize) -> f32 {
        match *self {
            Self::Uniform(gain) => gain,
            Self::Spatial { attenuation, .. } if channels == 1 => attenuation,
            Self::Spatial { left, .. } if channel == 0 => left,
            Self::Spatial { right, .. } if channel == 1 => right,
            Self::Spatial { .. } => 0.0,
        }
    }
}

/// Computes the panning of a source at `position` heard from `listener`.
pub fn spatial_panning(listener: &Pose, position: Vec3, params: &SpatialParams) -> Panning {
    let local = listener.to_local(position);
    let distance = listener.distance_to(position);
    let attenuation = params.attenuation(distance);

    // A source on top of the listener is centred.
    let pan = if distance > f32::EPSILON {
        (local.x / distance).clamp(-1.0, 1.0)
    } else {
        0.0
    };

    let angle = (pan + 1.0) * FRAC_PI_4;
    Panning::Spatial {
        left: angle.cos() * attenuation,
        right: angle.sin() * attenuation,
        attenuation,
    }
}
