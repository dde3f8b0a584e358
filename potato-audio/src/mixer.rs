// Mixer module - handles mixing of sound handles
// Spatial sounds are panned relative to the listener; non-spatial sounds keep
// their own channel layout (mono sources go to every channel).

use crate::engine::SoundId;
use crate::math::Pose;
use crate::playback::{EndOfData, PlaybackInstance};
use crate::spatial::{Panning, SpatialParams, spatial_panning};
use std::collections::HashMap;

/// Result of mixing one block
#[derive(Debug, Default)]
pub struct MixResult {
    pub frames_filled: usize,
    pub completed_sounds: Vec<SoundId>,
    pub looped_sounds: Vec<SoundId>,
}

/// Mix every playing sound into `output`.
///
/// `output` is cleared first. Panning is evaluated once per block from each
/// sound's current position, so position updates take effect at block
/// granularity.
pub fn mix_sounds(
    output: &mut [f32],
    channels: u16,
    sounds: &mut HashMap<SoundId, PlaybackInstance>,
    listener: &Pose,
    params: &SpatialParams,
) -> MixResult {
    output.fill(0.0);
    let channels = channels as usize;
    let mut result = MixResult::default();

    for (sound_id, instance) in sounds.iter_mut() {
        let panning = if instance.spatial {
            spatial_panning(listener, instance.position, params)
        } else {
            Panning::Uniform(1.0)
        };

        let frames_filled = instance.mix_into(output, channels, panning);
        result.frames_filled = result.frames_filled.max(frames_filled);

        match instance.take_end_of_data() {
            Some(EndOfData::Completed) => {
                log::info!("Mixer: Sound {} completed", sound_id);
                result.completed_sounds.push(*sound_id);
            }
            Some(EndOfData::Looped) => {
                log::debug!("Mixer: Sound {} looped", sound_id);
                result.looped_sounds.push(*sound_id);
            }
            None => {}
        }
    }

    result
}
