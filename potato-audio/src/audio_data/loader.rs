use crate::audio_data::{AudioData, LoadOptions};
use crate::error::Result;
use std::path::Path;

/// Trait for loading audio data from file paths.
///
/// [`DefaultAudioLoader`](crate::audio_data::DefaultAudioLoader) decodes through
/// Symphonia; implement this to plug in another decoder or an asset cache.
pub trait AudioDataLoader {
    /// Loads and decodes the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns a `PotatoAudioError` if the file cannot be opened or decoded.
    fn load(&self, path: &Path, options: &LoadOptions) -> Result<AudioData>;
}
