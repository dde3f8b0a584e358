use crate::{
    audio_data::{AudioData, AudioDataLoader, ConvertToMono, LoadOptions},
    error::{PotatoAudioError, Result},
};
use std::fs::File;
use std::path::Path;
use symphonia::{
    core::{
        audio::SampleBuffer, codecs::DecoderOptions, errors::Error, formats::FormatOptions,
        io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
    },
    default::{get_codecs, get_probe},
};

/// Audio loader backed by the Symphonia decoder library.
///
/// Supports the formats enabled in Symphonia's default feature set (WAV, FLAC,
/// OGG/Vorbis, ...) and decodes them into interleaved f32 PCM.
pub struct DefaultAudioLoader;

impl AudioDataLoader for DefaultAudioLoader {
    fn load(&self, path: &Path, options: &LoadOptions) -> Result<AudioData> {
        let file = File::open(path)?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| {
                PotatoAudioError::AudioLoading(format!("Failed to probe audio format: {:?}", e))
            })?;

        let mut format = probed.format;

        let track = format.default_track().ok_or_else(|| {
            PotatoAudioError::AudioLoading("No default audio track found".to_string())
        })?;
        let track_id = track.id;

        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| PotatoAudioError::AudioLoading("Sample rate not found".to_string()))?;

        let channels = track
            .codec_params
            .channels
            .ok_or_else(|| PotatoAudioError::AudioLoading("Channel count not found".to_string()))?
            .count() as u16;

        let mut decoder = get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| {
                PotatoAudioError::AudioLoading(format!("Failed to create decoder: {:?}", e))
            })?;

        let mut samples: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(Error::IoError(_)) => break, // end-of-file
                Err(e) => {
                    return Err(PotatoAudioError::AudioLoading(format!(
                        "Error reading packet: {:?}",
                        e
                    )));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(Error::IoError(_)) => break,
                Err(Error::DecodeError(e)) => {
                    log::warn!("Skipping corrupt packet in {}: {}", path.display(), e);
                    continue;
                }
                Err(e) => {
                    return Err(PotatoAudioError::AudioLoading(format!(
                        "Error decoding packet: {:?}",
                        e
                    )));
                }
            };

            let spec = *decoded.spec();
            let capacity = decoded.capacity();

            let mut tmp = SampleBuffer::<f32>::new(capacity as u64, spec);
            tmp.copy_interleaved_ref(decoded);

            samples.extend_from_slice(tmp.samples());
        }

        let audio_data = AudioData::from_samples(samples, sample_rate, channels)?;

        let audio_data = match options.convert_to_mono {
            ConvertToMono::Original => audio_data,
            ConvertToMono::ForceMono => audio_data.to_mono()?,
        };

        let audio_data = match options.target_sample_rate {
            Some(rate) => audio_data.resample(rate)?,
            None => audio_data,
        };

        log::debug!(
            "Loaded {}: {} frames, {} Hz, {} channel(s)",
            path.display(),
            audio_data.total_frames(),
            audio_data.sample_rate(),
            audio_data.channels()
        );

        Ok(audio_data)
    }
}
