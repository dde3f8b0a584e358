use crate::error::{PotatoAudioError, Result};
use rubato::{FftFixedIn, Resampler};

/// Offline sample-rate converter for whole assets.
///
/// All channels run through a single FFT resampler. The output is trimmed to
/// compensate for the resampler's delay and for the zero padding of the final
/// chunk, so a `n`-frame input yields `ceil(n * ratio)` frames.
pub struct BatchResampler {
    source_sample_rate: u32,
    target_sample_rate: u32,
    channels: u16,
    chunk_size: usize,
}

impl BatchResampler {
    pub fn new(
        source_sample_rate: u32,
        target_sample_rate: u32,
        channels: u16,
        chunk_size: Option<usize>,
    ) -> Result<Self> {
        if source_sample_rate == 0 || target_sample_rate == 0 {
            return Err(PotatoAudioError::AudioFormat(
                "Sample rates must be greater than 0".to_string(),
            ));
        }

        if channels == 0 {
            return Err(PotatoAudioError::AudioFormat(
                "Channel count must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            source_sample_rate,
            target_sample_rate,
            channels,
            chunk_size: chunk_size.unwrap_or(1024).max(1),
        })
    }

    /// Resamples interleaved audio and returns interleaved audio.
    pub fn resample_interleaved(&self, interleaved: &[f32]) -> Result<Vec<f32>> {
        if self.source_sample_rate == self.target_sample_rate || interleaved.is_empty() {
            return Ok(interleaved.to_vec());
        }

        let channels = self.channels as usize;
        let planar = deinterleave(interleaved, channels);
        let input_frames = planar[0].len();
        let expected_frames =
            (input_frames as f64 * self.resample_ratio()).ceil() as usize;

        let mut resampler = FftFixedIn::<f32>::new(
            self.source_sample_rate as usize,
            self.target_sample_rate as usize,
            self.chunk_size,
            2,
            channels,
        )
        .map_err(|e| PotatoAudioError::AudioLoading(format!("Failed to create resampler: {}", e)))?;

        let delay = resampler.output_delay();
        let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(expected_frames + delay); channels];
        let mut chunk = vec![vec![0.0f32; self.chunk_size]; channels];
        let mut position = 0;

        // Keep feeding (zero-padded past the end) until the delayed tail is flushed.
        while output[0].len() < delay + expected_frames {
            let available = input_frames.saturating_sub(position).min(self.chunk_size);
            for (ch, buffer) in chunk.iter_mut().enumerate() {
                buffer.fill(0.0);
                if available > 0 {
                    buffer[..available].copy_from_slice(&planar[ch][position..position + available]);
                }
            }
            position += available;

            let produced = resampler
                .process(&chunk, None)
                .map_err(|e| PotatoAudioError::AudioLoading(format!("Resampling error: {}", e)))?;
            for (out, new) in output.iter_mut().zip(produced) {
                out.extend_from_slice(&new);
            }
        }

        let mut result = Vec::with_capacity(expected_frames * channels);
        for frame in delay..delay + expected_frames {
            for out in &output {
                result.push(out[frame]);
            }
        }
        Ok(result)
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    pub fn source_sample_rate(&self) -> u32 {
        self.source_sample_rate
    }

    /// Ratio target/source: above 1.0 upsamples, below 1.0 downsamples.
    pub fn resample_ratio(&self) -> f64 {
        self.target_sample_rate as f64 / self.source_sample_rate as f64
    }
}

fn deinterleave(interleaved: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let mut planar = vec![Vec::with_capacity(interleaved.len() / channels); channels];
    for frame in interleaved.chunks(channels) {
        for (ch, plane) in planar.iter_mut().enumerate() {
            plane.push(frame.get(ch).copied().unwrap_or(0.0));
        }
    }
    planar
}
