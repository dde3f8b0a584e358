//! Device output: pulls mixed frames from an [`AudioEngine`] into the default
//! output device.

use crate::engine::AudioEngine;
use crate::error::{PotatoAudioError, Result};
use crate::events::AudioEvent;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Output stream on the default host/device, rendering from an engine.
pub struct OutputStream {
    engine: AudioEngine,
    stream: Option<cpal::Stream>,
    is_running: Arc<AtomicBool>,
    frames_processed: Arc<AtomicUsize>,
}

impl OutputStream {
    pub fn new(engine: AudioEngine) -> Self {
        Self {
            engine,
            stream: None,
            is_running: Arc::new(AtomicBool::new(false)),
            frames_processed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Opens the default output device and starts rendering.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running.load(Ordering::Relaxed) {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = host.default_output_device().ok_or_else(|| {
            PotatoAudioError::AudioDevice("No default output device available".into())
        })?;

        let desc = self.engine.desc();
        let config = cpal::StreamConfig {
            channels: desc.channels,
            sample_rate: cpal::SampleRate(desc.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(desc.block_size as u32),
        };

        let default_config = device.default_output_config().map_err(|e| {
            PotatoAudioError::AudioDevice(format!("Failed to get default config: {}", e))
        })?;
        let supported: Vec<_> = device
            .supported_output_configs()
            .map_err(|e| {
                PotatoAudioError::AudioDevice(format!("Failed to query output configs: {}", e))
            })?
            .collect();
        let sample_format = select_sample_format(
            &supported,
            config.channels,
            config.sample_rate.0,
            default_config.sample_format(),
        )?;

        log::info!(
            "Opening output device {} ({} ch, {} Hz, {:?})",
            device.name().unwrap_or_else(|_| "<unknown>".to_string()),
            config.channels,
            config.sample_rate.0,
            sample_format
        );

        let stream = match sample_format {
            cpal::SampleFormat::F32 => self.create_stream::<f32>(&device, &config)?,
            cpal::SampleFormat::I16 => self.create_stream::<i16>(&device, &config)?,
            cpal::SampleFormat::U16 => self.create_stream::<u16>(&device, &config)?,
            format => {
                return Err(PotatoAudioError::AudioFormat(format!(
                    "Unsupported sample format {:?}",
                    format
                )));
            }
        };

        stream.play().map_err(|e| {
            PotatoAudioError::AudioDevice(format!("Failed to start stream: {}", e))
        })?;

        self.stream = Some(stream);
        self.is_running.store(true, Ordering::Relaxed);
        self.engine.emit(AudioEvent::EngineStarted);

        Ok(())
    }

    /// Stops rendering and closes the device.
    pub fn stop(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            self.is_running.store(false, Ordering::Relaxed);
            drop(stream);
            self.engine.emit(AudioEvent::EngineStopped);
            log::info!("Output stream stopped");
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Relaxed)
    }

    /// Number of frames rendered by the engine since the stream was created
    pub fn frames_processed(&self) -> usize {
        self.frames_processed.load(Ordering::Relaxed)
    }

    fn create_stream<T>(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
    ) -> Result<cpal::Stream>
    where
        T: SizedSample + FromSample<f32>,
    {
        let engine = self.engine.clone();
        let error_engine = self.engine.clone();
        let is_running = self.is_running.clone();
        let frames_processed = self.frames_processed.clone();
        let mut mix_buffer: Vec<f32> = Vec::new();

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    if !is_running.load(Ordering::Relaxed) {
                        data.fill(T::from_sample(0.0f32));
                        return;
                    }

                    // Reallocates only when the device changes its block size.
                    if mix_buffer.len() != data.len() {
                        mix_buffer.resize(data.len(), 0.0);
                    }

                    let frames_filled = engine.render(&mut mix_buffer);

                    for (out, sample) in data.iter_mut().zip(&mix_buffer) {
                        *out = T::from_sample(*sample);
                    }

                    frames_processed.fetch_add(frames_filled, Ordering::Relaxed);
                },
                move |err| {
                    log::error!("Audio stream error: {}", err);
                    error_engine.emit(AudioEvent::EngineError {
                        error: err.to_string(),
                    });
                },
                None,
            )
            .map_err(|e| PotatoAudioError::AudioDevice(format!("Failed to build stream: {}", e)))
    }
}

const RENDERABLE_FORMATS: [cpal::SampleFormat; 3] = [
    cpal::SampleFormat::F32,
    cpal::SampleFormat::I16,
    cpal::SampleFormat::U16,
];

/// Picks the sample format to open the device with.
///
/// The device must support the engine's channel count and sample rate; the
/// device's default format is preferred when it qualifies.
fn select_sample_format(
    supported: &[cpal::SupportedStreamConfigRange],
    channels: u16,
    sample_rate: u32,
    preferred: cpal::SampleFormat,
) -> Result<cpal::SampleFormat> {
    let with_channels: Vec<_> = supported
        .iter()
        .filter(|range| range.channels() == channels)
        .collect();
    if with_channels.is_empty() {
        let mut available: Vec<u16> = supported.iter().map(|range| range.channels()).collect();
        available.sort_unstable();
        available.dedup();
        return Err(PotatoAudioError::AudioDevice(format!(
            "Output device does not support {} channel(s) (supported: {:?})",
            channels, available
        )));
    }

    let with_rate: Vec<_> = with_channels
        .iter()
        .filter(|range| {
            range.min_sample_rate().0 <= sample_rate && sample_rate <= range.max_sample_rate().0
        })
        .collect();
    if with_rate.is_empty() {
        let available: Vec<String> = with_channels
            .iter()
            .map(|range| {
                format!(
                    "{}-{} Hz",
                    range.min_sample_rate().0,
                    range.max_sample_rate().0
                )
            })
            .collect();
        return Err(PotatoAudioError::AudioDevice(format!(
            "Output device does not support {} Hz with {} channel(s) (supported: {})",
            sample_rate,
            channels,
            available.join(", ")
        )));
    }

    let formats: Vec<cpal::SampleFormat> = with_rate
        .iter()
        .map(|range| range.sample_format())
        .filter(|format| RENDERABLE_FORMATS.contains(format))
        .collect();
    if formats.contains(&preferred) {
        return Ok(preferred);
    }
    RENDERABLE_FORMATS
        .into_iter()
        .find(|format| formats.contains(format))
        .ok_or_else(|| {
            PotatoAudioError::AudioFormat(format!(
                "Output device offers no f32, i16 or u16 format at {} Hz with {} channel(s)",
                sample_rate, channels
            ))
        })
}

impl Drop for OutputStream {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
