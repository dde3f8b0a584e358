//! Feedback delay applied to the master mix.

use crate::config::EchoDesc;

/// Interleaved feedback delay line.
///
/// Each output sample is `dry + wet * delayed`, and `dry + decay * delayed` is
/// written back into the line, so repeats die out geometrically.
#[derive(Debug)]
pub struct Echo {
    line: Vec<f32>,
    cursor: usize,
    decay: f32,
    wet: f32,
    enabled: bool,
}

impl Echo {
    pub fn new(desc: &EchoDesc, sample_rate: u32, channels: u16) -> Self {
        let delay_frames = ((desc.delay.as_secs_f64() * sample_rate as f64).round() as usize).max(1);
        Self {
            line: vec![0.0; delay_frames * channels as usize],
            cursor: 0,
            decay: desc.decay,
            wet: desc.wet,
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turns the effect on or off. Turning it off clears the tail.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled && !enabled {
            self.line.fill(0.0);
            self.cursor = 0;
        }
        self.enabled = enabled;
    }

    pub fn process(&mut self, buffer: &mut [f32]) {
        if !self.enabled {
            return;
        }
        for sample in buffer.iter_mut() {
            let delayed = self.line[self.cursor];
            self.line[self.cursor] = *sample + delayed * self.decay;
            *sample += delayed * self.wet;
            self.cursor = (self.cursor + 1) % self.line.len();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn echo() -> Echo {
        // 4 frames of delay at 1 kHz, mono.
        Echo::new(&EchoDesc::new(Duration::from_millis(4), 0.5), 1000, 1)
    }

    #[test]
    fn disabled_echo_is_passthrough() {
        let mut echo = echo();
        let mut buffer = [1.0, 0.0, 0.0, 0.0, 0.0];
        echo.process(&mut buffer);
        assert_eq!(buffer, [1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn impulse_repeats_after_delay_with_decay() {
        let mut echo = echo();
        echo.set_enabled(true);
        let mut buffer = [0.0f32; 12];
        buffer[0] = 1.0;
        echo.process(&mut buffer);
        assert_eq!(buffer[0], 1.0);
        assert_eq!(buffer[4], 1.0);
        assert_eq!(buffer[8], 0.5);
        assert_eq!(buffer[1], 0.0);
    }

    #[test]
    fn disabling_clears_the_tail() {
        let mut echo = echo();
        echo.set_enabled(true);
        echo.process(&mut [1.0, 0.0]);
        echo.set_enabled(false);
        echo.set_enabled(true);
        let mut buffer = [0.0f32; 8];
        echo.process(&mut buffer);
        assert!(buffer.iter().all(|s| *s == 0.0));
    }
}
