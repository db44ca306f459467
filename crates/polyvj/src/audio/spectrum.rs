//! Sample-to-spectrum conversion.
//!
//! Hann-windowed FFT over the newest capture buffer, mapped to the byte
//! magnitude array the core's feature extractor consumes. The dB window
//! mirrors a browser analyser node (-100 to -30 dB onto 0-255), which is
//! the loudness curve the band thresholds were tuned against.

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

use super::BUFFER_SIZE;

pub const SPECTRUM_BINS: usize = BUFFER_SIZE / 2;

const MIN_DB: f32 = -100.0;
const MAX_DB: f32 = -30.0;

pub struct SpectrumProcessor {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    fft_buffer: Vec<Complex<f32>>,
    magnitudes: [u8; SPECTRUM_BINS],
}

impl SpectrumProcessor {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(BUFFER_SIZE);

        let window: Vec<f32> = (0..BUFFER_SIZE)
            .map(|i| {
                0.5 * (1.0
                    - (2.0 * std::f32::consts::PI * i as f32 / BUFFER_SIZE as f32).cos())
            })
            .collect();

        Self {
            fft,
            window,
            fft_buffer: vec![Complex::new(0.0, 0.0); BUFFER_SIZE],
            magnitudes: [0; SPECTRUM_BINS],
        }
    }

    /// Transform one frame of samples. Short input is zero-padded.
    pub fn process(&mut self, samples: &[f32]) -> &[u8] {
        let count = samples.len().min(BUFFER_SIZE);
        for i in 0..BUFFER_SIZE {
            let sample = if i < count { samples[i] } else { 0.0 };
            self.fft_buffer[i] = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.fft_buffer);

        for (bin, out) in self.magnitudes.iter_mut().enumerate() {
            let norm = self.fft_buffer[bin].norm() * 2.0 / BUFFER_SIZE as f32;
            let db = 20.0 * (norm + 1e-10).log10();
            let scaled = (db - MIN_DB) / (MAX_DB - MIN_DB);
            *out = (scaled.clamp(0.0, 1.0) * 255.0) as u8;
        }

        &self.magnitudes
    }
}

impl Default for SpectrumProcessor {
    fn default() -> Self {
        Self::new()
    }
}
