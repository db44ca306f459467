//! Frequency-band feature extraction.
//!
//! Collapses a byte magnitude spectrum into the small set of scalar features
//! everything downstream reacts to: low/mid/high band energy, overall RMS,
//! and a beat pulse.

/// Fraction of the spectrum covered by the low band.
const LOW_SPLIT: f32 = 0.1;

/// Fraction of the spectrum where the mid band ends (low + mid together).
const MID_SPLIT: f32 = 0.4;

/// Low-band level above which the beat output saturates to 1.0.
pub const BEAT_THRESHOLD: f32 = 0.6;

/// Per-frame audio features, all in 0-1.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AudioBands {
    /// Mean energy of the lowest 10% of bins
    pub low: f32,
    /// Mean energy of the 10%-40% bin range
    pub mid: f32,
    /// Mean energy of the remaining bins
    pub high: f32,
    /// Mean energy over the whole spectrum
    pub rms: f32,
    /// Threshold pulse: 1.0 when `low` exceeds [`BEAT_THRESHOLD`], else `low`
    pub beat: f32,
}

/// Extract band features from a byte magnitude spectrum (0-255 per bin).
///
/// Recomputed from scratch every frame; nothing persists between calls.
/// Degenerate inputs (empty slices, bands with zero bins) yield 0.0 rather
/// than NaN.
pub fn extract(magnitudes: &[u8]) -> AudioBands {
    let len = magnitudes.len();
    let low_end = (len as f32 * LOW_SPLIT).floor() as usize;
    let mid_end = (len as f32 * MID_SPLIT).floor() as usize;

    let low = mean(&magnitudes[..low_end]);
    let mid = mean(&magnitudes[low_end..mid_end]);
    let high = mean(&magnitudes[mid_end..]);
    let rms = mean(magnitudes);

    let beat = if low > BEAT_THRESHOLD { 1.0 } else { low };

    AudioBands {
        low,
        mid,
        high,
        rms,
        beat,
    }
}

fn mean(bins: &[u8]) -> f32 {
    if bins.is_empty() {
        return 0.0;
    }
    let sum: f32 = bins.iter().map(|&v| v as f32 / 255.0).sum();
    sum / bins.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_ranges_partition_spectrum() {
        // The three ranges must cover every bin exactly once.
        for len in [1usize, 2, 5, 256, 512, 1000, 2048] {
            let low_end = (len as f32 * LOW_SPLIT).floor() as usize;
            let mid_end = (len as f32 * MID_SPLIT).floor() as usize;
            assert!(low_end <= mid_end);
            assert!(mid_end <= len);
            let covered = low_end + (mid_end - low_end) + (len - mid_end);
            assert_eq!(covered, len);
        }
    }

    #[test]
    fn test_band_values_bounded() {
        let quiet = vec![0u8; 512];
        let loud = vec![255u8; 512];
        let ramp: Vec<u8> = (0..512).map(|i| (i % 256) as u8).collect();

        for magnitudes in [&quiet, &loud, &ramp] {
            let bands = extract(magnitudes);
            for v in [bands.low, bands.mid, bands.high, bands.rms, bands.beat] {
                assert!((0.0..=1.0).contains(&v), "band out of range: {}", v);
            }
        }
    }

    #[test]
    fn test_full_scale_input_saturates() {
        let bands = extract(&vec![255u8; 512]);
        assert!((bands.low - 1.0).abs() < 1e-5);
        assert!((bands.mid - 1.0).abs() < 1e-5);
        assert!((bands.high - 1.0).abs() < 1e-5);
        assert!((bands.rms - 1.0).abs() < 1e-5);
        assert_eq!(bands.beat, 1.0);
    }

    #[test]
    fn test_beat_passes_through_below_threshold() {
        // All bins at 100 -> low = 100/255 = 0.392, below the threshold.
        let bands = extract(&vec![100u8; 512]);
        assert!(bands.low < BEAT_THRESHOLD);
        assert_eq!(bands.beat, bands.low);
    }

    #[test]
    fn test_beat_saturates_above_threshold() {
        // All bins at 200 -> low = 200/255 = 0.784, above the threshold.
        let bands = extract(&vec![200u8; 512]);
        assert!((bands.low - 200.0 / 255.0).abs() < 1e-5);
        assert_eq!(bands.beat, 1.0);
    }

    #[test]
    fn test_degenerate_lengths_do_not_produce_nan() {
        for len in [0usize, 1, 2, 3, 9] {
            let bands = extract(&vec![128u8; len]);
            for v in [bands.low, bands.mid, bands.high, bands.rms, bands.beat] {
                assert!(v.is_finite());
                assert!((0.0..=1.0).contains(&v));
            }
        }
        // A 9-bin spectrum has an empty low range (floor(9 * 0.1) == 0).
        let bands = extract(&[255u8; 9]);
        assert_eq!(bands.low, 0.0);
        assert_eq!(bands.beat, 0.0);
    }

    #[test]
    fn test_bands_isolate_their_ranges() {
        // Energy only in the first 10% of bins shows up in low and rms alone.
        let mut magnitudes = vec![0u8; 512];
        for bin in magnitudes.iter_mut().take(51) {
            *bin = 255;
        }
        let bands = extract(&magnitudes);
        assert!(bands.low > 0.9);
        assert_eq!(bands.mid, 0.0);
        assert_eq!(bands.high, 0.0);
        assert!(bands.rms > 0.0 && bands.rms < 0.2);
    }
}
