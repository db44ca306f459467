//! Full-screen shader effect mode.
//!
//! Produces the uniform set for the effect pass each frame; the backend
//! owns the actual pixels. Time advances faster on beats, which is what
//! makes the static/kaleidoscope pulse with the music.

use crate::bands::AudioBands;
use crate::control::{ControlVector, Param};
use crate::scene::{FxUniforms, FxVariant, Hsl, RenderScene};

/// Effects never run fully dark, whatever the intensity knob says.
const INTENSITY_FLOOR: f32 = 0.2;

pub struct FxMode {
    variant: FxVariant,
    mono: bool,
    time: f32,
}

impl FxMode {
    pub fn new() -> Self {
        Self {
            variant: FxVariant::Noise,
            mono: false,
            time: 0.0,
        }
    }

    pub fn variant(&self) -> FxVariant {
        self.variant
    }

    pub fn set_variant(&mut self, variant: FxVariant) {
        self.variant = variant;
    }

    pub fn next_variant(&mut self) -> FxVariant {
        let idx = FxVariant::ALL
            .iter()
            .position(|&v| v == self.variant)
            .unwrap_or(0);
        self.variant = FxVariant::ALL[(idx + 1) % FxVariant::ALL.len()];
        self.variant
    }

    pub fn set_mono(&mut self, mono: bool) {
        self.mono = mono;
    }

    pub fn update(&mut self, bands: &AudioBands, controls: &ControlVector, scene: &mut RenderScene) {
        let controls = controls.with_floor(Param::Intensity, INTENSITY_FLOOR);

        self.time += 0.01 + bands.beat * 0.1;

        scene.background = Hsl::new(0.0, 0.0, 0.0);
        scene.fx = Some(FxUniforms {
            variant: self.variant,
            time: self.time,
            intensity: controls.get(Param::Intensity),
            sub_param: controls.get(Param::FxAmount),
            low: bands.low,
            mid: bands.mid,
            high: bands.high,
            beat: bands.beat,
            mono: self.mono,
        });
    }
}

impl Default for FxMode {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniforms_reflect_bands_and_controls() {
        let mut mode = FxMode::new();
        let mut scene = RenderScene::default();
        let bands = AudioBands {
            low: 0.1,
            mid: 0.2,
            high: 0.3,
            rms: 0.2,
            beat: 0.1,
        };
        let mut controls = ControlVector::default();
        controls.set(Param::Intensity, 0.9);
        controls.set(Param::FxAmount, 0.4);

        mode.update(&bands, &controls, &mut scene);
        let fx = scene.fx.expect("fx uniforms present");
        assert_eq!(fx.intensity, 0.9);
        assert_eq!(fx.sub_param, 0.4);
        assert_eq!(fx.low, 0.1);
        assert_eq!(fx.beat, 0.1);
        assert_eq!(fx.variant, FxVariant::Noise);
    }

    #[test]
    fn test_intensity_floor_applied() {
        let mut mode = FxMode::new();
        let mut scene = RenderScene::default();
        let mut controls = ControlVector::default();
        controls.set(Param::Intensity, 0.0);

        mode.update(&AudioBands::default(), &controls, &mut scene);
        assert_eq!(scene.fx.unwrap().intensity, INTENSITY_FLOOR);
        // The shared vector itself is untouched.
        assert_eq!(controls.get(Param::Intensity), 0.0);
    }

    #[test]
    fn test_time_advances_faster_on_beats() {
        let mut quiet = FxMode::new();
        let mut pulsing = FxMode::new();
        let mut scene = RenderScene::default();
        let controls = ControlVector::default();

        let beat = AudioBands {
            beat: 1.0,
            ..AudioBands::default()
        };
        for _ in 0..10 {
            quiet.update(&AudioBands::default(), &controls, &mut scene);
            pulsing.update(&beat, &controls, &mut scene);
        }
        assert!((quiet.time - 0.1).abs() < 1e-5);
        assert!((pulsing.time - 1.1).abs() < 1e-4);
    }

    #[test]
    fn test_variant_cycling_wraps() {
        let mut mode = FxMode::new();
        assert_eq!(mode.next_variant(), FxVariant::Kaleido);
        assert_eq!(mode.next_variant(), FxVariant::OpArt);
        assert_eq!(mode.next_variant(), FxVariant::Noise);
    }
}
