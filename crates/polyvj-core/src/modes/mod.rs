//! Visual modes and the per-frame orchestrator.
//!
//! One mode is live at a time. The orchestrator owns the frame clock, the
//! shared [`RenderScene`] and the RNG, and routes every tick to the active
//! mode's update function.

pub mod layers;
pub mod shader_fx;
pub mod swarm;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bands::AudioBands;
use crate::control::ControlVector;
use crate::scene::RenderScene;
use crate::MAX_FRAME_DT;
use layers::{LayerMode, LayerPreset};
use shader_fx::FxMode;
use swarm::{SwarmMode, SWARM_PRESETS};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeKind {
    Layers,
    Swarm,
    ShaderFx,
}

impl ModeKind {
    pub const ALL: [ModeKind; 3] = [ModeKind::Layers, ModeKind::Swarm, ModeKind::ShaderFx];

    pub fn name(self) -> &'static str {
        match self {
            ModeKind::Layers => "3D Layers",
            ModeKind::Swarm => "Blob Swarm",
            ModeKind::ShaderFx => "Shader FX",
        }
    }
}

enum VisualMode {
    Layers(LayerMode),
    Swarm(SwarmMode),
    Fx(FxMode),
}

pub struct Orchestrator {
    mode: VisualMode,
    kind: ModeKind,
    time: f32,
    scene: RenderScene,
    rng: StdRng,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    pub fn with_rng(mut rng: StdRng) -> Self {
        Self {
            mode: VisualMode::Layers(LayerMode::new(&mut rng)),
            kind: ModeKind::Layers,
            time: 0.0,
            scene: RenderScene::default(),
            rng,
        }
    }

    pub fn kind(&self) -> ModeKind {
        self.kind
    }

    /// Switch the live mode, rebuilding it from scratch.
    pub fn set_mode(&mut self, kind: ModeKind) {
        if kind == self.kind {
            return;
        }
        self.kind = kind;
        self.mode = match kind {
            ModeKind::Layers => VisualMode::Layers(LayerMode::new(&mut self.rng)),
            ModeKind::Swarm => VisualMode::Swarm(SwarmMode::new()),
            ModeKind::ShaderFx => VisualMode::Fx(FxMode::new()),
        };
    }

    /// Name of the active mode's current preset/variant.
    pub fn preset_name(&self) -> &'static str {
        match &self.mode {
            VisualMode::Layers(m) => m.preset().name(),
            VisualMode::Swarm(m) => m.preset().name,
            VisualMode::Fx(m) => m.variant().name(),
        }
    }

    /// Advance to the next preset of the active mode.
    pub fn next_preset(&mut self) -> &'static str {
        match &mut self.mode {
            VisualMode::Layers(m) => {
                let idx = LayerPreset::ALL
                    .iter()
                    .position(|&p| p == m.preset())
                    .unwrap_or(0);
                m.apply_preset(LayerPreset::ALL[(idx + 1) % LayerPreset::ALL.len()]);
                m.preset().name()
            }
            VisualMode::Swarm(m) => {
                m.apply_preset(m.preset_index() + 1);
                m.preset().name
            }
            VisualMode::Fx(m) => m.next_variant().name(),
        }
    }

    /// Jump to a random preset of the active mode (auto-pilot switching).
    pub fn auto_switch(&mut self) -> &'static str {
        match &mut self.mode {
            VisualMode::Layers(m) => {
                let pick = LayerPreset::ALL[self.rng.random_range(0..LayerPreset::ALL.len())];
                m.apply_preset(pick);
                m.preset().name()
            }
            VisualMode::Swarm(m) => {
                m.apply_preset(self.rng.random_range(0..SWARM_PRESETS.len()));
                m.preset().name
            }
            VisualMode::Fx(m) => m.next_variant().name(),
        }
    }

    pub fn layers(&self) -> Option<&LayerMode> {
        match &self.mode {
            VisualMode::Layers(m) => Some(m),
            _ => None,
        }
    }

    /// One frame. `dt` is clamped so pauses cannot teleport entities.
    pub fn tick(
        &mut self,
        dt: f32,
        bands: &AudioBands,
        controls: &ControlVector,
    ) -> &RenderScene {
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        self.time += dt;
        self.scene.reset();

        match &mut self.mode {
            VisualMode::Layers(m) => {
                m.update(dt, self.time, bands, controls, &mut self.scene, &mut self.rng)
            }
            VisualMode::Swarm(m) => {
                m.update(dt, self.time, bands, controls, &mut self.scene, &mut self.rng)
            }
            VisualMode::Fx(m) => m.update(bands, controls, &mut self.scene),
        }

        &self.scene
    }

    pub fn scene(&self) -> &RenderScene {
        &self.scene
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orchestrator() -> Orchestrator {
        Orchestrator::with_rng(StdRng::seed_from_u64(5))
    }

    #[test]
    fn test_mode_switch_routes_updates() {
        let mut orch = orchestrator();
        let bands = AudioBands::default();
        let controls = ControlVector::default();

        orch.tick(0.016, &bands, &controls);
        assert!(orch.scene().fx.is_none());

        orch.set_mode(ModeKind::ShaderFx);
        assert_eq!(orch.kind(), ModeKind::ShaderFx);
        orch.tick(0.016, &bands, &controls);
        assert!(orch.scene().fx.is_some());
        assert!(orch.scene().meshes.is_empty());

        orch.set_mode(ModeKind::Swarm);
        orch.tick(0.016, &bands, &controls);
        // The swarm always draws its central blob.
        assert_eq!(orch.scene().meshes.len(), 1);
    }

    #[test]
    fn test_dt_clamped_against_frame_jumps() {
        let mut orch = orchestrator();
        let bands = AudioBands::default();
        let controls = ControlVector::default();

        // A debugger pause worth of dt advances the clock by at most the clamp.
        orch.tick(5.0, &bands, &controls);
        assert!((orch.time - MAX_FRAME_DT).abs() < 1e-6);
        // Negative dt (clock skew) is ignored rather than rewinding.
        orch.tick(-1.0, &bands, &controls);
        assert!((orch.time - MAX_FRAME_DT).abs() < 1e-6);
    }

    #[test]
    fn test_preset_cycle_wraps_around() {
        let mut orch = orchestrator();
        let start = orch.preset_name();
        for _ in 0..LayerPreset::ALL.len() {
            orch.next_preset();
        }
        assert_eq!(orch.preset_name(), start);
    }

    #[test]
    fn test_auto_switch_lands_on_known_preset() {
        let mut orch = orchestrator();
        for _ in 0..20 {
            let name = orch.auto_switch();
            assert!(LayerPreset::ALL.iter().any(|p| p.name() == name));
        }
    }

    #[test]
    fn test_mode_switch_to_same_kind_keeps_state() {
        let mut orch = orchestrator();
        orch.next_preset();
        let preset = orch.preset_name();
        orch.set_mode(ModeKind::Layers);
        assert_eq!(orch.preset_name(), preset);
    }
}
