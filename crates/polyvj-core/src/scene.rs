//! Render-command description emitted by the visual modes.
//!
//! The core never draws. Each tick the active mode fills a [`RenderScene`]
//! and the host backend turns it into actual draw calls. Buffers are reused
//! across ticks; [`RenderScene::reset`] clears them without deallocating.

use glam::{Mat4, Vec3};
use std::sync::Arc;

/// Hue/saturation/lightness color, hue in turns (0-1).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub fn new(h: f32, s: f32, l: f32) -> Self {
        Self {
            h: h.rem_euclid(1.0),
            s,
            l,
        }
    }
}

/// One deformed triangle mesh to draw.
#[derive(Clone, Debug)]
pub struct MeshDraw {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Arc<Vec<u32>>,
    pub transform: Mat4,
    pub color: Hsl,
    pub opacity: f32,
    /// Emissive boost added on top of the lit color
    pub emissive: f32,
}

/// One glowing billboard sphere.
#[derive(Clone, Copy, Debug)]
pub struct OrbDraw {
    pub position: Vec3,
    pub radius: f32,
    pub color: Hsl,
    pub alpha: f32,
}

/// Full-screen effect family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FxVariant {
    Noise,
    Kaleido,
    OpArt,
}

impl FxVariant {
    pub const ALL: [FxVariant; 3] = [FxVariant::Noise, FxVariant::Kaleido, FxVariant::OpArt];

    pub fn name(self) -> &'static str {
        match self {
            FxVariant::Noise => "Noise / Glitch",
            FxVariant::Kaleido => "Kaleidoscope",
            FxVariant::OpArt => "OpArt / Moire",
        }
    }
}

/// Uniform set for the full-screen effect pass.
#[derive(Clone, Copy, Debug)]
pub struct FxUniforms {
    pub variant: FxVariant,
    pub time: f32,
    pub intensity: f32,
    pub sub_param: f32,
    pub low: f32,
    pub mid: f32,
    pub high: f32,
    pub beat: f32,
    pub mono: bool,
}

/// Everything the backend needs to draw one frame.
#[derive(Clone, Debug)]
pub struct RenderScene {
    /// Camera distance along +Z, looking at the origin
    pub camera_z: f32,
    pub background: Hsl,
    /// Audio-driven background brightness boost
    pub bg_intensity: f32,
    pub meshes: Vec<MeshDraw>,
    pub orbs: Vec<OrbDraw>,
    pub fx: Option<FxUniforms>,
}

impl Default for RenderScene {
    fn default() -> Self {
        Self {
            camera_z: 10.0,
            background: Hsl::new(0.0, 0.0, 0.0),
            bg_intensity: 0.0,
            meshes: Vec::new(),
            orbs: Vec::new(),
            fx: None,
        }
    }
}

impl RenderScene {
    /// Clear per-frame contents, keeping allocations.
    pub fn reset(&mut self) {
        self.meshes.clear();
        self.orbs.clear();
        self.fx = None;
        self.bg_intensity = 0.0;
        self.background = Hsl::new(0.0, 0.0, 0.0);
    }
}
