//! Layered-object mode: the entity pool arranged by a layout preset.

use glam::Vec3;
use rand::Rng;
use std::f32::consts::{PI, TAU};

use crate::bands::AudioBands;
use crate::control::{combine, ControlVector, Param};
use crate::entity::pool::EntityPool;
use crate::scene::{Hsl, MeshDraw, RenderScene};

/// Spatial arrangements for the pool slots. Applying one snaps every
/// slot's home position instantly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerPreset {
    LayeredPulse,
    SpiralCore,
    OrbitLayers,
    EccentricOrbit,
    StackedWave,
    DoubleWave,
    MatrixGrid,
    Tunnel,
}

impl LayerPreset {
    pub const ALL: [LayerPreset; 8] = [
        LayerPreset::LayeredPulse,
        LayerPreset::SpiralCore,
        LayerPreset::OrbitLayers,
        LayerPreset::EccentricOrbit,
        LayerPreset::StackedWave,
        LayerPreset::DoubleWave,
        LayerPreset::MatrixGrid,
        LayerPreset::Tunnel,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LayerPreset::LayeredPulse => "Layered Pulse",
            LayerPreset::SpiralCore => "Spiral Core",
            LayerPreset::OrbitLayers => "Orbit Layers",
            LayerPreset::EccentricOrbit => "Eccentric Orbit",
            LayerPreset::StackedWave => "Stacked Wave",
            LayerPreset::DoubleWave => "Double Wave",
            LayerPreset::MatrixGrid => "Matrix Grid",
            LayerPreset::Tunnel => "Tunnel Vision",
        }
    }

    /// Home position and orientation for a slot.
    pub fn layout(self, slot: usize, total: usize) -> (Vec3, Vec3) {
        let i = slot as f32;
        let t = i / total as f32;
        let angle_offset = t * TAU;

        match self {
            LayerPreset::LayeredPulse => (Vec3::new(0.0, 0.0, -i * 3.0), Vec3::ZERO),
            LayerPreset::SpiralCore => {
                let r = 2.0;
                (
                    Vec3::new(angle_offset.cos() * r, angle_offset.sin() * r, -i * 4.0),
                    Vec3::new(0.0, 0.0, angle_offset),
                )
            }
            LayerPreset::OrbitLayers => {
                let radius = 5.0 + i * 2.0;
                let angle = t * TAU;
                (
                    Vec3::new(angle.cos() * radius, angle.sin() * radius, 0.0),
                    Vec3::ZERO,
                )
            }
            LayerPreset::EccentricOrbit => {
                let radius = 6.0 + i * 2.0;
                let angle = t * TAU;
                (
                    Vec3::new(
                        angle.cos() * radius,
                        (angle * 1.5).sin() * radius * 0.5,
                        angle.sin() * 5.0,
                    ),
                    Vec3::ZERO,
                )
            }
            LayerPreset::StackedWave => (
                Vec3::new((t - 0.5) * 20.0, (t * PI).sin() * 5.0, -i * 2.0),
                Vec3::ZERO,
            ),
            LayerPreset::DoubleWave => (
                Vec3::new((t - 0.5) * 25.0, (t * TAU).cos() * 8.0, -i * 3.0),
                Vec3::ZERO,
            ),
            LayerPreset::MatrixGrid => {
                let cols = (total as f32).sqrt().ceil() as usize;
                let spacing = 4.0;
                (
                    Vec3::new(
                        ((slot % cols) as f32 - cols as f32 / 2.0) * spacing,
                        ((slot / cols) as f32 - cols as f32 / 2.0) * spacing,
                        0.0,
                    ),
                    Vec3::ZERO,
                )
            }
            LayerPreset::Tunnel => {
                let angle = i * 0.5;
                let radius = 3.0;
                (
                    Vec3::new(angle.cos() * radius, angle.sin() * radius, -i * 2.0 + 10.0),
                    Vec3::new(0.0, 0.0, angle),
                )
            }
        }
    }
}

pub struct LayerMode {
    pool: EntityPool,
    preset: LayerPreset,
}

impl LayerMode {
    pub fn new(rng: &mut impl Rng) -> Self {
        let mut mode = Self {
            pool: EntityPool::new(rng),
            preset: LayerPreset::LayeredPulse,
        };
        mode.apply_preset(mode.preset);
        mode
    }

    pub fn preset(&self) -> LayerPreset {
        self.preset
    }

    pub fn apply_preset(&mut self, preset: LayerPreset) {
        self.preset = preset;
        self.pool.apply_layout(|slot, total| preset.layout(slot, total));
    }

    pub fn pool(&self) -> &EntityPool {
        &self.pool
    }

    pub fn update(
        &mut self,
        dt: f32,
        time: f32,
        bands: &AudioBands,
        controls: &ControlVector,
        scene: &mut RenderScene,
        rng: &mut impl Rng,
    ) {
        self.pool.step(dt, bands, rng);
        self.pool.animate(time, bands, controls);

        scene.camera_z = 5.0 + controls.get(Param::Speed) * 15.0;
        // Background lightness blends loudness with the fade knob.
        let fade = combine(bands.rms, controls.get(Param::BackgroundFade));
        scene.background = Hsl::new(0.0, 0.0, fade * 0.08);

        for entity in self.pool.entities() {
            if !entity.occupies_slot() {
                continue;
            }
            let rest = self.pool.shape(entity.shape);
            scene.meshes.push(MeshDraw {
                positions: entity.mesh.positions.clone(),
                normals: entity.mesh.normals.clone(),
                indices: rest.indices.clone(),
                transform: entity.transform(),
                color: Hsl::new(entity.hue, 0.8, 0.5),
                opacity: entity.opacity,
                emissive: entity.emissive,
            });
        }
    }
}
