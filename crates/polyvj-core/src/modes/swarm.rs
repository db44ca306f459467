//! Blob swarm mode: a central deformable blob orbited by a pool of
//! short-lived glowing orbs.
//!
//! Orbs are life-driven rather than controller-driven: loudness raises the
//! desired count, beats add a burst bonus, and an over-full swarm decays
//! faster instead of being culled outright.

use glam::{Mat4, Vec3};
use rand::Rng;
use std::f32::consts::TAU;

use crate::bands::AudioBands;
use crate::control::{ControlVector, Param};
use crate::entity::geometry::{self, Mesh};
use crate::scene::{Hsl, MeshDraw, OrbDraw, RenderScene};

/// Orb pool ceiling across all presets.
const MAX_ORBS: usize = 400;

/// Orbs above target beyond which decay accelerates.
const OVERFULL_MARGIN: usize = 50;

/// Beat level that triggers the spawn burst bonus.
const BURST_THRESHOLD: f32 = 0.6;

#[derive(Clone, Copy, Debug)]
pub struct BlobParams {
    pub displacement_amp: f32,
    pub displacement_freq: f32,
    pub hue_shift_speed: f32,
    pub opacity: f32,
    pub scale: f32,
    pub rotation_speed: f32,
    /// Height-segment multiplier of the blob tube
    pub subdiv: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct OrbParams {
    pub base: f32,
    pub max: usize,
    pub spawn_rate: f32,
    pub target_range: f32,
    pub life: (f32, f32),
    pub orbit_radius: (f32, f32),
    pub orbit_speed: f32,
    pub size: (f32, f32),
    pub noise: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct SwarmPreset {
    pub name: &'static str,
    pub blob: BlobParams,
    pub orbs: OrbParams,
    pub intensity: f32,
    pub onset_burst: f32,
}

pub const SWARM_PRESETS: [SwarmPreset; 3] = [
    SwarmPreset {
        name: "Drift",
        blob: BlobParams {
            displacement_amp: 0.1,
            displacement_freq: 1.0,
            hue_shift_speed: 0.1,
            opacity: 0.9,
            scale: 1.0,
            rotation_speed: 0.2,
            subdiv: 4,
        },
        orbs: OrbParams {
            base: 12.0,
            max: 120,
            spawn_rate: 20.0,
            target_range: 60.0,
            life: (2.0, 5.0),
            orbit_radius: (2.5, 5.0),
            orbit_speed: 0.5,
            size: (0.05, 0.15),
            noise: 0.3,
        },
        intensity: 0.8,
        onset_burst: 1.0,
    },
    SwarmPreset {
        name: "Neon Rush",
        blob: BlobParams {
            displacement_amp: 0.25,
            displacement_freq: 2.0,
            hue_shift_speed: 0.35,
            opacity: 1.0,
            scale: 1.2,
            rotation_speed: 0.6,
            subdiv: 6,
        },
        orbs: OrbParams {
            base: 30.0,
            max: 300,
            spawn_rate: 60.0,
            target_range: 160.0,
            life: (1.0, 2.5),
            orbit_radius: (2.0, 6.5),
            orbit_speed: 1.4,
            size: (0.04, 0.1),
            noise: 0.6,
        },
        intensity: 1.2,
        onset_burst: 2.0,
    },
    SwarmPreset {
        name: "Deep Pulse",
        blob: BlobParams {
            displacement_amp: 0.15,
            displacement_freq: 0.6,
            hue_shift_speed: 0.05,
            opacity: 0.8,
            scale: 1.5,
            rotation_speed: 0.1,
            subdiv: 8,
        },
        orbs: OrbParams {
            base: 6.0,
            max: 80,
            spawn_rate: 10.0,
            target_range: 40.0,
            life: (4.0, 8.0),
            orbit_radius: (3.5, 7.0),
            orbit_speed: 0.25,
            size: (0.1, 0.3),
            noise: 0.15,
        },
        intensity: 1.0,
        onset_burst: 0.5,
    },
];

#[derive(Clone, Copy, Debug, Default)]
struct Orb {
    active: bool,
    life: f32,
    max_life: f32,
    angle: f32,
    radius: f32,
    speed: f32,
    size: f32,
    phase: f32,
}

pub struct SwarmMode {
    preset_idx: usize,
    orbs: Vec<Orb>,
    blob_rest: Mesh,
    blob_positions: Vec<Vec3>,
    blob_normals: Vec<Vec3>,
    /// Smoothed displacement amplitude, lerped toward its audio target
    displacement: f32,
    rotation: Vec3,
}

impl SwarmMode {
    pub fn new() -> Self {
        let preset = &SWARM_PRESETS[0];
        Self {
            preset_idx: 0,
            orbs: vec![Orb::default(); MAX_ORBS],
            blob_rest: blob_tube(preset.blob.subdiv),
            blob_positions: Vec::new(),
            blob_normals: Vec::new(),
            displacement: preset.blob.displacement_amp,
            rotation: Vec3::ZERO,
        }
    }

    pub fn preset(&self) -> &'static SwarmPreset {
        &SWARM_PRESETS[self.preset_idx]
    }

    pub fn preset_index(&self) -> usize {
        self.preset_idx
    }

    /// Instant snap to a preset; the blob tube is rebuilt at its
    /// subdivision level and all orbs are cleared.
    pub fn apply_preset(&mut self, index: usize) {
        self.preset_idx = index % SWARM_PRESETS.len();
        let preset = self.preset();
        self.blob_rest = blob_tube(preset.blob.subdiv);
        self.displacement = preset.blob.displacement_amp;
        for orb in &mut self.orbs {
            orb.active = false;
        }
    }

    pub fn active_orbs(&self) -> usize {
        self.orbs.iter().filter(|o| o.active).count()
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
        let preset = SWARM_PRESETS[self.preset_idx];
        let intensity = preset.intensity * (0.5 + controls.get(Param::Intensity));

        // Blob: displacement chases its loudness target, rotation rides
        // the mid and high bands.
        let target = preset.blob.displacement_amp + bands.low * intensity * 3.0;
        self.displacement += (target - self.displacement) * (10.0 * dt).min(1.0);
        self.rotation.y += (preset.blob.rotation_speed + bands.mid * intensity * 1.5) * dt;
        self.rotation.x += bands.high * intensity * 0.8 * dt;

        self.deform_blob(time, preset.blob.displacement_freq);

        let hue = (time * preset.blob.hue_shift_speed + controls.get(Param::Hue)).rem_euclid(1.0);
        scene.background = Hsl::new(hue + 0.5, 0.6, 0.1);
        scene.bg_intensity = bands.high * intensity;
        scene.camera_z = 10.0;
        scene.meshes.push(MeshDraw {
            positions: self.blob_positions.clone(),
            normals: self.blob_normals.clone(),
            indices: self.blob_rest.indices.clone(),
            transform: Mat4::from_euler(glam::EulerRot::XYZ, self.rotation.x, self.rotation.y, 0.0)
                * Mat4::from_scale(Vec3::splat(preset.blob.scale)),
            color: Hsl::new(hue, 0.7, 0.55),
            opacity: preset.blob.opacity,
            emissive: 0.5 + bands.beat,
        });

        // Orb population.
        let mut target_num = preset.orbs.base + bands.rms * preset.orbs.target_range * intensity;
        if bands.beat > BURST_THRESHOLD {
            target_num += preset.orbs.spawn_rate * preset.onset_burst * 5.0;
        }
        let target_num = (target_num as usize).min(preset.orbs.max);

        let active = self.active_orbs();
        if active < target_num {
            let deficit = target_num - active;
            let budget = (preset.orbs.spawn_rate * dt).ceil() as usize;
            let mut to_spawn = deficit.min(budget);
            for orb in self.orbs.iter_mut() {
                if to_spawn == 0 {
                    break;
                }
                if !orb.active {
                    *orb = spawn_orb(&preset.orbs, rng);
                    to_spawn -= 1;
                }
            }
        }

        let overfull = active > target_num + OVERFULL_MARGIN;
        for orb in &mut self.orbs {
            if !orb.active {
                continue;
            }
            orb.life -= dt;
            if overfull {
                // Shed the excess by aging everything faster.
                orb.life -= dt * 2.0;
            }
            if orb.life <= 0.0 {
                orb.active = false;
                continue;
            }

            orb.angle += (orb.speed + bands.mid * 5.0 * intensity) * dt;

            let y_noise = (time * 3.0 + orb.phase).sin() * preset.orbs.noise * 2.0;
            let r_noise = (time * 2.5 + orb.phase).cos() * preset.orbs.noise * 1.5;
            let r = orb.radius + r_noise + bands.low * 2.5 * intensity;

            let position = Vec3::new(
                orb.angle.cos() * r,
                y_noise + (orb.angle * 3.0).sin() * 0.8,
                orb.angle.sin() * r,
            );

            let fade_in = ((orb.max_life - orb.life) * 2.0).min(1.0);
            let fade_out = orb.life.min(1.0);
            let beat_scale = 1.0 + bands.high * intensity * 0.5;

            scene.orbs.push(OrbDraw {
                position,
                radius: orb.size * fade_in * fade_out * beat_scale,
                color: Hsl::new(hue + orb.phase.fract() * 0.1, 0.5, 0.8),
                alpha: fade_in * fade_out,
            });
        }
    }

    fn deform_blob(&mut self, time: f32, freq: f32) {
        let t = time * 2.0;
        let amp = self.displacement;
        self.blob_positions.clear();
        self.blob_positions
            .extend(self.blob_rest.positions.iter().map(|&v| {
                match v.try_normalize() {
                    Some(n) => {
                        let noise = (n.x * 10.0 * freq + t).sin()
                            * (n.y * 10.0 * freq + t).cos()
                            * (n.z * 10.0 * freq + t).sin();
                        v * (1.0 + noise * amp)
                    }
                    None => v,
                }
            }));
        self.blob_normals =
            geometry::vertex_normals(&self.blob_positions, &self.blob_rest.indices);
    }
}

impl Default for SwarmMode {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_orb(params: &OrbParams, rng: &mut impl Rng) -> Orb {
    let max_life = rng.random_range(params.life.0..params.life.1);
    let direction = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
    Orb {
        active: true,
        life: max_life,
        max_life,
        angle: rng.random_range(0.0..TAU),
        radius: rng.random_range(params.orbit_radius.0..params.orbit_radius.1),
        speed: params.orbit_speed * direction * rng.random_range(0.8..1.2),
        size: rng.random_range(params.size.0..params.size.1),
        phase: rng.random_range(0.0..100.0),
    }
}

/// The blob body: a tall tube whose height resolution follows the preset.
fn blob_tube(subdiv: usize) -> Mesh {
    geometry::cylinder(0.6, 6.0, 32, subdiv * 10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    fn loud() -> AudioBands {
        AudioBands {
            low: 0.8,
            mid: 0.6,
            high: 0.7,
            rms: 0.9,
            beat: 1.0,
        }
    }

    #[test]
    fn test_spawn_budget_limits_growth_per_frame() {
        let mut rng = rng();
        let mut mode = SwarmMode::new();
        let mut scene = RenderScene::default();
        let controls = ControlVector::default();

        // One 60fps frame with a large deficit: growth is capped by
        // ceil(spawn_rate * dt), not the deficit.
        let dt = 1.0 / 60.0;
        mode.update(dt, 0.0, &loud(), &controls, &mut scene, &mut rng);
        let budget = (SWARM_PRESETS[0].orbs.spawn_rate * dt).ceil() as usize;
        assert!(mode.active_orbs() <= budget);
        assert!(mode.active_orbs() > 0);
    }

    #[test]
    fn test_orb_count_capped_by_preset_max() {
        let mut rng = rng();
        let mut mode = SwarmMode::new();
        let mut scene = RenderScene::default();
        let controls = ControlVector::default();

        for frame in 0..1200 {
            scene.reset();
            mode.update(1.0 / 60.0, frame as f32 / 60.0, &loud(), &controls, &mut scene, &mut rng);
            assert!(mode.active_orbs() <= SWARM_PRESETS[0].orbs.max);
        }
    }

    #[test]
    fn test_swarm_drains_in_silence() {
        let mut rng = rng();
        let mut mode = SwarmMode::new();
        let mut scene = RenderScene::default();
        let controls = ControlVector::default();

        for frame in 0..600 {
            scene.reset();
            mode.update(1.0 / 60.0, frame as f32 / 60.0, &loud(), &controls, &mut scene, &mut rng);
        }
        let peak = mode.active_orbs();
        assert!(peak > 20);

        // Max orb life in the Drift preset is 5s; 10 silent seconds later
        // the swarm has shrunk to the quiet-floor population.
        let silent = AudioBands::default();
        for frame in 600..1200 {
            scene.reset();
            mode.update(1.0 / 60.0, frame as f32 / 60.0, &silent, &controls, &mut scene, &mut rng);
        }
        assert!(mode.active_orbs() < peak);
        assert!(mode.active_orbs() <= SWARM_PRESETS[0].orbs.base as usize + 1);
    }

    #[test]
    fn test_preset_apply_resets_swarm() {
        let mut rng = rng();
        let mut mode = SwarmMode::new();
        let mut scene = RenderScene::default();
        let controls = ControlVector::default();
        mode.update(0.1, 0.0, &loud(), &controls, &mut scene, &mut rng);
        assert!(mode.active_orbs() > 0);

        mode.apply_preset(2);
        assert_eq!(mode.preset().name, "Deep Pulse");
        assert_eq!(mode.active_orbs(), 0);
    }

    #[test]
    fn test_blob_output_is_finite() {
        let mut rng = rng();
        let mut mode = SwarmMode::new();
        let mut scene = RenderScene::default();
        let controls = ControlVector::default();
        for frame in 0..120 {
            scene.reset();
            mode.update(1.0 / 60.0, frame as f32 / 60.0, &loud(), &controls, &mut scene, &mut rng);
        }
        let blob = &scene.meshes[0];
        for (v, n) in blob.positions.iter().zip(&blob.normals) {
            assert!(v.is_finite());
            assert!(n.is_finite());
        }
        for orb in &scene.orbs {
            assert!(orb.position.is_finite());
            assert!(orb.radius.is_finite() && orb.radius >= 0.0);
        }
    }
}
