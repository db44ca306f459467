//! Pool entities.
//!
//! Each entity is one recyclable pool slot: a deformable mesh with a
//! spawn / active / disappearing lifecycle and a fixed reactive role. The
//! population controller in [`pool`] decides when slots change state; the
//! animator here decides what a slot looks like each frame.

pub mod geometry;
pub mod pool;

use glam::{Mat4, Vec3};
use rand::Rng;
use std::f32::consts::PI;

use crate::bands::AudioBands;
use crate::control::{ControlVector, Param};
use geometry::Mesh;

/// Which band drives an entity's reactive scaling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Low,
    Mid,
    High,
    Beat,
    Ambient,
}

impl Role {
    pub const ALL: [Role; 5] = [Role::Low, Role::Mid, Role::High, Role::Beat, Role::Ambient];

    /// Roles repeat cyclically across the pool.
    pub fn for_slot(slot: usize) -> Role {
        Role::ALL[slot % Role::ALL.len()]
    }

    fn band(self, bands: &AudioBands) -> f32 {
        match self {
            Role::Low => bands.low,
            Role::Mid => bands.mid,
            Role::High => bands.high,
            Role::Beat => bands.beat,
            Role::Ambient => bands.rms,
        }
    }
}

/// How a disappearing entity leaves the stage. Assigned once on the
/// transition and never changed until death.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisappearMode {
    /// Opacity decays to nothing
    Fade,
    /// Scale collapses in place
    Shrink,
    /// Pulled away along -Z while collapsing
    Suck,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Inactive,
    Active,
    Disappearing(DisappearMode),
}

/// Deformed output buffers, rewritten from the rest pose every frame.
#[derive(Clone, Debug, Default)]
pub struct DeformedMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
}

const SPAWN_SCALE: f32 = 0.01;
const ACTIVE_OPACITY: f32 = 0.8;
const FADE_DEATH_OPACITY: f32 = 0.05;
const COLLAPSE_DEATH_SCALE: f32 = 0.05;
const SUCK_RATE: f32 = 0.5;
const SUCK_DEATH_DEPTH: f32 = 20.0;

pub struct Entity {
    pub slot: usize,
    pub role: Role,
    pub shape: usize,
    pub lifecycle: Lifecycle,
    /// Layout position assigned by the active preset
    pub home: Vec3,
    pub position: Vec3,
    /// Preset-assigned orientation (the layout's frame)
    pub orient: Vec3,
    /// Free-running spin, randomized at spawn
    pub rotation: Vec3,
    /// Per-slot spin rate, fixed at pool creation
    spin: Vec3,
    pub scale: Vec3,
    base_scale: f32,
    pub opacity: f32,
    pub emissive: f32,
    /// Disappearance animation progress
    pub progress: f32,
    /// Current hue in turns, updated every frame
    pub hue: f32,
    hue_base: f32,
    pub mesh: DeformedMesh,
}

impl Entity {
    pub fn new(slot: usize, total: usize, rng: &mut impl Rng) -> Self {
        Self {
            slot,
            role: Role::for_slot(slot),
            shape: slot % geometry::SHAPE_COUNT,
            lifecycle: Lifecycle::Inactive,
            home: Vec3::ZERO,
            position: Vec3::ZERO,
            orient: Vec3::ZERO,
            rotation: Vec3::ZERO,
            spin: Vec3::new(
                rng.random_range(0.0..0.01),
                rng.random_range(0.0..0.01),
                rng.random_range(0.0..0.01),
            ),
            scale: Vec3::ZERO,
            base_scale: 1.0,
            opacity: 0.0,
            emissive: 1.0,
            progress: 0.0,
            hue: 0.0,
            hue_base: slot as f32 / total as f32,
            mesh: DeformedMesh::default(),
        }
    }

    /// Whether this entity currently occupies a population slot
    /// (active or on its way out).
    pub fn occupies_slot(&self) -> bool {
        self.lifecycle != Lifecycle::Inactive
    }

    pub fn is_inactive(&self) -> bool {
        self.lifecycle == Lifecycle::Inactive
    }

    /// Bring an inactive entity to life. No-op in any other state.
    pub fn spawn(&mut self, rng: &mut impl Rng) {
        if self.lifecycle != Lifecycle::Inactive {
            return;
        }
        self.lifecycle = Lifecycle::Active;
        self.scale = Vec3::splat(SPAWN_SCALE);
        self.opacity = 0.0;
        self.progress = 0.0;
        self.position = self.home;
        self.rotation = Vec3::new(
            rng.random_range(0.0..PI),
            rng.random_range(0.0..PI),
            rng.random_range(0.0..PI),
        );
    }

    /// Begin leaving the stage. No-op unless currently active.
    pub fn disappear(&mut self, mode: DisappearMode) {
        if self.lifecycle != Lifecycle::Active {
            return;
        }
        self.lifecycle = Lifecycle::Disappearing(mode);
        self.progress = 0.0;
    }

    fn finalize_death(&mut self) {
        self.lifecycle = Lifecycle::Inactive;
        self.scale = Vec3::ZERO;
        self.opacity = 0.0;
    }

    /// Per-frame animation: deformation, lifecycle curves, role reaction,
    /// color. `rest` is the shared rest-pose mesh for this entity's shape.
    pub fn update(
        &mut self,
        time: f32,
        bands: &AudioBands,
        controls: &ControlVector,
        rest: &Mesh,
    ) {
        if self.lifecycle == Lifecycle::Inactive {
            return;
        }

        let intensity = controls.get(Param::Intensity);
        let hue_offset = controls.get(Param::Hue);

        self.deform(time, bands, intensity, rest);

        match self.lifecycle {
            Lifecycle::Active => {
                self.opacity = lerp(self.opacity, ACTIVE_OPACITY, 0.05);

                let reaction = self.role.band(bands);
                let scale_effect = if self.role == Role::Beat {
                    // The beat role leans harder and keeps a pulse floor.
                    reaction * 1.5 * intensity + 0.2
                } else {
                    reaction * 0.5 * intensity
                };
                let target = self.base_scale * (1.0 + scale_effect);
                self.scale = self.scale.lerp(Vec3::splat(target), 0.1);

                match self.role {
                    Role::Mid => self.rotation.x += reaction * 0.1 * intensity,
                    Role::High => self.emissive = 0.5 + reaction * 2.0 * intensity,
                    Role::Ambient => self.orient.z += 0.01,
                    _ => {}
                }
            }
            Lifecycle::Disappearing(mode) => {
                self.progress += 0.02;
                let dead = match mode {
                    DisappearMode::Fade => {
                        self.opacity = lerp(self.opacity, 0.0, 0.1);
                        self.opacity < FADE_DEATH_OPACITY
                    }
                    DisappearMode::Shrink => {
                        self.scale = self.scale.lerp(Vec3::ZERO, 0.15);
                        self.scale.length() < COLLAPSE_DEATH_SCALE
                    }
                    DisappearMode::Suck => {
                        self.position.z -= SUCK_RATE;
                        self.scale = self.scale.lerp(Vec3::ZERO, 0.1);
                        self.position.z < self.home.z - SUCK_DEATH_DEPTH
                            || self.scale.length() < COLLAPSE_DEATH_SCALE
                    }
                };
                if dead {
                    self.finalize_death();
                    return;
                }
            }
            Lifecycle::Inactive => unreachable!(),
        }

        self.rotation.x += self.spin.x;
        self.rotation.y += self.spin.y;

        self.hue = (self.hue_base + hue_offset).rem_euclid(1.0);
        if self.lifecycle == Lifecycle::Disappearing(DisappearMode::Fade) {
            self.emissive = 0.0;
        } else if bands.beat > 0.8 {
            self.emissive = 2.0;
        } else if self.role != Role::High {
            self.emissive = lerp(self.emissive, 0.2, 0.1);
        }
    }

    /// Radial sinusoidal displacement from the rest pose. Stateless: every
    /// frame starts from `rest`, so displacement never accumulates.
    fn deform(&mut self, time: f32, bands: &AudioBands, intensity: f32, rest: &Mesh) {
        let t = time * 2.0;
        let spike = bands.high * 1.5 * intensity + bands.beat * 0.5;
        let wobble = bands.mid * 0.5;

        self.mesh.positions.clear();
        self.mesh
            .positions
            .extend(rest.positions.iter().map(|&v| {
                match v.try_normalize() {
                    Some(n) => {
                        let noise =
                            (n.x * 10.0 + t).sin() * (n.y * 10.0 + t).cos() * (n.z * 10.0 + t).sin();
                        let mut displacement = 0.0;
                        if spike > 0.05 {
                            displacement += noise * spike;
                        }
                        if wobble > 0.05 {
                            displacement += (t * 3.0 + n.y * 5.0).sin() * wobble * 0.2;
                        }
                        v * (1.0 + displacement)
                    }
                    // A vertex at the origin has no radial direction to move along.
                    None => v,
                }
            }));
        self.mesh.normals = geometry::vertex_normals(&self.mesh.positions, &rest.indices);
    }

    /// World transform for the current pose.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_euler(glam::EulerRot::XYZ, self.orient.x, self.orient.y, self.orient.z)
            * Mat4::from_euler(
                glam::EulerRot::XYZ,
                self.rotation.x,
                self.rotation.y,
                self.rotation.z,
            )
            * Mat4::from_scale(self.scale)
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
