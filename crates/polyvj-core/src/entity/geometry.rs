//! Procedural base meshes for the layer entities.
//!
//! Six shape families, all subdivided enough that the per-vertex
//! displacement in the animator reads as morphing rather than faceting.
//! Rest-pose positions are shared; each entity deforms its own copy.

use glam::Vec3;
use std::f32::consts::{PI, TAU};
use std::sync::Arc;

pub const SHAPE_COUNT: usize = 6;

/// Rest-pose triangle mesh.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub indices: Arc<Vec<u32>>,
}

/// Deterministic shape for a pool slot.
pub fn shape(index: usize) -> Mesh {
    match index % SHAPE_COUNT {
        0 => uv_sphere(1.0, 24, 16),
        1 => subdivided_box(1.2, 8),
        2 => cone(0.8, 1.5, 32, 8),
        3 => torus_knot(0.6, 0.2, 100, 12),
        4 => cylinder(0.5, 2.0, 32, 8),
        _ => torus(0.8, 0.3, 16, 50),
    }
}

/// Smooth per-vertex normals from accumulated face normals.
///
/// Degenerate faces contribute nothing; a vertex whose accumulated normal
/// has no length falls back to its radial direction (or +Z at the origin).
pub fn vertex_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals
        .iter()
        .zip(positions)
        .map(|(&n, &p)| {
            n.try_normalize()
                .or_else(|| p.try_normalize())
                .unwrap_or(Vec3::Z)
        })
        .collect()
}

fn grid_indices(rows: usize, cols: usize, offset: u32) -> Vec<u32> {
    // Quads over a (rows+1) x (cols+1) vertex lattice.
    let mut indices = Vec::with_capacity(rows * cols * 6);
    let stride = cols as u32 + 1;
    for r in 0..rows as u32 {
        for c in 0..cols as u32 {
            let i = offset + r * stride + c;
            indices.extend_from_slice(&[i, i + 1, i + stride]);
            indices.extend_from_slice(&[i + 1, i + stride + 1, i + stride]);
        }
    }
    indices
}

fn uv_sphere(radius: f32, segments: usize, rings: usize) -> Mesh {
    let mut positions = Vec::with_capacity((rings + 1) * (segments + 1));
    for ring in 0..=rings {
        let phi = PI * ring as f32 / rings as f32;
        for seg in 0..=segments {
            let theta = TAU * seg as f32 / segments as f32;
            positions.push(Vec3::new(
                radius * phi.sin() * theta.cos(),
                radius * phi.cos(),
                radius * phi.sin() * theta.sin(),
            ));
        }
    }
    Mesh {
        positions,
        indices: Arc::new(grid_indices(rings, segments, 0)),
    }
}

fn subdivided_box(size: f32, divisions: usize) -> Mesh {
    // Six face grids; seams stay open, which the displaced look hides.
    let half = size / 2.0;
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X * half, Vec3::Y, Vec3::Z),
        (-Vec3::X * half, Vec3::Z, Vec3::Y),
        (Vec3::Y * half, Vec3::Z, Vec3::X),
        (-Vec3::Y * half, Vec3::X, Vec3::Z),
        (Vec3::Z * half, Vec3::X, Vec3::Y),
        (-Vec3::Z * half, Vec3::Y, Vec3::X),
    ];

    let mut positions = Vec::new();
    let mut indices = Vec::new();
    for (center, u_axis, v_axis) in faces {
        let offset = positions.len() as u32;
        for v in 0..=divisions {
            let vf = v as f32 / divisions as f32 - 0.5;
            for u in 0..=divisions {
                let uf = u as f32 / divisions as f32 - 0.5;
                positions.push(center + u_axis * (uf * size) + v_axis * (vf * size));
            }
        }
        indices.extend(grid_indices(divisions, divisions, offset));
    }
    Mesh {
        positions,
        indices: Arc::new(indices),
    }
}

fn cone(radius: f32, height: f32, segments: usize, rings: usize) -> Mesh {
    let mut positions = Vec::with_capacity((rings + 1) * (segments + 1));
    for ring in 0..=rings {
        let t = ring as f32 / rings as f32;
        let y = height / 2.0 - t * height;
        let r = radius * t;
        for seg in 0..=segments {
            let theta = TAU * seg as f32 / segments as f32;
            positions.push(Vec3::new(r * theta.cos(), y, r * theta.sin()));
        }
    }
    Mesh {
        positions,
        indices: Arc::new(grid_indices(rings, segments, 0)),
    }
}

/// Open-ended tube, also the body of the swarm mode's blob.
pub fn cylinder(radius: f32, height: f32, segments: usize, rings: usize) -> Mesh {
    let mut positions = Vec::with_capacity((rings + 1) * (segments + 1));
    for ring in 0..=rings {
        let y = height / 2.0 - height * ring as f32 / rings as f32;
        for seg in 0..=segments {
            let theta = TAU * seg as f32 / segments as f32;
            positions.push(Vec3::new(radius * theta.cos(), y, radius * theta.sin()));
        }
    }
    Mesh {
        positions,
        indices: Arc::new(grid_indices(rings, segments, 0)),
    }
}

fn torus(radius: f32, tube: f32, radial_segments: usize, tubular_segments: usize) -> Mesh {
    let mut positions = Vec::with_capacity((radial_segments + 1) * (tubular_segments + 1));
    for j in 0..=radial_segments {
        let v = TAU * j as f32 / radial_segments as f32;
        for i in 0..=tubular_segments {
            let u = TAU * i as f32 / tubular_segments as f32;
            positions.push(Vec3::new(
                (radius + tube * v.cos()) * u.cos(),
                tube * v.sin(),
                (radius + tube * v.cos()) * u.sin(),
            ));
        }
    }
    Mesh {
        positions,
        indices: Arc::new(grid_indices(radial_segments, tubular_segments, 0)),
    }
}

fn torus_knot(scale: f32, tube: f32, tubular_segments: usize, radial_segments: usize) -> Mesh {
    // (2,3) knot centerline with a frame built from the tangent.
    let (p, q) = (2.0_f32, 3.0_f32);
    let center = |t: f32| -> Vec3 {
        let r = (q * t).cos() + 2.0;
        Vec3::new(r * (p * t).cos(), (q * t).sin(), r * (p * t).sin()) * scale
    };

    let mut positions = Vec::with_capacity((tubular_segments + 1) * (radial_segments + 1));
    for i in 0..=tubular_segments {
        let t = TAU * i as f32 / tubular_segments as f32;
        let here = center(t);
        let tangent = (center(t + 0.01) - here).try_normalize().unwrap_or(Vec3::X);
        let bitangent = tangent.cross(Vec3::Y).try_normalize().unwrap_or(Vec3::Z);
        let normal = bitangent.cross(tangent);

        for j in 0..=radial_segments {
            let a = TAU * j as f32 / radial_segments as f32;
            positions.push(here + (bitangent * a.cos() + normal * a.sin()) * tube);
        }
    }
    Mesh {
        positions,
        indices: Arc::new(grid_indices(tubular_segments, radial_segments, 0)),
    }
}
