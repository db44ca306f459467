//! Scene drawing.
//!
//! Turns the core's `RenderScene` into nannou draw calls: entity meshes are
//! perspective-projected and painter-sorted, orbs become layered glow
//! ellipses, and the shader-fx uniforms drive a 2D approximation of the
//! noise / kaleidoscope / op-art passes.

use glam::{Vec3, Vec4Swizzles};
use nannou::prelude::*;
use polyvj_core::scene::{FxUniforms, FxVariant, MeshDraw, OrbDraw, RenderScene};

/// Light direction for the flat lambert shading of entity meshes.
const LIGHT_DIR: Vec3 = Vec3::new(0.35, 0.5, 0.79);

/// Near plane: triangles closer than this to the camera are dropped.
const NEAR: f32 = 0.5;

pub fn draw_scene(scene: &RenderScene, draw: &Draw, bounds: Rect) {
    let bg = scene.background;
    let lightness = (bg.l + scene.bg_intensity * 0.3).min(1.0);
    draw.rect()
        .wh(bounds.wh())
        .xy(bounds.xy())
        .color(hsla(bg.h, bg.s, lightness, 1.0));

    if let Some(fx) = scene.fx {
        draw_fx(&fx, draw, bounds);
    }

    let focal = bounds.h() * 0.8;

    let mut tris: Vec<([Point2; 3], f32, Hsla)> = Vec::new();
    for mesh in &scene.meshes {
        project_mesh(mesh, scene.camera_z, focal, &mut tris);
    }
    // Painter's order: far triangles first.
    tris.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    for (points, _, color) in tris {
        draw.tri()
            .points(points[0], points[1], points[2])
            .color(color);
    }

    for orb in &scene.orbs {
        draw_orb(orb, scene.camera_z, focal, draw);
    }
}

fn project(world: Vec3, camera_z: f32, focal: f32) -> Option<(Point2, f32)> {
    let depth = camera_z - world.z;
    if depth < NEAR {
        return None;
    }
    let point = pt2(world.x / depth * focal, world.y / depth * focal);
    Some((point, depth))
}

fn project_mesh(
    mesh: &MeshDraw,
    camera_z: f32,
    focal: f32,
    out: &mut Vec<([Point2; 3], f32, Hsla)>,
) {
    if mesh.opacity < 0.01 {
        return;
    }

    for tri in mesh.indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);

        let world = [
            (mesh.transform * mesh.positions[a].extend(1.0)).xyz(),
            (mesh.transform * mesh.positions[b].extend(1.0)).xyz(),
            (mesh.transform * mesh.positions[c].extend(1.0)).xyz(),
        ];

        let projected: Option<Vec<(Point2, f32)>> = world
            .iter()
            .map(|&w| project(w, camera_z, focal))
            .collect();
        let projected = match projected {
            Some(p) => p,
            None => continue,
        };

        // Backface cull against the view direction.
        let face_normal = (world[1] - world[0]).cross(world[2] - world[0]);
        let to_camera = Vec3::new(0.0, 0.0, camera_z) - world[0];
        if face_normal.dot(to_camera) <= 0.0 {
            continue;
        }

        let normal = mesh
            .transform
            .transform_vector3(mesh.normals[a])
            .normalize_or_zero();
        let lit = 0.35 + 0.65 * normal.dot(LIGHT_DIR).max(0.0);
        let l = (mesh.color.l * lit + mesh.emissive * 0.15).min(1.0);

        let depth = (projected[0].1 + projected[1].1 + projected[2].1) / 3.0;
        out.push((
            [projected[0].0, projected[1].0, projected[2].0],
            depth,
            hsla(mesh.color.h, mesh.color.s, l, mesh.opacity),
        ));
    }
}

fn draw_orb(orb: &OrbDraw, camera_z: f32, focal: f32, draw: &Draw) {
    let (center, depth) = match project(orb.position, camera_z, focal) {
        Some(p) => p,
        None => return,
    };
    let radius = (orb.radius / depth * focal).max(0.5);

    // Soft glow halo under a bright core.
    draw.ellipse()
        .xy(center)
        .radius(radius * 2.5)
        .color(hsla(orb.color.h, orb.color.s, orb.color.l * 0.5, orb.alpha * 0.25));
    draw.ellipse()
        .xy(center)
        .radius(radius)
        .color(hsla(orb.color.h, orb.color.s, orb.color.l, orb.alpha));
}

fn hash(x: f32, y: f32) -> f32 {
    let v = (x * 12.9898 + y * 78.233).sin() * 43758.547;
    v.fract().abs()
}

fn draw_fx(fx: &FxUniforms, draw: &Draw, bounds: Rect) {
    match fx.variant {
        FxVariant::Noise => draw_noise(fx, draw, bounds),
        FxVariant::Kaleido => draw_kaleido(fx, draw, bounds),
        FxVariant::OpArt => draw_op_art(fx, draw, bounds),
    }
}

fn draw_noise(fx: &FxUniforms, draw: &Draw, bounds: Rect) {
    // Block static, denser and brighter with high-band energy.
    let cols = (10.0 + fx.high * 40.0) as usize;
    let rows = cols * 2 / 3 + 1;
    let cell_w = bounds.w() / cols as f32;
    let cell_h = bounds.h() / rows as f32;
    let threshold = 0.5 - fx.intensity * (0.5 + fx.high * 0.5) * 0.3;

    for row in 0..rows {
        for col in 0..cols {
            let n = hash(col as f32 + (fx.time * 5.0).floor(), row as f32 + fx.time);
            if n < threshold {
                continue;
            }
            let x = bounds.left() + (col as f32 + 0.5) * cell_w;
            let y = bounds.bottom() + (row as f32 + 0.5) * cell_h;
            let (h, s) = if fx.mono { (0.0, 0.0) } else { (n, 0.4) };
            draw.rect()
                .x_y(x, y)
                .w_h(cell_w, cell_h)
                .color(hsla(h, s, n * fx.intensity, 0.8));
        }
    }

    // Scanlines.
    let line_count = 40;
    for i in 0..line_count {
        let y = bounds.bottom()
            + bounds.h() * ((i as f32 / line_count as f32 + fx.time * 0.05).fract());
        draw.line()
            .start(pt2(bounds.left(), y))
            .end(pt2(bounds.right(), y))
            .weight(1.0)
            .color(hsla(0.0, 0.0, 0.0, 0.35));
    }
}

fn draw_kaleido(fx: &FxUniforms, draw: &Draw, bounds: Rect) {
    let center = bounds.xy();
    let max_r = bounds.w().max(bounds.h()) * 0.6;
    let divisions = (4.0 + fx.sub_param * 12.0 + fx.low * 4.0) as usize;
    let rotation = fx.time * 0.5 + fx.mid * std::f32::consts::PI;

    for wedge in 0..divisions {
        let angle = rotation + std::f32::consts::TAU * wedge as f32 / divisions as f32;
        let spread = std::f32::consts::TAU / divisions as f32 * 0.5;
        let (h, s) = if fx.mono {
            (0.0, 0.0)
        } else {
            ((wedge as f32 / divisions as f32 + fx.time * 0.02).fract(), 0.7)
        };
        draw.tri()
            .points(
                center,
                center + pt2((angle - spread).cos(), (angle - spread).sin()) * max_r,
                center + pt2((angle + spread).cos(), (angle + spread).sin()) * max_r,
            )
            .color(hsla(
                h,
                s,
                (0.15 + fx.mid * 0.5) * fx.intensity,
                0.6,
            ));
    }

    // Radial pulse rings riding the low band.
    for ring in 0..8 {
        let r = max_r * (ring as f32 / 8.0 + (fx.time * 0.3 + fx.low).fract() * 0.125);
        draw.ellipse()
            .xy(center)
            .radius(r)
            .no_fill()
            .stroke_weight(1.5)
            .stroke(hsla(0.0, 0.0, 0.8, 0.2 * fx.intensity));
    }
}

fn draw_op_art(fx: &FxUniforms, draw: &Draw, bounds: Rect) {
    // Interfering stripe fields; frequency rides the beat.
    let freq = 20.0 + fx.sub_param * 40.0 + fx.beat * 20.0;
    let stripes = freq as usize;
    let w = bounds.w() / stripes as f32;
    let pulse = 0.8 + fx.beat * 0.4;

    for i in 0..stripes {
        let phase = (i as f32 * 0.5 + fx.time * 3.0).sin();
        if phase < 0.0 {
            continue;
        }
        let x = bounds.left() + (i as f32 + 0.5) * w;
        draw.rect()
            .x_y(x, bounds.y())
            .w_h(w, bounds.h())
            .color(hsla(0.0, 0.0, pulse.min(1.0), 0.5 * fx.intensity));
    }

    for ring in 0..24 {
        let r = bounds.w() * 0.02 * ring as f32 * (1.0 + fx.beat * 0.3);
        draw.ellipse()
            .xy(bounds.xy())
            .radius(r)
            .no_fill()
            .stroke_weight(3.0)
            .stroke(hsla(0.0, 0.0, (ring % 2) as f32 * pulse.min(1.0), 0.6 * fx.intensity));
    }
}
