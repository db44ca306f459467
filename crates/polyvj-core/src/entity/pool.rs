//! Fixed-capacity entity pool and the population controller.
//!
//! The controller tracks a loudness-derived target population and moves the
//! pool toward it with deliberate asymmetry: an instant floor keeps a few
//! entities on stage, beat-gated spawns are rate-limited by a global
//! cooldown, and despawns only fire after the pool has been over target for
//! a sustained stretch. Entities are recycled, never allocated per frame.

use glam::Vec3;
use rand::Rng;
use std::sync::Arc;

use super::geometry::{self, Mesh};
use super::{DisappearMode, Entity};
use crate::bands::AudioBands;
use crate::control::ControlVector;

/// Pool size; also the ceiling of the population target.
pub const POOL_CAPACITY: usize = 30;

/// Entities kept on stage regardless of loudness.
pub const MIN_VISIBLE: usize = 3;

/// Global cooldown between spawns, seconds.
pub const SPAWN_COOLDOWN: f32 = 0.2;

/// Sustained over-target time required before a despawn, seconds.
pub const DESPAWN_DELAY: f32 = 0.5;

/// Beat level that opens the spawn gate.
pub const BEAT_SPAWN_THRESHOLD: f32 = 0.6;

const SUCK_BEAT_THRESHOLD: f32 = 0.7;
const SUCK_LOW_THRESHOLD: f32 = 0.6;
const SHRINK_MID_THRESHOLD: f32 = 0.6;

/// Piecewise-linear rms to population map: `[rms_lo, rms_hi, out_lo, out_hi]`
/// per segment. Quiet rooms keep a couple of shapes; a slammed mix fills
/// the pool.
const TARGET_SEGMENTS: [[f32; 4]; 4] = [
    [0.0, 0.2, 1.0, 3.0],
    [0.2, 0.5, 4.0, 7.0],
    [0.5, 0.8, 8.0, 15.0],
    [0.8, 1.0, 16.0, 30.0],
];

/// Desired population for a loudness level, in `[1, capacity]`.
pub fn target_population(rms: f32, capacity: usize) -> usize {
    let rms = rms.clamp(0.0, 1.0);
    let seg = TARGET_SEGMENTS
        .iter()
        .find(|s| rms < s[1])
        .unwrap_or(&TARGET_SEGMENTS[3]);
    let t = (rms - seg[0]) / (seg[1] - seg[0]);
    let value = seg[2] + t * (seg[3] - seg[2]);
    (value.floor() as usize).clamp(1, capacity.max(1))
}

pub struct EntityPool {
    entities: Vec<Entity>,
    shapes: Vec<Arc<Mesh>>,
    since_spawn: f32,
    over_target: f32,
}

impl EntityPool {
    pub fn new(rng: &mut impl Rng) -> Self {
        Self::with_capacity(POOL_CAPACITY, rng)
    }

    pub fn with_capacity(capacity: usize, rng: &mut impl Rng) -> Self {
        let shapes = (0..geometry::SHAPE_COUNT)
            .map(|i| Arc::new(geometry::shape(i)))
            .collect();
        let entities = (0..capacity)
            .map(|slot| Entity::new(slot, capacity, rng))
            .collect();
        Self {
            entities,
            shapes,
            // First eligible spawn fires immediately.
            since_spawn: SPAWN_COOLDOWN,
            over_target: 0.0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn shape(&self, index: usize) -> &Arc<Mesh> {
        &self.shapes[index % self.shapes.len()]
    }

    /// Entities occupying a population slot (active or disappearing).
    pub fn active_count(&self) -> usize {
        self.entities.iter().filter(|e| e.occupies_slot()).count()
    }

    /// Re-home every slot with a layout function `(slot, capacity) ->
    /// (position, orientation)`. Applied instantly, including to live
    /// entities.
    pub fn apply_layout(&mut self, layout: impl Fn(usize, usize) -> (Vec3, Vec3)) {
        let total = self.entities.len();
        for entity in &mut self.entities {
            let (home, orient) = layout(entity.slot, total);
            entity.home = home;
            entity.position = home;
            entity.orient = orient;
        }
    }

    /// One population-control step. Returns the current target for display.
    pub fn step(&mut self, dt: f32, bands: &AudioBands, rng: &mut impl Rng) -> usize {
        let target = target_population(bands.rms, self.entities.len());
        let active = self.active_count();

        self.since_spawn += dt;
        let wants_spawn = active < MIN_VISIBLE
            || (bands.beat > BEAT_SPAWN_THRESHOLD && active < target);
        if wants_spawn && self.since_spawn >= SPAWN_COOLDOWN {
            // The cooldown restarts even when the pool has no free slot.
            self.since_spawn = 0.0;
            let inactive: Vec<usize> = self
                .entities
                .iter()
                .filter(|e| e.is_inactive())
                .map(|e| e.slot)
                .collect();
            if !inactive.is_empty() {
                let slot = inactive[rng.random_range(0..inactive.len())];
                self.entities[slot].spawn(rng);
            }
        }

        if active > target {
            self.over_target += dt;
            if self.over_target > DESPAWN_DELAY {
                self.over_target = 0.0;
                let mode = if bands.beat > SUCK_BEAT_THRESHOLD || bands.low > SUCK_LOW_THRESHOLD {
                    DisappearMode::Suck
                } else if bands.mid > SHRINK_MID_THRESHOLD {
                    DisappearMode::Shrink
                } else {
                    DisappearMode::Fade
                };
                let candidates: Vec<usize> = self
                    .entities
                    .iter()
                    .filter(|e| e.lifecycle == super::Lifecycle::Active)
                    .map(|e| e.slot)
                    .collect();
                if !candidates.is_empty() {
                    let slot = candidates[rng.random_range(0..candidates.len())];
                    self.entities[slot].disappear(mode);
                }
            }
        } else {
            // A dip back under target discards any accumulated over-time.
            self.over_target = 0.0;
        }

        target
    }

    /// Animate every live entity for this frame.
    pub fn animate(&mut self, time: f32, bands: &AudioBands, controls: &ControlVector) {
        for entity in &mut self.entities {
            let rest = &self.shapes[entity.shape % self.shapes.len()];
            entity.update(time, bands, controls, rest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Lifecycle;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(99)
    }

    fn silent() -> AudioBands {
        AudioBands::default()
    }

    fn loud() -> AudioBands {
        AudioBands {
            low: 0.9,
            mid: 0.2,
            high: 0.5,
            rms: 0.95,
            beat: 1.0,
        }
    }

    #[test]
    fn test_target_examples() {
        assert_eq!(target_population(0.0, 30), 1);
        assert!((4..7).contains(&target_population(0.35, 30)));
        assert!((8..15).contains(&target_population(0.65, 30)));
        assert!((16..=30).contains(&target_population(0.95, 30)));
        assert_eq!(target_population(1.0, 30), 30);
    }

    #[test]
    fn test_target_monotonic_and_bounded() {
        let mut prev = 0;
        for step in 0..=1000 {
            let rms = step as f32 / 1000.0;
            let target = target_population(rms, 30);
            assert!((1..=30).contains(&target), "rms {} -> {}", rms, target);
            assert!(target >= prev, "target dipped at rms {}", rms);
            prev = target;
        }
        // Out-of-range inputs clamp instead of exploding.
        assert_eq!(target_population(-1.0, 30), 1);
        assert_eq!(target_population(2.0, 30), 30);
    }

    #[test]
    fn test_target_respects_capacity() {
        assert_eq!(target_population(1.0, 10), 10);
        assert_eq!(target_population(0.0, 10), 1);
    }

    #[test]
    fn test_minimum_floor_spawns_without_beat() {
        let mut rng = rng();
        let mut pool = EntityPool::new(&mut rng);
        // Silence: no beat, target 1, yet the floor pulls the pool to 3.
        for _ in 0..60 {
            pool.step(1.0 / 60.0, &silent(), &mut rng);
        }
        assert_eq!(pool.active_count(), MIN_VISIBLE);
    }

    #[test]
    fn test_spawn_cooldown_enforced() {
        let mut rng = rng();
        let mut pool = EntityPool::new(&mut rng);

        // First step spawns immediately (cooldown pre-charged).
        pool.step(0.0, &silent(), &mut rng);
        assert_eq!(pool.active_count(), 1);

        // A second eligible condition 50ms later stays within the cooldown.
        pool.step(0.05, &silent(), &mut rng);
        assert_eq!(pool.active_count(), 1);

        // 250ms after the first spawn the gate reopens.
        pool.step(0.2, &silent(), &mut rng);
        assert_eq!(pool.active_count(), 2);
    }

    #[test]
    fn test_beat_gated_spawn_needs_headroom() {
        let mut rng = rng();
        let mut pool = EntityPool::new(&mut rng);
        for entity in pool.entities_mut().iter_mut().take(5) {
            entity.spawn(&mut rng);
        }

        // Above the floor, quiet beat: gate closed.
        let mut bands = AudioBands {
            rms: 0.95,
            beat: 0.5,
            ..AudioBands::default()
        };
        pool.step(1.0, &bands, &mut rng);
        assert_eq!(pool.active_count(), 5);

        // Beat over threshold with active < target: spawn.
        bands.beat = 0.8;
        pool.step(1.0, &bands, &mut rng);
        assert_eq!(pool.active_count(), 6);

        // Beat over threshold but already at target: no spawn.
        bands.rms = 0.0;
        pool.step(1.0, &bands, &mut rng);
        assert_eq!(pool.active_count(), 6);
    }

    #[test]
    fn test_despawn_waits_for_sustained_overshoot() {
        let mut rng = rng();
        let mut pool = EntityPool::new(&mut rng);
        for entity in pool.entities_mut().iter_mut().take(10) {
            entity.spawn(&mut rng);
        }

        // Silence: target 1, pool at 10. Under 500ms of overshoot: nothing.
        for _ in 0..4 {
            pool.step(0.1, &silent(), &mut rng);
        }
        let disappearing = |pool: &EntityPool| {
            pool.entities()
                .iter()
                .filter(|e| matches!(e.lifecycle, Lifecycle::Disappearing(_)))
                .count()
        };
        assert_eq!(disappearing(&pool), 0);

        // Crossing the threshold releases exactly one, then the timer resets.
        pool.step(0.11, &silent(), &mut rng);
        assert_eq!(disappearing(&pool), 1);
        assert_eq!(pool.over_target, 0.0);

        // The next window has to be earned from zero again.
        for _ in 0..4 {
            pool.step(0.1, &silent(), &mut rng);
        }
        assert_eq!(disappearing(&pool), 1);
        pool.step(0.11, &silent(), &mut rng);
        assert_eq!(disappearing(&pool), 2);
    }

    #[test]
    fn test_overshoot_timer_resets_when_back_under_target() {
        let mut rng = rng();
        let mut pool = EntityPool::new(&mut rng);
        for entity in pool.entities_mut().iter_mut().take(10) {
            entity.spawn(&mut rng);
        }

        // Accumulate 400ms of overshoot, then a loud frame (target 30).
        for _ in 0..4 {
            pool.step(0.1, &silent(), &mut rng);
        }
        assert!(pool.over_target > 0.3);
        pool.step(0.1, &loud(), &mut rng);
        assert_eq!(pool.over_target, 0.0);

        // Accumulation restarts from scratch.
        pool.step(0.3, &silent(), &mut rng);
        assert!(pool.over_target <= 0.3 + 1e-6);
    }

    #[test]
    fn test_disappear_mode_priority() {
        let pick = |bands: AudioBands| {
            let mut rng = rng();
            let mut pool = EntityPool::new(&mut rng);
            for entity in pool.entities_mut().iter_mut().take(10) {
                entity.spawn(&mut rng);
            }
            // Keep beat below the spawn gate so the population is stable.
            pool.step(0.6, &bands, &mut rng);
            pool.entities()
                .iter()
                .find_map(|e| match e.lifecycle {
                    Lifecycle::Disappearing(mode) => Some(mode),
                    _ => None,
                })
                .expect("one entity should be disappearing")
        };

        let suck = pick(AudioBands {
            low: 0.7,
            ..AudioBands::default()
        });
        assert_eq!(suck, DisappearMode::Suck);

        let shrink = pick(AudioBands {
            mid: 0.7,
            ..AudioBands::default()
        });
        assert_eq!(shrink, DisappearMode::Shrink);

        let fade = pick(AudioBands::default());
        assert_eq!(fade, DisappearMode::Fade);
    }

    #[test]
    fn test_despawn_never_picks_disappearing_entities() {
        let mut rng = rng();
        let mut pool = EntityPool::new(&mut rng);
        for entity in pool.entities_mut().iter_mut().take(4) {
            entity.spawn(&mut rng);
        }
        // Three already on the way out; only one true candidate remains.
        for entity in pool.entities_mut().iter_mut().take(3) {
            entity.disappear(DisappearMode::Fade);
        }

        pool.step(0.6, &silent(), &mut rng);
        let fading = pool
            .entities()
            .iter()
            .filter(|e| matches!(e.lifecycle, Lifecycle::Disappearing(_)))
            .count();
        assert_eq!(fading, 4);
        assert_eq!(
            pool.entities()
                .iter()
                .filter(|e| e.lifecycle == Lifecycle::Active)
                .count(),
            0
        );
    }

    #[test]
    fn test_cooldown_restarts_even_with_full_pool() {
        let mut rng = rng();
        let mut pool = EntityPool::with_capacity(2, &mut rng);
        for entity in pool.entities_mut() {
            entity.spawn(&mut rng);
        }
        // Wait: with capacity 2 the floor condition holds (2 < 3) but no
        // inactive slot exists; the timestamp must still reset.
        pool.step(1.0, &silent(), &mut rng);
        assert_eq!(pool.since_spawn, 0.0);
        assert_eq!(pool.active_count(), 2);
    }

    #[test]
    fn test_population_converges_in_both_directions() {
        let mut rng = rng();
        let mut pool = EntityPool::new(&mut rng);

        // Loud stretch: population climbs toward a high target.
        for _ in 0..600 {
            pool.step(1.0 / 60.0, &loud(), &mut rng);
        }
        let high = pool.active_count();
        let target_high = target_population(0.95, POOL_CAPACITY);
        assert!(high >= target_high.min(16), "population stayed at {}", high);

        // Silent stretch: despawns drain it back down (dead entities are
        // finalized by the animator; here they stay Disappearing, which
        // still occupies slots, so count only Active).
        for _ in 0..2400 {
            pool.step(1.0 / 60.0, &silent(), &mut rng);
            pool.animate(0.0, &silent(), &ControlVector::default());
        }
        let active_only = pool
            .entities()
            .iter()
            .filter(|e| e.lifecycle == Lifecycle::Active)
            .count();
        assert!(active_only <= MIN_VISIBLE, "still {} active", active_only);
    }
}
