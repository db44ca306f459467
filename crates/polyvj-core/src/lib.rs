//! polyvj-core: the audio-reactive engine behind the polyvj performance app.
//!
//! The host feeds a byte magnitude spectrum and raw control-surface
//! messages in; a [`RenderScene`] comes out each frame. Band extraction,
//! control blending, population control and entity animation all live
//! here, with no dependency on audio drivers, MIDI backends or the
//! drawing stack.
//!
//! Per tick there is exactly one writer: [`Engine::tick`] mutates the
//! control vector, the entity pool and the scene in strict sequence, and
//! everything downstream reads snapshots.

pub mod bands;
pub mod control;
pub mod entity;
pub mod modes;
pub mod scene;

pub use bands::AudioBands;
pub use control::{combine, ControlEvent, ControlSource, ControlVector, Param, CONTROL_MIX};
pub use modes::{ModeKind, Orchestrator};
pub use scene::RenderScene;

/// Upper bound on the per-frame delta, seconds. Tab pauses and debugger
/// stops produce one clamped step instead of a teleport.
pub const MAX_FRAME_DT: f32 = 0.1;

/// Seconds between auto-pilot preset switches.
pub const AUTO_SWITCH_INTERVAL: f32 = 10.0;

/// Owned engine context: control source plus orchestrator, driven once per
/// display frame by the host render loop.
pub struct Engine {
    pub control: ControlSource,
    pub orchestrator: Orchestrator,
    time: f32,
    last_auto_switch: f32,
    last_bands: AudioBands,
    notice: Option<String>,
}

impl Engine {
    /// Engine with default settings; nothing touches the filesystem.
    pub fn new() -> Self {
        Self::with_control(ControlSource::new())
    }

    /// Engine restored from the persisted configuration.
    pub fn restore() -> Self {
        Self::with_control(ControlSource::restore())
    }

    fn with_control(control: ControlSource) -> Self {
        Self {
            control,
            orchestrator: Orchestrator::new(),
            time: 0.0,
            last_auto_switch: 0.0,
            last_bands: AudioBands::default(),
            notice: None,
        }
    }

    /// Feed one raw control-surface message.
    pub fn handle_midi(&mut self, status: u8, data1: u8, data2: u8) -> Option<ControlEvent> {
        self.control.handle_message(status, data1, data2)
    }

    pub fn set_auto_pilot(&mut self, enabled: bool) {
        self.control.set_auto_pilot(enabled);
        if enabled {
            self.last_auto_switch = self.time;
        }
    }

    pub fn is_auto_pilot(&self) -> bool {
        self.control.is_auto_pilot()
    }

    /// One frame: control update, feature extraction, mode update.
    pub fn tick(&mut self, dt: f32, magnitudes: &[u8]) -> &RenderScene {
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        self.time += dt;

        self.control.tick(self.time);

        if self.control.is_auto_pilot()
            && self.time - self.last_auto_switch > AUTO_SWITCH_INTERVAL
        {
            self.last_auto_switch = self.time;
            let name = self.orchestrator.auto_switch();
            self.notice = Some(format!("Auto: {}", name));
        }

        self.last_bands = bands::extract(magnitudes);
        self.orchestrator
            .tick(dt, &self.last_bands, self.control.values())
    }

    /// Features extracted on the most recent tick, for HUD display.
    pub fn bands(&self) -> &AudioBands {
        &self.last_bands
    }

    /// Pending user-facing notification, if any.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_produces_scene_from_spectrum() {
        let mut engine = Engine::new();
        let spectrum = vec![180u8; 512];
        let scene = engine.tick(1.0 / 60.0, &spectrum);
        assert!(scene.camera_z > 0.0);
        assert!((engine.bands().rms - 180.0 / 255.0).abs() < 1e-4);
    }

    #[test]
    fn test_auto_switch_fires_on_interval() {
        let mut engine = Engine::new();
        engine.set_auto_pilot(true);
        let spectrum = vec![0u8; 512];

        // Just under the interval: no switch yet. The frame clamp caps each
        // tick at MAX_FRAME_DT, so walk the clock in clamped steps.
        let steps = (AUTO_SWITCH_INTERVAL / MAX_FRAME_DT) as usize;
        for _ in 0..steps {
            engine.tick(MAX_FRAME_DT, &spectrum);
        }
        assert!(engine.take_notice().is_none());

        engine.tick(MAX_FRAME_DT, &spectrum);
        let notice = engine.take_notice().expect("auto switch notice");
        assert!(notice.starts_with("Auto:"));
        // Consumed once.
        assert!(engine.take_notice().is_none());
    }

    #[test]
    fn test_manual_mode_never_auto_switches() {
        let mut engine = Engine::new();
        let spectrum = vec![0u8; 512];
        for _ in 0..300 {
            engine.tick(MAX_FRAME_DT, &spectrum);
        }
        assert!(engine.take_notice().is_none());
    }

    #[test]
    fn test_midi_routes_to_control_vector() {
        let mut engine = Engine::new();
        engine.handle_midi(0xB0, 2, 127);
        assert_eq!(engine.control.get(Param::Hue), 1.0);
    }
}
