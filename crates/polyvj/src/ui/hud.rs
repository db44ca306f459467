//! HUD overlay: mode/preset line, knob monitor, notifications.

use nannou::prelude::*;
use polyvj_core::control::{ControlSource, Param};
use polyvj_core::{AudioBands, ModeKind};

/// Frames a notification stays on screen (~3s at 60fps).
const NOTIFICATION_FRAMES: u32 = 180;

pub struct Hud {
    pub visible: bool,
    notification: Option<String>,
    notification_frames: u32,
    /// Parameter currently targeted by the learn workflow
    pub selected_param: Param,
}

impl Hud {
    pub fn new() -> Self {
        Self {
            visible: true,
            notification: None,
            notification_frames: 0,
            selected_param: Param::Intensity,
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn notify(&mut self, text: String) {
        println!("{}", text);
        self.notification = Some(text);
        self.notification_frames = NOTIFICATION_FRAMES;
    }

    pub fn select_param(&mut self, step: i32) {
        let count = Param::ALL.len() as i32;
        let idx = self.selected_param.index() as i32;
        let next = (idx + step).rem_euclid(count);
        self.selected_param = Param::ALL[next as usize];
    }

    pub fn tick(&mut self) {
        if self.notification_frames > 0 {
            self.notification_frames -= 1;
            if self.notification_frames == 0 {
                self.notification = None;
            }
        }
    }

    pub fn draw(
        &self,
        draw: &Draw,
        bounds: Rect,
        mode: ModeKind,
        preset: &str,
        bands: &AudioBands,
        control: &ControlSource,
        audio_device: &str,
    ) {
        if let Some(text) = &self.notification {
            draw.text(text)
                .x_y(bounds.x(), bounds.top() - 30.0)
                .w(bounds.w() - 40.0)
                .font_size(18)
                .color(WHITE);
        }

        if !self.visible {
            return;
        }

        let left = bounds.left() + 14.0;
        let mut y = bounds.bottom() + 96.0;
        let line = |draw: &Draw, text: &str, y: f32, highlight: bool| {
            draw.text(text)
                .left_justify()
                .x_y(left + bounds.w() / 2.0 - 14.0, y)
                .w(bounds.w() - 28.0)
                .font_size(13)
                .color(if highlight { YELLOW } else { GRAY });
        };

        line(
            draw,
            &format!(
                "[{}] {} / {}  |  audio: {}",
                mode_slot(mode),
                mode.name(),
                preset,
                audio_device
            ),
            y,
            false,
        );
        y -= 18.0;

        line(
            draw,
            &format!(
                "low {:.2}  mid {:.2}  high {:.2}  rms {:.2}  beat {:.2}",
                bands.low, bands.mid, bands.high, bands.rms, bands.beat
            ),
            y,
            false,
        );
        y -= 18.0;

        let ccs: Vec<String> = Param::ALL
            .iter()
            .take(8)
            .map(|p| format!("{}:{:.2}", p.name(), control.get(*p)))
            .collect();
        line(draw, &ccs.join(" "), y, false);
        y -= 18.0;

        let learn_state = match control.learning() {
            Some(param) => format!("LEARN: waiting for CC -> {}", param.label()),
            None => {
                let cc = control
                    .mapping()
                    .cc_for(self.selected_param)
                    .map(|n| format!("CC{}", n))
                    .unwrap_or_else(|| "unmapped".to_string());
                format!(
                    "param: {} ({})  [arrows select, L learns]",
                    self.selected_param.label(),
                    cc
                )
            }
        };
        line(draw, &learn_state, y, control.learning().is_some());
        y -= 18.0;

        let auto = if control.is_auto_pilot() { "ON" } else { "off" };
        line(
            draw,
            &format!(
                "auto-pilot {}  ch {}  |  1-3 mode  Space preset  A auto  D audio  M midi  H hud  Q quit",
                auto,
                control.channel().as_string()
            ),
            y,
            false,
        );
    }
}

impl Default for Hud {
    fn default() -> Self {
        Self::new()
    }
}

fn mode_slot(mode: ModeKind) -> &'static str {
    match mode {
        ModeKind::Layers => "1",
        ModeKind::Swarm => "2",
        ModeKind::ShaderFx => "3",
    }
}
