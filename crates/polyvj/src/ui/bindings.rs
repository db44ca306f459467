//! Keyboard bindings.
//!
//! Centralizes the key map so main.rs only deals in actions.

use nannou::prelude::Key;
use polyvj_core::ModeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleHud,

    SetMode(ModeKind),
    NextPreset,
    ToggleAutoPilot,

    NextAudioDevice,
    RescanMidi,
    CycleInputFilter,
    CycleChannelFilter,

    // MIDI learn: pick a parameter, then arm it
    SelectPrevParam,
    SelectNextParam,
    LearnSelected,
    CancelLearn,
    ResetMapping,
}

pub fn parse_key(key: Key) -> Option<Action> {
    match key {
        Key::Q => Some(Action::Quit),
        Key::H => Some(Action::ToggleHud),

        Key::Key1 => Some(Action::SetMode(ModeKind::Layers)),
        Key::Key2 => Some(Action::SetMode(ModeKind::Swarm)),
        Key::Key3 => Some(Action::SetMode(ModeKind::ShaderFx)),
        Key::Space | Key::P => Some(Action::NextPreset),
        Key::A => Some(Action::ToggleAutoPilot),

        Key::D => Some(Action::NextAudioDevice),
        Key::M => Some(Action::RescanMidi),
        Key::I => Some(Action::CycleInputFilter),
        Key::C => Some(Action::CycleChannelFilter),

        Key::Left => Some(Action::SelectPrevParam),
        Key::Right => Some(Action::SelectNextParam),
        Key::L => Some(Action::LearnSelected),
        Key::Escape => Some(Action::CancelLearn),
        Key::R => Some(Action::ResetMapping),

        _ => None,
    }
}
