mod audio;
mod midi;
mod render;
mod ui;

use audio::{SourcePipe, SpectrumProcessor};
use midi::MidiHub;
use nannou::prelude::*;
use polyvj_core::control::{ChannelFilter, ControlEvent, InputFilter};
use polyvj_core::Engine;
use ui::bindings::{parse_key, Action};
use ui::hud::Hud;

fn main() {
    nannou::app(model).update(update).run();
}

struct Model {
    source: SourcePipe,
    spectrum: SpectrumProcessor,
    midi: MidiHub,
    engine: Engine,
    hud: Hud,
}

fn model(app: &App) -> Model {
    app.new_window()
        .title("polyvj")
        .size(1280, 720)
        .view(view)
        .key_pressed(key_pressed)
        .build()
        .unwrap();

    let engine = Engine::restore();

    let source = SourcePipe::new(engine.control.last_audio_device());

    let mut midi = MidiHub::new();
    midi.connect(engine.control.input());

    Model {
        source,
        spectrum: SpectrumProcessor::new(),
        midi,
        engine,
        hud: Hud::new(),
    }
}

fn update(_app: &App, model: &mut Model, update: Update) {
    let dt = update.since_last.as_secs_f32();

    for [status, data1, data2] in model.midi.drain() {
        match model.engine.handle_midi(status, data1, data2) {
            Some(ControlEvent::Learned { param, cc }) => {
                model
                    .hud
                    .notify(format!("Learned: CC{} -> {}", cc, param.label()));
            }
            Some(ControlEvent::Applied { .. }) | None => {}
        }
    }

    let samples = model.source.samples();
    let magnitudes = model.spectrum.process(&samples);
    model.engine.tick(dt, magnitudes);

    if let Some(notice) = model.engine.take_notice() {
        model.hud.notify(notice);
    }
    model.hud.tick();
}

fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    let bounds = app.window_rect();

    draw.background().color(BLACK);
    render::draw_scene(model.engine.orchestrator.scene(), &draw, bounds);

    model.hud.draw(
        &draw,
        bounds,
        model.engine.orchestrator.kind(),
        model.engine.orchestrator.preset_name(),
        model.engine.bands(),
        &model.engine.control,
        model.source.device_name(),
    );

    draw.to_frame(app, &frame).unwrap();
}

fn key_pressed(app: &App, model: &mut Model, key: Key) {
    let action = match parse_key(key) {
        Some(action) => action,
        None => return,
    };

    match action {
        Action::Quit => app.quit(),
        Action::ToggleHud => model.hud.toggle(),

        Action::SetMode(kind) => {
            model.engine.orchestrator.set_mode(kind);
            model.hud.notify(format!("Mode: {}", kind.name()));
        }
        Action::NextPreset => {
            let name = model.engine.orchestrator.next_preset();
            model.hud.notify(format!("Preset: {}", name));
        }
        Action::ToggleAutoPilot => {
            let enabled = !model.engine.is_auto_pilot();
            model.engine.set_auto_pilot(enabled);
            model.hud.notify(format!(
                "Auto-pilot: {}",
                if enabled { "ON" } else { "off" }
            ));
        }

        Action::NextAudioDevice => {
            let (name, ok) = model.source.select_next();
            if ok {
                model.engine.control.remember_audio_device(&name);
                model.hud.notify(format!("Audio: {}", name));
            } else {
                model.hud.notify(format!("Audio: {} FAILED", name));
            }
        }
        Action::RescanMidi => {
            let filter = model.engine.control.input().clone();
            model.midi.connect(&filter);
            model.hud.notify(format!(
                "MIDI: {} port(s) connected",
                model.midi.connection_count()
            ));
        }
        Action::CycleInputFilter => {
            // all -> first port -> second port -> ... -> all
            let ports = model.midi.port_names().to_vec();
            let next = match model.engine.control.input() {
                InputFilter::All => ports.first().cloned().map(InputFilter::Device),
                InputFilter::Device(current) => ports
                    .iter()
                    .position(|name| name == current)
                    .and_then(|idx| ports.get(idx + 1))
                    .cloned()
                    .map(InputFilter::Device),
            }
            .unwrap_or(InputFilter::All);

            model.engine.control.set_input(next.clone());
            model.midi.connect(&next);
            model
                .hud
                .notify(format!("MIDI input: {}", next.as_string()));
        }
        Action::CycleChannelFilter => {
            let next = match model.engine.control.channel() {
                ChannelFilter::All => ChannelFilter::Only(1),
                ChannelFilter::Only(16) => ChannelFilter::All,
                ChannelFilter::Only(n) => ChannelFilter::Only(n + 1),
            };
            model.engine.control.set_channel(next);
            model
                .hud
                .notify(format!("MIDI channel: {}", next.as_string()));
        }

        Action::SelectPrevParam => model.hud.select_param(-1),
        Action::SelectNextParam => model.hud.select_param(1),
        Action::LearnSelected => {
            let param = model.hud.selected_param;
            model.engine.control.start_learn(param);
            model
                .hud
                .notify(format!("Learn armed for {}", param.label()));
        }
        Action::CancelLearn => {
            if model.engine.control.learning().is_some() {
                model.engine.control.cancel_learn();
                model.hud.notify("Learn cancelled".to_string());
            }
        }
        Action::ResetMapping => {
            model.engine.control.reset_mapping();
            model.hud.notify("CC mapping reset".to_string());
        }
    }
}
