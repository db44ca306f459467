//! Control parameter source.
//!
//! Holds the 16-knob control vector that blends with the audio features, fed
//! either by mapped control-change messages from a hardware surface or by the
//! deterministic auto-pilot. Mapping and filter settings persist to the
//! config dotfile on every change; live knob values do not.

mod mapping;
mod settings;

pub use mapping::CcMap;
pub use settings::ControlSettings;

/// Weight of the control surface in the audio/control blend.
/// Audio carries the remaining `1 - CONTROL_MIX`. This single ratio defines
/// the feel of every blended parameter in the system.
pub const CONTROL_MIX: f32 = 0.4;

/// Blend one audio band value with one control value.
pub fn combine(audio: f32, control: f32) -> f32 {
    audio * (1.0 - CONTROL_MIX) + control * CONTROL_MIX
}

/// Number of control parameters.
pub const PARAM_COUNT: usize = 16;

/// The fixed control parameter bank, one entry per `cc1`..`cc16` slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Param {
    Intensity,
    Hue,
    Speed,
    FxAmount,
    Trails,
    Glow,
    Contrast,
    Zoom,
    Density,
    SizeVariance,
    NoiseScale,
    Curl,
    Jitter,
    BeatSensitivity,
    BackgroundFade,
    Aux,
}

impl Param {
    pub const ALL: [Param; PARAM_COUNT] = [
        Param::Intensity,
        Param::Hue,
        Param::Speed,
        Param::FxAmount,
        Param::Trails,
        Param::Glow,
        Param::Contrast,
        Param::Zoom,
        Param::Density,
        Param::SizeVariance,
        Param::NoiseScale,
        Param::Curl,
        Param::Jitter,
        Param::BeatSensitivity,
        Param::BackgroundFade,
        Param::Aux,
    ];

    /// Zero-based position in the bank.
    pub fn index(self) -> usize {
        Param::ALL.iter().position(|&p| p == self).unwrap_or(0)
    }

    /// One-based slot number, matching the default `cc<n>` assignment.
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    /// Stable name used in the persisted mapping table.
    pub fn name(self) -> &'static str {
        const NAMES: [&str; PARAM_COUNT] = [
            "cc1", "cc2", "cc3", "cc4", "cc5", "cc6", "cc7", "cc8", "cc9", "cc10", "cc11",
            "cc12", "cc13", "cc14", "cc15", "cc16",
        ];
        NAMES[self.index()]
    }

    pub fn from_name(name: &str) -> Option<Param> {
        Param::ALL.iter().copied().find(|p| p.name() == name)
    }

    pub fn from_number(number: u8) -> Option<Param> {
        if (1..=PARAM_COUNT as u8).contains(&number) {
            Some(Param::ALL[number as usize - 1])
        } else {
            None
        }
    }

    /// Human-readable label for HUD display.
    pub fn label(self) -> &'static str {
        match self {
            Param::Intensity => "Intensity",
            Param::Hue => "Hue",
            Param::Speed => "Speed",
            Param::FxAmount => "FX Amount",
            Param::Trails => "Trails",
            Param::Glow => "Glow",
            Param::Contrast => "Contrast",
            Param::Zoom => "Zoom",
            Param::Density => "Density",
            Param::SizeVariance => "Size Variance",
            Param::NoiseScale => "Noise Scale",
            Param::Curl => "Curl",
            Param::Jitter => "Jitter",
            Param::BeatSensitivity => "Beat Sensitivity",
            Param::BackgroundFade => "Background Fade",
            Param::Aux => "Aux",
        }
    }
}

/// Snapshot of all 16 control values, each in 0-1.
///
/// Only the [`ControlSource`] writes this during a tick; modes receive it
/// read-only and use [`ControlVector::with_floor`] when they need a locally
/// clamped copy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlVector {
    values: [f32; PARAM_COUNT],
}

impl Default for ControlVector {
    fn default() -> Self {
        // Startup posture: intensity/speed/tone knobs centered, effect
        // amounts off.
        let mut values = [0.5; PARAM_COUNT];
        values[Param::Hue.index()] = 0.0;
        values[Param::FxAmount.index()] = 0.0;
        values[Param::Trails.index()] = 0.0;
        values[Param::Jitter.index()] = 0.0;
        Self { values }
    }
}

impl ControlVector {
    pub fn get(&self, param: Param) -> f32 {
        self.values[param.index()]
    }

    pub fn set(&mut self, param: Param, value: f32) {
        self.values[param.index()] = value.clamp(0.0, 1.0);
    }

    /// Copy with `param` raised to at least `min`. Formalized override stage
    /// for modes that need a local minimum without touching the shared state.
    pub fn with_floor(&self, param: Param, min: f32) -> ControlVector {
        let mut copy = *self;
        copy.set(param, self.get(param).max(min));
        copy
    }
}

/// Channel gate for inbound control-change messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelFilter {
    All,
    /// A single MIDI channel, 1-16.
    Only(u8),
}

impl ChannelFilter {
    pub fn accepts(self, channel: u8) -> bool {
        match self {
            ChannelFilter::All => true,
            ChannelFilter::Only(n) => channel == n,
        }
    }

    pub fn parse(text: &str) -> ChannelFilter {
        match text.parse::<u8>() {
            Ok(n) if (1..=16).contains(&n) => ChannelFilter::Only(n),
            _ => ChannelFilter::All,
        }
    }

    pub fn as_string(self) -> String {
        match self {
            ChannelFilter::All => "all".to_string(),
            ChannelFilter::Only(n) => n.to_string(),
        }
    }
}

/// Device gate; enforced at connection time by the host's MIDI hub.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputFilter {
    All,
    Device(String),
}

impl InputFilter {
    pub fn accepts(&self, name: &str) -> bool {
        match self {
            InputFilter::All => true,
            InputFilter::Device(id) => id == name,
        }
    }

    pub fn parse(text: &str) -> InputFilter {
        if text == "all" || text.is_empty() {
            InputFilter::All
        } else {
            InputFilter::Device(text.to_string())
        }
    }

    pub fn as_string(&self) -> String {
        match self {
            InputFilter::All => "all".to_string(),
            InputFilter::Device(id) => id.clone(),
        }
    }
}

/// Outcome of feeding a raw control-surface message to the source.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlEvent {
    /// A mapped knob moved.
    Applied { param: Param, value: f32 },
    /// Learn mode bound a controller number to its pending target.
    Learned { param: Param, cc: u8 },
}

const CONTROL_CHANGE: u8 = 0xB0;
const STATUS_MASK: u8 = 0xF0;
const CHANNEL_MASK: u8 = 0x0F;

pub struct ControlSource {
    values: ControlVector,
    mapping: CcMap,
    channel: ChannelFilter,
    input: InputFilter,
    last_audio_device: Option<String>,
    learn_target: Option<Param>,
    auto_pilot: bool,
    autosave: bool,
}

impl Default for ControlSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlSource {
    /// Fresh source with default settings and persistence disabled.
    pub fn new() -> Self {
        Self::from_settings(ControlSettings::default(), false)
    }

    /// Source restored from the config dotfile, persisting future changes.
    pub fn restore() -> Self {
        Self::from_settings(ControlSettings::load(), true)
    }

    pub fn from_settings(settings: ControlSettings, autosave: bool) -> Self {
        Self {
            values: ControlVector::default(),
            mapping: CcMap::from_table(&settings.cc_mapping),
            channel: ChannelFilter::parse(&settings.selected_channel),
            input: InputFilter::parse(&settings.selected_input),
            last_audio_device: settings.last_audio_device,
            learn_target: None,
            auto_pilot: false,
            autosave,
        }
    }

    /// Current settings snapshot in persisted form.
    pub fn settings(&self) -> ControlSettings {
        ControlSettings {
            selected_input: self.input.as_string(),
            selected_channel: self.channel.as_string(),
            last_audio_device: self.last_audio_device.clone(),
            cc_mapping: self.mapping.to_table(),
        }
    }

    fn persist(&self) {
        if self.autosave {
            self.settings().save();
        }
    }

    pub fn values(&self) -> &ControlVector {
        &self.values
    }

    pub fn get(&self, param: Param) -> f32 {
        self.values.get(param)
    }

    pub fn set(&mut self, param: Param, value: f32) {
        self.values.set(param, value);
    }

    pub fn channel(&self) -> ChannelFilter {
        self.channel
    }

    pub fn set_channel(&mut self, filter: ChannelFilter) {
        self.channel = filter;
        self.persist();
    }

    pub fn input(&self) -> &InputFilter {
        &self.input
    }

    pub fn set_input(&mut self, filter: InputFilter) {
        self.input = filter;
        self.persist();
    }

    pub fn remember_audio_device(&mut self, name: &str) {
        self.last_audio_device = Some(name.to_string());
        self.persist();
    }

    pub fn last_audio_device(&self) -> Option<&str> {
        self.last_audio_device.as_deref()
    }

    pub fn mapping(&self) -> &CcMap {
        &self.mapping
    }

    pub fn bind(&mut self, cc: u8, param: Param) {
        self.mapping.bind(cc, param);
        self.persist();
    }

    pub fn reset_mapping(&mut self) {
        self.mapping = CcMap::identity();
        self.persist();
    }

    pub fn start_learn(&mut self, param: Param) {
        self.learn_target = Some(param);
    }

    pub fn cancel_learn(&mut self) {
        self.learn_target = None;
    }

    pub fn learning(&self) -> Option<Param> {
        self.learn_target
    }

    pub fn set_auto_pilot(&mut self, enabled: bool) {
        self.auto_pilot = enabled;
    }

    pub fn is_auto_pilot(&self) -> bool {
        self.auto_pilot
    }

    /// Per-frame update. Regenerates the auto-pilot subset when enabled;
    /// otherwise a no-op. Pure in `t`.
    pub fn tick(&mut self, t: f32) {
        if self.auto_pilot {
            self.drive(t);
        }
    }

    fn drive(&mut self, t: f32) {
        let v = &mut self.values;
        v.set(Param::Intensity, ((t * 0.5).sin() * 0.5 + 0.5) * 0.8 + 0.2);
        v.set(Param::Hue, (t * 0.1).rem_euclid(1.0));
        v.set(Param::Speed, (t * 0.2).sin() * 0.4 + 0.5);
        v.set(Param::FxAmount, ((t * 1.5).sin() * (t * 0.5).sin()).max(0.0));
        v.set(Param::Trails, (t * 0.3).sin() * 0.5 + 0.5);
        v.set(Param::Glow, (t * 0.8).sin() * 0.5 + 0.5);
        v.set(Param::Contrast, (t * 0.4).sin() * 0.5 + 0.5);
        v.set(Param::Zoom, (t * 0.6).sin() * 0.5 + 0.5);
    }

    /// Feed one raw control-surface message.
    ///
    /// Only control-change messages are acted on; a pending learn target
    /// binds to the next CC regardless of the channel filter.
    pub fn handle_message(&mut self, status: u8, data1: u8, data2: u8) -> Option<ControlEvent> {
        if status & STATUS_MASK != CONTROL_CHANGE {
            return None;
        }
        let channel = (status & CHANNEL_MASK) + 1;

        if let Some(target) = self.learn_target.take() {
            self.mapping.bind(data1, target);
            self.persist();
            return Some(ControlEvent::Learned {
                param: target,
                cc: data1,
            });
        }

        if !self.channel.accepts(channel) {
            return None;
        }

        let value = data2 as f32 / 127.0;
        let param = self.mapping.lookup(data1)?;
        self.values.set(param, value);
        Some(ControlEvent::Applied { param, value })
    }
}
