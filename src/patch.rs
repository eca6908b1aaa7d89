//! The patch data model: every parameter that defines a voice's timbre,
//! plus the dotted-path parameter grammar used by `set_param` (spec.md §6).
//!
//! REDESIGN FLAG applied here: rather than dispatching `set_param` by
//! matching raw strings all the way down, a path is parsed once into a
//! `ParamId` — a closed, exhaustively-matched enumeration — and every
//! setter is a single `match` arm. The string grammar survives only as the
//! wire format at the edge (`ParamId::parse`).

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Oscillator/LFO waveform selection. REDESIGN FLAG: "polymorphic
/// oscillator by waveform string" becomes a plain enum; wavetable lookup is
/// an array index (`dsp::wavetable::WavetableBank::table`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    Sine,
    Saw,
    Square,
    Triangle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseType {
    White,
    Pink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LfoDestination {
    Filter,
    Pitch,
    Amp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlideMode {
    Off,
    Always,
    Legato,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillatorParams {
    pub waveform: Waveform,
    pub octave: i32,
    pub semitone: i32,
    pub detune: f64,
    pub level: f64,
}

impl OscillatorParams {
    pub fn clamp(&mut self) {
        self.octave = self.octave.clamp(-2, 2);
        self.semitone = self.semitone.clamp(-12, 12);
        self.detune = self.detune.clamp(-50.0, 50.0);
        self.level = self.level.clamp(0.0, 1.0);
    }
}

impl Default for OscillatorParams {
    fn default() -> Self {
        Self {
            waveform: Waveform::Saw,
            octave: 0,
            semitone: 0,
            detune: 0.0,
            level: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseParams {
    pub noise_type: NoiseType,
    pub level: f64,
}

impl NoiseParams {
    pub fn clamp(&mut self) {
        self.level = self.level.clamp(0.0, 1.0);
    }
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            noise_type: NoiseType::White,
            level: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    pub cutoff: f64,
    pub resonance: f64,
    pub env_amount: f64,
    pub key_tracking: f64,
}

impl FilterParams {
    pub fn clamp(&mut self, sample_rate: u32) {
        let max_hz = crate::config::filter_max_hz(sample_rate);
        self.cutoff = self.cutoff.clamp(crate::config::FILTER_MIN_HZ, max_hz);
        self.resonance = self.resonance.clamp(0.0, 1.0);
        self.env_amount = self.env_amount.clamp(0.0, 48.0);
        self.key_tracking = self.key_tracking.clamp(0.0, 1.0);
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            cutoff: 8000.0,
            resonance: 0.0,
            env_amount: 0.0,
            key_tracking: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdsrParams {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl AdsrParams {
    pub fn clamp(&mut self) {
        self.attack = self.attack.max(0.001);
        self.decay = self.decay.max(0.001);
        self.release = self.release.max(0.001);
        self.sustain = self.sustain.clamp(0.0, 1.0);
    }
}

impl Default for AdsrParams {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LfoParams {
    pub waveform: Waveform,
    pub rate: f64,
    pub depth: f64,
    pub destination: LfoDestination,
    pub key_sync: bool,
}

impl LfoParams {
    pub fn clamp(&mut self) {
        self.rate = self.rate.clamp(0.1, 20.0);
        self.depth = self.depth.clamp(0.0, 1.0);
    }
}

impl Default for LfoParams {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            rate: 5.0,
            depth: 0.0,
            destination: LfoDestination::Filter,
            key_sync: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlideParams {
    pub mode: GlideMode,
    pub time: f64,
}

impl GlideParams {
    pub fn clamp(&mut self) {
        self.time = self.time.clamp(0.0, 1.0);
    }
}

impl Default for GlideParams {
    fn default() -> Self {
        Self {
            mode: GlideMode::Off,
            time: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub name: String,
    pub osc1: OscillatorParams,
    pub osc2: OscillatorParams,
    pub osc3: OscillatorParams,
    pub noise: NoiseParams,
    pub filter: FilterParams,
    pub filter_adsr: AdsrParams,
    pub amp_adsr: AdsrParams,
    pub lfo: LfoParams,
    pub glide: GlideParams,
}

impl Patch {
    /// Clamp every field to its documented range. Called after construction
    /// and after any deserialization, so a Patch is always internally valid.
    pub fn clamp(&mut self, sample_rate: u32) {
        self.osc1.clamp();
        self.osc2.clamp();
        self.osc3.clamp();
        self.noise.clamp();
        self.filter.clamp(sample_rate);
        self.filter_adsr.clamp();
        self.amp_adsr.clamp();
        self.lfo.clamp();
        self.glide.clamp();
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| format!("failed to serialize patch: {}", e))
    }

    pub fn from_json(json: &str, sample_rate: u32) -> Result<Self, String> {
        let mut patch: Patch =
            serde_json::from_str(json).map_err(|e| format!("malformed patch json: {}", e))?;
        patch.clamp(sample_rate);
        Ok(patch)
    }

    /// Apply a dotted-path parameter update. Returns `Err` on an unknown
    /// path or a value of the wrong shape — the caller (the engine's event
    /// drain) logs and no-ops on error per spec.md §7, it is never
    /// propagated out of the audio thread.
    pub fn set_param(&mut self, path: &str, value: &ParamValue, sample_rate: u32) -> Result<(), String> {
        let id = ParamId::parse(path)?;
        id.apply(self, value)?;
        self.clamp(sample_rate);
        Ok(())
    }
}

impl Default for Patch {
    fn default() -> Self {
        Self {
            name: "Init".to_string(),
            osc1: OscillatorParams::default(),
            osc2: OscillatorParams {
                level: 0.0,
                ..OscillatorParams::default()
            },
            osc3: OscillatorParams {
                level: 0.0,
                ..OscillatorParams::default()
            },
            noise: NoiseParams::default(),
            filter: FilterParams::default(),
            filter_adsr: AdsrParams::default(),
            amp_adsr: AdsrParams::default(),
            lfo: LfoParams::default(),
            glide: GlideParams::default(),
        }
    }
}

/// A value carried by a `set_param` wire event (spec.md §6:
/// `value: number|string|bool`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl ParamValue {
    fn as_number(&self) -> Result<f64, String> {
        match self {
            ParamValue::Number(n) => Ok(*n),
            other => Err(format!("expected a number, got {:?}", other)),
        }
    }

    fn as_text(&self) -> Result<&str, String> {
        match self {
            ParamValue::Text(s) => Ok(s),
            other => Err(format!("expected a string, got {:?}", other)),
        }
    }

    fn as_bool(&self) -> Result<bool, String> {
        match self {
            ParamValue::Bool(b) => Ok(*b),
            other => Err(format!("expected a bool, got {:?}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OscSlot {
    One,
    Two,
    Three,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdsrSlot {
    Filter,
    Amp,
}

/// The closed set of every settable parameter. Parsed once from a dotted
/// path (`osc1.level`, `filter.cutoff`, ...); every subsequent dispatch is
/// a plain `match`, not repeated string comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamId {
    OscWaveform(OscSlot),
    OscOctave(OscSlot),
    OscSemitone(OscSlot),
    OscDetune(OscSlot),
    OscLevel(OscSlot),
    NoiseType,
    NoiseLevel,
    FilterCutoff,
    FilterResonance,
    FilterEnvAmount,
    FilterKeyTracking,
    AdsrAttack(AdsrSlot),
    AdsrDecay(AdsrSlot),
    AdsrSustain(AdsrSlot),
    AdsrRelease(AdsrSlot),
    LfoWaveform,
    LfoRate,
    LfoDepth,
    LfoDestination,
    LfoKeySync,
    GlideMode,
    GlideTime,
}

impl FromStr for ParamId {
    type Err = String;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        Self::parse(path)
    }
}

impl ParamId {
    pub fn parse(path: &str) -> Result<Self, String> {
        let (head, tail) = path
            .split_once('.')
            .ok_or_else(|| format!("unknown param path: {:?}", path))?;

        let id = match (head, tail) {
            ("osc1", field) => Self::osc_field(OscSlot::One, field)?,
            ("osc2", field) => Self::osc_field(OscSlot::Two, field)?,
            ("osc3", field) => Self::osc_field(OscSlot::Three, field)?,
            ("noise", "noise_type") => ParamId::NoiseType,
            ("noise", "level") => ParamId::NoiseLevel,
            ("filter", "cutoff") => ParamId::FilterCutoff,
            ("filter", "resonance") => ParamId::FilterResonance,
            ("filter", "env_amount") => ParamId::FilterEnvAmount,
            ("filter", "key_tracking") => ParamId::FilterKeyTracking,
            ("filter_adsr", field) => Self::adsr_field(AdsrSlot::Filter, field)?,
            ("amp_adsr", field) => Self::adsr_field(AdsrSlot::Amp, field)?,
            ("lfo", "waveform") => ParamId::LfoWaveform,
            ("lfo", "rate") => ParamId::LfoRate,
            ("lfo", "depth") => ParamId::LfoDepth,
            ("lfo", "destination") => ParamId::LfoDestination,
            ("lfo", "key_sync") => ParamId::LfoKeySync,
            ("glide", "mode") => ParamId::GlideMode,
            ("glide", "time") => ParamId::GlideTime,
            _ => return Err(format!("unknown param path: {:?}", path)),
        };
        Ok(id)
    }

    fn osc_field(slot: OscSlot, field: &str) -> Result<Self, String> {
        Ok(match field {
            "waveform" => ParamId::OscWaveform(slot),
            "octave" => ParamId::OscOctave(slot),
            "semitone" => ParamId::OscSemitone(slot),
            "detune" => ParamId::OscDetune(slot),
            "level" => ParamId::OscLevel(slot),
            _ => return Err(format!("unknown oscillator field: {:?}", field)),
        })
    }

    fn adsr_field(slot: AdsrSlot, field: &str) -> Result<Self, String> {
        Ok(match field {
            "attack" => ParamId::AdsrAttack(slot),
            "decay" => ParamId::AdsrDecay(slot),
            "sustain" => ParamId::AdsrSustain(slot),
            "release" => ParamId::AdsrRelease(slot),
            _ => return Err(format!("unknown envelope field: {:?}", field)),
        })
    }

    fn osc<'a>(patch: &'a mut Patch, slot: OscSlot) -> &'a mut OscillatorParams {
        match slot {
            OscSlot::One => &mut patch.osc1,
            OscSlot::Two => &mut patch.osc2,
            OscSlot::Three => &mut patch.osc3,
        }
    }

    fn adsr<'a>(patch: &'a mut Patch, slot: AdsrSlot) -> &'a mut AdsrParams {
        match slot {
            AdsrSlot::Filter => &mut patch.filter_adsr,
            AdsrSlot::Amp => &mut patch.amp_adsr,
        }
    }

    fn apply(self, patch: &mut Patch, value: &ParamValue) -> Result<(), String> {
        match self {
            ParamId::OscWaveform(slot) => {
                Self::osc(patch, slot).waveform = parse_waveform(value.as_text()?)?
            }
            ParamId::OscOctave(slot) => Self::osc(patch, slot).octave = value.as_number()? as i32,
            ParamId::OscSemitone(slot) => {
                Self::osc(patch, slot).semitone = value.as_number()? as i32
            }
            ParamId::OscDetune(slot) => Self::osc(patch, slot).detune = value.as_number()?,
            ParamId::OscLevel(slot) => Self::osc(patch, slot).level = value.as_number()?,
            ParamId::NoiseType => patch.noise.noise_type = parse_noise_type(value.as_text()?)?,
            ParamId::NoiseLevel => patch.noise.level = value.as_number()?,
            ParamId::FilterCutoff => patch.filter.cutoff = value.as_number()?,
            ParamId::FilterResonance => patch.filter.resonance = value.as_number()?,
            ParamId::FilterEnvAmount => patch.filter.env_amount = value.as_number()?,
            ParamId::FilterKeyTracking => patch.filter.key_tracking = value.as_number()?,
            ParamId::AdsrAttack(slot) => Self::adsr(patch, slot).attack = value.as_number()?,
            ParamId::AdsrDecay(slot) => Self::adsr(patch, slot).decay = value.as_number()?,
            ParamId::AdsrSustain(slot) => Self::adsr(patch, slot).sustain = value.as_number()?,
            ParamId::AdsrRelease(slot) => Self::adsr(patch, slot).release = value.as_number()?,
            ParamId::LfoWaveform => patch.lfo.waveform = parse_waveform(value.as_text()?)?,
            ParamId::LfoRate => patch.lfo.rate = value.as_number()?,
            ParamId::LfoDepth => patch.lfo.depth = value.as_number()?,
            ParamId::LfoDestination => patch.lfo.destination = parse_lfo_destination(value.as_text()?)?,
            ParamId::LfoKeySync => patch.lfo.key_sync = value.as_bool()?,
            ParamId::GlideMode => patch.glide.mode = parse_glide_mode(value.as_text()?)?,
            ParamId::GlideTime => patch.glide.time = value.as_number()?,
        }
        Ok(())
    }
}

fn parse_waveform(s: &str) -> Result<Waveform, String> {
    match s {
        "sine" => Ok(Waveform::Sine),
        "saw" => Ok(Waveform::Saw),
        "square" => Ok(Waveform::Square),
        "triangle" => Ok(Waveform::Triangle),
        other => Err(format!("unknown waveform: {:?}", other)),
    }
}

fn parse_noise_type(s: &str) -> Result<NoiseType, String> {
    match s {
        "white" => Ok(NoiseType::White),
        "pink" => Ok(NoiseType::Pink),
        other => Err(format!("unknown noise type: {:?}", other)),
    }
}

fn parse_lfo_destination(s: &str) -> Result<LfoDestination, String> {
    match s {
        "filter" => Ok(LfoDestination::Filter),
        "pitch" => Ok(LfoDestination::Pitch),
        "amp" => Ok(LfoDestination::Amp),
        other => Err(format!("unknown lfo destination: {:?}", other)),
    }
}

fn parse_glide_mode(s: &str) -> Result<GlideMode, String> {
    match s {
        "off" => Ok(GlideMode::Off),
        "always" => Ok(GlideMode::Always),
        "legato" => Ok(GlideMode::Legato),
        other => Err(format!("unknown glide mode: {:?}", other)),
    }
}
