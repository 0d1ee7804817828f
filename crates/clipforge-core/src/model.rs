use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_WIDTH: u32 = 1920;
pub const DEFAULT_HEIGHT: u32 = 1080;
pub const DEFAULT_FRAME_RATE: f32 = 30.0;

pub const MIN_CLIP_SPEED: f32 = 0.25;
pub const MAX_CLIP_SPEED: f32 = 4.0;
pub const MIN_CLIP_VOLUME: f32 = 0.0;
pub const MAX_CLIP_VOLUME: f32 = 2.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimelineProperties {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f32,
}

impl Default for TimelineProperties {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

impl TimelineProperties {
    #[must_use]
    pub fn frame_interval_ms(&self) -> u64 {
        if self.frame_rate <= 0.0 {
            return 0;
        }
        (1_000.0 / f64::from(self.frame_rate)).round() as u64
    }
}

/// Metadata about a clip's source media, captured from the media probe
/// when the clip is added.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceMetadata {
    pub path: String,
    pub duration_ms: u64,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub codec: String,
}

impl SourceMetadata {
    #[must_use]
    pub fn new(path: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            path: path.into(),
            duration_ms,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            frame_rate: DEFAULT_FRAME_RATE,
            codec: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Vintage,
    BlackWhite,
    Sepia,
    Warm,
    Cool,
    Vivid,
    Brightness,
    Contrast,
    Saturation,
    Temperature,
    Blur,
    Sharpen,
    Vignette,
    Invert,
}

impl EffectKind {
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Vintage => "Vintage",
            Self::BlackWhite => "Black & White",
            Self::Sepia => "Sepia",
            Self::Warm => "Warm",
            Self::Cool => "Cool",
            Self::Vivid => "Vivid",
            Self::Brightness => "Brightness",
            Self::Contrast => "Contrast",
            Self::Saturation => "Saturation",
            Self::Temperature => "Temperature",
            Self::Blur => "Blur",
            Self::Sharpen => "Sharpen",
            Self::Vignette => "Vignette",
            Self::Invert => "Invert",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EffectParameter {
    pub name: String,
    pub value: f32,
    pub min_value: f32,
    pub max_value: f32,
    pub default_value: f32,
}

impl EffectParameter {
    #[must_use]
    pub fn new(name: impl Into<String>, value: f32, min: f32, max: f32, default: f32) -> Self {
        Self {
            name: name.into(),
            value: value.clamp(min, max),
            min_value: min,
            max_value: max,
            default_value: default,
        }
    }

    pub fn set(&mut self, value: f32) {
        self.value = value.clamp(self.min_value, self.max_value);
    }
}

/// A parameterized transformation applied to a clip's output. Identity is
/// immutable and exclusive to one chain slot; parameters are mutable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Effect {
    pub id: Uuid,
    pub kind: EffectKind,
    pub name: String,
    pub parameters: Vec<EffectParameter>,
    pub intensity: f32,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Effect {
    #[must_use]
    pub fn new(kind: EffectKind, parameters: Vec<EffectParameter>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name: kind.display_name().to_string(),
            parameters,
            intensity: 1.0,
            enabled: true,
            created_at: Utc::now(),
        }
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.clamp(0.0, 1.0);
    }

    /// Clamps to the parameter's declared range. Returns false if the
    /// parameter does not exist on this effect.
    pub fn set_parameter(&mut self, name: &str, value: f32) -> bool {
        match self.parameters.iter_mut().find(|param| param.name == name) {
            Some(param) => {
                param.set(value);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<f32> {
        self.parameters
            .iter()
            .find(|param| param.name == name)
            .map(|param| param.value)
    }

    /// Copy with a fresh identity, keeping kind, parameters, and intensity.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            ..self.clone()
        }
    }
}

/// Ordered effects; later effects compose on top of earlier output.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EffectChain {
    effects: Vec<Effect>,
}

impl EffectChain {
    pub fn push(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn remove(&mut self, effect_id: Uuid) -> bool {
        let before = self.effects.len();
        self.effects.retain(|effect| effect.id != effect_id);
        self.effects.len() != before
    }

    #[must_use]
    pub fn get_mut(&mut self, effect_id: Uuid) -> Option<&mut Effect> {
        self.effects.iter_mut().find(|effect| effect.id == effect_id)
    }

    #[must_use]
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Deep copy in which every effect gets a fresh identity.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            effects: self.effects.iter().map(Effect::duplicate).collect(),
        }
    }
}

/// One timeline placement of a source media reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoClip {
    pub id: Uuid,
    pub name: String,
    pub source: SourceMetadata,
    pub start_ms: u64,
    pub track_index: u32,
    pub trim_start_ms: u64,
    pub trim_end_ms: u64,
    pub speed: f32,
    pub volume: f32,
    pub effects: EffectChain,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl VideoClip {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        source: SourceMetadata,
        start_ms: u64,
        track_index: u32,
    ) -> Self {
        let now = Utc::now();
        let trim_end_ms = source.duration_ms;
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            source,
            start_ms,
            track_index,
            trim_start_ms: 0,
            trim_end_ms,
            speed: 1.0,
            volume: 1.0,
            effects: EffectChain::default(),
            created_at: now,
            modified_at: now,
        }
    }

    /// Trimmed span scaled by playback speed, in whole milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        let trimmed = self.trim_end_ms.saturating_sub(self.trim_start_ms);
        (trimmed as f64 / f64::from(self.speed.max(MIN_CLIP_SPEED))).round() as u64
    }

    #[must_use]
    pub fn end_ms(&self) -> u64 {
        self.start_ms.saturating_add(self.duration_ms())
    }

    #[must_use]
    pub fn contains(&self, time_ms: u64) -> bool {
        self.start_ms <= time_ms && time_ms < self.end_ms()
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.clamp(MIN_CLIP_SPEED, MAX_CLIP_SPEED);
        self.touch();
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(MIN_CLIP_VOLUME, MAX_CLIP_VOLUME);
        self.touch();
    }

    pub fn touch(&mut self) {
        self.modified_at = Utc::now();
    }

    #[must_use]
    pub fn trim_is_valid(&self) -> bool {
        self.trim_start_ms < self.trim_end_ms && self.trim_end_ms <= self.source.duration_ms
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AudioTrackKind {
    Main,
    Voiceover,
    Music,
    Sfx,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct EqSettings {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
}

impl EqSettings {
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            bass: self.bass.clamp(-1.0, 1.0),
            mid: self.mid.clamp(-1.0, 1.0),
            treble: self.treble.clamp(-1.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AudioFxSettings {
    pub reverb: f32,
    pub compression: f32,
    pub pitch_shift: f32,
}

impl Default for AudioFxSettings {
    fn default() -> Self {
        Self {
            reverb: 0.0,
            compression: 1.0,
            pitch_shift: 0.0,
        }
    }
}

/// A named audio lane with mix parameters, independent of video clips.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioTrack {
    pub id: Uuid,
    pub name: String,
    pub kind: AudioTrackKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    pub enabled: bool,
    pub muted: bool,
    pub solo: bool,
    pub locked: bool,
    pub volume: f32,
    pub pan: f32,
    pub eq: EqSettings,
    pub fx: AudioFxSettings,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl AudioTrack {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: AudioTrackKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            source_file: None,
            enabled: true,
            muted: false,
            solo: false,
            locked: false,
            volume: 1.0,
            pan: 0.0,
            eq: EqSettings::default(),
            fx: AudioFxSettings::default(),
            duration_ms: 0,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(MIN_CLIP_VOLUME, MAX_CLIP_VOLUME);
        self.touch();
    }

    pub fn set_pan(&mut self, pan: f32) {
        self.pan = pan.clamp(-1.0, 1.0);
        self.touch();
    }

    pub fn set_eq(&mut self, eq: EqSettings) {
        self.eq = eq.clamped();
        self.touch();
    }

    pub fn set_fx(&mut self, fx: AudioFxSettings) {
        self.fx = AudioFxSettings {
            reverb: fx.reverb.clamp(0.0, 1.0),
            compression: fx.compression.clamp(1.0, 8.0),
            pitch_shift: fx.pitch_shift.clamp(-12.0, 12.0),
        };
        self.touch();
    }

    pub fn touch(&mut self) {
        self.modified_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_duration_scales_with_speed() {
        let mut clip = VideoClip::new("clip", SourceMetadata::new("a.mp4", 8_000), 0, 0);
        assert_eq!(clip.duration_ms(), 8_000);

        clip.set_speed(2.0);
        assert_eq!(clip.duration_ms(), 4_000);

        clip.set_speed(0.5);
        assert_eq!(clip.duration_ms(), 16_000);
    }

    #[test]
    fn clip_setters_clamp_to_range() {
        let mut clip = VideoClip::new("clip", SourceMetadata::new("a.mp4", 1_000), 0, 0);
        clip.set_speed(10.0);
        assert_eq!(clip.speed, MAX_CLIP_SPEED);
        clip.set_speed(0.0);
        assert_eq!(clip.speed, MIN_CLIP_SPEED);

        clip.set_volume(5.0);
        assert_eq!(clip.volume, MAX_CLIP_VOLUME);
        clip.set_volume(-1.0);
        assert_eq!(clip.volume, MIN_CLIP_VOLUME);
    }

    #[test]
    fn effect_parameter_set_clamps() {
        let mut effect = Effect::new(
            EffectKind::Brightness,
            vec![EffectParameter::new("brightness", 0.0, -1.0, 1.0, 0.0)],
        );
        assert!(effect.set_parameter("brightness", 3.0));
        assert_eq!(effect.parameter("brightness"), Some(1.0));
        assert!(!effect.set_parameter("missing", 0.1));
    }

    #[test]
    fn chain_duplicate_assigns_fresh_ids() {
        let mut chain = EffectChain::default();
        chain.push(Effect::new(EffectKind::Sepia, Vec::new()));
        let copy = chain.duplicate();
        assert_eq!(copy.len(), 1);
        assert_ne!(copy.effects()[0].id, chain.effects()[0].id);
        assert_eq!(copy.effects()[0].kind, chain.effects()[0].kind);
    }

    #[test]
    fn audio_track_fx_clamped() {
        let mut track = AudioTrack::new("Music", AudioTrackKind::Music);
        track.set_fx(AudioFxSettings {
            reverb: 2.0,
            compression: 0.5,
            pitch_shift: 40.0,
        });
        assert_eq!(track.fx.reverb, 1.0);
        assert_eq!(track.fx.compression, 1.0);
        assert_eq!(track.fx.pitch_shift, 12.0);
    }
}
