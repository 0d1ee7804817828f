//! Deterministic demo content: pinned ids and timestamps so saved output is
//! stable across runs. Used by the CLI demo commands and integration tests.

use chrono::{DateTime, TimeZone, Utc};
use uuid::{Uuid, uuid};

use crate::{
    media::StaticMediaProbe,
    model::{AudioTrack, AudioTrackKind, SourceMetadata, VideoClip},
    timeline::Timeline,
};

pub const BEACH_CLIP_ID: Uuid = uuid!("6f1d4e6a-8a2b-4c1e-9f3d-0b5a7c9e1d2f");
pub const CITY_CLIP_ID: Uuid = uuid!("2b8c0d4f-6e1a-4b3c-8d5e-9f7a1c3e5b0d");
pub const TITLE_CLIP_ID: Uuid = uuid!("9a3e5c7b-1d2f-4a6c-b8e0-3f5d7a9c1e2b");
pub const MUSIC_TRACK_ID: Uuid = uuid!("4c6e8a0b-2d4f-4c6e-8a0b-1d3f5a7c9e0b");
pub const VOICEOVER_TRACK_ID: Uuid = uuid!("7e9a1c3d-5f0b-4d7e-9a1c-2e4f6a8c0d1e");

fn pinned_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 9, 30, 0)
        .single()
        .expect("fixture timestamp should be valid")
}

/// Sources the demo clips reference, pre-registered so `Engine::add_clip`
/// resolves them without touching real media.
#[must_use]
pub fn demo_probe() -> StaticMediaProbe {
    StaticMediaProbe::new()
        .with_source(SourceMetadata::new("media/beach.mp4", 12_000))
        .with_source(SourceMetadata::new("media/city.mp4", 20_000))
        .with_source(SourceMetadata::new("media/title.mp4", 4_000))
        .with_source(SourceMetadata::new("media/score.wav", 45_000))
        .with_source(SourceMetadata::new("media/narration.wav", 30_000))
}

/// Three video clips across two tracks plus two audio lanes. Every id and
/// timestamp is pinned.
#[must_use]
pub fn demo_timeline() -> Timeline {
    let probe = demo_probe();
    let when = pinned_time();
    let mut timeline = Timeline::default();

    let mut beach = VideoClip::new(
        "Beach opener",
        probe_source(&probe, "media/beach.mp4"),
        0,
        0,
    );
    beach.id = BEACH_CLIP_ID;
    beach.created_at = when;
    beach.modified_at = when;
    timeline.add_clip(beach).expect("beach clip placement");

    let mut city = VideoClip::new(
        "City b-roll",
        probe_source(&probe, "media/city.mp4"),
        12_000,
        0,
    );
    city.id = CITY_CLIP_ID;
    city.created_at = when;
    city.modified_at = when;
    timeline.add_clip(city).expect("city clip placement");

    let mut title = VideoClip::new(
        "Title card",
        probe_source(&probe, "media/title.mp4"),
        2_000,
        1,
    );
    title.id = TITLE_CLIP_ID;
    title.created_at = when;
    title.modified_at = when;
    timeline.add_clip(title).expect("title clip placement");

    let mut music = AudioTrack::new("Score", AudioTrackKind::Music);
    music.id = MUSIC_TRACK_ID;
    music.source_file = Some("media/score.wav".to_string());
    music.duration_ms = 45_000;
    music.volume = 0.6;
    music.created_at = when;
    music.modified_at = when;
    timeline.add_audio_track(music);

    let mut voiceover = AudioTrack::new("Narration", AudioTrackKind::Voiceover);
    voiceover.id = VOICEOVER_TRACK_ID;
    voiceover.source_file = Some("media/narration.wav".to_string());
    voiceover.duration_ms = 30_000;
    voiceover.created_at = when;
    voiceover.modified_at = when;
    timeline.add_audio_track(voiceover);

    timeline
}

/// An initialized engine wired to the demo probe, with the demo clips and
/// tracks built through the normal operation surface. Ids here are freshly
/// generated; use [`demo_timeline`] when pinned ids matter.
#[must_use]
pub fn demo_engine() -> crate::engine::Engine {
    use std::sync::Arc;

    use crate::{
        engine::{Engine, EngineConfig},
        export::SimulatedExportBackend,
        model::AudioTrackKind,
        render::NullRenderer,
    };

    let engine = Engine::with_collaborators(
        Arc::new(NullRenderer),
        Arc::new(SimulatedExportBackend::default()),
        Arc::new(demo_probe()),
    );
    engine
        .initialize(EngineConfig::default())
        .expect("fresh engine initializes");
    engine
        .add_clip("Beach opener", "media/beach.mp4", 0, 0)
        .expect("beach clip placement");
    engine
        .add_clip("City b-roll", "media/city.mp4", 12_000, 0)
        .expect("city clip placement");
    engine
        .add_clip("Title card", "media/title.mp4", 2_000, 1)
        .expect("title clip placement");
    let music = engine
        .add_audio_track("Score", AudioTrackKind::Music)
        .expect("music track");
    engine
        .set_track_source(music, "media/score.wav")
        .expect("music source");
    engine.set_track_volume(music, 0.6).expect("music volume");
    let voiceover = engine
        .add_audio_track("Narration", AudioTrackKind::Voiceover)
        .expect("voiceover track");
    engine
        .set_track_source(voiceover, "media/narration.wav")
        .expect("voiceover source");
    engine
}

fn probe_source(probe: &StaticMediaProbe, path: &str) -> SourceMetadata {
    use crate::media::MediaProbe;
    probe.probe(path).expect("demo source registered")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_timeline_is_structurally_valid() {
        let timeline = demo_timeline();
        assert_eq!(timeline.clip_count(), 3);
        assert_eq!(timeline.audio_tracks().len(), 2);
        assert!(timeline.validate().is_ok());
        assert_eq!(timeline.total_duration_ms(), 32_000);
    }

    #[test]
    fn demo_ids_are_stable() {
        let first = demo_timeline();
        let second = demo_timeline();
        assert_eq!(
            first.clip(BEACH_CLIP_ID).map(|clip| clip.name.clone()),
            second.clip(BEACH_CLIP_ID).map(|clip| clip.name.clone())
        );
    }
}
