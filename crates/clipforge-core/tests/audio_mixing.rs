use clipforge_core::{
    EngineError,
    fixtures::demo_engine,
    model::{AudioFxSettings, AudioTrackKind, EqSettings},
};

#[test]
fn solo_audibility_is_derived_not_stored() {
    let engine = demo_engine();
    let music = engine
        .add_audio_track("Music", AudioTrackKind::Music)
        .expect("music");
    let voice = engine
        .add_audio_track("VO", AudioTrackKind::Voiceover)
        .expect("voice");

    assert!(engine.is_track_audible(music).expect("music audible"));
    assert!(engine.is_track_audible(voice).expect("voice audible"));

    engine.set_track_solo(voice, true).expect("solo voice");
    assert!(!engine.is_track_audible(music).expect("music silenced"));
    assert!(engine.is_track_audible(voice).expect("voice audible"));

    // The mute flag on the silenced track was never touched.
    assert!(!engine.audio_track(music).expect("music").muted);

    engine.set_track_solo(voice, false).expect("unsolo");
    assert!(engine.is_track_audible(music).expect("music restored"));
}

#[test]
fn muted_and_disabled_tracks_are_silent() {
    let engine = demo_engine();
    let track = engine
        .add_audio_track("Sfx", AudioTrackKind::Sfx)
        .expect("sfx");

    engine.set_track_muted(track, true).expect("mute");
    assert!(!engine.is_track_audible(track).expect("muted"));
    engine.set_track_muted(track, false).expect("unmute");

    engine.set_track_enabled(track, false).expect("disable");
    assert!(!engine.is_track_audible(track).expect("disabled"));

    // A disabled track is silent even when soloed.
    engine.set_track_solo(track, true).expect("solo");
    assert!(!engine.is_track_audible(track).expect("still silent"));
}

#[test]
fn mix_parameters_clamp_to_their_ranges() {
    let engine = demo_engine();
    let track = engine
        .add_audio_track("Music", AudioTrackKind::Music)
        .expect("music");

    engine.set_track_volume(track, 9.0).expect("volume");
    engine.set_track_pan(track, -3.0).expect("pan");
    engine
        .set_track_eq(
            track,
            EqSettings {
                bass: 2.0,
                mid: -2.0,
                treble: 0.5,
            },
        )
        .expect("eq");
    engine
        .set_track_fx(
            track,
            AudioFxSettings {
                reverb: 1.5,
                compression: 12.0,
                pitch_shift: -20.0,
            },
        )
        .expect("fx");

    let track = engine.audio_track(track).expect("track");
    assert_eq!(track.volume, 2.0);
    assert_eq!(track.pan, -1.0);
    assert_eq!((track.eq.bass, track.eq.mid, track.eq.treble), (1.0, -1.0, 0.5));
    assert_eq!(track.fx.reverb, 1.0);
    assert_eq!(track.fx.compression, 8.0);
    assert_eq!(track.fx.pitch_shift, -12.0);
}

#[test]
fn clip_volume_rejects_out_of_range_values() {
    let engine = demo_engine();
    let clip_id = engine.snapshot().clips()[0].id;

    let error = engine.set_clip_volume(clip_id, 2.5).expect_err("above max");
    assert!(matches!(error, EngineError::InvalidRange(_)));
    assert_eq!(engine.clip(clip_id).expect("clip").volume, 1.0);

    engine.set_clip_volume(clip_id, 1.8).expect("in range");
    assert_eq!(engine.clip(clip_id).expect("clip").volume, 1.8);
}

#[test]
fn track_source_is_resolved_through_the_probe() {
    let engine = demo_engine();
    let track = engine
        .add_audio_track("Score", AudioTrackKind::Music)
        .expect("track");

    let error = engine
        .set_track_source(track, "media/missing.wav")
        .expect_err("unknown source");
    assert!(matches!(error, EngineError::SourceNotFound(_)));

    engine
        .set_track_source(track, "media/score.wav")
        .expect("registered source");
    let track = engine.audio_track(track).expect("track");
    assert_eq!(track.duration_ms, 45_000);
}
