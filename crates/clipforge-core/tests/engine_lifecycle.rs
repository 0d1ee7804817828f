use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use clipforge_core::{
    EngineError, EngineState, Frame, FrameRenderer, PREVIEW_FAILURE_LIMIT, Timeline,
    engine::{Engine, EngineConfig},
    export::{ExportFormat, QualityPreset, SimulatedExportBackend},
    fixtures::{demo_engine, demo_probe},
};

/// Renderer whose behaviour is toggled from the test: fails while the flag
/// is up, renders a blank frame otherwise.
struct SwitchableRenderer {
    failing: Arc<AtomicBool>,
}

impl FrameRenderer for SwitchableRenderer {
    fn render_frame(&self, snapshot: &Timeline, _time_ms: u64) -> Result<Frame, EngineError> {
        if self.failing.load(Ordering::Acquire) {
            Err(EngineError::Render("decoder stalled".to_string()))
        } else {
            Ok(Frame::blank(
                snapshot.properties.width,
                snapshot.properties.height,
            ))
        }
    }
}

#[test]
fn uninitialized_engine_rejects_operations() {
    let engine = Engine::new();
    assert_eq!(engine.state(), EngineState::Idle);
    assert!(engine.project_id().is_none());

    assert!(matches!(
        engine.add_clip("clip", "media/beach.mp4", 0, 0),
        Err(EngineError::NotInitialized)
    ));
    assert!(matches!(
        engine.save_project(std::path::Path::new("out.json")),
        Err(EngineError::NotInitialized)
    ));
    // The state problem is reported even though the arguments are also bad.
    assert!(matches!(
        engine.start_export(
            std::path::Path::new(""),
            ExportFormat::Mp4,
            QualityPreset::Low
        ),
        Err(EngineError::NotInitialized)
    ));
}

#[test]
fn initialize_then_edit_then_shutdown() {
    let engine = Engine::with_collaborators(
        Arc::new(clipforge_core::NullRenderer),
        Arc::new(SimulatedExportBackend::default()),
        Arc::new(demo_probe()),
    );
    let project_id = engine.initialize(EngineConfig::default()).expect("init");
    assert_eq!(engine.state(), EngineState::Ready);
    assert_eq!(engine.project_id(), Some(project_id));

    let clip_id = engine
        .add_clip("Beach opener", "media/beach.mp4", 0, 0)
        .expect("probe resolves and clip places");
    assert_eq!(engine.total_duration_ms(), 12_000);
    assert!(engine.has_unsaved_changes());

    engine.select_clip(clip_id).expect("select");
    assert_eq!(engine.selected_clip(), Some(clip_id));

    engine.shutdown();
    assert_eq!(engine.state(), EngineState::Idle);
    assert!(engine.project_id().is_none());
}

#[test]
fn unknown_source_is_rejected_by_the_probe() {
    let engine = demo_engine();
    let error = engine
        .add_clip("clip", "media/missing.mp4", 0, 0)
        .expect_err("unregistered source");
    assert!(matches!(error, EngineError::SourceNotFound(path) if path == "media/missing.mp4"));
}

#[test]
fn preview_transitions_and_editing_while_previewing() {
    let engine = demo_engine();

    assert!(matches!(
        engine.stop_preview(),
        Err(EngineError::InvalidState {
            operation: "stop_preview",
            ..
        })
    ));

    engine.start_preview().expect("Ready -> Previewing");
    assert_eq!(engine.state(), EngineState::Previewing);
    assert!(matches!(
        engine.start_preview(),
        Err(EngineError::InvalidState { .. })
    ));

    // Edits are allowed mid-preview.
    engine
        .add_clip("Insert", "media/title.mp4", 40_000, 0)
        .expect("edit during preview");

    let position = engine.seek_preview(1_000_000).expect("seek clamps");
    assert_eq!(position, engine.total_duration_ms());

    let frame = engine.preview_frame().expect("null renderer frame");
    assert_eq!((frame.width, frame.height), (1920, 1080));

    engine.stop_preview().expect("Previewing -> Ready");
    assert_eq!(engine.state(), EngineState::Ready);
}

#[test]
fn repeated_render_failures_park_the_engine_in_error() {
    let failing = Arc::new(AtomicBool::new(false));
    let engine = Engine::with_collaborators(
        Arc::new(SwitchableRenderer {
            failing: Arc::clone(&failing),
        }),
        Arc::new(SimulatedExportBackend::default()),
        Arc::new(demo_probe()),
    );
    engine.initialize(EngineConfig::default()).expect("init");
    engine
        .add_clip("Beach opener", "media/beach.mp4", 0, 0)
        .expect("add clip");
    engine.start_preview().expect("preview");

    // A success between failures resets the consecutive count.
    failing.store(true, Ordering::Release);
    for _ in 0..PREVIEW_FAILURE_LIMIT - 1 {
        assert!(engine.preview_frame().is_err());
    }
    failing.store(false, Ordering::Release);
    engine.preview_frame().expect("recovered frame");
    assert_eq!(engine.state(), EngineState::Previewing);

    failing.store(true, Ordering::Release);
    for _ in 0..PREVIEW_FAILURE_LIMIT {
        assert!(engine.preview_frame().is_err());
    }
    assert_eq!(engine.state(), EngineState::Error);

    // Everything except shutdown is refused from Error.
    assert!(matches!(
        engine.add_clip("clip", "media/city.mp4", 50_000, 0),
        Err(EngineError::InvalidState {
            state: EngineState::Error,
            ..
        })
    ));

    // Shutdown is the way out of Error, after which a fresh project can
    // be initialized.
    engine.shutdown();
    assert_eq!(engine.state(), EngineState::Idle);
    failing.store(false, Ordering::Release);
    engine.initialize(EngineConfig::default()).expect("re-init");
    assert_eq!(engine.state(), EngineState::Ready);
}

#[test]
fn locked_track_refuses_edits_until_unlocked() {
    use clipforge_core::model::AudioTrackKind;

    let engine = demo_engine();
    let track_id = engine
        .add_audio_track("Ambience", AudioTrackKind::Sfx)
        .expect("add track");

    engine.set_track_locked(track_id, true).expect("lock");
    assert!(matches!(
        engine.set_track_volume(track_id, 0.5),
        Err(EngineError::TrackLocked(id)) if id == track_id
    ));
    assert!(matches!(
        engine.remove_audio_track(track_id),
        Err(EngineError::TrackLocked(_))
    ));

    engine.set_track_locked(track_id, false).expect("unlock");
    engine.set_track_volume(track_id, 0.5).expect("edit after unlock");
    engine.remove_audio_track(track_id).expect("remove after unlock");
}

#[test]
fn effect_operations_validate_both_ids() {
    let engine = demo_engine();
    let clip_id = engine.snapshot().clips()[0].id;

    let effect_id = engine
        .apply_effect(clip_id, "Brightness")
        .expect("catalogue effect");
    engine
        .set_effect_parameter(clip_id, effect_id, "brightness", 0.4)
        .expect("known parameter");

    assert!(matches!(
        engine.apply_effect(clip_id, "Hologram"),
        Err(EngineError::UnknownEffectType(_))
    ));
    assert!(matches!(
        engine.set_effect_parameter(clip_id, effect_id, "warmth", 0.4),
        Err(EngineError::InvalidRange(_))
    ));
    assert!(matches!(
        engine.remove_effect(clip_id, uuid::Uuid::new_v4()),
        Err(EngineError::EffectNotFound(_))
    ));

    engine.remove_effect(clip_id, effect_id).expect("remove");
    assert!(engine
        .clip(clip_id)
        .expect("clip")
        .effects
        .is_empty());
}
