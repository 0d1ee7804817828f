use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::JoinHandle,
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    effects::EffectLibrary,
    error::EngineError,
    export::{
        ExportBackend, ExportContext, ExportFormat, ExportJob, ExportMonitor, ExportProgress,
        ExportStatus, QualityPreset, SimulatedExportBackend,
    },
    media::{MediaProbe, StaticMediaProbe},
    model::{
        AudioFxSettings, AudioTrack, AudioTrackKind, Effect, EqSettings, TimelineProperties,
        VideoClip,
    },
    render::{Frame, FrameRenderer, NullRenderer},
    timeline::Timeline,
};

/// Consecutive preview render failures tolerated before the engine parks
/// itself in `Error`.
pub const PREVIEW_FAILURE_LIMIT: u32 = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Idle,
    Initializing,
    Ready,
    Previewing,
    Exporting,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    pub project_name: String,
    pub properties: TimelineProperties,
    pub autosave_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            project_name: "Untitled Project".to_string(),
            properties: TimelineProperties::default(),
            autosave_dir: std::env::temp_dir(),
        }
    }
}

/// Lightweight overview of the loaded project, for status displays.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSummary {
    pub project_name: String,
    pub clip_count: usize,
    pub audio_track_count: usize,
    pub duration_ms: u64,
    pub max_track_in_use: u32,
    pub unsaved_changes: bool,
}

#[derive(Debug)]
struct EngineInner {
    state: EngineState,
    project_id: Uuid,
    config: EngineConfig,
    timeline: Timeline,
    preview_failures: u32,
}

impl EngineInner {
    fn idle() -> Self {
        Self {
            state: EngineState::Idle,
            project_id: Uuid::nil(),
            config: EngineConfig::default(),
            timeline: Timeline::default(),
            preview_failures: 0,
        }
    }
}

/// Operation coordinator for one project. All methods take `&self`: a single
/// mutex guards the timeline and state machine, while export progress lives
/// in a lock-free monitor so pollers never contend with editing.
///
/// State checks run before argument validation, so an operation issued in the
/// wrong state reports the state problem even when its arguments are also
/// bad.
pub struct Engine {
    inner: Arc<Mutex<EngineInner>>,
    renderer: Arc<dyn FrameRenderer>,
    backend: Arc<dyn ExportBackend>,
    probe: Arc<dyn MediaProbe>,
    effects: EffectLibrary,
    monitor: Arc<ExportMonitor>,
    cancel: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::with_collaborators(
            Arc::new(NullRenderer),
            Arc::new(SimulatedExportBackend::default()),
            Arc::new(StaticMediaProbe::new()),
        )
    }

    #[must_use]
    pub fn with_collaborators(
        renderer: Arc<dyn FrameRenderer>,
        backend: Arc<dyn ExportBackend>,
        probe: Arc<dyn MediaProbe>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EngineInner::idle())),
            renderer,
            backend,
            probe,
            effects: EffectLibrary,
            monitor: Arc::new(ExportMonitor::default()),
            cancel: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    // ===== Lifecycle =====

    #[instrument(skip(self, config), fields(project_name = %config.project_name))]
    pub fn initialize(&self, config: EngineConfig) -> Result<Uuid, EngineError> {
        let mut inner = self.inner.lock();
        if inner.state != EngineState::Idle {
            return Err(EngineError::InvalidState {
                operation: "initialize",
                state: inner.state,
            });
        }

        inner.state = EngineState::Initializing;
        inner.project_id = Uuid::new_v4();
        inner.timeline = Timeline::new(config.properties);
        inner.config = config;
        inner.preview_failures = 0;
        inner.state = EngineState::Ready;

        info!(project_id = %inner.project_id, "engine initialized");
        Ok(inner.project_id)
    }

    /// Stops any in-flight export, joins the worker, and returns to `Idle`.
    /// Safe to call from any state, including `Error`.
    #[instrument(skip(self))]
    pub fn shutdown(&self) {
        self.cancel.store(true, Ordering::Release);
        self.join_worker();

        let mut inner = self.inner.lock();
        inner.state = EngineState::Idle;
        inner.preview_failures = 0;
        info!("engine shut down");
    }

    #[must_use]
    pub fn state(&self) -> EngineState {
        self.inner.lock().state
    }

    #[must_use]
    pub fn project_id(&self) -> Option<Uuid> {
        let inner = self.inner.lock();
        (inner.state != EngineState::Idle).then_some(inner.project_id)
    }

    // ===== Clip operations =====

    /// Probes the source, then places a full-length clip at the given
    /// position. The probe result is captured on the clip so later trim
    /// validation needs no further media access.
    #[instrument(skip(self, name))]
    pub fn add_clip(
        &self,
        name: &str,
        source: &str,
        start_ms: u64,
        track_index: u32,
    ) -> Result<Uuid, EngineError> {
        let mut inner = self.inner.lock();
        ensure_mutable(&inner, "add_clip")?;

        let metadata = self.probe.probe(source)?;
        let clip = VideoClip::new(name, metadata, start_ms, track_index);
        let clip_id = clip.id;
        inner.timeline.add_clip(clip)?;

        info!(%clip_id, "clip added");
        Ok(clip_id)
    }

    #[instrument(skip(self), fields(%clip_id))]
    pub fn remove_clip(&self, clip_id: Uuid) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        ensure_mutable(&inner, "remove_clip")?;
        inner.timeline.remove_clip(clip_id)?;
        info!(%clip_id, "clip removed");
        Ok(())
    }

    #[instrument(skip(self), fields(%clip_id, new_start_ms, new_track))]
    pub fn move_clip(
        &self,
        clip_id: Uuid,
        new_start_ms: u64,
        new_track: u32,
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        ensure_mutable(&inner, "move_clip")?;
        inner.timeline.move_clip(clip_id, new_start_ms, new_track)
    }

    #[instrument(skip(self), fields(%clip_id, trim_start_ms, trim_end_ms))]
    pub fn trim_clip(
        &self,
        clip_id: Uuid,
        trim_start_ms: u64,
        trim_end_ms: u64,
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        ensure_mutable(&inner, "trim_clip")?;
        inner.timeline.trim_clip(clip_id, trim_start_ms, trim_end_ms)
    }

    #[instrument(skip(self), fields(%clip_id, speed))]
    pub fn set_clip_speed(&self, clip_id: Uuid, speed: f32) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        ensure_mutable(&inner, "set_clip_speed")?;
        inner.timeline.set_clip_speed(clip_id, speed)
    }

    #[instrument(skip(self), fields(%clip_id, volume))]
    pub fn set_clip_volume(&self, clip_id: Uuid, volume: f32) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        ensure_mutable(&inner, "set_clip_volume")?;
        inner.timeline.set_clip_volume(clip_id, volume)
    }

    #[instrument(skip(self, name), fields(%clip_id))]
    pub fn rename_clip(&self, clip_id: Uuid, name: &str) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        ensure_mutable(&inner, "rename_clip")?;
        inner.timeline.rename_clip(clip_id, name)
    }

    /// Splits at a timeline position strictly inside the clip; returns the
    /// ids of the two halves (the first keeps the original id).
    #[instrument(skip(self), fields(%clip_id, at_ms))]
    pub fn split_clip(&self, clip_id: Uuid, at_ms: u64) -> Result<(Uuid, Uuid), EngineError> {
        let mut inner = self.inner.lock();
        ensure_mutable(&inner, "split_clip")?;
        let halves = inner.timeline.split_clip(clip_id, at_ms)?;
        info!(first = %halves.0, second = %halves.1, "clip split");
        Ok(halves)
    }

    pub fn select_clip(&self, clip_id: Uuid) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        ensure_initialized(&inner)?;
        inner.timeline.select_clip(clip_id)
    }

    pub fn clear_selection(&self) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        ensure_initialized(&inner)?;
        inner.timeline.clear_selection();
        Ok(())
    }

    pub fn selected_clip(&self) -> Option<Uuid> {
        self.inner.lock().timeline.selected_clip()
    }

    pub fn clip(&self, clip_id: Uuid) -> Result<VideoClip, EngineError> {
        let inner = self.inner.lock();
        ensure_initialized(&inner)?;
        inner
            .timeline
            .clip(clip_id)
            .cloned()
            .ok_or(EngineError::ClipNotFound(clip_id))
    }

    pub fn clips_at(&self, time_ms: u64) -> Result<Vec<VideoClip>, EngineError> {
        let inner = self.inner.lock();
        ensure_initialized(&inner)?;
        Ok(inner
            .timeline
            .clips_at(time_ms)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn clips_on_track(&self, track_index: u32) -> Result<Vec<VideoClip>, EngineError> {
        let inner = self.inner.lock();
        ensure_initialized(&inner)?;
        Ok(inner
            .timeline
            .clips_on_track(track_index)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.inner.lock().timeline.total_duration_ms()
    }

    /// Full copy of the timeline, for inspection and headless tooling.
    #[must_use]
    pub fn snapshot(&self) -> Timeline {
        self.inner.lock().timeline.clone()
    }

    // ===== Effects =====

    #[must_use]
    pub fn available_effects(&self) -> Vec<Effect> {
        self.effects.available_effects()
    }

    /// Instantiates a catalogue effect by display name and appends it to the
    /// clip's chain.
    #[instrument(skip(self), fields(%clip_id, type_name))]
    pub fn apply_effect(&self, clip_id: Uuid, type_name: &str) -> Result<Uuid, EngineError> {
        let mut inner = self.inner.lock();
        ensure_mutable(&inner, "apply_effect")?;

        let effect = self.effects.create_effect(type_name)?;
        let effect_id = effect.id;
        inner.timeline.clip_mut(clip_id)?.effects.push(effect);

        info!(%effect_id, "effect applied");
        Ok(effect_id)
    }

    #[instrument(skip(self), fields(%clip_id, %effect_id))]
    pub fn remove_effect(&self, clip_id: Uuid, effect_id: Uuid) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        ensure_mutable(&inner, "remove_effect")?;
        ensure_effect_exists(&inner, clip_id, effect_id)?;

        inner.timeline.clip_mut(clip_id)?.effects.remove(effect_id);
        Ok(())
    }

    pub fn set_effect_intensity(
        &self,
        clip_id: Uuid,
        effect_id: Uuid,
        intensity: f32,
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        ensure_mutable(&inner, "set_effect_intensity")?;
        ensure_effect_exists(&inner, clip_id, effect_id)?;

        let clip = inner.timeline.clip_mut(clip_id)?;
        if let Some(effect) = clip.effects.get_mut(effect_id) {
            effect.set_intensity(intensity);
        }
        Ok(())
    }

    pub fn set_effect_enabled(
        &self,
        clip_id: Uuid,
        effect_id: Uuid,
        enabled: bool,
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        ensure_mutable(&inner, "set_effect_enabled")?;
        ensure_effect_exists(&inner, clip_id, effect_id)?;

        let clip = inner.timeline.clip_mut(clip_id)?;
        if let Some(effect) = clip.effects.get_mut(effect_id) {
            effect.enabled = enabled;
        }
        Ok(())
    }

    /// Sets one named parameter, clamped to its declared range. The parameter
    /// must already exist on the effect.
    #[instrument(skip(self), fields(%clip_id, %effect_id, parameter, value))]
    pub fn set_effect_parameter(
        &self,
        clip_id: Uuid,
        effect_id: Uuid,
        parameter: &str,
        value: f32,
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        ensure_mutable(&inner, "set_effect_parameter")?;
        ensure_effect_exists(&inner, clip_id, effect_id)?;

        let known = inner
            .timeline
            .clip(clip_id)
            .and_then(|clip| {
                clip.effects
                    .effects()
                    .iter()
                    .find(|effect| effect.id == effect_id)
            })
            .is_some_and(|effect| effect.parameter(parameter).is_some());
        if !known {
            return Err(EngineError::InvalidRange(format!(
                "effect {effect_id} has no parameter named {parameter}"
            )));
        }

        let clip = inner.timeline.clip_mut(clip_id)?;
        if let Some(effect) = clip.effects.get_mut(effect_id) {
            effect.set_parameter(parameter, value);
        }
        Ok(())
    }

    // ===== Audio tracks =====

    #[instrument(skip(self, name), fields(kind = ?kind))]
    pub fn add_audio_track(&self, name: &str, kind: AudioTrackKind) -> Result<Uuid, EngineError> {
        let mut inner = self.inner.lock();
        ensure_mutable(&inner, "add_audio_track")?;
        let track_id = inner.timeline.add_audio_track(AudioTrack::new(name, kind));
        info!(%track_id, "audio track added");
        Ok(track_id)
    }

    #[instrument(skip(self), fields(%track_id))]
    pub fn remove_audio_track(&self, track_id: Uuid) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        ensure_mutable(&inner, "remove_audio_track")?;
        ensure_track_unlocked(&inner, track_id)?;
        inner.timeline.remove_audio_track(track_id)?;
        info!(%track_id, "audio track removed");
        Ok(())
    }

    /// Resolves the source through the media probe and attaches it to the
    /// track, adopting the probed duration.
    #[instrument(skip(self), fields(%track_id, source))]
    pub fn set_track_source(&self, track_id: Uuid, source: &str) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        ensure_mutable(&inner, "set_track_source")?;
        ensure_track_unlocked(&inner, track_id)?;

        let metadata = self.probe.probe(source)?;
        let track = inner.timeline.audio_track_mut(track_id)?;
        track.source_file = Some(metadata.path);
        track.duration_ms = metadata.duration_ms;
        track.touch();
        Ok(())
    }

    pub fn set_track_volume(&self, track_id: Uuid, volume: f32) -> Result<(), EngineError> {
        self.edit_track(track_id, "set_track_volume", |track| track.set_volume(volume))
    }

    pub fn set_track_pan(&self, track_id: Uuid, pan: f32) -> Result<(), EngineError> {
        self.edit_track(track_id, "set_track_pan", |track| track.set_pan(pan))
    }

    pub fn set_track_muted(&self, track_id: Uuid, muted: bool) -> Result<(), EngineError> {
        self.edit_track(track_id, "set_track_muted", |track| {
            track.muted = muted;
            track.touch();
        })
    }

    pub fn set_track_solo(&self, track_id: Uuid, solo: bool) -> Result<(), EngineError> {
        self.edit_track(track_id, "set_track_solo", |track| {
            track.solo = solo;
            track.touch();
        })
    }

    pub fn set_track_enabled(&self, track_id: Uuid, enabled: bool) -> Result<(), EngineError> {
        self.edit_track(track_id, "set_track_enabled", |track| {
            track.enabled = enabled;
            track.touch();
        })
    }

    pub fn set_track_eq(&self, track_id: Uuid, eq: EqSettings) -> Result<(), EngineError> {
        self.edit_track(track_id, "set_track_eq", |track| track.set_eq(eq))
    }

    pub fn set_track_fx(&self, track_id: Uuid, fx: AudioFxSettings) -> Result<(), EngineError> {
        self.edit_track(track_id, "set_track_fx", |track| track.set_fx(fx))
    }

    /// Locking is the one track edit allowed while the track is locked,
    /// otherwise nothing could ever unlock it.
    pub fn set_track_locked(&self, track_id: Uuid, locked: bool) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        ensure_mutable(&inner, "set_track_locked")?;
        let track = inner.timeline.audio_track_mut(track_id)?;
        track.locked = locked;
        track.touch();
        Ok(())
    }

    pub fn is_track_audible(&self, track_id: Uuid) -> Result<bool, EngineError> {
        let inner = self.inner.lock();
        ensure_initialized(&inner)?;
        inner
            .timeline
            .is_track_audible(track_id)
            .ok_or(EngineError::TrackNotFound(track_id))
    }

    pub fn audio_track(&self, track_id: Uuid) -> Result<AudioTrack, EngineError> {
        let inner = self.inner.lock();
        ensure_initialized(&inner)?;
        inner
            .timeline
            .audio_track(track_id)
            .cloned()
            .ok_or(EngineError::TrackNotFound(track_id))
    }

    fn edit_track(
        &self,
        track_id: Uuid,
        operation: &'static str,
        edit: impl FnOnce(&mut AudioTrack),
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        ensure_mutable(&inner, operation)?;
        ensure_track_unlocked(&inner, track_id)?;
        edit(inner.timeline.audio_track_mut(track_id)?);
        Ok(())
    }

    // ===== Preview =====

    #[instrument(skip(self))]
    pub fn start_preview(&self) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        ensure_initialized(&inner)?;
        if inner.state != EngineState::Ready {
            return Err(EngineError::InvalidState {
                operation: "start_preview",
                state: inner.state,
            });
        }
        inner.state = EngineState::Previewing;
        debug!("preview started");
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn stop_preview(&self) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        if inner.state != EngineState::Previewing {
            return Err(EngineError::InvalidState {
                operation: "stop_preview",
                state: inner.state,
            });
        }
        inner.state = EngineState::Ready;
        debug!("preview stopped");
        Ok(())
    }

    /// Moves the preview cursor, clamped to the timeline duration.
    pub fn seek_preview(&self, time_ms: u64) -> Result<u64, EngineError> {
        let mut inner = self.inner.lock();
        ensure_initialized(&inner)?;
        inner.timeline.set_cursor_ms(time_ms);
        Ok(inner.timeline.cursor_ms())
    }

    #[must_use]
    pub fn preview_cursor_ms(&self) -> u64 {
        self.inner.lock().timeline.cursor_ms()
    }

    /// Renders the frame at the preview cursor. Rendering happens on a clone
    /// taken under the lock, so editing never blocks behind a slow renderer.
    /// After `PREVIEW_FAILURE_LIMIT` consecutive failures the engine moves to
    /// `Error`; any success resets the count.
    #[instrument(skip(self))]
    pub fn preview_frame(&self) -> Result<Frame, EngineError> {
        let (snapshot, cursor_ms) = {
            let inner = self.inner.lock();
            if inner.state != EngineState::Previewing {
                return Err(EngineError::InvalidState {
                    operation: "preview_frame",
                    state: inner.state,
                });
            }
            (inner.timeline.clone(), inner.timeline.cursor_ms())
        };

        match self.renderer.render_frame(&snapshot, cursor_ms) {
            Ok(frame) => {
                self.inner.lock().preview_failures = 0;
                Ok(frame)
            }
            Err(error) => {
                let mut inner = self.inner.lock();
                inner.preview_failures += 1;
                warn!(
                    failures = inner.preview_failures,
                    %error,
                    "preview render failed"
                );
                if inner.preview_failures >= PREVIEW_FAILURE_LIMIT {
                    inner.state = EngineState::Error;
                    warn!("preview failure limit reached, engine moved to error state");
                }
                Err(error)
            }
        }
    }

    // ===== Export =====

    /// Snapshots the timeline under the lock and hands it to the export
    /// backend on a worker thread. Rejected with `AlreadyExporting` while a
    /// previous export is still running.
    #[instrument(
        skip(self),
        fields(destination = %destination.display(), format = ?format, quality = ?quality)
    )]
    pub fn start_export(
        &self,
        destination: &Path,
        format: ExportFormat,
        quality: QualityPreset,
    ) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        match inner.state {
            EngineState::Exporting => return Err(EngineError::AlreadyExporting),
            EngineState::Ready => {}
            EngineState::Idle | EngineState::Initializing => {
                return Err(EngineError::NotInitialized);
            }
            state => {
                return Err(EngineError::InvalidState {
                    operation: "start_export",
                    state,
                });
            }
        }

        let job = ExportJob::new(destination, format, quality)?;
        let snapshot = inner.timeline.clone();
        inner.state = EngineState::Exporting;
        drop(inner);

        // The previous worker, if any, has already reached a terminal status
        // or we would still be in Exporting.
        self.join_worker();
        self.cancel.store(false, Ordering::Release);
        self.monitor.begin();

        let backend = Arc::clone(&self.backend);
        let shared = Arc::clone(&self.inner);
        let monitor = Arc::clone(&self.monitor);
        let cancel = Arc::clone(&self.cancel);
        let ctx = ExportContext::new(Arc::clone(&monitor), Arc::clone(&cancel));

        let handle = std::thread::spawn(move || {
            let result = backend.run(&snapshot, &job, &ctx);
            let status = match &result {
                Err(_) => ExportStatus::Failed,
                Ok(()) if cancel.load(Ordering::Acquire) => ExportStatus::Cancelled,
                Ok(()) => ExportStatus::Completed,
            };
            monitor.finish(status, result.err().map(|error| error.to_string()));

            let mut inner = shared.lock();
            if inner.state == EngineState::Exporting {
                inner.state = if status == ExportStatus::Failed {
                    EngineState::Error
                } else {
                    EngineState::Ready
                };
            }
            info!(?status, "export finished");
        });
        *self.worker.lock() = Some(handle);

        info!("export started");
        Ok(())
    }

    /// Signals the worker to stop at the next frame boundary. Returns true if
    /// a running export was signalled; cancelling a finished or absent export
    /// is a no-op.
    pub fn cancel_export(&self) -> bool {
        if self.monitor.snapshot().status == ExportStatus::Running {
            self.cancel.store(true, Ordering::Release);
            info!("export cancellation requested");
            true
        } else {
            false
        }
    }

    /// Non-blocking: reads the monitor atomics without taking the engine
    /// lock.
    #[must_use]
    pub fn export_progress(&self) -> ExportProgress {
        self.monitor.snapshot()
    }

    #[must_use]
    pub fn export_failure_detail(&self) -> Option<String> {
        self.monitor.detail()
    }

    /// Blocks until the current export worker, if any, has finished.
    pub fn wait_for_export(&self) {
        self.join_worker();
    }

    fn join_worker(&self) {
        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                warn!("export worker panicked");
            }
        }
    }

    // ===== Project persistence =====

    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn save_project(&self, path: &Path) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        ensure_initialized(&inner)?;
        crate::persistence::save_project(path, &inner.timeline, &inner.config)?;
        inner.timeline.mark_saved();
        info!("project saved");
        Ok(())
    }

    /// Deserializes, validates, and only then replaces the current timeline.
    /// A corrupt or invariant-violating file leaves the engine untouched.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn load_project(&self, path: &Path) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        ensure_mutable(&inner, "load_project")?;

        let (timeline, config) = crate::persistence::load_project(path)?;
        inner.timeline = timeline;
        inner.config = config;
        inner.timeline.mark_saved();
        info!("project loaded");
        Ok(())
    }

    /// Writes a recovery copy next to the configured autosave directory. The
    /// dirty flag is left as-is: an autosave is not a user save.
    #[instrument(skip(self))]
    pub fn autosave(&self) -> Result<PathBuf, EngineError> {
        let inner = self.inner.lock();
        ensure_initialized(&inner)?;
        let path = inner
            .config
            .autosave_dir
            .join(format!("{}.autosave.clipforge.json", inner.project_id));
        crate::persistence::save_project(&path, &inner.timeline, &inner.config)?;
        debug!(path = %path.display(), "autosave written");
        Ok(path)
    }

    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.inner.lock().timeline.is_dirty()
    }

    #[must_use]
    pub fn summary(&self) -> ProjectSummary {
        let inner = self.inner.lock();
        ProjectSummary {
            project_name: inner.config.project_name.clone(),
            clip_count: inner.timeline.clip_count(),
            audio_track_count: inner.timeline.audio_tracks().len(),
            duration_ms: inner.timeline.total_duration_ms(),
            max_track_in_use: inner.timeline.max_track_in_use(),
            unsaved_changes: inner.timeline.is_dirty(),
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Release);
        self.join_worker();
    }
}

fn ensure_initialized(inner: &EngineInner) -> Result<(), EngineError> {
    match inner.state {
        EngineState::Idle | EngineState::Initializing => Err(EngineError::NotInitialized),
        _ => Ok(()),
    }
}

/// Timeline mutations are allowed while editing or previewing; an in-flight
/// export works from its own snapshot, but edits are still rejected so the
/// saved project cannot drift from what the export observes.
fn ensure_mutable(inner: &EngineInner, operation: &'static str) -> Result<(), EngineError> {
    match inner.state {
        EngineState::Ready | EngineState::Previewing => Ok(()),
        EngineState::Idle | EngineState::Initializing => Err(EngineError::NotInitialized),
        state => Err(EngineError::InvalidState { operation, state }),
    }
}

fn ensure_track_unlocked(inner: &EngineInner, track_id: Uuid) -> Result<(), EngineError> {
    let track = inner
        .timeline
        .audio_track(track_id)
        .ok_or(EngineError::TrackNotFound(track_id))?;
    if track.locked {
        return Err(EngineError::TrackLocked(track_id));
    }
    Ok(())
}

fn ensure_effect_exists(
    inner: &EngineInner,
    clip_id: Uuid,
    effect_id: Uuid,
) -> Result<(), EngineError> {
    let clip = inner
        .timeline
        .clip(clip_id)
        .ok_or(EngineError::ClipNotFound(clip_id))?;
    if clip
        .effects
        .effects()
        .iter()
        .any(|effect| effect.id == effect_id)
    {
        Ok(())
    } else {
        Err(EngineError::EffectNotFound(effect_id))
    }
}
