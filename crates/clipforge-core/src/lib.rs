pub mod diagnostics;
pub mod effects;
pub mod engine;
pub mod error;
pub mod export;
pub mod fixtures;
pub mod media;
pub mod model;
pub mod persistence;
pub mod registry;
pub mod render;
pub mod timeline;

pub use diagnostics::{
    TelemetryGuard, init_tracing, init_tracing_with_file_prefix, init_tracing_with_options,
};
pub use effects::EffectLibrary;
pub use engine::{
    Engine, EngineConfig, EngineState, PREVIEW_FAILURE_LIMIT, ProjectSummary,
};
pub use error::EngineError;
pub use export::{
    ExportBackend, ExportContext, ExportFormat, ExportJob, ExportMonitor, ExportProgress,
    ExportStatus, QualityPreset, SimulatedExportBackend,
};
pub use media::{MediaProbe, StaticMediaProbe};
pub use model::{
    AudioFxSettings, AudioTrack, AudioTrackKind, Effect, EffectChain, EffectKind, EffectParameter,
    EqSettings, MAX_CLIP_SPEED, MAX_CLIP_VOLUME, MIN_CLIP_SPEED, MIN_CLIP_VOLUME, SourceMetadata,
    TimelineProperties, VideoClip,
};
pub use registry::{EngineHandle, EngineRegistry};
pub use render::{Frame, FrameRenderer, NullRenderer};
pub use timeline::Timeline;
