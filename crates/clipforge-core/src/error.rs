use thiserror::Error;
use uuid::Uuid;

use crate::engine::EngineState;

/// Typed error surface shared by the timeline and the engine. Validation
/// errors are raised before any mutation; a failed operation never leaves
/// partially applied state behind.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine not initialized")]
    NotInitialized,
    #[error("operation {operation} not allowed in state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: EngineState,
    },
    #[error("clip not found: {0}")]
    ClipNotFound(Uuid),
    #[error("audio track not found: {0}")]
    TrackNotFound(Uuid),
    #[error("effect not found: {0}")]
    EffectNotFound(Uuid),
    #[error("media source not found: {0}")]
    SourceNotFound(String),
    #[error("clip {clip} overlaps clip {other} on track {track}")]
    Overlap { clip: Uuid, other: Uuid, track: u32 },
    #[error("invalid range: {0}")]
    InvalidRange(String),
    #[error("unknown effect type: {0}")]
    UnknownEffectType(String),
    #[error("invalid export config: {0}")]
    InvalidConfig(String),
    #[error("an export is already in progress")]
    AlreadyExporting,
    #[error("audio track is locked: {0}")]
    TrackLocked(Uuid),
    #[error("failed to deserialize project: {0}")]
    Deserialization(String),
    #[error("render failed: {0}")]
    Render(String),
    #[error("export backend failed: {0}")]
    ExportBackend(String),
    #[error("io error: {0}")]
    Io(String),
}

impl From<anyhow::Error> for EngineError {
    fn from(value: anyhow::Error) -> Self {
        Self::Io(value.to_string())
    }
}
