use std::{io::Write, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{engine::EngineConfig, error::EngineError, timeline::Timeline};

pub const SCHEMA_VERSION: u32 = 1;

/// On-disk project file: the timeline's durable fields plus the engine
/// configuration, under a schema version gate. Volatile state (cursor,
/// selection, dirty flag) never reaches disk.
#[derive(Debug, Serialize, Deserialize)]
struct ProjectDocument {
    schema_version: u32,
    #[serde(flatten)]
    timeline: Timeline,
    config: EngineConfig,
}

/// Serializes the project as pretty JSON and writes it atomically: the bytes
/// land in a temp file in the destination directory which is then renamed
/// over the target, so a crash mid-write cannot truncate an existing save.
#[instrument(skip(timeline, config), fields(path = %path.display()))]
pub fn save_project(
    path: &Path,
    timeline: &Timeline,
    config: &EngineConfig,
) -> Result<(), EngineError> {
    let document = ProjectDocument {
        schema_version: SCHEMA_VERSION,
        timeline: timeline.clone(),
        config: config.clone(),
    };
    let json = serde_json::to_vec_pretty(&document)
        .context("serialize project document")
        .map_err(EngineError::from)?;

    let directory = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut temp = match directory {
        Some(directory) => tempfile::NamedTempFile::new_in(directory),
        None => tempfile::NamedTempFile::new(),
    }
    .context("create temp file for project save")
    .map_err(EngineError::from)?;

    temp.write_all(&json)
        .context("write project document")
        .map_err(EngineError::from)?;
    temp.persist(path)
        .map_err(|error| EngineError::Io(format!("persist project file: {error}")))?;

    debug!(bytes = json.len(), "project document written");
    Ok(())
}

/// Parses and fully validates a project file. Every structural invariant is
/// re-checked before the timeline is returned, so a hand-edited or corrupt
/// file can never smuggle an overlapping or out-of-range clip back in.
#[instrument(fields(path = %path.display()))]
pub fn load_project(path: &Path) -> Result<(Timeline, EngineConfig), EngineError> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read project file {}", path.display()))
        .map_err(EngineError::from)?;

    let document: ProjectDocument = serde_json::from_slice(&bytes)
        .map_err(|error| EngineError::Deserialization(error.to_string()))?;
    if document.schema_version != SCHEMA_VERSION {
        return Err(EngineError::Deserialization(format!(
            "unsupported schema version {} (expected {SCHEMA_VERSION})",
            document.schema_version
        )));
    }

    let mut timeline = document.timeline;
    timeline.validate()?;
    timeline.normalize();

    debug!(
        clips = timeline.clip_count(),
        audio_tracks = timeline.audio_tracks().len(),
        "project document loaded"
    );
    Ok((timeline, document.config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SourceMetadata, VideoClip};

    #[test]
    fn malformed_json_is_a_deserialization_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.clipforge.json");
        std::fs::write(&path, b"{ not json").expect("write");

        let error = load_project(&path).expect_err("malformed file");
        assert!(matches!(error, EngineError::Deserialization(_)));
    }

    #[test]
    fn unknown_schema_version_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("future.clipforge.json");

        let timeline = Timeline::default();
        save_project(&path, &timeline, &EngineConfig::default()).expect("save");
        let text = std::fs::read_to_string(&path).expect("read");
        let bumped = text.replace("\"schema_version\": 1", "\"schema_version\": 99");
        std::fs::write(&path, bumped).expect("rewrite");

        let error = load_project(&path).expect_err("future schema");
        assert!(matches!(error, EngineError::Deserialization(_)));
    }

    #[test]
    fn overlapping_clips_cannot_be_loaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("overlap.clipforge.json");

        let mut timeline = Timeline::default();
        timeline
            .add_clip(VideoClip::new(
                "a",
                SourceMetadata::new("a.mp4", 5_000),
                0,
                0,
            ))
            .expect("add");
        save_project(&path, &timeline, &EngineConfig::default()).expect("save");

        // Duplicate the clip array entry so two identical spans collide.
        let text = std::fs::read_to_string(&path).expect("read");
        let value: serde_json::Value = serde_json::from_str(&text).expect("parse");
        let mut doc = value;
        let clips = doc["clips"].as_array().expect("clips array").clone();
        let mut twin = clips[0].clone();
        twin["id"] = serde_json::json!(uuid::Uuid::new_v4().to_string());
        doc["clips"].as_array_mut().expect("clips array").push(twin);
        std::fs::write(&path, serde_json::to_vec(&doc).expect("serialize")).expect("rewrite");

        let error = load_project(&path).expect_err("overlapping clips");
        assert!(matches!(error, EngineError::Deserialization(_)));
    }
}
