use std::collections::HashMap;

use crate::{error::EngineError, model::SourceMetadata};

/// Media source collaborator: resolves a source reference into the metadata
/// used to validate trim bounds at clip-add time. Actual demuxing/decoding
/// lives outside the core.
pub trait MediaProbe: Send + Sync {
    fn probe(&self, source: &str) -> Result<SourceMetadata, EngineError>;
}

/// In-memory probe backed by a registered map of sources. Used by fixtures,
/// tests, and headless tools; unknown references fail with `SourceNotFound`.
#[derive(Debug, Default)]
pub struct StaticMediaProbe {
    sources: HashMap<String, SourceMetadata>,
}

impl StaticMediaProbe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, metadata: SourceMetadata) {
        self.sources.insert(metadata.path.clone(), metadata);
    }

    #[must_use]
    pub fn with_source(mut self, metadata: SourceMetadata) -> Self {
        self.register(metadata);
        self
    }
}

impl MediaProbe for StaticMediaProbe {
    fn probe(&self, source: &str) -> Result<SourceMetadata, EngineError> {
        self.sources
            .get(source)
            .cloned()
            .ok_or_else(|| EngineError::SourceNotFound(source.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_source_fails() {
        let probe = StaticMediaProbe::new();
        let error = probe.probe("missing.mp4").expect_err("unknown source");
        assert!(matches!(error, EngineError::SourceNotFound(path) if path == "missing.mp4"));
    }

    #[test]
    fn registered_source_round_trips() {
        let probe =
            StaticMediaProbe::new().with_source(SourceMetadata::new("beach.mp4", 12_000));
        let metadata = probe.probe("beach.mp4").expect("registered source");
        assert_eq!(metadata.duration_ms, 12_000);
    }
}
