use crate::{error::EngineError, timeline::Timeline};

/// A decoded preview frame. Pixel layout is owned by the rendering
/// collaborator; the core only moves the bytes around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Frame {
    #[must_use]
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }
}

/// Rendering collaborator: `(timeline snapshot, time) -> frame`. The engine
/// hands it a snapshot taken under the mutation lock, so implementations
/// never observe concurrent edits.
pub trait FrameRenderer: Send + Sync {
    fn render_frame(&self, snapshot: &Timeline, time_ms: u64) -> Result<Frame, EngineError>;
}

/// Produces blank frames at project resolution. Stands in wherever no real
/// renderer is wired up (headless tools, tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl FrameRenderer for NullRenderer {
    fn render_frame(&self, snapshot: &Timeline, _time_ms: u64) -> Result<Frame, EngineError> {
        Ok(Frame::blank(
            snapshot.properties.width,
            snapshot.properties.height,
        ))
    }
}
