use std::{
    path::{Path, PathBuf},
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering},
    },
    thread,
    time::Duration,
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{error::EngineError, timeline::Timeline};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Mp4,
    Webm,
    Mkv,
}

impl FromStr for ExportFormat {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "mp4" => Ok(Self::Mp4),
            "webm" => Ok(Self::Webm),
            "mkv" => Ok(Self::Mkv),
            other => Err(EngineError::InvalidConfig(format!(
                "unknown export format: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QualityPreset {
    Low,
    Medium,
    High,
    Ultra,
}

impl QualityPreset {
    #[must_use]
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Self::Low => (854, 480),
            Self::Medium => (1280, 720),
            Self::High => (1920, 1080),
            Self::Ultra => (3840, 2160),
        }
    }

    #[must_use]
    pub fn video_bitrate(self) -> u64 {
        match self {
            Self::Low => 2_000_000,
            Self::Medium => 5_000_000,
            Self::High => 10_000_000,
            Self::Ultra => 20_000_000,
        }
    }
}

impl FromStr for QualityPreset {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "ultra" => Ok(Self::Ultra),
            other => Err(EngineError::InvalidConfig(format!(
                "unknown quality preset: {other}"
            ))),
        }
    }
}

/// Validated export parameters handed to the backend together with the
/// timeline snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportJob {
    pub destination: PathBuf,
    pub format: ExportFormat,
    pub quality: QualityPreset,
}

impl ExportJob {
    pub fn new(
        destination: impl Into<PathBuf>,
        format: ExportFormat,
        quality: QualityPreset,
    ) -> Result<Self, EngineError> {
        let destination = destination.into();
        validate_destination(&destination)?;
        Ok(Self {
            destination,
            format,
            quality,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ExportStatus {
    fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Running => 1,
            Self::Completed => 2,
            Self::Failed => 3,
            Self::Cancelled => 4,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Completed,
            3 => Self::Failed,
            4 => Self::Cancelled,
            _ => Self::Idle,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Point-in-time view of an export, safe to poll from any thread.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportProgress {
    pub percent: u32,
    pub status: ExportStatus,
}

/// Single-writer, multi-reader progress record. The export worker is the
/// only writer; pollers read the atomics without touching the engine's
/// mutation lock. The failure detail is written once, before the terminal
/// status becomes visible.
#[derive(Debug, Default)]
pub struct ExportMonitor {
    status: AtomicU8,
    percent: AtomicU32,
    detail: Mutex<Option<String>>,
}

impl ExportMonitor {
    pub(crate) fn begin(&self) {
        *self.detail.lock() = None;
        self.percent.store(0, Ordering::Release);
        self.status
            .store(ExportStatus::Running.as_u8(), Ordering::Release);
    }

    pub fn report_percent(&self, percent: u32) {
        self.percent.store(percent.min(100), Ordering::Release);
    }

    pub(crate) fn finish(&self, status: ExportStatus, detail: Option<String>) {
        *self.detail.lock() = detail;
        if status == ExportStatus::Completed {
            self.percent.store(100, Ordering::Release);
        }
        self.status.store(status.as_u8(), Ordering::Release);
    }

    #[must_use]
    pub fn snapshot(&self) -> ExportProgress {
        ExportProgress {
            percent: self.percent.load(Ordering::Acquire),
            status: ExportStatus::from_u8(self.status.load(Ordering::Acquire)),
        }
    }

    #[must_use]
    pub fn detail(&self) -> Option<String> {
        self.detail.lock().clone()
    }
}

/// Progress and cancellation plumbing owned by the engine and lent to the
/// backend for the duration of one export.
#[derive(Clone)]
pub struct ExportContext {
    monitor: Arc<ExportMonitor>,
    cancel: Arc<AtomicBool>,
}

impl ExportContext {
    pub(crate) fn new(monitor: Arc<ExportMonitor>, cancel: Arc<AtomicBool>) -> Self {
        Self { monitor, cancel }
    }

    pub fn report_percent(&self, percent: u32) {
        self.monitor.report_percent(percent);
    }

    /// Backends must poll this at fine granularity (per output frame) and
    /// return early when it flips.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }
}

/// Export collaborator: consumes a timeline snapshot plus job parameters and
/// produces the output artifact, reporting through the context. Returning
/// `Ok` after `is_cancelled()` flipped means the backend stopped
/// cooperatively; the engine records `Cancelled`, never `Completed`.
pub trait ExportBackend: Send + Sync {
    fn run(
        &self,
        snapshot: &Timeline,
        job: &ExportJob,
        ctx: &ExportContext,
    ) -> Result<(), EngineError>;
}

/// Frame-stepped backend that performs no encoding: it walks the timeline at
/// the project frame interval, reporting progress and polling cancellation
/// per frame. Used by headless tools and as the default engine backend.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedExportBackend {
    pub frame_delay: Duration,
}

impl Default for SimulatedExportBackend {
    fn default() -> Self {
        Self {
            frame_delay: Duration::from_millis(1),
        }
    }
}

impl ExportBackend for SimulatedExportBackend {
    #[instrument(skip_all, fields(destination = %job.destination.display()))]
    fn run(
        &self,
        snapshot: &Timeline,
        job: &ExportJob,
        ctx: &ExportContext,
    ) -> Result<(), EngineError> {
        let duration_ms = snapshot.total_duration_ms();
        let interval_ms = snapshot.properties.frame_interval_ms().max(1);
        let total_frames = (duration_ms / interval_ms).max(1);

        for frame in 0..total_frames {
            if ctx.is_cancelled() {
                debug!(frame, "export cancelled mid-run");
                return Ok(());
            }
            ctx.report_percent(((frame * 100) / total_frames) as u32);
            if !self.frame_delay.is_zero() {
                thread::sleep(self.frame_delay);
            }
        }

        debug!(
            total_frames,
            format = ?job.format,
            quality = ?job.quality,
            "simulated export walked all frames"
        );
        Ok(())
    }
}

/// Destination sanity check: the parent directory may be created later, so
/// only structurally malformed paths are rejected here.
fn validate_destination(destination: &Path) -> Result<(), EngineError> {
    if destination.as_os_str().is_empty() || destination.file_name().is_none() {
        return Err(EngineError::InvalidConfig(format!(
            "malformed export destination: {}",
            destination.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_and_quality_parse_case_insensitively() {
        assert_eq!("MP4".parse::<ExportFormat>().unwrap(), ExportFormat::Mp4);
        assert_eq!("Ultra".parse::<QualityPreset>().unwrap(), QualityPreset::Ultra);
        assert!("flv".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn empty_destination_is_malformed() {
        let error = ExportJob::new("", ExportFormat::Mp4, QualityPreset::High)
            .expect_err("empty destination");
        assert!(matches!(error, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn monitor_clamps_percent_and_pins_completion() {
        let monitor = ExportMonitor::default();
        monitor.begin();
        monitor.report_percent(250);
        assert_eq!(monitor.snapshot().percent, 100);

        monitor.finish(ExportStatus::Completed, None);
        let progress = monitor.snapshot();
        assert_eq!(progress.status, ExportStatus::Completed);
        assert_eq!(progress.percent, 100);
    }
}
