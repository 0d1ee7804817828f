use std::{path::PathBuf, thread, time::Duration};

use clap::{Parser, Subcommand, ValueEnum};
use clipforge_core::{
    ExportFormat, ExportStatus, QualityPreset,
    diagnostics::init_tracing,
    engine::EngineConfig,
    fixtures::{demo_engine, demo_timeline},
    persistence::{load_project, save_project},
};

#[derive(Debug, Parser)]
#[command(name = "clipforge-cli")]
#[command(about = "Headless tools for ClipForge project and export workflows")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write the demo project to disk.
    DemoSave {
        #[arg(long, default_value = "data/demo.clipforge.json")]
        output: PathBuf,
    },
    /// Load a project file and print a structural summary.
    Inspect { project: PathBuf },
    /// Run the demo project through the simulated export backend.
    DemoExport {
        #[arg(long, default_value = "data/exports/demo.mp4")]
        output: PathBuf,

        #[arg(long, value_enum, default_value = "mp4")]
        format: FormatArg,

        #[arg(long, value_enum, default_value = "high")]
        quality: QualityArg,
    },
}

#[derive(Debug, Clone, ValueEnum)]
enum FormatArg {
    Mp4,
    Webm,
    Mkv,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Mp4 => Self::Mp4,
            FormatArg::Webm => Self::Webm,
            FormatArg::Mkv => Self::Mkv,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum QualityArg {
    Low,
    Medium,
    High,
    Ultra,
}

impl From<QualityArg> for QualityPreset {
    fn from(value: QualityArg) -> Self {
        match value {
            QualityArg::Low => Self::Low,
            QualityArg::Medium => Self::Medium,
            QualityArg::High => Self::High,
            QualityArg::Ultra => Self::Ultra,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _telemetry = init_tracing(&cli.log_dir)?;

    match cli.command {
        Commands::DemoSave { output } => {
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            save_project(&output, &demo_timeline(), &EngineConfig::default())?;
            tracing::info!(path = %output.display(), "demo project written");
        }
        Commands::Inspect { project } => {
            let (timeline, config) = load_project(&project)?;
            println!("project: {}", config.project_name);
            println!(
                "resolution: {}x{} @ {} fps",
                timeline.properties.width, timeline.properties.height, timeline.properties.frame_rate
            );
            println!("duration: {} ms", timeline.total_duration_ms());
            println!("clips: {}", timeline.clip_count());
            for clip in timeline.clips() {
                println!(
                    "  [track {}] {:>8}..{:<8} {}",
                    clip.track_index,
                    clip.start_ms,
                    clip.end_ms(),
                    clip.name
                );
            }
            println!("audio tracks: {}", timeline.audio_tracks().len());
            for track in timeline.audio_tracks() {
                println!(
                    "  {:?} {} (volume {:.2}, pan {:+.2})",
                    track.kind, track.name, track.volume, track.pan
                );
            }
        }
        Commands::DemoExport {
            output,
            format,
            quality,
        } => {
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let engine = demo_engine();
            engine.start_export(&output, format.into(), quality.into())?;
            loop {
                let progress = engine.export_progress();
                tracing::info!(
                    percent = progress.percent,
                    status = ?progress.status,
                    "export progress"
                );
                if progress.status != ExportStatus::Running {
                    break;
                }
                thread::sleep(Duration::from_millis(50));
            }
            engine.wait_for_export();

            let progress = engine.export_progress();
            tracing::info!(status = ?progress.status, "export finished");
            engine.shutdown();
        }
    }

    Ok(())
}
