use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use dicom_mpr::{
    FrameQueue, HandleAxis, ImageSurface, MprViewer, Orientation, Processor,
    SlabMode, SortBy, ViewerConfig, VolumeLoader, rotation::apply_rotation,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use web_time::Instant;

#[derive(Parser)]
#[command(name = "dicom-mpr")]
#[command(author, version, about = "Render linked axial, coronal and sagittal MPR views of a DICOM series")]
struct Cli {
    /// Directory with the .dcm files of one series
    input: PathBuf,

    /// Where axial.png, coronal.png and sagittal.png are written
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    #[arg(long, value_enum, default_value_t = SortArg::Position)]
    sort_by: SortArg,

    #[arg(long, value_enum, default_value_t = SlabArg::Max)]
    slab_mode: SlabArg,

    /// Slab thickness in voxels for all three views (below 1 = single slice)
    #[arg(short, long, default_value = "0")]
    thickness: f32,

    /// Output size of each view in pixels
    #[arg(long, default_value = "512")]
    width: u32,

    #[arg(long, default_value = "512")]
    height: u32,

    /// Rotate the coronal and sagittal planes about the axial normal (degrees)
    #[arg(long, default_value = "0")]
    rotate: f32,

    /// Sample rows on a single thread
    #[arg(long)]
    serial: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Position,
    Table,
    Instance,
    None,
}

impl From<SortArg> for SortBy {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Position => SortBy::ImagePositionPatient,
            SortArg::Table => SortBy::TablePosition,
            SortArg::Instance => SortBy::InstanceNumber,
            SortArg::None => SortBy::None,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SlabArg {
    Max,
    Min,
    Avg,
}

impl From<SlabArg> for SlabMode {
    fn from(value: SlabArg) -> Self {
        match value {
            SlabArg::Max => SlabMode::MaxIP,
            SlabArg::Min => SlabMode::MinIP,
            SlabArg::Avg => SlabMode::AvgIP,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if cli.width == 0 || cli.height == 0 {
        bail!("output size must be non-zero, got {}x{}", cli.width, cli.height);
    }

    let volume = VolumeLoader::load_from_directory(&cli.input, cli.sort_by.into())
        .with_context(|| format!("Failed to load DICOM series from {}", cli.input.display()))?;

    let config = ViewerConfig {
        processor: if cli.serial {
            Processor::CPU
        } else {
            Processor::CPUParallel
        },
        ..ViewerConfig::default()
    };
    let mut viewer = MprViewer::new(config);
    let mut surface = ImageSurface::new();
    let mut frames = FrameQueue::new();

    viewer.load_volume(volume, &mut frames);
    viewer.update_state(&mut frames, |state| {
        state.set_slab_mode(cli.slab_mode.into());
        for orientation in Orientation::ALL {
            state.set_thickness(orientation, cli.thickness);
        }
        apply_rotation(
            state,
            Orientation::Axial,
            HandleAxis::Horizontal,
            cli.rotate.to_radians(),
        );
    });

    let now = Instant::now();
    for orientation in Orientation::ALL {
        viewer.resize(orientation, cli.width, cli.height, now, &mut surface, &mut frames);
    }
    // Views are still resizing, so each pending callback draws.
    for orientation in frames.take() {
        viewer.frame(orientation, now, &mut surface, &mut frames);
    }

    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("Failed to create {}", cli.output.display()))?;
    for orientation in Orientation::ALL {
        let image = surface
            .image(orientation)
            .with_context(|| format!("No {} frame was drawn", orientation.name()))?;
        let path = cli.output.join(format!("{}.png", orientation.name()));
        image
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "view written");
    }
    Ok(())
}
