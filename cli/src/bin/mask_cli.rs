use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use cli::{class_image, load_gray, load_mask, save_mask, JobFile, LabelmapJob, RefineJob};
use color_eyre::eyre::Result;
use labelmap::{annotations_to_labelmap, compute_statistics};
use mask::{
    measure::{measure_mask, measure_stack, PixelSpacing},
    ops::MaskCommand,
    threshold::{
        adaptive_threshold, hysteresis_threshold, multi_otsu_labels, otsu_segment, threshold_segment,
        AdaptiveMethod, AdaptiveThresholdConfig, ThresholdConfig, DEFAULT_HISTOGRAM_BINS,
    },
};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select pixels inside an intensity window
    Threshold {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        lower: f32,
        #[arg(long)]
        upper: f32,
        /// Select everything outside the window
        #[arg(long)]
        invert: bool,
    },
    /// Local-window threshold
    Adaptive {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value = "11")]
        window_size: u32,
        #[arg(long, default_value = "2.0")]
        constant: f32,
        /// mean or gaussian
        #[arg(long, default_value = "mean")]
        method: AdaptiveMethod,
    },
    /// Otsu threshold, or class labels when more than two classes are asked for
    Otsu {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value = "2")]
        classes: usize,
        #[arg(long, default_value_t = DEFAULT_HISTOGRAM_BINS)]
        bins: usize,
    },
    /// Two-level threshold keeping weak pixels connected to strong ones
    Hysteresis {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        low: f32,
        #[arg(long)]
        high: f32,
    },
    /// Apply a refinement recipe (TOML or JSON) to a mask image
    Refine {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long)]
        job: PathBuf,
        /// Write the refined outline as JSON
        #[arg(long)]
        outline: Option<PathBuf>,
    },
    /// Build a label volume from per-slice annotations and report statistics
    Labelmap {
        #[arg(short, long)]
        job: PathBuf,
        /// Write statistics as JSON
        #[arg(short, long)]
        stats: Option<PathBuf>,
    },
    /// Print the JSON schema of refinement commands
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Threshold {
            input,
            output,
            lower,
            upper,
            invert,
        } => {
            let config = ThresholdConfig {
                lower_threshold: *lower,
                upper_threshold: *upper,
                invert: *invert,
            };
            let gray = load_gray(input)?;
            let result = threshold_segment(&gray.view()?, &config);
            save_mask(&result.segmentation.mask, output)?;
            info!(
                pixels = result.segmentation.pixel_count,
                mean = result.statistics.mean,
                std = result.statistics.std,
                min = result.statistics.min,
                max = result.statistics.max,
                "threshold written to {:?}",
                output
            );
        }
        Commands::Adaptive {
            input,
            output,
            window_size,
            constant,
            method,
        } => {
            let config = AdaptiveThresholdConfig {
                window_size: *window_size,
                constant: *constant,
                method: *method,
            };
            let gray = load_gray(input)?;
            let result = adaptive_threshold(&gray.view()?, &config);
            save_mask(&result.mask, output)?;
            info!(pixels = result.pixel_count, "adaptive threshold written to {:?}", output);
        }
        Commands::Otsu {
            input,
            output,
            classes,
            bins,
        } => otsu(input, output, *classes, *bins)?,
        Commands::Hysteresis {
            input,
            output,
            low,
            high,
        } => {
            if low > high {
                warn!(low, high, "low threshold is above high threshold");
            }
            let gray = load_gray(input)?;
            let result = hysteresis_threshold(&gray.view()?, *low, *high);
            save_mask(&result.mask, output)?;
            info!(pixels = result.pixel_count, "hysteresis written to {:?}", output);
        }
        Commands::Refine {
            input,
            output,
            job,
            outline,
        } => refine(input, output, job, outline.as_deref())?,
        Commands::Labelmap { job, stats } => build_labelmap(job, stats.as_deref())?,
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&MaskCommand::schema())?);
        }
    }

    Ok(())
}

fn otsu(input: &Path, output: &Path, classes: usize, bins: usize) -> Result<()> {
    let gray = load_gray(input)?;
    let view = gray.view()?;
    if classes == 2 {
        let (otsu, result) = otsu_segment(&view, bins);
        save_mask(&result.mask, output)?;
        info!(
            threshold = otsu.threshold,
            pixels = result.pixel_count,
            "otsu mask written to {:?}",
            output
        );
    } else {
        let labels = multi_otsu_labels(&view, classes, bins)?;
        class_image(&labels, gray.width, gray.height, classes)?.save(output)?;
        info!(classes, "class image written to {:?}", output);
    }
    Ok(())
}

fn refine(input: &Path, output: &Path, job_path: &Path, outline: Option<&Path>) -> Result<()> {
    let job = RefineJob::from_file(job_path)?;
    let mask = load_mask(input)?;
    let pipeline = job.pipeline();
    info!("{}", pipeline.info());

    let result = pipeline.process(&mask)?;
    save_mask(&result.mask, output)?;

    let measurements = measure_mask(&result.mask, &PixelSpacing::default());
    info!(
        pixels = result.pixel_count,
        perimeter = measurements.perimeter,
        circularity = measurements.circularity,
        solidity = measurements.solidity,
        "refined mask written to {:?}",
        output
    );

    if let Some(path) = outline {
        let computed = pipeline.process_outline(&mask)?;
        std::fs::write(path, serde_json::to_string_pretty(&computed)?)?;
        info!(shapes = computed.shapes.len(), "outline written to {:?}", path);
    }
    Ok(())
}

fn build_labelmap(job_path: &Path, stats_path: Option<&Path>) -> Result<()> {
    let job = LabelmapJob::from_file(job_path)?;
    let labelmap = annotations_to_labelmap(&job.slice_annotations(), &job.options)?;
    let stats = compute_statistics(&labelmap);

    for label in &stats.labels {
        info!(
            label = label.label,
            name = %label.name,
            voxels = label.voxel_count,
            volume_mm3 = label.volume,
            surface_mm2 = label.surface_area,
            "label statistics"
        );
    }

    let [sx, sy, sz] = labelmap.spacing;
    let stack = measure_stack(
        &labelmap.label_masks(job.options.label_id),
        &PixelSpacing::millimeters(sx, sy),
        sz,
    );
    info!(
        source_slices = labelmap.source_slices.len(),
        occupied_slices = stack.occupied_slices,
        stacked_surface_mm2 = stack.surface_area,
        "labelmap built"
    );

    if let Some(path) = stats_path {
        std::fs::write(path, serde_json::to_string_pretty(&stats)?)?;
        info!("statistics written to {:?}", path);
    }
    Ok(())
}
