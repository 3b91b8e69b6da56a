use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cloudmask::{BackgroundPolicy, ContourStrategy, DetectionConfig, GeoTransform};
use cloudmask_cli::{
    config_schema, run_detect, DetectRequest, GeoreferenceSource, DEFAULT_OUTPUT_FOLDER,
};
use color_eyre::eyre::{Result, WrapErr};
use georef::{georeference, GeorefRequest};
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect clouds in an image and export them as polygons
    Detect {
        /// Input image (grayscale or RGB)
        input: PathBuf,
        /// Folder receiving cloud_mask.jpeg and <stem>.geojson
        #[arg(default_value = DEFAULT_OUTPUT_FOLDER)]
        output_folder: PathBuf,
        /// Detection parameters (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of k-means clusters
        #[arg(long)]
        clusters: Option<usize>,
        /// Median filter size in pixels (odd, >= 3)
        #[arg(long)]
        kernel_size: Option<u32>,
        /// Fraction of non-background contours kept, largest first
        #[arg(long)]
        selection: Option<f64>,
        /// Contour tracing strategy
        #[arg(long)]
        contour_strategy: Option<ContourStrategy>,
        /// Keep the largest contour instead of treating it as background; the
        /// canvas frame is never exported
        #[arg(long)]
        keep_largest: bool,
        /// Six comma-separated GDAL geotransform coefficients
        #[arg(long, allow_hyphen_values = true)]
        geotransform: Option<GeoTransform>,
        /// World file to read instead of looking for a sidecar
        #[arg(long)]
        world_file: Option<PathBuf>,
    },
    /// Attach a georeference to an image from its WKT footprint
    Georef {
        /// Input image
        input: PathBuf,
        /// Footprint WKT file (defaults to <stem>.txt)
        footprint: Option<PathBuf>,
        /// Output image (defaults to <stem>.tif)
        output: Option<PathBuf>,
    },
    /// Print the JSON schema of the detection config
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

    match cli.command {
        Commands::Detect {
            input,
            output_folder,
            config,
            clusters,
            kernel_size,
            selection,
            contour_strategy,
            keep_largest,
            geotransform,
            world_file,
        } => {
            let mut config = match &config {
                Some(path) => DetectionConfig::from_file(path)
                    .wrap_err_with(|| format!("loading config {}", path.display()))?,
                None => DetectionConfig::default(),
            };
            if let Some(clusters) = clusters {
                config.cluster_count = clusters;
            }
            if let Some(kernel_size) = kernel_size {
                config.denoise_kernel_size = kernel_size;
            }
            if let Some(selection) = selection {
                config.selection_percentage = selection;
            }
            if let Some(strategy) = contour_strategy {
                config.contour_strategy = strategy;
            }
            if keep_largest {
                config.background_policy = BackgroundPolicy::Keep;
            }

            let request = DetectRequest {
                input,
                output_folder,
                config,
                georeference: GeoreferenceSource {
                    geotransform,
                    world_file,
                },
            };
            let summary = run_detect(&request)
                .wrap_err_with(|| format!("detecting clouds in {}", request.input.display()))?;
            info!(
                "✅ {} cloud(s) -> {}",
                summary.cloud_count,
                summary.paths.vector.display()
            );
        }
        Commands::Georef {
            input,
            footprint,
            output,
        } => {
            let request = GeorefRequest {
                input,
                footprint,
                output,
            };
            let output = georeference(&request)
                .wrap_err_with(|| format!("georeferencing {}", request.input.display()))?;
            info!(
                "✅ {} with {}",
                output.image.display(),
                output.world_file.display()
            );
        }
        Commands::Schema => {
            println!("{}", config_schema()?);
        }
    }

    Ok(())
}
