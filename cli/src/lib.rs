use std::{
    fs,
    path::{Path, PathBuf},
};

use cloudmask::{
    io::{encode_image, find_world_file, load_raster, read_world_file},
    CloudMaskError, DetectionConfig, GeoTransform, Pipeline,
};
use image::DynamicImage;
use thiserror::Error;
use tracing::info;

/// File name of the rendered contour/hull image inside the output folder.
pub const MASK_FILE_NAME: &str = "cloud_mask.jpeg";
pub const DEFAULT_OUTPUT_FOLDER: &str = "data/sample_images/";

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Detection(#[from] CloudMaskError),
    #[error(transparent)]
    Georef(#[from] georef::GeorefError),
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("No georeference for {0}: pass --geotransform or --world-file, or add a world file sidecar")]
    MissingGeoreference(PathBuf),
}

/// Where a detection run writes its two outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub mask: PathBuf,
    pub vector: PathBuf,
}

impl OutputPaths {
    /// `<folder>/cloud_mask.jpeg` and `<folder>/<input stem>.geojson`.
    pub fn for_input(input: &Path, output_folder: &Path) -> Self {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "clouds".to_string());
        Self {
            mask: output_folder.join(MASK_FILE_NAME),
            vector: output_folder.join(format!("{stem}.geojson")),
        }
    }
}

/// How the pixel → world mapping of the input is obtained, first match wins.
#[derive(Debug, Clone, Default)]
pub struct GeoreferenceSource {
    pub geotransform: Option<GeoTransform>,
    pub world_file: Option<PathBuf>,
}

impl GeoreferenceSource {
    pub fn resolve(&self, input: &Path) -> Result<GeoTransform, CliError> {
        if let Some(transform) = self.geotransform {
            return Ok(transform);
        }
        if let Some(path) = &self.world_file {
            return Ok(read_world_file(path)?);
        }
        if let Some(sidecar) = find_world_file(input) {
            info!(world_file = %sidecar.display(), "using world file sidecar");
            return Ok(read_world_file(sidecar)?);
        }
        Err(CliError::MissingGeoreference(input.to_path_buf()))
    }
}

#[derive(Debug, Clone)]
pub struct DetectRequest {
    pub input: PathBuf,
    pub output_folder: PathBuf,
    pub config: DetectionConfig,
    pub georeference: GeoreferenceSource,
}

#[derive(Debug, Clone)]
pub struct DetectSummary {
    pub paths: OutputPaths,
    pub cloud_count: usize,
    pub skipped: usize,
}

/// Run detection and write the rendered mask and the GeoJSON. Both outputs
/// are encoded in memory first so a failure leaves no partial result.
pub fn run_detect(request: &DetectRequest) -> Result<DetectSummary, CliError> {
    let pipeline = Pipeline::from_config(&request.config)?;
    let raster = load_raster(&request.input)?;
    let transform = request.georeference.resolve(&request.input)?;

    let result = pipeline.process(&raster, &transform)?;

    let paths = OutputPaths::for_input(&request.input, &request.output_folder);
    let mask_bytes = encode_image(&DynamicImage::ImageRgb8(result.rendered.clone()), &paths.mask)?;
    let vector = result.to_geojson_string()?;

    fs::create_dir_all(&request.output_folder)?;
    fs::write(&paths.mask, mask_bytes)?;
    fs::write(&paths.vector, vector)?;

    info!(
        mask = %paths.mask.display(),
        vector = %paths.vector.display(),
        clouds = result.cloud_count(),
        "outputs written"
    );

    Ok(DetectSummary {
        paths,
        cloud_count: result.cloud_count(),
        skipped: result.geometry.skipped,
    })
}

/// JSON schema of the detection config, pretty-printed.
pub fn config_schema() -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(&DetectionConfig::schema())?)
}
