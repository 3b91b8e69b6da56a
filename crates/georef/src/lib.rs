//! # Footprint Georeferencing
//!
//! Attaches a north-up affine georeference to a plain image, given the
//! image's WKT footprint in WGS84:
//!
//! 1. the footprint envelope supplies four world corners
//! 2. they are paired with the image corners as ground control points
//! 3. a least-squares affine fit turns them into a geotransform
//! 4. the image is re-encoded next to a world file and a `.prj` sidecar
//!
//! The world file is what `cloudmask` reads back when detecting clouds.

pub mod error;
pub mod fit;
pub mod footprint;
pub mod gcp;

use std::{
    fs,
    path::{Path, PathBuf},
};

use cloudmask::{
    io::{encode_image, world_file},
    GeoTransform,
};
use tracing::info;

pub use error::{GeorefError, Result};
pub use fit::fit_geotransform;
pub use footprint::Footprint;
pub use gcp::{corner_gcps, GroundControlPoint};

/// EPSG:4326 in the WKT flavour `.prj` readers expect.
pub const WGS84_WKT: &str = r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]]"#;

/// Footprint file used when none is given: `<stem>.txt` next to the image.
pub fn default_footprint_path(image: &Path) -> PathBuf {
    image.with_extension("txt")
}

/// Output used when none is given: `<stem>.tif` next to the image.
pub fn default_output_path(image: &Path) -> PathBuf {
    image.with_extension("tif")
}

#[derive(Debug, Clone)]
pub struct GeorefRequest {
    pub input: PathBuf,
    pub footprint: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

impl GeorefRequest {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            footprint: None,
            output: None,
        }
    }

    pub fn footprint_path(&self) -> PathBuf {
        self.footprint
            .clone()
            .unwrap_or_else(|| default_footprint_path(&self.input))
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.input))
    }
}

/// Files written by [`georeference`] and the fitted transform.
#[derive(Debug, Clone)]
pub struct GeorefOutput {
    pub transform: GeoTransform,
    pub gcps: Vec<GroundControlPoint>,
    pub image: PathBuf,
    pub world_file: PathBuf,
    pub projection: PathBuf,
}

/// World file sidecar for an output image, e.g. `scene.tif` → `scene.tfw`.
pub fn world_file_path(image: &Path) -> PathBuf {
    world_file::world_file_candidates(image)
        .into_iter()
        .next()
        .unwrap_or_else(|| image.with_extension("wld"))
}

/// Georeference one image. Nothing is written unless every step succeeds.
pub fn georeference(request: &GeorefRequest) -> Result<GeorefOutput> {
    let output = request.output_path();
    if output == request.input {
        return Err(GeorefError::OutputIsInput(output.display().to_string()));
    }

    let footprint = Footprint::parse(&fs::read_to_string(request.footprint_path())?)?;
    let image = image::open(&request.input)?;

    let gcps = corner_gcps(image.width(), image.height(), footprint.corners()?);
    let transform = fit_geotransform(&gcps)?;

    let encoded = encode_image(&image, &output)?;
    let world_file = world_file_path(&output);
    let projection = output.with_extension("prj");

    fs::write(&output, encoded)?;
    fs::write(&world_file, world_file::format_world_file(&transform))?;
    fs::write(&projection, WGS84_WKT)?;

    info!(
        input = %request.input.display(),
        output = %output.display(),
        %transform,
        "image georeferenced"
    );

    Ok(GeorefOutput {
        transform,
        gcps,
        image: output,
        world_file,
        projection,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_replace_the_extension() {
        let input = Path::new("/data/scene.jpg");
        assert_eq!(default_footprint_path(input), Path::new("/data/scene.txt"));
        assert_eq!(default_output_path(input), Path::new("/data/scene.tif"));
        assert_eq!(world_file_path(Path::new("/data/scene.tif")), Path::new("/data/scene.tfw"));
    }

    #[test]
    fn refuses_to_overwrite_the_input() {
        let request = GeorefRequest::new("/data/scene.tif");
        assert!(matches!(
            georeference(&request),
            Err(GeorefError::OutputIsInput(_))
        ));
    }
}
