//! # Cloud Detection Library
//!
//! Turns a georeferenced raster into cloud outlines:
//!
//! 1. k-means over pixel channel vectors splits the image into a cloud /
//!    background mask (the brightest cluster is cloud)
//! 2. a median filter removes speckle
//! 3. boundaries are traced and ranked by area; the background boundary and
//!    the smallest blobs are dropped
//! 4. the surviving contours are rendered for inspection and mapped through
//!    the raster's affine geotransform into a `MultiPolygon`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cloudmask::{io, DetectionConfig, GeoTransform, Pipeline};
//!
//! let raster = io::load_raster("scene.png")?;
//! let transform = io::read_world_file("scene.pgw")?;
//!
//! let pipeline = Pipeline::from_config(&DetectionConfig::default())?;
//! let result = pipeline.process(&raster, &transform)?;
//!
//! result.save_geojson("scene.geojson")?;
//! result.rendered.save("cloud_mask.jpeg")?;
//! # let _ = GeoTransform::NORTH_UP_PIXELS;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use cloudmask::{algorithms::*, Pipeline};
//!
//! let pipeline = Pipeline::builder()
//!     .set_segmenter(KMeansSegmenter::new(3, 50))
//!     .set_denoiser(MedianDenoiser { kernel_size: 5 })
//!     .set_contour_extractor(PixelCenterContourExtractor::default())
//!     .build();
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod config;
pub mod traits;
pub mod algorithms;
pub mod geo_transform;
pub mod geometry;
pub mod render;
pub mod pipeline;
pub mod io;

// Re-exports for convenience
pub use error::{CloudMaskError, Result};
pub use types::{BinaryMask, BoundaryKind, Contour, ContourSet, PixelPoint, RasterImage};
pub use config::{BackgroundPolicy, ContourStrategy, DegeneratePolicy, DetectionConfig};
pub use traits::*;
pub use geo_transform::{AffineMapper, GeoTransform};
pub use geometry::{CloudGeometry, GeometryBuilder};
pub use render::MaskRenderer;
pub use pipeline::{builder::PipelineBuilder, DetectionResult, Pipeline};
