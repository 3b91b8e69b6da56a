use crate::{
    error::Result,
    types::{BinaryMask, ContourSet, RasterImage},
};

/// Trait for turning a raster into a cloud / background mask
pub trait Segmenter: Send + Sync {
    /// Label every pixel of the raster; the mask has the raster's extent
    fn segment(&self, raster: &RasterImage) -> Result<BinaryMask>;
}

/// Trait for mask cleanup filters
pub trait Denoiser: Send + Sync {
    /// Produce a new mask of identical shape
    fn denoise(&self, mask: &BinaryMask) -> Result<BinaryMask>;
}

/// Trait for boundary tracing algorithms
pub trait ContourExtractor: Send + Sync {
    /// Extract a flat list of closed boundaries and their areas
    fn extract_contours(&self, mask: &BinaryMask) -> Result<ContourSet>;
}

/// Trait for contour filtering strategies
pub trait ContourSelector: Send + Sync {
    /// Reduce the set, keeping the relative order of retained contours.
    /// `canvas` is the `(width, height)` of the traced mask.
    fn select(&self, contours: ContourSet, canvas: (u32, u32)) -> ContourSet;
}
