use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeorefError {
    #[error("Invalid WKT footprint: {0}")]
    InvalidWkt(String),

    #[error("Affine fit needs at least 3 ground control points, got {0}")]
    InsufficientGcps(usize),

    #[error("Ground control points are collinear; no unique affine fit")]
    SingularFit,

    #[error("Output {0} would overwrite the input image")]
    OutputIsInput(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    CloudMask(#[from] cloudmask::CloudMaskError),
}

pub type Result<T> = std::result::Result<T, GeorefError>;
