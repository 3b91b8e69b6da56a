use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudMaskError {
    /// Unreadable or malformed raster / georeferencing input.
    #[error("Load error: {0}")]
    Load(String),

    /// Invalid tunable parameter.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A contour that cannot be turned into a valid ring.
    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

impl CloudMaskError {
    pub fn load(message: impl Into<String>) -> Self {
        Self::Load(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn geometry(message: impl Into<String>) -> Self {
        Self::Geometry(message.into())
    }
}

pub type Result<T> = std::result::Result<T, CloudMaskError>;
