//! Tunable parameters of a detection run.
//!
//! A [`DetectionConfig`] can be built in code, or loaded from a `.toml` /
//! `.json` file; missing keys fall back to the defaults below.

use std::{fs, path::Path};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};

use crate::error::{CloudMaskError, Result};

pub const DEFAULT_CLUSTER_COUNT: usize = 2;
pub const DEFAULT_DENOISE_KERNEL_SIZE: u32 = 17;
pub const DEFAULT_SELECTION_PERCENTAGE: f64 = 0.9;
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// How boundaries are traced in the denoised mask.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumString,
    EnumIter,
    VariantNames,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContourStrategy {
    /// Follow pixel edges; vertices sit on pixel corners.
    #[default]
    PixelEdge,
    /// Suzuki-Abe border following through boundary pixel centres.
    PixelCenter,
}

/// What to do with the largest contour before noise filtering.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema, Display, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BackgroundPolicy {
    /// Always drop the largest contour.
    #[default]
    DiscardLargest,
    /// Drop the largest contour only when it covers at least `min_coverage`
    /// of the canvas area.
    DiscardCanvasMatch {
        #[schemars(range(min = 0.0, max = 1.0))]
        min_coverage: f64,
    },
    /// Keep every contour.
    Keep,
}

/// What the geometry builder does with contours of fewer than three points.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    JsonSchema,
    Display,
    EnumString,
    EnumIter,
    VariantNames,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Leave them out and report how many were dropped.
    #[default]
    Skip,
    /// Fail the whole build.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
#[schemars(description = "Parameters of a cloud detection run")]
pub struct DetectionConfig {
    #[schemars(description = "Number of intensity clusters", range(min = 2))]
    pub cluster_count: usize,

    #[schemars(description = "Upper bound on k-means iterations", range(min = 1))]
    pub max_iterations: usize,

    #[schemars(description = "Median filter size in pixels (odd, >= 3)", range(min = 3))]
    pub denoise_kernel_size: u32,

    #[schemars(
        description = "Fraction in (0, 1] of non-background contours retained",
        range(min = 0.0, max = 1.0)
    )]
    pub selection_percentage: f64,

    pub contour_strategy: ContourStrategy,

    #[schemars(description = "Emit the raster frame as the first traced contour")]
    pub trace_canvas_frame: bool,

    pub background_policy: BackgroundPolicy,

    pub degenerate_policy: DegeneratePolicy,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            cluster_count: DEFAULT_CLUSTER_COUNT,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            denoise_kernel_size: DEFAULT_DENOISE_KERNEL_SIZE,
            selection_percentage: DEFAULT_SELECTION_PERCENTAGE,
            contour_strategy: ContourStrategy::default(),
            trace_canvas_frame: true,
            background_policy: BackgroundPolicy::default(),
            degenerate_policy: DegeneratePolicy::default(),
        }
    }
}

impl DetectionConfig {
    /// Checks every parameter range.
    pub fn validate(&self) -> Result<()> {
        if self.cluster_count < 2 {
            return Err(CloudMaskError::config(format!(
                "cluster_count must be at least 2, got {}",
                self.cluster_count
            )));
        }
        if self.max_iterations == 0 {
            return Err(CloudMaskError::config("max_iterations must be at least 1"));
        }
        validate_kernel_size(self.denoise_kernel_size)?;
        validate_selection_percentage(self.selection_percentage)?;
        if let BackgroundPolicy::DiscardCanvasMatch { min_coverage } = self.background_policy {
            if !(0.0..=1.0).contains(&min_coverage) {
                return Err(CloudMaskError::config(format!(
                    "min_coverage must lie in [0, 1], got {min_coverage}"
                )));
            }
        }
        Ok(())
    }

    /// JSON schema of the config, for editors and the CLI.
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(DetectionConfig)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Loads a config, picking the format from the file extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = || fs::read_to_string(path);
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&content()?),
            Some("json") => Self::from_json(&content()?),
            _ => Err(CloudMaskError::config(format!(
                "unsupported config format for {}; use .toml or .json",
                path.display()
            ))),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub(crate) fn validate_kernel_size(kernel_size: u32) -> Result<()> {
    if kernel_size < 3 || kernel_size % 2 == 0 {
        return Err(CloudMaskError::config(format!(
            "denoise_kernel_size must be an odd integer >= 3, got {kernel_size}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_selection_percentage(selection_percentage: f64) -> Result<()> {
    if !(selection_percentage > 0.0 && selection_percentage <= 1.0) {
        return Err(CloudMaskError::config(format!(
            "selection_percentage must lie in (0, 1], got {selection_percentage}"
        )));
    }
    Ok(())
}
