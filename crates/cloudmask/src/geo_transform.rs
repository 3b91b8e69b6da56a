//! Pixel ↔ world affine georeferencing.

use std::{fmt, str::FromStr};

use geo_types::Coord;
use serde::{Deserialize, Serialize};

use crate::error::{CloudMaskError, Result};

/// The six GDAL-ordered affine coefficients:
/// `[origin_x, pixel_width, row_rotation, origin_y, column_rotation, pixel_height]`.
///
/// Pixel `(0, 0)` is the top-left corner of the top-left pixel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 6]", into = "[f64; 6]")]
pub struct GeoTransform([f64; 6]);

impl GeoTransform {
    /// Pixel coordinates used as world coordinates, with y flipped so north
    /// is up.
    pub const NORTH_UP_PIXELS: GeoTransform = GeoTransform([0.0, 1.0, 0.0, 0.0, 0.0, -1.0]);

    pub fn from_gdal(coefficients: [f64; 6]) -> Result<Self> {
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(CloudMaskError::load(format!(
                "geotransform has non-finite coefficients: {coefficients:?}"
            )));
        }
        if coefficients[1] == 0.0 || coefficients[5] == 0.0 {
            return Err(CloudMaskError::load(format!(
                "geotransform pixel width and height must be non-zero: {coefficients:?}"
            )));
        }
        Ok(Self(coefficients))
    }

    /// North-up transform from an origin and pixel size; `pixel_height` is
    /// usually negative.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Result<Self> {
        Self::from_gdal([origin_x, pixel_width, 0.0, origin_y, 0.0, pixel_height])
    }

    pub fn coefficients(&self) -> [f64; 6] {
        self.0
    }

    pub fn origin(&self) -> (f64, f64) {
        (self.0[0], self.0[3])
    }

    pub fn pixel_size(&self) -> (f64, f64) {
        (self.0[1], self.0[5])
    }

    pub fn mapper(&self) -> AffineMapper {
        AffineMapper::new(*self)
    }
}

impl TryFrom<[f64; 6]> for GeoTransform {
    type Error = CloudMaskError;

    fn try_from(coefficients: [f64; 6]) -> Result<Self> {
        Self::from_gdal(coefficients)
    }
}

impl From<GeoTransform> for [f64; 6] {
    fn from(transform: GeoTransform) -> Self {
        transform.0
    }
}

impl fmt::Display for GeoTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a},{b},{c},{d},{e},{g}")
    }
}

/// Parses six comma-separated coefficients in GDAL order.
impl FromStr for GeoTransform {
    type Err = CloudMaskError;

    fn from_str(s: &str) -> Result<Self> {
        let values: Vec<f64> = s
            .split(',')
            .map(|part| {
                part.trim().parse::<f64>().map_err(|_| {
                    CloudMaskError::load(format!("invalid geotransform coefficient '{}'", part.trim()))
                })
            })
            .collect::<Result<_>>()?;
        let coefficients: [f64; 6] = values.try_into().map_err(|values: Vec<f64>| {
            CloudMaskError::load(format!(
                "geotransform needs 6 coefficients, got {}",
                values.len()
            ))
        })?;
        Self::from_gdal(coefficients)
    }
}

/// Maps pixel `(column, row)` to world `(x, y)`:
///
/// ```text
/// x = gt[0] + col * gt[1] + row * gt[2]
/// y = gt[3] + col * gt[4] + row * gt[5]
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineMapper {
    transform: GeoTransform,
}

impl AffineMapper {
    pub fn new(transform: GeoTransform) -> Self {
        Self { transform }
    }

    pub fn transform(&self) -> GeoTransform {
        self.transform
    }

    pub fn map(&self, column: f64, row: f64) -> Coord<f64> {
        let [x0, dx_col, dx_row, y0, dy_col, dy_row] = self.transform.0;
        Coord {
            x: x0 + column * dx_col + row * dx_row,
            y: y0 + column * dy_col + row * dy_row,
        }
    }

    pub fn map_pixel(&self, column: i32, row: i32) -> Coord<f64> {
        self.map(f64::from(column), f64::from(row))
    }
}
