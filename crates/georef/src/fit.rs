use cloudmask::GeoTransform;
use nalgebra::{Matrix3, Vector3};
use tracing::debug;

use crate::{
    error::{GeorefError, Result},
    gcp::GroundControlPoint,
};

/// Relative determinant below which the normal equations count as singular.
const SINGULAR_EPS: f64 = 1e-12;

/// Least-squares affine geotransform through the control points.
///
/// Solves the 3 × 3 normal equations of `[1 pixel line] · a = x` and
/// `[1 pixel line] · b = y`; exact when the points are related by an affine
/// map.
pub fn fit_geotransform(gcps: &[GroundControlPoint]) -> Result<GeoTransform> {
    if gcps.len() < 3 {
        return Err(GeorefError::InsufficientGcps(gcps.len()));
    }

    let mut normal = Matrix3::<f64>::zeros();
    let mut rhs_x = Vector3::<f64>::zeros();
    let mut rhs_y = Vector3::<f64>::zeros();
    for gcp in gcps {
        let row = Vector3::new(1.0, gcp.pixel, gcp.line);
        normal += row * row.transpose();
        rhs_x += row * gcp.x;
        rhs_y += row * gcp.y;
    }

    let scale = normal.norm().powi(3);
    let determinant = normal.determinant();
    if !determinant.is_finite() || determinant.abs() <= SINGULAR_EPS * scale {
        return Err(GeorefError::SingularFit);
    }
    let inverse = normal.try_inverse().ok_or(GeorefError::SingularFit)?;

    let a = inverse * rhs_x;
    let b = inverse * rhs_y;
    let coefficients = [a[0], a[1], a[2], b[0], b[1], b[2]];
    debug!(?coefficients, gcps = gcps.len(), "affine fit");

    Ok(GeoTransform::from_gdal(coefficients)?)
}
