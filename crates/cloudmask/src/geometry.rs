use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use tracing::warn;

use crate::{
    config::DegeneratePolicy,
    error::{CloudMaskError, Result},
    geo_transform::AffineMapper,
    types::{Contour, ContourSet},
};

/// Georeferenced cloud outlines.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudGeometry {
    /// One single-ring polygon per kept contour, in contour order.
    pub multipolygon: MultiPolygon<f64>,
    /// Pixel-space area of each polygon's source contour, index-aligned.
    pub pixel_areas: Vec<f64>,
    /// Contours left out for having fewer than three points.
    pub skipped: usize,
}

impl CloudGeometry {
    pub fn len(&self) -> usize {
        self.multipolygon.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.multipolygon.0.is_empty()
    }
}

/// Converts pixel contours into world-space polygons.
///
/// Every vertex goes through the mapper in traversal order; no resampling.
/// Holes are not modelled: each contour becomes its own exterior ring, and
/// `geo-types` closes the ring by repeating the first vertex.
#[derive(Debug, Clone)]
pub struct GeometryBuilder {
    pub mapper: AffineMapper,
    pub degenerate_policy: DegeneratePolicy,
}

impl GeometryBuilder {
    pub fn new(mapper: AffineMapper) -> Self {
        Self {
            mapper,
            degenerate_policy: DegeneratePolicy::default(),
        }
    }

    pub fn with_degenerate_policy(mut self, policy: DegeneratePolicy) -> Self {
        self.degenerate_policy = policy;
        self
    }

    pub fn ring(&self, contour: &Contour) -> Vec<Coord<f64>> {
        contour
            .points
            .iter()
            .map(|p| self.mapper.map_pixel(p.x, p.y))
            .collect()
    }

    pub fn polygon(&self, contour: &Contour) -> Result<Polygon<f64>> {
        if contour.is_degenerate() {
            return Err(CloudMaskError::geometry(format!(
                "contour with {} point(s) cannot form a ring",
                contour.len()
            )));
        }
        Ok(Polygon::new(LineString::new(self.ring(contour)), vec![]))
    }

    pub fn build(&self, contours: &ContourSet) -> Result<CloudGeometry> {
        let mut polygons = Vec::with_capacity(contours.len());
        let mut pixel_areas = Vec::with_capacity(contours.len());
        let mut skipped = 0;

        for (index, (contour, area)) in contours.iter().enumerate() {
            match (self.polygon(contour), self.degenerate_policy) {
                (Ok(polygon), _) => {
                    polygons.push(polygon);
                    pixel_areas.push(area);
                }
                (Err(_), DegeneratePolicy::Skip) => skipped += 1,
                (Err(err), DegeneratePolicy::Reject) => {
                    return Err(CloudMaskError::geometry(format!("contour {index}: {err}")));
                }
            }
        }

        if skipped > 0 {
            warn!(skipped, "degenerate contours left out of the multipolygon");
        }

        Ok(CloudGeometry {
            multipolygon: MultiPolygon::new(polygons),
            pixel_areas,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{geo_transform::GeoTransform, types::BoundaryKind};
    use imageproc::point::Point;

    fn mapper() -> AffineMapper {
        GeoTransform::from_gdal([500.0, 10.0, 0.0, 1000.0, 0.0, -10.0])
            .expect("valid transform")
            .mapper()
    }

    fn contours() -> ContourSet {
        vec![
            Contour::new(
                vec![Point::new(1, 1), Point::new(4, 1), Point::new(4, 3), Point::new(1, 3)],
                BoundaryKind::Outer,
            ),
            Contour::new(vec![Point::new(7, 7), Point::new(8, 7)], BoundaryKind::Outer),
            Contour::new(
                vec![Point::new(10, 2), Point::new(12, 5), Point::new(9, 5)],
                BoundaryKind::Hole,
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn vertices_follow_the_mapper_in_order() {
        let set = contours();
        let geometry = GeometryBuilder::new(mapper()).build(&set).expect("Should build");
        assert_eq!(geometry.len(), 2);

        let kept = [&set.contours()[0], &set.contours()[2]];
        for (polygon, contour) in geometry.multipolygon.0.iter().zip(kept) {
            let ring = &polygon.exterior().0;
            // closing vertex appended by geo-types
            assert_eq!(ring.len(), contour.len() + 1);
            assert_eq!(ring.first(), ring.last());
            for (vertex, point) in ring.iter().zip(&contour.points) {
                assert_eq!(*vertex, mapper().map_pixel(point.x, point.y));
            }
        }
    }

    #[test]
    fn skip_policy_counts_degenerate_contours() {
        let geometry = GeometryBuilder::new(mapper()).build(&contours()).expect("Should build");
        assert_eq!(geometry.skipped, 1);
        assert_eq!(geometry.pixel_areas, vec![6.0, 4.5]);
    }

    #[test]
    fn reject_policy_fails_the_build() {
        let result = GeometryBuilder::new(mapper())
            .with_degenerate_policy(DegeneratePolicy::Reject)
            .build(&contours());
        assert!(matches!(result, Err(CloudMaskError::Geometry(_))));
    }

    #[test]
    fn empty_set_gives_empty_multipolygon() {
        let geometry = GeometryBuilder::new(mapper())
            .build(&ContourSet::new())
            .expect("Should build");
        assert!(geometry.is_empty());
        assert_eq!(geometry.skipped, 0);
    }

    #[test]
    fn pixel_coordinates_scale_into_world_units() {
        let ring = GeometryBuilder::new(mapper()).ring(&contours().contours()[0]);
        assert_eq!(ring[0], Coord { x: 510.0, y: 990.0 });
        assert_eq!(ring[2], Coord { x: 540.0, y: 970.0 });
    }
}
