use geo::ConvexHull;
use geo_types::{Coord, LineString, MultiPoint, Point};

use crate::types::{Contour, ContourSet};

/// Convex hulls of retained contours, in pixel space.
///
/// Only the rendered overlay uses these; they never reach the vector output.
#[derive(Debug, Clone, Default)]
pub struct HullBuilder;

impl HullBuilder {
    /// Closed hull ring of one contour. Collinear or single-point input gives
    /// a degenerate ring, which is fine for drawing.
    pub fn hull(&self, contour: &Contour) -> LineString<f64> {
        let points: MultiPoint<f64> = contour
            .points
            .iter()
            .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
            .collect();
        points.convex_hull().exterior().clone()
    }

    pub fn build(&self, contours: &ContourSet) -> Vec<LineString<f64>> {
        contours.contours().iter().map(|c| self.hull(c)).collect()
    }
}

/// Drops the closing coordinate of a ring, if present.
pub(crate) fn open_ring(ring: &LineString<f64>) -> Vec<Coord<f64>> {
    let mut coords = ring.0.clone();
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    coords
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoundaryKind;
    use imageproc::point::Point as PixelPoint;

    #[test]
    fn hull_of_an_l_shape_fills_the_notch() {
        // L-shaped outline, clockwise on screen
        let contour = Contour::new(
            vec![
                PixelPoint::new(0, 0),
                PixelPoint::new(2, 0),
                PixelPoint::new(2, 2),
                PixelPoint::new(4, 2),
                PixelPoint::new(4, 4),
                PixelPoint::new(0, 4),
            ],
            BoundaryKind::Outer,
        );
        let hull = open_ring(&HullBuilder.hull(&contour));
        assert_eq!(hull.len(), 5);
        assert!(!hull.contains(&Coord { x: 2.0, y: 2.0 }));
        assert!(hull.contains(&Coord { x: 4.0, y: 2.0 }));
    }

    #[test]
    fn degenerate_contour_gives_a_degenerate_hull() {
        let contour = Contour::new(vec![PixelPoint::new(3, 3)], BoundaryKind::Outer);
        let hull = open_ring(&HullBuilder.hull(&contour));
        assert!(hull.len() <= 1);
    }

    #[test]
    fn builds_one_hull_per_contour() {
        let set: ContourSet = (1..4)
            .map(|s| {
                Contour::new(
                    vec![
                        PixelPoint::new(0, 0),
                        PixelPoint::new(s, 0),
                        PixelPoint::new(0, s),
                    ],
                    BoundaryKind::Outer,
                )
            })
            .collect();
        assert_eq!(HullBuilder.build(&set).len(), 3);
    }
}
