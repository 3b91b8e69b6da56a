use geo_types::Coord;
use serde::{Deserialize, Serialize};

/// Ties an image position (`pixel` = column, `line` = row) to a world
/// coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundControlPoint {
    pub pixel: f64,
    pub line: f64,
    pub x: f64,
    pub y: f64,
}

impl GroundControlPoint {
    pub fn new(pixel: f64, line: f64, world: Coord<f64>) -> Self {
        Self {
            pixel,
            line,
            x: world.x,
            y: world.y,
        }
    }
}

/// Pairs the image corners `(0, 0)`, `(cols, 0)`, `(cols, rows)`,
/// `(0, rows)` with world corners given upper-left first, clockwise.
pub fn corner_gcps(columns: u32, rows: u32, corners: [Coord<f64>; 4]) -> Vec<GroundControlPoint> {
    let (w, h) = (f64::from(columns), f64::from(rows));
    [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)]
        .into_iter()
        .zip(corners)
        .map(|((pixel, line), world)| GroundControlPoint::new(pixel, line, world))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_corners_pair_in_order() {
        let corners = [
            Coord { x: 1.0, y: 4.0 },
            Coord { x: 3.0, y: 4.0 },
            Coord { x: 3.0, y: 2.0 },
            Coord { x: 1.0, y: 2.0 },
        ];
        let gcps = corner_gcps(640, 480, corners);
        assert_eq!(gcps.len(), 4);
        assert_eq!(gcps[0], GroundControlPoint { pixel: 0.0, line: 0.0, x: 1.0, y: 4.0 });
        assert_eq!(gcps[2], GroundControlPoint { pixel: 640.0, line: 480.0, x: 3.0, y: 2.0 });
        assert_eq!((gcps[3].pixel, gcps[3].line), (0.0, 480.0));
    }
}
