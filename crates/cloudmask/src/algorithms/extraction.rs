//! Boundary tracing over binary masks.
//!
//! Both extractors return a flat [`ContourSet`]: outer boundaries and hole
//! boundaries side by side with no nesting, each simplified so that only the
//! vertices where the direction changes remain.

use imageproc::{contours::BorderType, point::Point};
use tracing::debug;

use crate::{
    error::Result,
    traits::ContourExtractor,
    types::{BinaryMask, BoundaryKind, Contour, ContourSet, PixelPoint},
};

/// Crack-following extractor: boundaries run along pixel edges.
///
/// Pixel `(c, r)` covers the square `[c, c + 1] × [r, r + 1]`, so vertices
/// sit on pixel corners and the shoelace area of a traced region equals its
/// pixel count. Cloud pixels are 8-connected: two cloud pixels touching only
/// at a corner belong to the same boundary. Outer boundaries run clockwise
/// on screen, holes counter-clockwise.
///
/// Contours are emitted in raster-scan order of their first top edge.
#[derive(Debug, Clone)]
pub struct PixelEdgeContourExtractor {
    /// Emit the raster frame as the first contour.
    pub trace_canvas_frame: bool,
}

impl Default for PixelEdgeContourExtractor {
    fn default() -> Self {
        Self {
            trace_canvas_frame: true,
        }
    }
}

/// Border following through boundary pixel centres via
/// `imageproc::contours::find_contours`, with collinear vertices removed.
#[derive(Debug, Clone)]
pub struct PixelCenterContourExtractor {
    /// Emit the raster frame as the first contour.
    pub trace_canvas_frame: bool,
}

impl Default for PixelCenterContourExtractor {
    fn default() -> Self {
        Self {
            trace_canvas_frame: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Heading {
    East,
    South,
    West,
    North,
}

impl Heading {
    const ALL: [Heading; 4] = [Heading::East, Heading::South, Heading::West, Heading::North];

    fn delta(self) -> (i64, i64) {
        match self {
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
            Self::North => (0, -1),
        }
    }

    /// Heading after a left turn, with y pointing down.
    fn left(self) -> Self {
        match self {
            Self::East => Self::North,
            Self::North => Self::West,
            Self::West => Self::South,
            Self::South => Self::East,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Directed boundary edges of a mask, keyed by start vertex.
struct CrackGrid<'a> {
    mask: &'a BinaryMask,
    width: i64,
    height: i64,
}

impl<'a> CrackGrid<'a> {
    fn new(mask: &'a BinaryMask) -> Self {
        Self {
            mask,
            width: i64::from(mask.width()),
            height: i64::from(mask.height()),
        }
    }

    /// Pixels outside the raster are background.
    fn cloud(&self, x: i64, y: i64) -> bool {
        x >= 0
            && y >= 0
            && x < self.width
            && y < self.height
            && self.mask.is_cloud(x as u32, y as u32)
    }

    /// Whether a boundary edge leaves vertex `(x, y)` with this heading.
    /// Edges keep cloud on their right-hand side.
    fn has_edge(&self, x: i64, y: i64, heading: Heading) -> bool {
        match heading {
            // top edge of pixel (x, y)
            Heading::East => self.cloud(x, y) && !self.cloud(x, y - 1),
            // right edge of pixel (x - 1, y)
            Heading::South => self.cloud(x - 1, y) && !self.cloud(x, y),
            // bottom edge of pixel (x - 1, y - 1)
            Heading::West => self.cloud(x - 1, y - 1) && !self.cloud(x - 1, y),
            // left edge of pixel (x, y - 1)
            Heading::North => self.cloud(x, y - 1) && !self.cloud(x - 1, y - 1),
        }
    }

    fn edge_index(&self, x: i64, y: i64, heading: Heading) -> usize {
        ((y * (self.width + 1) + x) as usize) * 4 + heading.index()
    }

    /// Successor of an edge arriving at `(x, y)` with `heading`. At a saddle
    /// vertex two edges leave; turning left keeps diagonal cloud pixels in
    /// one region.
    fn next_heading(&self, x: i64, y: i64, heading: Heading) -> Option<Heading> {
        let mut outgoing = Heading::ALL
            .into_iter()
            .filter(|&h| self.has_edge(x, y, h));
        match (outgoing.next(), outgoing.next()) {
            (None, _) => None,
            (Some(only), None) => Some(only),
            _ => Some(heading.left()),
        }
    }

    /// Follows the loop that starts with the east edge leaving `(x, y)`,
    /// marking its edges as visited. Returns the vertex and heading of every
    /// edge in traversal order.
    fn trace(&self, x: i64, y: i64, visited: &mut [bool]) -> Vec<(PixelPoint, Heading)> {
        let mut steps = Vec::new();
        let (mut cx, mut cy, mut heading) = (x, y, Heading::East);

        loop {
            let index = self.edge_index(cx, cy, heading);
            if visited[index] {
                break;
            }
            visited[index] = true;
            steps.push((Point::new(cx as i32, cy as i32), heading));

            let (dx, dy) = heading.delta();
            cx += dx;
            cy += dy;
            match self.next_heading(cx, cy, heading) {
                Some(next) => heading = next,
                None => break,
            }
        }

        steps
    }
}

/// Keeps the vertices where the heading changes.
fn corners(steps: &[(PixelPoint, Heading)]) -> Vec<PixelPoint> {
    let n = steps.len();
    (0..n)
        .filter(|&i| steps[(i + n - 1) % n].1 != steps[i].1)
        .map(|i| steps[i].0)
        .collect()
}

impl ContourExtractor for PixelEdgeContourExtractor {
    fn extract_contours(&self, mask: &BinaryMask) -> Result<ContourSet> {
        let grid = CrackGrid::new(mask);
        let mut visited = vec![false; ((grid.width + 1) * (grid.height + 1)) as usize * 4];
        let mut set = ContourSet::new();

        if self.trace_canvas_frame {
            set.push(canvas_frame(mask.width() as i32, mask.height() as i32));
        }

        for y in 0..grid.height {
            for x in 0..grid.width {
                if !grid.has_edge(x, y, Heading::East)
                    || visited[grid.edge_index(x, y, Heading::East)]
                {
                    continue;
                }

                let steps = grid.trace(x, y, &mut visited);
                let points = corners(&steps);
                let signed = crate::types::shoelace_area(&points);
                let kind = if signed >= 0.0 {
                    BoundaryKind::Outer
                } else {
                    BoundaryKind::Hole
                };
                set.push_with_area(Contour::new(points, kind), signed.abs());
            }
        }

        debug!(contours = set.len(), "pixel-edge tracing finished");
        Ok(set)
    }
}

impl ContourExtractor for PixelCenterContourExtractor {
    fn extract_contours(&self, mask: &BinaryMask) -> Result<ContourSet> {
        let mut set = ContourSet::new();

        if self.trace_canvas_frame {
            let (width, height) = (mask.width() as i32, mask.height() as i32);
            set.push(canvas_frame(width - 1, height - 1));
        }

        for contour in imageproc::contours::find_contours::<i32>(mask.as_image()) {
            let kind = match contour.border_type {
                BorderType::Outer => BoundaryKind::Outer,
                BorderType::Hole => BoundaryKind::Hole,
            };
            set.push(Contour::new(remove_collinear(&contour.points), kind));
        }

        debug!(contours = set.len(), "pixel-centre tracing finished");
        Ok(set)
    }
}

/// Closed rectangle from `(0, 0)` to `(max_x, max_y)`, clockwise on screen.
/// Collapses to fewer vertices for zero-sized extents.
fn canvas_frame(max_x: i32, max_y: i32) -> Contour {
    let mut points = vec![
        Point::new(0, 0),
        Point::new(max_x, 0),
        Point::new(max_x, max_y),
        Point::new(0, max_y),
    ];
    points.dedup();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    Contour::new(points, BoundaryKind::Frame)
}

/// Drops vertices lying on the straight segment between their neighbours,
/// treating the sequence as a closed ring. Repeated points are dropped too.
pub fn remove_collinear(points: &[PixelPoint]) -> Vec<PixelPoint> {
    let mut ring: Vec<PixelPoint> = points.to_vec();
    ring.dedup();
    while ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    if ring.len() < 3 {
        return ring;
    }

    let n = ring.len();
    let kept: Vec<PixelPoint> = (0..n)
        .filter(|&i| {
            let prev = ring[(i + n - 1) % n];
            let here = ring[i];
            let next = ring[(i + 1) % n];
            let cross = i64::from(here.x - prev.x) * i64::from(next.y - here.y)
                - i64::from(here.y - prev.y) * i64::from(next.x - here.x);
            let same_direction = i64::from(here.x - prev.x) * i64::from(next.x - here.x)
                + i64::from(here.y - prev.y) * i64::from(next.y - here.y)
                > 0;
            !(cross == 0 && same_direction)
        })
        .map(|i| ring[i])
        .collect();

    if kept.is_empty() { ring } else { kept }
}
