use tracing::debug;

use crate::{
    config::{BackgroundPolicy, DEFAULT_SELECTION_PERCENTAGE},
    traits::ContourSelector,
    types::{BoundaryKind, ContourSet},
};

/// Guards `(1 - p) * n` against landing just under an integer.
const COUNT_EPSILON: f64 = 1e-9;

/// Ranks contours by area, drops the background boundary and the smallest
/// noise blobs.
///
/// The sort is stable, so equal areas keep their extraction order. Fewer than
/// two contours means no cloud and yields an empty set. A traced canvas frame
/// is never retained, whatever the background policy.
#[derive(Debug, Clone)]
pub struct AreaRankSelector {
    /// Fraction in (0, 1] of the remaining contours to keep, largest first.
    pub selection_percentage: f64,
    pub background_policy: BackgroundPolicy,
}

impl Default for AreaRankSelector {
    fn default() -> Self {
        Self {
            selection_percentage: DEFAULT_SELECTION_PERCENTAGE,
            background_policy: BackgroundPolicy::default(),
        }
    }
}

impl AreaRankSelector {
    /// How many of `remaining` contours survive noise filtering.
    pub fn retained_count(&self, remaining: usize) -> usize {
        let dropped = ((1.0 - self.selection_percentage) * remaining as f64 + COUNT_EPSILON).floor();
        remaining.saturating_sub(dropped.max(0.0) as usize)
    }

    fn drops_largest(&self, largest_area: f64, canvas_area: f64) -> bool {
        match self.background_policy {
            BackgroundPolicy::DiscardLargest => true,
            BackgroundPolicy::DiscardCanvasMatch { min_coverage } => {
                canvas_area > 0.0 && largest_area >= min_coverage * canvas_area
            }
            BackgroundPolicy::Keep => false,
        }
    }
}

impl ContourSelector for AreaRankSelector {
    fn select(&self, contours: ContourSet, canvas: (u32, u32)) -> ContourSet {
        if contours.len() < 2 {
            debug!(contours = contours.len(), "too few contours, nothing selected");
            return ContourSet::new();
        }

        let total = contours.len();
        let (contours, areas) = contours.into_parts();
        let mut ranked: Vec<usize> = (0..total).collect();
        ranked.sort_by(|&a, &b| areas[b].total_cmp(&areas[a]));

        // coverage is measured on the grid the tracer drew its frame on
        let canvas_area = contours
            .iter()
            .position(|contour| contour.kind == BoundaryKind::Frame)
            .map_or_else(
                || f64::from(canvas.0) * f64::from(canvas.1),
                |index| areas[index],
            );

        let skip = usize::from(self.drops_largest(areas[ranked[0]], canvas_area));
        let candidates: Vec<usize> = ranked[skip..]
            .iter()
            .copied()
            .filter(|&index| contours[index].kind != BoundaryKind::Frame)
            .collect();
        let keep = self.retained_count(candidates.len());

        let mut selected: Vec<usize> = candidates[..keep].to_vec();
        // back to extraction order
        selected.sort_unstable();

        let mut slots: Vec<Option<_>> = contours.into_iter().map(Some).collect();
        let set: ContourSet = selected
            .into_iter()
            .filter_map(|index| slots[index].take().map(|contour| (contour, areas[index])))
            .collect();

        debug!(
            traced = total,
            background_dropped = skip,
            frames_dropped = total - skip - candidates.len(),
            retained = set.len(),
            "contours selected"
        );
        set
    }
}
