use std::collections::BTreeMap;

use image::GrayImage;
use tracing::debug;

use crate::{
    config::{DEFAULT_CLUSTER_COUNT, DEFAULT_MAX_ITERATIONS},
    error::{CloudMaskError, Result},
    traits::Segmenter,
    types::{BinaryMask, RasterImage},
};

/// Two centres closer than this in mean intensity are considered equal.
const INTENSITY_EPSILON: f64 = 1e-9;

/// Outcome of a k-means run over a raster.
#[derive(Debug, Clone)]
pub struct Clustering {
    /// Cluster centres, one channel vector each.
    pub centers: Vec<Vec<f64>>,
    /// Index of the centre labelled as cloud, if any centre stands out.
    pub cloud_cluster: Option<usize>,
    pub iterations: usize,
    pub mask: BinaryMask,
}

/// Unsupervised cloud segmentation by k-means over per-pixel channel vectors.
///
/// Clustering runs on the distinct channel vectors of the raster weighted by
/// how often each occurs, which keeps 8-bit imagery cheap to cluster and the
/// result independent of pixel order. Initial centres are chosen by maximin:
/// the darkest vector first, then repeatedly the vector farthest from its
/// nearest centre.
///
/// The cluster whose centre has the highest mean intensity is cloud. When no
/// centre is strictly brighter than all others (a uniform image), nothing is
/// cloud.
#[derive(Debug, Clone)]
pub struct KMeansSegmenter {
    pub cluster_count: usize,
    pub max_iterations: usize,
}

impl Default for KMeansSegmenter {
    fn default() -> Self {
        Self {
            cluster_count: DEFAULT_CLUSTER_COUNT,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl KMeansSegmenter {
    pub fn new(cluster_count: usize, max_iterations: usize) -> Self {
        Self {
            cluster_count,
            max_iterations,
        }
    }

    pub fn cluster(&self, raster: &RasterImage) -> Result<Clustering> {
        if raster.pixel_count() == 0 {
            return Err(CloudMaskError::load("cannot segment an empty raster"));
        }
        if raster.channels() == 0 {
            return Err(CloudMaskError::load("cannot segment a raster without channels"));
        }
        if self.cluster_count < 2 {
            return Err(CloudMaskError::config(format!(
                "cluster_count must be at least 2, got {}",
                self.cluster_count
            )));
        }

        let mut counts: BTreeMap<&[u8], usize> = BTreeMap::new();
        for pixel in raster.pixels() {
            *counts.entry(pixel).or_insert(0) += 1;
        }
        let samples: Vec<(&[u8], usize)> = counts.into_iter().collect();
        let points: Vec<Vec<f64>> = samples
            .iter()
            .map(|(sample, _)| sample.iter().map(|&v| f64::from(v)).collect())
            .collect();
        let weights: Vec<f64> = samples.iter().map(|&(_, count)| count as f64).collect();

        let mut centers = maximin_centers(&points, self.cluster_count);
        let mut assignment = vec![usize::MAX; points.len()];
        let mut iterations = 0;

        while iterations < self.max_iterations.max(1) {
            iterations += 1;

            let mut changed = false;
            for (slot, point) in assignment.iter_mut().zip(&points) {
                let nearest = nearest_center(point, &centers);
                if *slot != nearest {
                    *slot = nearest;
                    changed = true;
                }
            }
            if !changed {
                break;
            }

            update_centers(&mut centers, &points, &weights, &assignment);
        }

        let cloud_cluster = brightest_cluster(&centers);

        let labels: Vec<u8> = raster
            .pixels()
            .map(|pixel| {
                let index = samples
                    .binary_search_by(|(sample, _)| (*sample).cmp(pixel))
                    .map_err(|_| CloudMaskError::load("pixel missing from sample table"))?;
                Ok(u8::from(Some(assignment[index]) == cloud_cluster))
            })
            .collect::<Result<_>>()?;
        let labels = GrayImage::from_raw(raster.width(), raster.height(), labels)
            .ok_or_else(|| CloudMaskError::load("label buffer does not match raster extent"))?;

        debug!(
            clusters = self.cluster_count,
            distinct_samples = points.len(),
            iterations,
            ?cloud_cluster,
            "k-means finished"
        );

        Ok(Clustering {
            centers,
            cloud_cluster,
            iterations,
            mask: BinaryMask::from_labels(labels),
        })
    }
}

impl Segmenter for KMeansSegmenter {
    fn segment(&self, raster: &RasterImage) -> Result<BinaryMask> {
        Ok(self.cluster(raster)?.mask)
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn mean_intensity(center: &[f64]) -> f64 {
    center.iter().sum::<f64>() / center.len() as f64
}

/// Nearest centre; ties go to the lowest index.
fn nearest_center(point: &[f64], centers: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (index, center) in centers.iter().enumerate() {
        let distance = squared_distance(point, center);
        if distance < best_distance {
            best = index;
            best_distance = distance;
        }
    }
    best
}

fn maximin_centers(points: &[Vec<f64>], k: usize) -> Vec<Vec<f64>> {
    let mut first = 0;
    for (index, point) in points.iter().enumerate() {
        if mean_intensity(point) < mean_intensity(&points[first]) {
            first = index;
        }
    }

    let mut centers = vec![points[first].clone()];
    let mut nearest: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &points[first]))
        .collect();

    while centers.len() < k {
        let mut farthest = 0;
        for (index, distance) in nearest.iter().enumerate() {
            if *distance > nearest[farthest] {
                farthest = index;
            }
        }
        let center = points[farthest].clone();
        for (slot, point) in nearest.iter_mut().zip(points) {
            *slot = slot.min(squared_distance(point, &center));
        }
        centers.push(center);
    }

    centers
}

/// Weighted means; a cluster that lost all members keeps its centre.
fn update_centers(centers: &mut [Vec<f64>], points: &[Vec<f64>], weights: &[f64], assignment: &[usize]) {
    let channels = points[0].len();
    let mut sums = vec![vec![0.0; channels]; centers.len()];
    let mut totals = vec![0.0; centers.len()];

    for ((point, &weight), &cluster) in points.iter().zip(weights).zip(assignment) {
        totals[cluster] += weight;
        for (sum, value) in sums[cluster].iter_mut().zip(point) {
            *sum += value * weight;
        }
    }

    for ((center, sum), total) in centers.iter_mut().zip(sums).zip(totals) {
        if total > 0.0 {
            *center = sum.into_iter().map(|s| s / total).collect();
        }
    }
}

fn brightest_cluster(centers: &[Vec<f64>]) -> Option<usize> {
    let means: Vec<f64> = centers.iter().map(|c| mean_intensity(c)).collect();
    let mut brightest = 0;
    for (index, mean) in means.iter().enumerate() {
        if *mean > means[brightest] {
            brightest = index;
        }
    }

    let stands_out = means
        .iter()
        .enumerate()
        .filter(|&(index, _)| index != brightest)
        .all(|(_, mean)| means[brightest] - mean > INTENSITY_EPSILON);

    stands_out.then_some(brightest)
}
