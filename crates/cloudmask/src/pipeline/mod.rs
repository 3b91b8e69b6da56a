pub mod builder;

use geo_types::{LineString, MultiPolygon};
use image::RgbImage;
use tracing::{debug, info};

use crate::{
    algorithms::HullBuilder,
    config::{DegeneratePolicy, DetectionConfig},
    error::Result,
    geo_transform::GeoTransform,
    geometry::{CloudGeometry, GeometryBuilder},
    render::MaskRenderer,
    traits::{ContourExtractor, ContourSelector, Denoiser, Segmenter},
    types::{BinaryMask, ContourSet, RasterImage},
};

/// Everything a detection run produces.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub image_width: u32,
    pub image_height: u32,
    /// Raw k-means labels.
    pub mask: BinaryMask,
    /// Labels after the median filter; contours are traced from this.
    pub denoised: BinaryMask,
    /// Number of contours traced before selection.
    pub traced: usize,
    /// Retained contours, in extraction order.
    pub contours: ContourSet,
    /// Pixel-space convex hull of each retained contour.
    pub hulls: Vec<LineString<f64>>,
    pub geometry: CloudGeometry,
    /// Contours and hulls drawn on a black canvas.
    pub rendered: RgbImage,
}

impl DetectionResult {
    pub fn multipolygon(&self) -> &MultiPolygon<f64> {
        &self.geometry.multipolygon
    }

    pub fn cloud_count(&self) -> usize {
        self.geometry.len()
    }
}

/// Linear cloud detection pipeline:
/// segment → denoise → trace → select → {hulls → render, georeference}.
pub struct Pipeline {
    segmenter: Box<dyn Segmenter>,
    denoiser: Box<dyn Denoiser>,
    contour_extractor: Box<dyn ContourExtractor>,
    selector: Box<dyn ContourSelector>,
    hull_builder: HullBuilder,
    renderer: MaskRenderer,
    degenerate_policy: DegeneratePolicy,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Validated pipeline with every stage configured from `config`.
    pub fn from_config(config: &DetectionConfig) -> Result<Self> {
        Ok(builder::PipelineBuilder::from_config(config)?.build())
    }

    pub fn new(
        segmenter: Box<dyn Segmenter>,
        denoiser: Box<dyn Denoiser>,
        contour_extractor: Box<dyn ContourExtractor>,
        selector: Box<dyn ContourSelector>,
        renderer: MaskRenderer,
        degenerate_policy: DegeneratePolicy,
    ) -> Self {
        Self {
            segmenter,
            denoiser,
            contour_extractor,
            selector,
            hull_builder: HullBuilder,
            renderer,
            degenerate_policy,
        }
    }

    /// Run every stage over one raster. Any stage error aborts the run.
    pub fn process(&self, raster: &RasterImage, transform: &GeoTransform) -> Result<DetectionResult> {
        let mask = self.segmenter.segment(raster)?;
        debug!(cloud_pixels = mask.cloud_pixel_count(), "segmented");

        let denoised = self.denoiser.denoise(&mask)?;
        debug!(cloud_pixels = denoised.cloud_pixel_count(), "denoised");

        let canvas = denoised.dimensions();
        let traced = self.contour_extractor.extract_contours(&denoised)?;
        let traced_count = traced.len();
        debug!(contours = traced_count, "contours traced");

        let contours = self.selector.select(traced, canvas);
        debug!(contours = contours.len(), "contours selected");

        let hulls = self.hull_builder.build(&contours);
        let rendered = self.renderer.render(canvas, &contours, &hulls);

        let geometry = GeometryBuilder::new(transform.mapper())
            .with_degenerate_policy(self.degenerate_policy)
            .build(&contours)?;

        info!(
            width = raster.width(),
            height = raster.height(),
            cloud_pixels = denoised.cloud_pixel_count(),
            traced = traced_count,
            retained = contours.len(),
            polygons = geometry.len(),
            skipped = geometry.skipped,
            "cloud detection finished"
        );

        Ok(DetectionResult {
            image_width: raster.width(),
            image_height: raster.height(),
            mask,
            denoised,
            traced: traced_count,
            contours,
            hulls,
            geometry,
            rendered,
        })
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!(
            "Pipeline: segment, denoise, trace, select, {} degenerate rings",
            self.degenerate_policy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{BackgroundPolicy, ContourStrategy},
        types::BoundaryKind,
    };
    use image::{GrayImage, Luma};

    fn raster_with_blocks() -> RasterImage {
        let mut image = GrayImage::from_pixel(60, 40, Luma([20]));
        for (x0, y0, side) in [(5, 5, 12), (30, 10, 8), (45, 25, 10)] {
            for y in y0..y0 + side {
                for x in x0..x0 + side {
                    image.put_pixel(x, y, Luma([230]));
                }
            }
        }
        RasterImage::from_gray(&image).expect("valid raster")
    }

    fn config() -> DetectionConfig {
        DetectionConfig {
            denoise_kernel_size: 3,
            selection_percentage: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn finds_every_block() {
        let pipeline = Pipeline::from_config(&config()).expect("Should build pipeline");
        let result = pipeline
            .process(&raster_with_blocks(), &GeoTransform::NORTH_UP_PIXELS)
            .expect("Should process");

        // frame + three blocks traced, frame dropped
        assert_eq!(result.traced, 4);
        assert_eq!(result.cloud_count(), 3);
        assert_eq!(result.hulls.len(), 3);
        assert_eq!(result.rendered.dimensions(), (60, 40));
        assert_eq!(result.mask.dimensions(), (60, 40));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = DetectionConfig {
            cluster_count: 1,
            ..Default::default()
        };
        assert!(Pipeline::from_config(&config).is_err());
    }

    #[test]
    fn blank_raster_gives_no_polygons() {
        let raster = RasterImage::from_gray(&GrayImage::from_pixel(20, 20, Luma([0])))
            .expect("valid raster");
        let result = Pipeline::from_config(&config())
            .expect("Should build pipeline")
            .process(&raster, &GeoTransform::NORTH_UP_PIXELS)
            .expect("Should process");
        assert!(result.multipolygon().0.is_empty());
        assert!(result.rendered.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    fn raster_with_one_block() -> RasterImage {
        let image = GrayImage::from_fn(60, 40, |x, y| {
            let inside = (10..30).contains(&x) && (10..25).contains(&y);
            Luma([if inside { 230 } else { 20 }])
        });
        RasterImage::from_gray(&image).expect("valid raster")
    }

    fn assert_single_cloud_without_frame(config: &DetectionConfig) {
        let result = Pipeline::from_config(config)
            .expect("Should build pipeline")
            .process(&raster_with_one_block(), &GeoTransform::NORTH_UP_PIXELS)
            .expect("Should process");

        assert_eq!(result.traced, 2);
        assert_eq!(result.cloud_count(), 1);
        assert!(result
            .contours
            .contours()
            .iter()
            .all(|contour| contour.kind != BoundaryKind::Frame));
        // block of 300 pixels, minus the corners the median filter rounds off
        assert!(result.geometry.pixel_areas[0] < 300.0);
    }

    #[test]
    fn keeping_the_largest_still_leaves_out_the_frame() {
        assert_single_cloud_without_frame(&DetectionConfig {
            background_policy: BackgroundPolicy::Keep,
            ..config()
        });
    }

    #[test]
    fn full_canvas_match_drops_the_centre_traced_frame() {
        assert_single_cloud_without_frame(&DetectionConfig {
            contour_strategy: ContourStrategy::PixelCenter,
            background_policy: BackgroundPolicy::DiscardCanvasMatch { min_coverage: 1.0 },
            ..config()
        });
    }
}
