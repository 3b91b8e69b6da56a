use crate::{
    algorithms::{
        AreaRankSelector, KMeansSegmenter, MedianDenoiser, PixelCenterContourExtractor,
        PixelEdgeContourExtractor,
    },
    config::{ContourStrategy, DegeneratePolicy, DetectionConfig},
    error::Result,
    pipeline::Pipeline,
    render::MaskRenderer,
    traits::{ContourExtractor, ContourSelector, Denoiser, Segmenter},
};

/// Builder for creating detection pipelines with a fluent API
pub struct PipelineBuilder {
    segmenter: Option<Box<dyn Segmenter>>,
    denoiser: Option<Box<dyn Denoiser>>,
    contour_extractor: Option<Box<dyn ContourExtractor>>,
    selector: Option<Box<dyn ContourSelector>>,
    renderer: MaskRenderer,
    degenerate_policy: DegeneratePolicy,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            segmenter: None,
            denoiser: None,
            contour_extractor: None,
            selector: None,
            renderer: MaskRenderer::default(),
            degenerate_policy: DegeneratePolicy::default(),
        }
    }

    /// Validate `config` and set every stage from it.
    pub fn from_config(config: &DetectionConfig) -> Result<Self> {
        config.validate()?;

        let builder = Self::new()
            .set_segmenter(KMeansSegmenter::new(config.cluster_count, config.max_iterations))
            .set_denoiser(MedianDenoiser {
                kernel_size: config.denoise_kernel_size,
            })
            .with_contour_strategy(config.contour_strategy, config.trace_canvas_frame)
            .set_selector(AreaRankSelector {
                selection_percentage: config.selection_percentage,
                background_policy: config.background_policy,
            })
            .with_degenerate_policy(config.degenerate_policy);

        Ok(builder)
    }

    /// Set the segmenter (replaces any existing one)
    pub fn set_segmenter<S>(mut self, segmenter: S) -> Self
    where
        S: Segmenter + 'static,
    {
        self.segmenter = Some(Box::new(segmenter));
        self
    }

    /// Set the denoiser (replaces any existing one)
    pub fn set_denoiser<D>(mut self, denoiser: D) -> Self
    where
        D: Denoiser + 'static,
    {
        self.denoiser = Some(Box::new(denoiser));
        self
    }

    /// Set the contour extractor (replaces any existing one)
    pub fn set_contour_extractor<E>(mut self, extractor: E) -> Self
    where
        E: ContourExtractor + 'static,
    {
        self.contour_extractor = Some(Box::new(extractor));
        self
    }

    /// Set the contour selector (replaces any existing one)
    pub fn set_selector<S>(mut self, selector: S) -> Self
    where
        S: ContourSelector + 'static,
    {
        self.selector = Some(Box::new(selector));
        self
    }

    /// Pick one of the built-in contour extractors
    pub fn with_contour_strategy(self, strategy: ContourStrategy, trace_canvas_frame: bool) -> Self {
        match strategy {
            ContourStrategy::PixelEdge => {
                self.set_contour_extractor(PixelEdgeContourExtractor { trace_canvas_frame })
            }
            ContourStrategy::PixelCenter => {
                self.set_contour_extractor(PixelCenterContourExtractor { trace_canvas_frame })
            }
        }
    }

    pub fn with_renderer(mut self, renderer: MaskRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_degenerate_policy(mut self, policy: DegeneratePolicy) -> Self {
        self.degenerate_policy = policy;
        self
    }

    /// Build the pipeline with default components if not specified
    pub fn build(self) -> Pipeline {
        let segmenter = self
            .segmenter
            .unwrap_or_else(|| Box::new(KMeansSegmenter::default()));
        let denoiser = self
            .denoiser
            .unwrap_or_else(|| Box::new(MedianDenoiser::default()));
        let contour_extractor = self
            .contour_extractor
            .unwrap_or_else(|| Box::new(PixelEdgeContourExtractor::default()));
        let selector = self
            .selector
            .unwrap_or_else(|| Box::new(AreaRankSelector::default()));

        Pipeline::new(
            segmenter,
            denoiser,
            contour_extractor,
            selector,
            self.renderer,
            self.degenerate_policy,
        )
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::CloudMaskError,
        geo_transform::GeoTransform,
        types::{BinaryMask, RasterImage},
    };
    use image::{GrayImage, Luma};

    /// Labels every pixel brighter than a fixed threshold as cloud.
    struct ThresholdSegmenter(u8);

    impl Segmenter for ThresholdSegmenter {
        fn segment(&self, raster: &RasterImage) -> Result<BinaryMask> {
            Ok(BinaryMask::from_fn(raster.width(), raster.height(), |x, y| {
                raster.pixel(x, y)[0] > self.0
            }))
        }
    }

    #[test]
    fn custom_stages_replace_defaults() {
        let mut image = GrayImage::from_pixel(30, 30, Luma([100]));
        for y in 10..20 {
            for x in 10..20 {
                image.put_pixel(x, y, Luma([200]));
            }
        }
        let raster = RasterImage::from_gray(&image).expect("valid raster");

        let pipeline = PipelineBuilder::new()
            .set_segmenter(ThresholdSegmenter(150))
            .set_denoiser(MedianDenoiser { kernel_size: 3 })
            .build();
        let result = pipeline
            .process(&raster, &GeoTransform::NORTH_UP_PIXELS)
            .expect("Should process");
        assert_eq!(result.mask.cloud_pixel_count(), 100);
        assert_eq!(result.cloud_count(), 1);
    }

    #[test]
    fn from_config_validates() {
        let config = DetectionConfig {
            denoise_kernel_size: 4,
            ..Default::default()
        };
        assert!(matches!(
            PipelineBuilder::from_config(&config),
            Err(CloudMaskError::Config(_))
        ));
    }

    #[test]
    fn pixel_center_strategy_is_selectable() {
        let config = DetectionConfig {
            contour_strategy: ContourStrategy::PixelCenter,
            denoise_kernel_size: 3,
            selection_percentage: 1.0,
            ..Default::default()
        };
        let mut image = GrayImage::new(25, 25);
        for y in 5..15 {
            for x in 5..15 {
                image.put_pixel(x, y, Luma([255]));
            }
        }
        let result = PipelineBuilder::from_config(&config)
            .expect("valid config")
            .build()
            .process(
                &RasterImage::from_gray(&image).expect("valid raster"),
                &GeoTransform::NORTH_UP_PIXELS,
            )
            .expect("Should process");
        assert_eq!(result.cloud_count(), 1);
        // centre-traced 10x10 block spans 9x9, less the four filtered corners
        assert_eq!(result.geometry.pixel_areas[0], 81.0 - 2.0);
    }
}
