use tracing::debug;

use crate::{
    config::{validate_kernel_size, DEFAULT_DENOISE_KERNEL_SIZE},
    error::Result,
    traits::Denoiser,
    types::BinaryMask,
};

/// Median rank filter over a square window.
///
/// Wraps `imageproc::filter::median_filter`, which pads by replicating the
/// nearest border pixel, so the output keeps the mask's extent.
#[derive(Debug, Clone)]
pub struct MedianDenoiser {
    /// Window side in pixels; odd and at least 3.
    pub kernel_size: u32,
}

impl Default for MedianDenoiser {
    fn default() -> Self {
        Self {
            kernel_size: DEFAULT_DENOISE_KERNEL_SIZE,
        }
    }
}

impl Denoiser for MedianDenoiser {
    fn denoise(&self, mask: &BinaryMask) -> Result<BinaryMask> {
        validate_kernel_size(self.kernel_size)?;

        let radius = self.kernel_size / 2;
        let filtered = imageproc::filter::median_filter(mask.as_image(), radius, radius);
        let denoised = BinaryMask::from_labels(filtered);

        debug!(
            kernel_size = self.kernel_size,
            before = mask.cloud_pixel_count(),
            after = denoised.cloud_pixel_count(),
            "median filter applied"
        );

        Ok(denoised)
    }
}
