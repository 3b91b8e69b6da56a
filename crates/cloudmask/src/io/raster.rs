use std::{io::Cursor, path::Path};

use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::{
    error::{CloudMaskError, Result},
    types::RasterImage,
};

/// Decodes an image file into a raster. Grayscale inputs keep one channel;
/// everything else is read as 8-bit RGB.
pub fn load_raster<P: AsRef<Path>>(path: P) -> Result<RasterImage> {
    let path = path.as_ref();
    let image = image::open(path)
        .map_err(|err| CloudMaskError::load(format!("cannot read {}: {err}", path.display())))?;
    let raster = RasterImage::from_dynamic(&image)?;
    debug!(
        path = %path.display(),
        width = raster.width(),
        height = raster.height(),
        channels = raster.channels(),
        "raster loaded"
    );
    Ok(raster)
}

/// Encodes an image in memory, in the format implied by `path`'s extension.
pub fn encode_image<P: AsRef<Path>>(image: &DynamicImage, path: P) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let format = ImageFormat::from_path(path)?;
    // JPEG has no alpha channel
    let image = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => image.clone(),
    };

    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, format)?;
    Ok(bytes.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, RgbaImage};

    #[test]
    fn grayscale_files_load_single_channel() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("scene.png");
        GrayImage::from_pixel(8, 4, Luma([90]))
            .save(&path)
            .expect("Should save");

        let raster = load_raster(&path).expect("Should load");
        assert_eq!((raster.width(), raster.height(), raster.channels()), (8, 4, 1));
        assert_eq!(raster.pixel(3, 2), &[90]);
    }

    #[test]
    fn alpha_is_dropped() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("scene.png");
        RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 4]))
            .save(&path)
            .expect("Should save");

        let raster = load_raster(&path).expect("Should load");
        assert_eq!(raster.channels(), 3);
        assert_eq!(raster.pixel(0, 0), &[1, 2, 3]);
    }

    #[test]
    fn missing_file_is_a_load_error() {
        assert!(matches!(
            load_raster("/definitely/not/here.png"),
            Err(CloudMaskError::Load(_))
        ));
    }

    #[test]
    fn encodes_by_extension() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([0, 255, 0])));
        let png = encode_image(&image, "mask.png").expect("Should encode png");
        assert_eq!(&png[1..4], b"PNG");
        let jpeg = encode_image(&image, "mask.jpeg").expect("Should encode jpeg");
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        assert!(encode_image(&image, "mask.unknown").is_err());
    }
}
