use image::{DynamicImage, GrayImage, Luma, RgbImage};
use imageproc::point::Point;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::error::{CloudMaskError, Result};

/// Integer pixel-space vertex. `x` is the column, `y` the row.
pub type PixelPoint = Point<i32>;

/// An 8-bit raster of `height × width × channels` interleaved samples.
///
/// Immutable once built; the pipeline only ever borrows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    channels: usize,
    samples: Vec<u8>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32, channels: usize, samples: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(CloudMaskError::load(format!(
                "raster is empty ({width}x{height})"
            )));
        }
        if channels == 0 {
            return Err(CloudMaskError::load("raster has zero channels"));
        }
        let expected = width as usize * height as usize * channels;
        if samples.len() != expected {
            return Err(CloudMaskError::load(format!(
                "raster sample buffer has {} values, expected {expected}",
                samples.len()
            )));
        }

        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    pub fn from_gray(image: &GrayImage) -> Result<Self> {
        Self::new(image.width(), image.height(), 1, image.as_raw().clone())
    }

    pub fn from_rgb(image: &RgbImage) -> Result<Self> {
        Self::new(image.width(), image.height(), 3, image.as_raw().clone())
    }

    /// Single-band images stay single-channel; everything else is read as RGB
    /// (alpha is dropped, 16-bit samples are scaled down to 8 bits).
    pub fn from_dynamic(image: &DynamicImage) -> Result<Self> {
        match image {
            DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_) => Self::from_gray(&image.to_luma8()),
            _ => Self::from_rgb(&image.to_rgb8()),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Channel vector of the pixel at column `x`, row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        match self.get_pixel(x, y) {
            Some(pixel) => pixel,
            None => panic!(
                "pixel ({x}, {y}) out of bounds for {}x{} raster",
                self.width, self.height
            ),
        }
    }

    /// Channel vector of the pixel at column `x`, row `y`, or `None` when the
    /// coordinates fall outside the raster.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y as usize * self.width as usize + x as usize) * self.channels;
        self.samples.get(start..start + self.channels)
    }

    /// Row-major iterator over per-pixel channel vectors.
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> {
        self.samples.chunks_exact(self.channels)
    }
}

/// Two-valued label grid: cloud = 1, background = 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask(GrayImage);

impl BinaryMask {
    pub const CLOUD: u8 = 1;
    pub const BACKGROUND: u8 = 0;

    /// Wraps a label image; any non-zero sample counts as cloud.
    pub fn from_labels(mut labels: GrayImage) -> Self {
        for pixel in labels.pixels_mut() {
            pixel.0[0] = u8::from(pixel.0[0] != 0);
        }
        Self(labels)
    }

    pub fn from_fn<F>(width: u32, height: u32, mut is_cloud: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        Self(GrayImage::from_fn(width, height, |x, y| {
            Luma([u8::from(is_cloud(x, y))])
        }))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn is_cloud(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y).0[0] == Self::CLOUD
    }

    pub fn cloud_pixel_count(&self) -> usize {
        self.0.pixels().filter(|p| p.0[0] == Self::CLOUD).count()
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_image(self) -> GrayImage {
        self.0
    }

    /// Stretches the labels to 0 / 255 for viewing.
    pub fn to_visual(&self) -> GrayImage {
        GrayImage::from_fn(self.width(), self.height(), |x, y| {
            Luma([if self.is_cloud(x, y) { 255 } else { 0 }])
        })
    }
}

/// Which side of a region a traced boundary belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BoundaryKind {
    /// Outer boundary of a cloud region.
    Outer,
    /// Boundary of a background pocket inside a cloud region.
    Hole,
    /// The raster frame itself.
    Frame,
}

/// A closed boundary as an ordered vertex sequence (traversal order).
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<PixelPoint>,
    pub kind: BoundaryKind,
}

impl Contour {
    pub fn new(points: Vec<PixelPoint>, kind: BoundaryKind) -> Self {
        Self { points, kind }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A ring needs at least three vertices.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 3
    }

    /// Enclosed area by the shoelace formula over the vertex list.
    pub fn area(&self) -> f64 {
        shoelace_area(&self.points).abs()
    }
}

/// Signed shoelace area. Positive for rings that run clockwise on screen
/// (x right, y down).
pub fn shoelace_area(points: &[PixelPoint]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y))
        .sum();

    twice as f64 / 2.0
}

/// Contours with their areas, index-aligned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContourSet {
    contours: Vec<Contour>,
    areas: Vec<f64>,
}

impl ContourSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a contour, computing its area.
    pub fn push(&mut self, contour: Contour) {
        let area = contour.area();
        self.push_with_area(contour, area);
    }

    pub fn push_with_area(&mut self, contour: Contour, area: f64) {
        self.contours.push(contour);
        self.areas.push(area);
    }

    pub fn len(&self) -> usize {
        self.contours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    pub fn areas(&self) -> &[f64] {
        &self.areas
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Contour, f64)> {
        self.contours.iter().zip(self.areas.iter().copied())
    }

    pub fn into_parts(self) -> (Vec<Contour>, Vec<f64>) {
        (self.contours, self.areas)
    }
}

impl FromIterator<(Contour, f64)> for ContourSet {
    fn from_iter<I: IntoIterator<Item = (Contour, f64)>>(iter: I) -> Self {
        let (contours, areas) = iter.into_iter().unzip();
        Self { contours, areas }
    }
}

impl FromIterator<Contour> for ContourSet {
    fn from_iter<I: IntoIterator<Item = Contour>>(iter: I) -> Self {
        let mut set = Self::new();
        for contour in iter {
            set.push(contour);
        }
        set
    }
}
