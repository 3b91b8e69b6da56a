use geo_types::{Coord, LineString};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

use crate::{algorithms::hull::open_ring, types::ContourSet};

pub const CONTOUR_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const HULL_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// Draws retained contours and their hulls as 1-pixel closed outlines on a
/// black canvas. Hulls are drawn last and win where the two overlap.
#[derive(Debug, Clone)]
pub struct MaskRenderer {
    pub contour_color: Rgb<u8>,
    pub hull_color: Rgb<u8>,
}

impl Default for MaskRenderer {
    fn default() -> Self {
        Self {
            contour_color: CONTOUR_COLOR,
            hull_color: HULL_COLOR,
        }
    }
}

impl MaskRenderer {
    pub fn render(
        &self,
        (width, height): (u32, u32),
        contours: &ContourSet,
        hulls: &[LineString<f64>],
    ) -> RgbImage {
        let mut canvas = RgbImage::new(width, height);

        for contour in contours.contours() {
            let ring: Vec<Coord<f64>> = contour
                .points
                .iter()
                .map(|p| Coord {
                    x: f64::from(p.x),
                    y: f64::from(p.y),
                })
                .collect();
            draw_closed(&mut canvas, &ring, self.contour_color);
        }

        for hull in hulls {
            draw_closed(&mut canvas, &open_ring(hull), self.hull_color);
        }

        canvas
    }
}

fn draw_closed(canvas: &mut RgbImage, ring: &[Coord<f64>], color: Rgb<u8>) {
    match ring {
        [] => {}
        [only] => {
            let p = (only.x as f32, only.y as f32);
            draw_line_segment_mut(canvas, p, p, color);
        }
        _ => {
            for (a, b) in ring.iter().zip(ring.iter().cycle().skip(1)) {
                draw_line_segment_mut(
                    canvas,
                    (a.x as f32, a.y as f32),
                    (b.x as f32, b.y as f32),
                    color,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        algorithms::HullBuilder,
        types::{BoundaryKind, Contour},
    };
    use imageproc::point::Point;

    fn square() -> ContourSet {
        vec![Contour::new(
            vec![
                Point::new(2, 2),
                Point::new(7, 2),
                Point::new(7, 7),
                Point::new(2, 7),
            ],
            BoundaryKind::Outer,
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn empty_selection_renders_black_canvas() {
        let image = MaskRenderer::default().render((12, 8), &ContourSet::new(), &[]);
        assert_eq!(image.dimensions(), (12, 8));
        assert!(image.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn draws_contour_outline_in_green() {
        let image = MaskRenderer::default().render((10, 10), &square(), &[]);
        assert_eq!(*image.get_pixel(2, 2), CONTOUR_COLOR);
        assert_eq!(*image.get_pixel(7, 5), CONTOUR_COLOR);
        assert_eq!(*image.get_pixel(4, 7), CONTOUR_COLOR);
        // interior stays black
        assert_eq!(*image.get_pixel(4, 4), Rgb([0, 0, 0]));
    }

    #[test]
    fn hulls_are_drawn_over_contours() {
        let contours = square();
        let hulls = HullBuilder.build(&contours);
        let image = MaskRenderer::default().render((10, 10), &contours, &hulls);
        // a square is its own hull
        assert_eq!(*image.get_pixel(2, 2), HULL_COLOR);
        assert!(image.pixels().all(|p| *p != CONTOUR_COLOR));
    }
}
