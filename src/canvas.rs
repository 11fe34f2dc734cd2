use egui::{Color32, ColorImage, Pos2};
use image::{Rgba, RgbaImage, imageops};

/// Convert an egui color into the pixel type stored in the buffer
pub fn to_rgba(color: Color32) -> Rgba<u8> {
    Rgba(color.to_srgba_unmultiplied())
}

/// The raster the user draws into.
///
/// Pixel coordinates match egui points one to one: pixel `(x, y)` covers the
/// square from `(x, y)` to `(x + 1, y + 1)`.
#[derive(Debug, Clone)]
pub struct CanvasBuffer {
    pixels: RgbaImage,
    background: Color32,
}

impl CanvasBuffer {
    /// Create a buffer filled with `background`
    pub fn new(width: u32, height: u32, background: Color32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, to_rgba(background)),
            background,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn background(&self) -> Color32 {
        self.background
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color32> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let [r, g, b, a] = self.pixels.get_pixel(x, y).0;
        Some(Color32::from_rgba_unmultiplied(r, g, b, a))
    }

    pub fn fill_background(&mut self) {
        let background = to_rgba(self.background);
        for pixel in self.pixels.pixels_mut() {
            *pixel = background;
        }
    }

    /// Replace the contents with `image` copied at the origin. Anything the
    /// image does not cover is background. Pixels are copied as-is, never
    /// blended, so translucent pixels come back unchanged.
    pub fn restore(&mut self, image: &RgbaImage) {
        self.fill_background();
        imageops::replace(&mut self.pixels, image, 0, 0);
    }

    /// Reallocate at a new size keeping existing pixels at their offsets
    pub fn reallocate(&mut self, width: u32, height: u32) {
        let previous = std::mem::replace(
            &mut self.pixels,
            RgbaImage::from_pixel(width, height, to_rgba(self.background)),
        );
        imageops::replace(&mut self.pixels, &previous, 0, 0);
    }

    /// Rasterize a line segment with round caps.
    ///
    /// A pixel is painted when its center lies within `thickness / 2` of the
    /// segment. Consecutive segments share endpoints, which gives round joins.
    pub fn draw_segment(&mut self, from: Pos2, to: Pos2, thickness: f32, color: Color32) {
        let radius = (thickness * 0.5).max(0.5);
        let (width, height) = (self.width() as i64, self.height() as i64);
        if width == 0 || height == 0 {
            return;
        }

        let min_x = ((from.x.min(to.x) - radius).floor() as i64).max(0);
        let min_y = ((from.y.min(to.y) - radius).floor() as i64).max(0);
        let max_x = ((from.x.max(to.x) + radius).ceil() as i64).min(width - 1);
        let max_y = ((from.y.max(to.y) + radius).ceil() as i64).min(height - 1);
        if min_x > max_x || min_y > max_y {
            return;
        }

        let paint = to_rgba(color);
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let center = Pos2::new(x as f32 + 0.5, y as f32 + 0.5);
                if distance_to_segment(center, from, to) <= radius {
                    self.pixels.put_pixel(x as u32, y as u32, paint);
                }
            }
        }
    }

    /// Draw a single round dot, used for the first point of a stroke
    pub fn draw_dot(&mut self, center: Pos2, thickness: f32, color: Color32) {
        self.draw_segment(center, center, thickness, color);
    }

    pub fn to_color_image(&self) -> ColorImage {
        ColorImage::from_rgba_unmultiplied(
            [self.width() as usize, self.height() as usize],
            self.pixels.as_raw(),
        )
    }
}

fn distance_to_segment(point: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let length_sq = ab.length_sq();
    let t = if length_sq <= f32::EPSILON {
        0.0
    } else {
        ((point - a).dot(ab) / length_sq).clamp(0.0, 1.0)
    };
    (a + ab * t).distance(point)
}
