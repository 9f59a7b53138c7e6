use egui::{Color32, Pos2};
use image::{Rgba, RgbaImage};
use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle to a drawing surface. Event handlers and pending restores
/// each hold one; only one of them touches the pixels at a time.
pub type SurfaceHandle<S> = Rc<RefCell<S>>;

/// The raster drawing target and its 2D drawing API
pub trait Surface {
    /// Width and height in pixels
    fn size(&self) -> [u32; 2];

    fn set_stroke_color(&mut self, color: Color32);

    fn set_line_width(&mut self, width: f32);

    /// Reset every pixel to fully transparent
    fn clear(&mut self);

    /// Draw a round-capped line from `from` to `to` with the current stroke settings
    fn draw_line_segment(&mut self, from: Pos2, to: Pos2);

    /// Composite `image` over the surface, anchored at the top-left corner
    fn draw_image(&mut self, image: &RgbaImage);

    /// Current pixel content
    fn pixels(&self) -> &RgbaImage;
}

/// In-memory RGBA8 surface
#[derive(Debug, Clone)]
pub struct RasterSurface {
    pixels: RgbaImage,
    stroke_color: Color32,
    line_width: f32,
    /// Bumped on every pixel mutation so renderers know when to re-upload
    version: u64,
}

impl RasterSurface {
    /// Creates a fully transparent surface
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            stroke_color: Color32::BLACK,
            line_width: 1.0,
            version: 0,
        }
    }

    /// Wrap the surface in a shared handle
    pub fn into_handle(self) -> SurfaceHandle<Self> {
        Rc::new(RefCell::new(self))
    }

    /// Returns the modification counter
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the color used for new segments
    pub fn stroke_color(&self) -> Color32 {
        self.stroke_color
    }

    /// Returns the width used for new segments
    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    /// Returns the RGBA value at `(x, y)`, or `None` outside the surface
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pixels.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// True if no pixel has any coverage
    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|p| p[3] == 0)
    }

    fn mark_modified(&mut self) {
        self.version += 1;
    }
}

impl Surface for RasterSurface {
    fn size(&self) -> [u32; 2] {
        [self.pixels.width(), self.pixels.height()]
    }

    fn set_stroke_color(&mut self, color: Color32) {
        self.stroke_color = color;
    }

    fn set_line_width(&mut self, width: f32) {
        self.line_width = width;
    }

    fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
        self.mark_modified();
    }

    fn draw_line_segment(&mut self, from: Pos2, to: Pos2) {
        let [width, height] = self.size();
        let radius = (self.line_width / 2.0).max(0.5);

        // Float to int casts saturate, so strokes entirely off-surface produce an empty range
        let min_x = (from.x.min(to.x) - radius).floor().max(0.0) as u32;
        let max_x = (from.x.max(to.x) + radius).ceil().min(width as f32) as u32;
        let min_y = (from.y.min(to.y) - radius).floor().max(0.0) as u32;
        let max_y = (from.y.max(to.y) + radius).ceil().min(height as f32) as u32;

        let color = Rgba(self.stroke_color.to_srgba_unmultiplied());
        for y in min_y..max_y {
            for x in min_x..max_x {
                let center = Pos2::new(x as f32 + 0.5, y as f32 + 0.5);
                if distance_to_segment(center, from, to) <= radius {
                    blend_pixel(self.pixels.get_pixel_mut(x, y), color);
                }
            }
        }
        self.mark_modified();
    }

    fn draw_image(&mut self, image: &RgbaImage) {
        composite_over(&mut self.pixels, image);
        self.mark_modified();
    }

    fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Source-over composite of `top` onto `bottom`, both anchored at the origin
pub(crate) fn composite_over(bottom: &mut RgbaImage, top: &RgbaImage) {
    let width = bottom.width().min(top.width());
    let height = bottom.height().min(top.height());
    for y in 0..height {
        for x in 0..width {
            blend_pixel(bottom.get_pixel_mut(x, y), *top.get_pixel(x, y));
        }
    }
}

/// Straight-alpha source-over. Opaque and fully transparent sources are exact.
fn blend_pixel(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let [src_r, src_g, src_b, src_alpha] = src.0;
    match src_alpha {
        0 => return,
        255 => {
            *dst = src;
            return;
        }
        _ => {}
    }
    let src_a = src_alpha as f32 / 255.0;
    let dst_a = dst.0[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    for (channel, value) in [src_r, src_g, src_b].into_iter().enumerate() {
        let c = (value as f32 * src_a + dst.0[channel] as f32 * dst_a * (1.0 - src_a)) / out_a;
        dst.0[channel] = c.round().clamp(0.0, 255.0) as u8;
    }
    dst.0[3] = (out_a * 255.0).round() as u8;
}

fn distance_to_segment(point: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}
