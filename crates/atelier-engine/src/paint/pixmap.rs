use super::blend::{CompositeMode, composite};
use super::color::Color;
use crate::coords::Rect;

/// CPU raster buffer: premultiplied RGBA8, row-major, top-left origin.
///
/// All compositing happens in premultiplied space; conversion to the
/// straight-alpha `image` types is done only at the export edge.
#[derive(Debug, Clone)]
pub struct Pixmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Pixmap {
    /// Allocates a fully transparent pixmap. Zero dimensions yield an
    /// empty buffer that ignores all drawing.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f32, self.height as f32)
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    /// Rows of RGBA texels over the raw byte buffer.
    #[inline]
    fn texels(&self) -> &[[u8; 4]] {
        bytemuck::cast_slice(&self.data)
    }

    #[inline]
    fn texels_mut(&mut self) -> &mut [[u8; 4]] {
        bytemuck::cast_slice_mut(&mut self.data)
    }

    /// Premultiplied pixel in 0..1; out-of-bounds reads are transparent.
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> [f32; 4] {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return [0.0; 4];
        }
        let i = (y as usize) * (self.width as usize) + (x as usize);
        let t = self.texels()[i];
        [
            t[0] as f32 / 255.0,
            t[1] as f32 / 255.0,
            t[2] as f32 / 255.0,
            t[3] as f32 / 255.0,
        ]
    }

    /// Stores a premultiplied pixel; out-of-bounds writes are dropped.
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, px: [f32; 4]) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let i = (y as usize) * (self.width as usize) + (x as usize);
        self.texels_mut()[i] = [
            (px[0].clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
            (px[1].clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
            (px[2].clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
            (px[3].clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
        ];
    }

    /// Composites a premultiplied pixel against the stored one.
    #[inline]
    pub fn composite_pixel(&mut self, x: i32, y: i32, src: [f32; 4], mode: CompositeMode) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let dst = self.pixel(x, y);
        self.set_pixel(x, y, composite(dst, src, mode));
    }

    /// Resets every pixel to transparent.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Resets a device-space area to transparent.
    pub fn clear_rect(&mut self, rect: Rect) {
        let Some((x0, y0, x1, y1)) = self.clip_span(rect) else {
            return;
        };
        for y in y0..y1 {
            let start = self.index(x0, y);
            let end = self.index(x1 - 1, y) + 4;
            self.data[start..end].fill(0);
        }
    }

    /// Fills a device-space area with a color using the given mode.
    pub fn fill_rect(&mut self, rect: Rect, color: Color, mode: CompositeMode, opacity: f32) {
        let src = scaled(color.to_premul(), opacity);
        let Some((x0, y0, x1, y1)) = self.clip_span(rect) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                self.composite_pixel(x as i32, y as i32, src, mode);
            }
        }
    }

    /// Composites `src` onto self with its top-left corner at `(dx, dy)`,
    /// scaling source alpha by `opacity`.
    pub fn blit(&mut self, src: &Pixmap, dx: i32, dy: i32, mode: CompositeMode, opacity: f32) {
        if opacity <= 0.0 {
            return;
        }
        for sy in 0..src.height as i32 {
            let y = dy + sy;
            if y < 0 || y as u32 >= self.height {
                continue;
            }
            for sx in 0..src.width as i32 {
                let x = dx + sx;
                if x < 0 || x as u32 >= self.width {
                    continue;
                }
                let px = scaled(src.pixel(sx, sy), opacity);
                self.composite_pixel(x, y, px, mode);
            }
        }
    }

    /// One separable box-blur pass with the given half-width in pixels.
    /// Three passes approximate a Gaussian.
    pub fn box_blur(&mut self, radius: u32) {
        if radius == 0 || self.width == 0 || self.height == 0 {
            return;
        }
        self.blur_axis(radius, true);
        self.blur_axis(radius, false);
    }

    fn blur_axis(&mut self, radius: u32, horizontal: bool) {
        let (major, minor) = if horizontal {
            (self.width, self.height)
        } else {
            (self.height, self.width)
        };
        let r = radius as i32;
        let window = (2 * r + 1) as f32;

        let mut line = vec![[0.0f32; 4]; major as usize];
        for m in 0..minor {
            for i in 0..major {
                let (x, y) = if horizontal { (i, m) } else { (m, i) };
                line[i as usize] = self.pixel(x as i32, y as i32);
            }

            // Sliding-window sum over the premultiplied channels.
            let mut sum = [0.0f32; 4];
            for i in -r..=r {
                let px = sample(&line, i);
                for c in 0..4 {
                    sum[c] += px[c];
                }
            }
            for i in 0..major as i32 {
                let (x, y) = if horizontal { (i, m as i32) } else { (m as i32, i) };
                self.set_pixel(x, y, [
                    sum[0] / window,
                    sum[1] / window,
                    sum[2] / window,
                    sum[3] / window,
                ]);
                let out = sample(&line, i - r);
                let inc = sample(&line, i + r + 1);
                for c in 0..4 {
                    sum[c] += inc[c] - out[c];
                }
            }
        }
    }

    fn clip_span(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        let r = rect.normalized().intersect(self.bounds())?;
        let x0 = r.min().x.floor().max(0.0) as u32;
        let y0 = r.min().y.floor().max(0.0) as u32;
        let x1 = (r.max().x.ceil() as u32).min(self.width);
        let y1 = (r.max().y.ceil() as u32).min(self.height);
        if x0 >= x1 || y0 >= y1 { None } else { Some((x0, y0, x1, y1)) }
    }

    /// Unpremultiplied copy for export through the `image` crate.
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        let mut out = image::RgbaImage::new(self.width.max(1), self.height.max(1));
        for y in 0..self.height {
            for x in 0..self.width {
                let p = self.pixel(x as i32, y as i32);
                let a = p[3];
                let (r, g, b) = if a <= 0.0 {
                    (0.0, 0.0, 0.0)
                } else {
                    (p[0] / a, p[1] / a, p[2] / a)
                };
                out.put_pixel(x, y, image::Rgba([
                    (r.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
                    (g.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
                    (b.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
                    (a.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
                ]));
            }
        }
        out
    }

    /// Builds a pixmap from a straight-alpha image, premultiplying.
    pub fn from_rgba_image(img: &image::RgbaImage) -> Self {
        let mut out = Pixmap::new(img.width(), img.height());
        for (x, y, px) in img.enumerate_pixels() {
            let a = px[3] as f32 / 255.0;
            out.set_pixel(x as i32, y as i32, [
                px[0] as f32 / 255.0 * a,
                px[1] as f32 / 255.0 * a,
                px[2] as f32 / 255.0 * a,
                a,
            ]);
        }
        out
    }
}

#[inline]
fn scaled(px: [f32; 4], opacity: f32) -> [f32; 4] {
    let o = opacity.clamp(0.0, 1.0);
    [px[0] * o, px[1] * o, px[2] * o, px[3] * o]
}

#[inline]
fn sample(line: &[[f32; 4]], i: i32) -> [f32; 4] {
    // Clamp-to-edge sampling keeps blurred edges from darkening.
    let i = i.clamp(0, line.len() as i32 - 1) as usize;
    line[i]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::blend::CompositeOperator;

    // ── pixels ────────────────────────────────────────────────────────────

    #[test]
    fn set_and_get_round_trip() {
        let mut pm = Pixmap::new(4, 4);
        pm.set_pixel(1, 2, [0.5, 0.25, 0.0, 1.0]);
        let p = pm.pixel(1, 2);
        assert!((p[0] - 0.5).abs() < 0.01);
        assert!((p[3] - 1.0).abs() < 0.01);
    }

    #[test]
    fn out_of_bounds_reads_transparent() {
        let pm = Pixmap::new(2, 2);
        assert_eq!(pm.pixel(-1, 0), [0.0; 4]);
        assert_eq!(pm.pixel(0, 5), [0.0; 4]);
    }

    #[test]
    fn zero_size_is_inert() {
        let mut pm = Pixmap::new(0, 0);
        pm.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::BLACK, CompositeMode::default(), 1.0);
        assert!(pm.data().is_empty());
    }

    // ── fill / clear ──────────────────────────────────────────────────────

    #[test]
    fn fill_rect_clips_to_bounds() {
        let mut pm = Pixmap::new(4, 4);
        pm.fill_rect(
            Rect::new(2.0, 2.0, 10.0, 10.0),
            Color::rgb(255.0, 0.0, 0.0),
            CompositeMode::default(),
            1.0,
        );
        assert!(pm.pixel(3, 3)[0] > 0.9);
        assert_eq!(pm.pixel(0, 0), [0.0; 4]);
    }

    #[test]
    fn clear_rect_erases_area() {
        let mut pm = Pixmap::new(4, 4);
        pm.fill_rect(pm.bounds(), Color::WHITE, CompositeMode::default(), 1.0);
        pm.clear_rect(Rect::new(0.0, 0.0, 2.0, 2.0));
        assert_eq!(pm.pixel(1, 1), [0.0; 4]);
        assert!(pm.pixel(3, 3)[3] > 0.9);
    }

    // ── blit ──────────────────────────────────────────────────────────────

    #[test]
    fn blit_with_opacity_scales_alpha() {
        let mut src = Pixmap::new(2, 2);
        src.fill_rect(src.bounds(), Color::WHITE, CompositeMode::default(), 1.0);
        let mut dst = Pixmap::new(4, 4);
        dst.blit(&src, 1, 1, CompositeMode::default(), 0.5);
        let p = dst.pixel(1, 1);
        assert!((p[3] - 0.5).abs() < 0.01);
    }

    #[test]
    fn blit_destination_in_masks() {
        let mut mask = Pixmap::new(1, 1);
        mask.set_pixel(0, 0, [0.0, 0.0, 0.0, 0.5]);
        let mut dst = Pixmap::new(1, 1);
        dst.set_pixel(0, 0, [1.0, 0.0, 0.0, 1.0]);
        dst.blit(&mask, 0, 0, CompositeOperator::DestinationIn.into(), 1.0);
        let p = dst.pixel(0, 0);
        assert!((p[3] - 0.5).abs() < 0.01);
    }

    // ── blur ──────────────────────────────────────────────────────────────

    #[test]
    fn blur_spreads_energy() {
        let mut pm = Pixmap::new(9, 9);
        pm.set_pixel(4, 4, [1.0, 1.0, 1.0, 1.0]);
        pm.box_blur(1);
        assert!(pm.pixel(4, 4)[3] < 1.0);
        assert!(pm.pixel(3, 4)[3] > 0.0);
    }

    #[test]
    fn blur_radius_zero_is_noop() {
        let mut pm = Pixmap::new(3, 3);
        pm.set_pixel(1, 1, [1.0, 0.0, 0.0, 1.0]);
        let before = pm.clone();
        pm.box_blur(0);
        assert_eq!(pm.data(), before.data());
    }

    // ── image conversion ──────────────────────────────────────────────────

    #[test]
    fn image_round_trip_preserves_opaque_pixels() {
        let mut pm = Pixmap::new(2, 1);
        pm.set_pixel(0, 0, [1.0, 0.5, 0.0, 1.0]);
        let img = pm.to_rgba_image();
        let back = Pixmap::from_rgba_image(&img);
        let p = back.pixel(0, 0);
        assert!((p[0] - 1.0).abs() < 0.01);
        assert!((p[1] - 0.5).abs() < 0.01);
    }
}
