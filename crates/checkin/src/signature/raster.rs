//! RGBA raster backing the signature surface.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::font;
use super::Point;
use crate::error::{Error, Result};
use crate::registration::SignatureImage;

/// Largest accepted surface width or height, in pixels.
pub const MAX_DIMENSION: u32 = 4096;

/// An RGBA colour with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgba {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha; 0 is fully transparent.
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgb(0, 0, 0).with_alpha(0);
    /// Default stroke colour (`#f1f5f9`).
    pub const SLATE_100: Self = Self::rgb(0xf1, 0xf5, 0xf9);
    /// Default stamp colour (`#94a3b8`).
    pub const SLATE_400: Self = Self::rgb(0x94, 0xa3, 0xb8);

    /// An opaque colour.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// The same colour with a different alpha.
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Parse `#rrggbb`.
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// A fixed-size RGBA pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    /// A transparent raster.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SurfaceSize`] if either side is zero or larger than
    /// [`MAX_DIMENSION`].
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let too_large = Error::SurfaceSize { width, height };
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(too_large);
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or(too_large)?;
        Ok(Self {
            width,
            height,
            pixels: vec![0; len],
        })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Read a pixel; out-of-bounds reads are transparent.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        if x >= self.width || y >= self.height {
            return Rgba::TRANSPARENT;
        }
        let i = self.offset(x, y);
        Rgba {
            r: self.pixels[i],
            g: self.pixels[i + 1],
            b: self.pixels[i + 2],
            a: self.pixels[i + 3],
        }
    }

    /// True when every pixel is fully transparent.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.pixels.chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Erase everything.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Draw a round-capped segment of the given width, anti-aliased.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn stroke_segment(&mut self, from: Point, to: Point, line_width: f64, color: Rgba) {
        let radius = (line_width / 2.0).max(0.5);
        let reach = radius + 1.0;

        let min_x = (from.x.min(to.x) - reach).floor().max(0.0);
        let min_y = (from.y.min(to.y) - reach).floor().max(0.0);
        let max_x = (from.x.max(to.x) + reach).ceil().min(f64::from(self.width));
        let max_y = (from.y.max(to.y) + reach).ceil().min(f64::from(self.height));
        if min_x >= max_x || min_y >= max_y {
            return;
        }

        for y in min_y as u32..max_y as u32 {
            for x in min_x as u32..max_x as u32 {
                let center = Point {
                    x: f64::from(x) + 0.5,
                    y: f64::from(y) + 0.5,
                };
                let distance = distance_to_segment(center, from, to);
                let coverage = (radius + 0.5 - distance).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(x, y, color, coverage);
                }
            }
        }
    }

    /// Fill an axis-aligned rectangle, clipped to the raster.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgba) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + i64::from(width)).min(i64::from(self.width));
        let y1 = (y + i64::from(height)).min(i64::from(self.height));
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px as u32, py as u32, color, 1.0);
            }
        }
    }

    /// Draw `text` so that it ends at `right` with its baseline at `baseline`.
    ///
    /// Characters without a glyph advance like a space.
    #[allow(clippy::cast_possible_wrap)]
    pub fn draw_text_right(
        &mut self,
        text: &str,
        right: u32,
        baseline: u32,
        scale: u32,
        color: Rgba,
    ) {
        let width = font::text_width(text, scale);
        let mut x = i64::from(right) - i64::from(width);
        let top = i64::from(baseline) - i64::from(font::GLYPH_HEIGHT * scale);

        for c in text.chars() {
            if let Some(rows) = font::glyph(c) {
                for (row, bits) in rows.into_iter().enumerate() {
                    for col in 0..font::GLYPH_WIDTH {
                        if bits & (1u8 << (font::GLYPH_WIDTH - 1 - col)) != 0 {
                            self.fill_rect(
                                x + i64::from(col * scale),
                                top + (row as i64) * i64::from(scale),
                                scale,
                                scale,
                                color,
                            );
                        }
                    }
                }
            }
            x += i64::from(font::ADVANCE * scale);
        }
    }

    /// Encode as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder rejects the image.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut bytes, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.pixels)?;
            writer.finish()?;
        }
        Ok(bytes)
    }

    /// Encode as a `data:image/png;base64,…` URL.
    ///
    /// # Errors
    ///
    /// Returns an error if PNG encoding fails.
    pub fn to_data_url(&self) -> Result<String> {
        let png = self.encode_png()?;
        Ok(format!("{}{}", SignatureImage::PNG_PREFIX, STANDARD.encode(png)))
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn blend(&mut self, x: u32, y: u32, color: Rgba, coverage: f64) {
        let i = self.offset(x, y);
        let src_a = f64::from(color.a) / 255.0 * coverage;
        let dst_a = f64::from(self.pixels[i + 3]) / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        if out_a <= 0.0 {
            return;
        }
        let mix = |src: u8, dst: u8| {
            let value =
                (f64::from(src) * src_a + f64::from(dst) * dst_a * (1.0 - src_a)) / out_a;
            value.round().clamp(0.0, 255.0) as u8
        };
        self.pixels[i] = mix(color.r, self.pixels[i]);
        self.pixels[i + 1] = mix(color.g, self.pixels[i + 1]);
        self.pixels[i + 2] = mix(color.b, self.pixels[i + 2]);
        self.pixels[i + 3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Rgba::from_hex("#f1f5f9"), Some(Rgba::SLATE_100));
        assert_eq!(Rgba::from_hex("#94A3B8"), Some(Rgba::SLATE_400));
        assert_eq!(Rgba::from_hex("f1f5f9"), None);
        assert_eq!(Rgba::from_hex("#fff"), None);
        assert_eq!(Rgba::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn test_new_rejects_unsupported_sizes() {
        for (width, height) in [(0, 10), (10, 0), (MAX_DIMENSION + 1, 1), (u32::MAX, u32::MAX)] {
            assert!(matches!(
                Raster::new(width, height),
                Err(Error::SurfaceSize { .. })
            ));
        }
        let widest = Raster::new(MAX_DIMENSION, 1).unwrap();
        assert_eq!(widest.width(), MAX_DIMENSION);
    }

    #[test]
    fn test_new_raster_is_blank() {
        let raster = Raster::new(4, 3).unwrap();
        assert!(raster.is_blank());
        assert_eq!(raster.pixel(10, 10), Rgba::TRANSPARENT);
    }

    #[test]
    fn test_stroke_segment_round_caps() {
        let mut raster = Raster::new(40, 20).unwrap();
        raster.stroke_segment(
            Point { x: 10.0, y: 10.0 },
            Point { x: 30.0, y: 10.0 },
            4.0,
            Rgba::rgb(255, 0, 0),
        );
        assert_eq!(raster.pixel(20, 9).a, 255);
        // Cap extends past the endpoint by the radius
        assert!(raster.pixel(31, 9).a > 0);
        assert_eq!(raster.pixel(36, 9).a, 0);
        assert_eq!(raster.pixel(20, 16).a, 0);
    }

    #[test]
    fn test_stroke_outside_surface_is_clipped() {
        let mut raster = Raster::new(10, 10).unwrap();
        raster.stroke_segment(
            Point { x: -50.0, y: -50.0 },
            Point { x: -40.0, y: -40.0 },
            2.0,
            Rgba::rgb(0, 0, 0),
        );
        assert!(raster.is_blank());
    }

    #[test]
    fn test_clear() {
        let mut raster = Raster::new(10, 10).unwrap();
        raster.fill_rect(2, 2, 3, 3, Rgba::rgb(1, 2, 3));
        assert!(!raster.is_blank());
        raster.clear();
        assert!(raster.is_blank());
    }

    #[test]
    fn test_draw_text_right_aligned() {
        let mut raster = Raster::new(60, 20).unwrap();
        raster.draw_text_right("1", 50, 15, 1, Rgba::rgb(9, 9, 9));
        // Nothing past the right edge
        for y in 0..20 {
            for x in 50..60 {
                assert_eq!(raster.pixel(x, y).a, 0);
            }
        }
        assert!(!raster.is_blank());
    }

    #[test]
    fn test_encode_png_signature() {
        let raster = Raster::new(8, 8).unwrap();
        let bytes = raster.encode_png().unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_data_url_prefix() {
        let raster = Raster::new(2, 2).unwrap();
        let url = raster.to_data_url().unwrap();
        assert!(url.starts_with("data:image/png;base64,iVBORw0KGgo"));
    }
}
