// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — flattens, downsizes and encodes rendered page bitmaps
// before they are embedded or handed to a viewer.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use salvor_core::error::SalvorError;
use tracing::{debug, instrument};

/// Processing chain over one in-memory bitmap.
///
/// Each method consumes `self` and returns the transformed processor:
///
/// ```ignore
/// let rgb = ImageProcessor::from_rgba(render)
///     .flatten([255, 255, 255])
///     .into_rgb8();
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    pub fn from_rgba(image: RgbaImage) -> Self {
        Self {
            image: DynamicImage::ImageRgba8(image),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    // -- Transformations ------------------------------------------------------

    /// Composite any transparency over an opaque `background` colour.
    ///
    /// Renderers leave unpainted regions transparent; PDF images carry no
    /// alpha here, so those regions must become the page colour.
    pub fn flatten(self, background: [u8; 3]) -> Self {
        let mut rgba = self.image.into_rgba8();
        for pixel in rgba.pixels_mut() {
            let alpha = u16::from(pixel[3]);
            if alpha == 255 {
                continue;
            }
            for channel in 0..3 {
                let fg = u16::from(pixel[channel]);
                let bg = u16::from(background[channel]);
                pixel[channel] = ((fg * alpha + bg * (255 - alpha)) / 255) as u8;
            }
            pixel[3] = 255;
        }
        Self {
            image: DynamicImage::ImageRgba8(rgba),
        }
    }

    /// Downscale (never upscale) to fit within `max_w` x `max_h`, preserving
    /// the aspect ratio.
    #[instrument(skip(self), fields(from_w = self.width(), from_h = self.height()))]
    pub fn fit_within(self, max_w: u32, max_h: u32) -> Self {
        if self.width() <= max_w && self.height() <= max_h {
            return self;
        }
        let resized = self.image.resize(max_w.max(1), max_h.max(1), FilterType::Lanczos3);
        debug!(to_w = resized.width(), to_h = resized.height(), "bitmap downscaled");
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    pub fn into_rgb8(self) -> RgbImage {
        self.image.into_rgb8()
    }

    pub fn to_png_bytes(&self) -> Result<Vec<u8>, SalvorError> {
        let mut buf = Cursor::new(Vec::new());
        self.image
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|err| SalvorError::ImageError(format!("PNG encoding failed: {err}")))?;
        Ok(buf.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn flatten_composites_transparency_over_background() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        img.put_pixel(1, 0, Rgba([0, 0, 0, 255]));
        let rgb = ImageProcessor::from_rgba(img)
            .flatten([255, 255, 255])
            .into_rgb8();
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(rgb.get_pixel(1, 0).0, [0, 0, 0]);
    }

    #[test]
    fn half_alpha_blends() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128]));
        let rgb = ImageProcessor::from_rgba(img).flatten([255, 255, 255]).into_rgb8();
        assert_eq!(rgb.get_pixel(0, 0).0, [127, 127, 127]);
    }

    #[test]
    fn fit_within_keeps_aspect_and_never_upscales() {
        let img = RgbaImage::new(400, 200);
        let shrunk = ImageProcessor::from_rgba(img.clone()).fit_within(100, 100);
        assert_eq!((shrunk.width(), shrunk.height()), (100, 50));

        let same = ImageProcessor::from_rgba(img).fit_within(1000, 1000);
        assert_eq!((same.width(), same.height()), (400, 200));
    }

    #[test]
    fn png_bytes_have_signature() {
        let bytes = ImageProcessor::from_rgba(RgbaImage::new(3, 3))
            .to_png_bytes()
            .unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }
}
