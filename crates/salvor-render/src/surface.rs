// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Off-screen bitmap surface.

use image::{Rgba, RgbaImage};

/// A reusable RGBA pixel buffer that renderers draw into.
///
/// The buffer is reallocated only when the requested dimensions change, so a
/// single surface can be reused across pages of similar size.
#[derive(Debug, Default)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size the surface and fill it with an opaque background.
    pub fn prepare(&mut self, width: u32, height: u32, background: [u8; 3]) {
        let fill = Rgba([background[0], background[1], background[2], 255]);
        if self.pixels.dimensions() == (width, height) {
            for pixel in self.pixels.pixels_mut() {
                *pixel = fill;
            }
        } else {
            self.pixels = RgbaImage::from_pixel(width, height, fill);
        }
    }

    /// Alpha-composite `image` onto the surface at the origin.
    pub fn composite(&mut self, image: &RgbaImage) {
        image::imageops::overlay(&mut self.pixels, image, 0, 0);
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.width() == 0 || self.pixels.height() == 0
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_fills_opaque_background() {
        let mut surface = Surface::new();
        assert!(surface.is_empty());
        surface.prepare(4, 3, [255, 255, 255]);
        assert_eq!(surface.dimensions(), (4, 3));
        assert!(surface.pixels().pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn prepare_reuses_buffer_and_wipes_old_content() {
        let mut surface = Surface::new();
        surface.prepare(2, 2, [255, 255, 255]);
        surface.pixels_mut().put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        surface.prepare(2, 2, [255, 255, 255]);
        assert_eq!(surface.pixels().get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn composite_blends_transparency_onto_background() {
        let mut surface = Surface::new();
        surface.prepare(1, 1, [255, 255, 255]);
        let transparent = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0]));
        surface.composite(&transparent);
        assert_eq!(surface.pixels().get_pixel(0, 0).0, [255, 255, 255, 255]);
    }
}
