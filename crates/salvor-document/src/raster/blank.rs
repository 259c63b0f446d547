// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Blank detection and render quality.
//
// Pixels are sampled at a fixed stride along each row, and each row starts
// one column further along than the last, so a vertical pattern whose period
// matches the stride cannot hide between the samples. A pixel is
// non-white when any colour channel is below the near-white threshold; it is
// dark (text-like) when every channel is below `DARK_CHANNEL`. A render is
// blank when the non-white fraction is below the configured minimum. Sparse
// but genuine content, such as a lone stamp on a white page, can fall under
// that minimum and be rejected.

use image::RgbaImage;
use salvor_core::BlankDetection;
use serde::Serialize;

const DARK_CHANNEL: u8 = 100;

/// Measurements of one rendered surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContentAssessment {
    pub sampled: u64,
    pub non_white: u64,
    pub dark: u64,
    /// Mean of |r-g| + |g-b| + |b-r| over non-white samples.
    pub color_variation: f32,
    min_content_ratio: f32,
}

impl ContentAssessment {
    pub fn of(image: &RgbaImage, detection: &BlankDetection) -> Self {
        let stride = detection.sample_stride.max(1);
        let mut sampled = 0u64;
        let mut non_white = 0u64;
        let mut dark = 0u64;
        let mut variation = 0u64;

        let (width, height) = image.dimensions();
        let offsets = (0..height).map(|y| (y, y % stride as u32));
        let samples = offsets.flat_map(|(y, first)| {
            (first..width).step_by(stride).map(move |x| image.get_pixel(x, y))
        });
        for pixel in samples {
            sampled += 1;
            let [r, g, b, _] = pixel.0;
            if r < detection.near_white || g < detection.near_white || b < detection.near_white {
                non_white += 1;
                variation += u64::from(r.abs_diff(g)) + u64::from(g.abs_diff(b)) + u64::from(b.abs_diff(r));
                if r < DARK_CHANNEL && g < DARK_CHANNEL && b < DARK_CHANNEL {
                    dark += 1;
                }
            }
        }

        Self {
            sampled,
            non_white,
            dark,
            color_variation: variation as f32 / non_white.max(1) as f32,
            min_content_ratio: detection.min_content_ratio,
        }
    }

    pub fn content_ratio(&self) -> f32 {
        ratio(self.non_white, self.sampled)
    }

    pub fn dark_ratio(&self) -> f32 {
        ratio(self.dark, self.sampled)
    }

    /// Blend of coverage, text-like pixels and colourfulness in `[0, 1]`.
    pub fn quality(&self) -> f32 {
        self.content_ratio() * 0.5 + self.dark_ratio() * 0.4 + (self.color_variation / 255.0).min(1.0) * 0.1
    }

    pub fn is_blank(&self) -> bool {
        self.sampled == 0 || self.content_ratio() < self.min_content_ratio
    }
}

fn ratio(part: u64, whole: u64) -> f32 {
    if whole == 0 {
        0.0
    } else {
        part as f32 / whole as f32
    }
}
