// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the two per-file hot paths: prefix classification
// and the blank check every rendered page goes through.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};

use salvor_core::{BlankDetection, PipelineConfig};
use salvor_document::DocumentClassifier;
use salvor_document::raster::ContentAssessment;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Classify a 64 KiB input that looks like an encrypted Spanish certificate.
/// Only the configured prefix is scanned, but the fingerprint covers it all.
fn bench_classify(c: &mut Criterion) {
    let mut bytes = b"%PDF-1.7\n1 0 obj << /Filter /Standard /V 5 /R 6 /Length 256 >> endobj\n\
        /Producer (TCPDF 6.2.13) (Certificado de Capacitacion) Tj (Se certifica que) Tj (ACHS) Tj\n"
        .to_vec();
    bytes.resize(64 * 1024, b' ');
    let classifier = DocumentClassifier::new(&PipelineConfig::default());

    c.bench_function("classify (64 KiB)", |b| {
        b.iter(|| black_box(classifier.classify("certificado_achs.pdf", black_box(&bytes))));
    });
}

/// Blank check on an A4 render at 2x (1190x1684) with a band of dark text.
fn bench_blank_check(c: &mut Criterion) {
    let (width, height) = (1190u32, 1684u32);
    let mut page = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    for y in 200..260 {
        for x in 100..1090 {
            page.put_pixel(x, y, Rgba([20, 20, 20, 255]));
        }
    }
    let detection = BlankDetection::default();

    c.bench_function("blank_check (1190x1684)", |b| {
        b.iter(|| black_box(ContentAssessment::of(black_box(&page), &detection).is_blank()));
    });
}

criterion_group!(benches, bench_classify, bench_blank_check);
criterion_main!(benches);
