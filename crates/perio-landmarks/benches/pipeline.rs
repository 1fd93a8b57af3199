use criterion::{criterion_group, criterion_main, Criterion};
use perio_core::PixelBuffer;
use perio_landmarks::{LandmarkDetector, LandmarkDetectorParams, NullSink};
use std::hint::black_box;

/// Bright tooth-like bar on a dark background with mild periodic texture.
fn build_radiograph(width: usize, height: usize) -> Vec<u8> {
    let (x0, x1) = (width * 9 / 20, width * 11 / 20);
    let (y0, y1) = (height / 5, height * 4 / 5);
    let mut data = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let base = if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
                200
            } else {
                40
            };
            data[y * width + x] = base + ((x * 7 + y * 13) % 5) as u8;
        }
    }
    data
}

fn bench_detect(c: &mut Criterion) {
    let (w, h) = (640, 800);
    let data = build_radiograph(w, h);
    let image = PixelBuffer::gray(w, h, &data).expect("valid buffer");
    let detector = LandmarkDetector::new(LandmarkDetectorParams::default());

    c.bench_function("landmarks_detect_gray_640x800", |b| {
        b.iter(|| {
            let out = detector.detect_with_sink(black_box(&image), &mut NullSink);
            black_box(out.is_ok());
        });
    });
}

criterion_group!(benches, bench_detect);
criterion_main!(benches);
