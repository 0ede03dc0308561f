//! Benchmarks for pptx2html conversion performance.
//!
//! Run with: cargo bench
//!
//! Decks are synthetic: every slide carries a title placeholder, a text box
//! and a small group, so each slide exercises layout and master inheritance.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pptx2html::{ConvertOptions, Converter};

#[allow(dead_code)]
#[path = "../src/test_support.rs"]
mod test_support;

use test_support::{plain_shape, text_shape, xfrm, DeckBuilder};

/// Creates a synthetic deck with the given number of slides.
fn create_test_deck(slide_count: usize) -> Vec<u8> {
    let mut deck = DeckBuilder::new();
    for i in 0..slide_count {
        let group = format!(
            r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="10" name="Group"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="914400" y="914400"/><a:ext cx="1828800" cy="1828800"/><a:chOff x="0" y="0"/><a:chExt cx="914400" cy="914400"/></a:xfrm></p:grpSpPr>{}{}</p:grpSp>"#,
            plain_shape(11, &xfrm(0, 0, 457200, 457200)),
            plain_shape(12, &xfrm(457200, 457200, 457200, 457200)),
        );
        let shapes = format!(
            "{}{}{}",
            text_shape(2, Some(r#"type="title""#), "", &format!("Slide {}", i + 1)),
            text_shape(
                3,
                Some(r#"idx="1""#),
                "",
                "Body text with enough words to look like a real bullet point",
            ),
            group,
        );
        deck = deck.slide(&shapes);
    }
    deck.build()
}

/// Benchmark full conversion at various deck sizes.
fn bench_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("conversion");

    for slide_count in [1, 10, 50, 200].iter() {
        let data = create_test_deck(*slide_count);
        let size = data.len() as u64;

        group.throughput(Throughput::Bytes(size));
        group.bench_with_input(BenchmarkId::new("slides", slide_count), &data, |b, data| {
            b.iter(|| {
                let _ = pptx2html::convert_bytes(black_box(data.clone()), &ConvertOptions::default());
            });
        });
    }

    group.finish();
}

/// Compare parallel and sequential slide building on one opened package.
fn bench_slide_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("slide_building");

    for slide_count in [10, 200].iter() {
        let converter = Converter::from_bytes(create_test_deck(*slide_count)).unwrap();

        for parallel in [false, true] {
            let options = ConvertOptions::default().with_parallel(parallel);
            let label = if parallel { "parallel" } else { "sequential" };
            group.bench_with_input(BenchmarkId::new(label, slide_count), &options, |b, options| {
                b.iter(|| {
                    let _ = black_box(&converter).convert(options);
                });
            });
        }
    }

    group.finish();
}

/// Benchmark JSON rendering of a converted deck.
fn bench_json_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("json_rendering");

    for slide_count in [10, 200].iter() {
        let conversion = pptx2html::convert_bytes(create_test_deck(*slide_count), &ConvertOptions::default())
            .unwrap();

        group.bench_with_input(
            BenchmarkId::new("slides", slide_count),
            &conversion,
            |b, conversion| {
                b.iter(|| {
                    let _ = pptx2html::render::to_json_default(black_box(conversion));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_conversion,
    bench_slide_building,
    bench_json_rendering,
);
criterion_main!(benches);
