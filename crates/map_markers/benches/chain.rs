mod common;

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use map_markers::prelude::{
    BoundingBox, GeometryType, IdentityProjection, SimplifyAlgorithm, SymbolizerParams,
    TransformChain, VecSink, ViewTransform,
};
use map_markers::transform::ChainContext;

const VERTEX_COUNTS: [usize; 4] = [64, 512, 4096, 32768];
const EXTENT: f64 = 1024.0;

fn make_chain(params: &SymbolizerParams) -> TransformChain {
    let view = ViewTransform::new(1024, 1024, BoundingBox::new(0.0, 0.0, EXTENT, EXTENT));
    let ctx = ChainContext {
        clip_box: BoundingBox::new(128.0, 128.0, 896.0, 896.0),
        projection: Arc::new(IdentityProjection),
        view: &view,
        scale_factor: 1.0,
    };
    TransformChain::for_symbolizer(&ctx, params, Some(GeometryType::LineString))
}

fn chain_benches(c: &mut Criterion) {
    let configs = [
        ("minimal", SymbolizerParams::default().with_clip(false)),
        ("clip", SymbolizerParams::default()),
        (
            "simplify_smooth",
            SymbolizerParams::default()
                .with_simplify(2.0, SimplifyAlgorithm::DouglasPeucker)
                .with_smooth(0.5),
        ),
        (
            "full",
            SymbolizerParams::default()
                .with_simplify(2.0, SimplifyAlgorithm::RadialDistance)
                .with_smooth(0.5)
                .with_offset(3.0),
        ),
    ];

    let mut group = c.benchmark_group("chain/apply");
    for &count in &VERTEX_COUNTS {
        let path = common::random_walk(42, count, EXTENT);
        group.throughput(common::elements_throughput(count));

        for (name, params) in &configs {
            let chain = make_chain(params);
            group.bench_with_input(BenchmarkId::new(*name, count), &count, |b, _| {
                b.iter(|| {
                    let mut sink = VecSink::new();
                    chain.process(black_box(&path), &mut sink);
                    black_box(sink.len());
                });
            });
        }
    }
    group.finish();
}

fn chain_build_benches(c: &mut Criterion) {
    let params = SymbolizerParams::default()
        .with_simplify(2.0, SimplifyAlgorithm::RadialDistance)
        .with_smooth(0.5)
        .with_offset(3.0);
    c.bench_function("chain/build", |b| {
        b.iter(|| black_box(make_chain(black_box(&params))).len());
    });
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = chain_benches, chain_build_benches
}
criterion_main!(benches);
