use std::time::Duration;

use criterion::{Criterion, Throughput};
use glam::DVec2;
use map_markers::geometry::{SubPath, VertexPath};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

fn unit(rng: &mut StdRng) -> f64 {
    (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64
}

/// Random walk inside `[0, extent]^2`, seeded for reproducible runs.
#[allow(dead_code)]
pub fn random_walk(seed: u64, vertices: usize, extent: f64) -> VertexPath {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut p = DVec2::splat(extent * 0.5);
    let step = extent / 50.0;
    let points = (0..vertices)
        .map(|_| {
            let d = DVec2::new(unit(&mut rng) - 0.5, unit(&mut rng) - 0.5) * 2.0 * step;
            p = (p + d).clamp(DVec2::ZERO, DVec2::splat(extent));
            p
        })
        .collect();
    VertexPath::from_subpaths(vec![SubPath::open(points)])
}

/// Uniformly scattered points inside `[0, extent]^2`.
#[allow(dead_code)]
pub fn random_points(seed: u64, count: usize, extent: f64) -> Vec<DVec2> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| DVec2::new(unit(&mut rng), unit(&mut rng)) * extent)
        .collect()
}
