// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use enclose_core::math::interval_box::IntervalBox;
use enclose_ctc::qinter::q_intersection;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

/// `p` noisy boxes around the origin, a quarter of them shifted far away.
fn measurements(p: usize, n: usize, seed: u64) -> Vec<IntervalBox> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..p)
        .map(|i| {
            let offset = if i % 4 == 3 { 100.0 } else { 0.0 };
            let bounds: Vec<(f64, f64)> = (0..n)
                .map(|_| {
                    let lo = offset - rng.gen_range(0.1..2.0);
                    let hi = offset + rng.gen_range(0.1..2.0);
                    (lo, hi)
                })
                .collect();
            IntervalBox::from_bounds(&bounds)
        })
        .collect()
}

fn bench_q_intersection(c: &mut Criterion) {
    let mut group = c.benchmark_group("qinter_benchmark");
    for &(p, n) in &[(4, 2), (8, 2), (8, 3), (12, 3)] {
        let boxes = measurements(p, n, 7);
        let q = p - p / 4;
        group.bench_with_input(
            BenchmarkId::new("q_intersection", format!("p{p}_n{n}")),
            &boxes,
            |b, boxes| b.iter(|| q_intersection(black_box(boxes), black_box(q))),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_q_intersection);
criterion_main!(benches);
