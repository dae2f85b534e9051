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
use enclose_bnb::{
    buffer::{
        CellBuffer,
        heap::{ObjectiveLowerBound, OptimizationHeap},
    },
    cell::Cell,
};
use enclose_core::math::interval_box::IntervalBox;
use enclose_model::system::{System, SystemBuilder};
use enclose_model::function::AffineFunction;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

/// min x0 + ... + x{n-1}
fn linear_system(n: usize) -> System {
    let mut builder = SystemBuilder::new(n);
    builder
        .set_objective(AffineFunction::new(vec![1.0; n], 0.0))
        .expect("objective matches the dimension");
    builder.build()
}

/// `count` random cells with their objective enclosure cached.
fn cells(system: &System, count: usize, seed: u64) -> Vec<Cell> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let bounds: Vec<(f64, f64)> = (0..system.nb_var())
                .map(|_| {
                    let lo = rng.gen_range(-10.0..10.0);
                    (lo, lo + rng.gen_range(0.01..1.0))
                })
                .collect();
            let mut cell = Cell::root(IntervalBox::from_bounds(&bounds));
            cell.objective(system);
            cell
        })
        .collect()
}

fn bench_push_pop(c: &mut Criterion) {
    let system = linear_system(4);
    let mut group = c.benchmark_group("heap_benchmark");
    for &count in &[1_000usize, 10_000, 100_000] {
        let input = cells(&system, count, 11);
        group.bench_with_input(BenchmarkId::new("push_pop", count), &input, |b, input| {
            b.iter(|| {
                let mut heap = OptimizationHeap::new(ObjectiveLowerBound);
                for cell in input.iter().cloned() {
                    heap.push(cell).expect("unbounded heap");
                }
                while let Ok(cell) = heap.pop() {
                    black_box(cell);
                }
            })
        });
        group.bench_with_input(BenchmarkId::new("contract_heap", count), &input, |b, input| {
            b.iter(|| {
                let mut heap = OptimizationHeap::new(ObjectiveLowerBound);
                for cell in input.iter().cloned() {
                    heap.push(cell).expect("unbounded heap");
                }
                black_box(heap.contract_heap(black_box(0.0)))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_push_pop);
criterion_main!(benches);
