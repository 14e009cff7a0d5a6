// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use device::DeviceConfig;
use flow_core::TensorShape;
use layer_model::{Configuration, LayerModel, ModelOptions, Parallelism};
use model_ir::LayerDescriptor;
use partition_planner::{
    Composer, Exhaustive, NoopObserver, ParallelExhaustive, SearchSpace, SearchStrategy,
};

fn relu(name: &str) -> LayerModel {
    let shape = TensorShape::new(1, 64, 8, 28, 28);
    let desc = LayerDescriptor {
        name: name.into(),
        operation: "Relu".into(),
        shape_in: vec![shape],
        shape_out: shape,
        kernel: None,
        bias: vec![],
        groups: 1,
        padding: vec![],
        stride: vec![],
        dilation: vec![],
        branching: false,
        primitive_ops: vec![],
    };
    LayerModel::from_descriptor(&desc, &ModelOptions::default()).unwrap()
}

fn bench_search(c: &mut Criterion) {
    let device = DeviceConfig::zc706();
    let composer = Composer::new(&device, 16.0, 16.0);
    let layers: Vec<LayerModel> = (0..3).map(|i| relu(&format!("relu_{i}"))).collect();
    let set: Vec<Configuration> = [1, 2, 4, 8, 16, 32, 64]
        .into_iter()
        .map(|d| Configuration::new(Parallelism::Shared { coarse_inout: d as f64 / 64.0 }, 1.0, 1.0))
        .collect();
    let space = SearchSpace::new("part_0", layers.iter().collect(), vec![set; 3]).unwrap();

    let strategies: [Box<dyn SearchStrategy>; 2] =
        [Box::new(Exhaustive::new()), Box::new(ParallelExhaustive::new())];
    let mut group = c.benchmark_group("partition_search");
    for strategy in &strategies {
        group.bench_with_input(BenchmarkId::from_parameter(strategy.name()), &space, |b, s| {
            b.iter(|| strategy.search(s, &composer, &NoopObserver))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
