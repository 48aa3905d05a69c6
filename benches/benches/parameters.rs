// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `geostyle_param` stores and chained value lookup.

use std::sync::Arc;

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use geostyle_param::{ChangeSource, NotificationQueue, ParamValue, ParameterStore, ParameterValue};
use geostyle_style::{EngineConfig, RenderSession, StyleKind, keys};

fn store(queue: &Arc<NotificationQueue>) -> ParameterStore {
    let store = ParameterStore::new(Arc::clone(queue));
    store.define(ParameterValue::new("width", "Width", ParamValue::Float(1.0)));
    store.define(ParameterValue::new("z_order", "Z Order", ParamValue::Int(0)));
    store.define(ParameterValue::new("icon", "Icon", ParamValue::text("pin")));
    store
}

fn bench_parameters(c: &mut Criterion) {
    let queue = Arc::new(NotificationQueue::spawn("bench-notify").unwrap());

    let mut group = c.benchmark_group("param/set");

    group.bench_function("single/no_listener", |b| {
        let store = store(&queue);
        let mut width = 0.0;
        b.iter(|| {
            width += 1.0;
            black_box(store.set("width", ParamValue::Float(width), ChangeSource::Editor))
        });
    });

    group.bench_function("single/with_listener", |b| {
        let store = store(&queue);
        store.subscribe(|event| {
            black_box(event.changes.len());
        });
        let mut width = 0.0;
        b.iter(|| {
            width += 1.0;
            black_box(store.set("width", ParamValue::Float(width), ChangeSource::Editor))
        });
        queue.flush();
    });

    group.bench_function("unchanged", |b| {
        let store = store(&queue);
        b.iter(|| black_box(store.set("width", ParamValue::Float(1.0), ChangeSource::Editor)));
    });

    group.bench_function("batch/3", |b| {
        b.iter_batched(
            || store(&queue),
            |store| {
                let changes = store.set_values(
                    [
                        ("width", ParamValue::Float(2.0)),
                        ("z_order", ParamValue::Int(3)),
                        ("icon", ParamValue::text("flag")),
                    ],
                    ChangeSource::NoEvent,
                );
                black_box(changes)
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();

    let mut group = c.benchmark_group("param/chain");
    let session = RenderSession::new(EngineConfig::default()).unwrap();
    for depth in [1_usize, 4, 16] {
        let mut style = session
            .install(
                session
                    .style_builder("level-0", StyleKind::Point)
                    .set(keys::POINT_SIZE, ParamValue::Float(9.0)),
            )
            .unwrap();
        for level in 1..depth {
            style = session
                .install(
                    session
                        .style_builder(&format!("level-{level}"), StyleKind::Tile)
                        .previous(style)
                        .unwrap(),
                )
                .unwrap();
        }
        group.bench_function(BenchmarkId::new("base_value", depth), |b| {
            b.iter(|| black_box(style.value(keys::POINT_SIZE)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parameters);
criterion_main!(benches);
