// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for render state interning and derivation.

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use geostyle_param::{ChangeSet, ParamValue, Rgba8};
use geostyle_pool::{Px, RenderPropertyPool, RenderShape, RenderState};
use geostyle_style::{
    CollectionDescriptor, EngineConfig, FeatureContext, FeatureLocation, RenderSession, StyleKind,
    build_render_state, derive, keys,
};

fn line(width: u16) -> RenderState {
    RenderState::new(RenderShape::Line {
        color: Rgba8 {
            r: 40,
            g: 80,
            b: 160,
            a: 255,
        },
        width: Px::new(f32::from(width)),
        z_order: 2,
        stipple: None,
    })
}

fn bench_pool(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool/intern");

    for distinct in [1_u16, 64, 1024] {
        group.bench_function(BenchmarkId::new("hit", distinct), |b| {
            let pool = RenderPropertyPool::new();
            for width in 0..distinct {
                pool.intern(line(width));
            }
            let mut width = 0;
            b.iter(|| {
                width = (width + 1) % distinct;
                black_box(pool.intern(line(width)))
            });
        });
    }

    group.bench_function("miss_then_clear", |b| {
        let pool = RenderPropertyPool::new();
        let mut width = 0_u16;
        b.iter(|| {
            width = width.wrapping_add(1);
            if width == 0 {
                pool.clear();
            }
            black_box(pool.intern(line(width)))
        });
    });

    group.finish();
}

fn bench_derive(c: &mut Criterion) {
    let session = RenderSession::new(EngineConfig::default()).unwrap();
    let style = session
        .install(session.style_builder("areas", StyleKind::Polygon))
        .unwrap();
    let feature = FeatureContext::new(
        1,
        FeatureLocation::new(48.0, 11.0),
        Arc::new(CollectionDescriptor::new("areas")),
    );
    let existing = session
        .pool()
        .intern(build_render_state(&style, &feature).unwrap());

    let mut group = c.benchmark_group("style/derive");

    let change = |key: &str, value: ParamValue| {
        let mut changes = ChangeSet::new();
        let parameter = style.params().get(key).unwrap();
        changes.insert(parameter.with_value(value).unwrap());
        changes
    };

    let patch = change(keys::RIM_FADE, ParamValue::Int(128));
    group.bench_function("patch_in_place", |b| {
        b.iter(|| black_box(derive(&style, &patch, &existing, &feature, session.pool())));
    });

    let rebuild = change(keys::LIFT, ParamValue::Float(10.0));
    group.bench_function("flagged_rebuild", |b| {
        b.iter(|| black_box(derive(&style, &rebuild, &existing, &feature, session.pool())));
    });

    group.bench_function("build_render_state", |b| {
        b.iter(|| black_box(build_render_state(&style, &feature)));
    });

    group.finish();
}

criterion_group!(benches, bench_pool, bench_derive);
criterion_main!(benches);
