// Copyright 2025 the Geostyle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Construction and derivation against a recording geometry factory.

use std::sync::{Arc, Mutex, mpsc};

use geostyle_geo::{FillStyle, LengthUnit, ReferenceLevel, ReferenceMode};
use geostyle_param::{ChangeSource, ParamValue, Rgba8};
use geostyle_pool::RenderShape;
use geostyle_style::{
    CollectionDescriptor, ColumnSpec, Derivation, EngineConfig, FeatureContext, FeatureLocation,
    Footprint, GeometryFactory, GeometryRequest, MetadataValue, RebuildReason, RenderSession,
    StyleError, StyleKind, construct, construct_batch, derive, keys,
};
use hashbrown::HashMap;

#[derive(Default)]
struct Recorder {
    requests: Mutex<Vec<GeometryRequest>>,
    refuse: Option<u64>,
}

impl GeometryFactory for Recorder {
    type Geometry = u64;
    type Error = String;

    fn create(&self, request: GeometryRequest) -> Result<u64, String> {
        if self.refuse == Some(request.element_id) {
            return Err("out of buffers".to_owned());
        }
        let id = request.geometry_id;
        self.requests.lock().unwrap().push(request);
        Ok(id)
    }
}

fn ellipses() -> Arc<CollectionDescriptor> {
    Arc::new(CollectionDescriptor {
        data_type_key: "ellipses".to_owned(),
        altitude_column: Some(ColumnSpec::new("alt", LengthUnit::Feet)),
        semi_major_column: Some(ColumnSpec::new("major", LengthUnit::Kilometers)),
        semi_minor_column: Some(ColumnSpec::new("minor", LengthUnit::Kilometers)),
        orientation_column: Some("heading".to_owned()),
    })
}

fn ellipse_feature(id: u64, cells: &[(&str, MetadataValue)]) -> FeatureContext {
    let cells: HashMap<String, MetadataValue> = cells
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect();
    FeatureContext::new(id, FeatureLocation::new(0.0, 0.0), ellipses())
        .with_metadata(Arc::new(cells))
}

#[test]
fn ellipse_construction_places_and_sizes_feature() {
    let session = RenderSession::new(EngineConfig::default()).unwrap();
    let style = session
        .install(
            session
                .style_builder("ellipses", StyleKind::Ellipse)
                .set(keys::LIFT, ParamValue::Float(5.0))
                .set(keys::ALTITUDE_REFERENCE, ParamValue::tag("ellipsoid")),
        )
        .unwrap();
    let feature = ellipse_feature(
        1,
        &[
            ("alt", MetadataValue::Float(100.0)),
            ("major", MetadataValue::Float(111.19)),
            ("minor", MetadataValue::Text(Arc::from("55.595"))),
            ("heading", MetadataValue::Int(90)),
        ],
    );

    let factory = Recorder::default();
    let geometry = construct(&style, &feature, None, session.pool(), &factory).unwrap();
    assert_eq!(geometry, 1);

    let requests = factory.requests.lock().unwrap();
    let request = &requests[0];
    assert_eq!(request.kind, StyleKind::Ellipse);
    assert_eq!(request.position.reference, ReferenceLevel::Ellipsoid);
    assert!((request.position.altitude_m - (30.48 + 5.0)).abs() < 1e-9);

    let Some(Footprint::Ellipse { outline, ellipsoid }) = &request.footprint else {
        panic!("expected an ellipse footprint");
    };
    assert!((outline.radii().x - 1.0).abs() < 1e-3);
    assert!((outline.radii().y - 0.5).abs() < 1e-3);
    assert!((ellipsoid.horizontal_radii.x - 111_190.0).abs() < 1e-6);
    assert!(matches!(request.render_state.shape(), RenderShape::Fill { .. }));
    assert!(session.pool().is_canonical(&request.render_state));
}

#[test]
fn batch_skips_refused_records_and_shares_render_state() {
    let session = RenderSession::new(EngineConfig::default()).unwrap();
    let style = session
        .install(session.style_builder("ellipses", StyleKind::Ellipse))
        .unwrap();
    let good = |id| ellipse_feature(id, &[("major", MetadataValue::Float(1.0))]);
    let features = vec![
        good(1),
        // Malformed axis text reads as absent; the style's default axes apply.
        ellipse_feature(2, &[("major", MetadataValue::Text(Arc::from("wide")))]),
        good(3),
        good(4),
    ];
    let factory = Recorder {
        refuse: Some(4),
        ..Recorder::default()
    };

    let report = construct_batch(&style, &features, session.pool(), &factory).unwrap();
    let built: Vec<_> = report.built.iter().map(|(id, _)| *id).collect();
    assert_eq!(built, [1, 2, 3]);
    assert_eq!(report.skipped.len(), 1);
    assert!(matches!(
        report.skipped[0],
        (4, StyleError::GeometryFactory { element_id: 4, .. })
    ));

    let requests = factory.requests.lock().unwrap();
    let Some(Footprint::Ellipse { ellipsoid, .. }) = &requests[1].footprint else {
        panic!("expected an ellipse footprint");
    };
    // One kilometer by default.
    assert_eq!(ellipsoid.horizontal_radii.x, 1000.0);

    // Every constructed feature shares one pooled render state.
    assert!(Arc::ptr_eq(&requests[0].render_state, &requests[1].render_state));
    assert!(Arc::ptr_eq(&requests[0].render_state, &requests[2].render_state));
}

#[test]
fn listener_driven_derivation() {
    let session = RenderSession::new(EngineConfig::default()).unwrap();
    let style = session
        .install(
            session
                .style_builder("areas", StyleKind::Polygon)
                .set(keys::FILL_STYLE, ParamValue::tag(FillStyle::Edge.tag())),
        )
        .unwrap();
    let feature = FeatureContext::new(
        7,
        FeatureLocation::new(10.0, 10.0),
        Arc::new(CollectionDescriptor::new("areas")),
    );
    let factory = Recorder::default();
    construct(&style, &feature, None, session.pool(), &factory).unwrap();
    let existing = Arc::clone(&factory.requests.lock().unwrap()[0].render_state);

    let (tx, rx) = mpsc::channel();
    style.subscribe(move |event| {
        tx.send(event.changes.clone()).unwrap();
    });

    style.set_rim_fade(64, ChangeSource::Editor).unwrap();
    let changes = rx.recv().unwrap();
    let outcome = derive(&style, &changes, &existing, &feature, session.pool()).unwrap();
    let Derivation::PatchInPlace(patched) = &outcome else {
        panic!("expected a patch, got {outcome:?}");
    };
    let white = Rgba8 {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };
    assert_eq!(
        patched.shape(),
        &RenderShape::Fill {
            center_color: Rgba8 { a: 64, ..white },
            edge_color: white,
            z_order: 0,
        }
    );

    style
        .set(keys::LIFT, ParamValue::Float(3.0), ChangeSource::Editor)
        .unwrap();
    let changes = rx.recv().unwrap();
    assert_eq!(
        derive(&style, &changes, patched, &feature, session.pool()).unwrap(),
        Derivation::RebuildRequired(RebuildReason::Flagged(keys::LIFT.to_owned()))
    );

    // A silent change produces no event.
    style
        .set(keys::Z_ORDER, ParamValue::Int(4), ChangeSource::NoEvent)
        .unwrap();
    session.queue().flush();
    assert!(rx.try_recv().is_err());
    assert_eq!(
        style.value(keys::ALTITUDE_REFERENCE).unwrap(),
        Some(ParamValue::tag(ReferenceMode::Automatic.tag()))
    );
}
