use std::f64::consts::FRAC_PI_2;

use etch_core::frame::BoundPoint;
use etch_core::geometry::{Point2, Transform2, Vector2};
use etch_io::{
    DocumentLoader, DocumentSaver, IoError, JsonFacade, resolve, snapshot,
};

const NESTED_SKETCH: &str = r#"{
    "components": [
        { "id": 11, "name": "chip", "parent": 10,
          "placement": { "translation": [5.0, 5.0], "rotation": 1.5707963267948966 } },
        { "id": 10, "name": "board",
          "placement": { "translation": [100.0, 50.0] },
          "outline": { "source": "board.svg", "size": [60.0, 40.0] } }
    ],
    "interfaces": [
        { "id": 1, "name": "VCC", "component": 11, "position": [1.0, 0.0] }
    ],
    "traces": [
        { "points": [
            { "position": [0.0, 0.0] },
            { "component": 10, "position": [2.0, 3.0] }
        ] }
    ]
}"#;

#[test]
fn resolve_rebuilds_nested_frame_forest() {
    let saved = serde_json::from_str(NESTED_SKETCH).expect("valid json");
    let document = resolve(&saved).expect("resolution succeeds");

    assert_eq!(document.components().count(), 2);
    assert_eq!(document.interfaces().count(), 1);
    assert_eq!(document.traces().count(), 1);

    // chip 在 board 内，接口坐标经两级坐标系到画布
    let (interface_id, interface) = document
        .interfaces()
        .next()
        .map(|(id, interface)| (*id, interface))
        .expect("interface present");
    assert_eq!(interface.name, "VCC");
    let on_canvas = document
        .express_interface(interface_id, document.canvas_frame())
        .unwrap();
    assert!((on_canvas.x() - 105.0).abs() < 1e-9);
    assert!((on_canvas.y() - 56.0).abs() < 1e-9);

    let board = document
        .components()
        .find(|(_, component)| component.name == "board")
        .map(|(_, component)| component)
        .expect("board present");
    let outline = board.outline.as_ref().expect("outline resolved");
    assert_eq!(outline.source, "board.svg");
    assert!(!document.arena().is_root(outline.frame));
}

#[test]
fn dangling_interface_reference_rejects_whole_load() {
    let json = r#"{
        "components": [ { "id": 1, "name": "part" } ],
        "interfaces": [ { "id": 1, "name": "A", "component": 99, "position": [0.0, 0.0] } ]
    }"#;
    let saved = serde_json::from_str(json).expect("valid json");
    let err = resolve(&saved).unwrap_err();
    assert!(matches!(err, IoError::UnknownComponentRef(99)));
}

#[test]
fn dangling_trace_reference_rejects_whole_load() {
    let json = r#"{
        "components": [ { "id": 1, "name": "part" } ],
        "traces": [ { "points": [ { "component": 7, "position": [1.0, 1.0] } ] } ]
    }"#;
    let saved = serde_json::from_str(json).expect("valid json");
    let err = resolve(&saved).unwrap_err();
    assert!(matches!(err, IoError::UnknownComponentRef(7)));
}

#[test]
fn unknown_parent_reference_rejected() {
    let json = r#"{
        "components": [ { "id": 1, "name": "orphan", "parent": 42 } ]
    }"#;
    let saved = serde_json::from_str(json).expect("valid json");
    let err = resolve(&saved).unwrap_err();
    assert!(matches!(err, IoError::UnknownParentRef(1, 42)));
}

#[test]
fn cyclic_parent_references_rejected() {
    let json = r#"{
        "components": [
            { "id": 1, "name": "a", "parent": 2 },
            { "id": 2, "name": "b", "parent": 1 }
        ]
    }"#;
    let saved = serde_json::from_str(json).expect("valid json");
    let err = resolve(&saved).unwrap_err();
    assert!(matches!(err, IoError::CyclicParentRef(_)));
}

#[test]
fn duplicate_component_ids_rejected() {
    let json = r#"{
        "components": [
            { "id": 3, "name": "a" },
            { "id": 3, "name": "b" }
        ]
    }"#;
    let saved = serde_json::from_str(json).expect("valid json");
    let err = resolve(&saved).unwrap_err();
    assert!(matches!(err, IoError::DuplicateComponentId(3)));
}

#[test]
fn attached_subdocument_survives_snapshot_round_trip() {
    let mut host = etch_core::document::SketchDocument::new();
    let host_part = host
        .place_component("U1", Transform2::IDENTITY)
        .unwrap();
    host.add_interface(host_part, "VCC", Point2::new(0.0, 0.0))
        .unwrap();

    let mut sub = etch_core::document::SketchDocument::new();
    let sub_part = sub
        .place_component(
            "R1",
            Transform2::new(Vector2::new(1.0, 1.0), FRAC_PI_2, Vector2::new(1.0, 1.0)),
        )
        .unwrap();
    sub.add_interface(sub_part, "A", Point2::new(0.5, 0.0))
        .unwrap();

    // 子文档的摆放由挂接时的画布锚定变换承载
    host.attach_document(sub, Transform2::from_translation(Vector2::new(10.0, 0.0)))
        .unwrap();

    let before: Vec<_> = host
        .interfaces()
        .map(|(id, _)| {
            host.express_interface(*id, host.canvas_frame()).unwrap()
        })
        .collect();

    let reloaded = resolve(&snapshot(&host).unwrap()).expect("round trip succeeds");
    assert_eq!(reloaded.interfaces().count(), before.len());
    let after: Vec<_> = reloaded
        .interfaces()
        .map(|(id, _)| {
            reloaded
                .express_interface(*id, reloaded.canvas_frame())
                .unwrap()
        })
        .collect();

    for (expected, actual) in before.iter().zip(&after) {
        assert!(
            (actual.x() - expected.x()).abs() < 1e-5
                && (actual.y() - expected.y()).abs() < 1e-5,
            "interface moved across save/load: expected ({}, {}), got ({}, {})",
            expected.x(),
            expected.y(),
            actual.x(),
            actual.y()
        );
    }
}

#[test]
fn facade_round_trip_preserves_geometry() {
    let mut document = etch_core::document::SketchDocument::new();
    let connector = document
        .place_component(
            "J1",
            Transform2::new(
                Vector2::new(12.0, -4.0),
                FRAC_PI_2,
                Vector2::new(1.0, 1.0),
            ),
        )
        .unwrap();
    document
        .set_outline(
            connector,
            "connector.svg",
            Vector2::new(10.0, 5.0),
            Transform2::from_scale(Vector2::new(0.25, 0.25)),
        )
        .unwrap();
    let pin = document
        .add_interface(connector, "1", Point2::new(2.0, 0.5))
        .unwrap();
    document
        .add_trace(vec![
            BoundPoint::new(document.canvas_frame(), Point2::new(0.0, 0.0)),
            BoundPoint::new(document.canvas_frame(), Point2::new(12.0, -4.0)),
        ])
        .unwrap();

    let expected = document
        .express_interface(pin, document.canvas_frame())
        .unwrap();

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("sketch.json");
    let facade = JsonFacade::new();
    facade.save(&document, &path).expect("save succeeds");
    let reloaded = facade.load(&path).expect("load succeeds");

    let (reloaded_pin, _) = reloaded
        .interfaces()
        .next()
        .map(|(id, interface)| (*id, interface))
        .expect("interface survives");
    let actual = reloaded
        .express_interface(reloaded_pin, reloaded.canvas_frame())
        .unwrap();
    assert!((actual.x() - expected.x()).abs() < 1e-5);
    assert!((actual.y() - expected.y()).abs() < 1e-5);
    assert_eq!(reloaded.traces().count(), 1);

    // 快照与再快照应当一致
    let first = snapshot(&document).unwrap();
    let second = snapshot(&reloaded).unwrap();
    assert_eq!(first.components.len(), second.components.len());
    assert_eq!(first.interfaces.len(), second.interfaces.len());
}
