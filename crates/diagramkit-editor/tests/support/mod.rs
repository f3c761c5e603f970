#![allow(dead_code)]

use std::sync::Arc;

use diagramkit_core::{
    Bounds, Connector, Diagram, DiagramType, EditorConfig, InMemoryDiagramApi, NewConnector,
    NewShape, Shape, Viewport, LIFELINE_TYPE,
};
use diagramkit_editor::{CanvasController, DiagramStore, LocalCanvasState, ManualFrameScheduler};

/// `d1`: three boxes, `s1` connected to both others.
pub fn flowchart() -> Diagram {
    let mut diagram = Diagram::new("d1", DiagramType::Flowchart);
    diagram.shapes = vec![
        Shape::from_new("s1", NewShape::new("process", Bounds::new(0.0, 0.0, 100.0, 50.0)).with_label("One")),
        Shape::from_new("s2", NewShape::new("process", Bounds::new(200.0, 0.0, 100.0, 50.0)).with_label("Two")),
        Shape::from_new("s3", NewShape::new("process", Bounds::new(0.0, 200.0, 100.0, 50.0)).with_label("Three")),
    ];
    diagram.connectors = vec![
        Connector::from_new("c12", NewConnector::new("arrow", "s1", "s2")),
        Connector::from_new("c13", NewConnector::new("arrow", "s1", "s3")),
    ];
    diagram
}

/// `seq`: two lifelines with no messages.
pub fn sequence() -> Diagram {
    let mut diagram = Diagram::new("seq", DiagramType::Sequence);
    diagram.shapes = vec![
        Shape::from_new("a", NewShape::new(LIFELINE_TYPE, Bounds::new(0.0, 0.0, 100.0, 400.0)).with_label("A")),
        Shape::from_new("b", NewShape::new(LIFELINE_TYPE, Bounds::new(200.0, 0.0, 100.0, 400.0)).with_label("B")),
    ];
    diagram
}

/// `grouped`: container `g` holding `g1`, plus a loose shape `x`.
pub fn grouped() -> Diagram {
    let mut diagram = Diagram::new("grouped", DiagramType::Architecture);
    diagram.shapes = vec![
        Shape::from_new("g", NewShape::new("group", Bounds::new(0.0, 0.0, 300.0, 200.0))),
        Shape::from_new("g1", NewShape::new("service", Bounds::new(20.0, 20.0, 100.0, 60.0)).with_parent("g")),
        Shape::from_new("x", NewShape::new("service", Bounds::new(500.0, 0.0, 100.0, 60.0))),
    ];
    diagram
}

pub async fn open_store(diagrams: Vec<Diagram>) -> (Arc<InMemoryDiagramApi>, Arc<DiagramStore>) {
    let ids: Vec<String> = diagrams.iter().map(|d| d.id.clone()).collect();
    let api = Arc::new(InMemoryDiagramApi::with_diagrams(diagrams));
    let store = Arc::new(DiagramStore::new(api.clone(), &EditorConfig::default()));
    for id in ids {
        store.open_diagram(&id).await.unwrap();
    }
    (api, store)
}

pub fn controller(store: &Arc<DiagramStore>, diagram_id: &str) -> (CanvasController, ManualFrameScheduler) {
    let scheduler = ManualFrameScheduler::new();
    let controller = CanvasController::new(
        Arc::clone(store),
        diagram_id,
        &EditorConfig::default().interaction,
        Viewport::new(),
        Box::new(scheduler.clone()),
    );
    (controller, scheduler)
}

/// Mirror and aggregate hold the same entities.
pub fn assert_in_sync(store: &DiagramStore, diagram_id: &str) {
    let diagram = store.diagram(diagram_id).unwrap();
    let mirror = store.local().snapshot(diagram_id).unwrap();
    assert_eq!(mirror, LocalCanvasState::from_diagram(&diagram));
}
