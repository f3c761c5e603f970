use std::sync::Arc;

use diagramkit_core::{
    Bounds, Diagram, InMemoryDiagramApi, NewConnector, NewShape, Point, LIFELINE_TYPE,
};
use diagramkit_editor::commands::ACTIVATIONS_KEY;
use diagramkit_editor::{
    BoxedCommand, Command, CommandDeps, CommandFactory, DiagramPrimitives, DiagramRepository,
    LocalCanvasState, LocalStateRegistry, ShapeMove, ShapeResize,
};
use serde_json::json;

use crate::support::{flowchart, sequence};

struct Harness {
    api: Arc<InMemoryDiagramApi>,
    repository: Arc<DiagramRepository>,
    local: Arc<LocalStateRegistry>,
    factory: CommandFactory,
}

impl Harness {
    async fn new(diagram: Diagram) -> Self {
        let id = diagram.id.clone();
        let api = Arc::new(InMemoryDiagramApi::with_diagrams([diagram]));
        let repository = Arc::new(DiagramRepository::new(api.clone()));
        let loaded = repository.load(&id).await.unwrap();
        let local = Arc::new(LocalStateRegistry::new());
        local.open(&loaded);
        let deps = CommandDeps::new(repository.clone()).with_local_state(local.clone());
        Self {
            api,
            repository,
            local,
            factory: CommandFactory::new(deps),
        }
    }

    fn diagram(&self, id: &str) -> Diagram {
        self.repository.diagram(id).unwrap()
    }

    fn assert_mirror(&self, id: &str) {
        assert_eq!(
            self.local.snapshot(id).unwrap(),
            LocalCanvasState::from_diagram(&self.diagram(id))
        );
    }

    /// execute → undo → redo, checking the aggregate and mirror at each step.
    async fn assert_inverse(&self, id: &str, mut cmd: BoxedCommand) -> Diagram {
        let before = self.diagram(id);

        cmd.execute().await.unwrap();
        let after = self.diagram(id);
        assert_ne!(before, after, "'{}' changed nothing", cmd.description());
        self.assert_mirror(id);

        cmd.undo().await.unwrap();
        assert_eq!(self.diagram(id), before, "undo of '{}'", cmd.description());
        self.assert_mirror(id);

        cmd.execute().await.unwrap();
        assert_eq!(self.diagram(id), after, "redo of '{}'", cmd.description());
        self.assert_mirror(id);
        after
    }
}

#[tokio::test]
async fn test_add_shape_inverse() {
    let h = Harness::new(flowchart()).await;
    let cmd = h
        .factory
        .create_add_shape("d1", NewShape::new("decision", Bounds::new(400.0, 0.0, 80.0, 80.0)));
    let after = h.assert_inverse("d1", Box::new(cmd)).await;
    assert_eq!(after.shapes.len(), 4);
}

#[tokio::test]
async fn test_add_shape_redo_keeps_id() {
    let h = Harness::new(flowchart()).await;
    let mut cmd = h
        .factory
        .create_add_shape("d1", NewShape::new("decision", Bounds::new(400.0, 0.0, 80.0, 80.0)));
    cmd.execute().await.unwrap();
    let id = cmd.created_shape().unwrap().id.clone();
    cmd.undo().await.unwrap();
    cmd.execute().await.unwrap();
    assert!(h.diagram("d1").shape(&id).is_some());
}

#[tokio::test]
async fn test_add_shape_undo_before_execute_is_invariant_violation() {
    let h = Harness::new(flowchart()).await;
    let mut cmd = h
        .factory
        .create_add_shape("d1", NewShape::new("decision", Bounds::default()));
    let err = cmd.undo().await.unwrap_err();
    assert!(err.is_undo_invariant_violation());
    assert_eq!(h.api.write_calls(), 0);
}

#[tokio::test]
async fn test_add_shapes_inverse_in_one_call() {
    let h = Harness::new(flowchart()).await;
    let cmd = h.factory.create_add_shapes(
        "d1",
        vec![
            NewShape::new("process", Bounds::new(400.0, 0.0, 10.0, 10.0)),
            NewShape::new("process", Bounds::new(400.0, 50.0, 10.0, 10.0)),
        ],
    );
    h.api.reset_calls();
    let after = h.assert_inverse("d1", Box::new(cmd)).await;
    assert_eq!(after.shapes.len(), 5);
    assert_eq!(h.api.calls("add_shapes"), 1);
}

#[tokio::test]
async fn test_delete_shape_takes_connectors_along() {
    let h = Harness::new(flowchart()).await;
    h.api.reset_calls();
    let cmd = h.factory.create_delete_shape("d1", "s1");
    let after = h.assert_inverse("d1", Box::new(cmd)).await;

    assert!(after.shape("s1").is_none());
    assert!(after.connectors.is_empty());
    // execute, undo, redo: one round trip each
    assert_eq!(h.api.write_calls(), 3);
}

#[tokio::test]
async fn test_delete_shapes_with_extra_connectors() {
    let mut diagram = flowchart();
    diagram.connectors.push(diagramkit_core::Connector::from_new(
        "c23",
        NewConnector::new("arrow", "s2", "s3"),
    ));
    let h = Harness::new(diagram).await;
    let cmd = h
        .factory
        .create_delete_shapes("d1", vec!["s2".into(), "s2".into()], vec!["c13".into()]);
    assert_eq!(cmd.description(), "Delete shape");
    let after = h.assert_inverse("d1", Box::new(cmd)).await;

    assert_eq!(after.shapes.len(), 2);
    assert!(after.connectors.is_empty());
}

#[tokio::test]
async fn test_delete_missing_shape_is_not_found() {
    let h = Harness::new(flowchart()).await;
    let mut cmd = h.factory.create_delete_shape("d1", "ghost");
    let err = cmd.execute().await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(h.diagram("d1"), flowchart());
}

#[tokio::test]
async fn test_move_shape_inverse() {
    let h = Harness::new(flowchart()).await;
    let cmd = h
        .factory
        .create_move_shape("d1", "s2", Point::new(200.0, 0.0), Point::new(260.0, 30.0));
    let after = h.assert_inverse("d1", Box::new(cmd)).await;
    assert_eq!(after.shape("s2").unwrap().position(), Point::new(260.0, 30.0));
}

#[tokio::test]
async fn test_move_entities_is_one_update() {
    let h = Harness::new(flowchart()).await;
    h.api.reset_calls();
    let cmd = h.factory.create_move_entities(
        "d1",
        vec![
            ShapeMove::new("s1", Point::new(0.0, 0.0), Point::new(10.0, 10.0)),
            ShapeMove::new("s3", Point::new(0.0, 200.0), Point::new(10.0, 210.0)),
        ],
    );
    let mut cmd: BoxedCommand = Box::new(cmd);
    cmd.execute().await.unwrap();
    assert_eq!(h.api.calls("update_shapes"), 1);
    assert_eq!(h.api.write_calls(), 1);

    cmd.undo().await.unwrap();
    assert_eq!(h.diagram("d1"), flowchart());
}

#[tokio::test]
async fn test_move_entities_inverse_leaves_connectors() {
    let h = Harness::new(flowchart()).await;
    let cmd = h.factory.create_move_entities(
        "d1",
        vec![ShapeMove::new("s1", Point::new(0.0, 0.0), Point::new(100.0, 40.0))],
    );
    let after = h.assert_inverse("d1", Box::new(cmd)).await;
    assert_eq!(after.connectors, flowchart().connectors);
}

#[tokio::test]
async fn test_resize_shapes_inverse() {
    let h = Harness::new(flowchart()).await;
    let cmd = h.factory.create_resize_shapes(
        "d1",
        vec![
            ShapeResize::new("s1", Bounds::new(0.0, 0.0, 100.0, 50.0), Bounds::new(0.0, 0.0, 150.0, 80.0)),
            ShapeResize::new("s2", Bounds::new(200.0, 0.0, 100.0, 50.0), Bounds::new(190.0, 0.0, 110.0, 50.0)),
        ],
    );
    let after = h.assert_inverse("d1", Box::new(cmd)).await;
    assert_eq!(after.shape("s1").unwrap().bounds(), Bounds::new(0.0, 0.0, 150.0, 80.0));
}

#[tokio::test]
async fn test_update_shape_label_inverse() {
    let h = Harness::new(flowchart()).await;
    let cmd = h.factory.create_update_shape_label("d1", "s3", "Renamed");
    let after = h.assert_inverse("d1", Box::new(cmd)).await;
    assert_eq!(after.shape("s3").unwrap().label, "Renamed");
}

#[tokio::test]
async fn test_add_connector_inverse() {
    let h = Harness::new(flowchart()).await;
    let cmd = h
        .factory
        .create_add_connector("d1", NewConnector::new("arrow", "s2", "s3").with_label("next"));
    let after = h.assert_inverse("d1", Box::new(cmd)).await;
    assert_eq!(after.connectors.len(), 3);
}

#[tokio::test]
async fn test_add_connector_to_missing_shape_fails() {
    let h = Harness::new(flowchart()).await;
    let mut cmd = h
        .factory
        .create_add_connector("d1", NewConnector::new("arrow", "s2", "ghost"));
    assert!(cmd.execute().await.unwrap_err().is_not_found());
    assert_eq!(h.api.write_calls(), 0);
}

#[tokio::test]
async fn test_delete_connectors_inverse() {
    let h = Harness::new(flowchart()).await;
    let cmd = h
        .factory
        .create_delete_connectors("d1", vec!["c13".into(), "c12".into()]);
    let after = h.assert_inverse("d1", Box::new(cmd)).await;
    assert!(after.connectors.is_empty());
}

#[tokio::test]
async fn test_update_connector_label_inverse() {
    let h = Harness::new(flowchart()).await;
    let cmd = h
        .factory
        .create_update_connector_label("d1", "c12", Some("yes".into()));
    let after = h.assert_inverse("d1", Box::new(cmd)).await;
    assert_eq!(after.connector("c12").unwrap().label.as_deref(), Some("yes"));
}

#[tokio::test]
async fn test_sequence_side_effects_follow_connector() {
    let h = Harness::new(sequence()).await;
    let add = h.factory.create_add_connector(
        "seq",
        NewConnector::new("message", "a", "b").with_data(json!({ "y": 500.0 })),
    );
    let cmd = h.factory.with_sequence_side_effects("seq", Box::new(add));
    assert_eq!(cmd.description(), "Add connector");

    let after = h.assert_inverse("seq", cmd).await;
    for lifeline in after.shapes.iter().filter(|s| s.shape_type == LIFELINE_TYPE) {
        assert_eq!(lifeline.height, 540.0);
    }
    let activations = after.shape("b").unwrap().data[ACTIVATIONS_KEY].as_array().unwrap();
    assert_eq!(activations.len(), 1);
}

#[tokio::test]
async fn test_side_effects_skip_other_diagrams() {
    let h = Harness::new(flowchart()).await;
    let add = h
        .factory
        .create_add_connector("d1", NewConnector::new("arrow", "s2", "s3"));
    let mut cmd = h.factory.with_sequence_side_effects("d1", Box::new(add));
    h.api.reset_calls();
    cmd.execute().await.unwrap();
    assert_eq!(h.api.write_calls(), 1);
}
