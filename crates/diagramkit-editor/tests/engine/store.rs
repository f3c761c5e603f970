use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use diagramkit_core::{
    BasicSequenceLayout, Bounds, EditorConfig, Error, InMemoryDiagramApi, NewConnector, NewShape,
    Point, ReferenceTracker, Result, Shape, ShapeUpdate,
};
use diagramkit_editor::{CommandManager, CommandScope, DiagramStore, ShapeMove};

use crate::support::{assert_in_sync, flowchart, open_store, sequence};

#[tokio::test]
async fn test_open_unknown_diagram_records_error() {
    let (_api, store) = open_store(vec![flowchart()]).await;
    let err = store.open_diagram("nope").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(store.error("nope"), Some(err));
    assert!(!store.is_open("nope"));
}

#[tokio::test]
async fn test_delete_shape_is_one_undo_step() {
    let (_api, store) = open_store(vec![flowchart()]).await;
    let scope = CommandScope::new("d1");

    store.delete_shape("d1", "s1").await.unwrap();
    assert_eq!(store.commands().undo_stack_size(&scope).await, 1);
    let diagram = store.diagram("d1").unwrap();
    assert!(diagram.shape("s1").is_none());
    assert!(diagram.connectors.is_empty());
    assert_in_sync(&store, "d1");

    assert!(store.undo("d1").await.unwrap());
    assert_eq!(store.diagram("d1").unwrap(), flowchart());
    assert_in_sync(&store, "d1");
    assert!(store.can_redo("d1").await);
}

#[tokio::test]
async fn test_update_shape_accepts_only_position() {
    let (_api, store) = open_store(vec![flowchart()]).await;

    let err = store
        .update_shape("d1", "s1", ShapeUpdate::label("nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOperation { .. }));
    assert_eq!(store.error("d1"), Some(err));
    assert!(!store.can_undo("d1").await);

    store.clear_error("d1");
    store
        .update_shape("d1", "s1", ShapeUpdate::position(Point::new(30.0, 40.0)))
        .await
        .unwrap();
    assert_eq!(store.diagram("d1").unwrap().shape("s1").unwrap().position(), Point::new(30.0, 40.0));
    assert_eq!(store.error("d1"), None);
}

#[tokio::test]
async fn test_persistence_failure_leaves_state_untouched() {
    let (api, store) = open_store(vec![flowchart()]).await;
    api.set_fail_writes(true);

    let err = store
        .add_shape("d1", NewShape::new("process", Bounds::new(0.0, 400.0, 10.0, 10.0)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Persistence { .. }));
    assert_eq!(store.error("d1"), Some(err));
    assert_eq!(store.diagram("d1").unwrap(), flowchart());
    assert_in_sync(&store, "d1");
    assert!(!store.can_undo("d1").await);
}

#[tokio::test]
async fn test_missing_shape_is_recorded_not_found() {
    let (_api, store) = open_store(vec![flowchart()]).await;
    let err = store.delete_shape("d1", "ghost").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(store.error("d1").is_some_and(|e| e.is_not_found()));
}

#[tokio::test]
async fn test_move_shapes_single_step() {
    let (api, store) = open_store(vec![flowchart()]).await;
    api.reset_calls();
    store
        .move_shapes(
            "d1",
            vec![
                ShapeMove::new("s1", Point::new(0.0, 0.0), Point::new(10.0, 0.0)),
                ShapeMove::new("s2", Point::new(200.0, 0.0), Point::new(210.0, 0.0)),
            ],
        )
        .await
        .unwrap();
    assert_eq!(api.write_calls(), 1);
    assert_eq!(store.commands().undo_stack_size(&CommandScope::new("d1")).await, 1);

    store.move_shapes("d1", Vec::new()).await.unwrap();
    assert_eq!(api.write_calls(), 1);
}

#[tokio::test]
async fn test_add_shapes_empty_batch_is_noop() {
    let (api, store) = open_store(vec![sequence()]).await;
    api.reset_calls();

    let created = store.add_shapes("seq", Vec::new()).await.unwrap();
    assert!(created.is_empty());
    assert_eq!(api.write_calls(), 0);
    assert!(!store.can_undo("seq").await);
}

#[tokio::test]
async fn test_sequence_connector_changes_are_one_step() {
    let (_api, store) = open_store(vec![sequence()]).await;
    let before = store.diagram("seq").unwrap();

    let connector = store
        .add_connector(
            "seq",
            NewConnector::new("message", "a", "b").with_data(serde_json::json!({ "y": 600.0 })),
        )
        .await
        .unwrap();
    assert_eq!(connector.source_shape_id, "a");
    assert_eq!(store.diagram("seq").unwrap().shape("a").unwrap().height, 640.0);
    assert_eq!(store.commands().undo_stack_size(&CommandScope::new("seq")).await, 1);
    assert_in_sync(&store, "seq");

    store.undo("seq").await.unwrap();
    assert_eq!(store.diagram("seq").unwrap(), before);
    assert_in_sync(&store, "seq");

    store.redo("seq").await.unwrap();
    store.delete_connector("seq", &connector.id).await.unwrap();
    assert_eq!(store.diagram("seq").unwrap().shape("a").unwrap().height, 400.0);
}

#[tokio::test]
async fn test_close_diagram_drops_history() {
    let (_api, store) = open_store(vec![flowchart()]).await;
    store.update_shape_label("d1", "s1", "Renamed").await.unwrap();
    assert!(store.can_undo("d1").await);

    store.close_diagram("d1");
    assert!(!store.is_open("d1"));
    assert!(!store.local().is_open("d1"));
    assert_eq!(store.commands().scope_count(), 0);
}

#[tokio::test]
async fn test_scopes_follow_diagrams() {
    let mut second = flowchart();
    second.id = "d2".into();
    let (_api, store) = open_store(vec![flowchart(), second]).await;

    store.update_shape_label("d1", "s1", "One!").await.unwrap();
    store.update_shape_label("d2", "s1", "Two!").await.unwrap();
    store.undo("d2").await.unwrap();

    assert_eq!(store.diagram("d1").unwrap().shape("s1").unwrap().label, "One!");
    assert_eq!(store.diagram("d2").unwrap().shape("s1").unwrap().label, "One");
}

/// Tracker that records calls and fails every one of them.
#[derive(Default)]
struct FailingTracker {
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl ReferenceTracker for FailingTracker {
    async fn shape_created(&self, _diagram_id: &str, shape: &Shape) -> Result<()> {
        self.calls.lock().unwrap().push(format!("created:{}", shape.id));
        Err(Error::other("reference store offline"))
    }

    async fn shape_label_updated(&self, _diagram_id: &str, shape: &Shape) -> Result<()> {
        self.calls.lock().unwrap().push(format!("label:{}", shape.id));
        Err(Error::other("reference store offline"))
    }

    async fn shape_deleted(&self, _diagram_id: &str, shape_id: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("deleted:{}", shape_id));
        Err(Error::other("reference store offline"))
    }
}

#[tokio::test]
async fn test_reference_failures_do_not_fail_operations() {
    let api = Arc::new(InMemoryDiagramApi::with_diagrams([flowchart()]));
    let tracker = Arc::new(FailingTracker::default());
    let store = DiagramStore::with_collaborators(
        api,
        Arc::new(CommandManager::default()),
        tracker.clone(),
        Arc::new(BasicSequenceLayout::new(EditorConfig::default().sequence)),
    );
    store.open_diagram("d1").await.unwrap();

    let shape = store
        .add_shape("d1", NewShape::new("process", Bounds::new(0.0, 400.0, 10.0, 10.0)))
        .await
        .unwrap();
    store.update_shape_label("d1", &shape.id, "New").await.unwrap();
    store.delete_shape("d1", &shape.id).await.unwrap();

    assert_eq!(store.error("d1"), None);
    let calls = tracker.calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![
            format!("created:{}", shape.id),
            format!("label:{}", shape.id),
            format!("deleted:{}", shape.id),
        ]
    );
}
