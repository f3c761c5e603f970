use diagramkit_core::{ConnectionSide, Error, Point, ViewportTransform};
use diagramkit_editor::{
    CanvasEvent, CommandScope, HitTarget, InteractionMode, Key, KeyEvent, Modifiers, MouseButton,
    PointerEvent, ResizeHandle,
};

use crate::support::{assert_in_sync, controller, flowchart, grouped, open_store, sequence};

fn ctrl() -> Modifiers {
    Modifiers {
        ctrl: true,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_drag_scenario_snaps_and_undoes() {
    let (_api, store) = open_store(vec![flowchart()]).await;
    let (mut canvas, scheduler) = controller(&store, "d1");

    assert!(canvas.on_pointer_down(&PointerEvent::at(10.0, 10.0).on_shape("s1")));
    assert_eq!(canvas.mode(), InteractionMode::DraggingShapes);
    canvas.on_pointer_move(&PointerEvent::at(60.0, 30.0));
    canvas.on_pointer_move(&PointerEvent::at(107.0, 52.0));
    assert!(scheduler.is_pending());

    let event = canvas
        .on_pointer_up(&PointerEvent::at(107.0, 52.0))
        .await
        .unwrap();
    let Some(CanvasEvent::ShapesMoved { moves }) = event else {
        panic!("expected a move, got {:?}", event);
    };
    assert_eq!(moves[0].to, Point::new(100.0, 40.0));
    assert_eq!(store.diagram("d1").unwrap().shape("s1").unwrap().position(), Point::new(100.0, 40.0));
    assert_eq!(scheduler.cancelled(), 1);
    assert_in_sync(&store, "d1");

    let event = canvas.on_key_down(&KeyEvent::new(Key::Z).with_modifiers(ctrl())).await.unwrap();
    assert_eq!(event, Some(CanvasEvent::Undone));
    let diagram = store.diagram("d1").unwrap();
    assert_eq!(diagram.shape("s1").unwrap().position(), Point::new(0.0, 0.0));
    assert_eq!(diagram.connectors, flowchart().connectors);
    assert_in_sync(&store, "d1");
}

#[tokio::test]
async fn test_many_moves_make_one_command() {
    let (api, store) = open_store(vec![flowchart()]).await;
    let (mut canvas, scheduler) = controller(&store, "d1");
    api.reset_calls();

    canvas.on_pointer_down(&PointerEvent::at(210.0, 10.0).on_shape("s2"));
    for i in 0..200 {
        canvas.on_pointer_move(&PointerEvent::at(210.0 + i as f64, 10.0));
        if i % 16 == 0 {
            canvas.on_animation_frame();
            scheduler.frame_delivered();
        }
    }
    canvas.on_pointer_up(&PointerEvent::at(409.0, 10.0)).await.unwrap();

    assert_eq!(api.calls("update_shapes"), 1);
    assert_eq!(api.write_calls(), 1);
    assert_eq!(store.commands().undo_stack_size(&CommandScope::new("d1")).await, 1);
    // 200 + 199 snapped to the grid
    assert_eq!(store.diagram("d1").unwrap().shape("s2").unwrap().x, 400.0);
}

#[tokio::test]
async fn test_background_click_clears_selection() {
    let (_api, store) = open_store(vec![flowchart()]).await;
    let (mut canvas, _) = controller(&store, "d1");

    canvas.on_pointer_down(&PointerEvent::at(10.0, 10.0).on_shape("s1"));
    canvas.on_pointer_up(&PointerEvent::at(10.0, 10.0)).await.unwrap();
    assert!(canvas.selection().contains_shape("s1"));

    assert!(canvas.on_pointer_down(&PointerEvent::at(500.0, 500.0)));
    let event = canvas.on_pointer_up(&PointerEvent::at(504.0, 500.0)).await.unwrap();
    assert!(matches!(event, Some(CanvasEvent::SelectionChanged { .. })));
    assert!(canvas.selection().is_empty());
}

#[tokio::test]
async fn test_rubber_band_selects() {
    let (_api, store) = open_store(vec![flowchart()]).await;
    let (mut canvas, _) = controller(&store, "d1");

    canvas.on_pointer_down(&PointerEvent::at(-20.0, -20.0));
    canvas.on_pointer_move(&PointerEvent::at(150.0, 300.0));
    canvas.on_pointer_up(&PointerEvent::at(150.0, 300.0)).await.unwrap();

    assert_eq!(canvas.selection().shape_ids(), vec!["s1".to_string(), "s3".to_string()]);
    assert_eq!(canvas.selection().connector_ids(), vec!["c12".to_string(), "c13".to_string()]);
}

#[tokio::test]
async fn test_delete_key_removes_selection_in_one_step() {
    let (_api, store) = open_store(vec![flowchart()]).await;
    let (mut canvas, _) = controller(&store, "d1");

    canvas.on_pointer_down(&PointerEvent::at(10.0, 10.0).on_shape("s1"));
    canvas.on_pointer_up(&PointerEvent::at(10.0, 10.0)).await.unwrap();
    let event = canvas.on_key_down(&KeyEvent::new(Key::Delete)).await.unwrap();
    assert_eq!(
        event,
        Some(CanvasEvent::Deleted {
            shape_ids: vec!["s1".into()],
            connector_ids: Vec::new(),
        })
    );
    assert!(store.diagram("d1").unwrap().connectors.is_empty());

    canvas.on_key_down(&KeyEvent::new(Key::Z).with_modifiers(ctrl())).await.unwrap();
    assert_eq!(store.diagram("d1").unwrap(), flowchart());

    let redo = Modifiers {
        shift: true,
        ..ctrl()
    };
    let event = canvas.on_key_down(&KeyEvent::new(Key::Z).with_modifiers(redo)).await.unwrap();
    assert_eq!(event, Some(CanvasEvent::Redone));
    assert!(store.diagram("d1").unwrap().shape("s1").is_none());
}

#[tokio::test]
async fn test_escape_cancels_drag_without_writes() {
    let (api, store) = open_store(vec![flowchart()]).await;
    let (mut canvas, scheduler) = controller(&store, "d1");
    api.reset_calls();

    canvas.on_pointer_down(&PointerEvent::at(10.0, 10.0).on_shape("s1"));
    canvas.on_pointer_move(&PointerEvent::at(90.0, 90.0));
    canvas.on_animation_frame();
    canvas.on_pointer_move(&PointerEvent::at(95.0, 95.0));

    let event = canvas.on_key_down(&KeyEvent::new(Key::Escape)).await.unwrap();
    assert_eq!(
        event,
        Some(CanvasEvent::GestureCancelled {
            mode: InteractionMode::DraggingShapes
        })
    );
    assert_eq!(api.write_calls(), 0);
    assert!(!scheduler.is_pending());
    assert_in_sync(&store, "d1");
    assert!(!store.can_undo("d1").await);

    // a stray frame after cancel writes nothing
    assert_eq!(canvas.on_animation_frame(), 0);
}

#[tokio::test]
async fn test_blur_cancels_connector_drawing() {
    let (api, store) = open_store(vec![flowchart()]).await;
    let (mut canvas, _) = controller(&store, "d1");
    api.reset_calls();

    let down = PointerEvent::at(100.0, 25.0).with_target(HitTarget::ConnectionPoint {
        shape_id: "s1".into(),
        side: ConnectionSide::Right,
    });
    assert!(canvas.on_pointer_down(&down));
    canvas.on_pointer_move(&PointerEvent::at(150.0, 25.0));
    assert!(canvas.on_blur());

    assert!(canvas.machine().is_idle());
    assert_eq!(api.write_calls(), 0);
    assert_eq!(store.diagram("d1").unwrap(), flowchart());
}

#[tokio::test]
async fn test_connector_drawing_creates_connector() {
    let (_api, store) = open_store(vec![flowchart()]).await;
    let (mut canvas, _) = controller(&store, "d1");

    canvas.on_pointer_down(&PointerEvent::at(250.0, 50.0).with_target(HitTarget::ConnectionPoint {
        shape_id: "s2".into(),
        side: ConnectionSide::Bottom,
    }));
    canvas.on_pointer_move(&PointerEvent::at(60.0, 210.0));
    let up = PointerEvent::at(60.0, 210.0).on_shape("s3");
    let Some(CanvasEvent::ConnectorCreated { connector }) = canvas.on_pointer_up(&up).await.unwrap() else {
        panic!("expected a connector");
    };
    assert_eq!(connector.source_shape_id, "s2");
    assert_eq!(connector.target_shape_id, "s3");
    assert_eq!(store.diagram("d1").unwrap().connectors.len(), 3);
    assert_in_sync(&store, "d1");
}

#[tokio::test]
async fn test_connector_menu_then_cancel() {
    let (_api, store) = open_store(vec![flowchart()]).await;
    let (mut canvas, _) = controller(&store, "d1");

    canvas.on_pointer_down(&PointerEvent::at(100.0, 25.0).with_target(HitTarget::ConnectionPoint {
        shape_id: "s1".into(),
        side: ConnectionSide::Right,
    }));
    let event = canvas.on_pointer_up(&PointerEvent::at(600.0, 600.0)).await.unwrap();
    assert!(matches!(event, Some(CanvasEvent::OpenConnectorMenu { .. })));
    assert_eq!(canvas.mode(), InteractionMode::DrawingConnector);

    assert!(canvas.cancel_connector_drawing());
    assert!(canvas.machine().is_idle());
    assert_eq!(store.diagram("d1").unwrap(), flowchart());
}

#[tokio::test]
async fn test_failed_commit_reverts_mirror() {
    let (api, store) = open_store(vec![flowchart()]).await;
    let (mut canvas, _) = controller(&store, "d1");

    canvas.on_pointer_down(&PointerEvent::at(10.0, 10.0).on_shape("s1"));
    canvas.on_pointer_move(&PointerEvent::at(80.0, 80.0));
    canvas.on_animation_frame();
    api.set_fail_writes(true);

    let err = canvas.on_pointer_up(&PointerEvent::at(80.0, 80.0)).await.unwrap_err();
    assert!(matches!(err, Error::Persistence { .. }));
    assert_eq!(store.error("d1"), Some(err));
    assert!(canvas.machine().is_idle());
    assert_in_sync(&store, "d1");
    assert_eq!(store.diagram("d1").unwrap(), flowchart());
}

#[tokio::test]
async fn test_dragging_container_moves_children() {
    let (_api, store) = open_store(vec![grouped()]).await;
    let (mut canvas, _) = controller(&store, "grouped");

    canvas.on_pointer_down(&PointerEvent::at(5.0, 5.0).on_shape("g"));
    canvas.on_pointer_move(&PointerEvent::at(55.0, 5.0));
    let Some(CanvasEvent::ShapesMoved { moves }) =
        canvas.on_pointer_up(&PointerEvent::at(55.0, 5.0)).await.unwrap()
    else {
        panic!("expected a move");
    };
    assert_eq!(moves.len(), 2);
    let diagram = store.diagram("grouped").unwrap();
    assert_eq!(diagram.shape("g1").unwrap().position(), Point::new(70.0, 20.0));
    assert_eq!(diagram.shape("x").unwrap().position(), Point::new(500.0, 0.0));
}

#[tokio::test]
async fn test_resize_handle_commits_bounds() {
    let (_api, store) = open_store(vec![flowchart()]).await;
    let (mut canvas, _) = controller(&store, "d1");

    let down = PointerEvent::at(100.0, 50.0).with_target(HitTarget::ResizeHandle {
        shape_id: "s1".into(),
        handle: ResizeHandle::BottomRight,
    });
    assert!(canvas.on_pointer_down(&down));
    canvas.on_pointer_move(&PointerEvent::at(150.0, 70.0));
    let event = canvas.on_pointer_up(&PointerEvent::at(150.0, 70.0)).await.unwrap();
    assert!(matches!(event, Some(CanvasEvent::ShapesResized { .. })));

    let s1 = store.diagram("d1").unwrap().shape("s1").cloned().unwrap();
    assert_eq!((s1.width, s1.height), (150.0, 70.0));
    assert!(canvas.selection().contains_shape("s1"));
}

#[tokio::test]
async fn test_space_drag_pans() {
    let (_api, store) = open_store(vec![flowchart()]).await;
    let (mut canvas, _) = controller(&store, "d1");

    canvas.on_key_down(&KeyEvent::new(Key::Space)).await.unwrap();
    assert!(canvas.on_pointer_down(&PointerEvent::at(10.0, 10.0).on_shape("s1")));
    assert_eq!(canvas.mode(), InteractionMode::Panning);
    canvas.on_pointer_move(&PointerEvent::at(40.0, 30.0));
    canvas.on_pointer_up(&PointerEvent::at(40.0, 30.0)).await.unwrap();
    canvas.on_key_up(&KeyEvent::new(Key::Space));

    assert_eq!(canvas.viewport().screen_to_canvas(Point::new(30.0, 20.0)), Point::new(0.0, 0.0));
    assert!(!canvas.is_space_held());
    assert_eq!(store.diagram("d1").unwrap(), flowchart());
}

#[tokio::test]
async fn test_middle_button_pans_and_second_press_is_ignored() {
    let (_api, store) = open_store(vec![flowchart()]).await;
    let (mut canvas, _) = controller(&store, "d1");

    let middle = PointerEvent::at(0.0, 0.0).with_button(MouseButton::Middle);
    assert!(canvas.on_pointer_down(&middle));
    assert!(!canvas.on_pointer_down(&PointerEvent::at(5.0, 5.0)));
    assert_eq!(canvas.mode(), InteractionMode::Panning);
}

#[tokio::test]
async fn test_teardown_drops_pending_frame() {
    let (api, store) = open_store(vec![flowchart()]).await;
    let (mut canvas, scheduler) = controller(&store, "d1");
    api.reset_calls();

    canvas.on_pointer_down(&PointerEvent::at(10.0, 10.0).on_shape("s1"));
    canvas.on_pointer_move(&PointerEvent::at(90.0, 90.0));
    assert!(scheduler.is_pending());

    canvas.teardown();
    assert!(!scheduler.is_pending());
    assert!(canvas.machine().is_idle());
    assert_eq!(canvas.on_animation_frame(), 0);
    assert_eq!(api.write_calls(), 0);
    assert_in_sync(&store, "d1");
}

#[tokio::test]
async fn test_zero_travel_drag_keeps_mirror_and_aggregate_equal() {
    let mut diagram = flowchart();
    diagram.shapes[0].x = 3.0;
    diagram.shapes[0].y = 3.0;
    let (_api, store) = open_store(vec![diagram]).await;
    let (mut canvas, _) = controller(&store, "d1");

    canvas.on_pointer_down(&PointerEvent::at(10.0, 10.0).on_shape("s1"));
    canvas.on_pointer_move(&PointerEvent::at(10.0, 10.0));
    let event = canvas.on_pointer_up(&PointerEvent::at(10.0, 10.0)).await.unwrap();

    assert!(matches!(event, Some(CanvasEvent::ShapesMoved { .. })));
    assert_in_sync(&store, "d1");
    assert_eq!(store.diagram("d1").unwrap().shape("s1").unwrap().position(), Point::new(0.0, 0.0));

    store.undo("d1").await.unwrap();
    assert_in_sync(&store, "d1");
    assert_eq!(store.diagram("d1").unwrap().shape("s1").unwrap().position(), Point::new(3.0, 3.0));
}

#[tokio::test]
async fn test_drawn_messages_land_on_pointer_rows() {
    let (_api, store) = open_store(vec![sequence()]).await;
    let (mut canvas, _) = controller(&store, "seq");

    for y in [50.0, 350.0] {
        canvas.on_pointer_down(&PointerEvent::at(100.0, 200.0).with_target(HitTarget::ConnectionPoint {
            shape_id: "a".into(),
            side: ConnectionSide::Right,
        }));
        let up = PointerEvent::at(210.0, y).on_shape("b");
        let event = canvas.on_pointer_up(&up).await.unwrap();
        assert!(matches!(event, Some(CanvasEvent::ConnectorCreated { .. })));
    }

    let rows: Vec<f64> = store
        .diagram("seq")
        .unwrap()
        .connectors
        .iter()
        .filter_map(|c| c.data["y"].as_f64())
        .collect();
    assert_eq!(rows, vec![50.0, 350.0]);
}
