use std::collections::HashMap;
use std::time::Instant;

use diagramkit_core::{ConnectionSide, Point};
use diagramkit_editor::interaction::{
    Axis, DragData, DrawingConnector, InteractionMode, InteractionStateMachine, ResizeData,
    ResizeHandle, SelectionBox,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    StartPan,
    StartDrag,
    StartSelect,
    StartConnector,
    StartResize,
    UpdatePan,
    UpdateDrag,
    UpdateSelect,
    UpdateConnector,
    UpdateResize,
    Reset,
    End,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::StartPan),
        Just(Op::StartDrag),
        Just(Op::StartSelect),
        Just(Op::StartConnector),
        Just(Op::StartResize),
        Just(Op::UpdatePan),
        Just(Op::UpdateDrag),
        Just(Op::UpdateSelect),
        Just(Op::UpdateConnector),
        Just(Op::UpdateResize),
        Just(Op::Reset),
        Just(Op::End),
    ]
}

fn drag() -> DragData {
    DragData {
        start_canvas_pos: Point::default(),
        shapes_start_positions: HashMap::from([("s1".to_string(), Point::default())]),
        delta: Point::default(),
    }
}

fn resize() -> ResizeData {
    ResizeData {
        handle: ResizeHandle::BottomRight,
        start_canvas_pos: Point::default(),
        primary_shape_id: "s1".into(),
        shapes_original_bounds: HashMap::new(),
        aspect_ratios: HashMap::new(),
        children_bounds: HashMap::new(),
        delta: Point::default(),
        dominant_axis: Axis::Horizontal,
        keep_aspect_ratio: false,
    }
}

fn apply(sm: &mut InteractionStateMachine, op: &Op) -> (bool, Option<InteractionMode>) {
    let p = Point::new(7.0, 9.0);
    match op {
        Op::StartPan => (sm.start_panning(p), Some(InteractionMode::Panning)),
        Op::StartDrag => (sm.start_dragging(drag()), Some(InteractionMode::DraggingShapes)),
        Op::StartSelect => (
            sm.start_selecting(SelectionBox {
                start_screen: p,
                current_screen: p,
                started_at: Instant::now(),
                additive: false,
            }),
            Some(InteractionMode::Selecting),
        ),
        Op::StartConnector => (
            sm.start_drawing_connector(DrawingConnector {
                source_shape_id: "s1".into(),
                source_side: ConnectionSide::Right,
                start_point: p,
                current_point: p,
            }),
            Some(InteractionMode::DrawingConnector),
        ),
        Op::StartResize => (sm.start_resizing(resize()), Some(InteractionMode::ResizingShapes)),
        Op::UpdatePan => (sm.update_panning(p), Some(InteractionMode::Panning)),
        Op::UpdateDrag => (sm.update_dragging(p), Some(InteractionMode::DraggingShapes)),
        Op::UpdateSelect => (sm.update_selecting(p), Some(InteractionMode::Selecting)),
        Op::UpdateConnector => (sm.update_drawing_connector(p), Some(InteractionMode::DrawingConnector)),
        Op::UpdateResize => (sm.update_resizing(p, true), Some(InteractionMode::ResizingShapes)),
        Op::Reset => {
            sm.reset();
            (true, None)
        }
        Op::End => {
            sm.end();
            (true, None)
        }
    }
}

fn is_start(op: &Op) -> bool {
    matches!(
        op,
        Op::StartPan | Op::StartDrag | Op::StartSelect | Op::StartConnector | Op::StartResize
    )
}

proptest! {
    #[test]
    fn test_modes_are_mutually_exclusive(ops in prop::collection::vec(op(), 0..64)) {
        let mut sm = InteractionStateMachine::new();
        for op in &ops {
            let before = sm.state().clone();
            let (accepted, target) = apply(&mut sm, op);

            match target {
                None => prop_assert!(sm.is_idle()),
                Some(mode) if is_start(op) => {
                    // Starts only succeed from idle.
                    prop_assert_eq!(accepted, before.mode() == InteractionMode::Idle);
                    if accepted {
                        prop_assert_eq!(sm.mode(), mode);
                    } else {
                        prop_assert_eq!(sm.state(), &before);
                    }
                }
                Some(mode) => {
                    prop_assert_eq!(accepted, before.mode() == mode);
                    if !accepted {
                        prop_assert_eq!(sm.state(), &before);
                    }
                    prop_assert_eq!(sm.mode(), before.mode());
                }
            }
        }
    }
}

#[test]
fn test_update_selecting_tracks_pointer() {
    let mut sm = InteractionStateMachine::new();
    sm.start_selecting(SelectionBox {
        start_screen: Point::new(1.0, 1.0),
        current_screen: Point::new(1.0, 1.0),
        started_at: Instant::now(),
        additive: true,
    });
    assert!(sm.update_selecting(Point::new(50.0, 60.0)));
    let data = sm.selection_box().unwrap();
    assert_eq!(data.current_screen, Point::new(50.0, 60.0));
    assert!(data.additive);
}

#[test]
fn test_resize_update_records_aspect_flag() {
    let mut sm = InteractionStateMachine::new();
    sm.start_resizing(resize());
    sm.update_resizing(Point::new(3.0, 4.0), true);
    let data = sm.resize_data().unwrap();
    assert_eq!(data.delta, Point::new(3.0, 4.0));
    assert!(data.keep_aspect_ratio);
    assert_eq!(data.dominant_axis, Axis::Horizontal);
}
