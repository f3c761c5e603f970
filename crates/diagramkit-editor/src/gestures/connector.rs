use diagramkit_core::{ConnectionSide, NewConnector, Point, ShapeId};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::interaction::{DrawingConnector, InteractionStateMachine};
use crate::local_state::LocalStateRegistry;

pub const ARROW_CONNECTOR_TYPE: &str = "arrow";
pub const MESSAGE_CONNECTOR_TYPE: &str = "message";

/// What the pointer was over when a connector drag was released.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ConnectorTarget {
    ConnectionPoint { shape_id: ShapeId, side: ConnectionSide },
    /// Shape body; the side nearest the pointer is used.
    Shape { shape_id: ShapeId },
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectorOutcome {
    Create(NewConnector),
    /// Released over empty canvas. The gesture stays active until cancelled.
    OpenCreationMenu {
        source_shape_id: ShapeId,
        source_side: ConnectionSide,
        at: Point,
    },
    Cancelled,
    Inactive,
}

#[derive(Debug, Default, Clone)]
pub struct ConnectorGesture;

impl ConnectorGesture {
    pub fn new() -> Self {
        Self
    }

    pub fn start(
        &self,
        machine: &mut InteractionStateMachine,
        local: &LocalStateRegistry,
        diagram_id: &str,
        shape_id: &str,
        side: ConnectionSide,
    ) -> bool {
        let Some(shape) = local.shape(diagram_id, shape_id) else {
            return false;
        };
        let start = side.anchor(&shape.bounds());
        machine.start_drawing_connector(DrawingConnector {
            source_shape_id: shape_id.to_string(),
            source_side: side,
            start_point: start,
            current_point: start,
        })
    }

    pub fn update(&self, machine: &mut InteractionStateMachine, canvas: Point) -> bool {
        machine.update_drawing_connector(canvas)
    }

    /// Resolves the release. Sequence messages sit on the row of the last
    /// pointer position.
    pub fn finish(
        &self,
        machine: &mut InteractionStateMachine,
        target: &ConnectorTarget,
        local: &LocalStateRegistry,
        diagram_id: &str,
        is_sequence: bool,
    ) -> ConnectorOutcome {
        let Some(drawing) = machine.drawing_connector().cloned() else {
            return ConnectorOutcome::Inactive;
        };

        let (target_id, target_side) = match target {
            ConnectorTarget::Empty => {
                return ConnectorOutcome::OpenCreationMenu {
                    source_shape_id: drawing.source_shape_id,
                    source_side: drawing.source_side,
                    at: drawing.current_point,
                };
            }
            ConnectorTarget::ConnectionPoint { shape_id, side } => (shape_id.clone(), *side),
            ConnectorTarget::Shape { shape_id } => {
                let Some(shape) = local.shape(diagram_id, shape_id) else {
                    machine.reset();
                    return ConnectorOutcome::Cancelled;
                };
                (shape_id.clone(), nearest_side(&shape.bounds(), drawing.current_point))
            }
        };

        machine.reset();
        if target_id == drawing.source_shape_id {
            return ConnectorOutcome::Cancelled;
        }

        let connector = if is_sequence {
            NewConnector::new(MESSAGE_CONNECTOR_TYPE, drawing.source_shape_id, target_id)
                .with_data(json!({ "y": drawing.current_point.y }))
        } else {
            NewConnector::new(ARROW_CONNECTOR_TYPE, drawing.source_shape_id, target_id)
        };
        ConnectorOutcome::Create(connector.with_sides(drawing.source_side, target_side))
    }

    pub fn cancel(&self, machine: &mut InteractionStateMachine) -> bool {
        if machine.drawing_connector().is_none() {
            return false;
        }
        machine.reset();
        true
    }
}

fn nearest_side(bounds: &diagramkit_core::Bounds, point: Point) -> ConnectionSide {
    ConnectionSide::ALL
        .into_iter()
        .min_by(|a, b| {
            let da = a.anchor(bounds).distance_to(&point);
            let db = b.anchor(bounds).distance_to(&point);
            da.total_cmp(&db)
        })
        .unwrap_or(ConnectionSide::Left)
}
