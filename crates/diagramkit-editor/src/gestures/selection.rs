use std::collections::BTreeSet;
use std::time::Instant;

use diagramkit_core::{Bounds, Connector, ConnectorId, InteractionConfig, Point, ShapeId, ViewportTransform};
use serde::Serialize;

use crate::interaction::{InteractionStateMachine, SelectionBox};
use crate::local_state::LocalCanvasState;

/// Selected shapes and connectors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    shapes: BTreeSet<ShapeId>,
    connectors: BTreeSet<ConnectorId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty() && self.connectors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shapes.len() + self.connectors.len()
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
        self.connectors.clear();
    }

    pub fn insert_shape(&mut self, id: impl Into<ShapeId>) -> bool {
        self.shapes.insert(id.into())
    }

    pub fn insert_connector(&mut self, id: impl Into<ConnectorId>) -> bool {
        self.connectors.insert(id.into())
    }

    /// Adds the shape if absent, removes it otherwise.
    pub fn toggle_shape(&mut self, id: &str) {
        if !self.shapes.remove(id) {
            self.shapes.insert(id.to_string());
        }
    }

    pub fn contains_shape(&self, id: &str) -> bool {
        self.shapes.contains(id)
    }

    pub fn contains_connector(&self, id: &str) -> bool {
        self.connectors.contains(id)
    }

    pub fn shape_ids(&self) -> Vec<ShapeId> {
        self.shapes.iter().cloned().collect()
    }

    pub fn connector_ids(&self) -> Vec<ConnectorId> {
        self.connectors.iter().cloned().collect()
    }

    pub fn extend(&mut self, other: Selection) {
        self.shapes.extend(other.shapes);
        self.connectors.extend(other.connectors);
    }

    /// Drops ids that no longer exist in `state`.
    pub fn retain_existing(&mut self, state: &LocalCanvasState) {
        self.shapes.retain(|id| state.shape(id).is_some());
        self.connectors.retain(|id| state.connector(id).is_some());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Pointer barely moved: treat as a deselect click.
    Cleared,
    Selected { selection: Selection, additive: bool },
}

/// Rubber-band selection.
#[derive(Debug, Clone)]
pub struct SelectionGesture {
    click_threshold_px: f64,
}

impl SelectionGesture {
    pub fn new(config: &InteractionConfig) -> Self {
        Self {
            click_threshold_px: config.click_threshold_px,
        }
    }

    pub fn start(&self, machine: &mut InteractionStateMachine, screen: Point, additive: bool) -> bool {
        machine.start_selecting(SelectionBox {
            start_screen: screen,
            current_screen: screen,
            started_at: Instant::now(),
            additive,
        })
    }

    pub fn update(&self, machine: &mut InteractionStateMachine, screen: Point) -> bool {
        machine.update_selecting(screen)
    }

    /// Ends the gesture. `None` if no selection was in progress.
    pub fn finish(
        &self,
        machine: &mut InteractionStateMachine,
        screen: Point,
        state: &LocalCanvasState,
        viewport: &dyn ViewportTransform,
    ) -> Option<SelectionOutcome> {
        let data = machine.selection_box()?.clone();
        machine.end();

        if data.start_screen.distance_to(&screen) < self.click_threshold_px {
            return Some(SelectionOutcome::Cleared);
        }

        let rect = Bounds::from_corners(
            viewport.screen_to_canvas(data.start_screen),
            viewport.screen_to_canvas(screen),
        );
        Some(SelectionOutcome::Selected {
            selection: hit_test(state, &rect),
            additive: data.additive,
        })
    }

    pub fn cancel(&self, machine: &mut InteractionStateMachine) -> bool {
        if machine.selection_box().is_none() {
            return false;
        }
        machine.reset();
        true
    }
}

/// Box spanning the centres of a connector's two endpoint shapes.
pub fn connector_bounds(state: &LocalCanvasState, connector: &Connector) -> Option<Bounds> {
    let source = state.shape(&connector.source_shape_id)?.bounds().center();
    let target = state.shape(&connector.target_shape_id)?.bounds().center();
    Some(Bounds::from_corners(source, target))
}

/// Every shape and connector whose bounds intersect `rect`.
pub fn hit_test(state: &LocalCanvasState, rect: &Bounds) -> Selection {
    let mut selection = Selection::new();
    for shape in &state.shapes {
        if shape.bounds().intersects(rect) {
            selection.insert_shape(shape.id.clone());
        }
    }
    for connector in &state.connectors {
        if connector_bounds(state, connector).is_some_and(|b| b.intersects(rect)) {
            selection.insert_connector(connector.id.clone());
        }
    }
    selection
}
