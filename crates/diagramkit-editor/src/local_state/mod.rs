//! Canvas local state
//!
//! One ephemeral mirror of shapes and connectors per open diagram. Gestures
//! write here at frame rate; commands write here after every persisted call,
//! using the values of the returned aggregate.

use std::collections::HashMap;

use diagramkit_core::{
    descendants, Connector, ConnectorUpdate, Diagram, DiagramId, Shape, ShapePatch, ShapeUpdate,
};
use parking_lot::RwLock;
use tracing::debug;

/// The mirror for one diagram.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalCanvasState {
    pub shapes: Vec<Shape>,
    pub connectors: Vec<Connector>,
}

impl LocalCanvasState {
    pub fn from_diagram(diagram: &Diagram) -> Self {
        Self {
            shapes: diagram.shapes.clone(),
            connectors: diagram.connectors.clone(),
        }
    }

    pub fn shape(&self, id: &str) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    pub fn connector(&self, id: &str) -> Option<&Connector> {
        self.connectors.iter().find(|c| c.id == id)
    }

    /// Ids of every shape nested under `shape_id`.
    pub fn descendant_ids(&self, shape_id: &str) -> Vec<String> {
        descendants(&self.shapes, shape_id)
            .into_iter()
            .map(|s| s.id.clone())
            .collect()
    }

    fn upsert_shape(&mut self, shape: Shape, order: &HashMap<&str, usize>) {
        if let Some(existing) = self.shapes.iter_mut().find(|s| s.id == shape.id) {
            *existing = shape;
            return;
        }
        let at = insertion_index(&self.shapes, &shape.id, order, |s| s.id.as_str());
        self.shapes.insert(at, shape);
    }

    fn upsert_connector(&mut self, connector: Connector, order: &HashMap<&str, usize>) {
        if let Some(existing) = self.connectors.iter_mut().find(|c| c.id == connector.id) {
            *existing = connector;
            return;
        }
        let at = insertion_index(&self.connectors, &connector.id, order, |c| c.id.as_str());
        self.connectors.insert(at, connector);
    }
}

/// Position that keeps `items` in the aggregate's order. Entities unknown to
/// the aggregate sort last.
fn insertion_index<T>(items: &[T], id: &str, order: &HashMap<&str, usize>, id_of: impl Fn(&T) -> &str) -> usize {
    let Some(rank) = order.get(id) else {
        return items.len();
    };
    items
        .iter()
        .position(|item| order.get(id_of(item)).map_or(true, |r| r > rank))
        .unwrap_or(items.len())
}

/// Mirrors of every open diagram.
#[derive(Debug, Default)]
pub struct LocalStateRegistry {
    states: RwLock<HashMap<DiagramId, LocalCanvasState>>,
}

impl LocalStateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or replaces) the mirror of a freshly loaded diagram.
    pub fn open(&self, diagram: &Diagram) {
        debug!("Opening local state for diagram {}", diagram.id);
        self.states
            .write()
            .insert(diagram.id.clone(), LocalCanvasState::from_diagram(diagram));
    }

    pub fn close(&self, diagram_id: &str) -> bool {
        self.states.write().remove(diagram_id).is_some()
    }

    pub fn is_open(&self, diagram_id: &str) -> bool {
        self.states.read().contains_key(diagram_id)
    }

    pub fn snapshot(&self, diagram_id: &str) -> Option<LocalCanvasState> {
        self.states.read().get(diagram_id).cloned()
    }

    pub fn shape(&self, diagram_id: &str, shape_id: &str) -> Option<Shape> {
        self.states.read().get(diagram_id)?.shape(shape_id).cloned()
    }

    pub fn connector(&self, diagram_id: &str, connector_id: &str) -> Option<Connector> {
        self.states.read().get(diagram_id)?.connector(connector_id).cloned()
    }

    fn with_state<R>(&self, diagram_id: &str, f: impl FnOnce(&mut LocalCanvasState) -> R) -> Option<R> {
        let mut states = self.states.write();
        let state = states.get_mut(diagram_id)?;
        Some(f(state))
    }

    /// Replaces the mirror wholesale with the aggregate's content.
    pub fn sync_from_diagram(&self, diagram: &Diagram) -> bool {
        self.with_state(&diagram.id, |state| {
            *state = LocalCanvasState::from_diagram(diagram);
        })
        .is_some()
    }

    pub fn add_local_shape(&self, diagram_id: &str, shape: Shape) -> bool {
        self.with_state(diagram_id, |state| {
            let order = HashMap::new();
            state.upsert_shape(shape, &order);
        })
        .is_some()
    }

    pub fn remove_local_shape(&self, diagram_id: &str, shape_id: &str) -> bool {
        self.remove_local_shapes(diagram_id, &[shape_id.to_string()]) > 0
    }

    /// Returns the number of shapes removed.
    pub fn remove_local_shapes(&self, diagram_id: &str, shape_ids: &[String]) -> usize {
        self.with_state(diagram_id, |state| {
            let before = state.shapes.len();
            state.shapes.retain(|s| !shape_ids.contains(&s.id));
            before - state.shapes.len()
        })
        .unwrap_or(0)
    }

    pub fn update_local_shape(&self, diagram_id: &str, shape_id: &str, update: &ShapeUpdate) -> bool {
        self.with_state(diagram_id, |state| {
            match state.shapes.iter_mut().find(|s| s.id == shape_id) {
                Some(shape) => {
                    update.apply_to(shape);
                    true
                }
                None => false,
            }
        })
        .unwrap_or(false)
    }

    /// Applies every patch whose shape is mirrored; returns how many applied.
    pub fn update_local_shapes(&self, diagram_id: &str, patches: &[ShapePatch]) -> usize {
        self.with_state(diagram_id, |state| {
            let mut applied = 0;
            for patch in patches {
                if let Some(shape) = state.shapes.iter_mut().find(|s| s.id == patch.id) {
                    patch.update.apply_to(shape);
                    applied += 1;
                }
            }
            applied
        })
        .unwrap_or(0)
    }

    pub fn add_local_connector(&self, diagram_id: &str, connector: Connector) -> bool {
        self.with_state(diagram_id, |state| {
            let order = HashMap::new();
            state.upsert_connector(connector, &order);
        })
        .is_some()
    }

    pub fn remove_local_connector(&self, diagram_id: &str, connector_id: &str) -> bool {
        self.remove_local_connectors(diagram_id, &[connector_id.to_string()]) > 0
    }

    pub fn remove_local_connectors(&self, diagram_id: &str, connector_ids: &[String]) -> usize {
        self.with_state(diagram_id, |state| {
            let before = state.connectors.len();
            state.connectors.retain(|c| !connector_ids.contains(&c.id));
            before - state.connectors.len()
        })
        .unwrap_or(0)
    }

    pub fn update_local_connector(&self, diagram_id: &str, connector_id: &str, update: &ConnectorUpdate) -> bool {
        self.with_state(diagram_id, |state| {
            match state.connectors.iter_mut().find(|c| c.id == connector_id) {
                Some(connector) => {
                    update.apply_to(connector);
                    true
                }
                None => false,
            }
        })
        .unwrap_or(false)
    }

    /// Copies the listed entities from a persisted aggregate into the mirror.
    ///
    /// Ids present in the aggregate are upserted at the aggregate's position,
    /// ids absent from it are removed from the mirror.
    pub fn sync_entities(&self, diagram: &Diagram, shape_ids: &[String], connector_ids: &[String]) {
        let shape_order: HashMap<&str, usize> = diagram
            .shapes
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.as_str(), i))
            .collect();
        let connector_order: HashMap<&str, usize> = diagram
            .connectors
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.as_str(), i))
            .collect();

        self.with_state(&diagram.id, |state| {
            for id in shape_ids {
                match diagram.shape(id) {
                    Some(shape) => state.upsert_shape(shape.clone(), &shape_order),
                    None => state.shapes.retain(|s| &s.id != id),
                }
            }
            for id in connector_ids {
                match diagram.connector(id) {
                    Some(connector) => state.upsert_connector(connector.clone(), &connector_order),
                    None => state.connectors.retain(|c| &c.id != id),
                }
            }
        });
    }

    pub fn sync_shapes(&self, diagram: &Diagram, shape_ids: &[String]) {
        self.sync_entities(diagram, shape_ids, &[]);
    }

    pub fn sync_connectors(&self, diagram: &Diagram, connector_ids: &[String]) {
        self.sync_entities(diagram, &[], connector_ids);
    }
}
