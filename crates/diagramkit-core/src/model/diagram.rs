use serde::{Deserialize, Serialize};

use super::{descendants, Connector, DiagramId, Shape};

/// Diagram notation. Unknown notations deserialize as [`DiagramType::Generic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramType {
    Flowchart,
    Sequence,
    Architecture,
    Bpmn,
    #[default]
    #[serde(other)]
    Generic,
}

/// The persisted aggregate for one diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    pub id: DiagramId,
    #[serde(rename = "type", default)]
    pub diagram_type: DiagramType,
    #[serde(default)]
    pub shapes: Vec<Shape>,
    #[serde(default)]
    pub connectors: Vec<Connector>,
}

impl Diagram {
    pub fn new(id: impl Into<DiagramId>, diagram_type: DiagramType) -> Self {
        Self {
            id: id.into(),
            diagram_type,
            shapes: Vec::new(),
            connectors: Vec::new(),
        }
    }

    pub fn shape(&self, id: &str) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    pub fn shape_mut(&mut self, id: &str) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id == id)
    }

    pub fn connector(&self, id: &str) -> Option<&Connector> {
        self.connectors.iter().find(|c| c.id == id)
    }

    pub fn connector_mut(&mut self, id: &str) -> Option<&mut Connector> {
        self.connectors.iter_mut().find(|c| c.id == id)
    }

    pub fn is_sequence(&self) -> bool {
        self.diagram_type == DiagramType::Sequence
    }

    /// Connectors attached to any of the given shapes, in aggregate order.
    pub fn connectors_touching<'a>(&'a self, shape_ids: &[String]) -> Vec<&'a Connector> {
        self.connectors
            .iter()
            .filter(|c| shape_ids.iter().any(|id| c.touches(id)))
            .collect()
    }

    /// All shapes transitively contained in `shape_id` through `parent_id`.
    pub fn descendants_of(&self, shape_id: &str) -> Vec<&Shape> {
        descendants(&self.shapes, shape_id)
    }

    pub fn lifelines(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter().filter(|s| s.is_lifeline())
    }
}
