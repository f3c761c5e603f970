use serde::{Deserialize, Serialize};

use super::{Bounds, ConnectorId, Point, ShapeId};

/// Side of a shape a connector attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionSide {
    Top,
    Right,
    Bottom,
    Left,
}

impl ConnectionSide {
    pub const ALL: [ConnectionSide; 4] = [
        ConnectionSide::Top,
        ConnectionSide::Right,
        ConnectionSide::Bottom,
        ConnectionSide::Left,
    ];

    /// Canvas position of this side's connection point on `bounds`.
    pub fn anchor(&self, bounds: &Bounds) -> Point {
        let c = bounds.center();
        match self {
            ConnectionSide::Top => Point::new(c.x, bounds.min_y()),
            ConnectionSide::Right => Point::new(bounds.max_x(), c.y),
            ConnectionSide::Bottom => Point::new(c.x, bounds.max_y()),
            ConnectionSide::Left => Point::new(bounds.min_x(), c.y),
        }
    }

    /// Outward unit direction of the side.
    pub fn direction(&self) -> Point {
        match self {
            ConnectionSide::Top => Point::new(0.0, -1.0),
            ConnectionSide::Right => Point::new(1.0, 0.0),
            ConnectionSide::Bottom => Point::new(0.0, 1.0),
            ConnectionSide::Left => Point::new(-1.0, 0.0),
        }
    }
}

/// A persisted connector between two shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub id: ConnectorId,
    #[serde(rename = "type")]
    pub connector_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub source_shape_id: ShapeId,
    pub target_shape_id: ShapeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_side: Option<ConnectionSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_side: Option<ConnectionSide>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Connector {
    pub fn touches(&self, shape_id: &str) -> bool {
        self.source_shape_id == shape_id || self.target_shape_id == shape_id
    }

    pub fn from_new(id: impl Into<ConnectorId>, new: NewConnector) -> Self {
        Self {
            id: id.into(),
            connector_type: new.connector_type,
            label: new.label,
            source_shape_id: new.source_shape_id,
            target_shape_id: new.target_shape_id,
            source_side: new.source_side,
            target_side: new.target_side,
            data: new.data,
        }
    }
}

/// Creation request for a connector; the backend assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConnector {
    #[serde(rename = "type")]
    pub connector_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub source_shape_id: ShapeId,
    pub target_shape_id: ShapeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_side: Option<ConnectionSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_side: Option<ConnectionSide>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl NewConnector {
    pub fn new(
        connector_type: impl Into<String>,
        source_shape_id: impl Into<ShapeId>,
        target_shape_id: impl Into<ShapeId>,
    ) -> Self {
        Self {
            connector_type: connector_type.into(),
            label: None,
            source_shape_id: source_shape_id.into(),
            target_shape_id: target_shape_id.into(),
            source_side: None,
            target_side: None,
            data: serde_json::Value::Null,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_sides(mut self, source: ConnectionSide, target: ConnectionSide) -> Self {
        self.source_side = Some(source);
        self.target_side = Some(target);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// Partial update of a connector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectorUpdate {
    /// `Some(None)` clears the label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ConnectorUpdate {
    pub fn label(label: Option<String>) -> Self {
        Self {
            label: Some(label),
            data: None,
        }
    }

    pub fn apply_to(&self, connector: &mut Connector) {
        if let Some(label) = &self.label {
            connector.label = label.clone();
        }
        if let Some(data) = &self.data {
            connector.data = data.clone();
        }
    }
}
