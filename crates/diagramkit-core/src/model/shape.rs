use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Bounds, Point, ShapeId};

/// Shape type used for sequence-diagram lifelines.
pub const LIFELINE_TYPE: &str = "lifeline";

/// A persisted shape on a diagram canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub id: ShapeId,
    #[serde(rename = "type")]
    pub shape_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default)]
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ShapeId>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Shape {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    pub fn set_position(&mut self, position: Point) {
        self.x = position.x;
        self.y = position.y;
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.x = bounds.x;
        self.y = bounds.y;
        self.width = bounds.width;
        self.height = bounds.height;
    }

    pub fn is_lifeline(&self) -> bool {
        self.shape_type == LIFELINE_TYPE
    }

    /// Materialises a persisted shape from a creation request.
    pub fn from_new(id: impl Into<ShapeId>, new: NewShape) -> Self {
        Self {
            id: id.into(),
            shape_type: new.shape_type,
            subtype: new.subtype,
            label: new.label,
            x: new.x,
            y: new.y,
            width: new.width,
            height: new.height,
            parent_id: new.parent_id,
            data: new.data,
        }
    }
}

/// Shapes transitively parented to `shape_id`, in discovery order.
/// Cycles in `parent_id` are tolerated.
pub fn descendants<'a>(shapes: &'a [Shape], shape_id: &str) -> Vec<&'a Shape> {
    let mut out = Vec::new();
    let mut frontier = vec![shape_id.to_string()];
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(shape_id.to_string());
    while let Some(parent) = frontier.pop() {
        for shape in shapes {
            if shape.parent_id.as_deref() == Some(parent.as_str()) && seen.insert(shape.id.clone()) {
                frontier.push(shape.id.clone());
                out.push(shape);
            }
        }
    }
    out
}

/// Creation request for a shape; the backend assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShape {
    #[serde(rename = "type")]
    pub shape_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default)]
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ShapeId>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl NewShape {
    pub fn new(shape_type: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            shape_type: shape_type.into(),
            subtype: None,
            label: String::new(),
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
            parent_id: None,
            data: serde_json::Value::Null,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<ShapeId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// Partial update of a shape. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ShapeUpdate {
    pub fn position(position: Point) -> Self {
        Self {
            x: Some(position.x),
            y: Some(position.y),
            ..Default::default()
        }
    }

    pub fn bounds(bounds: Bounds) -> Self {
        Self {
            x: Some(bounds.x),
            y: Some(bounds.y),
            width: Some(bounds.width),
            height: Some(bounds.height),
            ..Default::default()
        }
    }

    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
    }

    pub fn height(height: f64) -> Self {
        Self {
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn data(data: serde_json::Value) -> Self {
        Self {
            data: Some(data),
            ..Default::default()
        }
    }

    /// True when only `x`/`y` are set.
    pub fn is_position_only(&self) -> bool {
        self.label.is_none()
            && self.width.is_none()
            && self.height.is_none()
            && self.data.is_none()
            && (self.x.is_some() || self.y.is_some())
    }

    pub fn is_empty(&self) -> bool {
        *self == ShapeUpdate::default()
    }

    pub fn apply_to(&self, shape: &mut Shape) {
        if let Some(label) = &self.label {
            shape.label = label.clone();
        }
        if let Some(x) = self.x {
            shape.x = x;
        }
        if let Some(y) = self.y {
            shape.y = y;
        }
        if let Some(width) = self.width {
            shape.width = width;
        }
        if let Some(height) = self.height {
            shape.height = height;
        }
        if let Some(data) = &self.data {
            shape.data = data.clone();
        }
    }
}

/// A [`ShapeUpdate`] addressed to one shape, used by batch updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapePatch {
    pub id: ShapeId,
    pub update: ShapeUpdate,
}

impl ShapePatch {
    pub fn new(id: impl Into<ShapeId>, update: ShapeUpdate) -> Self {
        Self {
            id: id.into(),
            update,
        }
    }
}
