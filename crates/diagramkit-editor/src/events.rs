//! Input events delivered by the host UI.
//!
//! Hit testing against rendered geometry is the host's job; events arrive
//! already tagged with what the pointer is over.

use diagramkit_core::{ConnectionSide, Point, ShapeId};
use serde::{Deserialize, Serialize};

use crate::interaction::ResizeHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    /// Cmd on macOS
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl, or Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum HitTarget {
    #[default]
    Background,
    Shape {
        shape_id: ShapeId,
    },
    Connector {
        connector_id: String,
    },
    ResizeHandle {
        shape_id: ShapeId,
        handle: ResizeHandle,
    },
    ConnectionPoint {
        shape_id: ShapeId,
        side: ConnectionSide,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Screen position in pixels
    pub position: Point,
    #[serde(default)]
    pub button: MouseButton,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub target: HitTarget,
}

impl PointerEvent {
    pub fn new(position: Point) -> Self {
        Self {
            position,
            button: MouseButton::Left,
            modifiers: Modifiers::default(),
            target: HitTarget::Background,
        }
    }

    pub fn at(x: f64, y: f64) -> Self {
        Self::new(Point::new(x, y))
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_target(mut self, target: HitTarget) -> Self {
        self.target = target;
        self
    }

    pub fn on_shape(self, shape_id: impl Into<ShapeId>) -> Self {
        self.with_target(HitTarget::Shape {
            shape_id: shape_id.into(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    Escape,
    Delete,
    Backspace,
    Space,
    Z,
    Y,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}
