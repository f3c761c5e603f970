//! Interaction state machine
//!
//! Single source of truth for what the pointer is doing. The modes are
//! mutually exclusive: a gesture can only start from [`InteractionState::Idle`]
//! and every gesture ends back in it.

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use diagramkit_core::{Bounds, ConnectionSide, Point, ShapeId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// The eight resize handles around a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeHandle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::TopLeft,
        ResizeHandle::Top,
        ResizeHandle::TopRight,
        ResizeHandle::Right,
        ResizeHandle::BottomRight,
        ResizeHandle::Bottom,
        ResizeHandle::BottomLeft,
        ResizeHandle::Left,
    ];

    pub fn is_corner(&self) -> bool {
        matches!(
            self,
            ResizeHandle::TopLeft | ResizeHandle::TopRight | ResizeHandle::BottomRight | ResizeHandle::BottomLeft
        )
    }

    pub fn moves_left(&self) -> bool {
        matches!(self, ResizeHandle::TopLeft | ResizeHandle::Left | ResizeHandle::BottomLeft)
    }

    pub fn moves_right(&self) -> bool {
        matches!(self, ResizeHandle::TopRight | ResizeHandle::Right | ResizeHandle::BottomRight)
    }

    pub fn moves_top(&self) -> bool {
        matches!(self, ResizeHandle::TopLeft | ResizeHandle::Top | ResizeHandle::TopRight)
    }

    pub fn moves_bottom(&self) -> bool {
        matches!(self, ResizeHandle::BottomLeft | ResizeHandle::Bottom | ResizeHandle::BottomRight)
    }
}

/// Axis that drives an aspect-locked corner resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanData {
    pub start_screen: Point,
    pub last_screen: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragData {
    pub start_canvas_pos: Point,
    pub shapes_start_positions: HashMap<ShapeId, Point>,
    pub delta: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionBox {
    pub start_screen: Point,
    pub current_screen: Point,
    pub started_at: Instant,
    /// Add to the existing selection instead of replacing it.
    pub additive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawingConnector {
    pub source_shape_id: ShapeId,
    pub source_side: ConnectionSide,
    pub start_point: Point,
    pub current_point: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResizeData {
    pub handle: ResizeHandle,
    pub start_canvas_pos: Point,
    pub primary_shape_id: ShapeId,
    pub shapes_original_bounds: HashMap<ShapeId, Bounds>,
    /// width / height at gesture start
    pub aspect_ratios: HashMap<ShapeId, f64>,
    /// Union of each container's descendants at gesture start
    pub children_bounds: HashMap<ShapeId, Bounds>,
    pub delta: Point,
    pub dominant_axis: Axis,
    pub keep_aspect_ratio: bool,
}

/// Discriminant of [`InteractionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionMode {
    Idle,
    Panning,
    DraggingShapes,
    Selecting,
    DrawingConnector,
    ResizingShapes,
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Panning => write!(f, "panning"),
            Self::DraggingShapes => write!(f, "dragging-shapes"),
            Self::Selecting => write!(f, "selecting"),
            Self::DrawingConnector => write!(f, "drawing-connector"),
            Self::ResizingShapes => write!(f, "resizing-shapes"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Panning(PanData),
    DraggingShapes(DragData),
    Selecting(SelectionBox),
    DrawingConnector(DrawingConnector),
    ResizingShapes(ResizeData),
}

impl InteractionState {
    pub fn mode(&self) -> InteractionMode {
        match self {
            Self::Idle => InteractionMode::Idle,
            Self::Panning(_) => InteractionMode::Panning,
            Self::DraggingShapes(_) => InteractionMode::DraggingShapes,
            Self::Selecting(_) => InteractionMode::Selecting,
            Self::DrawingConnector(_) => InteractionMode::DrawingConnector,
            Self::ResizingShapes(_) => InteractionMode::ResizingShapes,
        }
    }
}

#[derive(Debug, Default)]
pub struct InteractionStateMachine {
    state: InteractionState,
}

impl InteractionStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn mode(&self) -> InteractionMode {
        self.state.mode()
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, InteractionState::Idle)
    }

    pub fn is(&self, mode: InteractionMode) -> bool {
        self.mode() == mode
    }

    /// Back to idle, dropping any gesture data.
    pub fn reset(&mut self) {
        if !self.is_idle() {
            debug!("Interaction {} -> idle", self.mode());
        }
        self.state = InteractionState::Idle;
    }

    /// Ends the current gesture and hands back its data.
    pub fn end(&mut self) -> InteractionState {
        let previous = std::mem::take(&mut self.state);
        if previous.mode() != InteractionMode::Idle {
            debug!("Interaction {} -> idle", previous.mode());
        }
        previous
    }

    fn start(&mut self, next: InteractionState) -> bool {
        if !self.is_idle() {
            warn!(
                "Ignoring {} start while {} is in progress",
                next.mode(),
                self.mode()
            );
            return false;
        }
        debug!("Interaction idle -> {}", next.mode());
        self.state = next;
        true
    }

    pub fn start_panning(&mut self, screen: Point) -> bool {
        self.start(InteractionState::Panning(PanData {
            start_screen: screen,
            last_screen: screen,
        }))
    }

    pub fn update_panning(&mut self, screen: Point) -> bool {
        match &mut self.state {
            InteractionState::Panning(data) => {
                data.last_screen = screen;
                true
            }
            _ => false,
        }
    }

    pub fn start_dragging(&mut self, data: DragData) -> bool {
        self.start(InteractionState::DraggingShapes(data))
    }

    pub fn update_dragging(&mut self, delta: Point) -> bool {
        match &mut self.state {
            InteractionState::DraggingShapes(data) => {
                data.delta = delta;
                true
            }
            _ => false,
        }
    }

    pub fn start_selecting(&mut self, selection: SelectionBox) -> bool {
        self.start(InteractionState::Selecting(selection))
    }

    pub fn update_selecting(&mut self, screen: Point) -> bool {
        match &mut self.state {
            InteractionState::Selecting(data) => {
                data.current_screen = screen;
                true
            }
            _ => false,
        }
    }

    pub fn start_drawing_connector(&mut self, data: DrawingConnector) -> bool {
        self.start(InteractionState::DrawingConnector(data))
    }

    pub fn update_drawing_connector(&mut self, point: Point) -> bool {
        match &mut self.state {
            InteractionState::DrawingConnector(data) => {
                data.current_point = point;
                true
            }
            _ => false,
        }
    }

    pub fn start_resizing(&mut self, data: ResizeData) -> bool {
        self.start(InteractionState::ResizingShapes(data))
    }

    pub fn update_resizing(&mut self, delta: Point, keep_aspect_ratio: bool) -> bool {
        match &mut self.state {
            InteractionState::ResizingShapes(data) => {
                data.delta = delta;
                data.keep_aspect_ratio = keep_aspect_ratio;
                true
            }
            _ => false,
        }
    }

    pub fn pan_data(&self) -> Option<&PanData> {
        match &self.state {
            InteractionState::Panning(data) => Some(data),
            _ => None,
        }
    }

    pub fn drag_data(&self) -> Option<&DragData> {
        match &self.state {
            InteractionState::DraggingShapes(data) => Some(data),
            _ => None,
        }
    }

    pub fn selection_box(&self) -> Option<&SelectionBox> {
        match &self.state {
            InteractionState::Selecting(data) => Some(data),
            _ => None,
        }
    }

    pub fn drawing_connector(&self) -> Option<&DrawingConnector> {
        match &self.state {
            InteractionState::DrawingConnector(data) => Some(data),
            _ => None,
        }
    }

    pub fn resize_data(&self) -> Option<&ResizeData> {
        match &self.state {
            InteractionState::ResizingShapes(data) => Some(data),
            _ => None,
        }
    }
}
