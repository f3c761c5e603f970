//! Gesture hooks
//!
//! One implementation per gesture. Each is a `start`/`update`/`finish` set
//! driven by the [`InteractionStateMachine`](crate::interaction::InteractionStateMachine):
//! calls made while the machine is in another mode change nothing.
//! Drag and resize write to the local mirror through a frame coalescer and
//! hand back the batched change to commit on release.

mod connector;
mod dragging;
mod panning;
mod resizing;
mod selection;

pub use connector::{
    ConnectorGesture, ConnectorOutcome, ConnectorTarget, ARROW_CONNECTOR_TYPE, MESSAGE_CONNECTOR_TYPE,
};
pub use dragging::{revert_moves, DragGesture};
pub use panning::PanGesture;
pub use resizing::{compute_bounds, revert_resizes, ResizeConstraints, ResizeGesture};
pub use selection::{connector_bounds, hit_test, Selection, SelectionGesture, SelectionOutcome};
