//! Pointer interaction state and frame batching.

mod frame;
mod state;

pub use frame::{FrameCoalescer, FrameScheduler, ManualFrameScheduler};
pub use state::{
    Axis, DragData, DrawingConnector, InteractionMode, InteractionState, InteractionStateMachine,
    PanData, ResizeData, ResizeHandle, SelectionBox,
};
