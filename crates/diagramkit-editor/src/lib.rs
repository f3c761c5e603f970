//! # diagramkit Editor
//!
//! Editing engine for diagramkit diagrams. Turns pointer and keyboard input
//! into undoable edits of a persisted diagram while keeping a local mirror
//! in step for rendering.
//!
//! ## Core Components
//!
//! - **Commands**: reversible edits, per-scope history and the command factory
//! - **Store**: loaded aggregates, public editing operations, last error per diagram
//! - **Local state**: per-diagram mirror written by gestures and commands
//! - **Interaction**: the gesture state machine and frame coalescing
//! - **Gestures**: selection, dragging, resizing, connector drawing, panning
//! - **Orchestrator**: routes host events to gestures and commits the result
//!
//! ## Architecture
//!
//! ```text
//! host events ─▶ CanvasController ─▶ gesture hook ─▶ local mirror (per frame)
//!                      │
//!                      └─ on release ─▶ DiagramStore ─▶ CommandFactory
//!                                             │
//!                                             └─▶ CommandManager[scope] ─▶ DiagramApi
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use diagramkit_core::{EditorConfig, InMemoryDiagramApi, Viewport};
//! use diagramkit_editor::{CanvasController, DiagramStore, ManualFrameScheduler};
//!
//! let store = Arc::new(DiagramStore::new(Arc::new(InMemoryDiagramApi::new()), &EditorConfig::default()));
//! store.open_diagram("d1").await?;
//! let mut canvas = CanvasController::new(
//!     store,
//!     "d1",
//!     &EditorConfig::default().interaction,
//!     Viewport::new(),
//!     Box::new(ManualFrameScheduler::new()),
//! );
//! ```

pub mod commands;
pub mod events;
pub mod gestures;
pub mod interaction;
pub mod local_state;
pub mod orchestrator;
pub mod store;

pub use commands::{
    BoxedCommand, Command, CommandDeps, CommandFactory, CommandHistory, CommandManager, CommandScope,
    CompositeCommand, ShapeMove, ShapeResize,
};
pub use events::{HitTarget, Key, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use gestures::{Selection, SelectionOutcome};
pub use interaction::{
    FrameCoalescer, FrameScheduler, InteractionMode, InteractionState, InteractionStateMachine,
    ManualFrameScheduler, ResizeHandle,
};
pub use local_state::{LocalCanvasState, LocalStateRegistry};
pub use orchestrator::{CanvasController, CanvasEvent};
pub use store::{DiagramPrimitives, DiagramRepository, DiagramStore};
