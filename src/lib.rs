//! # diagramkit
//!
//! Editing engine for multi-entity diagram canvases:
//! - Interaction state machine with one active gesture at a time
//! - Gesture hooks for selection, dragging, resizing, connector drawing and panning
//! - Frame-coalesced local mirror updates during gestures
//! - Command-based undo/redo with one history per diagram
//! - Sequence-diagram side effects (lifeline height, activation boxes)
//!
//! ## Architecture
//!
//! diagramkit is organized as a workspace with multiple crates:
//!
//! 1. **diagramkit-core** - Data model, errors, persistence interface, configuration
//! 2. **diagramkit-editor** - Commands, store, local mirror, interaction and orchestrator
//! 3. **diagramkit** - Logging setup, session replay and the `diagramkit` binary

pub mod replay;

pub use diagramkit_core::{
    Bounds, ConnectionSide, Connector, Diagram, DiagramApi, DiagramType, EditorConfig, Error,
    InMemoryDiagramApi, NewConnector, NewShape, Point, Result, Shape, Viewport,
};
pub use diagramkit_editor::{
    CanvasController, CanvasEvent, CommandManager, CommandScope, DiagramStore, HitTarget, Key,
    KeyEvent, Modifiers, MouseButton, PointerEvent, Selection,
};
pub use replay::{load_session, replay, ReplayReport, Session, SessionEvent};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output on stderr, so stdout stays clean for reports
/// - RUST_LOG environment variable support
/// - Targets, levels and line numbers
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
