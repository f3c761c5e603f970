//! # diagramkit Core
//!
//! Core types and collaborator traits for diagramkit.
//! Provides the diagram data model, the error taxonomy, the persistence
//! interface with an in-memory backend, sequence-diagram derivations,
//! reference tracking, the viewport transform and editor configuration.

pub mod api;
pub mod config;
pub mod error;
pub mod memory;
pub mod model;
pub mod references;
pub mod sequence;
pub mod viewport;

pub use api::DiagramApi;
pub use config::{EditorConfig, HistoryConfig, InteractionConfig, SequenceConfig};
pub use error::{ConfigError, Error, NotFoundError, Result};
pub use memory::InMemoryDiagramApi;
pub use model::{
    descendants, Bounds, ConnectionSide, Connector, ConnectorId, ConnectorUpdate, Diagram, DiagramId,
    DiagramType, NewConnector, NewShape, Point, Shape, ShapeId, ShapePatch, ShapeUpdate,
    LIFELINE_TYPE,
};
pub use references::{NoopReferenceTracker, ReferenceTracker};
pub use sequence::{ActivationBox, BasicSequenceLayout, SequenceLayout};
pub use viewport::{Viewport, ViewportTransform, MAX_ZOOM, MIN_ZOOM};
