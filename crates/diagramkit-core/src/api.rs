//! Persistence collaborator.
//!
//! Every mutating call answers with the complete updated aggregate, or `None`
//! when the diagram (or the addressed entity) does not exist.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{
    Connector, ConnectorUpdate, Diagram, NewConnector, NewShape, Shape, ShapePatch, ShapeUpdate,
};

#[async_trait]
pub trait DiagramApi: Send + Sync {
    async fn get_diagram(&self, diagram_id: &str) -> Result<Option<Diagram>>;

    async fn add_shape(&self, diagram_id: &str, shape: NewShape) -> Result<Option<Diagram>>;

    /// Appends all shapes in one round trip, in the given order.
    async fn add_shapes(&self, diagram_id: &str, shapes: Vec<NewShape>) -> Result<Option<Diagram>>;

    async fn update_shape(
        &self,
        diagram_id: &str,
        shape_id: &str,
        update: ShapeUpdate,
    ) -> Result<Option<Diagram>>;

    /// Applies all patches or none of them.
    async fn update_shapes(&self, diagram_id: &str, patches: Vec<ShapePatch>) -> Result<Option<Diagram>>;

    async fn delete_shape(&self, diagram_id: &str, shape_id: &str) -> Result<Option<Diagram>>;

    /// Removes the shapes and connectors in one round trip.
    async fn delete_shapes_by_ids(
        &self,
        diagram_id: &str,
        shape_ids: Vec<String>,
        connector_ids: Vec<String>,
    ) -> Result<Option<Diagram>>;

    /// Re-inserts a previously deleted shape, keeping its id.
    async fn restore_shape(&self, diagram_id: &str, shape: Shape) -> Result<Option<Diagram>>;

    async fn restore_shapes(
        &self,
        diagram_id: &str,
        shapes: Vec<Shape>,
        connectors: Vec<Connector>,
    ) -> Result<Option<Diagram>>;

    async fn add_connector(&self, diagram_id: &str, connector: NewConnector) -> Result<Option<Diagram>>;

    async fn update_connector(
        &self,
        diagram_id: &str,
        connector_id: &str,
        update: ConnectorUpdate,
    ) -> Result<Option<Diagram>>;

    async fn delete_connector(&self, diagram_id: &str, connector_id: &str) -> Result<Option<Diagram>>;

    async fn delete_connectors_by_ids(
        &self,
        diagram_id: &str,
        connector_ids: Vec<String>,
    ) -> Result<Option<Diagram>>;

    async fn restore_connector(&self, diagram_id: &str, connector: Connector) -> Result<Option<Diagram>>;

    async fn restore_connectors(
        &self,
        diagram_id: &str,
        connectors: Vec<Connector>,
    ) -> Result<Option<Diagram>>;
}
