//! Internal diagram primitives
//!
//! The only code paths that mutate a persisted aggregate. Each primitive calls
//! the persistence API once and swaps the cached aggregate for the complete
//! one the API returns; an empty answer becomes a [`NotFoundError`].
//!
//! [`NotFoundError`]: diagramkit_core::NotFoundError

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use diagramkit_core::{
    Connector, ConnectorUpdate, Diagram, DiagramApi, Error, NewConnector, NewShape, Result, Shape,
    ShapePatch, ShapeUpdate,
};
use parking_lot::RwLock;
use tracing::debug;

/// Mutation primitives handed to commands.
#[async_trait]
pub trait DiagramPrimitives: Send + Sync {
    /// Cached aggregate of a loaded diagram.
    fn diagram(&self, diagram_id: &str) -> Option<Diagram>;

    async fn add_shape(&self, diagram_id: &str, shape: NewShape) -> Result<Diagram>;

    async fn add_shapes(&self, diagram_id: &str, shapes: Vec<NewShape>) -> Result<Diagram>;

    async fn update_shape(&self, diagram_id: &str, shape_id: &str, update: ShapeUpdate) -> Result<Diagram>;

    async fn update_shapes(&self, diagram_id: &str, patches: Vec<ShapePatch>) -> Result<Diagram>;

    async fn delete_shape(&self, diagram_id: &str, shape_id: &str) -> Result<Diagram>;

    /// Deletes shapes and connectors in one round trip.
    async fn delete_shapes(
        &self,
        diagram_id: &str,
        shape_ids: Vec<String>,
        connector_ids: Vec<String>,
    ) -> Result<Diagram>;

    async fn restore_shape(&self, diagram_id: &str, shape: Shape) -> Result<Diagram>;

    async fn restore_shapes(
        &self,
        diagram_id: &str,
        shapes: Vec<Shape>,
        connectors: Vec<Connector>,
    ) -> Result<Diagram>;

    async fn add_connector(&self, diagram_id: &str, connector: NewConnector) -> Result<Diagram>;

    async fn update_connector(
        &self,
        diagram_id: &str,
        connector_id: &str,
        update: ConnectorUpdate,
    ) -> Result<Diagram>;

    async fn delete_connectors(&self, diagram_id: &str, connector_ids: Vec<String>) -> Result<Diagram>;

    async fn restore_connectors(&self, diagram_id: &str, connectors: Vec<Connector>) -> Result<Diagram>;
}

/// Cache of loaded aggregates backed by a [`DiagramApi`].
pub struct DiagramRepository {
    api: Arc<dyn DiagramApi>,
    diagrams: RwLock<HashMap<String, Diagram>>,
}

impl DiagramRepository {
    pub fn new(api: Arc<dyn DiagramApi>) -> Self {
        Self {
            api,
            diagrams: RwLock::new(HashMap::new()),
        }
    }

    pub fn api(&self) -> &Arc<dyn DiagramApi> {
        &self.api
    }

    /// Fetches a diagram and caches it.
    pub async fn load(&self, diagram_id: &str) -> Result<Diagram> {
        let diagram = self
            .api
            .get_diagram(diagram_id)
            .await?
            .ok_or_else(|| Error::diagram_not_found(diagram_id))?;
        self.diagrams
            .write()
            .insert(diagram_id.to_string(), diagram.clone());
        Ok(diagram)
    }

    pub fn unload(&self, diagram_id: &str) -> bool {
        self.diagrams.write().remove(diagram_id).is_some()
    }

    pub fn is_loaded(&self, diagram_id: &str) -> bool {
        self.diagrams.read().contains_key(diagram_id)
    }

    fn require_loaded(&self, diagram_id: &str) -> Result<()> {
        if self.is_loaded(diagram_id) {
            Ok(())
        } else {
            Err(Error::diagram_not_found(diagram_id))
        }
    }

    /// Swaps in the returned aggregate, or maps a miss to `missing`.
    fn accept(&self, diagram_id: &str, response: Option<Diagram>, missing: impl FnOnce() -> Error) -> Result<Diagram> {
        let diagram = response.ok_or_else(missing)?;
        debug!(
            "Diagram {} now has {} shapes and {} connectors",
            diagram_id,
            diagram.shapes.len(),
            diagram.connectors.len()
        );
        self.diagrams
            .write()
            .insert(diagram_id.to_string(), diagram.clone());
        Ok(diagram)
    }
}

fn first_or_empty(ids: &[String]) -> &str {
    ids.first().map(String::as_str).unwrap_or_default()
}

#[async_trait]
impl DiagramPrimitives for DiagramRepository {
    fn diagram(&self, diagram_id: &str) -> Option<Diagram> {
        self.diagrams.read().get(diagram_id).cloned()
    }

    async fn add_shape(&self, diagram_id: &str, shape: NewShape) -> Result<Diagram> {
        self.require_loaded(diagram_id)?;
        let response = self.api.add_shape(diagram_id, shape).await?;
        self.accept(diagram_id, response, || Error::diagram_not_found(diagram_id))
    }

    async fn add_shapes(&self, diagram_id: &str, shapes: Vec<NewShape>) -> Result<Diagram> {
        self.require_loaded(diagram_id)?;
        let response = self.api.add_shapes(diagram_id, shapes).await?;
        self.accept(diagram_id, response, || Error::diagram_not_found(diagram_id))
    }

    async fn update_shape(&self, diagram_id: &str, shape_id: &str, update: ShapeUpdate) -> Result<Diagram> {
        self.require_loaded(diagram_id)?;
        let response = self.api.update_shape(diagram_id, shape_id, update).await?;
        self.accept(diagram_id, response, || Error::shape_not_found(diagram_id, shape_id))
    }

    async fn update_shapes(&self, diagram_id: &str, patches: Vec<ShapePatch>) -> Result<Diagram> {
        self.require_loaded(diagram_id)?;
        let first = patches.first().map(|p| p.id.clone()).unwrap_or_default();
        let response = self.api.update_shapes(diagram_id, patches).await?;
        self.accept(diagram_id, response, || Error::shape_not_found(diagram_id, &first))
    }

    async fn delete_shape(&self, diagram_id: &str, shape_id: &str) -> Result<Diagram> {
        self.require_loaded(diagram_id)?;
        let response = self.api.delete_shape(diagram_id, shape_id).await?;
        self.accept(diagram_id, response, || Error::shape_not_found(diagram_id, shape_id))
    }

    async fn delete_shapes(
        &self,
        diagram_id: &str,
        shape_ids: Vec<String>,
        connector_ids: Vec<String>,
    ) -> Result<Diagram> {
        self.require_loaded(diagram_id)?;
        let first = first_or_empty(&shape_ids).to_string();
        let response = self
            .api
            .delete_shapes_by_ids(diagram_id, shape_ids, connector_ids)
            .await?;
        self.accept(diagram_id, response, || Error::shape_not_found(diagram_id, &first))
    }

    async fn restore_shape(&self, diagram_id: &str, shape: Shape) -> Result<Diagram> {
        self.require_loaded(diagram_id)?;
        let shape_id = shape.id.clone();
        let response = self.api.restore_shape(diagram_id, shape).await?;
        self.accept(diagram_id, response, || Error::shape_not_found(diagram_id, &shape_id))
    }

    async fn restore_shapes(
        &self,
        diagram_id: &str,
        shapes: Vec<Shape>,
        connectors: Vec<Connector>,
    ) -> Result<Diagram> {
        self.require_loaded(diagram_id)?;
        let response = self.api.restore_shapes(diagram_id, shapes, connectors).await?;
        self.accept(diagram_id, response, || Error::diagram_not_found(diagram_id))
    }

    async fn add_connector(&self, diagram_id: &str, connector: NewConnector) -> Result<Diagram> {
        self.require_loaded(diagram_id)?;
        let source = connector.source_shape_id.clone();
        let response = self.api.add_connector(diagram_id, connector).await?;
        self.accept(diagram_id, response, || Error::shape_not_found(diagram_id, &source))
    }

    async fn update_connector(
        &self,
        diagram_id: &str,
        connector_id: &str,
        update: ConnectorUpdate,
    ) -> Result<Diagram> {
        self.require_loaded(diagram_id)?;
        let response = self.api.update_connector(diagram_id, connector_id, update).await?;
        self.accept(diagram_id, response, || {
            Error::connector_not_found(diagram_id, connector_id)
        })
    }

    async fn delete_connectors(&self, diagram_id: &str, connector_ids: Vec<String>) -> Result<Diagram> {
        self.require_loaded(diagram_id)?;
        let first = first_or_empty(&connector_ids).to_string();
        let response = self.api.delete_connectors_by_ids(diagram_id, connector_ids).await?;
        self.accept(diagram_id, response, || Error::connector_not_found(diagram_id, &first))
    }

    async fn restore_connectors(&self, diagram_id: &str, connectors: Vec<Connector>) -> Result<Diagram> {
        self.require_loaded(diagram_id)?;
        let response = self.api.restore_connectors(diagram_id, connectors).await?;
        self.accept(diagram_id, response, || Error::diagram_not_found(diagram_id))
    }
}
