//! Diagram aggregate store
//!
//! Owns the loaded aggregates and exposes the public editing operations used
//! by the UI. Every public mutation is built by the [`CommandFactory`] and
//! executed through the [`CommandManager`] under the diagram's scope; the
//! store is the boundary that records the last error per diagram.

mod primitives;

pub use primitives::{DiagramPrimitives, DiagramRepository};

use std::collections::HashMap;
use std::sync::Arc;

use diagramkit_core::{
    BasicSequenceLayout, Connector, Diagram, DiagramApi, EditorConfig, Error, NewConnector,
    NewShape, NoopReferenceTracker, Point, ReferenceTracker, Result, SequenceLayout, Shape,
    ShapeUpdate,
};
use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use crate::commands::{
    BoxedCommand, CommandDeps, CommandFactory, CommandManager, CommandScope, ShapeMove, ShapeResize,
};
use crate::local_state::LocalStateRegistry;

pub struct DiagramStore {
    repository: Arc<DiagramRepository>,
    local: Arc<LocalStateRegistry>,
    commands: Arc<CommandManager>,
    factory: CommandFactory,
    references: Arc<dyn ReferenceTracker>,
    errors: RwLock<HashMap<String, Error>>,
}

impl DiagramStore {
    pub fn new(api: Arc<dyn DiagramApi>, config: &EditorConfig) -> Self {
        Self::with_collaborators(
            api,
            Arc::new(CommandManager::new(config.history.max_history_size)),
            Arc::new(NoopReferenceTracker),
            Arc::new(BasicSequenceLayout::new(config.sequence.clone())),
        )
    }

    pub fn with_collaborators(
        api: Arc<dyn DiagramApi>,
        commands: Arc<CommandManager>,
        references: Arc<dyn ReferenceTracker>,
        sequence_layout: Arc<dyn SequenceLayout>,
    ) -> Self {
        let repository = Arc::new(DiagramRepository::new(api));
        let local = Arc::new(LocalStateRegistry::new());
        let primitives: Arc<dyn DiagramPrimitives> = repository.clone();
        let deps = CommandDeps::new(primitives)
            .with_local_state(Arc::clone(&local))
            .with_sequence_layout(sequence_layout);

        Self {
            repository,
            local,
            commands,
            factory: CommandFactory::new(deps),
            references,
            errors: RwLock::new(HashMap::new()),
        }
    }

    pub fn factory(&self) -> &CommandFactory {
        &self.factory
    }

    pub fn commands(&self) -> &Arc<CommandManager> {
        &self.commands
    }

    pub fn local(&self) -> &Arc<LocalStateRegistry> {
        &self.local
    }

    /// Loads a diagram and opens its local mirror.
    pub async fn open_diagram(&self, diagram_id: &str) -> Result<Diagram> {
        let diagram = self.record(diagram_id, self.repository.load(diagram_id).await)?;
        self.local.open(&diagram);
        info!(
            "Opened diagram {} ({} shapes, {} connectors)",
            diagram_id,
            diagram.shapes.len(),
            diagram.connectors.len()
        );
        Ok(diagram)
    }

    /// Drops the cached aggregate, mirror, history and error of a diagram.
    pub fn close_diagram(&self, diagram_id: &str) {
        self.repository.unload(diagram_id);
        self.local.close(diagram_id);
        self.commands.clear_scope(&CommandScope::new(diagram_id));
        self.errors.write().remove(diagram_id);
        debug!("Closed diagram {}", diagram_id);
    }

    pub fn diagram(&self, diagram_id: &str) -> Option<Diagram> {
        self.repository.diagram(diagram_id)
    }

    pub fn is_open(&self, diagram_id: &str) -> bool {
        self.repository.is_loaded(diagram_id)
    }

    /// Last error recorded for the diagram.
    pub fn error(&self, diagram_id: &str) -> Option<Error> {
        self.errors.read().get(diagram_id).cloned()
    }

    pub fn clear_error(&self, diagram_id: &str) {
        self.errors.write().remove(diagram_id);
    }

    fn record<T>(&self, diagram_id: &str, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            error!("Diagram {}: {}", diagram_id, err);
            self.errors.write().insert(diagram_id.to_string(), err.clone());
        }
        result
    }

    /// Runs a command under the diagram's scope.
    pub async fn execute(&self, diagram_id: &str, command: BoxedCommand) -> Result<()> {
        let scope = CommandScope::new(diagram_id);
        let result = self.commands.execute(&scope, command).await;
        self.record(diagram_id, result)
    }

    pub async fn undo(&self, diagram_id: &str) -> Result<bool> {
        let result = self.commands.undo(&CommandScope::new(diagram_id)).await;
        self.record(diagram_id, result)
    }

    pub async fn redo(&self, diagram_id: &str) -> Result<bool> {
        let result = self.commands.redo(&CommandScope::new(diagram_id)).await;
        self.record(diagram_id, result)
    }

    pub async fn can_undo(&self, diagram_id: &str) -> bool {
        self.commands.can_undo(&CommandScope::new(diagram_id)).await
    }

    pub async fn can_redo(&self, diagram_id: &str) -> bool {
        self.commands.can_redo(&CommandScope::new(diagram_id)).await
    }

    fn require_shape(&self, diagram_id: &str, shape_id: &str) -> Result<Shape> {
        let diagram = self
            .diagram(diagram_id)
            .ok_or_else(|| Error::diagram_not_found(diagram_id))?;
        diagram
            .shape(shape_id)
            .cloned()
            .ok_or_else(|| Error::shape_not_found(diagram_id, shape_id))
    }

    pub async fn add_shape(&self, diagram_id: &str, shape: NewShape) -> Result<Shape> {
        let command = self.factory.create_add_shape(diagram_id, shape);
        self.execute(diagram_id, Box::new(command)).await?;

        let created = self
            .diagram(diagram_id)
            .and_then(|d| d.shapes.last().cloned())
            .ok_or_else(|| Error::diagram_not_found(diagram_id));
        let created = self.record(diagram_id, created)?;
        self.notify_created(diagram_id, std::slice::from_ref(&created)).await;
        Ok(created)
    }

    pub async fn add_shapes(&self, diagram_id: &str, shapes: Vec<NewShape>) -> Result<Vec<Shape>> {
        if shapes.is_empty() {
            return Ok(Vec::new());
        }
        let count = shapes.len();
        let command = self.factory.create_add_shapes(diagram_id, shapes);
        self.execute(diagram_id, Box::new(command)).await?;

        let created = self
            .diagram(diagram_id)
            .map(|d| {
                let start = d.shapes.len().saturating_sub(count);
                d.shapes[start..].to_vec()
            })
            .ok_or_else(|| Error::diagram_not_found(diagram_id));
        let created = self.record(diagram_id, created)?;
        self.notify_created(diagram_id, &created).await;
        Ok(created)
    }

    /// Only position updates are supported here; labels go through
    /// [`update_shape_label`](Self::update_shape_label) and bounds through
    /// [`resize_shapes`](Self::resize_shapes).
    pub async fn update_shape(&self, diagram_id: &str, shape_id: &str, update: ShapeUpdate) -> Result<()> {
        if !update.is_position_only() {
            let err = Error::invalid("update_shape only supports position changes");
            return self.record(diagram_id, Err(err));
        }
        let shape = self.record(diagram_id, self.require_shape(diagram_id, shape_id))?;
        let from = shape.position();
        let to = Point::new(update.x.unwrap_or(from.x), update.y.unwrap_or(from.y));
        let command = self.factory.create_move_shape(diagram_id, shape_id, from, to);
        self.execute(diagram_id, Box::new(command)).await
    }

    pub async fn move_shapes(&self, diagram_id: &str, moves: Vec<ShapeMove>) -> Result<()> {
        if moves.is_empty() {
            return Ok(());
        }
        let command = self.factory.create_move_entities(diagram_id, moves);
        self.execute(diagram_id, Box::new(command)).await
    }

    pub async fn resize_shapes(&self, diagram_id: &str, resizes: Vec<ShapeResize>) -> Result<()> {
        if resizes.is_empty() {
            return Ok(());
        }
        let command = self.factory.create_resize_shapes(diagram_id, resizes);
        self.execute(diagram_id, Box::new(command)).await
    }

    pub async fn update_shape_label(&self, diagram_id: &str, shape_id: &str, label: &str) -> Result<()> {
        let command = self.factory.create_update_shape_label(diagram_id, shape_id, label);
        self.execute(diagram_id, Box::new(command)).await?;

        if let Some(shape) = self.diagram(diagram_id).and_then(|d| d.shape(shape_id).cloned()) {
            if self.references.is_reference_source(&shape) {
                if let Err(err) = self.references.shape_label_updated(diagram_id, &shape).await {
                    warn!("Reference update for shape {} failed: {}", shape_id, err);
                }
            }
        }
        Ok(())
    }

    pub async fn delete_shape(&self, diagram_id: &str, shape_id: &str) -> Result<()> {
        self.delete_shapes(diagram_id, vec![shape_id.to_string()], Vec::new())
            .await
    }

    /// Deletes shapes, their attached connectors and the extra connectors as
    /// one undo step.
    pub async fn delete_shapes(
        &self,
        diagram_id: &str,
        shape_ids: Vec<String>,
        connector_ids: Vec<String>,
    ) -> Result<()> {
        if shape_ids.is_empty() {
            return self.delete_connectors(diagram_id, connector_ids).await;
        }
        let command = self
            .factory
            .create_delete_shapes(diagram_id, shape_ids.clone(), connector_ids);
        let command = self.factory.with_sequence_side_effects(diagram_id, Box::new(command));
        self.execute(diagram_id, command).await?;

        for shape_id in &shape_ids {
            if let Err(err) = self.references.shape_deleted(diagram_id, shape_id).await {
                warn!("Reference cleanup for shape {} failed: {}", shape_id, err);
            }
        }
        Ok(())
    }

    pub async fn add_connector(&self, diagram_id: &str, connector: NewConnector) -> Result<Connector> {
        let command = self.factory.create_add_connector(diagram_id, connector);
        let command = self.factory.with_sequence_side_effects(diagram_id, Box::new(command));
        self.execute(diagram_id, command).await?;

        let created = self
            .diagram(diagram_id)
            .and_then(|d| d.connectors.last().cloned())
            .ok_or_else(|| Error::diagram_not_found(diagram_id));
        self.record(diagram_id, created)
    }

    pub async fn update_connector_label(
        &self,
        diagram_id: &str,
        connector_id: &str,
        label: Option<String>,
    ) -> Result<()> {
        let command = self
            .factory
            .create_update_connector_label(diagram_id, connector_id, label);
        self.execute(diagram_id, Box::new(command)).await
    }

    pub async fn delete_connector(&self, diagram_id: &str, connector_id: &str) -> Result<()> {
        self.delete_connectors(diagram_id, vec![connector_id.to_string()])
            .await
    }

    pub async fn delete_connectors(&self, diagram_id: &str, connector_ids: Vec<String>) -> Result<()> {
        if connector_ids.is_empty() {
            return Ok(());
        }
        let command = self.factory.create_delete_connectors(diagram_id, connector_ids);
        let command = self.factory.with_sequence_side_effects(diagram_id, Box::new(command));
        self.execute(diagram_id, command).await
    }

    async fn notify_created(&self, diagram_id: &str, shapes: &[Shape]) {
        for shape in shapes {
            if !self.references.is_reference_source(shape) {
                continue;
            }
            if let Err(err) = self.references.shape_created(diagram_id, shape).await {
                warn!("Reference registration for shape {} failed: {}", shape.id, err);
            }
        }
    }
}
