use std::sync::Arc;

use diagramkit_core::{
    BasicSequenceLayout, Diagram, Error, NewConnector, NewShape, Point, Result, SequenceLayout,
};

use super::{
    AddConnectorCommand, AddShapeCommand, AddShapesCommand, BoxedCommand, CompositeCommand,
    DeleteConnectorsCommand, DeleteShapesCommand, MoveEntitiesCommand, MoveShapeCommand,
    RefreshActivationsCommand, ResizeShapesCommand, ShapeMove, ShapeResize,
    UpdateConnectorLabelCommand, UpdateLifelineHeightCommand, UpdateShapeLabelCommand,
};
use crate::local_state::LocalStateRegistry;
use crate::store::DiagramPrimitives;

/// Everything a command may touch.
#[derive(Clone)]
pub struct CommandDeps {
    pub primitives: Arc<dyn DiagramPrimitives>,
    pub local: Option<Arc<LocalStateRegistry>>,
    pub sequence_layout: Arc<dyn SequenceLayout>,
}

impl CommandDeps {
    pub fn new(primitives: Arc<dyn DiagramPrimitives>) -> Self {
        Self {
            primitives,
            local: None,
            sequence_layout: Arc::new(BasicSequenceLayout::default()),
        }
    }

    pub fn with_local_state(mut self, local: Arc<LocalStateRegistry>) -> Self {
        self.local = Some(local);
        self
    }

    pub fn with_sequence_layout(mut self, layout: Arc<dyn SequenceLayout>) -> Self {
        self.sequence_layout = layout;
        self
    }

    /// Current aggregate, or a not-found error if the diagram is not loaded.
    pub(crate) fn diagram(&self, diagram_id: &str) -> Result<Diagram> {
        self.primitives
            .diagram(diagram_id)
            .ok_or_else(|| Error::diagram_not_found(diagram_id))
    }

    /// Pushes the listed entities from a persisted aggregate into the mirror.
    pub(crate) fn sync(&self, diagram: &Diagram, shape_ids: &[String], connector_ids: &[String]) {
        if let Some(local) = &self.local {
            local.sync_entities(diagram, shape_ids, connector_ids);
        }
    }
}

/// Builds commands closed over the injected dependencies.
#[derive(Clone)]
pub struct CommandFactory {
    deps: CommandDeps,
}

impl CommandFactory {
    pub fn new(deps: CommandDeps) -> Self {
        Self { deps }
    }

    pub fn deps(&self) -> &CommandDeps {
        &self.deps
    }

    pub fn create_add_shape(&self, diagram_id: &str, shape: NewShape) -> AddShapeCommand {
        AddShapeCommand::new(self.deps.clone(), diagram_id, shape)
    }

    pub fn create_add_shapes(&self, diagram_id: &str, shapes: Vec<NewShape>) -> AddShapesCommand {
        AddShapesCommand::new(self.deps.clone(), diagram_id, shapes)
    }

    pub fn create_delete_shape(&self, diagram_id: &str, shape_id: &str) -> DeleteShapesCommand {
        DeleteShapesCommand::new(self.deps.clone(), diagram_id, vec![shape_id.to_string()], Vec::new())
    }

    pub fn create_delete_shapes(
        &self,
        diagram_id: &str,
        shape_ids: Vec<String>,
        connector_ids: Vec<String>,
    ) -> DeleteShapesCommand {
        DeleteShapesCommand::new(self.deps.clone(), diagram_id, shape_ids, connector_ids)
    }

    pub fn create_move_shape(&self, diagram_id: &str, shape_id: &str, from: Point, to: Point) -> MoveShapeCommand {
        MoveShapeCommand::new(self.deps.clone(), diagram_id, ShapeMove::new(shape_id, from, to))
    }

    pub fn create_move_entities(&self, diagram_id: &str, moves: Vec<ShapeMove>) -> MoveEntitiesCommand {
        MoveEntitiesCommand::new(self.deps.clone(), diagram_id, moves)
    }

    pub fn create_resize_shapes(&self, diagram_id: &str, resizes: Vec<ShapeResize>) -> ResizeShapesCommand {
        ResizeShapesCommand::new(self.deps.clone(), diagram_id, resizes)
    }

    pub fn create_update_shape_label(&self, diagram_id: &str, shape_id: &str, label: &str) -> UpdateShapeLabelCommand {
        UpdateShapeLabelCommand::new(self.deps.clone(), diagram_id, shape_id, label)
    }

    pub fn create_add_connector(&self, diagram_id: &str, connector: NewConnector) -> AddConnectorCommand {
        AddConnectorCommand::new(self.deps.clone(), diagram_id, connector)
    }

    pub fn create_delete_connector(&self, diagram_id: &str, connector_id: &str) -> DeleteConnectorsCommand {
        DeleteConnectorsCommand::new(self.deps.clone(), diagram_id, vec![connector_id.to_string()])
    }

    pub fn create_delete_connectors(&self, diagram_id: &str, connector_ids: Vec<String>) -> DeleteConnectorsCommand {
        DeleteConnectorsCommand::new(self.deps.clone(), diagram_id, connector_ids)
    }

    pub fn create_update_connector_label(
        &self,
        diagram_id: &str,
        connector_id: &str,
        label: Option<String>,
    ) -> UpdateConnectorLabelCommand {
        UpdateConnectorLabelCommand::new(self.deps.clone(), diagram_id, connector_id, label)
    }

    pub fn create_refresh_activations(&self, diagram_id: &str) -> RefreshActivationsCommand {
        RefreshActivationsCommand::new(self.deps.clone(), diagram_id)
    }

    pub fn create_update_lifeline_height(&self, diagram_id: &str) -> UpdateLifelineHeightCommand {
        UpdateLifelineHeightCommand::new(self.deps.clone(), diagram_id)
    }

    /// Bundles the sequence-diagram follow-ups with a structural command when
    /// the diagram is a sequence diagram; otherwise returns it unchanged.
    pub fn with_sequence_side_effects(&self, diagram_id: &str, command: BoxedCommand) -> BoxedCommand {
        let is_sequence = self
            .deps
            .primitives
            .diagram(diagram_id)
            .is_some_and(|d| d.is_sequence());
        if !is_sequence {
            return command;
        }

        let description = command.description().to_string();
        Box::new(CompositeCommand::new(
            description,
            vec![
                command,
                Box::new(self.create_refresh_activations(diagram_id)),
                Box::new(self.create_update_lifeline_height(diagram_id)),
            ],
        ))
    }
}
