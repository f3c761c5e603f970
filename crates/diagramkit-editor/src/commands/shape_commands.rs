use async_trait::async_trait;
use diagramkit_core::{Bounds, Connector, Error, NewShape, Point, Result, Shape, ShapePatch, ShapeUpdate};
use serde::{Deserialize, Serialize};

use super::{Command, CommandDeps};

/// Creates one shape. Undo deletes it; redo restores it with the same id.
pub struct AddShapeCommand {
    deps: CommandDeps,
    diagram_id: String,
    shape: NewShape,
    created: Option<Shape>,
}

impl AddShapeCommand {
    pub fn new(deps: CommandDeps, diagram_id: impl Into<String>, shape: NewShape) -> Self {
        Self {
            deps,
            diagram_id: diagram_id.into(),
            shape,
            created: None,
        }
    }

    /// The shape as last seen by this command.
    pub fn created_shape(&self) -> Option<&Shape> {
        self.created.as_ref()
    }
}

#[async_trait]
impl Command for AddShapeCommand {
    async fn execute(&mut self) -> Result<()> {
        let primitives = &self.deps.primitives;
        let diagram = match &self.created {
            Some(shape) => primitives.restore_shape(&self.diagram_id, shape.clone()).await?,
            None => primitives.add_shape(&self.diagram_id, self.shape.clone()).await?,
        };

        let shape = match &self.created {
            Some(shape) => diagram.shape(&shape.id).cloned(),
            None => diagram.shapes.last().cloned(),
        }
        .ok_or_else(|| Error::other("add_shape returned an aggregate without the new shape"))?;

        self.deps.sync(&diagram, &[shape.id.clone()], &[]);
        self.created = Some(shape);
        Ok(())
    }

    async fn undo(&mut self) -> Result<()> {
        let Some(created) = &self.created else {
            return Err(Error::UndoInvariantViolation {
                command: self.description().to_string(),
            });
        };
        let shape_id = created.id.clone();

        // Capture the latest version so redo brings back exactly what was removed.
        if let Some(current) = self
            .deps
            .primitives
            .diagram(&self.diagram_id)
            .and_then(|d| d.shape(&shape_id).cloned())
        {
            self.created = Some(current);
        }

        let diagram = self.deps.primitives.delete_shape(&self.diagram_id, &shape_id).await?;
        self.deps.sync(&diagram, &[shape_id], &[]);
        Ok(())
    }

    fn description(&self) -> &str {
        "Add shape"
    }
}

/// Creates several shapes in one round trip and one undo step.
pub struct AddShapesCommand {
    deps: CommandDeps,
    diagram_id: String,
    shapes: Vec<NewShape>,
    created: Vec<Shape>,
}

impl AddShapesCommand {
    pub fn new(deps: CommandDeps, diagram_id: impl Into<String>, shapes: Vec<NewShape>) -> Self {
        Self {
            deps,
            diagram_id: diagram_id.into(),
            shapes,
            created: Vec::new(),
        }
    }

    pub fn created_shapes(&self) -> &[Shape] {
        &self.created
    }
}

#[async_trait]
impl Command for AddShapesCommand {
    async fn execute(&mut self) -> Result<()> {
        let primitives = &self.deps.primitives;
        if self.created.is_empty() {
            let diagram = primitives.add_shapes(&self.diagram_id, self.shapes.clone()).await?;
            let start = diagram.shapes.len().saturating_sub(self.shapes.len());
            self.created = diagram.shapes[start..].to_vec();
            let ids = ids_of(&self.created);
            self.deps.sync(&diagram, &ids, &[]);
        } else {
            let diagram = primitives
                .restore_shapes(&self.diagram_id, self.created.clone(), Vec::new())
                .await?;
            let ids = ids_of(&self.created);
            self.deps.sync(&diagram, &ids, &[]);
        }
        Ok(())
    }

    async fn undo(&mut self) -> Result<()> {
        if self.created.is_empty() {
            return Err(Error::UndoInvariantViolation {
                command: self.description().to_string(),
            });
        }
        if let Some(current) = self.deps.primitives.diagram(&self.diagram_id) {
            for shape in self.created.iter_mut() {
                if let Some(latest) = current.shape(&shape.id) {
                    *shape = latest.clone();
                }
            }
        }
        let ids = ids_of(&self.created);
        let diagram = self
            .deps
            .primitives
            .delete_shapes(&self.diagram_id, ids.clone(), Vec::new())
            .await?;
        self.deps.sync(&diagram, &ids, &[]);
        Ok(())
    }

    fn description(&self) -> &str {
        "Add shapes"
    }
}

fn ids_of(shapes: &[Shape]) -> Vec<String> {
    shapes.iter().map(|s| s.id.clone()).collect()
}

/// Drops repeated ids, keeping first occurrences in order.
pub(crate) fn unique(ids: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

fn connector_ids_of(connectors: &[Connector]) -> Vec<String> {
    connectors.iter().map(|c| c.id.clone()).collect()
}

/// Deletes shapes together with every connector attached to them, plus any
/// explicitly listed connectors, as one round trip and one undo step.
pub struct DeleteShapesCommand {
    deps: CommandDeps,
    diagram_id: String,
    shape_ids: Vec<String>,
    extra_connector_ids: Vec<String>,
    removed: Option<(Vec<Shape>, Vec<Connector>)>,
    description: String,
}

impl DeleteShapesCommand {
    pub fn new(
        deps: CommandDeps,
        diagram_id: impl Into<String>,
        shape_ids: Vec<String>,
        extra_connector_ids: Vec<String>,
    ) -> Self {
        let shape_ids = unique(shape_ids);
        let extra_connector_ids = unique(extra_connector_ids);
        let description = if shape_ids.len() == 1 {
            "Delete shape".to_string()
        } else {
            format!("Delete {} shapes", shape_ids.len())
        };
        Self {
            deps,
            diagram_id: diagram_id.into(),
            shape_ids,
            extra_connector_ids,
            removed: None,
            description,
        }
    }

    /// Shapes and connectors removed by the last execute.
    pub fn removed(&self) -> Option<&(Vec<Shape>, Vec<Connector>)> {
        self.removed.as_ref()
    }
}

#[async_trait]
impl Command for DeleteShapesCommand {
    async fn execute(&mut self) -> Result<()> {
        let diagram = self.deps.diagram(&self.diagram_id)?;

        let mut shapes = Vec::with_capacity(self.shape_ids.len());
        for id in &self.shape_ids {
            let shape = diagram
                .shape(id)
                .ok_or_else(|| Error::shape_not_found(&self.diagram_id, id))?;
            shapes.push(shape.clone());
        }
        for id in &self.extra_connector_ids {
            if diagram.connector(id).is_none() {
                return Err(Error::connector_not_found(&self.diagram_id, id));
            }
        }

        let connectors: Vec<Connector> = diagram
            .connectors
            .iter()
            .filter(|c| {
                self.extra_connector_ids.contains(&c.id)
                    || self.shape_ids.iter().any(|id| c.touches(id))
            })
            .cloned()
            .collect();

        let shape_ids = ids_of(&shapes);
        let connector_ids = connector_ids_of(&connectors);
        let updated = self
            .deps
            .primitives
            .delete_shapes(&self.diagram_id, shape_ids.clone(), connector_ids.clone())
            .await?;
        self.deps.sync(&updated, &shape_ids, &connector_ids);
        self.removed = Some((shapes, connectors));
        Ok(())
    }

    async fn undo(&mut self) -> Result<()> {
        let Some((shapes, connectors)) = &self.removed else {
            return Err(Error::UndoInvariantViolation {
                command: self.description.clone(),
            });
        };
        let shape_ids = ids_of(shapes);
        let connector_ids = connector_ids_of(connectors);
        let diagram = self
            .deps
            .primitives
            .restore_shapes(&self.diagram_id, shapes.clone(), connectors.clone())
            .await?;
        self.deps.sync(&diagram, &shape_ids, &connector_ids);
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Position change of one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeMove {
    pub id: String,
    pub from: Point,
    pub to: Point,
}

impl ShapeMove {
    pub fn new(id: impl Into<String>, from: Point, to: Point) -> Self {
        Self {
            id: id.into(),
            from,
            to,
        }
    }
}

/// Moves a single shape.
pub struct MoveShapeCommand {
    deps: CommandDeps,
    diagram_id: String,
    movement: ShapeMove,
}

impl MoveShapeCommand {
    pub fn new(deps: CommandDeps, diagram_id: impl Into<String>, movement: ShapeMove) -> Self {
        Self {
            deps,
            diagram_id: diagram_id.into(),
            movement,
        }
    }

    async fn move_to(&self, position: Point) -> Result<()> {
        let diagram = self
            .deps
            .primitives
            .update_shape(&self.diagram_id, &self.movement.id, ShapeUpdate::position(position))
            .await?;
        self.deps.sync(&diagram, &[self.movement.id.clone()], &[]);
        Ok(())
    }
}

#[async_trait]
impl Command for MoveShapeCommand {
    async fn execute(&mut self) -> Result<()> {
        self.move_to(self.movement.to).await
    }

    async fn undo(&mut self) -> Result<()> {
        self.move_to(self.movement.from).await
    }

    fn description(&self) -> &str {
        "Move shape"
    }
}

/// Moves any number of shapes with one persisted call.
pub struct MoveEntitiesCommand {
    deps: CommandDeps,
    diagram_id: String,
    moves: Vec<ShapeMove>,
    description: String,
}

impl MoveEntitiesCommand {
    pub fn new(deps: CommandDeps, diagram_id: impl Into<String>, moves: Vec<ShapeMove>) -> Self {
        let description = if moves.len() == 1 {
            "Move shape".to_string()
        } else {
            format!("Move {} shapes", moves.len())
        };
        Self {
            deps,
            diagram_id: diagram_id.into(),
            moves,
            description,
        }
    }

    pub fn moves(&self) -> &[ShapeMove] {
        &self.moves
    }

    async fn apply(&self, forward: bool) -> Result<()> {
        let patches: Vec<ShapePatch> = self
            .moves
            .iter()
            .map(|m| ShapePatch::new(m.id.clone(), ShapeUpdate::position(if forward { m.to } else { m.from })))
            .collect();
        let ids: Vec<String> = self.moves.iter().map(|m| m.id.clone()).collect();
        let diagram = self.deps.primitives.update_shapes(&self.diagram_id, patches).await?;
        self.deps.sync(&diagram, &ids, &[]);
        Ok(())
    }
}

#[async_trait]
impl Command for MoveEntitiesCommand {
    async fn execute(&mut self) -> Result<()> {
        self.apply(true).await
    }

    async fn undo(&mut self) -> Result<()> {
        self.apply(false).await
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Bounds change of one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeResize {
    pub id: String,
    pub from: Bounds,
    pub to: Bounds,
}

impl ShapeResize {
    pub fn new(id: impl Into<String>, from: Bounds, to: Bounds) -> Self {
        Self {
            id: id.into(),
            from,
            to,
        }
    }
}

/// Resizes any number of shapes with one persisted call.
pub struct ResizeShapesCommand {
    deps: CommandDeps,
    diagram_id: String,
    resizes: Vec<ShapeResize>,
}

impl ResizeShapesCommand {
    pub fn new(deps: CommandDeps, diagram_id: impl Into<String>, resizes: Vec<ShapeResize>) -> Self {
        Self {
            deps,
            diagram_id: diagram_id.into(),
            resizes,
        }
    }

    pub fn resizes(&self) -> &[ShapeResize] {
        &self.resizes
    }

    async fn apply(&self, forward: bool) -> Result<()> {
        let patches: Vec<ShapePatch> = self
            .resizes
            .iter()
            .map(|r| ShapePatch::new(r.id.clone(), ShapeUpdate::bounds(if forward { r.to } else { r.from })))
            .collect();
        let ids: Vec<String> = self.resizes.iter().map(|r| r.id.clone()).collect();
        let diagram = self.deps.primitives.update_shapes(&self.diagram_id, patches).await?;
        self.deps.sync(&diagram, &ids, &[]);
        Ok(())
    }
}

#[async_trait]
impl Command for ResizeShapesCommand {
    async fn execute(&mut self) -> Result<()> {
        self.apply(true).await
    }

    async fn undo(&mut self) -> Result<()> {
        self.apply(false).await
    }

    fn description(&self) -> &str {
        "Resize shapes"
    }
}

/// Changes a shape's label.
pub struct UpdateShapeLabelCommand {
    deps: CommandDeps,
    diagram_id: String,
    shape_id: String,
    label: String,
    previous: Option<String>,
}

impl UpdateShapeLabelCommand {
    pub fn new(
        deps: CommandDeps,
        diagram_id: impl Into<String>,
        shape_id: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            deps,
            diagram_id: diagram_id.into(),
            shape_id: shape_id.into(),
            label: label.into(),
            previous: None,
        }
    }

    async fn set_label(&self, label: &str) -> Result<()> {
        let diagram = self
            .deps
            .primitives
            .update_shape(&self.diagram_id, &self.shape_id, ShapeUpdate::label(label))
            .await?;
        self.deps.sync(&diagram, &[self.shape_id.clone()], &[]);
        Ok(())
    }
}

#[async_trait]
impl Command for UpdateShapeLabelCommand {
    async fn execute(&mut self) -> Result<()> {
        if self.previous.is_none() {
            let diagram = self.deps.diagram(&self.diagram_id)?;
            let shape = diagram
                .shape(&self.shape_id)
                .ok_or_else(|| Error::shape_not_found(&self.diagram_id, &self.shape_id))?;
            self.previous = Some(shape.label.clone());
        }
        self.set_label(&self.label).await
    }

    async fn undo(&mut self) -> Result<()> {
        let Some(previous) = &self.previous else {
            return Err(Error::UndoInvariantViolation {
                command: self.description().to_string(),
            });
        };
        self.set_label(previous).await
    }

    fn description(&self) -> &str {
        "Rename shape"
    }
}
