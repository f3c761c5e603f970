//! Derived-state commands for sequence diagrams.
//!
//! Both commands recompute from the aggregate as it is when they execute, so
//! bundled after a structural command they see the post-edit connectors.

use async_trait::async_trait;
use diagramkit_core::{Error, Result, ShapePatch, ShapeUpdate};
use serde_json::{Map, Value};

use super::{Command, CommandDeps};

/// Key under which activation bars are stored in a lifeline's `data`.
pub const ACTIVATIONS_KEY: &str = "activations";

/// Rewrites `data.activations` on every lifeline.
pub struct RefreshActivationsCommand {
    deps: CommandDeps,
    diagram_id: String,
    previous: Option<Vec<(String, Value)>>,
}

impl RefreshActivationsCommand {
    pub fn new(deps: CommandDeps, diagram_id: impl Into<String>) -> Self {
        Self {
            deps,
            diagram_id: diagram_id.into(),
            previous: None,
        }
    }
}

fn with_activations(data: &Value, activations: Value) -> Value {
    let mut map = match data {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    map.insert(ACTIVATIONS_KEY.to_string(), activations);
    Value::Object(map)
}

#[async_trait]
impl Command for RefreshActivationsCommand {
    async fn execute(&mut self) -> Result<()> {
        let diagram = self.deps.diagram(&self.diagram_id)?;
        let activations = self
            .deps
            .sequence_layout
            .calculate_all_lifeline_activations(&diagram.shapes, &diagram.connectors);

        let mut previous = Vec::new();
        let mut patches = Vec::new();
        for lifeline in diagram.lifelines() {
            let boxes = activations.get(&lifeline.id).cloned().unwrap_or_default();
            let boxes = serde_json::to_value(boxes).map_err(|e| Error::other(e.to_string()))?;
            if lifeline.data.get(ACTIVATIONS_KEY) == Some(&boxes) {
                continue;
            }
            previous.push((lifeline.id.clone(), lifeline.data.clone()));
            patches.push(ShapePatch::new(
                lifeline.id.clone(),
                ShapeUpdate::data(with_activations(&lifeline.data, boxes)),
            ));
        }

        if !patches.is_empty() {
            let ids: Vec<String> = patches.iter().map(|p| p.id.clone()).collect();
            let updated = self.deps.primitives.update_shapes(&self.diagram_id, patches).await?;
            self.deps.sync(&updated, &ids, &[]);
        }
        self.previous = Some(previous);
        Ok(())
    }

    async fn undo(&mut self) -> Result<()> {
        let Some(previous) = &self.previous else {
            return Err(Error::UndoInvariantViolation {
                command: self.description().to_string(),
            });
        };
        if previous.is_empty() {
            return Ok(());
        }
        let patches: Vec<ShapePatch> = previous
            .iter()
            .map(|(id, data)| ShapePatch::new(id.clone(), ShapeUpdate::data(data.clone())))
            .collect();
        let ids: Vec<String> = previous.iter().map(|(id, _)| id.clone()).collect();
        let updated = self.deps.primitives.update_shapes(&self.diagram_id, patches).await?;
        self.deps.sync(&updated, &ids, &[]);
        Ok(())
    }

    fn description(&self) -> &str {
        "Refresh activations"
    }
}

/// Stretches or shrinks every lifeline to the height the messages need.
pub struct UpdateLifelineHeightCommand {
    deps: CommandDeps,
    diagram_id: String,
    previous: Option<Vec<(String, f64)>>,
}

impl UpdateLifelineHeightCommand {
    pub fn new(deps: CommandDeps, diagram_id: impl Into<String>) -> Self {
        Self {
            deps,
            diagram_id: diagram_id.into(),
            previous: None,
        }
    }
}

#[async_trait]
impl Command for UpdateLifelineHeightCommand {
    async fn execute(&mut self) -> Result<()> {
        let diagram = self.deps.diagram(&self.diagram_id)?;
        let height = self
            .deps
            .sequence_layout
            .calculate_required_lifeline_height(&diagram.shapes, &diagram.connectors);

        let previous: Vec<(String, f64)> = diagram
            .lifelines()
            .filter(|l| l.height != height)
            .map(|l| (l.id.clone(), l.height))
            .collect();

        if !previous.is_empty() {
            let patches: Vec<ShapePatch> = previous
                .iter()
                .map(|(id, _)| ShapePatch::new(id.clone(), ShapeUpdate::height(height)))
                .collect();
            let ids: Vec<String> = previous.iter().map(|(id, _)| id.clone()).collect();
            let updated = self.deps.primitives.update_shapes(&self.diagram_id, patches).await?;
            self.deps.sync(&updated, &ids, &[]);
        }
        self.previous = Some(previous);
        Ok(())
    }

    async fn undo(&mut self) -> Result<()> {
        let Some(previous) = &self.previous else {
            return Err(Error::UndoInvariantViolation {
                command: self.description().to_string(),
            });
        };
        if previous.is_empty() {
            return Ok(());
        }
        let patches: Vec<ShapePatch> = previous
            .iter()
            .map(|(id, height)| ShapePatch::new(id.clone(), ShapeUpdate::height(*height)))
            .collect();
        let ids: Vec<String> = previous.iter().map(|(id, _)| id.clone()).collect();
        let updated = self.deps.primitives.update_shapes(&self.diagram_id, patches).await?;
        self.deps.sync(&updated, &ids, &[]);
        Ok(())
    }

    fn description(&self) -> &str {
        "Resize lifelines"
    }
}
