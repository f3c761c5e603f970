//! Command-based editing
//!
//! Every mutation of a persisted diagram is a [`Command`]: a reversible unit
//! that captures the state it needs to undo itself. Commands are built by the
//! [`CommandFactory`], recorded per scope by the [`CommandManager`] and never
//! reach into global state.

mod connector_commands;
mod factory;
mod history;
mod manager;
mod sequence_commands;
mod shape_commands;

pub use connector_commands::{AddConnectorCommand, DeleteConnectorsCommand, UpdateConnectorLabelCommand};
pub use factory::{CommandDeps, CommandFactory};
pub use history::CommandHistory;
pub use manager::{CommandManager, CommandScope};
pub use sequence_commands::{RefreshActivationsCommand, UpdateLifelineHeightCommand, ACTIVATIONS_KEY};
pub use shape_commands::{
    AddShapeCommand, AddShapesCommand, DeleteShapesCommand, MoveEntitiesCommand, MoveShapeCommand,
    ResizeShapesCommand, ShapeMove, ShapeResize, UpdateShapeLabelCommand,
};

use async_trait::async_trait;
use diagramkit_core::Result;
use tracing::warn;

/// A reversible unit of mutation.
///
/// `execute` runs both the first time and on redo, so it must derive
/// everything from the command's own captured state.
#[async_trait]
pub trait Command: Send + Sync {
    async fn execute(&mut self) -> Result<()>;

    async fn undo(&mut self) -> Result<()>;

    /// Human readable label shown in undo/redo menus.
    fn description(&self) -> &str;
}

pub type BoxedCommand = Box<dyn Command>;

/// Runs several commands as one undo step.
pub struct CompositeCommand {
    description: String,
    commands: Vec<BoxedCommand>,
}

impl CompositeCommand {
    pub fn new(description: impl Into<String>, commands: Vec<BoxedCommand>) -> Self {
        Self {
            description: description.into(),
            commands,
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[async_trait]
impl Command for CompositeCommand {
    async fn execute(&mut self) -> Result<()> {
        for i in 0..self.commands.len() {
            if let Err(err) = self.commands[i].execute().await {
                // Roll back what already ran so the step stays atomic.
                for done in self.commands[..i].iter_mut().rev() {
                    if let Err(rollback) = done.undo().await {
                        warn!(
                            "Rollback of '{}' failed after '{}' errored: {}",
                            done.description(),
                            self.description,
                            rollback
                        );
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    async fn undo(&mut self) -> Result<()> {
        let count = self.commands.len();
        for i in (0..count).rev() {
            if let Err(err) = self.commands[i].undo().await {
                for undone in self.commands[i + 1..].iter_mut() {
                    if let Err(reapply) = undone.execute().await {
                        warn!(
                            "Re-applying '{}' failed after undo of '{}' errored: {}",
                            undone.description(),
                            self.description,
                            reapply
                        );
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }
}
