use std::collections::VecDeque;

use diagramkit_core::Result;
use tracing::{debug, warn};

use super::BoxedCommand;

/// Undo/redo stacks of one scope.
pub struct CommandHistory {
    undo_stack: VecDeque<BoxedCommand>,
    redo_stack: Vec<BoxedCommand>,
    max_history_size: usize,
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(50)
    }
}

impl CommandHistory {
    pub fn new(max_history_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_history_size: max_history_size.max(1),
        }
    }

    /// Executes the command and records it. A failing command is not recorded
    /// and leaves both stacks as they were.
    pub async fn execute(&mut self, mut cmd: BoxedCommand) -> Result<()> {
        cmd.execute().await?;
        debug!("Executed '{}'", cmd.description());

        self.undo_stack.push_back(cmd);
        self.redo_stack.clear();
        while self.undo_stack.len() > self.max_history_size {
            self.undo_stack.pop_front();
        }
        Ok(())
    }

    /// Returns `Ok(false)` when there was nothing to undo or the step was skipped.
    pub async fn undo(&mut self) -> Result<bool> {
        let Some(mut cmd) = self.undo_stack.pop_back() else {
            warn!("Nothing to undo");
            return Ok(false);
        };

        match cmd.undo().await {
            Ok(()) => {
                debug!("Undid '{}'", cmd.description());
                self.redo_stack.push(cmd);
                Ok(true)
            }
            Err(err) if err.is_undo_invariant_violation() => {
                warn!("Skipping undo step: {}", err);
                Ok(false)
            }
            Err(err) => {
                self.undo_stack.push_back(cmd);
                Err(err)
            }
        }
    }

    pub async fn redo(&mut self) -> Result<bool> {
        let Some(mut cmd) = self.redo_stack.pop() else {
            warn!("Nothing to redo");
            return Ok(false);
        };

        match cmd.execute().await {
            Ok(()) => {
                debug!("Redid '{}'", cmd.description());
                self.undo_stack.push_back(cmd);
                Ok(true)
            }
            Err(err) => {
                self.redo_stack.push(cmd);
                Err(err)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_stack_size(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_stack_size(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.back().map(|c| c.description().to_string())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(|c| c.description().to_string())
    }

    pub fn max_history_size(&self) -> usize {
        self.max_history_size
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
