use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use diagramkit_core::Result;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::debug;

use super::{BoxedCommand, CommandHistory};

/// Key of an independent undo history; usually a diagram id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandScope(String);

impl CommandScope {
    pub const GLOBAL: &'static str = "global";

    pub fn new(scope: impl Into<String>) -> Self {
        Self(scope.into())
    }

    pub fn global() -> Self {
        Self(Self::GLOBAL.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommandScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommandScope {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CommandScope {
    fn from(value: String) -> Self {
        Self(value)
    }
}

type SharedHistory = Arc<Mutex<CommandHistory>>;

/// Routes commands to per-scope histories.
///
/// Each history sits behind an async mutex, so commands of one scope run one
/// after another while different scopes never wait on each other.
pub struct CommandManager {
    histories: RwLock<HashMap<CommandScope, SharedHistory>>,
    max_history_size: usize,
}

impl Default for CommandManager {
    fn default() -> Self {
        Self::new(50)
    }
}

impl CommandManager {
    pub fn new(max_history_size: usize) -> Self {
        Self {
            histories: RwLock::new(HashMap::new()),
            max_history_size,
        }
    }

    fn history(&self, scope: &CommandScope) -> SharedHistory {
        if let Some(history) = self.histories.read().get(scope) {
            return Arc::clone(history);
        }
        let mut histories = self.histories.write();
        Arc::clone(histories.entry(scope.clone()).or_insert_with(|| {
            debug!("Creating command history for scope {}", scope);
            Arc::new(Mutex::new(CommandHistory::new(self.max_history_size)))
        }))
    }

    fn existing(&self, scope: &CommandScope) -> Option<SharedHistory> {
        self.histories.read().get(scope).cloned()
    }

    pub async fn execute(&self, scope: &CommandScope, cmd: BoxedCommand) -> Result<()> {
        let history = self.history(scope);
        let mut history = history.lock().await;
        history.execute(cmd).await
    }

    pub async fn undo(&self, scope: &CommandScope) -> Result<bool> {
        let history = self.history(scope);
        let mut history = history.lock().await;
        history.undo().await
    }

    pub async fn redo(&self, scope: &CommandScope) -> Result<bool> {
        let history = self.history(scope);
        let mut history = history.lock().await;
        history.redo().await
    }

    pub async fn can_undo(&self, scope: &CommandScope) -> bool {
        match self.existing(scope) {
            Some(history) => history.lock().await.can_undo(),
            None => false,
        }
    }

    pub async fn can_redo(&self, scope: &CommandScope) -> bool {
        match self.existing(scope) {
            Some(history) => history.lock().await.can_redo(),
            None => false,
        }
    }

    pub async fn undo_stack_size(&self, scope: &CommandScope) -> usize {
        match self.existing(scope) {
            Some(history) => history.lock().await.undo_stack_size(),
            None => 0,
        }
    }

    pub async fn redo_stack_size(&self, scope: &CommandScope) -> usize {
        match self.existing(scope) {
            Some(history) => history.lock().await.redo_stack_size(),
            None => 0,
        }
    }

    pub async fn undo_description(&self, scope: &CommandScope) -> Option<String> {
        self.existing(scope)?.lock().await.undo_description()
    }

    pub async fn redo_description(&self, scope: &CommandScope) -> Option<String> {
        self.existing(scope)?.lock().await.redo_description()
    }

    /// Disposes one scope's history.
    pub fn clear_scope(&self, scope: &CommandScope) -> bool {
        self.histories.write().remove(scope).is_some()
    }

    pub fn clear_all(&self) {
        self.histories.write().clear();
    }

    pub fn scope_count(&self) -> usize {
        self.histories.read().len()
    }

    pub fn max_history_size(&self) -> usize {
        self.max_history_size
    }
}
