use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use diagramkit_core::Result;
use diagramkit_editor::{Command, CommandManager, CommandScope};

struct Bump(Arc<Mutex<i32>>);

#[async_trait]
impl Command for Bump {
    async fn execute(&mut self) -> Result<()> {
        *self.0.lock().unwrap() += 1;
        Ok(())
    }

    async fn undo(&mut self) -> Result<()> {
        *self.0.lock().unwrap() -= 1;
        Ok(())
    }

    fn description(&self) -> &str {
        "Bump"
    }
}

#[tokio::test]
async fn test_scopes_are_isolated() {
    let manager = CommandManager::default();
    let one = CommandScope::new("diagram-1");
    let two = CommandScope::new("diagram-2");
    let a = Arc::new(Mutex::new(0));
    let b = Arc::new(Mutex::new(0));

    manager.execute(&one, Box::new(Bump(a.clone()))).await.unwrap();
    manager.execute(&two, Box::new(Bump(b.clone()))).await.unwrap();
    manager.execute(&two, Box::new(Bump(b.clone()))).await.unwrap();

    assert!(manager.undo(&two).await.unwrap());
    assert_eq!(*a.lock().unwrap(), 1);
    assert_eq!(*b.lock().unwrap(), 1);
    assert_eq!(manager.undo_stack_size(&one).await, 1);
    assert!(!manager.can_redo(&one).await);
    assert!(manager.can_redo(&two).await);
}

#[tokio::test]
async fn test_histories_are_created_lazily() {
    let manager = CommandManager::default();
    assert_eq!(manager.scope_count(), 0);
    assert!(!manager.can_undo(&CommandScope::global()).await);
    assert_eq!(manager.scope_count(), 0);

    let counter = Arc::new(Mutex::new(0));
    manager
        .execute(&CommandScope::global(), Box::new(Bump(counter)))
        .await
        .unwrap();
    assert_eq!(manager.scope_count(), 1);
}

#[tokio::test]
async fn test_clear_scope_and_all() {
    let manager = CommandManager::new(10);
    let counter = Arc::new(Mutex::new(0));
    for scope in ["d1", "d2", "d3"] {
        manager
            .execute(&CommandScope::from(scope), Box::new(Bump(counter.clone())))
            .await
            .unwrap();
    }

    assert!(manager.clear_scope(&CommandScope::new("d2")));
    assert!(!manager.clear_scope(&CommandScope::new("d2")));
    assert_eq!(manager.scope_count(), 2);
    assert!(!manager.can_undo(&CommandScope::new("d2")).await);

    manager.clear_all();
    assert_eq!(manager.scope_count(), 0);
    assert_eq!(manager.max_history_size(), 10);
}
