//! Session replay
//!
//! A session is an initial diagram plus the host events recorded against it.
//! Replaying drives a [`CanvasController`] over an [`InMemoryDiagramApi`] and
//! reports where the diagram ended up.

use std::path::Path;
use std::sync::Arc;

use diagramkit_core::{Diagram, EditorConfig, InMemoryDiagramApi, Result, Viewport};
use diagramkit_editor::{
    CanvasController, CanvasEvent, CommandScope, DiagramStore, KeyEvent, ManualFrameScheduler,
    PointerEvent,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SessionEvent {
    PointerDown(PointerEvent),
    PointerMove(PointerEvent),
    PointerUp(PointerEvent),
    KeyDown(KeyEvent),
    KeyUp(KeyEvent),
    /// Animation frame tick
    Frame,
    Blur,
    /// The host closed the connector creation menu.
    CloseMenu,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub diagram: Diagram,
    #[serde(default)]
    pub events: Vec<SessionEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub diagram: Option<Diagram>,
    pub events: Vec<CanvasEvent>,
    pub undo_depth: usize,
    pub redo_depth: usize,
    pub last_error: Option<String>,
    pub frames_requested: usize,
}

/// Reads a session from a JSON file.
pub fn load_session(path: &Path) -> anyhow::Result<Session> {
    let content = std::fs::read_to_string(path)?;
    let session = serde_json::from_str(&content)?;
    Ok(session)
}

/// Replays every event of `session` in order.
///
/// A failed commit does not stop the replay; it shows up as `last_error`.
pub async fn replay(session: Session, config: &EditorConfig) -> Result<ReplayReport> {
    let diagram_id = session.diagram.id.clone();
    let api = Arc::new(InMemoryDiagramApi::with_diagrams([session.diagram]));
    let store = Arc::new(DiagramStore::new(api, config));
    store.open_diagram(&diagram_id).await?;

    let scheduler = ManualFrameScheduler::new();
    let mut canvas = CanvasController::new(
        Arc::clone(&store),
        diagram_id.as_str(),
        &config.interaction,
        Viewport::new(),
        Box::new(scheduler.clone()),
    );

    info!("Replaying {} events on {}", session.events.len(), diagram_id);
    let mut events = Vec::new();
    for event in &session.events {
        let outcome = match event {
            SessionEvent::PointerDown(e) => {
                canvas.on_pointer_down(e);
                Ok(None)
            }
            SessionEvent::PointerMove(e) => {
                canvas.on_pointer_move(e);
                Ok(None)
            }
            SessionEvent::PointerUp(e) => canvas.on_pointer_up(e).await,
            SessionEvent::KeyDown(e) => canvas.on_key_down(e).await,
            SessionEvent::KeyUp(e) => {
                canvas.on_key_up(e);
                Ok(None)
            }
            SessionEvent::Frame => {
                let flushed = canvas.on_animation_frame();
                scheduler.frame_delivered();
                debug!("Frame flushed {} shapes", flushed);
                Ok(None)
            }
            SessionEvent::Blur => {
                canvas.on_blur();
                Ok(None)
            }
            SessionEvent::CloseMenu => {
                canvas.cancel_connector_drawing();
                Ok(None)
            }
        };
        match outcome {
            Ok(Some(produced)) => events.push(produced),
            Ok(None) => {}
            Err(err) => warn!("Replay step failed: {}", err),
        }
    }
    canvas.teardown();

    let scope = CommandScope::new(diagram_id.as_str());
    Ok(ReplayReport {
        diagram: store.diagram(&diagram_id),
        events,
        undo_depth: store.commands().undo_stack_size(&scope).await,
        redo_depth: store.commands().redo_stack_size(&scope).await,
        last_error: store.error(&diagram_id).map(|e| e.to_string()),
        frames_requested: scheduler.requested(),
    })
}
