//! Canvas event orchestrator
//!
//! Routes host pointer and keyboard events to the gesture hooks, keeps the
//! selection, schedules frame flushes, and commits finished gestures through
//! the [`DiagramStore`].

use std::sync::Arc;

use diagramkit_core::{
    ConnectionSide, Connector, InteractionConfig, Point, Result, ShapeId, Viewport, ViewportTransform,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::commands::{ShapeMove, ShapeResize};
use crate::events::{HitTarget, Key, KeyEvent, MouseButton, PointerEvent};
use crate::gestures::{
    revert_moves, revert_resizes, ConnectorGesture, ConnectorOutcome, ConnectorTarget, DragGesture,
    PanGesture, ResizeGesture, Selection, SelectionGesture, SelectionOutcome,
};
use crate::interaction::{FrameScheduler, InteractionMode, InteractionStateMachine};
use crate::store::DiagramStore;

/// What a finished interaction produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CanvasEvent {
    SelectionChanged {
        selection: Selection,
    },
    ShapesMoved {
        moves: Vec<ShapeMove>,
    },
    ShapesResized {
        resizes: Vec<ShapeResize>,
    },
    ConnectorCreated {
        connector: Connector,
    },
    /// The host should offer to create a shape at `at` and then call
    /// [`CanvasController::cancel_connector_drawing`].
    OpenConnectorMenu {
        source_shape_id: ShapeId,
        source_side: ConnectionSide,
        at: Point,
    },
    GestureCancelled {
        mode: InteractionMode,
    },
    Deleted {
        shape_ids: Vec<ShapeId>,
        connector_ids: Vec<String>,
    },
    Undone,
    Redone,
}

/// Interaction front end for one open diagram.
pub struct CanvasController<V: ViewportTransform = Viewport> {
    store: Arc<DiagramStore>,
    diagram_id: String,
    machine: InteractionStateMachine,
    viewport: V,
    scheduler: Box<dyn FrameScheduler>,
    selection: Selection,
    selecting: SelectionGesture,
    dragging: DragGesture,
    resizing: ResizeGesture,
    connecting: ConnectorGesture,
    panning: PanGesture,
    space_held: bool,
}

impl<V: ViewportTransform> CanvasController<V> {
    pub fn new(
        store: Arc<DiagramStore>,
        diagram_id: impl Into<String>,
        config: &InteractionConfig,
        viewport: V,
        scheduler: Box<dyn FrameScheduler>,
    ) -> Self {
        Self {
            store,
            diagram_id: diagram_id.into(),
            machine: InteractionStateMachine::new(),
            viewport,
            scheduler,
            selection: Selection::new(),
            selecting: SelectionGesture::new(config),
            dragging: DragGesture::new(config),
            resizing: ResizeGesture::new(config),
            connecting: ConnectorGesture::new(),
            panning: PanGesture::new(),
            space_held: false,
        }
    }

    pub fn diagram_id(&self) -> &str {
        &self.diagram_id
    }

    pub fn store(&self) -> &Arc<DiagramStore> {
        &self.store
    }

    pub fn mode(&self) -> InteractionMode {
        self.machine.mode()
    }

    pub fn machine(&self) -> &InteractionStateMachine {
        &self.machine
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    pub fn is_space_held(&self) -> bool {
        self.space_held
    }

    /// Starts a gesture for a press. Returns `true` if one started.
    pub fn on_pointer_down(&mut self, event: &PointerEvent) -> bool {
        if !self.machine.is_idle() {
            debug!("Pointer down ignored during {}", self.machine.mode());
            return false;
        }

        let screen = event.position;
        let pan = event.button == MouseButton::Middle
            || (event.button == MouseButton::Left && self.space_held);
        if pan {
            return self.panning.start(&mut self.machine, screen);
        }
        if event.button != MouseButton::Left {
            return false;
        }

        let canvas = self.viewport.screen_to_canvas(screen);
        let local = self.store.local();
        match &event.target {
            HitTarget::ResizeHandle { shape_id, handle } => {
                if !self.selection.contains_shape(shape_id) {
                    self.selection.clear();
                    self.selection.insert_shape(shape_id.clone());
                }
                let ids = self.selection.shape_ids();
                self.resizing.start(
                    &mut self.machine,
                    local,
                    &self.diagram_id,
                    *handle,
                    canvas,
                    shape_id,
                    &ids,
                    event.modifiers.shift,
                )
            }
            HitTarget::ConnectionPoint { shape_id, side } => {
                self.connecting
                    .start(&mut self.machine, local, &self.diagram_id, shape_id, *side)
            }
            HitTarget::Shape { shape_id } => {
                if event.modifiers.shift {
                    self.selection.toggle_shape(shape_id);
                } else if !self.selection.contains_shape(shape_id) {
                    self.selection.clear();
                    self.selection.insert_shape(shape_id.clone());
                }
                if !self.selection.contains_shape(shape_id) {
                    return false;
                }
                let ids = self.drag_set();
                self.dragging
                    .start(&mut self.machine, local, &self.diagram_id, canvas, &ids)
            }
            HitTarget::Connector { connector_id } => {
                if !event.modifiers.shift {
                    self.selection.clear();
                }
                self.selection.insert_connector(connector_id.clone());
                false
            }
            HitTarget::Background => self
                .selecting
                .start(&mut self.machine, screen, event.modifiers.shift),
        }
    }

    /// Selected shapes plus everything nested in them.
    fn drag_set(&self) -> Vec<ShapeId> {
        let mut ids = self.selection.shape_ids();
        if let Some(state) = self.store.local().snapshot(&self.diagram_id) {
            for id in self.selection.shape_ids() {
                for child in state.descendant_ids(&id) {
                    if !ids.contains(&child) {
                        ids.push(child);
                    }
                }
            }
        }
        ids
    }

    /// Feeds a pointer move to the active gesture. Returns `true` if it was
    /// consumed.
    pub fn on_pointer_move(&mut self, event: &PointerEvent) -> bool {
        let screen = event.position;
        let canvas = self.viewport.screen_to_canvas(screen);
        match self.machine.mode() {
            InteractionMode::Idle => false,
            InteractionMode::Panning => self.panning.update(&mut self.machine, screen, &mut self.viewport),
            InteractionMode::Selecting => self.selecting.update(&mut self.machine, screen),
            InteractionMode::DrawingConnector => self.connecting.update(&mut self.machine, canvas),
            InteractionMode::DraggingShapes => {
                if self.dragging.update(&mut self.machine, canvas) {
                    self.scheduler.request_frame();
                }
                true
            }
            InteractionMode::ResizingShapes => {
                if self
                    .resizing
                    .update(&mut self.machine, canvas, event.modifiers.shift)
                {
                    self.scheduler.request_frame();
                }
                true
            }
        }
    }

    /// Frame callback: writes the latest buffered positions to the mirror.
    pub fn on_animation_frame(&mut self) -> usize {
        let local = self.store.local();
        self.dragging.flush(local, &self.diagram_id) + self.resizing.flush(local, &self.diagram_id)
    }

    /// Ends the active gesture and commits its result.
    ///
    /// When the commit fails the mirror is put back to the gesture's start
    /// and the error is returned.
    pub async fn on_pointer_up(&mut self, event: &PointerEvent) -> Result<Option<CanvasEvent>> {
        match self.machine.mode() {
            InteractionMode::Idle => Ok(None),
            InteractionMode::Panning => {
                self.panning.finish(&mut self.machine);
                Ok(None)
            }
            InteractionMode::Selecting => Ok(self.finish_selection(event.position)),
            InteractionMode::DraggingShapes => self.finish_drag().await,
            InteractionMode::ResizingShapes => self.finish_resize().await,
            InteractionMode::DrawingConnector => {
                let canvas = self.viewport.screen_to_canvas(event.position);
                self.connecting.update(&mut self.machine, canvas);
                self.finish_connector(&event.target).await
            }
        }
    }

    fn finish_selection(&mut self, screen: Point) -> Option<CanvasEvent> {
        let state = self.store.local().snapshot(&self.diagram_id).unwrap_or_default();
        let outcome = self
            .selecting
            .finish(&mut self.machine, screen, &state, &self.viewport)?;
        match outcome {
            SelectionOutcome::Cleared => self.selection.clear(),
            SelectionOutcome::Selected { selection, additive } => {
                if additive {
                    self.selection.extend(selection);
                } else {
                    self.selection = selection;
                }
            }
        }
        Some(CanvasEvent::SelectionChanged {
            selection: self.selection.clone(),
        })
    }

    async fn finish_drag(&mut self) -> Result<Option<CanvasEvent>> {
        let outstanding = self.dragging.frame_requested();
        let moves = self
            .dragging
            .finish(&mut self.machine, self.store.local(), &self.diagram_id);
        if outstanding {
            self.scheduler.cancel_frame();
        }
        let Some(moves) = moves else {
            return Ok(None);
        };

        if let Err(err) = self.store.move_shapes(&self.diagram_id, moves.clone()).await {
            self.store
                .local()
                .update_local_shapes(&self.diagram_id, &revert_moves(&moves));
            return Err(err);
        }
        Ok(Some(CanvasEvent::ShapesMoved { moves }))
    }

    async fn finish_resize(&mut self) -> Result<Option<CanvasEvent>> {
        let outstanding = self.resizing.frame_requested();
        let resizes = self
            .resizing
            .finish(&mut self.machine, self.store.local(), &self.diagram_id);
        if outstanding {
            self.scheduler.cancel_frame();
        }
        let Some(resizes) = resizes else {
            return Ok(None);
        };

        if let Err(err) = self.store.resize_shapes(&self.diagram_id, resizes.clone()).await {
            self.store
                .local()
                .update_local_shapes(&self.diagram_id, &revert_resizes(&resizes));
            return Err(err);
        }
        Ok(Some(CanvasEvent::ShapesResized { resizes }))
    }

    async fn finish_connector(&mut self, hit: &HitTarget) -> Result<Option<CanvasEvent>> {
        let target = match hit {
            HitTarget::ConnectionPoint { shape_id, side } => ConnectorTarget::ConnectionPoint {
                shape_id: shape_id.clone(),
                side: *side,
            },
            HitTarget::Shape { shape_id } | HitTarget::ResizeHandle { shape_id, .. } => {
                ConnectorTarget::Shape {
                    shape_id: shape_id.clone(),
                }
            }
            HitTarget::Background | HitTarget::Connector { .. } => ConnectorTarget::Empty,
        };
        let is_sequence = self
            .store
            .diagram(&self.diagram_id)
            .is_some_and(|d| d.is_sequence());

        let outcome = self.connecting.finish(
            &mut self.machine,
            &target,
            self.store.local(),
            &self.diagram_id,
            is_sequence,
        );
        match outcome {
            ConnectorOutcome::Create(new) => {
                let connector = self.store.add_connector(&self.diagram_id, new).await?;
                Ok(Some(CanvasEvent::ConnectorCreated { connector }))
            }
            ConnectorOutcome::OpenCreationMenu {
                source_shape_id,
                source_side,
                at,
            } => Ok(Some(CanvasEvent::OpenConnectorMenu {
                source_shape_id,
                source_side,
                at,
            })),
            ConnectorOutcome::Cancelled | ConnectorOutcome::Inactive => Ok(None),
        }
    }

    pub async fn on_key_down(&mut self, event: &KeyEvent) -> Result<Option<CanvasEvent>> {
        let command = event.modifiers.command();
        match event.key {
            Key::Escape => {
                let mode = self.machine.mode();
                if self.cancel_active() {
                    return Ok(Some(CanvasEvent::GestureCancelled { mode }));
                }
                if self.selection.is_empty() {
                    return Ok(None);
                }
                self.selection.clear();
                Ok(Some(CanvasEvent::SelectionChanged {
                    selection: self.selection.clone(),
                }))
            }
            Key::Delete | Key::Backspace => self.delete_selection().await,
            Key::Z if command && event.modifiers.shift => self.redo().await,
            Key::Z if command => self.undo().await,
            Key::Y if command => self.redo().await,
            Key::Space => {
                self.space_held = true;
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    pub fn on_key_up(&mut self, event: &KeyEvent) {
        if event.key == Key::Space {
            self.space_held = false;
        }
    }

    /// Window lost focus: abandon the gesture without committing anything.
    pub fn on_blur(&mut self) -> bool {
        self.space_held = false;
        self.cancel_active()
    }

    async fn delete_selection(&mut self) -> Result<Option<CanvasEvent>> {
        if !self.machine.is_idle() || self.selection.is_empty() {
            return Ok(None);
        }
        let shape_ids = self.selection.shape_ids();
        let connector_ids = self.selection.connector_ids();
        self.store
            .delete_shapes(&self.diagram_id, shape_ids.clone(), connector_ids.clone())
            .await?;
        self.selection.clear();
        Ok(Some(CanvasEvent::Deleted {
            shape_ids,
            connector_ids,
        }))
    }

    async fn undo(&mut self) -> Result<Option<CanvasEvent>> {
        if !self.machine.is_idle() {
            warn!("Undo ignored during {}", self.machine.mode());
            return Ok(None);
        }
        let undone = self.store.undo(&self.diagram_id).await?;
        self.prune_selection();
        Ok(undone.then_some(CanvasEvent::Undone))
    }

    async fn redo(&mut self) -> Result<Option<CanvasEvent>> {
        if !self.machine.is_idle() {
            warn!("Redo ignored during {}", self.machine.mode());
            return Ok(None);
        }
        let redone = self.store.redo(&self.diagram_id).await?;
        self.prune_selection();
        Ok(redone.then_some(CanvasEvent::Redone))
    }

    fn prune_selection(&mut self) {
        if let Some(state) = self.store.local().snapshot(&self.diagram_id) {
            self.selection.retain_existing(&state);
        }
    }

    /// Cancels whatever gesture is active. Drag and resize restore the mirror.
    pub fn cancel_active(&mut self) -> bool {
        let local = self.store.local();
        let (cancelled, outstanding) = match self.machine.mode() {
            InteractionMode::Idle => (false, false),
            InteractionMode::Panning => (self.panning.finish(&mut self.machine), false),
            InteractionMode::Selecting => (self.selecting.cancel(&mut self.machine), false),
            InteractionMode::DrawingConnector => (self.connecting.cancel(&mut self.machine), false),
            InteractionMode::DraggingShapes => {
                let outstanding = self.dragging.frame_requested();
                (
                    self.dragging.cancel(&mut self.machine, local, &self.diagram_id),
                    outstanding,
                )
            }
            InteractionMode::ResizingShapes => {
                let outstanding = self.resizing.frame_requested();
                (
                    self.resizing.cancel(&mut self.machine, local, &self.diagram_id),
                    outstanding,
                )
            }
        };
        if outstanding {
            self.scheduler.cancel_frame();
        }
        if cancelled {
            debug!("Cancelled active gesture on {}", self.diagram_id);
        }
        cancelled
    }

    /// Ends a pending connector drawing, e.g. after the creation menu closed.
    pub fn cancel_connector_drawing(&mut self) -> bool {
        self.connecting.cancel(&mut self.machine)
    }

    /// Drops every in-flight gesture and pending frame write.
    pub fn teardown(&mut self) {
        self.cancel_active();
        let dropped = self.dragging.discard_pending() | self.resizing.discard_pending();
        if dropped {
            self.scheduler.cancel_frame();
        }
        self.machine.reset();
        self.space_held = false;
    }
}
