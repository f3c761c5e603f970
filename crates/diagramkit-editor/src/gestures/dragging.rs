use std::collections::HashMap;

use diagramkit_core::{InteractionConfig, Point, ShapePatch, ShapeUpdate};
use tracing::debug;

use crate::commands::ShapeMove;
use crate::interaction::{DragData, FrameCoalescer, InteractionState, InteractionStateMachine};
use crate::local_state::LocalStateRegistry;

/// Moves the drag set in the local mirror; commits one batched move on release.
#[derive(Debug)]
pub struct DragGesture {
    snap_to_grid: bool,
    grid_size: f64,
    pending: FrameCoalescer<Vec<ShapePatch>>,
}

impl DragGesture {
    pub fn new(config: &InteractionConfig) -> Self {
        Self {
            snap_to_grid: config.snap_to_grid,
            grid_size: config.grid_size,
            pending: FrameCoalescer::new(),
        }
    }

    /// Snapshots the mirror positions of `shape_ids`. Unknown ids are skipped;
    /// returns `false` if nothing is left to drag.
    pub fn start(
        &mut self,
        machine: &mut InteractionStateMachine,
        local: &LocalStateRegistry,
        diagram_id: &str,
        canvas: Point,
        shape_ids: &[String],
    ) -> bool {
        let Some(state) = local.snapshot(diagram_id) else {
            return false;
        };
        let positions: HashMap<_, _> = shape_ids
            .iter()
            .filter_map(|id| state.shape(id).map(|s| (id.clone(), s.position())))
            .collect();
        if positions.is_empty() {
            return false;
        }

        let started = machine.start_dragging(DragData {
            start_canvas_pos: canvas,
            shapes_start_positions: positions,
            delta: Point::default(),
        });
        if started {
            self.pending.cancel();
        }
        started
    }

    /// Buffers the candidate positions for `canvas`. Returns `true` when a
    /// frame must be requested.
    pub fn update(&mut self, machine: &mut InteractionStateMachine, canvas: Point) -> bool {
        let Some(data) = machine.drag_data() else {
            return false;
        };
        let delta = canvas.delta_from(&data.start_canvas_pos);
        let patches: Vec<ShapePatch> = data
            .shapes_start_positions
            .iter()
            .map(|(id, start)| {
                let mut candidate = start.offset(delta);
                if self.snap_to_grid {
                    candidate = candidate.snapped(self.grid_size);
                }
                ShapePatch::new(id.clone(), ShapeUpdate::position(candidate))
            })
            .collect();

        machine.update_dragging(delta);
        self.pending.push(patches)
    }

    /// Writes the buffered positions into the mirror.
    pub fn flush(&mut self, local: &LocalStateRegistry, diagram_id: &str) -> usize {
        match self.pending.take() {
            Some(patches) => local.update_local_shapes(diagram_id, &patches),
            None => 0,
        }
    }

    pub fn frame_requested(&self) -> bool {
        self.pending.frame_requested()
    }

    /// Flushes and ends the drag. Yields the moves to commit, read from the
    /// final mirror positions; `None` when inactive or no shape ended up
    /// somewhere else.
    pub fn finish(
        &mut self,
        machine: &mut InteractionStateMachine,
        local: &LocalStateRegistry,
        diagram_id: &str,
    ) -> Option<Vec<ShapeMove>> {
        machine.drag_data()?;
        self.flush(local, diagram_id);
        // A zero-delta update can still snap an off-grid shape, so the
        // result is read back from the mirror rather than from the delta.
        let InteractionState::DraggingShapes(data) = machine.end() else {
            return None;
        };

        let mut moves: Vec<ShapeMove> = data
            .shapes_start_positions
            .into_iter()
            .filter_map(|(id, from)| {
                let to = local.shape(diagram_id, &id)?.position();
                (to != from).then(|| ShapeMove::new(id, from, to))
            })
            .collect();
        moves.sort_by(|a, b| a.id.cmp(&b.id));

        debug!("Drag finished with {} moved shapes", moves.len());
        (!moves.is_empty()).then_some(moves)
    }

    /// Aborts the drag and puts the mirror back where it started.
    pub fn cancel(&mut self, machine: &mut InteractionStateMachine, local: &LocalStateRegistry, diagram_id: &str) -> bool {
        let Some(data) = machine.drag_data() else {
            return false;
        };
        let restore: Vec<ShapePatch> = data
            .shapes_start_positions
            .iter()
            .map(|(id, start)| ShapePatch::new(id.clone(), ShapeUpdate::position(*start)))
            .collect();
        self.pending.cancel();
        machine.reset();
        local.update_local_shapes(diagram_id, &restore);
        true
    }

    /// Drops any buffered write without touching the mirror.
    pub fn discard_pending(&mut self) -> bool {
        self.pending.cancel()
    }
}

/// Mirror patches that undo `moves`.
pub fn revert_moves(moves: &[ShapeMove]) -> Vec<ShapePatch> {
    moves
        .iter()
        .map(|m| ShapePatch::new(m.id.clone(), ShapeUpdate::position(m.from)))
        .collect()
}
