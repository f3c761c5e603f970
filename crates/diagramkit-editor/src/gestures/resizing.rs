use std::collections::HashMap;

use diagramkit_core::{Bounds, InteractionConfig, Point, ShapePatch, ShapeUpdate};
use tracing::debug;

use crate::commands::ShapeResize;
use crate::interaction::{
    Axis, FrameCoalescer, InteractionState, InteractionStateMachine, ResizeData, ResizeHandle,
};
use crate::local_state::LocalStateRegistry;

/// Limits applied to one shape during a resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeConstraints {
    pub min_size: f64,
    /// width / height to hold on corner handles
    pub aspect_ratio: Option<f64>,
    pub dominant_axis: Axis,
    /// The result must contain this box
    pub children: Option<Bounds>,
}

/// New bounds for `original` dragged by `delta` on `handle`.
///
/// The edges opposite the handle stay fixed. Minimum size applies first, then
/// the aspect ratio (corner handles only, driven by the dominant axis), then
/// the children box, which may override the ratio.
pub fn compute_bounds(original: &Bounds, handle: ResizeHandle, delta: Point, constraints: &ResizeConstraints) -> Bounds {
    let min = constraints.min_size.max(0.0);
    let horizontal = handle.moves_left() || handle.moves_right();
    let vertical = handle.moves_top() || handle.moves_bottom();

    let mut width = original.width;
    let mut height = original.height;
    if handle.moves_left() {
        width -= delta.x;
    } else if handle.moves_right() {
        width += delta.x;
    }
    if handle.moves_top() {
        height -= delta.y;
    } else if handle.moves_bottom() {
        height += delta.y;
    }
    if horizontal {
        width = width.max(min);
    }
    if vertical {
        height = height.max(min);
    }

    let ratio = constraints
        .aspect_ratio
        .filter(|r| handle.is_corner() && r.is_finite() && *r > 0.0);
    if let Some(ratio) = ratio {
        match constraints.dominant_axis {
            Axis::Horizontal => {
                height = width / ratio;
                if height < min {
                    height = min;
                    width = min * ratio;
                }
            }
            Axis::Vertical => {
                width = height * ratio;
                if width < min {
                    width = min;
                    height = min / ratio;
                }
            }
        }
    }

    let (mut left, mut right) = if handle.moves_left() {
        (original.max_x() - width, original.max_x())
    } else {
        (original.min_x(), original.min_x() + width)
    };
    let (mut top, mut bottom) = if handle.moves_top() {
        (original.max_y() - height, original.max_y())
    } else {
        (original.min_y(), original.min_y() + height)
    };

    if let Some(children) = constraints.children {
        if handle.moves_left() {
            left = left.min(children.min_x());
        }
        if handle.moves_right() {
            right = right.max(children.max_x());
        }
        if handle.moves_top() {
            top = top.min(children.min_y());
        }
        if handle.moves_bottom() {
            bottom = bottom.max(children.max_y());
        }
    }

    Bounds::from_edges(left, top, right, bottom)
}

#[derive(Debug)]
pub struct ResizeGesture {
    min_shape_size: f64,
    pending: FrameCoalescer<Vec<ShapePatch>>,
}

impl ResizeGesture {
    pub fn new(config: &InteractionConfig) -> Self {
        Self {
            min_shape_size: config.min_shape_size,
            pending: FrameCoalescer::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn start(
        &mut self,
        machine: &mut InteractionStateMachine,
        local: &LocalStateRegistry,
        diagram_id: &str,
        handle: ResizeHandle,
        canvas: Point,
        primary_shape_id: &str,
        shape_ids: &[String],
        keep_aspect_ratio: bool,
    ) -> bool {
        let Some(state) = local.snapshot(diagram_id) else {
            return false;
        };
        let Some(primary) = state.shape(primary_shape_id) else {
            return false;
        };
        let dominant_axis = if primary.width >= primary.height {
            Axis::Horizontal
        } else {
            Axis::Vertical
        };

        let mut originals = HashMap::new();
        let mut aspect_ratios = HashMap::new();
        let mut children_bounds = HashMap::new();
        let ids = std::iter::once(primary_shape_id).chain(shape_ids.iter().map(String::as_str));
        for id in ids {
            let Some(shape) = state.shape(id) else {
                continue;
            };
            originals.insert(id.to_string(), shape.bounds());
            if shape.height > 0.0 {
                aspect_ratios.insert(id.to_string(), shape.width / shape.height);
            }
            let children = state
                .descendant_ids(id)
                .iter()
                .filter_map(|child| state.shape(child).map(|s| s.bounds()))
                .collect::<Vec<_>>();
            if let Some(union) = Bounds::union_all(children) {
                children_bounds.insert(id.to_string(), union);
            }
        }

        let started = machine.start_resizing(ResizeData {
            handle,
            start_canvas_pos: canvas,
            primary_shape_id: primary_shape_id.to_string(),
            shapes_original_bounds: originals,
            aspect_ratios,
            children_bounds,
            delta: Point::default(),
            dominant_axis,
            keep_aspect_ratio,
        });
        if started {
            self.pending.cancel();
        }
        started
    }

    /// Buffers new bounds for every shape. Returns `true` when a frame must be
    /// requested.
    pub fn update(&mut self, machine: &mut InteractionStateMachine, canvas: Point, keep_aspect_ratio: bool) -> bool {
        let Some(data) = machine.resize_data() else {
            return false;
        };
        let delta = canvas.delta_from(&data.start_canvas_pos);
        let patches: Vec<ShapePatch> = data
            .shapes_original_bounds
            .iter()
            .map(|(id, original)| {
                let constraints = ResizeConstraints {
                    min_size: self.min_shape_size,
                    aspect_ratio: if keep_aspect_ratio {
                        data.aspect_ratios.get(id).copied()
                    } else {
                        None
                    },
                    dominant_axis: data.dominant_axis,
                    children: data.children_bounds.get(id).copied(),
                };
                let bounds = compute_bounds(original, data.handle, delta, &constraints);
                ShapePatch::new(id.clone(), ShapeUpdate::bounds(bounds))
            })
            .collect();

        machine.update_resizing(delta, keep_aspect_ratio);
        self.pending.push(patches)
    }

    pub fn flush(&mut self, local: &LocalStateRegistry, diagram_id: &str) -> usize {
        match self.pending.take() {
            Some(patches) => local.update_local_shapes(diagram_id, &patches),
            None => 0,
        }
    }

    pub fn frame_requested(&self) -> bool {
        self.pending.frame_requested()
    }

    /// Flushes and ends the resize, yielding the changed bounds to commit.
    pub fn finish(
        &mut self,
        machine: &mut InteractionStateMachine,
        local: &LocalStateRegistry,
        diagram_id: &str,
    ) -> Option<Vec<ShapeResize>> {
        machine.resize_data()?;
        self.flush(local, diagram_id);
        let InteractionState::ResizingShapes(data) = machine.end() else {
            return None;
        };

        let mut resizes: Vec<ShapeResize> = data
            .shapes_original_bounds
            .into_iter()
            .filter_map(|(id, from)| {
                let to = local.shape(diagram_id, &id)?.bounds();
                (to != from).then(|| ShapeResize::new(id, from, to))
            })
            .collect();
        resizes.sort_by(|a, b| a.id.cmp(&b.id));

        debug!("Resize finished with {} changed shapes", resizes.len());
        (!resizes.is_empty()).then_some(resizes)
    }

    pub fn cancel(&mut self, machine: &mut InteractionStateMachine, local: &LocalStateRegistry, diagram_id: &str) -> bool {
        let Some(data) = machine.resize_data() else {
            return false;
        };
        let restore: Vec<ShapePatch> = data
            .shapes_original_bounds
            .iter()
            .map(|(id, bounds)| ShapePatch::new(id.clone(), ShapeUpdate::bounds(*bounds)))
            .collect();
        self.pending.cancel();
        machine.reset();
        local.update_local_shapes(diagram_id, &restore);
        true
    }

    pub fn discard_pending(&mut self) -> bool {
        self.pending.cancel()
    }
}

/// Mirror patches that undo `resizes`.
pub fn revert_resizes(resizes: &[ShapeResize]) -> Vec<ShapePatch> {
    resizes
        .iter()
        .map(|r| ShapePatch::new(r.id.clone(), ShapeUpdate::bounds(r.from)))
        .collect()
}
