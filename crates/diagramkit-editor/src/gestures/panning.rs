use diagramkit_core::{Point, ViewportTransform};

use crate::interaction::InteractionStateMachine;

#[derive(Debug, Default, Clone)]
pub struct PanGesture;

impl PanGesture {
    pub fn new() -> Self {
        Self
    }

    pub fn start(&self, machine: &mut InteractionStateMachine, screen: Point) -> bool {
        machine.start_panning(screen)
    }

    /// Pans the viewport by the screen distance since the last update.
    pub fn update(&self, machine: &mut InteractionStateMachine, screen: Point, viewport: &mut dyn ViewportTransform) -> bool {
        let Some(data) = machine.pan_data() else {
            return false;
        };
        let delta = screen.delta_from(&data.last_screen);
        viewport.pan_by(delta.x, delta.y);
        machine.update_panning(screen)
    }

    pub fn finish(&self, machine: &mut InteractionStateMachine) -> bool {
        if machine.pan_data().is_none() {
            return false;
        }
        machine.reset();
        true
    }
}
