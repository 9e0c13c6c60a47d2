use std::num::NonZero;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{trace, warn};

use crate::input::{InputEvent, PointerListener, PointerTracker, SwipeGesture, SwipeSettings};
use crate::rotation::{RotationModel, RotationSettings};

/// Drag and swipe handling for the cube
///
/// A new press always kills any residual spin; drags rotate directly and a quick release hands
/// its impulse over to the rotation model.
#[derive(Debug, Clone)]
pub struct CubeControls {
    swipe: SwipeGesture,
    rotation: RotationModel,
    last: (f32, f32),
    pressed: bool,
}

impl CubeControls {
    pub fn new(swipe: SwipeSettings, rotation: RotationSettings) -> CubeControls {
        CubeControls {
            swipe: SwipeGesture::new(swipe),
            rotation: RotationModel::new(rotation),
            last: (0.0, 0.0),
            pressed: false,
        }
    }

    pub fn rotation(&self) -> &RotationModel {
        &self.rotation
    }

    pub fn rotation_mut(&mut self) -> &mut RotationModel {
        &mut self.rotation
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    fn drag_to(&mut self, x: f32, y: f32) {
        let (last_x, last_y) = self.last;
        self.rotation.apply_drag(x - last_x, y - last_y);
        self.last = (x, y);
    }
}

impl PointerListener for CubeControls {
    fn on_down(&mut self, x: f32, y: f32) {
        self.pressed = true;
        self.rotation.reset_speed();
        self.last = (x, y);
        self.swipe.down(x, y);
    }

    fn on_move(&mut self, x: f32, y: f32) {
        self.drag_to(x, y);
    }

    fn on_up(&mut self, x: f32, y: f32) {
        self.pressed = false;
        self.drag_to(x, y);
        self.swipe.up(x, y, &mut self.rotation);
    }
}

/// Everything the event thread and the render loop both touch
#[derive(Debug)]
pub struct Interaction {
    tracker: PointerTracker,
    controls: CubeControls,
    resize: Option<(NonZero<u32>, NonZero<u32>)>,
    quit: bool,
}

impl Interaction {
    pub fn new(controls: CubeControls) -> Interaction {
        Interaction {
            tracker: PointerTracker::new(),
            controls,
            resize: None,
            quit: false,
        }
    }

    pub fn handle(&mut self, event: &InputEvent) {
        let was_active = self.tracker.is_active();
        self.tracker.handle(event, &mut self.controls);
        if was_active != self.tracker.is_active() {
            trace!("contact is now {:?}", self.tracker.state());
        }
    }

    pub fn controls(&self) -> &CubeControls {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut CubeControls {
        &mut self.controls
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    pub fn request_resize(&mut self, width: NonZero<u32>, height: NonZero<u32>) {
        self.resize = Some((width, height));
    }

    pub fn take_resize(&mut self) -> Option<(NonZero<u32>, NonZero<u32>)> {
        self.resize.take()
    }
}

pub type SharedInteraction = Arc<Mutex<Interaction>>;

pub fn share(interaction: Interaction) -> SharedInteraction {
    Arc::new(Mutex::new(interaction))
}

/// Locks the shared state, recovering it if a holder panicked
pub fn lock(shared: &SharedInteraction) -> MutexGuard<'_, Interaction> {
    shared.lock().unwrap_or_else(|poisoned| {
        warn!("interaction lock was poisoned, recovering");
        poisoned.into_inner()
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::input::{
        PointerAction, PointerReport, TouchAction, TouchPoint, TouchReport,
    };

    fn controls() -> CubeControls {
        CubeControls::new(SwipeSettings::default(), RotationSettings::default())
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn drag_rotates_by_deltas() {
        let mut controls = controls();
        controls.on_down(100.0, 100.0);
        controls.on_move(140.0, 100.0);
        controls.on_move(140.0, 150.0);

        let (x, y) = controls.rotation().angles();
        assert!(close(x, -0.1));
        assert!(close(y, 0.1));
        assert!(controls.is_pressed());
    }

    #[test]
    fn down_kills_residual_spin() {
        let mut controls = controls();
        controls.rotation_mut().apply_swipe_impulse(80.0, -30.0);
        controls.rotation_mut().integrate(Duration::from_millis(100));
        assert!(controls.rotation().is_spinning());

        controls.on_down(0.0, 0.0);
        assert_eq!(controls.rotation().x().angular_speed(), 0.0);
        assert_eq!(controls.rotation().y().angular_speed(), 0.0);
    }

    #[test]
    fn quick_flick_spins_the_cube() {
        let mut controls = controls();
        controls.on_down(0.0, 0.0);
        controls.on_up(200.0, 0.0);

        assert!(!controls.is_pressed());
        assert!(controls.rotation().y().angular_speed() > 0.0);
        assert_eq!(controls.rotation().x().angular_speed(), 0.0);
        assert!(close(controls.rotation().angles().1, 0.5));
    }

    #[test]
    fn tiny_tap_does_not_spin() {
        let mut controls = controls();
        controls.on_down(10.0, 10.0);
        controls.on_up(12.0, 11.0);
        assert!(!controls.rotation().is_spinning());
    }

    #[test]
    fn interaction_routes_touch_and_pointer() {
        let mut interaction = Interaction::new(controls());

        interaction.handle(&TouchReport::new(vec![TouchPoint::new(4, TouchAction::Down, 0.0, 0.0)]).into());
        assert!(interaction.controls().is_pressed());

        interaction.handle(&PointerReport::new(PointerAction::Motion, true, 999.0, 999.0).into());
        assert_eq!(interaction.controls().rotation().angles(), (0.0, 0.0));

        interaction.handle(&TouchReport::new(vec![TouchPoint::new(4, TouchAction::Change, 0.0, -50.0)]).into());
        assert!(close(interaction.controls().rotation().angles().0, 0.1));

        interaction.handle(&TouchReport::new(vec![TouchPoint::new(4, TouchAction::Up, 0.0, -50.0)]).into());
        assert!(!interaction.controls().is_pressed());
    }

    #[test]
    fn resize_and_quit_requests() {
        let shared = share(Interaction::new(controls()));
        let width = NonZero::new(640).unwrap();
        let height = NonZero::new(480).unwrap();

        lock(&shared).request_resize(width, height);
        assert_eq!(lock(&shared).take_resize(), Some((width, height)));
        assert_eq!(lock(&shared).take_resize(), None);

        assert!(!lock(&shared).quit_requested());
        lock(&shared).request_quit();
        assert!(lock(&shared).quit_requested());
    }
}
