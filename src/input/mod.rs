pub mod swipe;
pub mod tracker;

pub use swipe::{SwipeGesture, SwipeListener, SwipeSettings};
pub use tracker::{PointerListener, PointerTracker};

/// Identifier the compositor assigns to a touch point for the lifetime of that contact
pub type TouchId = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchAction {
    Down,
    Change,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub id: TouchId,
    pub action: TouchAction,
    pub x: f32,
    pub y: f32,
}

impl TouchPoint {
    pub fn new(id: TouchId, action: TouchAction, x: f32, y: f32) -> TouchPoint {
        TouchPoint { id, action, x, y }
    }
}

/// All touch points reported in one frame, in the order they were received
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TouchReport {
    pub points: Vec<TouchPoint>,
}

impl TouchReport {
    pub fn new(points: Vec<TouchPoint>) -> TouchReport {
        TouchReport { points }
    }

    pub fn first_down(&self) -> Option<&TouchPoint> {
        self.points
            .iter()
            .find(|point| point.action == TouchAction::Down)
    }

    pub fn find(&self, id: TouchId) -> Option<&TouchPoint> {
        self.points.iter().find(|point| point.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    ButtonDown,
    ButtonUp,
    Motion,
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerReport {
    pub action: PointerAction,
    pub primary_pressed: bool,
    pub x: f32,
    pub y: f32,
}

impl PointerReport {
    pub fn new(action: PointerAction, primary_pressed: bool, x: f32, y: f32) -> PointerReport {
        PointerReport {
            action,
            primary_pressed,
            x,
            y,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Touch(TouchReport),
    Pointer(PointerReport),
}

impl From<TouchReport> for InputEvent {
    fn from(value: TouchReport) -> Self {
        InputEvent::Touch(value)
    }
}

impl From<PointerReport> for InputEvent {
    fn from(value: PointerReport) -> Self {
        InputEvent::Pointer(value)
    }
}
