use log::{debug, trace};

use super::{InputEvent, PointerAction, PointerReport, TouchAction, TouchId, TouchReport};

/// Receiver of the semantic contact transitions produced by [`PointerTracker`]
pub trait PointerListener {
    fn on_down(&mut self, x: f32, y: f32);
    fn on_move(&mut self, x: f32, y: f32);
    fn on_up(&mut self, x: f32, y: f32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContactState {
    #[default]
    Idle,
    TouchActive {
        id: TouchId,
    },
    PointerActive,
}

/// Follows a single contact across touch and pointer reports
///
/// Touch and pointer input share the same state, so whichever source leaves `Idle` first owns the
/// gesture until its release. Extra fingers are ignored while a contact is tracked.
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    state: ContactState,
}

impl PointerTracker {
    pub fn new() -> PointerTracker {
        PointerTracker::default()
    }

    pub fn state(&self) -> ContactState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, ContactState::Idle)
    }

    pub fn handle<L: PointerListener + ?Sized>(&mut self, event: &InputEvent, listener: &mut L) {
        match event {
            InputEvent::Touch(report) => self.handle_touch(report, listener),
            InputEvent::Pointer(report) => self.handle_pointer(report, listener),
        }
    }

    fn handle_touch<L: PointerListener + ?Sized>(&mut self, report: &TouchReport, listener: &mut L) {
        match self.state {
            ContactState::Idle => {
                if let Some(point) = report.first_down() {
                    debug!("touch #{} down at ({}, {})", point.id, point.x, point.y);
                    self.state = ContactState::TouchActive { id: point.id };
                    listener.on_down(point.x, point.y);
                }
            }
            ContactState::TouchActive { id } => {
                let Some(point) = report.find(id) else {
                    trace!("touch report without tracked contact #{id}");
                    return;
                };
                match point.action {
                    TouchAction::Change => listener.on_move(point.x, point.y),
                    TouchAction::Up => {
                        debug!("touch #{id} up at ({}, {})", point.x, point.y);
                        self.state = ContactState::Idle;
                        listener.on_up(point.x, point.y);
                    }
                    TouchAction::Down => trace!("repeated down for touch #{id}"),
                }
            }
            ContactState::PointerActive => trace!("touch ignored while the pointer is pressed"),
        }
    }

    fn handle_pointer<L: PointerListener + ?Sized>(
        &mut self,
        report: &PointerReport,
        listener: &mut L,
    ) {
        match self.state {
            ContactState::Idle => {
                if report.action == PointerAction::ButtonDown && report.primary_pressed {
                    debug!("pointer down at ({}, {})", report.x, report.y);
                    self.state = ContactState::PointerActive;
                    listener.on_down(report.x, report.y);
                }
            }
            ContactState::PointerActive => match report.action {
                PointerAction::Motion => listener.on_move(report.x, report.y),
                PointerAction::ButtonUp if !report.primary_pressed => {
                    debug!("pointer up at ({}, {})", report.x, report.y);
                    self.state = ContactState::Idle;
                    listener.on_up(report.x, report.y);
                }
                PointerAction::Leave => {
                    debug!("pointer left the surface at ({}, {})", report.x, report.y);
                    self.state = ContactState::Idle;
                    listener.on_up(report.x, report.y);
                }
                _ => {}
            },
            ContactState::TouchActive { .. } => trace!("pointer ignored while a touch is active"),
        }
    }
}
