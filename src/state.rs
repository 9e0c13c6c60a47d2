use std::collections::HashMap;

use log::{debug, info, trace};
use wayland_client::{
    self, Connection, Dispatch, DispatchError, EventQueue, QueueHandle, WEnum, delegate_noop,
    protocol::{
        wl_compositor::WlCompositor,
        wl_keyboard::{self, KeyState, WlKeyboard},
        wl_output::{self, WlOutput},
        wl_pointer::{self, ButtonState, WlPointer},
        wl_registry::{self, WlRegistry},
        wl_seat::{self, Capability, WlSeat},
        wl_surface::WlSurface,
        wl_touch::{self, WlTouch},
    },
};
use wayland_protocols::xdg::shell::client::xdg_wm_base::XdgWmBase;
use wayland_protocols_wlr::layer_shell::v1::client::zwlr_layer_shell_v1::ZwlrLayerShellV1;

use crate::controls::{self, SharedInteraction};
use crate::input::{
    InputEvent, PointerAction, PointerReport, TouchAction, TouchId, TouchPoint, TouchReport,
};
use crate::surface::Surface;

/// Linux evdev codes
const BTN_LEFT: u32 = 0x110;
const KEY_ESC: u32 = 1;
const KEY_Q: u32 = 16;

#[derive(Debug, Clone, Default)]
pub struct Protocols {
    pub compositor: Option<WlCompositor>,
    pub wm_base: Option<XdgWmBase>,
    pub layer: Option<ZwlrLayerShellV1>,
    pub seat: Option<WlSeat>,
}

#[derive(Debug, Clone)]
pub struct OutputInfo {
    pub output: WlOutput,
    pub name: Option<String>,
    pub description: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    /// Current mode as (width, height, refresh in mHz)
    pub mode: Option<(i32, i32, i32)>,
}

impl OutputInfo {
    fn new(output: WlOutput) -> OutputInfo {
        OutputInfo {
            output,
            name: None,
            description: None,
            make: None,
            model: None,
            mode: None,
        }
    }

    pub fn label(&self) -> String {
        let name = self.name.as_deref().unwrap_or("unnamed");
        let what = match (&self.description, &self.make, &self.model) {
            (Some(description), _, _) => description.clone(),
            (None, Some(make), Some(model)) => format!("{make} {model}"),
            _ => "unknown".to_owned(),
        };
        match self.mode {
            Some((width, height, refresh)) => format!(
                "{name}: {what} {width}\u{00d7}{height}@{:.2}Hz",
                refresh as f32 / 1000.0
            ),
            None => format!("{name}: {what} [mode N/A]"),
        }
    }
}

/// Turns per-event touch and pointer callbacks into reports for the tracker
#[derive(Debug, Default)]
pub struct SeatInput {
    pointer: Option<WlPointer>,
    touch: Option<WlTouch>,
    keyboard: Option<WlKeyboard>,
    pointer_position: (f32, f32),
    primary_pressed: bool,
    touch_positions: HashMap<TouchId, (f32, f32)>,
    pending_touch: Vec<TouchPoint>,
    /// Reports split off the pending one, oldest first
    ready_touch: Vec<TouchReport>,
}

impl SeatInput {
    pub fn pointer_enter(&mut self, x: f64, y: f64) {
        self.pointer_position = (x as f32, y as f32);
    }

    pub fn pointer_motion(&mut self, x: f64, y: f64) -> InputEvent {
        self.pointer_position = (x as f32, y as f32);
        self.pointer_report(PointerAction::Motion)
    }

    pub fn pointer_button(&mut self, button: u32, pressed: bool) -> InputEvent {
        if button == BTN_LEFT {
            self.primary_pressed = pressed;
        }
        match pressed {
            true => self.pointer_report(PointerAction::ButtonDown),
            false => self.pointer_report(PointerAction::ButtonUp),
        }
    }

    pub fn pointer_leave(&mut self) -> InputEvent {
        self.primary_pressed = false;
        self.pointer_report(PointerAction::Leave)
    }

    fn pointer_report(&self, action: PointerAction) -> InputEvent {
        let (x, y) = self.pointer_position;
        PointerReport::new(action, self.primary_pressed, x, y).into()
    }

    pub fn touch_down(&mut self, id: TouchId, x: f64, y: f64) {
        let position = (x as f32, y as f32);
        self.touch_positions.insert(id, position);
        self.queue_touch(id, TouchAction::Down, position);
    }

    pub fn touch_motion(&mut self, id: TouchId, x: f64, y: f64) {
        let position = (x as f32, y as f32);
        self.touch_positions.insert(id, position);
        self.queue_touch(id, TouchAction::Change, position);
    }

    /// Up carries no coordinates, so the last known position is reported
    pub fn touch_up(&mut self, id: TouchId) {
        let position = self.touch_positions.remove(&id).unwrap_or_default();
        self.queue_touch(id, TouchAction::Up, position);
    }

    /// Drops whatever the frame collected and releases every known contact
    pub fn touch_cancel(&mut self) -> Vec<InputEvent> {
        self.pending_touch.clear();
        self.ready_touch.clear();
        let ids: Vec<TouchId> = self.touch_positions.keys().copied().collect();
        for id in ids {
            self.touch_up(id);
        }
        self.touch_frame()
    }

    /// Every report collected since the previous frame, oldest first
    pub fn touch_frame(&mut self) -> Vec<InputEvent> {
        self.flush_pending_touch();
        std::mem::take(&mut self.ready_touch)
            .into_iter()
            .map(InputEvent::from)
            .collect()
    }

    fn flush_pending_touch(&mut self) {
        if !self.pending_touch.is_empty() {
            let points = std::mem::take(&mut self.pending_touch);
            self.ready_touch.push(TouchReport::new(points));
        }
    }

    /// A report holds at most one entry per id
    fn queue_touch(&mut self, id: TouchId, action: TouchAction, (x, y): (f32, f32)) {
        if let Some(index) = self.pending_touch.iter().position(|p| p.id == id) {
            let existing = &mut self.pending_touch[index];
            if action == TouchAction::Change && existing.action == TouchAction::Change {
                existing.x = x;
                existing.y = y;
                return;
            }
            // down, motion and up of one frame go out in that order
            self.flush_pending_touch();
        }
        self.pending_touch.push(TouchPoint::new(id, action, x, y));
    }
}

pub struct WaylandState {
    pub protocols: Protocols,
    pub outputs: Vec<OutputInfo>,
    pub seat_input: SeatInput,
    pub surface: Option<Surface>,
    pub interaction: SharedInteraction,
}

impl WaylandState {
    pub fn new(interaction: SharedInteraction) -> WaylandState {
        WaylandState {
            protocols: Protocols::default(),
            outputs: Vec::new(),
            seat_input: SeatInput::default(),
            surface: None,
            interaction,
        }
    }

    pub fn handle_events(
        &mut self,
        event_queue: &mut EventQueue<Self>,
    ) -> Result<usize, DispatchError> {
        event_queue.blocking_dispatch(self)
    }

    /// First output that reported a mode, for the fullscreen request
    pub fn preferred_output(&self) -> Option<&OutputInfo> {
        self.outputs.iter().find(|info| info.mode.is_some())
    }

    pub fn log_outputs(&self) {
        info!("there are {} outputs available:", self.outputs.len());
        for output in &self.outputs {
            info!("  {}", output.label());
        }
    }

    fn feed(&mut self, event: InputEvent) {
        trace!("input {event:?}");
        controls::lock(&self.interaction).handle(&event);
    }
}

impl Dispatch<WlRegistry, ()> for WaylandState {
    fn event(
        state: &mut Self,
        proxy: &WlRegistry,
        event: wl_registry::Event,
        _data: &(),
        _conn: &Connection,
        qhandle: &QueueHandle<Self>,
    ) {
        if let wl_registry::Event::Global {
            name,
            interface,
            version,
        } = event
        {
            match interface.as_str() {
                "wl_compositor" => {
                    state.protocols.compositor =
                        Some(proxy.bind::<WlCompositor, _, _>(name, version.min(4), qhandle, ()));
                }
                "xdg_wm_base" => {
                    state.protocols.wm_base =
                        Some(proxy.bind::<XdgWmBase, _, _>(name, version.min(3), qhandle, ()));
                }
                "zwlr_layer_shell_v1" => {
                    state.protocols.layer = Some(proxy.bind::<ZwlrLayerShellV1, _, _>(
                        name,
                        version.min(4),
                        qhandle,
                        (),
                    ));
                }
                "wl_seat" if state.protocols.seat.is_none() => {
                    state.protocols.seat =
                        Some(proxy.bind::<WlSeat, _, _>(name, version.min(5), qhandle, ()));
                }
                "wl_output" => {
                    let output = proxy.bind::<WlOutput, _, _>(name, version.min(4), qhandle, ());
                    state.outputs.push(OutputInfo::new(output));
                }
                _ => trace!("ignoring global {interface} v{version}"),
            }
        }
    }
}

impl Dispatch<WlOutput, ()> for WaylandState {
    fn event(
        state: &mut Self,
        proxy: &WlOutput,
        event: wl_output::Event,
        _data: &(),
        _conn: &Connection,
        _qhandle: &QueueHandle<Self>,
    ) {
        let Some(info) = state.outputs.iter_mut().find(|info| &info.output == proxy) else {
            return;
        };
        match event {
            wl_output::Event::Geometry { make, model, .. } => {
                info.make = Some(make);
                info.model = Some(model);
            }
            wl_output::Event::Mode {
                flags,
                width,
                height,
                refresh,
            } => {
                if let WEnum::Value(flags) = flags
                    && flags.contains(wl_output::Mode::Current)
                {
                    info.mode = Some((width, height, refresh));
                }
            }
            wl_output::Event::Name { name } => info.name = Some(name),
            wl_output::Event::Description { description } => info.description = Some(description),
            _ => {}
        }
    }
}

impl Dispatch<WlSeat, ()> for WaylandState {
    fn event(
        state: &mut Self,
        seat: &WlSeat,
        event: wl_seat::Event,
        _data: &(),
        _conn: &Connection,
        qhandle: &QueueHandle<Self>,
    ) {
        let wl_seat::Event::Capabilities {
            capabilities: WEnum::Value(capabilities),
        } = event
        else {
            return;
        };
        let input = &mut state.seat_input;

        if capabilities.contains(Capability::Pointer) && input.pointer.is_none() {
            debug!("seat has a pointer");
            input.pointer = Some(seat.get_pointer(qhandle, ()));
        }
        if capabilities.contains(Capability::Touch) && input.touch.is_none() {
            debug!("seat has a touchscreen");
            input.touch = Some(seat.get_touch(qhandle, ()));
        }
        if capabilities.contains(Capability::Keyboard) && input.keyboard.is_none() {
            debug!("seat has a keyboard");
            input.keyboard = Some(seat.get_keyboard(qhandle, ()));
        }
    }
}

impl Dispatch<WlPointer, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _proxy: &WlPointer,
        event: wl_pointer::Event,
        _data: &(),
        _conn: &Connection,
        _qhandle: &QueueHandle<Self>,
    ) {
        let input = match event {
            wl_pointer::Event::Enter {
                surface_x,
                surface_y,
                ..
            } => {
                state.seat_input.pointer_enter(surface_x, surface_y);
                None
            }
            wl_pointer::Event::Motion {
                surface_x,
                surface_y,
                ..
            } => Some(state.seat_input.pointer_motion(surface_x, surface_y)),
            wl_pointer::Event::Button {
                button,
                state: WEnum::Value(button_state),
                ..
            } => Some(
                state
                    .seat_input
                    .pointer_button(button, button_state == ButtonState::Pressed),
            ),
            wl_pointer::Event::Leave { .. } => Some(state.seat_input.pointer_leave()),
            _ => None,
        };
        if let Some(input) = input {
            state.feed(input);
        }
    }
}

impl Dispatch<WlTouch, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _proxy: &WlTouch,
        event: wl_touch::Event,
        _data: &(),
        _conn: &Connection,
        _qhandle: &QueueHandle<Self>,
    ) {
        let reports = match event {
            wl_touch::Event::Down { id, x, y, .. } => {
                state.seat_input.touch_down(id, x, y);
                return;
            }
            wl_touch::Event::Motion { id, x, y, .. } => {
                state.seat_input.touch_motion(id, x, y);
                return;
            }
            wl_touch::Event::Up { id, .. } => {
                state.seat_input.touch_up(id);
                return;
            }
            wl_touch::Event::Frame => state.seat_input.touch_frame(),
            wl_touch::Event::Cancel => state.seat_input.touch_cancel(),
            _ => return,
        };
        for report in reports {
            state.feed(report);
        }
    }
}

impl Dispatch<WlKeyboard, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _proxy: &WlKeyboard,
        event: wl_keyboard::Event,
        _data: &(),
        _conn: &Connection,
        _qhandle: &QueueHandle<Self>,
    ) {
        if let wl_keyboard::Event::Key {
            key,
            state: WEnum::Value(KeyState::Pressed),
            ..
        } = event
        {
            match key {
                KEY_ESC | KEY_Q => {
                    info!("quit requested from the keyboard");
                    controls::lock(&state.interaction).request_quit();
                }
                _ => debug!("key {key} pressed"),
            }
        }
    }
}

delegate_noop!(WaylandState: ignore WlCompositor);
delegate_noop!(WaylandState: ignore WlSurface);
delegate_noop!(WaylandState: ignore ZwlrLayerShellV1);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::tracker::ContactState;
    use crate::input::{PointerListener, PointerTracker};

    fn touch_reports(events: Vec<InputEvent>) -> Vec<Vec<TouchPoint>> {
        events
            .into_iter()
            .map(|event| match event {
                InputEvent::Touch(report) => report.points,
                other => panic!("expected a touch report, got {other:?}"),
            })
            .collect()
    }

    fn touch_points(events: Vec<InputEvent>) -> Vec<TouchPoint> {
        let mut reports = touch_reports(events);
        assert_eq!(reports.len(), 1, "expected exactly one report");
        reports.remove(0)
    }

    #[derive(Debug, Default)]
    struct Calls(Vec<&'static str>);

    impl PointerListener for Calls {
        fn on_down(&mut self, _x: f32, _y: f32) {
            self.0.push("down");
        }
        fn on_move(&mut self, _x: f32, _y: f32) {
            self.0.push("move");
        }
        fn on_up(&mut self, _x: f32, _y: f32) {
            self.0.push("up");
        }
    }

    #[test]
    fn tap_within_one_frame_releases_the_tracker() {
        let mut input = SeatInput::default();
        let mut tracker = PointerTracker::new();
        let mut calls = Calls::default();

        input.touch_down(1, 10.0, 10.0);
        input.touch_up(1);
        let reports = input.touch_frame();
        assert_eq!(reports.len(), 2);
        for report in &reports {
            tracker.handle(report, &mut calls);
        }
        assert_eq!(tracker.state(), ContactState::Idle);
        assert_eq!(calls.0, ["down", "up"]);

        input.touch_down(2, 20.0, 20.0);
        for report in &input.touch_frame() {
            tracker.handle(report, &mut calls);
        }
        assert_eq!(tracker.state(), ContactState::TouchActive { id: 2 });
    }

    #[test]
    fn down_and_motion_in_one_frame_keep_the_motion() {
        let mut input = SeatInput::default();
        let mut tracker = PointerTracker::new();
        let mut calls = Calls::default();

        input.touch_down(4, 0.0, 0.0);
        input.touch_motion(4, 3.0, 4.0);
        input.touch_down(5, 9.0, 9.0);
        let reports = input.touch_frame();
        assert_eq!(
            touch_reports(reports.clone()),
            vec![
                vec![TouchPoint::new(4, TouchAction::Down, 0.0, 0.0)],
                vec![
                    TouchPoint::new(4, TouchAction::Change, 3.0, 4.0),
                    TouchPoint::new(5, TouchAction::Down, 9.0, 9.0),
                ],
            ]
        );

        for report in &reports {
            tracker.handle(report, &mut calls);
        }
        assert_eq!(calls.0, ["down", "move"]);
    }

    #[test]
    fn touch_events_are_grouped_per_frame() {
        let mut input = SeatInput::default();
        input.touch_down(5, 10.0, 20.0);
        input.touch_down(6, 30.0, 40.0);

        assert_eq!(
            touch_points(input.touch_frame()),
            vec![
                TouchPoint::new(5, TouchAction::Down, 10.0, 20.0),
                TouchPoint::new(6, TouchAction::Down, 30.0, 40.0),
            ]
        );
        assert!(input.touch_frame().is_empty());
    }

    #[test]
    fn touch_up_reports_last_position() {
        let mut input = SeatInput::default();
        input.touch_down(1, 0.0, 0.0);
        input.touch_frame();
        input.touch_motion(1, 5.0, 6.0);
        input.touch_motion(1, 7.0, 8.0);
        assert_eq!(
            touch_points(input.touch_frame()),
            vec![TouchPoint::new(1, TouchAction::Change, 7.0, 8.0)]
        );

        input.touch_up(1);
        assert_eq!(
            touch_points(input.touch_frame()),
            vec![TouchPoint::new(1, TouchAction::Up, 7.0, 8.0)]
        );
    }

    #[test]
    fn cancel_releases_all_contacts() {
        let mut input = SeatInput::default();
        input.touch_down(1, 1.0, 1.0);
        input.touch_frame();

        let points = touch_points(input.touch_cancel());
        assert_eq!(points, vec![TouchPoint::new(1, TouchAction::Up, 1.0, 1.0)]);
        assert!(input.touch_cancel().is_empty());
    }

    #[test]
    fn pointer_tracks_primary_button() {
        let mut input = SeatInput::default();
        input.pointer_enter(3.0, 4.0);

        assert_eq!(
            input.pointer_button(BTN_LEFT, true),
            InputEvent::from(PointerReport::new(PointerAction::ButtonDown, true, 3.0, 4.0))
        );
        assert_eq!(
            input.pointer_button(BTN_LEFT + 1, true),
            InputEvent::from(PointerReport::new(PointerAction::ButtonDown, true, 3.0, 4.0))
        );
        assert_eq!(
            input.pointer_motion(5.0, 6.0),
            InputEvent::from(PointerReport::new(PointerAction::Motion, true, 5.0, 6.0))
        );
        assert_eq!(
            input.pointer_button(BTN_LEFT, false),
            InputEvent::from(PointerReport::new(PointerAction::ButtonUp, false, 5.0, 6.0))
        );
        assert_eq!(
            input.pointer_leave(),
            InputEvent::from(PointerReport::new(PointerAction::Leave, false, 5.0, 6.0))
        );
    }
}
