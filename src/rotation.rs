use std::f32::consts::{PI, TAU};
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::input::SwipeListener;

/// Wraps an angle into `(-PI, PI]`
pub fn normalize_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let mut wrapped = PI - (PI - angle).rem_euclid(TAU);
    // rem_euclid may round up to TAU for tiny negative inputs
    if wrapped <= -PI {
        wrapped += TAU;
    }
    wrapped
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RotationSettings {
    /// Screen units of vertical drag per radian around the X axis
    pub drag_divisor_x: f32,
    /// Screen units of horizontal drag per radian around the Y axis
    pub drag_divisor_y: f32,
    /// Swipe impulse units per rad/s of spin
    pub impulse_divisor: f32,
    /// rad/s²
    pub deceleration: f32,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            drag_divisor_x: 500.0,
            drag_divisor_y: 400.0,
            impulse_divisor: 100.0,
            deceleration: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationAxis {
    angle: f32,
    angular_speed: f32,
}

impl RotationAxis {
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn angular_speed(&self) -> f32 {
        self.angular_speed
    }

    pub fn rotate_by(&mut self, delta: f32) {
        self.angle = normalize_angle(self.angle + delta);
    }

    pub fn set_angular_speed(&mut self, speed: f32) {
        self.angular_speed = speed;
    }

    /// Advances the angle under constant deceleration, stopping once the speed reaches zero
    pub fn integrate(&mut self, deceleration: f32, elapsed_secs: f32) {
        if self.angular_speed == 0.0 || elapsed_secs <= 0.0 {
            return;
        }

        let decel = match self.angular_speed > 0.0 {
            true => deceleration.abs(),
            false => -deceleration.abs(),
        };
        if decel == 0.0 {
            self.rotate_by(self.angular_speed * elapsed_secs);
            return;
        }

        let stop_after = self.angular_speed / decel;
        if elapsed_secs > stop_after {
            self.rotate_by((self.angular_speed - 0.5 * decel * stop_after) * stop_after);
            self.angular_speed = 0.0;
        } else {
            self.rotate_by((self.angular_speed - 0.5 * decel * elapsed_secs) * elapsed_secs);
            let speed = self.angular_speed - decel * elapsed_secs;
            // never spin back past zero
            self.angular_speed = match speed.signum() == self.angular_speed.signum() {
                true => speed,
                false => 0.0,
            };
        }
    }
}

/// Two independent rotation axes driven by drags and swipes
#[derive(Debug, Clone, Default)]
pub struct RotationModel {
    settings: RotationSettings,
    x: RotationAxis,
    y: RotationAxis,
}

impl RotationModel {
    pub fn new(settings: RotationSettings) -> RotationModel {
        RotationModel {
            settings,
            x: RotationAxis::default(),
            y: RotationAxis::default(),
        }
    }

    pub fn x(&self) -> &RotationAxis {
        &self.x
    }

    pub fn y(&self) -> &RotationAxis {
        &self.y
    }

    /// `(angle_x, angle_y)` in radians
    pub fn angles(&self) -> (f32, f32) {
        (self.x.angle, self.y.angle)
    }

    pub fn is_spinning(&self) -> bool {
        self.x.angular_speed != 0.0 || self.y.angular_speed != 0.0
    }

    pub fn reset_speed(&mut self) {
        self.x.angular_speed = 0.0;
        self.y.angular_speed = 0.0;
    }

    /// Screen Y grows downwards, so vertical drags are inverted for the X axis only
    pub fn apply_drag(&mut self, dx: f32, dy: f32) {
        self.x.rotate_by(-dy / self.settings.drag_divisor_x);
        self.y.rotate_by(dx / self.settings.drag_divisor_y);
    }

    /// The spin axis is perpendicular to the swipe direction
    pub fn apply_swipe_impulse(&mut self, dx: f32, dy: f32) {
        self.x.set_angular_speed(dy / self.settings.impulse_divisor);
        self.y.set_angular_speed(dx / self.settings.impulse_divisor);
    }

    pub fn integrate(&mut self, elapsed: Duration) {
        let secs = elapsed.as_secs_f32();
        self.x.integrate(self.settings.deceleration, secs);
        self.y.integrate(self.settings.deceleration, secs);
    }
}

impl SwipeListener for RotationModel {
    fn on_swipe(&mut self, dx: f32, dy: f32) {
        self.apply_swipe_impulse(dx, dy);
    }
}

/// Time elapsed between consecutive frames
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> FrameClock {
        FrameClock::default()
    }

    /// Returns `None` on the first tick
    pub fn tick(&mut self, now: Instant) -> Option<Duration> {
        let elapsed = self.last.map(|last| now.saturating_duration_since(last));
        self.last = Some(now);
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    fn spinning(speed: f32) -> RotationAxis {
        RotationAxis {
            angle: 0.0,
            angular_speed: speed,
        }
    }

    #[test]
    fn normalize_wraps_into_half_open_range() {
        assert!(close(normalize_angle(0.0), 0.0));
        assert_eq!(normalize_angle(PI), PI);
        assert_eq!(normalize_angle(-PI), PI);
        assert!(close(normalize_angle(3.0 * PI / 2.0), -PI / 2.0));
        assert!(close(normalize_angle(-3.0 * PI / 2.0), PI / 2.0));
        assert!((normalize_angle(3.0 * TAU + 1.0) - 1.0).abs() < 1e-4);
        assert_eq!(normalize_angle(f32::NAN), 0.0);

        for angle in [-1e6, -1234.5, -TAU, -1e-7, 1e-7, 5.0, 99.9, 3e5] {
            let wrapped = normalize_angle(angle);
            assert!(wrapped > -PI && wrapped <= PI, "{angle} -> {wrapped}");
        }
    }

    #[test]
    fn partial_decay() {
        let mut axis = spinning(1.0);
        axis.integrate(2.0, 0.2);
        assert!(close(axis.angular_speed(), 0.6));
        assert!(close(axis.angle(), 0.16));
    }

    #[test]
    fn full_decay_stops_exactly() {
        let mut axis = spinning(1.0);
        axis.integrate(2.0, 1.0);
        assert_eq!(axis.angular_speed(), 0.0);
        assert!(close(axis.angle(), 0.25));

        axis.integrate(2.0, 1.0);
        assert!(close(axis.angle(), 0.25));
    }

    #[test]
    fn negative_spin_decays_towards_zero() {
        let mut axis = spinning(-1.0);
        axis.integrate(2.0, 0.2);
        assert!(close(axis.angular_speed(), -0.6));
        assert!(close(axis.angle(), -0.16));

        let mut previous = axis.angular_speed().abs();
        for _ in 0..10 {
            axis.integrate(2.0, 0.05);
            assert!(axis.angular_speed() <= 0.0);
            assert!(axis.angular_speed().abs() <= previous);
            previous = axis.angular_speed().abs();
        }
        assert_eq!(axis.angular_speed(), 0.0);
    }

    #[test]
    fn fast_spin_stays_normalized() {
        let mut axis = spinning(500.0);
        for _ in 0..100 {
            axis.integrate(2.0, 0.016);
            assert!(axis.angle() > -PI && axis.angle() <= PI);
        }
    }

    #[test]
    fn drag_uses_asymmetric_divisors() {
        let mut model = RotationModel::default();
        model.apply_drag(40.0, 50.0);
        let (x, y) = model.angles();
        assert!(close(x, -0.1));
        assert!(close(y, 0.1));
    }

    #[test]
    fn huge_drag_wraps() {
        let mut model = RotationModel::default();
        model.apply_drag(1e6, -1e6);
        let (x, y) = model.angles();
        assert!(x > -PI && x <= PI);
        assert!(y > -PI && y <= PI);
    }

    #[test]
    fn swipe_impulse_is_cross_coupled() {
        let mut model = RotationModel::default();
        model.on_swipe(26.67, 0.0);
        assert!(close(model.y().angular_speed(), 0.2667));
        assert_eq!(model.x().angular_speed(), 0.0);

        model.apply_swipe_impulse(0.0, -50.0);
        assert!(close(model.x().angular_speed(), -0.5));
        assert_eq!(model.y().angular_speed(), 0.0);
    }

    #[test]
    fn model_integrates_both_axes() {
        let mut model = RotationModel::default();
        model.apply_swipe_impulse(100.0, -100.0);
        model.integrate(Duration::from_millis(200));
        assert!(close(model.y().angular_speed(), 0.6));
        assert!(close(model.x().angular_speed(), -0.6));
        assert!(model.is_spinning());

        model.integrate(Duration::from_secs(1));
        assert!(!model.is_spinning());
        let (x, y) = model.angles();
        assert!(close(x, -0.25));
        assert!(close(y, 0.25));
    }

    #[test]
    fn frame_clock_skips_first_frame() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(t0), None);
        assert_eq!(
            clock.tick(t0 + Duration::from_millis(16)),
            Some(Duration::from_millis(16))
        );
        assert_eq!(
            clock.tick(t0 + Duration::from_millis(40)),
            Some(Duration::from_millis(24))
        );
    }
}
