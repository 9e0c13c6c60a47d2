use std::time::{Duration, Instant};

use log::{debug, info, trace};
use serde::Deserialize;

/// Shortest press the impulse scaling will divide by
const MIN_SWIPE_ELAPSED: Duration = Duration::from_millis(1);

pub trait SwipeListener {
    fn on_swipe(&mut self, dx: f32, dy: f32);
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwipeSettings {
    /// A release later than this after the press is a drag, not a swipe
    pub max_duration_ms: u64,
    pub min_length_squared: f32,
}

impl SwipeSettings {
    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }
}

impl Default for SwipeSettings {
    fn default() -> Self {
        Self {
            max_duration_ms: 200,
            min_length_squared: 300.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SwipeStart {
    at: Instant,
    x: f32,
    y: f32,
}

/// Times a press from down to up and turns quick, long enough flicks into an impulse
#[derive(Debug, Clone)]
pub struct SwipeGesture {
    settings: SwipeSettings,
    start: Option<SwipeStart>,
}

impl SwipeGesture {
    pub fn new(settings: SwipeSettings) -> SwipeGesture {
        SwipeGesture {
            settings,
            start: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.start.is_some()
    }

    pub fn down(&mut self, x: f32, y: f32) {
        self.down_at(x, y, Instant::now());
    }

    pub fn up<L: SwipeListener + ?Sized>(&mut self, x: f32, y: f32, listener: &mut L) {
        self.up_at(x, y, Instant::now(), listener);
    }

    /// Arms the gesture unless it already is, keeping the first start point
    pub fn down_at(&mut self, x: f32, y: f32, now: Instant) {
        if self.is_armed() {
            trace!("swipe already armed, keeping its start");
            return;
        }
        self.start = Some(SwipeStart { at: now, x, y });
    }

    /// Evaluates and disarms the gesture
    pub fn up_at<L: SwipeListener + ?Sized>(
        &mut self,
        x: f32,
        y: f32,
        now: Instant,
        listener: &mut L,
    ) {
        let Some(start) = self.start.take() else {
            return;
        };

        let elapsed = now.saturating_duration_since(start.at);
        let max_duration = self.settings.max_duration();
        if elapsed >= max_duration {
            debug!("press lasted {elapsed:?}, not a swipe");
            return;
        }

        let dx = x - start.x;
        let dy = y - start.y;
        if dx * dx + dy * dy < self.settings.min_length_squared {
            debug!("swipe of ({dx}, {dy}) is too short");
            return;
        }

        let scale = max_duration.as_secs_f32() / elapsed.max(MIN_SWIPE_ELAPSED).as_secs_f32();
        info!("swipe dx={dx}, dy={dy}, scale={scale}");
        listener.on_swipe(dx * scale, dy * scale);
    }
}

impl Default for SwipeGesture {
    fn default() -> Self {
        SwipeGesture::new(SwipeSettings::default())
    }
}
