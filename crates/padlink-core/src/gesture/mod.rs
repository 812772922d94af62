//! Gesture recognition: raw touch samples in, semantic input events out.
//!
//! # How touch input arrives (for beginners)
//!
//! A touch screen reports *contacts*.  Each finger gets a pointer id when it
//! lands and keeps it until it lifts.  The platform delivers a stream of
//! events, each carrying an action and the current position of every finger
//! that is down:
//!
//! ```text
//! Down(0)          first finger lands
//! Move             any finger moved
//! PointerDown(1)   another finger lands while one is already down
//! PointerUp(1)     a finger lifts while others stay down
//! Up(0)            the last finger lifts
//! Cancel           the platform took the gesture away (e.g. a system swipe)
//! ```
//!
//! [`GestureRecognizer`] turns that stream into cursor motion, taps, drags,
//! two-finger scrolling, and hold-to-right-click.  It never sleeps and owns
//! no threads: timers are deadlines that the caller checks with
//! [`GestureRecognizer::poll`].

pub mod acceleration;
pub mod recognizer;
pub mod timer;

pub use recognizer::GestureRecognizer;

use crate::config::SessionConfig;

/// Position of one contact at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub pointer_id: u32,
    pub x: f32,
    pub y: f32,
    pub timestamp_ms: u64,
}

impl PointerSample {
    pub fn new(pointer_id: u32, x: f32, y: f32, timestamp_ms: u64) -> Self {
        Self {
            pointer_id,
            x,
            y,
            timestamp_ms,
        }
    }
}

/// What changed in a [`TouchEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchAction {
    /// First contact of a touch session.
    Down(u32),
    /// Additional contact while at least one is already down.
    PointerDown(u32),
    /// One or more contacts moved.
    Move,
    /// A contact lifted while at least one other stays down.
    PointerUp(u32),
    /// The last contact lifted.
    Up(u32),
    /// The platform aborted the touch session.
    Cancel,
}

/// One input event from the touch surface.
///
/// `pointers` lists every contact that is down, including the one named by a
/// `PointerUp`/`Up` action (it is still reported at its lift position).
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    pub action: TouchAction,
    pub pointers: Vec<PointerSample>,
}

impl TouchEvent {
    pub fn new(action: TouchAction, pointers: Vec<PointerSample>) -> Self {
        Self { action, pointers }
    }

    /// The event time: the latest timestamp among its samples, or 0 if empty.
    pub fn timestamp_ms(&self) -> u64 {
        self.pointers
            .iter()
            .map(|p| p.timestamp_ms)
            .max()
            .unwrap_or(0)
    }

    /// The sample for `pointer_id`, if that contact is in this event.
    pub fn pointer(&self, pointer_id: u32) -> Option<&PointerSample> {
        self.pointers.iter().find(|p| p.pointer_id == pointer_id)
    }
}

/// The subset of [`SessionConfig`] the recognizer uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureParams {
    pub tap_delay_ms: u64,
    pub tap_tolerance_px: f32,
    pub sensitivity: f32,
    pub acceleration_exponent: f32,
    pub scroll_threshold: f32,
}

impl From<&SessionConfig> for GestureParams {
    fn from(config: &SessionConfig) -> Self {
        Self {
            tap_delay_ms: config.tap_delay_ms,
            tap_tolerance_px: config.tap_tolerance_px,
            sensitivity: config.sensitivity,
            acceleration_exponent: config.acceleration_exponent,
            scroll_threshold: config.scroll_threshold,
        }
    }
}
