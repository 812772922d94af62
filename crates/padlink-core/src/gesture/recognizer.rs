//! The touch state machine.
//!
//! ```text
//!            Down                 PointerDown
//!   Idle ───────────> SingleTouch ───────────> MultiTouch
//!    ^                   │   ^                    │
//!    └──── Up/Cancel ────┘   └───── PointerUp ────┘
//! ```
//!
//! Classification rules:
//!
//! - One contact moving: cursor motion through the acceleration curve.
//! - Two contacts moving: the vertical motion of whichever finger moved more
//!   is accumulated; every `scroll_threshold` of it is one wheel notch.
//! - Quick stationary release: `LeftButtonDown` now, `LeftButtonUp` after
//!   `tap_delay` unless the user touches down again and moves first, in which
//!   case the button stays held until that touch ends (tap-and-drag).
//! - Stationary hold for `2 × tap_delay`: `RightClick`, and no tap.
//!
//! "Stationary" means the contact stayed strictly within `tap_tolerance_px`
//! of where it landed on both axes.

use tracing::{debug, trace};

use crate::gesture::acceleration::{accelerated_movement, cursor_displacement};
use crate::gesture::timer::DeadlineTimer;
use crate::gesture::{GestureParams, PointerSample, TouchAction, TouchEvent};
use crate::protocol::events::SemanticInputEvent;

/// Coarse state of the current touch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    SingleTouch,
    MultiTouch,
}

/// Last known position of a tracked contact.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TrackedPointer {
    id: u32,
    x: f32,
    y: f32,
}

impl From<&PointerSample> for TrackedPointer {
    fn from(sample: &PointerSample) -> Self {
        Self {
            id: sample.pointer_id,
            x: sample.x,
            y: sample.y,
        }
    }
}

/// Classifies a stream of [`TouchEvent`]s into [`SemanticInputEvent`]s.
///
/// Feed events with [`handle`](Self::handle) and call [`poll`](Self::poll)
/// whenever [`next_deadline`](Self::next_deadline) passes.  Both return the
/// events to transmit, in order.
#[derive(Debug)]
pub struct GestureRecognizer {
    params: GestureParams,

    primary: Option<TrackedPointer>,
    secondary: Option<TrackedPointer>,
    origin: (f32, f32),
    down_at_ms: u64,
    last_sample_ms: u64,
    /// The primary contact drifted beyond the tap tolerance at some point.
    left_origin: bool,
    /// A second contact joined during this session.
    multi_touch: bool,
    right_click_fired: bool,
    scroll_acc: f64,

    /// A `LeftButtonDown` has been sent without its `LeftButtonUp`.
    ///
    /// Unlike the fields above this survives the end of a touch session,
    /// which is what makes tap-and-drag possible.
    button_held: bool,

    /// Sends the `LeftButtonUp` that completes a tap.
    release_timer: DeadlineTimer,
    /// Fires the right click for a stationary hold.
    hold_timer: DeadlineTimer,
}

impl GestureRecognizer {
    pub fn new(params: GestureParams) -> Self {
        Self {
            params,
            primary: None,
            secondary: None,
            origin: (0.0, 0.0),
            down_at_ms: 0,
            last_sample_ms: 0,
            left_origin: false,
            multi_touch: false,
            right_click_fired: false,
            scroll_acc: 0.0,
            button_held: false,
            release_timer: DeadlineTimer::new(),
            hold_timer: DeadlineTimer::new(),
        }
    }

    pub fn params(&self) -> &GestureParams {
        &self.params
    }

    pub fn phase(&self) -> GesturePhase {
        match (self.primary, self.secondary) {
            (None, _) => GesturePhase::Idle,
            (Some(_), None) => GesturePhase::SingleTouch,
            (Some(_), Some(_)) => GesturePhase::MultiTouch,
        }
    }

    /// `true` while the remote left button is pressed on our behalf.
    pub fn is_button_held(&self) -> bool {
        self.button_held
    }

    /// Scroll displacement accumulated but not yet turned into wheel notches.
    pub fn scroll_residual(&self) -> f64 {
        self.scroll_acc
    }

    /// The earliest armed timer deadline, if any.
    pub fn next_deadline(&self) -> Option<u64> {
        match (self.release_timer.deadline(), self.hold_timer.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Processes one touch event.
    ///
    /// Timers due at or before the event's timestamp fire first, so their
    /// output precedes the event's own output.
    pub fn handle(&mut self, event: &TouchEvent) -> Vec<SemanticInputEvent> {
        let now = event.timestamp_ms();
        let mut out = self.poll(now);

        match event.action {
            TouchAction::Down(id) => self.on_down(event, id, now),
            TouchAction::PointerDown(id) => self.on_pointer_down(event, id, now),
            TouchAction::Move => self.on_move(event, now, &mut out),
            TouchAction::PointerUp(id) => self.on_pointer_up(event, id, now),
            TouchAction::Up(id) => self.on_up(event, id, now, &mut out),
            TouchAction::Cancel => out.extend(self.cancel()),
        }
        out
    }

    /// Fires every timer whose deadline is at or before `now_ms`, earliest first.
    pub fn poll(&mut self, now_ms: u64) -> Vec<SemanticInputEvent> {
        let mut out = Vec::new();
        loop {
            // On a tie the release goes first.
            let hold_first = match (self.release_timer.deadline(), self.hold_timer.deadline()) {
                (Some(release), Some(hold)) => hold < release,
                (None, _) => true,
                (Some(_), None) => false,
            };
            if hold_first && self.hold_timer.fire_if_due(now_ms) {
                self.fire_hold(&mut out);
            } else if self.release_timer.fire_if_due(now_ms) {
                self.fire_release(&mut out);
            } else if self.hold_timer.fire_if_due(now_ms) {
                self.fire_hold(&mut out);
            } else {
                break;
            }
        }
        out
    }

    /// Aborts the touch session and disarms every timer.
    ///
    /// The only event ever returned is a `LeftButtonUp` balancing a held
    /// button, so the remote button is never left stuck.
    pub fn cancel(&mut self) -> Vec<SemanticInputEvent> {
        let mut out = Vec::new();
        self.hold_timer.cancel();
        self.release_timer.cancel();
        self.release_button(&mut out);
        self.clear_contacts();
        out
    }

    // ── Actions ───────────────────────────────────────────────────────────────

    fn on_down(&mut self, event: &TouchEvent, id: u32, now: u64) {
        let Some(sample) = event.pointer(id).or_else(|| event.pointers.first()) else {
            return;
        };
        let sample = *sample;

        self.clear_contacts();
        self.primary = Some(TrackedPointer::from(&sample));
        self.origin = (sample.x, sample.y);
        self.down_at_ms = now;
        self.last_sample_ms = now;
        self.hold_timer
            .arm(now.saturating_add(self.params.tap_delay_ms.saturating_mul(2)));
        trace!(pointer = sample.pointer_id, "touch session started");
    }

    fn on_pointer_down(&mut self, event: &TouchEvent, id: u32, now: u64) {
        if self.primary.is_none() {
            // Missed the Down; treat this as the first contact.
            self.on_down(event, id, now);
            return;
        }

        self.multi_touch = true;
        self.hold_timer.cancel();

        if self.secondary.is_none() {
            if let Some(sample) = event.pointer(id) {
                self.secondary = Some(TrackedPointer::from(sample));
                self.scroll_acc = 0.0;
            }
        }
        self.last_sample_ms = now;
    }

    fn on_move(&mut self, event: &TouchEvent, now: u64, out: &mut Vec<SemanticInputEvent>) {
        let Some(primary) = self.primary else {
            return;
        };
        let Some(sample) = event.pointer(primary.id) else {
            return;
        };

        let dt = now.saturating_sub(self.last_sample_ms);
        let dx = sample.x - primary.x;
        let dy = sample.y - primary.y;

        if (dx != 0.0 || dy != 0.0) && self.release_timer.cancel() {
            debug!("contact moved before tap release; holding left button for drag");
        }

        let tolerance = self.params.tap_tolerance_px;
        if (sample.x - self.origin.0).abs() >= tolerance
            || (sample.y - self.origin.1).abs() >= tolerance
        {
            self.left_origin = true;
        }
        self.primary = Some(TrackedPointer::from(sample));

        match self.secondary {
            None => {
                let p = &self.params;
                let mx = cursor_displacement(dx, dt, p.acceleration_exponent, p.sensitivity);
                let my = cursor_displacement(dy, dt, p.acceleration_exponent, p.sensitivity);
                if mx != 0 || my != 0 {
                    out.push(SemanticInputEvent::MouseMove { dx: mx, dy: my });
                }
            }
            Some(second) => {
                let mut second_dy = 0.0;
                if let Some(s) = event.pointer(second.id) {
                    second_dy = s.y - second.y;
                    self.secondary = Some(TrackedPointer::from(s));
                }
                // Tolerate one finger resting while the other drags.
                let dominant = if second_dy.abs() > dy.abs() {
                    second_dy
                } else {
                    dy
                };
                self.scroll_acc +=
                    accelerated_movement(dominant, dt, self.params.acceleration_exponent);
                self.emit_wheel_notches(out);
            }
        }

        self.last_sample_ms = now;
    }

    fn on_pointer_up(&mut self, event: &TouchEvent, id: u32, now: u64) {
        if self.primary.map(|p| p.id) == Some(id) {
            self.primary = self.secondary.take();
        } else if self.secondary.map(|p| p.id) == Some(id) {
            self.secondary = None;
        } else {
            return;
        }

        // Resync the survivor so the next Move does not jump.
        if let Some(sample) = self.primary.and_then(|p| event.pointer(p.id)) {
            self.primary = Some(TrackedPointer::from(sample));
        }

        if self.secondary.is_none() {
            let kept = self.primary.map(|p| p.id);
            if let Some(next) = event
                .pointers
                .iter()
                .find(|s| s.pointer_id != id && Some(s.pointer_id) != kept)
            {
                trace!(pointer = next.pointer_id, "promoted waiting contact");
                self.secondary = Some(TrackedPointer::from(next));
                self.scroll_acc = 0.0;
            }
        }
        self.last_sample_ms = now;
    }

    fn on_up(&mut self, event: &TouchEvent, id: u32, now: u64, out: &mut Vec<SemanticInputEvent>) {
        self.hold_timer.cancel();

        if let Some(sample) = event.pointer(id) {
            let tolerance = self.params.tap_tolerance_px;
            if self.primary.map(|p| p.id) == Some(id)
                && ((sample.x - self.origin.0).abs() >= tolerance
                    || (sample.y - self.origin.1).abs() >= tolerance)
            {
                self.left_origin = true;
            }
        }

        // Either the end of a drag or a second tap arriving before release.
        self.release_timer.cancel();
        self.release_button(out);

        let elapsed = now.saturating_sub(self.down_at_ms);
        let is_tap = self.primary.is_some()
            && !self.multi_touch
            && !self.left_origin
            && !self.right_click_fired
            && elapsed < self.params.tap_delay_ms;

        if is_tap {
            out.push(SemanticInputEvent::LeftButtonDown);
            self.button_held = true;
            self.release_timer
                .arm(now.saturating_add(self.params.tap_delay_ms));
        }

        self.clear_contacts();
    }

    // ── Timers ────────────────────────────────────────────────────────────────

    fn fire_release(&mut self, out: &mut Vec<SemanticInputEvent>) {
        self.release_button(out);
    }

    fn fire_hold(&mut self, out: &mut Vec<SemanticInputEvent>) {
        if self.primary.is_none() || self.left_origin || self.multi_touch {
            return;
        }

        debug!("stationary hold recognized as right click");
        self.release_timer.cancel();
        self.release_button(out);
        out.push(SemanticInputEvent::RightClick);
        self.right_click_fired = true;
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn emit_wheel_notches(&mut self, out: &mut Vec<SemanticInputEvent>) {
        let threshold = f64::from(self.params.scroll_threshold);
        while self.scroll_acc <= -threshold {
            out.push(SemanticInputEvent::WheelUp);
            self.scroll_acc += threshold;
        }
        while self.scroll_acc >= threshold {
            out.push(SemanticInputEvent::WheelDown);
            self.scroll_acc -= threshold;
        }
    }

    fn release_button(&mut self, out: &mut Vec<SemanticInputEvent>) {
        if self.button_held {
            self.button_held = false;
            out.push(SemanticInputEvent::LeftButtonUp);
        }
    }

    fn clear_contacts(&mut self) {
        self.primary = None;
        self.secondary = None;
        self.left_origin = false;
        self.multi_touch = false;
        self.right_click_fired = false;
        self.scroll_acc = 0.0;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
