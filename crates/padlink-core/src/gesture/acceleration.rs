//! The velocity curve shared by cursor motion and two-finger scrolling.
//!
//! For a raw displacement `len` over `t` milliseconds:
//!
//! ```text
//! velocity = sign(len) * (10 * |len| / t) ^ exponent
//! movement = velocity * t / 10
//! ```
//!
//! With `exponent == 1.0` the curve is the identity.  Larger exponents make
//! fast flicks travel further than slow drags of the same length.

/// Applies the velocity curve to one axis of one sample.
///
/// Returns `0.0` when `dt_ms` is zero, since velocity is undefined there.
pub fn accelerated_movement(len: f32, dt_ms: u64, exponent: f32) -> f64 {
    if dt_ms == 0 || len == 0.0 {
        return 0.0;
    }
    let t = dt_ms as f64;
    let len = f64::from(len);
    let speed = (10.0 * len.abs() / t).powf(f64::from(exponent));
    len.signum() * speed * t / 10.0
}

/// Cursor displacement in whole pixels: the curve, scaled and rounded.
///
/// Rounds half away from zero.  Results outside the `i32` range saturate.
pub fn cursor_displacement(len: f32, dt_ms: u64, exponent: f32, sensitivity: f32) -> i32 {
    (f64::from(sensitivity) * accelerated_movement(len, dt_ms, exponent)).round() as i32
}
