//! Byte-exact codec for the Padlink wire protocol.
//!
//! One TCP byte stream carries four kinds of frame.  The receiver tells them
//! apart by the lead byte alone, relying on the fact that bytes `0xF8..=0xFF`
//! never occur in valid UTF-8:
//!
//! ```text
//! heartbeat : 00
//! text      : raw UTF-8 (lead bytes 01..7F, C2..F4)
//! mouse     : F8|sx|ax11  80|ax10..5  80|ax4..0<<1|sy  80|ay11..6  80|ay5..0
//! key       : FC 80 80 80 80 80|code
//! ```
//!
//! Mouse magnitudes are 12 bits wide and are *wrapped* (masked), not
//! saturated: a displacement of 4096 travels as 0.  Callers keep per-sample
//! displacement within ±4095.

use thiserror::Error;

use crate::protocol::events::{KeyCode, SemanticInputEvent};

/// The heartbeat frame's only byte.
pub const HEARTBEAT: u8 = 0x00;

/// Lead byte of a mouse frame before the sign/high-bit flags are OR-ed in.
pub const MOUSE_LEAD: u8 = 0xF8;

/// Lead byte of a discrete event frame.
pub const KEY_LEAD: u8 = 0xFC;

/// Length of a mouse frame in bytes.
pub const MOUSE_FRAME_LEN: usize = 5;

/// Length of a discrete event frame in bytes.
pub const KEY_FRAME_LEN: usize = 6;

/// Largest magnitude that survives the 12-bit mouse encoding unchanged.
pub const MAX_MOUSE_MAGNITUDE: i32 = 0xFFF;

/// Errors that can occur during encoding or decoding.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The byte slice ends before the frame at its head is complete.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The byte at the head of the stream cannot start any frame.
    #[error("malformed frame: byte 0x{byte:02X} cannot start a frame")]
    MalformedFrame { byte: u8 },

    /// A continuation byte inside a mouse or key frame lacks its high bit.
    #[error("malformed frame: byte {index} is 0x{byte:02X}, expected a continuation byte")]
    BadContinuation { index: usize, byte: u8 },

    /// A discrete frame carries a code outside the code table.
    #[error("unknown key code: 0x{0:02X}")]
    UnknownKeyCode(u8),

    /// A text run contains a byte that would alias another frame kind.
    #[error("text contains forbidden byte 0x{0:02X}")]
    ForbiddenTextByte(u8),
}

// ── Frames ────────────────────────────────────────────────────────────────────

/// A finished byte sequence ready for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireFrame(Vec<u8>);

impl WireFrame {
    /// The single-byte heartbeat frame.
    pub fn heartbeat() -> Self {
        WireFrame(vec![HEARTBEAT])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` for the heartbeat frame.
    pub fn is_heartbeat(&self) -> bool {
        self.0 == [HEARTBEAT]
    }
}

impl AsRef<[u8]> for WireFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes one [`SemanticInputEvent`] into a wire frame.
///
/// Returns `Ok(None)` for an empty text run, which has nothing to transmit.
///
/// # Errors
///
/// Returns [`ProtocolError::ForbiddenTextByte`] if a text run contains U+0000,
/// which would be indistinguishable from a heartbeat.
///
/// # Examples
///
/// ```rust
/// use padlink_core::{encode_event, SemanticInputEvent};
///
/// let frame = encode_event(&SemanticInputEvent::RightClick).unwrap().unwrap();
/// assert_eq!(frame.as_bytes(), &[0xFC, 0x80, 0x80, 0x80, 0x80, 0x83]);
/// ```
pub fn encode_event(event: &SemanticInputEvent) -> Result<Option<WireFrame>, ProtocolError> {
    match event {
        SemanticInputEvent::MouseMove { dx, dy } => {
            Ok(Some(WireFrame(encode_mouse_move(*dx, *dy).to_vec())))
        }
        SemanticInputEvent::TextRun(text) => encode_text(text),
        SemanticInputEvent::LeftClick => Ok(Some(key_frame(KeyCode::LeftClick))),
        SemanticInputEvent::RightClick => Ok(Some(key_frame(KeyCode::RightClick))),
        SemanticInputEvent::MiddleClick => Ok(Some(key_frame(KeyCode::MiddleClick))),
        SemanticInputEvent::LeftButtonDown => Ok(Some(key_frame(KeyCode::LeftMouseDown))),
        SemanticInputEvent::LeftButtonUp => Ok(Some(key_frame(KeyCode::LeftMouseUp))),
        SemanticInputEvent::WheelUp => Ok(Some(key_frame(KeyCode::WheelUp))),
        SemanticInputEvent::WheelDown => Ok(Some(key_frame(KeyCode::WheelDown))),
        SemanticInputEvent::SpecialKey(code) => Ok(Some(key_frame(*code))),
    }
}

fn key_frame(code: KeyCode) -> WireFrame {
    WireFrame(encode_key(code).to_vec())
}

/// Encodes a relative mouse motion into its 5-byte frame.
///
/// Magnitudes are masked to 12 bits; values beyond ±4095 wrap.
pub fn encode_mouse_move(dx: i32, dy: i32) -> [u8; MOUSE_FRAME_LEN] {
    let neg_x = dx < 0;
    let neg_y = dy < 0;
    let ax = dx.unsigned_abs() & 0xFFF;
    let ay = dy.unsigned_abs() & 0xFFF;
    [
        MOUSE_LEAD | if neg_x { 0x02 } else { 0x00 } | (ax >> 11) as u8,
        0x80 | ((ax >> 5) & 0x3F) as u8,
        0x80 | ((ax & 0x1F) << 1) as u8 | if neg_y { 0x01 } else { 0x00 },
        0x80 | (ay >> 6) as u8,
        0x80 | (ay & 0x3F) as u8,
    ]
}

/// Encodes a discrete event into its 6-byte frame.
pub fn encode_key(code: KeyCode) -> [u8; KEY_FRAME_LEN] {
    encode_key_code(code.as_u8())
}

/// Encodes a raw 7-bit code into a 6-byte discrete frame.
///
/// The high bit of `code` is discarded.  Prefer [`encode_key`]; this exists
/// for receivers and tests that work with the raw code space.
pub fn encode_key_code(code: u8) -> [u8; KEY_FRAME_LEN] {
    [KEY_LEAD, 0x80, 0x80, 0x80, 0x80, 0x80 | (code & 0x7F)]
}

/// Encodes a text run as raw UTF-8.
///
/// # Errors
///
/// Returns [`ProtocolError::ForbiddenTextByte`] if `text` contains U+0000.
pub fn encode_text(text: &str) -> Result<Option<WireFrame>, ProtocolError> {
    if text.is_empty() {
        return Ok(None);
    }
    if text.as_bytes().contains(&HEARTBEAT) {
        return Err(ProtocolError::ForbiddenTextByte(HEARTBEAT));
    }
    Ok(Some(WireFrame(text.as_bytes().to_vec())))
}

// ── Decoding ──────────────────────────────────────────────────────────────────

/// One frame recovered from the head of a byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedFrame {
    Heartbeat,
    /// The longest run of complete UTF-8 characters at the head of the buffer.
    Text(String),
    MouseMove { dx: i32, dy: i32 },
    Key(KeyCode),
}

/// Decodes one frame from the beginning of `bytes`.
///
/// Returns the frame and the number of bytes consumed, so the caller can
/// advance their read cursor.
///
/// # Errors
///
/// - [`ProtocolError::InsufficientData`] when the buffer ends mid-frame
///   (wait for more bytes and retry).
/// - [`ProtocolError::MalformedFrame`] / [`ProtocolError::BadContinuation`]
///   when the bytes can never form a valid frame.
/// - [`ProtocolError::UnknownKeyCode`] for a well-formed discrete frame whose
///   code is not in the table.
///
/// # Examples
///
/// ```rust
/// use padlink_core::protocol::codec::{decode_frame, encode_mouse_move, DecodedFrame};
///
/// let bytes = encode_mouse_move(-7, 300);
/// let (frame, n) = decode_frame(&bytes).unwrap();
/// assert_eq!(frame, DecodedFrame::MouseMove { dx: -7, dy: 300 });
/// assert_eq!(n, 5);
/// ```
pub fn decode_frame(bytes: &[u8]) -> Result<(DecodedFrame, usize), ProtocolError> {
    let Some(&lead) = bytes.first() else {
        return Err(ProtocolError::InsufficientData {
            needed: 1,
            available: 0,
        });
    };

    match lead {
        HEARTBEAT => Ok((DecodedFrame::Heartbeat, 1)),
        KEY_LEAD => {
            let frame = take_frame(bytes, KEY_FRAME_LEN)?;
            let raw = decode_key_code(frame)?;
            let code = KeyCode::try_from(raw).map_err(ProtocolError::UnknownKeyCode)?;
            Ok((DecodedFrame::Key(code), KEY_FRAME_LEN))
        }
        b if b & 0xFC == MOUSE_LEAD => {
            let frame = take_frame(bytes, MOUSE_FRAME_LEN)?;
            let (dx, dy) = decode_mouse_move(frame)?;
            Ok((DecodedFrame::MouseMove { dx, dy }, MOUSE_FRAME_LEN))
        }
        0xFD..=0xFF => Err(ProtocolError::MalformedFrame { byte: lead }),
        _ => decode_text_run(bytes),
    }
}

/// Decodes a complete 5-byte mouse frame back into `(dx, dy)`.
///
/// # Errors
///
/// Returns an error if the slice is not exactly a well-formed mouse frame.
pub fn decode_mouse_move(frame: &[u8]) -> Result<(i32, i32), ProtocolError> {
    let frame = take_frame(frame, MOUSE_FRAME_LEN)?;
    if frame[0] & 0xFC != MOUSE_LEAD {
        return Err(ProtocolError::MalformedFrame { byte: frame[0] });
    }
    check_continuations(frame)?;

    let ax = (u32::from(frame[0] & 0x01) << 11)
        | (u32::from(frame[1] & 0x3F) << 5)
        | u32::from((frame[2] >> 1) & 0x1F);
    let ay = (u32::from(frame[3] & 0x3F) << 6) | u32::from(frame[4] & 0x3F);

    let dx = if frame[0] & 0x02 != 0 { -(ax as i32) } else { ax as i32 };
    let dy = if frame[2] & 0x01 != 0 { -(ay as i32) } else { ay as i32 };
    Ok((dx, dy))
}

/// Extracts the raw 7-bit code from a complete 6-byte discrete frame.
///
/// # Errors
///
/// Returns an error if the slice is not exactly a well-formed discrete frame.
pub fn decode_key_code(frame: &[u8]) -> Result<u8, ProtocolError> {
    let frame = take_frame(frame, KEY_FRAME_LEN)?;
    if frame[0] != KEY_LEAD {
        return Err(ProtocolError::MalformedFrame { byte: frame[0] });
    }
    check_continuations(frame)?;
    Ok(frame[KEY_FRAME_LEN - 1] & 0x7F)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn take_frame(bytes: &[u8], len: usize) -> Result<&[u8], ProtocolError> {
    if bytes.len() < len {
        return Err(ProtocolError::InsufficientData {
            needed: len,
            available: bytes.len(),
        });
    }
    Ok(&bytes[..len])
}

fn check_continuations(frame: &[u8]) -> Result<(), ProtocolError> {
    for (index, &byte) in frame.iter().enumerate().skip(1) {
        if byte & 0x80 == 0 {
            return Err(ProtocolError::BadContinuation { index, byte });
        }
    }
    Ok(())
}

/// Length of the UTF-8 sequence introduced by `lead`, or `None` if `lead`
/// cannot start a character.
fn utf8_sequence_len(lead: u8) -> Option<usize> {
    match lead {
        0x01..=0x7F => Some(1),
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

fn decode_text_run(bytes: &[u8]) -> Result<(DecodedFrame, usize), ProtocolError> {
    let mut end = 0;
    while end < bytes.len() {
        let lead = bytes[end];
        if lead == HEARTBEAT || lead >= MOUSE_LEAD {
            break;
        }
        let Some(len) = utf8_sequence_len(lead) else {
            if end == 0 {
                return Err(ProtocolError::MalformedFrame { byte: lead });
            }
            break;
        };
        if end + len > bytes.len() {
            if end == 0 {
                return Err(ProtocolError::InsufficientData {
                    needed: len,
                    available: bytes.len(),
                });
            }
            break;
        }
        if std::str::from_utf8(&bytes[end..end + len]).is_err() {
            if end == 0 {
                return Err(ProtocolError::MalformedFrame { byte: lead });
            }
            break;
        }
        end += len;
    }

    // Every character in `..end` was validated individually above.
    let text = String::from_utf8_lossy(&bytes[..end]).into_owned();
    Ok((DecodedFrame::Text(text), end))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
