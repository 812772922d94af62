//! Semantic input events and the discrete event code table.
//!
//! A [`SemanticInputEvent`] is an abstract input action (click, move, key)
//! independent of its wire encoding.  The gesture recognizer and the text
//! differ produce them; the codec turns them into bytes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Discrete event codes ──────────────────────────────────────────────────────

/// 7-bit identifier carried in the last byte of a discrete event frame.
///
/// Code 0x00 is reserved: it is the value of the heartbeat byte and never
/// appears inside a discrete frame.  Every defined code is below 0x40, so
/// `0x80 | code` is always a UTF-8 continuation byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum KeyCode {
    // Editing
    Backspace = 0x01,
    // Pointer buttons and wheel
    LeftClick = 0x02,
    RightClick = 0x03,
    MiddleClick = 0x04,
    WheelUp = 0x05,
    WheelDown = 0x06,
    // Modifiers
    Ctrl = 0x07,
    Super = 0x08,
    Alt = 0x09,
    // Navigation
    Escape = 0x0A,
    Tab = 0x0B,
    Left = 0x0C,
    Down = 0x0D,
    Up = 0x0E,
    Right = 0x0F,
    // Media
    VolumeDown = 0x10,
    VolumeUp = 0x11,
    // Editing block
    Insert = 0x12,
    Delete = 0x13,
    Home = 0x14,
    End = 0x15,
    PageUp = 0x16,
    PageDown = 0x17,
    // Function keys
    F1 = 0x18,
    F2 = 0x19,
    F3 = 0x1A,
    F4 = 0x1B,
    F5 = 0x1C,
    F6 = 0x1D,
    F7 = 0x1E,
    F8 = 0x1F,
    F9 = 0x20,
    F10 = 0x21,
    F11 = 0x22,
    F12 = 0x23,
    // Left button held / released (tap and drag)
    LeftMouseDown = 0x24,
    LeftMouseUp = 0x25,
}

impl KeyCode {
    /// Every defined code, in ascending numeric order.
    pub const ALL: [KeyCode; 37] = [
        KeyCode::Backspace,
        KeyCode::LeftClick,
        KeyCode::RightClick,
        KeyCode::MiddleClick,
        KeyCode::WheelUp,
        KeyCode::WheelDown,
        KeyCode::Ctrl,
        KeyCode::Super,
        KeyCode::Alt,
        KeyCode::Escape,
        KeyCode::Tab,
        KeyCode::Left,
        KeyCode::Down,
        KeyCode::Up,
        KeyCode::Right,
        KeyCode::VolumeDown,
        KeyCode::VolumeUp,
        KeyCode::Insert,
        KeyCode::Delete,
        KeyCode::Home,
        KeyCode::End,
        KeyCode::PageUp,
        KeyCode::PageDown,
        KeyCode::F1,
        KeyCode::F2,
        KeyCode::F3,
        KeyCode::F4,
        KeyCode::F5,
        KeyCode::F6,
        KeyCode::F7,
        KeyCode::F8,
        KeyCode::F9,
        KeyCode::F10,
        KeyCode::F11,
        KeyCode::F12,
        KeyCode::LeftMouseDown,
        KeyCode::LeftMouseUp,
    ];

    /// Returns the numeric code.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Lower-case name used by the console front-end (`"escape"`, `"f5"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            KeyCode::Backspace => "backspace",
            KeyCode::LeftClick => "leftclick",
            KeyCode::RightClick => "rightclick",
            KeyCode::MiddleClick => "middleclick",
            KeyCode::WheelUp => "wheelup",
            KeyCode::WheelDown => "wheeldown",
            KeyCode::Ctrl => "ctrl",
            KeyCode::Super => "super",
            KeyCode::Alt => "alt",
            KeyCode::Escape => "escape",
            KeyCode::Tab => "tab",
            KeyCode::Left => "left",
            KeyCode::Down => "down",
            KeyCode::Up => "up",
            KeyCode::Right => "right",
            KeyCode::VolumeDown => "volumedown",
            KeyCode::VolumeUp => "volumeup",
            KeyCode::Insert => "insert",
            KeyCode::Delete => "delete",
            KeyCode::Home => "home",
            KeyCode::End => "end",
            KeyCode::PageUp => "pageup",
            KeyCode::PageDown => "pagedown",
            KeyCode::F1 => "f1",
            KeyCode::F2 => "f2",
            KeyCode::F3 => "f3",
            KeyCode::F4 => "f4",
            KeyCode::F5 => "f5",
            KeyCode::F6 => "f6",
            KeyCode::F7 => "f7",
            KeyCode::F8 => "f8",
            KeyCode::F9 => "f9",
            KeyCode::F10 => "f10",
            KeyCode::F11 => "f11",
            KeyCode::F12 => "f12",
            KeyCode::LeftMouseDown => "leftmousedown",
            KeyCode::LeftMouseUp => "leftmouseup",
        }
    }
}

impl TryFrom<u8> for KeyCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        // Codes are dense from 0x01, so the table index is `value - 1`.
        match value {
            0x01..=0x25 => Ok(KeyCode::ALL[(value - 1) as usize]),
            other => Err(other),
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a key name is not in the code table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown key name: {0}")]
pub struct UnknownKeyName(pub String);

impl FromStr for KeyCode {
    type Err = UnknownKeyName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        // A few aliases people actually type.
        let wanted = match wanted.as_str() {
            "esc" => "escape",
            "control" => "ctrl",
            "meta" | "win" => "super",
            "del" => "delete",
            "ins" => "insert",
            "pgup" => "pageup",
            "pgdn" | "pgdown" => "pagedown",
            other => other,
        };
        KeyCode::ALL
            .iter()
            .copied()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| UnknownKeyName(s.to_string()))
    }
}

// ── Semantic events ───────────────────────────────────────────────────────────

/// An abstract input action, produced by the gesture recognizer, the text
/// differ, or directly by the caller (on-screen key buttons).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SemanticInputEvent {
    /// Relative cursor motion in device pixels after acceleration.
    MouseMove { dx: i32, dy: i32 },
    LeftClick,
    RightClick,
    MiddleClick,
    /// Left button pressed and held (start of a tap or a drag).
    LeftButtonDown,
    /// Left button released.
    LeftButtonUp,
    WheelUp,
    WheelDown,
    /// Any other discrete key from the code table.
    SpecialKey(KeyCode),
    /// A run of typed or inserted text.
    TextRun(String),
}

impl SemanticInputEvent {
    /// The discrete code this event travels as, or `None` for motion and text.
    pub fn key_code(&self) -> Option<KeyCode> {
        match self {
            SemanticInputEvent::LeftClick => Some(KeyCode::LeftClick),
            SemanticInputEvent::RightClick => Some(KeyCode::RightClick),
            SemanticInputEvent::MiddleClick => Some(KeyCode::MiddleClick),
            SemanticInputEvent::LeftButtonDown => Some(KeyCode::LeftMouseDown),
            SemanticInputEvent::LeftButtonUp => Some(KeyCode::LeftMouseUp),
            SemanticInputEvent::WheelUp => Some(KeyCode::WheelUp),
            SemanticInputEvent::WheelDown => Some(KeyCode::WheelDown),
            SemanticInputEvent::SpecialKey(code) => Some(*code),
            SemanticInputEvent::MouseMove { .. } | SemanticInputEvent::TextRun(_) => None,
        }
    }

    /// Inverse of [`SemanticInputEvent::key_code`]: pointer codes map back to
    /// their dedicated variants, everything else to `SpecialKey`.
    pub fn from_key_code(code: KeyCode) -> Self {
        match code {
            KeyCode::LeftClick => SemanticInputEvent::LeftClick,
            KeyCode::RightClick => SemanticInputEvent::RightClick,
            KeyCode::MiddleClick => SemanticInputEvent::MiddleClick,
            KeyCode::LeftMouseDown => SemanticInputEvent::LeftButtonDown,
            KeyCode::LeftMouseUp => SemanticInputEvent::LeftButtonUp,
            KeyCode::WheelUp => SemanticInputEvent::WheelUp,
            KeyCode::WheelDown => SemanticInputEvent::WheelDown,
            other => SemanticInputEvent::SpecialKey(other),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_table_is_dense_and_ordered() {
        for (i, code) in KeyCode::ALL.iter().enumerate() {
            assert_eq!(code.as_u8() as usize, i + 1, "{code:?} out of place");
        }
    }

    #[test]
    fn test_try_from_round_trips_every_code() {
        for code in KeyCode::ALL {
            assert_eq!(KeyCode::try_from(code.as_u8()), Ok(code));
        }
    }

    #[test]
    fn test_try_from_rejects_reserved_and_unassigned() {
        assert_eq!(KeyCode::try_from(0x00), Err(0x00));
        assert_eq!(KeyCode::try_from(0x26), Err(0x26));
        assert_eq!(KeyCode::try_from(0x7F), Err(0x7F));
    }

    #[test]
    fn test_every_code_fits_below_continuation_range_limit() {
        // 0x80 | code must stay a UTF-8 continuation byte (0x80..=0xBF).
        for code in KeyCode::ALL {
            assert!(code.as_u8() < 0x40, "{code:?} would leave the continuation range");
        }
    }

    #[test]
    fn test_from_str_accepts_names_and_aliases() {
        assert_eq!("escape".parse::<KeyCode>(), Ok(KeyCode::Escape));
        assert_eq!("Esc".parse::<KeyCode>(), Ok(KeyCode::Escape));
        assert_eq!("F12".parse::<KeyCode>(), Ok(KeyCode::F12));
        assert_eq!("pgdn".parse::<KeyCode>(), Ok(KeyCode::PageDown));
        assert!("hyper".parse::<KeyCode>().is_err());
    }

    #[test]
    fn test_unknown_key_name_is_a_std_error_naming_the_input() {
        // Arrange / Act
        let err = "Hyper".parse::<KeyCode>().unwrap_err();
        let boxed: Box<dyn std::error::Error> = Box::new(err.clone());

        // Assert
        assert_eq!(err, UnknownKeyName("Hyper".into()));
        assert_eq!(boxed.to_string(), "unknown key name: Hyper");
    }

    #[test]
    fn test_name_round_trips_through_from_str() {
        for code in KeyCode::ALL {
            assert_eq!(code.name().parse::<KeyCode>(), Ok(code));
        }
    }

    #[test]
    fn test_pointer_events_map_to_dedicated_codes() {
        assert_eq!(
            SemanticInputEvent::LeftButtonDown.key_code(),
            Some(KeyCode::LeftMouseDown)
        );
        assert_eq!(SemanticInputEvent::WheelDown.key_code(), Some(KeyCode::WheelDown));
        assert_eq!(SemanticInputEvent::MouseMove { dx: 1, dy: 2 }.key_code(), None);
        assert_eq!(SemanticInputEvent::TextRun("a".into()).key_code(), None);
    }

    #[test]
    fn test_from_key_code_inverts_key_code() {
        for code in KeyCode::ALL {
            let event = SemanticInputEvent::from_key_code(code);
            assert_eq!(event.key_code(), Some(code));
        }
    }
}
