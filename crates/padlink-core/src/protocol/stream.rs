//! Incremental decoder for a Padlink byte stream.
//!
//! TCP delivers bytes, not frames.  A single read may end halfway through a
//! mouse frame or a multi-byte character, or may carry several frames at once.
//! [`FrameDecoder`] accumulates bytes with [`FrameDecoder::push`] and hands
//! back whole frames as they become available.
//!
//! The client never reads from its socket, so in this workspace the decoder
//! serves tests, benchmarks, and anyone writing a receiving daemon.

use crate::protocol::codec::{decode_frame, DecodedFrame, ProtocolError};

/// Buffers raw bytes and yields complete [`DecodedFrame`]s.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends newly received bytes to the internal buffer.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Number of bytes received but not yet decoded.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Decodes the next complete frame, if there is one.
    ///
    /// Returns `Ok(None)` when the buffer is empty or ends mid-frame.
    ///
    /// # Errors
    ///
    /// Any decode error other than insufficient data.  The offending byte is
    /// discarded so the caller may choose to keep decoding.
    pub fn next_frame(&mut self) -> Result<Option<DecodedFrame>, ProtocolError> {
        match decode_frame(&self.buf) {
            Ok((frame, consumed)) => {
                self.buf.drain(..consumed);
                Ok(Some(frame))
            }
            Err(ProtocolError::InsufficientData { .. }) => Ok(None),
            Err(e) => {
                self.buf.drain(..1);
                Err(e)
            }
        }
    }

    /// Decodes every complete frame currently buffered.
    ///
    /// # Errors
    ///
    /// Stops at the first malformed frame and returns its error.  Frames
    /// decoded before it are lost to the caller; use [`FrameDecoder::next_frame`]
    /// to keep them.
    pub fn drain_frames(&mut self) -> Result<Vec<DecodedFrame>, ProtocolError> {
        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame()? {
            frames.push(frame);
        }
        Ok(frames)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::{encode_key, encode_mouse_move};
    use crate::protocol::events::KeyCode;

    #[test]
    fn test_frames_split_across_pushes_are_reassembled() {
        // Arrange
        let mouse = encode_mouse_move(12, -34);
        let mut decoder = FrameDecoder::new();

        // Act: first half, then second half
        decoder.push(&mouse[..2]);
        let first = decoder.next_frame().unwrap();
        decoder.push(&mouse[2..]);
        let second = decoder.next_frame().unwrap();

        // Assert
        assert_eq!(first, None);
        assert_eq!(second, Some(DecodedFrame::MouseMove { dx: 12, dy: -34 }));
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_coalesced_frames_decode_in_order() {
        let mut decoder = FrameDecoder::new();
        decoder.push(&[0x00]);
        decoder.push("hi".as_bytes());
        decoder.push(&encode_key(KeyCode::Backspace));

        let frames = decoder.drain_frames().unwrap();

        assert_eq!(
            frames,
            vec![
                DecodedFrame::Heartbeat,
                DecodedFrame::Text("hi".into()),
                DecodedFrame::Key(KeyCode::Backspace),
            ]
        );
    }

    #[test]
    fn test_malformed_byte_is_skipped_after_error() {
        let mut decoder = FrameDecoder::new();
        decoder.push(&[0xBF, 0x00]);

        assert!(decoder.next_frame().is_err());
        assert_eq!(decoder.next_frame(), Ok(Some(DecodedFrame::Heartbeat)));
    }
}
