//! Edit-hint trimming and the placeholder-buffer protocol.
//!
//! The input field always holds at least one character, a single space, so
//! that a backspace on an "empty" field still produces an edit to report.
//! When the buffer becomes empty or a newline is typed, the UI layer swaps
//! the contents back to the placeholder; [`TextDiffer::after_text_changed`]
//! tells it when to do so and makes sure that programmatic swap is not
//! itself transmitted.

use tracing::{debug, trace};

use crate::protocol::events::{KeyCode, SemanticInputEvent};

/// Contents the input field is reset to after a newline or when emptied.
pub const PLACEHOLDER: &str = " ";

/// The platform's description of one buffer change, in characters.
///
/// `removed` characters starting at `start` in the old buffer were replaced
/// by `inserted` characters starting at `start` in the new buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEdit {
    pub start: usize,
    pub removed: usize,
    pub inserted: usize,
}

impl TextEdit {
    pub fn new(start: usize, removed: usize, inserted: usize) -> Self {
        Self {
            start,
            removed,
            inserted,
        }
    }
}

/// Computes the minimal replay of one edit.
///
/// The hinted removed and inserted ranges are compared character by
/// character; their common prefix is left alone.  The result is zero or more
/// `Backspace` keys followed by at most one `TextRun`.  Hints that run past
/// the end of either buffer are clamped.
///
/// ```rust
/// use padlink_core::text::{diff_edit, TextEdit};
/// use padlink_core::{KeyCode, SemanticInputEvent};
///
/// // Autocorrect rewrote "cat" as "car".
/// let events = diff_edit("cat", "car", TextEdit::new(0, 3, 3));
/// assert_eq!(
///     events,
///     vec![
///         SemanticInputEvent::SpecialKey(KeyCode::Backspace),
///         SemanticInputEvent::TextRun("r".into()),
///     ]
/// );
/// ```
pub fn diff_edit(before: &str, after: &str, edit: TextEdit) -> Vec<SemanticInputEvent> {
    let removed: Vec<char> = before.chars().skip(edit.start).take(edit.removed).collect();
    let inserted: Vec<char> = after.chars().skip(edit.start).take(edit.inserted).collect();

    if removed.len() != edit.removed || inserted.len() != edit.inserted {
        debug!(?edit, "edit hint exceeds buffer; clamped");
    }

    let common = removed
        .iter()
        .zip(inserted.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let backspaces = removed.len() - common;
    let text: String = inserted[common..].iter().collect();

    let mut events = Vec::with_capacity(backspaces + 1);
    events.extend(
        std::iter::repeat(SemanticInputEvent::SpecialKey(KeyCode::Backspace)).take(backspaces),
    );
    if !text.is_empty() {
        events.push(SemanticInputEvent::TextRun(text));
    }
    events
}

/// Stateful wrapper around [`diff_edit`] that skips programmatic edits.
#[derive(Debug, Default)]
pub struct TextDiffer {
    ignore_next: bool,
}

impl TextDiffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replays one user edit, or nothing if the edit was marked programmatic.
    pub fn on_text_changed(
        &mut self,
        before: &str,
        after: &str,
        edit: TextEdit,
    ) -> Vec<SemanticInputEvent> {
        if self.ignore_next {
            self.ignore_next = false;
            trace!("skipping programmatic buffer change");
            return Vec::new();
        }
        diff_edit(before, after, edit)
    }

    /// Inspects the buffer after a change has been applied.
    ///
    /// Returns `Some(PLACEHOLDER)` when the buffer is empty or contains a
    /// newline.  The caller must then replace the buffer with it; the change
    /// that replacement reports is ignored.
    pub fn after_text_changed(&mut self, buffer: &str) -> Option<&'static str> {
        if buffer.is_empty() || buffer.contains('\n') {
            self.ignore_next = true;
            Some(PLACEHOLDER)
        } else {
            None
        }
    }

    /// Marks the next reported change as programmatic.
    pub fn ignore_next_change(&mut self) {
        self.ignore_next = true;
    }

    pub fn is_ignoring(&self) -> bool {
        self.ignore_next
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const BACKSPACE: SemanticInputEvent = SemanticInputEvent::SpecialKey(KeyCode::Backspace);

    fn text(s: &str) -> SemanticInputEvent {
        SemanticInputEvent::TextRun(s.to_string())
    }

    #[test]
    fn test_insert_into_empty_buffer_is_one_text_run() {
        let events = diff_edit("", "hello", TextEdit::new(0, 0, 5));
        assert_eq!(events, vec![text("hello")]);
    }

    #[test]
    fn test_autocorrect_suffix_rewrite_sends_only_the_difference() {
        let events = diff_edit("cat", "car", TextEdit::new(0, 3, 3));
        assert_eq!(events, vec![BACKSPACE, text("r")]);
    }

    #[test]
    fn test_pure_deletion_sends_backspaces_only() {
        let events = diff_edit(" hello", " he", TextEdit::new(3, 3, 0));
        assert_eq!(events, vec![BACKSPACE, BACKSPACE, BACKSPACE]);
    }

    #[test]
    fn test_replacement_with_longer_word() {
        // "teh" -> "the": common prefix "t"
        let events = diff_edit(" teh", " the", TextEdit::new(1, 3, 3));
        assert_eq!(events, vec![BACKSPACE, BACKSPACE, text("he")]);
    }

    #[test]
    fn test_identical_replacement_emits_nothing() {
        assert!(diff_edit(" word", " word", TextEdit::new(1, 4, 4)).is_empty());
    }

    #[test]
    fn test_indices_count_characters_not_bytes() {
        // "é" is two bytes in UTF-8 but one character.
        let events = diff_edit(" café", " cafés", TextEdit::new(1, 4, 5));
        assert_eq!(events, vec![text("s")]);
    }

    #[test]
    fn test_hint_past_end_is_clamped() {
        let events = diff_edit("ab", "abc", TextEdit::new(1, 10, 10));
        assert_eq!(events, vec![text("c")]);
    }

    #[test]
    fn test_newline_triggers_placeholder_and_one_ignored_change() {
        // Arrange
        let mut differ = TextDiffer::new();

        // Act: user types Enter
        let typed = differ.on_text_changed(" hi", " hi\n", TextEdit::new(3, 0, 1));
        let reset = differ.after_text_changed(" hi\n");
        let programmatic = differ.on_text_changed(" hi\n", PLACEHOLDER, TextEdit::new(0, 4, 1));
        let next = differ.on_text_changed(" ", " x", TextEdit::new(1, 0, 1));

        // Assert
        assert_eq!(typed, vec![text("\n")]);
        assert_eq!(reset, Some(PLACEHOLDER));
        assert!(programmatic.is_empty());
        assert_eq!(next, vec![text("x")]);
    }

    #[test]
    fn test_deleting_placeholder_sends_backspace_then_restores_it() {
        let mut differ = TextDiffer::new();

        let events = differ.on_text_changed(" ", "", TextEdit::new(0, 1, 0));
        let reset = differ.after_text_changed("");

        assert_eq!(events, vec![BACKSPACE]);
        assert_eq!(reset, Some(PLACEHOLDER));
        assert!(differ.is_ignoring());
    }

    #[test]
    fn test_ordinary_buffer_needs_no_reset() {
        let mut differ = TextDiffer::new();
        assert_eq!(differ.after_text_changed(" abc"), None);
        assert!(!differ.is_ignoring());
    }
}
