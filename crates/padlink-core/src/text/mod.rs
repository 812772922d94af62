//! Text buffer edits to backspace/insert events.
//!
//! # Why a differ? (for beginners)
//!
//! The handheld shows an ordinary text field.  Whatever the user does to it
//! (typing, deleting, accepting an autocorrect suggestion) must be replayed
//! on the remote host, which only understands "press backspace" and "type
//! these characters".  The platform tells us *where* the buffer changed and
//! how many characters were removed and inserted; [`TextDiffer`] trims that
//! hint to the part that really changed and emits the shortest replay.

pub mod differ;

pub use differ::{diff_edit, TextDiffer, TextEdit, PLACEHOLDER};
