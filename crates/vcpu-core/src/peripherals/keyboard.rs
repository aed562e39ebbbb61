//! Keyboard input queue behind the keyboard-buffer address.

use std::collections::VecDeque;

/// FIFO of key codes waiting to be read by the program.
///
/// Each read of the keyboard-buffer address consumes the front entry. The
/// queue lives for the whole session and is not cleared by program reloads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardBuffer {
    pending: VecDeque<u16>,
}

impl KeyboardBuffer {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one key code.
    pub fn push_key(&mut self, code: u16) {
        self.pending.push_back(code);
    }

    /// Queues every character of `text`, truncating code points to 16 bits.
    #[allow(clippy::cast_possible_truncation)]
    pub fn push_text(&mut self, text: &str) {
        self.pending
            .extend(text.chars().map(|ch| u32::from(ch) as u16));
    }

    /// Front entry without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<u16> {
        self.pending.front().copied()
    }

    /// Consumes the front entry.
    pub fn pop(&mut self) -> Option<u16> {
        self.pending.pop_front()
    }

    /// Number of queued entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
