//! Cumulative reply text.
//!
//! Consumers always receive the whole reply so far, never a bare delta. Some
//! legacy servers prefix the first delta with a role label; it is removed
//! once, at the start of the reply, and never again.

use crate::defaults::protocol::LEGACY_ROLE_PREFIX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrefixState {
    // The reply so far could still turn into the label.
    Undecided,
    Settled,
}

#[derive(Debug)]
pub struct TextAccumulator {
    text: String,
    prefix: PrefixState,
}

impl TextAccumulator {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            prefix: PrefixState::Undecided,
        }
    }

    /// Accumulator that never strips the role label (used with custom normalizers).
    pub fn verbatim() -> Self {
        Self {
            text: String::new(),
            prefix: PrefixState::Settled,
        }
    }

    /// Append a delta. Returns the new cumulative text when there is
    /// something to emit; empty deltas and an empty reply emit nothing.
    pub fn push(&mut self, delta: &str) -> Option<&str> {
        if delta.is_empty() {
            return None;
        }
        self.text.push_str(delta);

        if self.prefix == PrefixState::Undecided {
            if self.text.starts_with(LEGACY_ROLE_PREFIX) {
                self.text.drain(..LEGACY_ROLE_PREFIX.len());
                self.prefix = PrefixState::Settled;
            } else if !LEGACY_ROLE_PREFIX.starts_with(self.text.as_str()) {
                self.prefix = PrefixState::Settled;
            }
        }

        if self.text.is_empty() {
            None
        } else {
            Some(self.text.as_str())
        }
    }
}

impl Default for TextAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
