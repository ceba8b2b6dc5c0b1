//! Soft-button navigation over MFD content.
//!
//! [`NavigationController`] is a two-mode state machine:
//! - **List**: browse the sorted group labels (or flat entries). The middle
//!   line is the highlighted entry, prefixed with `"> "`.
//! - **Detail**: browse the lines of the selected group, three at a time.
//!
//! Every cursor mutation is taken modulo the length of the collection being
//! shown, so rendering never indexes out of range. Empty collections render a
//! placeholder and ignore scrolling.
//!
//! ## Transitions
//! | Mode   | Select                                  | Up / Down        |
//! |--------|-----------------------------------------|------------------|
//! | List   | enter Detail on the highlighted key, cursor 0 | cursor ∓/± 1 mod N |
//! | Detail | back to List, cursor on the selected key | cursor ∓/± 1 mod len |
//!
//! Combined button masks apply select, then up, then down.

use crate::content::{Content, ContentMapping};
use crate::event::ButtonEvent;
use crate::page::LINE_COUNT;

/// Prefix for the highlighted list entry.
pub const CURSOR_PREFIX: &str = "> ";
/// Placeholder shown when there is nothing to browse.
pub const DEFAULT_PLACEHOLDER: &str = "-- empty --";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    List,
    Detail,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationState {
    pub mode: Mode,
    pub cursor: usize,
    /// Set only in [`Mode::Detail`].
    pub selected_key: Option<String>,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            mode: Mode::List,
            cursor: 0,
            selected_key: None,
        }
    }
}

/// Result of applying one button event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    /// The event changed (or re-confirmed) the view; re-render.
    pub accepted: bool,
    /// List-only controllers report the entry chosen with Select (the cursor
    /// then returns to the first entry).
    pub chosen: Option<String>,
}

#[derive(Clone, Debug)]
enum Entries {
    Grouped {
        keys: Vec<String>,
        details: ContentMapping,
    },
    Flat(Vec<String>),
}

#[derive(Clone, Debug)]
pub struct NavigationController {
    entries: Entries,
    state: NavigationState,
    placeholder: String,
}

#[inline]
fn wrap(index: isize, len: usize) -> usize {
    index.rem_euclid(len as isize) as usize
}

impl NavigationController {
    /// List + detail browsing over a grouped mapping.
    pub fn grouped(mapping: ContentMapping) -> Self {
        let keys = mapping.keys().cloned().collect();
        Self {
            entries: Entries::Grouped {
                keys,
                details: mapping,
            },
            state: NavigationState::default(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }

    /// List-only browsing. Entries are shown sorted.
    pub fn flat(mut entries: Vec<String>) -> Self {
        entries.sort();
        Self {
            entries: Entries::Flat(entries),
            state: NavigationState::default(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }

    pub fn from_content(content: Content) -> Self {
        match content {
            Content::Grouped(map) => Self::grouped(map),
            Content::Flat(entries) => Self::flat(entries),
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn cursor(&self) -> usize {
        self.state.cursor
    }

    /// `false` for list-only controllers.
    pub fn has_detail(&self) -> bool {
        matches!(self.entries, Entries::Grouped { .. })
    }

    /// Labels shown in List mode, in display order.
    pub fn list_entries(&self) -> &[String] {
        match &self.entries {
            Entries::Grouped { keys, .. } => keys,
            Entries::Flat(entries) => entries,
        }
    }

    /// Lines of the currently shown collection.
    fn current(&self) -> &[String] {
        match (&self.state.mode, &self.entries, &self.state.selected_key) {
            (Mode::Detail, Entries::Grouped { details, .. }, Some(key)) => {
                details.get(key).map(Vec::as_slice).unwrap_or(&[])
            }
            _ => self.list_entries(),
        }
    }

    fn step(&mut self, delta: isize) -> bool {
        let len = self.current().len();
        if len == 0 {
            return false;
        }
        self.state.cursor = wrap(self.state.cursor as isize + delta, len);
        true
    }

    fn select(&mut self) -> (bool, Option<String>) {
        match (&self.entries, self.state.mode) {
            // List-only: report the entry and jump back to the top.
            (Entries::Flat(entries), _) => {
                if entries.is_empty() {
                    return (false, None);
                }
                let chosen = entries[self.state.cursor].clone();
                self.state.cursor = 0;
                (true, Some(chosen))
            }
            (Entries::Grouped { keys, .. }, Mode::List) => {
                if keys.is_empty() {
                    return (false, None);
                }
                let key = keys[self.state.cursor].clone();
                tracing::debug!(%key, "nav: enter detail");
                self.state = NavigationState {
                    mode: Mode::Detail,
                    cursor: 0,
                    selected_key: Some(key),
                };
                (true, None)
            }
            (Entries::Grouped { keys, .. }, Mode::Detail) => {
                let cursor = self
                    .state
                    .selected_key
                    .as_ref()
                    .and_then(|key| keys.iter().position(|k| k == key))
                    .unwrap_or(0);
                tracing::debug!(cursor, "nav: back to list");
                self.state = NavigationState {
                    mode: Mode::List,
                    cursor,
                    selected_key: None,
                };
                (true, None)
            }
        }
    }

    /// Apply a debounced button event.
    pub fn apply(&mut self, buttons: ButtonEvent) -> Outcome {
        let mut outcome = Outcome::default();
        if buttons.select {
            let (accepted, chosen) = self.select();
            outcome.accepted |= accepted;
            outcome.chosen = chosen;
        }
        if buttons.up {
            outcome.accepted |= self.step(-1);
        }
        if buttons.down {
            outcome.accepted |= self.step(1);
        }
        outcome
    }

    /// The three display lines for the current state.
    pub fn render(&self) -> [String; LINE_COUNT] {
        let lines = self.current();
        let n = lines.len();
        if n == 0 {
            return [String::new(), self.placeholder.clone(), String::new()];
        }
        let c = self.state.cursor as isize;
        match self.state.mode {
            Mode::List => [
                lines[wrap(c - 1, n)].clone(),
                format!("{CURSOR_PREFIX}{}", lines[wrap(c, n)]),
                lines[wrap(c + 1, n)].clone(),
            ],
            Mode::Detail => [
                lines[wrap(c, n)].clone(),
                lines[wrap(c + 1, n)].clone(),
                lines[wrap(c + 2, n)].clone(),
            ],
        }
    }
}
