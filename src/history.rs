//! In-memory command history with shell-style recall
//!
//! Walking backward with [`CommandHistory::recall_previous`] moves through
//! older commands; walking forward with [`CommandHistory::recall_next`]
//! comes back to the newest one and then to a blank line.

/// Ordered log of commands sent to the engine
#[derive(Debug, Clone, Default)]
pub struct CommandHistory {
    /// Commands in submission order
    entries: Vec<String>,
    /// Recall position; `None` when not recalling
    cursor: Option<usize>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command and leave recall mode
    ///
    /// No deduplication or trimming happens here; the caller decides what
    /// counts as a command.
    pub fn record(&mut self, command: impl Into<String>) {
        self.entries.push(command.into());
        self.cursor = None;
    }

    /// Step back to the previous (older) command
    ///
    /// Returns the text the input line should now show. With an empty
    /// history this is `current`, unchanged.
    pub fn recall_previous(&mut self, current: &str) -> String {
        if self.entries.is_empty() {
            return current.to_string();
        }
        let from = self.cursor.unwrap_or(self.entries.len());
        let index = from.saturating_sub(1);
        self.cursor = Some(index);
        self.entries[index].clone()
    }

    /// Step forward to the next (newer) command
    ///
    /// Stepping past the newest entry ends recall and yields an empty line.
    /// Outside recall mode this is a no-op that returns `current`.
    pub fn recall_next(&mut self, current: &str) -> String {
        let Some(index) = self.cursor else {
            return current.to_string();
        };
        if self.entries.is_empty() {
            return current.to_string();
        }
        let next = index + 1;
        if next < self.entries.len() {
            self.cursor = Some(next);
            self.entries[next].clone()
        } else {
            self.cursor = None;
            String::new()
        }
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent command, if any
    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }
}
