use super::types::*;
use std::collections::VecDeque;

/// Prompts longer than this are cut in history listings.
pub const PROMPT_DISPLAY_LEN: usize = 80;

/// Bounded job audit trail, most recent first.
#[derive(Debug)]
pub struct HistoryLedger {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
}

impl HistoryLedger {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit,
        }
    }

    /// Inserts at the head and evicts from the tail once over the limit.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.limit);
    }

    /// Returns false when the entry has been evicted or already reached a
    /// terminal status; terminal entries are never rewritten.
    pub fn update(&mut self, id: &str, update: HistoryUpdate) -> bool {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) if entry.status.is_terminal() => false,
            Some(entry) => {
                entry.apply(update);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// One summary line per entry for the first `count` entries.
    pub fn preview(&self, count: usize) -> Vec<String> {
        self.entries
            .iter()
            .take(count)
            .enumerate()
            .map(|(index, entry)| {
                format!(
                    "{}. [{}] {}: {}",
                    index + 1,
                    entry.status,
                    entry.mode,
                    display_prompt(&entry.prompt)
                )
            })
            .collect()
    }
}

fn display_prompt(prompt: &str) -> String {
    if prompt.chars().count() > PROMPT_DISPLAY_LEN {
        let cut: String = prompt.chars().take(PROMPT_DISPLAY_LEN).collect();
        format!("{}...", cut)
    } else {
        prompt.to_string()
    }
}
