use rustyline::history::{History, SearchDirection};
use rustyline::{DefaultEditor, Result};
use std::path::PathBuf;

/// Entries listed by a bare `.history`.
const SHOWN_ENTRIES: usize = 20;

pub struct HistoryManager {
    history_file: Option<PathBuf>,
}

impl HistoryManager {
    /// `None` keeps history in memory only (`--no-history`).
    pub fn new(history_file: Option<PathBuf>) -> Self {
        Self { history_file }
    }

    pub fn load(&self, editor: &mut DefaultEditor) {
        if let Some(path) = &self.history_file {
            // A missing history file on first start is expected.
            let _ = editor.load_history(path);
        }
    }

    pub fn save(&self, editor: &mut DefaultEditor) -> Result<()> {
        match &self.history_file {
            Some(path) => editor.save_history(path),
            None => Ok(()),
        }
    }

    pub fn display(&self, editor: &DefaultEditor) {
        let history = editor.history();
        if history.is_empty() {
            println!("No history available");
            return;
        }

        println!("\nHistory:");
        println!("{}", "─".repeat(60));

        for i in history.len().saturating_sub(SHOWN_ENTRIES)..history.len() {
            if let Ok(Some(found)) = history.get(i, SearchDirection::Forward) {
                println!("{:4} │ {}", i + 1, one_line(&found.entry, 60));
            }
        }

        println!("{}", "─".repeat(60));
        println!("Use .history <n> to run entry n");
    }

    /// Entry `n`, counting from 1.
    pub fn get_entry(&self, editor: &DefaultEditor, n: usize) -> Option<String> {
        if n == 0 || n > editor.history().len() {
            return None;
        }
        editor
            .history()
            .get(n - 1, SearchDirection::Forward)
            .ok()
            .flatten()
            .map(|found| found.entry.to_string())
    }
}

/// Collapse whitespace and clip to `width` characters for a single listing line.
fn one_line(entry: &str, width: usize) -> String {
    let flat = entry.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > width {
        let clipped: String = flat.chars().take(width - 3).collect();
        format!("{}...", clipped)
    } else {
        flat
    }
}
