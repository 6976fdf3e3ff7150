use std::collections::VecDeque;

use parking_lot::RwLock;
use tracing::info;

use crate::identity::Navigator;

/// Locations kept for `history`; older entries are dropped.
pub const HISTORY_LIMIT: usize = 64;

/// Location history of the console. The most recent navigation is the current page.
#[derive(Debug)]
pub struct HistoryNavigator {
    history: RwLock<VecDeque<String>>,
}

impl HistoryNavigator {
    pub fn new(start: impl Into<String>) -> Self {
        Self { history: RwLock::new(VecDeque::from([start.into()])) }
    }

    pub fn current(&self) -> String {
        self.history.read().back().cloned().unwrap_or_else(|| "/".to_string())
    }

    /// Oldest first, at most `HISTORY_LIMIT` entries.
    pub fn history(&self) -> Vec<String> { self.history.read().iter().cloned().collect() }

    /// Operator-initiated navigation; same bookkeeping as a guard redirect.
    pub fn push(&self, path: &str) { self.navigate(path) }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, path: &str) {
        let mut h = self.history.write();
        if h.back().map(String::as_str) == Some(path) {
            return;
        }
        info!(target: "reg_console::nav", "navigate {}", path);
        if h.len() == HISTORY_LIMIT {
            h.pop_front();
        }
        h.push_back(path.to_string());
    }
}
