/// Player-facing message log. Bounded, most recent first.

use std::collections::VecDeque;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LogEntry {
    pub id: u64,
    pub message: String,
    /// Session clock time the entry was written.
    pub at_ms: u64,
}

#[derive(Clone, Debug)]
pub struct LogBook {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    next_id: u64,
}

impl LogBook {
    pub fn new(capacity: usize) -> Self {
        LogBook { entries: VecDeque::with_capacity(capacity + 1), capacity, next_id: 0 }
    }

    pub fn push(&mut self, message: impl Into<String>, at_ms: u64) {
        let message = message.into();
        tracing::trace!(%message, "log");
        self.entries.push_front(LogEntry { id: self.next_id, message, at_ms });
        self.next_id += 1;
        self.entries.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_newest_first_and_drops_oldest() {
        let mut log = LogBook::new(3);
        for i in 0..5 {
            log.push(format!("m{i}"), i * 10);
        }
        let msgs: Vec<&str> = log.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(msgs, ["m4", "m3", "m2"]);
        assert_eq!(log.latest().map(|e| e.at_ms), Some(40));
    }

    #[test]
    fn ids_stay_unique_across_clears() {
        let mut log = LogBook::new(5);
        log.push("a", 0);
        log.clear();
        assert!(log.is_empty());
        log.push("b", 0);
        assert_eq!(log.latest().map(|e| e.id), Some(1));
    }
}
