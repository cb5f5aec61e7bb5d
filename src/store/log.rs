//! Append-only keyed logs
//!
//! Used for both chat transcripts and research notes. Insertion order is the
//! chronological order; nothing is ever evicted.

use dashmap::DashMap;
use tracing::debug;

/// Ordered string sequences keyed by room, topic or branch
pub struct AppendLog {
    /// Short label used in log lines
    name: &'static str,
    entries: DashMap<String, Vec<String>>,
}

impl AppendLog {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: DashMap::new(),
        }
    }

    /// Append an entry, creating the sequence on first use.
    ///
    /// Returns the new length of the sequence.
    pub fn append(&self, key: &str, entry: String) -> usize {
        let mut seq = self.entries.entry(key.to_string()).or_default();
        seq.push(entry);
        let len = seq.len();
        drop(seq);

        debug!(log = self.name, key = %key, len, "Appended entry");
        len
    }

    /// Copy of the sequence for `key`; empty when the key was never used
    pub fn entries(&self, key: &str) -> Vec<String> {
        self.entries
            .get(key)
            .map(|seq| seq.clone())
            .unwrap_or_default()
    }

    /// Most recent entry for `key`
    pub fn last(&self, key: &str) -> Option<String> {
        self.entries.get(key).and_then(|seq| seq.last().cloned())
    }

    /// Number of keys with at least one entry
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let log = AppendLog::new("test");
        for msg in ["m1", "m2", "m3"] {
            log.append("room", msg.to_string());
        }
        assert_eq!(log.entries("room"), vec!["m1", "m2", "m3"]);
        assert_eq!(log.last("room").as_deref(), Some("m3"));
    }

    #[test]
    fn test_unknown_key_is_empty() {
        let log = AppendLog::new("test");
        assert!(log.entries("ghost").is_empty());
        assert!(log.last("ghost").is_none());
        assert!(log.is_empty());
    }

    #[test]
    fn test_empty_string_is_kept() {
        let log = AppendLog::new("test");
        assert_eq!(log.append("algebra", String::new()), 1);
        assert_eq!(log.entries("algebra"), vec![String::new()]);
    }
}
