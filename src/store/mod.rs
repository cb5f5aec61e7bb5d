//! Shared in-memory data store
//!
//! One `Store` is built at startup and handed to every component behind an
//! `Arc`. Each logical store owns its own sharded lock (`DashMap`), so a single
//! append or credit is atomic and concurrent writers cannot lose updates.
//!
//! Nothing here is persisted; the lifetime of the data is the process.

mod ledger;
mod log;
pub mod taxonomy;

pub use ledger::Ledger;
pub use log::AppendLog;
pub use taxonomy::{KnowledgeArea, Taxonomy};

use std::path::Path;

use crate::types::Result;

/// Process-wide application data
pub struct Store {
    /// Running payment totals per user id
    pub ledger: Ledger,
    /// Chat transcript per room (user id)
    pub chat: AppendLog,
    /// Published research notes per topic or branch
    pub research: AppendLog,
    /// Static topic/branch/rule tables
    pub taxonomy: Taxonomy,
}

impl Store {
    /// Create an empty store around the given taxonomy
    pub fn new(taxonomy: Taxonomy) -> Self {
        Self {
            ledger: Ledger::new(),
            chat: AppendLog::new("chat"),
            research: AppendLog::new("research"),
            taxonomy,
        }
    }

    /// Create a store, loading the taxonomy from a JSON file when given
    pub fn load(taxonomy_file: Option<&Path>) -> Result<Self> {
        let taxonomy = match taxonomy_file {
            Some(path) => Taxonomy::from_file(path)?,
            None => Taxonomy::builtin(),
        };
        Ok(Self::new(taxonomy))
    }

    /// Snapshot counters for the health endpoint
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            ledger_accounts: self.ledger.len(),
            chat_rooms: self.chat.len(),
            research_topics: self.research.len(),
            taxonomy_topics: self.taxonomy.functions().len(),
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(Taxonomy::builtin())
    }
}

/// Store statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoreStats {
    pub ledger_accounts: usize,
    pub chat_rooms: usize,
    pub research_topics: usize,
    pub taxonomy_topics: usize,
}
