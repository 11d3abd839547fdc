//! Open-document store — the full text of every document the client
//! currently has open, keyed by URI.
//!
//! The server runs full-document sync (capability `change: 1`), so
//! every update replaces the text wholesale. No version counters.

use std::collections::HashMap;

#[derive(Debug, Default)]
pub(crate) struct DocumentStore {
    docs: HashMap<String, String>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the text for a URI.
    pub fn upsert(&mut self, uri: &str, text: String) {
        self.docs.insert(uri.to_string(), text);
    }

    /// Drop a closed document. Unknown URIs are a no-op.
    pub fn remove(&mut self, uri: &str) {
        self.docs.remove(uri);
    }

    pub fn get(&self, uri: &str) -> Option<&str> {
        self.docs.get(uri).map(String::as_str)
    }
}
