use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::delivery::bookmarklet::Bookmarklet;
use crate::synth::program::InjectionProgram;

/// Issued bookmarklets, live until their expiry. Nothing is persisted.
///
/// Expired entries are removed on access and by [`BookmarkletStore::sweep`];
/// a caller holding a store should sweep on a timer.
#[derive(Debug, Default)]
pub struct BookmarkletStore {
    entries: BTreeMap<String, Bookmarklet>,
}

impl BookmarkletStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Package and register `program`. Re-issuing the same program replaces
    /// the earlier entry (and its expiry).
    pub fn issue(&mut self, program: &InjectionProgram) -> Bookmarklet {
        let bookmarklet = Bookmarklet::from_program(program);
        info!(
            id = %bookmarklet.id,
            expires_at = %bookmarklet.expires_at,
            "issued bookmarklet"
        );
        self.entries
            .insert(bookmarklet.id.clone(), bookmarklet.clone());
        bookmarklet
    }

    /// Live bookmarklet for `id`. An expired entry is removed and `None`
    /// returned.
    pub fn get(&mut self, id: &str, now: DateTime<Utc>) -> Option<&Bookmarklet> {
        let expired = self.entries.get(id)?.is_expired_at(now);
        if expired {
            self.entries.remove(id);
            debug!(id, "bookmarklet expired on access");
            return None;
        }
        self.entries.get(id)
    }

    /// Remove every entry expired at `now` and return their ids.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> Vec<String> {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, b)| b.is_expired_at(now))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            self.entries.remove(id);
        }
        if !expired.is_empty() {
            info!(removed = expired.len(), "swept expired bookmarklets");
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
