// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-process index of the entries stored in one tier directory.

use std::{
    collections::{BTreeMap, HashMap},
    time::{Duration, SystemTime},
};

use xxhash_rust::xxh3::xxh3_64;

use crate::format::Header;

/// Extension of committed entry files.
pub(crate) const ENTRY_EXTENSION: &str = "entry";
/// Extension of in-flight temp files.
pub(crate) const TEMP_EXTENSION: &str = "tmp";

/// Identifies the file of one key: the xxh3 hash of the key.
pub(crate) fn file_id(key: &str) -> u64 {
    xxh3_64(key.as_bytes())
}

pub(crate) fn file_name(id: u64) -> String {
    format!("{id:016x}.{ENTRY_EXTENSION}")
}

/// Parses a committed entry file name back into its file id.
pub(crate) fn parse_file_name(name: &str) -> Option<u64> {
    let stem = name.strip_suffix(ENTRY_EXTENSION)?.strip_suffix('.')?;
    if stem.len() != 16 {
        return None;
    }
    u64::from_str_radix(stem, 16).ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IndexEntry {
    pub(crate) key: String,
    pub(crate) size: u64,
    pub(crate) cached_at: Option<SystemTime>,
    pub(crate) ttl: Option<Duration>,
    sequence: u64,
}

impl IndexEntry {
    pub(crate) fn new(key: String, size: u64, header: &Header) -> Self {
        Self {
            key,
            size,
            cached_at: header.cached_at,
            ttl: header.ttl,
            sequence: 0,
        }
    }

    fn header(&self) -> Header {
        Header {
            cached_at: self.cached_at,
            ttl: self.ttl,
            key_len: self.key.len(),
        }
    }
}

/// Entries by file id, plus the order in which they were written.
#[derive(Debug, Default)]
pub(crate) struct Index {
    entries: HashMap<u64, IndexEntry>,
    write_order: BTreeMap<u64, u64>,
    next_sequence: u64,
    size: u64,
}

impl Index {
    /// Builds an index from scanned entries, ordering them by their stored write time.
    pub(crate) fn from_scan(mut scanned: Vec<(u64, IndexEntry)>) -> Self {
        scanned.sort_by_key(|(_, entry)| entry.cached_at.unwrap_or(SystemTime::UNIX_EPOCH));
        let mut index = Self::default();
        for (id, entry) in scanned {
            index.record(id, entry);
        }
        index
    }

    pub(crate) fn len(&self) -> u64 {
        self.entries.len() as u64
    }

    pub(crate) fn size(&self) -> u64 {
        self.size
    }

    /// Returns the entry stored under `id` if it belongs to `key`.
    pub(crate) fn get(&self, id: u64, key: &str) -> Option<&IndexEntry> {
        self.entries.get(&id).filter(|entry| entry.key == key)
    }

    pub(crate) fn contains(&self, id: u64) -> bool {
        self.entries.contains_key(&id)
    }

    /// Records a freshly written entry as the newest one, replacing whatever the file held before.
    pub(crate) fn record(&mut self, id: u64, mut entry: IndexEntry) {
        self.remove(id);
        entry.sequence = self.next_sequence;
        self.next_sequence += 1;
        self.size += entry.size;
        self.write_order.insert(entry.sequence, id);
        self.entries.insert(id, entry);
    }

    pub(crate) fn remove(&mut self, id: u64) -> Option<IndexEntry> {
        let entry = self.entries.remove(&id)?;
        self.write_order.remove(&entry.sequence);
        self.size -= entry.size;
        Some(entry)
    }

    /// Returns the oldest-written entries that must go for the total size to fit in `max_size`.
    pub(crate) fn eviction_candidates(&self, max_size: u64) -> Vec<u64> {
        let mut size = self.size;
        self.write_order
            .values()
            .take_while(|id| {
                let over = size > max_size;
                if over {
                    size -= self.entries.get(id).map_or(0, |entry| entry.size);
                }
                over
            })
            .copied()
            .collect()
    }

    /// Returns every entry expired at `now` under `ttl`.
    pub(crate) fn expired(&self, now: SystemTime, ttl: Option<Duration>) -> Vec<u64> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.header().is_expired_at(now, ttl))
            .map(|(id, _)| *id)
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.write_order.clear();
        self.size = 0;
    }
}
