//! In-memory record store keyed by normalized name and slug.
//!
//! Records live in slots; the key index maps each lookup key to a slot, and every slot keeps
//! the list of keys currently pointing at it. Removing a record therefore touches only its own
//! keys. When a later insert claims a key, the previous owner loses that key but stays
//! reachable under the rest; a record left with no keys is dropped.

use std::collections::HashMap;

use crate::data::record::{normalize_key, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(usize);

#[derive(Debug, Clone)]
struct Slot {
    record: Record,
    keys: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    slots: Vec<Option<Slot>>,
    index: HashMap<String, RecordId>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct live records (not keys).
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Index `record` under its name and slug keys, taking those keys from whichever records
    /// held them. Returns `None` when the record has no usable key.
    pub fn insert(&mut self, record: Record) -> Option<RecordId> {
        let keys = record.index_keys();
        if keys.is_empty() {
            return None;
        }
        let id = RecordId(self.slots.len());
        for key in &keys {
            if let Some(previous) = self.index.insert(key.clone(), id) {
                self.detach_key(previous, key);
            }
        }
        self.slots.push(Some(Slot { record, keys }));
        Some(id)
    }

    fn detach_key(&mut self, id: RecordId, key: &str) {
        let Some(slot) = self.slots.get_mut(id.0) else {
            return;
        };
        let orphaned = match slot {
            Some(live) => {
                live.keys.retain(|k| k != key);
                live.keys.is_empty()
            }
            None => false,
        };
        if orphaned {
            *slot = None;
        }
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.slots
            .get(id.0)
            .and_then(Option::as_ref)
            .map(|slot| &slot.record)
    }

    /// Keys currently resolving to `id`.
    pub fn keys_of(&self, id: RecordId) -> &[String] {
        self.slots
            .get(id.0)
            .and_then(Option::as_ref)
            .map(|slot| slot.keys.as_slice())
            .unwrap_or(&[])
    }

    /// Record the index currently maps `key` to, without the scan fallback.
    pub fn owner_of(&self, key: &str) -> Option<&Record> {
        self.index
            .get(&normalize_key(key))
            .and_then(|&id| self.get(id))
    }

    /// Two-phase lookup: direct key hit first, then a scan over every live record's
    /// normalized name and slug.
    pub fn find_id(&self, query: &str) -> Option<RecordId> {
        let key = normalize_key(query);
        if key.is_empty() {
            return None;
        }
        if let Some(&id) = self.index.get(&key) {
            return Some(id);
        }
        self.slots.iter().enumerate().find_map(|(i, slot)| {
            slot.as_ref()
                .filter(|live| live.record.matches_key(&key))
                .map(|_| RecordId(i))
        })
    }

    pub fn find(&self, query: &str) -> Option<&Record> {
        self.find_id(query).and_then(|id| self.get(id))
    }

    /// True when a live record already answers to `record`'s name or slug.
    pub fn conflicts_with(&self, record: &Record) -> bool {
        self.find_id(&record.name).is_some()
            || (!record.slug.trim().is_empty() && self.find_id(&record.slug).is_some())
    }

    /// Remove a record and every key pointing at it.
    pub fn remove(&mut self, id: RecordId) -> Option<Record> {
        let slot = self.slots.get_mut(id.0)?.take()?;
        for key in &slot.keys {
            if self.index.get(key) == Some(&id) {
                self.index.remove(key);
            }
        }
        Some(slot.record)
    }

    /// Live records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.slots.iter().flatten().map(|slot| &slot.record)
    }
}
