//! In-memory record collection. The store is the only writer of the base
//! collection; views read `records()` and recompute their filtered subset
//! after every mutation.

use std::collections::HashSet;

use chrono::Utc;

use crate::error::AdminError;
use crate::models::{Record, RecordFields, RecordId, RecordPatch};

/// Source of the millisecond timestamps new identifiers are derived from.
pub type Clock = fn() -> u64;

fn wall_clock_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    records: Vec<Record>,
    /// Highest numeric id issued or loaded so far. New ids exceed it until
    /// it reaches `u64::MAX`.
    high_water: u64,
    clock: Clock,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    pub fn new() -> Self {
        Self::with_clock(wall_clock_millis)
    }

    /// Build a store whose ids come from `clock` instead of the wall clock.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            records: Vec::new(),
            high_water: 0,
            clock,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|record| record.id == *id)
    }

    /// Replace the base collection wholesale. When the input repeats an id,
    /// the first occurrence wins so ids stay unique.
    pub fn load(&mut self, initial: Vec<Record>) {
        let mut seen = HashSet::with_capacity(initial.len());
        self.records = initial
            .into_iter()
            .filter(|record| seen.insert(record.id.clone()))
            .collect();
        if let Some(max) = self.records.iter().filter_map(|record| record.id.number()).max() {
            self.high_water = self.high_water.max(max);
        }
    }

    /// Append a new record with a fresh id and return it.
    pub fn create(&mut self, fields: RecordFields) -> Record {
        let record = Record {
            id: self.next_id(),
            first_name: fields.first_name,
            last_name: fields.last_name,
            category: fields.category,
        };
        self.records.push(record.clone());
        record
    }

    /// Apply `patch` to the record with `id`. The id itself never changes.
    pub fn update(&mut self, id: RecordId, patch: RecordPatch) -> Result<Record, AdminError> {
        let record = self
            .records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(AdminError::NotFound(id))?;
        patch.apply_to(record);
        Ok(record.clone())
    }

    /// Remove the record with `id`, returning it. The collection is left
    /// untouched when nothing matches.
    pub fn delete(&mut self, id: RecordId) -> Result<Record, AdminError> {
        let index = self
            .records
            .iter()
            .position(|record| record.id == id)
            .ok_or(AdminError::NotFound(id))?;
        Ok(self.records.remove(index))
    }

    fn next_id(&mut self) -> RecordId {
        let now = (self.clock)();
        if let Some(next) = self.high_water.checked_add(1) {
            let candidate = now.max(next);
            self.high_water = candidate;
            return RecordId::new(candidate);
        }

        // The numeric range above the high-water mark is used up; take the
        // first free number from the clock onwards.
        let mut candidate = now;
        while self.get(&RecordId::new(candidate)).is_some() {
            candidate = candidate.wrapping_add(1);
        }
        RecordId::new(candidate)
    }
}
