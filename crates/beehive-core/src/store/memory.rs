use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use beehive_parser::{DataType, Measurement};
use chrono::{DateTime, Utc};

use super::MeasurementStore;
use crate::error::StoreError;

/// One `insert_many` call as seen by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertCall {
    pub kind: DataType,
    pub attempted: usize,
    pub accepted: bool,
}

#[derive(Debug, Default)]
struct Inner {
    collections: HashMap<DataType, Vec<Measurement>>,
    calls: Vec<InsertCall>,
    failing_calls: HashSet<usize>,
}

/// Process-local store for dry runs and tests. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the given 0-based `insert_many` calls fail with a constraint error.
    pub fn fail_calls(&self, calls: impl IntoIterator<Item = usize>) {
        self.lock().failing_calls.extend(calls);
    }

    pub fn calls(&self) -> Vec<InsertCall> {
        self.lock().calls.clone()
    }

    pub fn records(&self, kind: DataType) -> Vec<Measurement> {
        self.lock()
            .collections
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means a test thread panicked mid-call.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl MeasurementStore for InMemoryStore {
    async fn insert_many(
        &self,
        kind: DataType,
        records: &[Measurement],
    ) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let call_index = inner.calls.len();
        let accepted = !inner.failing_calls.contains(&call_index);
        inner.calls.push(InsertCall {
            kind,
            attempted: records.len(),
            accepted,
        });

        if !accepted {
            return Err(StoreError::Constraint {
                kind: kind.as_str(),
                attempted: records.len(),
                count: 1,
            });
        }

        inner
            .collections
            .entry(kind)
            .or_default()
            .extend(records.iter().cloned());
        Ok(records.len() as u64)
    }

    async fn latest(
        &self,
        kind: DataType,
        hive_id: i32,
    ) -> Result<Option<Measurement>, StoreError> {
        let inner = self.lock();
        let latest = inner
            .collections
            .get(&kind)
            .into_iter()
            .flatten()
            .filter(|m| m.hive_id() == hive_id)
            .max_by_key(|m| m.date())
            .cloned();
        Ok(latest)
    }

    async fn within(
        &self,
        kind: DataType,
        hive_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Measurement>, StoreError> {
        let inner = self.lock();
        let mut readings: Vec<Measurement> = inner
            .collections
            .get(&kind)
            .into_iter()
            .flatten()
            .filter(|m| m.hive_id() == hive_id && m.date() >= start && m.date() <= end)
            .cloned()
            .collect();
        readings.sort_by_key(|m| m.date());
        Ok(readings)
    }
}
