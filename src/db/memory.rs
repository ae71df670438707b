// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store used by tests and `DATABASE_BACKEND=memory`.
//!
//! Documents are kept as JSON values so they go through the same serde
//! round trip as Firestore documents.

use crate::error::AppError;
use dashmap::{mapref::entry::Entry, DashMap};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;

type DocKey = (String, String);

/// Process-local document store. Cheap to clone; clones share data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    docs: Arc<DashMap<DocKey, Value>>,
}

fn key(collection: &str, id: &str) -> DocKey {
    (collection.to_string(), id.to_string())
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Database(e.to_string()))
}

fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T, AppError> {
    serde_json::from_value(value.clone()).map_err(|e| AppError::Database(e.to_string()))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned,
    {
        self.docs
            .get(&key(collection, id))
            .map(|doc| from_value(doc.value()))
            .transpose()
    }

    pub async fn set<T>(&self, collection: &str, id: &str, value: &T) -> Result<(), AppError>
    where
        T: Serialize,
    {
        self.docs.insert(key(collection, id), to_value(value)?);
        Ok(())
    }

    pub async fn insert<T>(&self, collection: &str, id: &str, value: &T) -> Result<bool, AppError>
    where
        T: Serialize,
    {
        let value = to_value(value)?;
        match self.docs.entry(key(collection, id)) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(true)
            }
        }
    }

    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.docs.remove(&key(collection, id));
        Ok(())
    }

    pub async fn find_eq<T>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        order_field: &str,
        limit: u32,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned,
    {
        let mut matches: Vec<Value> = self
            .docs
            .iter()
            .filter(|doc| doc.key().0 == collection)
            .filter(|doc| doc.value().get(field).and_then(Value::as_str) == Some(value))
            .map(|doc| doc.value().clone())
            .collect();

        // RFC3339 timestamps sort lexically
        matches.sort_by(|a, b| {
            let a = a.get(order_field).and_then(Value::as_str).unwrap_or("");
            let b = b.get(order_field).and_then(Value::as_str).unwrap_or("");
            b.cmp(a)
        });

        matches
            .iter()
            .take(limit as usize)
            .map(from_value)
            .collect()
    }

    /// Read-modify-write under the shard lock for this document.
    pub async fn modify<T, R, F>(&self, collection: &str, id: &str, f: F) -> Result<R, AppError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(Option<T>) -> Result<(Option<T>, R), AppError> + Send,
    {
        match self.docs.entry(key(collection, id)) {
            Entry::Occupied(mut slot) => {
                let current = from_value(slot.get())?;
                let (replacement, output) = f(Some(current))?;
                if let Some(replacement) = replacement {
                    slot.insert(to_value(&replacement)?);
                }
                Ok(output)
            }
            Entry::Vacant(slot) => {
                let (replacement, output) = f(None)?;
                if let Some(replacement) = replacement {
                    slot.insert(to_value(&replacement)?);
                }
                Ok(output)
            }
        }
    }
}
