// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Durable CRUD of subscription descriptors, kept behind a trait so a
//! runnable service can swap implementations; this one mirrors the
//! append-only-log-plus-index shape used by `JsonFilePendingStore`.

use crate::error::StoreError;
use crate::model::{NetworkId, Subscription, SubscriptionId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

#[async_trait]
pub trait SubscriptionStore: Send + Sync + std::fmt::Debug {
    async fn insert(&self, subscription: Subscription) -> Result<(), StoreError>;
    async fn remove(&self, id: &SubscriptionId) -> Result<(), StoreError>;
    async fn get_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, StoreError>;
    async fn get_by_network_id(&self, chain: &NetworkId) -> Result<Vec<Subscription>, StoreError>;
    async fn list_all(&self) -> Result<Vec<Subscription>, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemorySubscriptionStore {
    entries: Mutex<HashMap<SubscriptionId, Subscription>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn insert(&self, subscription: Subscription) -> Result<(), StoreError> {
        self.entries
            .lock()
            .await
            .insert(subscription.id.clone(), subscription);
        Ok(())
    }

    async fn remove(&self, id: &SubscriptionId) -> Result<(), StoreError> {
        self.entries.lock().await.remove(id);
        Ok(())
    }

    async fn get_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, StoreError> {
        Ok(self.entries.lock().await.get(id).cloned())
    }

    async fn get_by_network_id(&self, chain: &NetworkId) -> Result<Vec<Subscription>, StoreError> {
        Ok(self
            .entries
            .lock()
            .await
            .values()
            .filter(|s| &s.origin == chain || s.destinations.contains(chain))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Subscription>, StoreError> {
        Ok(self.entries.lock().await.values().cloned().collect())
    }
}

/// File-backed store: a JSON-lines write-ahead log of put/delete records,
/// folded into an in-memory index on open. Only non-ephemeral
/// subscriptions are ever handed to this store -- the Switchboard keeps
/// ephemeral descriptors purely in memory.
#[derive(Debug)]
pub struct JsonFileSubscriptionStore {
    inner: InMemorySubscriptionStore,
    file: Mutex<Option<tokio::fs::File>>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op")]
enum WalRecord {
    Put(Subscription),
    Delete { id: SubscriptionId },
}

impl JsonFileSubscriptionStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let inner = InMemorySubscriptionStore::new();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        if let Ok(file) = tokio::fs::File::open(&path).await {
            let mut reader = BufReader::new(file).lines();
            let mut map = inner.entries.lock().await;
            while let Some(line) = reader.next_line().await? {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<WalRecord>(&line)? {
                    WalRecord::Put(sub) => {
                        map.insert(sub.id.clone(), sub);
                    }
                    WalRecord::Delete { id } => {
                        map.remove(&id);
                    }
                }
            }
        }

        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            inner,
            file: Mutex::new(Some(file)),
        })
    }

    async fn append(&self, record: &WalRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut guard = self.file.lock().await;
        if let Some(file) = guard.as_mut() {
            file.write_all(line.as_bytes()).await?;
            file.flush().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for JsonFileSubscriptionStore {
    async fn insert(&self, subscription: Subscription) -> Result<(), StoreError> {
        self.append(&WalRecord::Put(subscription.clone())).await?;
        self.inner.insert(subscription).await
    }

    async fn remove(&self, id: &SubscriptionId) -> Result<(), StoreError> {
        self.append(&WalRecord::Delete { id: id.clone() }).await?;
        self.inner.remove(id).await
    }

    async fn get_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, StoreError> {
        self.inner.get_by_id(id).await
    }

    async fn get_by_network_id(&self, chain: &NetworkId) -> Result<Vec<Subscription>, StoreError> {
        self.inner.get_by_network_id(chain).await
    }

    async fn list_all(&self) -> Result<Vec<Subscription>, StoreError> {
        self.inner.list_all().await
    }
}
