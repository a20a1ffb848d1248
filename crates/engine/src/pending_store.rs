// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! The durable keyed map of pending half-matches, partitioned into
//! `outbound`/`inbound`/`relay` namespaces. The store itself supplies
//! no cross-key locking; the `MatchingEngine`
//! serializes `get -> delete-or-put` sequences with its own mutex.

use crate::error::StoreError;
use crate::model::PendingEntry;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

/// The three logical partitions a pending entry can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Outbound,
    Inbound,
    Relay,
}

impl Namespace {
    fn prefix(self) -> &'static str {
        match self {
            Namespace::Outbound => "outbound",
            Namespace::Inbound => "inbound",
            Namespace::Relay => "relay",
        }
    }

    /// Combines the namespace with the caller-supplied key so a single
    /// backing map or file can hold all three namespaces under ordered
    /// prefix iteration.
    fn full_key(self, key: &str) -> String {
        format!("{}:{}", self.prefix(), key)
    }
}

#[async_trait]
pub trait PendingStore: Send + Sync + std::fmt::Debug {
    async fn get(&self, ns: Namespace, key: &str) -> Result<Option<PendingEntry>, StoreError>;
    async fn put(&self, ns: Namespace, key: &str, entry: PendingEntry) -> Result<(), StoreError>;
    async fn delete(&self, ns: Namespace, key: &str) -> Result<(), StoreError>;

    /// Entries in any namespace whose `expires_at_millis <= now`.
    async fn iter_expired(
        &self,
        now_millis: u64,
    ) -> Result<Vec<(Namespace, String, PendingEntry)>, StoreError>;

    /// Removes `sub_id` from every entry's `subscription_ids`, deleting
    /// entries that become empty as a result.
    async fn clear_for_subscription(&self, sub_id: &str) -> Result<(), StoreError>;
}

fn namespace_of(full_key: &str) -> Option<Namespace> {
    let (prefix, _) = full_key.split_once(':')?;
    match prefix {
        "outbound" => Some(Namespace::Outbound),
        "inbound" => Some(Namespace::Inbound),
        "relay" => Some(Namespace::Relay),
        _ => None,
    }
}

/// In-process pending store backed by an ordered map. Used by default for
/// ephemeral-only deployments and throughout the test suite.
#[derive(Debug, Default)]
pub struct InMemoryPendingStore {
    entries: Mutex<BTreeMap<String, PendingEntry>>,
}

impl InMemoryPendingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PendingStore for InMemoryPendingStore {
    async fn get(&self, ns: Namespace, key: &str) -> Result<Option<PendingEntry>, StoreError> {
        let map = self.entries.lock().await;
        Ok(map.get(&ns.full_key(key)).cloned())
    }

    async fn put(&self, ns: Namespace, key: &str, entry: PendingEntry) -> Result<(), StoreError> {
        let mut map = self.entries.lock().await;
        map.insert(ns.full_key(key), entry);
        Ok(())
    }

    async fn delete(&self, ns: Namespace, key: &str) -> Result<(), StoreError> {
        let mut map = self.entries.lock().await;
        map.remove(&ns.full_key(key));
        Ok(())
    }

    async fn iter_expired(
        &self,
        now_millis: u64,
    ) -> Result<Vec<(Namespace, String, PendingEntry)>, StoreError> {
        let map = self.entries.lock().await;
        Ok(map
            .iter()
            .filter(|(_, entry)| entry.expires_at_millis <= now_millis)
            .filter_map(|(full_key, entry)| {
                let ns = namespace_of(full_key)?;
                Some((ns, entry.key.clone(), entry.clone()))
            })
            .collect())
    }

    async fn clear_for_subscription(&self, sub_id: &str) -> Result<(), StoreError> {
        let mut map = self.entries.lock().await;
        let mut to_remove = Vec::new();
        for (full_key, entry) in map.iter_mut() {
            entry.subscription_ids.remove(sub_id);
            if entry.subscription_ids.is_empty() {
                to_remove.push(full_key.clone());
            }
        }
        for key in to_remove {
            map.remove(&key);
        }
        Ok(())
    }
}

/// Durable variant: folds a write-ahead log of put/delete records into an
/// in-memory index on startup, then appends subsequent mutations to the
/// same file. This keeps the "durable keyed map" contract without pulling
/// in an embedded database dependency.
#[derive(Debug)]
pub struct JsonFilePendingStore {
    path: PathBuf,
    inner: InMemoryPendingStore,
    file: Mutex<Option<tokio::fs::File>>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op")]
enum WalRecord {
    Put { full_key: String, entry: PendingEntry },
    Delete { full_key: String },
}

impl JsonFilePendingStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let inner = InMemoryPendingStore::new();

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
                    WalRecord::Put { full_key, entry } => {
                        map.insert(full_key, entry);
                    }
                    WalRecord::Delete { full_key } => {
                        map.remove(&full_key);
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
            path,
            inner,
            file: Mutex::new(Some(file)),
        })
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
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
impl PendingStore for JsonFilePendingStore {
    async fn get(&self, ns: Namespace, key: &str) -> Result<Option<PendingEntry>, StoreError> {
        self.inner.get(ns, key).await
    }

    async fn put(&self, ns: Namespace, key: &str, entry: PendingEntry) -> Result<(), StoreError> {
        self.append(&WalRecord::Put {
            full_key: ns.full_key(key),
            entry: entry.clone(),
        })
        .await?;
        self.inner.put(ns, key, entry).await
    }

    async fn delete(&self, ns: Namespace, key: &str) -> Result<(), StoreError> {
        self.append(&WalRecord::Delete {
            full_key: ns.full_key(key),
        })
        .await?;
        self.inner.delete(ns, key).await
    }

    async fn iter_expired(
        &self,
        now_millis: u64,
    ) -> Result<Vec<(Namespace, String, PendingEntry)>, StoreError> {
        self.inner.iter_expired(now_millis).await
    }

    async fn clear_for_subscription(&self, sub_id: &str) -> Result<(), StoreError> {
        // Compute the post-clear snapshot in memory, then persist the
        // deltas so the WAL mirrors exactly what `clear_for_subscription`
        // did rather than the whole-map effect.
        let before: std::collections::HashSet<String> = {
            let map = self.inner.entries.lock().await;
            map.keys().cloned().collect()
        };
        self.inner.clear_for_subscription(sub_id).await?;
        let after_map = self.inner.entries.lock().await;
        for full_key in before {
            match after_map.get(&full_key) {
                Some(entry) => {
                    self.append(&WalRecord::Put {
                        full_key: full_key.clone(),
                        entry: entry.clone(),
                    })
                    .await?;
                }
                None => {
                    self.append(&WalRecord::Delete { full_key }).await?;
                }
            }
        }
        Ok(())
    }
}

pub type SharedPendingStore = Arc<dyn PendingStore>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MessageHash, NetworkId, PendingContext, PendingKind, XcmSentContext, XcmOutcome};
    use std::collections::HashSet;

    fn sample_entry(key: &str, sub: &str, expires_at: u64) -> PendingEntry {
        let mut subs = HashSet::new();
        subs.insert(sub.to_string());
        PendingEntry {
            key: key.to_string(),
            kind: PendingKind::Sent,
            context: PendingContext::Sent(XcmSentContext {
                message_hash: MessageHash([0xAA; 32]),
                message_id: None,
                origin: NetworkId::new("urn:ocn:polkadot:1000"),
                destination: NetworkId::new("urn:ocn:polkadot:2004"),
                sender: None,
                block_hash: "0x01".into(),
                block_number: 1,
                extrinsic_id: "1-0".into(),
                sent_at: 0,
                outcome: XcmOutcome::Complete,
            }),
            subscription_ids: subs,
            expires_at_millis: expires_at,
            observed_block_hash: "0x01".into(),
        }
    }

    #[tokio::test]
    async fn in_memory_put_get_delete_roundtrip() {
        let store = InMemoryPendingStore::new();
        let entry = sample_entry("0xAA:2004", "s1", 1_000);
        store
            .put(Namespace::Outbound, "0xAA:2004", entry.clone())
            .await
            .unwrap();
        let fetched = store
            .get(Namespace::Outbound, "0xAA:2004")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.key, entry.key);

        store.delete(Namespace::Outbound, "0xAA:2004").await.unwrap();
        assert!(store
            .get(Namespace::Outbound, "0xAA:2004")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn namespaces_do_not_collide() {
        let store = InMemoryPendingStore::new();
        store
            .put(Namespace::Outbound, "k", sample_entry("k", "s1", 1_000))
            .await
            .unwrap();
        store
            .put(Namespace::Inbound, "k", sample_entry("k", "s1", 1_000))
            .await
            .unwrap();
        assert!(store.get(Namespace::Outbound, "k").await.unwrap().is_some());
        assert!(store.get(Namespace::Inbound, "k").await.unwrap().is_some());
        store.delete(Namespace::Outbound, "k").await.unwrap();
        assert!(store.get(Namespace::Outbound, "k").await.unwrap().is_none());
        assert!(store.get(Namespace::Inbound, "k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn iter_expired_returns_only_due_entries() {
        let store = InMemoryPendingStore::new();
        store
            .put(Namespace::Outbound, "a", sample_entry("a", "s1", 500))
            .await
            .unwrap();
        store
            .put(Namespace::Outbound, "b", sample_entry("b", "s1", 5_000))
            .await
            .unwrap();
        let expired = store.iter_expired(1_000).await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].1, "a");
    }

    #[tokio::test]
    async fn clear_for_subscription_removes_entries_left_empty() {
        let store = InMemoryPendingStore::new();
        store
            .put(Namespace::Outbound, "a", sample_entry("a", "s1", 1_000))
            .await
            .unwrap();
        store.clear_for_subscription("s1").await.unwrap();
        assert!(store.get(Namespace::Outbound, "a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn json_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pending.jsonl");

        {
            let store = JsonFilePendingStore::open(&path).await.unwrap();
            store
                .put(Namespace::Outbound, "a", sample_entry("a", "s1", 1_000))
                .await
                .unwrap();
        }

        let reopened = JsonFilePendingStore::open(&path).await.unwrap();
        assert!(reopened
            .get(Namespace::Outbound, "a")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn json_file_store_replays_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pending.jsonl");

        {
            let store = JsonFilePendingStore::open(&path).await.unwrap();
            store
                .put(Namespace::Outbound, "a", sample_entry("a", "s1", 1_000))
                .await
                .unwrap();
            store.delete(Namespace::Outbound, "a").await.unwrap();
        }

        let reopened = JsonFilePendingStore::open(&path).await.unwrap();
        assert!(reopened
            .get(Namespace::Outbound, "a")
            .await
            .unwrap()
            .is_none());
    }
}
