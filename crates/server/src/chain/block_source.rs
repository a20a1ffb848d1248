// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! `BlockSource` implementation backed by `subxt`'s reconnecting RPC
//! client: one connection per configured chain, finalized blocks decoded
//! just far enough to hand the engine `SignedBlockWithEvents`.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use subxt::{OnlineClient, SubstrateConfig};
use subxt_rpcs::RpcClient;
use subxt_rpcs::client::reconnecting_rpc_client::{
    ExponentialBackoff, RpcClient as ReconnectingRpcClient,
};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};
use xcm_monitor_config::ChainsConfig;
use xcm_monitor_engine::{
    AccountRef, BlockEvent, ExtrinsicWithEvents, NetworkId, SignedBlockWithEvents, SourceError,
};

#[derive(Debug, Error)]
pub enum ChainConnectError {
    #[error("no chain URL configured for {0}")]
    NotConfigured(NetworkId),

    #[error("failed to connect to {url}: {source}")]
    ConnectionFailed {
        url: String,
        #[source]
        source: subxt_rpcs::Error,
    },
}

struct ChainConnection {
    client: OnlineClient<SubstrateConfig>,
    rpc_client: RpcClient,
}

/// One reconnecting RPC connection per monitored chain, opened lazily on
/// first use and kept alive for the process lifetime. `finalized_blocks`
/// may be called more than once per chain (the switchboard multiplexes
/// through its own `StreamHub`, but nothing here depends on that), so
/// connections are cached behind a lock keyed by network id rather than
/// opened per call.
pub struct SubxtBlockSource {
    urls: HashMap<String, String>,
    connections: RwLock<HashMap<String, Arc<ChainConnection>>>,
    reconnect_initial_delay: Duration,
    reconnect_max_delay: Duration,
    reconnect_request_timeout: Duration,
    connected_count: AtomicUsize,
}

impl std::fmt::Debug for SubxtBlockSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubxtBlockSource")
            .field("chains", &self.urls.len())
            .field("connected", &self.connected_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl SubxtBlockSource {
    pub fn new(config: &ChainsConfig) -> Self {
        let urls = config
            .urls
            .iter()
            .map(|c| (c.network_id.clone(), c.url.clone()))
            .collect();

        Self {
            urls,
            connections: RwLock::new(HashMap::new()),
            reconnect_initial_delay: Duration::from_millis(config.reconnect_initial_delay_ms),
            reconnect_max_delay: Duration::from_millis(config.reconnect_max_delay_ms),
            reconnect_request_timeout: Duration::from_millis(config.reconnect_request_timeout_ms),
            connected_count: AtomicUsize::new(0),
        }
    }

    /// Number of chains with a live connection, for health/metrics
    /// reporting. Not part of the `BlockSource` trait since the engine
    /// has no use for it.
    pub fn connected_chains(&self) -> usize {
        self.connected_count.load(Ordering::Relaxed)
    }

    pub fn configured_chains(&self) -> usize {
        self.urls.len()
    }

    async fn connection(&self, chain: &NetworkId) -> Result<Arc<ChainConnection>, ChainConnectError> {
        if let Some(conn) = self.connections.read().await.get(chain.as_str()) {
            return Ok(conn.clone());
        }

        let url = self
            .urls
            .get(chain.as_str())
            .ok_or_else(|| ChainConnectError::NotConfigured(chain.clone()))?
            .clone();

        let reconnecting = ReconnectingRpcClient::builder()
            .retry_policy(
                ExponentialBackoff::from_millis(self.reconnect_initial_delay.as_millis() as u64)
                    .max_delay(self.reconnect_max_delay),
            )
            .request_timeout(self.reconnect_request_timeout)
            .build(&url)
            .await
            .map_err(|e| ChainConnectError::ConnectionFailed {
                url: url.clone(),
                source: subxt_rpcs::Error::Client(Box::new(e)),
            })?;

        let rpc_client = RpcClient::new(reconnecting);
        let client = OnlineClient::<SubstrateConfig>::from_rpc_client(rpc_client.clone())
            .await
            .map_err(|e| ChainConnectError::ConnectionFailed {
                url: url.clone(),
                source: subxt_rpcs::Error::Client(Box::new(std::io::Error::other(e.to_string()))),
            })?;

        let conn = Arc::new(ChainConnection { client, rpc_client });
        self.connections
            .write()
            .await
            .insert(chain.as_str().to_string(), conn.clone());
        self.connected_count.fetch_add(1, Ordering::Relaxed);
        info!(chain = %chain, url = %url, "connected to chain");
        Ok(conn)
    }
}

#[async_trait]
impl xcm_monitor_engine::BlockSource for SubxtBlockSource {
    async fn finalized_blocks(
        &self,
        chain: &NetworkId,
    ) -> Result<BoxStream<'static, SignedBlockWithEvents>, SourceError> {
        let conn = self
            .connection(chain)
            .await
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;

        let blocks_sub = conn
            .client
            .blocks()
            .subscribe_finalized()
            .await
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;

        let chain = chain.clone();
        let decoded = blocks_sub.filter_map(move |result| {
            let chain = chain.clone();
            async move {
                match result {
                    Ok(block) => match decode_block(&block).await {
                        Ok(decoded) => Some(decoded),
                        Err(e) => {
                            crate::metrics::registry::EXTRACTOR_DECODE_ERRORS.inc();
                            warn!(chain = %chain, error = %e, "failed to decode finalized block");
                            None
                        }
                    },
                    Err(e) => {
                        xcm_monitor_engine::metrics::SUBSCRIPTION_ERRORS.inc();
                        warn!(chain = %chain, error = %e, "finalized block subscription error");
                        None
                    }
                }
            }
        });

        Ok(Box::pin(decoded))
    }

    async fn get_storage(
        &self,
        chain: &NetworkId,
        storage_key: &[u8],
        block_hash: Option<&str>,
    ) -> Result<Vec<u8>, SourceError> {
        let conn = self
            .connection(chain)
            .await
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;

        let params = match block_hash {
            Some(hash) => subxt_rpcs::rpc_params![hex::encode(storage_key), hash],
            None => subxt_rpcs::rpc_params![hex::encode(storage_key)],
        };

        let raw: Option<String> = conn
            .rpc_client
            .request("state_getStorage", params)
            .await
            .map_err(|e| SourceError::StorageRead(e.to_string()))?;

        match raw {
            Some(hex_value) => hex::decode(hex_value.trim_start_matches("0x"))
                .map_err(|e| SourceError::StorageRead(e.to_string())),
            None => Ok(vec![]),
        }
    }
}

/// Decodes a `subxt` block into the engine's block shape, reading each
/// extrinsic's events and flattening them to `(pallet, variant, payload)`
/// tuples. Event field values are rendered through `scale_value`'s
/// `Value` so extractors can read named fields out of the resulting JSON
/// without round-tripping through a fixed metadata-derived type.
async fn decode_block(
    block: &subxt::blocks::Block<SubstrateConfig, OnlineClient<SubstrateConfig>>,
) -> Result<SignedBlockWithEvents, SourceError> {
    let block_hash = format!("{:?}", block.hash());
    let block_number = block.number() as u64;

    let body = block
        .body()
        .await
        .map_err(|e| SourceError::Unavailable(e.to_string()))?;

    let mut extrinsics = Vec::new();
    for (idx, ext) in body.extrinsics().iter().enumerate() {
        let ext = ext.map_err(|e| SourceError::Unavailable(e.to_string()))?;

        let signer = ext
            .address_bytes()
            .and_then(|bytes| decode_multiaddress_account(bytes));

        let events = ext
            .events()
            .await
            .map(|evs| {
                evs.iter()
                    .enumerate()
                    .filter_map(|(event_idx, ev)| {
                        let ev = ev.ok()?;
                        let payload = ev
                            .field_values()
                            .ok()
                            .and_then(|values| serde_json::to_value(format!("{values:?}")).ok())
                            .unwrap_or(serde_json::Value::Null);
                        Some(BlockEvent {
                            index: event_idx as u32,
                            pallet: ev.pallet_name().to_string(),
                            variant: ev.variant_name().to_string(),
                            payload,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        extrinsics.push(ExtrinsicWithEvents {
            extrinsic_id: format!("{block_number}-{idx}"),
            signer,
            extra_signers: vec![],
            events,
        });
    }

    Ok(SignedBlockWithEvents {
        block_hash,
        block_number,
        extrinsics,
        author: None,
    })
}

/// A SCALE-encoded `sp_runtime::MultiAddress`: `Id` (variant 0) wraps a
/// bare 32-byte account id, which is the only variant extractors treat
/// as a sender identity.
fn decode_multiaddress_account(bytes: &[u8]) -> Option<AccountRef> {
    if bytes.len() == 33 && bytes[0] == 0 {
        Some(AccountRef::from_bytes(bytes[1..].to_vec()))
    } else {
        None
    }
}
