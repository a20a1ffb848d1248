// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Contracts for the two external collaborators this engine treats as
//! swappable: chain connectivity ("block source" / "storage read") and
//! the XCM binary-format decoders. Both are pure trait boundaries here;
//! concrete implementations (a `subxt`-backed
//! `BlockSource` and SCALE-based `XcmExtractor`s) live in the server
//! crate, which is free to depend on the chain-specific decoding stack
//! without dragging it into the engine.

use crate::model::{AccountRef, NetworkId, XcmReceivedContext, XcmRelayedContext, XcmSentContext};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;
use thiserror::Error;

/// One finalized block, decoded just far enough to hand extractors what
/// they need: per-extrinsic signer identity and the events it fired.
#[derive(Debug, Clone)]
pub struct SignedBlockWithEvents {
    pub block_hash: String,
    pub block_number: u64,
    pub extrinsics: Vec<ExtrinsicWithEvents>,
    pub author: Option<AccountRef>,
}

#[derive(Debug, Clone)]
pub struct ExtrinsicWithEvents {
    pub extrinsic_id: String,
    pub signer: Option<AccountRef>,
    pub extra_signers: Vec<AccountRef>,
    pub events: Vec<BlockEvent>,
}

/// A single deposited event, opaque beyond pallet/variant naming and a
/// JSON-encoded payload -- XCM extractors interpret the payload according
/// to the protocol they decode; other events are ignored.
#[derive(Debug, Clone)]
pub struct BlockEvent {
    pub index: u32,
    pub pallet: String,
    pub variant: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("chain connection unavailable: {0}")]
    Unavailable(String),

    #[error("storage read failed: {0}")]
    StorageRead(String),
}

/// The finalized-block observable plus on-demand storage reads a chain
/// connector must provide.
#[async_trait]
pub trait BlockSource: Send + Sync + std::fmt::Debug {
    /// A hot stream of finalized blocks for `chain`. Each call may create
    /// a fresh upstream subscription; callers are expected to multiplex
    /// through the `StreamHub` rather than calling this once per
    /// observer.
    async fn finalized_blocks(
        &self,
        chain: &NetworkId,
    ) -> Result<BoxStream<'static, SignedBlockWithEvents>, SourceError>;

    async fn get_storage(
        &self,
        chain: &NetworkId,
        storage_key: &[u8],
        block_hash: Option<&str>,
    ) -> Result<Vec<u8>, SourceError>;
}

/// The three wire protocols an XCM message can ride, used to pick the
/// right extractor when composing a subscription's observer legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XcmProtocol {
    /// Parachain -> relay.
    Upward,
    /// Relay -> parachain.
    Downward,
    /// Parachain -> parachain.
    Horizontal,
}

/// Pure extraction functions from a decoded block to the three
/// observation contexts, scoped to one wire protocol.
pub trait XcmExtractor: Send + Sync + std::fmt::Debug {
    fn protocol(&self) -> XcmProtocol;

    fn extract_sent(&self, chain: &NetworkId, block: &SignedBlockWithEvents) -> Vec<XcmSentContext>;

    fn extract_received(
        &self,
        chain: &NetworkId,
        block: &SignedBlockWithEvents,
    ) -> Vec<XcmReceivedContext>;

    fn extract_relayed(
        &self,
        chain: &NetworkId,
        block: &SignedBlockWithEvents,
    ) -> Vec<XcmRelayedContext>;
}

/// Resolves the extractor to use for a given protocol. A registry rather
/// than a single object because UMP/DMP/HRMP decoding differs enough
/// (different pallets, different storage layouts) to warrant independent
/// implementations.
pub trait ExtractorRegistry: Send + Sync + std::fmt::Debug {
    fn extractor_for(&self, protocol: XcmProtocol) -> Arc<dyn XcmExtractor>;
}

/// Chooses the outbound protocols an origin chain can emit on: a
/// parachain can send Upward (to its relay) or Horizontal (to a sibling
/// parachain); a relay can only send Downward.
pub fn origin_protocols(origin: &NetworkId) -> Vec<XcmProtocol> {
    if origin.is_relay() {
        vec![XcmProtocol::Downward]
    } else {
        vec![XcmProtocol::Upward, XcmProtocol::Horizontal]
    }
}

/// Chooses the protocol a destination observer should decode, based on
/// the relay/parachain identity of both endpoints.
pub fn destination_protocol(origin: &NetworkId, destination: &NetworkId) -> XcmProtocol {
    if destination.is_relay() {
        XcmProtocol::Upward
    } else if origin.is_relay() {
        XcmProtocol::Downward
    } else {
        XcmProtocol::Horizontal
    }
}

/// Whether a relay observer should be attached at all: only when the
/// subscription is not entirely between relay chains (origin is not a
/// relay, and at least one destination is not a relay).
pub fn relay_leg_applicable(
    origin: &NetworkId,
    destinations: &std::collections::HashSet<NetworkId>,
) -> bool {
    !origin.is_relay() && destinations.iter().any(|d| !d.is_relay())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parachain_origin_supports_upward_and_horizontal() {
        let origin = NetworkId::new("urn:ocn:polkadot:1000");
        assert_eq!(
            origin_protocols(&origin),
            vec![XcmProtocol::Upward, XcmProtocol::Horizontal]
        );
    }

    #[test]
    fn relay_origin_supports_downward_only() {
        let origin = NetworkId::new("urn:ocn:polkadot:0");
        assert_eq!(origin_protocols(&origin), vec![XcmProtocol::Downward]);
    }

    #[test]
    fn destination_protocol_selection() {
        let para = NetworkId::new("urn:ocn:polkadot:1000");
        let para2 = NetworkId::new("urn:ocn:polkadot:2004");
        let relay = NetworkId::new("urn:ocn:polkadot:0");

        assert!(matches!(destination_protocol(&para, &relay), XcmProtocol::Upward));
        assert!(matches!(destination_protocol(&relay, &para), XcmProtocol::Downward));
        assert!(matches!(destination_protocol(&para, &para2), XcmProtocol::Horizontal));
    }

    #[test]
    fn relay_leg_not_applicable_between_two_relays() {
        let relay = NetworkId::new("urn:ocn:polkadot:0");
        let mut destinations = std::collections::HashSet::new();
        destinations.insert(NetworkId::new("urn:ocn:kusama:0"));
        assert!(!relay_leg_applicable(&relay, &destinations));
    }

    #[test]
    fn relay_leg_applicable_parachain_to_parachain() {
        let origin = NetworkId::new("urn:ocn:polkadot:1000");
        let mut destinations = std::collections::HashSet::new();
        destinations.insert(NetworkId::new("urn:ocn:polkadot:2004"));
        assert!(relay_leg_applicable(&origin, &destinations));
    }
}
