// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! `XcmExtractor` implementations for the three wire protocols.
//!
//! `decode_block` in [`super::block_source`] hands extractors events whose
//! payload is a debug-rendered `scale_value::Value` wrapped in a JSON
//! string rather than a fully metadata-typed struct, so extraction here
//! works by pattern-matching that rendering rather than field access.
//! `scale_value`'s primitive array values render as a run of
//! `U8(n)` tokens, and location junctions render their variant name
//! followed by the wrapped integer, so both message hashes and parachain
//! ids can be recovered by scanning for those shapes. This is a narrower
//! contract than a full metadata-aware SCALE decode, but it is the one
//! the block source actually exposes.
//!
//! Two upstream events carry everything a waypoint needs:
//! - `PolkadotXcm::Sent { origin, destination, message, message_id }` on
//!   the sending chain, for the origin leg of every protocol.
//! - `MessageQueue::Processed { id, origin, weight_used, success }` on
//!   the receiving chain, for UMP, DMP and HRMP alike -- `pallet-message-queue`
//!   is the common processing pallet all three protocols feed into.

use regex::Regex;
use std::sync::Arc;
use std::sync::LazyLock;
use xcm_monitor_engine::{
    AccountRef, BlockEvent, ExtractorRegistry, MessageHash, NetworkId, SignedBlockWithEvents,
    XcmExtractor, XcmOutcome, XcmProtocol, XcmReceivedContext, XcmRelayedContext, XcmSentContext,
};

static U8_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:U8\((\d{1,3})\)(?:,\s*)?)+").unwrap());
static U8_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"U8\((\d{1,3})\)").unwrap());
static PARACHAIN_JUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Parachain\((\d+)\)").unwrap());

/// Every maximal run of consecutive `U8(n)` tokens in the debug-rendered
/// payload, in order of appearance, decoded to bytes.
fn byte_runs(payload: &serde_json::Value) -> Vec<Vec<u8>> {
    let Some(text) = payload.as_str() else {
        return vec![];
    };
    U8_RUN
        .find_iter(text)
        .map(|m| {
            U8_TOKEN
                .captures_iter(m.as_str())
                .filter_map(|c| c[1].parse::<u8>().ok())
                .collect::<Vec<u8>>()
        })
        .collect()
}

/// All 32-byte runs, the shape of an XCM message hash or message id.
fn message_hashes(payload: &serde_json::Value) -> Vec<MessageHash> {
    byte_runs(payload)
        .into_iter()
        .filter(|run| run.len() == 32)
        .map(|run| {
            let mut array = [0u8; 32];
            array.copy_from_slice(&run);
            MessageHash(array)
        })
        .collect()
}

/// The parachain id named by the first `Parachain(id)` junction in the
/// payload, if any.
fn parachain_junction(payload: &serde_json::Value) -> Option<u32> {
    let text = payload.as_str()?;
    PARACHAIN_JUNCTION
        .captures(text)
        .and_then(|c| c[1].parse::<u32>().ok())
}

/// Strips the trailing `:<id>` segment off a `urn:ocn:<family>:<id>` id,
/// leaving the relay-family prefix new sibling/relay ids are built from.
fn family_prefix(chain: &NetworkId) -> &str {
    chain
        .as_str()
        .rsplit_once(':')
        .map(|(prefix, _)| prefix)
        .unwrap_or(chain.as_str())
}

fn relay_of(chain: &NetworkId) -> NetworkId {
    NetworkId::new(format!("{}:0", family_prefix(chain)))
}

fn parachain_of(chain: &NetworkId, para_id: u32) -> NetworkId {
    NetworkId::new(format!("{}:{para_id}", family_prefix(chain)))
}

/// Resolves `PolkadotXcm::Sent`'s destination to a concrete chain id,
/// using the junction it carries when there is one and falling back to
/// the only destination a relay-origin `Sent` can mean (a relay can only
/// send Downward) otherwise.
fn resolve_destination(origin: &NetworkId, protocol: XcmProtocol, payload: &serde_json::Value) -> NetworkId {
    match parachain_junction(payload) {
        Some(para_id) => parachain_of(origin, para_id),
        None => match protocol {
            XcmProtocol::Upward => relay_of(origin),
            XcmProtocol::Downward | XcmProtocol::Horizontal => origin.clone(),
        },
    }
}

fn outcome_from_success(success: Option<bool>) -> XcmOutcome {
    match success {
        Some(true) => XcmOutcome::Complete,
        Some(false) => XcmOutcome::Incomplete,
        None => XcmOutcome::Complete,
    }
}

fn event_success(event: &BlockEvent) -> Option<bool> {
    let text = event.payload.as_str()?;
    if text.contains("success: true") || text.contains("Success") {
        Some(true)
    } else if text.contains("success: false") || text.contains("Fail") {
        Some(false)
    } else {
        None
    }
}

/// Shared extractor logic for all three wire protocols: the origin leg is
/// always `PolkadotXcm::Sent`, the destination and relay legs are always
/// `MessageQueue::Processed`, distinguished only by which chain the
/// observer attached to and, for the relay leg, whether the protocol
/// bridges two parachains at all (see `relay_leg_applicable`).
#[derive(Debug)]
struct MessageQueueExtractor {
    protocol: XcmProtocol,
}

impl MessageQueueExtractor {
    fn new(protocol: XcmProtocol) -> Self {
        Self { protocol }
    }
}

impl XcmExtractor for MessageQueueExtractor {
    fn protocol(&self) -> XcmProtocol {
        self.protocol
    }

    fn extract_sent(&self, chain: &NetworkId, block: &SignedBlockWithEvents) -> Vec<XcmSentContext> {
        let mut out = Vec::new();
        for ext in &block.extrinsics {
            for event in &ext.events {
                if event.pallet != "PolkadotXcm" || event.variant != "Sent" {
                    continue;
                }
                // message_id is the trailing field of `Sent`; message_hash
                // isn't always present distinctly, so both fields resolve
                // to the last 32-byte run found.
                let Some(message_id) = message_hashes(&event.payload).pop() else {
                    continue;
                };
                out.push(XcmSentContext {
                    message_hash: message_id,
                    message_id: Some(message_id),
                    origin: chain.clone(),
                    destination: resolve_destination(chain, self.protocol, &event.payload),
                    sender: ext.signer.clone(),
                    block_hash: block.block_hash.clone(),
                    block_number: block.block_number,
                    extrinsic_id: ext.extrinsic_id.clone(),
                    sent_at: block.block_number,
                    outcome: XcmOutcome::Complete,
                });
            }
        }
        out
    }

    fn extract_received(
        &self,
        chain: &NetworkId,
        block: &SignedBlockWithEvents,
    ) -> Vec<XcmReceivedContext> {
        if matches!(self.protocol, XcmProtocol::Downward) && chain.is_relay() {
            // Downward messages are processed on the parachain, never the relay.
            return vec![];
        }
        let mut out = Vec::new();
        for ext in &block.extrinsics {
            for event in &ext.events {
                if event.pallet != "MessageQueue" || event.variant != "Processed" {
                    continue;
                }
                // `id` is the leading field of `Processed`.
                let Some(message_id) = message_hashes(&event.payload).first().copied() else {
                    continue;
                };
                let success = event_success(event);
                out.push(XcmReceivedContext {
                    message_hash: message_id,
                    destination: chain.clone(),
                    block_hash: block.block_hash.clone(),
                    block_number: block.block_number,
                    outcome: outcome_from_success(success),
                    error: if success == Some(false) {
                        Some("message queue reported processing failure".to_string())
                    } else {
                        None
                    },
                });
            }
        }
        out
    }

    fn extract_relayed(
        &self,
        chain: &NetworkId,
        block: &SignedBlockWithEvents,
    ) -> Vec<XcmRelayedContext> {
        // Only horizontal (parachain-to-parachain) transit passes through
        // the relay chain as an observable leg (see `relay_leg_applicable`).
        if !matches!(self.protocol, XcmProtocol::Horizontal) || !chain.is_relay() {
            return vec![];
        }
        let mut out = Vec::new();
        for ext in &block.extrinsics {
            for event in &ext.events {
                if event.pallet != "MessageQueue" || event.variant != "Processed" {
                    continue;
                }
                let Some(message_id) = message_hashes(&event.payload).first().copied() else {
                    continue;
                };
                let Some(para_id) = parachain_junction(&event.payload) else {
                    continue;
                };
                out.push(XcmRelayedContext {
                    message_hash: message_id,
                    origin: chain.clone(),
                    destination: parachain_of(chain, para_id),
                    relay_block_hash: block.block_hash.clone(),
                    relay_block_number: block.block_number,
                });
            }
        }
        out
    }
}

/// Resolves each of the three wire protocols to its `MessageQueueExtractor`.
#[derive(Debug, Default)]
pub struct MonitorExtractorRegistry {
    upward: Arc<MessageQueueExtractor>,
    downward: Arc<MessageQueueExtractor>,
    horizontal: Arc<MessageQueueExtractor>,
}

impl MonitorExtractorRegistry {
    pub fn new() -> Self {
        Self {
            upward: Arc::new(MessageQueueExtractor::new(XcmProtocol::Upward)),
            downward: Arc::new(MessageQueueExtractor::new(XcmProtocol::Downward)),
            horizontal: Arc::new(MessageQueueExtractor::new(XcmProtocol::Horizontal)),
        }
    }
}

impl ExtractorRegistry for MonitorExtractorRegistry {
    fn extractor_for(&self, protocol: XcmProtocol) -> Arc<dyn XcmExtractor> {
        match protocol {
            XcmProtocol::Upward => self.upward.clone(),
            XcmProtocol::Downward => self.downward.clone(),
            XcmProtocol::Horizontal => self.horizontal.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xcm_monitor_engine::ExtrinsicWithEvents;

    fn debug_bytes(bytes: &[u8]) -> String {
        let inner = bytes
            .iter()
            .map(|b| format!("U8({b})"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("Composite(Unnamed([{inner}]))")
    }

    fn block_with_event(pallet: &str, variant: &str, payload: String, signer: Option<AccountRef>) -> SignedBlockWithEvents {
        SignedBlockWithEvents {
            block_hash: "0xblock".to_string(),
            block_number: 42,
            extrinsics: vec![ExtrinsicWithEvents {
                extrinsic_id: "42-0".to_string(),
                signer,
                extra_signers: vec![],
                events: vec![BlockEvent {
                    index: 0,
                    pallet: pallet.to_string(),
                    variant: variant.to_string(),
                    payload: serde_json::Value::String(payload),
                }],
            }],
            author: None,
        }
    }

    #[test]
    fn extracts_sent_with_message_id_and_parachain_destination() {
        let hash = [7u8; 32];
        let payload = format!(
            "Composite(Named([(\"origin\", ...), (\"destination\", Variant(\"Parachain\", Unnamed([U32(2004)]))), (\"message\", ...), (\"message_id\", {})])) Parachain(2004)",
            debug_bytes(&hash)
        );
        let block = block_with_event("PolkadotXcm", "Sent", payload, None);

        let extractor = MessageQueueExtractor::new(XcmProtocol::Horizontal);
        let origin = NetworkId::new("urn:ocn:polkadot:1000");
        let sent = extractor.extract_sent(&origin, &block);

        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message_hash.0, hash);
        assert_eq!(sent[0].destination, NetworkId::new("urn:ocn:polkadot:2004"));
        assert_eq!(sent[0].origin, origin);
    }

    #[test]
    fn upward_sent_without_junction_targets_relay() {
        let hash = [3u8; 32];
        let payload = debug_bytes(&hash);
        let block = block_with_event("PolkadotXcm", "Sent", payload, None);

        let extractor = MessageQueueExtractor::new(XcmProtocol::Upward);
        let origin = NetworkId::new("urn:ocn:polkadot:1000");
        let sent = extractor.extract_sent(&origin, &block);

        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].destination, NetworkId::new("urn:ocn:polkadot:0"));
    }

    #[test]
    fn extracts_received_from_message_queue_processed() {
        let hash = [9u8; 32];
        let payload = format!("{} success: true", debug_bytes(&hash));
        let block = block_with_event("MessageQueue", "Processed", payload, None);

        let extractor = MessageQueueExtractor::new(XcmProtocol::Horizontal);
        let destination = NetworkId::new("urn:ocn:polkadot:2004");
        let received = extractor.extract_received(&destination, &block);

        assert_eq!(received.len(), 1);
        assert_eq!(received[0].message_hash.0, hash);
        assert_eq!(received[0].outcome, XcmOutcome::Complete);
        assert!(received[0].error.is_none());
    }

    #[test]
    fn downward_received_never_reported_on_relay() {
        let hash = [1u8; 32];
        let payload = debug_bytes(&hash);
        let block = block_with_event("MessageQueue", "Processed", payload, None);

        let extractor = MessageQueueExtractor::new(XcmProtocol::Downward);
        let relay = NetworkId::new("urn:ocn:polkadot:0");
        assert!(extractor.extract_received(&relay, &block).is_empty());
    }

    #[test]
    fn failed_processing_reports_incomplete_with_error() {
        let hash = [5u8; 32];
        let payload = format!("{} success: false", debug_bytes(&hash));
        let block = block_with_event("MessageQueue", "Processed", payload, None);

        let extractor = MessageQueueExtractor::new(XcmProtocol::Upward);
        let relay = NetworkId::new("urn:ocn:polkadot:0");
        let received = extractor.extract_received(&relay, &block);

        assert_eq!(received[0].outcome, XcmOutcome::Incomplete);
        assert!(received[0].error.is_some());
    }

    #[test]
    fn relay_leg_only_fires_for_horizontal_on_relay_chain() {
        let hash = [2u8; 32];
        let payload = format!("{} Parachain(2004)", debug_bytes(&hash));
        let block = block_with_event("MessageQueue", "Processed", payload.clone(), None);

        let horizontal = MessageQueueExtractor::new(XcmProtocol::Horizontal);
        let relay = NetworkId::new("urn:ocn:polkadot:0");
        let relayed = horizontal.extract_relayed(&relay, &block);
        assert_eq!(relayed.len(), 1);
        assert_eq!(relayed[0].destination, NetworkId::new("urn:ocn:polkadot:2004"));

        let upward = MessageQueueExtractor::new(XcmProtocol::Upward);
        assert!(upward.extract_relayed(&relay, &block).is_empty());

        let non_relay = NetworkId::new("urn:ocn:polkadot:1000");
        assert!(horizontal.extract_relayed(&non_relay, &block).is_empty());
    }

    #[test]
    fn registry_resolves_all_three_protocols() {
        let registry = MonitorExtractorRegistry::new();
        assert_eq!(
            registry.extractor_for(XcmProtocol::Upward).protocol(),
            XcmProtocol::Upward
        );
        assert_eq!(
            registry.extractor_for(XcmProtocol::Downward).protocol(),
            XcmProtocol::Downward
        );
        assert_eq!(
            registry.extractor_for(XcmProtocol::Horizontal).protocol(),
            XcmProtocol::Horizontal
        );
    }
}
