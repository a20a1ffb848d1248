// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! A mutable, thread-safe predicate over structured records. The
//! Switchboard derives two instances per subscription: a sender control
//! from `senders` and a message control from `destinations`. `change` is
//! atomic with respect to evaluation -- an evaluator either sees the old
//! predicate or the new one, never a torn state.

use crate::model::{AccountRef, NetworkId};
use std::sync::{Arc, RwLock};

/// The field a leaf predicate tests against a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Sender,
    ExtraSigner,
    Recipient,
}

/// A boolean combination of field tests: `$in`, `$eq`, `$or`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Matches everything.
    Any,
    /// Matches nothing.
    None,
    /// `field $eq value`.
    Eq { field: Field, value: String },
    /// `field $in values`.
    In { field: Field, values: Vec<String> },
    /// `$or` of sub-predicates.
    Or(Vec<Predicate>),
}

/// A record the predicate is evaluated against: the subset of an
/// extrinsic/event fields the sender and message controls test.
#[derive(Debug, Clone, Default)]
pub struct QueryRecord {
    pub signer: Option<AccountRef>,
    pub extra_signers: Vec<AccountRef>,
    pub recipient: Option<NetworkId>,
}

impl Predicate {
    pub fn evaluate(&self, record: &QueryRecord) -> bool {
        match self {
            Predicate::Any => true,
            Predicate::None => false,
            Predicate::Eq { field, value } => field_values(field, record).contains(value),
            Predicate::In { field, values } => {
                let observed = field_values(field, record);
                values.iter().any(|v| observed.contains(v))
            }
            Predicate::Or(preds) => preds.iter().any(|p| p.evaluate(record)),
        }
    }
}

fn field_values(field: &Field, record: &QueryRecord) -> Vec<String> {
    match field {
        Field::Sender => record
            .signer
            .iter()
            .map(|a| hex::encode(&a.0))
            .collect(),
        Field::ExtraSigner => record
            .extra_signers
            .iter()
            .map(|a| hex::encode(&a.0))
            .collect(),
        Field::Recipient => record.recipient.iter().map(|n| n.0.clone()).collect(),
    }
}

/// Atomically-swappable predicate. Reads clone the inner `Arc` out from
/// under the lock and evaluate outside it, so an in-flight evaluation
/// never observes a torn predicate mid-swap.
#[derive(Debug)]
pub struct ControlQuery {
    inner: RwLock<Arc<Predicate>>,
}

impl ControlQuery {
    pub fn new(predicate: Predicate) -> Self {
        Self {
            inner: RwLock::new(Arc::new(predicate)),
        }
    }

    pub fn matches(&self, record: &QueryRecord) -> bool {
        let predicate = self.inner.read().expect("control query lock poisoned").clone();
        predicate.evaluate(record)
    }

    /// Atomically replaces the predicate.
    pub fn change(&self, predicate: Predicate) {
        let mut guard = self.inner.write().expect("control query lock poisoned");
        *guard = Arc::new(predicate);
    }

    pub fn current(&self) -> Arc<Predicate> {
        self.inner.read().expect("control query lock poisoned").clone()
    }
}

/// Builds the sender control from a subscription's `SenderFilter`.
pub fn sender_control(filter: &crate::model::SenderFilter) -> ControlQuery {
    ControlQuery::new(predicate_from_sender_filter(filter))
}

pub fn predicate_from_sender_filter(filter: &crate::model::SenderFilter) -> Predicate {
    match filter {
        crate::model::SenderFilter::Any => Predicate::Any,
        crate::model::SenderFilter::Some(set) if set.is_empty() => Predicate::None,
        crate::model::SenderFilter::Some(set) => Predicate::Or(vec![
            Predicate::In {
                field: Field::Sender,
                values: set.iter().map(|a| hex::encode(&a.0)).collect(),
            },
            Predicate::In {
                field: Field::ExtraSigner,
                values: set.iter().map(|a| hex::encode(&a.0)).collect(),
            },
        ]),
    }
}

/// Builds the message control from a subscription's destination set.
pub fn message_control(destinations: &std::collections::HashSet<NetworkId>) -> ControlQuery {
    ControlQuery::new(predicate_from_destinations(destinations))
}

pub fn predicate_from_destinations(destinations: &std::collections::HashSet<NetworkId>) -> Predicate {
    if destinations.is_empty() {
        Predicate::None
    } else {
        Predicate::In {
            field: Field::Recipient,
            values: destinations.iter().map(|n| n.0.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SenderFilter;
    use std::collections::HashSet;

    #[test]
    fn any_matches_everything() {
        let cq = ControlQuery::new(Predicate::Any);
        assert!(cq.matches(&QueryRecord::default()));
    }

    #[test]
    fn none_matches_nothing() {
        let cq = ControlQuery::new(Predicate::None);
        assert!(!cq.matches(&QueryRecord::default()));
    }

    #[test]
    fn sender_control_matches_signer_or_extra_signer() {
        let acct = AccountRef::from_bytes(vec![1, 2, 3]);
        let mut set = HashSet::new();
        set.insert(acct.clone());
        let filter = SenderFilter::Some(set);
        let cq = sender_control(&filter);

        let record = QueryRecord {
            signer: Some(acct.clone()),
            ..Default::default()
        };
        assert!(cq.matches(&record));

        let record_extra = QueryRecord {
            extra_signers: vec![acct],
            ..Default::default()
        };
        assert!(cq.matches(&record_extra));

        let other = QueryRecord {
            signer: Some(AccountRef::from_bytes(vec![9, 9, 9])),
            ..Default::default()
        };
        assert!(!cq.matches(&other));
    }

    #[test]
    fn message_control_matches_destination_membership() {
        let mut destinations = HashSet::new();
        destinations.insert(NetworkId::new("urn:ocn:polkadot:2004"));
        let cq = message_control(&destinations);

        let record = QueryRecord {
            recipient: Some(NetworkId::new("urn:ocn:polkadot:2004")),
            ..Default::default()
        };
        assert!(cq.matches(&record));

        let other = QueryRecord {
            recipient: Some(NetworkId::new("urn:ocn:polkadot:2000")),
            ..Default::default()
        };
        assert!(!cq.matches(&other));
    }

    #[test]
    fn change_swaps_predicate_atomically() {
        let cq = ControlQuery::new(Predicate::None);
        assert!(!cq.matches(&QueryRecord::default()));
        cq.change(Predicate::Any);
        assert!(cq.matches(&QueryRecord::default()));
    }
}
