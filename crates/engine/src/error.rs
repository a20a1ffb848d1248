// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error taxonomy for the engine and switchboard, following the
//! locally-recovered / surfaced-to-caller split laid out in the
//! specification's error handling design.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("pending store unavailable: {0}")]
    Unavailable(String),

    #[error("serialization failure: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SwitchboardError {
    #[error("too many subscribers")]
    TooManySubscribers,

    #[error("unknown subscription: {0}")]
    UnknownSubscription(String),

    #[error("invalid subscription: {0}")]
    InvalidSubscription(#[from] crate::model::SubscriptionError),

    #[error("subscription store error: {0}")]
    Store(#[from] StoreError),
}
