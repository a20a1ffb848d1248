// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Counters for failures recovered internally by this crate: pending-store
//! errors retried on the next observation, observer-leg stream errors
//! recovered by the switchboard's backoff cycle, and listener errors
//! caught per-notifier by the `NotifierHub`. These are defined here rather
//! than in the hosting process because the failures are observed here;
//! `register_into` lets the hosting process attach them to its own
//! Prometheus registry so a single `/metrics` endpoint covers both.

use lazy_static::lazy_static;
use prometheus::{Counter, Error, Registry};

lazy_static! {
    pub static ref STORE_ERRORS: Counter = Counter::new(
        "store_errors_total",
        "Total number of pending-store operations that failed and were retried"
    )
    .expect("failed to create store_errors_total counter");

    pub static ref SUBSCRIPTION_ERRORS: Counter = Counter::new(
        "subscription_errors_total",
        "Total number of observer-leg stream errors recovered by the switchboard"
    )
    .expect("failed to create subscription_errors_total counter");

    pub static ref NOTIFY_ERRORS: Counter = Counter::new(
        "notify_errors_total",
        "Total number of listener errors caught while dispatching waypoint notifications"
    )
    .expect("failed to create notify_errors_total counter");
}

/// Registers this crate's counters into `registry`. Call once at process
/// startup, before the first increment.
pub fn register_into(registry: &Registry) -> Result<(), Error> {
    registry.register(Box::new(STORE_ERRORS.clone()))?;
    registry.register(Box::new(SUBSCRIPTION_ERRORS.clone()))?;
    registry.register(Box::new(NOTIFY_ERRORS.clone()))?;
    Ok(())
}
