// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Clock injection for the matching engine so that TTL/sweep behavior is
//! deterministically testable without real sleeps -- tests can assert a
//! timeout fires at an exact millisecond offset.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of "now", expressed as milliseconds since the Unix epoch so it
/// serializes trivially alongside the rest of the pending-entry state.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now_millis(&self) -> u64;
}

/// Production clock backed by the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis() as u64
    }
}

/// A manually-advanced clock for tests, mirroring `tokio::time::advance`
/// but scoped to the engine's own notion of "now" rather than the Tokio
/// timer wheel, since the engine never actually sleeps on the clock.
#[derive(Debug)]
pub struct FakeClock(std::sync::atomic::AtomicU64);

impl FakeClock {
    pub fn new(start_millis: u64) -> Self {
        Self(std::sync::atomic::AtomicU64::new(start_millis))
    }

    pub fn advance(&self, by: Duration) {
        self.0
            .fetch_add(by.as_millis() as u64, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn set(&self, millis: u64) {
        self.0.store(millis, std::sync::atomic::Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now_millis(&self) -> u64 {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}
