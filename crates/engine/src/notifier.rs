// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Dispatches emitted notifications to registered listeners. Listener
//! errors are caught per-listener and reported via telemetry;
//! they never abort dispatch to the remaining listeners.

use crate::model::{Subscription, WaypointKind, XcmNotifyMessage};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("listener failed: {0}")]
    Listener(String),
}

/// The sink a subscriber ultimately receives a matched/timed-out waypoint
/// through. Two concrete implementations ship with this crate
/// (`LogNotifier`); deployments needing webhook or websocket delivery
/// implement this trait themselves (the server crate's `WebhookNotifier`
/// is one such implementation).
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    async fn notify(
        &self,
        descriptor: &Subscription,
        message: &XcmNotifyMessage,
    ) -> Result<(), NotifyError>;
}

/// Listens on every waypoint kind unless scoped to a specific one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerScope {
    Any,
    Kind(WaypointKind),
}

struct Listener {
    id: u64,
    scope: ListenerScope,
    notifier: Arc<dyn Notifier>,
}

/// Event-listener registry keyed by waypoint kind. `dispatch` delivers an
/// emitted message to every listener whose scope admits the message's
/// kind, never letting one listener's error prevent delivery to another.
#[derive(Default)]
pub struct NotifierHub {
    listeners: RwLock<Vec<Listener>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for NotifierHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.listeners.read().expect("notifier hub lock poisoned").len();
        f.debug_struct("NotifierHub").field("listeners", &count).finish()
    }
}

impl NotifierHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener, returning an id usable with `off`.
    pub fn on(&self, scope: ListenerScope, notifier: Arc<dyn Notifier>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.listeners
            .write()
            .expect("notifier hub lock poisoned")
            .push(Listener { id, scope, notifier });
        id
    }

    pub fn off(&self, id: u64) {
        self.listeners
            .write()
            .expect("notifier hub lock poisoned")
            .retain(|l| l.id != id);
    }

    /// Dispatches `message` to every listener admitting its kind.
    pub async fn dispatch(&self, descriptor: &Subscription, message: &XcmNotifyMessage) {
        let kind = message.kind();
        let targets: Vec<Arc<dyn Notifier>> = self
            .listeners
            .read()
            .expect("notifier hub lock poisoned")
            .iter()
            .filter(|l| matches!(l.scope, ListenerScope::Any) || l.scope == ListenerScope::Kind(kind))
            .map(|l| l.notifier.clone())
            .collect();

        for notifier in targets {
            if let Err(e) = notifier.notify(descriptor, message).await {
                crate::metrics::NOTIFY_ERRORS.inc();
                error!(error = %e, subscription_id = %descriptor.id, "NotifyError dispatching waypoint");
            }
        }
    }
}

impl PartialEq for ListenerScope {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (ListenerScope::Any, ListenerScope::Any)
        ) || match (self, other) {
            (ListenerScope::Kind(a), ListenerScope::Kind(b)) => a == b,
            _ => false,
        }
    }
}
impl Eq for ListenerScope {}

/// Structured-logging sink: emits one `tracing::info!` per dispatched
/// waypoint. The default notifier for deployments with no external
/// delivery configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        descriptor: &Subscription,
        message: &XcmNotifyMessage,
    ) -> Result<(), NotifyError> {
        info!(
            subscription_id = %descriptor.id,
            kind = ?message.kind(),
            "xcm waypoint reached"
        );
        Ok(())
    }
}

/// In-memory notifier for tests: records every dispatched message.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub received: std::sync::Mutex<Vec<(String, WaypointKind)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        descriptor: &Subscription,
        message: &XcmNotifyMessage,
    ) -> Result<(), NotifyError> {
        self.received
            .lock()
            .unwrap()
            .push((descriptor.id.clone(), message.kind()));
        Ok(())
    }
}
