// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use xcm_monitor_config::{ConfigError, MonitorConfig};
use xcm_monitor_engine::{
    Clock, InMemoryPendingStore, InMemorySubscriptionStore, JsonFilePendingStore,
    JsonFileSubscriptionStore, ListenerScope, LogNotifier, MatchingEngine, NotifierHub,
    SharedPendingStore, Switchboard, SwitchboardError, SubscriptionStore, SystemClock,
    WaypointRelay,
};

use crate::chain::{MonitorExtractorRegistry, SubxtBlockSource};
use crate::notify::WebhookNotifier;
use crate::routes::RouteRegistry;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to open durable store: {0}")]
    Store(#[from] xcm_monitor_engine::StoreError),

    #[error("failed to start switchboard: {0}")]
    Switchboard(#[from] SwitchboardError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: MonitorConfig,
    pub switchboard: Arc<Switchboard>,
    pub block_source: Arc<SubxtBlockSource>,
    pub route_registry: RouteRegistry,
    pub started_at: Instant,
}

impl AppState {
    pub async fn new(config: MonitorConfig) -> Result<Self, StateError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let sweep_clock = clock.clone();

        let pending_store: SharedPendingStore = if config.store.pending_store_path.is_empty() {
            Arc::new(InMemoryPendingStore::new())
        } else {
            Arc::new(JsonFilePendingStore::open(&config.store.pending_store_path).await?)
        };

        let subscription_store: Arc<dyn SubscriptionStore> =
            if config.store.subscription_store_path.is_empty() {
                Arc::new(InMemorySubscriptionStore::new())
            } else {
                Arc::new(
                    JsonFileSubscriptionStore::open(&config.store.subscription_store_path).await?,
                )
            };

        let block_source = Arc::new(SubxtBlockSource::new(&config.chains));
        let extractors = Arc::new(MonitorExtractorRegistry::new());

        let notifier_hub = Arc::new(NotifierHub::new());
        notifier_hub.on(ListenerScope::Any, Arc::new(LogNotifier));
        if let Some(webhook_url) = &config.notify.webhook_url {
            let timeout = std::time::Duration::from_millis(config.notify.webhook_timeout_ms);
            notifier_hub.on(
                ListenerScope::Any,
                Arc::new(WebhookNotifier::new(webhook_url.clone(), timeout)),
            );
        }

        let waypoint_relay = WaypointRelay::new();
        let engine = Arc::new(MatchingEngine::new(
            pending_store,
            clock,
            config.engine.default_outbound_ttl(),
            config.engine.default_outbound_ttl(),
            waypoint_relay.callback(),
        ));

        let sweep_engine = engine.clone();
        let sweep_frequency = config.engine.scheduler_frequency();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_frequency);
            loop {
                ticker.tick().await;
                if let Err(e) = sweep_engine.sweep(sweep_clock.now_millis()).await {
                    tracing::warn!(error = %e, "pending-entry sweep failed");
                }
            }
        });

        let switchboard = Switchboard::new(
            engine,
            notifier_hub,
            subscription_store,
            block_source.clone(),
            extractors,
            config.engine.subscription_max_ephemeral,
            config.engine.subscription_max_persistent,
            config.engine.sub_error_retry(),
        );

        waypoint_relay.bind(switchboard.clone()).await;
        switchboard.start().await?;

        Ok(Self {
            config,
            switchboard,
            block_source,
            route_registry: RouteRegistry::new(),
            started_at: Instant::now(),
        })
    }
}
