// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;
use xcm_monitor_engine::{Notifier, NotifyError, Subscription, WaypointKind, XcmNotifyMessage};

use crate::metrics::record_waypoint_emitted;

fn waypoint_label(kind: WaypointKind) -> &'static str {
    match kind {
        WaypointKind::Sent => "sent",
        WaypointKind::Received => "received",
        WaypointKind::Relayed => "relayed",
        WaypointKind::Timeout => "timeout",
        WaypointKind::Hop => "hop",
    }
}

/// Delivers every dispatched waypoint as an HTTP POST to a configured
/// endpoint, for deployments that want push delivery instead of reading
/// the structured logs. Delivery failures are logged and swallowed
/// rather than retried — `NotifierHub::dispatch` already treats a failing
/// listener as independent of the others, so retry policy belongs to the
/// receiving endpoint, not here.
#[derive(Debug)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(
        &self,
        descriptor: &Subscription,
        message: &XcmNotifyMessage,
    ) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(message)
            .send()
            .await
            .map_err(|e| NotifyError::Listener(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(
                subscription_id = %descriptor.id,
                %status,
                "webhook endpoint returned non-success status"
            );
            return Err(NotifyError::Listener(format!(
                "webhook returned {status}"
            )));
        }

        record_waypoint_emitted(waypoint_label(message.kind()));
        Ok(())
    }
}
