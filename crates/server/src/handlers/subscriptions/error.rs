// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! HTTP mapping for switchboard errors: `TOO_MANY_SUBSCRIBERS` becomes a
//! 429, `UNKNOWN_SUBSCRIPTION` a 404, `INVALID_SUBSCRIPTION` a 400, and a
//! store failure a 503.

use axum::{http::StatusCode, response::{IntoResponse, Json}};
use serde::Serialize;
use xcm_monitor_engine::SwitchboardError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub code: &'static str,
    pub error: String,
}

pub struct SubscriptionApiError(pub SwitchboardError);

impl From<SwitchboardError> for SubscriptionApiError {
    fn from(err: SwitchboardError) -> Self {
        Self(err)
    }
}

impl IntoResponse for SubscriptionApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self.0 {
            SwitchboardError::TooManySubscribers => {
                (StatusCode::TOO_MANY_REQUESTS, "TOO_MANY_SUBSCRIBERS")
            }
            SwitchboardError::UnknownSubscription(_) => (StatusCode::NOT_FOUND, "UNKNOWN_SUBSCRIPTION"),
            SwitchboardError::InvalidSubscription(_) => (StatusCode::BAD_REQUEST, "INVALID_SUBSCRIPTION"),
            SwitchboardError::Store(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE"),
        };

        let body = ApiErrorBody {
            code,
            error: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
