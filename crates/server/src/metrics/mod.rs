// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod middleware;
pub mod registry;

pub use middleware::{metrics_middleware, record_waypoint_emitted};
pub use registry::{gather_metric_families, gather_metrics, init};
