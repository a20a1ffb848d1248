// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

mod get_capabilities;

pub use get_capabilities::{CapabilitiesResponse, get_capabilities};
