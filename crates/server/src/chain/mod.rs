// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Concrete chain connectivity and XCM decoding: the `subxt`-backed
//! `BlockSource` and the `XcmExtractor` implementations the engine
//! declares as out-of-scope external collaborators.

pub mod block_source;
pub mod xcm_extractor;

pub use block_source::SubxtBlockSource;
pub use xcm_extractor::MonitorExtractorRegistry;
