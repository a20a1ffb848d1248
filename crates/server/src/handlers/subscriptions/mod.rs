// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

mod create_subscription;
mod delete_subscription;
mod error;
mod get_subscription;
mod list_subscriptions;
mod patch_subscription;
mod update_subscription;

pub use create_subscription::create_subscription;
pub use delete_subscription::delete_subscription;
pub use get_subscription::get_subscription;
pub use list_subscriptions::list_subscriptions;
pub use patch_subscription::patch_subscription;
pub use update_subscription::update_subscription;
