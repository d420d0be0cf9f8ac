// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscriptions to observable event sources.
//!
//! # Overview
//!
//! The subscription system consists of:
//!
//! - [`Observable`] - Trait for sources that accept and drop handlers
//! - [`EventSpec`] - The event a handler listens for, `signal` or `signal::detail`
//! - [`SubscriptionRegistry`] - Tracks every connection so it can be torn down
//! - [`SubscriptionId`] - A unique identifier for one registration
//!
//! Named subscriptions can be paused and resumed, which is how a component
//! writes a value without hearing its own change notification.
//!
//! # Thread Safety
//!
//! The registry is `Send + Sync`. It never holds its lock while calling into
//! a source, so handlers may use the registry while being dispatched.

mod registry;
mod source;

pub use registry::{SubscriptionId, SubscriptionRegistry};
pub use source::{EventSpec, Handler, HandlerId, Observable, Source};
