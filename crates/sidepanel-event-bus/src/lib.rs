//! Event Bus System
//!
//! Provides a unified, type-safe event bus implementation with:
//! - Subscription lifecycle management (subscribe/unsubscribe)
//! - Filtering at subscription time
//! - Delivery statistics
//! - Automatic cleanup for one-shot subscriptions

mod bus;

pub use bus::{EventBus, EventBusContainer, EventBusStats, SubscriptionId};
