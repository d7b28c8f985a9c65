use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Callback<T> = Arc<dyn Fn(&T) -> bool + Send + Sync + 'static>;
type Filter<T> = Arc<dyn Fn(&T) -> bool + Send + Sync + 'static>;

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Handle returned by `subscribe*`, used to unsubscribe later
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn next() -> Self {
        Self(NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Delivery counters for one bus
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventBusStats {
    pub events_published: u64,
    pub events_delivered: u64,
    pub events_filtered: u64,
    pub active_subscriptions: usize,
}

struct Subscription<T> {
    id: SubscriptionId,
    callback: Callback<T>,
    filter: Option<Filter<T>>,
}

impl<T> Clone for Subscription<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: self.callback.clone(),
            filter: self.filter.clone(),
        }
    }
}

/// Plain (single-owner) event bus.
///
/// Callbacks return `true` to stay subscribed and `false` to be removed after
/// the current delivery.
pub struct EventBus<T> {
    subscriptions: Vec<Subscription<T>>,
    stats: EventBusStats,
}

impl<T> EventBus<T> {
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
            stats: EventBusStats::default(),
        }
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.insert(Arc::new(callback), None)
    }

    pub fn subscribe_with_filter<F, P>(&mut self, callback: F, filter: P) -> SubscriptionId
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.insert(Arc::new(callback), Some(Arc::new(filter)))
    }

    fn insert(&mut self, callback: Callback<T>, filter: Option<Filter<T>>) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.subscriptions.push(Subscription {
            id,
            callback,
            filter,
        });
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|sub| sub.id != id);
        before != self.subscriptions.len()
    }

    pub fn publish(&mut self, event: &T) {
        let snapshot = self.subscriptions.clone();
        let outcome = deliver(&snapshot, event);
        self.apply(outcome);
    }

    fn apply(&mut self, outcome: Delivery) {
        self.stats.events_published += 1;
        self.stats.events_delivered += outcome.delivered;
        self.stats.events_filtered += outcome.filtered;
        if !outcome.finished.is_empty() {
            self.subscriptions
                .retain(|sub| !outcome.finished.contains(&sub.id));
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn stats(&self) -> EventBusStats {
        EventBusStats {
            active_subscriptions: self.subscriptions.len(),
            ..self.stats.clone()
        }
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct Delivery {
    delivered: u64,
    filtered: u64,
    finished: Vec<SubscriptionId>,
}

fn deliver<T>(subscriptions: &[Subscription<T>], event: &T) -> Delivery {
    let mut outcome = Delivery::default();
    for sub in subscriptions {
        if let Some(filter) = &sub.filter {
            if !filter(event) {
                outcome.filtered += 1;
                continue;
            }
        }
        outcome.delivered += 1;
        if !(sub.callback)(event) {
            outcome.finished.push(sub.id);
        }
    }
    outcome
}

/// Thread-safe, cloneable handle to a shared [`EventBus`].
///
/// Callbacks run after the internal lock is released, so a subscriber may
/// publish or (un)subscribe on the same bus from inside its callback.
pub struct EventBusContainer<T> {
    inner: Arc<Mutex<EventBus<T>>>,
}

impl<T> Clone for EventBusContainer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> EventBusContainer<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(EventBus::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EventBus<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to every event. Return `false` from the callback to unsubscribe.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.lock().subscribe(callback)
    }

    /// Subscribe to events accepted by `filter`
    pub fn subscribe_with_filter<F, P>(&self, callback: F, filter: P) -> SubscriptionId
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.lock().subscribe_with_filter(callback, filter)
    }

    /// Subscribe for exactly one event
    pub fn subscribe_once<F>(&self, callback: F) -> SubscriptionId
    where
        F: FnOnce(&T) + Send + Sync + 'static,
    {
        let slot = Mutex::new(Some(callback));
        self.subscribe(move |event| {
            let callback = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(callback) = callback {
                callback(event);
            }
            false
        })
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.lock().unsubscribe(id)
    }

    pub fn publish(&self, event: T) {
        let snapshot = self.lock().subscriptions.clone();
        let outcome = deliver(&snapshot, &event);
        self.lock().apply(outcome);
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscriber_count()
    }

    pub fn stats(&self) -> EventBusStats {
        self.lock().stats()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl<T> Default for EventBusContainer<T> {
    fn default() -> Self {
        Self::new()
    }
}
