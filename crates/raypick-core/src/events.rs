//! Destruction notifications.
//!
//! A [`DestroySignal`] belongs to the object being watched. Observers hold a
//! [`Subscription`] and poll it. Dropping the subscription unsubscribes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Fires once when its owner is destroyed. Dropping the signal fires it.
#[derive(Debug, Default)]
pub struct DestroySignal {
    destroyed: Arc<AtomicBool>,
}

impl DestroySignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new observer token.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            destroyed: Arc::clone(&self.destroyed),
        }
    }

    /// Marks the owner destroyed for every subscriber.
    pub fn fire(&self) {
        self.destroyed.store(true, Ordering::Release);
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        Arc::strong_count(&self.destroyed) - 1
    }
}

impl Drop for DestroySignal {
    fn drop(&mut self) {
        self.fire();
    }
}

/// Observer side of a [`DestroySignal`].
#[derive(Debug, Clone)]
pub struct Subscription {
    destroyed: Arc<AtomicBool>,
}

impl Subscription {
    /// Whether the watched object has been destroyed.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fire_reaches_subscribers() {
        let signal = DestroySignal::new();
        let sub = signal.subscribe();
        assert!(!sub.is_destroyed());
        signal.fire();
        assert!(sub.is_destroyed());
    }

    #[test]
    fn test_drop_fires() {
        let signal = DestroySignal::new();
        let sub = signal.subscribe();
        drop(signal);
        assert!(sub.is_destroyed());
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let signal = DestroySignal::new();
        let sub = signal.subscribe();
        assert_eq!(signal.subscriber_count(), 1);
        drop(sub);
        assert_eq!(signal.subscriber_count(), 0);
    }
}
