//! Explicit subscriber lifecycles.
//!
//! A [`Registry`] is owned by the `Project` value; there is no process-wide
//! callback state. Subscribing hands back a [`Subscription`] guard that
//! unregisters the callback on drop.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

/// Guard for one registered callback. Dropping it unsubscribes.
pub struct Subscription(Option<Box<dyn FnOnce() + Send>>);

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.0.take() {
            unsubscribe();
        }
    }
}

pub(crate) struct Registry<C> {
    slots: Arc<Mutex<HashMap<u64, C>>>,
    next_id: u64,
}

impl<C> Default for Registry<C> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            next_id: 0,
        }
    }
}

impl<C: Send + 'static> Registry<C> {
    pub fn subscribe(&mut self, callback: C) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.slots.lock().unwrap().insert(id, callback);

        let weak: Weak<Mutex<HashMap<u64, C>>> = Arc::downgrade(&self.slots);
        Subscription(Some(Box::new(move || {
            if let Some(slots) = weak.upgrade() {
                slots.lock().unwrap().remove(&id);
            }
        })))
    }

    /// Invoke `f` for every live callback, synchronously and in no
    /// particular order.
    pub fn for_each(&self, mut f: impl FnMut(&C)) {
        for callback in self.slots.lock().unwrap().values() {
            f(callback);
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropping_subscription_unregisters() {
        let mut registry: Registry<Box<dyn Fn() + Send>> = Registry::default();
        let sub = registry.subscribe(Box::new(|| {}));
        assert_eq!(registry.len(), 1);
        drop(sub);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_subscriptions_are_independent() {
        let mut registry: Registry<Box<dyn Fn() + Send>> = Registry::default();
        let a = registry.subscribe(Box::new(|| {}));
        let b = registry.subscribe(Box::new(|| {}));
        drop(a);
        assert_eq!(registry.len(), 1);
        drop(b);
        assert_eq!(registry.len(), 0);
    }
}
