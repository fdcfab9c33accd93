use std::{marker::PhantomData, sync::Arc};

use crate::Event;

/// Receives values published by a [`LiveData`](crate::LiveData).
///
/// All observers of one container are called sequentially from its
/// dispatcher task, in the order they were attached. Keep `on_changed`
/// short and non-blocking: a slow observer delays every other observer
/// of the same container.
///
/// A panic inside `on_changed` is caught by the dispatcher. The observer is
/// then detached and the remaining observers still receive the value.
pub trait Observer<V>: Send + 'static {
    fn on_changed(&mut self, value: &V);
}

/// Adapts a closure into an [`Observer`].
///
/// Used by [`LiveData::observe_fn`](crate::LiveData::observe_fn).
pub struct FnObserver<F>(F);

impl<F> FnObserver<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<V, F> Observer<V> for FnObserver<F>
where
    F: FnMut(&V) + Send + 'static,
{
    fn on_changed(&mut self, value: &V) {
        (self.0)(value)
    }
}

/// Observer that delivers each [`Event`] at most once per subscriber key.
///
/// The container replays its latest value to every observer that attaches
/// later, e.g. a view re-subscribing after it was rebuilt. `EventObserver`
/// makes that replay harmless: before invoking the callback it checks the
/// event's delivery record for its `key`, and afterwards marks the event as
/// delivered for that key.
///
/// # Shared keys
///
/// The delivery record is keyed by string only. Two observers built with the
/// same key, including two observers using [`with_default_key`](Self::with_default_key),
/// are one logical consumer: whichever sees an event first consumes it and
/// the other one is skipped. Give every independent consumer its own key.
///
/// # Panicking callbacks
///
/// The event is marked only after the callback returns. If the callback
/// panics, the key stays undelivered and the next notification of the same
/// event for that key (a later replay) invokes the callback again.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use liveevent::{Event, EventObserver};
///
/// let mut seen = Vec::new();
/// let event = Arc::new(Event::new(42));
/// {
///     let mut observer = EventObserver::new("s1", |v: &i32| seen.push(*v));
///     observer.deliver(&event);
///     observer.deliver(&event); // replay, ignored
/// }
/// assert_eq!(seen, vec![42]);
/// ```
pub struct EventObserver<T, F> {
    key: Arc<str>,
    callback: F,
    _payload: PhantomData<fn(&T)>,
}

impl<T, F> EventObserver<T, F>
where
    F: FnMut(&T),
{
    pub fn new<K: Into<Arc<str>>>(key: K, callback: F) -> Self {
        Self {
            key: key.into(),
            callback,
            _payload: PhantomData,
        }
    }

    /// Observer using the empty key. See the note on shared keys above.
    pub fn with_default_key(callback: F) -> Self {
        Self::new("", callback)
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Invokes the callback unless `event` was already delivered for this key.
    ///
    /// Returns true if the callback ran.
    pub fn deliver(&mut self, event: &Event<T>) -> bool {
        if event.is_delivered_for(&self.key) {
            return false;
        }
        (self.callback)(event.payload());
        event.mark_as_delivered_for(&self.key);
        true
    }
}

impl<T, F> Observer<Arc<Event<T>>> for EventObserver<T, F>
where
    T: Send + Sync + 'static,
    F: FnMut(&T) + Send + 'static,
{
    fn on_changed(&mut self, event: &Arc<Event<T>>) {
        if self.deliver(event) {
            tracing::trace!(key = %self.key, event_id = event.id(), "event delivered");
        } else {
            tracing::trace!(
                key = %self.key,
                event_id = event.id(),
                "event already delivered, skipping"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        panic::{AssertUnwindSafe, catch_unwind},
        sync::atomic::{AtomicUsize, Ordering},
    };

    #[test]
    fn test_delivers_once_per_event() {
        let mut calls = Vec::new();
        let event = Arc::new(Event::new(42));
        let mut observer = EventObserver::new("s1", |v: &i32| calls.push(*v));

        assert!(observer.deliver(&event));
        assert!(!observer.deliver(&event));
        drop(observer);

        assert_eq!(calls, vec![42]);
        assert!(event.is_delivered_for("s1"));
    }

    #[test]
    fn test_distinct_keys_deliver_independently() {
        let event = Arc::new(Event::new("y"));
        let mut a = 0;
        let mut b = 0;
        {
            let mut s1 = EventObserver::new("s1", |_: &&str| a += 1);
            s1.deliver(&event);
        }
        {
            let mut s2 = EventObserver::new("s2", |_: &&str| b += 1);
            s2.deliver(&event);
            s2.deliver(&event);
        }
        assert_eq!((a, b), (1, 1));
        assert_eq!(event.delivered_count(), 2);
    }

    #[test]
    fn test_default_key_is_shared() {
        let event = Arc::new(Event::new(()));
        let mut first = EventObserver::with_default_key(|_: &()| {});
        let mut second = EventObserver::with_default_key(|_: &()| {});

        assert_eq!(first.key(), "");
        assert!(first.deliver(&event));
        assert!(!second.deliver(&event));
    }

    #[test]
    fn test_new_event_is_delivered_again() {
        let mut count = 0;
        let mut observer = EventObserver::new("s1", |_: &u8| count += 1);
        observer.deliver(&Event::new(1));
        observer.deliver(&Event::new(1));
        drop(observer);
        assert_eq!(count, 2);
    }

    #[test]
    fn test_panicking_callback_leaves_event_undelivered() {
        let event = Arc::new(Event::new(5));
        fn explode(_: &i32) {
            panic!("boom");
        }
        let mut observer = EventObserver::new("k", explode);

        let result = catch_unwind(AssertUnwindSafe(|| observer.deliver(&event)));
        assert!(result.is_err());
        assert!(!event.is_delivered_for("k"));

        let mut retried = false;
        let mut retry = EventObserver::new("k", |_: &i32| retried = true);
        assert!(retry.deliver(&event));
        drop(retry);
        assert!(retried);
    }

    #[test]
    fn test_on_changed_gates_delivery() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let mut observer = EventObserver::new("s1", move |_: &u32| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let event = Arc::new(Event::new(9));
        observer.on_changed(&event);
        observer.on_changed(&event);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fn_observer() {
        let sum = Arc::new(AtomicUsize::new(0));
        let acc = sum.clone();
        let mut observer = FnObserver::new(move |v: &usize| {
            acc.fetch_add(*v, Ordering::SeqCst);
        });
        observer.on_changed(&2);
        observer.on_changed(&3);
        assert_eq!(sum.load(Ordering::SeqCst), 5);
    }
}
