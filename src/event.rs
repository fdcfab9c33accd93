use std::{
    collections::HashSet,
    fmt,
    sync::{Arc, Mutex, PoisonError},
    time::SystemTime,
};

use uuid::Uuid;

use crate::EventId;

/// A single emission wrapped together with its delivery record.
///
/// An `Event` is created once per [`post_event`](crate::MutableEventLiveData::post_event)
/// and shared as `Arc<Event<T>>` with every observer of the container. The
/// delivery record is the set of subscriber keys that have already consumed
/// the payload. Keys are only ever added, never removed.
///
/// Besides the payload and the record, every event carries:
/// - `id`: random identifier, unique per emission.
/// - `timestamp`: creation time in nanoseconds since Unix epoch (truncated to `u64`).
///
/// Neither takes part in delivery decisions; they exist for logging and tests.
pub struct Event<T> {
    id: EventId,
    timestamp: u64,
    payload: T,
    delivered: Mutex<HashSet<Arc<str>>>,
}

impl<T> Event<T> {
    /// Wrap a payload with an empty delivery record.
    pub fn new(payload: T) -> Self {
        Self {
            id: Uuid::new_v4().as_u128(),
            timestamp: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default(),
            payload,
            delivered: Mutex::new(HashSet::new()),
        }
    }

    #[inline]
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Unique identifier of this emission.
    #[inline]
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Timestamp in nanoseconds since Unix epoch (u64 truncation).
    /// Zero if the system clock is set before the epoch.
    #[inline]
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Returns true if the subscriber identified by `key` already consumed this event.
    pub fn is_delivered_for(&self, key: &str) -> bool {
        self.record().contains(key)
    }

    /// Records that the subscriber identified by `key` consumed this event.
    ///
    /// Idempotent: marking the same key again has no further effect.
    /// The record is shared, so every holder of this `Arc<Event<T>>` sees the change.
    pub fn mark_as_delivered_for(&self, key: &str) {
        let mut record = self.record();
        if !record.contains(key) {
            record.insert(Arc::from(key));
        }
    }

    /// Number of distinct keys this event has been delivered to.
    pub fn delivered_count(&self) -> usize {
        self.record().len()
    }

    fn record(&self) -> std::sync::MutexGuard<'_, HashSet<Arc<str>>> {
        // The set is valid after any panic: inserts are the only mutation.
        self.delivered.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: fmt::Debug> fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id)
            .field("timestamp", &self.timestamp)
            .field("payload", &self.payload)
            .field("delivered", &self.delivered_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_event_is_undelivered() {
        let event = Event::new(42);
        assert_eq!(*event.payload(), 42);
        assert!(!event.is_delivered_for(""));
        assert!(!event.is_delivered_for("s1"));
        assert_eq!(event.delivered_count(), 0);
    }

    #[test]
    fn test_mark_then_query() {
        let event = Event::new("x");
        event.mark_as_delivered_for("s1");
        assert!(event.is_delivered_for("s1"));
    }

    #[test]
    fn test_mark_is_idempotent() {
        let event = Event::new(());
        event.mark_as_delivered_for("s1");
        event.mark_as_delivered_for("s1");
        assert!(event.is_delivered_for("s1"));
        assert_eq!(event.delivered_count(), 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let event = Event::new(1.5);
        event.mark_as_delivered_for("a");
        assert!(event.is_delivered_for("a"));
        assert!(!event.is_delivered_for("b"));
    }

    #[test]
    fn test_record_is_shared_between_holders() {
        let event = Arc::new(Event::new(7));
        let other = event.clone();
        other.mark_as_delivered_for("s2");
        assert!(event.is_delivered_for("s2"));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Event::new(0);
        let b = Event::new(0);
        assert_ne!(a.id(), b.id());
        assert!(a.timestamp() > 0);
    }
}
