use std::{fmt, ops::Deref, sync::Arc};

use crate::{Config, Event, EventObserver, LiveData, MutableLiveData, ObserverHandle, Result};

/// Read-only view of a container of [`Event`]s.
pub type EventLiveData<T> = LiveData<Arc<Event<T>>>;

/// Container of payload-less signal events, e.g. "user tapped logout".
///
/// See [`MutableEventLiveData::fire`].
pub type SimpleEventLiveData = MutableEventLiveData<()>;

/// Live data specialised to one-shot events.
///
/// Every [`post_event`](Self::post_event) wraps the payload in a fresh
/// [`Event`] and publishes it. Observers attached through
/// [`observe_event`](LiveData::observe_event) get each event at most once per
/// key, even though the container replays its latest event to observers that
/// attach later.
///
/// # Examples
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use liveevent::{MutableEventLiveData, Result};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<()> {
/// let errors = MutableEventLiveData::<String>::new()?;
/// let shown = Arc::new(Mutex::new(Vec::new()));
///
/// errors.post_event("network unreachable".to_string())?;
///
/// let sink = shown.clone();
/// let first = errors
///     .observe_event("toast", move |msg: &String| sink.lock().unwrap().push(msg.clone()))
///     .await?;
/// errors.flush().await?;
///
/// // The view is rebuilt and subscribes again with the same key.
/// drop(first);
/// let sink = shown.clone();
/// let _second = errors
///     .observe_event("toast", move |msg: &String| sink.lock().unwrap().push(msg.clone()))
///     .await?;
/// errors.flush().await?;
///
/// assert_eq!(*shown.lock().unwrap(), vec!["network unreachable".to_string()]);
/// # Ok(())
/// # }
/// ```
pub struct MutableEventLiveData<T> {
    inner: MutableLiveData<Arc<Event<T>>>,
}

impl<T> Clone for MutableEventLiveData<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> MutableEventLiveData<T> {
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self {
            inner: MutableLiveData::with_config(config)?,
        })
    }

    /// Fire an event carrying `payload` without waiting.
    ///
    /// Exactly one [`Event`] is created per call, and that same instance is
    /// handed to every observer attached now or before the next event.
    pub fn post_event(&self, payload: T) -> Result<()> {
        let event = Arc::new(Event::new(payload));
        tracing::trace!(live_data = %self.name(), event_id = event.id(), "posting event");
        self.inner.post(event)
    }

    /// Fire an event, waiting for queue capacity.
    pub async fn send_event(&self, payload: T) -> Result<()> {
        let event = Arc::new(Event::new(payload));
        tracing::trace!(live_data = %self.name(), event_id = event.id(), "sending event");
        self.inner.send(event).await
    }

    pub fn as_live_data(&self) -> EventLiveData<T> {
        self.inner.as_live_data()
    }

    /// Stop the container. See [`MutableLiveData::close`].
    pub async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}

impl MutableEventLiveData<()> {
    /// Fire a payload-less signal.
    ///
    /// Each call produces a new event, so each call is delivered once more to
    /// every observer key.
    pub fn fire(&self) -> Result<()> {
        self.post_event(())
    }
}

// Deref stops at the read-only view: publishing goes through `post_event`,
// which always wraps a fresh `Event`.
impl<T> Deref for MutableEventLiveData<T> {
    type Target = EventLiveData<T>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> fmt::Debug for MutableEventLiveData<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MutableEventLiveData").field(&**self).finish()
    }
}

impl<T: Send + Sync + 'static> LiveData<Arc<Event<T>>> {
    /// Attach an [`EventObserver`] with the given key and callback.
    ///
    /// Observers sharing a key share delivery state: see [`EventObserver`].
    pub async fn observe_event<K, F>(
        &self,
        key: K,
        callback: F,
    ) -> Result<ObserverHandle<Arc<Event<T>>>>
    where
        K: Into<Arc<str>>,
        F: FnMut(&T) + Send + 'static,
    {
        self.observe(EventObserver::new(key, callback)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl FnMut(&()) + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (count, move |_: &()| {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test]
    async fn test_fire_delivers_once_per_call() {
        let signal = SimpleEventLiveData::new().unwrap();
        let (count, callback) = counter();
        let _handle = signal.observe_event("logout", callback).await.unwrap();

        signal.fire().unwrap();
        signal.flush().await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        signal.fire().unwrap();
        signal.flush().await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_same_event_instance_for_every_observer() {
        let data = MutableEventLiveData::<u32>::new().unwrap();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut handles = Vec::new();
        for _ in 0..2 {
            let seen = seen.clone();
            handles.push(
                data.observe_fn(move |e: &Arc<Event<u32>>| seen.lock().unwrap().push(e.clone()))
                    .await
                    .unwrap(),
            );
        }

        data.post_event(8).unwrap();
        data.flush().await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(Arc::ptr_eq(&seen[0], &seen[1]));
        assert_eq!(*seen[0].payload(), 8);
    }

    #[tokio::test]
    async fn test_read_only_view_observes_events() {
        let data = MutableEventLiveData::<&'static str>::new().unwrap();
        let view: EventLiveData<&'static str> = data.as_live_data();
        let got = Arc::new(std::sync::Mutex::new(None));
        let sink = got.clone();
        let _handle = view
            .observe_event("reader", move |v: &&'static str| *sink.lock().unwrap() = Some(*v))
            .await
            .unwrap();

        data.send_event("z").await.unwrap();
        view.flush().await.unwrap();
        assert_eq!(*got.lock().unwrap(), Some("z"));
    }

    #[tokio::test]
    async fn test_close_stops_event_publishing() {
        let signal = SimpleEventLiveData::new().unwrap();
        let (count, callback) = counter();
        let handle = signal.observe_event("logout", callback).await.unwrap();
        signal.fire().unwrap();

        signal.close().await.unwrap();
        assert!(signal.is_closed());
        assert!(handle.is_detached());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(matches!(signal.fire(), Err(Error::Closed)));
        assert!(matches!(signal.send_event(()).await, Err(Error::Closed)));
    }
}
