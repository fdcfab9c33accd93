use std::{fmt, ops::Deref, sync::Arc};

use tokio::{
    runtime::Handle,
    sync::{
        mpsc::{Sender, channel},
        oneshot,
    },
};
use tokio_util::sync::CancellationToken;

use crate::{
    Config, Error, FnObserver, Observer, ObserverHandle, Result,
    internal::{Command, Dispatcher, Shared},
};

/// Read-only view of an observable single-value container.
///
/// Consumers holding a `LiveData` can attach observers and read the latest
/// value, but cannot publish. Obtain one from
/// [`MutableLiveData::as_live_data`]; both refer to the same container.
///
/// Semantics:
/// - Holds at most one value: the latest one published.
/// - Every attached, active observer is notified of each new value, in
///   publication order, from the container's dispatcher task.
/// - An observer attached after a value was published receives that latest
///   value right away (replay to late subscribers).
pub struct LiveData<V> {
    pub(crate) shared: Arc<Shared<V>>,
    pub(crate) sender: Sender<Command<V>>,
}

impl<V> Clone for LiveData<V> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            sender: self.sender.clone(),
        }
    }
}

impl<V: Clone + Send + 'static> LiveData<V> {
    /// Attach an observer.
    ///
    /// The observer is registered in the dispatcher's queue order: values
    /// published before this call (from the same task) are replayed as the
    /// latest value, values published after it are delivered normally.
    pub async fn observe<O: Observer<V>>(&self, observer: O) -> Result<ObserverHandle<V>> {
        self.ensure_open()?;
        let id = self.shared.next_observer_id();
        let token = CancellationToken::new();
        self.sender
            .send(Command::Observe {
                id,
                observer: Box::new(observer),
                token: token.clone(),
            })
            .await?;
        Ok(ObserverHandle::new(id, self.sender.clone(), token))
    }

    /// Attach a closure as an observer.
    pub async fn observe_fn<F>(&self, f: F) -> Result<ObserverHandle<V>>
    where
        F: FnMut(&V) + Send + 'static,
    {
        self.observe(FnObserver::new(f)).await
    }

    /// The latest value already handed to observers, if any.
    ///
    /// Values still queued for dispatch are not visible here; call
    /// [`flush`](Self::flush) first to wait for them.
    pub fn value(&self) -> Option<V> {
        self.shared.latest()
    }

    /// Number of values dispatched so far. Zero means no value was ever set.
    pub fn version(&self) -> u64 {
        self.shared.version()
    }

    /// Number of attached observers, as of the last processed command.
    pub fn observer_count(&self) -> usize {
        self.shared.observer_count()
    }

    pub fn has_observers(&self) -> bool {
        self.observer_count() > 0
    }

    pub fn is_closed(&self) -> bool {
        self.shared.cancel_token.is_cancelled()
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    /// Wait until every command queued before this call has been dispatched.
    pub async fn flush(&self) -> Result<()> {
        self.ensure_open()?;
        let (tx, rx) = oneshot::channel();
        self.sender.send(Command::Flush(tx)).await?;
        rx.await.map_err(|_| Error::Closed)
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        Ok(())
    }
}

impl<V> fmt::Debug for LiveData<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveData")
            .field("name", &self.shared.config.name)
            .field("version", &self.shared.version())
            .field("observers", &self.shared.observer_count())
            .finish()
    }
}

/// Observable single-value container that can be published to.
///
/// Creating one spawns its dispatcher task on the current Tokio runtime.
/// The dispatcher is the container's delivery context: publishing is allowed
/// from any thread or task, but observers are always called from the
/// dispatcher, one at a time.
///
/// `MutableLiveData` dereferences to [`LiveData`], so observing works the same
/// on both. Hand out [`as_live_data`](Self::as_live_data) to consumers that
/// should not publish.
///
/// # Examples
///
/// ```rust
/// use liveevent::{MutableLiveData, Result};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<()> {
/// let data = MutableLiveData::<u32>::new()?;
/// let _handle = data.observe_fn(|v| println!("value: {v}")).await?;
///
/// data.post(1)?;          // non-blocking, fails if the queue is full
/// data.send(2).await?;    // waits for queue capacity
/// data.flush().await?;
///
/// assert_eq!(data.value(), Some(2));
/// # Ok(())
/// # }
/// ```
pub struct MutableLiveData<V> {
    live_data: LiveData<V>,
}

impl<V> Clone for MutableLiveData<V> {
    fn clone(&self) -> Self {
        Self {
            live_data: self.live_data.clone(),
        }
    }
}

impl<V: Clone + Send + 'static> MutableLiveData<V> {
    /// Create a container with the default [`Config`].
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Create a container and start its dispatcher.
    ///
    /// Fails with [`Error::NoRuntime`] outside of a Tokio runtime.
    pub fn with_config(config: Config) -> Result<Self> {
        let runtime = Handle::try_current()?;
        let (tx, rx) = channel::<Command<V>>(config.channel_size.max(1));
        let shared = Arc::new(Shared::new(config));
        let mut dispatcher = Dispatcher::new(rx, shared.clone());
        let handle = runtime.spawn(async move { dispatcher.run().await });
        shared.set_dispatcher(handle);
        tracing::debug!(live_data = %shared.config.name, "dispatcher started");
        Ok(Self {
            live_data: LiveData { shared, sender: tx },
        })
    }

    /// Publish a value without waiting.
    ///
    /// Safe to call from any thread. Fails with [`Error::ChannelIsFull`] when
    /// the dispatcher queue is full and [`Error::Closed`] after
    /// [`close`](Self::close).
    pub fn post(&self, value: V) -> Result<()> {
        self.ensure_open()?;
        self.sender.try_send(Command::Publish(value))?;
        Ok(())
    }

    /// Publish a value, waiting for queue capacity (backpressure).
    pub async fn send(&self, value: V) -> Result<()> {
        self.ensure_open()?;
        self.sender.send(Command::Publish(value)).await?;
        Ok(())
    }

    /// Read-only view of this container.
    pub fn as_live_data(&self) -> LiveData<V> {
        self.live_data.clone()
    }

    /// Stop the container.
    ///
    /// Commands already queued are dispatched first. Afterwards every observer
    /// is detached and any publish or observe fails with [`Error::Closed`].
    /// Every caller, including concurrent callers on clones, returns only
    /// after shutdown has finished. Closing twice is a no-op.
    pub async fn close(&self) -> Result<()> {
        self.shared.cancel_token.cancel();
        if let Some(handle) = self.shared.take_dispatcher() {
            handle.await?;
        }
        self.shared.done.cancelled().await;
        Ok(())
    }
}

impl<V> Deref for MutableLiveData<V> {
    type Target = LiveData<V>;

    fn deref(&self) -> &Self::Target {
        &self.live_data
    }
}

impl<V> fmt::Debug for MutableLiveData<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MutableLiveData").field(&self.live_data).finish()
    }
}
