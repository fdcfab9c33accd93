use std::sync::{
    Mutex, PoisonError,
    atomic::{AtomicU64, AtomicUsize, Ordering},
};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{Config, ObserverId};

/// State visible to every handle of one container.
///
/// Only the dispatcher writes `latest`, `version` and `observer_count`;
/// handles read them as snapshots.
pub(crate) struct Shared<V> {
    pub config: Config,
    pub cancel_token: CancellationToken,
    /// Cancelled once the dispatcher has drained its queue and detached everyone.
    pub done: CancellationToken,
    next_observer_id: AtomicU64,
    latest: Mutex<Option<V>>,
    version: AtomicU64,
    observer_count: AtomicUsize,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl<V> Shared<V> {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cancel_token: CancellationToken::new(),
            done: CancellationToken::new(),
            next_observer_id: AtomicU64::new(0),
            latest: Mutex::new(None),
            version: AtomicU64::new(0),
            observer_count: AtomicUsize::new(0),
            dispatcher: Mutex::new(None),
        }
    }

    pub fn next_observer_id(&self) -> ObserverId {
        self.next_observer_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn set_latest(&self, value: V, version: u64) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
        self.version.store(version, Ordering::Release);
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub fn observer_count(&self) -> usize {
        self.observer_count.load(Ordering::Acquire)
    }

    pub fn set_observer_count(&self, count: usize) {
        self.observer_count.store(count, Ordering::Release);
    }

    pub fn set_dispatcher(&self, handle: JoinHandle<()>) {
        *self.dispatcher.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    pub fn take_dispatcher(&self) -> Option<JoinHandle<()>> {
        self.dispatcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl<V: Clone> Shared<V> {
    pub fn latest(&self) -> Option<V> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
