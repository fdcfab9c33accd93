//! liveevent - one-shot events over an observable value
//!
//! An observable single-value container replays its latest value to every
//! observer that attaches later. That is what state wants, but not what
//! events want: a "show this error" or "navigate away" event must not fire
//! again just because a view re-subscribed.
//!
//! This crate wraps each emission in an [`Event`] that remembers which
//! subscriber keys already consumed it, and offers an [`EventObserver`] that
//! checks that record before calling back. The container itself,
//! [`MutableLiveData`], runs its observers on a dedicated Tokio task.
//!
//! See `demos/logout_signal.rs`.

mod config;
mod error;
mod event;
mod event_live_data;
mod live_data;
mod observer;
mod observer_handle;

mod internal;

pub use config::Config;
pub use error::Error;
pub use event::Event;
pub use event_live_data::{EventLiveData, MutableEventLiveData, SimpleEventLiveData};
pub use live_data::{LiveData, MutableLiveData};
pub use observer::{EventObserver, FnObserver, Observer};
pub use observer_handle::ObserverHandle;

pub type Result<T = ()> = std::result::Result<T, Error>;
pub type EventId = u128;
pub type ObserverId = u64;
