use std::sync::Arc;

/// Configuration of a single live data container.
///
/// Use the builder methods to customize, or [`Default`] for sensible defaults.
///
/// # Examples
///
/// ```rust
/// use liveevent::Config;
///
/// let config = Config::default()
///     .with_channel_size(16)       // Small queue, producers feel backpressure early
///     .with_name("session-events");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Capacity of the command queue feeding the dispatcher.
    /// Published values, attachments and flushes share this queue.
    /// Default: 128
    pub channel_size: usize,

    /// Label attached to every log record emitted by the container.
    /// Default: `"live-data"`
    pub name: Arc<str>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            channel_size: 128,
            name: Arc::from("live-data"),
        }
    }
}

impl Config {
    /// Set the command queue capacity.
    ///
    /// When the queue is full, [`post`](crate::MutableLiveData::post) fails with
    /// [`Error::ChannelIsFull`](crate::Error::ChannelIsFull) and
    /// [`send`](crate::MutableLiveData::send) waits for capacity.
    pub fn with_channel_size(mut self, size: usize) -> Self {
        self.channel_size = size;
        self
    }

    /// Set the label used in log records.
    pub fn with_name<N: Into<Arc<str>>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }
}
