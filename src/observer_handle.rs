use std::fmt;

use tokio::sync::mpsc::Sender;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::{ObserverId, Result, internal::Command};

/// Attachment of one observer to a container.
///
/// The handle ties the observer's lifetime to the consumer: dropping it (or
/// calling [`remove`](Self::remove)) detaches the observer, and the
/// dispatcher never notifies it again. Keep the handle alive for as long as
/// the consumer wants updates.
///
/// An inactive observer ([`pause`](Self::pause)) stays attached but receives
/// nothing. On [`resume`](Self::resume) it is handed the latest value, but
/// only if that value was published after the last one it saw.
pub struct ObserverHandle<V> {
    id: ObserverId,
    sender: Sender<Command<V>>,
    token: CancellationToken,
    _guard: DropGuard,
}

impl<V> ObserverHandle<V> {
    pub(crate) fn new(
        id: ObserverId,
        sender: Sender<Command<V>>,
        token: CancellationToken,
    ) -> Self {
        Self {
            id,
            sender,
            _guard: token.clone().drop_guard(),
            token,
        }
    }

    #[inline]
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Returns true once the observer no longer receives values.
    ///
    /// That happens when the handle is removed, when the observer panicked,
    /// or when the container was closed.
    pub fn is_detached(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Stop delivering values to this observer until [`resume`](Self::resume).
    pub async fn pause(&self) -> Result<()> {
        self.sender.send(Command::SetActive(self.id, false)).await?;
        Ok(())
    }

    /// Start delivering values again.
    pub async fn resume(&self) -> Result<()> {
        self.sender.send(Command::SetActive(self.id, true)).await?;
        Ok(())
    }

    /// Detach the observer. Equivalent to dropping the handle.
    pub fn remove(self) {
        self.token.cancel();
    }
}

impl<V> fmt::Debug for ObserverHandle<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverHandle")
            .field("id", &self.id)
            .field("detached", &self.is_detached())
            .finish()
    }
}
