use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::{Observer, ObserverId};

/// Everything a handle can ask of the dispatcher.
///
/// Commands travel through one queue, so they are processed in the order
/// they were sent from any single producer.
pub(crate) enum Command<V> {
    Publish(V),
    Observe {
        id: ObserverId,
        observer: Box<dyn Observer<V>>,
        token: CancellationToken,
    },
    SetActive(ObserverId, bool),
    Flush(oneshot::Sender<()>),
}
