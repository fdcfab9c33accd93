use tokio::sync::mpsc::error::{SendError, TrySendError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("The command channel has reached its capacity.")]
    ChannelIsFull,

    #[error("The live data has been closed.")]
    Closed,

    #[error("Live data requires a Tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    #[error("Dispatcher task join error: {0}")]
    DispatcherJoinError(#[from] tokio::task::JoinError),
}

impl<T> From<SendError<T>> for Error {
    fn from(_: SendError<T>) -> Self {
        Error::Closed
    }
}

impl<T> From<TrySendError<T>> for Error {
    fn from(e: TrySendError<T>) -> Self {
        match e {
            TrySendError::Full(_) => Error::ChannelIsFull,
            TrySendError::Closed(_) => Error::Closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_send_error_mapping() {
        let full: Error = TrySendError::Full(1u8).into();
        assert!(matches!(full, Error::ChannelIsFull));

        let closed: Error = TrySendError::Closed(1u8).into();
        assert!(matches!(closed, Error::Closed));
    }

    #[test]
    fn test_send_error_mapping() {
        let err: Error = SendError("value").into();
        assert!(matches!(err, Error::Closed));
        assert_eq!(err.to_string(), "The live data has been closed.");
    }
}
