//! Crate error type.
//!
//! Layout and dispatch never fail; errors only come from configuration
//! loading and the async result queue.

use std::sync::mpsc;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("async queue full")]
    QueueFull,

    #[error("async queue closed")]
    QueueClosed,
}

impl<T> From<mpsc::TrySendError<T>> for Error {
    fn from(e: mpsc::TrySendError<T>) -> Self {
        match e {
            mpsc::TrySendError::Full(_) => Self::QueueFull,
            mpsc::TrySendError::Disconnected(_) => Self::QueueClosed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_send_mapping() {
        let (tx, rx) = mpsc::sync_channel::<u8>(1);
        tx.try_send(1).unwrap();
        let err: Error = tx.try_send(2).unwrap_err().into();
        assert!(matches!(err, Error::QueueFull));

        drop(rx);
        let err: Error = tx.try_send(3).unwrap_err().into();
        assert!(matches!(err, Error::QueueClosed));
    }
}
