use thiserror::Error;

/// Boxed driver / transport error kept as the `source` of a wrapping error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An operation stopped before completing because its context gave up on it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Errors returned by a [`crate::Messenger`].
#[derive(Error, Debug)]
pub enum MessengerError {
    /// The platform did not accept a send or forward.
    #[error("Delivery failed: {context}")]
    DeliveryFailed {
        context: String,
        #[source]
        source: BoxError,
    },

    /// Membership lookup failed for a reason other than "user is not in the chat".
    #[error("Membership lookup failed: {context}")]
    LookupFailed {
        context: String,
        #[source]
        source: BoxError,
    },

    #[error("Messenger setup failed: {0}")]
    Setup(String),

    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

impl MessengerError {
    pub fn delivery(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::DeliveryFailed {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn lookup(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::LookupFailed {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Delivery and lookup failures may succeed on a later attempt; the caller owns the retry policy.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DeliveryFailed { .. } | Self::LookupFailed { .. } | Self::Interrupted(Interrupted::DeadlineExceeded)
        )
    }
}

/// Error returned by an [`crate::EventHandler`] while fulfilling one event.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Store error: {0}")]
    Store(#[source] BoxError),

    #[error("Messenger error: {0}")]
    Messenger(#[from] MessengerError),

    #[error("Handler error: {0}")]
    Handler(String),

    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_failed_keeps_source() {
        let err = MessengerError::delivery("send text to chat 42", "Forbidden: bot was blocked by the user");
        assert_eq!(err.to_string(), "Delivery failed: send text to chat 42");
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("Forbidden: bot was blocked by the user"));
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(MessengerError::lookup("x", "timeout").is_retryable());
        assert!(MessengerError::Interrupted(Interrupted::DeadlineExceeded).is_retryable());
        assert!(!MessengerError::Interrupted(Interrupted::Cancelled).is_retryable());
        assert!(!MessengerError::Setup("bad token".into()).is_retryable());
    }
}
