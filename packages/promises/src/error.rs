use thiserror::Error;

/// Errors that can surface from a producer or consumer handle.
///
/// Two kinds of failure travel through this type. Misuse of the handles
/// themselves ([`NoState`](Error::NoState), [`BrokenPromise`](Error::BrokenPromise))
/// is reported synchronously by the offending call. Outcome errors supplied by
/// the producer or raised inside a continuation are carried in
/// [`Other`](Error::Other) and delivered untranslated to whoever eventually
/// claims the outcome.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The handle no longer carries shared state.
    ///
    /// Returned when an outcome is claimed twice, when a continuation is
    /// attached to a consumed handle, or when a producer is asked to publish
    /// or hand out its consumer a second time.
    #[error("operation attempted on a handle that no longer carries shared state")]
    NoState,

    /// The producer handle was dropped before publishing an outcome.
    #[error("producer handle dropped before publishing an outcome")]
    BrokenPromise,

    /// An error supplied via `set_error` or raised inside a continuation.
    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps an arbitrary error value as an outcome error.
    ///
    /// Accepts anything convertible into a boxed error, including plain
    /// message strings.
    ///
    /// # Example
    ///
    /// ```rust
    /// use promises::Error;
    ///
    /// let error = Error::other("device unreachable");
    /// assert_eq!(error.to_string(), "device unreachable");
    /// ```
    pub fn other(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Other(error.into())
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn other_preserves_message() {
        let error = Error::other("test");
        assert_eq!(error.to_string(), "test");
    }

    #[test]
    fn misuse_kinds_are_distinct() {
        assert!(matches!(Error::NoState, Error::NoState));
        assert!(matches!(Error::BrokenPromise, Error::BrokenPromise));
        assert_ne!(Error::NoState.to_string(), Error::BrokenPromise.to_string());
    }
}
