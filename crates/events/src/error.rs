/// Error returned by a single listener.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// The listener was invoked again while it was still running.
    #[error("listener re-entered while already running")]
    Reentrant,
    /// The bound context was already borrowed when the listener fired.
    #[error("listener context is busy")]
    ContextBusy,
    /// The handler itself failed.
    #[error("handler failed: {0}")]
    Handler(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ListenerError {
    pub fn handler<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Handler(Box::new(err))
    }
}

/// Error returned by [`EventBus::emit`](crate::EventBus::emit) under the
/// fail-fast policy.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("listener #{subscription} for `{event}` failed")]
    Listener {
        event: String,
        subscription: u64,
        #[source]
        source: ListenerError,
    },
}
