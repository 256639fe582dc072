use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("failed to publish event: {0}")]
    PublishFailed(String),
    #[error("no active subscribers")]
    NoSubscribers,
    #[error("receiver lagged by {0} events")]
    ReceiverLagged(u64),
    #[error("event bus is shut down")]
    Shutdown,
    #[error("channel is at capacity")]
    ChannelFull,
    #[error("drain timed out with {pending_operations} operations pending")]
    DrainTimeout { pending_operations: usize },
    #[error("publish timed out")]
    PublishTimeout,
}
