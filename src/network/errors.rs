use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Client requires a connection")]
    MissingConnection,

    #[error("Client requires a handler")]
    MissingHandler,

    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("Client has shut down; outbound queue is no longer drained")]
    Closed,
}

pub type Result<T> = std::result::Result<T, ClientError>;
