pub mod cli;
pub mod messages;
pub mod network;

// Re-export key types for easy testing
pub use messages::{Message, WireConfig, WireProtocolError};
pub use network::{
    Client, ClientBuilder, ClientConfig, ClientError, Connection, Handler, Sender, Shutdown,
    StreamConnection, TcpConnection,
};
