pub mod client;
pub mod config;
pub mod connection;
pub mod errors;
pub mod handler;
mod join;
pub mod shutdown;

pub use client::{Client, ClientBuilder};
pub use config::{
    ClientConfig, DEFAULT_FLOOD_INTERVAL, DEFAULT_PING_INTERVAL, DEFAULT_QUEUE_CAPACITY,
    MAX_QUEUE_CAPACITY,
};
pub use connection::{Connection, StreamConnection, TcpConnection};
pub use errors::ClientError;
pub use handler::{Handler, Sender};
pub use shutdown::Shutdown;
