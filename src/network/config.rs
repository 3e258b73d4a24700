use crate::network::errors::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Reference pacing for a typical IRC network
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;
pub const DEFAULT_FLOOD_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(60);
/// Largest accepted outbound queue; tokio's channel panics near `usize::MAX`.
pub const MAX_QUEUE_CAPACITY: usize = 65_536;

/// Tuning for the client's outbound queue, flood control and keepalive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Maximum number of queued outbound messages before senders wait
    pub queue_capacity: usize,
    /// Pause after every transmitted message
    #[serde(rename = "flood_interval_ms", with = "millis")]
    pub flood_interval: Duration,
    /// Time between keepalive pings
    #[serde(rename = "ping_interval_ms", with = "millis")]
    pub ping_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            flood_interval: DEFAULT_FLOOD_INTERVAL,
            ping_interval: DEFAULT_PING_INTERVAL,
        }
    }
}

impl ClientConfig {
    pub fn with_flood_interval(mut self, flood_interval: Duration) -> Self {
        self.flood_interval = flood_interval;
        self
    }

    pub fn with_ping_interval(mut self, ping_interval: Duration) -> Self {
        self.ping_interval = ping_interval;
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(ClientError::InvalidConfig(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(ClientError::InvalidConfig(format!(
                "queue_capacity must be at most {}",
                MAX_QUEUE_CAPACITY
            )));
        }
        if self.ping_interval.is_zero() {
            return Err(ClientError::InvalidConfig(
                "ping_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

mod millis {
    use serde::ser::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis())
            .map_err(|_| S::Error::custom(format!("{:?} does not fit in u64 milliseconds", duration)))?;
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
