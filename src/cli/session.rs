use crate::cli::app::Config;
use crate::messages::{command, Message, WireConfig};
use crate::network::{ClientBuilder, Handler, Sender, TcpConnection};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Messages to send in response to an inbound message.
///
/// Answers server PINGs and joins the configured channels once the welcome
/// numeric arrives.
pub fn replies_for(message: &Message, channels: &[String]) -> Vec<Message> {
    if message.is_command(command::PING) {
        let token = message.last_param().unwrap_or_default();
        return vec![Message::pong(token)];
    }
    if message.is_command(command::RPL_WELCOME) {
        return channels.iter().map(Message::join).collect();
    }
    Vec::new()
}

/// Handler used by `tether connect`: logs traffic and sends [`replies_for`]
pub fn session_handler(channels: Vec<String>) -> impl Handler {
    let channels: Arc<[String]> = channels.into();
    move |message: Message, sender: Sender| {
        let channels = Arc::clone(&channels);
        async move {
            info!(target: "tether::inbound", "{}", message);
            for reply in replies_for(&message, &channels) {
                if let Err(e) = sender.send(reply).await {
                    warn!(error = %e, "Dropping reply");
                    break;
                }
            }
        }
    }
}

/// Connect, identify, and run until the server closes the connection or
/// the user presses Ctrl-C.
pub async fn run(config: Config) -> Result<()> {
    info!(server = %config.server, nick = %config.nickname, "Connecting");

    let connection = TcpConnection::connect(&config.server, &WireConfig::default())
        .await
        .with_context(|| format!("Failed to connect to {}", config.server))?;

    let client = ClientBuilder::new()
        .connection(connection)
        .handler(session_handler(config.channels.clone()))
        .config(config.client.clone())
        .build()
        .context("Failed to start client")?;

    client
        .identify(&config.nickname, &config.username, &config.realname)
        .await
        .context("Failed to queue identification")?;

    tokio::select! {
        _ = client.wait() => {
            info!("Connection closed");
        }
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
            info!("Interrupted, disconnecting");
            client.disconnect();
            client.wait().await;
        }
    }

    Ok(())
}
