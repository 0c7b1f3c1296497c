use std::time::Duration;

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use shared::protocol::RegisterPlugin;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info};
use url::Url;

use crate::{outbound::OutboundSender, plugin::Plugin};

const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Work queued from outside the session (timers, other tasks). It runs on the
/// session task between host messages, with the live [`Plugin`].
pub type PluginCommand = Box<dyn FnOnce(&mut Plugin) + Send>;

/// Where and how to reach the host, as handed to the plugin at launch.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub plugin_uuid: String,
    pub register_event: String,
    pub log_raw_messages: bool,
}

impl ConnectionParams {
    pub fn websocket_url(&self) -> Result<Url> {
        let raw = format!("ws://{}:{}", self.host, self.port);
        Url::parse(&raw).with_context(|| format!("invalid host websocket url: {raw}"))
    }
}

/// Connects, registers, and routes host messages until the connection closes.
///
/// `build` is called once the socket is up; the returned [`Plugin`] (and with
/// it every live action) is dropped when the connection ends.
pub async fn run(
    params: &ConnectionParams,
    build: impl FnOnce(OutboundSender) -> Plugin,
) -> Result<()> {
    let (_commands, commands_rx) = mpsc::unbounded_channel();
    run_with_commands(params, build, commands_rx).await
}

/// Like [`run`], also applying each [`PluginCommand`] received on `commands`.
pub async fn run_with_commands(
    params: &ConnectionParams,
    build: impl FnOnce(OutboundSender) -> Plugin,
    mut commands: mpsc::UnboundedReceiver<PluginCommand>,
) -> Result<()> {
    let url = params.websocket_url()?;
    let (ws_stream, _) = connect_async(url.as_str())
        .await
        .with_context(|| format!("failed to connect websocket: {url}"))?;
    let (mut ws_writer, mut ws_reader) = ws_stream.split();
    info!(%url, "connected to host");

    let register = serde_json::to_string(&RegisterPlugin {
        event: params.register_event.clone(),
        uuid: params.plugin_uuid.clone(),
    })?;
    ws_writer
        .send(Message::Text(register))
        .await
        .context("failed to send plugin registration")?;

    let (outbound, mut outbound_rx) = OutboundSender::channel();
    let log_raw = params.log_raw_messages;
    let mut writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(err) => {
                    error!(%err, event = %message.event, "failed to encode outbound command");
                    continue;
                }
            };
            if log_raw {
                debug!(message = %text, "outbound");
            }
            if let Err(err) = ws_writer.send(Message::Text(text)).await {
                error!(%err, "websocket send failed");
                break;
            }
        }
        let _ = ws_writer.close().await;
    });

    let mut plugin = build(outbound);
    let mut commands_open = true;
    loop {
        tokio::select! {
            command = commands.recv(), if commands_open => match command {
                Some(command) => command(&mut plugin),
                None => commands_open = false,
            },
            msg = ws_reader.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if params.log_raw_messages {
                        debug!(message = %text, "inbound");
                    }
                    plugin.handle_text(&text);
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    error!(%err, "websocket receive failed");
                    break;
                }
            },
        }
    }
    info!(actions = plugin.action_count(), "host connection closed");

    plugin.disconnect();
    drop(plugin);
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer_task)
        .await
        .is_err()
    {
        writer_task.abort();
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
