use anyhow::Result;
use plugin_core::{ActionCatalog, ConnectionParams, Plugin};
use tracing::info;

mod config;
mod counter;
mod launch;

use config::load_settings;
use counter::{CounterAction, COUNTER_ACTION};
use launch::LaunchArgs;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let settings = load_settings();
    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .with_writer(std::io::stderr)
        .init();

    let args = LaunchArgs::from_env();
    let info = args.registration_info();
    let params = ConnectionParams {
        host: settings.host.clone(),
        port: args.port,
        plugin_uuid: args.plugin_uuid.clone(),
        register_event: args.register_event.clone(),
        log_raw_messages: settings.log_raw_messages,
    };
    info!(
        plugin_uuid = %params.plugin_uuid,
        port = params.port,
        version = %info.plugin.version,
        devices = info.devices.len(),
        "starting plugin"
    );

    let plugin_uuid = args.plugin_uuid;
    plugin_core::run(&params, move |outbound| {
        let catalog = ActionCatalog::new().with(COUNTER_ACTION, |_| CounterAction);
        Plugin::new(plugin_uuid, &info, catalog, outbound)
    })
    .await
}
