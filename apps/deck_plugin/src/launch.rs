use clap::Parser;
use shared::protocol::RegistrationInfo;
use tracing::warn;

/// Flags the host passes with a single dash (`-port 28196`).
const HOST_FLAGS: &[&str] = &["-port", "-pluginUUID", "-registerEvent", "-info"];

#[derive(Parser, Debug)]
#[command(name = "deck_plugin", about = "Control-surface plugin process")]
pub struct LaunchArgs {
    #[arg(long)]
    pub port: u16,
    #[arg(long = "pluginUUID")]
    pub plugin_uuid: String,
    #[arg(long = "registerEvent")]
    pub register_event: String,
    /// Registration info JSON (application, plugin and device list).
    #[arg(long, default_value = "{}")]
    pub info: String,
}

impl LaunchArgs {
    pub fn from_env() -> Self {
        Self::parse_from(normalize_args(std::env::args()))
    }

    pub fn registration_info(&self) -> RegistrationInfo {
        match RegistrationInfo::parse(&self.info) {
            Ok(info) => info,
            Err(err) => {
                warn!(%err, "ignoring malformed -info argument");
                RegistrationInfo::default()
            }
        }
    }
}

/// Rewrites the host's single-dash flags into the `--flag` form clap expects.
pub fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .map(|arg| {
            if HOST_FLAGS.contains(&arg.as_str()) {
                format!("-{arg}")
            } else {
                arg
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/launch_tests.rs"]
mod tests;
