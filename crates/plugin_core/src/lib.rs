pub mod action;
pub mod catalog;
pub mod device;
pub mod error;
pub mod image;
pub mod observer;
mod outbound;
mod payload;
pub mod plugin;
pub mod registry;
pub mod router;
pub mod transport;

pub use action::ActionInstance;
pub use catalog::ActionCatalog;
pub use error::CoreError;
pub use image::Image;
pub use observer::{ActionObserver, ChannelObserver, Notification, NotificationKind, PluginObserver};
pub use outbound::OutboundSender;
pub use plugin::Plugin;
pub use router::{EventRouter, RouteOutcome};
pub use transport::{run, run_with_commands, ConnectionParams, PluginCommand};
