pub mod channel;
pub mod dispatcher;
pub mod pushbullet;
pub mod pushover;
pub mod registry;
pub mod slack;

pub use channel::NotificationChannel;
pub use dispatcher::NotificationDispatcher;
pub use pushbullet::PushbulletChannel;
pub use pushover::PushoverChannel;
pub use registry::ChannelRegistry;
pub use slack::SlackChannel;
