//! Notification providers

pub mod channel;
pub mod replay;

pub use channel::{ChannelProvider, NotificationSender};
pub use replay::ReplayProvider;
