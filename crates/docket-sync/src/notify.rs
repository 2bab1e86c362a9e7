//! User-visible notifications.
//!
//! The sync layer reports outcomes the user should see (a failed save, a
//! failed load, a successful create) through a [`Notifier`]. How they are
//! shown is up to the consumer.

use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
  Success,
  Info,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub level:   Level,
  pub message: String,
}

impl Notice {
  pub fn success(message: impl Into<String>) -> Self {
    Self { level: Level::Success, message: message.into() }
  }

  pub fn info(message: impl Into<String>) -> Self {
    Self { level: Level::Info, message: message.into() }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self { level: Level::Error, message: message.into() }
  }
}

pub trait Notifier: Send + Sync {
  fn notify(&self, notice: Notice);
}

/// Writes notices to the log. The default when no UI is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
  fn notify(&self, notice: Notice) {
    match notice.level {
      Level::Success | Level::Info => tracing::info!(target: "docket::notice", "{}", notice.message),
      Level::Error => tracing::error!(target: "docket::notice", "{}", notice.message),
    }
  }
}

/// Forwards notices over a channel, e.g. to a UI task.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
  pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }
}

impl Notifier for ChannelNotifier {
  fn notify(&self, notice: Notice) {
    // A closed receiver means nobody is listening any more.
    let _ = self.tx.send(notice);
  }
}
