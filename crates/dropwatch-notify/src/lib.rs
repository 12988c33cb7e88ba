pub mod error;
pub mod format;
pub mod notifier;
pub(crate) mod retry;
pub mod x_client;

pub use error::NotifyError;
pub use format::{MessageFormatter, DEFAULT_MAX_CHARS};
pub use notifier::{ConfiguredNotifier, LogNotifier, MessageId, Notifier};
pub use x_client::XClient;
