mod sender;

pub use sender::{NotificationKind, NotificationMessage, NotificationSender};
