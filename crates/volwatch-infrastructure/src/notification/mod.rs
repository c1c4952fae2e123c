mod log_sender;
mod sender_factory;
mod telegram;

pub use log_sender::LogNotificationSender;
pub use sender_factory::create_sender;
pub use telegram::TelegramBotSender;
