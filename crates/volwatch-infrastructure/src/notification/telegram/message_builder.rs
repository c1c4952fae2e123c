use serde_json::json;

use volwatch_domain::notification::NotificationMessage;
use volwatch_domain::shared::UserId;

/// MarkdownV2 reserved characters. `*` is left alone since message text
/// uses it for bold.
const RESERVED: &[char] = &[
    '_', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

pub(super) fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl super::TelegramBotSender {
    pub(super) fn build_payload(&self, uid: &UserId, message: &NotificationMessage) -> serde_json::Value {
        let chat_id = match uid.as_str().parse::<i64>() {
            Ok(id) => json!(id),
            Err(_) => json!(uid.as_str()),
        };

        json!({
            "chat_id": chat_id,
            "text": escape_markdown_v2(&message.text),
            "parse_mode": "MarkdownV2"
        })
    }
}
