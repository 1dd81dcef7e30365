use inkroom_shared::{ClientMessage, ServerMessage};
use tracing::warn;

pub fn encode_client_message(message: &ClientMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(payload) => Some(payload),
        Err(error) => {
            warn!(%error, "failed to encode client message");
            None
        }
    }
}

/// Parses one inbound text frame. A frame the client cannot understand is
/// logged and dropped; it must never break the event stream.
pub fn decode_server_message(text: &str) -> Option<ServerMessage> {
    match serde_json::from_str::<ServerMessage>(text) {
        Ok(message) => Some(message),
        Err(error) => {
            let snippet = if text.len() <= 200 {
                text.to_string()
            } else {
                // Byte 200 may land inside a multibyte character.
                let mut cut = 200;
                while !text.is_char_boundary(cut) {
                    cut -= 1;
                }
                format!("{}...", &text[..cut])
            };
            warn!(%error, payload = %snippet, "dropping unparseable server message");
            None
        }
    }
}
