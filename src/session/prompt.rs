//! Request assembly for a relayed prompt.

use crate::llm::ChatMessage;

/// Build the two-message request for one prompt: the persona as the system
/// instruction, then the user's text.
///
/// No earlier turns are included.
pub fn build_relay_messages(persona_instruction: &str, user_text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(persona_instruction),
        ChatMessage::user(user_text),
    ]
}
