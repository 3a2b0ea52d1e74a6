//! Chat prompt assembly.
//!
//! Sections appear in a fixed order: date/time header, guidelines,
//! conversation history, knowledge excerpts, then the new message.

use chrono::{DateTime, Local};

use crate::history::{Message, Role};

pub(crate) const CHAT_PROMPT_HEADER: &str =
    "You are a helpful personal assistant with access to the user's knowledge base.";

const GUIDELINES: &str = "Guidelines:\n\
- Answer from the knowledge base excerpts when they are relevant, and cite them by source number.\n\
- If the excerpts do not cover the question, say so, then offer general knowledge if it helps.\n\
- Use the current date and time to interpret time-sensitive questions.\n\
- Be conversational and concise.";

pub fn build_chat_prompt(
    message: &str,
    context: &[String],
    history: &[Message],
    now: DateTime<Local>,
) -> String {
    let mut parts = Vec::with_capacity(8);

    parts.push(format!(
        "Current date and time: {} ({})\nDay of week: {}",
        now.format("%A, %B %d, %Y at %I:%M %p"),
        now.format("%Y-%m-%d %H:%M:%S"),
        now.format("%A"),
    ));
    parts.push(format!("{CHAT_PROMPT_HEADER}\n\n{GUIDELINES}"));

    if !history.is_empty() {
        let mut section = String::from("--- Conversation history ---\n");
        for msg in history {
            let speaker = match msg.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            section.push_str(&format!("{speaker}: {}\n", msg.content));
        }
        section.push_str("--- End of history ---");
        parts.push(section);
    }

    if !context.is_empty() {
        let mut section = String::from("--- Knowledge base excerpts ---\n");
        for (i, chunk) in context.iter().enumerate() {
            section.push_str(&format!("[Source {}]: {chunk}\n", i + 1));
        }
        section.push_str("--- End of excerpts ---");
        parts.push(section);
    }

    parts.push(format!("User: {message}\n\nAssistant:"));
    parts.join("\n\n")
}
