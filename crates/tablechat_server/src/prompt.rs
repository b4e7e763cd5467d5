//! Flattening chat messages into a single prompt.

use tablechat_core::{ChatMessage, Role};

/// Tool-selection instructions placed in the system section of every chat prompt.
pub const TOOL_CALL_INSTRUCTION: &str = include_str!("../prompts/tool_call_v1.txt");

const SYSTEM_DELIMITER: &str = "<|system|>";
const USER_DELIMITER: &str = "<|user|>";
const ASSISTANT_DELIMITER: &str = "<|assistant|>";

/// Render `messages` into a role-delimited prompt ending in an open assistant turn.
///
/// The instruction text opens the system section. Caller system messages
/// are appended to that section without a delimiter of their own, user and
/// assistant messages each get theirs. Pure and order-preserving.
///
/// # Examples
///
/// ```
/// use tablechat_core::ChatMessage;
/// use tablechat_server::render_chat_prompt;
///
/// let prompt = render_chat_prompt(&[ChatMessage::user("hi")]);
/// assert!(prompt.starts_with("<|system|>\n"));
/// assert!(prompt.ends_with("<|user|>\nhi\n<|assistant|>\n"));
/// ```
pub fn render_chat_prompt(messages: &[ChatMessage]) -> String {
    let mut prompt = format!("{}\n{}\n", SYSTEM_DELIMITER, TOOL_CALL_INSTRUCTION.trim());

    for message in messages {
        match message.role {
            Role::System => prompt.push_str(&format!("\n{}\n", message.content)),
            Role::User => prompt.push_str(&format!("{}\n{}\n", USER_DELIMITER, message.content)),
            Role::Assistant => {
                prompt.push_str(&format!("{}\n{}\n", ASSISTANT_DELIMITER, message.content))
            }
        }
    }

    prompt.push_str(ASSISTANT_DELIMITER);
    prompt.push('\n');
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> String {
        format!("<|system|>\n{}\n", TOOL_CALL_INSTRUCTION.trim())
    }

    #[test]
    fn test_empty_conversation() {
        assert_eq!(render_chat_prompt(&[]), format!("{}<|assistant|>\n", header()));
    }

    #[test]
    fn test_roles_render_in_order() {
        let prompt = render_chat_prompt(&[
            ChatMessage::system("rules"),
            ChatMessage::user("q1"),
            ChatMessage::assistant("a1"),
            ChatMessage::user("q2"),
        ]);
        assert_eq!(
            prompt,
            format!(
                "{}\nrules\n<|user|>\nq1\n<|assistant|>\na1\n<|user|>\nq2\n<|assistant|>\n",
                header()
            )
        );
    }

    #[test]
    fn test_instruction_covers_both_tools() {
        assert!(TOOL_CALL_INSTRUCTION.contains("countTableEntities"));
        assert!(TOOL_CALL_INSTRUCTION.contains("queryTableEntities"));
        assert!(TOOL_CALL_INSTRUCTION.contains("\"none\""));
        assert_eq!(TOOL_CALL_INSTRUCTION.matches("Assistant JSON:").count(), 5);
    }
}
