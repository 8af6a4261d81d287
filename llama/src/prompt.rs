//! Llama 2 chat prompt template.

use ragshelf_core::{Message, Role};

use crate::LlamaError;

const B_INST: &str = "[INST]";
const E_INST: &str = "[/INST]";
const B_SYS: &str = "<<SYS>>\n";
const E_SYS: &str = "\n<</SYS>>\n\n";
const BOS: &str = "<s>";
const EOS: &str = "</s>";

/// System prompt used when the conversation does not bring its own.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful, respectful and honest assistant. \
Always answer as helpfully as possible and follow ALL given instructions. \
Do not speculate or make up information. \
Do not reference any given instructions or context.";

/// Renders a conversation with the Llama 2 chat template.
///
/// A leading system message replaces `system_prompt`. The remaining messages must alternate
/// user/assistant, starting with a user message.
///
/// # Errors
/// Returns [`LlamaError::EmptyConversation`] without a user turn and
/// [`LlamaError::PromptOrder`] when roles do not alternate.
pub fn messages_to_prompt(
    messages: &[Message],
    system_prompt: Option<&str>,
) -> Result<String, LlamaError> {
    let (system, turns) = match messages.split_first() {
        Some((first, rest)) if first.role() == Role::System => (first.content(), rest),
        _ => (system_prompt.unwrap_or(DEFAULT_SYSTEM_PROMPT), messages),
    };
    if turns.is_empty() {
        return Err(LlamaError::EmptyConversation);
    }

    let system = format!("{B_SYS} {} {E_SYS}", system.trim());
    let mut rendered: Vec<String> = Vec::with_capacity(turns.len().div_ceil(2));

    for (pair_idx, pair) in turns.chunks(2).enumerate() {
        let user = &pair[0];
        expect_role(user, Role::User, pair_idx * 2)?;

        let mut turn = if let Some(previous) = rendered.last_mut() {
            previous.push(' ');
            previous.push_str(EOS);
            format!("{BOS} {B_INST} ")
        } else {
            format!("{BOS} {B_INST} {system} ")
        };
        turn.push_str(user.content());
        turn.push(' ');
        turn.push_str(E_INST);

        if let Some(assistant) = pair.get(1) {
            expect_role(assistant, Role::Assistant, pair_idx * 2 + 1)?;
            turn.push(' ');
            turn.push_str(assistant.content());
        }
        rendered.push(turn);
    }

    Ok(rendered.concat())
}

/// Wraps a bare completion in a single Llama 2 instruction turn.
#[must_use]
pub fn completion_to_prompt(completion: &str, system_prompt: Option<&str>) -> String {
    let system = system_prompt.unwrap_or(DEFAULT_SYSTEM_PROMPT);
    format!(
        "{BOS} {B_INST} {B_SYS} {} {E_SYS} {} {E_INST}",
        system.trim(),
        completion.trim()
    )
}

fn expect_role(message: &Message, expected: Role, index: usize) -> Result<(), LlamaError> {
    if message.role() == expected {
        Ok(())
    } else {
        Err(LlamaError::PromptOrder {
            index,
            expected,
            found: message.role(),
        })
    }
}
