// src/services/refinement.rs
//! Prompt refinement: the fixed instruction, conversation assembly and the
//! `PromptRefiner` seam the router talks to.

use crate::models::chat::{ChatTurn, Role};
use async_trait::async_trait;
use thiserror::Error;

pub const SYSTEM_PROMPT: &str = r#"You are a Senior Prompt Engineer. Your goal is to transform "lazy" user inputs into world-class, high-density LLM prompts.

STRICT RULES:
1. NEVER answer the user's request.
2. Output ONLY the optimized prompt. No preamble, no "Here is your prompt:", no conversational filler.
3. Be strategic: Infer the best role, use professional constraints, and specify clear output requirements.
4. Avoid generic tutorial instructions (e.g., "Provide imports, CSS, etc."). Instead, focus on architectural requirements and technical excellence.
5. Do not use code blocks for your output unless the prompt itself requires one.

Structure the optimized prompt with these clear sections (or equivalent logical flow):
- PERSONA: A high-level professional identity.
- OBJECTIVE: A precise description of the goal.
- CONTEXT/CONSTRAINTS: Specific rules, technologies (infer if missing), and edge cases.
- FORMAT: The exact structure of the response.

Example input: "todo app react"
Example output: "As a Senior Frontend Architect, develop a high-performance, accessible Todo Application using React 19 and Tailwind CSS. The solution must implement state management via the Context API, support persistence with localStorage, and include a 'low-friction' task entry UX. Deliver the solution as a single-file component for easy prototyping, ensuring clean variable naming and strict adherence to modern React hooks patterns."
"#;

pub const TEMPERATURE: f32 = 0.6;
pub const MAX_TOKENS: u32 = 2048;

#[derive(Error, Debug)]
pub enum RefineError {
    #[error("GROQ_API_KEY is not configured")]
    MissingCredential,
    #[error("request to completion service failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion service returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("completion service returned no text")]
    EmptyCompletion,
}

impl RefineError {
    /// Text sent back to HTTP clients; always starts with `Error:`.
    pub fn client_message(&self) -> String {
        format!("Error: {}", self)
    }
}

#[async_trait]
pub trait PromptRefiner: Send + Sync {
    /// `conversation` excludes the system instruction; implementations prepend it.
    async fn refine(&self, conversation: &[ChatTurn]) -> Result<String, RefineError>;
}

/// Prior turns (role and content only) followed by the new user turn.
pub fn refinement_conversation(history: &[ChatTurn], content: &str) -> Vec<ChatTurn> {
    let mut turns: Vec<ChatTurn> = history
        .iter()
        .filter(|turn| turn.role != Role::System)
        .cloned()
        .collect();
    turns.push(ChatTurn::user(content));
    turns
}

/// The exact message list submitted to the completion service.
pub fn completion_messages(conversation: &[ChatTurn]) -> Vec<ChatTurn> {
    let mut messages = Vec::with_capacity(conversation.len() + 1);
    messages.push(ChatTurn::new(Role::System, SYSTEM_PROMPT));
    messages.extend(conversation.iter().cloned());
    messages
}

/// Stands in when no completion credential is configured.
#[derive(Debug, Default, Clone)]
pub struct UnconfiguredRefiner;

#[async_trait]
impl PromptRefiner for UnconfiguredRefiner {
    async fn refine(&self, _conversation: &[ChatTurn]) -> Result<String, RefineError> {
        tracing::warn!("Refinement requested but GROQ_API_KEY is not set");
        Err(RefineError::MissingCredential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_appends_new_user_turn() {
        let history = vec![
            ChatTurn::user("todo app react"),
            ChatTurn::new(Role::Assistant, "As a Senior Frontend Architect..."),
        ];
        let turns = refinement_conversation(&history, "add offline support");
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0], history[0]);
        assert_eq!(turns[1], history[1]);
        assert_eq!(turns[2], ChatTurn::user("add offline support"));
    }

    #[test]
    fn test_conversation_without_history_is_single_turn() {
        assert_eq!(refinement_conversation(&[], "cli tool"), vec![ChatTurn::user("cli tool")]);
    }

    #[test]
    fn test_system_instruction_is_always_first() {
        let messages = completion_messages(&[ChatTurn::user("x")]);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert_eq!(messages[1], ChatTurn::user("x"));
    }

    #[tokio::test]
    async fn test_unconfigured_refiner_reports_missing_credential() {
        let err = UnconfiguredRefiner.refine(&[ChatTurn::user("x")]).await.unwrap_err();
        assert!(matches!(err, RefineError::MissingCredential));
        assert!(err.client_message().starts_with("Error:"));
    }
}
