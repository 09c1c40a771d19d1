//! Per-connection session logic.
//!
//! A [`Session`] receives one [`ClientEvent`] at a time and answers through
//! its [`EventSink`]:
//! 1. Plain text is relayed to the LLM with the session persona and model
//! 2. Text starting with `/` is a session command
//! 3. Every failure becomes a single error event; the session keeps going

mod commands;
mod prompt;
mod sink;

use std::sync::Arc;

use uuid::Uuid;

use crate::api::types::{ClientEvent, MessageKind, UserInput};
use crate::config::Config;
use crate::llm::{HuggingFaceClient, LlmClient, LlmError};
use crate::workspace::CommandRunner;

pub use commands::{SessionCommand, COMMANDS};
pub use prompt::build_relay_messages;
pub use sink::EventSink;

/// State of one connected client.
pub struct Session {
    id: Uuid,
    config: Arc<Config>,
    llm: Arc<dyn LlmClient>,
    captioner: Option<Arc<HuggingFaceClient>>,
    runner: CommandRunner,
    sink: EventSink,
    model: String,
    persona: String,
}

impl Session {
    pub fn new(config: Arc<Config>, llm: Arc<dyn LlmClient>, sink: EventSink) -> Self {
        Self {
            id: Uuid::new_v4(),
            runner: CommandRunner::from_config(&config),
            model: config.default_model.clone(),
            persona: config.default_persona.clone(),
            config,
            llm,
            captioner: None,
            sink,
        }
    }

    /// Enable `/describe_image`.
    pub fn with_captioner(mut self, captioner: Option<Arc<HuggingFaceClient>>) -> Self {
        self.captioner = captioner;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    /// Handle for producers that announce files to this connection.
    pub fn sink(&self) -> &EventSink {
        &self.sink
    }

    pub async fn handle(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::UserInput(UserInput { text }) => self.handle_user_input(&text).await,
        }
    }

    async fn handle_user_input(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            tracing::warn!(session = %self.id, "Validation error: Empty input");
            self.sink
                .message("Validation error: Empty input", MessageKind::Error);
            return;
        }

        tracing::info!(session = %self.id, "User input: {}", text);

        if text.starts_with('/') {
            let command = SessionCommand::parse(text);
            self.run_command(command).await;
        } else {
            self.relay(text).await;
        }
    }

    /// Forward `text` to the LLM and emit the reply or one error.
    async fn relay(&self, text: &str) {
        let instruction = self.config.persona_instruction(&self.persona);
        let messages = build_relay_messages(&instruction, text);
        let timeout = self.config.request_timeout();

        let result = match tokio::time::timeout(
            timeout,
            self.llm.chat_completion(&self.model, &messages),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(timeout)),
        };

        match result {
            Ok(reply) => {
                tracing::debug!(session = %self.id, "Relayed reply ({} bytes)", reply.len());
                self.sink.message(reply, MessageKind::Assistant);
            }
            Err(e) => {
                tracing::error!(session = %self.id, "Error processing input: {}", e);
                self.sink.error(format!("Error processing input: {}", e));
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::llm::{ChatMessage, LlmClient, LlmError};

    /// Canned LLM that records what it was asked.
    pub struct StubLlm {
        reply: Option<String>,
        delay: Duration,
        pub calls: Mutex<Vec<(String, Vec<ChatMessage>)>>,
    }

    impl StubLlm {
        pub fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                delay: Duration::ZERO,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                reply: None,
                delay: Duration::ZERO,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn slow(reply: &str, delay: Duration) -> Self {
            Self {
                delay,
                ..Self::replying(reply)
            }
        }
    }

    #[async_trait]
    impl LlmClient for StubLlm {
        async fn chat_completion(
            &self,
            model: &str,
            messages: &[ChatMessage],
        ) -> Result<String, LlmError> {
            self.calls
                .lock()
                .unwrap()
                .push((model.to_string(), messages.to_vec()));
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => Err(LlmError::Status {
                    status: 502,
                    body: "bad gateway".to_string(),
                }),
            }
        }
    }
}
