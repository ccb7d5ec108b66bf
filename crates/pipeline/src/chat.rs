//! The conversation loop: send, generate, clean, persist, train.

use std::sync::Arc;

use lutspace_backend::models::chat::Chat;
use lutspace_backend::models::message::MessageRole;
use lutspace_backend::repositories::{ChatRepo, MessageRepo};
use lutspace_backend::{best_effort, BackendClient, SessionUser};
use lutspace_core::cleaner::extract_assistant_reply;
use lutspace_core::types::EntityId;
use lutspace_inference::{InferenceApi, TuningParams};

/// What the conversation is addressed to.
#[derive(Debug, Clone)]
pub enum ChatTarget {
    /// A user's personal conversation against the demo lookup table.
    Personal { lut_name: String },
    /// A space's shared conversation against its own lookup table. Every
    /// finished turn is also trained back into the table.
    Space { space_id: EntityId, lut_name: String },
}

impl ChatTarget {
    fn lut_name(&self) -> &str {
        match self {
            Self::Personal { lut_name } | Self::Space { lut_name, .. } => lut_name,
        }
    }
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub role: MessageRole,
    pub content: String,
}

/// Drives one conversation.
///
/// `Idle → Sending → Idle`; a failed turn surfaces as a transient status
/// string and the machine returns to `Idle`. There is no cancellation of
/// an in-flight send.
///
/// The transcript is the source of truth; backend persistence is an
/// audit trail and every write to it is best-effort.
pub struct ChatOrchestrator {
    inference: Arc<dyn InferenceApi>,
    backend: Arc<BackendClient>,
    target: ChatTarget,
    user: Option<SessionUser>,
    system_prompt: String,
    params: TuningParams,
    chat_row: Option<Chat>,
    transcript: Vec<ChatTurn>,
    sending: bool,
    status: Option<String>,
}

impl ChatOrchestrator {
    /// Create an idle orchestrator with an empty transcript.
    ///
    /// `user` is the signed-in identity, `None` for an anonymous demo
    /// conversation; without it no persistence is attempted at all.
    pub fn new(
        inference: Arc<dyn InferenceApi>,
        backend: Arc<BackendClient>,
        target: ChatTarget,
        user: Option<SessionUser>,
    ) -> Self {
        Self {
            inference,
            backend,
            target,
            user,
            system_prompt: String::new(),
            params: TuningParams::default(),
            chat_row: None,
            transcript: Vec::new(),
            sending: false,
            status: None,
        }
    }

    /// Override the system prompt (empty by default).
    pub fn with_system_prompt(mut self, system_prompt: &str) -> Self {
        self.system_prompt = system_prompt.to_string();
        self
    }

    /// Override the tuning parameters.
    pub fn with_params(mut self, params: TuningParams) -> Self {
        self.params = params;
        self
    }

    /// Resume an existing persisted conversation.
    pub fn with_history(mut self, chat_row: Chat, transcript: Vec<ChatTurn>) -> Self {
        self.chat_row = Some(chat_row);
        self.transcript = transcript;
        self
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    /// The transient status message from the last failed send.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Run one full turn.
    ///
    /// Empty input, or a send already in flight, is rejected outright
    /// (returns `false`), never queued. `true` means the turn ran to its
    /// end state, whether the generation succeeded or not.
    pub async fn send(&mut self, input: &str) -> bool {
        let message = input.trim().to_string();
        if message.is_empty() || self.sending {
            return false;
        }

        self.sending = true;
        self.status = None;
        // Optimistic: the user turn goes in before anything can fail.
        self.transcript.push(ChatTurn {
            role: MessageRole::User,
            content: message.clone(),
        });

        self.ensure_chat_row().await;
        if let Some(chat) = &self.chat_row {
            best_effort(
                MessageRepo::append(&self.backend, chat.id, MessageRole::User, &message).await,
                "user message append",
            );
        }

        let generated = self
            .inference
            .generate(
                self.target.lut_name(),
                &self.system_prompt,
                &message,
                &self.params,
            )
            .await;

        let reply = match generated {
            Ok(response) => extract_assistant_reply(&response.completion, &message),
            Err(error) => {
                self.status = Some(error.to_string());
                self.sending = false;
                return true;
            }
        };

        self.transcript.push(ChatTurn {
            role: MessageRole::Assistant,
            content: reply.clone(),
        });

        match &self.target {
            ChatTarget::Personal { .. } => {
                if let Some(chat) = &self.chat_row {
                    best_effort(
                        MessageRepo::append(&self.backend, chat.id, MessageRole::Assistant, &reply)
                            .await,
                        "assistant message append",
                    );
                }
            }
            ChatTarget::Space { lut_name, .. } => {
                // The space variant does not hold the turn open for
                // persistence or training; both run detached.
                if let Some(chat) = &self.chat_row {
                    let backend = Arc::clone(&self.backend);
                    let chat_id = chat.id;
                    let content = reply.clone();
                    tokio::spawn(async move {
                        best_effort(
                            MessageRepo::append(&backend, chat_id, MessageRole::Assistant, &content)
                                .await,
                            "assistant message append",
                        );
                    });
                }
                self.spawn_turn_training(lut_name.clone(), reply, message);
            }
        }

        self.sending = false;
        true
    }

    /// Look up or create the backing chat row, once per conversation.
    ///
    /// Space conversations reuse the space's existing chat (at most one
    /// per space by convention). Failure here is tolerated: the
    /// conversation continues unpersisted.
    async fn ensure_chat_row(&mut self) {
        if self.chat_row.is_some() {
            return;
        }
        let Some(user) = &self.user else {
            return;
        };

        self.chat_row = match &self.target {
            ChatTarget::Personal { .. } => best_effort(
                ChatRepo::create_personal(&self.backend, user.id).await,
                "personal chat create",
            ),
            ChatTarget::Space { space_id, .. } => {
                match best_effort(
                    ChatRepo::find_for_space(&self.backend, *space_id).await,
                    "space chat lookup",
                ) {
                    Some(Some(existing)) => Some(existing),
                    Some(None) => best_effort(
                        ChatRepo::create_for_space(&self.backend, *space_id, user.id).await,
                        "space chat create",
                    ),
                    None => None,
                }
            }
        };
    }

    /// Train the finished (question, answer) turn back into the space's
    /// lookup table. Fire-and-forget: the handle is dropped, a failure is
    /// logged and otherwise unobservable.
    fn spawn_turn_training(&self, lut_name: String, answer: String, question: String) {
        let inference = Arc::clone(&self.inference);
        let params = self.params.clone();
        tokio::spawn(async move {
            if let Err(error) = inference
                .train(&lut_name, &answer, Some(&question), &params)
                .await
            {
                tracing::warn!(lut_name, error = %error, "Turn training failed");
            }
        });
    }
}
