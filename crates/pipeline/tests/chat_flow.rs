//! Conversation-loop tests against a stubbed inference service.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use lutspace_backend::models::message::MessageRole;
use lutspace_backend::BackendClient;
use lutspace_core::config::BackendConfig;
use lutspace_inference::{GenerateResponse, InferenceApi, InferenceError, TuningParams};
use lutspace_pipeline::{ChatOrchestrator, ChatTarget};

/// Raw completion with the artifacts the live service actually produces.
const RAW_COMPLETION: &str = "[INST]Hello[/INST]\nHi there!\nUser: bye";

#[derive(Default)]
struct StubInference {
    fail_generate: bool,
    train_calls: Mutex<Vec<(String, String, Option<String>)>>,
    train_notify: Notify,
}

#[async_trait]
impl InferenceApi for StubInference {
    async fn generate(
        &self,
        _lut_name: &str,
        _system_prompt: &str,
        _user_message: &str,
        _params: &TuningParams,
    ) -> Result<GenerateResponse, InferenceError> {
        if self.fail_generate {
            return Err(InferenceError::Api {
                status: 500,
                message: "lut not loaded".into(),
            });
        }
        Ok(GenerateResponse {
            completion: RAW_COMPLETION.into(),
            residual: Some(0.75),
            threshold: Some(0.25),
        })
    }

    async fn train(
        &self,
        lut_name: &str,
        label: &str,
        label_context: Option<&str>,
        _params: &TuningParams,
    ) -> Result<serde_json::Value, InferenceError> {
        self.train_calls.lock().unwrap().push((
            lut_name.into(),
            label.into(),
            label_context.map(str::to_string),
        ));
        self.train_notify.notify_one();
        Ok(serde_json::json!({"status": "ok"}))
    }
}

fn backend() -> Arc<BackendClient> {
    // Unroutable; tests run anonymous conversations so nothing should
    // reach it anyway.
    Arc::new(BackendClient::new(&BackendConfig {
        project_url: "http://127.0.0.1:9".into(),
        anon_key: "anon".into(),
    }))
}

fn personal(inference: Arc<StubInference>) -> ChatOrchestrator {
    ChatOrchestrator::new(
        inference,
        backend(),
        ChatTarget::Personal {
            lut_name: "demo".into(),
        },
        None,
    )
}

#[tokio::test]
async fn empty_input_is_rejected_not_queued() {
    let mut chat = personal(Arc::new(StubInference::default()));
    assert!(!chat.send("   ").await);
    assert!(chat.transcript().is_empty());
    assert!(!chat.is_sending());
}

#[tokio::test]
async fn successful_turn_cleans_and_appends_reply() {
    let stub = Arc::new(StubInference::default());
    let mut chat = personal(Arc::clone(&stub));

    assert!(chat.send("Hello").await);

    let transcript = chat.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].role, MessageRole::User);
    assert_eq!(transcript[0].content, "Hello");
    assert_eq!(transcript[1].role, MessageRole::Assistant);
    // Instruction block stripped, trailing echo truncated.
    assert_eq!(transcript[1].content, "Hi there!");
    assert_eq!(chat.status(), None);
    assert!(!chat.is_sending());

    // Personal conversations never train.
    assert!(stub.train_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn input_is_trimmed_before_the_turn() {
    let mut chat = personal(Arc::new(StubInference::default()));
    assert!(chat.send("  Hello \n").await);
    assert_eq!(chat.transcript()[0].content, "Hello");
}

#[tokio::test]
async fn generate_failure_keeps_user_turn_and_sets_status() {
    let stub = Arc::new(StubInference {
        fail_generate: true,
        ..StubInference::default()
    });
    let mut chat = personal(stub);

    assert!(chat.send("Hello").await);

    assert_eq!(chat.transcript().len(), 1);
    assert_eq!(chat.transcript()[0].role, MessageRole::User);
    assert_eq!(chat.status(), Some("lut not loaded"));
    assert!(!chat.is_sending());
}

#[tokio::test]
async fn status_clears_on_the_next_send() {
    let stub = Arc::new(StubInference {
        fail_generate: true,
        ..StubInference::default()
    });
    let mut chat = personal(stub);
    chat.send("Hello").await;
    assert!(chat.status().is_some());

    let mut chat = personal(Arc::new(StubInference::default()));
    chat.send("Hello").await;
    assert_eq!(chat.status(), None);
}

#[tokio::test]
async fn space_turn_trains_the_finished_pair() {
    let stub = Arc::new(StubInference::default());
    let mut chat = ChatOrchestrator::new(
        Arc::clone(&stub) as Arc<dyn InferenceApi>,
        backend(),
        ChatTarget::Space {
            space_id: uuid::Uuid::new_v4(),
            lut_name: "acme-a1b2c3".into(),
        },
        None,
    );

    assert!(chat.send("Hello").await);

    // Training is detached; wait for the stub to see it.
    tokio::time::timeout(Duration::from_secs(2), stub.train_notify.notified())
        .await
        .expect("train call never arrived");

    let calls = stub.train_calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    let (lut_name, label, context) = &calls[0];
    assert_eq!(lut_name, "acme-a1b2c3");
    assert_eq!(label, "Hi there!");
    assert_eq!(context.as_deref(), Some("Hello"));
}
