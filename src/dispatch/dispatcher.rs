//! RequestDispatcher - the single serialization point for tool actions
//!
//! A process-wide gate admits one action at a time. An admitted action
//! records its user turn, makes exactly one backend call and records exactly
//! one assistant turn, whatever the call's outcome.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use super::action::ToolAction;
use crate::backend::{Backend, BackendError, Reply};
use crate::conversation::{ConversationStore, Turn};
use crate::readiness::ReadinessState;

/// Busy flag shared by every dispatch in the process
#[derive(Debug, Clone, Default)]
pub struct DispatchGate {
    busy: Arc<AtomicBool>,
}

impl DispatchGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Take the gate if it is free. Dropping the guard frees it again.
    pub fn try_acquire(&self) -> Option<GateGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| GateGuard {
                busy: self.busy.clone(),
            })
    }
}

/// Holds the gate for one in-flight action
#[derive(Debug)]
pub struct GateGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

/// Why `submit` declined to start an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Busy,
    EmptyInput,
    NotReady,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::Busy => write!(f, "another request is still running"),
            RejectReason::EmptyInput => write!(f, "nothing to send"),
            RejectReason::NotReady => write!(f, "the backend is not ready yet"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Nothing happened: no call, no turns.
    Rejected(RejectReason),
    /// Both turns were recorded. `succeeded` is false when the assistant turn
    /// is the apology.
    Settled { succeeded: bool },
}

#[derive(Clone)]
pub struct RequestDispatcher {
    backend: Arc<dyn Backend>,
    store: ConversationStore,
    readiness: watch::Receiver<ReadinessState>,
    gate: DispatchGate,
}

impl RequestDispatcher {
    pub fn new(
        backend: Arc<dyn Backend>,
        store: ConversationStore,
        readiness: watch::Receiver<ReadinessState>,
    ) -> Self {
        Self {
            backend,
            store,
            readiness,
            gate: DispatchGate::new(),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Run `action` unless another action is in flight, its input is blank,
    /// or the backend is not ready.
    pub async fn submit(&self, action: ToolAction) -> DispatchOutcome {
        if self.gate.is_busy() {
            return DispatchOutcome::Rejected(RejectReason::Busy);
        }
        if !action.has_required_input() {
            return DispatchOutcome::Rejected(RejectReason::EmptyInput);
        }
        if !self.readiness.borrow().is_ready() {
            return DispatchOutcome::Rejected(RejectReason::NotReady);
        }
        // Checked again atomically; the pre-check above keeps rejections free
        // of any state change.
        let Some(_guard) = self.gate.try_acquire() else {
            return DispatchOutcome::Rejected(RejectReason::Busy);
        };

        let kind = action.kind();
        tracing::info!(action = kind.as_str(), "Dispatching");
        self.store.append(Turn::user(action.user_turn_text())).await;

        let (turn, succeeded) = match self.call(&action).await {
            Ok(reply) => {
                tracing::info!(action = kind.as_str(), method = ?reply.method, "Action settled");
                (Turn::assistant(reply.text, reply.method), true)
            }
            Err(e) => {
                tracing::warn!(
                    action = kind.as_str(),
                    connectivity = e.is_connectivity(),
                    "Action failed: {}",
                    e
                );
                (Turn::assistant(kind.apology(), None), false)
            }
        };

        self.store.append(turn).await;
        DispatchOutcome::Settled { succeeded }
    }

    async fn call(&self, action: &ToolAction) -> Result<Reply, BackendError> {
        match action {
            ToolAction::Chat { message } => self.backend.chat(message.trim()).await,
            ToolAction::ProblemSolve { problem } => {
                let message = format!("Solve this problem: {}", problem);
                self.backend.chat(&message).await
            }
            ToolAction::EssayWrite {
                topic,
                essay_type,
                length,
            } => self.backend.write_essay(topic, *essay_type, *length).await,
            ToolAction::ImageAnalyze { image, question } => {
                let question = question.as_deref().map(str::trim).filter(|q| !q.is_empty());
                self.backend
                    .analyze_image(&image.name, image.bytes.clone(), question)
                    .await
            }
            ToolAction::CodeHelp { code, question } => self.backend.help_code(code, question).await,
            ToolAction::ScienceHelp { subject, question } => {
                self.backend.help_science(*subject, question).await
            }
            ToolAction::TextExtract { image } => self.backend.extract_text(image.bytes.clone()).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use crate::dispatch::{EssayLength, EssayType, ImagePayload, ScienceSubject};
    use crate::testing::ScriptedBackend;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;

    fn ready_dispatcher(backend: Arc<ScriptedBackend>) -> (RequestDispatcher, watch::Sender<ReadinessState>) {
        let (tx, rx) = watch::channel(ReadinessState::Ready);
        (RequestDispatcher::new(backend, ConversationStore::new(), rx), tx)
    }

    fn chat(message: &str) -> ToolAction {
        ToolAction::Chat {
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_chat_success_appends_pair() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_reply(Ok(Reply::new("Hi there")));
        let (dispatcher, _tx) = ready_dispatcher(backend.clone());

        let outcome = dispatcher.submit(chat("Hello")).await;

        assert_eq!(outcome, DispatchOutcome::Settled { succeeded: true });
        assert_eq!(
            dispatcher.store().snapshot().await,
            vec![Turn::user("Hello"), Turn::assistant("Hi there", None)]
        );
        assert_eq!(backend.calls(), vec!["chat:Hello".to_string()]);
        assert!(!dispatcher.is_busy());
    }

    #[tokio::test]
    async fn test_method_tag_is_recorded() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_reply(Ok(Reply::new("x = 4").with_method("Direct Evaluation")));
        let (dispatcher, _tx) = ready_dispatcher(backend.clone());

        dispatcher
            .submit(ToolAction::ProblemSolve {
                problem: "2x + 5 = 13".to_string(),
            })
            .await;

        let log = dispatcher.store().snapshot().await;
        assert_eq!(log[0], Turn::user("Problem: 2x + 5 = 13"));
        assert_eq!(log[1].method(), Some("Direct Evaluation"));
        assert_eq!(backend.calls(), vec!["chat:Solve this problem: 2x + 5 = 13".to_string()]);
    }

    #[tokio::test]
    async fn test_blank_input_is_silent_noop() {
        let backend = Arc::new(ScriptedBackend::new());
        let (dispatcher, _tx) = ready_dispatcher(backend.clone());

        assert_eq!(
            dispatcher.submit(chat("")).await,
            DispatchOutcome::Rejected(RejectReason::EmptyInput)
        );
        assert_eq!(
            dispatcher.submit(chat("   \n")).await,
            DispatchOutcome::Rejected(RejectReason::EmptyInput)
        );
        assert!(dispatcher.store().is_empty().await);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_not_ready_is_rejected() {
        let backend = Arc::new(ScriptedBackend::new());
        let (tx, rx) = watch::channel(ReadinessState::Loading(None));
        let dispatcher = RequestDispatcher::new(backend.clone(), ConversationStore::new(), rx);

        assert_eq!(
            dispatcher.submit(chat("Hello")).await,
            DispatchOutcome::Rejected(RejectReason::NotReady)
        );
        tx.send(ReadinessState::Unreachable("down".to_string())).unwrap();
        assert_eq!(
            dispatcher.submit(chat("Hello")).await,
            DispatchOutcome::Rejected(RejectReason::NotReady)
        );
        assert!(dispatcher.store().is_empty().await);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_essay_failure_appends_apology_and_releases_gate() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_reply(Err(BackendError::Connectivity {
            message: "connection refused".to_string(),
        }));
        let (dispatcher, _tx) = ready_dispatcher(backend.clone());

        let outcome = dispatcher
            .submit(ToolAction::EssayWrite {
                topic: "X".to_string(),
                essay_type: EssayType::Analytical,
                length: EssayLength::Medium,
            })
            .await;

        assert_eq!(outcome, DispatchOutcome::Settled { succeeded: false });
        assert_eq!(
            dispatcher.store().snapshot().await,
            vec![
                Turn::user("Write essay about: X"),
                Turn::assistant("Sorry, I encountered an error writing the essay.", None),
            ]
        );
        assert!(!dispatcher.is_busy());
    }

    #[tokio::test]
    async fn test_backend_reported_failure_uses_action_apology() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_reply(Err(BackendError::EmptyResult));
        backend.push_reply(Err(BackendError::Backend {
            status: 500,
            message: "boom".to_string(),
        }));
        let (dispatcher, _tx) = ready_dispatcher(backend.clone());

        dispatcher
            .submit(ToolAction::ScienceHelp {
                subject: ScienceSubject::Physics,
                question: "Why is the sky blue?".to_string(),
            })
            .await;
        dispatcher
            .submit(ToolAction::CodeHelp {
                code: "print(1)".to_string(),
                question: "What does this do?".to_string(),
            })
            .await;

        let log = dispatcher.store().snapshot().await;
        assert_eq!(log.len(), 4);
        assert_eq!(log[1].content(), "Error helping with science. Please try again.");
        assert_eq!(log[3].content(), "Error helping with code. Please try again.");
        assert!(log.iter().step_by(2).all(|t| t.role() == Role::User));
        assert!(log.iter().skip(1).step_by(2).all(|t| t.role() == Role::Assistant));
    }

    #[tokio::test]
    async fn test_image_actions_route_to_their_encodings() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_reply(Ok(Reply::new("a cat")));
        backend.push_reply(Ok(Reply::new("E = mc^2")));
        let (dispatcher, _tx) = ready_dispatcher(backend.clone());
        let image = ImagePayload::new("cat.png", Bytes::from_static(b"12345"));

        dispatcher
            .submit(ToolAction::ImageAnalyze {
                image: image.clone(),
                question: Some("  ".to_string()),
            })
            .await;
        dispatcher.submit(ToolAction::TextExtract { image }).await;

        assert_eq!(
            backend.calls(),
            vec!["image:cat.png|5|-".to_string(), "ocr:5".to_string()]
        );
        let log = dispatcher.store().snapshot().await;
        assert_eq!(log[0].content(), "[Image Analysis] What's in this image?");
        assert_eq!(log[2].content(), "[Text Extraction]");
        assert_eq!(log[3].content(), "E = mc^2");
    }

    #[tokio::test]
    async fn test_busy_gate_rejects_any_second_action() {
        let backend = Arc::new(ScriptedBackend::held());
        backend.push_reply(Ok(Reply::new("first answer")));
        let (dispatcher, _tx) = ready_dispatcher(backend.clone());

        let first = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.submit(chat("first")).await })
        };
        while !dispatcher.is_busy() {
            tokio::task::yield_now().await;
        }

        let len_before = dispatcher.store().len().await;
        let second = dispatcher
            .submit(ToolAction::ProblemSolve {
                problem: "1 + 1".to_string(),
            })
            .await;
        assert_eq!(second, DispatchOutcome::Rejected(RejectReason::Busy));
        assert_eq!(dispatcher.store().len().await, len_before);
        assert_eq!(backend.calls(), vec!["chat:first".to_string()]);

        backend.release(1);
        assert_eq!(first.await.unwrap(), DispatchOutcome::Settled { succeeded: true });
        assert!(!dispatcher.is_busy());
        assert_eq!(
            dispatcher.store().snapshot().await,
            vec![Turn::user("first"), Turn::assistant("first answer", None)]
        );
    }

    #[tokio::test]
    async fn test_gate_released_when_call_panics() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_panic();
        backend.push_reply(Ok(Reply::new("recovered")));
        let (dispatcher, _tx) = ready_dispatcher(backend.clone());

        let task = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.submit(chat("explode")).await })
        };
        assert!(task.await.is_err());
        assert!(!dispatcher.is_busy());

        let outcome = dispatcher.submit(chat("again")).await;
        assert_eq!(outcome, DispatchOutcome::Settled { succeeded: true });
    }

    #[test]
    fn test_gate_guard_scoping() {
        let gate = DispatchGate::new();
        {
            let _guard = gate.try_acquire().unwrap();
            assert!(gate.is_busy());
            assert!(gate.try_acquire().is_none());
        }
        assert!(!gate.is_busy());
    }
}
