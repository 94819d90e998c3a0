//! AI answer orchestration.
//!
//! One [`AnswerOrchestrator`] drives every AI-augmented flow: forum
//! questions, chat sessions, and one-shot queries from external bridges.
//! The flow is always retrieve → generate → persist, with two hard rules:
//!
//! - The user's content is persisted **before** generation starts, so a
//!   failing or disabled AI backend never loses a post or message.
//! - Context retrieval is fail-closed: on error or timeout the answer is
//!   generated without context rather than not at all.

pub mod error;
pub mod ingestion;
pub mod prompt;
pub mod retriever;
pub mod sessions;

pub use error::OrchestratorError;
pub use ingestion::IngestionPipeline;
pub use retriever::{ContextRetriever, IndexRetriever};

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use ai_llm_service::{AiLlmError, ChatTurn, ResponseGenerator, clamp_history};
use forum_store::{
    Answer, Category, ChatMessage, ChatSession, ForumStore, SYSTEM_USER_ID, StoreError,
};

use crate::prompt::system_instruction;
use crate::sessions::{SessionGates, Turn};

/// Tunables for the answer flow.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Hard budget for one generation call.
    pub generation_timeout: Duration,
    /// Most recent turns kept per generation call. Zero means unbounded.
    pub history_max_turns: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            generation_timeout: Duration::from_secs(120),
            history_max_turns: 40,
        }
    }
}

impl OrchestratorConfig {
    /// Reads `LLM_TIMEOUT_SECS` and `LLM_HISTORY_TURNS`, falling back to
    /// defaults for unset or invalid values.
    pub fn from_env() -> Self {
        let d = Self::default();
        let generation_timeout = std::env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(d.generation_timeout);
        let history_max_turns = std::env::var("LLM_HISTORY_TURNS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(d.history_max_turns);
        Self {
            generation_timeout,
            history_max_turns,
        }
    }
}

/// A persisted chat message together with its AI reply.
#[derive(Debug, Clone)]
pub struct ChatExchange {
    pub user_message: ChatMessage,
    pub reply: ChatMessage,
}

/// A chat message that is persisted and queued but not yet answered.
///
/// Produced by [`AnswerOrchestrator::accept_chat_message`]; holds the
/// session's claimed turn, so dropping it gives the turn up without
/// blocking later messages.
pub struct PendingExchange {
    session: ChatSession,
    user_message: ChatMessage,
    turn: Turn,
}

impl PendingExchange {
    pub fn user_message(&self) -> &ChatMessage {
        &self.user_message
    }
}

/// Drives retrieval, generation, and persistence for all AI answer flows.
pub struct AnswerOrchestrator {
    store: Arc<ForumStore>,
    retriever: Arc<dyn ContextRetriever>,
    generator: Arc<dyn ResponseGenerator>,
    gates: SessionGates,
    cfg: OrchestratorConfig,
}

impl AnswerOrchestrator {
    pub fn new(
        store: Arc<ForumStore>,
        retriever: Arc<dyn ContextRetriever>,
        generator: Arc<dyn ResponseGenerator>,
        cfg: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            retriever,
            generator,
            gates: SessionGates::new(),
            cfg,
        }
    }

    /// Generates and persists the AI answer for an already-persisted
    /// question.
    ///
    /// Intended to run after the question write has been acknowledged; a
    /// failure here leaves the question untouched and unanswered.
    ///
    /// # Errors
    /// Returns [`OrchestratorError::Generation`] when the backend fails or
    /// times out, and store errors if the question vanished meanwhile.
    #[instrument(skip(self), fields(provider = self.generator.provider_name()))]
    pub async fn answer_question(&self, question_id: u64) -> Result<Answer, OrchestratorError> {
        let question = self
            .store
            .get_question(question_id)
            .await
            .ok_or(StoreError::QuestionNotFound(question_id))?;

        let query = format!("{}\n\n{}", question.title, question.body);
        let context = self.retriever.retrieve(question.category, &query).await;
        let system = system_instruction(question.category, &context);

        let reply = self.generate(&system, &[ChatTurn::user(query)]).await?;

        let answer = self
            .store
            .create_answer(question_id, SYSTEM_USER_ID, reply, true)
            .await?;
        self.store.set_has_ai_answer(question_id, true).await?;
        self.store.set_answered(question_id, true).await?;

        info!(question_id, answer_id = answer.id, "question answered");
        Ok(answer)
    }

    /// Persists one chat message and produces its AI reply.
    ///
    /// The whole cycle runs under the session's turn: two back-to-back
    /// messages in one session are handled strictly in arrival order, and
    /// the second one sees the first reply in its history. The user message
    /// is persisted before generation, so it survives any AI failure.
    ///
    /// # Errors
    /// Returns [`OrchestratorError::Generation`] when the backend fails or
    /// times out (the user message is already stored), and store errors for
    /// unknown sessions.
    #[instrument(skip(self, content), fields(provider = self.generator.provider_name()))]
    pub async fn answer_chat_message(
        &self,
        session_id: u64,
        content: &str,
    ) -> Result<ChatExchange, OrchestratorError> {
        let session = self
            .store
            .get_session(session_id)
            .await
            .ok_or(StoreError::SessionNotFound(session_id))?;

        let _turn = self.gates.claim(session_id).wait().await;

        let user_message = self
            .store
            .create_chat_message(session_id, content, true)
            .await?;

        let reply = self.exchange(&session, &user_message).await?;
        Ok(ChatExchange {
            user_message,
            reply,
        })
    }

    /// Persists one chat message immediately and claims the session's next
    /// turn, without waiting for generation.
    ///
    /// This is the inbound half of the live channel: the message is durable
    /// and ordered as soon as this returns, and [`finish_chat_message`]
    /// runs the AI cycle later. Messages accepted back-to-back are answered
    /// in acceptance order.
    ///
    /// [`finish_chat_message`]: AnswerOrchestrator::finish_chat_message
    ///
    /// # Errors
    /// Returns a store error for unknown sessions.
    pub async fn accept_chat_message(
        &self,
        session_id: u64,
        content: &str,
    ) -> Result<PendingExchange, OrchestratorError> {
        let session = self
            .store
            .get_session(session_id)
            .await
            .ok_or(StoreError::SessionNotFound(session_id))?;

        let turn = self.gates.claim(session_id);
        let user_message = self
            .store
            .create_chat_message(session_id, content, true)
            .await?;

        Ok(PendingExchange {
            session,
            user_message,
            turn,
        })
    }

    /// Waits for the accepted message's turn, then retrieves context,
    /// generates, and persists the reply.
    ///
    /// # Errors
    /// Returns [`OrchestratorError::Generation`] when the backend fails or
    /// times out (the user message is already stored).
    #[instrument(skip(self, pending), fields(session_id = pending.session.id))]
    pub async fn finish_chat_message(
        &self,
        pending: PendingExchange,
    ) -> Result<ChatExchange, OrchestratorError> {
        let PendingExchange {
            session,
            user_message,
            turn,
        } = pending;
        let _turn = turn.wait().await;

        let reply = self.exchange(&session, &user_message).await?;
        Ok(ChatExchange {
            user_message,
            reply,
        })
    }

    /// Retrieve → generate → persist-reply tail for one message. The caller
    /// holds the session's turn.
    async fn exchange(
        &self,
        session: &ChatSession,
        user_message: &ChatMessage,
    ) -> Result<ChatMessage, OrchestratorError> {
        // Re-read under the turn: replies to earlier messages are in by
        // now. User messages accepted after this one are already persisted
        // too and must stay out of this generation's history; their own
        // turns come later.
        let mut history: Vec<ChatTurn> = self
            .store
            .messages_for_session(session.id)
            .await
            .into_iter()
            .filter(|m| m.id != user_message.id && !(m.is_user_message && m.id > user_message.id))
            .map(|m| {
                if m.is_user_message {
                    ChatTurn::user(m.content)
                } else {
                    ChatTurn::assistant(m.content)
                }
            })
            .collect();
        history.push(ChatTurn::user(user_message.content.clone()));

        let context = self
            .retriever
            .retrieve(session.category, &user_message.content)
            .await;
        let system = system_instruction(session.category, &context);

        let reply_text = match self.generate(&system, &history).await {
            Ok(t) => t,
            Err(e) => {
                warn!(session_id = session.id, error = %e, "generation failed; user message kept");
                return Err(e.into());
            }
        };

        let reply = self
            .store
            .create_chat_message(session.id, reply_text, false)
            .await?;

        Ok(reply)
    }

    /// One-shot answer for external bridges: no persistence, no session.
    ///
    /// # Errors
    /// Returns [`OrchestratorError::Generation`] when the backend fails or
    /// times out.
    pub async fn answer_query(
        &self,
        category: Category,
        text: &str,
    ) -> Result<String, OrchestratorError> {
        let context = self.retriever.retrieve(category, text).await;
        let system = system_instruction(category, &context);
        let reply = self
            .generate(&system, &[ChatTurn::user(text.to_string())])
            .await?;
        Ok(reply)
    }

    async fn generate(&self, system: &str, history: &[ChatTurn]) -> Result<String, AiLlmError> {
        let clamped = clamp_history(history, self.cfg.history_max_turns);
        match tokio::time::timeout(
            self.cfg.generation_timeout,
            self.generator.complete(Some(system), clamped),
        )
        .await
        {
            Ok(res) => res,
            Err(_) => Err(AiLlmError::Timeout(self.cfg.generation_timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use forum_store::NewQuestion;
    use tokio::sync::Mutex;

    struct EmptyRetriever;

    #[async_trait]
    impl ContextRetriever for EmptyRetriever {
        async fn retrieve(&self, _: Category, _: &str) -> String {
            String::new()
        }
    }

    struct StaticRetriever(String);

    #[async_trait]
    impl ContextRetriever for StaticRetriever {
        async fn retrieve(&self, _: Category, _: &str) -> String {
            self.0.clone()
        }
    }

    /// Records every call and replies with a marker of the last user turn.
    struct EchoGenerator {
        calls: Mutex<Vec<(String, Vec<ChatTurn>)>>,
    }

    impl EchoGenerator {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ResponseGenerator for EchoGenerator {
        async fn complete(
            &self,
            system: Option<&str>,
            history: &[ChatTurn],
        ) -> Result<String, AiLlmError> {
            self.calls
                .lock()
                .await
                .push((system.unwrap_or_default().to_string(), history.to_vec()));
            let last = history.last().map(|t| t.text.as_str()).unwrap_or_default();
            Ok(format!("reply to: {last}"))
        }

        fn provider_name(&self) -> &'static str {
            "echo"
        }
    }

    /// Replies with the system instruction it was given.
    struct SystemEchoGenerator;

    #[async_trait]
    impl ResponseGenerator for SystemEchoGenerator {
        async fn complete(
            &self,
            system: Option<&str>,
            _: &[ChatTurn],
        ) -> Result<String, AiLlmError> {
            Ok(system.unwrap_or_default().to_string())
        }

        fn provider_name(&self) -> &'static str {
            "system-echo"
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl ResponseGenerator for FailingGenerator {
        async fn complete(&self, _: Option<&str>, _: &[ChatTurn]) -> Result<String, AiLlmError> {
            Err(AiLlmError::Disabled)
        }

        fn provider_name(&self) -> &'static str {
            "failing"
        }
    }

    fn orchestrator(
        store: Arc<ForumStore>,
        generator: Arc<dyn ResponseGenerator>,
    ) -> AnswerOrchestrator {
        AnswerOrchestrator::new(
            store,
            Arc::new(EmptyRetriever),
            generator,
            OrchestratorConfig::default(),
        )
    }

    async fn seed_question(store: &ForumStore) -> u64 {
        store
            .create_question(NewQuestion {
                title: "VPN setup".into(),
                body: "How do I configure the VPN on Linux?".into(),
                user_id: 2,
                category: Category::Technical,
                tags: vec!["vpn".into()],
            })
            .await
            .id
    }

    #[tokio::test]
    async fn question_survives_generation_failure() {
        let store = Arc::new(ForumStore::new());
        let orch = orchestrator(store.clone(), Arc::new(FailingGenerator));
        let qid = seed_question(&store).await;

        let result = orch.answer_question(qid).await;
        assert!(matches!(result, Err(OrchestratorError::Generation(_))));

        let q = store.get_question(qid).await.unwrap();
        assert!(!q.has_ai_answer);
        assert!(!q.is_answered);
        assert!(store.answers_for_question(qid).await.is_empty());
    }

    #[tokio::test]
    async fn successful_question_gets_system_authored_answer() {
        let store = Arc::new(ForumStore::new());
        let orch = orchestrator(store.clone(), Arc::new(EchoGenerator::new()));
        let qid = seed_question(&store).await;

        let answer = orch.answer_question(qid).await.unwrap();
        assert_eq!(answer.user_id, SYSTEM_USER_ID);
        assert!(answer.is_ai_generated);
        assert!(answer.body.contains("VPN setup"));

        let q = store.get_question(qid).await.unwrap();
        assert!(q.has_ai_answer);
        assert!(q.is_answered);
    }

    #[tokio::test]
    async fn second_message_sees_first_reply_in_history() {
        let store = Arc::new(ForumStore::new());
        let generator = Arc::new(EchoGenerator::new());
        let orch = orchestrator(store.clone(), generator.clone());
        let session = store.create_session(2, Category::General).await;

        orch.answer_chat_message(session.id, "first").await.unwrap();
        orch.answer_chat_message(session.id, "second").await.unwrap();

        let calls = generator.calls.lock().await;
        assert_eq!(calls.len(), 2);

        let first_history: Vec<&str> = calls[0].1.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(first_history, vec!["first"]);

        let second_history: Vec<&str> = calls[1].1.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(second_history, vec!["first", "reply to: first", "second"]);
    }

    #[tokio::test]
    async fn concurrent_messages_keep_reply_after_its_message() {
        let store = Arc::new(ForumStore::new());
        let orch = Arc::new(orchestrator(store.clone(), Arc::new(EchoGenerator::new())));
        let session = store.create_session(2, Category::Hr).await;

        let a = {
            let orch = orch.clone();
            let id = session.id;
            tokio::spawn(async move { orch.answer_chat_message(id, "m1").await })
        };
        let b = {
            let orch = orch.clone();
            let id = session.id;
            tokio::spawn(async move { orch.answer_chat_message(id, "m2").await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let messages = store.messages_for_session(session.id).await;
        assert_eq!(messages.len(), 4);
        // Strict per-session ordering: user, reply, user, reply.
        for pair in messages.chunks(2) {
            assert!(pair[0].is_user_message);
            assert!(!pair[1].is_user_message);
            assert!(pair[1].content.contains(&pair[0].content));
        }
    }

    #[tokio::test]
    async fn accepted_messages_are_answered_in_acceptance_order() {
        let store = Arc::new(ForumStore::new());
        let generator = Arc::new(EchoGenerator::new());
        let orch = Arc::new(orchestrator(store.clone(), generator.clone()));
        let session = store.create_session(2, Category::General).await;

        let first = orch.accept_chat_message(session.id, "m1").await.unwrap();
        let second = orch.accept_chat_message(session.id, "m2").await.unwrap();

        // Both user messages are durable before any generation ran.
        let messages = store.messages_for_session(session.id).await;
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m1", "m2"]);
        assert!(generator.calls.lock().await.is_empty());

        // Finish in reverse; acceptance order must still win.
        let b = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.finish_chat_message(second).await })
        };
        let a = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.finish_chat_message(first).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let calls = generator.calls.lock().await;
        assert_eq!(calls.len(), 2);
        let first_history: Vec<&str> = calls[0].1.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(first_history, vec!["m1"]);
        let second_history: Vec<&str> = calls[1].1.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(second_history, vec!["m1", "reply to: m1", "m2"]);
    }

    #[tokio::test]
    async fn abandoned_pending_exchange_frees_the_session() {
        let store = Arc::new(ForumStore::new());
        let orch = orchestrator(store.clone(), Arc::new(EchoGenerator::new()));
        let session = store.create_session(2, Category::Technical).await;

        let first = orch.accept_chat_message(session.id, "m1").await.unwrap();
        drop(first);

        // Would hang on the abandoned turn otherwise.
        let exchange = orch.answer_chat_message(session.id, "m2").await.unwrap();
        assert_eq!(exchange.reply.content, "reply to: m2");
    }

    #[tokio::test]
    async fn failed_generation_keeps_user_message() {
        let store = Arc::new(ForumStore::new());
        let orch = orchestrator(store.clone(), Arc::new(FailingGenerator));
        let session = store.create_session(2, Category::Ideas).await;

        let result = orch.answer_chat_message(session.id, "my idea").await;
        assert!(matches!(result, Err(OrchestratorError::Generation(_))));

        let messages = store.messages_for_session(session.id).await;
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_user_message);
        assert_eq!(messages[0].content, "my idea");
    }

    #[tokio::test]
    async fn answer_body_carries_retrieved_context() {
        let store = Arc::new(ForumStore::new());
        let orch = AnswerOrchestrator::new(
            store.clone(),
            Arc::new(StaticRetriever(
                "Doc: VPN Runbook\nUse openconnect with profile X".into(),
            )),
            Arc::new(SystemEchoGenerator),
            OrchestratorConfig::default(),
        );
        let qid = seed_question(&store).await;

        let answer = orch.answer_question(qid).await.unwrap();
        assert!(answer.is_ai_generated);
        assert!(answer.body.contains("Use openconnect with profile X"));

        let q = store.get_question(qid).await.unwrap();
        assert!(q.has_ai_answer);
    }

    #[tokio::test]
    async fn context_block_reaches_system_instruction() {
        let store = Arc::new(ForumStore::new());
        let generator = Arc::new(EchoGenerator::new());
        let orch = AnswerOrchestrator::new(
            store,
            Arc::new(StaticRetriever(
                "Document: vpn.md (Type: guide)\nContent: use vpn.internal".into(),
            )),
            generator.clone(),
            OrchestratorConfig::default(),
        );

        orch.answer_query(Category::Technical, "how do I connect?")
            .await
            .unwrap();

        let calls = generator.calls.lock().await;
        assert!(calls[0].0.contains("technical support"));
        assert!(calls[0].0.contains("use vpn.internal"));
    }
}
