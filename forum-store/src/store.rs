//! In-memory relational store.
//!
//! Single source of truth for questions, answers, chat history, and document
//! records. All reads and writes go through one `RwLock`-guarded table set;
//! callers never cache conversation history across calls, so a restart of a
//! dependent component loses nothing that was not already persisted here.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::category::Category;
use crate::errors::StoreError;
use crate::models::{
    Answer, ChatMessage, ChatSession, DocumentRecord, DocumentStatus, Question, SortOrder, User,
    Vote, VoteOutcome, VoteType,
};

/// Fixed id of the system user that authors AI-generated answers.
pub const SYSTEM_USER_ID: u64 = 1;

/// Arguments for creating a question.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub title: String,
    pub body: String,
    pub user_id: u64,
    pub category: Category,
    pub tags: Vec<String>,
}

/// Arguments for creating a document record.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub name: String,
    pub description: Option<String>,
    pub category: Category,
    pub document_type: String,
    pub file_type: String,
    pub file_size: u64,
    pub file_path: String,
    pub uploaded_by: u64,
}

#[derive(Default)]
struct Tables {
    users: HashMap<u64, User>,
    questions: HashMap<u64, Question>,
    answers: HashMap<u64, Answer>,
    sessions: HashMap<u64, ChatSession>,
    messages: HashMap<u64, ChatMessage>,
    documents: HashMap<u64, DocumentRecord>,
    votes: HashMap<u64, Vote>,

    next_user_id: u64,
    next_question_id: u64,
    next_answer_id: u64,
    next_session_id: u64,
    next_message_id: u64,
    next_document_id: u64,
    next_vote_id: u64,
}

impl Tables {
    fn new() -> Self {
        let mut t = Self {
            next_user_id: 1,
            next_question_id: 1,
            next_answer_id: 1,
            next_session_id: 1,
            next_message_id: 1,
            next_document_id: 1,
            next_vote_id: 1,
            ..Default::default()
        };

        // System user authors AI answers; regular users start at id 2.
        t.users.insert(
            SYSTEM_USER_ID,
            User {
                id: SYSTEM_USER_ID,
                username: "ai-assistant".into(),
                name: "AI Assistant".into(),
                created_at: Utc::now(),
            },
        );
        t.next_user_id = SYSTEM_USER_ID + 1;
        t
    }

    fn take_id(counter: &mut u64) -> u64 {
        let id = *counter;
        *counter += 1;
        id
    }
}

/// Thread-safe in-memory store shared across handlers and background tasks.
pub struct ForumStore {
    tables: RwLock<Tables>,
}

impl Default for ForumStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ForumStore {
    /// Creates an empty store pre-seeded with the system user.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::new()),
        }
    }

    /* --------------------- Users --------------------- */

    pub async fn create_user(&self, username: impl Into<String>, name: impl Into<String>) -> User {
        let mut t = self.tables.write().await;
        let id = Tables::take_id(&mut t.next_user_id);
        let user = User {
            id,
            username: username.into(),
            name: name.into(),
            created_at: Utc::now(),
        };
        t.users.insert(id, user.clone());
        user
    }

    pub async fn get_user(&self, id: u64) -> Option<User> {
        self.tables.read().await.users.get(&id).cloned()
    }

    /* --------------------- Questions --------------------- */

    /// Persists a new question. This write is the durability boundary for a
    /// submission: it completes before any AI step begins.
    pub async fn create_question(&self, new: NewQuestion) -> Question {
        let mut t = self.tables.write().await;
        let id = Tables::take_id(&mut t.next_question_id);
        let question = Question {
            id,
            title: new.title,
            body: new.body,
            user_id: new.user_id,
            category: new.category,
            tags: new.tags,
            views: 0,
            is_answered: false,
            has_ai_answer: false,
            created_at: Utc::now(),
        };
        t.questions.insert(id, question.clone());
        debug!(question_id = id, category = %question.category, "question created");
        question
    }

    pub async fn get_question(&self, id: u64) -> Option<Question> {
        self.tables.read().await.questions.get(&id).cloned()
    }

    /// Paged category listing. Returns `(page items, total in category)`.
    pub async fn list_questions(
        &self,
        category: Category,
        page: usize,
        limit: usize,
        sort: SortOrder,
    ) -> (Vec<Question>, usize) {
        let t = self.tables.read().await;
        let mut items: Vec<Question> = t
            .questions
            .values()
            .filter(|q| q.category == category)
            .cloned()
            .collect();
        let total = items.len();

        match sort {
            SortOrder::Recent => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortOrder::Views => items.sort_by(|a, b| b.views.cmp(&a.views)),
            SortOrder::Unanswered => items.sort_by(|a, b| {
                a.is_answered
                    .cmp(&b.is_answered)
                    .then(b.created_at.cmp(&a.created_at))
            }),
        }

        let page = page.max(1);
        let limit = limit.max(1);
        let start = (page - 1).saturating_mul(limit);
        let items = items.into_iter().skip(start).take(limit).collect();
        (items, total)
    }

    /// Case-insensitive substring search over title and body.
    pub async fn search_questions(
        &self,
        query: &str,
        category: Option<Category>,
    ) -> Vec<Question> {
        let needle = query.to_lowercase();
        let t = self.tables.read().await;
        let mut out: Vec<Question> = t
            .questions
            .values()
            .filter(|q| category.is_none_or(|c| q.category == c))
            .filter(|q| {
                q.title.to_lowercase().contains(&needle) || q.body.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    /// Increments the view counter and returns the updated question.
    pub async fn increment_views(&self, id: u64) -> Result<Question, StoreError> {
        let mut t = self.tables.write().await;
        let q = t
            .questions
            .get_mut(&id)
            .ok_or(StoreError::QuestionNotFound(id))?;
        q.views += 1;
        Ok(q.clone())
    }

    pub async fn set_has_ai_answer(&self, id: u64, value: bool) -> Result<(), StoreError> {
        let mut t = self.tables.write().await;
        let q = t
            .questions
            .get_mut(&id)
            .ok_or(StoreError::QuestionNotFound(id))?;
        q.has_ai_answer = value;
        Ok(())
    }

    pub async fn set_answered(&self, id: u64, value: bool) -> Result<(), StoreError> {
        let mut t = self.tables.write().await;
        let q = t
            .questions
            .get_mut(&id)
            .ok_or(StoreError::QuestionNotFound(id))?;
        q.is_answered = value;
        Ok(())
    }

    /* --------------------- Answers --------------------- */

    pub async fn create_answer(
        &self,
        question_id: u64,
        user_id: u64,
        body: impl Into<String>,
        is_ai_generated: bool,
    ) -> Result<Answer, StoreError> {
        let mut t = self.tables.write().await;
        if !t.questions.contains_key(&question_id) {
            return Err(StoreError::QuestionNotFound(question_id));
        }
        let id = Tables::take_id(&mut t.next_answer_id);
        let answer = Answer {
            id,
            question_id,
            user_id,
            body: body.into(),
            is_ai_generated,
            upvotes: 0,
            downvotes: 0,
            created_at: Utc::now(),
        };
        t.answers.insert(id, answer.clone());
        debug!(answer_id = id, question_id, is_ai_generated, "answer created");
        Ok(answer)
    }

    pub async fn get_answer(&self, id: u64) -> Option<Answer> {
        self.tables.read().await.answers.get(&id).cloned()
    }

    /// Answers for a question, oldest first.
    pub async fn answers_for_question(&self, question_id: u64) -> Vec<Answer> {
        let t = self.tables.read().await;
        let mut out: Vec<Answer> = t
            .answers
            .values()
            .filter(|a| a.question_id == question_id)
            .cloned()
            .collect();
        out.sort_by_key(|a| a.id);
        out
    }

    /// Applies a vote with toggle/switch semantics, then recomputes the
    /// answer's tallies from the vote table.
    pub async fn vote_answer(
        &self,
        answer_id: u64,
        user_id: u64,
        vote_type: VoteType,
    ) -> Result<VoteOutcome, StoreError> {
        let mut t = self.tables.write().await;
        if !t.answers.contains_key(&answer_id) {
            return Err(StoreError::AnswerNotFound(answer_id));
        }

        let existing = t
            .votes
            .values()
            .find(|v| v.answer_id == answer_id && v.user_id == user_id)
            .map(|v| (v.id, v.vote_type));

        let outcome = match existing {
            Some((vote_id, existing_type)) if existing_type == vote_type => {
                t.votes.remove(&vote_id);
                VoteOutcome::Removed
            }
            Some((vote_id, _)) => {
                if let Some(v) = t.votes.get_mut(&vote_id) {
                    v.vote_type = vote_type;
                }
                VoteOutcome::Switched
            }
            None => {
                let id = Tables::take_id(&mut t.next_vote_id);
                t.votes.insert(
                    id,
                    Vote {
                        id,
                        user_id,
                        answer_id,
                        vote_type,
                        created_at: Utc::now(),
                    },
                );
                VoteOutcome::Added
            }
        };

        let (up, down) = t.votes.values().filter(|v| v.answer_id == answer_id).fold(
            (0u64, 0u64),
            |(up, down), v| match v.vote_type {
                VoteType::Upvote => (up + 1, down),
                VoteType::Downvote => (up, down + 1),
            },
        );
        if let Some(a) = t.answers.get_mut(&answer_id) {
            a.upvotes = up;
            a.downvotes = down;
        }

        Ok(outcome)
    }

    /* --------------------- Chat sessions & messages --------------------- */

    pub async fn create_session(&self, user_id: u64, category: Category) -> ChatSession {
        let mut t = self.tables.write().await;
        let id = Tables::take_id(&mut t.next_session_id);
        let session = ChatSession {
            id,
            user_id,
            category,
            created_at: Utc::now(),
        };
        t.sessions.insert(id, session.clone());
        session
    }

    pub async fn get_session(&self, id: u64) -> Option<ChatSession> {
        self.tables.read().await.sessions.get(&id).cloned()
    }

    pub async fn sessions_for_user(&self, user_id: u64) -> Vec<ChatSession> {
        let t = self.tables.read().await;
        let mut out: Vec<ChatSession> = t
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    pub async fn create_chat_message(
        &self,
        session_id: u64,
        content: impl Into<String>,
        is_user_message: bool,
    ) -> Result<ChatMessage, StoreError> {
        let mut t = self.tables.write().await;
        if !t.sessions.contains_key(&session_id) {
            return Err(StoreError::SessionNotFound(session_id));
        }
        let id = Tables::take_id(&mut t.next_message_id);
        let message = ChatMessage {
            id,
            session_id,
            content: content.into(),
            is_user_message,
            created_at: Utc::now(),
        };
        t.messages.insert(id, message.clone());
        Ok(message)
    }

    /// Full conversation history for a session, in creation order.
    pub async fn messages_for_session(&self, session_id: u64) -> Vec<ChatMessage> {
        let t = self.tables.read().await;
        let mut out: Vec<ChatMessage> = t
            .messages
            .values()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect();
        out.sort_by_key(|m| m.id);
        out
    }

    /* --------------------- Documents --------------------- */

    /// Creates a record in `processing` state. The ingestion pipeline
    /// resolves it to `processed` or `failed` out-of-band.
    pub async fn create_document(&self, new: NewDocument) -> DocumentRecord {
        let mut t = self.tables.write().await;
        let id = Tables::take_id(&mut t.next_document_id);
        let record = DocumentRecord {
            id,
            name: new.name,
            description: new.description,
            category: new.category,
            document_type: new.document_type,
            file_type: new.file_type,
            file_size: new.file_size,
            file_path: new.file_path,
            uploaded_by: new.uploaded_by,
            status: DocumentStatus::Processing,
            embedding_id: None,
            created_at: Utc::now(),
        };
        t.documents.insert(id, record.clone());
        record
    }

    pub async fn get_document(&self, id: u64) -> Option<DocumentRecord> {
        self.tables.read().await.documents.get(&id).cloned()
    }

    pub async fn list_documents(&self, category: Option<Category>) -> Vec<DocumentRecord> {
        let t = self.tables.read().await;
        let mut out: Vec<DocumentRecord> = t
            .documents
            .values()
            .filter(|d| category.is_none_or(|c| d.category == c))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    pub async fn mark_document_processed(
        &self,
        id: u64,
        embedding_id: impl Into<String>,
    ) -> Result<DocumentRecord, StoreError> {
        let mut t = self.tables.write().await;
        let d = t
            .documents
            .get_mut(&id)
            .ok_or(StoreError::DocumentNotFound(id))?;
        d.status = DocumentStatus::Processed;
        d.embedding_id = Some(embedding_id.into());
        Ok(d.clone())
    }

    pub async fn mark_document_failed(&self, id: u64) -> Result<DocumentRecord, StoreError> {
        let mut t = self.tables.write().await;
        let d = t
            .documents
            .get_mut(&id)
            .ok_or(StoreError::DocumentNotFound(id))?;
        d.status = DocumentStatus::Failed;
        d.embedding_id = None;
        Ok(d.clone())
    }

    /// Removes the record and returns it so the caller can clean up the
    /// stored file and the index entry.
    pub async fn delete_document(&self, id: u64) -> Result<DocumentRecord, StoreError> {
        let mut t = self.tables.write().await;
        t.documents
            .remove(&id)
            .ok_or(StoreError::DocumentNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn question_starts_unanswered_without_ai_answer() {
        let store = ForumStore::new();
        let q = store
            .create_question(NewQuestion {
                title: "VPN setup".into(),
                body: "How do I configure VPN on Linux?".into(),
                user_id: 2,
                category: Category::Technical,
                tags: vec![],
            })
            .await;
        assert!(!q.has_ai_answer);
        assert!(!q.is_answered);
        assert_eq!(q.views, 0);
    }

    #[tokio::test]
    async fn vote_toggle_and_switch_semantics() {
        let store = ForumStore::new();
        let q = store
            .create_question(NewQuestion {
                title: "t".into(),
                body: "b".into(),
                user_id: 2,
                category: Category::General,
                tags: vec![],
            })
            .await;
        let a = store.create_answer(q.id, 3, "answer", false).await.unwrap();

        let out = store.vote_answer(a.id, 4, VoteType::Upvote).await.unwrap();
        assert_eq!(out, VoteOutcome::Added);
        assert_eq!(store.get_answer(a.id).await.unwrap().upvotes, 1);

        let out = store
            .vote_answer(a.id, 4, VoteType::Downvote)
            .await
            .unwrap();
        assert_eq!(out, VoteOutcome::Switched);
        let a2 = store.get_answer(a.id).await.unwrap();
        assert_eq!((a2.upvotes, a2.downvotes), (0, 1));

        let out = store
            .vote_answer(a.id, 4, VoteType::Downvote)
            .await
            .unwrap();
        assert_eq!(out, VoteOutcome::Removed);
        let a3 = store.get_answer(a.id).await.unwrap();
        assert_eq!((a3.upvotes, a3.downvotes), (0, 0));
    }

    #[tokio::test]
    async fn chat_messages_keep_creation_order() {
        let store = ForumStore::new();
        let s = store.create_session(2, Category::Hr).await;
        store.create_chat_message(s.id, "first", true).await.unwrap();
        store
            .create_chat_message(s.id, "reply", false)
            .await
            .unwrap();
        store
            .create_chat_message(s.id, "second", true)
            .await
            .unwrap();

        let history = store.messages_for_session(s.id).await;
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "reply", "second"]);
    }

    #[tokio::test]
    async fn document_status_transitions() {
        let store = ForumStore::new();
        let d = store
            .create_document(NewDocument {
                name: "VPN Runbook".into(),
                description: None,
                category: Category::Technical,
                document_type: "runbook".into(),
                file_type: "md".into(),
                file_size: 42,
                file_path: "/tmp/vpn.md".into(),
                uploaded_by: 2,
            })
            .await;
        assert_eq!(d.status, DocumentStatus::Processing);
        assert!(d.embedding_id.is_none());

        let d = store
            .mark_document_processed(d.id, "doc_1_abc")
            .await
            .unwrap();
        assert_eq!(d.status, DocumentStatus::Processed);
        assert_eq!(d.embedding_id.as_deref(), Some("doc_1_abc"));

        let d = store.mark_document_failed(d.id).await.unwrap();
        assert_eq!(d.status, DocumentStatus::Failed);
        assert!(d.embedding_id.is_none());
    }

    #[tokio::test]
    async fn listing_pages_and_sorts() {
        let store = ForumStore::new();
        for i in 0..5 {
            let q = store
                .create_question(NewQuestion {
                    title: format!("q{i}"),
                    body: "b".into(),
                    user_id: 2,
                    category: Category::Ideas,
                    tags: vec![],
                })
                .await;
            for _ in 0..i {
                store.increment_views(q.id).await.unwrap();
            }
        }

        let (page, total) = store
            .list_questions(Category::Ideas, 1, 2, SortOrder::Views)
            .await;
        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);
        assert!(page[0].views >= page[1].views);

        let (page2, _) = store
            .list_questions(Category::Ideas, 3, 2, SortOrder::Views)
            .await;
        assert_eq!(page2.len(), 1);
    }
}
