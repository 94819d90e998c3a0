//! Domain records held by the store.
//!
//! Wire names are camelCase to match the public API (`hasAiAnswer`,
//! `isAiGenerated`, `isUserMessage`). Records are plain data; all invariants
//! (id assignment, flag updates, vote tallies) live in the store itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Forum member. Authentication is handled outside this crate; the store
/// only keeps enough to attribute content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub username: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A forum question. Identity and text are immutable; `views`,
/// `is_answered`, and `has_ai_answer` are mutated over its lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub user_id: u64,
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    pub views: u64,
    pub is_answered: bool,
    pub has_ai_answer: bool,
    pub created_at: DateTime<Utc>,
}

/// An answer to a question, from a peer or generated by the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: u64,
    pub question_id: u64,
    pub user_id: u64,
    pub body: String,
    pub is_ai_generated: bool,
    pub upvotes: u64,
    pub downvotes: u64,
    pub created_at: DateTime<Utc>,
}

/// A persistent assistant conversation scoped to one user and one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: u64,
    pub user_id: u64,
    pub category: Category,
    pub created_at: DateTime<Utc>,
}

/// One turn of a chat session. Immutable once created; ordering by id is
/// the conversation history fed to generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: u64,
    pub session_id: u64,
    pub content: String,
    pub is_user_message: bool,
    pub created_at: DateTime<Utc>,
}

/// Processing state of an uploaded reference document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Processing,
    Processed,
    Failed,
}

/// Metadata for an uploaded reference document. `embedding_id` is an opaque
/// handle into the vector index, set only once ingestion succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub category: Category,
    pub document_type: String,
    pub file_type: String,
    pub file_size: u64,
    pub file_path: String,
    pub uploaded_by: u64,
    pub status: DocumentStatus,
    pub embedding_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Direction of a vote on an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Upvote,
    Downvote,
}

/// One user's vote on one answer. At most one per (user, answer) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: u64,
    pub user_id: u64,
    pub answer_id: u64,
    pub vote_type: VoteType,
    pub created_at: DateTime<Utc>,
}

/// Result of applying a vote, reported back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteOutcome {
    /// New vote recorded.
    Added,
    /// Same-type vote repeated: the existing vote was removed.
    Removed,
    /// Opposite-type vote existed: direction switched.
    Switched,
}

/// Sort orders for question listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Recent,
    Views,
    Unanswered,
}
