//! Domain model and in-memory store for the AI-augmented Q&A forum.
//!
//! The design is flat: one facade type ([`ForumStore`]) plus plain data
//! records. The store is the single source of truth for conversation
//! history; AI components re-read it on every call instead of caching.

mod category;
mod errors;
mod models;
mod store;

pub use category::{Category, CategoryProfile, UnknownCategory};
pub use errors::StoreError;
pub use models::{
    Answer, ChatMessage, ChatSession, DocumentRecord, DocumentStatus, Question, SortOrder, User,
    Vote, VoteOutcome, VoteType,
};
pub use store::{ForumStore, NewDocument, NewQuestion, SYSTEM_USER_ID};
