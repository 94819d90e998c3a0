//! Forum endpoints: posts, answers, votes, search.
//!
//! Creating a post never waits for the AI: the question is persisted and
//! acknowledged with 201 first, then the answer flow runs in a background
//! task. A failing AI backend leaves the post visible and unanswered.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use forum_store::{Answer, Category, NewQuestion, Question, SortOrder, VoteOutcome, VoteType};

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    middleware_layer::current_user::CurrentUser,
};

fn parse_category(raw: &str) -> AppResult<Category> {
    raw.parse::<Category>()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/* --------------------- create post --------------------- */

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    user: CurrentUser,
    Json(req): Json<CreatePostRequest>,
) -> AppResult<Response> {
    let category = parse_category(&category)?;
    if req.title.trim().is_empty() || req.body.trim().is_empty() {
        return Err(AppError::BadRequest("title and body are required".into()));
    }

    let question = state
        .store
        .create_question(NewQuestion {
            title: req.title,
            body: req.body,
            user_id: user.0,
            category,
            tags: req.tags,
        })
        .await;

    // The post is durable at this point; the AI answer arrives out-of-band.
    let orch = state.orchestrator.clone();
    let question_id = question.id;
    tokio::spawn(async move {
        if let Err(e) = orch.answer_question(question_id).await {
            warn!(question_id, error = %e, "AI answer not produced for question");
        }
    });

    Ok(ApiResponse::success(question).into_response_with_status(StatusCode::CREATED))
}

/* --------------------- listing & detail --------------------- */

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub sort: SortOrder,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    20
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListResponse {
    pub items: Vec<Question>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    Query(params): Query<ListParams>,
) -> AppResult<Response> {
    let category = parse_category(&category)?;
    let (items, total) = state
        .store
        .list_questions(category, params.page, params.limit, params.sort)
        .await;

    debug!(category = %category, total, "post listing served");
    let body = PostListResponse {
        items,
        total,
        page: params.page,
        limit: params.limit,
    };
    Ok(ApiResponse::success(body).into_response_with_status(StatusCode::OK))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetailResponse {
    pub question: Question,
    pub answers: Vec<Answer>,
}

/// Fetching a post counts as one view.
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> AppResult<Response> {
    let question = state.store.increment_views(id).await?;
    let answers = state.store.answers_for_question(id).await;
    let body = PostDetailResponse { question, answers };
    Ok(ApiResponse::success(body).into_response_with_status(StatusCode::OK))
}

/* --------------------- search --------------------- */

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub category: Option<String>,
}

pub async fn search_posts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> AppResult<Response> {
    if params.q.trim().is_empty() {
        return Err(AppError::BadRequest("query parameter q is required".into()));
    }
    let category = params
        .category
        .as_deref()
        .map(parse_category)
        .transpose()?;

    let items = state.store.search_questions(&params.q, category).await;
    Ok(ApiResponse::success(items).into_response_with_status(StatusCode::OK))
}

/* --------------------- answers & votes --------------------- */

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnswerRequest {
    pub body: String,
}

pub async fn create_answer(
    State(state): State<Arc<AppState>>,
    Path(question_id): Path<u64>,
    user: CurrentUser,
    Json(req): Json<CreateAnswerRequest>,
) -> AppResult<Response> {
    if req.body.trim().is_empty() {
        return Err(AppError::BadRequest("answer body is required".into()));
    }

    let answer = state
        .store
        .create_answer(question_id, user.0, req.body, false)
        .await?;
    state.store.set_answered(question_id, true).await?;

    Ok(ApiResponse::success(answer).into_response_with_status(StatusCode::CREATED))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub vote_type: VoteType,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub outcome: VoteOutcome,
    pub answer: Answer,
}

pub async fn vote_answer(
    State(state): State<Arc<AppState>>,
    Path(answer_id): Path<u64>,
    user: CurrentUser,
    Json(req): Json<VoteRequest>,
) -> AppResult<Response> {
    let outcome = state
        .store
        .vote_answer(answer_id, user.0, req.vote_type)
        .await?;
    let answer = state
        .store
        .get_answer(answer_id)
        .await
        .ok_or(AppError::NotFound("answer", answer_id))?;

    let body = VoteResponse { outcome, answer };
    Ok(ApiResponse::success(body).into_response_with_status(StatusCode::OK))
}
