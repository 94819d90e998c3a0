//! Chat-platform bridge.
//!
//! A single webhook endpoint that speaks the event envelope used by
//! workspace chat integrations: it answers the `url_verification`
//! handshake and turns mention/message events into one-shot AI queries.
//! Nothing from this surface is persisted in the forum.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::{debug, info};

use forum_store::Category;

use crate::{core::app_state::AppState, error_handler::AppResult};

/// Bridge responses follow the chat platform's wire shape, not the
/// forum's response envelope.
fn raw_json(body: Value) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

/// Strips a leading `<@USERID>` bot mention from the event text.
fn strip_mention(text: &str) -> &str {
    let trimmed = text.trim_start();
    if let Some(rest) = trimmed.strip_prefix("<@")
        && let Some(end) = rest.find('>')
    {
        return rest[end + 1..].trim_start();
    }
    trimmed
}

pub async fn bridge_events(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> AppResult<Response> {
    // Endpoint ownership handshake: echo the challenge back verbatim.
    if payload.get("type").and_then(Value::as_str) == Some("url_verification") {
        let challenge = payload
            .get("challenge")
            .and_then(Value::as_str)
            .unwrap_or_default();
        debug!("bridge url_verification handshake");
        return Ok(raw_json(json!({ "challenge": challenge })));
    }

    let event = payload.get("event").unwrap_or(&Value::Null);
    let event_type = event.get("type").and_then(Value::as_str).unwrap_or_default();

    if !matches!(event_type, "app_mention" | "message") {
        debug!(event_type, "bridge event ignored");
        return Ok(raw_json(json!({ "ok": true })));
    }

    let text = event.get("text").and_then(Value::as_str).unwrap_or_default();
    let question = strip_mention(text);
    if question.is_empty() {
        return Ok(raw_json(json!({ "ok": true })));
    }

    let category = event
        .get("category")
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse::<Category>().ok())
        .unwrap_or(Category::General);

    info!(event_type, category = %category, "bridge query received");
    let reply = state.orchestrator.answer_query(category, question).await?;

    Ok(raw_json(json!({ "text": reply })))
}

#[cfg(test)]
mod tests {
    use super::strip_mention;

    #[test]
    fn mention_prefix_is_removed() {
        assert_eq!(strip_mention("<@U123ABC> how do I deploy?"), "how do I deploy?");
    }

    #[test]
    fn text_without_mention_is_untouched() {
        assert_eq!(strip_mention("  plain question"), "plain question");
    }

    #[test]
    fn unterminated_mention_is_kept() {
        assert_eq!(strip_mention("<@U123 broken"), "<@U123 broken");
    }
}
