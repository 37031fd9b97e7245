//! Chat relay HTTP handlers.
//!
//! The assistant webhook pushes replies in whatever shape it has handy
//! (single object, array, or loose text fields); everything is normalized
//! into [`ChatMessage`]s before it reaches the mailbox.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use almacen_core::ChatMessage;

use crate::blobstore::{build_blob_name, classify_media_kind, media_folder};
use crate::handlers::attachments::decode_base64_payload;
use crate::{ApiError, AppState};

fn message_from_value(value: &serde_json::Value) -> Option<ChatMessage> {
    let obj = value.as_object()?;

    let role = match obj.get("role").and_then(|r| r.as_str()) {
        Some("user") => "user",
        _ => "bot",
    };
    let content = obj
        .get("content")
        .or_else(|| obj.get("text"))
        .or_else(|| obj.get("message"))
        .and_then(|c| c.as_str())
        .unwrap_or("")
        .trim()
        .to_string();
    let attachments = obj
        .get("attachments")
        .and_then(|a| a.as_array())
        .cloned()
        .unwrap_or_default();
    let timestamp = obj
        .get("timestamp")
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| Utc::now().to_rfc3339());

    Some(ChatMessage {
        role: role.to_string(),
        content,
        attachments,
        timestamp,
    })
}

/// Extract the session id from either of the accepted key spellings.
pub fn session_id_of(payload: &serde_json::Value) -> Option<String> {
    payload
        .get("sessionId")
        .or_else(|| payload.get("session_id"))
        .and_then(|s| s.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Normalize an incoming webhook payload into chat messages.
///
/// `messages` may be one object or an array of objects; with neither, a
/// single message is synthesized from the loose `message`/`reply`/`text`
/// and `attachments` fields when any of them carry content.
pub fn normalize_incoming(payload: &serde_json::Value) -> Vec<ChatMessage> {
    match payload.get("messages") {
        Some(single @ serde_json::Value::Object(_)) => {
            message_from_value(single).into_iter().collect()
        }
        Some(serde_json::Value::Array(raw)) => {
            raw.iter().filter_map(message_from_value).collect()
        }
        _ => {
            let text = payload
                .get("message")
                .or_else(|| payload.get("reply"))
                .or_else(|| payload.get("text"))
                .and_then(|t| t.as_str())
                .unwrap_or("");
            let attachments = payload
                .get("attachments")
                .and_then(|a| a.as_array())
                .cloned()
                .unwrap_or_default();
            if text.is_empty() && attachments.is_empty() {
                return Vec::new();
            }
            let role = match payload.get("role").and_then(|r| r.as_str()) {
                Some("user") => "user",
                _ => "bot",
            };
            let timestamp = payload
                .get("timestamp")
                .and_then(|t| t.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| Utc::now().to_rfc3339());
            vec![ChatMessage {
                role: role.to_string(),
                content: text.trim().to_string(),
                attachments,
                timestamp,
            }]
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatUpload {
    pub data: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "contentType")]
    pub content_type: Option<String>,
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
    #[serde(rename = "type")]
    pub declared_type: Option<String>,
}

/// Receive a base64 attachment and store it in the chat container.
pub async fn upload(
    State(state): State<AppState>,
    Json(payload): Json<ChatUpload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let data = payload
        .data
        .as_deref()
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::BadRequest("data es requerido".to_string()))?;
    let content_type = payload.content_type.or(payload.mime_type);

    let media_kind = classify_media_kind(payload.declared_type.as_deref(), content_type.as_deref());
    let folder = media_folder(media_kind);

    let binary = decode_base64_payload(data)?;
    let blob_name = build_blob_name(payload.name.as_deref(), content_type.as_deref());
    let url = state
        .blobs
        .put(
            &state.chat_container,
            &format!("{}/{}", folder, blob_name),
            &binary,
            content_type.as_deref().unwrap_or("application/octet-stream"),
        )
        .await?;

    Ok(Json(serde_json::json!({
        "url": url,
        "name": payload.name,
        "type": payload.declared_type.as_deref().unwrap_or(media_kind),
        "media_kind": media_kind,
        "contentType": content_type,
    })))
}

/// Receive asynchronous assistant replies and queue them per session.
pub async fn incoming(
    State(state): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let session_id = session_id_of(&payload)
        .ok_or_else(|| ApiError::BadRequest("sessionId es requerido".to_string()))?;

    let messages = normalize_incoming(&payload);
    let stored = state.mailbox.push(&session_id, messages);

    info!(
        subsystem = "api",
        component = "chat",
        op = "incoming",
        session_id = %session_id,
        stored,
        "Chat messages received"
    );

    let status = if stored > 0 {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(serde_json::json!({ "accepted": stored }))))
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    #[serde(rename = "sessionId")]
    pub session_id_camel: Option<String>,
    pub session_id: Option<String>,
}

/// Return and clear queued messages for a session.
pub async fn messages(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session_id = query
        .session_id_camel
        .or(query.session_id)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("sessionId es requerido".to_string()))?;

    let messages = state.mailbox.pull(&session_id);
    Ok(Json(serde_json::json!({ "messages": messages })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_array_of_messages() {
        let payload = json!({
            "sessionId": "s1",
            "messages": [
                { "role": "bot", "content": "hola", "timestamp": "t1" },
                "not an object",
                { "role": "admin", "text": "coerced" }
            ]
        });
        let messages = normalize_incoming(&payload);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "hola");
        assert_eq!(messages[0].timestamp, "t1");
        // Unknown roles are coerced to "bot".
        assert_eq!(messages[1].role, "bot");
        assert_eq!(messages[1].content, "coerced");
    }

    #[test]
    fn test_normalize_single_object_message() {
        let payload = json!({ "messages": { "role": "user", "message": "hola" } });
        let messages = normalize_incoming(&payload);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content, "hola");
    }

    #[test]
    fn test_normalize_loose_text_fallback() {
        let payload = json!({ "reply": "  hola  ", "attachments": [{"url": "x"}] });
        let messages = normalize_incoming(&payload);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "hola");
        assert_eq!(messages[0].attachments.len(), 1);
        assert!(!messages[0].timestamp.is_empty());
    }

    #[test]
    fn test_normalize_empty_payload_yields_nothing() {
        assert!(normalize_incoming(&json!({ "sessionId": "s1" })).is_empty());
        assert!(normalize_incoming(&json!({ "message": "" })).is_empty());
    }

    #[test]
    fn test_session_id_spellings() {
        assert_eq!(
            session_id_of(&json!({ "sessionId": "a" })),
            Some("a".to_string())
        );
        assert_eq!(
            session_id_of(&json!({ "session_id": "b" })),
            Some("b".to_string())
        );
        assert_eq!(session_id_of(&json!({ "sessionId": "  " })), None);
        assert_eq!(session_id_of(&json!({})), None);
    }
}
