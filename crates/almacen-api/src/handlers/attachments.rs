//! Material attachment HTTP handlers.
//!
//! Attachments are uploaded base64-encoded, stored under
//! `files/<material_id>/` in the catalog container, and tracked by one
//! canonical file record per upload. Hidden files (`stack = false`) stay in
//! storage but are dropped from listings.

use axum::extract::{Path, State};
use axum::Json;
use base64::Engine;
use serde::Deserialize;
use tracing::info;

use almacen_core::{AttachedFile, AttachmentRepository, CreateAttachedFile, Error};

use crate::blobstore::build_blob_name;
use crate::{ApiError, AppState};

/// Decode a base64 payload, tolerating a `data:<mime>;base64,` prefix.
pub fn decode_base64_payload(data: &str) -> Result<Vec<u8>, Error> {
    let encoded = match data.split_once(',') {
        Some((_, rest)) => rest,
        None => data,
    };
    base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| Error::InvalidInput("No se pudo decodificar el contenido base64.".to_string()))
}

fn display_name(file: &AttachedFile) -> String {
    let source = if file.path.is_empty() {
        &file.url_file
    } else {
        &file.path
    };
    source.rsplit('/').next().unwrap_or(source).to_string()
}

/// List visible attachments for a material.
pub async fn list_attachments(
    State(state): State<AppState>,
    Path(material_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let files = state
        .db
        .files
        .list_for_material(material_id.trim())
        .await?;

    let items: Vec<serde_json::Value> = files
        .iter()
        .filter(|f| f.stack)
        .map(|f| {
            serde_json::json!({
                "archivo_id": f.archivo_id,
                "name": display_name(f),
                "url": f.url_file,
                "ext": f.extension,
                "created_at": f.created_at.to_rfc3339(),
                "observacion": f.observacion.clone().unwrap_or_default(),
            })
        })
        .collect();

    info!(
        subsystem = "api",
        component = "attachments",
        op = "list",
        material_id = %material_id,
        result_count = items.len(),
        "Attachments listed"
    );
    Ok(Json(serde_json::json!({ "items": items })))
}

#[derive(Debug, Deserialize)]
pub struct AttachmentUpload {
    pub data: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "contentType")]
    pub content_type: Option<String>,
    #[serde(rename = "mimeType")]
    pub mime_type: Option<String>,
    pub observacion: Option<String>,
}

/// Upload a base64 attachment and insert its file record.
pub async fn upload_attachment(
    State(state): State<AppState>,
    Path(material_id): Path<String>,
    Json(payload): Json<AttachmentUpload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let data = payload
        .data
        .as_deref()
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::BadRequest("data es requerido".to_string()))?;
    let material_id = material_id.trim().to_string();
    let content_type = payload.content_type.or(payload.mime_type);

    let binary = decode_base64_payload(data)?;

    let blob_name = build_blob_name(payload.name.as_deref(), content_type.as_deref());
    let url = state
        .blobs
        .put(
            &state.catalog_container,
            &format!("files/{}/{}", material_id, blob_name),
            &binary,
            content_type.as_deref().unwrap_or("application/octet-stream"),
        )
        .await?;

    let extension = payload
        .name
        .as_deref()
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());
    let basename = payload
        .name
        .as_deref()
        .map(|n| n.rsplit('/').next().unwrap_or(n))
        .unwrap_or("file");
    let path = format!("/files/{}/{}", material_id, basename);

    let record = state
        .db
        .files
        .insert(CreateAttachedFile {
            id_material: material_id.clone(),
            path,
            observacion: payload.observacion.clone(),
            url_file: url.clone(),
            extension,
        })
        .await?;

    info!(
        subsystem = "api",
        component = "attachments",
        op = "upload",
        material_id = %material_id,
        file_id = record.archivo_id,
        size_bytes = binary.len(),
        "Attachment uploaded"
    );

    Ok(Json(serde_json::json!({
        "url": url,
        "name": payload.name,
        "contentType": content_type,
        "record": record,
    })))
}

/// Flip an attachment's visibility flag.
pub async fn toggle_file_stack(
    State(state): State<AppState>,
    Path(file_id): Path<i32>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let file = state.db.files.toggle_stack(file_id).await?;
    Ok(Json(serde_json::json!({ "ok": true, "file": file })))
}
