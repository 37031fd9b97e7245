//! PDF catalog HTTP handlers: multipart upload, listing, and the featured
//! (`stack`) flag.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};

use almacen_core::{CatalogEntry, CatalogRepository, CreateCatalogEntry};

use crate::blobstore::{build_blob_name, fetch_remote_image};
use crate::{ApiError, AppState};

/// Wire shape for a catalog entry, including blob properties when the
/// stored PDF could be resolved.
#[derive(Debug, Serialize)]
pub struct CatalogPayload {
    pub catalog_id: i32,
    pub catalog_name: String,
    pub display_name: String,
    pub description: String,
    pub collection: String,
    pub stack: bool,
    pub url: String,
    pub cover_url: String,
    pub created_at: String,
    pub size: Option<u64>,
    pub last_modified: Option<String>,
}

/// Serialize a catalog row for JSON responses.
///
/// The external cover (`url_cartula`) wins over the uploaded one
/// (`url_portada`) when both exist.
pub fn serialize_catalog(
    entry: &CatalogEntry,
    size: Option<u64>,
    last_modified: Option<String>,
) -> CatalogPayload {
    let cover_url = entry
        .url_cartula
        .clone()
        .or_else(|| entry.url_portada.clone())
        .unwrap_or_default();

    CatalogPayload {
        catalog_id: entry.catalog_id,
        catalog_name: entry.catalog_name.clone(),
        display_name: entry.catalog_name.clone(),
        description: entry.description.clone(),
        collection: entry.collection.clone().unwrap_or_default(),
        stack: entry.stack,
        url: entry.url_catalogo.clone(),
        cover_url,
        created_at: entry.created_at.to_rfc3339(),
        size,
        last_modified,
    }
}

/// "1", "true", "on" and "yes" are truthy form values.
pub fn parse_bool_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

/// Coerce the stack-toggle body value: missing defaults to true, booleans
/// pass through, strings follow the form-value rules.
pub fn coerce_flag(raw: Option<&serde_json::Value>) -> bool {
    match raw {
        None | Some(serde_json::Value::Null) => true,
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => parse_bool_flag(s),
        Some(_) => true,
    }
}

/// Look up blob size/mtime for an entry's stored PDF. Best effort: a blob
/// that cannot be resolved yields `None`s, never an error.
async fn blob_props(state: &AppState, url: &str) -> (Option<u64>, Option<String>) {
    let Some((container, path)) = state.blobs.parse_public_url(url) else {
        return (None, None);
    };
    match state.blobs.properties(&container, &path).await {
        Ok(Some(props)) => (
            Some(props.size),
            props.last_modified.map(|ts| ts.to_rfc3339()),
        ),
        Ok(None) => (None, None),
        Err(e) => {
            warn!(
                subsystem = "api",
                component = "catalogs",
                blob_path = %path,
                error = %e,
                "Blob properties lookup failed"
            );
            (None, None)
        }
    }
}

/// List all catalog entries, newest first.
pub async fn list_catalogs(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let entries = state.db.catalogs.list().await?;

    let mut items = Vec::with_capacity(entries.len());
    for entry in &entries {
        let (size, last_modified) = blob_props(&state, &entry.url_catalogo).await;
        items.push(serialize_catalog(entry, size, last_modified));
    }

    Ok(Json(serde_json::json!({ "catalogs": items })))
}

struct UploadedFile {
    data: Vec<u8>,
    filename: Option<String>,
    content_type: Option<String>,
}

/// Create a catalog entry from a multipart upload.
///
/// Required: `file` (PDF), `catalog_name`, `description`. Optional: `cover`
/// and `caratula` image files, `caratula_url` to fetch an external cover,
/// `collection`, and an initial `stack` flag.
pub async fn create_catalog(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let mut file: Option<UploadedFile> = None;
    let mut cover: Option<UploadedFile> = None;
    let mut caratula: Option<UploadedFile> = None;
    let mut catalog_name = String::new();
    let mut description = String::new();
    let mut collection = String::new();
    let mut stack_raw = String::new();
    let mut caratula_url_field = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => file = Some(read_file(field).await?),
            Some("cover") => cover = Some(read_file(field).await?),
            Some("caratula") => caratula = Some(read_file(field).await?),
            Some("catalog_name") => catalog_name = read_text(field).await?,
            Some("description") => description = read_text(field).await?,
            Some("collection") => collection = read_text(field).await?,
            Some("stack") => stack_raw = read_text(field).await?,
            Some("caratula_url") => caratula_url_field = read_text(field).await?,
            _ => {}
        }
    }

    let file = file
        .filter(|f| f.filename.as_deref().is_some_and(|n| !n.is_empty()))
        .ok_or_else(|| ApiError::BadRequest("Selecciona un archivo PDF.".to_string()))?;

    let catalog_name = catalog_name.trim().to_string();
    let description = description.trim().to_string();
    if catalog_name.is_empty() {
        return Err(ApiError::BadRequest(
            "El nombre del catálogo es obligatorio.".to_string(),
        ));
    }
    if description.is_empty() {
        return Err(ApiError::BadRequest(
            "La descripción es obligatoria.".to_string(),
        ));
    }

    let mimetype = file.content_type.clone().unwrap_or_default().to_lowercase();
    if !mimetype.contains("pdf") {
        return Err(ApiError::BadRequest(
            "Solo se permiten archivos PDF.".to_string(),
        ));
    }

    let size_bytes = file.data.len() as u64;
    let container = state.catalog_container.clone();

    let blob_name = build_blob_name(file.filename.as_deref(), file.content_type.as_deref());
    let url = state
        .blobs
        .put(
            &container,
            &format!("catalogs/{}", blob_name),
            &file.data,
            file.content_type.as_deref().unwrap_or("application/pdf"),
        )
        .await?;

    let mut cover_url: Option<String> = None;
    if let Some(cover) = cover.filter(|c| c.filename.as_deref().is_some_and(|n| !n.is_empty())) {
        let cover_mime = cover.content_type.clone().unwrap_or_default().to_lowercase();
        if !cover_mime.starts_with("image/") {
            return Err(ApiError::BadRequest(
                "La portada debe ser una imagen.".to_string(),
            ));
        }
        let name = build_blob_name(cover.filename.as_deref(), cover.content_type.as_deref());
        cover_url = Some(
            state
                .blobs
                .put(
                    &container,
                    &format!("portadas_catalogo/{}", name),
                    &cover.data,
                    &cover_mime,
                )
                .await?,
        );
    }

    let mut caratula_url: Option<String> = None;
    if let Some(caratula) =
        caratula.filter(|c| c.filename.as_deref().is_some_and(|n| !n.is_empty()))
    {
        let car_mime = caratula
            .content_type
            .clone()
            .unwrap_or_default()
            .to_lowercase();
        if !car_mime.starts_with("image/") {
            return Err(ApiError::BadRequest(
                "La carátula debe ser una imagen.".to_string(),
            ));
        }
        let name = build_blob_name(caratula.filename.as_deref(), caratula.content_type.as_deref());
        caratula_url = Some(
            state
                .blobs
                .put(
                    &container,
                    &format!("caratulas/{}", name),
                    &caratula.data,
                    &car_mime,
                )
                .await?,
        );
    } else if !caratula_url_field.trim().is_empty() {
        // External cover: fetched server-side and re-hosted alongside the
        // uploaded ones.
        let (data, content_type) =
            fetch_remote_image(&state.http, caratula_url_field.trim()).await?;
        let name = build_blob_name(None, content_type.as_deref());
        caratula_url = Some(
            state
                .blobs
                .put(
                    &container,
                    &format!("caratulas/{}", name),
                    &data,
                    content_type.as_deref().unwrap_or("application/octet-stream"),
                )
                .await?,
        );
    }

    let entry = state
        .db
        .catalogs
        .create(CreateCatalogEntry {
            catalog_name,
            description,
            collection: Some(collection.trim().to_string()).filter(|c| !c.is_empty()),
            stack: parse_bool_flag(&stack_raw),
            url_catalogo: url,
            url_portada: cover_url,
            url_cartula: caratula_url,
        })
        .await?;

    info!(
        subsystem = "api",
        component = "catalogs",
        op = "create",
        catalog_id = entry.catalog_id,
        size_bytes,
        "Catalog uploaded"
    );

    let payload = serialize_catalog(&entry, Some(size_bytes), None);
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Catálogo cargado correctamente.",
            "catalog": payload,
        })),
    ))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read form field: {}", e)))
}

async fn read_file(field: axum::extract::multipart::Field<'_>) -> Result<UploadedFile, ApiError> {
    let filename = field.file_name().map(str::to_string);
    let content_type = field.content_type().map(str::to_string);
    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read file data: {}", e)))?
        .to_vec();
    Ok(UploadedFile {
        data,
        filename,
        content_type,
    })
}

/// Set or unset a catalog as featured. Accepts JSON `{"value": true|false}`;
/// an omitted body defaults to true. Never touches other entries' flags.
pub async fn set_catalog_stack(
    State(state): State<AppState>,
    Path(catalog_id): Path<i32>,
    body: Option<Json<serde_json::Value>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let value = coerce_flag(body.as_ref().and_then(|Json(v)| v.get("value")));

    let entry = state.db.catalogs.set_stack(catalog_id, value).await?;
    let (size, last_modified) = blob_props(&state, &entry.url_catalogo).await;
    let payload = serialize_catalog(&entry, size, last_modified);

    let message = if value {
        "Marcado como destacado."
    } else {
        "Destacado desactivado."
    };
    Ok(Json(serde_json::json!({
        "message": message,
        "catalog": payload,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(id: i32, stack: bool) -> CatalogEntry {
        CatalogEntry {
            catalog_id: id,
            created_at: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
            catalog_name: format!("Catálogo {}", id),
            description: "Temporada".to_string(),
            collection: None,
            stack,
            url_catalogo: "https://blobs.example.com/blobcatalogos/catalogs/a.pdf".to_string(),
            url_portada: None,
            url_cartula: None,
        }
    }

    #[test]
    fn test_serialize_prefers_external_cover() {
        let mut e = entry(1, false);
        e.url_portada = Some("portada.png".to_string());
        e.url_cartula = Some("cartula.png".to_string());
        assert_eq!(serialize_catalog(&e, None, None).cover_url, "cartula.png");

        e.url_cartula = None;
        assert_eq!(serialize_catalog(&e, None, None).cover_url, "portada.png");

        e.url_portada = None;
        assert_eq!(serialize_catalog(&e, None, None).cover_url, "");
    }

    #[test]
    fn test_serialized_stack_flags_are_independent() {
        // Featuring B must not unflag A: both serialize featured.
        let a = serialize_catalog(&entry(1, true), None, None);
        let b = serialize_catalog(&entry(2, true), None, None);
        assert!(a.stack && b.stack);
    }

    #[test]
    fn test_parse_bool_flag() {
        for truthy in ["1", "true", "on", "yes", "TRUE", " Yes "] {
            assert!(parse_bool_flag(truthy), "{truthy} should be truthy");
        }
        for falsy in ["0", "false", "off", "no", "", "si"] {
            assert!(!parse_bool_flag(falsy), "{falsy} should be falsy");
        }
    }

    #[test]
    fn test_coerce_flag_defaults_to_true() {
        assert!(coerce_flag(None));
        assert!(coerce_flag(Some(&serde_json::Value::Null)));
        assert!(coerce_flag(Some(&serde_json::json!(true))));
        assert!(!coerce_flag(Some(&serde_json::json!(false))));
        assert!(coerce_flag(Some(&serde_json::json!("yes"))));
        assert!(!coerce_flag(Some(&serde_json::json!("off"))));
    }
}
