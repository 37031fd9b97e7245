//! Materials, stock, and filter-options HTTP handlers.
//!
//! Filter parameters arrive repeated or comma-joined, so these handlers
//! extract the raw (key, value) pairs and hand them to the core normalizer
//! instead of deserializing into a map that would drop repeats.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use almacen_core::{
    defaults, FilterOptions, ListMaterialsRequest, ListMaterialsResponse, Material,
    MaterialFilter, MaterialRepository, Movement, SortDir, SortKey, StockRepository,
    StockSummary,
};

use crate::{ApiError, AppState};

/// Last occurrence of a scalar query parameter.
fn last_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Provide filter options for the frontend.
pub async fn filter_options(
    State(state): State<AppState>,
) -> Result<Json<FilterOptions>, ApiError> {
    Ok(Json(state.db.materials.filter_options().await?))
}

/// Return the stock summary with optional filters.
pub async fn stock_summary(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<StockSummary>>, ApiError> {
    let filter = MaterialFilter::from_pairs(&pairs);
    Ok(Json(state.db.stock.summary(&filter).await?))
}

/// Return one page of the materials listing.
pub async fn list_materials(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<ListMaterialsResponse>, ApiError> {
    let filter = MaterialFilter::from_pairs(&pairs);
    let sort_by = SortKey::parse(last_value(&pairs, "sort_by").unwrap_or("cost"));
    let sort_dir = SortDir::parse(last_value(&pairs, "sort_dir").unwrap_or("asc"));
    let page = last_value(&pairs, "page")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults::PAGE);
    let per_page = last_value(&pairs, "per_page")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults::PER_PAGE);

    info!(
        subsystem = "api",
        component = "materials",
        op = "list",
        sort_by = ?sort_by,
        sort_dir = ?sort_dir,
        page,
        per_page,
        "materials.list query"
    );

    let response = state
        .db
        .materials
        .list(ListMaterialsRequest {
            filter,
            sort_by,
            sort_dir,
            page,
            per_page,
        })
        .await?;
    Ok(Json(response))
}

/// Return a single material (for the detail modal header).
pub async fn material_detail(
    State(state): State<AppState>,
    Path(material_id): Path<String>,
) -> Result<Json<Material>, ApiError> {
    state
        .db
        .materials
        .get(material_id.trim())
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Material no encontrado".to_string()))
}

#[derive(Debug, Deserialize)]
pub struct MovementsQuery {
    pub limit: Option<i64>,
}

/// Return the most recent movements for a material, newest first.
pub async fn material_movements(
    State(state): State<AppState>,
    Path(material_id): Path<String>,
    Query(query): Query<MovementsQuery>,
) -> Result<Json<Vec<Movement>>, ApiError> {
    let limit = query.limit.unwrap_or(defaults::MOVEMENTS_LIMIT);
    let movements = state
        .db
        .materials
        .recent_movements(material_id.trim(), limit)
        .await?;
    Ok(Json(movements))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_last_value_takes_final_occurrence() {
        let raw = pairs(&[("page", "1"), ("page", "3")]);
        assert_eq!(last_value(&raw, "page"), Some("3"));
        assert_eq!(last_value(&raw, "per_page"), None);
    }

    #[test]
    fn test_listing_defaults() {
        let raw = pairs(&[("color", "Rojo")]);
        assert_eq!(
            SortKey::parse(last_value(&raw, "sort_by").unwrap_or("cost")),
            SortKey::Cost
        );
        assert_eq!(
            SortDir::parse(last_value(&raw, "sort_dir").unwrap_or("asc")),
            SortDir::Asc
        );
    }
}
