//! Typed domain records for the almacen backend.
//!
//! The storage layer maps every database row into one of these structs at the
//! query boundary; no dynamically-shaped rows travel past the `almacen-db`
//! crate. Numeric columns are normalized to `f64` there as well, so the wire
//! types below never carry arbitrary-precision decimals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filter::MaterialFilter;
use crate::sort::{SortDir, SortKey};

// =============================================================================
// MATERIALS
// =============================================================================

/// A material row from the provider-joined materials view.
///
/// Display fields are defaulted server-side ("Sin nombre", "Sin color", …)
/// so a blank column never reaches a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id_material: String,
    pub material_name: String,
    pub color: String,
    pub tipo: String,
    pub categoria: String,
    pub provider_name: String,
    pub unidad: String,
    pub costo_unitario: Option<f64>,
    pub imagen_name: String,
    pub storage_account: String,
    /// Derived: see [`Material::image_url_from`].
    pub image_url: String,
    pub stock_actual: f64,
}

impl Material {
    /// Resolve the public image URL for a material.
    ///
    /// An absolute `http(s)://` storage account value is used verbatim;
    /// otherwise account and image name are joined with `/` when both are
    /// present; otherwise the (possibly empty) account value is returned.
    pub fn image_url_from(storage_account: &str, imagen_name: &str) -> String {
        let account = storage_account.trim();
        let image = imagen_name.trim();
        let lower = account.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            account.to_string()
        } else if !account.is_empty() && !image.is_empty() {
            format!("{}/{}", account, image)
        } else {
            account.to_string()
        }
    }
}

/// A single inbound/outbound quantity event for a material.
///
/// `tipo` is free text; only the case-insensitive values "entrada" and
/// "salida" are classified for stock totals, anything else is preserved
/// but unclassified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    pub id_movimiento: i64,
    pub fecha: DateTime<Utc>,
    pub tipo: String,
    pub id_material: String,
    pub cantidad: f64,
    pub unidad: Option<String>,
    pub motivo: Option<String>,
    pub observaciones: Option<String>,
    pub funda: Option<String>,
}

/// Per-(material, movement-type) quantity total in a stock breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovementTypeTotal {
    pub tipo_movimiento: String,
    pub total_por_tipo: f64,
}

/// Current-stock summary for one material, derived fresh on every request.
///
/// Invariant: `stock_actual == total_entradas - total_salidas`, including
/// when the difference goes negative (inconsistent data is surfaced as-is).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockSummary {
    pub id_material: String,
    pub material_name: String,
    pub color: String,
    pub tipo: String,
    pub categoria: String,
    pub provider_name: String,
    pub total_entradas: f64,
    pub total_salidas: f64,
    pub stock_actual: f64,
    /// Always present; materials with zero movements get an empty list.
    pub movimientos_por_tipo: Vec<MovementTypeTotal>,
}

/// Distinct values per filterable field, for populating filter dropdowns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterOptions {
    pub material_name: Vec<String>,
    pub color: Vec<String>,
    pub tipo: Vec<String>,
    pub categoria: Vec<String>,
    pub provider_name: Vec<String>,
}

/// Parameters for the paginated materials listing.
#[derive(Debug, Clone)]
pub struct ListMaterialsRequest {
    pub filter: MaterialFilter,
    pub sort_by: SortKey,
    pub sort_dir: SortDir,
    /// 1-based; clamped to >= 1 by the listing service.
    pub page: i64,
    /// Clamped to [1, 200] by the listing service.
    pub per_page: i64,
}

/// One page of materials plus the window-independent total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMaterialsResponse {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub data: Vec<Material>,
}

// =============================================================================
// CATALOGS
// =============================================================================

/// A PDF catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub catalog_id: i32,
    pub created_at: DateTime<Utc>,
    pub catalog_name: String,
    pub description: String,
    pub collection: Option<String>,
    /// Featured flag, independent per entry: setting one entry's flag never
    /// clears another's. Many entries may be featured simultaneously.
    pub stack: bool,
    pub url_catalogo: String,
    /// Uploaded cover image, if any.
    pub url_portada: Option<String>,
    /// External cover image; preferred over `url_portada` when serializing.
    pub url_cartula: Option<String>,
}

/// Fields for inserting a new catalog entry.
#[derive(Debug, Clone)]
pub struct CreateCatalogEntry {
    pub catalog_name: String,
    pub description: String,
    pub collection: Option<String>,
    pub stack: bool,
    pub url_catalogo: String,
    pub url_portada: Option<String>,
    pub url_cartula: Option<String>,
}

// =============================================================================
// ATTACHED FILES
// =============================================================================

/// A file attached to a material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachedFile {
    pub archivo_id: i32,
    pub id_material: String,
    pub path: String,
    pub observacion: Option<String>,
    pub url_file: String,
    pub extension: Option<String>,
    /// Visibility flag; hidden files stay in storage but are not listed.
    pub stack: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a new attached-file record.
#[derive(Debug, Clone)]
pub struct CreateAttachedFile {
    pub id_material: String,
    pub path: String,
    pub observacion: Option<String>,
    pub url_file: String,
    pub extension: Option<String>,
}

// =============================================================================
// CHAT
// =============================================================================

/// A queued chat message held by the mailbox service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "bot" or "user"; anything else is coerced to "bot" on ingest.
    pub role: String,
    pub content: String,
    pub attachments: Vec<serde_json::Value>,
    /// Caller-supplied timestamp, or RFC 3339 now when absent.
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url_absolute_account_used_verbatim() {
        let url = Material::image_url_from("https://cdn.example.com/m5.png", "ignored.png");
        assert_eq!(url, "https://cdn.example.com/m5.png");

        let url = Material::image_url_from("HTTP://cdn.example.com/m5.png", "");
        assert_eq!(url, "HTTP://cdn.example.com/m5.png");
    }

    #[test]
    fn test_image_url_joined_when_both_present() {
        let url = Material::image_url_from("materialsacct", "m5.png");
        assert_eq!(url, "materialsacct/m5.png");
    }

    #[test]
    fn test_image_url_empty_when_image_missing() {
        assert_eq!(Material::image_url_from("materialsacct", ""), "materialsacct");
        assert_eq!(Material::image_url_from("", "m5.png"), "");
        assert_eq!(Material::image_url_from("  ", " "), "");
    }
}
