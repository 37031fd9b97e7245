//! Repository trait definitions.
//!
//! Storage implementations live in `almacen-db`; handlers depend on these
//! traits so the query layer stays swappable in tests.

use async_trait::async_trait;

use crate::filter::MaterialFilter;
use crate::models::{
    AttachedFile, CatalogEntry, CreateAttachedFile, CreateCatalogEntry, FilterOptions,
    ListMaterialsRequest, ListMaterialsResponse, Material, Movement, StockSummary,
};
use crate::Result;

/// Read access to the materials view.
#[async_trait]
pub trait MaterialRepository: Send + Sync {
    /// List materials with filtering, whitelisted sorting, and pagination.
    async fn list(&self, req: ListMaterialsRequest) -> Result<ListMaterialsResponse>;

    /// Fetch a single material by identifier.
    async fn get(&self, id: &str) -> Result<Option<Material>>;

    /// Most recent movements for a material, newest first.
    async fn recent_movements(&self, id: &str, limit: i64) -> Result<Vec<Movement>>;

    /// Distinct display values per filterable field, each list sorted.
    async fn filter_options(&self) -> Result<FilterOptions>;
}

/// Stock aggregation over the movements source.
#[async_trait]
pub trait StockRepository: Send + Sync {
    /// Per-material stock summary, optionally narrowed by a filter set.
    async fn summary(&self, filter: &MaterialFilter) -> Result<Vec<StockSummary>>;
}

/// Catalog entries and their featured flag.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Insert a new entry. Fails with `InvalidInput` when the name or
    /// description is blank.
    async fn create(&self, req: CreateCatalogEntry) -> Result<CatalogEntry>;

    /// All entries, newest first.
    async fn list(&self) -> Result<Vec<CatalogEntry>>;

    /// Set one entry's featured flag. Idempotent; never touches other rows.
    /// Fails with `CatalogNotFound` for an unknown id.
    async fn set_stack(&self, catalog_id: i32, value: bool) -> Result<CatalogEntry>;
}

/// Files attached to materials.
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    /// Insert a new file record (visible by default).
    async fn insert(&self, req: CreateAttachedFile) -> Result<AttachedFile>;

    /// All file records for a material, newest first.
    async fn list_for_material(&self, material_id: &str) -> Result<Vec<AttachedFile>>;

    /// Flip a file's visibility flag. Fails with `FileNotFound` for an
    /// unknown id.
    async fn toggle_stack(&self, archivo_id: i32) -> Result<AttachedFile>;
}
