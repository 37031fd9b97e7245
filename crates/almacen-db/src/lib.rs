//! # almacen-db
//!
//! PostgreSQL storage layer for the almacen inventory backend.
//!
//! This crate provides:
//! - Connection pool management
//! - The materials filter/predicate compiler (parameterized WHERE builder)
//! - Paginated, sorted materials listing
//! - Stock aggregation over the movements source
//! - Catalog entries with per-row featured flags
//! - Attached-file records
//!
//! ## Example
//!
//! ```rust,ignore
//! use almacen_core::{ListMaterialsRequest, MaterialFilter, MaterialRepository, SortDir, SortKey};
//! use almacen_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/almacen").await?;
//!
//!     let page = db.materials.list(ListMaterialsRequest {
//!         filter: MaterialFilter::new(),
//!         sort_by: SortKey::Cost,
//!         sort_dir: SortDir::Asc,
//!         page: 1,
//!         per_page: 20,
//!     }).await?;
//!
//!     println!("{} materials total", page.total);
//!     Ok(())
//! }
//! ```

pub mod catalogs;
pub mod files;
pub mod filter_sql;
pub mod materials;
pub mod numeric;
pub mod pool;
pub mod stock;

// Re-export core types
pub use almacen_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// Re-export repository implementations
pub use catalogs::PgCatalogRepository;
pub use files::PgAttachmentRepository;
pub use filter_sql::{FilterSource, MaterialFilterQueryBuilder, QueryParam};
pub use materials::{page_window, PgMaterialRepository};
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use stock::PgStockRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Materials listing and detail queries.
    pub materials: PgMaterialRepository,
    /// Stock aggregation queries.
    pub stock: PgStockRepository,
    /// Catalog entries and featured flags.
    pub catalogs: PgCatalogRepository,
    /// Files attached to materials.
    pub files: PgAttachmentRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            materials: PgMaterialRepository::new(pool.clone()),
            stock: PgStockRepository::new(pool.clone()),
            catalogs: PgCatalogRepository::new(pool.clone()),
            files: PgAttachmentRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
