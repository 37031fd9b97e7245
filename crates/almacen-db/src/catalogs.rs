//! Catalog repository implementation.
//!
//! The featured (`stack`) flag is strictly per-row: any number of entries
//! may be featured at once, and setting one entry's flag never resets
//! another's. The earlier single-featured policy is intentionally gone.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, info};

use almacen_core::{CatalogEntry, CatalogRepository, CreateCatalogEntry, Error, Result};

const CATALOG_COLUMNS: &str = "catalog_id, created_at, catalog_name, description, collection, \
                               stack, url_catalogo, url_portada, url_cartula";

fn map_catalog_row(row: PgRow) -> CatalogEntry {
    CatalogEntry {
        catalog_id: row.get("catalog_id"),
        created_at: row.get("created_at"),
        catalog_name: row.get("catalog_name"),
        description: row.get("description"),
        collection: row.get("collection"),
        stack: row.get("stack"),
        url_catalogo: row.get("url_catalogo"),
        url_portada: row.get("url_portada"),
        url_cartula: row.get("url_cartula"),
    }
}

/// PostgreSQL implementation of CatalogRepository.
#[derive(Clone)]
pub struct PgCatalogRepository {
    pool: Pool<Postgres>,
}

impl PgCatalogRepository {
    /// Create a new PgCatalogRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn create(&self, req: CreateCatalogEntry) -> Result<CatalogEntry> {
        if req.catalog_name.trim().is_empty() {
            return Err(Error::InvalidInput(
                "El nombre del catálogo es obligatorio.".to_string(),
            ));
        }
        if req.description.trim().is_empty() {
            return Err(Error::InvalidInput(
                "La descripción es obligatoria.".to_string(),
            ));
        }

        let sql = format!(
            "INSERT INTO tbl_catalogo \
             (catalog_name, description, collection, stack, url_catalogo, url_portada, url_cartula) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {}",
            CATALOG_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(req.catalog_name.trim())
            .bind(req.description.trim())
            .bind(&req.collection)
            .bind(req.stack)
            .bind(&req.url_catalogo)
            .bind(&req.url_portada)
            .bind(&req.url_cartula)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        let entry = map_catalog_row(row);
        info!(
            subsystem = "db",
            component = "catalogs",
            op = "create",
            catalog_id = entry.catalog_id,
            stack = entry.stack,
            "Catalog entry created"
        );
        Ok(entry)
    }

    async fn list(&self) -> Result<Vec<CatalogEntry>> {
        let sql = format!(
            "SELECT {} FROM tbl_catalogo ORDER BY created_at DESC, catalog_id DESC",
            CATALOG_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.into_iter().map(map_catalog_row).collect())
    }

    async fn set_stack(&self, catalog_id: i32, value: bool) -> Result<CatalogEntry> {
        // Single-row UPDATE: idempotent, and by construction unable to
        // touch any other entry's flag.
        let sql = format!(
            "UPDATE tbl_catalogo SET stack = $2 WHERE catalog_id = $1 RETURNING {}",
            CATALOG_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(catalog_id)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::CatalogNotFound(catalog_id))?;

        debug!(
            subsystem = "db",
            component = "catalogs",
            op = "set_stack",
            catalog_id,
            stack = value,
            "Catalog stack flag set"
        );
        Ok(map_catalog_row(row))
    }
}
