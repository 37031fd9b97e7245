//! Attached-files repository implementation.
//!
//! One canonical schema: the column is spelled `extension` and records are
//! written with a single INSERT … RETURNING. The legacy stored-procedure
//! path and the misspelled `extencion` column belong to a one-time
//! migration, not to runtime fallbacks.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, info};

use almacen_core::{AttachedFile, AttachmentRepository, CreateAttachedFile, Error, Result};

const FILE_COLUMNS: &str =
    "archivo_id, id_material, path, observacion, url_file, extension, stack, created_at";

fn map_file_row(row: PgRow) -> AttachedFile {
    AttachedFile {
        archivo_id: row.get("archivo_id"),
        id_material: row.get("id_material"),
        path: row.get("path"),
        observacion: row.get("observacion"),
        url_file: row.get("url_file"),
        extension: row.get("extension"),
        stack: row.get("stack"),
        created_at: row.get("created_at"),
    }
}

/// PostgreSQL implementation of AttachmentRepository.
#[derive(Clone)]
pub struct PgAttachmentRepository {
    pool: Pool<Postgres>,
}

impl PgAttachmentRepository {
    /// Create a new PgAttachmentRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttachmentRepository for PgAttachmentRepository {
    async fn insert(&self, req: CreateAttachedFile) -> Result<AttachedFile> {
        let sql = format!(
            "INSERT INTO tbl_files (id_material, path, observacion, url_file, extension, stack) \
             VALUES ($1, $2, $3, $4, $5, TRUE) \
             RETURNING {}",
            FILE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(&req.id_material)
            .bind(&req.path)
            .bind(&req.observacion)
            .bind(&req.url_file)
            .bind(&req.extension)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        let file = map_file_row(row);
        info!(
            subsystem = "db",
            component = "files",
            op = "insert",
            file_id = file.archivo_id,
            material_id = %file.id_material,
            "File record inserted"
        );
        Ok(file)
    }

    async fn list_for_material(&self, material_id: &str) -> Result<Vec<AttachedFile>> {
        let sql = format!(
            "SELECT {} FROM vw_files_attach WHERE id_material = $1 ORDER BY created_at DESC",
            FILE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(material_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.into_iter().map(map_file_row).collect())
    }

    async fn toggle_stack(&self, archivo_id: i32) -> Result<AttachedFile> {
        let sql = format!(
            "UPDATE tbl_files SET stack = NOT stack WHERE archivo_id = $1 RETURNING {}",
            FILE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(archivo_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::FileNotFound(archivo_id))?;

        let file = map_file_row(row);
        debug!(
            subsystem = "db",
            component = "files",
            op = "toggle_stack",
            file_id = archivo_id,
            stack = file.stack,
            "File stack flag toggled"
        );
        Ok(file)
    }
}
