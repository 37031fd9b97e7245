//! Materials repository implementation.
//!
//! Listing runs two statements over the same compiled predicate: a window
//! query for the page slice and an independent COUNT for the total, so a
//! page past the end returns an empty slice with the true total.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;

use almacen_core::{
    defaults, Error, FilterOptions, ListMaterialsRequest, ListMaterialsResponse, Material,
    MaterialRepository, Movement, Result,
};

use crate::filter_sql::{FilterSource, MaterialFilterQueryBuilder, QueryParam};
use crate::numeric::{decimal_to_f64, decimal_to_f64_or_zero};

/// Select list over `vista_materiales_proveedores`, display-defaulted the
/// same way the filter expressions are so filters match what is shown.
const MATERIAL_COLUMNS: &str = r#"
    id_material,
    COALESCE(NULLIF(TRIM(material_name), ''), 'Sin nombre') AS material_name,
    COALESCE(NULLIF(TRIM(color), ''), 'Sin color') AS color,
    COALESCE(NULLIF(TRIM(tipo), ''), 'Sin tipo') AS tipo,
    COALESCE(NULLIF(TRIM(categoria), ''), 'Sin categoría') AS categoria,
    COALESCE(NULLIF(TRIM(proveedor), ''), 'Sin proveedor') AS provider_name,
    COALESCE(NULLIF(TRIM(unidad), ''), '') AS unidad,
    costo_unitario,
    COALESCE(NULLIF(TRIM(imagen_name), ''), '') AS imagen_name,
    COALESCE(NULLIF(TRIM(storage_account), ''), '') AS storage_account,
    COALESCE(stock_actual, 0) AS stock_actual"#;

/// Clamp the caller's pagination inputs and derive the window offset.
///
/// Page is 1-based and clamped to >= 1; per_page is clamped to
/// [1, PER_PAGE_MAX].
pub fn page_window(page: i64, per_page: i64) -> (i64, i64, i64) {
    let page = page.max(defaults::PAGE);
    let per_page = per_page.clamp(1, defaults::PER_PAGE_MAX);
    let offset = (page - 1) * per_page;
    (page, per_page, offset)
}

fn map_material_row(row: PgRow) -> Material {
    let imagen_name: String = row.get("imagen_name");
    let storage_account: String = row.get("storage_account");
    let image_url = Material::image_url_from(&storage_account, &imagen_name);

    Material {
        id_material: row.get("id_material"),
        material_name: row.get("material_name"),
        color: row.get("color"),
        tipo: row.get("tipo"),
        categoria: row.get("categoria"),
        provider_name: row.get("provider_name"),
        unidad: row.get("unidad"),
        costo_unitario: decimal_to_f64(row.get("costo_unitario")),
        imagen_name,
        storage_account,
        image_url,
        stock_actual: decimal_to_f64_or_zero(row.get("stock_actual")),
    }
}

/// PostgreSQL implementation of MaterialRepository.
#[derive(Clone)]
pub struct PgMaterialRepository {
    pool: Pool<Postgres>,
}

impl PgMaterialRepository {
    /// Create a new PgMaterialRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MaterialRepository for PgMaterialRepository {
    async fn list(&self, req: ListMaterialsRequest) -> Result<ListMaterialsResponse> {
        let (page, per_page, offset) = page_window(req.page, req.per_page);

        let builder = MaterialFilterQueryBuilder::new(req.filter, FilterSource::View, 0);
        let (where_sql, params) = builder.build_where();

        // Total over the same predicate, independent of the page window.
        let count_sql = format!(
            "SELECT COUNT(*) AS total FROM vista_materiales_proveedores {}",
            where_sql
        );
        let mut count_q = sqlx::query(&count_sql);
        for param in &params {
            count_q = match param {
                QueryParam::String(s) => count_q.bind(s),
                QueryParam::Int(v) => count_q.bind(v),
            };
        }
        let total: i64 = count_q
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?
            .get("total");

        // Secondary sort on the identifier keeps page boundaries
        // deterministic when the primary key has duplicate values.
        let data_sql = format!(
            "SELECT {} FROM vista_materiales_proveedores {} ORDER BY {} {}, id_material ASC LIMIT ${} OFFSET ${}",
            MATERIAL_COLUMNS,
            where_sql,
            req.sort_by.column(),
            req.sort_dir.sql(),
            params.len() + 1,
            params.len() + 2,
        );
        let mut data_q = sqlx::query(&data_sql);
        for param in &params {
            data_q = match param {
                QueryParam::String(s) => data_q.bind(s),
                QueryParam::Int(v) => data_q.bind(v),
            };
        }
        data_q = data_q.bind(per_page).bind(offset);

        let rows = data_q.fetch_all(&self.pool).await.map_err(Error::Database)?;
        let data: Vec<Material> = rows.into_iter().map(map_material_row).collect();

        debug!(
            subsystem = "db",
            component = "materials",
            op = "list",
            total,
            page,
            per_page,
            result_count = data.len(),
            "Materials page fetched"
        );

        Ok(ListMaterialsResponse {
            total,
            page,
            per_page,
            data,
        })
    }

    async fn get(&self, id: &str) -> Result<Option<Material>> {
        let sql = format!(
            "SELECT {} FROM vista_materiales_proveedores WHERE id_material = $1 LIMIT 1",
            MATERIAL_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(map_material_row))
    }

    async fn recent_movements(&self, id: &str, limit: i64) -> Result<Vec<Movement>> {
        let limit = if limit <= 0 {
            defaults::MOVEMENTS_LIMIT
        } else {
            limit
        };

        let rows = sqlx::query(
            r#"
            SELECT id_movimiento, fecha, tipo, id_material, cantidad,
                   unidad, motivo, observaciones, funda
            FROM vista_movimientos
            WHERE id_material = $1
            ORDER BY fecha DESC
            LIMIT $2
            "#,
        )
        .bind(id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| Movement {
                id_movimiento: row.get("id_movimiento"),
                fecha: row.get("fecha"),
                tipo: row.get("tipo"),
                id_material: row.get("id_material"),
                cantidad: decimal_to_f64_or_zero(row.get("cantidad")),
                unidad: row.get("unidad"),
                motivo: row.get("motivo"),
                observaciones: row.get("observaciones"),
                funda: row.get("funda"),
            })
            .collect())
    }

    async fn filter_options(&self) -> Result<FilterOptions> {
        use std::collections::BTreeSet;

        let rows = sqlx::query(
            r#"
            SELECT
                COALESCE(NULLIF(TRIM(m.material_name), ''), 'Sin nombre') AS material_name,
                COALESCE(NULLIF(TRIM(m.color), ''), 'Sin color') AS color,
                COALESCE(NULLIF(TRIM(m.tipo), ''), 'Sin tipo') AS tipo,
                COALESCE(NULLIF(TRIM(m.categoria), ''), 'Sin categoría') AS categoria,
                COALESCE(p.nombre_empresa, 'Sin proveedor') AS provider_name
            FROM tbl_materiales m
            LEFT JOIN tbl_proveedores p ON m.proveedor = p.id_proveedor
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut material_name = BTreeSet::new();
        let mut color = BTreeSet::new();
        let mut tipo = BTreeSet::new();
        let mut categoria = BTreeSet::new();
        let mut provider_name = BTreeSet::new();

        for row in rows {
            material_name.insert(row.get::<String, _>("material_name"));
            color.insert(row.get::<String, _>("color"));
            tipo.insert(row.get::<String, _>("tipo"));
            categoria.insert(row.get::<String, _>("categoria"));
            provider_name.insert(row.get::<String, _>("provider_name"));
        }

        Ok(FilterOptions {
            material_name: material_name.into_iter().collect(),
            color: color.into_iter().collect(),
            tipo: tipo.into_iter().collect(),
            categoria: categoria.into_iter().collect(),
            provider_name: provider_name.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_defaults_and_offsets() {
        assert_eq!(page_window(1, 20), (1, 20, 0));
        assert_eq!(page_window(2, 20), (2, 20, 20));
        assert_eq!(page_window(3, 7), (3, 7, 14));
    }

    #[test]
    fn test_page_window_clamps_page() {
        assert_eq!(page_window(0, 20), (1, 20, 0));
        assert_eq!(page_window(-5, 20), (1, 20, 0));
    }

    #[test]
    fn test_page_window_clamps_per_page() {
        assert_eq!(page_window(1, 0), (1, 1, 0));
        assert_eq!(page_window(1, -1), (1, 1, 0));
        assert_eq!(page_window(1, 10_000), (1, 200, 0));
        assert_eq!(page_window(2, 10_000), (2, 200, 200));
    }

    #[test]
    fn test_page_windows_partition_a_result_set() {
        // Windows for per_page 1, 7 and 200 must tile [0, total) without
        // gaps or overlap; a window past the end starts at/after total.
        let total: i64 = 20;
        for per_page in [1_i64, 7, 200] {
            let mut covered = 0;
            let mut page = 1;
            loop {
                let (_, size, offset) = page_window(page, per_page);
                assert_eq!(offset, (page - 1) * size);
                if offset >= total {
                    break;
                }
                covered += (total - offset).min(size);
                page += 1;
            }
            assert_eq!(covered, total);
        }
    }

    #[test]
    fn test_window_past_the_end_is_empty_not_an_error() {
        // 20 matching rows, page 2 of 20-per-page: offset lands exactly at
        // the total, so the slice is empty while the count stays 20.
        let (_, per_page, offset) = page_window(2, 20);
        let total = 20;
        assert!(offset >= total);
        assert_eq!(per_page, 20);
    }
}
