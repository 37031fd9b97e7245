//! Stock aggregation repository.
//!
//! Current stock is never persisted: every request recomputes it from the
//! movements source. Movement types are classified case-insensitively —
//! "entrada" adds, "salida" subtracts, anything else is kept in the
//! per-type breakdown but ignored by the two totals.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;

use almacen_core::{
    Error, MaterialFilter, MovementTypeTotal, Result, StockRepository, StockSummary,
};

use crate::filter_sql::{FilterSource, MaterialFilterQueryBuilder, QueryParam};
use crate::numeric::decimal_to_f64_or_zero;

/// Derived current stock. May legitimately go negative when the movement
/// data is inconsistent; the value is surfaced as-is, never corrected.
pub fn current_stock(total_entradas: f64, total_salidas: f64) -> f64 {
    total_entradas - total_salidas
}

/// Decode the json_agg breakdown column. Materials without movements carry
/// an empty array, not a missing one.
pub fn parse_breakdown(value: serde_json::Value) -> Result<Vec<MovementTypeTotal>> {
    Ok(serde_json::from_value(value)?)
}

/// PostgreSQL implementation of StockRepository.
#[derive(Clone)]
pub struct PgStockRepository {
    pool: Pool<Postgres>,
}

impl PgStockRepository {
    /// Create a new PgStockRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StockRepository for PgStockRepository {
    async fn summary(&self, filter: &MaterialFilter) -> Result<Vec<StockSummary>> {
        let builder =
            MaterialFilterQueryBuilder::new(filter.clone(), FilterSource::Joined, 0);
        let (where_sql, params) = builder.build_where();

        let sql = format!(
            r#"
            WITH movement_totals AS (
                SELECT
                    id_material,
                    SUM(CASE WHEN LOWER(tipo) = 'entrada' THEN cantidad ELSE 0 END) AS total_entradas,
                    SUM(CASE WHEN LOWER(tipo) = 'salida' THEN cantidad ELSE 0 END) AS total_salidas
                FROM vista_movimientos_materiales
                GROUP BY id_material
            ),
            movement_history AS (
                SELECT
                    id_material,
                    tipo,
                    SUM(cantidad) AS total_por_tipo
                FROM vista_movimientos_materiales
                GROUP BY id_material, tipo
            )
            SELECT
                m.id_material,
                COALESCE(NULLIF(TRIM(m.material_name), ''), 'Sin nombre') AS material_name,
                COALESCE(NULLIF(TRIM(m.color), ''), 'Sin color') AS color,
                COALESCE(NULLIF(TRIM(m.tipo), ''), 'Sin tipo') AS tipo,
                COALESCE(NULLIF(TRIM(m.categoria), ''), 'Sin categoría') AS categoria,
                COALESCE(p.nombre_empresa, 'Sin proveedor') AS provider_name,
                COALESCE(mt.total_entradas, 0) AS total_entradas,
                COALESCE(mt.total_salidas, 0) AS total_salidas,
                COALESCE(json_agg(
                    json_build_object(
                        'tipo_movimiento', mh.tipo,
                        'total_por_tipo', mh.total_por_tipo
                    )
                    ORDER BY mh.tipo
                ) FILTER (WHERE mh.id_material IS NOT NULL), '[]'::json) AS movimientos_por_tipo
            FROM tbl_materiales m
            LEFT JOIN tbl_proveedores p ON m.proveedor = p.id_proveedor
            LEFT JOIN movement_totals mt ON m.id_material = mt.id_material
            LEFT JOIN movement_history mh ON m.id_material = mh.id_material
            {}
            GROUP BY
                m.id_material,
                m.material_name,
                m.color,
                m.tipo,
                m.categoria,
                p.nombre_empresa,
                mt.total_entradas,
                mt.total_salidas
            ORDER BY material_name
            "#,
            where_sql
        );

        let mut q = sqlx::query(&sql);
        for param in &params {
            q = match param {
                QueryParam::String(s) => q.bind(s),
                QueryParam::Int(v) => q.bind(v),
            };
        }

        let rows = q.fetch_all(&self.pool).await.map_err(Error::Database)?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            let total_entradas = decimal_to_f64_or_zero(row.get("total_entradas"));
            let total_salidas = decimal_to_f64_or_zero(row.get("total_salidas"));
            let breakdown = parse_breakdown(row.get("movimientos_por_tipo"))?;

            summaries.push(StockSummary {
                id_material: row.get("id_material"),
                material_name: row.get("material_name"),
                color: row.get("color"),
                tipo: row.get("tipo"),
                categoria: row.get("categoria"),
                provider_name: row.get("provider_name"),
                total_entradas,
                total_salidas,
                stock_actual: current_stock(total_entradas, total_salidas),
                movimientos_por_tipo: breakdown,
            });
        }

        debug!(
            subsystem = "db",
            component = "stock",
            op = "summary",
            result_count = summaries.len(),
            "Stock summary computed"
        );

        Ok(summaries)
    }
}
