//! Materials filter query builder.
//!
//! This module compiles a canonical [`MaterialFilter`] into a parameterized
//! SQL WHERE fragment: an AND across fields, each field an OR over its
//! values. Values only ever reach the query as bound parameters; column
//! expressions only ever come from the closed [`FilterField`] table. This is
//! the load-bearing injection boundary of the whole service.

use almacen_core::{FilterField, IdMatch, MaterialFilter};

use crate::escape_like;

/// Type-safe parameter binding for dynamically-assembled queries.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    /// String parameter (ILIKE patterns, identifiers).
    String(String),
    /// Integer parameter.
    Int(i64),
}

/// Which relation the filter is compiled against.
///
/// The listing queries read the denormalized view; the stock and
/// filter-options queries read the base tables joined to providers, where
/// the same logical fields live under different expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSource {
    /// `vista_materiales_proveedores` (unaliased view columns).
    View,
    /// `tbl_materiales m LEFT JOIN tbl_proveedores p` (aliased columns).
    Joined,
}

impl FilterSource {
    fn field_expr(&self, field: FilterField) -> &'static str {
        match self {
            FilterSource::View => field.view_expr(),
            FilterSource::Joined => field.joined_expr(),
        }
    }

    fn id_column(&self) -> &'static str {
        match self {
            FilterSource::View => "id_material",
            FilterSource::Joined => "m.id_material",
        }
    }
}

/// Generates a parameterized WHERE fragment from a [`MaterialFilter`].
///
/// # Example
///
/// ```rust
/// use almacen_core::{FilterField, MaterialFilter};
/// use almacen_db::{FilterSource, MaterialFilterQueryBuilder, QueryParam};
///
/// let mut filter = MaterialFilter::new();
/// filter.push(FilterField::Color, "Rojo");
///
/// let builder = MaterialFilterQueryBuilder::new(filter, FilterSource::View, 0);
/// let (sql, params) = builder.build();
/// assert_eq!(
///     sql,
///     "(COALESCE(NULLIF(TRIM(color), ''), 'Sin color') ILIKE $1)"
/// );
/// assert_eq!(params, vec![QueryParam::String("%Rojo%".to_string())]);
/// ```
pub struct MaterialFilterQueryBuilder {
    filter: MaterialFilter,
    source: FilterSource,
    param_offset: usize,
}

impl MaterialFilterQueryBuilder {
    /// Create a new builder.
    ///
    /// # Parameters
    ///
    /// * `filter` - The canonical filter set
    /// * `source` - Relation the fragment is compiled against
    /// * `param_offset` - Number of parameters already in the query
    pub fn new(filter: MaterialFilter, source: FilterSource, param_offset: usize) -> Self {
        Self {
            filter,
            source,
            param_offset,
        }
    }

    /// Build the WHERE fragment (without the `WHERE` keyword) and its bound
    /// parameters, in placeholder order.
    ///
    /// An empty filter compiles to an empty fragment: the caller emits no
    /// WHERE clause at all.
    pub fn build(&self) -> (String, Vec<QueryParam>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<QueryParam> = Vec::new();
        let mut param_idx = self.param_offset;

        // Identifier filter first: OR across values, each value either an
        // exact match or a right-aligned digit match against the zero-padded
        // identifier (a bare "5" finds M00005).
        if !self.filter.ids().is_empty() {
            let id_col = self.source.id_column();
            let mut ors = Vec::new();
            for id in self.filter.ids() {
                param_idx += 1;
                match id {
                    IdMatch::Suffix(digits) => {
                        ors.push(format!(
                            "RIGHT({}, CHAR_LENGTH(${})) = ${}",
                            id_col, param_idx, param_idx
                        ));
                        params.push(QueryParam::String(digits.clone()));
                    }
                    IdMatch::Exact(value) => {
                        ors.push(format!("{} = ${}", id_col, param_idx));
                        params.push(QueryParam::String(value.clone()));
                    }
                }
            }
            clauses.push(format!("({})", ors.join(" OR ")));
        }

        // Display-field filters: case-insensitive substring containment
        // against the placeholder-defaulted expression, OR within a field.
        for field in FilterField::ALL {
            let values = self.filter.values(field);
            if values.is_empty() {
                continue;
            }
            let expr = self.source.field_expr(field);
            let mut ors = Vec::new();
            for value in values {
                param_idx += 1;
                ors.push(format!("{} ILIKE ${}", expr, param_idx));
                params.push(QueryParam::String(format!("%{}%", escape_like(value))));
            }
            clauses.push(format!("({})", ors.join(" OR ")));
        }

        (clauses.join(" AND "), params)
    }

    /// Build a full `WHERE …` clause, or an empty string for an empty filter.
    pub fn build_where(&self) -> (String, Vec<QueryParam>) {
        let (fragment, params) = self.build();
        if fragment.is_empty() {
            (String::new(), params)
        } else {
            (format!("WHERE {}", fragment), params)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_compiles_to_no_where() {
        let builder =
            MaterialFilterQueryBuilder::new(MaterialFilter::new(), FilterSource::View, 0);
        let (sql, params) = builder.build();
        assert_eq!(sql, "");
        assert!(params.is_empty());

        let (where_sql, _) = builder.build_where();
        assert_eq!(where_sql, "");
    }

    #[test]
    fn test_single_field_single_value() {
        let mut filter = MaterialFilter::new();
        filter.push(FilterField::Color, "Rojo");

        let builder = MaterialFilterQueryBuilder::new(filter, FilterSource::View, 0);
        let (sql, params) = builder.build();

        assert_eq!(
            sql,
            "(COALESCE(NULLIF(TRIM(color), ''), 'Sin color') ILIKE $1)"
        );
        assert_eq!(params, vec![QueryParam::String("%Rojo%".to_string())]);
    }

    #[test]
    fn test_values_within_a_field_are_or_combined() {
        let mut filter = MaterialFilter::new();
        filter.push(FilterField::Tipo, "Tela");
        filter.push(FilterField::Tipo, "Cuero");

        let builder = MaterialFilterQueryBuilder::new(filter, FilterSource::View, 0);
        let (sql, params) = builder.build();

        assert_eq!(
            sql,
            "(COALESCE(NULLIF(TRIM(tipo), ''), 'Sin tipo') ILIKE $1 \
             OR COALESCE(NULLIF(TRIM(tipo), ''), 'Sin tipo') ILIKE $2)"
        );
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_fields_are_and_combined() {
        let mut filter = MaterialFilter::new();
        filter.push(FilterField::Color, "Rojo");
        filter.push(FilterField::Categoria, "Tapiz");

        let builder = MaterialFilterQueryBuilder::new(filter, FilterSource::View, 0);
        let (sql, params) = builder.build();

        assert!(sql.contains(" AND "));
        assert!(sql.contains("'Sin color'"));
        assert!(sql.contains("'Sin categoría'"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_numeric_id_compiles_to_suffix_match() {
        let mut filter = MaterialFilter::new();
        filter.push_id("5");

        let builder = MaterialFilterQueryBuilder::new(filter, FilterSource::View, 0);
        let (sql, params) = builder.build();

        assert_eq!(sql, "(RIGHT(id_material, CHAR_LENGTH($1)) = $1)");
        assert_eq!(params, vec![QueryParam::String("5".to_string())]);
    }

    #[test]
    fn test_non_numeric_id_compiles_to_exact_match() {
        let mut filter = MaterialFilter::new();
        filter.push_id("M00005");

        let builder = MaterialFilterQueryBuilder::new(filter, FilterSource::View, 0);
        let (sql, params) = builder.build();

        assert_eq!(sql, "(id_material = $1)");
        assert_eq!(params, vec![QueryParam::String("M00005".to_string())]);
    }

    #[test]
    fn test_mixed_ids_are_or_combined_before_field_clauses() {
        let mut filter = MaterialFilter::new();
        filter.push_id("5");
        filter.push_id("M00123");
        filter.push(FilterField::Color, "Azul");

        let builder = MaterialFilterQueryBuilder::new(filter, FilterSource::View, 0);
        let (sql, params) = builder.build();

        assert_eq!(
            sql,
            "(RIGHT(id_material, CHAR_LENGTH($1)) = $1 OR id_material = $2) \
             AND (COALESCE(NULLIF(TRIM(color), ''), 'Sin color') ILIKE $3)"
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_joined_source_uses_aliased_expressions() {
        let mut filter = MaterialFilter::new();
        filter.push(FilterField::ProviderName, "Acme");
        filter.push_id("7");

        let builder = MaterialFilterQueryBuilder::new(filter, FilterSource::Joined, 0);
        let (sql, _) = builder.build();

        assert!(sql.contains("m.id_material"));
        assert!(sql.contains("COALESCE(p.nombre_empresa, 'Sin proveedor')"));
    }

    #[test]
    fn test_param_offset() {
        let mut filter = MaterialFilter::new();
        filter.push(FilterField::Color, "Rojo");

        // Offset 5: as if five parameters already exist in the query.
        let builder = MaterialFilterQueryBuilder::new(filter, FilterSource::View, 5);
        let (sql, params) = builder.build();

        assert!(sql.contains("$6"));
        assert!(!sql.contains("$1"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_like_wildcards_in_values_are_escaped() {
        let mut filter = MaterialFilter::new();
        filter.push(FilterField::MaterialName, "50%_algodón");

        let builder = MaterialFilterQueryBuilder::new(filter, FilterSource::View, 0);
        let (_, params) = builder.build();

        assert_eq!(
            params,
            vec![QueryParam::String("%50\\%\\_algodón%".to_string())]
        );
    }

    #[test]
    fn test_build_where_prepends_keyword() {
        let mut filter = MaterialFilter::new();
        filter.push(FilterField::Color, "Rojo");

        let builder = MaterialFilterQueryBuilder::new(filter, FilterSource::View, 0);
        let (where_sql, _) = builder.build_where();
        assert!(where_sql.starts_with("WHERE ("));
    }

    /// Reference semantics check: the compiled predicate must accept exactly
    /// the rows an in-memory AND-of-ORs containment filter accepts.
    #[test]
    fn test_compiled_structure_matches_reference_filter() {
        struct Row {
            id: &'static str,
            color: &'static str,
            tipo: &'static str,
        }
        let rows = [
            Row { id: "M00001", color: "Rojo intenso", tipo: "Tela" },
            Row { id: "M00002", color: "Azul", tipo: "Tela" },
            Row { id: "M00005", color: "rojo", tipo: "Cuero" },
            Row { id: "X-9", color: "", tipo: "Sin tipo" },
        ];

        // Reference: color contains "rojo" (case-insensitive, blank → "Sin
        // color") AND tipo contains "tela".
        let reference: Vec<&str> = rows
            .iter()
            .filter(|r| {
                let color = if r.color.trim().is_empty() { "Sin color" } else { r.color };
                color.to_lowercase().contains("rojo") && r.tipo.to_lowercase().contains("tela")
            })
            .map(|r| r.id)
            .collect();
        assert_eq!(reference, ["M00001"]);

        // Compiled: same filter yields one ILIKE clause per field, AND-joined,
        // with containment patterns.
        let mut filter = MaterialFilter::new();
        filter.push(FilterField::Color, "rojo");
        filter.push(FilterField::Tipo, "tela");
        let (sql, params) =
            MaterialFilterQueryBuilder::new(filter, FilterSource::View, 0).build();

        assert_eq!(sql.matches("ILIKE").count(), 2);
        assert_eq!(sql.matches(" AND ").count(), 1);
        assert_eq!(
            params,
            vec![
                QueryParam::String("%rojo%".to_string()),
                QueryParam::String("%tela%".to_string()),
            ]
        );
    }
}
