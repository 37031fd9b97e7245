//! Canonical filter set for materials queries.
//!
//! Raw query parameters arrive either repeated (`?color=Rojo&color=Azul`) or
//! as a single comma-joined string (`?color=Rojo,Azul`, kept for backwards
//! compatibility with older clients). [`MaterialFilter::from_pairs`] turns
//! both shapes into one canonical list-of-values per field.
//!
//! The set of filterable fields is a closed enum: SQL expressions are only
//! ever selected from [`FilterField`], never assembled from caller-supplied
//! field names.

use serde::{Deserialize, Serialize};

/// The closed set of filterable material fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterField {
    MaterialName,
    Color,
    Tipo,
    Categoria,
    ProviderName,
}

impl FilterField {
    /// All fields, in the order they are serialized and filtered.
    pub const ALL: [FilterField; 5] = [
        FilterField::MaterialName,
        FilterField::Color,
        FilterField::Tipo,
        FilterField::Categoria,
        FilterField::ProviderName,
    ];

    /// Query-parameter key for this field.
    pub fn key(&self) -> &'static str {
        match self {
            FilterField::MaterialName => "material_name",
            FilterField::Color => "color",
            FilterField::Tipo => "tipo",
            FilterField::Categoria => "categoria",
            FilterField::ProviderName => "provider_name",
        }
    }

    /// Display expression over `vista_materiales_proveedores` (unaliased
    /// view columns). Blank values collapse to the "Sin <campo>" placeholder
    /// so filters match what clients are shown.
    pub fn view_expr(&self) -> &'static str {
        match self {
            FilterField::MaterialName => {
                "COALESCE(NULLIF(TRIM(material_name), ''), 'Sin nombre')"
            }
            FilterField::Color => "COALESCE(NULLIF(TRIM(color), ''), 'Sin color')",
            FilterField::Tipo => "COALESCE(NULLIF(TRIM(tipo), ''), 'Sin tipo')",
            FilterField::Categoria => "COALESCE(NULLIF(TRIM(categoria), ''), 'Sin categoría')",
            FilterField::ProviderName => "COALESCE(NULLIF(TRIM(proveedor), ''), 'Sin proveedor')",
        }
    }

    /// Display expression over the `tbl_materiales m LEFT JOIN
    /// tbl_proveedores p` source used by the stock and filter-options
    /// queries.
    pub fn joined_expr(&self) -> &'static str {
        match self {
            FilterField::MaterialName => {
                "COALESCE(NULLIF(TRIM(m.material_name), ''), 'Sin nombre')"
            }
            FilterField::Color => "COALESCE(NULLIF(TRIM(m.color), ''), 'Sin color')",
            FilterField::Tipo => "COALESCE(NULLIF(TRIM(m.tipo), ''), 'Sin tipo')",
            FilterField::Categoria => "COALESCE(NULLIF(TRIM(m.categoria), ''), 'Sin categoría')",
            FilterField::ProviderName => "COALESCE(p.nombre_empresa, 'Sin proveedor')",
        }
    }
}

/// One normalized identifier filter value.
///
/// Material identifiers are zero-padded strings (`M00005`), so a bare
/// numeric value matches the trailing digits — a user can search `5`
/// without knowing the padding width or prefix. Anything non-numeric is an
/// exact match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdMatch {
    /// All-digit input: right-aligned match of the same length.
    Suffix(String),
    /// Exact identifier match.
    Exact(String),
}

impl IdMatch {
    /// Classify one raw id value. Returns `None` for blank input.
    pub fn classify(raw: &str) -> Option<IdMatch> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }
        if value.chars().all(|c| c.is_ascii_digit()) {
            Some(IdMatch::Suffix(value.to_string()))
        } else {
            Some(IdMatch::Exact(value.to_string()))
        }
    }
}

/// Canonical per-field filter values, normalized and deduplicated.
#[derive(Debug, Clone, Default)]
pub struct MaterialFilter {
    material_name: Vec<String>,
    color: Vec<String>,
    tipo: Vec<String>,
    categoria: Vec<String>,
    provider_name: Vec<String>,
    ids: Vec<IdMatch>,
}

impl MaterialFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a canonical filter set from raw (key, value) query pairs.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut filter = MaterialFilter::new();
        for field in FilterField::ALL {
            let values = normalize_values(&collect_raw(pairs, field.key()));
            filter.set(field, values);
        }
        for raw in normalize_values(&collect_raw(pairs, "id")) {
            if let Some(id) = IdMatch::classify(&raw) {
                filter.ids.push(id);
            }
        }
        filter
    }

    /// Replace the values for one field with an already-normalized list.
    pub fn set(&mut self, field: FilterField, values: Vec<String>) {
        match field {
            FilterField::MaterialName => self.material_name = values,
            FilterField::Color => self.color = values,
            FilterField::Tipo => self.tipo = values,
            FilterField::Categoria => self.categoria = values,
            FilterField::ProviderName => self.provider_name = values,
        }
    }

    /// Add one raw value to a field, applying trim/blank/dedupe rules.
    pub fn push(&mut self, field: FilterField, raw: &str) {
        let value = raw.trim();
        if value.is_empty() {
            return;
        }
        let values = match field {
            FilterField::MaterialName => &mut self.material_name,
            FilterField::Color => &mut self.color,
            FilterField::Tipo => &mut self.tipo,
            FilterField::Categoria => &mut self.categoria,
            FilterField::ProviderName => &mut self.provider_name,
        };
        if !values.iter().any(|v| v == value) {
            values.push(value.to_string());
        }
    }

    /// Add one raw id value.
    pub fn push_id(&mut self, raw: &str) {
        if let Some(id) = IdMatch::classify(raw) {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    /// Values for one field, in first-seen order.
    pub fn values(&self, field: FilterField) -> &[String] {
        match field {
            FilterField::MaterialName => &self.material_name,
            FilterField::Color => &self.color,
            FilterField::Tipo => &self.tipo,
            FilterField::Categoria => &self.categoria,
            FilterField::ProviderName => &self.provider_name,
        }
    }

    /// Normalized identifier filters.
    pub fn ids(&self) -> &[IdMatch] {
        &self.ids
    }

    /// True when no field carries any value.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && FilterField::ALL.iter().all(|f| self.values(*f).is_empty())
    }
}

/// Collect all raw occurrences of one query key.
fn collect_raw(pairs: &[(String, String)], key: &str) -> Vec<String> {
    pairs
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
        .collect()
}

/// Normalize a raw value list: split a lone comma-joined value, trim, drop
/// blanks, and deduplicate preserving first-seen order.
pub fn normalize_values(raw: &[String]) -> Vec<String> {
    let parts: Vec<String> = if raw.len() == 1 && raw[0].contains(',') {
        raw[0].split(',').map(str::to_string).collect()
    } else {
        raw.to_vec()
    };

    let mut values: Vec<String> = Vec::new();
    for part in parts {
        let value = part.trim();
        if value.is_empty() {
            continue;
        }
        if !values.iter().any(|v| v == value) {
            values.push(value.to_string());
        }
    }
    values
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
    fn test_repeated_params_collected_in_order() {
        let filter = MaterialFilter::from_pairs(&pairs(&[
            ("color", "Rojo"),
            ("color", "Azul"),
            ("tipo", "Tela"),
        ]));
        assert_eq!(filter.values(FilterField::Color), ["Rojo", "Azul"]);
        assert_eq!(filter.values(FilterField::Tipo), ["Tela"]);
        assert!(filter.values(FilterField::Categoria).is_empty());
    }

    #[test]
    fn test_single_comma_joined_value_is_split() {
        let filter = MaterialFilter::from_pairs(&pairs(&[("color", "Rojo, Azul ,Verde")]));
        assert_eq!(filter.values(FilterField::Color), ["Rojo", "Azul", "Verde"]);
    }

    #[test]
    fn test_multiple_values_are_not_comma_split() {
        // Comma splitting is a back-compat rule for a *single* raw value only.
        let filter =
            MaterialFilter::from_pairs(&pairs(&[("color", "Rojo,Azul"), ("color", "Verde")]));
        assert_eq!(filter.values(FilterField::Color), ["Rojo,Azul", "Verde"]);
    }

    #[test]
    fn test_blank_values_dropped_and_dedupe_preserves_order() {
        let filter = MaterialFilter::from_pairs(&pairs(&[
            ("tipo", "  "),
            ("tipo", "Tela"),
            ("tipo", " Tela "),
            ("tipo", "Cuero"),
        ]));
        assert_eq!(filter.values(FilterField::Tipo), ["Tela", "Cuero"]);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let filter = MaterialFilter::from_pairs(&pairs(&[
            ("sort_by", "name"),
            ("page", "3"),
            ("color", "Rojo"),
        ]));
        assert_eq!(filter.values(FilterField::Color), ["Rojo"]);
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_id_digit_values_classify_as_suffix() {
        let filter = MaterialFilter::from_pairs(&pairs(&[("id", "5"), ("id", "M00005")]));
        assert_eq!(
            filter.ids(),
            [
                IdMatch::Suffix("5".to_string()),
                IdMatch::Exact("M00005".to_string())
            ]
        );
    }

    #[test]
    fn test_id_comma_joined_and_blank_handling() {
        let filter = MaterialFilter::from_pairs(&pairs(&[("id", "5, , 123,M1")]));
        assert_eq!(
            filter.ids(),
            [
                IdMatch::Suffix("5".to_string()),
                IdMatch::Suffix("123".to_string()),
                IdMatch::Exact("M1".to_string())
            ]
        );
    }

    #[test]
    fn test_empty_input_yields_empty_filter() {
        let filter = MaterialFilter::from_pairs(&[]);
        assert!(filter.is_empty());
        assert!(filter.ids().is_empty());
    }

    #[test]
    fn test_classify_blank_is_none() {
        assert_eq!(IdMatch::classify("   "), None);
        assert_eq!(IdMatch::classify(""), None);
    }
}
