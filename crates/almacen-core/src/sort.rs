//! Sort whitelist for the materials listing.
//!
//! Caller-supplied sort names are mapped through a closed enum; anything
//! unrecognized silently falls back to identifier ordering. Raw input never
//! reaches the query layer.

/// Whitelisted sort keys for the materials listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Id,
    Stock,
    Name,
    Cost,
}

impl SortKey {
    /// Parse a caller-supplied sort name. Unknown input falls back to `Id`.
    pub fn parse(raw: &str) -> SortKey {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stock" => SortKey::Stock,
            "name" => SortKey::Name,
            "cost" => SortKey::Cost,
            "id" => SortKey::Id,
            _ => SortKey::Id,
        }
    }

    /// Column expression over `vista_materiales_proveedores`.
    pub fn column(&self) -> &'static str {
        match self {
            SortKey::Id => "id_material",
            SortKey::Stock => "stock_actual",
            SortKey::Name => "material_name",
            SortKey::Cost => "costo_unitario",
        }
    }
}

/// Sort direction; anything other than "desc" is ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn parse(raw: &str) -> SortDir {
        if raw.trim().eq_ignore_ascii_case("desc") {
            SortDir::Desc
        } else {
            SortDir::Asc
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}
