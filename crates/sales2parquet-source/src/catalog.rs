//! Catalog lookup: from a `database.table` name to a storage location.

use async_trait::async_trait;
use sales2parquet_config::{CatalogConfig, TableFormat};
use sales2parquet_core::{EtlError, Result};
use std::collections::BTreeMap;

/// Fully qualified catalog table name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableIdent {
    pub database: String,
    pub table: String,
}

impl TableIdent {
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
        }
    }
}

impl std::fmt::Display for TableIdent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.database, self.table)
    }
}

/// Where a table's files live relative to the storage root, and how they are encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLocation {
    pub location: String,
    pub format: TableFormat,
}

/// Resolves table names to locations.
///
/// Implementations backed by a remote metastore can slot in here; the job
/// only ever asks for one table.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn resolve(&self, ident: &TableIdent) -> Result<TableLocation>;
}

/// Catalog backed by the `[[catalog.tables]]` entries of the runtime config
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    tables: BTreeMap<TableIdent, TableLocation>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        config.tables.iter().fold(Self::new(), |catalog, t| {
            catalog.with_table(
                TableIdent::new(&t.database, &t.name),
                TableLocation {
                    location: t.location.clone(),
                    format: t.format,
                },
            )
        })
    }

    /// Register a table, replacing any previous entry with the same name.
    pub fn with_table(mut self, ident: TableIdent, location: TableLocation) -> Self {
        self.tables.insert(ident, location);
        self
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    async fn resolve(&self, ident: &TableIdent) -> Result<TableLocation> {
        self.tables.get(ident).cloned().ok_or_else(|| {
            EtlError::source_unavailable(ident.to_string(), "table is not registered in the catalog")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sales2parquet_core::ErrorCode;

    #[test]
    fn test_ident_display() {
        assert_eq!(TableIdent::new("zs-pharma-db", "raw").to_string(), "zs-pharma-db.raw");
    }

    #[tokio::test]
    async fn resolves_default_catalog() {
        let catalog = StaticCatalog::from_config(&CatalogConfig::default());
        assert_eq!(catalog.len(), 1);

        let location = catalog
            .resolve(&TableIdent::new("zs-pharma-db", "raw"))
            .await
            .unwrap();
        assert_eq!(location.location, "raw/sales/");
        assert_eq!(location.format, TableFormat::Parquet);
    }

    #[tokio::test]
    async fn unknown_table_is_source_unavailable() {
        let catalog = StaticCatalog::new();
        let err = catalog
            .resolve(&TableIdent::new("zs-pharma-db", "missing"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::E001SourceUnavailable);
        assert!(err.to_string().contains("zs-pharma-db.missing"));
    }
}
