// sales2parquet-source - Catalog resolution and table loading
//
// A table name is resolved to a storage location through a `Catalog`, then
// every data file at that location is decoded and concatenated.

pub mod catalog;
pub mod reader;

pub use catalog::{Catalog, StaticCatalog, TableIdent, TableLocation};
pub use reader::TableReader;

use arrow::array::RecordBatch;
use sales2parquet_core::Result;

/// Resolve `ident` and load the whole table.
pub async fn load_table(
    catalog: &dyn Catalog,
    reader: &TableReader,
    ident: &TableIdent,
) -> Result<RecordBatch> {
    let location = catalog.resolve(ident).await?;
    tracing::debug!(table = %ident, location = %location.location, format = %location.format, "Resolved table");
    reader.load(ident, &location).await
}
