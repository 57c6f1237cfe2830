// Column names and source-schema checks for sales records.
//
// Any column not named here is a passthrough field and travels to the
// output untouched.

use crate::error::{EtlError, Result};
use arrow::array::{ArrayRef, RecordBatch};
use arrow::datatypes::{DataType, Schema};

pub const SALE_DATETIME: &str = "sale_datetime";
pub const QUANTITY: &str = "quantity";
pub const REVENUE: &str = "revenue";

/// Derived partition columns, in partition order
pub const YEAR: &str = "year";
pub const MONTH: &str = "month";

/// Columns that must be non-null for a record to be retained
pub const REQUIRED_COLUMNS: [&str; 3] = [SALE_DATETIME, QUANTITY, REVENUE];
pub const PARTITION_COLUMNS: [&str; 2] = [YEAR, MONTH];

/// Look up a column by name, failing with a schema mismatch if absent.
pub fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch.column_by_name(name).ok_or_else(|| {
        EtlError::schema_mismatch(format!(
            "required column '{}' not found (available: {})",
            name,
            column_names(batch.schema_ref())
        ))
    })
}

/// Whether a column type can be read as a point in time.
pub fn is_temporal_source(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Timestamp(_, _)
            | DataType::Date32
            | DataType::Date64
            | DataType::Utf8
            | DataType::LargeUtf8
            | DataType::Utf8View
            | DataType::Null
    )
}

/// Whether a column type can be compared against zero.
pub fn is_numeric_source(data_type: &DataType) -> bool {
    data_type.is_numeric() || matches!(data_type, DataType::Null)
}

/// Check that a loaded table carries the three key columns with usable types.
///
/// An all-null column (inferred as `Null` from JSON) is accepted; its rows are
/// dropped by the null filter.
pub fn validate_source_schema(schema: &Schema) -> Result<()> {
    for name in REQUIRED_COLUMNS {
        let field = schema.field_with_name(name).map_err(|_| {
            EtlError::schema_mismatch(format!(
                "required column '{}' not found (available: {})",
                name,
                column_names(schema)
            ))
        })?;

        let ok = if name == SALE_DATETIME {
            is_temporal_source(field.data_type())
        } else {
            is_numeric_source(field.data_type())
        };

        if !ok {
            return Err(EtlError::schema_mismatch(format!(
                "column '{}' has unsupported type {}",
                name,
                field.data_type()
            )));
        }
    }

    Ok(())
}

fn column_names(schema: &Schema) -> String {
    schema
        .fields()
        .iter()
        .map(|f| f.name().as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
