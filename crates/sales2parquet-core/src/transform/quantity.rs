use super::Transform;
use crate::error::{EtlError, Result};
use crate::schema;
use arrow::array::{Float64Array, RecordBatch};
use arrow::compute::kernels::cmp::gt;
use arrow::compute::{cast, filter_record_batch};
use arrow::datatypes::DataType;

/// Keeps rows whose value in `column` is strictly greater than zero.
///
/// Nulls never pass.
#[derive(Debug, Clone)]
pub struct PositiveFilter {
    column: String,
}

impl PositiveFilter {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Transform for PositiveFilter {
    fn name(&self) -> &'static str {
        "positive_quantity"
    }

    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let values = schema::column(&batch, &self.column)?;

        if !schema::is_numeric_source(values.data_type()) {
            return Err(EtlError::schema_mismatch(format!(
                "column '{}' must be numeric, found {}",
                self.column,
                values.data_type()
            )));
        }

        let as_float = cast(values, &DataType::Float64)?;
        let mask = gt(&as_float, &Float64Array::new_scalar(0.0))?;
        Ok(filter_record_batch(&batch, &mask)?)
    }
}
