use super::Transform;
use crate::error::Result;
use crate::schema;
use arrow::array::{Array, AsArray, BooleanArray, RecordBatch};
use arrow::compute::{and, filter_record_batch, is_not_null};
use arrow::datatypes::{DataType, Float16Type, Float32Type, Float64Type};

/// Drops every row holding a null in any of the listed columns.
///
/// Floating-point NaN counts as missing, matching dataframe `dropna`.
#[derive(Debug, Clone)]
pub struct DropNulls {
    columns: Vec<String>,
}

impl DropNulls {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

impl Transform for DropNulls {
    fn name(&self) -> &'static str {
        "drop_nulls"
    }

    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let mut keep: Option<BooleanArray> = None;

        for name in &self.columns {
            let present = present_mask(schema::column(&batch, name)?.as_ref())?;
            keep = Some(match keep {
                Some(k) => and(&k, &present)?,
                None => present,
            });
        }

        match keep {
            Some(mask) if mask.true_count() < batch.num_rows() => {
                Ok(filter_record_batch(&batch, &mask)?)
            }
            _ => Ok(batch),
        }
    }
}

/// True where the value is present and, for floats, not NaN.
fn present_mask(array: &dyn Array) -> Result<BooleanArray> {
    let mask = match array.data_type() {
        DataType::Float64 => {
            let values = array.as_primitive::<Float64Type>();
            (0..values.len())
                .map(|i| Some(values.is_valid(i) && !values.value(i).is_nan()))
                .collect()
        }
        DataType::Float32 => {
            let values = array.as_primitive::<Float32Type>();
            (0..values.len())
                .map(|i| Some(values.is_valid(i) && !values.value(i).is_nan()))
                .collect()
        }
        DataType::Float16 => {
            let values = array.as_primitive::<Float16Type>();
            (0..values.len())
                .map(|i| Some(values.is_valid(i) && !values.value(i).is_nan()))
                .collect()
        }
        _ => is_not_null(array)?,
    };
    Ok(mask)
}
