use super::Transform;
use crate::error::{EtlError, Result};
use crate::schema::{self, MONTH, YEAR};
use arrow::array::{Array, ArrayRef, AsArray, Int32Array, Int32Builder, RecordBatch};
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Field, Schema, TimeUnit, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType,
};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeDelta};
use std::sync::Arc;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Appends `year` and `month` columns derived from a timestamp column.
///
/// Existing `year`/`month` columns are replaced. Values are read in UTC.
#[derive(Debug, Clone)]
pub struct YearMonth {
    column: String,
}

impl YearMonth {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Transform for YearMonth {
    fn name(&self) -> &'static str {
        "year_month"
    }

    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let source = schema::column(&batch, &self.column)?;
        let (years, months) = year_month(&self.column, source.as_ref())?;
        with_columns(
            batch,
            [
                (YEAR, Arc::new(years) as ArrayRef),
                (MONTH, Arc::new(months) as ArrayRef),
            ],
        )
    }
}

/// Calendar year and month (1-12) of every value in `array`. Nulls stay null.
pub fn year_month(column: &str, array: &dyn Array) -> Result<(Int32Array, Int32Array)> {
    if !schema::is_temporal_source(array.data_type()) {
        return Err(EtlError::schema_mismatch(format!(
            "column '{}' cannot be read as a timestamp (type {})",
            column,
            array.data_type()
        )));
    }

    let nulls = array.logical_nulls();
    let mut years = Int32Builder::with_capacity(array.len());
    let mut months = Int32Builder::with_capacity(array.len());

    for row in 0..array.len() {
        if nulls.as_ref().is_some_and(|n| n.is_null(row)) {
            years.append_null();
            months.append_null();
            continue;
        }

        let date = date_at(column, array, row)?;
        years.append_value(date.year());
        months.append_value(date.month() as i32);
    }

    Ok((years.finish(), months.finish()))
}

fn date_at(column: &str, array: &dyn Array, row: usize) -> Result<NaiveDate> {
    match array.data_type() {
        DataType::Timestamp(unit, _) => {
            let raw = match unit {
                TimeUnit::Second => array.as_primitive::<TimestampSecondType>().value(row),
                TimeUnit::Millisecond => array.as_primitive::<TimestampMillisecondType>().value(row),
                TimeUnit::Microsecond => array.as_primitive::<TimestampMicrosecondType>().value(row),
                TimeUnit::Nanosecond => array.as_primitive::<TimestampNanosecondType>().value(row),
            };
            from_epoch(raw, *unit)
                .ok_or_else(|| EtlError::malformed_timestamp(column, row, raw.to_string()))
        }
        DataType::Date32 => {
            let days = array.as_primitive::<Date32Type>().value(row);
            TimeDelta::try_days(i64::from(days))
                .and_then(|delta| NaiveDate::default().checked_add_signed(delta))
                .ok_or_else(|| EtlError::malformed_timestamp(column, row, days.to_string()))
        }
        DataType::Date64 => {
            let millis = array.as_primitive::<Date64Type>().value(row);
            from_epoch(millis, TimeUnit::Millisecond)
                .ok_or_else(|| EtlError::malformed_timestamp(column, row, millis.to_string()))
        }
        DataType::Utf8 => parse_text(column, row, array.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => parse_text(column, row, array.as_string::<i64>().value(row)),
        DataType::Utf8View => parse_text(column, row, array.as_string_view().value(row)),
        other => Err(EtlError::schema_mismatch(format!(
            "column '{}' cannot be read as a timestamp (type {})",
            column, other
        ))),
    }
}

fn from_epoch(value: i64, unit: TimeUnit) -> Option<NaiveDate> {
    let dt = match unit {
        TimeUnit::Second => DateTime::from_timestamp(value, 0)?,
        TimeUnit::Millisecond => DateTime::from_timestamp_millis(value)?,
        TimeUnit::Microsecond => DateTime::from_timestamp_micros(value)?,
        TimeUnit::Nanosecond => DateTime::from_timestamp_nanos(value),
    };
    Some(dt.date_naive())
}

fn parse_text(column: &str, row: usize, text: &str) -> Result<NaiveDate> {
    parse_datetime(text).ok_or_else(|| EtlError::malformed_timestamp(column, row, text))
}

/// Parse the textual timestamp shapes found in raw sales exports.
///
/// Offsets are normalized to UTC; naive values are taken as UTC.
pub(crate) fn parse_datetime(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc().date());
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok())
}

fn with_columns<const N: usize>(
    batch: RecordBatch,
    columns: [(&str, ArrayRef); N],
) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    let mut arrays: Vec<ArrayRef> = batch.columns().to_vec();

    for (name, array) in columns {
        let field = Field::new(name, array.data_type().clone(), array.null_count() > 0);
        match fields.iter().position(|f| f.name() == name) {
            Some(i) => {
                fields[i] = field;
                arrays[i] = array;
            }
            None => {
                fields.push(field);
                arrays.push(array);
            }
        }
    }

    let schema = Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()));
    Ok(RecordBatch::try_new(schema, arrays)?)
}
