//! Ordered record-batch transforms.
//!
//! Every step is a pure function from one `RecordBatch` to another. A
//! [`Pipeline`] applies its steps in insertion order; the order is part of
//! the contract (nulls are removed before the timestamp is read).

mod enrich;
mod nulls;
mod quantity;

pub use enrich::{year_month, YearMonth};
pub use nulls::DropNulls;
pub use quantity::PositiveFilter;

use crate::error::Result;
use crate::schema::{QUANTITY, REQUIRED_COLUMNS, SALE_DATETIME};
use arrow::array::RecordBatch;

/// A named, pure transformation over a record batch.
pub trait Transform: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch>;
}

/// An ordered list of transforms.
#[derive(Default)]
pub struct Pipeline {
    steps: Vec<Box<dyn Transform>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step to the end of the pipeline.
    pub fn with_step<T: Transform + 'static>(mut self, step: T) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// The sales cleaning pipeline: drop incomplete records, keep positive
    /// quantities, then derive `year` and `month` from `sale_datetime`.
    pub fn sales_cleaning() -> Self {
        Self::new()
            .with_step(DropNulls::new(REQUIRED_COLUMNS))
            .with_step(PositiveFilter::new(QUANTITY))
            .with_step(YearMonth::new(SALE_DATETIME))
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order. Stops at the first failing step.
    pub fn run(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let mut batch = batch;
        for step in &self.steps {
            let rows_in = batch.num_rows();
            batch = step.apply(batch)?;
            tracing::debug!(
                step = step.name(),
                rows_in,
                rows_out = batch.num_rows(),
                "Applied transform"
            );
        }
        Ok(batch)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.step_names())
            .finish()
    }
}
