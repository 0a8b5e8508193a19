use arrow_schema::{ArrowError, DataType};
use lineage_core::LineageError;
use thiserror::Error;

/// Errors raised while reading embeddings from Arrow or Parquet.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EmbeddingProviderError {
    /// The requested column is missing from the schema.
    #[error("column `{column}` not found in Parquet schema")]
    ColumnNotFound { column: String },
    /// The coordinate column is not a fixed-size list.
    #[error("column `{column}` must be a FixedSizeList<Float32, _> but found {actual:?}")]
    InvalidColumnType { column: String, actual: DataType },
    /// The fixed-size list does not hold `Float32` values.
    #[error("FixedSizeList child type must be Float32 but found {actual:?}")]
    InvalidListValueType { actual: DataType },
    /// The coordinate column or its values are declared nullable.
    #[error("column `{column}` must be non-nullable (nullable child: {nullable_child})")]
    NullableField { column: String, nullable_child: bool },
    /// The list width cannot be used as a dimension.
    #[error("invalid FixedSizeList dimension {actual}")]
    InvalidDimension { actual: i32 },
    /// A coordinate row is null.
    #[error("row {row} is null")]
    NullRow { row: usize },
    /// A coordinate value is null.
    #[error("row {row} contains null value at position {value_index}")]
    NullValue { row: usize, value_index: usize },
    /// A coordinate row has the wrong number of values.
    #[error("row {row} has length {actual} but expected {expected}")]
    InvalidRowLength {
        row: usize,
        expected: usize,
        actual: usize,
    },
    /// The coordinate buffer would overflow `usize`.
    #[error("matrix with {rows} rows and dimension {dimension} exceeds capacity limits")]
    CapacityOverflow { rows: usize, dimension: usize },
    /// Record batches disagree on the list width.
    #[error("inconsistent dimensions across batches: expected {expected}, got {actual}")]
    InconsistentBatchDimension { expected: usize, actual: usize },
    /// A label or name column has an unsupported type.
    #[error("column `{column}` must hold strings or integers but found {actual:?}")]
    InvalidLabelType { column: String, actual: DataType },
    /// A cluster label or row name is null.
    #[error("column `{column}` is null at row {row}")]
    NullLabel { column: String, row: usize },
    /// The extracted points or clusters failed core validation.
    #[error(transparent)]
    Core(#[from] LineageError),
    /// Arrow rejected the data.
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
    /// Parquet decoding failed.
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    /// The input file could not be read.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
