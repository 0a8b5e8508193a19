//! Helpers for ingesting Arrow columns into dense buffers and label lists.
use arrow_array::{
    Array, FixedSizeListArray, Float32Array,
    cast::AsArray,
    types::{Int32Type, Int64Type},
};
use arrow_schema::{DataType, Field};

use crate::errors::EmbeddingProviderError;

pub(crate) fn validate_fixed_size_list_field(
    field: &Field,
    column: &str,
) -> Result<usize, EmbeddingProviderError> {
    match field.data_type() {
        DataType::FixedSizeList(child, width) => {
            if field.is_nullable() || child.is_nullable() {
                return Err(EmbeddingProviderError::NullableField {
                    column: column.to_owned(),
                    nullable_child: child.is_nullable(),
                });
            }
            if child.data_type() != &DataType::Float32 {
                return Err(EmbeddingProviderError::InvalidListValueType {
                    actual: child.data_type().clone(),
                });
            }
            dimension_from_width(*width)
        }
        other => Err(EmbeddingProviderError::InvalidColumnType {
            column: column.to_owned(),
            actual: other.clone(),
        }),
    }
}

/// Appends the rows of `array` to `out` as `f64`, returning the list width.
pub(crate) fn append_fixed_size_list_values(
    array: &FixedSizeListArray,
    expected_dimension: Option<usize>,
    start_row: usize,
    out: &mut Vec<f64>,
) -> Result<usize, EmbeddingProviderError> {
    let dimension = validate_fixed_size_list(array)?;
    if let Some(expected) = expected_dimension.filter(|&expected| expected != dimension) {
        return Err(EmbeddingProviderError::InconsistentBatchDimension {
            expected,
            actual: dimension,
        });
    }
    copy_list_values(array, dimension, start_row, out)?;
    Ok(dimension)
}

pub(crate) fn validate_fixed_size_list(
    array: &FixedSizeListArray,
) -> Result<usize, EmbeddingProviderError> {
    let value_type = array.value_type();
    if value_type != DataType::Float32 {
        return Err(EmbeddingProviderError::InvalidListValueType { actual: value_type });
    }
    dimension_from_width(array.value_length())
}

fn dimension_from_width(width: i32) -> Result<usize, EmbeddingProviderError> {
    usize::try_from(width)
        .ok()
        .filter(|&dimension| dimension > 0)
        .ok_or(EmbeddingProviderError::InvalidDimension { actual: width })
}

pub(crate) fn copy_list_values(
    array: &FixedSizeListArray,
    dimension: usize,
    start_row: usize,
    out: &mut Vec<f64>,
) -> Result<(), EmbeddingProviderError> {
    let rows = array.len();
    let additional = rows
        .checked_mul(dimension)
        .ok_or(EmbeddingProviderError::CapacityOverflow { rows, dimension })?;
    out.reserve(additional);
    for row_index in 0..rows {
        let absolute_row = start_row + row_index;
        if array.is_null(row_index) {
            return Err(EmbeddingProviderError::NullRow { row: absolute_row });
        }
        let row = array.value(row_index);
        let floats = row.as_any().downcast_ref::<Float32Array>().ok_or_else(|| {
            EmbeddingProviderError::InvalidListValueType {
                actual: row.data_type().clone(),
            }
        })?;
        if floats.len() != dimension {
            return Err(EmbeddingProviderError::InvalidRowLength {
                row: absolute_row,
                expected: dimension,
                actual: floats.len(),
            });
        }
        if let Some(value_index) = (0..dimension).find(|&index| floats.is_null(index)) {
            return Err(EmbeddingProviderError::NullValue {
                row: absolute_row,
                value_index,
            });
        }
        out.extend(floats.values().iter().map(|&value| f64::from(value)));
    }
    Ok(())
}

/// Appends the values of a string or integer column to `out` as labels.
pub(crate) fn append_labels(
    array: &dyn Array,
    column: &str,
    start_row: usize,
    out: &mut Vec<String>,
) -> Result<(), EmbeddingProviderError> {
    let invalid = || EmbeddingProviderError::InvalidLabelType {
        column: column.to_owned(),
        actual: array.data_type().clone(),
    };
    match array.data_type() {
        DataType::Utf8 => push_labels(
            array.as_string_opt::<i32>().ok_or_else(invalid)?.iter(),
            column,
            start_row,
            out,
        ),
        DataType::LargeUtf8 => push_labels(
            array.as_string_opt::<i64>().ok_or_else(invalid)?.iter(),
            column,
            start_row,
            out,
        ),
        DataType::Int32 => push_labels(
            array.as_primitive_opt::<Int32Type>().ok_or_else(invalid)?.iter(),
            column,
            start_row,
            out,
        ),
        DataType::Int64 => push_labels(
            array.as_primitive_opt::<Int64Type>().ok_or_else(invalid)?.iter(),
            column,
            start_row,
            out,
        ),
        _ => Err(invalid()),
    }
}

fn push_labels<I, T>(
    values: I,
    column: &str,
    start_row: usize,
    out: &mut Vec<String>,
) -> Result<(), EmbeddingProviderError>
where
    I: Iterator<Item = Option<T>>,
    T: ToString,
{
    for (offset, value) in values.enumerate() {
        let value = value.ok_or_else(|| EmbeddingProviderError::NullLabel {
            column: column.to_owned(),
            row: start_row + offset,
        })?;
        out.push(value.to_string());
    }
    Ok(())
}
