use std::{convert::TryFrom, sync::Arc};

use arrow_array::{ArrayRef, FixedSizeListArray, Float32Array, RecordBatch};
use arrow_schema::{DataType, Field, Schema};
use bytes::Bytes;
use parquet::arrow::arrow_writer::ArrowWriter;

pub(crate) fn build_list_array(
    rows: &[Vec<f32>],
    dimension: usize,
    child_nullable: bool,
) -> FixedSizeListArray {
    assert!(rows.iter().all(|row| row.len() == dimension));
    let values = Float32Array::from_iter_values(rows.iter().flatten().copied());
    FixedSizeListArray::new(
        Arc::new(Field::new("item", DataType::Float32, child_nullable)),
        i32::try_from(dimension).expect("dimension fits in i32"),
        Arc::new(values) as ArrayRef,
        None,
    )
}

pub(crate) fn coordinates(rows: &[[f32; 2]]) -> FixedSizeListArray {
    let rows = rows.iter().map(|row| row.to_vec()).collect::<Vec<_>>();
    build_list_array(&rows, 2, false)
}

pub(crate) fn coordinate_field(dimension: usize, child_nullable: bool, list_nullable: bool) -> Field {
    Field::new(
        "umap",
        DataType::FixedSizeList(
            Arc::new(Field::new("item", DataType::Float32, child_nullable)),
            i32::try_from(dimension).expect("dimension fits in i32"),
        ),
        list_nullable,
    )
}

/// Writes each batch of `columns` as its own record batch.
pub(crate) fn write_parquet(fields: Vec<Field>, batches: Vec<Vec<ArrayRef>>) -> Bytes {
    let schema = Arc::new(Schema::new(fields));
    let mut buffer = Vec::new();
    {
        let mut writer =
            ArrowWriter::try_new(&mut buffer, Arc::clone(&schema), None).expect("writer");
        for columns in batches {
            let batch = RecordBatch::try_new(Arc::clone(&schema), columns).expect("batch");
            writer.write(&batch).expect("write");
        }
        writer.close().expect("close");
    }
    Bytes::from(buffer)
}

/// Two clusters of two points each, with string labels and names.
pub(crate) fn labelled_embedding() -> Bytes {
    write_parquet(
        vec![
            coordinate_field(2, false, false),
            Field::new("cluster", DataType::Utf8, false),
            Field::new("cell", DataType::Utf8, false),
        ],
        vec![vec![
            Arc::new(coordinates(&[[0.0, 0.0], [0.0, 2.0], [8.0, 0.0], [8.0, 2.0]])) as ArrayRef,
            Arc::new(arrow_array::StringArray::from(vec!["a", "a", "b", "b"])) as ArrayRef,
            Arc::new(arrow_array::StringArray::from(vec!["c0", "c1", "c2", "c3"])) as ArrayRef,
        ]],
    )
}
