//! Embedding provider implementation and Parquet ingestion.
use std::{fs::File, path::Path};

use arrow_array::{Array, FixedSizeListArray, RecordBatchReader};
use lineage_core::{ClusterAssignment, PointSet, TreeInput};
use parquet::{
    arrow::{ProjectionMask, arrow_reader::ParquetRecordBatchReaderBuilder},
    file::reader::ChunkReader,
};
use tracing::{debug, instrument};

use crate::{
    errors::EmbeddingProviderError,
    ingest::{append_fixed_size_list_values, append_labels, validate_fixed_size_list_field},
};

/// Names the Parquet columns that make up an embedding.
///
/// # Examples
/// ```
/// use lineage_providers_dense::EmbeddingColumns;
///
/// let columns = EmbeddingColumns::new("umap")
///     .with_labels("cluster")
///     .with_dimensions(vec![0, 1]);
/// assert_eq!(columns.coordinates(), "umap");
/// assert_eq!(columns.labels(), Some("cluster"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmbeddingColumns {
    coordinates: String,
    labels: Option<String>,
    names: Option<String>,
    dimensions: Option<Vec<usize>>,
}

impl EmbeddingColumns {
    /// Reads coordinates from the `FixedSizeList<Float32, D>` column `coordinates`.
    #[must_use]
    pub fn new(coordinates: impl Into<String>) -> Self {
        Self {
            coordinates: coordinates.into(),
            ..Self::default()
        }
    }

    /// Reads one cluster label per row from `column`.
    #[must_use]
    pub fn with_labels(mut self, column: impl Into<String>) -> Self {
        self.labels = Some(column.into());
        self
    }

    /// Reads one row name per row from `column`.
    #[must_use]
    pub fn with_names(mut self, column: impl Into<String>) -> Self {
        self.names = Some(column.into());
        self
    }

    /// Keeps only the given coordinate indices, in the given order.
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: Vec<usize>) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Returns the coordinate column.
    #[must_use]
    pub fn coordinates(&self) -> &str {
        &self.coordinates
    }

    /// Returns the label column, if any.
    #[must_use]
    pub fn labels(&self) -> Option<&str> {
        self.labels.as_deref()
    }

    /// Returns the row-name column, if any.
    #[must_use]
    pub fn names(&self) -> Option<&str> {
        self.names.as_deref()
    }

    /// Returns the requested dimension subset, if any.
    #[must_use]
    pub fn dimensions(&self) -> Option<&[usize]> {
        self.dimensions.as_deref()
    }

    fn projected(&self) -> Vec<&str> {
        let mut columns = vec![self.coordinates.as_str()];
        columns.extend(self.labels.as_deref());
        columns.extend(self.names.as_deref());
        columns
    }
}

/// Points and optional clusters read from a dense embedding.
#[derive(Debug)]
pub struct EmbeddingProvider {
    name: String,
    points: PointSet,
    clusters: Option<ClusterAssignment>,
}

impl EmbeddingProvider {
    /// Returns the provider name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the extracted points.
    #[must_use]
    pub fn points(&self) -> &PointSet {
        &self.points
    }

    /// Returns the extracted cluster assignment, if a label column was read.
    #[must_use]
    pub fn clusters(&self) -> Option<&ClusterAssignment> {
        self.clusters.as_ref()
    }

    /// Borrows the embedding as builder input.
    #[must_use]
    pub fn tree_input(&self) -> TreeInput<'_> {
        TreeInput::Points {
            points: &self.points,
            clusters: self.clusters.as_ref(),
        }
    }

    /// Consumes the provider, returning its points and clusters.
    #[must_use]
    pub fn into_parts(self) -> (PointSet, Option<ClusterAssignment>) {
        (self.points, self.clusters)
    }

    /// Loads unnamed, unclustered points from an Arrow [`FixedSizeListArray`].
    ///
    /// # Errors
    /// Returns an [`EmbeddingProviderError`] when the list is not a
    /// non-null `Float32` list or holds no rows.
    pub fn try_from_fixed_size_list(
        name: impl Into<String>,
        array: &FixedSizeListArray,
    ) -> Result<Self, EmbeddingProviderError> {
        let mut values = Vec::new();
        let dimension = append_fixed_size_list_values(array, None, 0, &mut values)?;
        let points = PointSet::from_row_major(array.len(), dimension, values)?;
        Ok(Self {
            name: name.into(),
            points,
            clusters: None,
        })
    }

    /// Loads an embedding from the Parquet file at `path`.
    ///
    /// # Errors
    /// Returns [`EmbeddingProviderError::Io`] when the file cannot be opened,
    /// plus every error of [`Self::try_from_parquet_reader`].
    pub fn try_from_parquet_path(
        name: impl Into<String>,
        path: impl AsRef<Path>,
        columns: &EmbeddingColumns,
    ) -> Result<Self, EmbeddingProviderError> {
        let file = File::open(path)?;
        Self::try_from_parquet_reader(name, file, columns)
    }

    /// Loads an embedding from a Parquet reader.
    ///
    /// # Errors
    /// Returns an [`EmbeddingProviderError`] when a column is missing or has
    /// the wrong type, a value is null, or the resulting points, names,
    /// labels or dimension subset fail core validation.
    #[instrument(
        name = "provider.parquet",
        err,
        skip(name, reader, columns),
        fields(column = %columns.coordinates()),
    )]
    pub fn try_from_parquet_reader<R>(
        name: impl Into<String>,
        reader: R,
        columns: &EmbeddingColumns,
    ) -> Result<Self, EmbeddingProviderError>
    where
        R: ChunkReader + Send + 'static,
    {
        let builder = ParquetRecordBatchReaderBuilder::try_new(reader)?;
        let mask = ProjectionMask::columns(builder.parquet_schema(), columns.projected());
        let reader = builder.with_projection(mask).build()?;
        let schema = reader.schema();
        let column_index = |column: &str| {
            schema
                .index_of(column)
                .map_err(|_| EmbeddingProviderError::ColumnNotFound {
                    column: column.to_owned(),
                })
        };
        let coordinate_index = column_index(columns.coordinates())?;
        let label_index = columns.labels().map(column_index).transpose()?;
        let name_index = columns.names().map(column_index).transpose()?;
        let dimension =
            validate_fixed_size_list_field(schema.field(coordinate_index), columns.coordinates())?;

        let mut values = Vec::new();
        let mut labels = Vec::new();
        let mut names = Vec::new();
        let mut rows = 0_usize;
        for batch in reader {
            let batch = batch?;
            let column_array = batch.column(coordinate_index);
            let list = column_array
                .as_any()
                .downcast_ref::<FixedSizeListArray>()
                .ok_or_else(|| EmbeddingProviderError::InvalidColumnType {
                    column: columns.coordinates().to_owned(),
                    actual: column_array.data_type().clone(),
                })?;
            append_fixed_size_list_values(list, Some(dimension), rows, &mut values)?;
            if let (Some(index), Some(column)) = (label_index, columns.labels()) {
                append_labels(batch.column(index).as_ref(), column, rows, &mut labels)?;
            }
            if let (Some(index), Some(column)) = (name_index, columns.names()) {
                append_labels(batch.column(index).as_ref(), column, rows, &mut names)?;
            }
            rows += list.len();
        }

        let mut points = PointSet::from_row_major(rows, dimension, values)?;
        if name_index.is_some() {
            points = points.with_row_names(names)?;
        }
        if let Some(dimensions) = columns.dimensions() {
            points = points.select_dimensions(dimensions)?;
        }
        let clusters = label_index.map(|_| ClusterAssignment::Hard(labels));
        debug!(
            rows,
            dimension = points.dimension(),
            clustered = clusters.is_some(),
            "embedding loaded"
        );
        Ok(Self {
            name: name.into(),
            points,
            clusters,
        })
    }
}
