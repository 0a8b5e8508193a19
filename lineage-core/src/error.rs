//! Error types for the lineage core library.
//!
//! Defines the error enum exposed by the public API, the coarse
//! [`ErrorKind`] taxonomy callers branch on, and a convenient result alias.

use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::mst::MstError;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Coarse classification of a [`LineageError`].
///
/// Every failure is fatal; the kind tells callers whether the input was
/// malformed, numerically degenerate, or whether the requested endpoint
/// constraints cannot be met.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// Bad or missing input shape.
    Configuration,
    /// Numerically degenerate input, such as a singular covariance sum.
    Numerical,
    /// No endpoint assignment satisfies the requested constraints.
    UnsatisfiableConstraint,
}

/// Error type produced while building a lineage graph.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum LineageError {
    /// The point set contained no rows.
    #[error("point set contains no rows")]
    EmptyPoints,
    /// Point rows must have positive dimension.
    #[error("points must have positive dimension")]
    ZeroDimension,
    /// Rows in the point set had different lengths.
    #[error("row {row} has dimension {actual} but expected {expected}")]
    RaggedPoints {
        /// Offending row index.
        row: usize,
        /// Dimension of the first row.
        expected: usize,
        /// Dimension of the offending row.
        actual: usize,
    },
    /// A coordinate was NaN or infinite.
    #[error("row {row} contains a non-finite coordinate at dimension {dimension}")]
    NonFiniteCoordinate {
        /// Offending row index.
        row: usize,
        /// Offending column index.
        dimension: usize,
    },
    /// A requested dimension index does not exist.
    #[error("dimension {requested} does not exist (points have {available} dimensions)")]
    DimensionNotFound {
        /// Requested column index.
        requested: usize,
        /// Number of columns available.
        available: usize,
    },
    /// Row names did not match the number of rows.
    #[error("expected {expected} row names but got {actual}")]
    RowNameCountMismatch {
        /// Number of rows in the point set.
        expected: usize,
        /// Number of names supplied.
        actual: usize,
    },
    /// The cluster assignment covers a different number of rows than the points.
    #[error("cluster assignment covers {actual} rows but the point set has {expected}")]
    AssignmentLengthMismatch {
        /// Number of rows in the point set.
        expected: usize,
        /// Number of rows in the assignment.
        actual: usize,
    },
    /// A soft assignment weight was negative, non-finite, or a row did not sum to one.
    #[error("soft assignment row {row} is invalid: {reason}")]
    InvalidWeights {
        /// Offending row index.
        row: usize,
        /// Human-readable description of the violation.
        reason: &'static str,
    },
    /// A cluster received no members or no positive weight.
    #[error("cluster `{cluster}` has no members")]
    EmptyCluster {
        /// Label of the empty cluster.
        cluster: Arc<str>,
    },
    /// Centroids were supplied directly but the rows carry no names.
    #[error("rows are used as centroids but carry no names")]
    UnnamedCentroids,
    /// Two clusters or centroids shared a label.
    #[error("label `{label}` appears more than once")]
    DuplicateLabel {
        /// The repeated label.
        label: Arc<str>,
    },
    /// The selected distance method needs member points but only centroids were given.
    #[error("distance method `{method}` requires cluster assignments")]
    ClustersRequired {
        /// Reference name of the distance method.
        method: &'static str,
    },
    /// The distance method name was not recognised.
    #[error("unknown distance method `{name}`")]
    UnknownDistanceMethod {
        /// Name supplied by the caller.
        name: String,
    },
    /// The mutual-nearest-neighbour count must be positive.
    #[error("mnn_k must be at least 1 (got {got})")]
    InvalidMnnK {
        /// Value supplied by the caller.
        got: usize,
    },
    /// The outgroup scale factor must be finite and positive.
    #[error("outscale must be finite and positive (got {got})")]
    InvalidOutscale {
        /// Value supplied by the caller.
        got: f64,
    },
    /// An explicit outgroup threshold must be finite and positive.
    #[error("outgroup threshold must be finite and positive (got {got})")]
    InvalidOutgroupThreshold {
        /// Value supplied by the caller.
        got: f64,
    },
    /// An endpoint label does not name any cluster.
    #[error("endpoint `{label}` is not a known cluster")]
    UnknownEndpoint {
        /// Label supplied by the caller.
        label: Arc<str>,
    },
    /// A distance matrix failed validation.
    #[error("invalid distance matrix: {reason}")]
    InvalidDistanceMatrix {
        /// Human-readable description of the violation.
        reason: String,
    },
    /// Supplied centroids do not line up with the distance matrix labels.
    #[error("centroid labels do not match the distance matrix labels")]
    CentroidLabelMismatch,
    /// The combined covariance of two clusters could not be inverted.
    #[error("covariance sum of clusters `{left}` and `{right}` is singular")]
    SingularCovariance {
        /// Label of the first cluster.
        left: Arc<str>,
        /// Label of the second cluster.
        right: Arc<str>,
    },
    /// Full covariance scaling needs more members than dimensions.
    #[error(
        "cluster `{cluster}` has {members} members but full covariance needs more than {dimension}"
    )]
    InsufficientClusterSize {
        /// Label of the undersized cluster.
        cluster: Arc<str>,
        /// Number of members in the cluster.
        members: usize,
        /// Embedding dimension.
        dimension: usize,
    },
    /// No mutual nearest neighbours were found between two clusters.
    #[error("clusters `{left}` and `{right}` share no mutual nearest neighbours")]
    NoMutualNeighbours {
        /// Label of the first cluster.
        left: Arc<str>,
        /// Label of the second cluster.
        right: Arc<str>,
    },
    /// The exhaustive endpoint search found no feasible assignment.
    #[error("no assignment keeps endpoints {endpoints:?} at degree one or less")]
    UnsatisfiableEndpoints {
        /// Endpoint labels that were requested.
        endpoints: Vec<Arc<str>>,
    },
    /// Minimum spanning tree construction rejected its input.
    #[error(transparent)]
    Mst {
        /// Underlying MST validation failure.
        #[from]
        source: MstError,
    },
}

define_error_codes! {
    /// Stable codes describing [`LineageError`] variants.
    enum LineageErrorCode for LineageError {
        /// The point set contained no rows.
        EmptyPoints => EmptyPoints => "LINEAGE_EMPTY_POINTS",
        /// Point rows must have positive dimension.
        ZeroDimension => ZeroDimension => "LINEAGE_ZERO_DIMENSION",
        /// Rows in the point set had different lengths.
        RaggedPoints => RaggedPoints { .. } => "LINEAGE_RAGGED_POINTS",
        /// A coordinate was NaN or infinite.
        NonFiniteCoordinate => NonFiniteCoordinate { .. } => "LINEAGE_NON_FINITE_COORDINATE",
        /// A requested dimension index does not exist.
        DimensionNotFound => DimensionNotFound { .. } => "LINEAGE_DIMENSION_NOT_FOUND",
        /// Row names did not match the number of rows.
        RowNameCountMismatch => RowNameCountMismatch { .. } => "LINEAGE_ROW_NAME_COUNT_MISMATCH",
        /// The cluster assignment covers a different number of rows.
        AssignmentLengthMismatch => AssignmentLengthMismatch { .. } => "LINEAGE_ASSIGNMENT_LENGTH_MISMATCH",
        /// A soft assignment row is invalid.
        InvalidWeights => InvalidWeights { .. } => "LINEAGE_INVALID_WEIGHTS",
        /// A cluster has no members.
        EmptyCluster => EmptyCluster { .. } => "LINEAGE_EMPTY_CLUSTER",
        /// Rows used as centroids carry no names.
        UnnamedCentroids => UnnamedCentroids => "LINEAGE_UNNAMED_CENTROIDS",
        /// A label appears more than once.
        DuplicateLabel => DuplicateLabel { .. } => "LINEAGE_DUPLICATE_LABEL",
        /// The distance method requires cluster assignments.
        ClustersRequired => ClustersRequired { .. } => "LINEAGE_CLUSTERS_REQUIRED",
        /// The distance method name was not recognised.
        UnknownDistanceMethod => UnknownDistanceMethod { .. } => "LINEAGE_UNKNOWN_DISTANCE_METHOD",
        /// The mutual-nearest-neighbour count must be positive.
        InvalidMnnK => InvalidMnnK { .. } => "LINEAGE_INVALID_MNN_K",
        /// The outgroup scale factor is invalid.
        InvalidOutscale => InvalidOutscale { .. } => "LINEAGE_INVALID_OUTSCALE",
        /// The explicit outgroup threshold is invalid.
        InvalidOutgroupThreshold => InvalidOutgroupThreshold { .. } => "LINEAGE_INVALID_OUTGROUP_THRESHOLD",
        /// An endpoint label does not name any cluster.
        UnknownEndpoint => UnknownEndpoint { .. } => "LINEAGE_UNKNOWN_ENDPOINT",
        /// A distance matrix failed validation.
        InvalidDistanceMatrix => InvalidDistanceMatrix { .. } => "LINEAGE_INVALID_DISTANCE_MATRIX",
        /// Supplied centroids do not match the matrix labels.
        CentroidLabelMismatch => CentroidLabelMismatch => "LINEAGE_CENTROID_LABEL_MISMATCH",
        /// The combined covariance could not be inverted.
        SingularCovariance => SingularCovariance { .. } => "LINEAGE_SINGULAR_COVARIANCE",
        /// A cluster is too small for full covariance scaling.
        InsufficientClusterSize => InsufficientClusterSize { .. } => "LINEAGE_INSUFFICIENT_CLUSTER_SIZE",
        /// Two clusters share no mutual nearest neighbours.
        NoMutualNeighbours => NoMutualNeighbours { .. } => "LINEAGE_NO_MUTUAL_NEIGHBOURS",
        /// The endpoint constraints cannot be met.
        UnsatisfiableEndpoints => UnsatisfiableEndpoints { .. } => "LINEAGE_UNSATISFIABLE_ENDPOINTS",
        /// Minimum spanning tree construction failed.
        Mst => Mst { .. } => "LINEAGE_MST_FAILURE",
    }
}

impl LineageError {
    /// Classifies the error into the coarse [`ErrorKind`] taxonomy.
    ///
    /// # Examples
    /// ```
    /// use lineage_core::{ErrorKind, LineageError};
    ///
    /// assert_eq!(LineageError::UnnamedCentroids.kind(), ErrorKind::Configuration);
    /// ```
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::SingularCovariance { .. }
            | Self::InsufficientClusterSize { .. }
            | Self::NoMutualNeighbours { .. } => ErrorKind::Numerical,
            Self::UnsatisfiableEndpoints { .. } => ErrorKind::UnsatisfiableConstraint,
            _ => ErrorKind::Configuration,
        }
    }

    /// Retrieve the inner MST error code when the failure came from MST construction.
    #[must_use]
    pub const fn mst_code(&self) -> Option<crate::mst::MstErrorCode> {
        match self {
            Self::Mst { source } => Some(source.code()),
            _ => None,
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, LineageError>;
