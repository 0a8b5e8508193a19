//! Argument parsing and command execution for the `lineage` binary.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use clap::{Args, Parser, Subcommand, ValueEnum};
use lineage_core::{
    Aggregation, ClusterTree, ClusterTreeBuilder, DEFAULT_MNN_K, DEFAULT_OUTSCALE,
    DistanceMethod, LineageError, LineageGraph, OutgroupSpec,
};
use lineage_providers_dense::{EmbeddingColumns, EmbeddingProvider, EmbeddingProviderError};
use serde::Serialize;
use thiserror::Error;
use tracing::{Span, field, info, instrument};

/// Top-level options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "lineage",
    about = "Build cluster lineage trees from low-dimensional embeddings."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Build a lineage graph over cluster centroids.
    Build(BuildCommand),
}

/// Options accepted by `build`.
#[derive(Debug, Args, Clone)]
pub struct BuildCommand {
    /// Input embedding.
    #[command(subcommand)]
    pub source: BuildSource,
}

/// Inputs `build` can read.
#[derive(Debug, Subcommand, Clone)]
pub enum BuildSource {
    /// Read a Parquet file with a `FixedSizeList<Float32, D>` coordinate column.
    Parquet(ParquetArgs),
}

/// Parquet input arguments.
#[derive(Debug, Args, Clone)]
pub struct ParquetArgs {
    /// Path to the Parquet file.
    pub path: PathBuf,

    /// Column holding the coordinates.
    #[arg(long)]
    pub column: String,

    /// Column holding one cluster label per row. Without it, each named row
    /// is treated as a centroid.
    #[arg(long)]
    pub labels: Option<String>,

    /// Column holding one unique name per row.
    #[arg(long)]
    pub names: Option<String>,

    /// Comma-separated coordinate indices to keep.
    #[arg(long, value_delimiter = ',')]
    pub dims: Option<Vec<usize>>,

    /// Override the data source name (defaults to the file stem).
    #[arg(long)]
    pub name: Option<String>,

    /// Tree construction options.
    #[command(flatten)]
    pub tree: TreeArgs,

    /// Output rendering.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Tree construction options shared by every input.
#[derive(Debug, Args, Clone)]
pub struct TreeArgs {
    /// Distance model: simple, scaled.diagonal, scaled.full, adaptive or mnn.
    #[arg(long, default_value_t = DistanceMethod::Simple)]
    pub distance: DistanceMethod,

    /// Use coordinate-wise medians instead of means as centroids.
    #[arg(long)]
    pub median: bool,

    /// Add an outgroup node with an automatically derived threshold.
    #[arg(long)]
    pub outgroup: bool,

    /// Add an outgroup node with this explicit threshold.
    #[arg(long)]
    pub omega: Option<f64>,

    /// Multiplier applied to the median MST edge for the automatic threshold.
    #[arg(long, default_value_t = DEFAULT_OUTSCALE)]
    pub outscale: f64,

    /// Cluster that must be a leaf; repeat for several.
    #[arg(long = "endpoint")]
    pub endpoints: Vec<String>,

    /// Allow two endpoints to pair with each other.
    #[arg(long)]
    pub dyads: bool,

    /// Neighbours considered per point by the mnn distance.
    #[arg(long, default_value_t = DEFAULT_MNN_K)]
    pub mnn_k: usize,

    /// Deprecated switch selecting the mnn distance.
    #[arg(long, hide = true)]
    pub use_mnn: bool,
}

impl TreeArgs {
    fn outgroup_spec(&self) -> OutgroupSpec {
        match (self.omega, self.outgroup) {
            (Some(omega), _) => OutgroupSpec::Threshold(omega),
            (None, true) => OutgroupSpec::Auto,
            (None, false) => OutgroupSpec::Off,
        }
    }

    /// Validates the options into a runnable [`ClusterTree`].
    ///
    /// # Errors
    /// Returns [`LineageError`] for an invalid `mnn_k`, outscale or threshold.
    pub fn to_tree(&self) -> Result<ClusterTree, LineageError> {
        let aggregation = if self.median {
            Aggregation::Median
        } else {
            Aggregation::Mean
        };
        ClusterTreeBuilder::new()
            .with_aggregation(aggregation)
            .with_distance_method(self.distance)
            .with_legacy_mnn(self.use_mnn)
            .with_mnn_k(self.mnn_k)
            .with_outgroup(self.outgroup_spec())
            .with_outscale(self.outscale)
            .with_endpoints(self.endpoints.iter().cloned())
            .with_dyads(self.dyads)
            .build()
    }
}

/// How the graph is written to stdout.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Tab-separated node and edge listings.
    #[default]
    Text,
    /// The serialised graph; infinite gains become `null`.
    Json,
}

/// Errors surfaced while executing a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading the embedding failed.
    #[error(transparent)]
    Provider(#[from] EmbeddingProviderError),
    /// Building the graph failed.
    #[error(transparent)]
    Core(#[from] LineageError),
}

impl CliError {
    /// Returns the core error behind this failure, if any.
    #[must_use]
    pub fn lineage_error(&self) -> Option<&LineageError> {
        match self {
            Self::Core(error) | Self::Provider(EmbeddingProviderError::Core(error)) => Some(error),
            Self::Provider(_) => None,
        }
    }
}

/// Outcome of a successful `build`.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionSummary {
    /// Name of the input.
    pub data_source: String,
    /// The lineage graph.
    pub graph: LineageGraph,
    /// Requested rendering.
    #[serde(skip)]
    pub format: OutputFormat,
}

/// Executes the command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when reading the input or building the graph fails.
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Build(build) => {
            Span::current().record("command", field::display("build"));
            match build.source {
                BuildSource::Parquet(args) => run_parquet(args),
            }
        }
    }
}

#[instrument(
    name = "cli.build_parquet",
    err,
    skip(args),
    fields(path = %args.path.display(), column = %args.column, distance = %args.tree.distance),
)]
pub(super) fn run_parquet(args: ParquetArgs) -> Result<ExecutionSummary, CliError> {
    let tree = args.tree.to_tree()?;
    let mut columns = EmbeddingColumns::new(args.column.as_str());
    if let Some(labels) = &args.labels {
        columns = columns.with_labels(labels.as_str());
    }
    if let Some(names) = &args.names {
        columns = columns.with_names(names.as_str());
    }
    if let Some(dims) = &args.dims {
        columns = columns.with_dimensions(dims.clone());
    }
    let name = derive_data_source_name(&args.path, args.name.as_deref());
    let provider = EmbeddingProvider::try_from_parquet_path(name, &args.path, &columns)?;
    let graph = tree.run(&provider.tree_input())?;
    info!(
        data_source = provider.name(),
        nodes = graph.nodes().len(),
        edges = graph.edges().len(),
        "build completed"
    );
    Ok(ExecutionSummary {
        data_source: provider.name().to_owned(),
        graph,
        format: args.format,
    })
}

pub(super) fn derive_data_source_name(path: &Path, override_name: Option<&str>) -> String {
    override_name
        .map(ToOwned::to_owned)
        .or_else(|| path.file_stem().and_then(|stem| stem.to_str()).map(ToOwned::to_owned))
        .unwrap_or_else(|| "embedding".to_owned())
}

/// Writes `summary` to `writer` in its requested format.
///
/// Text output lists nodes with their coordinates, then edges as
/// `source target weight gain`; rerouting-free edges print their gain as
/// `inf`.
///
/// # Errors
/// Returns [`io::Error`] if writing or serialisation fails.
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    match summary.format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, summary)?;
            writeln!(writer)
        }
        OutputFormat::Text => render_text(summary, writer),
    }
}

fn render_text(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    let graph = &summary.graph;
    writeln!(writer, "data source: {}", summary.data_source)?;
    writeln!(writer, "nodes: {}", graph.nodes().len())?;
    for node in graph.nodes() {
        write!(writer, "{}", node.label())?;
        match node.coordinates() {
            Some(coordinates) => {
                for value in coordinates {
                    write!(writer, "\t{value}")?;
                }
            }
            None => write!(writer, "\t-")?,
        }
        writeln!(writer)?;
    }
    writeln!(writer, "edges: {}", graph.edges().len())?;
    for edge in graph.edges() {
        let source = graph.nodes()[edge.source()].label();
        let target = graph.nodes()[edge.target()].label();
        writeln!(
            writer,
            "{source}\t{target}\t{}\t{}",
            edge.weight(),
            edge.gain()
        )?;
    }
    Ok(())
}
