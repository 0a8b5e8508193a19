//! Unit tests for argument parsing, graph building and rendering.

use super::commands::{derive_data_source_name, run_parquet};
use super::{
    BuildSource, Cli, CliError, Command, ExecutionSummary, OutputFormat, ParquetArgs,
    render_summary, run_cli,
};

use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};

use arrow_array::{ArrayRef, FixedSizeListArray, Float32Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use clap::Parser;
use lineage_core::{DistanceMethod, LineageError};
use lineage_providers_dense::EmbeddingProviderError;
use parquet::arrow::arrow_writer::ArrowWriter;
use rstest::{fixture, rstest};
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Three clusters on a line at x = 0, 3 and 10, two points each.
fn write_embedding(dir: &TempDir) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = dir.path().join("cells.parquet");
    let coordinates = [
        [-0.5_f32, 0.0],
        [0.5, 0.0],
        [2.5, 0.0],
        [3.5, 0.0],
        [9.5, 0.0],
        [10.5, 0.0],
    ];
    let item = Arc::new(Field::new("item", DataType::Float32, false));
    let values = Float32Array::from_iter_values(coordinates.iter().flatten().copied());
    let list = FixedSizeListArray::new(Arc::clone(&item), 2, Arc::new(values) as ArrayRef, None);
    let schema = Arc::new(Schema::new(vec![
        Field::new("umap", DataType::FixedSizeList(item, 2), false),
        Field::new("cluster", DataType::Utf8, false),
    ]));
    let labels = StringArray::from(vec!["a", "a", "b", "b", "c", "c"]);
    let batch = RecordBatch::try_new(
        Arc::clone(&schema),
        vec![Arc::new(list) as ArrayRef, Arc::new(labels) as ArrayRef],
    )?;
    let mut writer = ArrowWriter::try_new(File::create(&path)?, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(path)
}

#[fixture]
fn temp_dir() -> TempDir {
    TempDir::new().expect("temporary directory")
}

fn parse(path: &Path, extra: &[&str]) -> Result<ParquetArgs, clap::Error> {
    let mut argv = vec![
        "lineage".to_owned(),
        "build".to_owned(),
        "parquet".to_owned(),
        path.display().to_string(),
        "--column".to_owned(),
        "umap".to_owned(),
    ];
    argv.extend(extra.iter().map(|arg| (*arg).to_owned()));
    let cli = Cli::try_parse_from(argv)?;
    match cli.command {
        Command::Build(build) => match build.source {
            BuildSource::Parquet(args) => Ok(args),
        },
    }
}

fn render(summary: &ExecutionSummary) -> String {
    let mut buffer = Vec::new();
    render_summary(summary, &mut buffer).expect("rendering to memory succeeds");
    String::from_utf8(buffer).expect("output is UTF-8")
}

#[rstest]
#[case::override_name("/tmp/cells.parquet", Some("override"), "override")]
#[case::stem("/tmp/cells.parquet", None, "cells")]
#[case::missing_stem("", None, "embedding")]
fn data_source_name_prefers_override(
    #[case] raw_path: &str,
    #[case] override_name: Option<&'static str>,
    #[case] expected: &str,
) {
    assert_eq!(
        derive_data_source_name(Path::new(raw_path), override_name),
        expected
    );
}

#[rstest]
fn parses_every_tree_option() -> TestResult {
    let args = parse(
        Path::new("cells.parquet"),
        &[
            "--labels",
            "cluster",
            "--dims",
            "1,0",
            "--distance",
            "scaled.full",
            "--median",
            "--omega",
            "2.5",
            "--outscale",
            "3",
            "--endpoint",
            "a",
            "--endpoint",
            "c",
            "--dyads",
            "--mnn-k",
            "7",
            "--format",
            "json",
        ],
    )?;
    assert_eq!(args.labels.as_deref(), Some("cluster"));
    assert_eq!(args.dims, Some(vec![1, 0]));
    assert_eq!(args.tree.distance, DistanceMethod::ScaledFull);
    assert!(args.tree.median);
    assert_eq!(args.tree.omega, Some(2.5));
    assert_eq!(args.tree.endpoints, vec!["a", "c"]);
    assert!(args.tree.dyads);
    assert_eq!(args.tree.mnn_k, 7);
    assert_eq!(args.format, OutputFormat::Json);

    let tree = args.tree.to_tree()?;
    assert_eq!(tree.mnn_k().get(), 7);
    assert_eq!(tree.outscale(), 3.0);
    assert_eq!(tree.endpoints().len(), 2);
    assert!(tree.allows_dyads());
    Ok(())
}

#[rstest]
fn rejects_unknown_distance() {
    let err = parse(Path::new("cells.parquet"), &["--distance", "manhattan"])
        .expect_err("unknown distance must be rejected");
    assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
}

#[rstest]
fn deprecated_switch_selects_mnn() -> TestResult {
    let args = parse(Path::new("cells.parquet"), &["--use-mnn"])?;
    assert_eq!(args.tree.to_tree()?.distance_method(), DistanceMethod::Mnn);
    Ok(())
}

#[rstest]
fn builds_text_output(temp_dir: TempDir) -> TestResult {
    let path = write_embedding(&temp_dir)?;
    let summary = run_parquet(parse(&path, &["--labels", "cluster"])?)?;
    assert_eq!(summary.data_source, "cells");
    assert_eq!(summary.graph.nodes().len(), 3);
    assert_eq!(summary.graph.edges().len(), 2);

    let output = render(&summary);
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[0], "data source: cells");
    assert_eq!(lines[1], "nodes: 3");
    assert_eq!(lines[2], "a\t0\t0");
    assert_eq!(lines[5], "edges: 2");
    assert!(lines[6].starts_with("a\tb\t3\t"));
    assert!(lines[7].starts_with("b\tc\t7\t"));
    Ok(())
}

#[rstest]
fn endpoint_edges_print_infinite_gain(temp_dir: TempDir) -> TestResult {
    let path = write_embedding(&temp_dir)?;
    let summary = run_parquet(parse(&path, &["--labels", "cluster", "--endpoint", "a"])?)?;
    let output = render(&summary);
    assert!(output.lines().any(|line| line == "a\tb\t3\tinf"));
    Ok(())
}

#[rstest]
fn json_output_renders_infinite_gain_as_null(temp_dir: TempDir) -> TestResult {
    let path = write_embedding(&temp_dir)?;
    let cli = Cli::try_parse_from([
        "lineage",
        "build",
        "parquet",
        path.to_str().ok_or("temporary path is not UTF-8")?,
        "--column",
        "umap",
        "--labels",
        "cluster",
        "--endpoint",
        "a",
        "--format",
        "json",
    ])?;
    let summary = run_cli(cli)?;
    let value: serde_json::Value = serde_json::from_str(&render(&summary))?;
    assert_eq!(value["data_source"], "cells");
    assert_eq!(value["graph"]["nodes"][0]["label"], "a");
    let edges = value["graph"]["edges"]
        .as_array()
        .ok_or("edges must be an array")?;
    assert_eq!(edges.len(), 2);
    assert!(edges[0]["gain"].is_null());
    assert_eq!(edges[0]["weight"], 3.0);
    Ok(())
}

#[rstest]
fn outgroup_threshold_splits_the_tree(temp_dir: TempDir) -> TestResult {
    let path = write_embedding(&temp_dir)?;
    let summary = run_parquet(parse(&path, &["--labels", "cluster", "--omega", "8"])?)?;
    assert_eq!(summary.graph.edges().len(), 1);
    assert_eq!(summary.graph.component_count(), 2);
    Ok(())
}

#[rstest]
fn mnn_without_labels_is_a_core_error(temp_dir: TempDir) -> TestResult {
    let path = write_embedding(&temp_dir)?;
    let err = run_parquet(parse(&path, &["--distance", "mnn"])?)
        .expect_err("mnn needs cluster labels");
    assert!(matches!(err, CliError::Core(LineageError::ClustersRequired { .. })));
    assert!(err.lineage_error().is_some());
    Ok(())
}

#[rstest]
fn missing_label_column_is_a_provider_error(temp_dir: TempDir) -> TestResult {
    let path = write_embedding(&temp_dir)?;
    let err = run_parquet(parse(&path, &["--labels", "leiden"])?)
        .expect_err("column does not exist");
    assert!(matches!(
        err,
        CliError::Provider(EmbeddingProviderError::ColumnNotFound { .. })
    ));
    assert!(err.lineage_error().is_none());
    Ok(())
}

#[rstest]
fn invalid_outscale_fails_before_reading(temp_dir: TempDir) -> TestResult {
    let missing = temp_dir.path().join("absent.parquet");
    let err = run_parquet(parse(&missing, &["--outscale", "0"])?)
        .expect_err("outscale must be positive");
    assert!(matches!(
        err,
        CliError::Core(LineageError::InvalidOutscale { .. })
    ));
    Ok(())
}
