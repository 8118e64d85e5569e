use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dwc_refine::backbone::BackboneHttpClient;
use dwc_refine::datasets;
use dwc_refine::error::RefineError;
use dwc_refine::output::JsonOutput;
use dwc_refine::pipeline::{Pipeline, RunOutcome};
use dwc_refine::reader::DelimitedReader;

#[derive(Parser)]
#[command(name = "dwc-refine")]
#[command(about = "Refine a tabular biodiversity dataset into a Darwin Core sample-event star archive")]
#[command(version, author)]
struct Cli {
    /// Built-in dataset mapping to apply
    dataset: String,

    /// Source file to refine
    #[arg(long)]
    input: Utf8PathBuf,

    /// Directory the events and occurrences files are written to
    #[arg(long)]
    output: Utf8PathBuf,

    /// Print the run report as JSON instead of log lines
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(refine) = report.downcast_ref::<RefineError>() {
            return ExitCode::from(map_exit_code(refine));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &RefineError) -> u8 {
    match error {
        RefineError::UnknownDataset(_) | RefineError::SourceOpen(_) => 2,
        RefineError::BackboneHttp(_) | RefineError::BackboneStatus { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mapping = datasets::by_name(&cli.dataset).map_err(|err| {
        miette::Report::msg(format!(
            "{err}; available datasets: {}",
            datasets::names().join(", ")
        ))
    })?;

    let source = DelimitedReader::open(&cli.input, &mapping.source).into_diagnostic()?;
    let client = BackboneHttpClient::new().into_diagnostic()?;
    let pipeline = Pipeline::new(mapping, client).into_diagnostic()?;

    let report = pipeline.run(source, &cli.output).into_diagnostic()?;

    if cli.json {
        JsonOutput::print_report(&report).into_diagnostic()?;
    } else {
        info!(
            "{}: {} rows, {} occurrences, {} unique events, {} skipped, {} names not found",
            report.dataset,
            report.rows,
            report.occurrences,
            report.unique_events,
            report.skipped,
            report.names_not_found.len()
        );
    }

    match report.outcome {
        RunOutcome::Completed => Ok(()),
        RunOutcome::Failed(message) => Err(miette::Report::msg(message)),
    }
}
