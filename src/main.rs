use anyhow::{bail, Context, Result};
use assay::cli::{Cli, Command, DetectArgs, OutputFormat};
use assay::config::Config;
use assay::dataset::Dataset;
use assay::filter::RowFilter;
use assay::records::{OutlierRecord, SampleId};
use assay::report::DetectionReport;
use assay::store::OutlierStore;
use assay::{reconcile, summary};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn load_dataset(path: &Path, elements: Option<&[String]>) -> Result<Dataset> {
    let dataset = Dataset::from_csv_path(path, elements)
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
    if dataset.elements().is_empty() {
        bail!("No element columns found in {}", path.display());
    }
    Ok(dataset)
}

fn store_path(flag: Option<PathBuf>, config: &Config) -> PathBuf {
    flag.unwrap_or_else(|| config.store.clone())
}

fn run_init(store: &Path, force: bool) -> Result<()> {
    OutlierStore::init(store, force)
        .with_context(|| format!("Failed to create outlier store: {}", store.display()))?;
    eprintln!("Created empty outlier store: {}", store.display());
    Ok(())
}

fn run_detect(args: DetectArgs, config: &Config) -> Result<()> {
    let mut detection = config.detection;
    if let Some(confidence) = args.confidence {
        detection.confidence_level = confidence;
    }
    if let Some(window) = args.window {
        detection = detection.windowed(window);
    }

    let dataset = load_dataset(&args.data, args.elements.as_deref())?;
    let elements = dataset.elements().to_vec();
    let records = reconcile::detect_with(&elements, &dataset, &detection)
        .context("Outlier detection failed")?;
    let report = DetectionReport::new(&detection, &elements, dataset.len(), records);

    match args.format {
        OutputFormat::Text => report.print_summary(),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    if args.dry_run || !report.has_outliers() {
        return Ok(());
    }

    let store = store_path(args.store, config);
    let added = reconcile::save_outliers(report.outliers.clone(), &store)
        .with_context(|| format!("Failed to update outlier store: {}", store.display()))?;
    eprintln!(
        "Recorded {} new outlier(s) in {}",
        added,
        store.display()
    );
    Ok(())
}

fn run_flag(
    sample: &str,
    session: Option<String>,
    element: Option<String>,
    store: &Path,
) -> Result<()> {
    let sample_id = SampleId::parse(sample);
    let record = match (session, element) {
        (None, None) => OutlierRecord::sample(sample_id),
        (Some(session), None) => OutlierRecord::sample_session(sample_id, session),
        (Some(session), Some(element)) => {
            OutlierRecord::sample_session_element(sample_id, session, element)
        }
        (None, Some(_)) => bail!("--element requires --session"),
    };

    let added = reconcile::save_outliers(vec![record.clone()], store)
        .with_context(|| format!("Failed to update outlier store: {}", store.display()))?;
    if added == 0 {
        eprintln!("Already recorded: {}", record);
    } else {
        eprintln!("Recorded {} in {}", record, store.display());
    }
    Ok(())
}

fn run_apply(data: &Path, store: &Path, output: &Path) -> Result<()> {
    let mut dataset = load_dataset(data, None)?;
    let outliers = OutlierStore::load(store)
        .with_context(|| format!("Failed to read outlier store: {}", store.display()))?;

    let applied = reconcile::apply_in_place(&outliers, &mut dataset);
    dataset
        .to_csv_path(output)
        .with_context(|| format!("Failed to write dataset: {}", output.display()))?;

    eprintln!(
        "Deleted {} row(s), nulled {} reading(s); wrote {} row(s) to {}",
        applied.rows_deleted(),
        applied.cells_nulled,
        dataset.len(),
        output.display()
    );
    if applied.records_skipped > 0 {
        eprintln!(
            "Skipped {} record(s) naming an element not in {}",
            applied.records_skipped,
            data.display()
        );
    }
    Ok(())
}

fn run_summary(
    data: &Path,
    store: Option<&Path>,
    filter: Option<&str>,
    elements: Option<&[String]>,
) -> Result<()> {
    let mut dataset = load_dataset(data, elements)?;

    if let Some(store) = store {
        let outliers = OutlierStore::load(store)
            .with_context(|| format!("Failed to read outlier store: {}", store.display()))?;
        reconcile::apply_in_place(&outliers, &mut dataset);
    }
    if let Some(expr) = filter {
        let filter = RowFilter::from_expr(expr).context("Invalid filter expression")?;
        dataset = dataset.filter(&filter);
    }

    let summaries = summary::summarize(&dataset, dataset.elements())?;
    summary::print_summary(&summaries);
    Ok(())
}

fn run_elements(data: &Path) -> Result<()> {
    let dataset = load_dataset(data, None)?;
    for element in dataset.elements() {
        println!("{}", element);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Init { store, force } => run_init(&store_path(store, &config), force),
        Command::Detect(detect) => run_detect(detect, &config),
        Command::Flag {
            sample,
            session,
            element,
            store,
        } => run_flag(&sample, session, element, &store_path(store, &config)),
        Command::Apply {
            data,
            store,
            output,
        } => run_apply(&data, &store_path(store, &config), &output),
        Command::Summary {
            data,
            store,
            filter,
            elements,
        } => run_summary(
            &data,
            store.as_deref(),
            filter.as_deref(),
            elements.as_deref(),
        ),
        Command::Elements { data } => run_elements(&data),
    }
}
