mod dataset;
mod report;
mod summary;

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use dataset::Dataset;
use report::{DatasetStats, ReportClient, build_prompt};
use sitecat_ai::{LazyEmbedder, categorize_semantic};
use sitecat_core::{Classification, categorize_automatic, categorize_manual};
use summary::CategoryCounts;

/// The original analysis compares a client against at most three
/// competitors; extra files are ignored.
const MAX_COMPETITORS: usize = 3;

/// sitecat - URL categorization and competitive site analysis
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Client CSV (URL column, optional Keyword column)
    client: PathBuf,

    /// Competitor CSVs (up to 3)
    #[arg(short = 'c', long = "competitor")]
    competitors: Vec<PathBuf>,

    /// Categorization mode
    #[arg(short, long, value_enum, default_value_t = Mode::Auto)]
    mode: Mode,

    /// Manual mode: comma-separated category list
    #[arg(long, conflicts_with = "categories_file")]
    categories: Option<String>,

    /// Manual mode: file with one category per line
    #[arg(long)]
    categories_file: Option<PathBuf>,

    /// Semantic mode: directory containing model.onnx and tokenizer.json
    #[arg(long, default_value = "models/paraphrase-multilingual-MiniLM-L12-v2")]
    model_dir: PathBuf,

    /// Output directory for categorized CSVs and the report
    #[arg(short, long, default_value = "out")]
    output_dir: PathBuf,

    /// OpenAI-compatible API root for report generation (optional)
    #[arg(long)]
    report_url: Option<String>,

    /// API key for the report endpoint
    #[arg(long, env = "SITECAT_API_KEY")]
    report_api_key: Option<String>,

    /// Model name for the report endpoint
    #[arg(long, default_value = "gemini-2.5-flash")]
    report_model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// URL pattern detection only
    Auto,
    /// Patterns plus embedding reconciliation against the client's taxonomy
    Semantic,
    /// Patterns checked against a user-supplied category list
    Manual,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;

    let client = Dataset::load(&args.client)?;
    info!(
        name = %client.name,
        urls = client.urls.len(),
        "loaded client dataset"
    );

    let manual_cats = match args.mode {
        Mode::Manual => Some(manual_categories(&args)?),
        _ => None,
    };
    let mut embedder = LazyEmbedder::new(&args.model_dir);

    // The client pass establishes the master category list that competitor
    // datasets are measured against in semantic and manual modes.
    let (client_results, master) = match args.mode {
        Mode::Auto => categorize_automatic(&client.urls),
        Mode::Semantic => {
            let (_, master) = categorize_automatic(&client.urls);
            let results = categorize_semantic(&client.urls, &master, &mut embedder)
                .context("semantic categorization of client dataset")?;
            (results, master)
        }
        Mode::Manual => {
            let cats = manual_cats.as_deref().unwrap_or_default();
            let results = categorize_manual(&client.urls, cats);
            (results, cats.to_vec())
        }
    };
    info!(categories = master.len(), "client categorized");

    let mut competitor_files = args.competitors.clone();
    if competitor_files.len() > MAX_COMPETITORS {
        warn!(
            given = competitor_files.len(),
            "analyzing only the first {MAX_COMPETITORS} competitors"
        );
        competitor_files.truncate(MAX_COMPETITORS);
    }

    let mut competitor_runs: Vec<(Dataset, Vec<Classification>)> = Vec::new();
    for path in &competitor_files {
        let comp = Dataset::load(path)?;
        let results = match args.mode {
            // Auto mode categorizes each competitor independently; its own
            // master list is discarded.
            Mode::Auto => categorize_automatic(&comp.urls).0,
            Mode::Semantic => categorize_semantic(&comp.urls, &master, &mut embedder)
                .with_context(|| format!("semantic categorization of {}", comp.name))?,
            Mode::Manual => {
                categorize_manual(&comp.urls, manual_cats.as_deref().unwrap_or_default())
            }
        };
        info!(name = %comp.name, urls = comp.urls.len(), "competitor categorized");
        competitor_runs.push((comp, results));
    }

    // Write augmented CSVs and collect per-dataset counts.
    let mut tables: Vec<(String, CategoryCounts, usize)> = Vec::new();
    write_output(&args.output_dir, &client, &client_results)?;
    tables.push((
        client.name.clone(),
        CategoryCounts::from_results(&client_results),
        client.keyword_terms,
    ));
    for (comp, results) in &competitor_runs {
        write_output(&args.output_dir, comp, results)?;
        tables.push((
            comp.name.clone(),
            CategoryCounts::from_results(results),
            comp.keyword_terms,
        ));
    }

    for (name, counts, _) in &tables {
        println!("{}", summary::render_distribution(name, counts));
    }

    if !competitor_runs.is_empty() {
        let mut comparison: Vec<(String, CategoryCounts)> = Vec::with_capacity(tables.len());
        comparison.push((
            client.name.clone(),
            CategoryCounts::from_results(&client_results),
        ));
        for (comp, results) in &competitor_runs {
            comparison.push((comp.name.clone(), CategoryCounts::from_results(results)));
        }
        println!("{}", summary::render_comparison(&comparison));
    }

    if let Some(report_url) = &args.report_url {
        let client_stats = DatasetStats::new(&tables[0].0, &tables[0].1, tables[0].2);
        let competitor_stats: Vec<DatasetStats> = tables[1..]
            .iter()
            .map(|(name, counts, keywords)| DatasetStats::new(name, counts, *keywords))
            .collect();

        let prompt = build_prompt(&client_stats, &competitor_stats);
        let api = ReportClient::new(report_url, args.report_api_key.clone(), &args.report_model);
        let report = api
            .generate(&prompt)
            .await
            .context("generating AI report")?;

        let report_path = args.output_dir.join("seo_report.txt");
        let stamped = format!("Generated: {}\n\n{report}\n", Utc::now().to_rfc3339());
        fs::write(&report_path, stamped)
            .with_context(|| format!("writing {}", report_path.display()))?;

        println!("{report}");
        info!(path = %report_path.display(), "report written");
    }

    Ok(())
}

/// Resolve the manual category list from the CLI flags.
fn manual_categories(args: &Args) -> anyhow::Result<Vec<String>> {
    if let Some(list) = &args.categories {
        let cats: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect();
        anyhow::ensure!(!cats.is_empty(), "--categories was empty");
        return Ok(cats);
    }

    if let Some(path) = &args.categories_file {
        let content =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let cats: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect();
        anyhow::ensure!(!cats.is_empty(), "{} contained no categories", path.display());
        return Ok(cats);
    }

    anyhow::bail!("manual mode requires --categories or --categories-file")
}

/// Write one dataset's augmented CSV to `<output_dir>/<name>_categorized.csv`.
fn write_output(
    output_dir: &std::path::Path,
    ds: &Dataset,
    results: &[Classification],
) -> anyhow::Result<()> {
    let augmented = ds.augment(results)?;
    let path = output_dir.join(format!("{}_categorized.csv", ds.name));
    dataset::write_csv(&path, &augmented)?;
    info!(path = %path.display(), "wrote categorized CSV");
    Ok(())
}
