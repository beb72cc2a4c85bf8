//! Implementations of the non-interactive subcommands.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use crash_map_cli_utils::{IndicatifProgress, MultiProgress};
use crash_map_crash_models::{CrashSummary, DatasetKind, FilterCriteria};
use crash_map_filter::options::FilterOptions;
use crash_map_filter::story::{STORY_STEPS, story_step};
use crash_map_filter::summary::{summarize, summarize_by_year};
use crash_map_filter::time::format_time;
use crash_map_filter::{filter_dataset, filter_dataset_records};
use crash_map_source::SourceError;
use crash_map_source::dataset_def::DatasetLocation;
use crash_map_source::loader::{Dataset, load_datasets_from};
use crash_map_source::registry::{all_datasets, dataset as dataset_definition};

use crate::FilterArgs;

/// Loads one dataset from `input`, the data directory, or its URL, in that
/// order of preference.
pub async fn load(
    multi: &MultiProgress,
    kind: DatasetKind,
    data_dir: Option<&Path>,
    input: Option<&Path>,
) -> Result<Dataset, SourceError> {
    let def = dataset_definition(kind).ok_or_else(|| SourceError::UnknownDataset {
        name: kind.to_string(),
    })?;
    let location = input.map_or_else(
        || def.location(data_dir),
        |path| DatasetLocation::File(path.to_path_buf()),
    );

    let progress = IndicatifProgress::datasets_bar(multi, &format!("Loading {}", def.name));
    let mut datasets = load_datasets_from(&[def], &[location], progress).await?;
    datasets.pop().ok_or(SourceError::UnknownDataset {
        name: kind.to_string(),
    })
}

/// Prints one summary line.
pub fn print_summary(label: &str, summary: &CrashSummary) {
    println!(
        "{label:<12} {:>8} crashes {:>8} injuries {:>6} fatalities",
        summary.total, summary.injuries, summary.fatalities
    );
}

/// Prints the active criteria.
pub fn print_criteria(criteria: &FilterCriteria) {
    let time = criteria
        .time_of_day
        .map_or_else(|| "any".to_string(), |m| format!("{} (±1h)", format_time(m)));
    println!("Year:         {}", criteria.year);
    println!("Time of day:  {time}");
    println!("Weather:      {}", criteria.weather);
    println!("Hit and run:  {}", criteria.hit_and_run);
    println!("Illumination: {}", criteria.illumination);
}

/// `crash_map datasets`
pub fn datasets() {
    println!("{:<18} {:<32} DESCRIPTION", "KIND", "NAME");
    println!("{}", "-".repeat(80));
    for def in all_datasets() {
        println!("{:<18} {:<32} {}", def.kind.as_ref(), def.name, def.description);
    }
}

/// `crash_map filter`
pub async fn filter(
    multi: &MultiProgress,
    data_dir: Option<&Path>,
    args: &FilterArgs,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let criteria = args.raw_criteria().parse()?;
    let dataset = load(multi, args.dataset, data_dir, args.input.as_deref()).await?;
    let collection = filter_dataset(&dataset, &criteria);
    log::info!(
        "{} of {} crashes match",
        collection.features.len(),
        dataset.len()
    );

    let json = serde_json::to_string(&collection)?;
    if let Some(path) = output {
        std::fs::write(path, json)?;
        log::info!("Wrote {}", path.display());
    } else {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(json.as_bytes())?;
        writeln!(stdout)?;
    }
    Ok(())
}

/// `crash_map summary`
pub async fn summary(
    multi: &MultiProgress,
    data_dir: Option<&Path>,
    args: &FilterArgs,
    by_year: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let criteria = args.raw_criteria().parse()?;
    let dataset = load(multi, args.dataset, data_dir, args.input.as_deref()).await?;
    let matched = filter_dataset_records(&dataset, &criteria);

    println!("{}", dataset.name());
    print_criteria(&criteria);
    println!();

    if by_year {
        for (year, summary) in summarize_by_year(matched.iter().copied()) {
            print_summary(&year.to_string(), &summary);
        }
    }
    print_summary("Total", &summarize(matched));
    Ok(())
}

/// `crash_map options`
pub async fn options(
    multi: &MultiProgress,
    data_dir: Option<&Path>,
    kind: DatasetKind,
    input: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = load(multi, kind, data_dir, input).await?;
    let options = FilterOptions::from_records(dataset.records());

    let years: Vec<String> = options.years.iter().map(ToString::to_string).collect();
    println!("Years:        {}", years.join(", "));
    println!("Weather:      {}", options.weather.join(", "));
    println!("Hit and run:  {}", options.hit_and_run.join(", "));
    println!("Illumination: {}", options.illumination.join(", "));
    Ok(())
}

/// `crash_map story`
pub async fn story(
    multi: &MultiProgress,
    data_dir: Option<&Path>,
    step: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(index) = step else {
        println!("{:<5} {:<8} {:<16} TITLE", "STEP", "YEAR", "DATASET");
        println!("{}", "-".repeat(60));
        for (i, step) in STORY_STEPS.iter().enumerate() {
            println!(
                "{i:<5} {:<8} {:<16} {}",
                step.year.to_string(),
                step.dataset.as_ref(),
                step.title
            );
        }
        return Ok(());
    };

    let step = story_step(index).ok_or_else(|| {
        format!(
            "No story step {index} (steps are 0..{})",
            STORY_STEPS.len()
        )
    })?;
    let criteria = step.apply(&FilterCriteria::default());
    let dataset = load(multi, step.dataset, data_dir, None).await?;

    println!("Step {index}: {}", step.title);
    println!("{}", dataset.name());
    print_criteria(&criteria);
    println!();
    print_summary("Total", &summarize(filter_dataset_records(&dataset, &criteria)));
    Ok(())
}

/// `crash_map serve`
pub async fn serve(data_dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = crash_map_server::ServerConfig {
        data_dir,
        ..crash_map_server::ServerConfig::from_env()
    };

    // The server uses actix-web's runtime, so we need to run it in a
    // blocking task to avoid nesting tokio runtimes.
    tokio::task::spawn_blocking(move || {
        actix_web::rt::System::new().block_on(crash_map_server::run_server_with(config))
    })
    .await??;
    Ok(())
}
