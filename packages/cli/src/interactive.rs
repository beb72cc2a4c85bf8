//! Interactive tool selection when no subcommand is given.

use std::path::Path;

use crash_map_cli_utils::MultiProgress;
use crash_map_crash_models::{DatasetKind, FilterCriteria, Selector};
use crash_map_filter::options::FilterOptions;
use crash_map_filter::story::STORY_STEPS;
use crash_map_filter::summary::{summarize, summarize_by_year};
use crash_map_filter::time::parse_time_of_day;
use crash_map_filter::{filter_dataset, filter_dataset_records};
use dialoguer::{Confirm, Input, Select};

use crate::commands;

/// Top-level tool selection for the crash map toolchain.
enum Tool {
    Explore,
    Story,
    Datasets,
    Server,
}

impl Tool {
    const ALL: &[Self] = &[Self::Explore, Self::Story, Self::Datasets, Self::Server];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Explore => "Explore crashes",
            Self::Story => "Walk through the story",
            Self::Datasets => "List datasets",
            Self::Server => "Start server",
        }
    }
}

/// Prompts for a tool and runs it.
pub async fn run(
    multi: &MultiProgress,
    data_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Crash Map Toolchain");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Explore => explore(multi, data_dir).await?,
        Tool::Story => {
            let titles: Vec<String> = STORY_STEPS
                .iter()
                .enumerate()
                .map(|(i, step)| format!("{i}: {}", step.title))
                .collect();
            let step = Select::new()
                .with_prompt("Story step")
                .items(&titles)
                .default(0)
                .interact()?;
            commands::story(multi, data_dir, Some(step)).await?;
        }
        Tool::Datasets => commands::datasets(),
        Tool::Server => {
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(crash_map_server::interactive::run())
            })
            .await??;
        }
    }

    Ok(())
}

/// Lets the user pick a value from `values`, with `all` listed first.
fn select_value(prompt: &str, values: &[String]) -> Result<Selector<String>, dialoguer::Error> {
    let items: Vec<&str> = std::iter::once("all")
        .chain(values.iter().map(String::as_str))
        .collect();
    let idx = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(0)
        .interact()?;
    Ok(idx
        .checked_sub(1)
        .map_or(Selector::All, |i| Selector::Only(values[i].clone())))
}

/// Builds criteria from dropdown-style prompts and prints the result.
async fn explore(
    multi: &MultiProgress,
    data_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let kinds = DatasetKind::all();
    let labels: Vec<&str> = kinds.iter().map(|k| k.label()).collect();
    let kind = kinds[Select::new()
        .with_prompt("Dataset")
        .items(&labels)
        .default(0)
        .interact()?];

    let dataset = commands::load(multi, kind, data_dir, None).await?;
    let options = FilterOptions::from_records(dataset.records());

    let years: Vec<String> = options.years.iter().map(ToString::to_string).collect();
    let year = match select_value("Year", &years)? {
        Selector::All => Selector::All,
        Selector::Only(year) => Selector::Only(year.parse::<i32>()?),
    };

    let time_text: String = Input::new()
        .with_prompt("Time of day (e.g. 6:15 PM, blank for any)")
        .allow_empty(true)
        .validate_with(|text: &String| {
            if text.trim().is_empty() {
                return Ok(());
            }
            parse_time_of_day(text).map(|_| ()).map_err(|e| e.to_string())
        })
        .interact_text()?;
    let time_of_day = if time_text.trim().is_empty() {
        None
    } else {
        Some(parse_time_of_day(&time_text)?)
    };

    let criteria = FilterCriteria::default()
        .with_year(year)
        .with_time_of_day(time_of_day)
        .with_weather(select_value("Weather", &options.weather)?)
        .with_hit_and_run(select_value("Hit and run", &options.hit_and_run)?)
        .with_illumination(select_value("Illumination", &options.illumination)?);

    let matched = filter_dataset_records(&dataset, &criteria);
    println!();
    commands::print_criteria(&criteria);
    println!();
    for (year, summary) in summarize_by_year(matched.iter().copied()) {
        commands::print_summary(&year.to_string(), &summary);
    }
    commands::print_summary("Total", &summarize(matched));

    if Confirm::new()
        .with_prompt("Write the matching crashes to a GeoJSON file?")
        .default(false)
        .interact()?
    {
        let path: String = Input::new()
            .with_prompt("Output file")
            .default("crashes.geojson".to_string())
            .interact_text()?;
        let collection = filter_dataset(&dataset, &criteria);
        std::fs::write(&path, serde_json::to_string(&collection)?)?;
        println!("Wrote {} crashes to {path}", collection.features.len());
    }

    Ok(())
}
