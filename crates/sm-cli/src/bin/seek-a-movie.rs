#![forbid(unsafe_code)]

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use seek_a_movie::{DashboardConfig, Pipeline, RawSelection};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_DATASET: &str = "data/movies.json";

#[derive(Debug, Clone)]
struct CliArgs {
    dataset: PathBuf,
    config: Option<PathBuf>,
    selection: RawSelection,
    out: Option<PathBuf>,
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("seek-a-movie error: {error}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<(), String> {
    let Some(args) = parse_args(std::env::args().skip(1))? else {
        print_help();
        return Ok(());
    };

    let config = match args.config.as_deref() {
        Some(path) => DashboardConfig::from_json_path(path).map_err(|error| error.to_string())?,
        None => DashboardConfig::default(),
    };
    let pipeline = Pipeline::from_path(&args.dataset, config).map_err(|error| error.to_string())?;
    let dashboard = pipeline
        .query(&args.selection)
        .map_err(|error| error.to_string())?;

    info!(
        upper = dashboard.upper.rows().len(),
        lower = dashboard.lower.as_ref().map_or(0, |chart| chart.rows().len()),
        "dashboard built"
    );

    let rendered = if args.json {
        dashboard.to_json()
    } else {
        dashboard.to_html()
    }
    .map_err(|error| error.to_string())?;

    match args.out.as_deref() {
        Some(path) => {
            fs::write(path, rendered)
                .map_err(|error| format!("cannot write {}: {error}", path.display()))?;
            info!(path = %path.display(), "dashboard written");
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

/// Parse everything after the program name. `None` means help was asked for.
fn parse_args<I>(args: I) -> Result<Option<CliArgs>, String>
where
    I: IntoIterator<Item = String>,
{
    let mut dataset = PathBuf::from(DEFAULT_DATASET);
    let mut config = None;
    let mut selection = RawSelection::default();
    let mut out = None;
    let mut json = false;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dataset" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--dataset requires a path".to_owned())?;
                dataset = PathBuf::from(value);
            }
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--config requires a path".to_owned())?;
                config = Some(PathBuf::from(value));
            }
            "--genre" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--genre requires a genre".to_owned())?;
                selection.genres.push(value);
            }
            "--rating" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--rating requires an MPAA rating".to_owned())?;
                selection.ratings.push(value);
            }
            "--from" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--from requires a year".to_owned())?;
                selection.year_from = Some(value);
            }
            "--to" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--to requires a year".to_owned())?;
                selection.year_to = Some(value);
            }
            "--out" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--out requires a path".to_owned())?;
                out = Some(PathBuf::from(value));
            }
            "--json" => {
                json = true;
            }
            "--help" | "-h" => return Ok(None),
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    Ok(Some(CliArgs {
        dataset,
        config,
        selection,
        out,
        json,
    }))
}

fn print_help() {
    println!(
        "seek-a-movie\n\
         Usage:\n\
         \tseek-a-movie [--dataset <path>] [--config <path>] [--genre <genre>]... [--rating <rating>]... [--from <year>] [--to <year>] [--out <path>] [--json]\n\
         Options:\n\
         \t--dataset <path>    movies dataset, .json records or .csv (default: {DEFAULT_DATASET})\n\
         \t--config <path>     dashboard config JSON (top_k, theme, empty_set_policy, chart options)\n\
         \t--genre <genre>     admit a major genre; repeat for more\n\
         \t--rating <rating>   admit an MPAA rating (G, PG, PG-13, R, NC-17, Open, None); repeat for more\n\
         \t--from <year>       first release year, inclusive (default: earliest in dataset)\n\
         \t--to <year>         last release year, inclusive (default: latest in dataset)\n\
         \t--out <path>        write output to a file instead of stdout\n\
         \t--json              emit both Vega-Lite documents as JSON instead of HTML\n\
         \t-h, --help          show this help\n\
         Logging follows RUST_LOG (default: warn)."
    );
}
