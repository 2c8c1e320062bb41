//! logsift - extract timeseries datapoints from plain-text logs.

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use logsift::config::ConfigLoader;
use logsift::loader::LogFileLoader;
use logsift::pattern::{FieldKind, PatternGroupBuilder, RegexPattern};
use logsift::sink::DataAggregator;

#[derive(Parser)]
#[command(
    name = "logsift",
    about = "Extract structured timeseries datapoints from plain-text logs",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract datapoints from a static log file.
    Extract {
        /// Log file to parse.
        file: PathBuf,
        /// Regex with one capture group per field.
        #[arg(short, long)]
        pattern: String,
        /// Field declarations, e.g. "a:int,b:float,host:str".
        #[arg(short, long)]
        fields: String,
        /// Pattern name (used as the datapoint name).
        #[arg(long, default_value = "data")]
        name: String,
        /// Tag associations, e.g. "host=Host".
        #[arg(long)]
        tags: Option<String>,
        /// Print extracted values as JSON lines.
        #[arg(long)]
        json: bool,
    },
    /// Watch a path and extract datapoints from appended lines.
    Watch {
        /// File or directory to watch.
        path: PathBuf,
        /// Regex filter over modified file paths.
        #[arg(long, default_value = r".*\.log$")]
        filter: String,
        /// Regex with one capture group per field.
        #[arg(short, long)]
        pattern: String,
        /// Field declarations, e.g. "a:int,b:float".
        #[arg(short, long)]
        fields: String,
        /// Pattern name (used as the datapoint name).
        #[arg(long, default_value = "data")]
        name: String,
        /// Only report lines appended after the watch starts.
        #[arg(long)]
        only_new: bool,
    },
    /// Validate a pattern against sample lines.
    Check {
        /// Regex with one capture group per field.
        #[arg(short, long)]
        pattern: String,
        /// Field declarations, e.g. "a:int,b:float".
        #[arg(short, long)]
        fields: String,
        /// Pattern name.
        #[arg(long, default_value = "data")]
        name: String,
        /// Sample lines the pattern should match.
        lines: Vec<String>,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

fn parse_fields(spec: &str) -> Result<Vec<(String, FieldKind)>, Box<dyn Error>> {
    spec.split(',')
        .map(|item| {
            let (name, kind) = item
                .split_once(':')
                .ok_or_else(|| format!("field '{item}' is not name:kind"))?;
            let kind = match kind.trim() {
                "int" => FieldKind::Int,
                "float" => FieldKind::Float,
                "str" => FieldKind::Str,
                other => return Err(format!("unknown field kind '{other}'").into()),
            };
            Ok((name.trim().to_string(), kind))
        })
        .collect()
}

fn build_pattern(
    name: &str,
    pattern: &str,
    fields: &str,
    tags: Option<&str>,
) -> Result<RegexPattern, Box<dyn Error>> {
    let mut built = RegexPattern::new(name, pattern);
    for (field, kind) in parse_fields(fields)? {
        built = built.with_field(field, kind);
    }
    if let Some(tags) = tags {
        for item in tags.split(',') {
            let (field, tag) = item
                .split_once('=')
                .ok_or_else(|| format!("tag '{item}' is not field=tag"))?;
            built = built.with_tag(field.trim(), tag.trim());
        }
    }
    Ok(built)
}

async fn run_extract(
    file: PathBuf,
    pattern: RegexPattern,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let group = PatternGroupBuilder::new("cli").add_pattern(pattern).build();
    let aggregator = DataAggregator::new();

    LogFileLoader::new(file)
        .set_pattern_group(group)
        .with_match_report()
        .add_sink(Box::new(aggregator.clone()))
        .start()
        .await?;

    if json {
        for point in aggregator.points().await {
            println!("{}", serde_json::to_string(&point)?);
        }
    }
    Ok(())
}

async fn run_watch(
    path: PathBuf,
    filter: String,
    pattern: RegexPattern,
    only_new: bool,
) -> Result<(), Box<dyn Error>> {
    let config = ConfigLoader::new().load()?;
    let group = PatternGroupBuilder::new("cli").add_pattern(pattern).build();

    let loader = LogFileLoader::new(path)
        .with_live_watch(filter)
        .with_only_new(only_new || config.watch.only_new)
        .with_poll_interval(Duration::from_millis(config.watch.poll_interval_ms))
        .with_match_report()
        .set_pattern_group(group);

    let cancel = loader.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping watch");
            cancel.cancel();
        }
    });

    loader.start().await?;
    Ok(())
}

fn run_check(pattern: RegexPattern, lines: Vec<String>) -> Result<(), Box<dyn Error>> {
    let mut pattern = pattern;
    for line in lines {
        pattern = pattern.with_test(line);
    }
    let (passed, total) = pattern.run_tests();
    println!("{passed}/{total} sample lines matched");
    if passed != total {
        return Err("some sample lines did not match".into());
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Extract {
            file,
            pattern,
            fields,
            name,
            tags,
            json,
        } => match build_pattern(&name, &pattern, &fields, tags.as_deref()) {
            Ok(p) => run_extract(file, p, json).await,
            Err(e) => Err(e),
        },
        Commands::Watch {
            path,
            filter,
            pattern,
            fields,
            name,
            only_new,
        } => match build_pattern(&name, &pattern, &fields, None) {
            Ok(p) => run_watch(path, filter, p, only_new).await,
            Err(e) => Err(e),
        },
        Commands::Check {
            pattern,
            fields,
            name,
            lines,
        } => build_pattern(&name, &pattern, &fields, None).and_then(|p| run_check(p, lines)),
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
