use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use dawn_calendar::config::CalendarConfig;
use dawn_calendar::core::domain::{AstronomicalEvent, Confidence, DayCount, EventKind, Location, YearCycle};
use dawn_calendar::io::{write_reference_csv, ReferenceLoader};
use dawn_calendar::services::grid::MonthGrid;
use dawn_calendar::services::new_year::{anchor_instants, derive_new_year_anchors, NewYearRule};
use dawn_calendar::services::CalendarEngine;
use dawn_calendar::time::{format_hhmm, to_local};

/// Crate targets that receive log output at the CLI verbosity.
const CRATE_TARGETS: &[&str] = &["dawn_calendar"];

/// Lunar calendar anchored on dawns and full moons.
#[derive(Parser)]
#[command(name = "dawn-calendar", version, about = "Dawn-anchored lunar calendar")]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to TOML configuration file (defaults to calendar.toml lookup).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dawn, sunrise, sunset and dusk for one date.
    Events(EventsArgs),
    /// The lunar month containing an instant.
    Month(AtArgs),
    /// The year cycle containing an instant.
    Year(YearArgs),
    /// Year cycles for a range of years.
    Years(YearsArgs),
    /// Derive the new-year table from full-moon and conjunction tables.
    DeriveAnchors(DeriveArgs),
}

/// Observer overrides; unset fields come from the configuration.
#[derive(Args)]
struct LocationArgs {
    /// Latitude in degrees, north positive.
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude in degrees, east positive.
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// IANA time zone name.
    #[arg(long)]
    tz: Option<String>,

    /// Display name for the location.
    #[arg(long)]
    name: Option<String>,
}

#[derive(Args)]
struct EventsArgs {
    /// Civil date (YYYY-MM-DD), today in the location's zone if omitted.
    #[arg(long)]
    date: Option<NaiveDate>,

    #[command(flatten)]
    location: LocationArgs,
}

#[derive(Args)]
struct AtArgs {
    /// Instant (RFC 3339), now if omitted.
    #[arg(long)]
    at: Option<DateTime<Utc>>,

    #[command(flatten)]
    location: LocationArgs,
}

#[derive(Args)]
struct YearArgs {
    #[command(flatten)]
    at: AtArgs,

    /// Also print the 6×7 grid of every month.
    #[arg(long)]
    grid: bool,
}

#[derive(Args)]
struct YearsArgs {
    /// First year (inclusive).
    #[arg(long)]
    start: i32,

    /// Last year (inclusive).
    #[arg(long)]
    end: i32,

    #[command(flatten)]
    location: LocationArgs,
}

#[derive(Clone, Copy, ValueEnum)]
enum RuleArg {
    /// Latest Spica crossing before the full moon, Hamal constrained.
    Preceding,
    /// Nearest crossing up to 12 h after the full moon.
    Nearest,
}

impl From<RuleArg> for NewYearRule {
    fn from(rule: RuleArg) -> Self {
        match rule {
            RuleArg::Preceding => NewYearRule::PrecedingCrossing,
            RuleArg::Nearest => NewYearRule::NearestCrossing,
        }
    }
}

#[derive(Args)]
struct DeriveArgs {
    /// Full-moon table (CSV or JSON).
    #[arg(long)]
    full_moons: PathBuf,

    /// Moon/Spica conjunction table.
    #[arg(long)]
    spica: PathBuf,

    /// Sun/Hamal crossing table.
    #[arg(long)]
    hamal: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = RuleArg::Preceding)]
    rule: RuleArg,

    /// Output CSV path, stdout if omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

/// Install the tracing subscriber; `RUST_LOG` overrides the verbosity flag.
/// Library `log` records are forwarded to it.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let default_filter: String = CRATE_TARGETS
        .iter()
        .map(|t| format!("{t}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Configuration plus an engine over the configured tables.
struct App {
    config: CalendarConfig,
    engine: CalendarEngine,
}

impl App {
    fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config(config_path)?;
        let loaded = ReferenceLoader::load_from_settings(&config.data)?;
        tracing::info!(fingerprint = %loaded.data.fingerprint, "reference tables ready");
        let engine = CalendarEngine::from_config(Arc::new(loaded.data), &config);
        Ok(Self { config, engine })
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match &cli.command {
        Command::Events(args) => events(&App::load(config_path)?, args, cli.json),
        Command::Month(args) => month(&App::load(config_path)?, args, cli.json),
        Command::Year(args) => year(&App::load(config_path)?, args, cli.json),
        Command::Years(args) => years(&App::load(config_path)?, args, cli.json),
        Command::DeriveAnchors(args) => derive_anchors(args, cli.json),
    }
}

fn load_config(path: Option<&Path>) -> Result<CalendarConfig> {
    match path {
        Some(path) => CalendarConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display())),
        None => match CalendarConfig::from_default_location().context("Invalid calendar.toml")? {
            Some(config) => Ok(config),
            None => {
                tracing::info!("No calendar.toml found; using built-in defaults");
                Ok(CalendarConfig::default())
            }
        },
    }
}

fn resolve_location(config: &CalendarConfig, args: &LocationArgs) -> Result<(Location, String)> {
    let defaults = &config.location;
    let location = Location::new(
        args.lat.unwrap_or(defaults.latitude),
        args.lon.unwrap_or(defaults.longitude),
        args.tz.as_deref().unwrap_or(&defaults.timezone),
    )?;

    let overridden = args.lat.is_some() || args.lon.is_some();
    let name = match &args.name {
        Some(name) => name.clone(),
        None if overridden => format!(
            "lat={}, lon={}, tz={}",
            location.latitude,
            location.longitude,
            location.timezone().name()
        ),
        None => defaults.name.clone(),
    };
    Ok((location, name))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn events(app: &App, args: &EventsArgs, json: bool) -> Result<()> {
    let (location, name) = resolve_location(&app.config, &args.location)?;
    let date = args
        .date
        .unwrap_or_else(|| Utc::now().with_timezone(&location.timezone()).date_naive());
    let daily = app.engine.sun_events_for_date(&location, date)?;

    if json {
        return print_json(&daily);
    }
    println!("{}", date);
    println!("{}", daily.render_text(Some(&name)));
    Ok(())
}

fn month(app: &App, args: &AtArgs, json: bool) -> Result<()> {
    let (location, name) = resolve_location(&app.config, &args.location)?;
    let now = args.at.unwrap_or_else(Utc::now);
    let current = app.engine.current_month(now, &location)?;

    if json {
        return print_json(&current);
    }
    let tz = location.timezone();
    println!("--- Moon Events ({}) ---", name);
    println!("Previous Full Moon: {}", to_local(current.previous_full_moon, tz).format("%Y-%m-%d %H:%M:%S"));
    println!(
        "Dawn After Previous Full Moon: {}",
        describe_dawn(current.dawn_after_previous.as_ref())
    );
    println!("Following Full Moon: {}", to_local(current.next_full_moon, tz).format("%Y-%m-%d %H:%M:%S"));
    println!(
        "Dawn After Following Full Moon: {}",
        describe_dawn(current.dawn_after_next.as_ref())
    );
    println!("Days in this Month: {}", describe_count(current.day_count));
    if let Some(day) = current.current_day {
        println!("Current Day in this Month: {}", day);
    }
    Ok(())
}

fn year(app: &App, args: &YearArgs, json: bool) -> Result<()> {
    let (location, name) = resolve_location(&app.config, &args.at.location)?;
    let now = args.at.at.unwrap_or_else(Utc::now);
    let current = app.engine.current_year(now, &location)?;
    let grids = if args.grid {
        app.engine.month_grids(&current.cycle)
    } else {
        Vec::new()
    };

    if json {
        return print_json(&serde_json::json!({ "year": current, "grids": grids }));
    }

    println!("--- Yearly Events ({}) ---", name);
    print_cycle(&current.cycle, &location);
    match current.position {
        Some(position) => println!(
            "Current Month in this Year: {}, Day {}{}",
            position.month,
            position.day,
            if position.clamped { " (clamped)" } else { "" }
        ),
        None => println!("Current Month in this Year: --"),
    }
    for grid in &grids {
        println!();
        print_grid(grid);
    }
    Ok(())
}

fn years(app: &App, args: &YearsArgs, json: bool) -> Result<()> {
    let (location, name) = resolve_location(&app.config, &args.location)?;
    let cycles = app.engine.build_multi_year_calendar(args.start, args.end, &location)?;

    if json {
        return print_json(&cycles);
    }
    println!("--- Years {}..={} ({}) ---", args.start, args.end, name);
    for cycle in &cycles {
        println!();
        print_cycle(cycle, &location);
    }
    Ok(())
}

fn derive_anchors(args: &DeriveArgs, json: bool) -> Result<()> {
    let full_moons = ReferenceLoader::load_instants(&args.full_moons)?;
    let spica = ReferenceLoader::load_instants(&args.spica)?;
    let hamal = match &args.hamal {
        Some(path) => ReferenceLoader::load_instants(path)?,
        None => Vec::new(),
    };

    let anchors = derive_new_year_anchors(&full_moons, &spica, &hamal, args.rule.into());
    if json {
        return print_json(&anchors);
    }

    let instants = anchor_instants(&anchors);
    match &args.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
            write_reference_csv(&instants, "Full Moon Time (UTC)", BufWriter::new(file))?;
            tracing::info!("wrote {} anchors to {}", instants.len(), path.display());
        }
        None => write_reference_csv(&instants, "Full Moon Time (UTC)", io::stdout().lock())?,
    }
    Ok(())
}

fn print_cycle(cycle: &YearCycle, location: &Location) {
    let next_short = (cycle.year + 1).rem_euclid(100);
    println!(
        "Year: {}-{:02} (opens {})",
        cycle.year,
        next_short,
        to_local(cycle.anchor, location.timezone()).format("%Y-%m-%d %H:%M:%S")
    );
    println!("Months in this year: {}", cycle.month_count());
    for month in &cycle.months {
        println!(
            "  {} begins: {} ({})",
            month.label,
            describe_dawn(month.start.as_ref()),
            describe_count(month.day_count)
        );
    }
}

fn print_grid(grid: &MonthGrid) {
    println!("{} [{}]", grid.label, describe_count(grid.day_count));
    if grid.is_empty() {
        println!("  (no grid)");
        return;
    }
    for row in &grid.grid {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| cell.map_or_else(|| "  .".to_string(), |day| format!("{:>3}", day)))
            .collect();
        println!("{}", cells.join(""));
    }
}

fn describe_dawn(dawn: Option<&AstronomicalEvent>) -> String {
    match dawn {
        Some(event) if event.confidence == Confidence::Astronomical => {
            event.instant.format("%Y-%m-%d %H:%M:%S").to_string()
        }
        Some(event) => format!(
            "{} (secondary: {})",
            event.instant.format("%Y-%m-%d %H:%M:%S"),
            event.confidence.tag(EventKind::Dawn)
        ),
        None => format!("{} (not found)", format_hhmm(None)),
    }
}

fn describe_count(count: DayCount) -> String {
    match count {
        DayCount::Valid(days) => format!("{} days", days),
        DayCount::Anomalous(days) => format!("{} days, anomalous", days),
        DayCount::Unknown => "-- days".to_string(),
    }
}
