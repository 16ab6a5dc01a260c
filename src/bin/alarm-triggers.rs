use std::io::Read;
use std::path::PathBuf;
use std::process;

use alarm_triggers::{
    may_occur_during_work, Alarm, HolidaySet, HolidaySpec, TimeOfDay, TriggerCalculator,
    TriggerError, TriggerSet, TzTransitions, WorkDays, WorkTimeConfig,
};
use clap::Parser;
use jiff::Zoned;
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "alarm-triggers",
    about = "Next trigger times of an alarm, restricted to working hours and non-holidays",
    version
)]
struct Cli {
    /// Alarm definition as JSON, or "-" to read it from stdin
    alarm: Option<String>,

    /// Compute triggers after this instant (default: now)
    #[arg(long)]
    now: Option<Zoned>,

    /// Number of successive trigger sets to show
    #[arg(short, long, default_value = "1")]
    n: u32,

    /// Working days, e.g. "mon,tue,wed,thu,fri"
    #[arg(long)]
    work_days: Option<String>,

    /// Working hours as START-END, e.g. "09:00-17:00"
    #[arg(long)]
    work_hours: Option<String>,

    /// Holiday: an ISO date or "<month> <day>" (repeatable)
    #[arg(long = "holiday")]
    holidays: Vec<String>,

    /// JSON settings file with "work" and "holidays" sections
    #[arg(long)]
    config: Option<PathBuf>,

    /// Years of time zone transitions to search
    #[arg(long, default_value = "10")]
    transition_years: i64,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Validate the alarm without computing
    #[arg(long)]
    check: bool,

    /// Only report whether the alarm can ever fire in working hours
    #[arg(long)]
    feasible: bool,
}

/// Settings file layout.
#[derive(Default, serde::Deserialize)]
struct Settings {
    #[serde(default)]
    work: Option<WorkTimeConfig>,
    #[serde(default)]
    holidays: HolidaySet,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let source = match cli.alarm {
        Some(ref source) => source.as_str(),
        None => {
            eprintln!("error: no alarm provided");
            process::exit(2);
        }
    };

    let alarm = match read_alarm(source) {
        Ok(alarm) => alarm,
        Err(e) => fail(&e),
    };

    if cli.check {
        println!("\u{2713} valid");
        process::exit(0);
    }

    let (config, holidays) = match settings(&cli) {
        Ok(settings) => settings,
        Err(e) => fail(&e),
    };
    debug!(%config, "resolved working time");

    if cli.feasible {
        if may_occur_during_work(&alarm, &config) {
            println!("feasible");
        } else {
            println!("infeasible");
        }
        process::exit(0);
    }

    let now = cli
        .now
        .clone()
        .unwrap_or_else(|| Zoned::now().with_time_zone(alarm.start.time_zone().clone()));
    let transitions =
        match TzTransitions::for_zone(alarm.start.time_zone(), &now, cli.transition_years) {
            Ok(transitions) => transitions,
            Err(e) => fail(&e),
        };

    let mut n = cli.n.max(1);
    if n > 1000 {
        eprintln!("warning: capped at 1000 trigger sets");
        n = 1000;
    }

    let calculator = TriggerCalculator::new(&config, &holidays, &transitions);
    let mut sets: Vec<TriggerSet> = Vec::new();
    let mut after = now;
    for _ in 0..n {
        let set = calculator.compute(&alarm, &after);
        let next = set.main.clone();
        sets.push(set);
        match next {
            Some(main) if main > after => after = main,
            _ => break,
        }
    }

    if cli.json {
        let json = if sets.len() == 1 {
            serde_json::to_string_pretty(&sets[0])
        } else {
            serde_json::to_string_pretty(&sets)
        };
        match json {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: failed to serialize: {e}");
                process::exit(1);
            }
        }
    } else {
        for (i, set) in sets.iter().enumerate() {
            if i > 0 {
                println!();
            }
            println!("{set}");
        }
    }
}

fn fail(e: &TriggerError) -> ! {
    eprintln!("{}", e.display_rich());
    process::exit(1);
}

fn read_alarm(source: &str) -> Result<Alarm, TriggerError> {
    let text = if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| TriggerError::input(format!("cannot read stdin: {e}"), source))?;
        text
    } else {
        std::fs::read_to_string(source)
            .map_err(|e| TriggerError::input(format!("cannot read alarm: {e}"), source))?
    };
    let alarm: Alarm = serde_json::from_str(&text)
        .map_err(|e| TriggerError::input(format!("invalid alarm JSON: {e}"), source))?;
    alarm.validate()?;
    Ok(alarm)
}

fn settings(cli: &Cli) -> Result<(WorkTimeConfig, HolidaySet), TriggerError> {
    let file = match &cli.config {
        Some(path) => {
            let shown = path.display().to_string();
            let text = std::fs::read_to_string(path)
                .map_err(|e| TriggerError::input(format!("cannot read settings: {e}"), &shown))?;
            serde_json::from_str::<Settings>(&text)
                .map_err(|e| TriggerError::input(format!("invalid settings: {e}"), &shown))?
        }
        None => Settings::default(),
    };

    let mut config = file.work.unwrap_or_default();
    if let Some(days) = &cli.work_days {
        let days: WorkDays = days.parse()?;
        config = config.with_work_days(days);
    }
    if let Some(hours) = &cli.work_hours {
        let (start, end) = hours
            .split_once('-')
            .ok_or_else(|| TriggerError::input("expected START-END", hours))?;
        config = WorkTimeConfig::new(
            config.work_days(),
            TimeOfDay::parse(start)?,
            TimeOfDay::parse(end)?,
        )?;
    }

    let mut holidays = file.holidays;
    for spec in &cli.holidays {
        holidays.insert(spec.parse::<HolidaySpec>()?);
    }
    Ok((config, holidays))
}
