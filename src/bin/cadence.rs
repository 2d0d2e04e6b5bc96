use cadence::calendar::parse_instant;
use cadence::{CadenceError, Occurrence, Rule};
use clap::Parser;
use jiff::Zoned;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cadence", about = "Calendar recurrence rules", version)]
struct Cli {
    /// Rule as JSON (e.g., '{"freq":"weekly","interval":2,"weekdays":["tu","th"]}')
    rule: Option<String>,

    /// Start time the rule is anchored at (e.g., 1997-09-02T09:00:00-04:00[America/New_York]); defaults to now
    #[arg(short, long)]
    start: Option<String>,

    /// Number of occurrences to show
    #[arg(short, long, default_value = "1")]
    n: usize,

    /// Show occurrences at or after this time (default: the start time)
    #[arg(long, conflicts_with_all = ["before", "from", "all"])]
    after: Option<String>,

    /// Show occurrences strictly before this time
    #[arg(long, conflicts_with_all = ["from", "all"])]
    before: Option<String>,

    /// Show occurrences in [FROM, TO)
    #[arg(long, requires = "to", conflicts_with = "all")]
    from: Option<String>,

    /// End of the --from interval (exclusive)
    #[arg(long, requires = "from")]
    to: Option<String>,

    /// Show every occurrence of a rule with a count or stop
    #[arg(long)]
    all: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Describe the rule in words instead of listing occurrences
    #[arg(long)]
    describe: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let rule_json = match cli.rule {
        Some(ref json) => json.as_str(),
        None => {
            eprintln!("error: no rule provided");
            process::exit(2);
        }
    };

    let rule = match Rule::from_json(rule_json) {
        Ok(rule) => rule,
        Err(e) => {
            eprintln!("{}", e.display_rich());
            process::exit(1);
        }
    };

    if cli.describe {
        println!("{rule}");
        process::exit(0);
    }

    let results = match list(&cli, rule) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("{}", e.display_rich());
            process::exit(1);
        }
    };

    if results.is_empty() {
        eprintln!("no occurrences");
        process::exit(0);
    }

    if cli.json {
        let iso_strings: Vec<String> = results.iter().map(|z| z.to_string()).collect();
        match serde_json::to_string(&iso_strings) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: failed to serialize: {e}");
                process::exit(1);
            }
        }
    } else {
        for z in &results {
            println!("{z}");
        }
    }
}

fn list(cli: &Cli, rule: Rule) -> Result<Vec<Zoned>, CadenceError> {
    let start = match &cli.start {
        Some(s) => parse_time("--start", s)?,
        None => Zoned::now(),
    };
    let occurrence = Occurrence::new(rule, start)?;

    if cli.all {
        return occurrence.all();
    }
    if let (Some(from), Some(to)) = (&cli.from, &cli.to) {
        return occurrence.occurrences_between(&parse_time("--from", from)?, &parse_time("--to", to)?);
    }

    let mut n = cli.n;
    if n > 1000 {
        eprintln!("warning: capped at 1000 occurrences");
        n = 1000;
    }

    if let Some(before) = &cli.before {
        return occurrence.previous_occurrences(n, &parse_time("--before", before)?);
    }
    let after = match &cli.after {
        Some(s) => parse_time("--after", s)?,
        None => occurrence.start_time().clone(),
    };
    occurrence.next_occurrences(n, &after)
}

fn parse_time(flag: &str, value: &str) -> Result<Zoned, CadenceError> {
    parse_instant(value)
        .map_err(|e| CadenceError::query(format!("{flag}: invalid time {value:?}: {e}")))
}
