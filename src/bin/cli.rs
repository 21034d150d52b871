//! feedindex CLI
//!
//! Runs data feed queries against a feed index directory and prints the
//! result as JSON.

use std::process;

use clap::{Parser, Subcommand};
use feedindex::{
    Config, ExistsQuery, FeedEngine, FeedValue, Mci, ReadQuery, Relation, TiePolicy, VolatileState,
};
use tracing_subscriber::{fmt, EnvFilter};

/// feedindex CLI
#[derive(Parser, Debug)]
#[command(name = "feedindex-cli")]
#[command(about = "Query data feeds in a feed index")]
#[command(version)]
struct Args {
    /// Data directory holding feeds.sst
    #[arg(short, long, default_value = "./feedindex_data")]
    data_dir: String,

    /// JSON snapshot of unstable units
    #[arg(long)]
    volatile_snapshot: Option<String>,

    /// Log queries slower than this many milliseconds at warn level
    #[arg(long, default_value = "200")]
    slow_query_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check whether a feed satisfies a relation
    Exists {
        /// Comma-separated publisher addresses
        #[arg(short, long, value_delimiter = ',', required = true)]
        addresses: Vec<String>,

        /// Feed name
        #[arg(short, long)]
        feed: String,

        /// One of = != < <= > >=
        #[arg(short, long)]
        relation: String,

        /// Value to compare with (JSON number or string; bare text is a string)
        #[arg(long, allow_hyphen_values = true)]
        value: String,

        #[arg(long, default_value = "0")]
        min_mci: Mci,

        #[arg(long, default_value_t = Mci::MAX)]
        max_mci: Mci,

        /// Also consult unstable units
        #[arg(long)]
        volatile: bool,
    },

    /// Read the value of a feed
    Read {
        /// Comma-separated publisher addresses
        #[arg(short, long, value_delimiter = ',', required = true)]
        addresses: Vec<String>,

        /// Feed name
        #[arg(short, long)]
        feed: String,

        /// Only accept publications equal to this value
        #[arg(long, allow_hyphen_values = true)]
        value: Option<String>,

        #[arg(long, default_value = "0")]
        min_mci: Mci,

        #[arg(long, default_value_t = Mci::MAX)]
        max_mci: Mci,

        /// Also consult unstable units
        #[arg(long)]
        volatile: bool,

        /// last | abort | sort
        #[arg(long)]
        if_several: Option<String>,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,feedindex=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> feedindex::Result<()> {
    let mut builder = Config::builder()
        .data_dir(&args.data_dir)
        .slow_query_ms(args.slow_query_ms);
    if let Some(path) = &args.volatile_snapshot {
        builder = builder.volatile_snapshot(path);
    }
    let config = builder.build();

    let volatile = match &config.volatile_snapshot {
        Some(path) => VolatileState::load(path)?,
        None => VolatileState::new(),
    };
    let default_policy = config.default_tie_policy;
    let engine = FeedEngine::open(config)?;

    match args.command {
        Commands::Exists {
            addresses,
            feed,
            relation,
            value,
            min_mci,
            max_mci,
            volatile: consult,
        } => {
            let relation: Relation = relation.parse()?;
            let query = ExistsQuery::new(addresses, feed, relation, parse_value(value))
                .mci_range(min_mci, max_mci)
                .consult_volatile(consult);
            let found = engine.feed_exists(&volatile, &query)?;
            println!("{}", serde_json::to_string(&found)?);
        }
        Commands::Read {
            addresses,
            feed,
            value,
            min_mci,
            max_mci,
            volatile: consult,
            if_several,
        } => {
            let policy = match if_several {
                Some(p) => p.parse::<TiePolicy>()?,
                None => default_policy,
            };
            let mut query = ReadQuery::new(addresses, feed)
                .mci_range(min_mci, max_mci)
                .consult_volatile(consult)
                .tie_policy(policy);
            if let Some(v) = value {
                query = query.value(parse_value(v));
            }
            let result = engine.read_feed_value(&volatile, &query)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

/// `25` is a number, `"25"` and `abc` are text
fn parse_value(raw: String) -> FeedValue {
    serde_json::from_str(&raw).unwrap_or(FeedValue::Text(raw))
}
