use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use curator_lib::{Curator, CuratorConfig};

#[derive(Parser)]
#[command(name = "curator")]
#[command(version)]
#[command(about = "Keep a deduplicated catalog of video metadata fetched with yt-dlp")]
#[command(long_about = None)]
struct Cli {
    /// Directory holding collection.json, urls.txt and the cookie jar
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Fetch with the cookie jar (serial, authenticated)
    #[arg(long)]
    use_cookie: bool,

    /// Maximum concurrent lookups without cookies
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Per-lookup socket timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u32>,

    /// Proxy URL handed to yt-dlp
    #[arg(long, value_name = "URL")]
    proxy: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite the browser cookie export as a Netscape cookie jar
    ConvertCookie,
    /// Check that the collection file loads
    Load,
    /// Rewrite the collection file from its current contents
    Save,
    /// Fetch every pending URL, merge the results and requeue failures
    Fetch,
    /// Replace the pending URLs with every URL in the collection
    Extract,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("curator_lib={0},curator={0}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match CuratorConfig::load_or_default(&cli.data_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to read configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if cli.use_cookie {
        config = config.with_use_cookie(true);
    }
    if let Some(jobs) = cli.jobs {
        config = config.with_max_concurrent(jobs);
    }
    if let Some(timeout) = cli.timeout {
        config = config.with_timeout(timeout);
    }
    if cli.proxy.is_some() {
        config = config.with_proxy(cli.proxy);
    }

    let mut curator = Curator::new(config);
    let loaded = curator.load();

    // A collection that exists but does not parse must not be overwritten
    let collection_path = curator.config().collection_path();
    let writes_collection = matches!(cli.command, Command::Save | Command::Fetch | Command::Extract);
    if writes_collection && !loaded && collection_path.exists() {
        println!("Failed to load {}; leaving it untouched", collection_path.display());
        return ExitCode::FAILURE;
    }

    let ok = match cli.command {
        Command::ConvertCookie => say(
            curator.convert_cookie(),
            "Cookie converted",
            "Failed to convert cookie",
        ),
        Command::Load => say(loaded, "Loaded", "Failed to load"),
        Command::Save => say(curator.save(), "Saved", "Failed to save"),
        Command::Fetch => {
            let fetched = say(curator.fetch_urls(), "Fetched URLs", "Failed to fetch URLs");
            say(curator.save(), "Saved", "Failed to save") && fetched
        }
        Command::Extract => {
            let extracted = match curator.extract_urls() {
                Some(count) => {
                    println!("Extracted {} URLs", count);
                    true
                }
                None => {
                    println!("Failed to extract URLs");
                    false
                }
            };
            say(curator.save(), "Saved", "Failed to save") && extracted
        }
    };

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn say(ok: bool, success: &str, failure: &str) -> bool {
    println!("{}", if ok { success } else { failure });
    ok
}
