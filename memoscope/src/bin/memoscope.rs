//! Command-line access to a Memos server through the shaping layer.
//!
//! Connection settings come from the environment (`MEMOS_URL`,
//! `MEMOS_ACCESS_TOKEN`, `DEFAULT_TAG`, `MEMOS_TIMEOUT_SECS`); flags override them.
//! Results are printed to stdout as pretty JSON, logs go to stderr.
//!
//! Usage:
//!     memoscope search "quarterly report" --format minimal --limit 5
//!     memoscope latest --format summary
//!     memoscope by-tag work

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use memoscope::config::ClientConfig;
use memoscope::{ListOptions, MemoStore, MemosClient, ResponseFormat, SearchParams};

const DEFAULT_LOG_FILTER: &str = "memoscope=info";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Memos server URL (defaults to MEMOS_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Access token (defaults to MEMOS_ACCESS_TOKEN or MEMOS_API_KEY)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Tag attached to created memos (defaults to DEFAULT_TAG or #MCP)
    #[arg(long, global = true)]
    default_tag: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ranked, paginated search
    Search {
        #[arg(default_value = "")]
        query: String,
        #[arg(short, long)]
        limit: Option<i64>,
        #[arg(short, long)]
        offset: Option<i64>,
        /// id_only, minimal, summary or full
        #[arg(short, long)]
        format: Option<String>,
        /// Inclusive lower bound on creation time, e.g. 2024-05-01T00:00:00Z
        #[arg(long)]
        date_from: Option<String>,
        #[arg(long)]
        date_to: Option<String>,
        /// Keep memos carrying any of these tags
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// Char budget for summaries and snippets
        #[arg(long)]
        max_length: Option<i64>,
    },
    /// Most recent memos
    Latest {
        #[arg(short, long)]
        limit: Option<usize>,
        #[arg(short, long, default_value = "full")]
        format: String,
        #[arg(long)]
        max_length: Option<usize>,
    },
    /// Most recent memos with a tag
    ByTag {
        tag: String,
        #[arg(short, long)]
        limit: Option<usize>,
        #[arg(short, long, default_value = "full")]
        format: String,
        #[arg(long)]
        max_length: Option<usize>,
    },
    /// Fetch one memo (`memos/XYZ` or `XYZ`)
    Get {
        id: String,
        #[arg(short, long)]
        format: Option<String>,
    },
    Create {
        content: String,
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        #[arg(short, long)]
        format: Option<String>,
    },
    Update {
        id: String,
        content: String,
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        #[arg(short, long)]
        format: Option<String>,
    },
    Delete {
        id: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<ClientConfig> {
    let timeout = args.timeout.map(|t| t.to_string());
    let overlay = |key: &str| -> Option<String> {
        let flag = match key {
            "MEMOS_URL" => args.url.clone(),
            "MEMOS_ACCESS_TOKEN" => args.token.clone(),
            "DEFAULT_TAG" => args.default_tag.clone(),
            "MEMOS_TIMEOUT_SECS" => timeout.clone(),
            _ => None,
        };
        flag.or_else(|| std::env::var(key).ok())
    };
    ClientConfig::from_lookup(overlay).context("Failed to load Memos connection settings")
}

fn parse_format(raw: Option<&str>) -> Result<Option<ResponseFormat>> {
    Ok(raw.map(str::parse::<ResponseFormat>).transpose()?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to encode response")?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = load_config(&args)?;
    let client = MemosClient::new(&config).context("Failed to build HTTP client")?;
    let store = MemoStore::new(client).with_default_tag(config.default_tag.clone());

    match args.command {
        Command::Search { query, limit, offset, format, date_from, date_to, tags, max_length } => {
            let params = SearchParams {
                query,
                limit,
                offset,
                format,
                date_from,
                date_to,
                tags_filter: tags,
                max_snippet_length: max_length,
            };
            print_json(&store.search_params(params).await.context("Search failed")?)
        }
        Command::Latest { limit, format, max_length } => {
            let options = ListOptions { limit, format: format.parse()?, content_max_length: max_length };
            print_json(&store.get_latest(options).await.context("Listing latest memos failed")?)
        }
        Command::ByTag { tag, limit, format, max_length } => {
            let options = ListOptions { limit, format: format.parse()?, content_max_length: max_length };
            let memos = store
                .get_by_tag(&tag, options)
                .await
                .with_context(|| format!("Listing memos tagged {} failed", tag))?;
            print_json(&memos)
        }
        Command::Get { id, format } => {
            let memo = store
                .get_memo(&id, parse_format(format.as_deref())?)
                .await
                .with_context(|| format!("Fetching {} failed", id))?;
            print_json(&memo)
        }
        Command::Create { content, tags, format } => {
            let memo = store
                .create_memo(&content, &tags, parse_format(format.as_deref())?)
                .await
                .context("Creating memo failed")?;
            print_json(&memo)
        }
        Command::Update { id, content, tags, format } => {
            let memo = store
                .update_memo(&id, &content, &tags, parse_format(format.as_deref())?)
                .await
                .with_context(|| format!("Updating {} failed", id))?;
            print_json(&memo)
        }
        Command::Delete { id } => {
            let ack = store.delete_memo(&id).await.with_context(|| format!("Deleting {} failed", id))?;
            print_json(&ack)
        }
    }
}
