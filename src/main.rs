use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use entrez_stream::config::{get_config, load_config};
use entrez_stream::models::{Record, SearchRequest};
use entrez_stream::pipeline::{EntrezClient, RecordStream};
use futures_util::TryStreamExt;
use serde::Serialize;
use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Entrez Stream - Search, link and download NCBI Entrez data as NDJSON streams
#[derive(Parser, Debug)]
#[command(name = "entrez-stream")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search, link and download NCBI Entrez data", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print JSON output instead of one object per line
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search a database and stream normalized records
    Search {
        /// Database name (sra, assembly, bioproject, ...)
        db: String,

        /// Search terms (read from stdin, one per line, when omitted)
        terms: Vec<String>,

        /// Stop after this many records
        #[arg(long, short)]
        limit: Option<u64>,

        /// Records requested per result page
        #[arg(long)]
        throughput: Option<u64>,
    },

    /// Search a database and stream raw record data (fasta, xml, ...)
    Fetch {
        /// Database name
        db: String,

        /// Search terms (read from stdin when omitted)
        terms: Vec<String>,

        /// Retrieval format, defaulting to the database's registered one
        #[arg(long)]
        rettype: Option<String>,

        #[arg(long, short)]
        limit: Option<u64>,
    },

    /// Search a database and stream downloadable file locations
    Urls {
        /// Database name (sra or assembly)
        db: String,

        /// Search terms (read from stdin when omitted)
        terms: Vec<String>,

        #[arg(long, short)]
        limit: Option<u64>,
    },

    /// Search a database and download every located dataset file
    Download {
        /// Database name (sra or assembly)
        db: String,

        /// Search terms (read from stdin when omitted)
        terms: Vec<String>,

        /// Directory for per-uid dataset directories
        #[arg(long, short)]
        out_dir: Option<PathBuf>,

        #[arg(long, short)]
        limit: Option<u64>,
    },

    /// Resolve cross-database links for source uids
    Link {
        /// Source database name
        src_db: String,

        /// Destination database name
        dest_db: String,

        /// Source uids (read from stdin when omitted)
        uids: Vec<String>,
    },

    /// Attach full records for a property's ids to NDJSON records on stdin
    Expand {
        /// Property whose `<property>id` field carries the ids
        property: String,

        /// Field to attach the matched records under (defaults to the property)
        #[arg(long)]
        dest: Option<String>,
    },

    /// Attach linked destination uids to NDJSON records on stdin
    Plink {
        /// Property whose `<property>id` field carries the source uids
        property: String,

        /// Destination database name
        dest_db: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity; data goes to stdout, so
    // logs go to stderr
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("entrez_stream={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => get_config(),
    };

    if let Commands::Download {
        out_dir: Some(dir), ..
    } = &cli.command
    {
        config.downloads.out_dir = dir.clone();
    }

    let client = EntrezClient::new(config)?;
    let pretty = cli.pretty;

    match cli.command {
        Commands::Search {
            db,
            terms,
            limit,
            throughput,
        } => {
            for term in terms_or_stdin(terms)? {
                let mut request = SearchRequest::new(&db, &term);
                if let Some(limit) = limit {
                    request = request.limit(limit);
                }
                if let Some(size) = throughput {
                    request = request.page_size(size);
                }
                emit_stream(client.search(request), pretty).await?;
            }
        }

        Commands::Fetch {
            db,
            terms,
            rettype,
            limit,
        } => {
            for term in terms_or_stdin(terms)? {
                let mut request = SearchRequest::new(&db, &term);
                if let Some(limit) = limit {
                    request = request.limit(limit);
                }
                let mut chunks = client.fetch_data(request, rettype.clone());
                let mut stdout = std::io::stdout().lock();
                while let Some(chunk) = chunks.try_next().await? {
                    stdout.write_all(chunk.as_bytes())?;
                }
            }
        }

        Commands::Urls { db, terms, limit } => {
            for term in terms_or_stdin(terms)? {
                let mut request = SearchRequest::new(&db, &term);
                if let Some(limit) = limit {
                    request = request.limit(limit);
                }
                emit_stream(client.urls(request), pretty).await?;
            }
        }

        Commands::Download {
            db, terms, limit, ..
        } => {
            for term in terms_or_stdin(terms)? {
                let mut request = SearchRequest::new(&db, &term);
                if let Some(limit) = limit {
                    request = request.limit(limit);
                }
                emit_stream(client.download(request), pretty).await?;
            }
        }

        Commands::Link {
            src_db,
            dest_db,
            uids,
        } => {
            for uid in terms_or_stdin(uids)? {
                emit_stream(client.link(&src_db, &dest_db, &uid), pretty).await?;
            }
        }

        Commands::Expand { property, dest } => {
            let input = stdin_records()?;
            emit_stream(client.expand(&property, dest.as_deref(), input), pretty).await?;
        }

        Commands::Plink { property, dest_db } => {
            let input = stdin_records()?;
            emit_stream(client.plink(&property, &dest_db, input), pretty).await?;
        }
    }

    Ok(())
}

/// Explicit arguments, or one entry per non-empty stdin line when none
/// were given.
fn terms_or_stdin(args: Vec<String>) -> Result<Vec<String>> {
    if !args.is_empty() {
        return Ok(args);
    }

    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        anyhow::bail!("no terms given and stdin is a terminal");
    }

    let mut terms = Vec::new();
    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            terms.push(trimmed.to_string());
        }
    }
    Ok(terms)
}

/// Parse stdin as NDJSON records for the record-transform commands.
fn stdin_records() -> Result<RecordStream> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        anyhow::bail!("expected NDJSON records on stdin");
    }

    let mut records = Vec::new();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: Record =
            serde_json::from_str(&line).with_context(|| format!("bad record line: {}", line))?;
        records.push(Ok(record));
    }

    Ok(Box::pin(futures_util::stream::iter(records)))
}

/// Drain a stream to stdout, one JSON document per item.
async fn emit_stream<T, S>(stream: S, pretty: bool) -> Result<()>
where
    T: Serialize,
    S: futures_util::Stream<Item = Result<T, entrez_stream::EntrezError>>,
{
    futures_util::pin_mut!(stream);
    let mut stdout = std::io::stdout().lock();

    while let Some(item) = stream.try_next().await? {
        if pretty {
            serde_json::to_writer_pretty(&mut stdout, &item)?;
        } else {
            serde_json::to_writer(&mut stdout, &item)?;
        }
        stdout.write_all(b"\n")?;
    }

    Ok(())
}
