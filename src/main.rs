//! s3-fetch
//!
//! Downloads a single `s3://` URL to stdout or a file, resolving AWS
//! credentials the same way the library does.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use s3_url_handler::{S3HandlerFactory, UrlHandlers};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

#[derive(Debug, Parser)]
#[command(version, about = "Fetch an object addressed by an s3:// URL")]
struct Args {
    /// URL of the form s3://<region-host>/<bucket>/<key>
    url: Url,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Logs go to stderr, stdout may carry the object
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::info!("Starting s3-fetch v{}", env!("CARGO_PKG_VERSION"));

    let mut handlers = UrlHandlers::new();
    S3HandlerFactory::from_env()?.install(&mut handlers);

    let mut connection = handlers
        .open(&args.url)
        .with_context(|| format!("No handler for scheme '{}'", args.url.scheme()))?;
    connection.connect()?;
    let mut stream = connection
        .open_stream()
        .with_context(|| format!("Failed to open {}", args.url))?;

    let copied = match &args.output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to create {:?}", path))?;
            let copied = io::copy(&mut stream, &mut file)?;
            file.flush()?;
            copied
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            let copied = io::copy(&mut stream, &mut out)?;
            out.flush()?;
            copied
        }
    };

    tracing::info!("Fetched {} bytes from {}", copied, args.url);

    Ok(())
}
