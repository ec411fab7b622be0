use std::sync::Arc;

use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;
use webstash::{CallbackSink, FetchRequest, Payload, Webstash, WebstashConfig};

mod cli;
mod error;

use cli::{CliArgs, Command};
use error::AppError;

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    let args = CliArgs::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Initialization(e.to_string()))?;

    let mut builder = WebstashConfig::builder();
    if let Some(dir) = &args.cache_dir {
        builder = builder.with_cache_dir(dir);
    }
    let stash = Webstash::new(builder.build())?;

    match args.command {
        Command::Fetch {
            url,
            output,
            text,
            no_cache,
            ttl,
            refresh,
        } => fetch(&stash, url, output, text, no_cache, ttl, refresh).await,
        Command::Clear { url, all } => clear(&stash, url, all).await,
        Command::Status { url } => {
            if stash.is_cached(&url).await {
                info!(url = %url, "cached entry present");
            } else {
                info!(url = %url, "no cached entry");
            }
            Ok(())
        }
    }
}

async fn fetch(
    stash: &Webstash,
    url: String,
    output: Option<std::path::PathBuf>,
    text: bool,
    no_cache: bool,
    ttl: u32,
    refresh: bool,
) -> Result<(), AppError> {
    let mut builder = if text {
        FetchRequest::text(&url)
    } else {
        FetchRequest::image(&url).into_sink(Arc::new(CallbackSink::new(|payload: &Payload| {
            info!(
                size = payload.bytes.len(),
                format = ?payload.encode_format,
                "image payload delivered"
            );
        })))
    };

    builder = builder
        .with_cache(!no_cache)
        .with_ttl_hours(ttl)
        .with_progress_action(Arc::new(|percent: u8| {
            info!("downloading: {percent}%");
        }))
        .with_already_cached_action(Arc::new(|| {
            info!("serving from cache");
        }));

    let request = builder.build();
    let payload = if refresh {
        stash.refresh(request, None).await?
    } else {
        stash.fetch(request).await?
    };

    match output {
        Some(path) => {
            tokio::fs::write(&path, &payload.bytes).await?;
            info!(path = %path.display(), size = payload.bytes.len(), "payload written");
        }
        None if text => println!("{}", payload.text()),
        None => info!(size = payload.bytes.len(), "fetched payload"),
    }

    Ok(())
}

async fn clear(stash: &Webstash, url: Option<String>, all: bool) -> Result<(), AppError> {
    match (url, all) {
        (_, true) => {
            stash.clear_all().await?;
            Ok(())
        }
        (Some(url), false) => {
            stash.clear_entry(&url).await?;
            Ok(())
        }
        (None, false) => Err(AppError::Usage(
            "clear requires a URL or the --all flag".into(),
        )),
    }
}
