// src/main.rs
use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use notion2site::constants::WRITE_BACK_PACING_MS;
use notion2site::feeds::APPLY_TEAM_LINKS_TAG;
use notion2site::{
    apply_pending_file, feed_sync, CommandLineInput, HttpImageSource, ImageMagick, NotionClient,
    NotionHttpClient, RunConfig, SiteLayout, SyncContext, Task,
};
use std::fs;
use std::sync::Arc;
use std::time::Duration;

/// Tag for failures that happen before any feed starts.
const APP_TAG: &str = "notion2site";

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let log_file_path = std::env::temp_dir().join("notion2site.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stdout_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)
        .context("could not open log file")?;

    let config = Config::builder()
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(log_level)))
                .build("stdout", Box::new(stdout_appender)),
        )
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stdout")
                .appender("file")
                .build(LevelFilter::Debug),
        )?;

    log4rs::init_config(config)?;
    log::debug!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

fn build_context(config: &RunConfig) -> anyhow::Result<SyncContext> {
    let transport = NotionHttpClient::new(&config.api_key)?;
    Ok(SyncContext {
        client: NotionClient::new(Arc::new(transport)),
        images: Arc::new(HttpImageSource::new()?),
        transcoder: Arc::new(ImageMagick::default()),
        layout: SiteLayout::new(config.root.clone()),
        concurrency: config.concurrency,
        write_back_pacing: Duration::from_millis(WRITE_BACK_PACING_MS),
    })
}

/// Runs the resolved task. Returns whether every part of it succeeded;
/// failures are logged under the tag of the feed or command that raised them.
async fn execute(config: &RunConfig) -> anyhow::Result<bool> {
    let ctx = build_context(config)?;

    match &config.task {
        Task::Sync(feeds) => {
            let mut all_ok = true;
            for (feed, database) in feeds {
                let runner = feed_sync(*feed, database.clone());
                match runner.sync(&ctx).await {
                    Ok(report) => log::debug!("[{}] {:?}", feed.log_tag(), report),
                    Err(e) => {
                        log::error!("[{}] Failed: {}", feed.log_tag(), e);
                        all_ok = false;
                    }
                }
            }
            Ok(all_ok)
        }
        Task::ApplyUpdates { file } => {
            match apply_pending_file(&ctx.client, file, ctx.write_back_pacing, APPLY_TEAM_LINKS_TAG)
                .await
            {
                Ok(_) => Ok(true),
                Err(e) => {
                    log::error!("[{}] Failed: {}", APPLY_TEAM_LINKS_TAG, e);
                    Ok(false)
                }
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = CommandLineInput::parse();

    if let Err(e) = setup_logging(cli.verbose) {
        eprintln!("[{}] Failed: {:#}", APP_TAG, e);
        std::process::exit(1);
    }

    let outcome = match RunConfig::resolve(cli) {
        Ok(config) => execute(&config).await,
        Err(e) => Err(e.into()),
    };

    match outcome {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            log::error!("[{}] Failed: {:#}", APP_TAG, e);
            std::process::exit(1);
        }
    }
}
