/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::Context;
use clap::Parser;
use s3_chunked_download::{
    config::{StoreConfig, ACCESS_KEY_ID_ENV, BUCKET_ENV, ENDPOINT_ENV, REGION_ENV, SECRET_ACCESS_KEY_ENV},
    download::Downloader,
    mebibytes,
    s3::S3Store,
    DownloadRequest,
};
use tracing_subscriber::EnvFilter;

/// Download files from S3 using concurrent workers
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, after_help = env_help())]
struct Cli {
    /// S3 object key (path in bucket)
    key: String,

    /// Destination folder path
    dest_dir: PathBuf,

    /// Number of concurrent workers
    #[arg(long, value_name = "NUM", default_value_t = 12, value_parser = clap::value_parser!(u64).range(1..))]
    workers: u64,

    /// Chunk size in MB
    #[arg(long, value_name = "MB", default_value_t = 64, value_parser = clap::value_parser!(u64).range(1..))]
    chunk_size: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn env_help() -> String {
    format!(
        "Environment variables required:\n  {:<30}S3 bucket name\n  {:<30}S3 access key\n  {:<30}S3 secret key\n  {:<30}S3 region\n  {:<30}S3 endpoint URL (optional)",
        BUCKET_ENV, ACCESS_KEY_ID_ENV, SECRET_ACCESS_KEY_ENV, REGION_ENV, ENDPOINT_ENV
    )
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<PathBuf> {
    let config = StoreConfig::from_env()?;
    tracing::debug!(?config, "loaded store configuration");

    let downloader = Downloader::builder()
        .store(Arc::new(S3Store::from_config(&config)))
        .build()?;

    let request = DownloadRequest::new(&cli.key, &cli.dest_dir)
        .concurrency(usize::try_from(cli.workers).context("worker count out of range")?)
        .chunk_size(mebibytes(cli.chunk_size));

    tracing::info!("downloading from s3://{}/{}", config.bucket(), cli.key);
    let path = downloader
        .download(request)
        .await
        .context("failed to download from S3")?;
    Ok(path)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
