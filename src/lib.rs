/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/* Automatically managed default lints */
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
/* End of automatically managed default lints */

//! Chunked parallel download of a single object from an S3 compatible store.
//!
//! An object is split into byte ranges, the ranges are fetched concurrently by a bounded
//! pool of workers and the results are written back to a single local file in order.
//!
//! ```no_run
//! # async fn run() -> Result<(), s3_chunked_download::TransferError> {
//! use std::sync::Arc;
//! use s3_chunked_download::{config::StoreConfig, download::Downloader, s3::S3Store, DownloadRequest};
//!
//! let config = StoreConfig::from_env()?;
//! let downloader = Downloader::builder()
//!     .store(Arc::new(S3Store::from_config(&config)))
//!     .build()?;
//!
//! let path = downloader
//!     .download(DownloadRequest::new("models/checkpoint.safetensors", "/workspace/models"))
//!     .await?;
//! println!("{}", path.display());
//! # Ok(())
//! # }
//! ```

#![warn(
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

pub(crate) const MEBI_BYTE: u64 = 1024 * 1024;

/// Default number of concurrent chunk workers
pub const DEFAULT_CONCURRENCY: usize = 12;

/// Default chunk size, 64 MiB
pub const DEFAULT_CHUNK_SIZE_BYTES: u64 = 64 * MEBI_BYTE;

/// Convert a size given in mebibytes into bytes
pub fn mebibytes(n: u64) -> u64 {
    n.saturating_mul(MEBI_BYTE)
}

mod assemble;
mod discovery;
mod header;
mod object_meta;
mod types;

pub mod config;
pub mod download;
pub mod error;
pub mod plan;
pub mod s3;
pub mod store;

pub use assemble::write_chunks;
pub use aws_smithy_types::byte_stream::ByteStream;
pub use error::TransferError;
pub use object_meta::ObjectMetadata;
pub use types::{ChunkResult, DownloadRequest};
