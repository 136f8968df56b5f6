/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::{cmp, path::PathBuf, sync::Arc};

use tokio::{sync::mpsc, task::JoinSet};

use crate::{
    assemble::{self, PartialFile},
    discovery::{discover_obj_size, DiscoverResult},
    error::{invalid_configuration, io_failed, TransferError},
    plan::{ChunkSpec, Plan},
    store::StoreClient,
    types::{ChunkResult, ChunkSlots, DownloadHandle, DownloadRequest},
    DEFAULT_CHUNK_SIZE_BYTES, DEFAULT_CONCURRENCY, MEBI_BYTE,
};

#[derive(Debug, Clone)]
pub struct Builder {
    target_part_size_bytes: u64,
    concurrency: usize,
    store: Option<Arc<dyn StoreClient>>,
}

impl Builder {
    fn new() -> Self {
        Self {
            target_part_size_bytes: DEFAULT_CHUNK_SIZE_BYTES,
            concurrency: DEFAULT_CONCURRENCY,
            store: None,
        }
    }

    /// Size of the chunks the object will be downloaded in, in bytes.
    /// Objects smaller than this are downloaded with a single request.
    /// Defaults to 64 MiB.
    pub fn target_part_size(mut self, size_bytes: u64) -> Self {
        self.target_part_size_bytes = size_bytes;
        self
    }

    /// Maximum number of chunks fetched at once. Defaults to 12.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// The store objects are downloaded from
    pub fn store(mut self, store: Arc<dyn StoreClient>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<Downloader, TransferError> {
        let store = self
            .store
            .ok_or_else(|| invalid_configuration("a store client is required"))?;
        validate(self.concurrency, self.target_part_size_bytes)?;
        Ok(Downloader {
            target_part_size_bytes: self.target_part_size_bytes,
            concurrency: self.concurrency,
            store,
        })
    }
}

/// Downloads single objects as concurrently fetched byte range chunks
#[derive(Debug, Clone)]
pub struct Downloader {
    target_part_size_bytes: u64,
    concurrency: usize,
    store: Arc<dyn StoreClient>,
}

impl Downloader {
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Download `request.key` into `request.destination_dir`, returning the absolute path
    /// of the written file.
    ///
    /// The destination file is created fresh, replacing any existing file. If the download
    /// fails for any reason no file is left behind at the destination path. The destination
    /// directory is created if needed and never removed.
    pub async fn download(&self, request: DownloadRequest) -> Result<PathBuf, TransferError> {
        let concurrency = request.concurrency.unwrap_or(self.concurrency);
        let part_size = request.chunk_size_bytes.unwrap_or(self.target_part_size_bytes);
        validate(concurrency, part_size)?;
        let file_name = request.file_name()?.to_owned();

        tracing::info!("downloading {}", request.key);
        tracing::info!(
            "workers: {}, chunk size: {:.2} MiB",
            concurrency,
            part_size as f64 / MEBI_BYTE as f64
        );

        let handle = DownloadHandle {
            store: self.store.clone(),
            key: Arc::from(request.key.as_str()),
        };

        // make initial discovery about the object size before touching the filesystem
        let DiscoverResult { object_meta, plan } = discover_obj_size(&handle, part_size).await?;

        let dir = &request.destination_dir;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| io_failed("create directory", dir, e))?;
        let dir = tokio::fs::canonicalize(dir)
            .await
            .map_err(|e| io_failed("resolve", dir, e))?;

        let dest = PartialFile::new(dir.join(file_name));
        tracing::info!("destination: {}", dest.path().display());

        let written = match plan {
            Plan::Direct => {
                tracing::info!("small file, downloading directly");
                let body = handle.store.get_object(&handle.key).await?;
                assemble::write_stream(dest.path(), body).await?
            }
            Plan::Ranged(chunks) => download_chunks(&handle, &dest, chunks, concurrency).await?,
        };

        if written != object_meta.total_size() {
            return Err(TransferError::store(
                format!("downloading {}", handle.key),
                format!(
                    "received {} bytes, expected {}",
                    written,
                    object_meta.total_size()
                ),
            ));
        }

        let path = dest.commit();
        tracing::info!("successfully downloaded to {}", path.display());
        Ok(path)
    }
}

fn validate(concurrency: usize, part_size: u64) -> Result<(), TransferError> {
    if concurrency == 0 {
        return Err(invalid_configuration("concurrency must be at least 1"));
    }
    if part_size == 0 {
        return Err(invalid_configuration("chunk size must be at least 1 byte"));
    }
    Ok(())
}

/// Fetch every chunk with at most `concurrency` workers and assemble them into `dest`.
///
/// Blocks until every spawned task has finished, successfully or not. The first failure
/// stops further chunks from being handed out but in flight requests run to completion.
async fn download_chunks(
    handle: &DownloadHandle,
    dest: &PartialFile,
    chunks: Vec<ChunkSpec>,
    concurrency: usize,
) -> Result<u64, TransferError> {
    let num_chunks = chunks.len();
    let workers = cmp::min(concurrency, num_chunks);
    tracing::info!("downloading in {} chunks using {} workers", num_chunks, workers);

    let (work_tx, work_rx) = async_channel::bounded(workers);
    let (comp_tx, mut comp_rx) = mpsc::channel(workers);

    let mut tasks = JoinSet::new();
    tasks.spawn(distribute_work(chunks, work_tx));
    for id in 0..workers {
        let worker = chunk_downloader(id, handle.clone(), work_rx.clone(), comp_tx.clone());
        tasks.spawn(worker);
    }
    drop(comp_tx);

    let mut slots = ChunkSlots::new(num_chunks);
    let mut failure: Option<TransferError> = None;

    // completion channel closes once every worker has exited
    while let Some(result) = comp_rx.recv().await {
        let result = match result {
            Ok(chunk) if failure.is_none() => {
                let (seq, size) = (chunk.index, chunk.data.len());
                slots.insert(chunk).map(|_| (seq, size))
            }
            Ok(chunk) => {
                tracing::trace!("discarding chunk seq={} after failure", chunk.index);
                continue;
            }
            Err(err) => Err(err),
        };

        match result {
            Ok((seq, size)) => tracing::info!(
                "progress: {:.1}% - downloaded chunk {}/{} ({} bytes)",
                slots.filled() as f64 / slots.len() as f64 * 100.0,
                seq + 1,
                num_chunks,
                size
            ),
            Err(err) if failure.is_none() => {
                tracing::debug!(error = %err, "chunk failed, no further chunks will be started");
                work_rx.close();
                failure = Some(err);
            }
            Err(err) => tracing::debug!(error = %err, "additional chunk failure"),
        }
    }

    // every worker has exited; a worker that panicked never reported, so the distributor
    // may still be blocked on a full queue
    work_rx.close();

    // join barrier, nothing is assembled while a task is outstanding
    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            tracing::debug!(error = %err, "download task did not complete");
            failure.get_or_insert(TransferError::Task(err));
        }
    }

    if let Some(err) = failure {
        return Err(err);
    }

    let ordered = slots.into_ordered()?;
    tracing::info!("writing {} chunks to {}", ordered.len(), dest.path().display());
    assemble::write_chunks(dest.path(), ordered).await
}

// Worker function that processes requests from the `requests` channel and
// sends the result back on the `completed` channel.
async fn chunk_downloader(
    id: usize,
    handle: DownloadHandle,
    requests: async_channel::Receiver<ChunkSpec>,
    completed: mpsc::Sender<Result<ChunkResult, TransferError>>,
) {
    while let Ok(chunk) = requests.recv().await {
        let seq = chunk.index;
        tracing::trace!("worker {} recv'd request for chunk seq {}", id, seq);
        let result = download_chunk(&handle, chunk).await;
        if let Err(err) = &result {
            tracing::warn!(error = %err, "error downloading chunk {}", seq);
        }
        if let Err(err) = completed.send(result).await {
            tracing::debug!(error = ?err, "chunk worker send failed");
            return;
        }
        tracing::trace!("worker {} completed chunk seq {}", id, seq);
    }
    tracing::trace!("req channel closed, worker {} finished", id);
}

async fn download_chunk(
    handle: &DownloadHandle,
    chunk: ChunkSpec,
) -> Result<ChunkResult, TransferError> {
    let data = handle
        .store
        .get_object_range(&handle.key, chunk.range.clone())
        .await?;

    let received = data.len() as u64;
    if received != chunk.size() {
        return Err(TransferError::store(
            format!(
                "chunk {} (bytes {}-{}) of {}",
                chunk.index,
                chunk.range.start(),
                chunk.range.end(),
                handle.key
            ),
            format!("received {} bytes, expected {}", received, chunk.size()),
        ));
    }

    Ok(ChunkResult {
        index: chunk.index,
        data,
    })
}

async fn distribute_work(chunks: Vec<ChunkSpec>, tx: async_channel::Sender<ChunkSpec>) {
    for chunk in chunks {
        tracing::trace!("distributing chunk(size={}): {:?}", chunk.size(), chunk);
        if tx.send(chunk).await.is_err() {
            tracing::debug!("work queue closed, remaining chunks not distributed");
            return;
        }
    }

    tracing::trace!("work fully distributed");
    tx.close();
}
