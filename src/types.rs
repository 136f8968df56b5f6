/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use bytes::Bytes;

use crate::{
    error::{invalid_configuration, TransferError},
    store::StoreClient,
};

/// Request to download a single object into a local directory
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub(crate) key: String,
    pub(crate) destination_dir: PathBuf,
    pub(crate) concurrency: Option<usize>,
    pub(crate) chunk_size_bytes: Option<u64>,
}

impl DownloadRequest {
    /// Download `key` into `destination_dir/basename(key)`
    pub fn new(key: impl Into<String>, destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            destination_dir: destination_dir.into(),
            concurrency: None,
            chunk_size_bytes: None,
        }
    }

    /// Maximum number of chunks fetched at once. Overrides the downloader default.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    /// Size of each ranged chunk in bytes. Overrides the downloader default.
    pub fn chunk_size(mut self, size_bytes: u64) -> Self {
        self.chunk_size_bytes = Some(size_bytes);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn destination_dir(&self) -> &Path {
        &self.destination_dir
    }

    /// Local file name, the last `/` separated segment of the key
    pub(crate) fn file_name(&self) -> Result<&str, TransferError> {
        match self.key.rsplit('/').next() {
            Some(name) if !name.is_empty() && name != "." && name != ".." => Ok(name),
            _ => Err(invalid_configuration(format!(
                "object key '{}' does not name a file",
                self.key
            ))),
        }
    }
}

/// Shared state handed to every task of a single download
#[derive(Debug, Clone)]
pub(crate) struct DownloadHandle {
    pub(crate) store: Arc<dyn StoreClient>,
    pub(crate) key: Arc<str>,
}

/// Payload of one downloaded chunk
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkResult {
    /// index of the [`ChunkSpec`](crate::plan::ChunkSpec) this chunk satisfies
    pub index: u64,
    pub data: Bytes,
}

/// Index addressed storage for the chunks of one transfer. Each chunk owns exactly one
/// slot so results can arrive in any order without sorting afterwards.
#[derive(Debug)]
pub(crate) struct ChunkSlots {
    slots: Vec<Option<Bytes>>,
    filled: usize,
}

impl ChunkSlots {
    pub(crate) fn new(num_chunks: usize) -> Self {
        Self {
            slots: vec![None; num_chunks],
            filled: 0,
        }
    }

    pub(crate) fn insert(&mut self, chunk: ChunkResult) -> Result<(), TransferError> {
        let slot = usize::try_from(chunk.index)
            .ok()
            .and_then(|idx| self.slots.get_mut(idx))
            .ok_or_else(|| {
                TransferError::store(
                    "chunk response",
                    format!("unexpected chunk index {}", chunk.index),
                )
            })?;

        if slot.is_some() {
            return Err(TransferError::store(
                "chunk response",
                format!("duplicate chunk index {}", chunk.index),
            ));
        }

        *slot = Some(chunk.data);
        self.filled += 1;
        Ok(())
    }

    pub(crate) fn filled(&self) -> usize {
        self.filled
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.filled == self.slots.len()
    }

    /// Consume the slots, yielding every chunk in ascending index order
    pub(crate) fn into_ordered(self) -> Result<Vec<ChunkResult>, TransferError> {
        if !self.is_complete() {
            return Err(TransferError::store(
                "chunk response",
                format!("only {} of {} chunks received", self.filled, self.slots.len()),
            ));
        }

        Ok(self
            .slots
            .into_iter()
            .zip(0u64..)
            .filter_map(|(data, index)| data.map(|data| ChunkResult { index, data }))
            .collect())
    }
}
