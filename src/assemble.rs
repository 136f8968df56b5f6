/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::{
    io,
    path::{Path, PathBuf},
};

use aws_smithy_types::byte_stream::ByteStream;
use bytes::Buf;
use tokio::{
    fs::File,
    io::{AsyncWrite, AsyncWriteExt},
};

use crate::{
    error::{io_failed, TransferError},
    types::ChunkResult,
};

/// Write `chunks` to a freshly created (or truncated) file at `path`.
///
/// Chunks must already be complete and in ascending index order starting at 0; the
/// file is not opened at all if they are not. Returns the number of bytes written.
pub async fn write_chunks<I>(path: &Path, chunks: I) -> Result<u64, TransferError>
where
    I: IntoIterator<Item = ChunkResult>,
{
    let chunks: Vec<ChunkResult> = chunks.into_iter().collect();
    if let Some((expected, chunk)) = chunks
        .iter()
        .zip(0u64..)
        .map(|(chunk, expected)| (expected, chunk))
        .find(|(expected, chunk)| chunk.index != *expected)
    {
        return Err(TransferError::Io {
            context: format!("refusing to assemble {}", path.display()),
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("chunk {} found where chunk {} was expected", chunk.index, expected),
            ),
        });
    }

    let mut dest = create(path).await?;
    let mut wc = 0;
    for chunk in chunks {
        tracing::trace!("writing chunk; seq={}", chunk.index);
        wc += write_chunk(&mut dest, chunk.data)
            .await
            .map_err(|e| io_failed("write", path, e))?;
    }
    finish(path, dest).await?;
    Ok(wc)
}

/// Stream a whole object body to a freshly created (or truncated) file at `path`
pub(crate) async fn write_stream(path: &Path, mut body: ByteStream) -> Result<u64, TransferError> {
    let mut dest = create(path).await?;
    let mut wc = 0;
    while let Some(data) = body
        .try_next()
        .await
        .map_err(|e| TransferError::store(format!("reading body for {}", path.display()), e))?
    {
        wc += write_chunk(&mut dest, data)
            .await
            .map_err(|e| io_failed("write", path, e))?;
    }
    finish(path, dest).await?;
    Ok(wc)
}

async fn create(path: &Path) -> Result<File, TransferError> {
    File::create(path)
        .await
        .map_err(|e| io_failed("create", path, e))
}

async fn finish(path: &Path, mut dest: File) -> Result<(), TransferError> {
    dest.flush().await.map_err(|e| io_failed("flush", path, e))?;
    dest.sync_all().await.map_err(|e| io_failed("sync", path, e))
}

// Completely write a chunk to dest
async fn write_chunk<T: AsyncWrite + Unpin, B: Buf>(dest: &mut T, mut data: B) -> io::Result<u64> {
    let mut wc = 0;
    while data.has_remaining() {
        let n = dest.write_buf(&mut data).await?;
        if n == 0 {
            return Err(io::ErrorKind::WriteZero.into());
        }
        wc += n as u64;
    }
    Ok(wc)
}

/// Removes the destination file when dropped unless the transfer was committed.
/// Covers every exit path of a download, including early returns and task panics.
#[derive(Debug)]
pub(crate) struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the file, the transfer completed
    pub(crate) fn commit(mut self) -> PathBuf {
        self.committed = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::warn!("cleaned up partial file {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                error = %e,
                "failed to clean up partial file {}",
                self.path.display()
            ),
        }
    }
}
