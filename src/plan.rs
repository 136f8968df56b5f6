/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Chunk planning: how an object of a known size is split into ranged requests.

use std::ops::RangeInclusive;

use crate::error::{invalid_configuration, TransferError};

/// A contiguous, inclusive byte range of the remote object fetched as one unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSpec {
    /// zero based ordinal, also the position of the chunk in the output
    pub index: u64,
    /// inclusive byte range
    pub range: RangeInclusive<u64>,
}

impl ChunkSpec {
    /// Size of this chunk in bytes
    pub fn size(&self) -> u64 {
        self.range.end() - self.range.start() + 1
    }
}

/// How an object should be transferred
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Object is smaller than one chunk (or empty), fetch it with a single request
    Direct,
    /// Fetch the object as the given ordered, non-empty set of chunks
    Ranged(Vec<ChunkSpec>),
}

impl Plan {
    /// Number of ranged chunks, zero for direct transfers
    pub fn num_chunks(&self) -> usize {
        match self {
            Plan::Direct => 0,
            Plan::Ranged(chunks) => chunks.len(),
        }
    }
}

/// Split an object of `total_size` bytes into chunks of at most `chunk_size` bytes.
///
/// Objects smaller than a single chunk, including empty objects, are planned as
/// [`Plan::Direct`]. Otherwise the returned chunks exactly partition `[0, total_size)`
/// and only the last chunk may be shorter than `chunk_size`.
pub fn plan(total_size: u64, chunk_size: u64) -> Result<Plan, TransferError> {
    if chunk_size == 0 {
        return Err(invalid_configuration("chunk size must be at least 1 byte"));
    }

    if total_size == 0 || total_size < chunk_size {
        return Ok(Plan::Direct);
    }

    let num_chunks = total_size.div_ceil(chunk_size);
    let chunks = (0..num_chunks)
        .map(|index| {
            let start = index * chunk_size;
            let end = start.saturating_add(chunk_size).min(total_size) - 1;
            ChunkSpec {
                index,
                range: start..=end,
            }
        })
        .collect();

    Ok(Plan::Ranged(chunks))
}
