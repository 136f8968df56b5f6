/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::{
    error::TransferError,
    object_meta::ObjectMetadata,
    plan::{plan, Plan},
    types::DownloadHandle,
    MEBI_BYTE,
};

/// Result of initial object discovery
#[derive(Debug, Clone)]
pub(crate) struct DiscoverResult {
    // the discovered metadata
    pub(crate) object_meta: ObjectMetadata,
    // how the object will be fetched
    pub(crate) plan: Plan,
}

/// Discover the object size and plan the chunks to fetch. Nothing is written locally.
pub(crate) async fn discover_obj_size(
    handle: &DownloadHandle,
    part_size: u64,
) -> Result<DiscoverResult, TransferError> {
    let object_meta = handle.store.head_object(&handle.key).await?;
    let total_size = object_meta.total_size();
    tracing::info!(
        "file size: {} bytes ({:.2} MiB)",
        total_size,
        total_size as f64 / MEBI_BYTE as f64
    );

    let plan = plan(total_size, part_size)?;
    Ok(DiscoverResult { object_meta, plan })
}
