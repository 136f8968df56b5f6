/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! The object store operations a download depends on.

use std::{fmt, ops::RangeInclusive};

use async_trait::async_trait;
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;

use crate::{error::TransferError, object_meta::ObjectMetadata};

/// Object store backing a download.
///
/// Implementations map a missing object to [`TransferError::ObjectNotFound`] and every
/// other failure to [`TransferError::Store`], keeping the backend error as the source.
/// Request timeouts are the responsibility of the implementation.
#[async_trait]
pub trait StoreClient: fmt::Debug + Send + Sync + 'static {
    /// Discover the size (and other metadata) of `key`
    async fn head_object(&self, key: &str) -> Result<ObjectMetadata, TransferError>;

    /// Fetch the inclusive byte `range` of `key`
    async fn get_object_range(
        &self,
        key: &str,
        range: RangeInclusive<u64>,
    ) -> Result<Bytes, TransferError>;

    /// Fetch the whole object as a stream
    async fn get_object(&self, key: &str) -> Result<ByteStream, TransferError>;
}
