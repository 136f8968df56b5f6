/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_sdk_s3::operation::head_object::HeadObjectOutput;
use aws_smithy_types::DateTime;

use crate::error::TransferError;

/// Object metadata discovered once at the start of a transfer
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMetadata {
    total_size: u64,
    e_tag: Option<String>,
    content_type: Option<String>,
    last_modified: Option<DateTime>,
}

impl ObjectMetadata {
    pub fn new(total_size: u64) -> Self {
        Self {
            total_size,
            e_tag: None,
            content_type: None,
            last_modified: None,
        }
    }

    pub fn with_e_tag(mut self, e_tag: impl Into<String>) -> Self {
        self.e_tag = Some(e_tag.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Total size of the object in bytes
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn e_tag(&self) -> Option<&str> {
        self.e_tag.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn last_modified(&self) -> Option<&DateTime> {
        self.last_modified.as_ref()
    }
}

impl TryFrom<HeadObjectOutput> for ObjectMetadata {
    type Error = TransferError;

    fn try_from(value: HeadObjectOutput) -> Result<Self, Self::Error> {
        let total_size = match value.content_length {
            Some(length) => u64::try_from(length).map_err(|_| {
                TransferError::store(
                    "HeadObject response",
                    format!("invalid content length {}", length),
                )
            })?,
            None => {
                return Err(TransferError::store(
                    "HeadObject response",
                    "missing content length",
                ))
            }
        };

        Ok(Self {
            total_size,
            e_tag: value.e_tag,
            content_type: value.content_type,
            last_modified: value.last_modified,
        })
    }
}
