/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use core::fmt;
use std::ops::RangeInclusive;

/// Representation of a `Range` header for a single inclusive byte range.
/// NOTE: S3 only supports a single bytes range, chunk requests never need the open ended forms
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Range {
    start: u64,
    end: u64,
}

impl Range {
    pub(crate) fn bytes_inclusive(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "range start={} end={}", start, end);
        Self { start, end }
    }
}

impl From<&RangeInclusive<u64>> for Range {
    fn from(value: &RangeInclusive<u64>) -> Self {
        Range::bytes_inclusive(*value.start(), *value.end())
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bytes={}-{}", self.start, self.end)
    }
}

impl From<Range> for String {
    fn from(value: Range) -> Self {
        value.to_string()
    }
}
