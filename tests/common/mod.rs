/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    ops::RangeInclusive,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use s3_chunked_download::{ByteStream, ObjectMetadata, TransferError};
use s3_chunked_download::store::StoreClient;

/// In memory store with failure injection and in flight request accounting
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: HashMap<String, Bytes>,
    // range requests starting at one of these offsets fail
    fail_at: HashSet<u64>,
    fail_head: bool,
    fail_get: bool,
    // per request latency; when `reverse_latency` is set later offsets finish first
    latency: Duration,
    reverse_latency: bool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    range_requests: Mutex<Vec<RangeInclusive<u64>>>,
    get_requests: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, key: &str, data: impl Into<Bytes>) -> Self {
        self.objects.insert(key.to_owned(), data.into());
        self
    }

    pub fn fail_range_at(mut self, start: u64) -> Self {
        self.fail_at.insert(start);
        self
    }

    pub fn fail_head(mut self) -> Self {
        self.fail_head = true;
        self
    }

    pub fn fail_get(mut self) -> Self {
        self.fail_get = true;
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn reverse_latency(mut self) -> Self {
        self.reverse_latency = true;
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn range_requests(&self) -> Vec<RangeInclusive<u64>> {
        self.range_requests.lock().unwrap().clone()
    }

    pub fn get_requests(&self) -> usize {
        self.get_requests.load(Ordering::SeqCst)
    }

    fn object(&self, key: &str) -> Result<&Bytes, TransferError> {
        self.objects
            .get(key)
            .ok_or_else(|| TransferError::not_found(format!("memory://{}", key)))
    }

    async fn delay(&self, start: u64, total: u64) {
        if self.latency.is_zero() {
            tokio::task::yield_now().await;
            return;
        }
        let latency = if self.reverse_latency && total > 0 {
            // scale so the chunk at offset 0 is the slowest
            let factor = 1.0 + (total - start) as f64 / total as f64;
            self.latency.mul_f64(factor)
        } else {
            self.latency
        };
        tokio::time::sleep(latency).await;
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn head_object(&self, key: &str) -> Result<ObjectMetadata, TransferError> {
        if self.fail_head {
            return Err(TransferError::store("HeadObject", "access denied"));
        }
        let data = self.object(key)?;
        Ok(ObjectMetadata::new(data.len() as u64).with_e_tag("\"memory\""))
    }

    async fn get_object_range(
        &self,
        key: &str,
        range: RangeInclusive<u64>,
    ) -> Result<Bytes, TransferError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.range_requests.lock().unwrap().push(range.clone());

        let result = match self.object(key) {
            Ok(data) => {
                self.delay(*range.start(), data.len() as u64).await;
                if self.fail_at.contains(range.start()) {
                    Err(TransferError::store(
                        format!("GetObject bytes={}-{}", range.start(), range.end()),
                        "connection reset by peer",
                    ))
                } else {
                    let end = (*range.end() as usize + 1).min(data.len());
                    Ok(data.slice(*range.start() as usize..end))
                }
            }
            Err(err) => Err(err),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn get_object(&self, key: &str) -> Result<ByteStream, TransferError> {
        self.get_requests.fetch_add(1, Ordering::SeqCst);
        if self.fail_get {
            return Err(TransferError::store("GetObject", "service unavailable"));
        }
        Ok(ByteStream::from(self.object(key)?.clone()))
    }
}

/// Deterministic, non repeating-looking payload of `len` bytes
pub fn payload(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| (i.wrapping_mul(31) ^ (i >> 8)) as u8)
        .collect()
}
