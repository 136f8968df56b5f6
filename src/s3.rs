/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! [`StoreClient`] backed by the AWS SDK for S3.

use std::ops::RangeInclusive;

use async_trait::async_trait;
use aws_sdk_s3::operation::{get_object::GetObjectError, head_object::HeadObjectError};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;

use crate::{
    config::StoreConfig, error::TransferError, header::Range, object_meta::ObjectMetadata,
    store::StoreClient,
};

pub(crate) type GetObjectSdkError = ::aws_smithy_runtime_api::client::result::SdkError<
    GetObjectError,
    ::aws_smithy_runtime_api::client::orchestrator::HttpResponse,
>;
pub(crate) type HeadObjectSdkError = ::aws_smithy_runtime_api::client::result::SdkError<
    HeadObjectError,
    ::aws_smithy_runtime_api::client::orchestrator::HttpResponse,
>;

/// Objects in a single S3 bucket
#[derive(Debug, Clone)]
pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client from credentials, region and endpoint loaded from the environment
    pub fn from_config(config: &StoreConfig) -> Self {
        let client = aws_sdk_s3::Client::from_conf(config.to_sdk_config());
        Self::new(client, config.bucket())
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn location(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }

    fn head_failed(&self, key: &str, err: HeadObjectSdkError) -> TransferError {
        if err
            .as_service_error()
            .is_some_and(HeadObjectError::is_not_found)
        {
            return TransferError::not_found(self.location(key));
        }
        TransferError::store(format!("HeadObject {}", self.location(key)), err)
    }

    fn get_failed(&self, key: &str, range: Option<&Range>, err: GetObjectSdkError) -> TransferError {
        if err
            .as_service_error()
            .is_some_and(GetObjectError::is_no_such_key)
        {
            return TransferError::not_found(self.location(key));
        }
        match range {
            Some(range) => {
                TransferError::store(format!("GetObject {} {}", self.location(key), range), err)
            }
            None => TransferError::store(format!("GetObject {}", self.location(key)), err),
        }
    }
}

#[async_trait]
impl StoreClient for S3Store {
    async fn head_object(&self, key: &str) -> Result<ObjectMetadata, TransferError> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| self.head_failed(key, e))?;

        ObjectMetadata::try_from(output)
    }

    async fn get_object_range(
        &self,
        key: &str,
        range: RangeInclusive<u64>,
    ) -> Result<Bytes, TransferError> {
        let range = Range::from(&range);
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .range(range.clone())
            .send()
            .await
            .map_err(|e| self.get_failed(key, Some(&range), e))?;

        let data = resp.body.collect().await.map_err(|e| {
            TransferError::store(format!("reading {} {}", self.location(key), range), e)
        })?;

        Ok(data.into_bytes())
    }

    async fn get_object(&self, key: &str) -> Result<ByteStream, TransferError> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| self.get_failed(key, None, e))?;

        Ok(resp.body)
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_s3::{
        operation::{get_object::GetObjectError, head_object::HeadObjectError},
        types::error::{NoSuchKey, NotFound},
    };
    use aws_smithy_runtime_api::{
        client::{orchestrator::HttpResponse, result::SdkError},
        http::StatusCode,
    };
    use aws_smithy_types::body::SdkBody;

    use super::S3Store;
    use crate::error::TransferError;

    fn store() -> S3Store {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .build();
        S3Store::new(aws_sdk_s3::Client::from_conf(config), "bucket")
    }

    fn response(status: u16) -> HttpResponse {
        HttpResponse::new(StatusCode::try_from(status).unwrap(), SdkBody::empty())
    }

    #[test]
    fn test_head_not_found_mapping() {
        let err = SdkError::service_error(
            HeadObjectError::NotFound(NotFound::builder().build()),
            response(404),
        );
        let err = store().head_failed("a/b.bin", err);
        match err {
            TransferError::ObjectNotFound { location } => assert_eq!(location, "s3://bucket/a/b.bin"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_get_no_such_key_mapping() {
        let err = SdkError::service_error(
            GetObjectError::NoSuchKey(NoSuchKey::builder().build()),
            response(404),
        );
        assert!(store().get_failed("b.bin", None, err).is_not_found());
    }

    #[test]
    fn test_other_errors_are_store_errors() {
        let err = SdkError::service_error(
            HeadObjectError::generic(
                aws_sdk_s3::error::ErrorMetadata::builder()
                    .code("AccessDenied")
                    .build(),
            ),
            response(403),
        );
        let err = store().head_failed("b.bin", err);
        assert!(matches!(err, TransferError::Store { .. }), "{:?}", err);
        assert!(err.to_string().contains("HeadObject s3://bucket/b.bin"));
    }
}
