/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Store configuration loaded from the environment.

use std::fmt;

use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Credentials;
use aws_types::region::Region;

use crate::error::{invalid_configuration, TransferError};

pub const BUCKET_ENV: &str = "RUNPOD_S3_BUCKET";
pub const ACCESS_KEY_ID_ENV: &str = "RUNPOD_S3_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_ENV: &str = "RUNPOD_S3_SECRET_ACCESS_KEY";
pub const REGION_ENV: &str = "RUNPOD_S3_REGION";
pub const ENDPOINT_ENV: &str = "RUNPOD_S3_ENDPOINT";

const CREDENTIALS_PROVIDER_NAME: &str = "environment";

/// Bucket, credentials and addressing of the backing store
#[derive(Clone)]
pub struct StoreConfig {
    bucket: String,
    access_key_id: String,
    secret_access_key: String,
    region: String,
    endpoint: Option<String>,
}

impl StoreConfig {
    /// Load the configuration from the process environment
    pub fn from_env() -> Result<Self, TransferError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the configuration using `lookup` to resolve variable names.
    ///
    /// Every missing required variable is reported in a single
    /// [`TransferError::InvalidConfiguration`]. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TransferError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let required = [BUCKET_ENV, ACCESS_KEY_ID_ENV, SECRET_ACCESS_KEY_ENV, REGION_ENV];
        let mut values = Vec::with_capacity(required.len());
        let mut missing = Vec::new();
        for name in required {
            match get(name) {
                Some(value) => values.push(value),
                None => missing.push(name),
            }
        }
        if !missing.is_empty() {
            return Err(invalid_configuration(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let [bucket, access_key_id, secret_access_key, region]: [String; 4] = values
            .try_into()
            .map_err(|_| invalid_configuration("incomplete store configuration"))?;

        Ok(Self {
            bucket,
            access_key_id,
            secret_access_key,
            region,
            endpoint: get(ENDPOINT_ENV),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// SDK client configuration. A custom endpoint implies path style addressing since
    /// most S3 compatible stores do not serve virtual hosted buckets.
    pub fn to_sdk_config(&self) -> aws_sdk_s3::Config {
        let credentials = Credentials::new(
            &self.access_key_id,
            &self.secret_access_key,
            None,
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &self.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        builder.build()
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("bucket", &self.bucket)
            .field("access_key_id", &"** redacted **")
            .field("secret_access_key", &"** redacted **")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    const COMPLETE: [(&str, &str); 4] = [
        (BUCKET_ENV, "models"),
        (ACCESS_KEY_ID_ENV, "AKID"),
        (SECRET_ACCESS_KEY_ENV, "SECRET"),
        (REGION_ENV, "eu-ro-1"),
    ];

    #[test]
    fn test_complete_config() {
        let config = StoreConfig::from_lookup(lookup(&COMPLETE)).unwrap();
        assert_eq!(config.bucket(), "models");
        assert_eq!(config.region(), "eu-ro-1");
        assert_eq!(config.endpoint(), None);

        let sdk = config.to_sdk_config();
        assert_eq!(sdk.region().map(|r| r.to_string()), Some("eu-ro-1".to_string()));
    }

    #[test]
    fn test_optional_endpoint() {
        let mut vars = COMPLETE.to_vec();
        vars.push((ENDPOINT_ENV, "https://s3api-eu-ro-1.example.io"));
        let config = StoreConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.endpoint(), Some("https://s3api-eu-ro-1.example.io"));
    }

    #[test]
    fn test_all_missing_variables_reported() {
        let vars = [(BUCKET_ENV, "models"), (REGION_ENV, "  ")];
        let err = StoreConfig::from_lookup(lookup(&vars)).unwrap_err();
        match err {
            TransferError::InvalidConfiguration(msg) => {
                assert!(msg.contains(ACCESS_KEY_ID_ENV), "{}", msg);
                assert!(msg.contains(SECRET_ACCESS_KEY_ENV), "{}", msg);
                assert!(msg.contains(REGION_ENV), "{}", msg);
                assert!(!msg.contains(BUCKET_ENV), "{}", msg);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = StoreConfig::from_lookup(lookup(&COMPLETE)).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("SECRET"));
        assert!(!debug.contains("AKID"));
    }
}
