//! S3 store adapter
//!
//! Wraps the async AWS SDK behind the blocking [`ObjectStore`] trait with a
//! private current-thread runtime. Release operations are infrequent and
//! operator-paced, so each call simply blocks on its network round-trip;
//! retries and timeouts stay the SDK's concern.

use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectCannedAcl, ObjectIdentifier};
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use tokio::runtime::Runtime;
use tracing::debug;

use crate::config::DeployConfig;
use crate::error::{ReleaseError, Result};
use crate::store::{Acl, ListedObject, ObjectMeta, ObjectStore};

/// S3 limit on keys per DeleteObjects request
const DELETE_BATCH_SIZE: usize = 1000;

/// Blocking S3 client scoped to one bucket
pub struct S3Store {
    client: Client,
    bucket: String,
    runtime: Runtime,
}

impl S3Store {
    /// Connect using the profile/region/endpoint from `config`.
    pub fn connect(config: &DeployConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let client = runtime.block_on(async {
            let mut loader = aws_config::defaults(BehaviorVersion::latest());
            if let Some(profile) = &config.profile {
                loader = loader.profile_name(profile);
            }
            if let Some(region) = &config.region {
                loader = loader.region(aws_config::Region::new(region.clone()));
            }
            let sdk_config = loader.load().await;

            let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
            if let Some(endpoint) = &config.endpoint {
                builder = builder.endpoint_url(endpoint).force_path_style(true);
            }
            Client::from_conf(builder.build())
        });

        debug!("Connected to bucket {}", config.bucket);

        Ok(S3Store {
            client,
            bucket: config.bucket.clone(),
            runtime,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn canned_acl(acl: Acl) -> ObjectCannedAcl {
    match acl {
        Acl::PublicRead => ObjectCannedAcl::PublicRead,
        Acl::Private => ObjectCannedAcl::Private,
    }
}

fn to_chrono(timestamp: &aws_sdk_s3::primitives::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn store_err(op: &str, subject: &str, err: impl std::fmt::Display) -> ReleaseError {
    ReleaseError::Store(format!("{} {}: {}", op, subject, err))
}

impl ObjectStore for S3Store {
    fn put(&self, key: &str, body: &[u8], meta: &ObjectMeta) -> Result<()> {
        self.runtime.block_on(async {
            let mut request = self
                .client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .body(ByteStream::from(body.to_vec()))
                .content_type(&meta.content_type)
                .cache_control(&meta.cache_control)
                .acl(canned_acl(meta.acl));
            if let Some(encoding) = &meta.content_encoding {
                request = request.content_encoding(encoding);
            }
            if let Some(expires) = meta.expires {
                request = request
                    .expires(aws_sdk_s3::primitives::DateTime::from_secs(expires.timestamp()));
            }
            request
                .send()
                .await
                .map_err(|e| store_err("put", key, e))?;
            Ok(())
        })
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.runtime.block_on(async {
            let output = self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| {
                    let service_error = e.into_service_error();
                    if service_error.is_no_such_key() {
                        ReleaseError::KeyNotFound(key.to_string())
                    } else {
                        store_err("get", key, service_error)
                    }
                })?;
            let bytes = output
                .body
                .collect()
                .await
                .map_err(|e| store_err("read body of", key, e))?;
            Ok(bytes.into_bytes().to_vec())
        })
    }

    fn list(&self, prefix: &str) -> Result<Vec<ListedObject>> {
        self.runtime.block_on(async {
            let mut entries = Vec::new();
            let mut pages = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .into_paginator()
                .send();
            while let Some(page) = pages.next().await {
                let page = page.map_err(|e| store_err("list", prefix, e))?;
                for object in page.contents() {
                    if let Some(key) = object.key() {
                        entries.push(ListedObject {
                            key: key.to_string(),
                            last_modified: object
                                .last_modified()
                                .map(to_chrono)
                                .unwrap_or(DateTime::UNIX_EPOCH),
                        });
                    }
                }
            }
            Ok(entries)
        })
    }

    fn copy(&self, src: &str, dst: &str) -> Result<()> {
        self.runtime.block_on(async {
            self.client
                .copy_object()
                .bucket(&self.bucket)
                .copy_source(format!("{}/{}", self.bucket, src))
                .key(dst)
                .acl(ObjectCannedAcl::PublicRead)
                .send()
                .await
                .map_err(|e| store_err("copy", src, e))?;
            Ok(())
        })
    }

    fn delete(&self, keys: &[String]) -> Result<Vec<String>> {
        self.runtime.block_on(async {
            let mut deleted = Vec::with_capacity(keys.len());
            for batch in keys.chunks(DELETE_BATCH_SIZE) {
                let identifiers = batch
                    .iter()
                    .map(|key| {
                        ObjectIdentifier::builder()
                            .key(key)
                            .build()
                            .map_err(|e| store_err("identify", key, e))
                    })
                    .collect::<Result<Vec<_>>>()?;
                let delete = Delete::builder()
                    .set_objects(Some(identifiers))
                    .build()
                    .map_err(|e| store_err("build delete for", &self.bucket, e))?;
                let output = self
                    .client
                    .delete_objects()
                    .bucket(&self.bucket)
                    .delete(delete)
                    .send()
                    .await
                    .map_err(|e| store_err("delete batch in", &self.bucket, e))?;
                deleted.extend(
                    output
                        .deleted()
                        .iter()
                        .filter_map(|d| d.key().map(String::from)),
                );
            }
            Ok(deleted)
        })
    }
}
