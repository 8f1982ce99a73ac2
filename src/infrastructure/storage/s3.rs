use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::{Client, config::BehaviorVersion, config::Credentials, config::Region};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

use super::{BlobStore, GatewayError, GatewayResult};
use crate::config::settings::AppConfig;

/// Blob store backed by any S3-compatible API (AWS, MinIO, GCS interop).
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
}

impl S3BlobStore {
    pub fn new(endpoint: Option<&str>, region: &str, access_key: &str, secret_key: &str) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "static");

        let mut builder = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials);

        if let Some(endpoint) = endpoint {
            // Custom endpoints (MinIO, GCS interop) only resolve path-style URLs
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let client = Client::from_conf(builder.build());

        info!(
            endpoint = endpoint.unwrap_or("aws"),
            region = %region,
            "✅ Object storage client ready"
        );

        Self { client }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.storage_endpoint.as_deref(),
            &config.storage_region,
            &config.storage_access_key,
            &config.storage_secret_key,
        )
    }
}

fn describe<E: std::error::Error>(err: &E) -> String {
    DisplayErrorContext(err).to_string()
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn fetch_to_file(&self, bucket: &str, key: &str, dest: &Path) -> GatewayResult<u64> {
        let start = Instant::now();

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match &e {
                SdkError::ServiceError(service_err) => match service_err.err() {
                    GetObjectError::NoSuchKey(_) => GatewayError::not_found(key),
                    _ => GatewayError::transfer(describe(&e)),
                },
                _ => GatewayError::transfer(describe(&e)),
            })?;

        let mut reader = response.body.into_async_read();
        let mut file = tokio::fs::File::create(dest).await?;

        let bytes = tokio::io::copy(&mut reader, &mut file).await.map_err(|e| {
            error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                "S3 download stream failed"
            );
            GatewayError::transfer(format!("download of {} interrupted: {}", key, e))
        })?;

        file.flush().await?;

        info!(
            bucket = %bucket,
            key = %key,
            path = %dest.display(),
            size_bytes = bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(bytes)
    }

    async fn put_from_file(
        &self,
        bucket: &str,
        key: &str,
        src: &Path,
        content_type: &str,
    ) -> GatewayResult<()> {
        let start = Instant::now();

        let body = ByteStream::from_path(src)
            .await
            .map_err(|e| GatewayError::transfer(format!("cannot read {}: {}", src.display(), e)))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                error!(
                    error = %describe(&e),
                    bucket = %bucket,
                    key = %key,
                    "S3 upload failed"
                );
                GatewayError::transfer(describe(&e))
            })?;

        info!(
            bucket = %bucket,
            key = %key,
            path = %src.display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    async fn make_public(&self, bucket: &str, key: &str) -> GatewayResult<()> {
        self.client
            .put_object_acl()
            .bucket(bucket)
            .key(key)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| match &e {
                SdkError::ServiceError(_) => GatewayError::permission(describe(&e)),
                _ => GatewayError::transfer(describe(&e)),
            })?;

        info!(bucket = %bucket, key = %key, "S3 object made public");
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> GatewayResult<()> {
        let result = self
            .client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!(bucket = %bucket, key = %key, "S3 object deleted");
                Ok(())
            }
            Err(e) if e.as_service_error().and_then(|se| se.code()) == Some("NoSuchKey") => {
                debug!(bucket = %bucket, key = %key, "S3 object already absent");
                Ok(())
            }
            Err(e) => Err(GatewayError::transfer(describe(&e))),
        }
    }
}
