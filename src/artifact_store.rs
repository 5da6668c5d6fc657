//! # Artifact Store — Durable Crawl Artifact Persistence
//!
//! `S3Client` mirrors PostHog's `common/s3` trait split: one trait both
//! the real `aws-sdk-s3`-backed client and a `mockall` mock implement,
//! so the indexer's storage calls are testable without network access.
//! The key layout and local-fallback directory structure are grounded
//! in `cloud_storage.py`'s `_generate_key`/`_local_store`.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[cfg(feature = "mock-artifact-store")]
use mockall::automock;

use crate::errors::ArtifactError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    RawHtml,
    ProcessedText,
    Metadata,
}

impl ArtifactKind {
    fn dir_name(self) -> &'static str {
        match self {
            ArtifactKind::RawHtml => "raw_html",
            ArtifactKind::ProcessedText => "processed_text",
            ArtifactKind::Metadata => "metadata",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ArtifactKind::RawHtml => "html",
            ArtifactKind::ProcessedText => "txt",
            ArtifactKind::Metadata => "json",
        }
    }

    fn content_type(self) -> &'static str {
        match self {
            ArtifactKind::RawHtml => "text/html",
            ArtifactKind::ProcessedText => "text/plain",
            ArtifactKind::Metadata => "application/json",
        }
    }
}

/// Deterministic S3 key: `<kind>/<YYYY>/<MM>/<DD>/<md5(url)>.<ext>`.
pub fn key_for(url: &str, kind: ArtifactKind, date: DateTime<Utc>) -> String {
    let digest = md5::compute(url.as_bytes());
    format!(
        "{}/{}/{:x}.{}",
        kind.dir_name(),
        date.format("%Y/%m/%d"),
        digest,
        kind.extension()
    )
}

pub struct PutResult {
    pub storage_type: &'static str,
    pub location: String,
}

#[async_trait]
#[cfg_attr(feature = "mock-artifact-store", automock)]
pub trait ArtifactStore: Send + Sync {
    async fn put(&self, url: &str, kind: ArtifactKind, body: &str) -> Result<PutResult, ArtifactError>;
    async fn get(&self, url: &str, kind: ArtifactKind) -> Result<String, ArtifactError>;
}

/// Production store: `aws-sdk-s3` with a local-directory fallback when
/// the client is unavailable or the put/get call fails, matching
/// `cloud_storage.py`'s `_local_store`/`_local_retrieve` behavior.
pub struct S3ArtifactStore {
    client: Option<aws_sdk_s3::Client>,
    bucket: String,
    local_fallback_dir: PathBuf,
}

impl S3ArtifactStore {
    pub async fn new(bucket: String, region: String, local_fallback_dir: PathBuf) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.clone()))
            .load()
            .await;
        let client = aws_sdk_s3::Client::new(&config);

        if let Err(err) = ensure_bucket_exists(&client, &bucket, &region).await {
            tracing::warn!(%err, bucket, "failed to ensure bucket exists, artifacts will fall back to local storage");
            return S3ArtifactStore {
                client: None,
                bucket,
                local_fallback_dir,
            };
        }

        S3ArtifactStore {
            client: Some(client),
            bucket,
            local_fallback_dir,
        }
    }

    fn local_path(&self, url: &str, kind: ArtifactKind) -> PathBuf {
        let digest = md5::compute(url.as_bytes());
        self.local_fallback_dir
            .join(kind.dir_name())
            .join(format!("{:x}.{}", digest, kind.extension()))
    }

    fn put_local(&self, url: &str, kind: ArtifactKind, body: &str) -> Result<PutResult, ArtifactError> {
        let path = self.local_path(url, kind);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, body)?;
        Ok(PutResult {
            storage_type: "local",
            location: path.display().to_string(),
        })
    }

    fn get_local(&self, url: &str, kind: ArtifactKind) -> Result<String, ArtifactError> {
        let path = self.local_path(url, kind);
        std::fs::read_to_string(&path).map_err(ArtifactError::from)
    }
}

/// Probe with `head_bucket`; create on a 404, using the `us-east-1`
/// special case where `CreateBucketConfiguration` must be omitted.
async fn ensure_bucket_exists(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    region: &str,
) -> Result<(), ArtifactError> {
    if client.head_bucket().bucket(bucket).send().await.is_ok() {
        return Ok(());
    }

    let mut request = client.create_bucket().bucket(bucket);
    if region != "us-east-1" {
        let constraint = aws_sdk_s3::types::BucketLocationConstraint::from(region);
        request = request.create_bucket_configuration(
            aws_sdk_s3::types::CreateBucketConfiguration::builder()
                .location_constraint(constraint)
                .build(),
        );
    }
    request
        .send()
        .await
        .map_err(|e| ArtifactError::PutFailed(format!("failed to create bucket {bucket}: {e}")))?;
    Ok(())
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn put(&self, url: &str, kind: ArtifactKind, body: &str) -> Result<PutResult, ArtifactError> {
        let Some(client) = &self.client else {
            return self.put_local(url, kind, body);
        };

        let key = key_for(url, kind, Utc::now());
        let result = client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body.as_bytes().to_vec().into())
            .content_type(kind.content_type())
            .metadata("url", url)
            .send()
            .await;

        match result {
            Ok(_) => Ok(PutResult {
                storage_type: "s3",
                location: format!("s3://{}/{}", self.bucket, key),
            }),
            Err(err) => {
                tracing::warn!(%err, url, "s3 put failed, falling back to local storage");
                self.put_local(url, kind, body)
            }
        }
    }

    async fn get(&self, url: &str, kind: ArtifactKind) -> Result<String, ArtifactError> {
        let Some(client) = &self.client else {
            return self.get_local(url, kind);
        };

        let key = key_for(url, kind, Utc::now());
        let result = client.get_object().bucket(&self.bucket).key(&key).send().await;

        match result {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| ArtifactError::GetFailed(e.to_string()))?;
                String::from_utf8(bytes.to_vec())
                    .map_err(|e| ArtifactError::GetFailed(format!("non-utf8 body: {e}")))
            }
            Err(err) => {
                tracing::warn!(%err, url, "s3 get failed, falling back to local storage");
                self.get_local(url, kind)
            }
        }
    }
}

/// Purely local artifact store, used when no bucket is configured at all.
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: PathBuf) -> Self {
        LocalArtifactStore { root }
    }

    fn path(&self, url: &str, kind: ArtifactKind) -> PathBuf {
        let digest = md5::compute(url.as_bytes());
        self.root.join(kind.dir_name()).join(format!("{:x}.{}", digest, kind.extension()))
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn put(&self, url: &str, kind: ArtifactKind, body: &str) -> Result<PutResult, ArtifactError> {
        let path = self.path(url, kind);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, body)?;
        Ok(PutResult {
            storage_type: "local",
            location: path.display().to_string(),
        })
    }

    async fn get(&self, url: &str, kind: ArtifactKind) -> Result<String, ArtifactError> {
        let path = self.path(url, kind);
        std::fs::read_to_string(path).map_err(ArtifactError::from)
    }
}
