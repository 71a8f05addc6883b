// ABOUTME: Asset publishing collaborator: uploads the site directory and invalidates the CDN cache.
// ABOUTME: The shipped publisher syncs through the aws tool with separate cache headers for HTML.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::provider::ProviderError;
use crate::provider::aws::AwsCli;
use crate::types::DistributionId;

/// Cache header for fingerprinted assets.
const IMMUTABLE_CACHE: &str = "public, max-age=31536000, immutable";

/// Cache header for entry points that must always be revalidated.
const REVALIDATE_CACHE: &str = "public, max-age=0, must-revalidate";

/// Files served with [`REVALIDATE_CACHE`].
const REVALIDATE_PATTERNS: [&str; 3] = ["*.html", "page-data/*.json", "sw.js"];

/// What to publish and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub dir: PathBuf,
    pub bucket: String,
    pub distribution: Option<DistributionId>,
}

#[async_trait]
pub trait AssetPublisher: Send + Sync {
    /// Upload `request.dir` into the bucket, then invalidate the distribution
    /// when one is given.
    async fn publish(&self, request: &PublishRequest) -> Result<(), ProviderError>;
}

pub struct AwsCliPublisher {
    aws: AwsCli,
}

impl AwsCliPublisher {
    pub fn new(aws: AwsCli) -> Self {
        Self { aws }
    }
}

/// Arguments for the two sync passes: everything but the revalidated files
/// first, then only those.
fn sync_passes(request: &PublishRequest) -> [Vec<String>; 2] {
    let source = request.dir.display().to_string();
    let target = format!("s3://{}", request.bucket);

    let mut immutable = vec![source.clone(), target.clone(), "--delete".to_string()];
    for pattern in REVALIDATE_PATTERNS {
        immutable.push("--exclude".to_string());
        immutable.push(pattern.to_string());
    }
    immutable.push("--cache-control".to_string());
    immutable.push(IMMUTABLE_CACHE.to_string());

    let mut revalidate = vec![
        source,
        target,
        "--delete".to_string(),
        "--exclude".to_string(),
        "*".to_string(),
    ];
    for pattern in REVALIDATE_PATTERNS {
        revalidate.push("--include".to_string());
        revalidate.push(pattern.to_string());
    }
    revalidate.push("--cache-control".to_string());
    revalidate.push(REVALIDATE_CACHE.to_string());

    [immutable, revalidate]
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateInvalidation {
    invalidation: InvalidationJson,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InvalidationJson {
    id: String,
}

#[async_trait]
impl AssetPublisher for AwsCliPublisher {
    async fn publish(&self, request: &PublishRequest) -> Result<(), ProviderError> {
        tracing::info!(
            "publishing {} to s3://{}",
            request.dir.display(),
            request.bucket
        );

        for pass in sync_passes(request) {
            self.aws.call("s3", "sync", &pass).await?;
        }

        if let Some(distribution) = &request.distribution {
            let response: CreateInvalidation = self
                .aws
                .call_json(
                    "cloudfront",
                    "create-invalidation",
                    &[
                        "--distribution-id".to_string(),
                        distribution.to_string(),
                        "--paths".to_string(),
                        "/*".to_string(),
                    ],
                )
                .await?;

            tracing::info!("waiting for invalidation {}", response.invalidation.id);
            self.aws
                .call(
                    "cloudfront",
                    "wait",
                    &[
                        "invalidation-completed".to_string(),
                        "--distribution-id".to_string(),
                        distribution.to_string(),
                        "--id".to_string(),
                        response.invalidation.id,
                    ],
                )
                .await?;
        }

        Ok(())
    }
}
