// ABOUTME: S3 bucket operations through the aws tool.

use async_trait::async_trait;

use super::AwsCli;
use crate::provider::{BucketOps, ProviderError};

#[async_trait]
impl BucketOps for AwsCli {
    async fn empty_bucket(&self, bucket: &str) -> Result<(), ProviderError> {
        tracing::info!("emptying bucket {}", bucket);
        self.call(
            "s3",
            "rm",
            &[format!("s3://{}", bucket), "--recursive".to_string()],
        )
        .await?;
        Ok(())
    }
}
