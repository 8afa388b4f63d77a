pub mod client;
pub mod model;

use async_trait::async_trait;

use self::model::UploadRequest;

/// Write side of the planning pipeline. Returns the remote file id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentUploader {
    async fn upload(&self, request: &UploadRequest) -> anyhow::Result<String>;
}
