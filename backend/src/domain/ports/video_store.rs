//! Port for the video object store.
//!
//! The store accepts writes unconditionally; the upload time window is a
//! business rule enforced by the clock policy before this port is called.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::question::{VideoReference, VideoUpload};
use crate::domain::user::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by video store adapters.
    pub enum VideoStoreError {
        /// The store is unreachable. Transient.
        Connection { message: String } => "video store connection failed: {message}",
        /// The write failed.
        Write { message: String } => "video store write failed: {message}",
    }
}

/// Port persisting a video payload and returning its stored location.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Store the upload under the owner's prefix.
    async fn store(
        &self,
        owner: &UserId,
        upload: &VideoUpload,
        now: DateTime<Utc>,
    ) -> Result<VideoReference, VideoStoreError>;
}

/// Default adapter for the external object store: accepts every write and
/// derives the conventional `{owner}/{millis}-{file_name}` path.
#[derive(Debug, Default)]
pub struct FixtureVideoStore;

#[async_trait]
impl VideoStore for FixtureVideoStore {
    async fn store(
        &self,
        owner: &UserId,
        upload: &VideoUpload,
        now: DateTime<Utc>,
    ) -> Result<VideoReference, VideoStoreError> {
        Ok(VideoReference::new(format!(
            "{owner}/{}-{}",
            now.timestamp_millis(),
            upload.file_name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_store_derives_owner_scoped_paths() {
        let owner = UserId::random();
        let upload = VideoUpload {
            file_name: "clip.mp4".to_owned(),
            byte_size: 1024,
            duration_seconds: 30,
        };
        let now = Utc::now();

        let reference = FixtureVideoStore
            .store(&owner, &upload, now)
            .await
            .expect("fixture store accepts writes");
        let path = reference.as_ref();
        assert!(path.starts_with(&owner.to_string()));
        assert!(path.ends_with("clip.mp4"));
    }
}
