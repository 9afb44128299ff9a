//! Questions and their optional video attachment.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user::UserId;

/// Maximum accepted video payload, in bytes (50 MiB).
pub const VIDEO_MAX_BYTES: u64 = 50 * 1024 * 1024;

/// Maximum accepted video duration, in seconds (2 minutes).
pub const VIDEO_MAX_SECONDS: u32 = 120;

/// Maximum question title length, in characters.
pub const TITLE_MAX_CHARS: usize = 200;

/// Stable question identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(Uuid);

impl QuestionId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an already-parsed UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation errors for question content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestionValidationError {
    /// Title empty once trimmed.
    #[error("question title must not be empty")]
    EmptyTitle,
    /// Title exceeds [`TITLE_MAX_CHARS`].
    #[error("question title must be at most {TITLE_MAX_CHARS} characters")]
    TitleTooLong,
    /// Body empty once trimmed.
    #[error("question body must not be empty")]
    EmptyBody,
}

/// Validation errors for a video attachment's declared metadata.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VideoValidationError {
    /// No file name supplied.
    #[error("video file name must not be empty")]
    EmptyFileName,
    /// Payload larger than [`VIDEO_MAX_BYTES`].
    #[error("video size must be less than 50MB")]
    TooLarge,
    /// Duration longer than [`VIDEO_MAX_SECONDS`].
    #[error("video must be less than 2 minutes")]
    TooLong,
}

/// Declared metadata of a video the client wants to attach.
///
/// Both limits are checked here, before any policy gate or store call is
/// attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoUpload {
    /// Client-side file name, used to derive the stored path.
    pub file_name: String,
    /// Payload size in bytes.
    pub byte_size: u64,
    /// Duration in whole seconds.
    pub duration_seconds: u32,
}

impl VideoUpload {
    /// Validate declared metadata against the attachment limits.
    pub fn validate(&self) -> Result<(), VideoValidationError> {
        if self.file_name.trim().is_empty() {
            return Err(VideoValidationError::EmptyFileName);
        }
        if self.byte_size > VIDEO_MAX_BYTES {
            return Err(VideoValidationError::TooLarge);
        }
        if self.duration_seconds > VIDEO_MAX_SECONDS {
            return Err(VideoValidationError::TooLong);
        }
        Ok(())
    }
}

/// Location of a stored video in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoReference(String);

impl VideoReference {
    /// Wrap a store-assigned path.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }
}

impl AsRef<str> for VideoReference {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// A question on the board.
///
/// Immutable after creation except through deletion, which is handled
/// upstream and observed here only via reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Stable identifier.
    pub id: QuestionId,
    /// Posting user.
    pub author: UserId,
    /// Short summary line.
    pub title: String,
    /// Full question text.
    pub body: String,
    /// Optional stored video attachment.
    pub video: Option<VideoReference>,
    /// Creation instant; the board lists questions newest first.
    pub created_at: DateTime<Utc>,
}

impl Question {
    /// Validate content and build a new question.
    pub fn compose(
        author: UserId,
        title: impl Into<String>,
        body: impl Into<String>,
        video: Option<VideoReference>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, QuestionValidationError> {
        let title = title.into();
        let body = body.into();
        if title.trim().is_empty() {
            return Err(QuestionValidationError::EmptyTitle);
        }
        if title.chars().count() > TITLE_MAX_CHARS {
            return Err(QuestionValidationError::TitleTooLong);
        }
        if body.trim().is_empty() {
            return Err(QuestionValidationError::EmptyBody);
        }
        Ok(Self {
            id: QuestionId::random(),
            author,
            title,
            body,
            video,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn upload(byte_size: u64, duration_seconds: u32) -> VideoUpload {
        VideoUpload {
            file_name: "clip.mp4".to_owned(),
            byte_size,
            duration_seconds,
        }
    }

    #[rstest]
    #[case(VIDEO_MAX_BYTES, 120, Ok(()))]
    #[case(VIDEO_MAX_BYTES + 1, 120, Err(VideoValidationError::TooLarge))]
    #[case(1024, VIDEO_MAX_SECONDS, Ok(()))]
    #[case(1024, VIDEO_MAX_SECONDS + 1, Err(VideoValidationError::TooLong))]
    fn video_limits_are_enforced(
        #[case] byte_size: u64,
        #[case] duration_seconds: u32,
        #[case] expected: Result<(), VideoValidationError>,
    ) {
        assert_eq!(upload(byte_size, duration_seconds).validate(), expected);
    }

    #[rstest]
    fn video_requires_a_file_name() {
        let mut video = upload(1024, 10);
        video.file_name = "  ".to_owned();
        assert_eq!(video.validate(), Err(VideoValidationError::EmptyFileName));
    }

    #[rstest]
    fn compose_rejects_empty_content() {
        let author = UserId::random();
        let now = Utc::now();
        assert_eq!(
            Question::compose(author, " ", "body", None, now),
            Err(QuestionValidationError::EmptyTitle)
        );
        assert_eq!(
            Question::compose(author, "title", "", None, now),
            Err(QuestionValidationError::EmptyBody)
        );
    }

    #[rstest]
    fn compose_rejects_oversized_titles() {
        let author = UserId::random();
        let title = "x".repeat(TITLE_MAX_CHARS + 1);
        assert_eq!(
            Question::compose(author, title, "body", None, Utc::now()),
            Err(QuestionValidationError::TitleTooLong)
        );
    }
}
