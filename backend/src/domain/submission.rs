//! Question and answer submission, including the gated video attach path.
//!
//! The upload window and the one-time-code grant are both evaluated before
//! the object store is touched: the store itself accepts writes
//! unconditionally, so the rules live here or nowhere.

use std::sync::Arc;

use mockable::Clock;
use tracing::info;

use crate::domain::answer::{Answer, AnswerValidationError};
use crate::domain::clock_policy::VIDEO_UPLOAD_WINDOW;
use crate::domain::ports::{
    AnswerRepository, AnswerRepositoryError, Notification, Notifier, QuestionRepository,
    VideoStore,
};
use crate::domain::question::{Question, QuestionId, VideoUpload, VideoValidationError};
use crate::domain::user::UserId;
use crate::domain::verification::UploadGrant;

/// Failures of a question or answer submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    /// A video is attached outside the permitted upload window.
    #[error("video uploads are only allowed between 2 PM and 7 PM")]
    UploadWindowClosed,
    /// A video is attached but no verified challenge grant was presented.
    #[error("verify your email before uploading a video")]
    VerificationRequired,
    /// The video's declared metadata breaks the attachment limits.
    #[error(transparent)]
    InvalidVideo(#[from] VideoValidationError),
    /// The answer content failed validation.
    #[error(transparent)]
    InvalidAnswer(#[from] AnswerValidationError),
    /// The answered question vanished before the insert landed.
    #[error("question no longer exists")]
    QuestionNotFound,
    /// The store could not complete the operation. Retryable.
    #[error("submission store unavailable: {message}")]
    StoreUnavailable {
        /// Adapter-provided context.
        message: String,
    },
}

/// A video attachment request: the declared payload plus the single-use
/// grant proving the challenge was passed. `None` grant means the caller
/// never verified.
#[derive(Debug)]
pub struct VideoAttachment {
    /// Declared upload metadata.
    pub upload: VideoUpload,
    /// Proof of a completed verification, if any.
    pub grant: Option<UploadGrant>,
}

/// Posts questions and answers.
pub struct SubmissionService {
    questions: Arc<dyn QuestionRepository>,
    answers: Arc<dyn AnswerRepository>,
    videos: Arc<dyn VideoStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl SubmissionService {
    /// Build the service.
    pub fn new(
        questions: Arc<dyn QuestionRepository>,
        answers: Arc<dyn AnswerRepository>,
        videos: Arc<dyn VideoStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            questions,
            answers,
            videos,
            notifier,
            clock,
        }
    }

    /// Post a question, optionally with a gated video attachment.
    ///
    /// Gate order for an attached video: declared limits, then the local
    /// wall-clock window, then the verification grant. Only then is the
    /// payload stored and the question inserted.
    pub async fn post_question(
        &self,
        author: &UserId,
        question: Question,
        video: Option<VideoAttachment>,
    ) -> Result<Question, SubmissionError> {
        let mut question = question;
        if let Some(attachment) = video {
            attachment.upload.validate()?;

            if !VIDEO_UPLOAD_WINDOW.allows(&self.clock.local()) {
                info!(author = %author, "video upload refused outside the window");
                return Err(SubmissionError::UploadWindowClosed);
            }

            let Some(grant) = attachment.grant else {
                return Err(SubmissionError::VerificationRequired);
            };
            // Consuming the grant here is what makes it single-use.
            drop(grant);

            let reference = self
                .videos
                .store(author, &attachment.upload, self.clock.utc())
                .await
                .map_err(|err| SubmissionError::StoreUnavailable {
                    message: err.to_string(),
                })?;
            question.video = Some(reference);
        }

        self.questions
            .insert(&question)
            .await
            .map_err(|err| SubmissionError::StoreUnavailable {
                message: err.to_string(),
            })?;
        info!(question = %question.id, author = %author, "question posted");
        Ok(question)
    }

    /// Post an answer and notify the question's author.
    pub async fn post_answer(
        &self,
        author: &UserId,
        question: &QuestionId,
        body: String,
    ) -> Result<Answer, SubmissionError> {
        let answer = Answer::compose(*question, *author, body, self.clock.utc())?;

        let posted = match self.answers.insert(&answer).await {
            Ok(posted) => posted,
            Err(AnswerRepositoryError::MissingQuestion { .. }) => {
                return Err(SubmissionError::QuestionNotFound);
            }
            Err(err) => {
                return Err(SubmissionError::StoreUnavailable {
                    message: err.to_string(),
                });
            }
        };

        // The author answering their own question needs no nudge.
        if posted.question_author != *author {
            self.notifier
                .notify(
                    &posted.question_author,
                    Notification::new(
                        "New Answer",
                        format!(
                            "Someone answered your question: {}",
                            posted.question_title
                        ),
                    ),
                )
                .await;
        }

        info!(answer = %answer.id, question = %question, "answer posted");
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        AnswerPosted, MockAnswerRepository, MockNotifier, MockQuestionRepository, MockVideoStore,
    };
    use crate::domain::question::VideoReference;
    use crate::domain::verification::{CodeGenerator, OneTimeCode, VerificationGate};
    use chrono::{DateTime, Local, TimeZone, Utc};
    use mockable::MockClock;

    struct FixedCodes;

    impl CodeGenerator for FixedCodes {
        fn generate(&self) -> OneTimeCode {
            OneTimeCode::new("123456").expect("fixture code shape")
        }
    }

    fn local_at(hour: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2025, 6, 1, hour, 30, 0)
            .single()
            .expect("valid instant")
    }

    fn clock_at(hour: u32) -> Arc<dyn Clock> {
        let mut clock = MockClock::new();
        clock.expect_local().returning(move || local_at(hour));
        clock
            .expect_utc()
            .returning(move || local_at(hour).with_timezone(&Utc));
        Arc::new(clock)
    }

    fn upload() -> VideoUpload {
        VideoUpload {
            file_name: "clip.mp4".to_owned(),
            byte_size: 1024,
            duration_seconds: 30,
        }
    }

    fn grant() -> UploadGrant {
        let mut gate = VerificationGate::new();
        let now = Utc::now();
        gate.issue(&FixedCodes, now).expect("issue");
        gate.verify(&OneTimeCode::new("123456").expect("code"), now)
            .expect("verify");
        gate.take_grant().expect("grant")
    }

    fn question(author: UserId) -> Question {
        Question::compose(author, "How?", "Like this?", None, Utc::now()).expect("valid question")
    }

    fn service(
        questions: MockQuestionRepository,
        answers: MockAnswerRepository,
        videos: MockVideoStore,
        notifier: MockNotifier,
        hour: u32,
    ) -> SubmissionService {
        SubmissionService::new(
            Arc::new(questions),
            Arc::new(answers),
            Arc::new(videos),
            Arc::new(notifier),
            clock_at(hour),
        )
    }

    #[tokio::test]
    async fn plain_questions_skip_every_gate() {
        let mut questions = MockQuestionRepository::new();
        questions.expect_insert().times(1).returning(|_| Ok(()));
        let mut videos = MockVideoStore::new();
        videos.expect_store().times(0);
        // Outside the window on purpose: no video, no gate.
        let service = service(
            questions,
            MockAnswerRepository::new(),
            videos,
            MockNotifier::new(),
            8,
        );

        let author = UserId::random();
        let posted = service
            .post_question(&author, question(author), None)
            .await
            .expect("plain post succeeds");
        assert!(posted.video.is_none());
    }

    #[tokio::test]
    async fn video_outside_the_window_is_policy_denied() {
        let mut questions = MockQuestionRepository::new();
        questions.expect_insert().times(0);
        let mut videos = MockVideoStore::new();
        videos.expect_store().times(0);
        let service = service(
            questions,
            MockAnswerRepository::new(),
            videos,
            MockNotifier::new(),
            19, // end hour, exclusive
        );

        let author = UserId::random();
        let err = service
            .post_question(
                &author,
                question(author),
                Some(VideoAttachment {
                    upload: upload(),
                    grant: Some(grant()),
                }),
            )
            .await
            .expect_err("window closed");
        assert_eq!(err, SubmissionError::UploadWindowClosed);
    }

    #[tokio::test]
    async fn video_without_a_grant_requires_verification() {
        let mut questions = MockQuestionRepository::new();
        questions.expect_insert().times(0);
        let mut videos = MockVideoStore::new();
        videos.expect_store().times(0);
        let service = service(
            questions,
            MockAnswerRepository::new(),
            videos,
            MockNotifier::new(),
            15,
        );

        let author = UserId::random();
        let err = service
            .post_question(
                &author,
                question(author),
                Some(VideoAttachment {
                    upload: upload(),
                    grant: None,
                }),
            )
            .await
            .expect_err("no grant");
        assert_eq!(err, SubmissionError::VerificationRequired);
    }

    #[tokio::test]
    async fn verified_video_inside_the_window_is_stored_and_attached() {
        let mut questions = MockQuestionRepository::new();
        questions
            .expect_insert()
            .withf(|q: &Question| q.video.is_some())
            .times(1)
            .returning(|_| Ok(()));
        let mut videos = MockVideoStore::new();
        videos
            .expect_store()
            .times(1)
            .returning(|_, _, _| Ok(VideoReference::new("owner/1-clip.mp4")));
        let service = service(
            questions,
            MockAnswerRepository::new(),
            videos,
            MockNotifier::new(),
            14, // start hour, inclusive
        );

        let author = UserId::random();
        let posted = service
            .post_question(
                &author,
                question(author),
                Some(VideoAttachment {
                    upload: upload(),
                    grant: Some(grant()),
                }),
            )
            .await
            .expect("gated post succeeds");
        assert_eq!(
            posted.video,
            Some(VideoReference::new("owner/1-clip.mp4"))
        );
    }

    #[tokio::test]
    async fn oversized_video_fails_before_any_store_call() {
        let mut questions = MockQuestionRepository::new();
        questions.expect_insert().times(0);
        let mut videos = MockVideoStore::new();
        videos.expect_store().times(0);
        let service = service(
            questions,
            MockAnswerRepository::new(),
            videos,
            MockNotifier::new(),
            15,
        );

        let author = UserId::random();
        let mut too_big = upload();
        too_big.byte_size = crate::domain::question::VIDEO_MAX_BYTES + 1;
        let err = service
            .post_question(
                &author,
                question(author),
                Some(VideoAttachment {
                    upload: too_big,
                    grant: Some(grant()),
                }),
            )
            .await
            .expect_err("too large");
        assert_eq!(
            err,
            SubmissionError::InvalidVideo(VideoValidationError::TooLarge)
        );
    }

    #[tokio::test]
    async fn answers_notify_the_question_author() {
        let question_author = UserId::random();
        let mut answers = MockAnswerRepository::new();
        answers.expect_insert().times(1).returning(move |_| {
            Ok(AnswerPosted {
                question_author,
                question_title: "How do rivers bend?".to_owned(),
            })
        });
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(move |recipient, notification| {
                *recipient == question_author
                    && notification.title == "New Answer"
                    && notification.body.contains("How do rivers bend?")
            })
            .times(1)
            .return_const(());
        let service = service(
            MockQuestionRepository::new(),
            answers,
            MockVideoStore::new(),
            notifier,
            15,
        );

        let answerer = UserId::random();
        service
            .post_answer(&answerer, &QuestionId::random(), "Gradients.".to_owned())
            .await
            .expect("answer posts");
    }

    #[tokio::test]
    async fn answering_your_own_question_skips_the_notification() {
        let author = UserId::random();
        let mut answers = MockAnswerRepository::new();
        answers.expect_insert().times(1).returning(move |_| {
            Ok(AnswerPosted {
                question_author: author,
                question_title: "Self?".to_owned(),
            })
        });
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(0);
        let service = service(
            MockQuestionRepository::new(),
            answers,
            MockVideoStore::new(),
            notifier,
            15,
        );

        service
            .post_answer(&author, &QuestionId::random(), "Yes.".to_owned())
            .await
            .expect("answer posts");
    }

    #[tokio::test]
    async fn answering_a_deleted_question_is_not_found() {
        let mut answers = MockAnswerRepository::new();
        answers.expect_insert().times(1).returning(|_| {
            Err(crate::domain::ports::AnswerRepositoryError::missing_question(
                "fk violation",
            ))
        });
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(0);
        let service = service(
            MockQuestionRepository::new(),
            answers,
            MockVideoStore::new(),
            notifier,
            15,
        );

        let err = service
            .post_answer(&UserId::random(), &QuestionId::random(), "late".to_owned())
            .await
            .expect_err("question gone");
        assert_eq!(err, SubmissionError::QuestionNotFound);
    }
}
