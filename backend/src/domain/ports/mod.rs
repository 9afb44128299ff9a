//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod answer_repository;
mod board_repository;
mod change_feed;
mod delivery_channel;
mod login_history_repository;
mod login_service;
mod notifier;
mod points_repository;
mod question_repository;
mod reset_throttle_repository;
mod user_repository;
mod video_store;

#[cfg(test)]
pub use answer_repository::MockAnswerRepository;
pub use answer_repository::{
    AnswerPosted, AnswerRepository, AnswerRepositoryError, FixtureAnswerRepository, UpvoteApplied,
};
#[cfg(test)]
pub use board_repository::MockBoardRepository;
pub use board_repository::{BoardRepository, BoardRepositoryError, FixtureBoardRepository};
pub use change_feed::{
    ChangeEvent, ChangeFeed, ChangeFeedError, ChangeOp, Collection, FeedSubscription,
};
#[cfg(test)]
pub use delivery_channel::MockDeliveryChannel;
pub use delivery_channel::{DeliveryChannel, LoggingDeliveryChannel};
#[cfg(test)]
pub use login_history_repository::MockLoginHistoryRepository;
pub use login_history_repository::{
    FixtureLoginHistoryRepository, LoginHistoryRepository, LoginHistoryRepositoryError,
};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::{FIXTURE_USER_ID, FixtureLoginService, LoginError, LoginService};
#[cfg(test)]
pub use notifier::MockNotifier;
pub use notifier::{FixtureNotifier, Notification, NotificationSource, Notifier};
#[cfg(test)]
pub use points_repository::MockPointsRepository;
pub use points_repository::{
    FixturePointsRepository, PointsRepository, PointsRepositoryError, TransferBalances,
};
#[cfg(test)]
pub use question_repository::MockQuestionRepository;
pub use question_repository::{
    FixtureQuestionRepository, QuestionRepository, QuestionRepositoryError,
};
#[cfg(test)]
pub use reset_throttle_repository::MockResetThrottleRepository;
pub use reset_throttle_repository::{
    FixtureResetThrottleRepository, ResetThrottleRepository, ResetThrottleRepositoryError,
    ResetThrottleState,
};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{FixtureUserRepository, UserRepository, UserRepositoryError};
#[cfg(test)]
pub use video_store::MockVideoStore;
pub use video_store::{FixtureVideoStore, VideoStore, VideoStoreError};
