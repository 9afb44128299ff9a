//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports, backed by
//! PostgreSQL via `diesel-async` with `bb8` connection pooling.
//!
//! Principles:
//!
//! - **Thin adapters**: implementations translate between Diesel rows and
//!   domain types; business rules stay in the domain.
//! - **Internal models**: row structs (`models`) and table definitions
//!   (`schema`) never leak upward.
//! - **Atomicity where the port demands it**: the points transfer runs in a
//!   single transaction, the upvote is a single `UPDATE ... RETURNING`.
//! - **Typed faults**: every database error becomes a port error variant,
//!   with the connection/query split preserved for retry decisions.

pub(crate) mod diesel_helpers;
mod diesel_answer_repository;
mod diesel_board_repository;
mod diesel_login_history_repository;
mod diesel_points_repository;
mod diesel_question_repository;
mod diesel_reset_throttle_repository;
mod diesel_user_repository;
mod models;
mod pool;
mod schema;

pub use diesel_answer_repository::DieselAnswerRepository;
pub use diesel_board_repository::DieselBoardRepository;
pub use diesel_login_history_repository::DieselLoginHistoryRepository;
pub use diesel_points_repository::DieselPointsRepository;
pub use diesel_question_repository::DieselQuestionRepository;
pub use diesel_reset_throttle_repository::DieselResetThrottleRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
