//! Shared helpers for HTTP adapter tests.

use std::sync::Arc;

use actix_session::storage::CookieSessionStore;
use actix_session::{SessionMiddleware, config::CookieContentSecurity};
use actix_web::cookie::{Key, SameSite};
use chrono::Utc;
use mockable::DefaultClock;
use tokio::sync::watch;

use crate::domain::ports::{
    FixtureAnswerRepository, FixtureLoginHistoryRepository, FixtureLoginService,
    FixtureNotifier, FixturePointsRepository, FixtureQuestionRepository,
    FixtureResetThrottleRepository, FixtureUserRepository, FixtureVideoStore,
    LoggingDeliveryChannel,
};
use crate::domain::{
    BoardSnapshot, PasswordResetService, PointsLedger, RandomCodeGenerator, ResetRateLimiter,
    SubmissionService, VoteCounter,
};
use crate::inbound::http::state::{HttpState, VerificationRegistry};

/// Session middleware configured for tests: ephemeral key, no TLS
/// requirement so test requests over plain HTTP carry the cookie.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".into())
        .cookie_secure(false)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .cookie_content_security(CookieContentSecurity::Private)
        .build()
}

/// An [`HttpState`] wired entirely to fixtures, plus the snapshot sender so
/// tests can publish board updates. Swap individual fields for mocks.
pub fn fixture_http_state() -> (HttpState, watch::Sender<Arc<BoardSnapshot>>) {
    let clock: Arc<dyn mockable::Clock> = Arc::new(DefaultClock);
    let (snapshot_tx, board) = watch::channel(Arc::new(BoardSnapshot::empty(Utc::now())));

    let state = HttpState {
        login: Arc::new(FixtureLoginService),
        users: Arc::new(FixtureUserRepository),
        login_history: Arc::new(FixtureLoginHistoryRepository),
        ledger: Arc::new(PointsLedger::new(
            Arc::new(FixtureUserRepository),
            Arc::new(FixturePointsRepository),
            clock.clone(),
        )),
        password_reset: Arc::new(PasswordResetService::new(
            Arc::new(FixtureUserRepository),
            ResetRateLimiter::new(Arc::new(FixtureResetThrottleRepository), clock.clone()),
            Arc::new(LoggingDeliveryChannel),
        )),
        submissions: Arc::new(SubmissionService::new(
            Arc::new(FixtureQuestionRepository),
            Arc::new(FixtureAnswerRepository),
            Arc::new(FixtureVideoStore),
            Arc::new(FixtureNotifier),
            clock.clone(),
        )),
        votes: Arc::new(VoteCounter::new(
            Arc::new(FixtureAnswerRepository),
            Arc::new(FixtureNotifier),
        )),
        board,
        gates: Arc::new(VerificationRegistry::new()),
        code_generator: Arc::new(RandomCodeGenerator),
        delivery: Arc::new(LoggingDeliveryChannel),
        clock,
    };
    (state, snapshot_tx)
}
