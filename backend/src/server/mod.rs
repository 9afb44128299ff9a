//! Server construction: state wiring, middleware, and the run loop.

mod config;

pub use config::{
    AppSettings, BIND_ADDR_ENV, COOKIE_SECURE_ENV, ConfigError, DATABASE_URL_ENV, ServerConfig,
    settings_from_env,
};

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::SameSite;
use actix_web::{App, HttpServer, web};
use mockable::{Clock, DefaultClock};
use tracing::info;

#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use crate::domain::ports::{
    AnswerRepository, BoardRepository, ChangeFeed, DeliveryChannel, FixtureAnswerRepository,
    FixtureBoardRepository, FixtureLoginHistoryRepository, FixtureLoginService,
    FixturePointsRepository, FixtureQuestionRepository, FixtureResetThrottleRepository,
    FixtureUserRepository, FixtureVideoStore, LoginHistoryRepository, LoginService, Notifier,
    PointsRepository, QuestionRepository, ResetThrottleRepository, UserRepository,
};
use crate::domain::{
    BoardReconciler, PasswordResetService, PointsLedger, RandomCodeGenerator, ReconcilerHandle,
    ResetRateLimiter, SubmissionService, VoteCounter,
};
#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::state::{HttpState, VerificationRegistry};
use crate::inbound::http::{answers, auth, board, profile, questions};
use crate::inbound::ws;
use crate::inbound::ws::state::WsState;
use crate::middleware::Trace;
use crate::outbound::feed::BroadcastChangeFeed;
use crate::outbound::notify::SessionNotifier;
use crate::outbound::persistence::{
    DieselAnswerRepository, DieselBoardRepository, DieselLoginHistoryRepository,
    DieselPointsRepository, DieselQuestionRepository, DieselResetThrottleRepository,
    DieselUserRepository,
};

struct Repositories {
    users: Arc<dyn UserRepository>,
    points: Arc<dyn PointsRepository>,
    throttle: Arc<dyn ResetThrottleRepository>,
    questions: Arc<dyn QuestionRepository>,
    answers: Arc<dyn AnswerRepository>,
    board: Arc<dyn BoardRepository>,
    login_history: Arc<dyn LoginHistoryRepository>,
}

/// Pick Diesel adapters when a pool is configured, fixtures otherwise.
fn build_repositories(config: &ServerConfig, feed: &Arc<BroadcastChangeFeed>) -> Repositories {
    match &config.db_pool {
        Some(pool) => Repositories {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            points: Arc::new(DieselPointsRepository::new(pool.clone())),
            throttle: Arc::new(DieselResetThrottleRepository::new(pool.clone())),
            questions: Arc::new(DieselQuestionRepository::new(pool.clone(), feed.clone())),
            answers: Arc::new(DieselAnswerRepository::new(pool.clone(), feed.clone())),
            board: Arc::new(DieselBoardRepository::new(pool.clone())),
            login_history: Arc::new(DieselLoginHistoryRepository::new(pool.clone())),
        },
        None => Repositories {
            users: Arc::new(FixtureUserRepository),
            points: Arc::new(FixturePointsRepository),
            throttle: Arc::new(FixtureResetThrottleRepository),
            questions: Arc::new(FixtureQuestionRepository),
            answers: Arc::new(FixtureAnswerRepository),
            board: Arc::new(FixtureBoardRepository),
            login_history: Arc::new(FixtureLoginHistoryRepository),
        },
    }
}

/// Everything the running server is made of.
pub struct BuiltStates {
    /// HTTP handler dependencies.
    pub http: HttpState,
    /// WebSocket handler dependencies.
    pub ws: WsState,
    /// The background reconciler's lifecycle handle.
    pub reconciler: ReconcilerHandle,
}

/// Wire adapters, services, and the background reconciler.
pub async fn build_states(config: &ServerConfig) -> std::io::Result<BuiltStates> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let feed = Arc::new(BroadcastChangeFeed::default());
    let notifier = Arc::new(SessionNotifier::new());
    let repos = build_repositories(config, &feed);

    let ledger = Arc::new(PointsLedger::new(
        repos.users.clone(),
        repos.points.clone(),
        clock.clone(),
    ));
    let password_reset = Arc::new(PasswordResetService::new(
        repos.users.clone(),
        ResetRateLimiter::new(repos.throttle.clone(), clock.clone()),
        Arc::new(crate::domain::ports::LoggingDeliveryChannel) as Arc<dyn DeliveryChannel>,
    ));
    let submissions = Arc::new(SubmissionService::new(
        repos.questions.clone(),
        repos.answers.clone(),
        Arc::new(FixtureVideoStore),
        notifier.clone() as Arc<dyn Notifier>,
        clock.clone(),
    ));
    let votes = Arc::new(VoteCounter::new(
        repos.answers.clone(),
        notifier.clone() as Arc<dyn Notifier>,
    ));

    let reconciler = BoardReconciler::new(
        repos.board.clone(),
        feed.clone() as Arc<dyn ChangeFeed>,
        clock.clone(),
    );
    let (reconciler_handle, snapshots) = reconciler
        .start()
        .await
        .map_err(|err| std::io::Error::other(format!("reconciler failed to start: {err}")))?;

    let http = HttpState {
        login: Arc::new(FixtureLoginService) as Arc<dyn LoginService>,
        users: repos.users,
        login_history: repos.login_history,
        ledger,
        password_reset,
        submissions,
        votes,
        board: snapshots.clone(),
        gates: Arc::new(VerificationRegistry::new()),
        code_generator: Arc::new(RandomCodeGenerator),
        delivery: Arc::new(crate::domain::ports::LoggingDeliveryChannel),
        clock,
    };
    let ws = WsState::new(snapshots, notifier);

    Ok(BuiltStates {
        http,
        ws,
        reconciler: reconciler_handle,
    })
}

/// Build and run the HTTP server until it exits, then stop the reconciler.
pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let states = build_states(&config).await?;
    let http_state = web::Data::new(states.http);
    let ws_state = web::Data::new(states.ws);
    let health_state = web::Data::new(HealthState::new());

    let key = config.key.clone();
    let cookie_secure = config.cookie_secure;
    let server_http_state = http_state.clone();
    let server_ws_state = ws_state.clone();
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        let session_middleware = || {
            SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
                .cookie_name("session".into())
                .cookie_path("/".into())
                .cookie_secure(cookie_secure)
                .cookie_http_only(true)
                .cookie_same_site(SameSite::Lax)
                .build()
        };

        let api = web::scope("/api/v1")
            .wrap(session_middleware())
            .service(auth::login)
            .service(auth::logout)
            .service(auth::request_password_reset)
            .service(board::get_board)
            .service(questions::submit_question)
            .service(questions::issue_verification_code)
            .service(questions::verify_code)
            .service(answers::submit_answer)
            .service(answers::upvote_answer)
            .service(profile::get_profile)
            .service(profile::update_language)
            .service(profile::transfer_points);

        // The WebSocket entry needs the session cookie too, for scoping
        // notifications to the signed-in user.
        let ws_scope = web::scope("/ws")
            .wrap(session_middleware())
            .service(ws::ws_entry);

        let app = App::new()
            .app_data(server_http_state.clone())
            .app_data(server_ws_state.clone())
            .app_data(server_health_state.clone())
            .wrap(Trace)
            .service(api)
            .service(ws_scope)
            .service(ready)
            .service(live);

        #[cfg(debug_assertions)]
        let app =
            app.service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()));

        #[cfg(feature = "metrics")]
        let app = app.wrap(make_metrics());

        app
    })
    .bind(config.bind_addr)?;

    health_state.mark_ready();
    info!(addr = %config.bind_addr, "server listening");
    let result = server.run().await;

    health_state.mark_unhealthy();
    states.reconciler.shutdown().await;
    result
}

#[cfg(feature = "metrics")]
fn make_metrics() -> actix_web_prom::PrometheusMetrics {
    actix_web_prom::PrometheusMetricsBuilder::new("board")
        .endpoint("/metrics")
        .build()
        .expect("configure Prometheus metrics")
}
