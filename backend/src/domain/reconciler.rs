//! Background reconciliation of the board snapshot against the change feed.
//!
//! The reconciler never patches incrementally: any change event triggers a
//! full reload from the source of truth, and the fresh snapshot is swapped
//! in atomically through a watch channel once fully materialised. Readers
//! therefore observe either the old complete snapshot or the new complete
//! one, never a mix. Event bursts arriving while a reload is in flight
//! coalesce into exactly one trailing reload.

use std::sync::Arc;

use mockable::Clock;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::board::BoardSnapshot;
use crate::domain::ports::{
    BoardRepository, BoardRepositoryError, ChangeFeed, ChangeFeedError, FeedSubscription,
};

/// Failures while bringing the reconciler up. Once running it does not fail:
/// a broken reload keeps the previous snapshot and waits for the next event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcilerStartError {
    /// The initial full load failed.
    #[error("initial board load failed: {0}")]
    InitialLoad(#[from] BoardRepositoryError),
    /// The change feed refused the subscription.
    #[error("change feed subscription failed: {0}")]
    Subscribe(#[from] ChangeFeedError),
}

/// Read side of the snapshot channel handed to the HTTP and WebSocket
/// adapters.
pub type SnapshotReceiver = watch::Receiver<Arc<BoardSnapshot>>;

/// Running reconciler lifecycle handle.
///
/// Dropping the handle also stops the background task; `shutdown` does the
/// same but waits for the task to finish unwinding. Stopping is a lifecycle
/// operation and never surfaces an error to the consumer.
#[derive(Debug)]
pub struct ReconcilerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ReconcilerHandle {
    /// Stop the background task: unsubscribe from the feed and cancel any
    /// in-flight reload.
    pub async fn shutdown(self) {
        // Send failure means the task already exited on its own.
        let _ = self.stop.send(true);
        if self.task.await.is_err() {
            warn!("board reconciler task panicked during shutdown");
        }
    }
}

/// Keeps the in-memory board consistent with a continuously changing store.
pub struct BoardReconciler {
    board: Arc<dyn BoardRepository>,
    feed: Arc<dyn ChangeFeed>,
    clock: Arc<dyn Clock>,
}

impl BoardReconciler {
    /// Build a reconciler over the board store and change feed.
    pub fn new(
        board: Arc<dyn BoardRepository>,
        feed: Arc<dyn ChangeFeed>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { board, feed, clock }
    }

    /// Perform the initial full load, subscribe to the feed, and spawn the
    /// background task.
    pub async fn start(self) -> Result<(ReconcilerHandle, SnapshotReceiver), ReconcilerStartError> {
        let Self { board, feed, clock } = self;

        // Subscribe before the first load so no event can fall between them.
        let subscription = feed.subscribe().await?;

        let source = board.fetch_all().await?;
        let initial = BoardSnapshot::assemble(source, clock.utc());
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(initial));
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(run(board, clock, subscription, snapshot_tx, stop_rx));
        Ok((
            ReconcilerHandle {
                stop: stop_tx,
                task,
            },
            snapshot_rx,
        ))
    }
}

async fn run(
    board: Arc<dyn BoardRepository>,
    clock: Arc<dyn Clock>,
    mut subscription: FeedSubscription,
    snapshot_tx: watch::Sender<Arc<BoardSnapshot>>,
    mut stop_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = stop_rx.changed() => break,
            event = subscription.next_event() => {
                let Some(event) = event else {
                    debug!("change feed closed; board reconciler stopping");
                    break;
                };
                debug!(?event, "change event received; reloading board");

                // Everything queued behind this event is covered by the same
                // reload: drain the burst instead of reloading per event.
                while subscription.try_next().is_some() {}

                tokio::select! {
                    _ = stop_rx.changed() => break,
                    loaded = board.fetch_all() => match loaded {
                        Ok(source) => {
                            let snapshot = BoardSnapshot::assemble(source, clock.utc());
                            snapshot_tx.send_replace(Arc::new(snapshot));
                        }
                        Err(error) => {
                            warn!(%error, "board reload failed; keeping the previous snapshot");
                        }
                    }
                }
            }
        }
    }
    subscription.unsubscribe();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::board::{BoardSource, QuestionWithAuthor};
    use crate::domain::ports::{ChangeEvent, ChangeOp, Collection};
    use crate::domain::question::Question;
    use crate::domain::user::{EmailAddress, UserId};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::sync::{Semaphore, mpsc};
    use tokio::time::timeout;

    const TICK: Duration = Duration::from_millis(200);

    fn event() -> ChangeEvent {
        ChangeEvent {
            collection: Collection::Answers,
            op: ChangeOp::Insert,
        }
    }

    fn question(title: &str) -> QuestionWithAuthor {
        QuestionWithAuthor {
            question: Question::compose(UserId::random(), title, "body", None, Utc::now())
                .expect("valid question"),
            author_email: EmailAddress::new("asker@example.org").expect("valid email"),
        }
    }

    /// Board store double whose loads block on a semaphore and serve
    /// whatever the test last staged.
    struct GatedBoardRepository {
        loads: AtomicU32,
        gate: Semaphore,
        current: Mutex<BoardSource>,
    }

    impl GatedBoardRepository {
        fn new(initial_permits: usize) -> Self {
            Self {
                loads: AtomicU32::new(0),
                gate: Semaphore::new(initial_permits),
                current: Mutex::new(BoardSource::default()),
            }
        }

        fn stage(&self, source: BoardSource) {
            *self.current.lock().expect("source mutex") = source;
        }

        fn release_one(&self) {
            self.gate.add_permits(1);
        }

        fn load_count(&self) -> u32 {
            self.loads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BoardRepository for GatedBoardRepository {
        async fn fetch_all(&self) -> Result<BoardSource, BoardRepositoryError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            let permit = self.gate.acquire().await.map_err(|_| {
                BoardRepositoryError::connection("gate closed")
            })?;
            permit.forget();
            Ok(self.current.lock().expect("source mutex").clone())
        }
    }

    /// One-shot feed handing out a channel the test writes into.
    struct TestFeed {
        subscription: Mutex<Option<FeedSubscription>>,
    }

    impl TestFeed {
        fn new() -> (Arc<Self>, mpsc::Sender<ChangeEvent>) {
            let (tx, rx) = mpsc::channel(16);
            let subscription =
                FeedSubscription::new(rx, Arc::new(AtomicBool::new(false)));
            (
                Arc::new(Self {
                    subscription: Mutex::new(Some(subscription)),
                }),
                tx,
            )
        }
    }

    #[async_trait]
    impl ChangeFeed for TestFeed {
        async fn subscribe(&self) -> Result<FeedSubscription, ChangeFeedError> {
            self.subscription
                .lock()
                .expect("subscription mutex")
                .take()
                .ok_or_else(|| ChangeFeedError::connection("already subscribed"))
        }
    }

    async fn wait_for_loads(repo: &GatedBoardRepository, expected: u32) {
        timeout(TICK * 10, async {
            while repo.load_count() < expected {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "expected {expected} loads, saw {} before the deadline",
                repo.load_count()
            )
        });
    }

    fn test_clock() -> Arc<dyn Clock> {
        let mut clock = mockable::MockClock::new();
        clock.expect_utc().returning(Utc::now);
        Arc::new(clock)
    }

    #[tokio::test]
    async fn events_during_a_reload_coalesce_into_one_trailing_reload() {
        let repo = Arc::new(GatedBoardRepository::new(1)); // initial load only
        let (feed, events) = TestFeed::new();
        let reconciler = BoardReconciler::new(
            Arc::clone(&repo) as Arc<dyn BoardRepository>,
            feed,
            test_clock(),
        );
        let (handle, mut snapshots) = reconciler.start().await.expect("start");
        assert_eq!(repo.load_count(), 1);

        // First event starts a reload that blocks on the gate.
        events.send(event()).await.expect("feed open");
        wait_for_loads(&repo, 2).await;

        // Three rapid events land while that reload is in flight.
        for _ in 0..3 {
            events.send(event()).await.expect("feed open");
        }
        repo.stage(BoardSource {
            questions: vec![question("after the burst")],
            answers: Vec::new(),
        });

        // Finish the in-flight reload, then the one coalesced trailing one.
        repo.release_one();
        wait_for_loads(&repo, 3).await;
        repo.release_one();

        // The trailing reload publishes a snapshot with the staged data.
        timeout(TICK * 10, async {
            loop {
                snapshots.changed().await.expect("sender alive");
                if snapshots.borrow().questions.len() == 1 {
                    break;
                }
            }
        })
        .await
        .expect("coalesced snapshot arrives");

        // No further reloads happen for the burst.
        tokio::time::sleep(TICK).await;
        assert_eq!(repo.load_count(), 3, "three events, one trailing reload");

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn failed_reloads_keep_the_previous_snapshot() {
        struct FlakyRepository {
            loads: AtomicU32,
        }

        #[async_trait]
        impl BoardRepository for FlakyRepository {
            async fn fetch_all(&self) -> Result<BoardSource, BoardRepositoryError> {
                let call = self.loads.fetch_add(1, Ordering::SeqCst);
                if call == 0 {
                    Ok(BoardSource {
                        questions: vec![QuestionWithAuthor {
                            question: Question::compose(
                                UserId::random(),
                                "survivor",
                                "body",
                                None,
                                Utc::now(),
                            )
                            .expect("valid question"),
                            author_email: EmailAddress::new("asker@example.org")
                                .expect("valid email"),
                        }],
                        answers: Vec::new(),
                    })
                } else {
                    Err(BoardRepositoryError::connection("store down"))
                }
            }
        }

        let repo = Arc::new(FlakyRepository {
            loads: AtomicU32::new(0),
        });
        let (feed, events) = TestFeed::new();
        let reconciler = BoardReconciler::new(
            Arc::clone(&repo) as Arc<dyn BoardRepository>,
            feed,
            test_clock(),
        );
        let (handle, snapshots) = reconciler.start().await.expect("start");

        events.send(event()).await.expect("feed open");
        timeout(TICK * 10, async {
            while repo.loads.load(Ordering::SeqCst) < 2 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("reload attempted");
        tokio::time::sleep(TICK).await;

        assert_eq!(
            snapshots.borrow().questions.len(),
            1,
            "previous snapshot stays in place"
        );
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_stops_the_feed_without_error() {
        let repo = Arc::new(GatedBoardRepository::new(8));
        let (feed, events) = TestFeed::new();
        let reconciler = BoardReconciler::new(
            Arc::clone(&repo) as Arc<dyn BoardRepository>,
            feed,
            test_clock(),
        );
        let (handle, _snapshots) = reconciler.start().await.expect("start");

        handle.shutdown().await;

        // The subscription was closed, so the producer side sees the
        // consumer gone.
        assert!(
            events.send(event()).await.is_err(),
            "feed channel closed after shutdown"
        );
    }

    #[tokio::test]
    async fn startup_failure_surfaces_instead_of_spawning() {
        struct DeadRepository;

        #[async_trait]
        impl BoardRepository for DeadRepository {
            async fn fetch_all(&self) -> Result<BoardSource, BoardRepositoryError> {
                Err(BoardRepositoryError::connection("store down"))
            }
        }

        let (feed, _events) = TestFeed::new();
        let reconciler =
            BoardReconciler::new(Arc::new(DeadRepository), feed, test_clock());
        let err = reconciler.start().await.expect_err("startup fails");
        assert!(matches!(err, ReconcilerStartError::InitialLoad(_)));
    }
}
