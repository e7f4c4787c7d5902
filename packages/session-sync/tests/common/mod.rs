#![allow(dead_code)]

use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing_subscriber::{fmt, EnvFilter};

use session_sync::{
    GameBoard, GamePresenter, Member, MemberId, MemoryRelay, MemoryRelayHub, Phase, SessionSync,
};

// Logging is auto-installed for the test binaries
#[ctor::ctor]
fn init_logging() {
    static INITIALIZED: OnceCell<()> = OnceCell::new();
    INITIALIZED.get_or_init(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init()
            .ok();
    });
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Phase(Phase),
    Score(String, i64),
    Owner(Option<MemberId>),
}

/// Presenter that records every notification for assertions.
#[derive(Default)]
pub struct RecordingPresenter {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingPresenter {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }

    pub fn owner_changes(&self) -> Vec<Option<MemberId>> {
        self.notifications()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Owner(owner) => Some(owner),
                _ => None,
            })
            .collect()
    }
}

impl GamePresenter for RecordingPresenter {
    fn on_phase_changed(&self, phase: Phase) {
        self.notifications.lock().push(Notification::Phase(phase));
    }

    fn on_score_changed(&self, name: &str, value: i64) {
        self.notifications
            .lock()
            .push(Notification::Score(name.to_string(), value));
    }

    fn on_owner_changed(&self, owner: Option<Member>) {
        self.notifications
            .lock()
            .push(Notification::Owner(owner.map(|member| member.id)));
    }
}

/// One member: relay handle, board, recording presenter, and the wired
/// facade registered as the relay observer.
pub struct TestClient {
    pub relay: Arc<MemoryRelay>,
    pub board: Arc<GameBoard>,
    pub presenter: Arc<RecordingPresenter>,
    pub sync: Arc<SessionSync>,
    pub id: MemberId,
}

pub fn join(hub: &Arc<MemoryRelayHub>, name: &str) -> TestClient {
    join_with_board(hub, name, Arc::new(GameBoard::new()))
}

pub fn join_with_board(
    hub: &Arc<MemoryRelayHub>,
    name: &str,
    board: Arc<GameBoard>,
) -> TestClient {
    let relay = hub.client();
    let presenter = Arc::new(RecordingPresenter::default());
    let sync = Arc::new(SessionSync::new(
        relay.clone(),
        board.clone(),
        presenter.clone(),
    ));
    let id = relay.join(name, sync.clone());
    TestClient {
        relay,
        board,
        presenter,
        sync,
        id,
    }
}
