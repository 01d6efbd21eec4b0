//! Shared test helpers for integration tests.
//!
//! Provides in-memory collaborators for the duplicate review workflow and
//! construction of `GlobalConfig` / `AppState` so individual test modules
//! can focus on behaviour rather than boilerplate.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Semaphore;

use lesson_admin::config::GlobalConfig;
use lesson_admin::http::AppState;
use lesson_admin::models::duplicate::{
    DetectionMethod, DismissOutcome, DismissRequest, DuplicateGroup, LessonSummary,
    ResolutionAction, ResolveOutcome, ResolveRequest,
};
use lesson_admin::models::user::{Role, UserProfile};
use lesson_admin::persistence::db::{self, Database};
use lesson_admin::persistence::resolution_repo::ResolutionRepo;
use lesson_admin::persistence::user_repo::UserRepo;
use lesson_admin::platform::Mailer;
use lesson_admin::review::{
    BoxFuture, DuplicateResolver, DuplicateReview, GroupSource, ReviewSettings,
};
use lesson_admin::{AppError, Result};

/// Build a duplicate group whose lessons share a title.
pub fn group(id: &str, method: DetectionMethod, lessons: &[&str]) -> DuplicateGroup {
    DuplicateGroup {
        group_id: id.to_owned(),
        lessons: lessons
            .iter()
            .enumerate()
            .map(|(idx, lesson)| LessonSummary {
                id: (*lesson).to_owned(),
                title: format!("Lesson {id}"),
                recommended_canonical: idx == 0,
                similarity: Some(0.95),
            })
            .collect(),
        detection_method: method,
        similarity: Some(0.95),
    }
}

/// Three same-title groups `A`, `B`, `C` with lessons `{G}1..{G}3`.
pub fn three_groups() -> Vec<DuplicateGroup> {
    ["A", "B", "C"]
        .iter()
        .map(|id| {
            let lessons: Vec<String> = (1..=3).map(|n| format!("{id}{n}")).collect();
            let refs: Vec<&str> = lessons.iter().map(String::as_str).collect();
            group(id, DetectionMethod::SameTitle, &refs)
        })
        .collect()
}

/// How the mock resolver answers.
#[derive(Debug, Clone)]
pub enum Reply {
    /// `success: true`.
    Success,
    /// `success: false` with the given message.
    Reject(String),
    /// The call itself fails.
    Transport,
}

/// Recording [`DuplicateResolver`] with a configurable reply.
pub struct MockResolver {
    reply: Mutex<Reply>,
    /// Every resolve request received.
    pub resolves: Mutex<Vec<ResolveRequest>>,
    /// Every dismiss request received.
    pub dismisses: Mutex<Vec<DismissRequest>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockResolver {
    /// Resolver that answers immediately with `reply`.
    pub fn new(reply: Reply) -> Self {
        Self {
            reply: Mutex::new(reply),
            resolves: Mutex::new(Vec::new()),
            dismisses: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Resolver that waits for a permit on `gate` before answering.
    pub fn gated(reply: Reply, gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(reply)
        }
    }

    /// Change the reply for subsequent calls.
    pub fn set_reply(&self, reply: Reply) {
        *self.reply.lock().unwrap() = reply;
    }

    /// Number of resolve calls.
    pub fn resolve_count(&self) -> usize {
        self.resolves.lock().unwrap().len()
    }

    /// Number of dismiss calls.
    pub fn dismiss_count(&self) -> usize {
        self.dismisses.lock().unwrap().len()
    }

    async fn wait_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
    }

    fn current_reply(&self) -> Reply {
        self.reply.lock().unwrap().clone()
    }
}

impl DuplicateResolver for MockResolver {
    fn resolve<'a>(&'a self, request: &'a ResolveRequest) -> BoxFuture<'a, Result<ResolveOutcome>> {
        Box::pin(async move {
            self.resolves.lock().unwrap().push(request.clone());
            self.wait_gate().await;
            match self.current_reply() {
                Reply::Success => {
                    let kept = request
                        .resolutions
                        .iter()
                        .filter(|r| r.action == ResolutionAction::Keep)
                        .count();
                    let kept = u32::try_from(kept).unwrap();
                    let total = u32::try_from(request.resolutions.len()).unwrap();
                    Ok(ResolveOutcome {
                        success: true,
                        kept_count: kept,
                        archived_count: total - kept,
                        error: None,
                    })
                }
                Reply::Reject(message) => Ok(ResolveOutcome {
                    success: false,
                    kept_count: 0,
                    archived_count: 0,
                    error: Some(message),
                }),
                Reply::Transport => Err(AppError::Platform("connection reset".into())),
            }
        })
    }

    fn dismiss<'a>(&'a self, request: &'a DismissRequest) -> BoxFuture<'a, Result<DismissOutcome>> {
        Box::pin(async move {
            self.dismisses.lock().unwrap().push(request.clone());
            self.wait_gate().await;
            match self.current_reply() {
                Reply::Success => Ok(DismissOutcome {
                    success: true,
                    error: None,
                }),
                Reply::Reject(message) => Ok(DismissOutcome {
                    success: false,
                    error: Some(message),
                }),
                Reply::Transport => Err(AppError::Platform("connection reset".into())),
            }
        })
    }
}

/// In-memory [`GroupSource`] that can be told to fail.
#[derive(Default)]
pub struct StaticSource {
    groups: Mutex<Vec<DuplicateGroup>>,
    fail: AtomicBool,
    /// Number of fetches.
    pub fetches: AtomicUsize,
}

impl StaticSource {
    /// Source returning `groups`.
    pub fn new(groups: Vec<DuplicateGroup>) -> Self {
        Self {
            groups: Mutex::new(groups),
            ..Self::default()
        }
    }

    /// Replace the groups returned by later fetches.
    pub fn set_groups(&self, groups: Vec<DuplicateGroup>) {
        *self.groups.lock().unwrap() = groups;
    }

    /// Make later fetches fail (or succeed again).
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl GroupSource for StaticSource {
    fn fetch_groups(&self, _include_resolved: bool) -> BoxFuture<'_, Result<Vec<DuplicateGroup>>> {
        Box::pin(async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(AppError::Report("report unavailable".into()));
            }
            Ok(self.groups.lock().unwrap().clone())
        })
    }
}

/// Default review settings with the given TTL.
pub fn settings(ttl: Duration) -> ReviewSettings {
    ReviewSettings {
        dismiss_reason: "Reviewed by admin: not duplicates".into(),
        recently_resolved_ttl: ttl,
    }
}

/// Everything a review-controller test needs.
pub struct ReviewFixture {
    /// Controller under test.
    pub review: DuplicateReview,
    /// Resolver the controller calls.
    pub resolver: Arc<MockResolver>,
    /// Source the controller loads from.
    pub source: Arc<StaticSource>,
    /// Journal the controller writes to.
    pub journal: ResolutionRepo,
}

/// Controller over `groups` with an in-memory journal.
pub async fn review_fixture(groups: Vec<DuplicateGroup>, resolver: MockResolver) -> ReviewFixture {
    let db = Arc::new(db::connect_memory().await.expect("db connect"));
    let journal = ResolutionRepo::new(db);
    let resolver = Arc::new(resolver);
    let source = Arc::new(StaticSource::new(groups));
    let review = DuplicateReview::new(
        "reviewer-1",
        Arc::clone(&source) as Arc<dyn GroupSource>,
        Arc::clone(&resolver) as Arc<dyn DuplicateResolver>,
        journal.clone(),
        settings(Duration::from_secs(300)),
    );
    ReviewFixture {
        review,
        resolver,
        source,
        journal,
    }
}

/// Build a minimal `GlobalConfig` rooted at `data_dir`.
pub fn test_config(data_dir: &str) -> GlobalConfig {
    let toml = format!(
        r#"
data_dir = '{data_dir}'
http_port = 0
public_url = "https://lessons.example.org/"

[report]
path = "duplicates.json"
"#
    );
    GlobalConfig::from_toml_str(&toml).expect("test config")
}

/// Shared database plus state for HTTP-level tests.
pub struct AppFixture {
    /// Application state.
    pub state: Arc<AppState>,
    /// Underlying database.
    pub db: Arc<Database>,
    /// Resolver wired into the state.
    pub resolver: Arc<MockResolver>,
    /// Keeps the data directory alive.
    pub _temp: tempfile::TempDir,
}

/// Build `AppState` over an in-memory database, static groups, and a mock resolver.
pub async fn app_fixture(groups: Vec<DuplicateGroup>, resolver: MockResolver) -> AppFixture {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = Arc::new(test_config(temp.path().to_str().expect("utf8")));
    let db = Arc::new(db::connect_memory().await.expect("db connect"));
    let resolver = Arc::new(resolver);
    let state = AppState::new(
        config,
        &db,
        Mailer::disabled(),
        Arc::new(StaticSource::new(groups)),
        Arc::clone(&resolver) as Arc<dyn DuplicateResolver>,
    )
    .expect("app state");
    AppFixture {
        state: Arc::new(state),
        db,
        resolver,
        _temp: temp,
    }
}

/// Insert an active user with `role` and return its id.
pub async fn seed_user(db: &Arc<Database>, name: &str, role: Role) -> String {
    let repo = UserRepo::new(Arc::clone(db));
    let user = UserProfile::new(name.to_owned(), role, None);
    let email = format!("{}@example.org", name.to_lowercase());
    repo.create(&user, Some(&email)).await.expect("seed user");
    user.id
}
