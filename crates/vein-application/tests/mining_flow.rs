//! End-to-end tests of the mining use cases over an in-memory store.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use vein_application::{BoostService, MiningService, Reconciler};
use vein_core::account::{Account, AccountRepository, AccountStatus};
use vein_core::accrual::AccrualEngine;
use vein_core::boost::Challenge;
use vein_core::error::{Result, VeinError};
use vein_core::session::{SessionRegistry, SubjectId};
use vein_infrastructure::MemoryAccountRepository;

fn service_over(repository: Arc<dyn AccountRepository>) -> MiningService {
    let registry = Arc::new(SessionRegistry::new());
    let engine = Arc::new(AccrualEngine::new(repository.clone()));
    MiningService::new(registry, engine, repository)
}

#[tokio::test]
async fn start_creates_account_lazily() {
    let repository = Arc::new(MemoryAccountRepository::new());
    let service = service_over(repository.clone());

    let outcome = service.start(SubjectId::from("42"), "durov").await.unwrap();
    assert!(outcome.started);
    assert_eq!(outcome.mining_power, 1.0);
    assert_eq!(outcome.base_rate_per_minute, 0.005);

    let account = repository.find_by_identity("durov").await.unwrap().unwrap();
    assert_eq!(account.total_mined, 0.0);

    // A second start is a no-op signal, not an error, and not a new session.
    let outcome = service.start(SubjectId::from("42"), "durov").await.unwrap();
    assert!(!outcome.started);
    assert_eq!(service.registry().len().await, 1);
}

#[tokio::test]
async fn start_without_identity_has_no_side_effects() {
    let repository = Arc::new(MemoryAccountRepository::new());
    let service = service_over(repository.clone());

    let err = service.start(SubjectId::from("42"), "").await.unwrap_err();
    assert!(err.is_invalid_input());
    assert!(repository.list_all().await.unwrap().is_empty());
    assert!(service.registry().is_empty().await);
}

#[tokio::test]
async fn deactivated_account_cannot_start() {
    let now = Utc::now();
    let mut account = Account::new("durov", now);
    account.status = AccountStatus::Inactive;
    let repository = Arc::new(MemoryAccountRepository::with_accounts([account]));
    let service = service_over(repository.clone());

    let err = service.start(SubjectId::from("42"), "durov").await.unwrap_err();
    assert!(err.is_invalid_input());
    assert!(service.registry().is_empty().await);
}

#[tokio::test]
async fn stop_reconciles_and_reports() {
    let repository = Arc::new(MemoryAccountRepository::new());
    let service = service_over(repository.clone());

    let start = Utc::now();
    service
        .start_at(SubjectId::from("42"), "durov", start)
        .await
        .unwrap();

    let summary = service
        .stop_at(&SubjectId::from("42"), start + Duration::minutes(10))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(summary.identity, "durov");
    assert!((summary.duration_minutes - 10.0).abs() < 1e-9);
    assert!((summary.session_earned - 0.05).abs() < 1e-12);
    assert!((summary.total_mined - 0.05).abs() < 1e-12);
    assert!(service.registry().is_empty().await);

    // Stopping again finds nothing.
    assert!(service.stop(&SubjectId::from("42")).await.unwrap().is_none());
}

#[tokio::test]
async fn status_is_a_pure_read() {
    let repository = Arc::new(MemoryAccountRepository::new());
    let service = service_over(repository.clone());

    let start = Utc::now();
    service
        .start_at(SubjectId::from("42"), "durov", start)
        .await
        .unwrap();

    let status = service
        .status_at(&SubjectId::from("42"), "durov", start + Duration::minutes(10))
        .await
        .unwrap();
    assert!(status.is_active);
    assert!((status.session_earned - 0.05).abs() < 1e-12);
    // The estimate is not credited.
    assert_eq!(status.total_mined, 0.0);
    let account = repository.find_by_identity("durov").await.unwrap().unwrap();
    assert_eq!(account.total_mined, 0.0);
}

#[tokio::test]
async fn status_for_unknown_account_is_not_found() {
    let repository = Arc::new(MemoryAccountRepository::new());
    let service = service_over(repository);

    let err = service
        .status(&SubjectId::from("42"), "nobody")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn sweep_credits_open_sessions() {
    let repository = Arc::new(MemoryAccountRepository::new());
    let registry = Arc::new(SessionRegistry::new());
    let engine = Arc::new(AccrualEngine::new(
        repository.clone() as Arc<dyn AccountRepository>
    ));

    repository.create(Account::new("durov", Utc::now())).await.unwrap();
    // Session opened ten minutes in the past, never reconciled since.
    registry
        .start(
            SubjectId::from("42"),
            "durov",
            1.0,
            Utc::now() - Duration::minutes(10),
        )
        .await;

    let reconciler = Reconciler::new(registry, engine, std::time::Duration::from_secs(60));
    let stats = reconciler.sweep().await;

    assert_eq!(stats.reconciled, 1);
    assert_eq!(stats.failed, 0);
    assert!((stats.earned - 0.05).abs() < 1e-3);

    let account = repository.find_by_identity("durov").await.unwrap().unwrap();
    assert!((account.total_mined - 0.05).abs() < 1e-3);
}

/// Repository wrapper whose credit path can be switched into outage mode.
struct FlakyRepository {
    inner: MemoryAccountRepository,
    credit_unavailable: AtomicBool,
}

impl FlakyRepository {
    fn new() -> Self {
        Self {
            inner: MemoryAccountRepository::new(),
            credit_unavailable: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl AccountRepository for FlakyRepository {
    async fn find_by_identity(&self, identity: &str) -> Result<Option<Account>> {
        self.inner.find_by_identity(identity).await
    }

    async fn create(&self, account: Account) -> Result<Account> {
        self.inner.create(account).await
    }

    async fn credit(&self, identity: &str, amount: f64) -> Result<Account> {
        if self.credit_unavailable.load(Ordering::SeqCst) {
            return Err(VeinError::store_unavailable("injected outage"));
        }
        self.inner.credit(identity, amount).await
    }

    async fn adjust_power(&self, identity: &str, delta: f64) -> Result<Account> {
        self.inner.adjust_power(identity, delta).await
    }

    async fn touch(&self, identity: &str) -> Result<Account> {
        self.inner.touch(identity).await
    }

    async fn set_status(&self, identity: &str, status: AccountStatus) -> Result<Account> {
        self.inner.set_status(identity, status).await
    }

    async fn list_all(&self) -> Result<Vec<Account>> {
        self.inner.list_all().await
    }
}

#[tokio::test]
async fn failed_stop_keeps_session_and_elapsed_time() {
    let repository = Arc::new(FlakyRepository::new());
    let service = service_over(repository.clone());

    let start = Utc::now();
    service
        .start_at(SubjectId::from("42"), "durov", start)
        .await
        .unwrap();

    repository.credit_unavailable.store(true, Ordering::SeqCst);
    let err = service
        .stop_at(&SubjectId::from("42"), start + Duration::minutes(4))
        .await
        .unwrap_err();
    assert!(err.is_transient());
    // The session survived the failed stop.
    assert!(service.registry().is_active(&SubjectId::from("42")).await);

    // The retry accrues the full interval since the last success.
    repository.credit_unavailable.store(false, Ordering::SeqCst);
    let summary = service
        .stop_at(&SubjectId::from("42"), start + Duration::minutes(10))
        .await
        .unwrap()
        .unwrap();
    assert!((summary.session_earned - 0.05).abs() < 1e-12);
}

#[tokio::test]
async fn boost_redeem_applies_increment_once() {
    let repository = Arc::new(MemoryAccountRepository::new());
    repository.create(Account::new("durov", Utc::now())).await.unwrap();
    let boost = BoostService::new(repository.clone());

    // Code challenges expect their own prompt back.
    let challenge = Challenge::code_at(Utc::now());
    let account = boost
        .redeem("durov", &challenge, &challenge.prompt)
        .await
        .unwrap()
        .unwrap();
    assert!((account.mining_power - 1.025).abs() < 1e-12);
}

#[tokio::test]
async fn rejected_solve_changes_nothing() {
    let repository = Arc::new(MemoryAccountRepository::new());
    repository.create(Account::new("durov", Utc::now())).await.unwrap();
    let boost = BoostService::new(repository.clone());

    let challenge = Challenge::math_at(Utc::now());
    let outcome = boost
        .redeem("durov", &challenge, "definitely wrong")
        .await
        .unwrap();
    assert!(outcome.is_none());

    let account = repository.find_by_identity("durov").await.unwrap().unwrap();
    assert_eq!(account.mining_power, 1.0);
}

#[tokio::test]
async fn boost_mid_session_keeps_snapshot_for_elapsed_time() {
    let repository: Arc<dyn AccountRepository> = Arc::new(MemoryAccountRepository::new());
    let registry = Arc::new(SessionRegistry::new());
    let engine = Arc::new(AccrualEngine::new(repository.clone()));
    let service = MiningService::new(registry, engine, repository.clone());
    let boost = BoostService::new(repository.clone());

    let start = Utc::now();
    service
        .start_at(SubjectId::from("42"), "durov", start)
        .await
        .unwrap();

    // Boost lands five minutes in; the open session still earns the whole
    // first interval at the snapshot taken when it opened.
    let challenge = Challenge::code_at(Utc::now());
    boost
        .redeem("durov", &challenge, &challenge.prompt)
        .await
        .unwrap()
        .unwrap();

    let summary = service
        .stop_at(&SubjectId::from("42"), start + Duration::minutes(10))
        .await
        .unwrap()
        .unwrap();
    assert!((summary.session_earned - 0.05).abs() < 1e-12);
}
