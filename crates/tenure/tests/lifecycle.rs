//! End-to-end lifecycle tests: enrollment, reminders, expiry, and restarts.

use std::sync::Arc;

use async_trait::async_trait;
use proptest::prelude::*;
use tenure::adapters::{AuditEvent, MemberHandle, Notifier, Reminder};
use tenure::core::{Grant, SubjectId, DAY_MS, HOUR_MS};
use tenure::store::{GrantStore, JsonFileStore, MemoryStore, SqliteStore, StoreError};
use tenure::{Manager, SweepReport};
use tokio::sync::Notify;
use tenure_testkit::fixtures::{grant_in, TestFixture, NOW};
use tenure_testkit::generators::grant_set;

fn alice() -> SubjectId {
    SubjectId::from("alice")
}

// ─────────────────────────────────────────────────────────────────────────────
// Reminders
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_reminder_inside_window() {
    let fixture = TestFixture::new().with_grants([grant_in("alice", "gold", 23 * HOUR_MS, false)]);
    let manager = fixture.manager();

    let report = manager.sweep_at(NOW).await.unwrap();

    assert_eq!(report.reminded, 1);
    assert_eq!(fixture.directory.notify_count(&alice()), 1);
    let grant = fixture.store.get(&alice()).await.unwrap().unwrap();
    assert!(grant.reminded());
    assert_eq!(grant.expires_at, NOW + 23 * HOUR_MS);
}

#[tokio::test]
async fn test_reminder_sent_only_once() {
    let fixture = TestFixture::new().with_grants([grant_in("alice", "gold", 23 * HOUR_MS, false)]);
    let manager = fixture.manager();

    manager.sweep_at(NOW).await.unwrap();
    manager.sweep_at(NOW + HOUR_MS).await.unwrap();
    manager.sweep_at(NOW + 2 * HOUR_MS).await.unwrap();

    assert_eq!(fixture.directory.notify_count(&alice()), 1);
}

#[tokio::test]
async fn test_window_boundary_is_inclusive() {
    let fixture = TestFixture::new().with_grants([
        grant_in("alice", "gold", DAY_MS, false),
        grant_in("bob", "gold", DAY_MS + 1, false),
    ]);

    let report = fixture.manager().sweep_at(NOW).await.unwrap();

    assert_eq!(report.reminded, 1);
    assert_eq!(report.held, 1);
    assert_eq!(fixture.directory.notify_count(&"bob".into()), 0);
}

#[tokio::test]
async fn test_failed_notify_still_marks_reminded() {
    let fixture = TestFixture::new().with_grants([grant_in("alice", "gold", 23 * HOUR_MS, false)]);
    fixture.directory.fail_notify_for("alice");
    let manager = fixture.manager();

    let report = manager.sweep_at(NOW).await.unwrap();
    assert_eq!(report.notify_failed, 1);

    let grant = fixture.store.get(&alice()).await.unwrap().unwrap();
    assert!(grant.reminded());

    // No retry on the next cycle.
    manager.sweep_at(NOW + HOUR_MS).await.unwrap();
    assert_eq!(fixture.directory.notify_count(&alice()), 1);
    assert!(fixture
        .audit
        .events()
        .iter()
        .any(|e| matches!(e, AuditEvent::ReminderFailed { .. })));
}

#[tokio::test]
async fn test_unresolved_subject_is_left_untouched() {
    let fixture = TestFixture::new().with_grants([grant_in("dave", "gold", 23 * HOUR_MS, false)]);

    let report = fixture.manager().sweep_at(NOW).await.unwrap();

    assert_eq!(report.unresolved, 1);
    let grant = fixture.store.get(&"dave".into()).await.unwrap().unwrap();
    assert!(!grant.reminded());
    assert_eq!(fixture.directory.notify_count(&"dave".into()), 0);
    assert_eq!(fixture.directory.revoke_count(&"dave".into()), 0);
}

#[tokio::test]
async fn test_resolver_error_skips_reminder() {
    let fixture = TestFixture::new().with_grants([grant_in("alice", "gold", 23 * HOUR_MS, false)]);
    fixture.directory.fail_resolve_for("alice");

    let report = fixture.manager().sweep_at(NOW).await.unwrap();

    assert_eq!(report.unresolved, 1);
    assert!(!fixture.store.get(&alice()).await.unwrap().unwrap().reminded());
}

#[tokio::test]
async fn test_unknown_group_reminder_uses_fallbacks() {
    let fixture =
        TestFixture::new().with_grants([grant_in("alice", "retired", 23 * HOUR_MS, false)]);

    let report = fixture.manager().sweep_at(NOW).await.unwrap();

    assert_eq!(report.reminded, 1);
    let reminder = fixture
        .directory
        .calls()
        .into_iter()
        .find_map(|c| match c {
            tenure::adapters::memory::Call::Notify { reminder, .. } => Some(reminder),
            _ => None,
        })
        .unwrap();
    assert_eq!(reminder.display_name, "retired");
    assert_eq!(reminder.color, tenure::core::FALLBACK_COLOR);
}

// ─────────────────────────────────────────────────────────────────────────────
// Expiry
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_expired_grant_is_revoked_and_deleted() {
    let fixture = TestFixture::new();
    let manager = fixture.manager();
    manager.enroll_at("alice", "gold", 1, NOW).await.unwrap();

    let later = NOW + DAY_MS + 1_000;
    let report = manager.sweep_at(later).await.unwrap();

    assert_eq!(report.expired, 1);
    assert_eq!(fixture.directory.revoke_count(&alice()), 1);
    assert!(fixture.directory.roles_of(&alice()).is_empty());
    assert!(fixture.store.get(&alice()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_expiry_wins_over_reminder() {
    let fixture = TestFixture::new().with_grants([grant_in("alice", "gold", -1_000, false)]);

    let report = fixture.manager().sweep_at(NOW).await.unwrap();

    assert_eq!(report.reminded, 0);
    assert_eq!(report.expired, 1);
    assert_eq!(fixture.directory.notify_count(&alice()), 0);
}

#[tokio::test]
async fn test_revoke_failure_still_deletes() {
    let fixture = TestFixture::new().with_grants([grant_in("alice", "gold", -1_000, true)]);
    fixture.directory.fail_revoke_for("alice");

    let report = fixture.manager().sweep_at(NOW).await.unwrap();

    assert_eq!(report.revoke_failed, 1);
    assert!(fixture.store.get(&alice()).await.unwrap().is_none());
    assert!(fixture
        .audit
        .events()
        .iter()
        .any(|e| matches!(e, AuditEvent::RevokeFailed { .. })));
}

#[tokio::test]
async fn test_departed_subject_is_deleted_without_revoke() {
    let fixture = TestFixture::new().with_grants([grant_in("dave", "gold", -1_000, false)]);

    let report = fixture.manager().sweep_at(NOW).await.unwrap();

    assert_eq!(report.revoke_skipped, 1);
    assert_eq!(fixture.directory.revoke_count(&"dave".into()), 0);
    assert_eq!(fixture.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_group_at_expiry_is_deleted_without_revoke() {
    let fixture = TestFixture::new().with_grants([grant_in("alice", "retired", -1_000, false)]);

    let report = fixture.manager().sweep_at(NOW).await.unwrap();

    assert_eq!(report.revoke_skipped, 1);
    assert_eq!(fixture.directory.revoke_count(&alice()), 0);
    assert_eq!(fixture.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_non_positive_duration_expires_next_sweep() {
    let fixture = TestFixture::new();
    let manager = fixture.manager();

    let grant = manager.enroll_at("alice", "gold", 0, NOW).await.unwrap();
    assert_eq!(grant.expires_at, NOW);

    let report = manager.sweep_at(NOW).await.unwrap();
    assert_eq!(report.expired, 1);
}

#[tokio::test]
async fn test_empty_store_is_a_noop() {
    let fixture = TestFixture::new();
    let report = fixture.manager().sweep_at(NOW).await.unwrap();

    assert_eq!(report, SweepReport::default());
    assert!(fixture.directory.calls().is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Enrollment
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_reenroll_replaces_grant() {
    let fixture = TestFixture::new();
    let manager = fixture.manager();

    manager.enroll_at("alice", "gold", 30, NOW).await.unwrap();
    manager.sweep_at(NOW + 29 * DAY_MS + HOUR_MS).await.unwrap();
    assert!(fixture.store.get(&alice()).await.unwrap().unwrap().reminded());

    manager.enroll_at("alice", "silver", 7, NOW).await.unwrap();

    let grants = fixture.store.all().await.unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].group_id.as_str(), "silver");
    assert_eq!(grants[0].expires_at, NOW + 7 * DAY_MS);
    assert!(!grants[0].reminded());
}

#[tokio::test]
async fn test_enroll_unresolvable_subject() {
    let fixture = TestFixture::new();
    let err = fixture
        .manager()
        .enroll_at("dave", "gold", 30, NOW)
        .await
        .unwrap_err();

    assert!(matches!(err, tenure::ManagerError::SubjectNotFound(_)));
    assert_eq!(fixture.store.count().await.unwrap(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Persistence
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_sqlite_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tenure.db");
    let fixture = TestFixture::new();

    {
        let manager = fixture.manager_with_store(Arc::new(SqliteStore::open(&path).unwrap()));
        manager.enroll_at("alice", "gold", 30, NOW).await.unwrap();
        manager.enroll_at("bob", "silver", 1, NOW).await.unwrap();
        manager.sweep_at(NOW + HOUR_MS).await.unwrap();
    }

    let manager = fixture.manager_with_store(Arc::new(SqliteStore::open(&path).unwrap()));
    let mut grants = manager.grants().await.unwrap();
    grants.sort_by(|a, b| a.subject_id.cmp(&b.subject_id));

    assert_eq!(grants.len(), 2);
    assert!(!grants[0].reminded());
    assert!(grants[1].reminded());

    // The reminder is not repeated after the restart.
    manager.sweep_at(NOW + 2 * HOUR_MS).await.unwrap();
    assert_eq!(fixture.directory.notify_count(&"bob".into()), 1);
}

#[tokio::test]
async fn test_json_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("members.json");
    let fixture = TestFixture::new();

    {
        let manager = fixture.manager_with_store(Arc::new(JsonFileStore::open(&path).unwrap()));
        manager.enroll_at("alice", "gold", 30, NOW).await.unwrap();
        manager.enroll_at("carol", "gold", -1, NOW).await.unwrap();
        manager.sweep_at(NOW).await.unwrap();
    }

    let store = JsonFileStore::open(&path).unwrap();
    let grants = store.all().await.unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].subject_id, alice());
}

#[tokio::test]
async fn test_legacy_json_grant_is_revoked_at_expiry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("members.json");
    std::fs::write(
        &path,
        format!(
            r#"{{"alice": {{"expiry": {}, "group": "Gold Members", "reminded": true}}}}"#,
            NOW - 1_000
        ),
    )
    .unwrap();
    let fixture = TestFixture::new();
    let manager = fixture.manager_with_store(Arc::new(JsonFileStore::open(&path).unwrap()));

    let report = manager.sweep_at(NOW).await.unwrap();

    assert_eq!(report.expired, 1);
    assert_eq!(report.revoke_skipped, 0);
    assert_eq!(fixture.directory.revoke_count(&alice()), 1);
    assert_eq!(manager.grants().await.unwrap(), vec![]);
    assert!(fixture.audit.events().iter().any(|e| matches!(
        e,
        AuditEvent::Revoked { group, .. } if group == "Gold Members"
    )));
}

#[tokio::test]
async fn test_dyn_store_manager() {
    let fixture = TestFixture::new();
    let store: Arc<dyn GrantStore> = Arc::new(MemoryStore::new());
    let manager: Manager<dyn GrantStore> = fixture.manager_with_store(store);

    manager.enroll_at("alice", "gold", 30, NOW).await.unwrap();
    assert_eq!(manager.grants().await.unwrap().len(), 1);
}

/// A store whose writes fail for one subject.
struct FlakyStore {
    inner: MemoryStore,
    broken: SubjectId,
}

#[async_trait]
impl GrantStore for FlakyStore {
    async fn upsert(&self, grant: &Grant) -> Result<(), StoreError> {
        if grant.subject_id == self.broken {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.inner.upsert(grant).await
    }

    async fn delete(&self, subject_id: &SubjectId) -> Result<bool, StoreError> {
        if *subject_id == self.broken {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.inner.delete(subject_id).await
    }

    async fn get(&self, subject_id: &SubjectId) -> Result<Option<Grant>, StoreError> {
        self.inner.get(subject_id).await
    }

    async fn all(&self) -> Result<Vec<Grant>, StoreError> {
        self.inner.all().await
    }
}

#[tokio::test]
async fn test_store_failure_is_isolated_per_grant() {
    let fixture = TestFixture::new();
    let store = Arc::new(FlakyStore {
        inner: MemoryStore::with_grants([
            grant_in("alice", "gold", -1_000, false),
            grant_in("bob", "gold", -1_000, false),
        ]),
        broken: alice(),
    });
    let manager = fixture.manager_with_store(store.clone());

    let report = manager.sweep_at(NOW).await.unwrap();

    assert_eq!(report.errors, 1);
    assert_eq!(report.expired, 1);
    assert!(store.inner.get(&"bob".into()).await.unwrap().is_none());
    assert!(store.inner.get(&alice()).await.unwrap().is_some());
    assert!(fixture
        .audit
        .events()
        .iter()
        .any(|e| matches!(e, AuditEvent::StoreFailed { .. })));
}

// ─────────────────────────────────────────────────────────────────────────────
// Write gate
// ─────────────────────────────────────────────────────────────────────────────

/// A notifier that parks each delivery until the test releases it.
#[derive(Default)]
struct HeldNotifier {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl Notifier for HeldNotifier {
    async fn notify(
        &self,
        _member: &MemberHandle,
        _reminder: &Reminder,
    ) -> tenure::adapters::Result<()> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(())
    }
}

#[tokio::test]
async fn test_enroll_waits_for_running_sweep() {
    let fixture = TestFixture::new().with_grants([grant_in("bob", "gold", 23 * HOUR_MS, false)]);
    let notifier = Arc::new(HeldNotifier::default());
    let mut collaborators = fixture.collaborators();
    collaborators.notifier = notifier.clone();
    let manager = Arc::new(Manager::new(
        fixture.store.clone(),
        collaborators,
        fixture.catalog.clone(),
        fixture.config.clone(),
    ));

    let sweep = tokio::spawn({
        let manager = manager.clone();
        async move { manager.sweep_at(NOW).await }
    });
    notifier.entered.notified().await;

    let enroll = tokio::spawn({
        let manager = manager.clone();
        async move { manager.enroll_at("alice", "gold", 30, NOW).await }
    });
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }

    // The sweep is parked mid-cycle; the enrollment must not have started.
    assert!(!enroll.is_finished());
    assert!(fixture.store.get(&alice()).await.unwrap().is_none());
    assert!(fixture.directory.roles_of(&alice()).is_empty());

    notifier.release.notify_one();
    let report = sweep.await.unwrap().unwrap();
    assert_eq!(report.reminded, 1);

    let enrolled = enroll.await.unwrap().unwrap();
    assert_eq!(fixture.store.get(&alice()).await.unwrap(), Some(enrolled));
    assert!(fixture.store.get(&"bob".into()).await.unwrap().unwrap().reminded());
    assert_eq!(fixture.store.count().await.unwrap(), 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(f)
}

proptest! {
    #[test]
    fn prop_no_expired_grant_survives_a_sweep(grants in grant_set(12)) {
        let fixture = TestFixture::new().with_grants(grants.clone());
        fixture.directory.fail_revoke_for("bob");

        let remaining = block_on(async {
            fixture.manager().sweep_at(NOW).await.unwrap();
            fixture.store.all().await.unwrap()
        });

        for grant in &remaining {
            prop_assert!(grant.expires_at > NOW);
        }
        let live = grants.iter().filter(|g| g.expires_at > NOW).count();
        prop_assert_eq!(remaining.len(), live);
    }

    #[test]
    fn prop_reminded_never_reverts(grants in grant_set(12)) {
        let fixture = TestFixture::new().with_grants(grants.clone());
        fixture.directory.fail_notify_for("alice");

        let after = block_on(async {
            let manager = fixture.manager();
            manager.sweep_at(NOW).await.unwrap();
            manager.sweep_at(NOW + HOUR_MS).await.unwrap();
            fixture.store.all().await.unwrap()
        });

        for grant in &after {
            let before = grants.iter().find(|g| g.subject_id == grant.subject_id).unwrap();
            if before.reminded() {
                prop_assert!(grant.reminded());
            }
            prop_assert_eq!(grant.expires_at, before.expires_at);
        }
    }
}
