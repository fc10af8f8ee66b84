//! E2E Test: Grant Wizard Flow
//!
//! Drives the wizard end to end against the in-memory service:
//! - load catalogs -> select objects -> edit privileges -> review -> finish
//! - load, preview and apply failures
//! - preview re-issue on re-entering Review

use grant_wizard::{
    CatalogScope, DatabaseObject, FinishOutcome, GrantWizard, GrantWizardError,
    MemoryGrantService, NormalizedObjectClass, ObjectId, ObjectType, PreviewState,
    PrivilegeCapabilitySet, PrivilegeEntry, PrivilegeGrantRow, StepOutcome, WizardEvent,
    WizardStage,
};
use tokio::sync::mpsc::{self, UnboundedReceiver};

fn service() -> MemoryGrantService {
    let catalog = PrivilegeCapabilitySet::new()
        .with_class(NormalizedObjectClass::Table, ["a", "r", "w", "d", "D", "x", "t"])
        .with_class(NormalizedObjectClass::Sequence, ["r", "w", "U"])
        .with_class(NormalizedObjectClass::Function, ["X"])
        .with_class(NormalizedObjectClass::Procedure, ["X"]);
    let objects = vec![
        DatabaseObject::new(ObjectType::Table, "public", "accounts", 16401),
        DatabaseObject::new(ObjectType::View, "public", "active_accounts", 16402),
        DatabaseObject::new(ObjectType::Sequence, "public", "accounts_id_seq", 16403),
        DatabaseObject::new(ObjectType::Function, "billing", "add_tax", 16404)
            .with_args("amount numeric, rate numeric"),
    ];
    MemoryGrantService::new(catalog, objects)
}

fn scope() -> CatalogScope {
    CatalogScope::new("1", 13, 2200, "coll-table")
}

async fn start(
    svc: &MemoryGrantService,
) -> (GrantWizard, UnboundedReceiver<WizardEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let wizard = GrantWizard::load(svc, scope(), tx)
        .await
        .expect("catalogs should load");
    (wizard, rx)
}

fn drain(rx: &mut UnboundedReceiver<WizardEvent>) -> Vec<WizardEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn select_on_accounts() -> Vec<PrivilegeGrantRow> {
    vec![PrivilegeGrantRow::new("app_role").grant("r")]
}

#[tokio::test]
async fn test_full_grant_flow() {
    let svc = service();
    let (mut wizard, mut rx) = start(&svc).await;
    assert_eq!(wizard.objects().len(), 4);

    wizard.select_ids(&[ObjectId(16401)]).unwrap();
    let outcome = wizard.next_with(&svc).await.unwrap();
    assert!(matches!(
        outcome,
        StepOutcome::Moved {
            to: WizardStage::EditPrivileges,
            ..
        }
    ));
    assert_eq!(wizard.effective_privileges().len(), 7);

    wizard
        .set_rows(vec![PrivilegeGrantRow::new("app_role")
            .grant("r")
            .grant(PrivilegeEntry::new("a").with_grant_option())])
        .unwrap();
    wizard.next_with(&svc).await.unwrap();
    assert_eq!(wizard.stage(), WizardStage::Review);
    assert_eq!(
        wizard.preview(),
        &PreviewState::Ready(
            "GRANT SELECT ON TABLE public.accounts TO app_role;\n\
             GRANT INSERT ON TABLE public.accounts TO app_role WITH GRANT OPTION;"
                .to_string()
        )
    );
    assert_eq!(svc.preview_requests().await.len(), 1);

    let outcome = wizard.finish(&svc).await.unwrap();
    assert_eq!(outcome, FinishOutcome::Completed);
    assert!(wizard.is_finished());

    let applied = svc.applied().await;
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].objects[0].name, "accounts");

    let events = drain(&mut rx);
    let completed = events
        .iter()
        .filter(|e| matches!(e, WizardEvent::Completed { .. }))
        .count();
    assert_eq!(completed, 1);
}

#[tokio::test]
async fn test_load_failure_is_reported() {
    let svc = service();
    svc.fail_object_catalog("connection reset").await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let err = GrantWizard::load(&svc, scope(), tx).await.err().unwrap();
    assert!(matches!(err, GrantWizardError::Load { .. }));

    let events = drain(&mut rx);
    assert!(matches!(
        &events[..],
        [WizardEvent::Notify(note)] if note.message == "Error while fetching grant wizard data."
    ));
}

#[tokio::test]
async fn test_apply_failure_leaves_state_and_allows_retry() {
    let svc = service();
    let (mut wizard, mut rx) = start(&svc).await;
    wizard.select_ids(&[ObjectId(16401), ObjectId(16403)]).unwrap();
    wizard.next_with(&svc).await.unwrap();
    wizard.set_rows(select_on_accounts()).unwrap();
    wizard.next_with(&svc).await.unwrap();

    svc.set_apply_failure(Some("permission denied for table accounts".into()))
        .await;
    let err = wizard.finish(&svc).await.unwrap_err();
    assert!(matches!(err, GrantWizardError::Apply(ref detail) if detail.contains("permission denied")));

    assert_eq!(wizard.stage(), WizardStage::Review);
    assert_eq!(
        wizard.selection().ids(),
        vec![ObjectId(16401), ObjectId(16403)]
    );
    assert_eq!(wizard.edits().rows(), select_on_accounts().as_slice());
    assert!(!drain(&mut rx)
        .iter()
        .any(|e| matches!(e, WizardEvent::Completed { .. })));
    assert_eq!(svc.apply_requests().await.len(), 1);

    svc.set_apply_failure(None).await;
    assert_eq!(
        wizard.finish(&svc).await.unwrap(),
        FinishOutcome::Completed
    );
    assert_eq!(svc.apply_requests().await.len(), 2);
    assert_eq!(svc.applied().await.len(), 1);
}

#[tokio::test]
async fn test_reentering_review_requests_one_new_preview() {
    let svc = service();
    let (mut wizard, _rx) = start(&svc).await;
    wizard.select_ids(&[ObjectId(16404)]).unwrap();
    assert_eq!(
        wizard.selection().iter().next().unwrap().name_with_args(),
        "add_tax(amount numeric, rate numeric)"
    );
    wizard.next_with(&svc).await.unwrap();
    wizard
        .set_rows(vec![PrivilegeGrantRow::new("billing").grant("X")])
        .unwrap();
    wizard.next_with(&svc).await.unwrap();
    assert_eq!(svc.preview_requests().await.len(), 1);

    wizard.back().unwrap();
    wizard
        .set_rows(vec![PrivilegeGrantRow::new("PUBLIC").grant("X")])
        .unwrap();
    wizard.next_with(&svc).await.unwrap();

    let requests = svc.preview_requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].acl[0].grantee(), Some("PUBLIC"));
    assert_eq!(
        wizard.preview().sql(),
        Some("GRANT EXECUTE ON FUNCTION billing.add_tax(amount numeric, rate numeric) TO PUBLIC;")
    );
}

#[tokio::test]
async fn test_preview_failure_then_retry() {
    let svc = service();
    let (mut wizard, mut rx) = start(&svc).await;
    wizard.select_ids(&[ObjectId(16402)]).unwrap();
    wizard.next_with(&svc).await.unwrap();
    wizard.set_rows(select_on_accounts()).unwrap();

    svc.set_preview_failure(Some("server closed the connection".into()))
        .await;
    wizard.next_with(&svc).await.unwrap();
    assert!(matches!(wizard.preview(), PreviewState::Failed(_)));
    assert!(drain(&mut rx).iter().any(|e| matches!(
        e,
        WizardEvent::Notify(note) if note.message == "Error while fetching SQL."
    )));

    svc.set_preview_failure(None).await;
    wizard.retry_preview_with(&svc).await.unwrap();
    assert_eq!(
        wizard.preview().sql(),
        Some("GRANT SELECT ON TABLE public.active_accounts TO app_role;")
    );
}

#[tokio::test]
async fn test_cancel_discards_wizard() {
    let svc = service();
    let (mut wizard, mut rx) = start(&svc).await;
    wizard.select_ids(&[ObjectId(16401)]).unwrap();
    let session_id = wizard.session_id();
    wizard.cancel();

    let events = drain(&mut rx);
    assert_eq!(events.last(), Some(&WizardEvent::Closed { session_id }));
    assert!(svc.apply_requests().await.is_empty());
}
