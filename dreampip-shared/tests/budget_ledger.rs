/// Ledger behaviour against the in-memory store
///
/// Covers the accounting properties: sums, clamping, idempotence, list
/// exclusion on edit, boundaries, and the open/closed error policies.

use dreampip_shared::budget::{BudgetError, BudgetLedger, BudgetStore, MemoryBudgetStore};
use dreampip_shared::models::user::{CreateUser, User};
use std::sync::Arc;
use uuid::Uuid;

struct Fixture {
    store: Arc<MemoryBudgetStore>,
    ledger: BudgetLedger,
    user: User,
}

async fn fixture() -> Fixture {
    let store = Arc::new(MemoryBudgetStore::new());
    let user = store
        .insert_user(CreateUser {
            email: format!("ledger-{}@example.com", Uuid::new_v4()),
            name: Some("Ledger Test".to_string()),
        })
        .await;
    let ledger = BudgetLedger::new(store.clone());

    Fixture { store, ledger, user }
}

async fn stored_totals(store: &MemoryBudgetStore, user_id: Uuid) -> (Option<f64>, Option<f64>) {
    let user = store.find_user(user_id).await.unwrap().unwrap();
    (user.used_budget, user.remaining_budget)
}

#[tokio::test]
async fn test_recalculate_sums_owned_lists() {
    let f = fixture().await;
    f.store.seed_task_list(vec![f.user.id], Some(25.0)).await;
    f.store.seed_task_list(vec![f.user.id], None).await;
    f.store.seed_task_list(vec![f.user.id, Uuid::new_v4()], Some(15.5)).await;
    // Not owned by the user
    f.store.seed_task_list(vec![Uuid::new_v4()], Some(60.0)).await;

    let totals = f.ledger.recalculate_user_budget(f.user.id).await.unwrap();

    assert_eq!(totals.used_budget, 40.5);
    assert_eq!(totals.remaining_budget, 59.5);
    assert_eq!(stored_totals(&f.store, f.user.id).await, (Some(40.5), Some(59.5)));
}

#[tokio::test]
async fn test_recalculate_without_lists() {
    let f = fixture().await;

    let totals = f.ledger.recalculate_user_budget(f.user.id).await.unwrap();

    assert_eq!(totals.used_budget, 0.0);
    assert_eq!(totals.remaining_budget, 100.0);
    assert_eq!(stored_totals(&f.store, f.user.id).await, (Some(0.0), Some(100.0)));
}

#[tokio::test]
async fn test_recalculate_clamps_over_allocation() {
    let f = fixture().await;
    f.store.seed_task_list(vec![f.user.id], Some(40.0)).await;
    f.store.seed_task_list(vec![f.user.id], Some(70.0)).await;

    let totals = f.ledger.recalculate_user_budget(f.user.id).await.unwrap();

    assert_eq!(totals.used_budget, 110.0);
    assert_eq!(totals.remaining_budget, 0.0);
    assert_eq!(f.ledger.get_remaining_budget(f.user.id).await, 0.0);
}

#[tokio::test]
async fn test_recalculate_is_idempotent() {
    let f = fixture().await;
    f.store.seed_task_list(vec![f.user.id], Some(33.0)).await;

    let first = f.ledger.recalculate_user_budget(f.user.id).await.unwrap();
    let stored_first = stored_totals(&f.store, f.user.id).await;
    let second = f.ledger.recalculate_user_budget(f.user.id).await.unwrap();
    let stored_second = stored_totals(&f.store, f.user.id).await;

    assert_eq!(first, second);
    assert_eq!(stored_first, stored_second);
}

#[tokio::test]
async fn test_recalculate_unknown_user() {
    let f = fixture().await;
    let result = f.ledger.recalculate_user_budget(Uuid::new_v4()).await;
    assert!(matches!(result, Err(BudgetError::NotFound(_))));
}

#[tokio::test]
async fn test_recalculate_propagates_storage_errors() {
    let f = fixture().await;
    f.store.seed_task_list(vec![f.user.id], Some(10.0)).await;
    f.store.set_failing(true);

    let result = f.ledger.recalculate_user_budget(f.user.id).await;
    assert!(matches!(result, Err(BudgetError::Store(_))));

    f.store.set_failing(false);
    assert_eq!(stored_totals(&f.store, f.user.id).await, (None, None));
}

#[tokio::test]
async fn test_remaining_budget_defaults() {
    let f = fixture().await;

    // Never recalculated
    assert_eq!(f.ledger.get_remaining_budget(f.user.id).await, 100.0);
    // No such user
    assert_eq!(f.ledger.get_remaining_budget(Uuid::new_v4()).await, 100.0);

    f.store.seed_task_list(vec![f.user.id], Some(45.0)).await;
    f.ledger.recalculate_user_budget(f.user.id).await.unwrap();
    assert_eq!(f.ledger.get_remaining_budget(f.user.id).await, 55.0);
}

#[tokio::test]
async fn test_remaining_budget_fails_open() {
    let f = fixture().await;
    f.store.seed_task_list(vec![f.user.id], Some(90.0)).await;
    f.ledger.recalculate_user_budget(f.user.id).await.unwrap();

    f.store.set_failing(true);
    assert_eq!(f.ledger.get_remaining_budget(f.user.id).await, 100.0);
}

#[tokio::test]
async fn test_validate_excludes_current_list() {
    let f = fixture().await;
    let edited = f.store.seed_task_list(vec![f.user.id], Some(30.0)).await;
    f.store.seed_task_list(vec![f.user.id], Some(20.0)).await;
    f.store.seed_task_list(vec![f.user.id], Some(30.0)).await;

    // 50 from the other lists + 50 = 100
    assert!(f.ledger.validate_allocation(f.user.id, 50.0, Some(edited.id)).await);
    // Counting the edited list's old 30 would have rejected it
    assert!(!f.ledger.validate_allocation(f.user.id, 50.0, None).await);
    assert!(!f.ledger.validate_allocation(f.user.id, 50.5, Some(edited.id)).await);
}

#[tokio::test]
async fn test_validate_rejects_overflow() {
    let f = fixture().await;
    f.store.seed_task_list(vec![f.user.id], Some(85.0)).await;

    assert!(!f.ledger.validate_allocation(f.user.id, 20.0, None).await);
    assert!(f.ledger.validate_allocation(f.user.id, 15.0, None).await);
}

#[tokio::test]
async fn test_validate_boundaries() {
    let f = fixture().await;
    assert!(f.ledger.validate_allocation(f.user.id, 0.0, None).await);
    assert!(f.ledger.validate_allocation(f.user.id, 100.0, None).await);

    f.store.seed_task_list(vec![f.user.id], Some(1.0)).await;
    assert!(f.ledger.validate_allocation(f.user.id, 0.0, None).await);
    assert!(!f.ledger.validate_allocation(f.user.id, 100.0001, None).await);
}

#[tokio::test]
async fn test_validate_rejects_out_of_range_input() {
    let f = fixture().await;
    assert!(!f.ledger.validate_allocation(f.user.id, -10.0, None).await);
    assert!(!f.ledger.validate_allocation(f.user.id, f64::NAN, None).await);
    assert!(!f.ledger.validate_allocation(f.user.id, 150.0, None).await);
}

#[tokio::test]
async fn test_validate_ignores_foreign_list_id() {
    let f = fixture().await;
    f.store.seed_task_list(vec![f.user.id], Some(70.0)).await;
    let foreign = f.store.seed_task_list(vec![Uuid::new_v4()], Some(50.0)).await;

    // The foreign list is not part of the user's usage, so excluding it is a no-op
    assert!(!f.ledger.validate_allocation(f.user.id, 40.0, Some(foreign.id)).await);
    assert!(f.ledger.validate_allocation(f.user.id, 30.0, Some(foreign.id)).await);
}

#[tokio::test]
async fn test_validate_fails_closed() {
    let f = fixture().await;
    f.store.set_failing(true);

    assert!(!f.ledger.validate_allocation(f.user.id, 0.0, None).await);
    assert!(!f.ledger.validate_allocation(f.user.id, 10.0, None).await);
}

#[tokio::test]
async fn test_summary_reports_staleness() {
    let f = fixture().await;
    f.store.seed_task_list(vec![f.user.id], Some(40.0)).await;

    let before = f.ledger.summary(f.user.id).await.unwrap();
    assert_eq!(before.used_budget, 0.0);
    assert_eq!(before.remaining_budget, 100.0);
    assert_eq!(before.allocated, 40.0);
    assert!(before.stale);
    assert!(!before.over_allocated);
    assert_eq!(before.allocations.len(), 1);
    assert_eq!(before.allocations[0].amount, None);

    f.ledger.recalculate_user_budget(f.user.id).await.unwrap();
    let after = f.ledger.summary(f.user.id).await.unwrap();
    assert!(!after.stale);
    assert_eq!(after.used_budget, 40.0);
    assert_eq!(after.remaining_budget, 60.0);
    assert_eq!(after.currency, "USD");
}

#[tokio::test]
async fn test_summary_fresh_after_fractional_recalculation() {
    let f = fixture().await;
    for percentage in [0.1, 0.2, 0.3] {
        f.store.seed_task_list(vec![f.user.id], Some(percentage)).await;
    }

    f.ledger.recalculate_user_budget(f.user.id).await.unwrap();
    let summary = f.ledger.summary(f.user.id).await.unwrap();
    assert!(!summary.stale);

    // Same lists summed in the opposite order land one ulp away
    let reversed: f64 = [0.3, 0.2, 0.1].iter().sum();
    f.store
        .write_totals(f.user.id, reversed, 100.0 - reversed)
        .await
        .unwrap();
    let summary = f.ledger.summary(f.user.id).await.unwrap();
    assert_ne!(summary.used_budget, summary.allocated);
    assert!(!summary.stale);
}

#[tokio::test]
async fn test_summary_amounts_follow_monthly_budget() {
    let f = fixture().await;
    f.store
        .replace_settings(f.user.id, serde_json::json!({ "monthly_budget": 500.0, "currency": "EUR" }))
        .await
        .unwrap();
    f.store.seed_task_list(vec![f.user.id], Some(20.0)).await;
    f.store.seed_task_list(vec![f.user.id], Some(90.0)).await;

    let summary = f.ledger.summary(f.user.id).await.unwrap();

    assert!(summary.over_allocated);
    assert_eq!(summary.currency, "EUR");
    assert_eq!(summary.monthly_budget, Some(500.0));
    let amounts: Vec<Option<f64>> = summary.allocations.iter().map(|a| a.amount).collect();
    assert_eq!(amounts, vec![Some(100.0), Some(450.0)]);
}
