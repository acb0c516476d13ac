/// Storage seam for the budget ledger
///
/// The ledger and services only need a handful of reads and writes. Those are
/// collected in [`BudgetStore`] so the same accounting runs against
/// PostgreSQL in production and against [`MemoryBudgetStore`] in tests.
///
/// [`MemoryBudgetStore`]: super::memory::MemoryBudgetStore

use super::error::StoreResult;
use crate::models::task_list::{BudgetAllocation, CreateTaskList, TaskList, UpdateTaskList};
use crate::models::user::User;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[async_trait]
pub trait BudgetStore: Send + Sync {
    /// Round-trip check used by the health endpoint
    async fn ping(&self) -> StoreResult<()>;

    /// Budget projection of every list whose owner set contains `user_id`
    async fn owned_allocations(&self, user_id: Uuid) -> StoreResult<Vec<BudgetAllocation>>;

    /// Stored `remaining_budget`; None when the user or the field is absent
    async fn stored_remaining(&self, user_id: Uuid) -> StoreResult<Option<f64>>;

    /// Writes both totals at once; false when the user does not exist
    async fn write_totals(
        &self,
        user_id: Uuid,
        used_budget: f64,
        remaining_budget: f64,
    ) -> StoreResult<bool>;

    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<User>>;

    /// Replaces the settings document; false when the user does not exist
    async fn replace_settings(&self, user_id: Uuid, settings: JsonValue) -> StoreResult<bool>;

    async fn list_task_lists(&self, user_id: Uuid) -> StoreResult<Vec<TaskList>>;

    async fn find_task_list(&self, id: Uuid) -> StoreResult<Option<TaskList>>;

    async fn insert_task_list(&self, data: CreateTaskList) -> StoreResult<TaskList>;

    async fn update_task_list(
        &self,
        id: Uuid,
        data: UpdateTaskList,
    ) -> StoreResult<Option<TaskList>>;

    async fn delete_task_list(&self, id: Uuid) -> StoreResult<bool>;

    /// Lists with an open invite for `user_id`
    async fn list_invited_task_lists(&self, user_id: Uuid) -> StoreResult<Vec<TaskList>>;

    /// Adds `user_id` to the pending owners; None when the list is missing
    async fn add_pending_owner(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<TaskList>>;

    /// Promotes a pending owner; None when there is no such invite
    async fn accept_pending_owner(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<TaskList>>;

    /// Drops an invite; false when there was none
    async fn remove_pending_owner(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool>;
}
