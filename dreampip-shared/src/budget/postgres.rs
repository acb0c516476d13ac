/// PostgreSQL implementation of [`BudgetStore`]
///
/// A thin adapter over the model methods; every call is one query.

use super::error::StoreResult;
use super::store::BudgetStore;
use crate::db::pool::health_check;
use crate::models::task_list::{BudgetAllocation, CreateTaskList, TaskList, UpdateTaskList};
use crate::models::user::User;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PgBudgetStore {
    db: PgPool,
}

impl PgBudgetStore {
    pub fn new(db: PgPool) -> Self {
        PgBudgetStore { db }
    }
}

#[async_trait]
impl BudgetStore for PgBudgetStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.db).await?)
    }

    async fn owned_allocations(&self, user_id: Uuid) -> StoreResult<Vec<BudgetAllocation>> {
        Ok(TaskList::allocations_by_owner(&self.db, user_id).await?)
    }

    async fn stored_remaining(&self, user_id: Uuid) -> StoreResult<Option<f64>> {
        Ok(User::find_remaining_budget(&self.db, user_id).await?.flatten())
    }

    async fn write_totals(
        &self,
        user_id: Uuid,
        used_budget: f64,
        remaining_budget: f64,
    ) -> StoreResult<bool> {
        Ok(User::write_budget_totals(&self.db, user_id, used_budget, remaining_budget).await?)
    }

    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.db, user_id).await?)
    }

    async fn replace_settings(&self, user_id: Uuid, settings: JsonValue) -> StoreResult<bool> {
        Ok(User::replace_settings(&self.db, user_id, settings).await?)
    }

    async fn list_task_lists(&self, user_id: Uuid) -> StoreResult<Vec<TaskList>> {
        Ok(TaskList::list_by_owner(&self.db, user_id).await?)
    }

    async fn find_task_list(&self, id: Uuid) -> StoreResult<Option<TaskList>> {
        Ok(TaskList::find_by_id(&self.db, id).await?)
    }

    async fn insert_task_list(&self, data: CreateTaskList) -> StoreResult<TaskList> {
        Ok(TaskList::create(&self.db, data).await?)
    }

    async fn update_task_list(
        &self,
        id: Uuid,
        data: UpdateTaskList,
    ) -> StoreResult<Option<TaskList>> {
        Ok(TaskList::update(&self.db, id, data).await?)
    }

    async fn delete_task_list(&self, id: Uuid) -> StoreResult<bool> {
        Ok(TaskList::delete(&self.db, id).await?)
    }

    async fn list_invited_task_lists(&self, user_id: Uuid) -> StoreResult<Vec<TaskList>> {
        Ok(TaskList::list_by_pending_owner(&self.db, user_id).await?)
    }

    async fn add_pending_owner(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<TaskList>> {
        Ok(TaskList::add_pending_owner(&self.db, id, user_id).await?)
    }

    async fn accept_pending_owner(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<TaskList>> {
        Ok(TaskList::accept_pending_owner(&self.db, id, user_id).await?)
    }

    async fn remove_pending_owner(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(TaskList::remove_pending_owner(&self.db, id, user_id).await?)
    }
}
