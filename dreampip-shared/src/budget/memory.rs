/// In-memory [`BudgetStore`] for tests and demos
///
/// Behaves like the PostgreSQL store, minus durability. It can be put into a
/// failing mode where every trait call returns `StoreError::Unavailable`,
/// which is how the ledger's error policies are exercised without a database.
///
/// # Example
///
/// ```
/// use dreampip_shared::budget::{BudgetLedger, MemoryBudgetStore};
/// use dreampip_shared::models::user::CreateUser;
/// use std::sync::Arc;
///
/// # async fn example() {
/// let store = Arc::new(MemoryBudgetStore::new());
/// let user = store.insert_user(CreateUser { email: "pip@example.com".into(), name: None }).await;
///
/// let ledger = BudgetLedger::new(store.clone());
/// assert!(ledger.validate_allocation(user.id, 40.0, None).await);
/// # }
/// ```

use super::error::{StoreError, StoreResult};
use super::store::BudgetStore;
use crate::models::task_list::{BudgetAllocation, CreateTaskList, TaskList, UpdateTaskList};
use crate::models::user::{CreateUser, User};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    /// Insertion order doubles as creation order
    task_lists: Vec<TaskList>,
}

#[derive(Debug, Default)]
pub struct MemoryBudgetStore {
    state: RwLock<MemoryState>,
    failing: AtomicBool,
}

impl MemoryBudgetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent store call fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Adds a user with empty budget totals
    pub async fn insert_user(&self, data: CreateUser) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            name: data.name,
            used_budget: None,
            remaining_budget: None,
            settings: json!({}),
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.users.insert(user.id, user.clone());
        user
    }

    /// Writes a task list directly, skipping any budget bookkeeping
    ///
    /// Useful for seeding over-allocated states a well-behaved caller never
    /// produces.
    pub async fn seed_task_list(&self, owner_ids: Vec<Uuid>, budget_percentage: Option<f64>) -> TaskList {
        let now = Utc::now();
        let list = TaskList {
            id: Uuid::new_v4(),
            name: "Seeded list".to_string(),
            owner_ids,
            budget_percentage,
            pending_owner_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.task_lists.push(list.clone());
        list
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "memory store is in failing mode".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl BudgetStore for MemoryBudgetStore {
    async fn ping(&self) -> StoreResult<()> {
        self.check()
    }

    async fn owned_allocations(&self, user_id: Uuid) -> StoreResult<Vec<BudgetAllocation>> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state
            .task_lists
            .iter()
            .filter(|list| list.is_owned_by(user_id))
            .map(|list| BudgetAllocation {
                task_list_id: list.id,
                budget_percentage: list.budget_percentage,
            })
            .collect())
    }

    async fn stored_remaining(&self, user_id: Uuid) -> StoreResult<Option<f64>> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state.users.get(&user_id).and_then(|u| u.remaining_budget))
    }

    async fn write_totals(
        &self,
        user_id: Uuid,
        used_budget: f64,
        remaining_budget: f64,
    ) -> StoreResult<bool> {
        self.check()?;
        let mut state = self.state.write().await;
        match state.users.get_mut(&user_id) {
            Some(user) => {
                user.used_budget = Some(used_budget);
                user.remaining_budget = Some(remaining_budget);
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        self.check()?;
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn replace_settings(&self, user_id: Uuid, settings: JsonValue) -> StoreResult<bool> {
        self.check()?;
        let mut state = self.state.write().await;
        match state.users.get_mut(&user_id) {
            Some(user) => {
                user.settings = settings;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_task_lists(&self, user_id: Uuid) -> StoreResult<Vec<TaskList>> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state
            .task_lists
            .iter()
            .filter(|list| list.is_owned_by(user_id))
            .cloned()
            .collect())
    }

    async fn find_task_list(&self, id: Uuid) -> StoreResult<Option<TaskList>> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state.task_lists.iter().find(|list| list.id == id).cloned())
    }

    async fn insert_task_list(&self, data: CreateTaskList) -> StoreResult<TaskList> {
        self.check()?;
        let now = Utc::now();
        let list = TaskList {
            id: Uuid::new_v4(),
            name: data.name,
            owner_ids: data.owner_ids,
            budget_percentage: data.budget_percentage,
            pending_owner_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.task_lists.push(list.clone());
        Ok(list)
    }

    async fn update_task_list(
        &self,
        id: Uuid,
        data: UpdateTaskList,
    ) -> StoreResult<Option<TaskList>> {
        self.check()?;
        let mut state = self.state.write().await;
        let Some(list) = state.task_lists.iter_mut().find(|list| list.id == id) else {
            return Ok(None);
        };

        if let Some(name) = data.name {
            list.name = name;
        }
        if let Some(percentage) = data.budget_percentage {
            list.budget_percentage = percentage;
        }
        list.updated_at = Utc::now();

        Ok(Some(list.clone()))
    }

    async fn delete_task_list(&self, id: Uuid) -> StoreResult<bool> {
        self.check()?;
        let mut state = self.state.write().await;
        let before = state.task_lists.len();
        state.task_lists.retain(|list| list.id != id);
        Ok(state.task_lists.len() < before)
    }

    async fn list_invited_task_lists(&self, user_id: Uuid) -> StoreResult<Vec<TaskList>> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state
            .task_lists
            .iter()
            .filter(|list| list.is_pending_for(user_id))
            .cloned()
            .collect())
    }

    async fn add_pending_owner(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<TaskList>> {
        self.check()?;
        let mut state = self.state.write().await;
        let Some(list) = state.task_lists.iter_mut().find(|list| list.id == id) else {
            return Ok(None);
        };

        if !list.is_pending_for(user_id) {
            list.pending_owner_ids.push(user_id);
        }
        list.updated_at = Utc::now();

        Ok(Some(list.clone()))
    }

    async fn accept_pending_owner(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<TaskList>> {
        self.check()?;
        let mut state = self.state.write().await;
        let Some(list) = state
            .task_lists
            .iter_mut()
            .find(|list| list.id == id && list.is_pending_for(user_id))
        else {
            return Ok(None);
        };

        list.pending_owner_ids.retain(|&pending| pending != user_id);
        if !list.is_owned_by(user_id) {
            list.owner_ids.push(user_id);
        }
        list.updated_at = Utc::now();

        Ok(Some(list.clone()))
    }

    async fn remove_pending_owner(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        self.check()?;
        let mut state = self.state.write().await;
        let Some(list) = state
            .task_lists
            .iter_mut()
            .find(|list| list.id == id && list.is_pending_for(user_id))
        else {
            return Ok(false);
        };

        list.pending_owner_ids.retain(|&pending| pending != user_id);
        list.updated_at = Utc::now();
        Ok(true)
    }
}
