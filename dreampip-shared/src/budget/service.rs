/// Task-list and settings services
///
/// `TaskListService` is the caller side of the ledger contract: every write
/// that can change a percentage is validated for each owner first and followed
/// by a recalculation of each owner. HTTP handlers use these services rather
/// than the models directly.
///
/// Co-ownership needs consent. An owner can only invite another user; the
/// list starts counting against the invitee's budget when they accept, and
/// only if it fits their headroom at that moment.

use super::error::{BudgetError, BudgetResult};
use super::ledger::BudgetLedger;
use super::percentage::BudgetPercentage;
use super::store::BudgetStore;
use crate::models::task_list::{CreateTaskList, TaskList, UpdateTaskList};
use crate::settings::UserSettings;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Input for [`TaskListService::create`]
#[derive(Debug, Clone, Default)]
pub struct NewTaskList {
    pub name: String,

    pub budget_percentage: Option<f64>,
}

#[derive(Clone)]
pub struct TaskListService {
    store: Arc<dyn BudgetStore>,
    ledger: BudgetLedger,
}

impl TaskListService {
    pub fn new(store: Arc<dyn BudgetStore>) -> Self {
        TaskListService {
            ledger: BudgetLedger::new(store.clone()),
            store,
        }
    }

    pub fn ledger(&self) -> &BudgetLedger {
        &self.ledger
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> BudgetResult<Vec<TaskList>> {
        Ok(self.store.list_task_lists(user_id).await?)
    }

    /// Lists owned by `user_id`; other users' lists read as not found
    pub async fn get(&self, user_id: Uuid, list_id: Uuid) -> BudgetResult<TaskList> {
        self.owned_list(user_id, list_id).await
    }

    /// Creates a list owned by `owner_id` alone
    ///
    /// # Errors
    ///
    /// - `InvalidPercentage` for a share outside [0, 100]
    /// - `NotFound` if the owner does not exist
    /// - `AllocationExceeded` if the owner lacks the headroom
    pub async fn create(&self, owner_id: Uuid, data: NewTaskList) -> BudgetResult<TaskList> {
        let requested = data.budget_percentage.map(BudgetPercentage::new).transpose()?;

        if self.store.find_user(owner_id).await?.is_none() {
            return Err(BudgetError::NotFound(format!("User {owner_id}")));
        }

        let owner_ids = vec![owner_id];
        if let Some(requested) = requested {
            self.ensure_headroom(&owner_ids, requested, None).await?;
        }

        let list = self
            .store
            .insert_task_list(CreateTaskList {
                name: data.name,
                owner_ids,
                budget_percentage: requested.map(f64::from),
            })
            .await?;

        info!(
            task_list_id = %list.id,
            owners = list.owner_ids.len(),
            budget_percentage = ?list.budget_percentage,
            "Created task list"
        );

        self.ledger.recalculate_owners(&list.owner_ids).await?;
        Ok(list)
    }

    /// Renames a list and/or changes its budget share
    ///
    /// A new percentage is checked against each owner's usage with this list's
    /// old share left out.
    pub async fn update(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        data: UpdateTaskList,
    ) -> BudgetResult<TaskList> {
        let existing = self.owned_list(user_id, list_id).await?;
        if data.is_empty() {
            return Ok(existing);
        }

        let budget_changed = match data.budget_percentage {
            Some(Some(value)) => {
                let requested = BudgetPercentage::new(value)?;
                self.ensure_headroom(&existing.owner_ids, requested, Some(list_id))
                    .await?;
                existing.budget_percentage != Some(value)
            }
            Some(None) => existing.budget_percentage.is_some(),
            None => false,
        };

        let updated = self
            .store
            .update_task_list(list_id, data)
            .await?
            .ok_or_else(|| BudgetError::NotFound(format!("Task list {list_id}")))?;

        if budget_changed {
            info!(
                task_list_id = %list_id,
                from = ?existing.budget_percentage,
                to = ?updated.budget_percentage,
                "Task list budget changed"
            );
            self.ledger.recalculate_owners(&updated.owner_ids).await?;
        }

        Ok(updated)
    }

    /// Deletes a list and recalculates its former owners
    pub async fn delete(&self, user_id: Uuid, list_id: Uuid) -> BudgetResult<()> {
        let existing = self.owned_list(user_id, list_id).await?;

        if !self.store.delete_task_list(list_id).await? {
            return Err(BudgetError::NotFound(format!("Task list {list_id}")));
        }

        info!(task_list_id = %list_id, "Deleted task list");
        self.ledger.recalculate_owners(&existing.owner_ids).await
    }

    /// Lists `user_id` has been invited to and not yet answered
    pub async fn list_invites(&self, user_id: Uuid) -> BudgetResult<Vec<TaskList>> {
        Ok(self.store.list_invited_task_lists(user_id).await?)
    }

    /// Invites `invitee_id` to co-own a list the caller owns
    ///
    /// Nobody's budget changes here. Inviting a current owner or an already
    /// pending user returns the list unchanged.
    ///
    /// # Errors
    ///
    /// `NotFound` if the caller does not own the list or the invitee does
    /// not exist.
    pub async fn invite(
        &self,
        user_id: Uuid,
        list_id: Uuid,
        invitee_id: Uuid,
    ) -> BudgetResult<TaskList> {
        let existing = self.owned_list(user_id, list_id).await?;

        if self.store.find_user(invitee_id).await?.is_none() {
            return Err(BudgetError::NotFound(format!("User {invitee_id}")));
        }

        if existing.is_owned_by(invitee_id) || existing.is_pending_for(invitee_id) {
            return Ok(existing);
        }

        let list = self
            .store
            .add_pending_owner(list_id, invitee_id)
            .await?
            .ok_or_else(|| BudgetError::NotFound(format!("Task list {list_id}")))?;

        info!(
            task_list_id = %list_id,
            invited_by = %user_id,
            invitee = %invitee_id,
            "Invited co-owner"
        );
        Ok(list)
    }

    /// Accepts an open invite, making `user_id` a co-owner
    ///
    /// The list's current share is checked against the user's own headroom
    /// first; a rejected accept leaves the invite open.
    ///
    /// # Errors
    ///
    /// - `NotFound` if there is no open invite for the user on this list
    /// - `AllocationExceeded` if the share does not fit
    pub async fn accept_invite(&self, user_id: Uuid, list_id: Uuid) -> BudgetResult<TaskList> {
        let existing = self.invited_list(user_id, list_id).await?;

        if let Some(percentage) = existing.budget_percentage {
            let requested = BudgetPercentage::new(percentage)?;
            self.ensure_headroom(&[user_id], requested, None).await?;
        }

        let list = self
            .store
            .accept_pending_owner(list_id, user_id)
            .await?
            .ok_or_else(|| BudgetError::NotFound(format!("Invite to task list {list_id}")))?;

        info!(task_list_id = %list_id, %user_id, "Accepted co-ownership");

        self.ledger.recalculate_user_budget(user_id).await?;
        Ok(list)
    }

    /// Declines an open invite
    pub async fn decline_invite(&self, user_id: Uuid, list_id: Uuid) -> BudgetResult<()> {
        if !self.store.remove_pending_owner(list_id, user_id).await? {
            return Err(BudgetError::NotFound(format!("Invite to task list {list_id}")));
        }

        info!(task_list_id = %list_id, %user_id, "Declined co-ownership");
        Ok(())
    }

    async fn invited_list(&self, user_id: Uuid, list_id: Uuid) -> BudgetResult<TaskList> {
        match self.store.find_task_list(list_id).await? {
            Some(list) if list.is_pending_for(user_id) => Ok(list),
            _ => Err(BudgetError::NotFound(format!("Invite to task list {list_id}"))),
        }
    }

    async fn owned_list(&self, user_id: Uuid, list_id: Uuid) -> BudgetResult<TaskList> {
        match self.store.find_task_list(list_id).await? {
            Some(list) if list.is_owned_by(user_id) => Ok(list),
            _ => Err(BudgetError::NotFound(format!("Task list {list_id}"))),
        }
    }

    async fn ensure_headroom(
        &self,
        owner_ids: &[Uuid],
        requested: BudgetPercentage,
        current_list_id: Option<Uuid>,
    ) -> BudgetResult<()> {
        for &owner_id in owner_ids {
            let check = self
                .ledger
                .check_allocation(owner_id, requested, current_list_id)
                .await?;

            if !check.allowed {
                warn!(
                    user_id = %owner_id,
                    current = check.current,
                    requested = check.requested,
                    "Budget allocation rejected"
                );
                return Err(BudgetError::AllocationExceeded {
                    user_id: owner_id,
                    requested: check.requested,
                    current: check.current,
                });
            }
        }
        Ok(())
    }
}

/// Reads and writes typed user settings
#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn BudgetStore>,
}

impl SettingsService {
    pub fn new(store: Arc<dyn BudgetStore>) -> Self {
        SettingsService { store }
    }

    pub async fn get(&self, user_id: Uuid) -> BudgetResult<UserSettings> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| BudgetError::NotFound(format!("User {user_id}")))?;
        Ok(user.settings())
    }

    /// Validates and stores `settings`, replacing the previous document
    pub async fn replace(&self, user_id: Uuid, settings: UserSettings) -> BudgetResult<UserSettings> {
        let document = settings.to_stored()?;

        if !self.store.replace_settings(user_id, document).await? {
            return Err(BudgetError::NotFound(format!("User {user_id}")));
        }

        info!(%user_id, "Updated user settings");
        Ok(settings)
    }
}
