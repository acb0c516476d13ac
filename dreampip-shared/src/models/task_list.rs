/// Task list model and database operations
///
/// A task list can be shared, so ownership is a set of user ids rather than a
/// single foreign key. `budget_percentage` is the share of each owner's
/// notional budget the list claims; NULL counts as 0.
///
/// Sharing goes through an invite: an owner adds a user to
/// `pending_owner_ids`, and the list only counts against that user's budget
/// once they accept and move into `owner_ids`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_lists (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name TEXT NOT NULL,
///     owner_ids UUID[] NOT NULL CHECK (cardinality(owner_ids) > 0),
///     budget_percentage DOUBLE PRECISION
///         CHECK (budget_percentage IS NULL OR (budget_percentage >= 0 AND budget_percentage <= 100)),
///     pending_owner_ids UUID[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Writes here do not touch the owners' budget totals. Go through
/// `budget::TaskListService` unless you intend to recalculate yourself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const COLUMNS: &str =
    "id, name, owner_ids, budget_percentage, pending_owner_ids, created_at, updated_at";

/// Task list row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskList {
    pub id: Uuid,

    pub name: String,

    /// Users sharing this list; never empty
    pub owner_ids: Vec<Uuid>,

    /// Share of each owner's budget, in [0, 100]
    pub budget_percentage: Option<f64>,

    /// Invited users who have not accepted yet
    #[serde(default)]
    pub pending_owner_ids: Vec<Uuid>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl TaskList {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_ids.contains(&user_id)
    }

    pub fn is_pending_for(&self, user_id: Uuid) -> bool {
        self.pending_owner_ids.contains(&user_id)
    }

    /// Percentage this list contributes to an owner's used budget
    pub fn contribution(&self) -> f64 {
        self.budget_percentage.unwrap_or(0.0)
    }
}

/// A list's contribution to its owners' budgets, without the rest of the row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BudgetAllocation {
    pub task_list_id: Uuid,
    pub budget_percentage: Option<f64>,
}

/// Input for creating a task list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskList {
    pub name: String,
    pub owner_ids: Vec<Uuid>,
    pub budget_percentage: Option<f64>,
}

/// Input for updating a task list
///
/// Only `Some` fields are written. `budget_percentage: Some(None)` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskList {
    pub name: Option<String>,
    pub budget_percentage: Option<Option<f64>>,
}

impl UpdateTaskList {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.budget_percentage.is_none()
    }
}

impl TaskList {
    /// Inserts a task list
    pub async fn create(pool: &PgPool, data: CreateTaskList) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO task_lists (name, owner_ids, budget_percentage)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, TaskList>(&query)
            .bind(data.name)
            .bind(data.owner_ids)
            .bind(data.budget_percentage)
            .fetch_one(pool)
            .await
    }

    /// Finds a task list by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM task_lists WHERE id = $1");

        sqlx::query_as::<_, TaskList>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists every task list the user owns or shares, oldest first
    pub async fn list_by_owner(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM task_lists WHERE $1 = ANY(owner_ids) ORDER BY created_at, id"
        );

        sqlx::query_as::<_, TaskList>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Budget projection of [`TaskList::list_by_owner`]
    pub async fn allocations_by_owner(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<BudgetAllocation>, sqlx::Error> {
        sqlx::query_as::<_, BudgetAllocation>(
            r#"
            SELECT id AS task_list_id, budget_percentage
            FROM task_lists
            WHERE $1 = ANY(owner_ids)
            ORDER BY created_at, id
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Lists with an open invite for `user_id`, oldest first
    pub async fn list_by_pending_owner(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM task_lists
             WHERE $1 = ANY(pending_owner_ids)
             ORDER BY created_at, id"
        );

        sqlx::query_as::<_, TaskList>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Records an invite; a repeated invite leaves one entry
    ///
    /// Returns None if the list does not exist.
    pub async fn add_pending_owner(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE task_lists
             SET pending_owner_ids = array_append(array_remove(pending_owner_ids, $2), $2),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, TaskList>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Moves an invited user into `owner_ids`
    ///
    /// Returns None unless the list exists and `user_id` is pending on it.
    pub async fn accept_pending_owner(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE task_lists
             SET owner_ids = array_append(array_remove(owner_ids, $2), $2),
                 pending_owner_ids = array_remove(pending_owner_ids, $2),
                 updated_at = NOW()
             WHERE id = $1 AND $2 = ANY(pending_owner_ids)
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, TaskList>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Drops an open invite; false when there was none
    pub async fn remove_pending_owner(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE task_lists
            SET pending_owner_ids = array_remove(pending_owner_ids, $2), updated_at = NOW()
            WHERE id = $1 AND $2 = ANY(pending_owner_ids)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Applies the non-`None` fields of `data`
    ///
    /// Returns None if the list does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTaskList,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE task_lists SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${bind_count}"));
        }
        if data.budget_percentage.is_some() {
            bind_count += 1;
            query.push_str(&format!(", budget_percentage = ${bind_count}"));
        }
        query.push_str(&format!(" WHERE id = $1 RETURNING {COLUMNS}"));

        let mut q = sqlx::query_as::<_, TaskList>(&query).bind(id);
        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(percentage) = data.budget_percentage {
            q = q.bind(percentage);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a task list by ID
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_lists WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(owner_ids: Vec<Uuid>, budget_percentage: Option<f64>) -> TaskList {
        TaskList {
            id: Uuid::new_v4(),
            name: "Groceries".to_string(),
            owner_ids,
            budget_percentage,
            pending_owner_ids: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_missing_percentage_contributes_zero() {
        assert_eq!(list(vec![Uuid::new_v4()], None).contribution(), 0.0);
        assert_eq!(list(vec![Uuid::new_v4()], Some(12.5)).contribution(), 12.5);
    }

    #[test]
    fn test_shared_ownership() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let shared = list(vec![alice, bob], Some(10.0));
        assert!(shared.is_owned_by(alice));
        assert!(shared.is_owned_by(bob));
        assert!(!shared.is_owned_by(Uuid::new_v4()));
    }

    #[test]
    fn test_pending_owner_is_not_an_owner() {
        let alice = Uuid::new_v4();
        let carol = Uuid::new_v4();
        let mut invited = list(vec![alice], Some(10.0));
        invited.pending_owner_ids.push(carol);
        assert!(invited.is_pending_for(carol));
        assert!(!invited.is_owned_by(carol));
        assert!(!invited.is_pending_for(alice));
    }

    #[test]
    fn test_update_is_empty() {
        assert!(UpdateTaskList::default().is_empty());
        let clear = UpdateTaskList {
            budget_percentage: Some(None),
            ..Default::default()
        };
        assert!(!clear.is_empty());
    }
}
